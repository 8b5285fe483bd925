//! Session manager: owns the current identity and republishes it.
//!
//! The identity changes through exactly two paths:
//!
//! - explicit calls on the manager (`login`, `logout`)
//! - session-change events pushed by the backend (sign-in elsewhere, token
//!   refresh, sign-out), picked up by a background listener
//!
//! Consumers get the identity through [`SessionManager::subscribe`], a watch
//! channel; dropping the receiver unsubscribes. The listener task is aborted
//! when the manager is dropped.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::{ClientError, RemoteError};
use crate::remote::{AuthBackend, AuthEvent, AuthEventKind, Identity};

/// Receiver side of the identity channel.
pub type IdentityWatch = watch::Receiver<Option<Identity>>;

/// Aborts the listener task when dropped.
struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct SessionManager<A: AuthBackend> {
    auth: Arc<A>,
    identity: Arc<watch::Sender<Option<Identity>>>,
    _listener: ListenerGuard,
    last_error: Option<String>,
    password_reset_redirect: Option<String>,
}

/// Replace the published identity, notifying only on an actual change.
fn publish(sender: &watch::Sender<Option<Identity>>, next: Option<Identity>) {
    sender.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

async fn listen(mut events: broadcast::Receiver<AuthEvent>, sender: Arc<watch::Sender<Option<Identity>>>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                match event.kind {
                    AuthEventKind::SignedIn => tracing::info!(
                        email = event.identity.as_ref().and_then(|i| i.email.as_deref()).unwrap_or(""),
                        "user signed in"
                    ),
                    AuthEventKind::SignedOut => tracing::info!("user signed out"),
                    kind => tracing::debug!(?kind, "session changed"),
                }
                publish(&sender, event.identity);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

impl<A: AuthBackend> SessionManager<A> {
    /// Restore any existing session and start listening for changes.
    ///
    /// A failed restore is recorded in [`last_error`](Self::last_error) and
    /// leaves the manager signed out.
    pub async fn start(auth: Arc<A>) -> Self {
        let (sender, _) = watch::channel(None);
        let sender = Arc::new(sender);

        // Subscribe before restoring so no event slips between the two.
        let events = auth.subscribe();
        let listener = ListenerGuard(tokio::spawn(listen(events, Arc::clone(&sender))));

        let mut manager = Self {
            auth,
            identity: sender,
            _listener: listener,
            last_error: None,
            password_reset_redirect: None,
        };

        match manager.auth.current_session().await {
            Ok(identity) => publish(&manager.identity, identity),
            Err(err) => {
                tracing::warn!(error = %err, "could not restore session");
                manager.last_error = Some(err.message);
            }
        }
        manager
    }

    /// Where password-reset links should send the user.
    pub fn with_password_reset_redirect(mut self, url: Option<String>) -> Self {
        self.password_reset_redirect = url;
        self
    }

    /// Current identity, `None` when signed out.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Watch the identity. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> IdentityWatch {
        self.identity.subscribe()
    }

    /// Message of the most recent failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn backend(&self) -> &Arc<A> {
        &self.auth
    }

    fn record<T>(&mut self, op: &str, result: Result<T, RemoteError>) -> Result<T, ClientError> {
        result.map_err(|err| {
            tracing::warn!(op, error = %err, "auth call failed");
            self.last_error = Some(err.message.clone());
            ClientError::Remote(err)
        })
    }

    /// Register a new account.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<Option<Identity>, ClientError> {
        self.last_error = None;
        let result = self.auth.sign_up(email, password).await;
        self.record("sign_up", result)
    }

    /// Sign in. The cached identity is left alone on failure.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, ClientError> {
        self.last_error = None;
        let result = self.auth.sign_in(email, password).await;
        let identity = self.record("login", result)?;
        publish(&self.identity, Some(identity.clone()));
        Ok(identity)
    }

    /// End the session; clears the cached identity on success.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.last_error = None;
        let result = self.auth.sign_out().await;
        self.record("logout", result)?;
        publish(&self.identity, None);
        Ok(())
    }

    /// Ask the backend to send a password-reset message.
    pub async fn reset_password(&mut self, email: &str) -> Result<(), ClientError> {
        self.last_error = None;
        let redirect = self.password_reset_redirect.clone();
        let result = self.auth.reset_password(email, redirect.as_deref()).await;
        self.record("reset_password", result)
    }

    /// Change the signed-in user's password.
    pub async fn update_password(&mut self, new_password: &str) -> Result<(), ClientError> {
        self.last_error = None;
        if self.identity().is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        let result = self.auth.update_password(new_password).await;
        self.record("update_password", result)?;
        Ok(())
    }
}
