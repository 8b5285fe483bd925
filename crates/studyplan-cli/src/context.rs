//! Per-invocation wiring: config, backend client, session and stores.
//!
//! The remote session is kept in the OS keyring between runs. A keyring
//! that cannot be reached only costs the saved login, never the command.

use std::sync::Arc;

use studyplan_core::remote::keyring_store;
use studyplan_core::{ClientError, Config, Identity, ScheduleStore, SessionManager, SupabaseClient, TaskStore};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub struct AppContext {
    pub config: Config,
    pub session: SessionManager<SupabaseClient>,
    client: Arc<SupabaseClient>,
    backend_url: String,
}

impl AppContext {
    /// Load config, build the client and restore any saved session.
    pub async fn connect() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let backend = config.require_backend()?;
        let backend_url = backend.url.clone();
        let client = Arc::new(SupabaseClient::new(&backend.url, &backend.anon_key)?);

        match keyring_store::load_session(&backend_url) {
            Ok(Some(saved)) => client.restore_session(saved).await,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read saved session"),
        }

        let session = SessionManager::start(Arc::clone(&client))
            .await
            .with_password_reset_redirect(config.auth.password_reset_redirect.clone());

        Ok(Self {
            config,
            session,
            client,
            backend_url,
        })
    }

    pub fn require_identity(&self) -> Result<Identity, ClientError> {
        self.session.identity().ok_or(ClientError::NotAuthenticated)
    }

    /// Task store for the signed-in user, fetched.
    pub async fn tasks(&self) -> Result<TaskStore<SupabaseClient>, Box<dyn std::error::Error>> {
        let identity = self.require_identity()?;
        let store = TaskStore::open(Arc::clone(&self.client), Some(identity)).await;
        if let Some(message) = store.error() {
            return Err(message.into());
        }
        Ok(store)
    }

    /// Schedule store for the signed-in user, fetched in the configured
    /// day order.
    pub async fn schedule(&self) -> Result<ScheduleStore<SupabaseClient>, Box<dyn std::error::Error>> {
        let identity = self.require_identity()?;
        let store = ScheduleStore::open(
            Arc::clone(&self.client),
            Some(identity),
            self.config.schedule.day_order,
        )
        .await;
        if let Some(message) = store.error() {
            return Err(message.into());
        }
        Ok(store)
    }

    /// Save the client's current session (tokens may have been refreshed),
    /// or forget it when signed out.
    pub async fn persist(&self) {
        let result = match self.client.session().await {
            Some(session) => keyring_store::save_session(&self.backend_url, &session),
            None => keyring_store::clear_session(&self.backend_url),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not update saved session");
        }
    }
}
