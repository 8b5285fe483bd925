//! In-process backend implementing both halves of the remote boundary.
//!
//! Behaves like the hosted service closely enough for the stores and the
//! session manager to run unchanged: generated ids, equality filters,
//! ordering, session events. Failures can be scripted and every call is
//! counted, so callers can assert that nothing reached the backend.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::broadcast;

use super::traits::{AuthBackend, Datastore};
use super::types::{AuthEvent, AuthEventKind, Filter, Identity, Order};
use crate::error::RemoteError;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct MemoryUser {
    identity: Identity,
    password: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<MemoryUser>,
    session: Option<Identity>,
    tables: HashMap<String, Vec<Value>>,
    next_row_id: i64,
    next_user_id: u64,
    failures: VecDeque<RemoteError>,
    calls: usize,
    reset_requests: Vec<String>,
}

pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(MemoryState {
                next_row_id: 1,
                next_user_id: 1,
                ..MemoryState::default()
            }),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and surface a scripted failure if one is queued.
    fn enter(&self) -> Result<MutexGuard<'_, MemoryState>, RemoteError> {
        let mut state = self.state();
        state.calls += 1;
        let scripted = state.failures.pop_front();
        match scripted {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    fn emit(&self, kind: AuthEventKind, identity: Option<Identity>) {
        let _ = self.events.send(AuthEvent::new(kind, identity));
    }

    /// Make the next backend call fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state().failures.push_back(RemoteError::new(message));
    }

    /// Number of calls that reached the backend so far.
    pub fn calls(&self) -> usize {
        self.state().calls
    }

    /// Register a user without going through sign-up.
    pub fn add_user(&self, email: &str, password: &str) -> Identity {
        let mut state = self.state();
        let identity = Identity::new(format!("user-{}", state.next_user_id), Some(email.to_string()));
        state.next_user_id += 1;
        state.users.push(MemoryUser {
            identity: identity.clone(),
            password: password.to_string(),
        });
        identity
    }

    /// Insert rows as-is, bypassing the call counter. Rows without an `id`
    /// get the next generated one.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut state = self.state();
        for mut row in rows {
            match row.get("id").and_then(Value::as_i64) {
                Some(id) => state.next_row_id = state.next_row_id.max(id + 1),
                None => {
                    let id = state.next_row_id;
                    state.next_row_id += 1;
                    if let Some(obj) = row.as_object_mut() {
                        obj.insert("id".into(), Value::from(id));
                    }
                }
            }
            state.tables.entry(table.to_string()).or_default().push(row);
        }
    }

    /// Current contents of `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    /// Push a session change as if it came from elsewhere (another tab,
    /// a token refresh, an admin sign-out).
    pub fn push_event(&self, event: AuthEvent) {
        self.state().session = event.identity.clone();
        let _ = self.events.send(event);
    }

    /// E-mail addresses a reset was requested for.
    pub fn reset_requests(&self) -> Vec<String> {
        self.state().reset_requests.clone()
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None, Some(_)) | (Some(Value::Null), Some(_)) => Ordering::Greater,
        (Some(_), None) | (Some(_), Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (None, None) => Ordering::Equal,
    }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

impl AuthBackend for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Identity>, RemoteError> {
        let identity = {
            let mut state = self.enter()?;
            if state.users.iter().any(|u| u.identity.email.as_deref() == Some(email)) {
                return Err(RemoteError::with_status("User already registered", 422));
            }
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(RemoteError::with_status(
                    format!("Password should be at least {MIN_PASSWORD_LEN} characters."),
                    422,
                ));
            }

            let identity = Identity::new(format!("user-{}", state.next_user_id), Some(email.to_string()));
            state.next_user_id += 1;
            state.users.push(MemoryUser {
                identity: identity.clone(),
                password: password.to_string(),
            });
            state.session = Some(identity.clone());
            identity
        };

        self.emit(AuthEventKind::SignedIn, Some(identity.clone()));
        Ok(Some(identity))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        let identity = {
            let mut state = self.enter()?;
            let user = state
                .users
                .iter()
                .find(|u| u.identity.email.as_deref() == Some(email) && u.password == password)
                .cloned()
                .ok_or_else(|| RemoteError::with_status("Invalid login credentials", 400))?;
            state.session = Some(user.identity.clone());
            user.identity
        };

        self.emit(AuthEventKind::SignedIn, Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.enter()?.session = None;
        self.emit(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn reset_password(&self, email: &str, _redirect_to: Option<&str>) -> Result<(), RemoteError> {
        self.enter()?.reset_requests.push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<Identity, RemoteError> {
        let identity = {
            let mut state = self.enter()?;
            let current = state
                .session
                .clone()
                .ok_or_else(|| RemoteError::with_status("Auth session missing!", 401))?;
            if new_password.chars().count() < MIN_PASSWORD_LEN {
                return Err(RemoteError::with_status(
                    format!("Password should be at least {MIN_PASSWORD_LEN} characters."),
                    422,
                ));
            }
            let user = state
                .users
                .iter_mut()
                .find(|u| u.identity.id == current.id)
                .ok_or_else(|| RemoteError::with_status("User not found", 404))?;
            if user.password == new_password {
                return Err(RemoteError::with_status(
                    "New password should be different from the old password.",
                    422,
                ));
            }
            user.password = new_password.to_string();
            current
        };

        self.emit(AuthEventKind::UserUpdated, Some(identity.clone()));
        Ok(identity)
    }

    async fn current_session(&self) -> Result<Option<Identity>, RemoteError> {
        Ok(self.enter()?.session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

impl Datastore for MemoryBackend {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Value>, RemoteError> {
        let state = self.enter()?;
        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, filters)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value, RemoteError> {
        let mut state = self.enter()?;
        let id = state.next_row_id;
        state.next_row_id += 1;

        let obj = row
            .as_object_mut()
            .ok_or_else(|| RemoteError::with_status("Row must be a JSON object", 400))?;
        obj.insert("id".into(), Value::from(id));

        state.tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, RemoteError> {
        let mut state = self.enter()?;
        let patch = patch
            .as_object()
            .cloned()
            .ok_or_else(|| RemoteError::with_status("Patch must be a JSON object", 400))?;

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches_all(r, filters)) {
                if let Some(obj) = row.as_object_mut() {
                    for (k, v) in &patch {
                        obj.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), RemoteError> {
        let mut state = self.enter()?;
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|r| !matches_all(r, filters));
        }
        Ok(())
    }
}
