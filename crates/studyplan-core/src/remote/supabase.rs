//! SupabaseClient: HTTP client for a Supabase-style hosted backend.
//!
//! Auth goes to the GoTrue endpoints under `/auth/v1`, rows to the
//! PostgREST endpoints under `/rest/v1`. The session lives in memory; hosts
//! that want it to survive a restart read it with [`SupabaseClient::session`]
//! and hand it back with [`SupabaseClient::restore_session`].

use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use url::Url;

use super::traits::{AuthBackend, Datastore};
use super::types::{AuthEvent, AuthEventKind, AuthSession, Filter, Identity, Order};
use crate::error::{ConfigError, RemoteError};

const EVENT_CAPACITY: usize = 16;

/// Client for one backend project.
pub struct SupabaseClient {
    base: Url,
    anon_key: String,
    http_client: Client,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Create a client for the project at `url` using its public anon key.
    pub fn new(url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("backend.anon_key".into()));
        }

        let mut normalized = url.trim().to_string();
        if normalized.is_empty() {
            return Err(ConfigError::MissingKey("backend.url".into()));
        }
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            key: "backend.url".into(),
            message: e.to_string(),
        })?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            base,
            anon_key: anon_key.to_string(),
            http_client: Client::new(),
            session: RwLock::new(None),
            events,
        })
    }

    /// Adopt a previously persisted session.
    pub async fn restore_session(&self, session: AuthSession) {
        *self.session.write().await = Some(session);
    }

    /// Snapshot of the current session, if any.
    pub async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base
            .join(path)
            .map_err(|e| RemoteError::new(format!("Invalid endpoint '{path}': {e}")))
    }

    fn emit(&self, kind: AuthEventKind, identity: Option<Identity>) {
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent::new(kind, identity));
    }

    /// Bearer token for a request: the session's access token, refreshed if
    /// it is about to expire, or the anon key when signed out.
    async fn bearer(&self) -> Result<String, RemoteError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(self.anon_key.clone());
        };

        if !session.is_expired() {
            return Ok(session.access_token);
        }

        match session.refresh_token.as_deref() {
            Some(refresh) => {
                let refreshed = self.refresh_session(refresh).await?;
                Ok(refreshed.access_token)
            }
            None => Ok(session.access_token),
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, RemoteError> {
        tracing::debug!("refreshing access token");
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let resp = self
            .send(
                self.http_client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .json(&json!({ "refresh_token": refresh_token })),
            )
            .await?;
        let body: Value = resp.json().await?;
        let mut session = parse_session(&body)?;
        if session.refresh_token.is_none() {
            session.refresh_token = Some(refresh_token.to_string());
        }

        *self.session.write().await = Some(session.clone());
        self.emit(AuthEventKind::TokenRefreshed, Some(session.user.clone()));
        Ok(session)
    }

    async fn rest(&self, req: RequestBuilder) -> Result<RequestBuilder, RemoteError> {
        let token = self.bearer().await?;
        Ok(req
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json")
            .bearer_auth(token))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = req.send().await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    fn table_url(&self, table: &str, filters: &[Filter]) -> Result<Url, RemoteError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                pairs.append_pair(&filter.column, &filter.query_value());
            }
        }
        Ok(url)
    }
}

impl AuthBackend for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Identity>, RemoteError> {
        let url = self.endpoint("auth/v1/signup")?;
        let resp = self
            .send(
                self.http_client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let body: Value = resp.json().await?;

        // Projects without e-mail confirmation answer with a full session.
        if body.get("access_token").is_some() {
            let session = parse_session(&body)?;
            let identity = session.user.clone();
            *self.session.write().await = Some(session);
            self.emit(AuthEventKind::SignedIn, Some(identity.clone()));
            return Ok(Some(identity));
        }

        let user = body.get("user").unwrap_or(&body);
        if user.get("id").is_some() {
            Ok(Some(parse_user(user)?))
        } else {
            Ok(None)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let resp = self
            .send(
                self.http_client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let body: Value = resp.json().await?;
        let session = parse_session(&body)?;
        let identity = session.user.clone();

        *self.session.write().await = Some(session);
        self.emit(AuthEventKind::SignedIn, Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let current = self.session.read().await.clone();
        if let Some(session) = current {
            let url = self.endpoint("auth/v1/logout")?;
            self.send(
                self.http_client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .bearer_auth(&session.access_token),
            )
            .await?;
        }

        *self.session.write().await = None;
        self.emit(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn reset_password(&self, email: &str, redirect_to: Option<&str>) -> Result<(), RemoteError> {
        let mut url = self.endpoint("auth/v1/recover")?;
        if let Some(target) = redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", target);
        }

        self.send(
            self.http_client
                .post(url)
                .header("apikey", &self.anon_key)
                .json(&json!({ "email": email })),
        )
        .await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<Identity, RemoteError> {
        if self.session.read().await.is_none() {
            return Err(RemoteError::new("Auth session missing!"));
        }

        let url = self.endpoint("auth/v1/user")?;
        let token = self.bearer().await?;
        let resp = self
            .send(
                self.http_client
                    .put(url)
                    .header("apikey", &self.anon_key)
                    .bearer_auth(token)
                    .json(&json!({ "password": new_password })),
            )
            .await?;
        let body: Value = resp.json().await?;
        let identity = parse_user(&body)?;

        if let Some(session) = self.session.write().await.as_mut() {
            session.user = identity.clone();
        }
        self.emit(AuthEventKind::UserUpdated, Some(identity.clone()));
        Ok(identity)
    }

    async fn current_session(&self) -> Result<Option<Identity>, RemoteError> {
        let current = self.session.read().await.clone();
        match current {
            Some(session) if session.is_expired() => match session.refresh_token.as_deref() {
                Some(refresh) => Ok(Some(self.refresh_session(refresh).await?.user)),
                None => Ok(None),
            },
            Some(session) => Ok(Some(session.user)),
            None => Ok(None),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

impl Datastore for SupabaseClient {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Value>, RemoteError> {
        let mut url = self.table_url(table, filters)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            if let Some(order) = order {
                pairs.append_pair("order", &order.query_value());
            }
        }
        tracing::debug!(table, "select");

        let req = self.rest(self.http_client.get(url)).await?;
        let rows: Vec<Value> = self.send(req).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        let url = self.table_url(table, &[])?;
        tracing::debug!(table, "insert");

        let req = self
            .rest(self.http_client.post(url))
            .await?
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![row]));
        let rows: Vec<Value> = self.send(req).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::new("Insert returned no rows"))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(table, filters)?;
        tracing::debug!(table, "update");

        let req = self
            .rest(self.http_client.patch(url))
            .await?
            .header("Prefer", "return=representation")
            .json(&patch);
        let rows: Vec<Value> = self.send(req).await?.json().await?;
        Ok(rows)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), RemoteError> {
        let url = self.table_url(table, filters)?;
        tracing::debug!(table, "delete");

        let req = self.rest(self.http_client.delete(url)).await?;
        self.send(req).await?;
        Ok(())
    }
}

/// Build a [`RemoteError`] from a failed response, keeping the service's
/// wording.
async fn error_from_response(resp: Response) -> RemoteError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| error_message(&body))
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    RemoteError::with_status(message, status.as_u16())
}

/// Pull the human-readable message out of an auth or row API error body.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn parse_user(user: &Value) -> Result<Identity, RemoteError> {
    let id = user["id"]
        .as_str()
        .ok_or_else(|| RemoteError::new("Missing user id in response"))?;
    Ok(Identity {
        id: id.to_string(),
        email: user.get("email").and_then(Value::as_str).map(String::from),
    })
}

fn parse_session(body: &Value) -> Result<AuthSession, RemoteError> {
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| RemoteError::new("Missing access token in response"))?;

    let expires_at = body
        .get("expires_at")
        .and_then(Value::as_i64)
        .or_else(|| {
            body.get("expires_in")
                .and_then(Value::as_i64)
                .map(|ei| chrono::Utc::now().timestamp() + ei)
        });

    Ok(AuthSession {
        access_token: access_token.to_string(),
        refresh_token: body
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(String::from),
        expires_at,
        token_type: body["token_type"].as_str().unwrap_or("bearer").to_string(),
        user: parse_user(&body["user"])?,
    })
}
