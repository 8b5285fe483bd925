use std::future::Future;

use serde_json::Value;
use tokio::sync::broadcast;

use super::types::{AuthEvent, Filter, Identity, Order};
use crate::error::RemoteError;

/// Authentication half of the hosted backend.
///
/// Every call is single-shot; failures carry the service's own message.
pub trait AuthBackend: Send + Sync + 'static {
    /// Register a new user. `None` when the service withholds the user
    /// until the address is confirmed.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<Identity>, RemoteError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, RemoteError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Ask the service to send a reset message.
    fn reset_password(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Change the password of the signed-in user.
    fn update_password(
        &self,
        new_password: &str,
    ) -> impl Future<Output = Result<Identity, RemoteError>> + Send;

    /// The identity of any session the client already holds.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Identity>, RemoteError>> + Send;

    /// Session-change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Row-oriented half of the hosted backend.
///
/// Rows travel as JSON objects keyed by column name. Authorization is the
/// service's job; filters here exist for correctness only.
pub trait Datastore: Send + Sync + 'static {
    fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> impl Future<Output = Result<Vec<Value>, RemoteError>> + Send;

    /// Insert one row and return it as stored (with its generated id).
    fn insert(
        &self,
        table: &str,
        row: Value,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    /// Apply `patch` to every matching row and return the updated rows.
    fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> impl Future<Output = Result<Vec<Value>, RemoteError>> + Send;

    fn delete(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
