//! Client-side stores caching one remote collection each.
//!
//! Both stores share the same state machine:
//!
//! ```text
//! Idle (no identity) --fetch--> Loading --ok--> Ready
//!                                       \--err-> Failed (stale list kept)
//! ```
//!
//! Mutations never pass through `Loading`; a failed mutation only updates
//! the surfaced error. Identity changes follow [`IdentityTransition`].

mod schedule_store;
mod task_store;

pub use schedule_store::ScheduleStore;
pub use task_store::TaskStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::remote::{Datastore, Filter, Identity, Order};

/// Where a store is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No identity; the list is empty.
    Idle,
    /// A full fetch is pending or in flight.
    Loading,
    Ready,
    /// The last fetch failed; the list is whatever it was before.
    Failed,
}

/// What a store does when its identity argument changes.
///
/// | current | next              | action                              |
/// |---------|-------------------|-------------------------------------|
/// | any     | equal to current  | nothing                             |
/// | any     | `None`            | clear list, go `Idle`, no fetch     |
/// | any     | `Some(other)`     | clear list, go `Loading`, fetch     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityTransition {
    Unchanged,
    Clear,
    Refetch,
}

impl IdentityTransition {
    pub fn between(current: Option<&Identity>, next: Option<&Identity>) -> Self {
        match (current, next) {
            (a, b) if a == b => IdentityTransition::Unchanged,
            (_, None) => IdentityTransition::Clear,
            (_, Some(_)) => IdentityTransition::Refetch,
        }
    }
}

/// List, phase and error shared by both stores.
#[derive(Debug)]
pub(crate) struct Collection<T> {
    identity: Option<Identity>,
    items: Vec<T>,
    phase: Phase,
    error: Option<String>,
}

impl<T> Collection<T> {
    pub(crate) fn new(identity: Option<Identity>) -> Self {
        let phase = if identity.is_some() {
            Phase::Loading
        } else {
            Phase::Idle
        };
        Self {
            identity,
            items: Vec::new(),
            phase,
            error: None,
        }
    }

    pub(crate) fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub(crate) fn items(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Identity for a mutation, cloned so the store can be borrowed mutably
    /// while the call is in flight. Clears the previous error.
    pub(crate) fn begin_mutation(&mut self) -> Result<Identity, ClientError> {
        let owner = self.identity.clone().ok_or(ClientError::NotAuthenticated)?;
        self.error = None;
        Ok(owner)
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.phase = Phase::Loading;
        self.error = None;
    }

    pub(crate) fn finish_fetch(&mut self, table: &str, result: Result<Vec<T>, ClientError>) {
        match result {
            Ok(items) => {
                tracing::debug!(table, count = items.len(), "fetched");
                self.items = items;
                self.phase = Phase::Ready;
            }
            Err(err) => {
                tracing::warn!(table, error = %err, "fetch failed");
                self.error = Some(err.to_string());
                self.phase = Phase::Failed;
            }
        }
    }

    /// Surface a failed mutation without touching the list or phase.
    pub(crate) fn fail(&mut self, op: &str, err: ClientError) -> ClientError {
        tracing::warn!(op, error = %err, "mutation failed");
        self.error = Some(err.to_string());
        err
    }

    pub(crate) fn go_idle(&mut self) {
        self.items.clear();
        self.error = None;
        self.phase = Phase::Idle;
    }

    /// Apply the identity transition table. Returns `true` when the caller
    /// must fetch.
    pub(crate) fn switch_identity(&mut self, next: Option<Identity>) -> bool {
        match IdentityTransition::between(self.identity.as_ref(), next.as_ref()) {
            IdentityTransition::Unchanged => false,
            IdentityTransition::Clear => {
                tracing::debug!("identity cleared");
                self.identity = None;
                self.go_idle();
                false
            }
            IdentityTransition::Refetch => {
                tracing::debug!("identity changed, refetching");
                self.identity = next;
                self.items.clear();
                self.begin_fetch();
                true
            }
        }
    }
}

/// Filters scoping a row operation to one row of one owner.
pub(crate) fn owned_row(owner: &Identity, id: i64) -> [Filter; 2] {
    [Filter::eq("id", id), Filter::eq("user_id", owner.id.as_str())]
}

/// Fetch every row `owner` holds in `table`.
pub(crate) async fn fetch_owned<D, T>(
    backend: &D,
    table: &str,
    owner: &Identity,
    order: &Order,
) -> Result<Vec<T>, ClientError>
where
    D: Datastore,
    T: DeserializeOwned,
{
    let rows = backend
        .select(table, &[Filter::eq("user_id", owner.id.as_str())], Some(order))
        .await?;
    decode_rows(rows)
}

pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, ClientError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClientError::from))
        .collect()
}

/// First returned row, if the backend echoed any.
pub(crate) fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, ClientError> {
    Ok(decode_rows(rows)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;

    fn who(id: &str) -> Identity {
        Identity::new(id, None)
    }

    #[test]
    fn transition_table() {
        let u1 = who("u1");
        let u2 = who("u2");
        assert_eq!(IdentityTransition::between(None, None), IdentityTransition::Unchanged);
        assert_eq!(
            IdentityTransition::between(Some(&u1), Some(&u1)),
            IdentityTransition::Unchanged
        );
        assert_eq!(IdentityTransition::between(Some(&u1), None), IdentityTransition::Clear);
        assert_eq!(IdentityTransition::between(None, Some(&u1)), IdentityTransition::Refetch);
        assert_eq!(
            IdentityTransition::between(Some(&u1), Some(&u2)),
            IdentityTransition::Refetch
        );
    }

    #[test]
    fn new_collection_phase_follows_identity() {
        assert_eq!(Collection::<i32>::new(None).phase(), Phase::Idle);
        assert_eq!(Collection::<i32>::new(Some(who("u1"))).phase(), Phase::Loading);
    }

    #[test]
    fn failed_fetch_keeps_stale_items() {
        let mut c = Collection::new(Some(who("u1")));
        c.finish_fetch("t", Ok(vec![1, 2]));
        c.begin_fetch();
        c.finish_fetch("t", Err(RemoteError::new("offline").into()));
        assert_eq!(c.items(), &[1, 2]);
        assert_eq!(c.phase(), Phase::Failed);
        assert_eq!(c.error(), Some("offline"));
    }

    #[test]
    fn clearing_identity_empties_list() {
        let mut c = Collection::new(Some(who("u1")));
        c.finish_fetch("t", Ok(vec![1]));
        assert!(!c.switch_identity(None));
        assert!(c.items().is_empty());
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn mutation_without_identity_is_rejected() {
        let mut c = Collection::<i32>::new(None);
        assert_eq!(c.begin_mutation(), Err(ClientError::NotAuthenticated));
    }
}
