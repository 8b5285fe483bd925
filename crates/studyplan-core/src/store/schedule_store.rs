use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;

use super::{fetch_owned, first_row, owned_row, Collection, Phase};
use crate::error::{ClientError, ValidationError};
use crate::remote::{Datastore, Identity, Order};
use crate::schedule::{DayOrder, NewScheduleEntry, ScheduleEntry, SchedulePatch, SCHEDULES_TABLE};
use crate::session::IdentityWatch;

/// The signed-in user's weekly schedule.
///
/// Entries are fetched ordered by day; [`DayOrder`] decides whether that
/// means calendar order or the backend's string order. Entries added or
/// edited afterwards keep their position until the next fetch.
pub struct ScheduleStore<B: Datastore> {
    backend: Arc<B>,
    state: Collection<ScheduleEntry>,
    day_order: DayOrder,
}

impl<B: Datastore> ScheduleStore<B> {
    pub fn new(backend: Arc<B>, identity: Option<Identity>) -> Self {
        Self {
            backend,
            state: Collection::new(identity),
            day_order: DayOrder::default(),
        }
    }

    pub fn with_day_order(mut self, order: DayOrder) -> Self {
        self.day_order = order;
        self
    }

    pub async fn open(backend: Arc<B>, identity: Option<Identity>, order: DayOrder) -> Self {
        let mut store = Self::new(backend, identity).with_day_order(order);
        store.fetch().await;
        store
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        self.state.items()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_loading(&self) -> bool {
        self.state.phase() == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    pub fn day_order(&self) -> DayOrder {
        self.day_order
    }

    pub async fn fetch(&mut self) {
        let Some(owner) = self.state.identity().cloned() else {
            self.state.go_idle();
            return;
        };
        self.state.begin_fetch();
        let result = fetch_owned(&*self.backend, SCHEDULES_TABLE, &owner, &Order::asc("day"))
            .await
            .map(|mut entries: Vec<ScheduleEntry>| {
                self.day_order.apply(&mut entries);
                entries
            });
        self.state.finish_fetch(SCHEDULES_TABLE, result);
    }

    pub async fn refresh(&mut self) {
        self.fetch().await;
    }

    pub async fn set_identity(&mut self, identity: Option<Identity>) {
        if self.state.switch_identity(identity) {
            self.fetch().await;
        }
    }

    pub async fn follow(&mut self, watch: &mut IdentityWatch) -> bool {
        if !watch.has_changed().unwrap_or(false) {
            return false;
        }
        let identity = watch.borrow_and_update().clone();
        self.set_identity(identity).await;
        true
    }

    /// Add an entry. Checks run in order: identity, day, subject, hours.
    /// Hours above [`MAX_STUDY_HOURS`](crate::schedule::MAX_STUDY_HOURS) are
    /// accepted here.
    pub async fn add_schedule_item(
        &mut self,
        day: &str,
        subject: &str,
        study_hours: f64,
    ) -> Result<ScheduleEntry, ClientError> {
        let owner = self.state.begin_mutation()?;
        let new_entry = NewScheduleEntry::new(&owner.id, day, subject, study_hours, Utc::now())?;
        let row = serde_json::to_value(&new_entry)?;

        let inserted = match self.backend.insert(SCHEDULES_TABLE, row).await {
            Ok(row) => serde_json::from_value::<ScheduleEntry>(row).map_err(ClientError::from),
            Err(err) => Err(err.into()),
        };
        let entry = inserted.map_err(|err| self.state.fail("add_schedule_item", err))?;

        tracing::info!(id = entry.id, day = %entry.day, subject = %entry.subject, "schedule entry added");
        self.state.items_mut().push(entry.clone());
        Ok(entry)
    }

    /// Send `patch` as-is and merge it into the cached entry.
    pub async fn update_schedule_item(
        &mut self,
        id: i64,
        patch: SchedulePatch,
    ) -> Result<Option<ScheduleEntry>, ClientError> {
        let owner = self.state.begin_mutation()?;
        if id <= 0 {
            return Err(ValidationError::ScheduleIdRequired.into());
        }
        let body = serde_json::to_value(&patch)?;

        let updated = match self
            .backend
            .update(SCHEDULES_TABLE, &owned_row(&owner, id), body)
            .await
        {
            Ok(rows) => first_row::<ScheduleEntry>(rows),
            Err(err) => Err(err.into()),
        };
        let updated = updated.map_err(|err| self.state.fail("update_schedule_item", err))?;

        for entry in self.state.items_mut().iter_mut().filter(|e| e.id == id) {
            patch.apply(entry);
        }
        tracing::debug!(id, "schedule entry updated");
        Ok(updated)
    }

    pub async fn delete_schedule_item(&mut self, id: i64) -> Result<(), ClientError> {
        let owner = self.state.begin_mutation()?;
        if id <= 0 {
            return Err(ValidationError::ScheduleIdRequired.into());
        }

        if let Err(err) = self
            .backend
            .delete(SCHEDULES_TABLE, &owned_row(&owner, id))
            .await
        {
            return Err(self.state.fail("delete_schedule_item", err.into()));
        }

        self.state.items_mut().retain(|e| e.id != id);
        tracing::info!(id, "schedule entry deleted");
        Ok(())
    }

    /// Hours per subject over the whole week, keyed in first-seen order.
    pub fn subject_hours(&self) -> IndexMap<String, f64> {
        let mut totals: IndexMap<String, f64> = IndexMap::new();
        for entry in self.state.items() {
            *totals.entry(entry.subject.clone()).or_insert(0.0) += entry.study_hours;
        }
        totals
    }

    pub fn total_hours(&self) -> f64 {
        self.state.items().iter().map(|e| e.study_hours).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;
    use serde_json::json;

    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            SCHEDULES_TABLE,
            [
                json!({"user_id": "u1", "day": "Wednesday", "subject": "Chemistry", "study_hours": 1.0, "created_at": "2025-01-01T00:00:00Z"}),
                json!({"user_id": "u1", "day": "Friday", "subject": "Math", "study_hours": 2.0, "created_at": "2025-01-01T00:00:00Z"}),
                json!({"user_id": "u1", "day": "Monday", "subject": "Math", "study_hours": 1.5, "created_at": "2025-01-01T00:00:00Z"}),
                json!({"user_id": "u2", "day": "Monday", "subject": "Art", "study_hours": 4.0, "created_at": "2025-01-01T00:00:00Z"}),
            ],
        );
        backend
    }

    fn days(store: &ScheduleStore<MemoryBackend>) -> Vec<&'static str> {
        store.entries().iter().map(|e| e.day.as_str()).collect()
    }

    #[tokio::test]
    async fn calendar_order_is_default() {
        let store = ScheduleStore::open(seeded(), Some(Identity::new("u1", None)), DayOrder::Calendar).await;
        assert_eq!(days(&store), vec!["Monday", "Wednesday", "Friday"]);
    }

    #[tokio::test]
    async fn stored_order_compares_names() {
        let store = ScheduleStore::open(seeded(), Some(Identity::new("u1", None)), DayOrder::Stored).await;
        assert_eq!(days(&store), vec!["Friday", "Monday", "Wednesday"]);
    }

    #[tokio::test]
    async fn subject_hours_keeps_first_seen_order() {
        let store = ScheduleStore::open(seeded(), Some(Identity::new("u1", None)), DayOrder::Calendar).await;
        let hours = store.subject_hours();
        let keys: Vec<&str> = hours.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Math", "Chemistry"]);
        assert_eq!(hours["Math"], 3.5);
        assert_eq!(store.total_hours(), 4.5);
    }

    #[tokio::test]
    async fn update_rejects_missing_id() {
        let backend = seeded();
        let mut store = ScheduleStore::open(Arc::clone(&backend), Some(Identity::new("u1", None)), DayOrder::Calendar).await;
        let calls = backend.calls();
        assert_eq!(
            store.update_schedule_item(0, SchedulePatch::default()).await,
            Err(ClientError::Validation(ValidationError::ScheduleIdRequired))
        );
        assert_eq!(backend.calls(), calls);
    }
}
