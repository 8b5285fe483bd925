use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;

use super::{fetch_owned, first_row, owned_row, Collection, Phase};
use crate::error::ClientError;
use crate::remote::{Datastore, Identity, Order};
use crate::session::IdentityWatch;
use crate::task::{NewTask, Task, TASKS_TABLE};

/// The signed-in user's tasks, ordered by due date ascending.
pub struct TaskStore<B: Datastore> {
    backend: Arc<B>,
    state: Collection<Task>,
}

impl<B: Datastore> TaskStore<B> {
    /// Create a store without fetching. With an identity the store starts
    /// in [`Phase::Loading`] until [`fetch`](Self::fetch) runs.
    pub fn new(backend: Arc<B>, identity: Option<Identity>) -> Self {
        Self {
            backend,
            state: Collection::new(identity),
        }
    }

    /// Create a store and run the initial fetch.
    pub async fn open(backend: Arc<B>, identity: Option<Identity>) -> Self {
        let mut store = Self::new(backend, identity);
        store.fetch().await;
        store
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.items()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_loading(&self) -> bool {
        self.state.phase() == Phase::Loading
    }

    /// Message of the last failed fetch or mutation.
    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    /// Replace the list with the owner's tasks. Failures land in
    /// [`error`](Self::error) and keep the previous list.
    pub async fn fetch(&mut self) {
        let Some(owner) = self.state.identity().cloned() else {
            self.state.go_idle();
            return;
        };
        self.state.begin_fetch();
        let result = fetch_owned(&*self.backend, TASKS_TABLE, &owner, &Order::asc("due_date")).await;
        self.state.finish_fetch(TASKS_TABLE, result);
    }

    pub async fn refresh(&mut self) {
        self.fetch().await;
    }

    /// Follow an identity change: clear on sign-out, refetch on a new user.
    pub async fn set_identity(&mut self, identity: Option<Identity>) {
        if self.state.switch_identity(identity) {
            self.fetch().await;
        }
    }

    /// Apply the latest identity from `watch` if it changed since the last
    /// look. Returns whether anything changed.
    pub async fn follow(&mut self, watch: &mut IdentityWatch) -> bool {
        if !watch.has_changed().unwrap_or(false) {
            return false;
        }
        let identity = watch.borrow_and_update().clone();
        self.set_identity(identity).await;
        true
    }

    /// Create a task due on `due_date` and append it to the list.
    pub async fn add_task(&mut self, task_name: &str, due_date: NaiveDate) -> Result<Task, ClientError> {
        let owner = self.state.begin_mutation()?;
        let new_task = NewTask::new(&owner.id, task_name, due_date, Utc::now())?;
        let row = serde_json::to_value(&new_task)?;

        let inserted = match self.backend.insert(TASKS_TABLE, row).await {
            Ok(row) => serde_json::from_value::<Task>(row).map_err(ClientError::from),
            Err(err) => Err(err.into()),
        };
        let task = inserted.map_err(|err| self.state.fail("add_task", err))?;

        tracing::info!(id = task.id, name = %task.task_name, "task added");
        self.state.items_mut().push(task.clone());
        Ok(task)
    }

    /// Flip a task's completion flag. `current` is the value the caller
    /// displayed; the stored flag becomes `!current`.
    pub async fn toggle_completion(&mut self, id: i64, current: bool) -> Result<Option<Task>, ClientError> {
        let owner = self.state.begin_mutation()?;
        let completed = !current;

        let updated = match self
            .backend
            .update(TASKS_TABLE, &owned_row(&owner, id), json!({ "completed": completed }))
            .await
        {
            Ok(rows) => first_row::<Task>(rows),
            Err(err) => Err(err.into()),
        };
        let updated = updated.map_err(|err| self.state.fail("toggle_completion", err))?;

        for task in self.state.items_mut().iter_mut().filter(|t| t.id == id) {
            task.completed = completed;
        }
        tracing::debug!(id, completed, "task toggled");
        Ok(updated)
    }

    /// Delete a task remotely, then drop it from the list.
    pub async fn delete_task(&mut self, id: i64) -> Result<(), ClientError> {
        let owner = self.state.begin_mutation()?;

        if let Err(err) = self.backend.delete(TASKS_TABLE, &owned_row(&owner, id)).await {
            return Err(self.state.fail("delete_task", err.into()));
        }

        self.state.items_mut().retain(|t| t.id != id);
        tracing::info!(id, "task deleted");
        Ok(())
    }
}
