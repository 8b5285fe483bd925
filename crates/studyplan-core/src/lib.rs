//! # Studyplan Core Library
//!
//! Client-side state for a study planner whose data lives in a hosted
//! backend (auth plus row storage). The `studyplan` CLI is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Remote boundary**: [`AuthBackend`] and [`Datastore`] traits, with an
//!   HTTP implementation ([`SupabaseClient`]) and an in-process one
//!   ([`MemoryBackend`])
//! - **Session**: [`SessionManager`] owns the current identity and publishes
//!   it on a watch channel
//! - **Stores**: [`TaskStore`] and [`ScheduleStore`] cache the signed-in
//!   user's rows and follow identity changes
//! - **Stats**: pure summaries over the cached lists
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionManager`]: sign-up, login, logout, password reset
//! - [`TaskStore`]: tasks ordered by due date
//! - [`ScheduleStore`]: weekly study hours per subject
//! - [`Config`]: application configuration management

pub mod error;
pub mod remote;
pub mod schedule;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;
pub mod task;

pub use error::{ClientError, ConfigError, CoreError, RemoteError, ValidationError};
pub use remote::{AuthBackend, AuthEvent, AuthEventKind, Datastore, Identity, MemoryBackend, SupabaseClient};
pub use schedule::{Day, DayOrder, ScheduleEntry, SchedulePatch};
pub use session::{IdentityWatch, SessionManager};
pub use stats::{DueStatus, ProgressTier, TaskSummary, WeekPlan};
pub use storage::Config;
pub use store::{Phase, ScheduleStore, TaskStore};
pub use task::Task;
