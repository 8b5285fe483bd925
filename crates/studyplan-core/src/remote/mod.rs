//! The remote-service boundary: auth and row storage.
//!
//! Stores and the session manager only see the [`AuthBackend`] and
//! [`Datastore`] traits. [`SupabaseClient`] talks HTTP to a hosted project;
//! [`MemoryBackend`] keeps everything in process.

pub mod keyring_store;
pub mod memory;
pub mod supabase;
pub mod traits;
pub mod types;

pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;
pub use traits::{AuthBackend, Datastore};
pub use types::{AuthEvent, AuthEventKind, AuthSession, Filter, Identity, Order};
