//! # CareLink Store
//!
//! The aggregate portal state: current session, active context, per-context
//! sync state and user preferences. All reads of context data go through an
//! authorization check for the current user.

pub mod board;
pub mod error;
pub mod session;
pub mod store;

pub use board::{SyncBoard, SyncState, SystemStatus};
pub use error::{Result, StoreError};
pub use session::{FileSessionStore, MemorySessionStore, PersistedState, Preferences, SessionStore};
pub use store::{Collaborators, ContextSnapshot, EcosystemStateStore, StoreConfig, MIN_REFRESH_INTERVAL};
