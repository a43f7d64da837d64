//! CareLink portal node
//!
//! Wires the authorization engine, the sync coordinator and the ecosystem
//! store to their production collaborators: the portal REST API, a JSON
//! session file, the tracing audit sink and the system clock.

pub mod config;
pub mod portal;

pub use config::PortalConfig;
pub use portal::{open_store, CheckRequest};
