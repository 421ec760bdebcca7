//! Finance Agent Core Library
//!
//! Models, configuration, local storage and session state for the
//! Finance Agent client.

pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::*;
pub use session::{SessionContext, SessionEvent};
pub use storage::{Database, KeyValueStore, MemoryStore};
