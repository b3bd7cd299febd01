//! Synchronization pipeline: paginated fetch → normalize → dedup →
//! persist → log.
//!
//! - [`PageSource`]: contract for the remote paginated feed
//! - [`GhdbSource`]: production source hitting the GHDB JSON endpoint
//! - [`SyncEngine`]: full and incremental synchronization runs

pub mod engine;
pub mod source;

pub use engine::{SyncEngine, SyncReport};
pub use source::{GhdbSource, PageSource};
