//! Data structures shared across the application.

pub mod config;
pub mod dork;
pub mod page;

pub use config::{Config, DispatchConfig, SyncConfig};
pub use dork::{Category, Dork, NewDork, SyncRun};
pub use page::{DorkPage, RawCategory, RawEntry};
