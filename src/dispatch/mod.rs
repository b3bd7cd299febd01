//! Execution dispatcher: runs one record's query text against an
//! external search provider.
//!
//! - [`QueryProvider`]: contract for the provider's result pages
//! - [`GoogleProvider`]: production provider scraping Google results
//! - [`Dispatcher`]: paced, bounded collection with classified failures

pub mod dispatcher;
pub mod provider;

pub use dispatcher::{Dispatcher, pacing_from_secs};
pub use provider::{GoogleProvider, QueryProvider};
