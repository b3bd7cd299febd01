// src/lib.rs

//! dorkdex Library

pub mod dispatch;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod utils;
