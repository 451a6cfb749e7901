//! The `services` module provides a high-level API for interacting with the database.
//! It encapsulates the query logic so that HTTP handlers and the monitor scheduler
//! work with entity models without building queries themselves.
//!
//! Each sub-module is responsible for one table.

pub mod check_service;
pub mod monitor_service;
pub mod request_log_service;
pub mod user_service;
