//! # Task Tracker Shared Library
//!
//! Core of the task tracker: data models, storage, and the account, task
//! and report services used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: users, sessions, tasks, report windows and summaries
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `services`: account, task and report operations
//! - `auth`: password hashing and session token primitives
//! - `export`: CSV and PDF exports
//! - `db`: connection pool and migrations
//! - `error`: the shared error type

pub mod auth;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod store;

pub use error::{CoreError, CoreResult};

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
