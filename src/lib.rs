//! # Taskhub Core
//!
//! This crate contains the data-access and authentication core of the Taskhub
//! task management service. HTTP routing, JSON wire shaping, and deployment
//! concerns live in the consuming server; this crate receives already-parsed
//! request parameters and returns domain objects or mapped errors.
//!
//! ## Module Organization
//!
//! - `db`: PostgreSQL connection pool, transaction manager, migration runner
//! - `models`: Entity repositories (users, tasks, categories)
//! - `services`: Composition services (atomic task creation, accounts)
//! - `auth`: Session tokens and password hashing
//! - `config`: Environment-based configuration
//! - `error`: Common error taxonomy

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::Error;

/// Current version of the taskhub core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
