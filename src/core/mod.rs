//! Shared primitives for the hwledger runtime.
//!
//! Everything here is domain-neutral: errors, configuration, SQLite access,
//! timestamps, logging setup and terminal rendering helpers.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod schemas;
pub mod store;
pub mod time;
