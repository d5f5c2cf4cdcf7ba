#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fundflow/fundflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Store implementations for fundflow aggregates.
//!
//! This crate provides implementations of the [`FinancialStore`] trait from
//! `fundflow-core`:
//!
//! - [`SqliteStore`] - persistent SQLite store (default, requires the
//!   `sqlite` feature)
//! - [`InMemoryStore`] - map-backed store for tests

/// In-memory store implementation.
pub mod memory;

/// SQLite store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use fundflow_core::FinancialStore;

// Re-export implementations
pub use memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
