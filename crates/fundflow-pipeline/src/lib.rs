#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fundflow/fundflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Sequential aggregation pipeline runner.
//!
//! [`Aggregator`] wires the provider seams (a [`FundamentalsSource`] and a
//! [`PriceSource`]), the bulk snapshot loader, and a [`FinancialStore`] into
//! one `run_*` function per cron route. Runs are strictly sequential: one
//! ticker or group at a time, each failure caught and recorded rather than
//! aborting the run.
//!
//! [`FundamentalsSource`]: fundflow_core::FundamentalsSource
//! [`PriceSource`]: fundflow_core::PriceSource
//! [`FinancialStore`]: fundflow_core::FinancialStore

/// Pipeline runs over sources, the bulk snapshot, and the store.
pub mod aggregator;

pub use aggregator::Aggregator;
