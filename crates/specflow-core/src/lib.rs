#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! specflow-core library.
//!
//! Work-unit lifecycle engine: the data model, the column-indexed collection,
//! coverage checks and the status transition validator, plus the repository
//! and config layers the CLI drives them with.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return typed errors ([`error::WorkflowError`],
//!   [`collection::SnapshotError`], [`store::StoreError`]); config loading uses
//!   `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod collection;
pub mod config;
pub mod coverage;
pub mod error;
pub mod lock;
pub mod model;
pub mod store;
pub mod workflow;

pub use collection::WorkUnitCollection;
pub use error::{ErrorCode, WorkflowError};
