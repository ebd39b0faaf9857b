//! Diabetes progression triage service
//!
//! This crate trains a regression pipeline (feature scaling + estimator) on
//! the 10-feature diabetes dataset, persists it together with a metrics
//! record as a versioned artifact pair, and serves bounded risk scores over
//! a minimal HTTP API.
//!
//! # Modules
//!
//! - [`dataset`] - canonical dataset, CSV loading, seeded train/test splits
//! - [`preprocessing`] - feature scaling with statistics frozen at fit time
//! - [`training`] - model families and the train/evaluate contract
//! - [`pipeline`] - the fitted scaler-plus-estimator unit
//! - [`artifacts`] - versioned artifact pair persistence and the metrics record
//! - [`server`] - HTTP server with health and predict endpoints

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod preprocessing;
pub mod server;
pub mod training;

pub use error::{Result, TriageError};
