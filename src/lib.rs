//! # Bayescmd: Argument Tree & Dispatch for Bayesian Inference Engines
//!
//! Bayescmd turns a flat list of `name=value` command-line tokens into a
//! validated, hierarchical configuration and maps it onto exactly one external
//! inference routine.
//!
//! ## Architecture
//!
//! - **config**: Option schema, tree parser, echo/help rendering and the self-test probe
//! - **dispatch**: Policy checks and the method-to-routine decision table
//! - **error**: Crate error type and process exit codes

pub mod config;
pub mod dispatch;

pub mod error;

// Re-export commonly used types
pub use config::{ArgumentTree, ParseSummary, UsageError};
pub use dispatch::{dispatch, resolve, InferenceEngine, ServiceCall};
pub use error::{Error, ErrorCode, Result};
