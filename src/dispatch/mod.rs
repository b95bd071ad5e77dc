//! Dispatch of a parsed configuration to an inference routine
//!
//! ```no_run
//! use bayescmd::config::ArgumentTree;
//! use bayescmd::dispatch::{dispatch, DryRunEngine};
//!
//! let mut tree = ArgumentTree::standard().unwrap();
//! tree.parse(["sample", "num_samples=100"]).unwrap();
//! let mut engine = DryRunEngine::new(3);
//! let _status = dispatch(&tree, &mut engine).unwrap();
//! ```

mod resolve;
mod service;
mod validate;

pub use resolve::{dispatch, resolve, SEED_FROM_CLOCK};
pub use service::{
    DryRunEngine, Engine, InferenceEngine, Metric, OptimizeAlgorithm, Service, ServiceArg, ServiceCall,
    VariationalAlgorithm,
};
pub use validate::{check_files, check_outputs, check_policy, PolicyError};
