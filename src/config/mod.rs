//! Configuration tree
//!
//! A self-describing hierarchy of typed options, parsed from a flat token
//! list such as
//!
//! ```text
//! sample num_warmup=500 adapt delta=0.95 algorithm=hmc engine=nuts max_depth=12 data file=bernoulli.json
//! ```
//!
//! Entering a record or alternative by name lets the following tokens name
//! its options directly, until a token arrives that none of them claims.
//!
//! # Example
//!
//! ```
//! use bayescmd::config::ArgumentTree;
//!
//! let mut tree = ArgumentTree::standard()?;
//! tree.parse(["sample", "num_warmup=500", "adapt", "delta=0.95"])?;
//! assert_eq!(tree.get::<i32>("method.sample.num_warmup"), Some(500));
//! assert_eq!(tree.active("method.sample.algorithm.hmc.metric"), Some("diag_e"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod cli;
mod loader;
mod matcher;
mod node;
mod parser;
mod probe;
mod render;
mod scalar;
mod schema;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod property_tests;

pub use builder::{build, SchemaError};
pub use cli::{collect_tokens, parse_args, Cli, OutputFormat};
pub use loader::{load_tokens, tokens_from_yaml};
pub use matcher::{split_token, HelpRequest, InvalidValue, ParseOutcome, TokenStack};
pub use node::{split_path, AnyLeaf, Choice, ConfigNode, Flag, KnownValue, Leaf, Record};
pub use parser::{config_path, ArgumentTree, ParseSummary, UsageError, PARSE_FAILURE};
pub use probe::{Expectation, Probe, ProbeCase, ProbeFailure};
pub use render::{echo_tokens, json_fields};
pub use scalar::{Rule, Scalar, ScalarValue};
pub use schema::{Decl, METHOD, TOP_LEVEL};
