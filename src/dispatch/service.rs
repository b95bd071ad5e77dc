//! External inference entry points
//!
//! The inference routines themselves live outside this crate. A resolved
//! configuration becomes one [`ServiceCall`]: an entry point plus the scalar
//! arguments it takes, in positional order. An [`InferenceEngine`] performs
//! the call.

use crate::config::ScalarValue;
use crate::error::{Error, ErrorCode, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Nuts,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Unit,
    Diag,
    Dense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeAlgorithm {
    Newton,
    Bfgs,
    Lbfgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationalAlgorithm {
    Meanfield,
    Fullrank,
}

/// One leaf of the dispatch decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    FixedParam,
    Hmc {
        engine: Engine,
        metric: Metric,
        adapt: bool,
        /// Whether a precomputed metric is passed to the sampler
        metric_file: bool,
    },
    Optimize(OptimizeAlgorithm),
    Variational(VariationalAlgorithm),
    DiagnoseGradient,
    GenerateQuantities,
    LogProb,
    Laplace,
    PathfinderSingle,
    PathfinderMulti,
}

impl Service {
    /// Name of the external routine, e.g. `hmc_nuts_diag_e_adapt`
    pub fn entry_point(&self) -> String {
        match self {
            Service::FixedParam => "fixed_param".to_string(),
            Service::Hmc { engine, metric, adapt, .. } => {
                let engine = match engine {
                    Engine::Nuts => "nuts",
                    Engine::Static => "static",
                };
                let metric = match metric {
                    Metric::Unit => "unit_e",
                    Metric::Diag => "diag_e",
                    Metric::Dense => "dense_e",
                };
                let suffix = if *adapt { "_adapt" } else { "" };
                format!("hmc_{engine}_{metric}{suffix}")
            }
            Service::Optimize(OptimizeAlgorithm::Newton) => "newton".to_string(),
            Service::Optimize(OptimizeAlgorithm::Bfgs) => "bfgs".to_string(),
            Service::Optimize(OptimizeAlgorithm::Lbfgs) => "lbfgs".to_string(),
            Service::Variational(VariationalAlgorithm::Meanfield) => "meanfield".to_string(),
            Service::Variational(VariationalAlgorithm::Fullrank) => "fullrank".to_string(),
            Service::DiagnoseGradient => "diagnose".to_string(),
            Service::GenerateQuantities => "standalone_generate".to_string(),
            Service::LogProb => "log_prob_grad".to_string(),
            Service::Laplace => "laplace_sample".to_string(),
            Service::PathfinderSingle => "pathfinder_lbfgs_single".to_string(),
            Service::PathfinderMulti => "pathfinder_lbfgs_multi".to_string(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entry_point())
    }
}

/// Named positional argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceArg {
    pub name: String,
    pub value: ScalarValue,
}

/// A fully resolved invocation of one external routine
///
/// `args` are positional. The metric-file overloads of the samplers take
/// `metric_file` first, ahead of `seed`, `id` and `init`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCall {
    pub service: Service,
    pub args: Vec<ServiceArg>,
}

impl ServiceCall {
    pub fn entry_point(&self) -> String {
        self.service.entry_point()
    }

    pub fn arg(&self, name: &str) -> Option<&ScalarValue> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn arg_names(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.name.as_str()).collect()
    }
}

/// The external collaborator that runs inference routines
pub trait InferenceEngine {
    /// Number of unconstrained parameters of the loaded model
    fn num_params(&self) -> usize;

    /// Run one routine to completion and report its status
    ///
    /// A routine that cannot be started or aborts reports [`Error::Service`].
    fn invoke(&mut self, call: &ServiceCall) -> Result<ErrorCode>;
}

/// Engine that records calls instead of running them
#[derive(Debug, Clone, Default)]
pub struct DryRunEngine {
    num_params: usize,
    calls: Vec<ServiceCall>,
    failure: Option<String>,
}

impl DryRunEngine {
    pub fn new(num_params: usize) -> Self {
        Self {
            num_params,
            calls: Vec::new(),
            failure: None,
        }
    }

    /// Engine whose every call fails with `message` after being recorded
    pub fn failing(num_params: usize, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(num_params)
        }
    }

    pub fn calls(&self) -> &[ServiceCall] {
        &self.calls
    }
}

impl InferenceEngine for DryRunEngine {
    fn num_params(&self) -> usize {
        self.num_params
    }

    fn invoke(&mut self, call: &ServiceCall) -> Result<ErrorCode> {
        tracing::info!(
            entry_point = %call.service,
            args = call.args.len(),
            "dry run: recording service call"
        );
        for arg in &call.args {
            tracing::debug!(name = %arg.name, value = %arg.value, "service argument");
        }
        self.calls.push(call.clone());
        match &self.failure {
            Some(message) => Err(Error::Service(format!("{}: {}", call.service, message))),
            None => Ok(ErrorCode::Ok),
        }
    }
}
