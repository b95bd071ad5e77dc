//! Dispatch decision table
//!
//! The active alternatives of a few choices pick exactly one [`Service`]; the
//! leaf values it needs are then read by path, in the order the routine takes
//! them.

use super::service::{
    Engine, InferenceEngine, Metric, OptimizeAlgorithm, Service, ServiceArg, ServiceCall, VariationalAlgorithm,
};
use super::validate::check_policy;
use crate::config::{ArgumentTree, Scalar, ScalarValue, UsageError};
use crate::error::{Error, ErrorCode, Result};
use chrono::Utc;

/// Seed value meaning "derive from the clock"
pub const SEED_FROM_CLOCK: i64 = -1;

const SAMPLE: &str = "method.sample";
const HMC: &str = "method.sample.algorithm.hmc";
const OPTIMIZE: &str = "method.optimize";
const VARIATIONAL: &str = "method.variational";
const PATHFINDER: &str = "method.pathfinder";

const LBFGS_TOLERANCES: &[&str] = &["init_alpha", "tol_obj", "tol_rel_obj", "tol_grad", "tol_rel_grad", "tol_param"];

/// Resolve a parsed tree into a single service call
///
/// Runs the policy checks first, so a returned call is always dispatchable
/// for a model with `num_params` parameters.
pub fn resolve(tree: &ArgumentTree, num_params: usize) -> Result<ServiceCall> {
    let method = tree.method().ok_or(UsageError::MissingMethod)?;
    check_policy(tree, num_params)?;

    let call = match method {
        "sample" => resolve_sample(tree)?,
        "optimize" => resolve_optimize(tree)?,
        "variational" => resolve_variational(tree)?,
        "diagnose" => resolve_diagnose(tree)?,
        "generate_quantities" => {
            let mut args = Args::new(tree);
            args.under("method.generate_quantities", &["fitted_params", "num_chains"])?;
            args.seed()?;
            args.finish(Service::GenerateQuantities)
        }
        "log_prob" => {
            let mut args = Args::new(tree);
            args.under("method.log_prob", &["unconstrained_params", "constrained_params", "jacobian"])?;
            args.finish(Service::LogProb)
        }
        "laplace" => {
            let mut args = Args::new(tree);
            args.under("method.laplace", &["mode", "jacobian", "draws", "calculate_lp"])?;
            args.seed()?;
            args.leaf("refresh", "output.refresh")?;
            args.finish(Service::Laplace)
        }
        "pathfinder" => resolve_pathfinder(tree)?,
        other => return Err(Error::ConfigError(format!("No routine for method {other}"))),
    };

    tracing::debug!(method, entry_point = %call.service, "resolved service call");
    Ok(call)
}

/// Resolve and invoke; the engine's status becomes the process status
pub fn dispatch<E: InferenceEngine>(tree: &ArgumentTree, engine: &mut E) -> Result<ErrorCode> {
    let call = resolve(tree, engine.num_params())?;
    engine.invoke(&call)
}

fn resolve_sample(tree: &ArgumentTree) -> Result<ServiceCall> {
    let mut args = Args::new(tree);

    if active(tree, "method.sample.algorithm")? == "fixed_param" {
        args.shared()?;
        args.under(SAMPLE, &["num_samples", "thin"])?;
        args.leaf("refresh", "output.refresh")?;
        return Ok(args.finish(Service::FixedParam));
    }

    let engine = match active(tree, "method.sample.algorithm.hmc.engine")? {
        "static" => Engine::Static,
        _ => Engine::Nuts,
    };
    let metric = match active(tree, "method.sample.algorithm.hmc.metric")? {
        "unit_e" => Metric::Unit,
        "dense_e" => Metric::Dense,
        _ => Metric::Diag,
    };
    let adapt = args.get::<bool>("method.sample.adapt.engaged")?;

    // the metric overloads take the metric ahead of the shared arguments
    let metric_path = args.get::<String>("method.sample.algorithm.hmc.metric_file")?;
    let metric_file = match (metric, metric_path.is_empty()) {
        (_, true) => false,
        (Metric::Unit, false) => {
            tracing::warn!(metric_file = %metric_path, "unit_e metric takes no metric file; ignoring it");
            false
        }
        _ => true,
    };
    if metric_file {
        args.push("metric_file", ScalarValue::Text(metric_path));
    }
    args.shared()?;

    args.under(SAMPLE, &["num_warmup", "num_samples", "num_chains", "thin", "save_warmup"])?;
    args.leaf("refresh", "output.refresh")?;
    args.under(HMC, &["stepsize", "stepsize_jitter"])?;
    match engine {
        Engine::Nuts => args.leaf("max_depth", "method.sample.algorithm.hmc.engine.nuts.max_depth")?,
        Engine::Static => args.leaf("int_time", "method.sample.algorithm.hmc.engine.static.int_time")?,
    }
    if adapt {
        args.under("method.sample.adapt", &["delta", "gamma", "kappa", "t0"])?;
        // unit metrics have no windowed adaptation
        if metric != Metric::Unit {
            args.under("method.sample.adapt", &["init_buffer", "term_buffer", "window"])?;
        }
    }

    Ok(args.finish(Service::Hmc {
        engine,
        metric,
        adapt,
        metric_file,
    }))
}

fn resolve_optimize(tree: &ArgumentTree) -> Result<ServiceCall> {
    let mut args = Args::new(tree);
    args.shared()?;

    let algorithm = match active(tree, "method.optimize.algorithm")? {
        "newton" => OptimizeAlgorithm::Newton,
        "bfgs" => {
            args.under("method.optimize.algorithm.bfgs", LBFGS_TOLERANCES)?;
            OptimizeAlgorithm::Bfgs
        }
        _ => {
            args.leaf("history_size", "method.optimize.algorithm.lbfgs.history_size")?;
            args.under("method.optimize.algorithm.lbfgs", LBFGS_TOLERANCES)?;
            OptimizeAlgorithm::Lbfgs
        }
    };
    args.under(OPTIMIZE, &["iter", "save_iterations", "jacobian"])?;
    if algorithm != OptimizeAlgorithm::Newton {
        args.leaf("refresh", "output.refresh")?;
    }
    Ok(args.finish(Service::Optimize(algorithm)))
}

fn resolve_variational(tree: &ArgumentTree) -> Result<ServiceCall> {
    let mut args = Args::new(tree);
    args.shared()?;
    args.under(VARIATIONAL, &["grad_samples", "elbo_samples", "iter", "tol_rel_obj", "eta"])?;
    args.leaf("adapt_engaged", "method.variational.adapt.engaged")?;
    args.leaf("adapt_iter", "method.variational.adapt.iter")?;
    args.under(VARIATIONAL, &["eval_elbo", "output_samples"])?;

    let algorithm = match active(tree, "method.variational.algorithm")? {
        "fullrank" => VariationalAlgorithm::Fullrank,
        _ => VariationalAlgorithm::Meanfield,
    };
    Ok(args.finish(Service::Variational(algorithm)))
}

fn resolve_diagnose(tree: &ArgumentTree) -> Result<ServiceCall> {
    let mut args = Args::new(tree);
    args.shared()?;
    args.under("method.diagnose.test.gradient", &["epsilon", "error"])?;
    Ok(args.finish(Service::DiagnoseGradient))
}

fn resolve_pathfinder(tree: &ArgumentTree) -> Result<ServiceCall> {
    let mut args = Args::new(tree);
    args.shared()?;
    args.under(PATHFINDER, LBFGS_TOLERANCES)?;
    args.under(PATHFINDER, &["history_size", "max_lbfgs_iters", "num_elbo_draws", "num_draws"])?;
    args.leaf("refresh", "output.refresh")?;

    let num_paths = args.get::<i32>("method.pathfinder.num_paths")?;
    if num_paths == 1 {
        return Ok(args.finish(Service::PathfinderSingle));
    }
    args.under(
        PATHFINDER,
        &["num_paths", "num_psis_draws", "save_single_paths", "psis_resample", "calculate_lp"],
    )?;
    Ok(args.finish(Service::PathfinderMulti))
}

fn active<'a>(tree: &'a ArgumentTree, path: &str) -> Result<&'a str> {
    tree.active(path)
        .ok_or_else(|| Error::ConfigError(format!("Choice {path} is not reachable in the parsed configuration")))
}

/// Positional argument list under construction
struct Args<'a> {
    tree: &'a ArgumentTree,
    args: Vec<ServiceArg>,
}

impl<'a> Args<'a> {
    fn new(tree: &'a ArgumentTree) -> Self {
        Self { tree, args: Vec::new() }
    }

    fn value(&self, path: &str) -> Result<ScalarValue> {
        self.tree
            .value(path)
            .ok_or_else(|| Error::ConfigError(format!("Option {path} is not reachable in the parsed configuration")))
    }

    fn get<T: Scalar>(&self, path: &str) -> Result<T> {
        T::from_value(&self.value(path)?)
            .ok_or_else(|| Error::ConfigError(format!("Option {path} has an unexpected type")))
    }

    fn push(&mut self, name: &str, value: ScalarValue) {
        self.args.push(ServiceArg {
            name: name.to_string(),
            value,
        });
    }

    fn leaf(&mut self, name: &str, path: &str) -> Result<()> {
        let value = self.value(path)?;
        self.push(name, value);
        Ok(())
    }

    /// Leaves named `names` directly under `parent`, in order
    fn under(&mut self, parent: &str, names: &[&str]) -> Result<()> {
        for name in names {
            self.leaf(name, &format!("{parent}.{name}"))?;
        }
        Ok(())
    }

    /// The seed; the clock-derived sentinel is replaced without touching the tree
    fn seed(&mut self) -> Result<()> {
        let mut seed = self.get::<i64>("random.seed")?;
        if seed == SEED_FROM_CLOCK {
            seed = Utc::now().timestamp_millis().rem_euclid(1 << 32);
            tracing::info!(seed, "derived random seed from the clock");
        }
        self.push("seed", ScalarValue::Long(seed));
        Ok(())
    }

    /// Seed, chain id and initialization shared by most routines
    fn shared(&mut self) -> Result<()> {
        self.seed()?;
        self.leaf("id", "id")?;
        self.leaf("init", "init")
    }

    fn finish(self, service: Service) -> ServiceCall {
        ServiceCall {
            service,
            args: self.args,
        }
    }
}
