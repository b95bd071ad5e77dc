//! Compiled-in option schema
//!
//! The tree is described as data: one [`Decl`] per option, nested through
//! records and choices. [`builder`](super::builder) turns the table into live
//! [`ConfigNode`](super::node::ConfigNode)s.

use super::scalar::Rule;

/// Declaration of one option
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl {
    Flag {
        name: &'static str,
        description: &'static str,
    },
    Bool {
        name: &'static str,
        description: &'static str,
        default: bool,
    },
    Int {
        name: &'static str,
        description: &'static str,
        default: i32,
        rule: Rule,
        good: i32,
        bad: Option<i32>,
    },
    Long {
        name: &'static str,
        description: &'static str,
        default: i64,
        rule: Rule,
        good: i64,
        bad: Option<i64>,
    },
    UInt {
        name: &'static str,
        description: &'static str,
        default: u32,
        good: u32,
    },
    Real {
        name: &'static str,
        description: &'static str,
        default: f64,
        rule: Rule,
        good: f64,
        bad: Option<f64>,
    },
    Text {
        name: &'static str,
        description: &'static str,
        default: &'static str,
        good: &'static str,
    },
    Record {
        name: &'static str,
        description: &'static str,
        children: &'static [Decl],
    },
    Choice {
        name: &'static str,
        description: &'static str,
        alternatives: &'static [Decl],
        default: usize,
    },
}

impl Decl {
    pub fn name(&self) -> &'static str {
        match *self {
            Decl::Flag { name, .. }
            | Decl::Bool { name, .. }
            | Decl::Int { name, .. }
            | Decl::Long { name, .. }
            | Decl::UInt { name, .. }
            | Decl::Real { name, .. }
            | Decl::Text { name, .. }
            | Decl::Record { name, .. }
            | Decl::Choice { name, .. } => name,
        }
    }
}

const fn flag(name: &'static str, description: &'static str) -> Decl {
    Decl::Flag { name, description }
}

const fn boolean(name: &'static str, description: &'static str, default: bool) -> Decl {
    Decl::Bool { name, description, default }
}

const fn int(name: &'static str, description: &'static str, default: i32, rule: Rule, good: i32, bad: i32) -> Decl {
    Decl::Int { name, description, default, rule, good, bad: Some(bad) }
}

const fn pos_int(name: &'static str, description: &'static str, default: i32) -> Decl {
    int(name, description, default, Rule::Positive, 2, -1)
}

const fn nonneg_int(name: &'static str, description: &'static str, default: i32) -> Decl {
    int(name, description, default, Rule::NonNegative, 2, -1)
}

const fn uint(name: &'static str, description: &'static str, default: u32) -> Decl {
    Decl::UInt { name, description, default, good: 10 }
}

const fn real(name: &'static str, description: &'static str, default: f64, rule: Rule, good: f64, bad: f64) -> Decl {
    Decl::Real { name, description, default, rule, good, bad: Some(bad) }
}

const fn pos_real(name: &'static str, description: &'static str, default: f64) -> Decl {
    real(name, description, default, Rule::Positive, 2.0, -1.0)
}

const fn nonneg_real(name: &'static str, description: &'static str, default: f64) -> Decl {
    real(name, description, default, Rule::NonNegative, 2.0, -1.0)
}

const fn text(name: &'static str, description: &'static str, default: &'static str) -> Decl {
    Decl::Text { name, description, default, good: "good" }
}

const fn record(name: &'static str, description: &'static str, children: &'static [Decl]) -> Decl {
    Decl::Record { name, description, children }
}

const fn choice(name: &'static str, description: &'static str, alternatives: &'static [Decl], default: usize) -> Decl {
    Decl::Choice { name, description, alternatives, default }
}

/// L-BFGS line search and convergence options shared by bfgs, lbfgs and
/// pathfinder, followed by any extra declarations
macro_rules! lbfgs_options {
    ($($extra:expr),* $(,)?) => {
        &[
            pos_real("init_alpha", "Line search step size for first iteration", 0.001),
            nonneg_real("tol_obj", "Convergence tolerance on absolute changes in objective function value", 1e-12),
            nonneg_real("tol_rel_obj", "Convergence tolerance on relative changes in objective function value", 1e4),
            nonneg_real("tol_grad", "Convergence tolerance on the norm of the gradient", 1e-8),
            nonneg_real("tol_rel_grad", "Convergence tolerance on the relative norm of the gradient", 1e7),
            nonneg_real("tol_param", "Convergence tolerance on changes in parameter value", 1e-8),
            $($extra),*
        ]
    };
}

const HISTORY_SIZE: Decl = pos_int("history_size", "Amount of history to keep for L-BFGS", 5);

const JACOBIAN_ON: Decl = boolean(
    "jacobian",
    "Whether or not to include the Jacobian adjustment for constrained parameters",
    true,
);

const CALCULATE_LP: Decl = boolean(
    "calculate_lp",
    "Whether to calculate the log probability of the approximate draws",
    true,
);

const SAMPLE: Decl = record(
    "sample",
    "Bayesian inference with Markov Chain Monte Carlo",
    &[
        nonneg_int("num_samples", "Number of sampling iterations", 1000),
        nonneg_int("num_warmup", "Number of warmup iterations", 1000),
        boolean("save_warmup", "Stream warmup samples to output?", false),
        pos_int("thin", "Period between saved samples", 1),
        record(
            "adapt",
            "Warmup Adaptation",
            &[
                boolean("engaged", "Adaptation engaged?", true),
                pos_real("gamma", "Adaptation regularization scale", 0.05),
                real("delta", "Adaptation target acceptance statistic", 0.8, Rule::Open(0.0, 1.0), 0.5, 1.5),
                pos_real("kappa", "Adaptation relaxation exponent", 0.75),
                pos_real("t0", "Adaptation iteration offset", 10.0),
                uint("init_buffer", "Width of initial fast adaptation interval", 75),
                uint("term_buffer", "Width of final fast adaptation interval", 50),
                uint("window", "Initial width of slow adaptation interval", 25),
                boolean("save_metric", "Save metric as JSON?", false),
            ],
        ),
        choice(
            "algorithm",
            "Sampling algorithm",
            &[
                record(
                    "hmc",
                    "Hamiltonian Monte Carlo",
                    &[
                        choice(
                            "engine",
                            "Engine for Hamiltonian Monte Carlo",
                            &[
                                record(
                                    "static",
                                    "Static integration time",
                                    &[pos_real(
                                        "int_time",
                                        "Total integration time for Hamiltonian evolution, default is 2 * pi",
                                        std::f64::consts::TAU,
                                    )],
                                ),
                                record("nuts", "The No-U-Turn Sampler", &[pos_int("max_depth", "Maximum tree depth", 10)]),
                            ],
                            1,
                        ),
                        choice(
                            "metric",
                            "Geometry of base manifold",
                            &[
                                flag("unit_e", "Euclidean manifold with unit metric"),
                                flag("diag_e", "Euclidean manifold with diag metric"),
                                flag("dense_e", "Euclidean manifold with dense metric"),
                            ],
                            1,
                        ),
                        text("metric_file", "Input file with precomputed Euclidean metric", ""),
                        pos_real("stepsize", "Step size for discrete evolution", 1.0),
                        real(
                            "stepsize_jitter",
                            "Uniformly random jitter of the stepsize, in percent",
                            0.0,
                            Rule::Closed(0.0, 1.0),
                            0.5,
                            2.0,
                        ),
                    ],
                ),
                record("fixed_param", "Fixed Parameter Sampler", &[]),
            ],
            0,
        ),
        pos_int("num_chains", "Number of chains", 1),
    ],
);

const OPTIMIZE: Decl = record(
    "optimize",
    "Point estimation",
    &[
        choice(
            "algorithm",
            "Optimization algorithm",
            &[
                record("bfgs", "BFGS with linesearch", lbfgs_options![]),
                record("lbfgs", "LBFGS with linesearch", lbfgs_options![HISTORY_SIZE]),
                record("newton", "Newton's method", &[]),
            ],
            1,
        ),
        boolean(
            "jacobian",
            "When true, include change-of-variables adjustment for constraining parameter transforms",
            false,
        ),
        pos_int("iter", "Total number of iterations", 2000),
        boolean("save_iterations", "Stream optimization progress to output?", false),
    ],
);

const VARIATIONAL: Decl = record(
    "variational",
    "Variational inference",
    &[
        choice(
            "algorithm",
            "Variational inference algorithm",
            &[
                record("meanfield", "mean-field approximation", &[]),
                record("fullrank", "full-rank covariance", &[]),
            ],
            0,
        ),
        pos_int("iter", "Maximum number of ADVI iterations.", 10000),
        pos_int("grad_samples", "Number of Monte Carlo draws for computing the gradient.", 1),
        pos_int("elbo_samples", "Number of Monte Carlo draws for estimate of ELBO.", 100),
        pos_real("eta", "Stepsize scaling parameter.", 1.0),
        record(
            "adapt",
            "Eta Adaptation for Variational Inference",
            &[
                boolean("engaged", "Adaptation engaged?", true),
                pos_int("iter", "Maximum number of adaptation iterations.", 50),
            ],
        ),
        pos_real("tol_rel_obj", "Convergence tolerance on the relative norm of the objective.", 0.01),
        pos_int("eval_elbo", "Evaluate ELBO every Nth iteration.", 100),
        nonneg_int("output_samples", "Number of approximate posterior output draws to save.", 1000),
    ],
);

const DIAGNOSE: Decl = record(
    "diagnose",
    "Model diagnostics",
    &[choice(
        "test",
        "Diagnostic test",
        &[record(
            "gradient",
            "Check model gradient against finite differences",
            &[
                pos_real("epsilon", "Finite difference step size", 1e-6),
                pos_real("error", "Error threshold", 1e-6),
            ],
        )],
        0,
    )],
);

const GENERATE_QUANTITIES: Decl = record(
    "generate_quantities",
    "Generate quantities of interest",
    &[
        text(
            "fitted_params",
            "Input file of sample of fitted parameter values for model conditioned on data",
            "",
        ),
        pos_int("num_chains", "Number of chains", 1),
    ],
);

const LOG_PROB: Decl = record(
    "log_prob",
    "Return the log density up to a constant and its gradients, given supplied parameters",
    &[
        text(
            "unconstrained_params",
            "Input file (JSON or R dump) of parameter values on unconstrained scale",
            "",
        ),
        text(
            "constrained_params",
            "Input file (JSON or R dump) of parameter values on constrained scale",
            "",
        ),
        JACOBIAN_ON,
    ],
);

const LAPLACE: Decl = record(
    "laplace",
    "Sample from a Laplace approximation",
    &[
        text(
            "mode",
            "A specification of a mode on the constrained scale for all model parameters, as a path to a JSON or CSV file",
            "",
        ),
        JACOBIAN_ON,
        nonneg_int("draws", "Number of draws from the laplace approximation", 1000),
        CALCULATE_LP,
    ],
);

const PATHFINDER: Decl = record(
    "pathfinder",
    "Pathfinder algorithm",
    lbfgs_options![
        HISTORY_SIZE,
        pos_int("num_psis_draws", "Number of draws from PSIS sample", 1000),
        pos_int("num_paths", "Number of single pathfinders", 4),
        boolean("save_single_paths", "Output single-path pathfinder draws as CSV", false),
        boolean("psis_resample", "If true, perform psis resampling on samples returned from individual pathfinders", true),
        CALCULATE_LP,
        pos_int("max_lbfgs_iters", "Maximum number of LBFGS iterations", 1000),
        pos_int("num_draws", "Number of approximate posterior draws", 1000),
        pos_int("num_elbo_draws", "Number of Monte Carlo draws to evaluate ELBO", 25),
    ],
);

/// Name of the top-level choice that selects the inference method
pub const METHOD: &str = "method";

/// The top-level options, in the order they are matched and echoed
pub const TOP_LEVEL: &[Decl] = &[
    choice(
        METHOD,
        "Analysis method (Note that method= is optional)",
        &[
            SAMPLE,
            OPTIMIZE,
            VARIATIONAL,
            DIAGNOSE,
            GENERATE_QUANTITIES,
            LOG_PROB,
            LAPLACE,
            PATHFINDER,
        ],
        0,
    ),
    nonneg_int("id", "Unique process identifier", 1),
    record("data", "Input data options", &[text("file", "Input data file", "")]),
    Decl::Text {
        name: "init",
        description: "Initialization method: \"x\" initializes randomly between [-x, x], \"0\" initializes to 0, anything else identifies a file of values",
        default: "2",
        good: "0.5",
    },
    record(
        "random",
        "Random number configuration",
        &[Decl::Long {
            name: "seed",
            description: "Random number generator seed",
            default: -1,
            rule: Rule::ClosedOr(0.0, 4_294_967_295.0, -1.0),
            good: 18383,
            bad: Some(-2),
        }],
    ),
    record(
        "output",
        "File output options",
        &[
            text("file", "Output file", "output.csv"),
            text("diagnostic_file", "Auxiliary output file for diagnostic information", ""),
            nonneg_int("refresh", "Number of iterations between screen updates", 100),
            int(
                "sig_figs",
                "The number of significant figures used for the output CSV files.",
                -1,
                Rule::ClosedOr(0.0, 18.0, -1.0),
                8,
                -2,
            ),
            text("profile_file", "File to store profiling information", "profile.csv"),
            boolean("save_cmdstan_config", "Save configuration as JSON?", false),
        ],
    ),
    int(
        "num_threads",
        "Number of threads available to the program.",
        1,
        Rule::PositiveOr(-1.0),
        4,
        -2,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn count_leaves(decls: &[Decl]) -> usize {
        decls
            .iter()
            .map(|d| match d {
                Decl::Flag { .. } => 0,
                Decl::Record { children, .. } => count_leaves(children),
                Decl::Choice { alternatives, .. } => count_leaves(alternatives),
                _ => 1,
            })
            .sum()
    }

    #[test]
    fn test_method_is_first_and_defaults_to_sample() {
        match TOP_LEVEL[0] {
            Decl::Choice { name, alternatives, default, .. } => {
                assert_eq!(name, METHOD);
                assert_eq!(alternatives[default].name(), "sample");
                assert_eq!(alternatives.len(), 8);
            }
            other => panic!("unexpected first declaration {other:?}"),
        }
    }

    #[test]
    fn test_choice_defaults_in_range() {
        fn walk(decls: &[Decl]) {
            for d in decls {
                match d {
                    Decl::Record { children, .. } => walk(children),
                    Decl::Choice { alternatives, default, name, .. } => {
                        assert!(*default < alternatives.len(), "{name} default out of range");
                        walk(alternatives);
                    }
                    _ => {}
                }
            }
        }
        walk(TOP_LEVEL);
    }

    #[test]
    fn test_lbfgs_shares_bfgs_options() {
        let Decl::Record { children, .. } = OPTIMIZE else {
            panic!("optimize must be a record");
        };
        let Decl::Choice { alternatives, .. } = children[0] else {
            panic!("algorithm must be a choice");
        };
        let sizes: Vec<usize> = alternatives
            .iter()
            .map(|a| match a {
                Decl::Record { children, .. } => children.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(sizes, vec![6, 7, 0]);
    }

    #[test]
    fn test_schema_has_leaves() {
        assert!(count_leaves(TOP_LEVEL) > 80);
    }
}
