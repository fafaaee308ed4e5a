//! Nonlinear solver interface
//!
//! Thin wrapper around the OpEn solver (`optimization_engine`): an
//! augmented Lagrangian outer loop handling the dynamics equalities and
//! the step-0 pin, with PANOC as the inner solver working inside the
//! actuator box. The wrapper owns status interpretation: a non-converged
//! run comes back as a distinct [`SolverError`], never as whatever vector
//! the optimizer last touched.

use std::time::{Duration, Instant};

use optimization_engine::alm::{
    AlmCache, AlmFactory, AlmOptimizer, AlmProblem, NO_JACOBIAN_MAPPING, NO_MAPPING,
};
use optimization_engine::constraints::{Ball2, Rectangle};
use optimization_engine::core::ExitStatus;
use optimization_engine::panoc::PANOCCache;
use optimization_engine::FunctionCallResult;
use thiserror::Error;

use crate::config::SolverConfig;
use crate::ocp::PathTrackingOcp;
use crate::problem::MpcProblem;

/// Solver failure kinds
///
/// Non-convergence is an ordinary operating condition under aggressive
/// tuning or noisy telemetry; the caller decides the fallback (hold the
/// last command, brake, degrade to a simpler controller).
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver hit the outer-iteration cap without converging")]
    IterationsExhausted,
    #[error("solver hit the wall-clock cap without converging")]
    TimedOut,
    #[error("solver reported a numerical failure: {0}")]
    Numerical(String),
}

/// Statistics from one solve
#[derive(Debug, Clone, Default)]
pub struct SolveStatistics {
    /// Outer (multiplier-update) iterations
    pub outer_iterations: usize,
    /// Total inner (PANOC) iterations
    pub inner_iterations: usize,
    /// Wall-clock time spent in the solver
    pub solve_time: Duration,
}

/// Converged decision vector plus its achieved cost
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub vars: Vec<f64>,
    pub cost: f64,
    pub stats: SolveStatistics,
}

/// Run one solve of the given problem
///
/// Blocks until the optimizer converges, exhausts its iteration cap, or
/// hits the wall-clock cap. The evaluator is called re-entrantly by the
/// optimizer's line search; it carries no mutable state, so repeated calls
/// with different candidates are safe.
pub fn solve(
    ocp: &PathTrackingOcp,
    problem: &MpcProblem,
    config: &SolverConfig,
) -> Result<RawSolution, SolverError> {
    let n_vars = problem.initial_guess.len();
    let n_constraints = problem.constraint_lower.len();

    let f = |u: &[f64], cost: &mut f64| -> FunctionCallResult {
        *cost = ocp.cost(u);
        Ok(())
    };
    let df = |u: &[f64], grad: &mut [f64]| -> FunctionCallResult {
        ocp.cost_gradient(u, grad);
        Ok(())
    };
    let f1 = |u: &[f64], residuals: &mut [f64]| -> FunctionCallResult {
        ocp.constraints(u, residuals);
        Ok(())
    };
    let jf1_trans = |u: &[f64], d: &[f64], out: &mut [f64]| -> FunctionCallResult {
        ocp.constraint_jacobian_product(u, d, out);
        Ok(())
    };

    let bounds = Rectangle::new(
        Some(&problem.variable_lower),
        Some(&problem.variable_upper),
    );
    let set_c = Rectangle::new(
        Some(&problem.constraint_lower),
        Some(&problem.constraint_upper),
    );
    let set_y = Ball2::new(None, config.multiplier_radius);

    let factory = AlmFactory::new(
        f,
        df,
        Some(f1),
        Some(jf1_trans),
        NO_MAPPING,
        NO_JACOBIAN_MAPPING,
        Some(set_c),
        0,
    );

    let alm_problem = AlmProblem::new(
        bounds,
        Some(Rectangle::new(
            Some(&problem.constraint_lower),
            Some(&problem.constraint_upper),
        )),
        Some(set_y),
        |u: &[f64], xi: &[f64], cost: &mut f64| -> FunctionCallResult {
            factory.psi(u, xi, cost)
        },
        |u: &[f64], xi: &[f64], grad: &mut [f64]| -> FunctionCallResult {
            factory.d_psi(u, xi, grad)
        },
        Some(f1),
        NO_MAPPING,
        n_constraints,
        0,
    );

    let panoc_cache = PANOCCache::new(n_vars, config.inner_tolerance, config.lbfgs_memory);
    let mut alm_cache = AlmCache::new(panoc_cache, n_constraints, 0);

    let mut optimizer = AlmOptimizer::new(&mut alm_cache, alm_problem)
        .with_delta_tolerance(config.constraint_tolerance)
        .with_epsilon_tolerance(config.inner_tolerance)
        .with_initial_inner_tolerance(config.initial_inner_tolerance)
        .with_max_outer_iterations(config.max_outer_iterations)
        .with_initial_penalty(config.initial_penalty)
        .with_penalty_update_factor(config.penalty_update_factor)
        .with_max_duration(Duration::from_secs_f64(config.max_solve_time_ms / 1000.0));

    let mut vars = problem.initial_guess.clone();
    let started = Instant::now();
    let status = optimizer
        .solve(&mut vars)
        .map_err(|e| SolverError::Numerical(format!("{e:?}")))?;
    let solve_time = started.elapsed();

    match status.exit_status() {
        ExitStatus::Converged => {
            let stats = SolveStatistics {
                outer_iterations: status.num_outer_iterations() as usize,
                inner_iterations: status.num_inner_iterations() as usize,
                solve_time,
            };
            let cost = ocp.cost(&vars);
            log::debug!(
                "solve converged: cost {:.4}, {} outer / {} inner iterations, {:?}",
                cost,
                stats.outer_iterations,
                stats.inner_iterations,
                stats.solve_time,
            );
            Ok(RawSolution { vars, cost, stats })
        }
        ExitStatus::NotConvergedIterations => Err(SolverError::IterationsExhausted),
        ExitStatus::NotConvergedOutOfTime => Err(SolverError::TimedOut),
    }
}
