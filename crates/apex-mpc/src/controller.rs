//! Solve orchestrator
//!
//! [`MpcController`] ties the pieces together for one control cycle:
//! problem construction, evaluator setup, the solver call, and extraction
//! of the command and predicted trajectory. The controller carries no
//! state between cycles; every solve restarts from a zeroed guess, seeded
//! with motion only through the pinned initial state.

use apex_core::{ReferencePath, VehicleState};
use thiserror::Error;

use crate::config::{ConfigError, ControllerConfig};
use crate::layout::VariableLayout;
use crate::ocp::PathTrackingOcp;
use crate::problem::ProblemBuilder;
use crate::solver::{self, SolverError};
use crate::trajectory::ControlPlan;

/// Controller errors
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("solve failed: {0}")]
    Solver(#[from] SolverError),
}

/// Receding-horizon path-tracking controller
///
/// One instance serves one vehicle loop: call [`Self::solve`] once per
/// control cycle with the freshly measured state and the reference
/// polynomial fitted for that cycle, apply the returned first command,
/// repeat. On a solver failure the cycle gets an error, not a stale or
/// half-optimized command; the fallback policy belongs to the caller.
pub struct MpcController {
    config: ControllerConfig,
    layout: VariableLayout,
    builder: ProblemBuilder,
}

impl MpcController {
    /// Create a controller, rejecting degenerate configurations
    pub fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        let layout = VariableLayout::new(config.horizon.steps);
        let builder = ProblemBuilder::new(layout, config.limits.clone());
        Ok(Self {
            config,
            layout,
            builder,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// Solve one control cycle
    ///
    /// `state` and `path` are read for the duration of this call only; no
    /// references are retained afterwards.
    pub fn solve(
        &self,
        state: &VehicleState,
        path: &ReferencePath,
    ) -> Result<ControlPlan, ControllerError> {
        let problem = self.builder.build(state);
        let ocp = PathTrackingOcp::new(
            self.layout,
            *path,
            self.config.weights.clone(),
            self.config.vehicle,
            self.config.horizon.dt,
            self.config.reference_speed,
        );

        let solution = match solver::solve(&ocp, &problem, &self.config.solver) {
            Ok(solution) => solution,
            Err(err) => {
                log::warn!("mpc cycle failed: {err}");
                return Err(err.into());
            }
        };

        let n = self.layout.steps();
        let states = (0..n)
            .map(|t| self.layout.state_at(&solution.vars, t))
            .collect();
        let commands = (0..n - 1)
            .map(|t| self.layout.command_at(&solution.vars, t))
            .collect();

        Ok(ControlPlan {
            states,
            commands,
            cost: solution.cost,
            stats: solution.stats,
        })
    }
}
