//! Decision-vector layout
//!
//! The solver sees one flat vector holding the whole prediction: the six
//! N-length state trajectories followed by the two (N-1)-length actuator
//! trajectories. Every other module indexes that vector through this
//! layout, so the offsets are computed once, at construction, and never
//! touched again. The constraint vector (length 6N) reuses the six state
//! segment offsets.

use apex_core::{ActuatorCommand, VehicleState};
use serde::{Deserialize, Serialize};

/// Segment offsets within the flat decision vector
///
/// Layout for a horizon of N steps:
///
/// ```text
/// [ x(N) | y(N) | psi(N) | v(N) | cte(N) | epsi(N) | delta(N-1) | a(N-1) ]
/// ```
///
/// The actuator segments are one short of the horizon: there is no command
/// at the final predicted step, since nothing follows it to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableLayout {
    steps: usize,
    x_start: usize,
    y_start: usize,
    psi_start: usize,
    v_start: usize,
    cte_start: usize,
    epsi_start: usize,
    delta_start: usize,
    a_start: usize,
    n_vars: usize,
    n_constraints: usize,
}

impl VariableLayout {
    /// Compute the layout for a horizon of `steps` steps
    ///
    /// Callers guarantee `steps >= 3`; smaller horizons produce degenerate
    /// (but not panicking) offsets and are rejected upstream by
    /// [`crate::config::ControllerConfig::validate`].
    pub fn new(steps: usize) -> Self {
        let n = steps;
        let x_start = 0;
        let y_start = x_start + n;
        let psi_start = y_start + n;
        let v_start = psi_start + n;
        let cte_start = v_start + n;
        let epsi_start = cte_start + n;
        let delta_start = epsi_start + n;
        let a_start = delta_start + (n - 1);

        Self {
            steps: n,
            x_start,
            y_start,
            psi_start,
            v_start,
            cte_start,
            epsi_start,
            delta_start,
            a_start,
            n_vars: 6 * n + 2 * (n - 1),
            n_constraints: 6 * n,
        }
    }

    /// Number of prediction steps (N)
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Total decision-vector length, `6N + 2(N-1)`
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Total constraint-vector length, `6N`
    pub fn n_constraints(&self) -> usize {
        self.n_constraints
    }

    pub fn x_start(&self) -> usize {
        self.x_start
    }

    pub fn y_start(&self) -> usize {
        self.y_start
    }

    pub fn psi_start(&self) -> usize {
        self.psi_start
    }

    pub fn v_start(&self) -> usize {
        self.v_start
    }

    pub fn cte_start(&self) -> usize {
        self.cte_start
    }

    pub fn epsi_start(&self) -> usize {
        self.epsi_start
    }

    pub fn delta_start(&self) -> usize {
        self.delta_start
    }

    pub fn a_start(&self) -> usize {
        self.a_start
    }

    /// State segment offsets in channel order, `[x, y, psi, v, cte, epsi]`
    pub fn state_starts(&self) -> [usize; VehicleState::DIM] {
        [
            self.x_start,
            self.y_start,
            self.psi_start,
            self.v_start,
            self.cte_start,
            self.epsi_start,
        ]
    }

    /// Read the state at step `t` out of a decision vector
    pub fn state_at(&self, vars: &[f64], t: usize) -> VehicleState {
        VehicleState {
            x: vars[self.x_start + t],
            y: vars[self.y_start + t],
            psi: vars[self.psi_start + t],
            v: vars[self.v_start + t],
            cte: vars[self.cte_start + t],
            epsi: vars[self.epsi_start + t],
        }
    }

    /// Read the command at step `t` (0 <= t < N-1) out of a decision vector
    pub fn command_at(&self, vars: &[f64], t: usize) -> ActuatorCommand {
        ActuatorCommand {
            steering: vars[self.delta_start + t],
            acceleration: vars[self.a_start + t],
        }
    }

    /// Pack a state/command trajectory into a decision vector
    ///
    /// Diagnostic inverse of [`Self::state_at`]/[`Self::command_at`]:
    /// `states` must hold N entries and `commands` N-1.
    pub fn pack(&self, states: &[VehicleState], commands: &[ActuatorCommand]) -> Vec<f64> {
        let mut vars = vec![0.0; self.n_vars];
        for (t, state) in states.iter().enumerate() {
            vars[self.x_start + t] = state.x;
            vars[self.y_start + t] = state.y;
            vars[self.psi_start + t] = state.psi;
            vars[self.v_start + t] = state.v;
            vars[self.cte_start + t] = state.cte;
            vars[self.epsi_start + t] = state.epsi;
        }
        for (t, command) in commands.iter().enumerate() {
            vars[self.delta_start + t] = command.steering;
            vars[self.a_start + t] = command.acceleration;
        }
        vars
    }
}
