//! Discrete kinematic bicycle model
//!
//! Single-track model with front-wheel steering and no tire slip. One
//! discrete update over an interval `dt`:
//!
//! ```text
//! x'    = x + v cos(psi) dt
//! y'    = y + v sin(psi) dt
//! psi'  = psi + v delta / Lf dt
//! v'    = v + a dt
//! cte'  = (f(x) - y) + v sin(epsi) dt
//! epsi' = (psi - atan(f'(x))) + v delta / Lf dt
//! ```
//!
//! where `f` is the reference-path polynomial and `Lf` the distance from
//! the vehicle's center of gravity to its front axle. The MPC dynamics
//! constraints are the residual form of exactly this update, so the model
//! doubles as an independent check on converged trajectories.

use serde::{Deserialize, Serialize};

use crate::path::ReferencePath;
use crate::state::{ActuatorCommand, VehicleState};

/// Kinematic bicycle model parameterized by the CoG-to-front-axle distance
///
/// `cg_to_front_axle` is a physically calibrated constant: it was tuned so
/// that the model's turning radius under constant steering matches the
/// target vehicle's measured radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicBicycle {
    /// Distance from center of gravity to front axle [m]
    pub cg_to_front_axle: f64,
}

impl Default for KinematicBicycle {
    fn default() -> Self {
        Self {
            cg_to_front_axle: 2.67,
        }
    }
}

impl KinematicBicycle {
    pub fn new(cg_to_front_axle: f64) -> Self {
        Self { cg_to_front_axle }
    }

    /// Propagate the state one interval forward under a fixed command
    pub fn step(
        &self,
        state: &VehicleState,
        command: &ActuatorCommand,
        path: &ReferencePath,
        dt: f64,
    ) -> VehicleState {
        let lf = self.cg_to_front_axle;
        let yaw_rate = state.v * command.steering / lf;
        let path_y = path.evaluate(state.x);
        let path_heading = path.heading(state.x);

        VehicleState {
            x: state.x + state.v * state.psi.cos() * dt,
            y: state.y + state.v * state.psi.sin() * dt,
            psi: state.psi + yaw_rate * dt,
            v: state.v + command.acceleration * dt,
            cte: (path_y - state.y) + state.v * state.epsi.sin() * dt,
            epsi: (state.psi - path_heading) + yaw_rate * dt,
        }
    }

    /// Roll the model forward over a command sequence
    ///
    /// Returns the `commands.len() + 1` states visited, starting with the
    /// initial state.
    pub fn rollout(
        &self,
        initial: &VehicleState,
        commands: &[ActuatorCommand],
        path: &ReferencePath,
        dt: f64,
    ) -> Vec<VehicleState> {
        let mut states = Vec::with_capacity(commands.len() + 1);
        states.push(*initial);
        let mut current = *initial;
        for command in commands {
            current = self.step(&current, command, path, dt);
            states.push(current);
        }
        states
    }
}
