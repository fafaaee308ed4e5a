//! Vehicle state and actuator command types
//!
//! The state is expressed in vehicle-frame coordinates, matching the frame
//! in which the reference-path polynomial is fitted: the vehicle sits at
//! the origin of that frame at the start of each control cycle, so `x`,
//! `y` and `psi` are typically near zero on entry and grow over the
//! prediction horizon.

use nalgebra::{Vector2, Vector6};

/// Vehicle state used by the controller
///
/// Six channels:
/// - `x`, `y`: position in vehicle-frame coordinates [m]
/// - `psi`: heading [rad]
/// - `v`: speed [m/s or simulator units]
/// - `cte`: cross-track error, signed lateral deviation from the path
/// - `epsi`: heading error, signed deviation from the path tangent [rad]
///
/// `cte` and `epsi` are not free quantities: past step 0 the dynamics
/// constraints force them to evolve consistently with `x`, `y` and `psi`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    pub x: f64,
    pub y: f64,
    pub psi: f64,
    pub v: f64,
    pub cte: f64,
    pub epsi: f64,
}

impl VehicleState {
    /// Number of state channels
    pub const DIM: usize = 6;

    pub fn new(x: f64, y: f64, psi: f64, v: f64, cte: f64, epsi: f64) -> Self {
        Self { x, y, psi, v, cte, epsi }
    }

    /// Pack the state into a flat vector
    ///
    /// Layout: `[x, y, psi, v, cte, epsi]`, the channel order used
    /// throughout the decision and constraint vectors.
    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(self.x, self.y, self.psi, self.v, self.cte, self.epsi)
    }

    /// Unpack a state from a flat vector
    pub fn from_vector(v: &Vector6<f64>) -> Self {
        Self {
            x: v[0],
            y: v[1],
            psi: v[2],
            v: v[3],
            cte: v[4],
            epsi: v[5],
        }
    }
}

/// Actuator command applied for one control cycle
///
/// - `steering`: front-wheel steering angle [rad], bounded by the physical
///   steering lock
/// - `acceleration`: normalized throttle/brake in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorCommand {
    pub steering: f64,
    pub acceleration: f64,
}

impl ActuatorCommand {
    /// Number of actuator channels
    pub const DIM: usize = 2;

    pub fn new(steering: f64, acceleration: f64) -> Self {
        Self { steering, acceleration }
    }

    /// Pack the command into a flat vector, `[steering, acceleration]`
    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.steering, self.acceleration)
    }
}
