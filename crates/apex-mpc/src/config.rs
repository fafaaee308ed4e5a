//! Controller configuration
//!
//! Every tuned constant of the controller lives here: horizon shape, cost
//! weights, actuator limits, vehicle geometry, reference speed, and solver
//! settings. The defaults reproduce the tuning the controller ships with;
//! none of them are claimed to transfer to a different vehicle unchanged.

use apex_core::KinematicBicycle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors raised by [`ControllerConfig::validate`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("prediction horizon must span at least 3 steps, got {0}")]
    HorizonTooShort(usize),
    #[error("step interval must be positive, got {0}")]
    NonPositiveStepInterval(f64),
    #[error("steering limit must be positive, got {0}")]
    InvalidSteeringLimit(f64),
    #[error("acceleration range is empty: [{min}, {max}]")]
    EmptyAccelerationRange { min: f64, max: f64 },
    #[error("CoG-to-front-axle distance must be positive, got {0}")]
    InvalidWheelbase(f64),
    #[error("solver time cap must be positive, got {0} ms")]
    InvalidTimeCap(f64),
}

/// Main controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Prediction horizon shape
    pub horizon: HorizonConfig,
    /// Cost function weights
    pub weights: CostWeights,
    /// Actuator bounds
    pub limits: ActuatorLimits,
    /// Vehicle geometry used by the dynamics constraints
    pub vehicle: KinematicBicycle,
    /// Speed the tracking cost pulls toward [m/s or simulator units]
    pub reference_speed: f64,
    /// Solver configuration
    pub solver: SolverConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            horizon: HorizonConfig::default(),
            weights: CostWeights::default(),
            limits: ActuatorLimits::default(),
            vehicle: KinematicBicycle::default(),
            reference_speed: 40.0,
            solver: SolverConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Reject configurations the problem construction cannot make sense of
    ///
    /// The layout and bound arithmetic degenerate (without crashing) below
    /// three steps, so short horizons are a contract violation rather than
    /// a runtime condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon.steps < 3 {
            return Err(ConfigError::HorizonTooShort(self.horizon.steps));
        }
        if self.horizon.dt <= 0.0 {
            return Err(ConfigError::NonPositiveStepInterval(self.horizon.dt));
        }
        if self.limits.max_steering_angle <= 0.0 {
            return Err(ConfigError::InvalidSteeringLimit(self.limits.max_steering_angle));
        }
        if self.limits.min_acceleration >= self.limits.max_acceleration {
            return Err(ConfigError::EmptyAccelerationRange {
                min: self.limits.min_acceleration,
                max: self.limits.max_acceleration,
            });
        }
        if self.vehicle.cg_to_front_axle <= 0.0 {
            return Err(ConfigError::InvalidWheelbase(self.vehicle.cg_to_front_axle));
        }
        if self.solver.max_solve_time_ms <= 0.0 {
            return Err(ConfigError::InvalidTimeCap(self.solver.max_solve_time_ms));
        }
        Ok(())
    }
}

/// Prediction horizon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonConfig {
    /// Number of prediction steps (N)
    pub steps: usize,
    /// Discretization interval between steps [s]
    pub dt: f64,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            steps: 12,
            dt: 0.04,
        }
    }
}

impl HorizonConfig {
    /// Total look-ahead time covered by the horizon [s]
    pub fn span(&self) -> f64 {
        self.steps as f64 * self.dt
    }
}

/// Cost function weights
///
/// The rate weights sit orders of magnitude above the tracking weights,
/// trading a little tracking accuracy for ride smoothness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostWeights {
    /// Cross-track error weight
    pub cross_track: f64,
    /// Heading error weight
    pub heading: f64,
    /// Speed deviation weight
    pub speed: f64,
    /// Steering magnitude weight
    pub steering: f64,
    /// Acceleration magnitude weight
    pub acceleration: f64,
    /// Steering rate-of-change weight
    pub steering_rate: f64,
    /// Acceleration rate-of-change weight
    pub acceleration_rate: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            cross_track: 1.0,
            heading: 1.0,
            speed: 1.0,
            steering: 1.0,
            acceleration: 1.0,
            steering_rate: 1000.0,
            acceleration_rate: 1000.0,
        }
    }
}

/// Actuator bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorLimits {
    /// Steering lock, applied symmetrically [rad]
    pub max_steering_angle: f64,
    /// Full-brake command (normalized)
    pub min_acceleration: f64,
    /// Full-throttle command (normalized)
    pub max_acceleration: f64,
}

impl Default for ActuatorLimits {
    fn default() -> Self {
        Self {
            // 25 degrees
            max_steering_angle: 0.436332,
            min_acceleration: -1.0,
            max_acceleration: 1.0,
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock cap for one solve [ms]; a control cycle must produce a
    /// command before the next cycle arrives
    pub max_solve_time_ms: f64,
    /// Largest acceptable constraint violation at convergence
    pub constraint_tolerance: f64,
    /// Inner (fixed-point residual) tolerance
    pub inner_tolerance: f64,
    /// Inner tolerance used on the first outer iteration
    pub initial_inner_tolerance: f64,
    /// L-BFGS memory of the inner solver
    pub lbfgs_memory: usize,
    /// Cap on outer (multiplier-update) iterations
    pub max_outer_iterations: usize,
    /// Initial penalty on constraint violation
    pub initial_penalty: f64,
    /// Multiplicative penalty growth between outer iterations
    pub penalty_update_factor: f64,
    /// Radius of the ball the Lagrange multipliers are kept inside
    pub multiplier_radius: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_solve_time_ms: 500.0,
            constraint_tolerance: 1e-4,
            inner_tolerance: 1e-6,
            initial_inner_tolerance: 1e-3,
            lbfgs_memory: 10,
            max_outer_iterations: 60,
            initial_penalty: 10.0,
            penalty_update_factor: 5.0,
            multiplier_radius: 1e12,
        }
    }
}
