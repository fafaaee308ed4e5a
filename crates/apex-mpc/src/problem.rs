//! Per-solve problem construction
//!
//! Builds the three vector triples the solver consumes: the initial guess,
//! the variable bounds, and the constraint bounds. Everything here is
//! rebuilt from scratch each control cycle; nothing carries over between
//! solves.

use apex_core::VehicleState;

use crate::config::ActuatorLimits;
use crate::layout::VariableLayout;

/// Solver-friendly stand-in for an unbounded variable
pub const UNBOUNDED: f64 = 1.0e19;

/// Guess and bounds for one solve
#[derive(Debug, Clone)]
pub struct MpcProblem {
    pub initial_guess: Vec<f64>,
    pub variable_lower: Vec<f64>,
    pub variable_upper: Vec<f64>,
    pub constraint_lower: Vec<f64>,
    pub constraint_upper: Vec<f64>,
}

/// Builds [`MpcProblem`]s for a fixed layout and actuator limits
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    layout: VariableLayout,
    limits: ActuatorLimits,
}

impl ProblemBuilder {
    pub fn new(layout: VariableLayout, limits: ActuatorLimits) -> Self {
        Self { layout, limits }
    }

    /// Construct guess and bounds for the given measured state
    ///
    /// - guess: zero everywhere except the step-0 state entries (the pin
    ///   itself lives in the constraint bounds; the guess merely starts
    ///   step 0 at the measured state);
    /// - variable bounds: state trajectories free, steering within the
    ///   symmetric lock, acceleration within its normalized range;
    /// - constraint bounds: zero everywhere (equalities) except the step-0
    ///   sextuple, pinned to the measured state from both sides.
    pub fn build(&self, state: &VehicleState) -> MpcProblem {
        let l = &self.layout;
        let n_vars = l.n_vars();

        let mut initial_guess = vec![0.0; n_vars];
        let mut variable_lower = vec![-UNBOUNDED; n_vars];
        let mut variable_upper = vec![UNBOUNDED; n_vars];

        for i in l.delta_start()..l.a_start() {
            variable_lower[i] = -self.limits.max_steering_angle;
            variable_upper[i] = self.limits.max_steering_angle;
        }
        for i in l.a_start()..n_vars {
            variable_lower[i] = self.limits.min_acceleration;
            variable_upper[i] = self.limits.max_acceleration;
        }

        let mut constraint_lower = vec![0.0; l.n_constraints()];
        let mut constraint_upper = vec![0.0; l.n_constraints()];
        let pinned = state.to_vector();
        for (start, value) in l.state_starts().iter().zip(pinned.iter()) {
            initial_guess[*start] = *value;
            constraint_lower[*start] = *value;
            constraint_upper[*start] = *value;
        }

        MpcProblem {
            initial_guess,
            variable_lower,
            variable_upper,
            constraint_lower,
            constraint_upper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActuatorLimits;

    fn builder(steps: usize) -> ProblemBuilder {
        ProblemBuilder::new(VariableLayout::new(steps), ActuatorLimits::default())
    }

    fn test_state() -> VehicleState {
        VehicleState::new(0.0, 0.0, 0.0, 10.0, 1.5, -0.1)
    }

    #[test]
    fn test_vector_lengths() {
        let builder = builder(12);
        let problem = builder.build(&test_state());
        assert_eq!(problem.initial_guess.len(), 94);
        assert_eq!(problem.variable_lower.len(), 94);
        assert_eq!(problem.variable_upper.len(), 94);
        assert_eq!(problem.constraint_lower.len(), 72);
        assert_eq!(problem.constraint_upper.len(), 72);
    }

    #[test]
    fn test_guess_zero_except_pinned_step() {
        let layout = VariableLayout::new(8);
        let problem = builder(8).build(&test_state());
        let pinned = test_state().to_vector();
        for i in 0..layout.n_vars() {
            let expected = layout
                .state_starts()
                .iter()
                .position(|&s| s == i)
                .map(|channel| pinned[channel])
                .unwrap_or(0.0);
            assert_eq!(problem.initial_guess[i], expected);
        }
    }

    #[test]
    fn test_state_entries_unbounded() {
        let layout = VariableLayout::new(8);
        let problem = builder(8).build(&test_state());
        for i in 0..layout.delta_start() {
            assert_eq!(problem.variable_lower[i], -UNBOUNDED);
            assert_eq!(problem.variable_upper[i], UNBOUNDED);
        }
    }

    #[test]
    fn test_actuator_bounds() {
        let layout = VariableLayout::new(8);
        let limits = ActuatorLimits::default();
        let problem = builder(8).build(&test_state());
        for i in layout.delta_start()..layout.a_start() {
            assert_eq!(problem.variable_lower[i], -limits.max_steering_angle);
            assert_eq!(problem.variable_upper[i], limits.max_steering_angle);
        }
        for i in layout.a_start()..layout.n_vars() {
            assert_eq!(problem.variable_lower[i], limits.min_acceleration);
            assert_eq!(problem.variable_upper[i], limits.max_acceleration);
        }
    }

    #[test]
    fn test_constraint_bounds_pin_step_zero_only() {
        let layout = VariableLayout::new(8);
        let state = test_state();
        let problem = builder(8).build(&state);
        let pinned = state.to_vector();

        for (channel, start) in layout.state_starts().iter().enumerate() {
            assert_eq!(problem.constraint_lower[*start], pinned[channel]);
            assert_eq!(problem.constraint_upper[*start], pinned[channel]);
            for t in 1..layout.steps() {
                assert_eq!(problem.constraint_lower[start + t], 0.0);
                assert_eq!(problem.constraint_upper[start + t], 0.0);
            }
        }
    }
}
