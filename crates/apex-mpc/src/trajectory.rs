//! Planned trajectory types
//!
//! The result of one solve: the full optimized state/command plan, of
//! which the caller applies only the first command and typically displays
//! the predicted positions.

use apex_core::{ActuatorCommand, VehicleState};
use nalgebra::Point2;

use crate::solver::SolveStatistics;

/// Converged plan for one control cycle
///
/// Invariants maintained by the controller: `states` holds N entries with
/// step 0 equal (to solver tolerance) to the measured state, and
/// `commands` holds N-1 entries respecting the actuator bounds.
#[derive(Debug, Clone)]
pub struct ControlPlan {
    /// Optimized state trajectory, step 0 first
    pub states: Vec<VehicleState>,
    /// Optimized command trajectory
    pub commands: Vec<ActuatorCommand>,
    /// Achieved cost
    pub cost: f64,
    /// Solver statistics
    pub stats: SolveStatistics,
}

impl ControlPlan {
    /// The command to apply this cycle (the first planned command)
    pub fn command(&self) -> ActuatorCommand {
        self.commands[0]
    }

    /// Predicted vehicle positions for steps 1..N, for display
    pub fn predicted_path(&self) -> Vec<Point2<f64>> {
        self.states[1..]
            .iter()
            .map(|s| Point2::new(s.x, s.y))
            .collect()
    }

    /// Flatten the plan into the telemetry wire layout:
    /// `[steering, acceleration, x1, y1, ..., x_{N-1}, y_{N-1}]`
    pub fn interleaved(&self) -> Vec<f64> {
        let command = self.command();
        let mut out = Vec::with_capacity(2 + 2 * (self.states.len() - 1));
        out.push(command.steering);
        out.push(command.acceleration);
        for state in &self.states[1..] {
            out.push(state.x);
            out.push(state.y);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> ControlPlan {
        let states = (0..4)
            .map(|t| {
                let t = t as f64;
                VehicleState::new(t, -t, 0.0, 10.0, 0.0, 0.0)
            })
            .collect();
        let commands = vec![
            ActuatorCommand::new(0.1, 0.9),
            ActuatorCommand::new(0.05, 0.8),
            ActuatorCommand::new(0.0, 0.7),
        ];
        ControlPlan {
            states,
            commands,
            cost: 42.0,
            stats: SolveStatistics::default(),
        }
    }

    #[test]
    fn test_command_is_first_planned() {
        let plan = plan();
        assert_eq!(plan.command(), ActuatorCommand::new(0.1, 0.9));
    }

    #[test]
    fn test_predicted_path_skips_pinned_step() {
        let plan = plan();
        let path = plan.predicted_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Point2::new(1.0, -1.0));
        assert_eq!(path[2], Point2::new(3.0, -3.0));
    }

    #[test]
    fn test_interleaved_layout() {
        let plan = plan();
        let flat = plan.interleaved();
        assert_eq!(
            flat,
            vec![0.1, 0.9, 1.0, -1.0, 2.0, -2.0, 3.0, -3.0]
        );
    }
}
