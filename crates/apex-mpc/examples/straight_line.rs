//! Closed-loop demo: track a gently curving reference
//!
//! Runs the controller against the kinematic bicycle model it plans with,
//! applying the first command of every cycle. Run with
//! `RUST_LOG=debug` to see per-solve statistics.

use apex_core::{ReferencePath, VehicleState};
use apex_mpc::config::ControllerConfig;
use apex_mpc::controller::MpcController;

fn main() {
    env_logger::init();

    let mut config = ControllerConfig::default();
    config.reference_speed = 20.0;
    let controller = MpcController::new(config.clone()).expect("valid configuration");

    let path = ReferencePath::from_coefficients([1.0, 0.05, -0.001, 0.0]);
    let model = config.vehicle;
    let dt = config.horizon.dt;

    // Start below the path, slow, heading straight
    let mut state = VehicleState::new(0.0, 0.0, 0.0, 5.0, 1.0, -path.heading(0.0));

    println!("cycle | steering |  accel | speed |    cte |   cost");
    for cycle in 0..25 {
        let plan = match controller.solve(&state, &path) {
            Ok(plan) => plan,
            Err(err) => {
                // Fallback policy is ours to choose; here we stop and brake
                println!("cycle {cycle}: solve failed ({err}), braking");
                break;
            }
        };

        let command = plan.command();
        println!(
            "{cycle:>5} | {:>8.4} | {:>6.3} | {:>5.2} | {:>6.3} | {:>7.2}",
            command.steering, command.acceleration, state.v, state.cte, plan.cost
        );

        state = model.step(&state, &command, &path, dt);
    }
}
