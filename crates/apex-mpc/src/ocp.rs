//! Optimal control problem evaluator
//!
//! Implements the finite-horizon tracking problem the solver works on:
//!
//! ```text
//! minimize    J = Σₖ (cteₖ² + epsiₖ² + (vₖ - v_ref)²)
//!               + Σₖ (deltaₖ² + aₖ²)
//!               + Σₖ w·(deltaₖ₊₁ - deltaₖ)² + w·(aₖ₊₁ - aₖ)²
//! subject to  state₀ = current state            (pinned via bounds)
//!             stateₖ₊₁ = f(stateₖ, commandₖ)    (kinematic bicycle)
//! ```
//!
//! [`PathTrackingOcp`] is the evaluator handed to the solver: cost,
//! analytic cost gradient, dynamics residuals, and the analytic
//! Jacobian-transpose product the outer (augmented Lagrangian) loop needs.
//! It is constructed fresh for every solve, closed over an immutable
//! reference polynomial, and every method is a pure function of its
//! arguments: the solver calls them re-entrantly during line search and
//! multiplier updates.
//!
//! Step 0 of the residual vector emits the raw step-0 variables; the
//! problem builder pins their constraint bounds to the measured state, so
//! the equality binding the plan to the vehicle lives in the bounds, not
//! here. Non-finite inputs propagate unmodified; the solver's own
//! safeguards are the recovery mechanism.

use apex_core::{KinematicBicycle, ReferencePath};

use crate::config::CostWeights;
use crate::layout::VariableLayout;

/// Cost and constraint evaluator for one solve
#[derive(Debug, Clone)]
pub struct PathTrackingOcp {
    layout: VariableLayout,
    path: ReferencePath,
    weights: CostWeights,
    vehicle: KinematicBicycle,
    dt: f64,
    reference_speed: f64,
}

impl PathTrackingOcp {
    pub fn new(
        layout: VariableLayout,
        path: ReferencePath,
        weights: CostWeights,
        vehicle: KinematicBicycle,
        dt: f64,
        reference_speed: f64,
    ) -> Self {
        Self {
            layout,
            path,
            weights,
            vehicle,
            dt,
            reference_speed,
        }
    }

    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// Scalar cost of a candidate decision vector
    pub fn cost(&self, vars: &[f64]) -> f64 {
        let l = &self.layout;
        let n = l.steps();
        let w = &self.weights;
        let mut cost = 0.0;

        // Tracking: lateral, heading and speed deviation at every step
        for i in 0..n {
            let cte = vars[l.cte_start() + i];
            let epsi = vars[l.epsi_start() + i];
            let dv = vars[l.v_start() + i] - self.reference_speed;
            cost += w.cross_track * cte * cte + w.heading * epsi * epsi + w.speed * dv * dv;
        }

        // Actuation magnitude
        for i in 0..n - 1 {
            let delta = vars[l.delta_start() + i];
            let a = vars[l.a_start() + i];
            cost += w.steering * delta * delta + w.acceleration * a * a;
        }

        // Actuation rate between consecutive commands
        for i in 0..n - 2 {
            let d_delta = vars[l.delta_start() + i + 1] - vars[l.delta_start() + i];
            let d_a = vars[l.a_start() + i + 1] - vars[l.a_start() + i];
            cost += w.steering_rate * d_delta * d_delta + w.acceleration_rate * d_a * d_a;
        }

        cost
    }

    /// Exact gradient of [`Self::cost`]
    pub fn cost_gradient(&self, vars: &[f64], grad: &mut [f64]) {
        let l = &self.layout;
        let n = l.steps();
        let w = &self.weights;
        grad.fill(0.0);

        for i in 0..n {
            grad[l.cte_start() + i] = 2.0 * w.cross_track * vars[l.cte_start() + i];
            grad[l.epsi_start() + i] = 2.0 * w.heading * vars[l.epsi_start() + i];
            grad[l.v_start() + i] =
                2.0 * w.speed * (vars[l.v_start() + i] - self.reference_speed);
        }

        for i in 0..n - 1 {
            grad[l.delta_start() + i] += 2.0 * w.steering * vars[l.delta_start() + i];
            grad[l.a_start() + i] += 2.0 * w.acceleration * vars[l.a_start() + i];
        }

        for i in 0..n - 2 {
            let d_delta = vars[l.delta_start() + i + 1] - vars[l.delta_start() + i];
            grad[l.delta_start() + i + 1] += 2.0 * w.steering_rate * d_delta;
            grad[l.delta_start() + i] -= 2.0 * w.steering_rate * d_delta;

            let d_a = vars[l.a_start() + i + 1] - vars[l.a_start() + i];
            grad[l.a_start() + i + 1] += 2.0 * w.acceleration_rate * d_a;
            grad[l.a_start() + i] -= 2.0 * w.acceleration_rate * d_a;
        }
    }

    /// Dynamics residuals of a candidate decision vector
    ///
    /// `residuals` has one entry per constraint row (`6N`), sharing the
    /// state segment offsets of the layout. Step-0 rows carry the raw
    /// step-0 variables; rows `t >= 1` carry the one-step bicycle-model
    /// residual, zero exactly when the trajectory is dynamically
    /// consistent.
    pub fn constraints(&self, vars: &[f64], residuals: &mut [f64]) {
        let l = &self.layout;
        let n = l.steps();
        let dt = self.dt;
        let lf = self.vehicle.cg_to_front_axle;

        for start in l.state_starts() {
            residuals[start] = vars[start];
        }

        for t in 1..n {
            let x0 = vars[l.x_start() + t - 1];
            let y0 = vars[l.y_start() + t - 1];
            let psi0 = vars[l.psi_start() + t - 1];
            let v0 = vars[l.v_start() + t - 1];
            let epsi0 = vars[l.epsi_start() + t - 1];
            let delta0 = vars[l.delta_start() + t - 1];
            let a0 = vars[l.a_start() + t - 1];

            let path_y = self.path.evaluate(x0);
            let path_heading = self.path.heading(x0);
            let yaw_rate = v0 * delta0 / lf;

            residuals[l.x_start() + t] =
                vars[l.x_start() + t] - (x0 + v0 * psi0.cos() * dt);
            residuals[l.y_start() + t] =
                vars[l.y_start() + t] - (y0 + v0 * psi0.sin() * dt);
            residuals[l.psi_start() + t] =
                vars[l.psi_start() + t] - (psi0 + yaw_rate * dt);
            residuals[l.v_start() + t] = vars[l.v_start() + t] - (v0 + a0 * dt);
            residuals[l.cte_start() + t] =
                vars[l.cte_start() + t] - ((path_y - y0) + v0 * epsi0.sin() * dt);
            residuals[l.epsi_start() + t] =
                vars[l.epsi_start() + t] - ((psi0 - path_heading) + yaw_rate * dt);
        }
    }

    /// Product `J(vars)ᵀ · d` of the constraint Jacobian with a multiplier
    /// vector, accumulated into `out`
    ///
    /// Each residual row touches at most eight variables, so the product
    /// is assembled from the closed-form partials row by row.
    pub fn constraint_jacobian_product(&self, vars: &[f64], d: &[f64], out: &mut [f64]) {
        let l = &self.layout;
        let n = l.steps();
        let dt = self.dt;
        let lf = self.vehicle.cg_to_front_axle;
        out.fill(0.0);

        for start in l.state_starts() {
            out[start] += d[start];
        }

        for t in 1..n {
            let ix0 = l.x_start() + t - 1;
            let iy0 = l.y_start() + t - 1;
            let ipsi0 = l.psi_start() + t - 1;
            let iv0 = l.v_start() + t - 1;
            let iepsi0 = l.epsi_start() + t - 1;
            let idelta0 = l.delta_start() + t - 1;
            let ia0 = l.a_start() + t - 1;

            let x0 = vars[ix0];
            let psi0 = vars[ipsi0];
            let v0 = vars[iv0];
            let epsi0 = vars[iepsi0];
            let delta0 = vars[idelta0];

            let slope = self.path.derivative(x0);
            // d/dx atan(f'(x)) = f''(x) / (1 + f'(x)^2)
            let heading_slope = self.path.second_derivative(x0) / (1.0 + slope * slope);

            let dx = d[l.x_start() + t];
            out[l.x_start() + t] += dx;
            out[ix0] -= dx;
            out[ipsi0] += dx * v0 * psi0.sin() * dt;
            out[iv0] -= dx * psi0.cos() * dt;

            let dy = d[l.y_start() + t];
            out[l.y_start() + t] += dy;
            out[iy0] -= dy;
            out[ipsi0] -= dy * v0 * psi0.cos() * dt;
            out[iv0] -= dy * psi0.sin() * dt;

            let dpsi = d[l.psi_start() + t];
            out[l.psi_start() + t] += dpsi;
            out[ipsi0] -= dpsi;
            out[iv0] -= dpsi * delta0 / lf * dt;
            out[idelta0] -= dpsi * v0 / lf * dt;

            let dv = d[l.v_start() + t];
            out[l.v_start() + t] += dv;
            out[iv0] -= dv;
            out[ia0] -= dv * dt;

            let dcte = d[l.cte_start() + t];
            out[l.cte_start() + t] += dcte;
            out[ix0] -= dcte * slope;
            out[iy0] += dcte;
            out[iv0] -= dcte * epsi0.sin() * dt;
            out[iepsi0] -= dcte * v0 * epsi0.cos() * dt;

            let depsi = d[l.epsi_start() + t];
            out[l.epsi_start() + t] += depsi;
            out[ipsi0] -= depsi;
            out[ix0] += depsi * heading_slope;
            out[iv0] -= depsi * delta0 / lf * dt;
            out[idelta0] -= depsi * v0 / lf * dt;
        }
    }
}
