//! Reference-path polynomial
//!
//! The desired path near the vehicle is described by a polynomial of
//! degree at most three, `y = f(x)`, fitted upstream in vehicle-frame
//! coordinates. The controller only evaluates it and its derivatives; the
//! fitting itself happens outside this workspace.

use nalgebra::Vector4;

/// Cubic reference path `y = c0 + c1 x + c2 x^2 + c3 x^3`
///
/// Owned by the caller and read-only for the duration of one solve. Lower
/// degrees are expressed by zero coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePath {
    coeffs: Vector4<f64>,
}

impl ReferencePath {
    /// Create a path from coefficients ordered by ascending degree
    pub fn new(coeffs: Vector4<f64>) -> Self {
        Self { coeffs }
    }

    /// Create a path from a plain coefficient array, `[c0, c1, c2, c3]`
    pub fn from_coefficients(coeffs: [f64; 4]) -> Self {
        Self::new(Vector4::from_column_slice(&coeffs))
    }

    /// A degenerate path along the x axis (all coefficients zero)
    pub fn zero() -> Self {
        Self::new(Vector4::zeros())
    }

    /// Coefficients ordered by ascending degree
    pub fn coefficients(&self) -> &Vector4<f64> {
        &self.coeffs
    }

    /// Path value `f(x)`
    pub fn evaluate(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        c[0] + c[1] * x + c[2] * x * x + c[3] * x * x * x
    }

    /// Path slope `f'(x)`
    pub fn derivative(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        c[1] + 2.0 * c[2] * x + 3.0 * c[3] * x * x
    }

    /// Path curvature numerator `f''(x)`
    pub fn second_derivative(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        2.0 * c[2] + 6.0 * c[3] * x
    }

    /// Tangent heading of the path at `x`, `atan(f'(x))` [rad]
    pub fn heading(&self, x: f64) -> f64 {
        self.derivative(x).atan()
    }
}
