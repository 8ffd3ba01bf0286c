//! First-order lag filter (Tustin discretization).

use crate::error::{CoreError, CoreResult};

/// Discrete first-order lag with break frequency `coeff` (rad/s):
///
/// y[k] = ca·(u[k] + u[k-1]) + cb·y[k-1]
#[derive(Clone, Debug)]
pub struct LagFilter {
    ca: f64,
    cb: f64,
    prev_in: f64,
    prev_out: f64,
}

impl LagFilter {
    pub fn new(coeff: f64, dt: f64) -> CoreResult<Self> {
        if coeff <= 0.0 || !coeff.is_finite() {
            return Err(CoreError::InvalidArg {
                what: "lag coefficient must be positive",
            });
        }
        if dt < 0.0 || !dt.is_finite() {
            return Err(CoreError::InvalidArg {
                what: "lag dt must be non-negative",
            });
        }
        let denom = 2.0 + coeff * dt;
        Ok(Self {
            ca: coeff * dt / denom,
            cb: (2.0 - coeff * dt) / denom,
            prev_in: 0.0,
            prev_out: 0.0,
        })
    }

    /// Advance one sample.
    pub fn execute(&mut self, input: f64) -> f64 {
        let out = (input + self.prev_in) * self.ca + self.prev_out * self.cb;
        self.prev_in = input;
        self.prev_out = out;
        out
    }

    /// Force the filter to a steady state at `value`.
    pub fn reset(&mut self, value: f64) {
        self.prev_in = value;
        self.prev_out = value;
    }

    pub fn output(&self) -> f64 {
        self.prev_out
    }
}
