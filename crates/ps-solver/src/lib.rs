//! ps-solver: scalar initial-value integrators.
//!
//! Two interchangeable Runge-Kutta schemes share one contract:
//! `init(x0, x1, intervals)` fixes the interval and nominal step,
//! `evolve(y0, problem)` integrates `dy/dx = f(x, y)` across it.
//! Numeric trouble is reported through [`SolverStatus`] bits, never by
//! panicking, so callers can keep their last good value.

pub mod error;
pub mod integrator;
pub mod problem;
pub mod status;

pub use error::{SolverError, SolverResult};
pub use integrator::{Integrator, Rk4, Rkf45};
pub use problem::ScalarProblem;
pub use status::SolverStatus;
