//! Runge-Kutta integrators over a scalar problem.

use crate::problem::ScalarProblem;
use crate::status::SolverStatus;

/// Magnitude beyond which a result is treated as a math error.
pub const REAL_LIMIT: f64 = 1.0e30;

fn sane(y: f64) -> bool {
    !y.is_nan() && (-REAL_LIMIT..=REAL_LIMIT).contains(&y)
}

/// Interval bookkeeping shared by both schemes.
#[derive(Clone, Debug, Default)]
struct Span {
    x0: f64,
    x1: f64,
    h: f64,
    /// Loop bound slightly below `x1` so rounding never adds a step.
    safer_x1: f64,
    err: f64,
    status: SolverStatus,
    iterations: usize,
    x_end: f64,
}

impl Span {
    fn init(&mut self, x0: f64, x1: f64, intervals: usize) -> SolverStatus {
        self.status = SolverStatus::NO_ERROR;
        self.x0 = x0;
        self.x1 = x1;
        self.err = 0.0;
        self.iterations = 0;
        self.x_end = x0;
        if intervals == 0 || !(x0 < x1) {
            self.h = 0.0;
            self.safer_x1 = x0;
            self.status |= SolverStatus::FAULTY_INIT;
            return self.status;
        }
        self.h = (x1 - x0) / intervals as f64;
        self.safer_x1 = x1 - self.h * 1.0e-6;
        self.status
    }
}

/// Common contract of the scalar integrators.
pub trait Integrator {
    /// Set the interval `[x0, x1]` split into `intervals` nominal steps.
    fn init(&mut self, x0: f64, x1: f64, intervals: usize) -> SolverStatus;

    /// Integrate from `y0` at `x0` to `x1`.
    fn evolve<P: ScalarProblem + ?Sized>(&mut self, y0: f64, problem: &P) -> f64;

    fn status(&self) -> SolverStatus;

    /// Steps taken by the last `evolve`.
    fn iterations(&self) -> usize;

    /// Final abscissa reached by the last `evolve`.
    fn x_end(&self) -> f64;

    /// Current step size.
    fn step_size(&self) -> f64;
}

/// Drives the step loop; `approximate` advances one step from `(x, y)`
/// and may shorten `span.h`.
fn run<P, A>(span: &mut Span, y0: f64, problem: &P, mut approximate: A) -> f64
where
    P: ScalarProblem + ?Sized,
    A: FnMut(&mut Span, &P, f64, f64) -> f64,
{
    let mut x = span.x0;
    let mut y = y0;
    span.iterations = 0;
    if span.status.contains(SolverStatus::FAULTY_INIT) {
        span.x_end = x;
        return y;
    }
    while x < span.safer_x1 {
        y = approximate(span, problem, x, y);
        if !sane(y) {
            span.status |= SolverStatus::MATH_ERROR;
        }
        x += span.h;
        span.iterations += 1;
    }
    span.x_end = x;
    y
}

/// Classical fixed-step fourth-order Runge-Kutta.
#[derive(Clone, Debug, Default)]
pub struct Rk4 {
    span: Span,
}

impl Rk4 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Integrator for Rk4 {
    fn init(&mut self, x0: f64, x1: f64, intervals: usize) -> SolverStatus {
        self.span.init(x0, x1, intervals)
    }

    fn evolve<P: ScalarProblem + ?Sized>(&mut self, y0: f64, problem: &P) -> f64 {
        run(&mut self.span, y0, problem, |span, f, x, y| {
            let h = span.h;
            let h05 = 0.5 * h;
            let k1 = f.derivative(x, y);
            let k2 = f.derivative(x + h05, y + h05 * k1);
            let k3 = f.derivative(x + h05, y + h05 * k2);
            let k4 = f.derivative(x + h, y + h * k3);
            y + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
        })
    }

    fn status(&self) -> SolverStatus {
        self.span.status
    }

    fn iterations(&self) -> usize {
        self.span.iterations
    }

    fn x_end(&self) -> f64 {
        self.span.x_end
    }

    fn step_size(&self) -> f64 {
        self.span.h
    }
}

// Fehlberg 4(5) tableau.
const C2: f64 = 1.0 / 4.0;
const C3: f64 = 3.0 / 8.0;
const C4: f64 = 12.0 / 13.0;
const C5: f64 = 1.0;
const C6: f64 = 1.0 / 2.0;

const A21: f64 = 1.0 / 4.0;
const A31: f64 = 3.0 / 32.0;
const A32: f64 = 9.0 / 32.0;
const A41: f64 = 1932.0 / 2197.0;
const A42: f64 = -7200.0 / 2197.0;
const A43: f64 = 7296.0 / 2197.0;
const A51: f64 = 439.0 / 216.0;
const A52: f64 = -8.0;
const A53: f64 = 3680.0 / 513.0;
const A54: f64 = -845.0 / 4104.0;
const A61: f64 = -8.0 / 27.0;
const A62: f64 = 2.0;
const A63: f64 = -3544.0 / 2565.0;
const A64: f64 = 1859.0 / 4104.0;
const A65: f64 = -11.0 / 40.0;

// Fifth order weights.
const B1: f64 = 16.0 / 135.0;
const B3: f64 = 6656.0 / 12825.0;
const B4: f64 = 28561.0 / 56430.0;
const B5: f64 = -9.0 / 50.0;
const B6: f64 = 2.0 / 55.0;

// Embedded fourth order weights.
const B1S: f64 = 25.0 / 216.0;
const B3S: f64 = 1408.0 / 2565.0;
const B4S: f64 = 2197.0 / 4104.0;
const B5S: f64 = -1.0 / 5.0;

/// Adaptive Runge-Kutta-Fehlberg 4(5).
///
/// When the embedded error estimate exceeds `epsilon` the step is halved,
/// at most `shrink_avail` times per `evolve`. The step never grows back
/// within an evolution; `init` restores the nominal step.
#[derive(Clone, Debug)]
pub struct Rkf45 {
    span: Span,
    epsilon: f64,
    shrink_limit: u32,
    shrink_avail: u32,
}

impl Default for Rkf45 {
    fn default() -> Self {
        Self {
            span: Span::default(),
            epsilon: 1.0e-12,
            shrink_limit: 4,
            shrink_avail: 4,
        }
    }
}

impl Rkf45 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_shrink_limit(mut self, limit: u32) -> Self {
        self.shrink_limit = limit;
        self.shrink_avail = limit;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Halvings still available in the current evolution.
    pub fn shrink_avail(&self) -> u32 {
        self.shrink_avail
    }

    /// Largest embedded error estimate seen in the last evolution.
    pub fn error_estimate(&self) -> f64 {
        self.span.err
    }
}

impl Integrator for Rkf45 {
    fn init(&mut self, x0: f64, x1: f64, intervals: usize) -> SolverStatus {
        self.shrink_avail = self.shrink_limit;
        self.span.init(x0, x1, intervals)
    }

    fn evolve<P: ScalarProblem + ?Sized>(&mut self, y0: f64, problem: &P) -> f64 {
        let epsilon = self.epsilon;
        let shrink_avail = &mut self.shrink_avail;
        *shrink_avail = self.shrink_limit;
        run(&mut self.span, y0, problem, |span, f, x, y| {
            loop {
                let h = span.h;
                let k1 = f.derivative(x, y);
                let k2 = f.derivative(x + C2 * h, y + h * (A21 * k1));
                let k3 = f.derivative(x + C3 * h, y + h * (A31 * k1 + A32 * k2));
                let k4 = f.derivative(x + C4 * h, y + h * (A41 * k1 + A42 * k2 + A43 * k3));
                let k5 = f.derivative(
                    x + C5 * h,
                    y + h * (A51 * k1 + A52 * k2 + A53 * k3 + A54 * k4),
                );
                let k6 = f.derivative(
                    x + C6 * h,
                    y + h * (A61 * k1 + A62 * k2 + A63 * k3 + A64 * k4 + A65 * k5),
                );

                let y5 = y + h * (B1 * k1 + B3 * k3 + B4 * k4 + B5 * k5 + B6 * k6);
                let y4 = y + h * (B1S * k1 + B3S * k3 + B4S * k4 + B5S * k5);
                let abs_err = (y4 - y5).abs();

                if abs_err < epsilon || *shrink_avail == 0 || abs_err.is_nan() {
                    span.err = span.err.max(abs_err);
                    return y5;
                }
                span.h *= 0.5;
                *shrink_avail -= 1;
                tracing::trace!(h = span.h, abs_err, "rkf45 step halved");
            }
        })
    }

    fn status(&self) -> SolverStatus {
        self.span.status
    }

    fn iterations(&self) -> usize {
        self.span.iterations
    }

    fn x_end(&self) -> f64 {
        self.span.x_end
    }

    fn step_size(&self) -> f64 {
        self.span.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faulty_init_on_reversed_interval() {
        let mut rk = Rk4::new();
        assert!(rk.init(1.0, 0.0, 4).contains(SolverStatus::FAULTY_INIT));
        let y = rk.evolve(3.0, &|_x: f64, _y: f64| 1.0);
        assert_eq!(y, 3.0);
        assert_eq!(rk.iterations(), 0);
    }

    #[test]
    fn zero_intervals_is_faulty() {
        let mut rk = Rkf45::new();
        assert!(rk.init(0.0, 1.0, 0).contains(SolverStatus::FAULTY_INIT));
    }

    #[test]
    fn rk4_counts_iterations() {
        let mut rk = Rk4::new();
        rk.init(0.0, 1.0, 10);
        rk.evolve(0.0, &|_x: f64, _y: f64| 1.0);
        assert_eq!(rk.iterations(), 10);
        assert!((rk.x_end() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rk4_exponential_growth() {
        let mut rk = Rk4::new();
        rk.init(0.0, 1.0, 100);
        let y = rk.evolve(1.0, &|_x: f64, y: f64| y);
        assert!((y - core::f64::consts::E).abs() < 1e-8);
        assert!(rk.status().is_ok());
    }

    #[test]
    fn math_error_on_overflow() {
        let mut rk = Rk4::new();
        rk.init(0.0, 1.0, 2);
        rk.evolve(1.0, &|_x: f64, _y: f64| 1.0e40);
        assert!(rk.status().contains(SolverStatus::MATH_ERROR));
    }

    #[test]
    fn math_error_on_nan() {
        let mut rk = Rkf45::new();
        rk.init(0.0, 1.0, 2);
        rk.evolve(1.0, &|_x: f64, _y: f64| f64::NAN);
        assert!(rk.status().contains(SolverStatus::MATH_ERROR));
    }

    #[test]
    fn rkf45_shrink_is_bounded() {
        // Stiff enough that the embedded error never drops below epsilon.
        let mut rk = Rkf45::new().with_epsilon(1.0e-30);
        rk.init(0.0, 1.0, 1);
        let y = rk.evolve(1.0, &|x: f64, y: f64| -50.0 * y + x.sin());
        assert_eq!(rk.shrink_avail(), 0);
        assert!((rk.step_size() - 1.0 / 16.0).abs() < 1e-15);
        assert_eq!(rk.iterations(), 16);
        assert!(y.is_finite());
    }

    #[test]
    fn rkf45_smooth_problem_keeps_step() {
        let mut rk = Rkf45::new();
        rk.init(0.0, 1.0, 4);
        let y = rk.evolve(2.0, &|_x: f64, _y: f64| 3.0);
        assert_eq!(rk.shrink_avail(), 4);
        assert_eq!(rk.iterations(), 4);
        assert!((y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn init_restores_nominal_step() {
        let mut rk = Rkf45::new().with_epsilon(1.0e-30);
        rk.init(0.0, 1.0, 1);
        rk.evolve(1.0, &|_x: f64, y: f64| -50.0 * y);
        assert!(rk.step_size() < 1.0);
        rk.init(0.0, 1.0, 1);
        assert_eq!(rk.step_size(), 1.0);
    }
}
