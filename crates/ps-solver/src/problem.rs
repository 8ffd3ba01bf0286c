/// Right-hand side of `dy/dx = f(x, y)`.
pub trait ScalarProblem {
    fn derivative(&self, x: f64, y: f64) -> f64;
}

impl<F> ScalarProblem for F
where
    F: Fn(f64, f64) -> f64,
{
    fn derivative(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}
