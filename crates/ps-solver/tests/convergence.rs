use proptest::prelude::*;
use ps_solver::{Integrator, Rk4, Rkf45, SolverStatus};

fn constant_case<I: Integrator>(mut rk: I, y0: f64, k: f64, x0: f64, x1: f64, n: usize) -> f64 {
    let status = rk.init(x0, x1, n);
    assert_eq!(status, SolverStatus::NO_ERROR);
    let y = rk.evolve(y0, &move |_x: f64, _y: f64| k);
    assert!(rk.status().is_ok());
    y
}

#[test]
fn both_schemes_integrate_linear_ramp() {
    let expected = 1.0 + 2.5 * 0.02;
    let a = constant_case(Rk4::new(), 1.0, 2.5, 0.0, 0.02, 6);
    let b = constant_case(Rkf45::new(), 1.0, 2.5, 0.0, 0.02, 6);
    assert!((a - expected).abs() < 1e-12);
    assert!((b - expected).abs() < 1e-12);
}

#[test]
fn rkf45_tracks_decay_like_rk4() {
    let f = |_x: f64, y: f64| -2.0 * y;
    let mut rk4 = Rk4::new();
    rk4.init(0.0, 0.5, 50);
    let a = rk4.evolve(1.0, &f);

    let mut rkf = Rkf45::new().with_epsilon(1e-9);
    rkf.init(0.0, 0.5, 10);
    let b = rkf.evolve(1.0, &f);

    let exact = (-1.0_f64).exp();
    assert!((a - exact).abs() < 1e-7);
    assert!((b - exact).abs() < 1e-7);
}

proptest! {
    #[test]
    fn constant_derivative_is_exact(
        y0 in -1.0e3_f64..1.0e3,
        k in -1.0e2_f64..1.0e2,
        x0 in -10.0_f64..10.0,
        len in 1.0e-3_f64..10.0,
        n in 1_usize..32,
    ) {
        let x1 = x0 + len;
        let expected = y0 + k * len;
        let tol = 1e-9 * (1.0 + expected.abs() + (k * len).abs());
        let a = constant_case(Rk4::new(), y0, k, x0, x1, n);
        let b = constant_case(Rkf45::new(), y0, k, x0, x1, n);
        prop_assert!((a - expected).abs() < tol);
        prop_assert!((b - expected).abs() < tol);
    }
}
