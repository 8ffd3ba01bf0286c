//! Rate-limited approach of a state variable toward a target.
//!
//! Both functions are pure: they take the current value and return the
//! next one. Neither ever steps past the target.

/// Linear seek: move `v` toward `target` by at most `accel·dt` when below
/// the target and `decel·dt` when above it.
pub fn seek(v: f64, target: f64, accel: f64, decel: f64, dt: f64) -> f64 {
    if v > target {
        (v - dt * decel).max(target)
    } else if v < target {
        (v + dt * accel).min(target)
    } else {
        v
    }
}

/// Exponential seek: first-order lag with time constant `accel_tau` when
/// rising and `decel_tau` when falling.
pub fn exp_seek(v: f64, target: f64, accel_tau: f64, decel_tau: f64, dt: f64) -> f64 {
    if v > target {
        if decel_tau <= 0.0 {
            return target;
        }
        (v - target) * (-dt / decel_tau).exp() + target
    } else if v < target {
        if accel_tau <= 0.0 {
            return target;
        }
        (target - v) * (1.0 - (-dt / accel_tau).exp()) + v
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_uses_asymmetric_rates() {
        assert_eq!(seek(0.0, 10.0, 2.0, 5.0, 1.0), 2.0);
        assert_eq!(seek(10.0, 0.0, 2.0, 5.0, 1.0), 5.0);
    }

    #[test]
    fn seek_lands_on_target() {
        assert_eq!(seek(9.5, 10.0, 2.0, 5.0, 1.0), 10.0);
        assert_eq!(seek(0.5, 0.0, 2.0, 5.0, 1.0), 0.0);
        assert_eq!(seek(3.0, 3.0, 2.0, 5.0, 1.0), 3.0);
    }

    #[test]
    fn exp_seek_approaches_without_crossing() {
        let mut v = 0.0;
        for _ in 0..100 {
            let next = exp_seek(v, 1.0, 0.5, 0.5, 0.1);
            assert!(next > v && next <= 1.0);
            v = next;
        }
        assert!(v > 0.99);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn seek_never_overshoots(
            v in -1.0e4_f64..1.0e4,
            target in -1.0e4_f64..1.0e4,
            accel in 1.0e-3_f64..1.0e3,
            decel in 1.0e-3_f64..1.0e3,
            dt in 1.0e-4_f64..1.0,
        ) {
            let next = seek(v, target, accel, decel, dt);
            if v < target {
                prop_assert!(next > v);
                prop_assert!(next <= target);
            } else if v > target {
                prop_assert!(next < v);
                prop_assert!(next >= target);
            } else {
                prop_assert_eq!(next, v);
            }
        }

        #[test]
        fn exp_seek_never_overshoots(
            v in -1.0e3_f64..1.0e3,
            target in -1.0e3_f64..1.0e3,
            tau_up in 1.0e-2_f64..10.0,
            tau_down in 1.0e-2_f64..10.0,
            dt in 1.0e-3_f64..0.1,
        ) {
            let next = exp_seek(v, target, tau_up, tau_down, dt);
            if v < target {
                prop_assert!(next >= v && next <= target);
            } else if v > target {
                prop_assert!(next <= v && next >= target);
            }
        }
    }
}
