//! International Standard Atmosphere, used for supercharger rating and
//! for building test conditions. The host owns the real atmosphere.

use crate::units::constants::{G0_MPS2, P_SL_PA, T_SL_K};

/// Specific gas constant for dry air (J/(kg·K)).
pub const R_AIR: f64 = 287.052_87;
/// Ratio of specific heats for air.
pub const GAMMA_AIR: f64 = 1.4;

/// Base geopotential altitude (m) and lapse rate (K/m) of each layer.
const LAYERS: [(f64, f64); 7] = [
    (0.0, -0.0065),
    (11_000.0, 0.0),
    (20_000.0, 0.001),
    (32_000.0, 0.0028),
    (47_000.0, 0.0),
    (51_000.0, -0.0028),
    (71_000.0, -0.002),
];

/// Standard temperature (K) and pressure (Pa) at geopotential altitude `h` (m).
pub fn std_state(h: f64) -> (f64, f64) {
    let h = h.clamp(-1_000.0, 84_000.0);
    let mut t_base = T_SL_K;
    let mut p_base = P_SL_PA;

    for (i, &(h_base, lapse)) in LAYERS.iter().enumerate() {
        let h_top = LAYERS.get(i + 1).map_or(f64::INFINITY, |l| l.0);
        let top = h.min(h_top);
        let dh = top - h_base;
        let t_top = t_base + lapse * dh;
        let p_top = if lapse == 0.0 {
            p_base * (-G0_MPS2 * dh / (R_AIR * t_base)).exp()
        } else {
            p_base * (t_top / t_base).powf(-G0_MPS2 / (R_AIR * lapse))
        };
        if h <= h_top {
            return (t_top, p_top);
        }
        t_base = t_top;
        p_base = p_top;
    }
    (t_base, p_base)
}

pub fn std_pressure(h: f64) -> f64 {
    std_state(h).1
}

pub fn std_density(h: f64) -> f64 {
    let (t, p) = std_state(h);
    p / (R_AIR * t)
}

pub fn sound_speed(temperature: f64) -> f64 {
    (GAMMA_AIR * R_AIR * temperature).sqrt()
}

/// Inverse of [`std_pressure`] by bisection; used to find the altitude at
/// which a given pressure occurs.
pub fn std_altitude_for_pressure(p: f64) -> f64 {
    let (mut lo, mut hi) = (-1_000.0, 84_000.0);
    for _ in 0..80 {
        let mid = 0.5 * (lo + hi);
        if std_pressure(mid) > p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    #[test]
    fn sea_level_values() {
        let (t, p) = std_state(0.0);
        assert_eq!(t, T_SL_K);
        assert_eq!(p, P_SL_PA);
        assert!((std_density(0.0) - 1.225).abs() < 1e-3);
    }

    #[test]
    fn tropopause_values() {
        let (t, p) = std_state(11_000.0);
        assert!((t - 216.65).abs() < 1e-9);
        assert!((p - 22_632.0).abs() < 5.0);
        assert!((std_pressure(20_000.0) - 5_474.9).abs() < 5.0);
    }

    #[test]
    fn pressure_inverse() {
        let h = std_altitude_for_pressure(std_pressure(3_000.0));
        let tol = Tolerances { abs: 1e-3, rel: 1e-6 };
        assert!(nearly_equal(h, 3_000.0, tol));
    }
}
