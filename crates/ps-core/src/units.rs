//! Unit helpers for the few conversions the models do in code. Everything
//! read from configuration is converted by `ps-config` at load time.

use uom::si::f64::Power;
use uom::si::power::{horsepower, watt};

/// Horsepower (mechanical) expressed in watts.
#[inline]
pub fn hp_to_w(v: f64) -> f64 {
    Power::new::<horsepower>(v).get::<watt>()
}

/// Watts expressed in horsepower (mechanical).
#[inline]
pub fn w_to_hp(v: f64) -> f64 {
    Power::new::<watt>(v).get::<horsepower>()
}

#[inline]
pub fn rpm_to_rad_s(rpm: f64) -> f64 {
    rpm * core::f64::consts::PI / 30.0
}

pub mod constants {
    pub const G0_MPS2: f64 = 9.806_65;

    /// Sea-level standard pressure (Pa).
    pub const P_SL_PA: f64 = 101_325.0;
    /// Sea-level standard temperature (K).
    pub const T_SL_K: f64 = 288.15;

    pub const FT_TO_M: f64 = 0.3048;
    pub const IN_TO_M: f64 = 0.0254;
    pub const LB_TO_KG: f64 = 0.453_592_37;
    pub const LBF_TO_N: f64 = 4.448_221_615_260_5;
    pub const INHG_TO_PA: f64 = 3_386.38;
    pub const PSI_TO_PA: f64 = 6_894.757;
    pub const KTS_TO_MPS: f64 = 0.514_444;
    pub const GAL_TO_M3: f64 = 0.003_785_411_784;
    /// ft·lbf → N·m.
    pub const FTLBF_TO_NM: f64 = 1.355_817_948;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horsepower_round_trip() {
        let watts = hp_to_w(160.0);
        assert!((watts - 119_311.98).abs() < 1.0);
        assert!((w_to_hp(watts) - 160.0).abs() < 1e-9);
    }

    #[test]
    fn rpm_conversion() {
        let omega = rpm_to_rad_s(60.0);
        assert!((omega - 2.0 * core::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn english_factors_agree_with_uom() {
        use crate::numeric::{Tolerances, nearly_equal};
        use uom::si::f64::{Force, Length, Mass};
        use uom::si::{force, length, mass};
        // uom stores the pound conversions to seven significant digits.
        let tol = Tolerances::relative(1e-6);
        let lbf = Force::new::<force::pound_force>(1.0).get::<force::newton>();
        assert!(nearly_equal(lbf, constants::LBF_TO_N, tol));
        let lb = Mass::new::<mass::pound>(1.0).get::<mass::kilogram>();
        assert!(nearly_equal(lb, constants::LB_TO_KG, tol));
        let ft = Length::new::<length::foot>(1.0).get::<length::meter>();
        assert!(nearly_equal(ft, constants::FT_TO_M, tol));
    }
}
