//! Per-tick inputs supplied by the host executive.
//!
//! All quantities are SI: kg/m³, Pa, K, m/s, rad, rad/s, m. The centre of
//! gravity is given in the structural frame (x aft, y right, z up).

use nalgebra::{Matrix3, Vector3};

use crate::atmosphere;

#[derive(Clone, Debug)]
pub struct FlightConditions {
    /// Ambient density (kg/m³).
    pub density: f64,
    /// Ambient static pressure (Pa).
    pub pressure: f64,
    /// Total (pitot) pressure (Pa).
    pub total_pressure: f64,
    /// Ambient static temperature (K).
    pub temperature: f64,
    /// Total air temperature (K).
    pub tat: f64,
    /// Speed of sound (m/s).
    pub sound_speed: f64,
    /// True airspeed (m/s).
    pub vt: f64,
    /// Calibrated airspeed (m/s).
    pub vc: f64,
    pub mach: f64,
    /// Dynamic pressure (Pa).
    pub qbar: f64,
    /// Aerodynamic velocity in body axes (m/s).
    pub uvw_aero: Vector3<f64>,
    /// Body angular rates (rad/s).
    pub pqr: Vector3<f64>,
    pub alpha: f64,
    pub beta: f64,
    /// Height above ground level (m).
    pub h_agl: f64,
    /// Altitude above sea level (m).
    pub altitude: f64,
    /// Local gravity (m/s²).
    pub gravity: f64,
    /// Wind → body transform.
    pub tw2b: Matrix3<f64>,
    /// Local → body transform.
    pub tl2b: Matrix3<f64>,
    /// Centre of gravity, structural frame (m).
    pub cg: Vector3<f64>,
    /// Tick duration (s). Zero marks a trim tick.
    pub dt: f64,
}

impl Default for FlightConditions {
    fn default() -> Self {
        Self::standard(0.0, 0.0, 1.0 / 120.0)
    }
}

impl FlightConditions {
    /// Standard-day conditions at `altitude` with airspeed `vt` along the body x axis.
    pub fn standard(altitude: f64, vt: f64, dt: f64) -> Self {
        let (temperature, pressure) = atmosphere::std_state(altitude);
        let density = atmosphere::std_density(altitude);
        let sound_speed = atmosphere::sound_speed(temperature);
        let mach = vt / sound_speed;
        let qbar = 0.5 * density * vt * vt;
        let gamma = atmosphere::GAMMA_AIR;
        let tat = temperature * (1.0 + 0.5 * (gamma - 1.0) * mach * mach);
        let total_pressure =
            pressure * (1.0 + 0.5 * (gamma - 1.0) * mach * mach).powf(gamma / (gamma - 1.0));
        let vc = vt * (density / atmosphere::std_density(0.0)).sqrt();

        Self {
            density,
            pressure,
            total_pressure,
            temperature,
            tat,
            sound_speed,
            vt,
            vc,
            mach,
            qbar,
            uvw_aero: Vector3::new(vt, 0.0, 0.0),
            pqr: Vector3::zeros(),
            alpha: 0.0,
            beta: 0.0,
            h_agl: altitude.max(0.0),
            altitude,
            gravity: crate::units::constants::G0_MPS2,
            tw2b: Matrix3::identity(),
            tl2b: Matrix3::identity(),
            cg: Vector3::zeros(),
            dt,
        }
    }

    /// A zero-duration tick used while the host trims the vehicle.
    pub fn is_trim(&self) -> bool {
        self.dt == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_static_conditions() {
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        assert_eq!(fc.qbar, 0.0);
        assert_eq!(fc.total_pressure, fc.pressure);
        assert!(!fc.is_trim());
    }

    #[test]
    fn moving_conditions_raise_tat() {
        let fc = FlightConditions::standard(3_000.0, 100.0, 0.01);
        assert!(fc.tat > fc.temperature);
        assert!(fc.total_pressure > fc.pressure);
        assert!(fc.vc < fc.vt);
    }
}
