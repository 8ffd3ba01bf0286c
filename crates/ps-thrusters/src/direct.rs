//! Pass-through thruster.

/// Thrust equals the engine's output scaled by the reverser.
pub fn direct_thrust(input: f64, reverser_angle: f64) -> f64 {
    input * reverser_angle.cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverser_scales_by_cosine() {
        assert_eq!(direct_thrust(1000.0, 0.0), 1000.0);
        assert!(direct_thrust(1000.0, core::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!((direct_thrust(1000.0, core::f64::consts::PI) + 1000.0).abs() < 1e-9);
    }
}
