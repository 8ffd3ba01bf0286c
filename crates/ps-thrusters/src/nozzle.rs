//! Rocket nozzle with ambient back-pressure loss.

use ps_config::Element;

use crate::error::ThrusterResult;

#[derive(Clone, Debug)]
pub struct Nozzle {
    /// Exit area (m²).
    pub exit_area: f64,
}

impl Nozzle {
    pub fn from_element(el: &Element) -> ThrusterResult<Self> {
        Ok(Self {
            exit_area: el.number_or("area", "M2", 0.0)?,
        })
    }

    /// Delivered thrust for a given vacuum thrust and ambient pressure.
    pub fn thrust(&self, vacuum_thrust: f64, ambient_pressure: f64, reverser_angle: f64) -> f64 {
        let net = if vacuum_thrust > 0.0 {
            (vacuum_thrust - ambient_pressure * self.exit_area).max(0.0)
        } else {
            0.0
        };
        net * reverser_angle.cos()
    }
}
