//! Electric motors: a rated-power model and a brushless DC model.

use std::f64::consts::PI;

use ps_config::Element;
use ps_core::{FlightConditions, LoadContext, rpm_to_rad_s, w_to_hp};
use ps_thrusters::Thruster;

use crate::engine::{EngineCommands, EngineCore};
use crate::error::{EngineError, EngineResult};

/// Brushless DC motor constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bldc {
    pub max_volts: f64,
    /// Speed constant (RPM per volt).
    pub kv: f64,
    /// Coil resistance (Ω).
    pub coil_resistance: f64,
    pub no_load_current: f64,
    pub max_current: f64,
    /// Shortest time the motor may take to brake the rotor to rest (s).
    pub deceleration_time: f64,
}

impl Bldc {
    /// Torque constant (N·m per A).
    pub fn torque_constant(&self) -> f64 {
        1.0 / (self.kv * 2.0 * PI / 60.0)
    }

    /// Winding current at the given supply voltage and shaft speed, clipped
    /// to the current limit.
    pub fn current(&self, volts: f64, rpm: f64) -> f64 {
        let back_emf = rpm / self.kv;
        ((volts - back_emf) / self.coil_resistance).clamp(-self.max_current, self.max_current)
    }
}

#[derive(Clone, Debug)]
pub enum Motor {
    /// Shaft power is rated power × throttle.
    Rated { power: f64 },
    Bldc(Bldc),
}

#[derive(Clone, Debug)]
pub struct Electric {
    pub motor: Motor,
    power: f64,
    torque: f64,
    current: f64,
    volts: f64,
    rpm: f64,
}

impl Electric {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> EngineResult<Self> {
        let motor = if el.has("maxvolts") {
            let bldc = Bldc {
                max_volts: el.find_element_value_as_number("maxvolts")?,
                kv: el.find_element_value_as_number("velocityconstant")?,
                coil_resistance: el.find_element_value_as_number("coilresistance")?,
                no_load_current: el.number_or("noloadcurrent", "", 0.0)?,
                max_current: el.number_or("maxcurrent", "", f64::INFINITY)?,
                deceleration_time: el.number_or("decelerationtime", "SEC", 0.0)?,
            };
            if bldc.kv <= 0.0 || bldc.coil_resistance <= 0.0 {
                return Err(EngineError::InvalidArg {
                    what: "motor speed constant and coil resistance must be positive",
                });
            }
            Motor::Bldc(bldc)
        } else {
            Motor::Rated {
                power: el.find_element_value_as_number_convert_to("power", "W")?,
            }
        };

        if ctx.verbose() {
            tracing::debug!(motor = ?motor, "electric engine loaded");
        }
        Ok(Self {
            motor,
            power: 0.0,
            torque: 0.0,
            current: 0.0,
            volts: 0.0,
            rpm: 0.0,
        })
    }

    /// Shaft power (W).
    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn volts(&self) -> f64 {
        self.volts
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        Some(match name {
            "power-w" => self.power,
            "power-hp" => w_to_hp(self.power),
            "torque-nm" => self.torque,
            "current-a" => self.current,
            "voltage-v" => self.volts,
            "rpm" => self.rpm,
            _ => return None,
        })
    }

    pub const TELEMETRY: &'static [&'static str] =
        &["power-w", "power-hp", "torque-nm", "current-a", "voltage-v", "rpm"];

    fn bldc_power(&mut self, bldc: &Bldc, throttle: f64, thruster: &Thruster) -> f64 {
        let omega = rpm_to_rad_s(self.rpm);
        self.volts = bldc.max_volts * throttle;
        self.current = bldc.current(self.volts, self.rpm);
        let mut torque = bldc.torque_constant() * (self.current - bldc.no_load_current);

        if torque < 0.0 && bldc.deceleration_time > 0.0 {
            let ixx = thruster.propeller().map_or(0.0, |p| p.ixx);
            let limit = ixx * omega / bldc.deceleration_time;
            torque = torque.max(-limit);
        }
        if self.rpm <= 0.0 {
            torque = torque.max(0.0);
        }
        self.torque = torque;
        torque * omega.max(0.01)
    }

    pub fn calculate(
        &mut self,
        core: &mut EngineCore,
        thruster: &mut Thruster,
        fc: &FlightConditions,
        cmd: &EngineCommands,
    ) -> f64 {
        let throttle = core.throttle(cmd);
        self.rpm = thruster.engine_rpm();

        self.power = match self.motor {
            Motor::Rated { power } => {
                self.torque = power * throttle / rpm_to_rad_s(self.rpm).max(0.01);
                power * throttle
            }
            Motor::Bldc(bldc) => self.bldc_power(&bldc, throttle, thruster),
        };

        core.running = self.power > 0.0;
        core.fuel_flow_rate = 0.0;
        core.fuel_expended = 0.0;

        thruster.calculate(self.power, fc, &cmd.thruster)
    }

    pub fn init_running(&mut self, core: &mut EngineCore) {
        core.running = true;
    }

    pub fn reset(&mut self) {
        self.power = 0.0;
        self.torque = 0.0;
        self.current = 0.0;
        self.volts = 0.0;
        self.rpm = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rated_power_scales_with_throttle() {
        let el = Element::from_yaml_str("engine", "power: 10 KW\n").unwrap();
        let mut motor = Electric::from_element(&el, &LoadContext::default()).unwrap();
        let mut core = EngineCore::new(ps_core::EngineId::from_index(0), "E");
        let mut thruster = Thruster::direct("shaft");
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        let cmd = EngineCommands {
            throttle: 0.25,
            ..Default::default()
        };
        motor.calculate(&mut core, &mut thruster, &fc, &cmd);
        assert!((motor.power() - 2500.0).abs() < 1e-9);
        assert!(core.running);
    }

    #[test]
    fn bldc_current_is_limited() {
        let bldc = Bldc {
            max_volts: 20.0,
            kv: 500.0,
            coil_resistance: 0.1,
            no_load_current: 0.5,
            max_current: 60.0,
            deceleration_time: 0.0,
        };
        assert_eq!(bldc.current(20.0, 0.0), 60.0);
        assert_eq!(bldc.current(20.0, 10_000.0), 0.0);
        assert!(bldc.current(10.0, 10_000.0) < 0.0);
        assert!((bldc.torque_constant() * 500.0 * 2.0 * PI / 60.0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_rated_power_is_a_load_error() {
        let el = Element::from_yaml_str("engine", "decelerationtime: 1\n").unwrap();
        assert!(Electric::from_element(&el, &LoadContext::default()).is_err());
    }
}
