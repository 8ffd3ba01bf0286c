//! Solid and liquid rockets.
//!
//! A solid motor reads thrust from a table keyed by propellant burned and,
//! once lit at full throttle, burns to completion. A liquid engine meters
//! fuel and oxidizer in proportion to throttle and flames out below its
//! minimum throttle or when either propellant runs dry.

use std::f64::consts::FRAC_PI_2;

use ps_config::Element;
use ps_core::constants::G0_MPS2;
use ps_core::{FlightConditions, LoadContext, Table1D};
use ps_thrusters::Thruster;

use crate::engine::{EngineCommands, EngineCore};
use crate::error::{EngineError, EngineResult};
use crate::tank::Tank;

#[derive(Clone, Debug)]
pub enum Propellant {
    /// Vacuum thrust (N) against propellant burned (kg).
    Solid { thrust: Table1D },
    Liquid {
        /// Sea-level fuel and oxidizer flow at full throttle (kg/s).
        fuel_flow_max: f64,
        oxidizer_flow_max: f64,
    },
}

#[derive(Clone, Debug)]
pub struct Rocket {
    /// Specific impulse (s).
    pub isp: f64,
    pub propellant: Propellant,
    /// Thrust ramp-up time after ignition (s); 0 means instantaneous.
    pub buildup_time: f64,
    /// Fractional thrust and Isp deviation from nominal.
    pub thrust_variation: f64,
    pub isp_variation: f64,

    ignited: bool,
    burn_time: f64,
    vacuum_thrust: f64,
    propellant_expended: f64,
    total_impulse: f64,
    vacuum_impulse: f64,
}

impl Rocket {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> EngineResult<Self> {
        let isp = el.find_element_value_as_number("isp")?;
        if isp <= 0.0 {
            return Err(EngineError::InvalidArg {
                what: "rocket specific impulse must be positive",
            });
        }

        let propellant = match el.table_named("thrust")? {
            Some(t) => Propellant::Solid {
                thrust: t.into_1d("thrust")?,
            },
            None => {
                let fuel_flow_max =
                    el.find_element_value_as_number_convert_to("slfuelflowmax", "KG/S")?;
                let oxidizer_flow_max = match el.number_opt("sloxiflowmax", "KG/S")? {
                    Some(v) => v,
                    None => fuel_flow_max * el.number_or("mixtureratio", "", 0.0)?,
                };
                Propellant::Liquid {
                    fuel_flow_max,
                    oxidizer_flow_max,
                }
            }
        };

        let (thrust_variation, isp_variation) = match el.find_element("variation") {
            Some(v) => (
                v.number_or("thrust", "", 0.0)?,
                v.number_or("isp", "", 0.0)?,
            ),
            None => (0.0, 0.0),
        };

        let rocket = Self {
            isp,
            propellant,
            buildup_time: el.number_or("builduptime", "SEC", 0.0)?,
            thrust_variation,
            isp_variation,
            ignited: false,
            burn_time: 0.0,
            vacuum_thrust: 0.0,
            propellant_expended: 0.0,
            total_impulse: 0.0,
            vacuum_impulse: 0.0,
        };

        if ctx.verbose() {
            tracing::debug!(
                isp,
                solid = rocket.is_solid(),
                buildup_time = rocket.buildup_time,
                thrust_variation,
                isp_variation,
                "rocket engine loaded"
            );
        }
        Ok(rocket)
    }

    pub fn is_solid(&self) -> bool {
        matches!(self.propellant, Propellant::Solid { .. })
    }

    pub fn is_ignited(&self) -> bool {
        self.ignited
    }

    pub fn vacuum_thrust(&self) -> f64 {
        self.vacuum_thrust
    }

    /// Total impulse delivered, ambient losses included (N·s).
    pub fn total_impulse(&self) -> f64 {
        self.total_impulse
    }

    pub fn vacuum_impulse(&self) -> f64 {
        self.vacuum_impulse
    }

    pub fn propellant_expended(&self) -> f64 {
        self.propellant_expended
    }

    pub fn burn_time(&self) -> f64 {
        self.burn_time
    }

    /// Oxidizer to fuel mass ratio of a liquid engine.
    pub fn mixture_ratio(&self) -> f64 {
        match self.propellant {
            Propellant::Liquid {
                fuel_flow_max,
                oxidizer_flow_max,
            } if fuel_flow_max > 0.0 => oxidizer_flow_max / fuel_flow_max,
            _ => 0.0,
        }
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        Some(match name {
            "vacuum-thrust-n" => self.vacuum_thrust,
            "total-impulse-ns" => self.total_impulse,
            "vacuum-impulse-ns" => self.vacuum_impulse,
            "propellant-expended-kg" => self.propellant_expended,
            "burn-time-s" => self.burn_time,
            "isp-s" => self.isp,
            "mixture-ratio" => self.mixture_ratio(),
            "ignited" => f64::from(u8::from(self.ignited)),
            _ => return None,
        })
    }

    pub const TELEMETRY: &'static [&'static str] = &[
        "vacuum-thrust-n",
        "total-impulse-ns",
        "vacuum-impulse-ns",
        "propellant-expended-kg",
        "burn-time-s",
        "isp-s",
        "mixture-ratio",
        "ignited",
    ];

    fn exhaust_velocity(&self) -> f64 {
        self.isp * G0_MPS2
    }

    fn solid(&mut self, core: &mut EngineCore, throttle: f64, dt: f64) {
        if !self.ignited && throttle >= 0.999 {
            self.ignited = true;
            tracing::info!(engine = %core.name, "solid motor ignited");
        }
        if !self.ignited || core.starved {
            self.vacuum_thrust = 0.0;
            core.fuel_flow_rate = 0.0;
            core.running = false;
            return;
        }

        let nominal = match &self.propellant {
            Propellant::Solid { thrust } => thrust.value(self.propellant_expended),
            Propellant::Liquid { .. } => 0.0,
        };
        let mut vac = nominal
            * (1.0 + self.thrust_variation)
            * (1.0 + self.isp_variation);
        if self.buildup_time > 0.0 && self.burn_time < self.buildup_time {
            vac *= (self.burn_time / self.buildup_time * FRAC_PI_2).sin();
        }
        self.burn_time += dt;
        self.vacuum_thrust = vac.max(0.0);
        core.running = self.vacuum_thrust > 0.0 || self.burn_time <= self.buildup_time;
        core.fuel_flow_rate =
            self.vacuum_thrust / self.exhaust_velocity() / (1.0 + self.isp_variation);
        core.oxidizer_flow_rate = 0.0;
    }

    fn liquid(
        &mut self,
        core: &mut EngineCore,
        fuel_flow_max: f64,
        oxidizer_flow_max: f64,
        throttle: f64,
        dt: f64,
    ) {
        if throttle < core.min_throttle.max(1.0e-6) || core.starved {
            if core.running {
                tracing::info!(engine = %core.name, "liquid engine flamed out");
            }
            core.running = false;
            core.fuel_flow_rate = 0.0;
            core.oxidizer_flow_rate = 0.0;
            self.vacuum_thrust = 0.0;
            return;
        }
        if !core.running {
            tracing::info!(engine = %core.name, "liquid engine ignited");
        }
        core.running = true;
        self.ignited = true;
        self.burn_time += dt;
        core.fuel_flow_rate = fuel_flow_max * throttle;
        core.oxidizer_flow_rate = oxidizer_flow_max * throttle;
        self.vacuum_thrust = self.exhaust_velocity()
            * (core.fuel_flow_rate + core.oxidizer_flow_rate)
            * (1.0 + self.thrust_variation);
    }

    pub fn calculate(
        &mut self,
        core: &mut EngineCore,
        thruster: &mut Thruster,
        fc: &FlightConditions,
        cmd: &EngineCommands,
        tanks: &mut [Tank],
    ) -> f64 {
        let dt = fc.dt;
        let throttle = core.throttle(cmd);

        let liquid_flows = match &self.propellant {
            Propellant::Liquid {
                fuel_flow_max,
                oxidizer_flow_max,
            } => Some((*fuel_flow_max, *oxidizer_flow_max)),
            Propellant::Solid { .. } => None,
        };
        let oxidizer_need = match liquid_flows {
            Some((fuel_max, oxidizer_max)) => {
                self.liquid(core, fuel_max, oxidizer_max, throttle, dt);
                Some(core.oxidizer_flow_rate * dt)
            }
            None => {
                self.solid(core, throttle, dt);
                None
            }
        };

        core.consume_fuel(tanks, core.fuel_flow_rate * dt, oxidizer_need, fc.is_trim());
        if !fc.is_trim() && !core.fuel_freeze {
            self.propellant_expended += core.fuel_expended + core.oxidizer_expended;
        }
        if core.starved && self.vacuum_thrust > 0.0 {
            tracing::warn!(engine = %core.name, "rocket propellant exhausted");
            self.vacuum_thrust = 0.0;
            core.running = false;
        }

        let thrust = thruster.calculate(self.vacuum_thrust, fc, &cmd.thruster);
        self.total_impulse += thrust * dt;
        self.vacuum_impulse += self.vacuum_thrust * dt;
        thrust
    }

    pub fn init_running(&mut self, core: &mut EngineCore) {
        self.ignited = true;
        core.running = true;
    }

    pub fn reset(&mut self) {
        self.ignited = false;
        self.burn_time = 0.0;
        self.vacuum_thrust = 0.0;
        self.propellant_expended = 0.0;
        self.total_impulse = 0.0;
        self.vacuum_impulse = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tank::TankKind;
    use ps_core::{EngineId, TankId};

    const LIQUID: &str = r#"
isp: 300
slfuelflowmax: 10 KG/S
mixtureratio: 2.5
"#;

    fn rocket(doc: &str) -> Rocket {
        let el = Element::from_yaml_str("engine", doc).unwrap();
        Rocket::from_element(&el, &LoadContext::default()).unwrap()
    }

    #[test]
    fn liquid_thrust_follows_propellant_flow() {
        let mut r = rocket(LIQUID);
        assert!((r.mixture_ratio() - 2.5).abs() < 1e-12);
        let mut core = EngineCore::new(EngineId::from_index(0), "LR");
        core.add_feed_tank(TankId::from_index(0));
        core.add_feed_tank(TankId::from_index(1));
        let mut tanks = vec![
            Tank::new(TankKind::Fuel, 100.0, 100.0).unwrap(),
            Tank::new(TankKind::Oxidizer, 250.0, 250.0).unwrap(),
        ];
        let mut thruster = Thruster::direct("chamber");
        let fc = FlightConditions::standard(0.0, 0.0, 0.1);
        let cmd = EngineCommands {
            throttle: 0.5,
            ..Default::default()
        };
        r.calculate(&mut core, &mut thruster, &fc, &cmd, &mut tanks);
        let expected = 300.0 * G0_MPS2 * (5.0 + 12.5);
        assert!((r.vacuum_thrust() - expected).abs() < 1e-6);
        assert!((tanks[0].contents() - 99.5).abs() < 1e-9);
        assert!((tanks[1].contents() - 248.75).abs() < 1e-9);
    }

    #[test]
    fn missing_flow_limit_is_a_load_error() {
        let el = Element::from_yaml_str("engine", "isp: 300\n").unwrap();
        assert!(Rocket::from_element(&el, &LoadContext::default()).is_err());
    }

    #[test]
    fn solid_ramp_uses_buildup_time() {
        let doc = r#"
isp: 250
builduptime: 1.0
table:
  - "@name": thrust
    tableData: |
      0   1000
      50  1000
      60  0
"#;
        let mut r = rocket(doc);
        let mut core = EngineCore::new(EngineId::from_index(0), "SRB");
        core.add_feed_tank(TankId::from_index(0));
        let mut tanks = vec![Tank::new(TankKind::Fuel, 60.0, 60.0).unwrap()];
        let mut thruster = Thruster::direct("nozzle");
        let fc = FlightConditions::standard(0.0, 0.0, 0.25);
        let lit = EngineCommands {
            throttle: 1.0,
            ..Default::default()
        };
        r.calculate(&mut core, &mut thruster, &fc, &lit, &mut tanks);
        assert!(r.is_ignited());
        // First tick at zero burn time produces no thrust yet.
        assert_eq!(r.vacuum_thrust(), 0.0);
        r.calculate(&mut core, &mut thruster, &fc, &lit, &mut tanks);
        let ramp = (0.25 * FRAC_PI_2).sin() * 1000.0;
        assert!((r.vacuum_thrust() - ramp).abs() < 1e-9);
    }
}
