//! Naturally aspirated or supercharged piston engine driving a propeller
//! or rotor.
//!
//! Air flow follows manifold pressure through a throttle/airbox/engine
//! impedance network; fuel flow follows air flow and mixture; indicated
//! power follows fuel flow through a mixture-efficiency correlation. Brake
//! power subtracts pumping, friction and a fixed static friction.

use std::f64::consts::PI;

use ps_config::Element;
use ps_core::atmosphere::{R_AIR, std_pressure};
use ps_core::constants::{FT_TO_M, FTLBF_TO_NM, IN_TO_M, KTS_TO_MPS, P_SL_PA, PSI_TO_PA, T_SL_K};
use ps_core::{FlightConditions, LoadContext, Table1D, hp_to_w, w_to_hp};
use ps_thrusters::Thruster;

use crate::engine::{EngineCommands, EngineCore};
use crate::error::{EngineError, EngineResult};
use crate::tank::Tank;

/// Engine fires on its own above this speed.
const START_RPM: f64 = 450.0;
/// Starter ticks before the engine is allowed to catch.
const CRANK_TICKS: u32 = 175;
const STOICHIOMETRIC_AFR: f64 = 14.7;
const CALORIFIC_VALUE_FUEL: f64 = 47.3e6;
const CP_AIR: f64 = 1005.0;
const CP_FUEL: f64 = 1700.0;
const BOOST_HYSTERESIS_PA: f64 = 1000.0;

fn default_mixture_efficiency() -> Table1D {
    Table1D::new(vec![
        (0.05000, 0.00000),
        (0.05137, 0.00862),
        (0.05179, 0.21552),
        (0.05430, 0.48276),
        (0.05842, 0.70690),
        (0.06312, 0.83621),
        (0.06942, 0.93103),
        (0.07786, 1.00000),
        (0.08845, 1.00000),
        (0.09270, 0.98276),
        (0.10120, 0.93103),
        (0.11455, 0.72414),
        (0.12158, 0.45690),
        (0.12435, 0.23276),
        (0.12500, 0.00000),
    ])
    .unwrap_or_else(|_| Table1D::constant(1.0))
}

fn default_combustion_efficiency() -> Table1D {
    Table1D::new(vec![
        (0.00, 0.980),
        (0.90, 0.980),
        (1.00, 0.970),
        (1.05, 0.950),
        (1.10, 0.900),
        (1.15, 0.850),
        (1.20, 0.790),
        (1.30, 0.700),
        (1.40, 0.630),
        (1.50, 0.570),
        (1.60, 0.525),
        (2.00, 0.345),
    ])
    .unwrap_or_else(|_| Table1D::constant(0.98))
}

/// One supercharger speed.
#[derive(Clone, Debug)]
pub struct BoostStage {
    /// Absolute rated manifold pressure (Pa).
    pub rated_map: f64,
    pub takeoff_map: f64,
    pub rated_rpm: f64,
    /// Pressure multiplier at rated RPM.
    pub boost_mul: f64,
    /// Ambient pressure below which the next speed engages (Pa).
    pub switch_pressure: f64,
}

#[derive(Clone, Debug)]
pub struct Piston {
    pub min_map: f64,
    pub max_map: f64,
    /// Swept volume (m³).
    pub displacement: f64,
    pub max_power: f64,
    /// Crank revolutions per power cycle.
    pub cycles: f64,
    pub idle_rpm: f64,
    pub max_rpm: f64,
    /// Power factor with a single magneto.
    pub spark_fail_drop: f64,
    pub static_friction: f64,
    pub starter_torque: f64,
    pub starter_rpm: f64,
    pub starter_gain: f64,
    pub volumetric_efficiency: f64,
    pub compression_ratio: f64,
    /// Manifold pressure lag (s).
    pub man_press_lag: f64,
    pub stroke: f64,
    pub cylinders: f64,
    pub cylinder_head_mass: f64,
    pub cooling_factor: f64,
    pub ram_air_factor: f64,
    pub peak_piston_speed: f64,
    pub fmep_dynamic: f64,
    pub fmep_static: f64,
    /// Indicated specific fuel consumption (kg/s per W).
    pub isfc: f64,
    mixture_efficiency: Table1D,
    combustion_table: Table1D,
    pub boost: Vec<BoostStage>,
    takeoff_boost: bool,
    z_airbox: f64,
    z_throttle: f64,

    rpm: f64,
    tmap: f64,
    map: f64,
    boost_speed: usize,
    m_dot_air: f64,
    m_dot_fuel: f64,
    equivalence_ratio: f64,
    combustion_efficiency: f64,
    pmep: f64,
    fmep: f64,
    indicated_power: f64,
    power: f64,
    egt: f64,
    cht: f64,
    oil_temp: f64,
    oil_pressure: f64,
    crank_counter: u32,
}

fn mean_piston_speed(rpm: f64, stroke: f64) -> f64 {
    rpm * stroke / 30.0
}

fn volumetric_factor(compression_ratio: f64, map: f64, p_amb: f64) -> f64 {
    let gamma = 1.3;
    let mratio = if map < 1.0 {
        compression_ratio
    } else {
        (p_amb / map).min(compression_ratio)
    };
    (gamma - 1.0) / gamma + (compression_ratio - mratio) / (gamma * (compression_ratio - 1.0))
}

impl Piston {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> EngineResult<Self> {
        let max_power = el.find_element_value_as_number_convert_to("maxhp", "W")?;
        let displacement = el.find_element_value_as_number_convert_to("displacement", "M3")?;
        if max_power <= 0.0 || displacement <= 0.0 {
            return Err(EngineError::InvalidArg {
                what: "piston max power and displacement must be positive",
            });
        }
        let min_map = el.number_or("minmp", "PA", 6.5 * ps_core::constants::INHG_TO_PA)?;
        let max_map = el.number_or("maxmp", "PA", 28.5 * ps_core::constants::INHG_TO_PA)?;
        let max_rpm = el.number_or("maxrpm", "RPM", 2800.0)?;
        let idle_rpm = el.number_or("idlerpm", "RPM", 600.0)?;
        if min_map <= 0.0 || max_map <= min_map || max_rpm <= idle_rpm || idle_rpm <= 0.0 {
            return Err(EngineError::InvalidArg {
                what: "piston manifold pressure and rpm ranges must be ordered and positive",
            });
        }

        let mut piston = Self {
            min_map,
            max_map,
            displacement,
            max_power,
            cycles: el.number_or("cycles", "", 2.0)?.max(1.0),
            idle_rpm,
            max_rpm,
            spark_fail_drop: (1.0 - el.number_or("sparkfaildrop", "", 0.1)?).clamp(0.0, 1.0),
            static_friction: el.number_or("static-friction", "W", hp_to_w(1.5))?,
            starter_torque: el.number_or(
                "startertorque",
                "N*M",
                0.8 * w_to_hp(max_power) * FTLBF_TO_NM,
            )?,
            starter_rpm: el.number_or("starterrpm", "RPM", 1400.0)?,
            starter_gain: el.number_or("startergain", "", 1.0)?,
            volumetric_efficiency: el.number_or("volumetric-efficiency", "", 0.85)?,
            compression_ratio: el.number_or("compression-ratio", "", 8.5)?,
            man_press_lag: el.number_or("man-press-lag", "SEC", 0.1)?,
            stroke: el.number_or("stroke", "M", 4.375 * IN_TO_M)?,
            cylinders: el.number_or("cylinders", "", 4.0)?,
            cylinder_head_mass: el.number_or("cylinder-head-mass", "KG", 2.0)?,
            cooling_factor: el.number_or("cooling-factor", "", 0.5151)?,
            ram_air_factor: el.number_or("ram-air-factor", "", 1.0)?,
            peak_piston_speed: el.number_or("peak-piston-speed", "M/S", 100.0 * FT_TO_M)?,
            fmep_dynamic: el.number_or("fmep-dynamic", "", 18_400.0)?,
            fmep_static: el.number_or("fmep-static", "PA", 46_500.0)?,
            isfc: 0.0,
            mixture_efficiency: match el.table_named("MIXTURE_EFFICIENCY")? {
                Some(t) => t.into_1d("MIXTURE_EFFICIENCY")?,
                None => default_mixture_efficiency(),
            },
            combustion_table: match el.table_named("COMBUSTION")? {
                Some(t) => t.into_1d("COMBUSTION")?,
                None => default_combustion_efficiency(),
            },
            boost: Vec::new(),
            takeoff_boost: false,
            z_airbox: 0.0,
            z_throttle: 0.0,
            rpm: 0.0,
            tmap: P_SL_PA,
            map: P_SL_PA,
            boost_speed: 0,
            m_dot_air: 0.0,
            m_dot_fuel: 0.0,
            equivalence_ratio: 0.0,
            combustion_efficiency: 0.0,
            pmep: 0.0,
            fmep: 0.0,
            indicated_power: 0.0,
            power: 0.0,
            egt: T_SL_K,
            cht: T_SL_K,
            oil_temp: T_SL_K,
            oil_pressure: 0.0,
            crank_counter: 0,
        };

        piston.load_supercharger(el)?;
        piston.setup_impedances();
        piston.isfc = match el.number_opt("isfc", "")? {
            // lb/hr per hp
            Some(v) => v * ps_core::constants::LB_TO_KG / 3600.0 / hp_to_w(1.0),
            None => piston.derived_isfc(),
        };

        if ctx.verbose() {
            tracing::debug!(
                max_power,
                displacement,
                min_map,
                max_map,
                idle_rpm,
                max_rpm,
                isfc = piston.isfc,
                boost_speeds = piston.boost.len(),
                "piston engine loaded"
            );
        }
        Ok(piston)
    }

    fn load_supercharger(&mut self, el: &Element) -> EngineResult<()> {
        let speeds = el.number_or("numboostspeeds", "", 0.0)?.clamp(0.0, 3.0) as usize;
        if speeds == 0 {
            return Ok(());
        }
        let takeoff = el.number_or("takeoffboost", "PA", 0.0)?;
        let mut last_altitude = 0.0;
        for i in 1..=speeds {
            let rated_boost = el.number_or(&format!("ratedboost{i}"), "PA", 0.0)?;
            let rated_power = el.number_or(&format!("ratedpower{i}"), "W", 0.0)?;
            let rated_altitude = el.number_or(&format!("ratedaltitude{i}"), "M", 0.0)?;
            let rated_rpm = el.number_or(&format!("ratedrpm{i}"), "RPM", self.max_rpm)?;
            if rated_boost <= 0.0
                || rated_power <= 0.0
                || rated_altitude < 0.0
                || rated_altitude < last_altitude
            {
                tracing::warn!(speed = i, "unusable supercharger speed ignored");
                break;
            }
            last_altitude = rated_altitude;

            let mut switch_altitude = el.number_or(&format!("boostswitchaltitude{i}"), "M", 0.0)?;
            if i < speeds && switch_altitude < rated_altitude {
                switch_altitude = rated_altitude + 1000.0 * FT_TO_M;
                tracing::warn!(
                    speed = i,
                    switch_altitude,
                    "supercharger switch altitude below rated altitude, adjusted"
                );
            }

            let rated_map = P_SL_PA + rated_boost;
            self.takeoff_boost = takeoff > rated_boost;
            let takeoff_map = if self.takeoff_boost {
                P_SL_PA + takeoff
            } else {
                rated_map
            };
            self.boost.push(BoostStage {
                rated_map,
                takeoff_map,
                rated_rpm,
                boost_mul: rated_map / std_pressure(rated_altitude),
                switch_pressure: std_pressure(switch_altitude),
            });
        }
        Ok(())
    }

    fn setup_impedances(&mut self) {
        let rated_speed = mean_piston_speed(self.max_rpm, self.stroke);
        let idle_speed = mean_piston_speed(self.idle_rpm, self.stroke);
        let ze = self.peak_piston_speed / rated_speed;
        self.z_airbox = P_SL_PA * ze / self.max_map - ze;
        self.z_throttle =
            (self.peak_piston_speed / idle_speed) * (P_SL_PA / self.min_map - 1.0) - self.z_airbox;
    }

    /// Fuel consumption that yields rated power at sea level, full throttle
    /// and full rich mixture.
    fn derived_isfc(&self) -> f64 {
        let ve = volumetric_factor(self.compression_ratio, self.max_map, P_SL_PA);
        let m_air = self.displacement * (self.max_rpm / 60.0) / self.cycles
            * self.volumetric_efficiency
            * ve
            * self.max_map
            / (R_AIR * T_SL_K);
        let m_fuel = m_air * 1.3 / STOICHIOMETRIC_AFR;

        let pmep = (self.max_map - P_SL_PA) * self.volumetric_efficiency;
        let fmep = -(self.fmep_dynamic * mean_piston_speed(self.max_rpm, self.stroke)
            + self.fmep_static);
        let loss = (pmep + fmep) * self.displacement * self.max_rpm / (30.0 * self.cycles);
        let indicated = (self.max_power - loss + self.static_friction).max(1.0);
        m_fuel / indicated
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    /// Manifold pressure (Pa).
    pub fn map(&self) -> f64 {
        self.map
    }

    pub fn boost_speed(&self) -> usize {
        self.boost_speed
    }

    pub fn air_flow(&self) -> f64 {
        self.m_dot_air
    }

    pub fn equivalence_ratio(&self) -> f64 {
        self.equivalence_ratio
    }

    /// Brake power handed to the thruster (W).
    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn indicated_power(&self) -> f64 {
        self.indicated_power
    }

    pub fn egt(&self) -> f64 {
        self.egt
    }

    pub fn cht(&self) -> f64 {
        self.cht
    }

    pub fn oil_temp(&self) -> f64 {
        self.oil_temp
    }

    /// Oil pressure (Pa).
    pub fn oil_pressure(&self) -> f64 {
        self.oil_pressure
    }

    pub fn crank_counter(&self) -> u32 {
        self.crank_counter
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        Some(match name {
            "rpm" => self.rpm,
            "map-pa" => self.map,
            "map-inhg" => self.map / ps_core::constants::INHG_TO_PA,
            "boost-speed" => self.boost_speed as f64,
            "air-flow-kgps" => self.m_dot_air,
            "power-w" => self.power,
            "power-hp" => w_to_hp(self.power),
            "egt-k" => self.egt,
            "cht-k" => self.cht,
            "oil-temp-k" => self.oil_temp,
            "oil-pressure-pa" => self.oil_pressure,
            _ => return None,
        })
    }

    pub const TELEMETRY: &'static [&'static str] = &[
        "rpm",
        "map-pa",
        "map-inhg",
        "boost-speed",
        "air-flow-kgps",
        "power-w",
        "power-hp",
        "egt-k",
        "cht-k",
        "oil-temp-k",
        "oil-pressure-pa",
    ];

    fn engine_startup(&mut self, core: &mut EngineCore, cmd: &EngineCommands) {
        let spark = cmd.magnetos != 0;
        let fuel = !core.starved;

        core.cranking = cmd.starter;
        if core.cranking {
            self.crank_counter = self.crank_counter.saturating_add(1);
        } else {
            self.crank_counter = 0;
        }

        let was_running = core.running;
        if !core.running && spark && fuel {
            if core.cranking {
                if self.rpm > START_RPM && self.crank_counter > CRANK_TICKS {
                    core.running = true;
                }
            } else if self.rpm > START_RPM {
                core.running = true;
            }
        }

        if core.running && (!spark || !fuel) {
            core.running = false;
        }

        if core.running && (self.rpm == 0.0 || (self.rpm <= START_RPM && core.cranking)) {
            core.running = false;
        }

        if core.running != was_running {
            tracing::info!(
                engine = %core.name,
                running = core.running,
                rpm = self.rpm,
                "piston engine state changed"
            );
        }
    }

    fn boost_control(&mut self, p_amb: f64) {
        let n = self.boost.len();
        if n > 1 {
            if self.boost_speed + 1 < n
                && p_amb < self.boost[self.boost_speed].switch_pressure - BOOST_HYSTERESIS_PA
            {
                self.boost_speed += 1;
            }
            if self.boost_speed > 0
                && p_amb > self.boost[self.boost_speed - 1].switch_pressure + BOOST_HYSTERESIS_PA
            {
                self.boost_speed -= 1;
            }
        }
        self.boost_speed = self.boost_speed.min(n.saturating_sub(1));
    }

    fn manifold_pressure(&mut self, throttle: f64, p_amb: f64, p_ram: f64, dt: f64) {
        let zt = (1.0 - throttle) * (1.0 - throttle) * self.z_throttle;
        let speed = mean_piston_speed(self.rpm, self.stroke);
        let ze = if speed > 0.0 {
            self.peak_piston_speed / speed
        } else {
            999_999.0
        };
        let coefficient = ze / (ze + self.z_airbox + zt);
        let target = p_ram * coefficient;

        let d_map = if dt > 0.0 && self.man_press_lag > 0.0 {
            (self.tmap - target) * dt / self.man_press_lag
        } else {
            self.tmap - target
        };
        self.tmap -= d_map;
        self.pmep = (self.tmap - p_amb) * self.volumetric_efficiency;

        self.map = match self.boost.get(self.boost_speed) {
            Some(stage) => {
                let factor = (stage.boost_mul - 1.0) / stage.rated_rpm * self.rpm + 1.0;
                let limit = if self.takeoff_boost && throttle > 0.98 {
                    stage.takeoff_map
                } else {
                    stage.rated_map
                };
                (self.tmap * factor).min(limit)
            }
            None => self.tmap,
        };
    }

    /// Air is pumped whenever the crankshaft turns; fuel is metered only
    /// into a firing engine.
    fn air_flow_and_fuel(&mut self, p_amb: f64, t_amb: f64, mixture: f64, firing: bool) {
        let ve = volumetric_factor(self.compression_ratio, self.map, p_amb);
        let swept = self.displacement * (self.rpm / 60.0) / self.cycles;
        let v_dot_air = swept * self.volumetric_efficiency * ve;
        self.m_dot_air = v_dot_air * self.map / (R_AIR * t_amb);

        if !firing {
            self.equivalence_ratio = 0.0;
            self.m_dot_fuel = 0.0;
            return;
        }
        let thi_sea_level = 1.3 * mixture;
        self.equivalence_ratio = thi_sea_level * P_SL_PA / p_amb.max(1.0);
        self.m_dot_fuel = self.m_dot_air * self.equivalence_ratio / STOICHIOMETRIC_AFR;
    }

    fn engine_power(&mut self, core: &EngineCore, magnetos: u8) {
        let speed = mean_piston_speed(self.rpm, self.stroke);
        self.fmep = -(self.fmep_dynamic * speed + self.fmep_static);

        self.indicated_power = if core.running {
            let fa = if self.m_dot_air > 0.0 {
                self.m_dot_fuel / self.m_dot_air
            } else {
                0.0
            };
            let me = self.mixture_efficiency.value(fa);
            let spark = if magnetos == 3 { 1.0 } else { self.spark_fail_drop };
            self.m_dot_fuel / self.isfc * me * spark
        } else if core.cranking {
            let omega = self.rpm.max(1.0) * 2.0 * PI / 60.0;
            let k = if self.rpm < self.starter_rpm {
                1.0 - self.rpm / self.starter_rpm
            } else {
                0.0
            };
            self.starter_torque * k * self.starter_gain * omega
        } else {
            0.0
        };

        let pumping =
            (self.pmep + self.fmep) * self.displacement * self.rpm / (30.0 * self.cycles);
        // The static friction offset is an idle-power trim and only applies
        // to a firing engine.
        let offset = if core.running { self.static_friction } else { 0.0 };
        self.power = self.indicated_power + pumping - offset;
    }

    fn exhaust_temperature(&mut self, running: bool, t_amb: f64, tat: f64, dt: f64) {
        if running && self.m_dot_air > 0.0 {
            self.combustion_efficiency = self.combustion_table.value(self.equivalence_ratio);
            let enthalpy =
                self.m_dot_fuel * CALORIFIC_VALUE_FUEL * self.combustion_efficiency * 0.30;
            let heat_capacity = CP_AIR * self.m_dot_air + CP_FUEL * self.m_dot_fuel;
            self.egt = t_amb + enthalpy / heat_capacity;
        } else {
            self.combustion_efficiency = 0.0;
            self.egt += (tat - self.egt) / 100.0 * dt;
        }
    }

    fn head_temperature(&mut self, fc: &FlightConditions, dt: f64) {
        let h1 = -95.0;
        let h2 = -3.95;
        let h3 = -140.0;

        let t_amb = fc.temperature;
        let rho_air = fc.pressure / (R_AIR * t_amb);
        let displacement_in3 = self.displacement / IN_TO_M.powi(3);
        let area = displacement_in3 / 360.0;
        let cp_head = 800.0;
        let mass = self.cylinder_head_mass * self.cylinders;

        let dt_head = self.cht - t_amb;
        let v_apparent = fc.vc / KTS_TO_MPS * self.cooling_factor;
        let m_dot_cooling = area * v_apparent * rho_air;

        let from_combustion =
            self.m_dot_fuel * CALORIFIC_VALUE_FUEL * self.combustion_efficiency * 0.33;
        let forced = h2 * m_dot_cooling * dt_head + h3 * self.rpm * dt_head / self.max_rpm;
        let free = h1 * dt_head * area;

        self.cht += (from_combustion + forced + free) / (cp_head * mass) * dt;
    }

    fn oil(&mut self, t_amb: f64, dt: f64) {
        let efficiency = 0.667;
        let target = self.cht * efficiency + t_amb * (1.0 - efficiency);
        let psi = self.oil_pressure / PSI_TO_PA;
        let tau = if psi > 5.0 { 5000.0 / psi } else { 1000.0 };
        self.oil_temp += (target - self.oil_temp) / tau * dt;

        let relief = 60.0;
        let rpm_max = self.max_rpm * 0.75;
        let design_temp = 358.0;
        let viscosity_index = 0.25;
        let mut p = (relief / rpm_max * self.rpm).min(relief);
        p += (design_temp - self.oil_temp) * viscosity_index * p / relief;
        self.oil_pressure = p * PSI_TO_PA;
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
        let mixture = cmd.mixture.clamp(0.0, 1.0);
        let p_amb = fc.pressure;
        let p_ram = p_amb + (fc.total_pressure - p_amb) * self.ram_air_factor;
        let t_amb = fc.temperature;
        self.rpm = thruster.engine_rpm();

        self.engine_startup(core, cmd);
        if !self.boost.is_empty() {
            self.boost_control(p_amb);
        }
        self.manifold_pressure(throttle, p_amb, p_ram, dt);
        self.air_flow_and_fuel(p_amb, t_amb, mixture, core.running && !core.starved);
        self.engine_power(core, cmd.magnetos);
        if core.running && self.indicated_power < hp_to_w(0.125) {
            core.running = false;
            self.m_dot_fuel = 0.0;
        }
        core.fuel_flow_rate = self.m_dot_fuel;

        self.exhaust_temperature(core.running, t_amb, fc.tat, dt);
        self.head_temperature(fc, dt);
        self.oil(t_amb, dt);

        core.consume_fuel(tanks, self.m_dot_fuel * dt, None, fc.is_trim());

        let mut power = self.power;
        if self.rpm <= 0.1 {
            power = power.max(0.0);
        }
        thruster.calculate(power, fc, &cmd.thruster)
    }

    /// In-air start: running with the propeller at twice idle speed.
    pub fn init_running(&mut self, core: &mut EngineCore, thruster: &mut Thruster) {
        core.running = true;
        core.cranking = false;
        self.crank_counter = 0;
        thruster.set_rpm(2.0 * self.idle_rpm / thruster.gear_ratio);
        self.rpm = thruster.engine_rpm();
    }

    pub fn reset(&mut self) {
        self.rpm = 0.0;
        self.tmap = P_SL_PA;
        self.map = P_SL_PA;
        self.boost_speed = 0;
        self.m_dot_air = 0.0;
        self.m_dot_fuel = 0.0;
        self.equivalence_ratio = 0.0;
        self.combustion_efficiency = 0.0;
        self.pmep = 0.0;
        self.fmep = 0.0;
        self.indicated_power = 0.0;
        self.power = 0.0;
        self.egt = T_SL_K;
        self.cht = T_SL_K;
        self.oil_temp = T_SL_K;
        self.oil_pressure = 0.0;
        self.crank_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::constants::INHG_TO_PA;

    const O320: &str = r#"
minmp: 10.0 INHG
maxmp: 28.5 INHG
displacement: 320 IN3
maxhp: 160 HP
cycles: 2
idlerpm: 700
maxrpm: 2700
"#;

    fn piston(doc: &str) -> Piston {
        let el = Element::from_yaml_str("engine", doc).unwrap();
        Piston::from_element(&el, &LoadContext::default()).unwrap()
    }

    #[test]
    fn impedances_reproduce_map_limits() {
        let p = piston(O320);
        // Full throttle at rated rpm gives max MAP from sea-level ram pressure.
        let ze = p.peak_piston_speed / mean_piston_speed(p.max_rpm, p.stroke);
        let coef = ze / (ze + p.z_airbox);
        assert!((P_SL_PA * coef - 28.5 * INHG_TO_PA).abs() < 1.0);
        // Closed throttle at idle gives min MAP.
        let zi = p.peak_piston_speed / mean_piston_speed(p.idle_rpm, p.stroke);
        let coef = zi / (zi + p.z_airbox + p.z_throttle);
        assert!((P_SL_PA * coef - 10.0 * INHG_TO_PA).abs() < 1.0);
    }

    #[test]
    fn derived_isfc_is_plausible() {
        let p = piston(O320);
        // Roughly 0.4-0.6 lb/hr per hp.
        let lb_hr_hp = p.isfc / ps_core::constants::LB_TO_KG * 3600.0 * hp_to_w(1.0);
        assert!(lb_hr_hp > 0.2 && lb_hr_hp < 0.8, "isfc {lb_hr_hp}");
    }

    #[test]
    fn supercharger_switches_with_hysteresis() {
        let doc = format!(
            "{O320}numboostspeeds: 2\nratedboost1: 5 PSI\nratedpower1: 150 HP\nratedaltitude1: 1000 M\nboostswitchaltitude1: 500 M\nratedboost2: 5 PSI\nratedpower2: 150 HP\nratedaltitude2: 4000 M\n"
        );
        let mut p = piston(&doc);
        assert_eq!(p.boost.len(), 2);
        // Switch altitude was below rated altitude and got moved up.
        let switch = p.boost[0].switch_pressure;
        assert!(switch < std_pressure(1000.0));

        p.boost_control(switch - 2.0 * BOOST_HYSTERESIS_PA);
        assert_eq!(p.boost_speed(), 1);
        p.boost_control(switch + 0.5 * BOOST_HYSTERESIS_PA);
        assert_eq!(p.boost_speed(), 1);
        p.boost_control(switch + 2.0 * BOOST_HYSTERESIS_PA);
        assert_eq!(p.boost_speed(), 0);
    }

    #[test]
    fn lean_mixture_cuts_fuel() {
        let mut p = piston(O320);
        p.rpm = 2000.0;
        p.map = 25.0 * INHG_TO_PA;
        p.air_flow_and_fuel(P_SL_PA, T_SL_K, 0.0, true);
        assert!(p.air_flow() > 0.0);
        assert_eq!(p.m_dot_fuel, 0.0);
        p.air_flow_and_fuel(P_SL_PA, T_SL_K, 1.0, true);
        assert!(p.m_dot_fuel > 0.0);
    }

    #[test]
    fn cranking_pumps_air_but_meters_no_fuel() {
        let mut p = piston(O320);
        p.rpm = 300.0;
        p.map = 29.0 * INHG_TO_PA;
        p.air_flow_and_fuel(P_SL_PA, T_SL_K, 1.0, false);
        assert!(p.air_flow() > 0.0);
        assert_eq!(p.m_dot_fuel, 0.0);
        assert_eq!(p.equivalence_ratio(), 0.0);
    }

    #[test]
    fn missing_displacement_is_config_error() {
        let el = Element::from_yaml_str("engine", "maxhp: 100 HP\n").unwrap();
        assert!(matches!(
            Piston::from_element(&el, &LoadContext::default()),
            Err(EngineError::Config(_))
        ));
    }
}
