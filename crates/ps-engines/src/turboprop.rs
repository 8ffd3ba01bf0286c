//! Turboprop: a single gas-generator spool (N1) driving a propeller through
//! a free power turbine.
//!
//! Shaft power comes from a 2-D table keyed by propeller-side engine RPM and
//! N1, optionally scaled by a calibrated-airspeed × altitude factor. An
//! electronic limiter (IELU) backs the effective throttle off while shaft
//! torque exceeds its limit.

use ps_config::{Element, Table};
use ps_core::constants::LB_TO_KG;
use ps_core::{FlightConditions, LoadContext, Table1D, Table2D, exp_seek, hp_to_w, seek, w_to_hp};
use ps_thrusters::{Thruster, ThrusterKind};

use crate::engine::{EngineCommands, EngineCore, Phase};
use crate::error::{EngineError, EngineResult};
use crate::tank::Tank;

/// Gas generator speed needed before fuel is introduced (%).
const LIGHT_OFF_N1: f64 = 15.0;
/// Windmilling friction applied while the engine is off and turning.
const WINDMILL_FRICTION_HP: f64 = 0.012;
const IELU_BACK_OFF: f64 = 0.1;
const IELU_RESTORE: f64 = 0.05;

const KELVIN: f64 = 273.15;

fn default_power_table(max_power: f64) -> EngineResult<Table2D> {
    let n1 = [0.0, 50.0, 60.0, 86.0, 94.0, 95.0, 96.0, 100.0, 105.0];
    let fraction = [0.0, 0.0, 0.04, 0.45, 0.8, 0.85, 0.9, 1.0, 1.05];
    let row: Vec<f64> = fraction.iter().map(|f| f * max_power).collect();
    Ok(Table2D::new(vec![0.0, 5000.0], n1.to_vec(), vec![row.clone(), row])?)
}

fn default_itt_table() -> EngineResult<Table1D> {
    Ok(Table1D::new(vec![
        (0.0, 0.0),
        (25.0, 550.0),
        (60.0, 350.0),
        (96.0, 600.0),
        (100.0, 650.0),
    ])?)
}

fn default_combustion_table() -> EngineResult<Table1D> {
    Ok(Table1D::new(vec![(0.0, 0.5), (50.0, 0.5), (100.0, 0.98), (110.0, 0.99)])?)
}

#[derive(Clone, Debug)]
pub struct Turboprop {
    /// Rated shaft power (W).
    pub max_power: f64,
    /// Power specific fuel consumption (kg/s per W).
    pub psfc: f64,
    pub idle_n1: f64,
    /// Idle N1 with the condition lever fully forward.
    pub idle_n1_high: f64,
    pub max_n1: f64,
    /// Spool-up time constant (s); spool-down uses 2.4 times this.
    pub idle_max_delay: f64,
    pub starter_n1: f64,
    /// Start is abandoned after this long in the start phase (s).
    pub max_starting_time: f64,
    /// ITT first-order time constant (s).
    pub itt_delay: f64,
    /// Torque limit enforced by the IELU (N·m); `None` disables it.
    pub ielu_max_torque: Option<f64>,
    /// Throttle position at the top of the beta range.
    pub beta_range_end: f64,
    /// Reverse power at full reverse throttle (% of max).
    pub reverse_max_power: f64,
    /// Whether the starter generator has electrical power.
    pub generator_power: bool,
    power_rpm_n1: Table2D,
    power_vc: Table2D,
    itt_n1: Table1D,
    combustion_n1: Table1D,

    phase: Phase,
    n1: f64,
    power: f64,
    itt: f64,
    combustion_efficiency: f64,
    fuel_flow: f64,
    starting_time: f64,
    ielu_throttle: f64,
    ielu_intervening: bool,
}

impl Turboprop {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> EngineResult<Self> {
        let max_power = el.find_element_value_as_number_convert_to("maxpower", "W")?;
        if max_power <= 0.0 {
            return Err(EngineError::InvalidArg {
                what: "turboprop max power must be positive",
            });
        }
        let idle_n1 = el.number_or("idlen1", "", 60.0)?;
        let max_n1 = el.number_or("maxn1", "", 100.0)?;
        if max_n1 <= idle_n1 {
            return Err(EngineError::InvalidArg {
                what: "turboprop max N1 must exceed idle",
            });
        }

        // Tabulated power and ITT are given in HP and degrees C.
        let power_rpm_n1 = match el.table_named("EnginePowerRPM_N1")? {
            Some(t) => t.into_2d().scaled(hp_to_w(1.0)),
            None => default_power_table(max_power)?,
        };
        let power_vc = el
            .table_named("EnginePowerVC")?
            .map_or_else(|| Table2D::constant(1.0), Table::into_2d);
        let itt_n1 = match el.table_named("ITT_N1")? {
            Some(t) => t.into_1d("ITT_N1")?,
            None => default_itt_table()?,
        };
        let combustion_n1 = match el.table_named("CombustionEfficiency_N1")? {
            Some(t) => t.into_1d("CombustionEfficiency_N1")?,
            None => default_combustion_table()?,
        };

        let engine = Self {
            max_power,
            psfc: el.number_or("psfc", "", 0.6)? * LB_TO_KG / 3600.0 / hp_to_w(1.0),
            idle_n1,
            idle_n1_high: el.number_or("idlen1high", "", idle_n1)?,
            max_n1,
            idle_max_delay: el.number_or("n1idle_max_delay", "SEC", 1.0)?.max(1.0e-3),
            starter_n1: el.number_or("startern1", "", 20.0)?,
            max_starting_time: el.number_or("maxstartingtime", "SEC", 20.0)?,
            itt_delay: el.number_or("itt_delay", "SEC", 0.05)?,
            ielu_max_torque: el.number_opt("ielumaxtorque", "N*M")?,
            beta_range_end: el.number_or("betarangeend", "", 0.0)?.clamp(0.0, 0.99),
            reverse_max_power: el.number_or("reversemaxpower", "", 0.0)?,
            generator_power: el.flag_or("generatorpower", true)?,
            power_rpm_n1,
            power_vc,
            itt_n1,
            combustion_n1,
            phase: Phase::Off,
            n1: 0.0,
            power: 0.0,
            itt: KELVIN + 15.0,
            combustion_efficiency: 0.0,
            fuel_flow: 0.0,
            starting_time: 0.0,
            ielu_throttle: 1.0,
            ielu_intervening: false,
        };

        if ctx.verbose() {
            tracing::debug!(
                max_power_hp = w_to_hp(max_power),
                idle_n1,
                max_n1,
                ielu = ?engine.ielu_max_torque,
                beta_range_end = engine.beta_range_end,
                "turboprop engine loaded"
            );
        }
        Ok(engine)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn n1(&self) -> f64 {
        self.n1
    }

    /// Shaft power (W).
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Inter-turbine temperature (K).
    pub fn itt(&self) -> f64 {
        self.itt
    }

    pub fn ielu_intervening(&self) -> bool {
        self.ielu_intervening
    }

    /// Throttle ceiling currently imposed by the IELU.
    pub fn ielu_throttle(&self) -> f64 {
        self.ielu_throttle
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        Some(match name {
            "n1" => self.n1,
            "phase" => self.phase.code(),
            "power-w" => self.power,
            "power-hp" => w_to_hp(self.power),
            "itt-k" => self.itt,
            "combustion-efficiency" => self.combustion_efficiency,
            "starting-time-s" => self.starting_time,
            "ielu-intervent" => f64::from(u8::from(self.ielu_intervening)),
            "ielu-throttle" => self.ielu_throttle,
            _ => return None,
        })
    }

    pub const TELEMETRY: &'static [&'static str] = &[
        "n1",
        "phase",
        "power-w",
        "power-hp",
        "itt-k",
        "combustion-efficiency",
        "starting-time-s",
        "ielu-intervent",
        "ielu-throttle",
    ];

    fn idle(&self, condition: f64) -> f64 {
        self.idle_n1 + (self.idle_n1_high - self.idle_n1) * condition.clamp(0.0, 1.0)
    }

    /// Beta-range and reverse mapping of the power lever.
    fn shaft_throttle(&self, throttle: f64, reverse: bool) -> f64 {
        if !reverse {
            return throttle;
        }
        if throttle < self.beta_range_end {
            0.0
        } else {
            (throttle - self.beta_range_end) / (1.0 - self.beta_range_end)
                * self.reverse_max_power
                / 100.0
        }
    }

    fn shaft_torque(thruster: &Thruster) -> f64 {
        match &thruster.kind {
            ThrusterKind::Propeller(p) => p.torque(),
            ThrusterKind::Rotor(r) => r.shaft_torque(),
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => 0.0,
        }
    }

    fn update_ielu(&mut self, torque: f64, dt: f64) {
        let Some(limit) = self.ielu_max_torque else {
            return;
        };
        let over = torque.abs() > limit;
        if over != self.ielu_intervening {
            tracing::info!(torque, limit, intervening = over, "turboprop torque limiter");
        }
        self.ielu_intervening = over;
        self.ielu_throttle = if over {
            seek(self.ielu_throttle, 0.0, 0.0, IELU_BACK_OFF, dt)
        } else {
            seek(self.ielu_throttle, 1.0, IELU_RESTORE, 0.0, dt)
        };
    }

    fn advance_phase(&mut self, core: &mut EngineCore, cutoff: bool, starter: bool, dt: f64) {
        let before = self.phase;

        if self.phase == Phase::Trim && dt > 0.0 {
            self.phase = if core.running && !core.starved {
                Phase::Run
            } else {
                Phase::Off
            };
        }
        if !core.running && starter && cutoff && self.phase == Phase::Off {
            if self.generator_power {
                self.phase = Phase::SpinUp;
            } else {
                tracing::warn!(engine = %core.name, "starter has no generator power");
            }
        }
        if !core.running
            && !cutoff
            && self.n1 > LIGHT_OFF_N1
            && matches!(self.phase, Phase::Off | Phase::SpinUp)
        {
            self.phase = Phase::Start;
            self.starting_time = 0.0;
        }
        if cutoff && self.phase != Phase::SpinUp {
            self.phase = Phase::Off;
        }
        if dt == 0.0 {
            self.phase = Phase::Trim;
        }
        if core.starved {
            self.phase = Phase::Off;
        }

        if self.phase != before {
            tracing::info!(engine = %core.name, from = %before, to = %self.phase, "turboprop phase");
        }
    }

    fn shaft_power(&self, rpm: f64, fc: &FlightConditions) -> f64 {
        let p = self.power_rpm_n1.value(rpm, self.n1) * self.power_vc.value(fc.vc, fc.altitude);
        p.min(self.max_power)
    }

    fn itt_target(&self, fc: &FlightConditions) -> f64 {
        (self.itt_n1.value(self.n1) + KELVIN).max(fc.tat)
    }

    fn off(&mut self, core: &mut EngineCore, fc: &FlightConditions, rpm: f64, dt: f64) -> f64 {
        core.running = false;
        core.cranking = false;
        self.fuel_flow = 0.0;
        let decel = self.idle_max_delay * 2.4;
        self.n1 = exp_seek(self.n1, 0.0, decel, decel, dt);
        self.itt = exp_seek(self.itt, fc.tat, 2.0, 2.0, dt);
        if rpm > 5.0 { -hp_to_w(WINDMILL_FRICTION_HP) } else { 0.0 }
    }

    fn spin_up(&mut self, core: &mut EngineCore, fc: &FlightConditions, dt: f64) -> f64 {
        core.running = false;
        core.cranking = true;
        self.fuel_flow = 0.0;
        self.n1 = exp_seek(
            self.n1,
            self.starter_n1,
            self.idle_max_delay * 6.0,
            self.idle_max_delay * 2.4,
            dt,
        );
        self.itt = exp_seek(self.itt, fc.tat, 2.0, 2.0, dt);
        0.0
    }

    fn start(
        &mut self,
        core: &mut EngineCore,
        fc: &FlightConditions,
        rpm: f64,
        idle: f64,
        dt: f64,
    ) -> f64 {
        core.running = true;
        core.cranking = true;
        self.starting_time += dt;
        self.n1 = exp_seek(self.n1, idle, self.idle_max_delay * 4.0, self.idle_max_delay * 2.4, dt);
        self.combustion_efficiency = self.combustion_n1.value(self.n1);
        let power = self.shaft_power(rpm, fc);
        self.fuel_flow = self.psfc * power.max(0.0) / self.combustion_efficiency.max(1.0e-3);
        self.itt = exp_seek(self.itt, self.itt_target(fc), self.itt_delay, self.itt_delay, dt);

        if self.n1 >= idle - 0.5 {
            self.phase = Phase::Run;
            core.cranking = false;
            tracing::info!(engine = %core.name, "turboprop reached idle");
        } else if self.starting_time > self.max_starting_time {
            tracing::warn!(engine = %core.name, "turboprop start timed out");
            self.phase = Phase::Off;
            core.running = false;
            core.cranking = false;
        }
        power
    }

    fn run(
        &mut self,
        core: &mut EngineCore,
        fc: &FlightConditions,
        rpm: f64,
        idle: f64,
        throttle: f64,
        dt: f64,
    ) -> f64 {
        core.running = true;
        core.cranking = false;
        let target = idle + throttle * (self.max_n1 - idle);
        self.n1 = exp_seek(self.n1, target, self.idle_max_delay, self.idle_max_delay * 2.4, dt);
        self.combustion_efficiency = self.combustion_n1.value(self.n1);
        let power = self.shaft_power(rpm, fc);
        self.fuel_flow = self.psfc * power.max(0.0) / self.combustion_efficiency.max(1.0e-3);
        self.itt = exp_seek(self.itt, self.itt_target(fc), self.itt_delay, self.itt_delay, dt);
        power
    }

    fn trim(&mut self, fc: &FlightConditions, rpm: f64, idle: f64, throttle: f64) -> f64 {
        self.n1 = idle + throttle * (self.max_n1 - idle);
        self.combustion_efficiency = self.combustion_n1.value(self.n1);
        let power = self.shaft_power(rpm, fc);
        self.fuel_flow = self.psfc * power.max(0.0) / self.combustion_efficiency.max(1.0e-3);
        self.itt = self.itt_target(fc);
        power
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
        let rpm = thruster.engine_rpm();
        let cutoff = cmd.cutoff || cmd.condition < 0.01;
        let idle = self.idle(cmd.condition);

        self.update_ielu(Self::shaft_torque(thruster), dt);
        let lever = self.shaft_throttle(core.throttle(cmd), cmd.thruster.reverse);
        let throttle = lever.min(self.ielu_throttle).clamp(0.0, 1.0);

        self.advance_phase(core, cutoff, cmd.starter, dt);
        self.power = match self.phase {
            Phase::Off | Phase::Stall | Phase::Seize => self.off(core, fc, rpm, dt),
            Phase::SpinUp => self.spin_up(core, fc, dt),
            Phase::Start => self.start(core, fc, rpm, idle, dt),
            Phase::Run => self.run(core, fc, rpm, idle, throttle, dt),
            Phase::Trim => self.trim(fc, rpm, idle, throttle),
        };

        core.fuel_flow_rate = self.fuel_flow;
        core.consume_fuel(tanks, self.fuel_flow * dt, None, fc.is_trim());
        if core.starved && matches!(self.phase, Phase::Run | Phase::Start) {
            tracing::warn!(engine = %core.name, "turboprop flamed out");
            self.phase = Phase::Off;
            core.running = false;
            core.cranking = false;
        }

        thruster.calculate(self.power, fc, &cmd.thruster)
    }

    pub fn init_running(&mut self, core: &mut EngineCore) {
        core.running = true;
        core.cranking = false;
        self.phase = Phase::Run;
        self.n1 = self.idle_n1;
        self.itt = self.itt_n1.value(self.n1) + KELVIN;
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Off;
        self.n1 = 0.0;
        self.power = 0.0;
        self.itt = KELVIN + 15.0;
        self.combustion_efficiency = 0.0;
        self.fuel_flow = 0.0;
        self.starting_time = 0.0;
        self.ielu_throttle = 1.0;
        self.ielu_intervening = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tank::TankKind;
    use ps_core::{EngineId, TankId};
    use ps_thrusters::Propeller;

    const PT6: &str = r#"
maxpower: 680 HP
psfc: 0.55
idlen1: 60
maxn1: 100
ielumaxtorque: 1500 N*M
betarangeend: 0.6
reversemaxpower: 40
"#;

    fn turboprop(doc: &str) -> Turboprop {
        let el = Element::from_yaml_str("engine", doc).unwrap();
        Turboprop::from_element(&el, &LoadContext::default()).unwrap()
    }

    fn prop_thruster() -> Thruster {
        let ct = Table1D::new(vec![(0.0, 0.1), (1.0, 0.0), (1.4, -0.05)]).unwrap();
        let cp = Table1D::new(vec![(0.0, 0.05), (1.0, 0.02), (1.4, 0.0)]).unwrap();
        let prop = Propeller::fixed_pitch(2.5, 8.0, ct, cp);
        Thruster::with_kind("prop", ThrusterKind::Propeller(prop))
    }

    fn fuel() -> Vec<Tank> {
        vec![Tank::new(TankKind::Fuel, 500.0, 500.0).unwrap()]
    }

    fn core() -> EngineCore {
        let mut core = EngineCore::new(EngineId::from_index(0), "PT6");
        core.add_feed_tank(TankId::from_index(0));
        core
    }

    #[test]
    fn beta_range_maps_reverse_lever() {
        let tp = turboprop(PT6);
        assert_eq!(tp.shaft_throttle(0.5, true), 0.0);
        assert!((tp.shaft_throttle(1.0, true) - 0.4).abs() < 1e-12);
        assert_eq!(tp.shaft_throttle(0.5, false), 0.5);
    }

    #[test]
    fn condition_lever_blends_idle() {
        let tp = turboprop("maxpower: 500 HP\nidlen1: 60\nidlen1high: 70\n");
        assert_eq!(tp.idle(0.0), 60.0);
        assert_eq!(tp.idle(1.0), 70.0);
        assert_eq!(tp.idle(0.5), 65.0);
    }

    #[test]
    fn windmilling_off_engine_absorbs_friction() {
        let mut tp = turboprop(PT6);
        let mut core = core();
        let mut thruster = prop_thruster();
        thruster.set_rpm(1000.0);
        let fc = FlightConditions::standard(1000.0, 60.0, 0.02);
        let cmd = EngineCommands {
            cutoff: true,
            ..Default::default()
        };
        tp.calculate(&mut core, &mut thruster, &fc, &cmd, &mut fuel());
        assert_eq!(tp.phase(), Phase::Off);
        assert!((tp.power() + hp_to_w(WINDMILL_FRICTION_HP)).abs() < 1e-9);
    }

    #[test]
    fn ielu_backs_off_and_restores() {
        let mut tp = turboprop(PT6);
        tp.update_ielu(2000.0, 1.0);
        assert!(tp.ielu_intervening());
        assert!((tp.ielu_throttle() - 0.9).abs() < 1e-12);
        tp.update_ielu(-2000.0, 2.0);
        assert!((tp.ielu_throttle() - 0.7).abs() < 1e-12);
        tp.update_ielu(100.0, 2.0);
        assert!(!tp.ielu_intervening());
        assert!((tp.ielu_throttle() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn no_generator_power_blocks_spin_up() {
        let mut tp = turboprop("maxpower: 500 HP\ngeneratorpower: 0\n");
        let mut core = core();
        let mut thruster = prop_thruster();
        let fc = FlightConditions::standard(0.0, 0.0, 0.02);
        let cmd = EngineCommands {
            starter: true,
            cutoff: true,
            ..Default::default()
        };
        tp.calculate(&mut core, &mut thruster, &fc, &cmd, &mut fuel());
        assert_eq!(tp.phase(), Phase::Off);
    }

    #[test]
    fn running_engine_turns_the_propeller() {
        let mut tp = turboprop("maxpower: 680 HP\npsfc: 0.55\n");
        let mut core = core();
        let mut thruster = prop_thruster();
        tp.init_running(&mut core);
        thruster.set_rpm(1200.0);
        let fc = FlightConditions::standard(0.0, 0.0, 0.02);
        let cmd = EngineCommands {
            throttle: 0.8,
            ..Default::default()
        };
        let mut tanks = fuel();
        for _ in 0..200 {
            tp.calculate(&mut core, &mut thruster, &fc, &cmd, &mut tanks);
        }
        assert!(core.running);
        assert!(tp.n1() > 90.0);
        assert!(tp.power() > 0.0 && tp.power() <= tp.max_power);
        assert!(thruster.thrust() > 0.0);
        assert!(tanks[0].contents() < 500.0);
    }
}
