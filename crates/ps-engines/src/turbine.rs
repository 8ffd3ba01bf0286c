//! Two-spool turbine (turbojet/turbofan) with optional afterburner and water
//! injection.
//!
//! Spool speeds N1/N2 are percentages of rated. Thrust blends between idle
//! and military thrust on the square of normalised N2; augmented thrust
//! replaces or tops up that value. The operating phase follows
//! [`Phase`](crate::engine::Phase) with externally signalled stall and
//! seizure.

use ps_config::{Element, Table};
use ps_core::constants::{G0_MPS2, LB_TO_KG, LBF_TO_N, PSI_TO_PA};
use ps_core::{FlightConditions, LoadContext, Table2D, seek};
use ps_thrusters::Thruster;

use crate::engine::{EngineCommands, EngineCore, Phase};
use crate::error::{EngineError, EngineResult};
use crate::tank::Tank;

const PSF_TO_PA: f64 = 47.880_26;
/// lb/hr per second expressed in kg/s per second.
const PPH: f64 = LB_TO_KG / 3600.0;
/// Minimum N2 for light-off.
const LIGHT_OFF_N2: f64 = 15.0;

fn lookup(el: &Element, name: &'static str, default: f64) -> EngineResult<Table2D> {
    Ok(el
        .table_named(name)?
        .map_or_else(|| Table2D::constant(default), Table::into_2d))
}

#[derive(Clone, Debug)]
pub struct Turbine {
    /// Sea-level static military thrust (N).
    pub mil_thrust: f64,
    /// Sea-level static augmented thrust (N).
    pub max_thrust: f64,
    pub bypass_ratio: f64,
    /// Thrust specific fuel consumption (kg/s per N).
    pub tsfc: f64,
    pub atsfc: f64,
    pub idle_n1: f64,
    pub idle_n2: f64,
    pub max_n1: f64,
    pub max_n2: f64,
    /// 0 none, 1 automatic at full throttle and N2 > 97 %, 2 throttle above 1.
    pub aug_method: u8,
    pub augmented: bool,
    pub injected: bool,
    pub injection_time: f64,
    pub injection_n1_inc: f64,
    pub injection_n2_inc: f64,
    pub disable_windmill: bool,
    pub n1_spinup: f64,
    pub n2_spinup: f64,
    pub n1_start_rate: f64,
    pub n2_start_rate: f64,
    /// Spool acceleration (%/s); deceleration is three times faster.
    pub spool_rate: f64,
    /// Idle fuel flow (kg/s).
    pub idle_ff: f64,
    /// Fraction of thrust lost to bleed air.
    pub bleed_demand: f64,
    idle_lookup: Table2D,
    mil_lookup: Table2D,
    max_lookup: Table2D,
    injection_lookup: Table2D,

    phase: Phase,
    n1: f64,
    n2: f64,
    n2_norm: f64,
    thrust: f64,
    egt: f64,
    epr: f64,
    oil_pressure: f64,
    oil_temp: f64,
    nozzle_position: f64,
    augmentation: bool,
    augment_cmd: f64,
    injection_timer: f64,
    injection_water: f64,
    stalled: bool,
    seized: bool,
    fuel_flow: f64,
}

impl Turbine {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> EngineResult<Self> {
        let mil_thrust = el.find_element_value_as_number_convert_to("milthrust", "N")?;
        if mil_thrust <= 0.0 {
            return Err(EngineError::InvalidArg {
                what: "turbine military thrust must be positive",
            });
        }
        let bypass_ratio = el.number_or("bypassratio", "", 0.0)?;
        let idle_n1 = el.number_or("idlen1", "", 30.0)?;
        let idle_n2 = el.number_or("idlen2", "", 60.0)?;
        let max_n1 = el.number_or("maxn1", "", 100.0)?;
        let max_n2 = el.number_or("maxn2", "", 100.0)?;
        if max_n1 <= idle_n1 || max_n2 <= idle_n2 {
            return Err(EngineError::InvalidArg {
                what: "turbine max spool speeds must exceed idle",
            });
        }
        let mil_lbf = mil_thrust / LBF_TO_N;

        let turbine = Self {
            mil_thrust,
            max_thrust: el.number_or("maxthrust", "N", mil_thrust)?,
            bypass_ratio,
            tsfc: el.number_or("tsfc", "", 0.8)? / (3600.0 * G0_MPS2),
            atsfc: el.number_or("atsfc", "", 1.7)? / (3600.0 * G0_MPS2),
            idle_n1,
            idle_n2,
            max_n1,
            max_n2,
            aug_method: el.number_or("augmethod", "", 0.0)?.clamp(0.0, 2.0) as u8,
            augmented: el.flag_or("augmented", false)?,
            injected: el.flag_or("injected", false)?,
            injection_time: el.number_or("injection-time", "SEC", 30.0)?,
            injection_n1_inc: el.number_or("injection-n1-inc", "", 0.0)?,
            injection_n2_inc: el.number_or("injection-n2-inc", "", 0.0)?,
            disable_windmill: el.flag_or("disable-windmill", false)?,
            n1_spinup: el.number_or("n1spinup", "", 1.0)?,
            n2_spinup: el.number_or("n2spinup", "", 3.0)?,
            n1_start_rate: el.number_or("n1startrate", "", 1.4)?,
            n2_start_rate: el.number_or("n2startrate", "", 2.0)?,
            spool_rate: 90.0 / (bypass_ratio + 3.0),
            idle_ff: mil_lbf.powf(0.2) * 107.0 * PPH,
            bleed_demand: 0.0,
            idle_lookup: lookup(el, "IdleThrust", 0.03)?,
            mil_lookup: lookup(el, "MilThrust", 1.0)?,
            max_lookup: lookup(el, "AugThrust", 1.0)?,
            injection_lookup: lookup(el, "Injection", 1.0)?,
            phase: Phase::Off,
            n1: 0.0,
            n2: 0.0,
            n2_norm: 0.0,
            thrust: 0.0,
            egt: 288.15,
            epr: 1.0,
            oil_pressure: 0.0,
            oil_temp: 288.15,
            nozzle_position: 1.0,
            augmentation: false,
            augment_cmd: 0.0,
            injection_timer: 0.0,
            injection_water: 1.0,
            stalled: false,
            seized: false,
            fuel_flow: 0.0,
        };

        if ctx.verbose() {
            tracing::debug!(
                mil_thrust,
                max_thrust = turbine.max_thrust,
                bypass_ratio,
                idle_n1,
                idle_n2,
                aug_method = turbine.aug_method,
                idle_ff = turbine.idle_ff,
                "turbine engine loaded"
            );
        }
        Ok(turbine)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn n1(&self) -> f64 {
        self.n1
    }

    pub fn n2(&self) -> f64 {
        self.n2
    }

    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    /// Exhaust gas temperature (K).
    pub fn egt(&self) -> f64 {
        self.egt
    }

    pub fn epr(&self) -> f64 {
        self.epr
    }

    pub fn nozzle_position(&self) -> f64 {
        self.nozzle_position
    }

    pub fn augmentation(&self) -> bool {
        self.augmentation
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn is_seized(&self) -> bool {
        self.seized
    }

    /// Compressor stall signal from outside the engine model.
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Mechanical seizure. Irreversible until reset.
    pub fn set_seized(&mut self, seized: bool) {
        self.seized = self.seized || seized;
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        Some(match name {
            "n1" => self.n1,
            "n2" => self.n2,
            "phase" => self.phase.code(),
            "core-thrust-n" => self.thrust,
            "egt-k" => self.egt,
            "epr" => self.epr,
            "oil-pressure-pa" => self.oil_pressure,
            "oil-temp-k" => self.oil_temp,
            "nozzle-pos-norm" => self.nozzle_position,
            "augmentation" => f64::from(u8::from(self.augmentation)),
            "injection-water-norm" => self.injection_water,
            "stalled" => f64::from(u8::from(self.stalled)),
            "seized" => f64::from(u8::from(self.seized)),
            _ => return None,
        })
    }

    pub const TELEMETRY: &'static [&'static str] = &[
        "n1",
        "n2",
        "phase",
        "core-thrust-n",
        "egt-k",
        "epr",
        "oil-pressure-pa",
        "oil-temp-k",
        "nozzle-pos-norm",
        "augmentation",
        "injection-water-norm",
        "stalled",
        "seized",
    ];

    fn spool_down(&self) -> f64 {
        self.spool_rate * 3.0
    }

    fn thrust_decay_rate(&self) -> f64 {
        self.mil_thrust * self.spool_down() / (self.max_n2 - self.idle_n2)
    }

    fn advance_phase(&mut self, core: &mut EngineCore, cmd: &EngineCommands, throttle: f64, dt: f64) {
        let before = self.phase;

        if self.phase == Phase::Trim && dt > 0.0 {
            if core.running && !core.starved {
                self.phase = Phase::Run;
                self.n2 = self.idle_n2 + throttle * (self.max_n2 - self.idle_n2);
                self.n1 = self.idle_n1 + throttle * (self.max_n1 - self.idle_n1);
                self.oil_temp = 366.0;
                core.cranking = false;
            } else {
                self.phase = Phase::Off;
                core.cranking = false;
            }
        }

        if !core.running && cmd.starter && cmd.cutoff && self.phase == Phase::Off {
            self.phase = Phase::SpinUp;
        }
        if !core.running
            && !cmd.cutoff
            && self.n2 > LIGHT_OFF_N2
            && matches!(self.phase, Phase::Off | Phase::SpinUp)
        {
            self.phase = Phase::Start;
        }
        if cmd.cutoff && self.phase != Phase::SpinUp {
            self.phase = Phase::Off;
        }
        if dt == 0.0 {
            self.phase = Phase::Trim;
        }
        if core.starved {
            self.phase = Phase::Off;
        }
        if self.stalled && self.phase == Phase::Run {
            self.phase = Phase::Stall;
        }
        if self.seized {
            self.phase = Phase::Seize;
        }

        if self.phase != before {
            tracing::info!(engine = %core.name, from = %before, to = %self.phase, "turbine phase");
        }
    }

    fn idle_and_mil(&self, fc: &FlightConditions) -> (f64, f64) {
        let idle = self.mil_thrust * self.idle_lookup.value(fc.mach, fc.altitude);
        let mil = (self.mil_thrust - idle) * self.mil_lookup.value(fc.mach, fc.altitude);
        (idle, mil)
    }

    fn off(&mut self, core: &mut EngineCore, fc: &FlightConditions, dt: f64) -> f64 {
        core.running = false;
        let qbar_psf = if self.disable_windmill { 0.0 } else { fc.qbar / PSF_TO_PA };
        self.fuel_flow = seek(self.fuel_flow, 0.0, 1000.0 * PPH, 10_000.0 * PPH, dt);
        self.n1 = seek(self.n1, qbar_psf / 10.0, self.n1 / 2.0, self.n1 / 2.0, dt);
        self.n2 = seek(self.n2, qbar_psf / 15.0, self.n2 / 2.0, self.n2 / 2.0, dt);
        self.egt = seek(self.egt, fc.tat, 11.7, 7.3, dt);
        self.oil_temp = seek(self.oil_temp, fc.tat, 0.2, 0.2, dt);
        self.oil_pressure = self.n2 * 0.62 * PSI_TO_PA;
        self.nozzle_position = seek(self.nozzle_position, 1.0, 0.8, 0.8, dt);
        self.epr = seek(self.epr, 1.0, 0.2, 0.2, dt);
        self.augmentation = false;
        seek(self.thrust, 0.0, 0.0, self.thrust_decay_rate(), dt)
    }

    fn spin_up(&mut self, core: &mut EngineCore, fc: &FlightConditions, dt: f64) -> f64 {
        core.running = false;
        self.fuel_flow = 0.0;
        self.n2 = seek(self.n2, 25.18, self.n2_spinup, self.n2 / 2.0, dt);
        self.n1 = seek(self.n1, 5.21, self.n1_spinup, self.n1 / 2.0, dt);
        self.egt = seek(self.egt, fc.tat, 11.7, 7.3, dt);
        self.oil_pressure = self.n2 * 0.62 * PSI_TO_PA;
        self.oil_temp = seek(self.oil_temp, fc.tat, 0.2, 0.2, dt);
        self.epr = 1.0;
        self.nozzle_position = 1.0;
        0.0
    }

    fn start(&mut self, core: &mut EngineCore, fc: &FlightConditions, dt: f64) -> f64 {
        if self.n2 > LIGHT_OFF_N2 && !core.starved {
            core.running = true;
            core.cranking = true;
            self.n2 = seek(self.n2, self.idle_n2, self.n2_start_rate, self.n2 / 2.0, dt);
            self.n1 = seek(self.n1, self.idle_n1, self.n1_start_rate, self.n1 / 2.0, dt);
            self.egt = seek(self.egt, fc.tat + 363.1, 21.3, 7.3, dt);
            self.fuel_flow = self.idle_ff * self.n2 / self.idle_n2;
            self.oil_pressure = self.n2 * 0.62 * PSI_TO_PA;
            if self.n2 >= self.idle_n2 - 0.1 {
                self.phase = Phase::Run;
                core.cranking = false;
                tracing::info!(engine = %core.name, "turbine reached idle");
            }
        } else {
            self.phase = Phase::Off;
            core.cranking = false;
            core.running = false;
        }
        0.0
    }

    fn run(
        &mut self,
        core: &mut EngineCore,
        fc: &FlightConditions,
        cmd: &EngineCommands,
        throttle: f64,
        dt: f64,
    ) -> f64 {
        let (idle, mil) = self.idle_and_mil(fc);
        core.running = true;

        let injecting = self.injected && cmd.injection && self.injection_water > 0.0;
        let mut n1_factor = self.max_n1 - self.idle_n1;
        let mut n2_factor = self.max_n2 - self.idle_n2;
        if injecting {
            n1_factor += self.injection_n1_inc;
            n2_factor += self.injection_n2_inc;
        }
        let down = self.spool_down();
        self.n2 = seek(self.n2, self.idle_n2 + throttle * n2_factor, self.spool_rate, down, dt);
        self.n1 = seek(self.n1, self.idle_n1 + throttle * n1_factor, self.spool_rate, down, dt);
        self.n2_norm = (self.n2 - self.idle_n2) / n2_factor;
        let mut thrust = idle + mil * self.n2_norm * self.n2_norm;

        self.egt = fc.tat + 363.1 + throttle * 357.1;
        self.oil_pressure = self.n2 * 0.62 * PSI_TO_PA;
        self.oil_temp = seek(self.oil_temp, 366.0, 1.2, 0.1, dt);

        if !self.augmentation {
            self.fuel_flow = seek(self.fuel_flow, thrust * self.tsfc, 1000.0 * PPH, 10_000.0 * PPH, dt)
                .max(self.idle_ff);
            self.nozzle_position = seek(self.nozzle_position, 1.0 - self.n2_norm, 0.8, 0.8, dt);
            thrust *= 1.0 - self.bleed_demand;
            self.epr = 1.0 + thrust / self.mil_thrust;
        }

        if self.aug_method == 1 {
            self.augmentation = throttle > 0.99 && self.n2 > 97.0;
        } else if self.aug_method == 0 {
            self.augmentation = cmd.augmentation;
        }

        let max = self.max_thrust * self.max_lookup.value(fc.mach, fc.altitude);
        if self.augmented && self.augmentation && self.aug_method < 2 {
            thrust = max;
            self.fuel_flow = seek(self.fuel_flow, thrust * self.atsfc, 5000.0 * PPH, 10_000.0 * PPH, dt);
            self.nozzle_position = seek(self.nozzle_position, 1.0, 0.8, 0.8, dt);
        }

        if self.aug_method == 2 {
            if self.augment_cmd > 0.0 {
                self.augmentation = true;
                thrust += (max - thrust) * self.augment_cmd;
                self.fuel_flow =
                    seek(self.fuel_flow, thrust * self.atsfc, 5000.0 * PPH, 10_000.0 * PPH, dt);
                self.nozzle_position = seek(self.nozzle_position, 1.0, 0.8, 0.8, dt);
            } else {
                self.augmentation = false;
            }
        }

        if injecting {
            self.injection_timer += dt;
            if self.injection_timer < self.injection_time {
                thrust *= self.injection_lookup.value(fc.mach, fc.altitude);
                self.injection_water = 1.0 - self.injection_timer / self.injection_time;
            } else {
                self.injection_water = 0.0;
            }
        }

        thrust.max(0.0)
    }

    fn stall(&mut self, fc: &FlightConditions, throttle: f64, dt: f64) -> f64 {
        let qbar_psf = fc.qbar / PSF_TO_PA;
        self.egt = fc.tat + 903.14;
        self.fuel_flow = self.idle_ff;
        self.n1 = seek(self.n1, qbar_psf / 10.0, 0.0, self.n1 / 10.0, dt);
        self.n2 = seek(self.n2, qbar_psf / 15.0, 0.0, self.n2 / 10.0, dt);
        if throttle < 0.01 {
            self.phase = Phase::Run;
            self.stalled = false;
        }
        seek(self.thrust, 0.0, 0.0, self.thrust_decay_rate(), dt)
    }

    fn seize(&mut self, core: &mut EngineCore, fc: &FlightConditions, dt: f64) -> f64 {
        let qbar_psf = fc.qbar / PSF_TO_PA;
        self.n2 = 0.0;
        self.n1 = seek(self.n1, qbar_psf / 20.0, 0.0, self.n1 / 15.0, dt);
        self.fuel_flow = self.idle_ff;
        self.oil_pressure = 0.0;
        self.oil_temp = seek(self.oil_temp, fc.tat, 0.2, 0.2, dt);
        core.running = false;
        seek(self.thrust, 0.0, 0.0, self.thrust_decay_rate(), dt)
    }

    fn trim(&mut self, fc: &FlightConditions, cmd: &EngineCommands, throttle: f64) -> f64 {
        let (idle, mil) = self.idle_and_mil(fc);
        let n2_factor = self.max_n2 - self.idle_n2;
        self.n2 = self.idle_n2 + throttle * n2_factor;
        self.n1 = self.idle_n1 + throttle * (self.max_n1 - self.idle_n1);
        self.n2_norm = (self.n2 - self.idle_n2) / n2_factor;
        let mut thrust = (idle + mil * self.n2_norm * self.n2_norm) * (1.0 - self.bleed_demand);

        if self.aug_method == 1 {
            self.augmentation = throttle > 0.99 && self.n2 > 97.0;
        }
        let max = self.max_thrust * self.max_lookup.value(fc.mach, fc.altitude);
        if self.augmented && self.augmentation && self.aug_method < 2 {
            thrust = max;
        }
        if self.aug_method == 2 && self.augment_cmd > 0.0 {
            thrust += (max - thrust) * self.augment_cmd;
        }
        if self.injected && cmd.injection {
            thrust *= self.injection_lookup.value(fc.mach, fc.altitude);
        }
        self.fuel_flow = thrust * self.tsfc;
        thrust
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
        let mut throttle = core.throttle(cmd);
        if self.aug_method == 2 {
            if throttle > 1.0 {
                self.augment_cmd = throttle - 1.0;
                throttle = 1.0;
            } else {
                self.augment_cmd = 0.0;
            }
        } else {
            throttle = throttle.min(1.0);
        }

        self.advance_phase(core, cmd, throttle, dt);

        self.thrust = match self.phase {
            Phase::Off => self.off(core, fc, dt),
            Phase::SpinUp => self.spin_up(core, fc, dt),
            Phase::Start => self.start(core, fc, dt),
            Phase::Run => self.run(core, fc, cmd, throttle, dt),
            Phase::Stall => self.stall(fc, throttle, dt),
            Phase::Seize => self.seize(core, fc, dt),
            Phase::Trim => self.trim(fc, cmd, throttle),
        };

        core.fuel_flow_rate = self.fuel_flow;
        core.consume_fuel(tanks, self.fuel_flow * dt, None, fc.is_trim());
        if core.starved && matches!(self.phase, Phase::Run | Phase::Start | Phase::Stall) {
            tracing::warn!(engine = %core.name, "turbine flamed out");
            self.phase = Phase::Off;
            core.running = false;
            core.cranking = false;
        }

        thruster.calculate(self.thrust, fc, &cmd.thruster)
    }

    pub fn init_running(&mut self, core: &mut EngineCore) {
        core.running = true;
        core.cranking = false;
        self.phase = Phase::Run;
        self.n1 = self.idle_n1;
        self.n2 = self.idle_n2;
        self.oil_temp = 366.0;
        self.egt = 288.15 + 363.1;
        self.fuel_flow = self.idle_ff;
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Off;
        self.n1 = 0.0;
        self.n2 = 0.0;
        self.n2_norm = 0.0;
        self.thrust = 0.0;
        self.egt = 288.15;
        self.epr = 1.0;
        self.oil_pressure = 0.0;
        self.oil_temp = 288.15;
        self.nozzle_position = 1.0;
        self.augmentation = false;
        self.augment_cmd = 0.0;
        self.injection_timer = 0.0;
        self.injection_water = 1.0;
        self.stalled = false;
        self.seized = false;
        self.fuel_flow = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tank::TankKind;
    use ps_core::{EngineId, TankId};

    const J85: &str = r#"
milthrust: 2850 LBS
maxthrust: 3850 LBS
bypassratio: 0.0
tsfc: 1.03
atsfc: 2.4
idlen1: 30
idlen2: 60
augmented: 1
augmethod: 1
"#;

    struct Rig {
        turbine: Turbine,
        core: EngineCore,
        thruster: Thruster,
        tanks: Vec<Tank>,
    }

    fn rig() -> Rig {
        let el = Element::from_yaml_str("engine", J85).unwrap();
        let mut core = EngineCore::new(EngineId::from_index(0), "J85");
        core.add_feed_tank(TankId::from_index(0));
        Rig {
            turbine: Turbine::from_element(&el, &LoadContext::default()).unwrap(),
            core,
            thruster: Thruster::direct("nozzle"),
            tanks: vec![Tank::new(TankKind::Fuel, 1000.0, 1000.0).unwrap()],
        }
    }

    impl Rig {
        fn tick(&mut self, fc: &FlightConditions, cmd: &EngineCommands) -> f64 {
            self.turbine.calculate(&mut self.core, &mut self.thruster, fc, cmd, &mut self.tanks)
        }
    }

    #[test]
    fn ground_start_sequence() {
        let mut r = rig();
        let fc = FlightConditions::standard(0.0, 0.0, 0.05);
        let mut cmd = EngineCommands {
            starter: true,
            cutoff: true,
            ..Default::default()
        };
        r.tick(&fc, &cmd);
        assert_eq!(r.turbine.phase(), Phase::SpinUp);
        for _ in 0..200 {
            r.tick(&fc, &cmd);
        }
        assert!(r.turbine.n2() > LIGHT_OFF_N2);

        cmd.cutoff = false;
        r.tick(&fc, &cmd);
        assert_eq!(r.turbine.phase(), Phase::Start);
        for _ in 0..1000 {
            r.tick(&fc, &cmd);
        }
        assert_eq!(r.turbine.phase(), Phase::Run);
        assert!(r.core.running);
        assert!(r.core.fuel_flow_rate >= r.turbine.idle_ff);
    }

    #[test]
    fn full_throttle_reaches_military_thrust_and_augments() {
        let mut r = rig();
        r.turbine.init_running(&mut r.core);
        let fc = FlightConditions::standard(0.0, 0.0, 0.05);
        let cmd = EngineCommands {
            throttle: 1.0,
            ..Default::default()
        };
        for _ in 0..400 {
            r.tick(&fc, &cmd);
        }
        assert!(r.turbine.augmentation());
        let max = 3850.0 * LBF_TO_N;
        assert!((r.turbine.thrust() - max).abs() < 5.0);
    }

    #[test]
    fn stall_clears_with_throttle_at_idle() {
        let mut r = rig();
        r.turbine.init_running(&mut r.core);
        let fc = FlightConditions::standard(0.0, 0.0, 0.05);
        let mut cmd = EngineCommands {
            throttle: 0.8,
            ..Default::default()
        };
        r.tick(&fc, &cmd);
        r.turbine.set_stalled(true);
        r.tick(&fc, &cmd);
        assert_eq!(r.turbine.phase(), Phase::Stall);
        cmd.throttle = 0.0;
        r.tick(&fc, &cmd);
        assert!(!r.turbine.is_stalled());
        r.tick(&fc, &cmd);
        assert_eq!(r.turbine.phase(), Phase::Run);
    }

    #[test]
    fn seizure_is_permanent() {
        let mut r = rig();
        r.turbine.init_running(&mut r.core);
        let fc = FlightConditions::standard(0.0, 0.0, 0.05);
        r.turbine.set_seized(true);
        r.turbine.set_seized(false);
        r.tick(&fc, &EngineCommands::default());
        assert_eq!(r.turbine.phase(), Phase::Seize);
        assert_eq!(r.turbine.n2(), 0.0);
        assert!(!r.core.running);
    }

    #[test]
    fn trim_tick_uses_throttle_directly() {
        let mut r = rig();
        r.turbine.init_running(&mut r.core);
        let fc = FlightConditions::standard(0.0, 0.0, 0.0);
        let cmd = EngineCommands {
            throttle: 0.5,
            ..Default::default()
        };
        r.tick(&fc, &cmd);
        assert_eq!(r.turbine.phase(), Phase::Trim);
        assert_eq!(r.turbine.n2(), 80.0);
        // No fuel drawn while trimming.
        assert_eq!(r.tanks[0].contents(), 1000.0);
    }
}
