//! The propulsion manager: owns every engine and tank and runs them once per
//! tick in engine order, summing their body forces and moments.

use nalgebra::Vector3;
use ps_config::Element;
use ps_core::{EngineId, FlightConditions, LoadContext, TankId};
use ps_engines::{Engine, EngineCommands, Tank, TankKind};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Rates for the fuel system, in kg/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PropulsionConfig {
    #[serde(default)]
    pub dump_rate_kgps: f64,
    #[serde(default = "default_refuel_rate")]
    pub refuel_rate_kgps: f64,
}

/// 6000 lb/min.
fn default_refuel_rate() -> f64 {
    45.359_237
}

impl Default for PropulsionConfig {
    fn default() -> Self {
        Self {
            dump_rate_kgps: 0.0,
            refuel_rate_kgps: default_refuel_rate(),
        }
    }
}

/// Aggregate result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PropulsionOutput {
    /// Total body-axis force (N).
    pub force: Vector3<f64>,
    /// Total body-axis moment about the CG (N·m).
    pub moment: Vector3<f64>,
    /// Sum of engine fuel flows (kg/s).
    pub total_fuel_flow: f64,
    pub total_oxidizer_flow: f64,
    pub engines_running: usize,
    /// Fuel dumped overboard this tick (kg).
    pub fuel_dumped: f64,
}

impl Default for PropulsionOutput {
    fn default() -> Self {
        Self {
            force: Vector3::zeros(),
            moment: Vector3::zeros(),
            total_fuel_flow: 0.0,
            total_oxidizer_flow: 0.0,
            engines_running: 0,
            fuel_dumped: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Propulsion {
    pub config: PropulsionConfig,
    engines: Vec<Engine>,
    commands: Vec<EngineCommands>,
    tanks: Vec<Tank>,
    fuel_freeze: bool,
    dumping: bool,
    refueling: bool,
    output: PropulsionOutput,
}

impl Propulsion {
    pub fn new(config: PropulsionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Loads a `propulsion` element: `tank` children first, then `engine`
    /// children whose `feed` entries index into those tanks.
    pub fn from_element(el: &Element, ctx: &LoadContext) -> SimResult<Self> {
        let config = PropulsionConfig {
            dump_rate_kgps: el.number_or("dumprate", "KG/S", 0.0)?,
            refuel_rate_kgps: el.number_or("refuelrate", "KG/S", default_refuel_rate())?,
        };
        let mut propulsion = Self::new(config);

        for tank_el in el.cursor("tank") {
            let tank = Tank::from_element(tank_el)?;
            propulsion.add_tank(tank);
        }
        for (index, engine_el) in el.cursor("engine").enumerate() {
            let id = EngineId::from_index(index as u32);
            let engine = Engine::from_element(engine_el, id, ctx)?;
            propulsion.add_engine(engine)?;
        }

        tracing::info!(
            engines = propulsion.engines.len(),
            tanks = propulsion.tanks.len(),
            fuel_kg = propulsion.total_fuel(),
            "propulsion system loaded"
        );
        Ok(propulsion)
    }

    pub fn add_tank(&mut self, mut tank: Tank) -> TankId {
        let id = TankId::from_index(self.tanks.len() as u32);
        if tank.name.is_empty() {
            tank.name = format!("tank{id}");
        }
        self.tanks.push(tank);
        id
    }

    /// Appends an engine; it is renumbered to its slot. Every feed tank must
    /// already exist.
    pub fn add_engine(&mut self, mut engine: Engine) -> SimResult<EngineId> {
        if let Some(missing) = engine
            .core
            .feed_tanks()
            .iter()
            .find(|t| t.slot() >= self.tanks.len())
        {
            return Err(SimError::UnknownTank {
                engine: engine.core.name.clone(),
                tank: missing.slot(),
            });
        }
        let id = EngineId::from_index(self.engines.len() as u32);
        engine.core.id = id;
        engine.core.fuel_freeze = self.fuel_freeze;
        self.engines.push(engine);
        self.commands.push(EngineCommands::default());
        Ok(id)
    }

    /// Removes an engine; later engines move down one slot.
    pub fn remove_engine(&mut self, index: usize) -> SimResult<Engine> {
        if index >= self.engines.len() {
            return Err(SimError::UnknownEngine { index });
        }
        let engine = self.engines.remove(index);
        self.commands.remove(index);
        for (slot, e) in self.engines.iter_mut().enumerate().skip(index) {
            e.core.id = EngineId::from_index(slot as u32);
        }
        tracing::info!(engine = %engine.core.name, index, "engine removed");
        Ok(engine)
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn engine(&self, index: usize) -> Option<&Engine> {
        self.engines.get(index)
    }

    pub fn engine_mut(&mut self, index: usize) -> Option<&mut Engine> {
        self.engines.get_mut(index)
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn tank(&self, index: usize) -> Option<&Tank> {
        self.tanks.get(index)
    }

    pub fn tank_mut(&mut self, index: usize) -> Option<&mut Tank> {
        self.tanks.get_mut(index)
    }

    pub fn commands(&self, index: usize) -> Option<&EngineCommands> {
        self.commands.get(index)
    }

    pub fn commands_mut(&mut self, index: usize) -> Option<&mut EngineCommands> {
        self.commands.get_mut(index)
    }

    /// Applies `f` to the commands of every engine.
    pub fn command_all(&mut self, f: impl Fn(&mut EngineCommands)) {
        self.commands.iter_mut().for_each(f);
    }

    pub fn output(&self) -> &PropulsionOutput {
        &self.output
    }

    pub fn fuel_freeze(&self) -> bool {
        self.fuel_freeze
    }

    pub fn set_fuel_freeze(&mut self, freeze: bool) {
        self.fuel_freeze = freeze;
        for e in &mut self.engines {
            e.core.fuel_freeze = freeze;
        }
    }

    pub fn is_dumping(&self) -> bool {
        self.dumping
    }

    pub fn set_dumping(&mut self, dumping: bool) {
        if dumping != self.dumping {
            tracing::info!(dumping, rate = self.config.dump_rate_kgps, "fuel dump");
        }
        self.dumping = dumping;
    }

    pub fn is_refueling(&self) -> bool {
        self.refueling
    }

    pub fn set_refueling(&mut self, refueling: bool) {
        self.refueling = refueling;
    }

    pub fn total_fuel(&self) -> f64 {
        self.total_contents(TankKind::Fuel)
    }

    pub fn total_oxidizer(&self) -> f64 {
        self.total_contents(TankKind::Oxidizer)
    }

    fn total_contents(&self, kind: TankKind) -> f64 {
        self.tanks
            .iter()
            .filter(|t| t.kind == kind)
            .map(Tank::contents)
            .sum()
    }

    /// One tick: tanks, then every engine in index order, then dump and
    /// refuel.
    pub fn calculate(&mut self, fc: &FlightConditions) -> &PropulsionOutput {
        let dt = fc.dt;
        if dt > 0.0 {
            for tank in &mut self.tanks {
                tank.calculate(dt, fc.tat);
            }
        }

        let mut out = PropulsionOutput::default();
        for (engine, cmd) in self.engines.iter_mut().zip(&self.commands) {
            engine.calculate(fc, cmd, &mut self.tanks);
            out.force += engine.body_forces(fc);
            out.moment += engine.moments();
            out.total_fuel_flow += engine.core.fuel_flow_rate;
            out.total_oxidizer_flow += engine.core.oxidizer_flow_rate;
            if engine.core.running {
                out.engines_running += 1;
            }
        }

        if dt > 0.0 && !self.fuel_freeze {
            if self.dumping {
                out.fuel_dumped = self.dump_fuel(dt);
            }
            if self.refueling {
                self.refuel(dt);
            }
        }

        self.output = out;
        &self.output
    }

    fn dump_fuel(&mut self, dt: f64) -> f64 {
        let above: Vec<usize> = self
            .tanks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TankKind::Fuel && t.contents() > t.standpipe)
            .map(|(i, _)| i)
            .collect();
        if above.is_empty() {
            if self.dumping {
                tracing::info!("fuel dump reached standpipes");
            }
            self.dumping = false;
            return 0.0;
        }
        let share = self.config.dump_rate_kgps * dt / above.len() as f64;
        above.iter().map(|&i| self.tanks[i].dump(share)).sum()
    }

    fn refuel(&mut self, dt: f64) {
        let open: Vec<usize> = self
            .tanks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TankKind::Fuel && t.contents() < t.capacity)
            .map(|(i, _)| i)
            .collect();
        if open.is_empty() {
            return;
        }
        let share = self.config.refuel_rate_kgps * dt / open.len() as f64;
        for i in open {
            self.tanks[i].fill(share);
        }
    }

    /// Starts one engine, or all of them, as if already running.
    pub fn init_running(&mut self, index: Option<usize>) -> SimResult<()> {
        match index {
            Some(i) => self
                .engines
                .get_mut(i)
                .ok_or(SimError::UnknownEngine { index: i })?
                .init_running(),
            None => self.engines.iter_mut().for_each(Engine::init_running),
        }
        Ok(())
    }

    pub fn reset_to_ic(&mut self) {
        for e in &mut self.engines {
            e.reset_to_ic();
        }
        for t in &mut self.tanks {
            t.reset();
        }
        self.commands.fill(EngineCommands::default());
        self.dumping = false;
        self.refueling = false;
        self.output = PropulsionOutput::default();
    }
}
