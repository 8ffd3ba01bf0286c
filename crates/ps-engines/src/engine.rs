//! State and fuel policy shared by every engine variant.

use std::fmt;

use ps_config::Element;
use ps_core::{EngineId, TankId};
use ps_thrusters::ThrusterCommands;

use crate::error::EngineResult;
use crate::tank::{Tank, TankKind};

/// Operating phase of the turbine-family state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Off,
    SpinUp,
    Start,
    Run,
    Stall,
    Seize,
    Trim,
}

impl Phase {
    /// Stable numeric code for telemetry.
    pub fn code(self) -> f64 {
        match self {
            Phase::Off => 0.0,
            Phase::Run => 1.0,
            Phase::SpinUp => 2.0,
            Phase::Start => 3.0,
            Phase::Stall => 4.0,
            Phase::Seize => 5.0,
            Phase::Trim => 6.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Off => "off",
            Phase::SpinUp => "spin-up",
            Phase::Start => "start",
            Phase::Run => "run",
            Phase::Stall => "stall",
            Phase::Seize => "seize",
            Phase::Trim => "trim",
        };
        f.write_str(s)
    }
}

/// Per-engine controls for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineCommands {
    pub throttle: f64,
    pub mixture: f64,
    pub starter: bool,
    pub cutoff: bool,
    /// 0 off, 1 left, 2 right, 3 both.
    pub magnetos: u8,
    /// Afterburner request for engines with an explicit augmentation switch.
    pub augmentation: bool,
    /// Water injection request.
    pub injection: bool,
    /// Turboprop condition lever, 0 = fuel cut off.
    pub condition: f64,
    pub thruster: ThrusterCommands,
}

impl Default for EngineCommands {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            mixture: 1.0,
            starter: false,
            cutoff: false,
            magnetos: 0,
            augmentation: false,
            injection: false,
            condition: 1.0,
            thruster: ThrusterCommands::default(),
        }
    }
}

/// Bookkeeping common to all variants.
#[derive(Clone, Debug)]
pub struct EngineCore {
    pub id: EngineId,
    pub name: String,
    pub min_throttle: f64,
    pub max_throttle: f64,
    feed_tanks: Vec<TankId>,

    pub running: bool,
    pub cranking: bool,
    pub starved: bool,
    /// While set, fuel is computed but never drawn from tanks.
    pub fuel_freeze: bool,

    /// Fuel mass flow (kg/s).
    pub fuel_flow_rate: f64,
    /// Oxidizer mass flow (kg/s).
    pub oxidizer_flow_rate: f64,
    /// Fuel drawn last tick (kg).
    pub fuel_expended: f64,
    pub oxidizer_expended: f64,
    /// Fuel drawn since load or reset (kg).
    pub fuel_used: f64,
    /// Fuel density for volumetric readouts (kg/m³).
    pub fuel_density: f64,
}

impl EngineCore {
    pub fn new(id: EngineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            min_throttle: 0.0,
            max_throttle: 1.0,
            feed_tanks: Vec::new(),
            running: false,
            cranking: false,
            starved: false,
            fuel_freeze: false,
            fuel_flow_rate: 0.0,
            oxidizer_flow_rate: 0.0,
            fuel_expended: 0.0,
            oxidizer_expended: 0.0,
            fuel_used: 0.0,
            fuel_density: 800.0,
        }
    }

    /// Reads the name, throttle range, fuel density and `feed` list.
    pub fn from_element(el: &Element, id: EngineId) -> EngineResult<Self> {
        let mut core = Self::new(id, el.attribute("name").unwrap_or("engine"));
        core.min_throttle = el.number_or("minthrottle", "", 0.0)?;
        core.max_throttle = el.number_or("maxthrottle", "", 1.0)?;
        core.fuel_density = el.number_or("fueldensity", "KG/M3", core.fuel_density)?;
        for feed in el.cursor("feed") {
            let index = feed.value_as_number()?;
            if index >= 0.0 {
                core.add_feed_tank(TankId::from_index(index as u32));
            }
        }
        Ok(core)
    }

    pub fn throttle(&self, cmd: &EngineCommands) -> f64 {
        cmd.throttle.clamp(self.min_throttle, self.max_throttle)
    }

    /// Register a feed tank; duplicates are ignored.
    pub fn add_feed_tank(&mut self, tank: TankId) {
        if !self.feed_tanks.contains(&tank) {
            self.feed_tanks.push(tank);
        }
    }

    pub fn remove_feed_tank(&mut self, tank: TankId) {
        self.feed_tanks.retain(|t| *t != tank);
    }

    pub fn feed_tanks(&self) -> &[TankId] {
        &self.feed_tanks
    }

    /// Fuel flow in US gallons per hour.
    pub fn fuel_flow_gph(&self) -> f64 {
        if self.fuel_density > 0.0 {
            self.fuel_flow_rate / self.fuel_density / ps_core::constants::GAL_TO_M3 * 3600.0
        } else {
            0.0
        }
    }

    fn live_sources(&self, tanks: &[Tank], kind: TankKind) -> usize {
        self.feed_tanks
            .iter()
            .filter_map(|id| tanks.get(id.slot()))
            .filter(|t| t.kind == kind && t.is_selected() && t.contents() > 0.0)
            .count()
    }

    fn drain_sources(&self, tanks: &mut [Tank], kind: TankKind, need: f64) -> f64 {
        let count = self.live_sources(tanks, kind);
        if count == 0 {
            return 0.0;
        }
        let share = need / count as f64;
        let mut shortage = 0.0;
        for id in &self.feed_tanks {
            let Some(tank) = tanks.get_mut(id.slot()) else {
                continue;
            };
            if tank.kind == kind && tank.is_selected() && tank.contents() > 0.0 {
                shortage += tank.drain(share);
            }
        }
        shortage
    }

    /// Draw `fuel_need` (and `oxidizer_need`, for engines that burn one)
    /// from the selected feed tanks, split evenly among those with
    /// contents. No source at all marks the engine starved without touching
    /// any tank; a shortfall from any tank marks it starved too.
    pub fn consume_fuel(
        &mut self,
        tanks: &mut [Tank],
        fuel_need: f64,
        oxidizer_need: Option<f64>,
        trim: bool,
    ) {
        self.fuel_expended = fuel_need.max(0.0);
        self.oxidizer_expended = oxidizer_need.unwrap_or(0.0).max(0.0);
        if self.fuel_freeze || trim {
            return;
        }

        let was_starved = self.starved;
        let fuel_sources = self.live_sources(tanks, TankKind::Fuel);
        let oxidizer_missing =
            oxidizer_need.is_some() && self.live_sources(tanks, TankKind::Oxidizer) == 0;

        if fuel_sources == 0 || oxidizer_missing {
            self.starved = true;
        } else {
            let fuel_short = self.drain_sources(tanks, TankKind::Fuel, self.fuel_expended);
            let ox_short = match oxidizer_need {
                Some(_) => self.drain_sources(tanks, TankKind::Oxidizer, self.oxidizer_expended),
                None => 0.0,
            };
            self.starved = fuel_short < 0.0 || ox_short < 0.0;
            self.fuel_used += self.fuel_expended + fuel_short;
        }

        if self.starved && !was_starved {
            tracing::warn!(engine = %self.name, id = %self.id, "engine starved of fuel");
        } else if !self.starved && was_starved {
            tracing::info!(engine = %self.name, id = %self.id, "fuel supply restored");
        }
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.cranking = false;
        self.starved = false;
        self.fuel_flow_rate = 0.0;
        self.oxidizer_flow_rate = 0.0;
        self.fuel_expended = 0.0;
        self.oxidizer_expended = 0.0;
        self.fuel_used = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tanks(contents: &[f64]) -> Vec<Tank> {
        contents
            .iter()
            .map(|c| Tank::new(TankKind::Fuel, 100.0, *c).unwrap())
            .collect()
    }

    fn core_feeding(n: u32) -> EngineCore {
        let mut core = EngineCore::new(EngineId::from_index(0), "test");
        for i in 0..n {
            core.add_feed_tank(TankId::from_index(i));
        }
        core
    }

    #[test]
    fn feed_tanks_are_deduplicated() {
        let mut core = core_feeding(2);
        core.add_feed_tank(TankId::from_index(1));
        assert_eq!(core.feed_tanks().len(), 2);
        core.remove_feed_tank(TankId::from_index(0));
        assert_eq!(core.feed_tanks(), &[TankId::from_index(1)]);
    }

    #[test]
    fn split_drain_skips_empty_tank() {
        let mut t = tanks(&[50.0, 0.0]);
        let mut core = core_feeding(2);
        core.consume_fuel(&mut t, 40.0, None, false);
        assert_eq!(t[0].contents(), 10.0);
        assert_eq!(t[1].contents(), 0.0);
        assert!(!core.starved);
    }

    #[test]
    fn split_drain_reports_shortfall() {
        let mut t = tanks(&[30.0, 0.0]);
        let mut core = core_feeding(2);
        core.consume_fuel(&mut t, 40.0, None, false);
        assert_eq!(t[0].contents(), 0.0);
        assert!(core.starved);
        assert!((core.fuel_used - 30.0).abs() < 1e-12);
    }

    #[test]
    fn even_split_between_live_tanks() {
        let mut t = tanks(&[50.0, 50.0]);
        let mut core = core_feeding(2);
        core.consume_fuel(&mut t, 20.0, None, false);
        assert_eq!(t[0].contents(), 40.0);
        assert_eq!(t[1].contents(), 40.0);
    }

    #[test]
    fn no_fuel_starves_without_draining() {
        let mut t = tanks(&[0.0, 0.0]);
        let mut core = core_feeding(2);
        core.consume_fuel(&mut t, 5.0, None, false);
        assert!(core.starved);
        assert!(t.iter().all(|t| t.contents() == 0.0));
    }

    #[test]
    fn freeze_and_trim_leave_tanks_alone() {
        let mut t = tanks(&[50.0]);
        let mut core = core_feeding(1);
        core.consume_fuel(&mut t, 10.0, None, true);
        core.fuel_freeze = true;
        core.consume_fuel(&mut t, 10.0, None, false);
        assert_eq!(t[0].contents(), 50.0);
    }

    #[test]
    fn missing_oxidizer_starves() {
        let mut t = tanks(&[50.0]);
        let mut core = core_feeding(1);
        core.consume_fuel(&mut t, 1.0, Some(2.0), false);
        assert!(core.starved);
        assert_eq!(t[0].contents(), 50.0);
    }

    #[test]
    fn oxidizer_drains_from_oxidizer_tanks() {
        let mut t = tanks(&[50.0]);
        t.push(Tank::new(TankKind::Oxidizer, 100.0, 80.0).unwrap());
        let mut core = core_feeding(2);
        core.consume_fuel(&mut t, 1.0, Some(2.0), false);
        assert!(!core.starved);
        assert_eq!(t[0].contents(), 49.0);
        assert_eq!(t[1].contents(), 78.0);
    }

    #[test]
    fn starvation_recovers_after_refuel() {
        let mut t = tanks(&[0.0]);
        let mut core = core_feeding(1);
        core.consume_fuel(&mut t, 1.0, None, false);
        assert!(core.starved);
        t[0].fill(10.0);
        core.consume_fuel(&mut t, 1.0, None, false);
        assert!(!core.starved);
    }
}
