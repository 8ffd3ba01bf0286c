//! Offline scenario documents: a propulsion tree, fixed flight conditions and
//! timed property writes.
//!
//! ```yaml
//! name: single piston run-up
//! conditions: { altitude_m: 0.0, airspeed_mps: 0.0 }
//! options: { dt: 0.01, t_end: 30.0 }
//! events:
//!   - time_s: 0.0
//!     action: { type: SetProperty, path: propulsion/engine[0]/starter-cmd, value: 1 }
//! record: [propulsion/engine[0]/thrust-n]
//! propulsion:
//!   tank: [...]
//!   engine: [...]
//! ```

use ps_config::Element;
use ps_core::{FlightConditions, LoadContext};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::sim::{self, SimOptions, SimRecord};
use crate::simulation::Simulation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: ConditionsDef,
    #[serde(default)]
    pub options: SimOptions,
    /// Start every engine already running.
    #[serde(default)]
    pub init_running: bool,
    #[serde(default)]
    pub events: Vec<EventDef>,
    /// Property paths sampled into the record.
    #[serde(default)]
    pub record: Vec<String>,
    /// The `propulsion` element tree, in the configuration document format.
    pub propulsion: serde_yaml::Value,
}

/// Standard atmosphere at a fixed altitude and true airspeed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConditionsDef {
    #[serde(default)]
    pub altitude_m: f64,
    #[serde(default)]
    pub airspeed_mps: f64,
}

impl ConditionsDef {
    pub fn flight_conditions(&self, dt: f64) -> FlightConditions {
        FlightConditions::standard(self.altitude_m, self.airspeed_mps, dt)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDef {
    pub time_s: f64,
    pub action: ActionDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ActionDef {
    SetProperty {
        path: String,
        value: f64,
    },
    /// Start one engine (or all, when `engine` is absent) as if already running.
    InitRunning {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        engine: Option<usize>,
    },
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Builds the simulation, running engines up first if requested.
    pub fn build(&self, ctx: &LoadContext) -> SimResult<Simulation> {
        let el = Element::from_yaml_value("propulsion", &self.propulsion)?;
        let mut sim = Simulation::from_element(&el, ctx)?;
        if self.init_running {
            sim.propulsion.init_running(None)?;
        }
        Ok(sim)
    }

    pub fn run(&self, ctx: &LoadContext) -> SimResult<SimRecord> {
        let mut sim = self.build(ctx)?;
        self.run_on(&mut sim)
    }

    /// Runs against an already built simulation.
    pub fn run_on(&self, simulation: &mut Simulation) -> SimResult<SimRecord> {
        let fc = self.conditions.flight_conditions(self.options.dt);
        tracing::info!(scenario = %self.name, t_end = self.options.t_end, "running scenario");
        sim::run(simulation, &fc, &self.events, &self.record, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_are_tagged() {
        let ev: EventDef = serde_yaml::from_str(
            "time_s: 1.5\naction: { type: SetProperty, path: propulsion/refuel, value: 1 }\n",
        )
        .unwrap();
        assert_eq!(ev.time_s, 1.5);
        assert_eq!(
            ev.action,
            ActionDef::SetProperty {
                path: "propulsion/refuel".into(),
                value: 1.0
            }
        );

        let ev: EventDef =
            serde_yaml::from_str("time_s: 0\naction: { type: InitRunning }\n").unwrap();
        assert_eq!(ev.action, ActionDef::InitRunning { engine: None });
    }

    #[test]
    fn missing_propulsion_is_an_error() {
        assert!(Scenario::from_yaml_str("name: empty\n").is_err());
    }

    #[test]
    fn defaults_fill_in() {
        let s = Scenario::from_yaml_str("propulsion: {}\n").unwrap();
        assert!(s.events.is_empty());
        assert_eq!(s.options, SimOptions::default());
        assert_eq!(s.conditions, ConditionsDef::default());
    }

    #[test]
    fn scenario_round_trips_through_json() {
        let s = Scenario::from_yaml_str(
            "name: x\nrecord: [propulsion/total-fuel-kg]\npropulsion: {}\n",
        )
        .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
