//! ps-sim: the propulsion manager, its property tree and an offline runner.
//!
//! Contains:
//! - propulsion (engines + tanks, per-tick aggregation, dump/refuel)
//! - properties (path bindings over a propulsion system)
//! - simulation (propulsion + bound registry)
//! - scenario (serde scenario documents)
//! - sim (fixed-step runner with decimated recording)

pub mod error;
pub mod properties;
pub mod propulsion;
pub mod scenario;
pub mod sim;
pub mod simulation;

pub use error::{SimError, SimResult};
pub use propulsion::{Propulsion, PropulsionConfig, PropulsionOutput};
pub use scenario::{ActionDef, ConditionsDef, EventDef, Scenario};
pub use sim::{SimOptions, SimRecord, run};
pub use simulation::Simulation;
