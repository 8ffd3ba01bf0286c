//! ps-engines: engine models, fuel tanks and the fuel draw policy.
//!
//! Every engine owns exactly one [`Thruster`](ps_thrusters::Thruster) and
//! borrows the vehicle's tanks for the duration of a tick.

pub mod electric;
pub mod engine;
pub mod error;
pub mod model;
pub mod piston;
pub mod rocket;
pub mod tank;
pub mod turbine;
pub mod turboprop;

pub use electric::{Bldc, Electric, Motor};
pub use engine::{EngineCommands, EngineCore, Phase};
pub use error::{EngineError, EngineResult};
pub use model::{COMMON_TELEMETRY, Engine, EngineKind};
pub use piston::{BoostStage, Piston};
pub use rocket::{Propellant, Rocket};
pub use tank::{Tank, TankKind};
pub use turbine::Turbine;
pub use turboprop::Turboprop;
