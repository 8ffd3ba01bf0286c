//! ps-thrusters: devices that turn engine output into force.
//!
//! Every thruster takes one scalar per tick from its engine (shaft power in
//! W for propellers and rotors, vacuum thrust in N for nozzles, thrust in N
//! for direct thrusters) and produces a native-frame force and moment that
//! `ps-forces` resolves into body axes.

pub mod direct;
pub mod error;
pub mod nozzle;
pub mod propeller;
pub mod rotor;
pub mod thruster;

pub use error::{ThrusterError, ThrusterResult};
pub use nozzle::Nozzle;
pub use propeller::Propeller;
pub use rotor::{Rotor, RotorDisc};
pub use thruster::{Thruster, ThrusterCommands, ThrusterKind};
