//! ps-core: stable foundation for the propulsion workspace.
//!
//! Contains:
//! - units (horsepower/RPM helpers + English-unit factors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for engines and tanks)
//! - seek (rate-limited and exponential approach of a state toward a target)
//! - table (1-D / 2-D lookup tables)
//! - filter (first-order lag)
//! - atmosphere (standard pressure vs altitude)
//! - conditions (per-tick data supplied by the host executive)
//! - property (path keyed get/set registry)
//! - log (explicit debug level handed to constructors)
//! - error (shared error types)

pub mod atmosphere;
pub mod conditions;
pub mod error;
pub mod filter;
pub mod ids;
pub mod log;
pub mod numeric;
pub mod property;
pub mod seek;
pub mod table;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use conditions::FlightConditions;
pub use error::{CoreError, CoreResult};
pub use filter::LagFilter;
pub use ids::*;
pub use log::{DebugLevel, LoadContext};
pub use numeric::*;
pub use property::PropertyManager;
pub use seek::{exp_seek, seek};
pub use table::{Table1D, Table2D};
pub use units::*;
