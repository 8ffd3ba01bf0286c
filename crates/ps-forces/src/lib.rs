//! ps-forces: native-frame force and moment to body axes.
//!
//! Structural coordinates: x aft, y right, z up.
//! Body coordinates: x forward, y right, z down, origin at the CG.

pub mod error;
pub mod force;
pub mod frame;

pub use error::{ForceError, ForceResult};
pub use force::{Force, Placement, structural_to_body};
pub use frame::{Frame, custom_transform};
