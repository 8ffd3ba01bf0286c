//! Force generator placement and body-axis resolution.

use nalgebra::{Matrix3, Vector3};
use ps_config::Element;
use ps_core::FlightConditions;

use crate::error::ForceResult;
use crate::frame::{Frame, custom_transform};

/// Structural location relative to the CG, in body axes.
pub fn structural_to_body(r: &Vector3<f64>, cg: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-(r.x - cg.x), r.y - cg.y, -(r.z - cg.z))
}

/// Location (m, structural) and orientation (rad) read from configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Placement {
    pub location: Vector3<f64>,
    pub orientation: Vector3<f64>,
}

impl Placement {
    /// Reads optional `location` and `orientation` children.
    pub fn from_element(el: &Element) -> ForceResult<Self> {
        let location = match el.find_element("location") {
            Some(loc) => loc.triplet_convert_to("M")?,
            None => Vector3::zeros(),
        };
        let orientation = match el.find_element("orientation") {
            Some(o) => o.triplet_convert_to("RAD")?,
            None => Vector3::zeros(),
        };
        Ok(Self {
            location,
            orientation,
        })
    }
}

/// A native force and moment, a frame, and where it acts.
#[derive(Clone, Debug)]
pub struct Force {
    frame: Frame,
    location: Vector3<f64>,
    acting_location: Vector3<f64>,
    orientation: Vector3<f64>,
    custom: Matrix3<f64>,

    /// Force in the native frame (N).
    pub native_force: Vector3<f64>,
    /// Moment already in body axes (N·m), added before the lever-arm term.
    pub native_moment: Vector3<f64>,

    body_force: Vector3<f64>,
    moment: Vector3<f64>,
}

impl Default for Force {
    fn default() -> Self {
        Self::new(Frame::None)
    }
}

impl Force {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            location: Vector3::zeros(),
            acting_location: Vector3::zeros(),
            orientation: Vector3::zeros(),
            custom: Matrix3::identity(),
            native_force: Vector3::zeros(),
            native_moment: Vector3::zeros(),
            body_force: Vector3::zeros(),
            moment: Vector3::zeros(),
        }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
        if frame != Frame::Custom {
            self.custom = Matrix3::identity();
        } else {
            self.custom = custom_transform(&self.orientation);
        }
    }

    /// Sets the nominal location and moves the acting location with it.
    pub fn set_location(&mut self, location: Vector3<f64>) {
        self.location = location;
        self.acting_location = location;
    }

    pub fn set_acting_location(&mut self, location: Vector3<f64>) {
        self.acting_location = location;
    }

    pub fn location(&self) -> Vector3<f64> {
        self.location
    }

    pub fn acting_location(&self) -> Vector3<f64> {
        self.acting_location
    }

    /// Mounting angles (roll, pitch, yaw) in radians.
    pub fn set_orientation(&mut self, orientation: Vector3<f64>) {
        if orientation != self.orientation {
            self.orientation = orientation;
            if self.frame == Frame::Custom {
                self.custom = custom_transform(&orientation);
            }
        }
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }

    pub fn set_placement(&mut self, placement: &Placement) {
        self.set_location(placement.location);
        self.set_orientation(placement.orientation);
    }

    /// Body ← native matrix for this tick.
    pub fn transform(&self, fc: &FlightConditions) -> Matrix3<f64> {
        match self.frame {
            Frame::None | Frame::Custom => self.custom,
            Frame::WindBody => fc.tw2b,
            Frame::LocalBody => fc.tl2b,
        }
    }

    /// Resolve the native force into body axes and update the moment
    /// about the CG.
    pub fn body_forces(&mut self, fc: &FlightConditions) -> Vector3<f64> {
        self.body_force = self.transform(fc) * self.native_force;
        let arm = structural_to_body(&self.acting_location, &fc.cg);
        self.moment = self.native_moment + arm.cross(&self.body_force);
        self.body_force
    }

    pub fn body_force(&self) -> Vector3<f64> {
        self.body_force
    }

    /// Moment from the last [`body_forces`](Self::body_forces) call.
    pub fn moments(&self) -> Vector3<f64> {
        self.moment
    }
}
