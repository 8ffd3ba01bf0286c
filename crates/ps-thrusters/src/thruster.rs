//! The thruster wrapper owned by each engine.

use nalgebra::Vector3;
use ps_config::Element;
use ps_core::{FlightConditions, LoadContext};
use ps_forces::{Force, Frame, Placement};

use crate::direct::direct_thrust;
use crate::error::{ThrusterError, ThrusterResult};
use crate::nozzle::Nozzle;
use crate::propeller::Propeller;
use crate::rotor::Rotor;

/// Pilot and engine controls a thruster reacts to. Angles are radians
/// except propeller `pitch`, which is degrees like its table key.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThrusterCommands {
    /// Propeller governor lever, 0 = min RPM, 1 = max RPM.
    pub advance: f64,
    pub feather: bool,
    pub reverse: bool,
    /// Fraction of reverse pitch requested, 0..=1.
    pub reverse_coef: f64,
    /// Manual blade pitch for variable-pitch, non-governed propellers.
    pub pitch: Option<f64>,
    pub collective: f64,
    pub lateral_cyclic: f64,
    pub longitudinal_cyclic: f64,
    pub antitorque: f64,
    /// Rotor brake, 0..=1.
    pub rotor_brake: f64,
}

#[derive(Clone, Debug)]
pub enum ThrusterKind {
    Propeller(Propeller),
    Rotor(Rotor),
    Nozzle(Nozzle),
    Direct,
}

impl ThrusterKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ThrusterKind::Propeller(_) => "propeller",
            ThrusterKind::Rotor(_) => "rotor",
            ThrusterKind::Nozzle(_) => "nozzle",
            ThrusterKind::Direct => "direct",
        }
    }
}

/// Reads the optional `@frame` attribute; thrusters default to a custom
/// frame built from their orientation.
pub(crate) fn frame_from_element(el: &Element) -> ThrusterResult<Frame> {
    match el.attribute("frame") {
        Some(name) => Ok(Frame::from_name(name)?),
        None => Ok(Frame::Custom),
    }
}

#[derive(Clone, Debug)]
pub struct Thruster {
    pub name: String,
    pub force: Force,
    /// Engine RPM over thruster RPM.
    pub gear_ratio: f64,
    reverser_angle: f64,
    thrust: f64,
    pub kind: ThrusterKind,
}

impl Thruster {
    /// Builds a thruster from a `thruster` element, dispatching on `@type`.
    pub fn from_element(el: &Element, ctx: &LoadContext) -> ThrusterResult<Self> {
        let type_name = el
            .attribute("type")
            .ok_or_else(|| ps_config::ConfigError::MissingAttribute {
                element: el.name().to_string(),
                attribute: "type".to_string(),
            })?
            .to_ascii_lowercase();

        let kind = match type_name.as_str() {
            "propeller" => ThrusterKind::Propeller(Propeller::from_element(el, ctx)?),
            "rotor" => ThrusterKind::Rotor(Rotor::from_element(el, ctx)?),
            "nozzle" => ThrusterKind::Nozzle(Nozzle::from_element(el)?),
            "direct" => ThrusterKind::Direct,
            _ => {
                return Err(ps_config::ConfigError::UnknownType {
                    kind: "thruster",
                    name: type_name,
                }
                .into());
            }
        };

        let gear_ratio = el.number_or("gearratio", "", 1.0)?;
        if gear_ratio <= 0.0 {
            return Err(ThrusterError::InvalidArg {
                what: "thruster gear ratio must be positive",
            });
        }

        let mut force = Force::new(frame_from_element(el)?);
        force.set_placement(&Placement::from_element(el)?);

        let name = el
            .attribute("name")
            .map(str::to_string)
            .unwrap_or_else(|| kind.type_name().to_string());

        if ctx.verbose() {
            tracing::debug!(
                name = %name,
                kind = kind.type_name(),
                gear_ratio,
                location = ?force.location(),
                orientation = ?force.orientation(),
                "thruster loaded"
            );
        }

        Ok(Self {
            name,
            force,
            gear_ratio,
            reverser_angle: el.number_or("reverserangle", "RAD", 0.0)?,
            thrust: 0.0,
            kind,
        })
    }

    /// A direct thruster with default placement.
    pub fn direct(name: impl Into<String>) -> Self {
        Self::with_kind(name, ThrusterKind::Direct)
    }

    pub fn with_kind(name: impl Into<String>, kind: ThrusterKind) -> Self {
        Self {
            name: name.into(),
            force: Force::new(Frame::Custom),
            gear_ratio: 1.0,
            reverser_angle: 0.0,
            thrust: 0.0,
            kind,
        }
    }

    /// One tick. `input` is shaft power (W) for propellers and rotors,
    /// vacuum thrust (N) for nozzles and thrust (N) for direct thrusters.
    pub fn calculate(
        &mut self,
        input: f64,
        fc: &FlightConditions,
        cmd: &ThrusterCommands,
    ) -> f64 {
        let thrust = match &mut self.kind {
            ThrusterKind::Propeller(p) => p.calculate(input, &mut self.force, fc, cmd),
            ThrusterKind::Rotor(r) => r.calculate(input, &mut self.force, fc, cmd),
            ThrusterKind::Nozzle(n) => {
                let t = n.thrust(input, fc.pressure, self.reverser_angle);
                self.force.native_force = Vector3::new(t, 0.0, 0.0);
                self.force.native_moment = Vector3::zeros();
                t
            }
            ThrusterKind::Direct => {
                let t = direct_thrust(input, self.reverser_angle);
                self.force.native_force = Vector3::new(t, 0.0, 0.0);
                self.force.native_moment = Vector3::zeros();
                t
            }
        };
        self.thrust = thrust;
        thrust
    }

    /// Resolves this tick's force into body axes, tail rotor included.
    pub fn body_forces(&mut self, fc: &FlightConditions) -> Vector3<f64> {
        let mut total = self.force.body_forces(fc);
        if let ThrusterKind::Rotor(Rotor { tail: Some(tail), .. }) = &mut self.kind {
            total += tail.force.body_forces(fc);
        }
        total
    }

    /// Body moment from the last `body_forces` call.
    pub fn moments(&self) -> Vector3<f64> {
        let mut total = self.force.moments();
        if let ThrusterKind::Rotor(Rotor { tail: Some(tail), .. }) = &self.kind {
            total += tail.force.moments();
        }
        total
    }

    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    pub fn rpm(&self) -> f64 {
        match &self.kind {
            ThrusterKind::Propeller(p) => p.rpm(),
            ThrusterKind::Rotor(r) => r.rpm(),
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => 0.0,
        }
    }

    pub fn set_rpm(&mut self, rpm: f64) {
        match &mut self.kind {
            ThrusterKind::Propeller(p) => p.set_rpm(rpm),
            ThrusterKind::Rotor(r) => r.set_rpm(rpm),
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => {}
        }
    }

    /// RPM seen by the engine on the other side of the gearbox.
    pub fn engine_rpm(&self) -> f64 {
        self.rpm() * self.gear_ratio
    }

    /// Power the thruster absorbed last tick (W).
    pub fn power_required(&self) -> f64 {
        match &self.kind {
            ThrusterKind::Propeller(p) => p.power_required(),
            ThrusterKind::Rotor(r) => r.power_required(),
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => 0.0,
        }
    }

    pub fn reverser_angle(&self) -> f64 {
        self.reverser_angle
    }

    pub fn set_reverser_angle(&mut self, angle: f64) {
        self.reverser_angle = angle;
    }

    pub fn set_placement(&mut self, placement: &Placement) {
        self.force.set_placement(placement);
    }

    /// Names answered by [`Thruster::telemetry`] for this thruster kind.
    pub fn telemetry_names(&self) -> &'static [&'static str] {
        match &self.kind {
            ThrusterKind::Propeller(_) => &[
                "advance-ratio",
                "thrust-coefficient",
                "blade-angle-deg",
                "induced-velocity-mps",
                "helical-tip-mach",
                "torque-nm",
                "feathered",
                "reversed",
            ],
            ThrusterKind::Rotor(r) if r.tail.is_some() => &[
                "inflow-ratio",
                "induced-inflow-ratio",
                "advance-ratio",
                "thrust-coefficient",
                "coning-angle-rad",
                "longitudinal-flapping-rad",
                "lateral-flapping-rad",
                "h-force-n",
                "side-force-n",
                "downwash-pitch-rad",
                "downwash-roll-rad",
                "shaft-torque-nm",
                "ground-effect-factor",
                "tail-rpm",
                "tail-thrust-n",
            ],
            ThrusterKind::Rotor(_) => &[
                "inflow-ratio",
                "induced-inflow-ratio",
                "advance-ratio",
                "thrust-coefficient",
                "coning-angle-rad",
                "longitudinal-flapping-rad",
                "lateral-flapping-rad",
                "h-force-n",
                "side-force-n",
                "downwash-pitch-rad",
                "downwash-roll-rad",
                "shaft-torque-nm",
                "ground-effect-factor",
            ],
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => &[],
        }
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        let flag = |b: bool| f64::from(u8::from(b));
        match &self.kind {
            ThrusterKind::Propeller(p) => Some(match name {
                "advance-ratio" => p.advance_ratio(),
                "thrust-coefficient" => p.thrust_coeff(),
                "blade-angle-deg" => p.pitch(),
                "induced-velocity-mps" => p.induced_velocity(),
                "helical-tip-mach" => p.helical_tip_mach(),
                "torque-nm" => p.torque(),
                "feathered" => flag(p.is_feathered()),
                "reversed" => flag(p.is_reversed()),
                _ => return None,
            }),
            ThrusterKind::Rotor(r) => {
                let disc = &r.main;
                Some(match name {
                    "inflow-ratio" => disc.inflow_ratio(),
                    "induced-inflow-ratio" => disc.inflow(),
                    "advance-ratio" => disc.advance_ratio(),
                    "thrust-coefficient" => disc.thrust_coefficient(),
                    "coning-angle-rad" => disc.coning(),
                    "longitudinal-flapping-rad" => disc.flapping().0,
                    "lateral-flapping-rad" => disc.flapping().1,
                    "h-force-n" => disc.h_drag(),
                    "side-force-n" => disc.side_force(),
                    "downwash-pitch-rad" => disc.downwash().0,
                    "downwash-roll-rad" => disc.downwash().1,
                    "shaft-torque-nm" => r.shaft_torque(),
                    "ground-effect-factor" => r.ground_effect_factor(),
                    "tail-rpm" => r.tail_rpm()?,
                    "tail-thrust-n" => r.tail.as_ref()?.disc.thrust(),
                    _ => return None,
                })
            }
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => None,
        }
    }

    pub fn propeller(&self) -> Option<&Propeller> {
        match &self.kind {
            ThrusterKind::Propeller(p) => Some(p),
            _ => None,
        }
    }

    pub fn rotor(&self) -> Option<&Rotor> {
        match &self.kind {
            ThrusterKind::Rotor(r) => Some(r),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.thrust = 0.0;
        self.force.native_force = Vector3::zeros();
        self.force.native_moment = Vector3::zeros();
        match &mut self.kind {
            ThrusterKind::Propeller(p) => p.reset(),
            ThrusterKind::Rotor(r) => r.reset(),
            ThrusterKind::Nozzle(_) | ThrusterKind::Direct => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_thruster_points_along_x() {
        let mut t = Thruster::direct("jet");
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        let thrust = t.calculate(2000.0, &fc, &ThrusterCommands::default());
        assert_eq!(thrust, 2000.0);
        let f = t.body_forces(&fc);
        assert!((f.x - 2000.0).abs() < 1e-9);
        assert_eq!(t.rpm(), 0.0);
    }

    #[test]
    fn nozzle_uses_ambient_pressure() {
        let mut t = Thruster::with_kind("n", ThrusterKind::Nozzle(Nozzle { exit_area: 0.1 }));
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        let thrust = t.calculate(50_000.0, &fc, &ThrusterCommands::default());
        assert!((thrust - (50_000.0 - 0.1 * fc.pressure)).abs() < 1e-6);
    }

    #[test]
    fn reverser_flips_direct_thrust() {
        let mut t = Thruster::direct("jet");
        t.set_reverser_angle(std::f64::consts::PI);
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        assert!(t.calculate(100.0, &fc, &ThrusterCommands::default()) < 0.0);
    }

    #[test]
    fn unknown_type_rejected() {
        let el = Element::from_yaml_str("thruster", "\"@type\": ducted_fan\n").unwrap();
        let err = Thruster::from_element(&el, &LoadContext::default()).unwrap_err();
        assert!(matches!(
            err,
            ThrusterError::Config(ps_config::ConfigError::UnknownType { .. })
        ));
    }

    #[test]
    fn unknown_frame_rejected() {
        let doc = "\"@type\": direct\n\"@frame\": sideways\n";
        let el = Element::from_yaml_str("thruster", doc).unwrap();
        let err = Thruster::from_element(&el, &LoadContext::default()).unwrap_err();
        assert!(matches!(err, ThrusterError::Force(_)));
    }

    #[test]
    fn propeller_answers_every_telemetry_name() {
        let ct = ps_core::Table1D::new(vec![(0.0, 0.07), (1.0, 0.0)]).unwrap();
        let cp = ps_core::Table1D::new(vec![(0.0, 0.05), (1.0, 0.01)]).unwrap();
        let prop = Propeller::fixed_pitch(1.9, 2.0, ct, cp);
        let t = Thruster::with_kind("prop", ThrusterKind::Propeller(prop));
        assert!(!t.telemetry_names().is_empty());
        for name in t.telemetry_names() {
            assert!(t.telemetry(name).is_some(), "{name}");
        }
        assert_eq!(t.telemetry("tail-rpm"), None);
        assert!(Thruster::direct("d").telemetry_names().is_empty());
    }
}
