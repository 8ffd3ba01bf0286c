//! The engine as the propulsion manager sees it: shared bookkeeping, the
//! variant model and the thruster it drives.

use nalgebra::Vector3;
use ps_config::{ConfigError, Element};
use ps_core::{EngineId, FlightConditions, LoadContext, TankId};
use ps_forces::Placement;
use ps_thrusters::Thruster;

use crate::electric::Electric;
use crate::engine::{EngineCommands, EngineCore, Phase};
use crate::error::{EngineError, EngineResult};
use crate::piston::Piston;
use crate::rocket::Rocket;
use crate::tank::Tank;
use crate::turbine::Turbine;
use crate::turboprop::Turboprop;

#[derive(Clone, Debug)]
pub enum EngineKind {
    Piston(Box<Piston>),
    Turbine(Box<Turbine>),
    Turboprop(Box<Turboprop>),
    Rocket(Rocket),
    Electric(Electric),
}

impl EngineKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EngineKind::Piston(_) => "piston",
            EngineKind::Turbine(_) => "turbine",
            EngineKind::Turboprop(_) => "turboprop",
            EngineKind::Rocket(_) => "rocket",
            EngineKind::Electric(_) => "electric",
        }
    }

    fn telemetry_names(&self) -> &'static [&'static str] {
        match self {
            EngineKind::Piston(_) => Piston::TELEMETRY,
            EngineKind::Turbine(_) => Turbine::TELEMETRY,
            EngineKind::Turboprop(_) => Turboprop::TELEMETRY,
            EngineKind::Rocket(_) => Rocket::TELEMETRY,
            EngineKind::Electric(_) => Electric::TELEMETRY,
        }
    }
}

/// Readouts every engine provides regardless of variant.
pub const COMMON_TELEMETRY: &[&str] = &[
    "thrust-n",
    "running",
    "starved",
    "cranking",
    "fuel-flow-kgps",
    "fuel-flow-gph",
    "oxidizer-flow-kgps",
    "fuel-used-kg",
    "thruster-rpm",
    "power-required-w",
];

#[derive(Clone, Debug)]
pub struct Engine {
    pub core: EngineCore,
    pub thruster: Thruster,
    pub kind: EngineKind,
}

impl Engine {
    /// Builds an engine from an `engine` element with a `@type` attribute
    /// and an embedded `thruster` child.
    pub fn from_element(el: &Element, id: EngineId, ctx: &LoadContext) -> EngineResult<Self> {
        let type_name = el
            .attribute("type")
            .ok_or_else(|| ConfigError::MissingAttribute {
                element: el.name().to_string(),
                attribute: "type".to_string(),
            })?
            .to_ascii_lowercase();

        let core = EngineCore::from_element(el, id)?;
        let kind = match type_name.as_str() {
            "piston" => EngineKind::Piston(Box::new(Piston::from_element(el, ctx)?)),
            "turbine" => EngineKind::Turbine(Box::new(Turbine::from_element(el, ctx)?)),
            "turboprop" => EngineKind::Turboprop(Box::new(Turboprop::from_element(el, ctx)?)),
            "rocket" => EngineKind::Rocket(Rocket::from_element(el, ctx)?),
            "electric" => EngineKind::Electric(Electric::from_element(el, ctx)?),
            _ => {
                return Err(ConfigError::UnknownType {
                    kind: "engine",
                    name: type_name,
                }
                .into());
            }
        };

        let thruster_el = el
            .find_element("thruster")
            .ok_or_else(|| EngineError::MissingThruster {
                engine: core.name.clone(),
            })?;
        let thruster = Thruster::from_element(thruster_el, ctx)?;

        tracing::info!(
            engine = %core.name,
            id = %id,
            kind = kind.type_name(),
            thruster = thruster.kind.type_name(),
            feeds = core.feed_tanks().len(),
            "engine loaded"
        );

        Ok(Self {
            core,
            thruster,
            kind,
        })
    }

    pub fn new(core: EngineCore, kind: EngineKind, thruster: Thruster) -> Self {
        Self {
            core,
            thruster,
            kind,
        }
    }

    pub fn id(&self) -> EngineId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// One tick: run the variant model, draw fuel, drive the thruster.
    /// Returns thrust (N).
    pub fn calculate(
        &mut self,
        fc: &FlightConditions,
        cmd: &EngineCommands,
        tanks: &mut [Tank],
    ) -> f64 {
        let core = &mut self.core;
        let thruster = &mut self.thruster;
        match &mut self.kind {
            EngineKind::Piston(p) => p.calculate(core, thruster, fc, cmd, tanks),
            EngineKind::Turbine(t) => t.calculate(core, thruster, fc, cmd, tanks),
            EngineKind::Turboprop(t) => t.calculate(core, thruster, fc, cmd, tanks),
            EngineKind::Rocket(r) => r.calculate(core, thruster, fc, cmd, tanks),
            EngineKind::Electric(e) => e.calculate(core, thruster, fc, cmd),
        }
    }

    pub fn thrust(&self) -> f64 {
        self.thruster.thrust()
    }

    pub fn body_forces(&mut self, fc: &FlightConditions) -> Vector3<f64> {
        self.thruster.body_forces(fc)
    }

    pub fn moments(&self) -> Vector3<f64> {
        self.thruster.moments()
    }

    pub fn add_feed_tank(&mut self, tank: TankId) {
        self.core.add_feed_tank(tank);
    }

    pub fn set_placement(&mut self, placement: &Placement) {
        self.thruster.set_placement(placement);
    }

    /// Turbine-family phase, if this engine has one.
    pub fn phase(&self) -> Option<Phase> {
        match &self.kind {
            EngineKind::Turbine(t) => Some(t.phase()),
            EngineKind::Turboprop(t) => Some(t.phase()),
            _ => None,
        }
    }

    /// Signal a compressor stall. Ignored by engines without one.
    pub fn set_stalled(&mut self, stalled: bool) {
        if let EngineKind::Turbine(t) = &mut self.kind {
            t.set_stalled(stalled);
        }
    }

    /// Signal mechanical seizure. Ignored by engines without one.
    pub fn set_seized(&mut self, seized: bool) {
        if let EngineKind::Turbine(t) = &mut self.kind {
            t.set_seized(seized);
        }
    }

    /// Start the engine as if already running, for in-air initialisation.
    pub fn init_running(&mut self) {
        match &mut self.kind {
            EngineKind::Piston(p) => p.init_running(&mut self.core, &mut self.thruster),
            EngineKind::Turbine(t) => t.init_running(&mut self.core),
            EngineKind::Turboprop(t) => t.init_running(&mut self.core),
            EngineKind::Rocket(r) => r.init_running(&mut self.core),
            EngineKind::Electric(e) => e.init_running(&mut self.core),
        }
        tracing::info!(engine = %self.core.name, "engine initialised running");
    }

    pub fn reset_to_ic(&mut self) {
        self.core.reset();
        self.thruster.reset();
        match &mut self.kind {
            EngineKind::Piston(p) => p.reset(),
            EngineKind::Turbine(t) => t.reset(),
            EngineKind::Turboprop(t) => t.reset(),
            EngineKind::Rocket(r) => r.reset(),
            EngineKind::Electric(e) => e.reset(),
        }
    }

    /// Every telemetry name this engine answers to.
    pub fn telemetry_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        COMMON_TELEMETRY
            .iter()
            .chain(self.kind.telemetry_names())
            .copied()
    }

    pub fn telemetry(&self, name: &str) -> Option<f64> {
        let flag = |b: bool| f64::from(u8::from(b));
        let common = match name {
            "thrust-n" => Some(self.thruster.thrust()),
            "running" => Some(flag(self.core.running)),
            "starved" => Some(flag(self.core.starved)),
            "cranking" => Some(flag(self.core.cranking)),
            "fuel-flow-kgps" => Some(self.core.fuel_flow_rate),
            "fuel-flow-gph" => Some(self.core.fuel_flow_gph()),
            "oxidizer-flow-kgps" => Some(self.core.oxidizer_flow_rate),
            "fuel-used-kg" => Some(self.core.fuel_used),
            "thruster-rpm" => Some(self.thruster.rpm()),
            "power-required-w" => Some(self.thruster.power_required()),
            _ => None,
        };
        common.or_else(|| match &self.kind {
            EngineKind::Piston(p) => p.telemetry(name),
            EngineKind::Turbine(t) => t.telemetry(name),
            EngineKind::Turboprop(t) => t.telemetry(name),
            EngineKind::Rocket(r) => r.telemetry(name),
            EngineKind::Electric(e) => e.telemetry(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_engine_type_is_rejected() {
        let el = Element::from_yaml_str("engine", "\"@type\": steam\n").unwrap();
        let err = Engine::from_element(&el, EngineId::from_index(0), &LoadContext::default())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::UnknownType { kind: "engine", .. })
        ));
    }

    #[test]
    fn engine_without_thruster_is_rejected() {
        let doc = r#"
"@type": electric
"@name": motor
power: 5 KW
"#;
        let el = Element::from_yaml_str("engine", doc).unwrap();
        let err = Engine::from_element(&el, EngineId::from_index(0), &LoadContext::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingThruster { ref engine } if engine == "motor"));
    }

    #[test]
    fn telemetry_covers_common_and_variant_names() {
        let doc = r#"
"@type": electric
power: 5 KW
thruster:
  "@type": direct
"#;
        let el = Element::from_yaml_str("engine", doc).unwrap();
        let engine =
            Engine::from_element(&el, EngineId::from_index(2), &LoadContext::default()).unwrap();
        assert_eq!(engine.type_name(), "electric");
        for name in engine.telemetry_names() {
            assert!(engine.telemetry(name).is_some(), "{name}");
        }
        assert!(engine.telemetry("no-such-value").is_none());
    }

    #[test]
    fn variant_names_never_shadow_common_ones() {
        for names in [
            Piston::TELEMETRY,
            Turbine::TELEMETRY,
            Turboprop::TELEMETRY,
            Rocket::TELEMETRY,
            Electric::TELEMETRY,
        ] {
            for name in names {
                assert!(!COMMON_TELEMETRY.contains(name), "{name}");
                assert_eq!(names.iter().filter(|n| *n == name).count(), 1, "{name}");
            }
        }
    }
}
