//! Fuel and oxidizer tanks.
//!
//! Contents are masses in kg. A tank holds `0 ≤ contents ≤ capacity` after
//! every operation; draining it dry clears `selected` so engines stop
//! counting it as a source.

use nalgebra::Vector3;
use ps_config::Element;
use ps_core::constants::GAL_TO_M3;
use ps_core::ensure_positive;

use crate::error::{EngineError, EngineResult};

/// Specific heat of the tank contents (J/(kg·K)).
const HEAT_CAPACITY: f64 = 1984.0;
/// Wall heat transfer coefficient (W/(m²·K)).
const WALL_TRANSFER: f64 = 12.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TankKind {
    #[default]
    Fuel,
    Oxidizer,
}

impl TankKind {
    pub fn from_name(name: &str) -> EngineResult<Self> {
        match name.to_ascii_uppercase().as_str() {
            "FUEL" => Ok(TankKind::Fuel),
            "OXIDIZER" => Ok(TankKind::Oxidizer),
            _ => Err(EngineError::InvalidArg {
                what: "tank type must be FUEL or OXIDIZER",
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tank {
    pub name: String,
    pub kind: TankKind,
    /// Capacity (kg).
    pub capacity: f64,
    contents: f64,
    initial_contents: f64,
    /// Contents density (kg/m³).
    pub density: f64,
    /// Quantity that cannot be dumped overboard (kg).
    pub standpipe: f64,
    /// Feed priority; zero takes the tank out of service.
    pub priority: u32,
    /// Continuous external transfer (kg/s), positive into the tank.
    pub external_flow: f64,
    /// Structural location (m).
    pub location: Vector3<f64>,
    /// Wetted wall area for the temperature model (m²).
    pub area: f64,
    temperature: Option<f64>,
    initial_temperature: Option<f64>,
    selected: bool,
}

impl Tank {
    pub fn new(kind: TankKind, capacity: f64, contents: f64) -> EngineResult<Self> {
        let capacity = ensure_positive(capacity, "tank capacity")?;
        let contents = contents.clamp(0.0, capacity);
        Ok(Self {
            name: String::new(),
            kind,
            capacity,
            contents,
            initial_contents: contents,
            density: 800.0,
            standpipe: 0.0,
            priority: 1,
            external_flow: 0.0,
            location: Vector3::zeros(),
            area: 1.0,
            temperature: None,
            initial_temperature: None,
            selected: contents > 0.0,
        })
    }

    pub fn from_element(el: &Element) -> EngineResult<Self> {
        let kind = match el.attribute("type") {
            Some(t) => TankKind::from_name(t)?,
            None => TankKind::Fuel,
        };
        let capacity = el.find_element_value_as_number_convert_to("capacity", "KG")?;
        let contents = el.number_or("contents", "KG", 0.0)?;
        let mut tank = Tank::new(kind, capacity, contents)?;

        tank.name = el.attribute("name").unwrap_or_default().to_string();
        let density = el.number_or("density", "KG/M3", tank.density)?;
        tank.density = ensure_positive(density, "tank density")?;
        tank.standpipe = el.number_or("standpipe", "KG", 0.0)?.clamp(0.0, capacity);
        tank.priority = el.number_or("priority", "", 1.0)?.max(0.0) as u32;
        tank.area = el.number_or("area", "M2", tank.area)?;
        if let Some(loc) = el.find_element("location") {
            tank.location = loc.triplet_convert_to("M")?;
        }
        tank.temperature = el.number_opt("temperature", "K")?;
        tank.initial_temperature = tank.temperature;
        tank.selected = tank.contents > 0.0 && tank.priority > 0;
        Ok(tank)
    }

    pub fn contents(&self) -> f64 {
        self.contents
    }

    /// Sets contents, clamped to capacity. Also re-evaluates `selected`.
    pub fn set_contents(&mut self, contents: f64) {
        self.contents = contents.clamp(0.0, self.capacity);
        self.selected = self.contents > 0.0 && self.priority > 0;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected && self.contents > 0.0;
    }

    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
        self.selected = priority > 0 && self.contents > 0.0;
    }

    pub fn pct_full(&self) -> f64 {
        100.0 * self.contents / self.capacity
    }

    /// Contents volume (m³).
    pub fn volume(&self) -> f64 {
        if self.density > 0.0 {
            self.contents / self.density
        } else {
            0.0
        }
    }

    /// Contents volume in US gallons.
    pub fn gallons(&self) -> f64 {
        self.volume() / GAL_TO_M3
    }

    /// Tank temperature (K), when the temperature model is active.
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn initial_contents(&self) -> f64 {
        self.initial_contents
    }

    /// Remove `amount` kg. Returns 0 when fully served, otherwise the
    /// (negative) shortfall after emptying the tank.
    pub fn drain(&mut self, amount: f64) -> f64 {
        let remaining = self.contents - amount;
        if remaining >= 0.0 {
            self.contents = remaining.min(self.capacity);
            if self.contents == 0.0 {
                self.selected = false;
            }
            0.0
        } else {
            self.contents = 0.0;
            self.selected = false;
            remaining
        }
    }

    /// Add `amount` kg. Returns what did not fit.
    pub fn fill(&mut self, amount: f64) -> f64 {
        let total = self.contents + amount.max(0.0);
        let overflow = (total - self.capacity).max(0.0);
        self.contents = total.min(self.capacity);
        self.selected = self.contents > 0.0 && self.priority > 0;
        overflow
    }

    /// Dump up to `amount` kg overboard without going below the standpipe.
    /// Returns the mass actually dumped.
    pub fn dump(&mut self, amount: f64) -> f64 {
        let available = (self.contents - self.standpipe).max(0.0);
        let dumped = amount.max(0.0).min(available);
        self.contents -= dumped;
        if self.contents <= 0.0 {
            self.contents = 0.0;
            self.selected = false;
        }
        dumped
    }

    /// Apply external flow and relax the contents temperature toward total
    /// air temperature `tat` (K). Returns the temperature, if modelled.
    pub fn calculate(&mut self, dt: f64, tat: f64) -> Option<f64> {
        if self.external_flow < 0.0 {
            self.drain(-self.external_flow * dt);
        } else if self.external_flow > 0.0 {
            self.fill(self.external_flow * dt);
        }

        let t = self.temperature.as_mut()?;
        let diff = tat - *t;
        if diff.abs() > 0.1 && self.contents > 0.01 {
            *t += WALL_TRANSFER * self.area * diff * dt / (self.contents * HEAT_CAPACITY);
        }
        Some(*t)
    }

    pub fn reset(&mut self) {
        self.contents = self.initial_contents;
        self.temperature = self.initial_temperature;
        self.selected = self.contents > 0.0 && self.priority > 0;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Fill(f64),
        Drain(f64),
        Dump(f64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0..500.0f64).prop_map(Op::Fill),
            (0.0..500.0f64).prop_map(Op::Drain),
            (0.0..500.0f64).prop_map(Op::Dump),
        ]
    }

    proptest! {
        #[test]
        fn contents_stay_in_bounds(
            capacity in 1.0..1000.0f64,
            start in 0.0..1.0f64,
            ops in proptest::collection::vec(op(), 1..64),
        ) {
            let mut t = Tank::new(TankKind::Fuel, capacity, start * capacity).unwrap();
            for op in ops {
                match op {
                    Op::Fill(a) => { t.fill(a); }
                    Op::Drain(a) => {
                        let short = t.drain(a);
                        prop_assert!(short <= 0.0);
                    }
                    Op::Dump(a) => { t.dump(a); }
                }
                prop_assert!(t.contents() >= 0.0);
                prop_assert!(t.contents() <= t.capacity);
                if t.contents() == 0.0 {
                    prop_assert!(!t.is_selected());
                }
            }
        }
    }
}
