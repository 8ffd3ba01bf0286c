//! A propulsion system together with its property registry.

use ps_config::Element;
use ps_core::{FlightConditions, LoadContext, PropertyManager};
use ps_engines::Engine;

use crate::error::SimResult;
use crate::properties;
use crate::propulsion::{Propulsion, PropulsionOutput};

pub struct Simulation {
    pub propulsion: Propulsion,
    properties: PropertyManager<Propulsion>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("engines", &self.propulsion.engines().len())
            .field("tanks", &self.propulsion.tanks().len())
            .field("properties", &self.properties.len())
            .finish()
    }
}

impl Simulation {
    pub fn new(propulsion: Propulsion) -> SimResult<Self> {
        let properties = properties::bind(&propulsion)?;
        Ok(Self {
            propulsion,
            properties,
        })
    }

    pub fn from_element(el: &Element, ctx: &LoadContext) -> SimResult<Self> {
        Self::new(Propulsion::from_element(el, ctx)?)
    }

    pub fn get(&self, path: &str) -> SimResult<f64> {
        Ok(self.properties.get(&self.propulsion, path)?)
    }

    pub fn set(&mut self, path: &str, value: f64) -> SimResult<()> {
        Ok(self.properties.set(&mut self.propulsion, path, value)?)
    }

    pub fn is_writable(&self, path: &str) -> bool {
        self.properties.is_writable(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.properties.paths()
    }

    pub fn properties(&self) -> &PropertyManager<Propulsion> {
        &self.properties
    }

    /// Adds an engine and ties its paths.
    pub fn add_engine(&mut self, engine: Engine) -> SimResult<usize> {
        let id = self.propulsion.add_engine(engine)?;
        properties::bind_engine(&mut self.properties, &self.propulsion, id.slot())?;
        Ok(id.slot())
    }

    /// Removes an engine. Later engines shift down, so their paths are tied again.
    pub fn remove_engine(&mut self, index: usize) -> SimResult<Engine> {
        let engine = self.propulsion.remove_engine(index)?;
        properties::rebind_engines(&mut self.properties, &self.propulsion)?;
        Ok(engine)
    }

    pub fn calculate(&mut self, fc: &FlightConditions) -> &PropulsionOutput {
        self.propulsion.calculate(fc)
    }
}
