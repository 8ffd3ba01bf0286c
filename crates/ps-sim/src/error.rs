//! Error types for propulsion assembly and scenario runs.

use ps_config::ConfigError;
use ps_core::CoreError;
use ps_engines::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Engine {engine} feeds from tank {tank}, which does not exist")]
    UnknownTank { engine: String, tank: usize },

    #[error("No engine with index {index}")]
    UnknownEngine { index: usize },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Property error: {0}")]
    Property(#[from] CoreError),

    #[error("Scenario parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tank_names_both_sides() {
        let err = SimError::UnknownTank {
            engine: "left".into(),
            tank: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("left") && msg.contains('4'));
    }

    #[test]
    fn property_errors_convert() {
        let err: SimError = CoreError::UnknownProperty {
            path: "propulsion/nope".into(),
        }
        .into();
        assert!(matches!(err, SimError::Property(_)));
    }
}
