//! Error types for engine and tank construction.

use ps_config::ConfigError;
use ps_core::CoreError;
use ps_forces::ForceError;
use ps_thrusters::ThrusterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Engine {engine} is missing its thruster")]
    MissingThruster { engine: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Thruster error: {0}")]
    Thruster(#[from] ThrusterError),

    #[error("Force error: {0}")]
    Force(#[from] ForceError),
}

pub type EngineResult<T> = Result<T, EngineError>;
