use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThrusterError {
    #[error("Missing table {name} for {what}")]
    MissingTable { what: &'static str, name: &'static str },

    #[error("Invalid thruster parameter: {what}")]
    InvalidArg { what: &'static str },

    #[error("Core error: {0}")]
    Core(#[from] ps_core::CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ps_config::ConfigError),

    #[error("Force error: {0}")]
    Force(#[from] ps_forces::ForceError),
}

pub type ThrusterResult<T> = Result<T, ThrusterError>;
