use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForceError {
    #[error("Unknown transform frame: {name}")]
    UnknownFrame { name: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ps_config::ConfigError),
}

pub type ForceResult<T> = Result<T, ForceError>;
