use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid table: {what}")]
    InvalidTable { what: String },

    #[error("Unknown property: {path}")]
    UnknownProperty { path: String },

    #[error("Property already tied: {path}")]
    DuplicateProperty { path: String },

    #[error("Property is read-only: {path}")]
    ReadOnlyProperty { path: String },
}
