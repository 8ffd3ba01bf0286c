//! ps-config: configuration element tree.
//!
//! Engine and thruster constructors read their parameters from an
//! [`Element`] tree and never touch the filesystem. The tree is built from
//! YAML with these conventions:
//!
//! - keys starting with `@` are attributes
//! - `#data` holds the element text (a string, a number, or a list of lines)
//! - a sequence value produces one element per item, all with the same name
//! - a scalar such as `"10000 LBS"` is a number with a `unit` attribute

pub mod element;
pub mod tables;
pub mod units;

pub use element::{Element, ElementCursor};
pub use tables::Table;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing element <{name}> in <{parent}>")]
    MissingElement { parent: String, name: String },

    #[error("Missing attribute {attribute} on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid value in <{element}>: {what}")]
    InvalidValue { element: String, what: String },

    #[error("Unknown unit {unit} (target {target})")]
    UnknownUnit { unit: String, target: String },

    #[error("Unknown {kind} type: {name}")]
    UnknownType { kind: &'static str, name: String },

    #[error("Table error: {0}")]
    Table(#[from] ps_core::CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Read a YAML document into an element tree rooted at `root_name`.
pub fn load_yaml(path: &std::path::Path, root_name: &str) -> ConfigResult<Element> {
    let content = std::fs::read_to_string(path)?;
    Element::from_yaml_str(root_name, &content)
}
