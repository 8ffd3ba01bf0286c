//! Configuration element tree and its cursor.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde_yaml::Value;

use crate::tables::Table;
use crate::units::convert;
use crate::{ConfigError, ConfigResult};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    data: Vec<String>,
    children: Vec<Element>,
}

/// Walks the children of one element that share a name.
///
/// This is the explicit replacement for a stateful "find next" call: the
/// position lives in the cursor, the tree stays immutable.
#[derive(Clone, Debug)]
pub struct ElementCursor<'a> {
    children: &'a [Element],
    name: &'a str,
    pos: usize,
}

impl<'a> ElementCursor<'a> {
    /// Next matching child, advancing the cursor.
    pub fn find_next_element(&mut self) -> Option<&'a Element> {
        while let Some(child) = self.children.get(self.pos) {
            self.pos += 1;
            if child.name == self.name {
                return Some(child);
            }
        }
        None
    }
}

impl<'a> Iterator for ElementCursor<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        self.find_next_element()
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, line: impl Into<String>) -> Self {
        self.data.push(line.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn from_yaml_str(root_name: &str, text: &str) -> ConfigResult<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_yaml_value(root_name, &value)
    }

    pub fn from_yaml_value(name: &str, value: &Value) -> ConfigResult<Self> {
        let mut el = Element::new(name);
        match value {
            Value::Mapping(map) => {
                for (key, v) in map {
                    let key = scalar_text(key).ok_or_else(|| ConfigError::InvalidValue {
                        element: name.to_string(),
                        what: "mapping keys must be scalars".into(),
                    })?;
                    if let Some(attr) = key.strip_prefix('@') {
                        let text = scalar_text(v).ok_or_else(|| ConfigError::InvalidValue {
                            element: name.to_string(),
                            what: format!("attribute {attr} must be a scalar"),
                        })?;
                        el.attributes.insert(attr.to_string(), text);
                    } else if key == "#data" {
                        el.data.extend(data_lines(name, v)?);
                    } else if let Value::Sequence(items) = v {
                        for item in items {
                            el.children.push(Self::from_yaml_value(&key, item)?);
                        }
                    } else {
                        el.children.push(Self::from_yaml_value(&key, v)?);
                    }
                }
            }
            Value::Null => {}
            Value::Sequence(_) => {
                el.data.extend(data_lines(name, value)?);
            }
            Value::Tagged(tagged) => return Self::from_yaml_value(name, &tagged.value),
            scalar => {
                let text = scalar_text(scalar).unwrap_or_default();
                match split_unit(&text) {
                    Some((number, unit)) => {
                        el.data.push(number.to_string());
                        el.attributes.insert("unit".into(), unit.to_string());
                    }
                    None => el.data.extend(text.lines().map(str::to_string)),
                }
            }
        }
        Ok(el)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn data_lines(&self) -> &[String] {
        &self.data
    }

    /// Element text joined into one line.
    pub fn data_string(&self) -> String {
        self.data.join(" ").trim().to_string()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn find_element(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.find_element(name).is_some()
    }

    /// Like [`find_element`](Self::find_element) but missing is an error.
    pub fn require(&self, name: &str) -> ConfigResult<&Element> {
        self.find_element(name)
            .ok_or_else(|| ConfigError::MissingElement {
                parent: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Cursor over children named `name`.
    pub fn cursor<'a>(&'a self, name: &'a str) -> ElementCursor<'a> {
        ElementCursor {
            children: &self.children,
            name,
            pos: 0,
        }
    }

    pub fn find_element_value(&self, name: &str) -> Option<String> {
        self.find_element(name).map(Element::data_string)
    }

    pub fn value_as_number(&self) -> ConfigResult<f64> {
        let text = self.data_string();
        self.parse_number(&text)
    }

    /// Element text as a number converted from its `unit` attribute to
    /// `target`. Without a unit attribute the number is taken as `target`.
    pub fn value_as_number_convert_to(&self, target: &str) -> ConfigResult<f64> {
        let v = self.value_as_number()?;
        match self.attribute("unit") {
            Some(unit) => convert(v, unit, target),
            None => Ok(v),
        }
    }

    pub fn find_element_value_as_number(&self, name: &str) -> ConfigResult<f64> {
        self.require(name)?.value_as_number()
    }

    pub fn find_element_value_as_number_convert_to(
        &self,
        name: &str,
        target: &str,
    ) -> ConfigResult<f64> {
        self.require(name)?.value_as_number_convert_to(target)
    }

    /// Optional numeric child with a default.
    pub fn number_or(&self, name: &str, target: &str, default: f64) -> ConfigResult<f64> {
        match self.find_element(name) {
            Some(el) => el.value_as_number_convert_to(target),
            None => Ok(default),
        }
    }

    /// Optional numeric child.
    pub fn number_opt(&self, name: &str, target: &str) -> ConfigResult<Option<f64>> {
        self.find_element(name)
            .map(|el| el.value_as_number_convert_to(target))
            .transpose()
    }

    /// Optional boolean-ish child (`0`/`1`, `true`/`false`).
    pub fn flag_or(&self, name: &str, default: bool) -> ConfigResult<bool> {
        let Some(el) = self.find_element(name) else {
            return Ok(default);
        };
        match el.data_string().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Ok(el.value_as_number()? != 0.0),
        }
    }

    /// Read `x/y/z` or `roll/pitch/yaw` children as a vector in `target`
    /// units, using this element's `unit` attribute. Missing axes are 0.
    pub fn triplet_convert_to(&self, target: &str) -> ConfigResult<Vector3<f64>> {
        let axes: [[&str; 2]; 3] = [["x", "roll"], ["y", "pitch"], ["z", "yaw"]];
        let mut out = Vector3::zeros();
        for (i, names) in axes.iter().enumerate() {
            let Some(el) = names.iter().find_map(|n| self.find_element(n)) else {
                continue;
            };
            let raw = el.value_as_number()?;
            out[i] = match el.attribute("unit").or(self.attribute("unit")) {
                Some(unit) => convert(raw, unit, target)?,
                None => raw,
            };
        }
        Ok(out)
    }

    pub fn find_element_triplet_convert_to(
        &self,
        name: &str,
        target: &str,
    ) -> ConfigResult<Vector3<f64>> {
        self.require(name)?.triplet_convert_to(target)
    }

    /// First `table` child with `@name == name`.
    pub fn find_table(&self, name: &str) -> Option<&Element> {
        self.cursor("table")
            .find(|t| t.attribute("name") == Some(name))
    }

    pub fn table_named(&self, name: &str) -> ConfigResult<Option<Table>> {
        self.find_table(name).map(Table::from_element).transpose()
    }

    pub fn parse_number(&self, text: &str) -> ConfigResult<f64> {
        text.trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidValue {
                element: self.name.clone(),
                what: format!("expected a number, found '{}'", text.trim()),
            })
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(t) => scalar_text(&t.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn data_lines(name: &str, v: &Value) -> ConfigResult<Vec<String>> {
    match v {
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::Sequence(row) => row
                    .iter()
                    .map(|cell| scalar_text(cell).ok_or_else(|| bad_data(name)))
                    .collect::<ConfigResult<Vec<_>>>()
                    .map(|cells| cells.join(" ")),
                other => scalar_text(other).ok_or_else(|| bad_data(name)),
            })
            .collect(),
        other => Ok(scalar_text(other)
            .ok_or_else(|| bad_data(name))?
            .lines()
            .map(str::to_string)
            .collect()),
    }
}

fn bad_data(name: &str) -> ConfigError {
    ConfigError::InvalidValue {
        element: name.to_string(),
        what: "element data must be scalars or rows of scalars".into(),
    }
}

/// `"10000 LBS"` → `("10000", "LBS")`.
fn split_unit(text: &str) -> Option<(&str, &str)> {
    let mut parts = text.split_whitespace();
    let number = parts.next()?;
    let unit = parts.next()?;
    if parts.next().is_some() || number.parse::<f64>().is_err() || unit.parse::<f64>().is_ok() {
        return None;
    }
    Some((number, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::{Tolerances, nearly_equal};

    const DOC: &str = r##"
"@name": test
capacity: 10000 LBS
contents:
  "@unit": LBS
  "#data": 2500
location:
  "@unit": IN
  x: 100
  y: 0
  z: -12
feed: [0, 1, 1]
note: hello world
"##;

    #[test]
    fn attributes_data_and_units() {
        let el = Element::from_yaml_str("tank", DOC).unwrap();
        assert_eq!(el.name(), "tank");
        assert_eq!(el.attribute("name"), Some("test"));

        let cap = el.find_element_value_as_number_convert_to("capacity", "KG").unwrap();
        assert!(nearly_equal(cap, 4_535.9237, Tolerances::relative(1e-6)));

        let contents = el.find_element_value_as_number_convert_to("contents", "LBS").unwrap();
        assert_eq!(contents, 2500.0);

        assert_eq!(el.find_element_value("note").as_deref(), Some("hello world"));
    }

    #[test]
    fn cursor_walks_repeated_elements() {
        let el = Element::from_yaml_str("engine", DOC).unwrap();
        let mut cursor = el.cursor("feed");
        let mut seen = Vec::new();
        while let Some(feed) = cursor.find_next_element() {
            seen.push(feed.value_as_number().unwrap());
        }
        assert_eq!(seen, vec![0.0, 1.0, 1.0]);
        assert!(cursor.find_next_element().is_none());
    }

    #[test]
    fn triplet_with_parent_unit() {
        let el = Element::from_yaml_str("tank", DOC).unwrap();
        let loc = el.find_element_triplet_convert_to("location", "M").unwrap();
        assert!((loc.x - 2.54).abs() < 1e-12);
        assert!((loc.z + 0.3048).abs() < 1e-12);
    }

    #[test]
    fn missing_element_is_error() {
        let el = Element::from_yaml_str("tank", DOC).unwrap();
        let err = el.find_element_value_as_number("standpipe").unwrap_err();
        assert!(matches!(err, ConfigError::MissingElement { .. }));
        assert_eq!(el.number_or("standpipe", "KG", 0.0).unwrap(), 0.0);
    }

    #[test]
    fn split_unit_rules() {
        assert_eq!(split_unit("10 FT"), Some(("10", "FT")));
        assert_eq!(split_unit("hello world"), None);
        assert_eq!(split_unit("1 2"), None);
        assert_eq!(split_unit("10"), None);
    }
}
