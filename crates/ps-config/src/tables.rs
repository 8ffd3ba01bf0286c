//! Lookup tables read from `table` elements.
//!
//! ```yaml
//! table:
//!   "@name": C_THRUST
//!   tableData: |
//!     0.0  0.068
//!     1.0  0.000
//! ```
//!
//! A table whose first line holds one value fewer than the following lines
//! is two-dimensional: the first line lists the column keys and every other
//! line starts with its row key.

use ps_core::{Table1D, Table2D};

use crate::element::Element;
use crate::{ConfigError, ConfigResult};

#[derive(Clone, Debug, PartialEq)]
pub enum Table {
    OneD(Table1D),
    TwoD(Table2D),
}

impl Table {
    pub fn from_element(el: &Element) -> ConfigResult<Self> {
        let mut lines: Vec<&str> = el
            .cursor("tableData")
            .flat_map(|d| d.data_lines().iter().map(String::as_str))
            .collect();
        if lines.is_empty() {
            lines = el.data_lines().iter().map(String::as_str).collect();
        }

        let rows = lines
            .iter()
            .map(|line| {
                line.split_whitespace()
                    .map(|tok| el.parse_number(tok))
                    .collect::<ConfigResult<Vec<f64>>>()
            })
            .filter(|row| row.as_ref().map_or(true, |r| !r.is_empty()))
            .collect::<ConfigResult<Vec<Vec<f64>>>>()?;

        let invalid = |what: &str| ConfigError::InvalidValue {
            element: el.name().to_string(),
            what: what.to_string(),
        };

        let Some(first) = rows.first() else {
            return Err(invalid("table has no data"));
        };

        let two_d = rows.len() > 1 && rows[1].len() == first.len() + 1;
        if two_d {
            let col_keys = first.clone();
            let mut row_keys = Vec::with_capacity(rows.len() - 1);
            let mut data = Vec::with_capacity(rows.len() - 1);
            for row in &rows[1..] {
                let Some((key, values)) = row.split_first() else {
                    return Err(invalid("empty table row"));
                };
                row_keys.push(*key);
                data.push(values.to_vec());
            }
            return Ok(Table::TwoD(Table2D::new(row_keys, col_keys, data)?));
        }

        let pairs = rows
            .iter()
            .map(|row| match row.as_slice() {
                [x, y] => Ok((*x, *y)),
                _ => Err(invalid("1-D table rows need exactly two columns")),
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Table::OneD(Table1D::new(pairs)?))
    }

    /// Row-only lookup; a 2-D table is read at its first column.
    pub fn value(&self, row: f64) -> f64 {
        match self {
            Table::OneD(t) => t.value(row),
            Table::TwoD(t) => t.value(row, t.col_keys()[0]),
        }
    }

    /// Two-argument lookup; a 1-D table ignores `col`.
    pub fn value2(&self, row: f64, col: f64) -> f64 {
        match self {
            Table::OneD(t) => t.value(row),
            Table::TwoD(t) => t.value(row, col),
        }
    }

    pub fn is_2d(&self) -> bool {
        matches!(self, Table::TwoD(_))
    }

    pub fn into_1d(self, what: &str) -> ConfigResult<Table1D> {
        match self {
            Table::OneD(t) => Ok(t),
            Table::TwoD(_) => Err(ConfigError::InvalidValue {
                element: what.to_string(),
                what: "expected a 1-D table".into(),
            }),
        }
    }

    pub fn into_2d(self) -> Table2D {
        match self {
            Table::OneD(t) => Table2D::from_1d(&t),
            Table::TwoD(t) => t,
        }
    }
}
