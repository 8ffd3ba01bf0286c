//! Lookup tables with linear interpolation, clamped at the end points.

use crate::error::{CoreError, CoreResult};

/// One-dimensional lookup table `y = f(x)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Table1D {
    keys: Vec<f64>,
    values: Vec<f64>,
}

impl Table1D {
    /// Build from `(x, y)` rows. Keys must be finite and strictly increasing.
    pub fn new(rows: Vec<(f64, f64)>) -> CoreResult<Self> {
        if rows.is_empty() {
            return Err(CoreError::InvalidTable {
                what: "table has no rows".into(),
            });
        }
        let (keys, values): (Vec<f64>, Vec<f64>) = rows.into_iter().unzip();
        check_keys(&keys)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidTable {
                what: "non-finite table value".into(),
            });
        }
        Ok(Self { keys, values })
    }

    /// A table that returns `value` for every key.
    pub fn constant(value: f64) -> Self {
        Self {
            keys: vec![0.0],
            values: vec![value],
        }
    }

    pub fn value(&self, x: f64) -> f64 {
        let (i, frac) = locate(&self.keys, x);
        match self.values.get(i + 1) {
            Some(next) if frac > 0.0 => self.values[i] + frac * (next - self.values[i]),
            _ => self.values[i],
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns a copy with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            keys: self.keys.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }
}

/// Two-dimensional lookup table `z = f(row, column)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Table2D {
    row_keys: Vec<f64>,
    col_keys: Vec<f64>,
    /// Row-major, `row_keys.len() * col_keys.len()` entries.
    data: Vec<f64>,
}

impl Table2D {
    pub fn new(row_keys: Vec<f64>, col_keys: Vec<f64>, data: Vec<Vec<f64>>) -> CoreResult<Self> {
        check_keys(&row_keys)?;
        check_keys(&col_keys)?;
        if data.len() != row_keys.len() {
            return Err(CoreError::InvalidTable {
                what: format!(
                    "expected {} rows, found {}",
                    row_keys.len(),
                    data.len()
                ),
            });
        }
        let mut flat = Vec::with_capacity(row_keys.len() * col_keys.len());
        for row in data {
            if row.len() != col_keys.len() {
                return Err(CoreError::InvalidTable {
                    what: format!(
                        "expected {} columns, found {}",
                        col_keys.len(),
                        row.len()
                    ),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(CoreError::InvalidTable {
                    what: "non-finite table value".into(),
                });
            }
            flat.extend(row);
        }
        Ok(Self {
            row_keys,
            col_keys,
            data: flat,
        })
    }

    /// Lift a 1-D table into a 2-D one with a single column; the column
    /// argument is then ignored.
    pub fn from_1d(table: &Table1D) -> Self {
        Self {
            row_keys: table.keys.clone(),
            col_keys: vec![0.0],
            data: table.values.clone(),
        }
    }

    /// A table that returns `value` everywhere.
    pub fn constant(value: f64) -> Self {
        Self::from_1d(&Table1D::constant(value))
    }

    fn at(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.col_keys.len() + c]
    }

    pub fn value(&self, row: f64, col: f64) -> f64 {
        let (r, fr) = locate(&self.row_keys, row);
        let (c, fc) = locate(&self.col_keys, col);
        let r1 = (r + 1).min(self.row_keys.len() - 1);
        let c1 = (c + 1).min(self.col_keys.len() - 1);

        let top = self.at(r, c) + fc * (self.at(r, c1) - self.at(r, c));
        let bottom = self.at(r1, c) + fc * (self.at(r1, c1) - self.at(r1, c));
        top + fr * (bottom - top)
    }

    pub fn row_keys(&self) -> &[f64] {
        &self.row_keys
    }

    pub fn col_keys(&self) -> &[f64] {
        &self.col_keys
    }

    /// Returns a copy with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            row_keys: self.row_keys.clone(),
            col_keys: self.col_keys.clone(),
            data: self.data.iter().map(|v| v * factor).collect(),
        }
    }
}

fn check_keys(keys: &[f64]) -> CoreResult<()> {
    if keys.is_empty() {
        return Err(CoreError::InvalidTable {
            what: "table has no keys".into(),
        });
    }
    if keys.iter().any(|k| !k.is_finite()) {
        return Err(CoreError::InvalidTable {
            what: "non-finite table key".into(),
        });
    }
    if keys.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CoreError::InvalidTable {
            what: "table keys must be strictly increasing".into(),
        });
    }
    Ok(())
}

/// Lower bracket index and interpolation fraction in [0, 1].
fn locate(keys: &[f64], x: f64) -> (usize, f64) {
    let last = keys.len() - 1;
    if last == 0 || x <= keys[0] {
        return (0, 0.0);
    }
    if x >= keys[last] {
        return (last, 0.0);
    }
    let hi = keys.partition_point(|k| *k <= x);
    let lo = hi - 1;
    (lo, (x - keys[lo]) / (keys[hi] - keys[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_and_clamps() {
        let t = Table1D::new(vec![(0.0, 0.0), (1.0, 10.0), (2.0, 30.0)]).unwrap();
        assert_eq!(t.value(-5.0), 0.0);
        assert_eq!(t.value(0.5), 5.0);
        assert_eq!(t.value(1.5), 20.0);
        assert_eq!(t.value(2.0), 30.0);
        assert_eq!(t.value(9.0), 30.0);
    }

    #[test]
    fn single_row_is_constant() {
        let t = Table1D::constant(4.0);
        assert_eq!(t.value(-1.0), 4.0);
        assert_eq!(t.value(100.0), 4.0);
    }

    #[test]
    fn rejects_unsorted_keys() {
        let err = Table1D::new(vec![(1.0, 0.0), (0.5, 1.0)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTable { .. }));
    }

    #[test]
    fn bilinear_lookup() {
        let t = Table2D::new(
            vec![0.0, 1.0],
            vec![0.0, 10.0],
            vec![vec![0.0, 10.0], vec![100.0, 110.0]],
        )
        .unwrap();
        assert_eq!(t.value(0.0, 0.0), 0.0);
        assert_eq!(t.value(0.5, 5.0), 55.0);
        assert_eq!(t.value(1.0, 10.0), 110.0);
        assert_eq!(t.value(3.0, 20.0), 110.0);
    }

    #[test]
    fn lifted_table_ignores_column() {
        let t = Table1D::new(vec![(0.0, 1.0), (1.0, 3.0)]).unwrap();
        let lifted = Table2D::from_1d(&t);
        assert_eq!(lifted.value(0.5, -40.0), 2.0);
        assert_eq!(lifted.value(0.5, 4.0e4), 2.0);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Table2D::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![vec![0.0, 1.0], vec![2.0]]);
        assert!(err.is_err());
    }
}
