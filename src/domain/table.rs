//! Cleaned measurement table.
//!
//! Every cell is an `Option<f64>`: `None` marks a value that was missing or
//! could not be coerced to a number. Rows are never dropped here; each
//! analysis asks for the rows that are complete in the columns it uses.

use crate::domain::{COLUMN_COUNT, Column};

/// One bench row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    values: [Option<f64>; COLUMN_COUNT],
}

impl Measurement {
    pub fn get(&self, column: Column) -> Option<f64> {
        self.values[column.index()]
    }

    pub fn set(&mut self, column: Column, value: Option<f64>) {
        self.values[column.index()] = value;
    }

    /// `true` if every listed column holds a value.
    pub fn is_complete(&self, columns: &[Column]) -> bool {
        columns.iter().all(|c| self.get(*c).is_some())
    }
}

/// Paired `(x, y)` samples extracted for one analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PairedSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

/// The full bench table, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    rows: Vec<Measurement>,
}

impl MeasurementTable {
    pub fn new(rows: Vec<Measurement>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Measurement] {
        &self.rows
    }

    pub fn column(&self, column: Column) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(column)).collect()
    }

    /// Rows holding a value in every listed column, in sheet order.
    pub fn complete_rows<'a>(
        &'a self,
        columns: &'a [Column],
    ) -> impl Iterator<Item = &'a Measurement> + 'a {
        self.rows.iter().filter(move |r| r.is_complete(columns))
    }

    /// `(x, y)` over rows complete in both columns.
    pub fn pair(&self, x: Column, y: Column) -> PairedSeries {
        self.pair_where(x, y, &[])
    }

    /// `(x, y)` over rows complete in `x`, `y` and every column of `also_required`.
    pub fn pair_where(&self, x: Column, y: Column, also_required: &[Column]) -> PairedSeries {
        let mut out = PairedSeries::default();
        for row in &self.rows {
            let (Some(xv), Some(yv)) = (row.get(x), row.get(y)) else {
                continue;
            };
            if !row.is_complete(also_required) {
                continue;
            }
            out.x.push(xv);
            out.y.push(yv);
        }
        out
    }
}

/// `(min, max)` of a slice of finite values; `None` if empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() && hi.is_finite() { Some((lo, hi)) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(power: Option<f64>, cd: Option<f64>, ve: Option<f64>) -> Measurement {
        let mut m = Measurement::default();
        m.set(Column::PowerLevel, power);
        m.set(Column::CurrentDensity, cd);
        m.set(Column::VoltageEfficiency, ve);
        m
    }

    #[test]
    fn pair_excludes_rows_missing_either_value() {
        let table = MeasurementTable::new(vec![
            row(Some(10.0), Some(50.0), None),
            row(Some(20.0), None, Some(0.8)),
            row(Some(30.0), Some(150.0), Some(0.7)),
        ]);

        let p = table.pair(Column::PowerLevel, Column::CurrentDensity);
        assert_eq!(p.x, vec![10.0, 30.0]);
        assert_eq!(p.y, vec![50.0, 150.0]);

        // Exclusion is per analysis: the efficiency pair keeps a different row set.
        let e = table.pair(Column::PowerLevel, Column::VoltageEfficiency);
        assert_eq!(e.x, vec![20.0, 30.0]);
    }

    #[test]
    fn pair_where_applies_extra_columns() {
        let table = MeasurementTable::new(vec![
            row(Some(10.0), Some(50.0), None),
            row(Some(30.0), Some(150.0), Some(0.7)),
        ]);
        let p = table.pair_where(
            Column::PowerLevel,
            Column::CurrentDensity,
            &[Column::VoltageEfficiency],
        );
        assert_eq!(p.x, vec![30.0]);
    }

    #[test]
    fn complete_rows_checks_all_columns() {
        let table = MeasurementTable::new(vec![
            row(Some(10.0), Some(50.0), None),
            row(Some(30.0), Some(150.0), Some(0.7)),
        ]);
        let cols = [Column::PowerLevel, Column::VoltageEfficiency];
        assert_eq!(table.complete_rows(&cols).count(), 1);
    }
}
