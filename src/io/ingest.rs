//! Spreadsheet ingest and cleaning.
//!
//! This module turns the fixed-layout bench sheet into a `MeasurementTable`:
//!
//! - **Strict layout**: exactly 20 columns, header row, then a units row
//!   (wrong shape is fatal, exit code 2)
//! - **Positional naming**: header text is ignored; column `i` is `Column::ALL[i]`
//! - **Lenient cells**: anything that is not a finite number becomes missing
//!   (counted for the run summary, never fatal)
//! - **No row filtering**: each analysis selects its own complete rows
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`) are read with
//! `calamine` (first worksheet); `.csv` files with `csv`.

use std::fs::File;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};

use crate::domain::{COLUMN_COUNT, Column, Measurement, MeasurementTable};
use crate::error::AppError;

/// A raw cell before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Number(f64),
    Text(String),
    /// Booleans, error cells, dates: never numeric.
    Other,
    Empty,
}

/// The sheet as read from disk: header row plus every following row.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

/// Ingest output: cleaned table + what happened while cleaning.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: PathBuf,
    pub table: MeasurementTable,
    /// Text of the discarded units row, one entry per column.
    pub units: Vec<String>,
    /// Data rows read (units row excluded).
    pub rows_read: usize,
    /// Non-empty cells that could not be coerced to a number.
    pub coerced_cells: usize,
}

/// Load and clean a bench sheet.
pub fn load_measurements(path: &Path) -> Result<IngestedData, AppError> {
    let raw = read_raw_sheet(path)?;
    let mut data = clean_sheet(raw)?;
    data.source = path.to_path_buf();

    log::info!(
        "loaded {} data rows from '{}' ({} cells coerced to missing)",
        data.rows_read,
        path.display(),
        data.coerced_cells
    );
    Ok(data)
}

/// Read the raw cells, dispatching on the file extension.
pub fn read_raw_sheet(path: &Path) -> Result<RawSheet, AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv_sheet(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook_sheet(path),
        other => Err(AppError::new(
            2,
            format!(
                "Unsupported input '{}' (extension '.{other}'); \
                 expected .xlsx/.xls/.xlsb/.ods or .csv.",
                path.display()
            ),
        )),
    }
}

/// Validate the layout and coerce every cell.
pub fn clean_sheet(raw: RawSheet) -> Result<IngestedData, AppError> {
    if raw.header.len() != COLUMN_COUNT {
        return Err(AppError::new(
            2,
            format!(
                "Expected {COLUMN_COUNT} columns in the header row, found {}.",
                raw.header.len()
            ),
        ));
    }

    let mut rows = raw.rows.into_iter();
    let units_row = rows
        .next()
        .ok_or_else(|| AppError::new(2, "Missing units row after the header."))?;
    let units = (0..COLUMN_COUNT)
        .map(|i| units_row.get(i).map(cell_text).unwrap_or_default())
        .collect();

    let mut measurements = Vec::new();
    let mut coerced_cells = 0usize;
    for row in rows {
        let mut m = Measurement::default();
        for col in Column::ALL {
            let cell = row.get(col.index()).unwrap_or(&RawCell::Empty);
            let value = coerce_cell(cell);
            if value.is_none() && !matches!(cell, RawCell::Empty) {
                coerced_cells += 1;
            }
            m.set(col, value);
        }
        measurements.push(m);
    }

    if measurements.is_empty() {
        return Err(AppError::new(3, "No data rows after the units row."));
    }

    Ok(IngestedData {
        source: PathBuf::new(),
        rows_read: measurements.len(),
        table: MeasurementTable::new(measurements),
        units,
        coerced_cells,
    })
}

/// Numeric coercion: finite numbers pass, numeric text is parsed, everything else is missing.
pub fn coerce_cell(cell: &RawCell) -> Option<f64> {
    let v = match cell {
        RawCell::Number(v) => *v,
        RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCell::Other | RawCell::Empty => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

fn cell_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Number(v) => v.to_string(),
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Other | RawCell::Empty => String::new(),
    }
}

fn read_csv_sheet(path: &Path) -> Result<RawSheet, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = reader.records();
    let header = match records.next() {
        Some(Ok(r)) => r
            .iter()
            .enumerate()
            .map(|(i, s)| {
                // Excel-exported CSVs often carry a BOM on the first header.
                if i == 0 { s.trim_start_matches('\u{feff}').to_string() } else { s.to_string() }
            })
            .collect(),
        Some(Err(e)) => return Err(AppError::new(2, format!("Failed to read CSV header: {e}"))),
        None => return Err(AppError::new(2, format!("CSV '{}' is empty.", path.display()))),
    };

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        // +2: 1-based lines, header on line 1.
        let record = result
            .map_err(|e| AppError::new(2, format!("CSV parse error on line {}: {e}", idx + 2)))?;
        rows.push(
            record
                .iter()
                .map(|s| if s.is_empty() { RawCell::Empty } else { RawCell::Text(s.to_string()) })
                .collect(),
        );
    }

    Ok(RawSheet { header, rows })
}

fn read_workbook_sheet(path: &Path) -> Result<RawSheet, AppError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::new(2, format!("Failed to open workbook '{}': {e}", path.display()))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            AppError::new(2, format!("Workbook '{}' has no worksheets.", path.display()))
        })?
        .map_err(|e| AppError::new(2, format!("Failed to read first worksheet: {e}")))?;

    let mut rows_iter = range.rows();
    let header = rows_iter
        .next()
        .ok_or_else(|| AppError::new(2, format!("Worksheet in '{}' is empty.", path.display())))?
        .iter()
        .map(|c| c.to_string())
        .collect();

    let rows = rows_iter
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();

    Ok(RawSheet { header, rows })
}

fn workbook_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Int(v) => RawCell::Number(*v as f64),
        Data::Float(v) => RawCell::Number(*v),
        Data::String(s) => {
            if s.trim().is_empty() {
                RawCell::Empty
            } else {
                RawCell::Text(s.clone())
            }
        }
        Data::Empty => RawCell::Empty,
        _ => RawCell::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        Column::ALL.iter().map(|c| c.name().to_string()).collect()
    }

    fn numeric_row(base: f64) -> Vec<RawCell> {
        (0..COLUMN_COUNT).map(|i| RawCell::Number(base + i as f64)).collect()
    }

    fn units_row() -> Vec<RawCell> {
        Column::ALL.iter().map(|c| RawCell::Text(c.unit().to_string())).collect()
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce_cell(&RawCell::Number(1.5)), Some(1.5));
        assert_eq!(coerce_cell(&RawCell::Text(" 2.25 ".into())), Some(2.25));
        assert_eq!(coerce_cell(&RawCell::Text("n/a".into())), None);
        assert_eq!(coerce_cell(&RawCell::Text("NaN".into())), None);
        assert_eq!(coerce_cell(&RawCell::Number(f64::INFINITY)), None);
        assert_eq!(coerce_cell(&RawCell::Other), None);
        assert_eq!(coerce_cell(&RawCell::Empty), None);
    }

    #[test]
    fn units_row_is_discarded() {
        let raw = RawSheet {
            header: header(),
            rows: vec![units_row(), numeric_row(1.0), numeric_row(2.0)],
        };
        let data = clean_sheet(raw).unwrap();
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.table.len(), 2);
        assert_eq!(data.units[Column::PowerLevel.index()], "%");
        assert_eq!(data.table.rows()[0].get(Column::PowerLevel), Some(1.0));
        assert_eq!(data.table.rows()[1].get(Column::Voltage), Some(3.0));
        assert_eq!(data.coerced_cells, 0);
    }

    #[test]
    fn bad_cells_become_missing_and_are_counted() {
        let mut bad = numeric_row(1.0);
        bad[Column::CurrentDensity.index()] = RawCell::Text("#DIV/0!".into());
        bad[Column::VoltageCell.index()] = RawCell::Other;
        bad[Column::Pressure.index()] = RawCell::Empty;
        let raw = RawSheet {
            header: header(),
            rows: vec![units_row(), bad, numeric_row(5.0)],
        };

        let original_rows = 3;
        let data = clean_sheet(raw).unwrap();
        assert!(data.table.len() <= original_rows - 1);
        assert_eq!(data.coerced_cells, 2);

        let row = &data.table.rows()[0];
        assert_eq!(row.get(Column::CurrentDensity), None);
        assert_eq!(row.get(Column::VoltageCell), None);
        assert_eq!(row.get(Column::Pressure), None);

        // Every row kept for the fit is complete in the columns it needs.
        let cols = [Column::PowerLevel, Column::CurrentDensity];
        let kept: Vec<_> = data.table.complete_rows(&cols).collect();
        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|r| r.is_complete(&cols)));
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let raw = RawSheet {
            header: header(),
            rows: vec![units_row(), vec![RawCell::Number(50.0)]],
        };
        let data = clean_sheet(raw).unwrap();
        let row = &data.table.rows()[0];
        assert_eq!(row.get(Column::PowerLevel), Some(50.0));
        assert_eq!(row.get(Column::OverallEfficiency), None);
    }

    #[test]
    fn wrong_column_count_is_fatal() {
        let raw = RawSheet {
            header: vec!["a".into(); 19],
            rows: vec![],
        };
        let err = clean_sheet(raw).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_units_row_or_data_is_fatal() {
        let err = clean_sheet(RawSheet { header: header(), rows: vec![] }).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = clean_sheet(RawSheet { header: header(), rows: vec![units_row()] }).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_measurements(Path::new("definitely/not/here/Book1.xlsx")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = load_measurements(Path::new("bench.txt")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn workbook_cells_map_to_raw_cells() {
        use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

        let cases = [
            (Data::Int(7), Some(7.0)),
            (Data::Float(0.72), Some(0.72)),
            (Data::String(" 12.5 ".into()), Some(12.5)),
            (Data::String("   ".into()), None),
            (Data::Bool(true), None),
            (Data::Error(CellErrorType::Div0), None),
            (
                Data::DateTime(ExcelDateTime::new(45000.5, ExcelDateTimeType::DateTime, false)),
                None,
            ),
            (Data::DateTimeIso("2024-05-01T10:00:00".into()), None),
            (Data::Empty, None),
        ];
        for (data, expected) in cases {
            assert_eq!(coerce_cell(&workbook_cell(&data)), expected, "{data:?}");
        }

        // Blank text is a gap, not an unparseable cell.
        assert_eq!(workbook_cell(&Data::String("  ".into())), RawCell::Empty);
        assert_eq!(workbook_cell(&Data::Bool(false)), RawCell::Other);
        assert_eq!(workbook_cell(&Data::Error(CellErrorType::NA)), RawCell::Other);
    }

    #[test]
    fn xlsx_fixture_loads_through_calamine() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/bench_small.xlsx");
        let data = load_measurements(&path).unwrap();

        assert_eq!(data.rows_read, 3);
        assert_eq!(data.units[Column::CurrentDensity.index()], "mA/cm²");
        assert_eq!(data.units[Column::Temperature.index()], "°C");

        let rows = data.table.rows();
        assert_eq!(rows[0].get(Column::PowerLevel), Some(10.0));
        assert_eq!(rows[0].get(Column::OverallEfficiency), Some(29.0));

        // Error and boolean cells are counted; the absent cell is just missing.
        assert_eq!(rows[1].get(Column::Current), None);
        assert_eq!(rows[1].get(Column::SurfaceArea), None);
        assert_eq!(rows[1].get(Column::HydrogenVolumeFlow), None);
        assert_eq!(rows[1].get(Column::Voltage), Some(21.0));
        assert_eq!(data.coerced_cells, 2);

        // Numeric text stored as a shared string is parsed.
        assert_eq!(rows[2].get(Column::CurrentDensity), Some(42.5));
        assert_eq!(rows[2].get(Column::PowerLevel), Some(30.5));
    }

    #[test]
    fn csv_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("elx_ingest_{}.csv", std::process::id()));
        let mut text = header().join(",");
        text.push('\n');
        text.push_str(&Column::ALL.iter().map(|c| c.unit()).collect::<Vec<_>>().join(","));
        text.push('\n');
        let row: Vec<String> = (0..COLUMN_COUNT).map(|i| format!("{}", i as f64 * 0.5)).collect();
        text.push_str(&row.join(","));
        text.push('\n');
        text.push_str("10,oops\n");
        std::fs::write(&path, text).unwrap();

        let data = load_measurements(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(data.rows_read, 2);
        assert_eq!(data.table.rows()[0].get(Column::Current), Some(1.0));
        assert_eq!(data.table.rows()[1].get(Column::PowerLevel), Some(10.0));
        assert_eq!(data.table.rows()[1].get(Column::Voltage), None);
        assert_eq!(data.coerced_cells, 1);
    }
}
