//! Synthetic bench tables.
//!
//! Rows follow a simple single-cell PEM model swept over the power level:
//! Tafel kinetics plus an ohmic term for the cell voltage, a Faraday
//! efficiency that drops at low current density, and hydrogen production
//! from Faraday's law. Measured quantities get multiplicative Gaussian noise;
//! derived columns are computed from the noisy measurements, as a bench
//! logger would.

use std::fs::File;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    COLUMN_COUNT, Column, Measurement, MeasurementTable, STANDARD_POTENTIAL_V, SampleConfig,
};
use crate::error::AppError;

/// Active cell area (cm²).
const SURFACE_AREA_CM2: f64 = 100.0;
/// Stack current at 100 % power level (A).
const RATED_CURRENT_A: f64 = 50.0;
/// Lowest power level of the sweep (%).
const MIN_POWER_LEVEL: f64 = 5.0;
/// Tafel slope of the model cell (mV/decade).
const TAFEL_SLOPE_MV: f64 = 70.0;
/// Area-specific resistance term (mV per mA/cm²).
const OHMIC_MV_PER_MA_CM2: f64 = 0.4;
/// Balance-of-plant draw (W).
const AUXILIARY_POWER_W: f64 = 5.0;

const FARADAY_C_PER_MOL: f64 = 96_485.0;
const H2_MOLAR_MASS_KG: f64 = 2.016e-3;
const H2_MOLAR_VOLUME_M3N: f64 = 0.022_414;
/// Lower heating value of hydrogen (J/kg).
const H2_LHV_J_PER_KG: f64 = 120.0e6;

/// Marker written for dropped readings.
pub const GAP_MARKER: &str = "n/a";

/// Generate a synthetic bench table.
pub fn generate_bench_table(config: &SampleConfig) -> Result<MeasurementTable, AppError> {
    if config.rows < 2 {
        return Err(AppError::new(2, "Sample row count must be >= 2."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Sample noise must be a finite value >= 0."));
    }
    if !(0.0..1.0).contains(&config.gap_prob) {
        return Err(AppError::new(2, "Gap probability must be in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let noisy = |v: f64, rng: &mut StdRng| v * (1.0 + config.noise * normal.sample(rng));

    let mut rows = Vec::with_capacity(config.rows);
    for i in 0..config.rows {
        let u = i as f64 / (config.rows as f64 - 1.0);
        let power_level = MIN_POWER_LEVEL + u * (100.0 - MIN_POWER_LEVEL);

        let ideal_current = RATED_CURRENT_A * power_level / 100.0;
        let ideal_j = ideal_current * 1000.0 / SURFACE_AREA_CM2;
        let ideal_voltage = cell_voltage(ideal_j);

        let current = noisy(ideal_current, &mut rng);
        let voltage = noisy(ideal_voltage, &mut rng);
        let faraday = faraday_efficiency(ideal_j).min(1.0);

        let j = current * 1000.0 / SURFACE_AREA_CM2;
        let mol_flow = noisy(faraday * current / (2.0 * FARADAY_C_PER_MOL), &mut rng);
        let mass_flow = mol_flow * H2_MOLAR_MASS_KG;
        let volume_m3n_h = mol_flow * H2_MOLAR_VOLUME_M3N * 3600.0;
        let power = voltage * current + AUXILIARY_POWER_W;
        let voltage_eff = STANDARD_POTENTIAL_V / voltage;
        let faraday_eff = (mol_flow * 2.0 * FARADAY_C_PER_MOL / current).min(1.0);

        let values = [
            (Column::PowerLevel, power_level),
            (Column::Voltage, voltage),
            (Column::Current, current),
            (Column::SurfaceArea, SURFACE_AREA_CM2),
            (Column::HydrogenVolumeFlow, volume_m3n_h * 1000.0),
            (Column::ValveOutput, 0.8 * power_level),
            (Column::Temperature, noisy(25.0 + 0.35 * power_level, &mut rng)),
            (Column::Pressure, noisy(1.0 + 0.02 * power_level, &mut rng)),
            (Column::VoltageCell, voltage),
            (Column::CurrentDensity, j),
            (Column::CurrentCell, current),
            (Column::RealHydrogenVolumeFlowM3, volume_m3n_h),
            (Column::RealHydrogenVolumeFlowKg, mass_flow * 3600.0),
            (Column::MassFlowKgS, mass_flow),
            (Column::HydrogenMolFlow, mol_flow),
            (Column::VoltageEfficiency, voltage_eff),
            (Column::FaradayEfficiency, faraday_eff),
            (Column::CellEfficiency, voltage_eff * faraday_eff),
            (Column::Power, power),
            (Column::OverallEfficiency, mass_flow * H2_LHV_J_PER_KG / power),
        ];

        let mut m = Measurement::default();
        for (col, v) in values {
            // Power level is the set point and is never dropped.
            let dropped = col != Column::PowerLevel && rng.gen_bool(config.gap_prob);
            m.set(col, if dropped { None } else { Some(v) });
        }
        rows.push(m);
    }

    log::info!("generated {} synthetic rows (seed {})", rows.len(), config.seed);
    Ok(MeasurementTable::new(rows))
}

/// Model cell voltage (V) at current density `j` (mA/cm²).
pub fn cell_voltage(j: f64) -> f64 {
    STANDARD_POTENTIAL_V + (TAFEL_SLOPE_MV * j.max(1e-9).log10() + OHMIC_MV_PER_MA_CM2 * j) / 1000.0
}

/// Model Faraday efficiency at current density `j` (mA/cm²).
pub fn faraday_efficiency(j: f64) -> f64 {
    0.99 - 0.05 * (-j / 80.0).exp()
}

/// Write a table in the bench layout: header row, units row, then values.
pub fn write_table_csv(path: &Path, table: &MeasurementTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err =
        |e: csv::Error| AppError::new(4, format!("Failed to write '{}': {e}", path.display()));

    writer.write_record(Column::ALL.iter().map(|c| c.name())).map_err(write_err)?;
    writer.write_record(Column::ALL.iter().map(|c| c.unit())).map_err(write_err)?;

    for row in table.rows() {
        let record: Vec<String> = Column::ALL
            .iter()
            .map(|&c| match row.get(c) {
                Some(v) => v.to_string(),
                None => GAP_MARKER.to_string(),
            })
            .collect();
        debug_assert_eq!(record.len(), COLUMN_COUNT);
        writer.write_record(&record).map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_TAFEL_WINDOW, TafelConfig};
    use crate::fit::analyze;
    use crate::io::ingest::load_measurements;

    #[test]
    fn same_seed_same_table() {
        let cfg = SampleConfig::default();
        let a = generate_bench_table(&cfg).unwrap();
        let b = generate_bench_table(&cfg).unwrap();
        assert_eq!(a, b);

        let c = generate_bench_table(&SampleConfig { seed: 7, ..cfg }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn sweep_spans_the_power_range() {
        let table = generate_bench_table(&SampleConfig::default()).unwrap();
        let power = table.column(Column::PowerLevel);
        assert_eq!(power.len(), 40);
        assert_eq!(power[0], Some(MIN_POWER_LEVEL));
        assert_eq!(power[39], Some(100.0));
    }

    #[test]
    fn noiseless_model_matches_tafel_slope() {
        let cfg = SampleConfig {
            noise: 0.0,
            ..SampleConfig::default()
        };
        let table = generate_bench_table(&cfg).unwrap();
        let analysis = analyze(&table, &TafelConfig::default());
        let fit = analysis.outcome.fit().unwrap();

        assert_eq!(fit.window, DEFAULT_TAFEL_WINDOW);
        // The ohmic term steepens the apparent slope inside the window.
        assert!(fit.slope() > TAFEL_SLOPE_MV);
        assert!(fit.slope() < 300.0);
        assert!(fit.line.r_squared() > 0.99);
    }

    #[test]
    fn gaps_are_written_and_read_back_as_missing() {
        let cfg = SampleConfig {
            gap_prob: 0.2,
            ..SampleConfig::default()
        };
        let table = generate_bench_table(&cfg).unwrap();
        let missing = table
            .rows()
            .iter()
            .flat_map(|r| Column::ALL.map(|c| r.get(c)))
            .filter(|v| v.is_none())
            .count();
        assert!(missing > 0);

        let path = std::env::temp_dir().join(format!("elx-{}-sample.csv", std::process::id()));
        write_table_csv(&path, &table).unwrap();
        let ingest = load_measurements(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(ingest.rows_read, 40);
        assert_eq!(ingest.coerced_cells, missing);
        assert_eq!(ingest.units[9], "mA/cm²");
        assert_eq!(ingest.table, table);
    }

    #[test]
    fn rejects_bad_settings() {
        let err = generate_bench_table(&SampleConfig {
            rows: 1,
            ..SampleConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(
            generate_bench_table(&SampleConfig {
                gap_prob: 1.0,
                ..SampleConfig::default()
            })
            .is_err()
        );
    }
}
