//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments into config structs
//! - runs the batch, efficiency and Tafel pipelines
//! - prints reports and previews

use clap::Parser;
use env_logger::Env;

use crate::cli::{
    Command, EfficiencyArgs, PlotArgs, SampleArgs, ShowArgs, SliderArgs, SmoothingArgs, TafelArgs,
};
use crate::domain::{
    BatchConfig, DEFAULT_PAIRS, EfficiencyConfig, SampleConfig, SmoothingConfig, TafelConfig,
    TafelWindow,
};
use crate::error::AppError;
use crate::report::format::{
    format_batch_summary, format_ingest_summary, format_readings, format_tafel_report,
};

pub mod pipeline;

/// Entry point for the `elx` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry RUST_LOG.
    dotenvy::dotenv().ok();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn")).try_init();

    // `elx` and `elx -i book.xlsx` behave like `elx plot ...`. Clap needs a
    // subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Plot(args) => handle_plot(args),
        Command::Slider(args) => handle_slider(args),
        Command::Efficiency(args) => handle_efficiency(args),
        Command::Tafel(args) => handle_tafel(args),
        Command::Show(args) => handle_show(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let config = batch_config_from_args(&args)?;
    let run = pipeline::run_batch(&config)?;

    println!("{}", format_ingest_summary(&run.ingest));
    println!("{}", format_batch_summary(&run.fits, config.smoothing.degree, &config.out_dir));

    if config.preview {
        for fit in &run.fits.fitted {
            let plot = crate::plot::render_pair_preview(
                fit,
                config.smoothing.grid_points,
                config.preview_width,
                config.preview_height,
            );
            println!("{plot}");
        }
    }

    println!("Wrote {} chart(s).", run.written.len());
    if let Some(path) = &config.export_curves {
        println!("Wrote curves to {}.", path.display());
    }
    Ok(())
}

fn handle_slider(args: SliderArgs) -> Result<(), AppError> {
    let config = efficiency_config_from_slider_args(&args)?;
    let (_ingest, fits) = pipeline::fit_efficiency(&config)?;

    let committed = crate::tui::run(fits.clone(), config.step, config.smoothing.grid_points)?;
    print!("{}", format_readings(&fits.readings_at(committed)));
    Ok(())
}

fn handle_efficiency(args: EfficiencyArgs) -> Result<(), AppError> {
    let config = efficiency_config_from_args(&args)?;
    let run = pipeline::run_efficiency_snapshot(&config)?;

    println!("{}", format_ingest_summary(&run.ingest));
    print!("{}", format_readings(&run.readings));
    println!("Wrote {}.", run.written.display());
    Ok(())
}

fn handle_tafel(args: TafelArgs) -> Result<(), AppError> {
    let config = tafel_config_from_args(&args)?;
    let run = pipeline::run_tafel(&config)?;

    println!("{}", format_ingest_summary(&run.ingest));
    println!("{}", format_tafel_report(&run.analysis));

    if config.preview {
        let plot = crate::plot::render_tafel_preview(
            &run.analysis,
            config.line_points,
            config.preview_width,
            config.preview_height,
        );
        println!("{plot}");
    }

    println!("Wrote {}.", run.written.display());
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::curve::read_curves_json(&args.curves)?;

    println!(
        "{} curve(s) from {} (degree {}, generated {})",
        file.curves.len(),
        file.source,
        file.degree,
        file.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for record in &file.curves {
        let plot = crate::plot::render_curve_record_preview(record, args.width, args.height);
        println!("{plot}");
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        out: args.out,
        rows: args.rows,
        seed: args.seed,
        noise: args.noise,
        gap_prob: args.gap_prob,
    };
    let table = crate::data::sample::generate_bench_table(&config)?;
    crate::data::sample::write_table_csv(&config.out, &table)?;

    println!("Wrote {} rows to {}.", table.len(), config.out.display());
    Ok(())
}

fn smoothing_from_args(args: &SmoothingArgs) -> Result<SmoothingConfig, AppError> {
    if args.grid_points < 2 {
        return Err(AppError::new(2, "--grid-points must be >= 2."));
    }
    Ok(SmoothingConfig {
        degree: args.degree,
        grid_points: args.grid_points,
    })
}

fn check_step(step: f64) -> Result<f64, AppError> {
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(AppError::new(2, "--step must be a positive number."))
    }
}

pub fn batch_config_from_args(args: &PlotArgs) -> Result<BatchConfig, AppError> {
    Ok(BatchConfig {
        input: args.input.input.clone(),
        out_dir: args.out_dir.clone(),
        smoothing: smoothing_from_args(&args.smoothing)?,
        row_policy: args.rows,
        pairs: DEFAULT_PAIRS.to_vec(),
        image_size: (args.image_width, args.image_height),
        preview: args.preview,
        preview_width: args.width,
        preview_height: args.height,
        export_curves: args.export_curves.clone(),
    })
}

pub fn efficiency_config_from_slider_args(args: &SliderArgs) -> Result<EfficiencyConfig, AppError> {
    Ok(EfficiencyConfig {
        input: args.input.input.clone(),
        smoothing: smoothing_from_args(&args.smoothing)?,
        step: check_step(args.step)?,
        ..EfficiencyConfig::default()
    })
}

pub fn efficiency_config_from_args(args: &EfficiencyArgs) -> Result<EfficiencyConfig, AppError> {
    Ok(EfficiencyConfig {
        input: args.input.input.clone(),
        smoothing: smoothing_from_args(&args.smoothing)?,
        step: check_step(args.step)?,
        at: args.at,
        out_file: args.out.clone(),
        image_size: (args.image_width, args.image_height),
    })
}

pub fn tafel_config_from_args(args: &TafelArgs) -> Result<TafelConfig, AppError> {
    let window = TafelWindow {
        lo: args.window_lo,
        hi: args.window_hi,
    };
    if !(window.lo.is_finite() && window.hi.is_finite() && window.lo < window.hi) {
        return Err(AppError::new(
            2,
            format!(
                "Invalid Tafel window [{}, {}): lower bound must be below upper bound.",
                window.lo, window.hi
            ),
        ));
    }
    if args.grid_points < 2 || args.line_points < 2 {
        return Err(AppError::new(2, "--grid-points and --line-points must be >= 2."));
    }

    Ok(TafelConfig {
        input: args.input.input.clone(),
        standard_potential_v: args.e0,
        window,
        grid_points: args.grid_points,
        line_points: args.line_points,
        out_file: args.out.clone(),
        image_size: (args.image_width, args.image_height),
        preview: args.preview,
        preview_width: args.width,
        preview_height: args.height,
    })
}

/// Rewrite argv so `elx` defaults to `elx plot`.
///
/// Rules:
/// - `elx`                      -> `elx plot`
/// - `elx -i book.xlsx ...`     -> `elx plot -i book.xlsx ...`
/// - `elx --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("plot".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    // Subcommands, and anything else that is not a flag, are left to clap.
    if arg1.starts_with('-') {
        argv.insert(1, "plot".to_string());
    }
    argv
}
