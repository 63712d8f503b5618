//! FTP Engine CLI
//!
//! Loads `outstanding.csv`, `profiles.csv` and `rates.csv` from a directory,
//! runs one computation and writes the seven result matrices.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use ftp_engine::{Computation, EngineConfig, FtpInputs, FtpOutputs, Matrix, Method, RateBlending};

/// Funds transfer pricing matrices from CSV inputs
#[derive(Parser, Debug)]
#[command(name = "ftp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding outstanding.csv, profiles.csv and rates.csv
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Variable-stock method (stock, flux)
    #[arg(short, long, env = "FTP_METHOD", default_value = "stock")]
    method: Method,

    /// Remaining-life rate blending (simple, compounded)
    #[arg(short, long, env = "FTP_BLENDING", default_value = "simple")]
    blending: RateBlending,

    /// Periods per year used to de-annualize ftp_int
    #[arg(short, long, env = "FTP_PERIODS_PER_YEAR", default_value_t = ftp_engine::engine::DEFAULT_PERIODS_PER_YEAR)]
    periods_per_year: u32,

    /// Write one <name>.csv per output here (defaults to the input directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print all outputs as JSON on stdout instead of writing CSV files
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    method: Method,
    rows: usize,
    cols: usize,
    #[serde(flatten)]
    outputs: &'a FtpOutputs,
}

fn write_matrix_csv(path: &Path, matrix: &Matrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for i in 0..matrix.rows() {
        writer.write_record(matrix.row(i).iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let inputs = FtpInputs::from_csv_dir(&cli.input_dir)
        .with_context(|| format!("loading inputs from {}", cli.input_dir.display()))?;

    let config = EngineConfig {
        blending: cli.blending,
        periods_per_year: cli.periods_per_year,
    };
    let mut calc = Computation::from_inputs(inputs)
        .context("validating input dimensions")?
        .with_config(config);
    calc.compute(cli.method)
        .with_context(|| format!("running {} method", cli.method))?;

    let outputs = calc.outputs()?;
    let (rows, cols) = outputs.dims();

    if cli.json {
        let report = JsonReport {
            method: cli.method,
            rows,
            cols,
            outputs,
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &report)?;
        writeln!(handle)?;
        return Ok(());
    }

    let out_dir = cli.output_dir.unwrap_or_else(|| cli.input_dir.clone());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    for (kind, matrix) in outputs.iter() {
        let path = out_dir.join(format!("{}.csv", kind.name()));
        write_matrix_csv(&path, matrix)?;
    }

    println!(
        "{} method: {rows} positions x {cols} periods written to {}",
        cli.method,
        out_dir.display()
    );
    Ok(())
}
