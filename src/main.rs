mod config;
mod convert;
mod data;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::error;

use config::{ConvertConfig, Layout};

#[derive(Parser)]
#[command(name = "rusty-vcg")]
#[command(about = "Convert numbered VCG text recordings into .npy arrays", long_about = None)]
struct Cli {
    /// Defaults to `convert` with the built-in settings
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read all recordings and write vcg_length.npy and vcg.npy
    Convert(ConvertArgs),

    /// Read the outputs back and summarise their shapes
    Inspect {
        /// Directory holding vcg_length.npy and vcg.npy
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Fill value the padded vcg.npy was written with
        #[arg(long, default_value_t = f64::NAN, allow_negative_numbers = true)]
        pad_value: f64,
    },
}

#[derive(Args, Default)]
struct ConvertArgs {
    /// JSON settings file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of input files
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// File name template with a `{}` index placeholder
    #[arg(short, long)]
    template: Option<String>,

    /// Zero-padding width of the index
    #[arg(long)]
    pad_width: Option<usize>,

    /// Single-character field delimiter
    #[arg(short, long)]
    delimiter: Option<char>,

    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Storage layout of vcg.npy
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Fill value for the padded layout
    #[arg(long, allow_negative_numbers = true)]
    pad_value: Option<f64>,
}

impl ConvertArgs {
    fn into_config(self) -> Result<ConvertConfig> {
        let mut cfg = match &self.config {
            Some(path) => ConvertConfig::from_json_file(path)?,
            None => ConvertConfig::default(),
        };
        if let Some(v) = self.count {
            cfg.count = v;
        }
        if let Some(v) = self.template {
            cfg.template = v;
        }
        if let Some(v) = self.pad_width {
            cfg.pad_width = v;
        }
        if let Some(v) = self.delimiter {
            cfg.delimiter = v;
        }
        if let Some(v) = self.input_dir {
            cfg.input_dir = v;
        }
        if let Some(v) = self.output_dir {
            cfg.output_dir = v;
        }
        if let Some(v) = self.layout {
            cfg.layout = v;
        }
        if let Some(v) = self.pad_value {
            cfg.pad_value = v;
        }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or_else(|| Commands::Convert(ConvertArgs::default())) {
        Commands::Convert(args) => {
            let cfg = args.into_config()?;
            convert::convert(&cfg).context("conversion failed")?;
        }
        Commands::Inspect {
            output_dir,
            pad_value,
        } => {
            let report = convert::inspect(&output_dir, pad_value)
                .with_context(|| format!("inspecting {}", output_dir.display()))?;
            println!(
                "{} recordings x {} leads, {} samples (rows per recording: {}..={})",
                report.recordings,
                report.columns,
                report.total_rows,
                report.min_rows,
                report.max_rows
            );
        }
    }
    Ok(())
}
