//! NTv2 command-line tool.
//!
//! Inspects grid shift files and shifts coordinates between their datums.

mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ntv2_grid::{GridShift, GridShiftFile, LoadOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use report::{describe_file, ShiftReport};

#[derive(Parser, Debug)]
#[command(name = "ntv2")]
#[command(about = "Inspect NTv2 grid shift files and shift coordinates between datums")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the overview header and the sub-grid tree
    Info {
        /// Grid shift file (.gsb)
        file: PathBuf,
    },

    /// Shift a coordinate given in decimal degrees
    Shift {
        /// Grid shift file (.gsb)
        file: PathBuf,

        /// Latitude in decimal degrees (positive north)
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees (positive east)
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Shift from the target datum back to the source datum
        #[arg(long)]
        reverse: bool,

        /// Read node records on demand instead of loading them
        #[arg(long)]
        lazy: bool,

        /// Skip accuracy values when loading into memory
        #[arg(long)]
        no_accuracy: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Info { file } => {
            let grid = open(&file, LoadOptions::file_backed())?;
            print!("{}", describe_file(&grid));
        }
        Command::Shift {
            file,
            lat,
            lon,
            reverse,
            lazy,
            no_accuracy,
            json,
        } => {
            let options = if lazy {
                LoadOptions::file_backed()
            } else {
                LoadOptions::default()
            }
            .with_accuracy(!no_accuracy);
            let grid = open(&file, options)?;

            let mut shift = GridShift::from_degrees(lat, lon);
            let covered = if reverse {
                grid.shift_reverse(&mut shift)?
            } else {
                grid.shift_forward(&mut shift)?
            };
            if !covered {
                bail!(
                    "coordinate ({}, {}) is outside the coverage of {}",
                    lat,
                    lon,
                    file.display()
                );
            }

            let report = ShiftReport::new(&grid, &shift, reverse);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
    }

    Ok(())
}

fn open(path: &Path, options: LoadOptions) -> Result<GridShiftFile> {
    debug!(path = %path.display(), ?options, "Opening grid");
    GridShiftFile::open(path, options)
        .with_context(|| format!("failed to open grid shift file {}", path.display()))
}
