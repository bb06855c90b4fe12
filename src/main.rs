//! simtrace - Main Entry Point
//!
//! Command line front end for decoding ROSS/CODES trace files, inspecting
//! them, and listing the files of a data directory.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use simtrace_rs::{
    catalog::{DataCatalog, DataCategory},
    config::{default_config_path, AppConfig},
    decoders::{open_decoder, DecoderKind, EngineCollection, EngineStatsFile, TraceDecoder},
    export::{self, ExportFormat},
    frame::Frame,
    window::TimeVariable,
};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "simtrace", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding simulations/, events/ and models/
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a trace and export its table
    Decode {
        /// Trace format: event, model or engine
        kind: DecoderKind,
        /// Trace file; a relative name not found on disk is looked up in the data directory
        file: PathBuf,
        /// Time column to window over
        #[arg(long)]
        time_variable: Option<String>,
        /// Visible time range
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
        range: Option<Vec<f64>>,
        /// Engine statistics collection (pe, kp or lp)
        #[arg(long)]
        collection: Option<EngineCollection>,
        /// Output format: csv, json or jsonl
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Export every decoded row, ignoring the time window
        #[arg(long)]
        full: bool,
    },
    /// Summarize a trace
    Info {
        kind: DecoderKind,
        file: PathBuf,
    },
    /// List data files per category
    Files {
        #[arg(long)]
        category: Option<DataCategory>,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => default_config_path()
            .map(AppConfig::load_or_default)
            .unwrap_or_default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data.data_dir = dir.clone();
    }
    Ok(config)
}

/// Install the global subscriber; the guard must live until exit
fn start_logging(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("Invalid log filter")?;

    let (file_layer, guard) = match &config.logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "simtrace.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Use `file` as given if it exists, else look it up in the catalog
fn resolve_input(catalog: &DataCatalog, kind: DecoderKind, file: &Path) -> Result<PathBuf> {
    if file.exists() || file.is_absolute() {
        return Ok(file.to_path_buf());
    }
    let name = file
        .to_str()
        .with_context(|| format!("Non UTF-8 file name {:?}", file))?;
    Ok(catalog.resolve(DataCategory::from(kind), name)?)
}

fn default_time_variable(config: &AppConfig, kind: DecoderKind) -> TimeVariable {
    match kind {
        DecoderKind::Event => config.decode.event_time_variable,
        DecoderKind::Model => config.decode.model_time_variable,
        DecoderKind::Engine => config.decode.engine_time_variable,
    }
}

/// Decode and apply the requested time variable and range
fn prepare(
    decoder: &mut dyn TraceDecoder,
    time_variable: &str,
    range: Option<&[f64]>,
) -> Result<()> {
    decoder.read();
    if decoder.time_variable().column_name() != time_variable {
        decoder.select_time_variable(time_variable)?;
    }
    if let Some([min, max]) = range {
        decoder.set_time_range(*min, *max);
    }
    let window = decoder.window();
    tracing::info!(
        "{}: {} rows, window over {} = {:?}..{:?}",
        decoder.name(),
        decoder.frame().len(),
        window.variable(),
        window.min_time(),
        window.max_time()
    );
    Ok(())
}

fn write_output(frame: &Frame, file: &str, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => export::export_to_path(frame, file, format, path)?,
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            export::write_frame(frame, file, format, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _guard = start_logging(&config)?;
    let mut catalog = DataCatalog::from_config(config.data.clone());
    let byte_order = config.decode.byte_order.resolve();

    match cli.command {
        Command::Decode {
            kind,
            file,
            time_variable,
            range,
            collection,
            format,
            output,
            full,
        } => {
            let path = resolve_input(&catalog, kind, &file)?;
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let variable = time_variable
                .unwrap_or_else(|| default_time_variable(&config, kind).column_name().to_string());

            let frame = match (kind, collection) {
                (DecoderKind::Engine, Some(collection)) => {
                    let content = std::fs::read(&path)
                        .with_context(|| format!("Failed to read {:?}", path))?;
                    let mut stats = match byte_order {
                        Some(order) => EngineStatsFile::with_byte_order(content, order)?,
                        None => EngineStatsFile::from_bytes(content)?,
                    };
                    prepare(&mut stats, &variable, range.as_deref())?;
                    if full {
                        stats.collection(collection).clone()
                    } else {
                        stats.windowed_collection(collection)
                    }
                }
                (_, Some(_)) => bail!("--collection only applies to engine statistics"),
                (_, None) => {
                    let mut decoder = open_decoder(kind, &path, byte_order)?;
                    prepare(decoder.as_mut(), &variable, range.as_deref())?;
                    if full {
                        decoder.frame().clone()
                    } else {
                        decoder.windowed()
                    }
                }
            };

            write_output(&frame, &label, format, output.as_deref())?;
        }
        Command::Info { kind, file } => {
            let path = resolve_input(&catalog, kind, &file)?;
            let mut decoder = open_decoder(kind, &path, byte_order)?;
            decoder.read();

            let frame = decoder.frame();
            println!("file:          {}", path.display());
            println!("format:        {}", decoder.name());
            println!("byte order:    {}", decoder.byte_order());
            println!("rows:          {}", frame.len());
            println!("columns:       {}", frame.columns().join(", "));
            let choices: Vec<String> = decoder
                .table()
                .time_choices()
                .iter()
                .map(|v| v.to_string())
                .collect();
            println!("time variable: {} (choices: {})", decoder.time_variable(), choices.join(", "));
            match (decoder.min_time(), decoder.max_time()) {
                (Some(min), Some(max)) => println!("time range:    {} .. {}", min, max),
                _ => println!("time range:    (empty)"),
            }
        }
        Command::Files { category } => {
            let categories = match category {
                Some(c) => vec![c],
                None => DataCategory::ALL.to_vec(),
            };
            println!("data directory: {}", catalog.data_dir().display());
            for category in categories {
                let files = catalog.list_files(category)?;
                let selected = catalog.select(category, None)?;
                println!("{}:", category);
                if files.is_empty() {
                    println!("  (none)");
                }
                for name in files {
                    let marker = if selected.as_deref() == Some(name.as_str()) { "*" } else { " " };
                    println!(" {} {}", marker, name);
                }
            }
        }
    }

    Ok(())
}
