//! molecule-layout: layout and contact packing for molecule footprints
//!
//! Computes board geometry, pins and usable margins from molecule spec files,
//! packs contacts into the margins, and serves the same operations over MCP.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use molecule_layout::batch;
use molecule_layout::config::{self, Config};
use molecule_layout::error::{ExportError, SpecFileError};
use molecule_layout::export;
use molecule_layout::mcp::server::{McpServer, ToolDefaults};
use molecule_layout::molecule::{
    default_fill_kinds, fill_margins, place_contacts, Alignment, ContactPosition, LayoutCalculator,
    LayoutError, LayoutResult, MarginKind, PackError, PinType, SizeClass,
};

/// Layout and contact packing for molecule footprints.
#[derive(Parser, Debug)]
#[command(name = "molecule-layout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate layouts for one or more spec files
    Layout {
        /// Spec files or glob patterns
        #[arg(value_name = "SPEC_OR_GLOB", required = true)]
        specs: Vec<String>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Fill margins to capacity with auto-named contacts
    Fill {
        /// Spec file
        spec: PathBuf,

        /// Margin to fill (repeatable; defaults depend on the molecule type)
        #[arg(short, long = "margin", value_name = "KIND")]
        margins: Vec<MarginKind>,

        /// Contact size class
        #[arg(short, long)]
        size: Option<SizeClass>,

        /// Alignment along each margin
        #[arg(short, long)]
        alignment: Option<Alignment>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Place named contacts from a JSON request file
    Place {
        /// Spec file
        spec: PathBuf,

        /// JSON array of contact requests
        contacts: PathBuf,

        /// Alignment along each margin
        #[arg(short, long)]
        alignment: Option<Alignment>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List the supported pin types
    PinTypes,

    /// Run the MCP server on stdio
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    fn resolve(flag: Option<Self>, cfg: &Config) -> Self {
        flag.unwrap_or_else(|| {
            if cfg.output.format.eq_ignore_ascii_case("csv") {
                Self::Csv
            } else {
                Self::Json
            }
        })
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    File(#[from] SpecFileError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to serialise output")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} spec files failed")]
    Batch { failed: usize, total: usize },

    #[error("no spec files matched")]
    NoInput,

    #[error("server error")]
    Server(#[source] std::io::Error),
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[derive(Serialize)]
struct PackedLayout<'a> {
    layout: &'a LayoutResult,
    contacts: &'a [ContactPosition],
}

fn layout_csv(layout: &LayoutResult) -> Result<String, ExportError> {
    Ok(format!(
        "{}\n{}",
        export::pins_csv(&layout.pins)?,
        export::margins_csv(&layout.margins)?
    ))
}

fn render_packed(
    layout: &LayoutResult,
    contacts: &[ContactPosition],
    format: OutputFormat,
    cfg: &Config,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => to_json(&PackedLayout { layout, contacts }, cfg.output.pretty)?,
        OutputFormat::Csv => export::contacts_csv(contacts)?,
    })
}

fn run_layout(specs: &[String], format: OutputFormat, cfg: &Config) -> Result<(), CliError> {
    let results = batch::layout_files(specs)?;
    if results.is_empty() {
        return Err(CliError::NoInput);
    }

    let total = results.len();
    let mut failed = 0;
    let mut layouts = Vec::new();

    for (path, result) in results {
        match result {
            Ok(layout) => layouts.push((path, layout)),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Layout failed");
                failed += 1;
            }
        }
    }

    match format {
        OutputFormat::Json if total == 1 => {
            if let Some((_, layout)) = layouts.first() {
                println!("{}", to_json(layout, cfg.output.pretty)?);
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = layouts
                .iter()
                .map(|(path, layout)| serde_json::json!({ "file": path, "layout": layout }))
                .collect();
            println!("{}", to_json(&entries, cfg.output.pretty)?);
        }
        OutputFormat::Csv => {
            for (path, layout) in &layouts {
                println!("# {}", path.display());
                println!("{}", layout_csv(layout)?);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Batch { failed, total });
    }
    Ok(())
}

fn run_fill(
    spec: &Path,
    margins: &[MarginKind],
    size: Option<SizeClass>,
    alignment: Option<Alignment>,
    format: OutputFormat,
    cfg: &Config,
) -> Result<(), CliError> {
    let molecule = batch::load_spec(spec)?.resolve()?;
    let layout = LayoutCalculator::new().layout(&molecule);

    let kinds = if margins.is_empty() {
        default_fill_kinds(molecule.molecule_type)
    } else {
        margins.to_vec()
    };

    let contacts = fill_margins(
        &layout.margins,
        &kinds,
        size.unwrap_or_else(|| cfg.packing.size_class()),
        Some(alignment.unwrap_or_else(|| cfg.packing.alignment())),
    );

    println!("{}", render_packed(&layout, &contacts, format, cfg)?);
    Ok(())
}

fn run_place(
    spec: &Path,
    contacts: &Path,
    alignment: Option<Alignment>,
    format: OutputFormat,
    cfg: &Config,
) -> Result<(), CliError> {
    let layout = LayoutCalculator::new().calculate(&batch::load_spec(spec)?)?;
    let requests = batch::load_contacts(contacts)?;

    let placed = place_contacts(
        &layout.margins,
        &requests,
        alignment.unwrap_or_else(|| cfg.packing.alignment()),
        None,
    )?;

    println!("{}", render_packed(&layout, &placed, format, cfg)?);
    Ok(())
}

fn run_pin_types() {
    println!("{:<16} {:>9}  {:<6}  length", "pin type", "offset", "size");
    for pin_type in PinType::ALL {
        let spec = pin_type.spec();
        println!(
            "{:<16} {:>6} mm  {:<6}  {}",
            pin_type.as_str(),
            spec.offset_mm,
            spec.size_class.as_str(),
            spec.length.as_str(),
        );
    }
}

fn run_serve(cfg: &Config) -> Result<(), CliError> {
    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "molecule-layout {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!();

    let defaults = ToolDefaults::from(&cfg.packing);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        alignment = %defaults.alignment,
        size_class = %defaults.size_class,
        "Starting molecule-layout MCP server"
    );

    let mut server = McpServer::new(defaults);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Server)?;

    runtime.block_on(server.run()).map_err(CliError::Server)?;
    info!("Server shut down gracefully");
    Ok(())
}

/// Entry point for the molecule-layout CLI.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config_or_default(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if let Some(path) = config_path
                .map(Path::to_path_buf)
                .or_else(config::default_config_path)
            {
                eprintln!("\nConfig file: {}", path.display());
            }
            return ExitCode::FAILURE;
        }
    };

    init_tracing(get_log_level(args.verbose, args.quiet, &cfg.logging.level));

    let result = match args.command {
        Command::Layout { specs, format } => {
            run_layout(&specs, OutputFormat::resolve(format, &cfg), &cfg)
        }
        Command::Fill {
            spec,
            margins,
            size,
            alignment,
            format,
        } => run_fill(
            &spec,
            &margins,
            size,
            alignment,
            OutputFormat::resolve(format, &cfg),
            &cfg,
        ),
        Command::Place {
            spec,
            contacts,
            alignment,
            format,
        } => run_place(
            &spec,
            &contacts,
            alignment,
            OutputFormat::resolve(format, &cfg),
            &cfg,
        ),
        Command::PinTypes => {
            run_pin_types();
            Ok(())
        }
        Command::Serve => run_serve(&cfg),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            if let Some(source) = std::error::Error::source(&e) {
                error!(cause = %source, "Caused by");
            }
            ExitCode::FAILURE
        }
    }
}
