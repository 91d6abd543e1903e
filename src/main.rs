//! corocheck - static verification of cooperative-scheduling discipline
//!
//! # Usage
//!
//! ```bash
//! # Verify one or more resolved units
//! corocheck check drive.json vision.json
//!
//! # Override the marker names the verifiers match on
//! corocheck check --markers markers.json drive.json
//!
//! # Inspect a unit fixture
//! corocheck dump drive.json
//! ```
//!
//! Units are resolved trees serialized to JSON by the host compiler. A
//! fixture may carry the original source text in a `source` field so that
//! diagnostics render with snippets and caret underlines.

use clap::{Parser, Subcommand};
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use diagnostics::{Diagnostics, ErrorFormatter};
use source_map::SourceMap;
use verifier::sem::CompilationUnit;
use verifier::{AnalysisDriver, MarkerConfig};

#[derive(Parser)]
#[command(name = "corocheck")]
#[command(version = "0.1.0")]
#[command(about = "Static verification of cooperative-scheduling discipline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify resolved units and print diagnostics
    Check {
        /// JSON unit fixtures, verified in argument order
        units: Vec<PathBuf>,

        /// Marker configuration file; built-in names apply when omitted
        #[arg(long)]
        markers: Option<PathBuf>,

        /// Colorize diagnostic output
        #[arg(long)]
        color: bool,
    },

    /// Print a summary of a unit fixture
    Dump {
        /// JSON unit fixture
        unit: PathBuf,
    },
}

/// One serialized unit, with the source text riding along when available
#[derive(Deserialize)]
struct UnitFixture {
    #[serde(flatten)]
    unit: CompilationUnit,
    #[serde(default)]
    source: Option<String>,
}

fn main() {
    verifier::logging::init_from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            units,
            markers,
            color,
        } => check_units(&units, markers.as_deref(), color),
        Commands::Dump { unit } => dump_unit(&unit),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_fixture(path: &Path) -> Result<UnitFixture, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
}

fn load_markers(path: Option<&Path>) -> Result<MarkerConfig, String> {
    let Some(path) = path else {
        return Ok(MarkerConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
}

fn check_units(paths: &[PathBuf], markers: Option<&Path>, color: bool) -> Result<(), String> {
    if paths.is_empty() {
        return Err("no units to check".to_string());
    }

    let mut driver = AnalysisDriver::new(load_markers(markers)?);
    let mut diags = Diagnostics::new();
    let mut sources = SourceMap::new();

    for path in paths {
        let fixture = load_fixture(path)?;
        let file_id = sources.add_file(&fixture.unit.name, fixture.source.unwrap_or_default());
        if file_id.as_u32() != fixture.unit.file_id {
            warn!(
                "{}: unit file id {} does not match registration order, snippets may not align",
                path.display(),
                fixture.unit.file_id
            );
        }
        driver.semantic_analysis_complete(&fixture.unit, &mut diags);
    }

    let formatter = if color {
        ErrorFormatter::with_colors()
    } else {
        ErrorFormatter::new()
    };
    print!("{}", formatter.format_all(&diags, &sources));

    if diags.has_errors() {
        eprintln!(
            "verification failed with {} error(s) in {} unit(s)",
            diags.error_count(),
            paths.len()
        );
        process::exit(1);
    }
    println!("{} unit(s) verified", paths.len());
    Ok(())
}

fn dump_unit(path: &Path) -> Result<(), String> {
    let fixture = load_fixture(path)?;
    let unit = &fixture.unit;

    println!("unit {} ({})", unit.name, unit.id);
    println!("  classes:   {}", unit.classes.len());
    for class in &unit.classes {
        println!(
            "    {} ({} field(s), {} method(s))",
            class.name,
            class.fields.len(),
            class.methods.len()
        );
    }
    println!("  functions: {}", unit.all_functions().count());
    for function in unit.all_functions() {
        println!(
            "    {} ({} parameter(s), {} statement(s))",
            function.name,
            function.parameters.len(),
            function.body.len()
        );
    }
    println!("  symbols:   {}", unit.symbols.len());
    println!("  types:     {}", unit.types.len());
    println!(
        "  source:    {}",
        if fixture.source.is_some() {
            "embedded"
        } else {
            "absent"
        }
    );
    Ok(())
}
