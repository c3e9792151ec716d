//! Command-line driver for the type-model generator.
//!
//! Reads one or more FHIR definition bundles, runs the reader and the
//! code generator over each, and writes a single Python source artifact.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use argon_codegen::generators::python::preamble;
use argon_codegen::generators::GeneratorConfig;
use argon_codegen::generate_python_from_bundle;

/// Generate typed data models from FHIR resource definitions
#[derive(Parser, Debug)]
#[command(name = "argon", version, about)]
struct Args {
    /// File path to read StructureDefinition resources from
    /// (repeat to read multiple files)
    #[arg(long = "from-bundle", required = true, value_name = "PATH")]
    from_bundles: Vec<PathBuf>,

    /// File path to write the generated data models to
    #[arg(long, value_name = "PATH")]
    outfile: PathBuf,

    /// Python path of the base model class generated models extend
    #[arg(long, default_value = "pydantic.BaseModel", value_name = "MODULE.CLASS")]
    base_model: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = GeneratorConfig {
        base_model: args.base_model.clone(),
        ..GeneratorConfig::default()
    };

    // Read every bundle before writing anything: a structural failure in any
    // of them aborts the run with no partial artifact on disk.
    let mut bodies = Vec::with_capacity(args.from_bundles.len());
    for bundle_path in &args.from_bundles {
        let body = generate_python_from_bundle(bundle_path, config.clone())
            .with_context(|| format!("generating models from {}", bundle_path.display()))?;
        bodies.push(body);
    }

    let artifact = format!("{}{}", preamble(&args.base_model)?, bodies.join("\n\n"));
    fs::write(&args.outfile, artifact)
        .with_context(|| format!("writing {}", args.outfile.display()))?;

    Ok(())
}
