use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crd_schema_fuzz_core::apiextensions::internal::CustomResourceDefinition;
use crd_schema_fuzz_core::{
    decode_file, fuzz_with, prune_with_options, DynObject, FuzzOptions, Fuzzer, PruneOptions,
    Report, Scheme, Structural, StructuralPruner, UnstructuredObject,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "crd-schema-fuzz")]
#[command(about = "Fuzz a CustomResourceDefinition's structural schema against pruning")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate objects from each version's schema and check pruning leaves them unchanged
    Fuzz {
        /// CustomResourceDefinition file (YAML or JSON)
        crd: PathBuf,

        /// Iterations per version
        #[arg(short = 'n', long)]
        iterations: Option<usize>,

        /// Seed for the random generator (drawn at random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Probability of leaving optional fields and collections empty
        #[arg(long)]
        nil_chance: Option<f64>,

        /// Minimum number of elements in populated collections
        #[arg(long)]
        min_elements: Option<usize>,

        /// Maximum number of elements in populated collections
        #[arg(long)]
        max_elements: Option<usize>,

        /// Nesting depth beyond which values are left empty
        #[arg(long)]
        max_depth: Option<usize>,

        /// Fuzz options file (YAML or JSON); flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Prune an object against one version of a CRD
    Prune {
        /// CustomResourceDefinition file (YAML or JSON)
        crd: PathBuf,

        /// Object file (YAML or JSON)
        object: PathBuf,

        /// CRD version to prune against (defaults to the storage version)
        #[arg(long)]
        version: Option<String>,

        /// Output pruned object file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for results
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fuzz {
            crd,
            iterations,
            seed,
            nil_chance,
            min_elements,
            max_elements,
            max_depth,
            config,
        } => {
            let mut options = load_options(config.as_deref())?;
            if let Some(iterations) = iterations {
                options.iterations = iterations;
            }
            if seed.is_some() {
                options.seed = seed;
            }
            if let Some(nil_chance) = nil_chance {
                options.nil_chance = nil_chance;
            }
            if let Some(min_elements) = min_elements {
                options.min_elements = min_elements;
            }
            if let Some(max_elements) = max_elements {
                options.max_elements = max_elements;
            }
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }

            run_fuzz(&crd, &options)?;
        }
        Commands::Prune {
            crd,
            object,
            version,
            output,
            format,
        } => {
            let canonical = load_canonical(&crd)?;
            let selected = match &version {
                Some(name) => canonical.version(name).with_context(|| {
                    format!("CRD {} has no version {name:?}", canonical.name)
                })?,
                None => canonical
                    .storage_version()
                    .with_context(|| format!("CRD {} has no versions", canonical.name))?,
            };
            let Some(props) = &selected.schema else {
                bail!(
                    "Version {} of CRD {} has no openAPIV3Schema",
                    selected.name,
                    canonical.name
                );
            };
            let schema = Structural::new(props).with_context(|| {
                format!("Invalid schema for version {} of {}", selected.name, canonical.name)
            })?;

            let data = fs::read(&object)
                .with_context(|| format!("Failed to open object file: {}", object.display()))?;
            let mut value: serde_json::Value = serde_yaml::from_slice(&data)
                .with_context(|| format!("Failed to parse object from: {}", object.display()))?;

            let options = PruneOptions {
                is_resource_root: true,
                return_pruned: true,
            };
            for path in prune_with_options(&mut value, &schema, &options) {
                eprintln!("pruned: {path}");
            }

            write_json(&value, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<FuzzOptions> {
    let Some(path) = path else {
        return Ok(FuzzOptions::default());
    };
    let data = fs::read(path)
        .with_context(|| format!("Failed to open config file: {}", path.display()))?;
    serde_yaml::from_slice(&data)
        .with_context(|| format!("Failed to parse config from: {}", path.display()))
}

fn load_canonical(path: &Path) -> Result<CustomResourceDefinition> {
    let crd = decode_file(path).context("Failed to decode CRD")?;
    CustomResourceDefinition::try_from(crd)
        .map_err(|e| anyhow::Error::from(e).context("Conversion failed"))
}

/// Register a schema-driven object for every version of the CRD and run the sweep.
fn run_fuzz(path: &Path, options: &FuzzOptions) -> Result<()> {
    let crd = decode_file(path).context("Failed to decode CRD")?;
    let canonical = CustomResourceDefinition::try_from(&crd)
        .map_err(|e| anyhow::Error::from(e).context("Conversion failed"))?;

    let mut scheme = Scheme::new();
    for version in &canonical.versions {
        // Versions without a usable schema still get an object so the sweep
        // reports the schema problem in that version's scope.
        let schema = version
            .schema
            .as_ref()
            .and_then(|props| Structural::new(props).ok())
            .unwrap_or_default();
        let schema = Arc::new(schema);
        let gvk = canonical.group_kind().with_version(version.name.clone());
        let object_gvk = gvk.clone();
        scheme.register_with(gvk, move || {
            Box::new(UnstructuredObject::new(object_gvk.clone(), Arc::clone(&schema)))
                as Box<dyn DynObject>
        })?;
    }

    let mut fuzzer = Fuzzer::from_options(options);
    let mut report = Report::new();
    fuzz_with(
        &mut report,
        &scheme,
        &mut fuzzer,
        &StructuralPruner,
        &crd,
        options,
    )
    .map_err(|e| anyhow::Error::from(e).context("Fuzzing failed"))?;

    for failure in report.failures() {
        println!("FAIL {failure}");
    }
    for scope in report.scopes() {
        if report.failures_in(scope).next().is_none() {
            println!("ok   {scope}");
        }
    }
    println!("{} (seed {})", report.summary(), fuzzer.seed());

    if !report.is_ok() {
        bail!("{} fuzz failure(s) in {}", report.failures().len(), canonical.name);
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
