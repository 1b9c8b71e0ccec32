use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, error};
use ordermap::OrderMap;

use oncoscribe::Pipeline;
use oncoscribe::config::engine_config::load_engine_config;
use oncoscribe::config::sample::{AnalysisType, SampleMetadata};
use oncoscribe::error::{ConstructionError, PipelineError};
use oncoscribe::ingest::annotations::AnnotationCatalog;
use oncoscribe::ingest::error::IngestError;
use oncoscribe::ingest::normalizer::left_align;
use oncoscribe::ingest::vcf::{VcfFile, read_vcf};
use oncoscribe::kb::store::{KbStore, read_kb_file};
use oncoscribe::model::bundle::BundleStatus;
use oncoscribe::model::variant::{Assembly, VariantKey};
use oncoscribe::pipeline::RunInputs;
use oncoscribe::purity::read_upstream_purity;

const EXIT_OK: i32 = 0;
const EXIT_OTHER: i32 = 1;
const EXIT_INPUT_VALIDATION: i32 = 2;
const EXIT_REFERENCE_MISMATCH: i32 = 3;
const EXIT_TIMEOUT: i32 = 4;

#[derive(Parser)]
#[command(name = "oncoscribe", version, about = "Somatic variant interpretation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Silence all logging.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret somatic variants from a variant-call file
    Annotate(AnnotateArgs),
}

#[derive(Args)]
struct AnnotateArgs {
    /// Tumor variant-call file.
    #[arg(long)]
    input: PathBuf,
    /// Cancer-type code; missing code falls back to pan-cancer matching.
    #[arg(long)]
    cancer_type: Option<String>,
    /// tumor_only or tumor_normal.
    #[arg(long, value_parser = parse_analysis_type)]
    analysis_type: AnalysisType,
    /// Matched-normal variant-call file for tumor-normal runs.
    #[arg(long)]
    normal_vcf: Option<PathBuf>,
    /// Tumor purity in [0, 1] when known.
    #[arg(long)]
    tumor_purity: Option<f64>,
    /// Structured purity output from an upstream caller.
    #[arg(long)]
    purity_file: Option<PathBuf>,
    /// Panel-of-normals KB file joined into the snapshot.
    #[arg(long)]
    pon: Option<PathBuf>,
    /// Output path for the JSON run report; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Knowledge-base snapshot directory.
    #[arg(long)]
    kb_snapshot: PathBuf,
    /// Functional-annotation sidecar produced by the external annotator.
    #[arg(long)]
    annotations: Option<PathBuf>,
    /// Engine configuration file overriding built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sample metadata JSON; CLI flags override its fields.
    #[arg(long)]
    metadata: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let code = match cli.command {
        Commands::Annotate(args) => match annotate(&args) {
            Ok(code) => code,
            Err(error) => {
                error!("{error:#}");
                exit_code_for(&error)
            }
        },
    };
    std::process::exit(code);
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Off
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn annotate(args: &AnnotateArgs) -> anyhow::Result<i32> {
    let config = load_engine_config(args.config.as_deref())?;
    let metadata = build_metadata(args)?;

    let extra = match &args.pon {
        Some(path) => vec![read_kb_file(path)?],
        None => vec![],
    };
    let store = Arc::new(KbStore::load_dir_with_extra(&args.kb_snapshot, extra)?);

    let file = read_vcf(&args.input)?;
    let catalog = match &args.annotations {
        Some(path) => AnnotationCatalog::load(path)?,
        None => AnnotationCatalog::default(),
    };
    let upstream_purity = args
        .purity_file
        .as_deref()
        .map(read_upstream_purity)
        .transpose()?;
    let normal_vafs = args
        .normal_vcf
        .as_deref()
        .map(|path| normal_vaf_map(path, config.assembly))
        .transpose()?;

    let pipeline = Pipeline::new(config, metadata, store);
    let cancel = AtomicBool::new(false);
    let inputs = RunInputs {
        normal_vafs: normal_vafs.as_ref(),
        upstream_purity,
    };
    let report = pipeline.run(&file, &catalog, inputs, &cancel)?;

    let rendered = serde_json::to_string_pretty(&report).map_err(PipelineError::from)?;
    match &args.output {
        Some(path) => fs::write(path, rendered).with_context(|| {
            format!("could not write run report to '{}'", path.display())
        })?,
        None => println!("{rendered}"),
    }

    let timed_out = !report.bundles.is_empty()
        && report
            .bundles
            .iter()
            .all(|b| b.status == BundleStatus::Timeout);
    Ok(if timed_out { EXIT_TIMEOUT } else { EXIT_OK })
}

fn parse_analysis_type(raw: &str) -> Result<AnalysisType, String> {
    raw.replace('-', "_")
        .parse()
        .map_err(|_| format!("expected tumor_only or tumor_normal, got '{raw}'"))
}

/// Sample metadata from the optional file, with CLI flags taking precedence.
fn build_metadata(args: &AnnotateArgs) -> anyhow::Result<SampleMetadata> {
    let analysis_type = args.analysis_type;

    let mut metadata = match &args.metadata {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("could not read metadata '{}'", path.display()))?;
            serde_json::from_str(&raw).map_err(|source| ConstructionError::MetadataParse {
                path: path.clone(),
                source,
            })?
        }
        None => SampleMetadata::new("unknown", "unknown", analysis_type),
    };
    metadata.analysis_type = analysis_type;
    if args.cancer_type.is_some() {
        metadata.cancer_type_code = args.cancer_type.clone();
    }
    if args.tumor_purity.is_some() {
        metadata.tumor_purity = args.tumor_purity;
    }
    Ok(metadata)
}

/// Normal-sample VAFs keyed by normalized variant key, from a separate
/// normal variant-call file.
fn normal_vaf_map(
    path: &Path,
    assembly: Assembly,
) -> Result<OrderMap<VariantKey, f64>, IngestError> {
    let file: VcfFile = read_vcf(path)?;
    let mut map = OrderMap::new();
    for record in &file.records {
        for (allele_index, alternate) in record.alternates.iter().enumerate() {
            let (position, reference, alternate) =
                left_align(record.position, &record.reference, alternate);
            let depth = record.allele_depth(0, allele_index)?;
            map.insert(
                VariantKey {
                    assembly,
                    chromosome: record.chromosome.clone(),
                    position,
                    reference,
                    alternate,
                },
                depth.vaf(),
            );
        }
    }
    Ok(map)
}

/// Exit-code mapping: 2 input validation, 3 reference mismatch, 4 runtime
/// timeout, 1 anything else.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(ingest) = cause.downcast_ref::<IngestError>() {
            return match ingest {
                IngestError::MismatchedAssembly { .. } => EXIT_REFERENCE_MISMATCH,
                _ => EXIT_INPUT_VALIDATION,
            };
        }
        if let Some(pipeline) = cause.downcast_ref::<PipelineError>() {
            return match pipeline {
                PipelineError::Ingest(IngestError::MismatchedAssembly { .. }) => {
                    EXIT_REFERENCE_MISMATCH
                }
                PipelineError::Ingest(_) | PipelineError::Validation(_) => EXIT_INPUT_VALIDATION,
                _ => EXIT_OTHER,
            };
        }
        if let Some(construction) = cause.downcast_ref::<ConstructionError>() {
            return match construction {
                ConstructionError::MetadataParse { .. }
                | ConstructionError::Validation(_)
                | ConstructionError::NoConfigFileFound(_) => EXIT_INPUT_VALIDATION,
                _ => EXIT_OTHER,
            };
        }
    }
    EXIT_OTHER
}
