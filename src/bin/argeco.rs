//! argeco - ARG abundance ecology CLI
//!
//! Command-line interface for resistome diversity and differential abundance
//! analysis.

use arg_ecology::aggregate::aggregate_by_category;
use arg_ecology::alpha::alpha_diversity;
use arg_ecology::beta::{distance_matrix_for, DistanceMetric};
use arg_ecology::data::{read_feature_categories, read_total_reads, AbundanceMatrix, Metadata};
use arg_ecology::differential::{compare_groups_with, GroupComparison};
use arg_ecology::error::{EcoError, Result};
use arg_ecology::filter::filter_low_abundance_with_stats;
use arg_ecology::normalize::{norm_tss, normalize_by_total_reads, scale};
use arg_ecology::pipeline::{AnalysisConfig, EcologicalAnalysis, FilterConfig};
use arg_ecology::test::MannWhitneyU;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// CLI-friendly distance metric enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMetric {
    /// Bray-Curtis dissimilarity
    Braycurtis,
    /// Presence/absence Jaccard distance
    Jaccard,
    /// Euclidean distance
    Euclidean,
}

impl From<CliMetric> for DistanceMetric {
    fn from(metric: CliMetric) -> Self {
        match metric {
            CliMetric::Braycurtis => DistanceMetric::BrayCurtis,
            CliMetric::Jaccard => DistanceMetric::Jaccard,
            CliMetric::Euclidean => DistanceMetric::Euclidean,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NormMethod {
    /// Reads per million of the sequencing depth (needs --total-reads)
    Rpm,
    /// Total sum scaling over the table's own column sums
    Tss,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Tsv,
    Json,
}

/// ARG abundance ecology
#[derive(Parser)]
#[command(name = "argeco")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write the JSON result document
    Analyze {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to sample metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Analysis configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Per-sample total reads TSV; enables RPM normalization
        #[arg(long)]
        total_reads: Option<PathBuf>,

        /// Output directory (overrides the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Metadata column holding group labels
        #[arg(long)]
        group_column: Option<String>,

        /// Reference group
        #[arg(long)]
        group1: Option<String>,

        /// Comparison group
        #[arg(long)]
        group2: Option<String>,
    },

    /// Per-sample alpha diversity metrics
    Alpha {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "tsv")]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize an abundance table
    Normalize {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Normalization method
        #[arg(long, value_enum, default_value = "rpm")]
        method: NormMethod,

        /// Per-sample total reads TSV (required for rpm)
        #[arg(long)]
        total_reads: Option<PathBuf>,

        /// Scale factor (default: 1e6 for rpm, 1.0 for tss)
        #[arg(long)]
        scale: Option<f64>,

        /// Output path for the normalized TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Sum gene rows into annotation categories
    Aggregate {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Feature annotation TSV (first column: feature ID)
        #[arg(long)]
        mapping: PathBuf,

        /// Annotation column to aggregate by
        #[arg(long, default_value = "drug_class")]
        column: String,

        /// Output path for the aggregated TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Drop rare, low-abundance features
    Filter {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Minimum fraction of samples with the feature present
        #[arg(long, default_value = "0.1")]
        min_prevalence: f64,

        /// Minimum mean abundance
        #[arg(long, default_value = "1.0")]
        min_abundance: f64,

        /// Output path for the filtered TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Two-group differential abundance table
    Compare {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to sample metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata column holding group labels
        #[arg(long, default_value = "sample_type")]
        group_column: String,

        /// Reference group
        #[arg(long, default_value = "non_medical")]
        group1: String,

        /// Comparison group
        #[arg(long, default_value = "medical_influenced")]
        group2: String,

        /// Significance threshold for adjusted p-values
        #[arg(long, default_value = "0.05")]
        alpha: f64,

        /// Output path for results TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Pairwise sample distance matrix
    Distance {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Distance metric
        #[arg(long, value_enum, default_value = "braycurtis")]
        metric: CliMetric,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write an example analysis configuration
    ExampleConfig {
        /// Output path for the YAML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Analyze {
            abundance,
            metadata,
            config,
            total_reads,
            output_dir,
            group_column,
            group1,
            group2,
        } => cmd_analyze(
            &abundance,
            &metadata,
            config.as_deref(),
            total_reads.as_deref(),
            output_dir,
            group_column,
            group1,
            group2,
        ),

        Commands::Alpha {
            abundance,
            format,
            output,
        } => cmd_alpha(&abundance, format, output.as_deref()),

        Commands::Normalize {
            abundance,
            method,
            total_reads,
            scale,
            output,
        } => cmd_normalize(&abundance, method, total_reads.as_deref(), scale, &output),

        Commands::Aggregate {
            abundance,
            mapping,
            column,
            output,
        } => cmd_aggregate(&abundance, &mapping, &column, &output),

        Commands::Filter {
            abundance,
            min_prevalence,
            min_abundance,
            output,
        } => cmd_filter(&abundance, min_prevalence, min_abundance, &output),

        Commands::Compare {
            abundance,
            metadata,
            group_column,
            group1,
            group2,
            alpha,
            output,
        } => cmd_compare(
            &abundance,
            &metadata,
            &group_column,
            GroupComparison::new(group1, group2).with_alpha(alpha),
            &output,
        ),

        Commands::Distance {
            abundance,
            metric,
            output,
        } => cmd_distance(&abundance, metric.into(), output.as_deref()),

        Commands::ExampleConfig { output } => cmd_example_config(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Writer to a file, or stdout when no path is given.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Run the full analysis
#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    abundance_path: &Path,
    metadata_path: &Path,
    config_path: Option<&Path>,
    total_reads_path: Option<&Path>,
    output_dir: Option<PathBuf>,
    group_column: Option<String>,
    group1: Option<String>,
    group2: Option<String>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(column) = group_column {
        config.group_column = column;
    }
    if let Some(g1) = group1 {
        config.group1 = g1;
    }
    if let Some(g2) = group2 {
        config.group2 = g2;
    }

    let output_path = config.output_path();
    let mut analysis = EcologicalAnalysis::new(config);
    if let Some(path) = total_reads_path {
        analysis = analysis.with_total_reads(read_total_reads(path)?);
    }

    let result = analysis.run_full_analysis(abundance_path, metadata_path)?;

    eprintln!(
        "Analyzed {} features x {} samples",
        result.features_analyzed, result.samples_analyzed
    );
    if let Some(beta) = &result.beta_diversity {
        let explained: Vec<String> = beta
            .explained_variance
            .iter()
            .map(|v| format!("{:.1}%", v * 100.0))
            .collect();
        eprintln!("  PCoA explained variance: {}", explained.join(", "));
    }
    if let Some(da) = &result.differential_abundance {
        let n_sig = da.iter().filter(|r| r.significant).count();
        eprintln!("  {} features tested, {} significant", da.len(), n_sig);
    }
    eprintln!("Results written to {:?}", output_path);

    Ok(())
}

/// Per-sample alpha diversity
fn cmd_alpha(abundance_path: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let matrix = AbundanceMatrix::from_tsv(abundance_path)?;
    let report = alpha_diversity(&matrix);

    let mut writer = open_output(output)?;
    match format {
        OutputFormat::Tsv => report.write_tsv(&mut writer)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Normalize a table
fn cmd_normalize(
    abundance_path: &Path,
    method: NormMethod,
    total_reads_path: Option<&Path>,
    scale_factor: Option<f64>,
    output_path: &Path,
) -> Result<()> {
    let matrix = AbundanceMatrix::from_tsv(abundance_path)?;

    let normalized = match method {
        NormMethod::Rpm => {
            let path = total_reads_path.ok_or_else(|| {
                EcoError::InvalidParameter("rpm normalization needs --total-reads".to_string())
            })?;
            let totals = read_total_reads(path)?;
            normalize_by_total_reads(&matrix, &totals, scale_factor.unwrap_or(scale::RPM))?
        }
        NormMethod::Tss => norm_tss(&matrix, scale_factor.unwrap_or(scale::PROPORTION))?,
    };

    normalized.to_tsv(output_path)?;
    eprintln!(
        "Wrote {} features x {} samples to {:?}",
        normalized.n_features(),
        normalized.n_samples(),
        output_path
    );
    Ok(())
}

/// Aggregate by annotation category
fn cmd_aggregate(abundance_path: &Path, mapping_path: &Path, column: &str, output_path: &Path) -> Result<()> {
    let matrix = AbundanceMatrix::from_tsv(abundance_path)?;
    let categories = read_feature_categories(mapping_path, column)?;

    let aggregated = aggregate_by_category(&matrix, &categories)?;
    aggregated.to_tsv(output_path)?;

    eprintln!(
        "Aggregated {} features into {} {} categories",
        matrix.n_features(),
        aggregated.n_features(),
        column
    );
    Ok(())
}

/// Filter low-abundance features
fn cmd_filter(abundance_path: &Path, min_prevalence: f64, min_abundance: f64, output_path: &Path) -> Result<()> {
    let matrix = AbundanceMatrix::from_tsv(abundance_path)?;
    let (filtered, stats) = filter_low_abundance_with_stats(&matrix, min_prevalence, min_abundance);

    filtered.to_tsv(output_path)?;
    eprint!("{}", stats);
    Ok(())
}

/// Differential abundance between two groups
fn cmd_compare(
    abundance_path: &Path,
    metadata_path: &Path,
    group_column: &str,
    comparison: GroupComparison,
    output_path: &Path,
) -> Result<()> {
    let matrix = AbundanceMatrix::from_tsv(abundance_path)?;
    let metadata = Metadata::from_tsv(metadata_path)?;
    let labels = metadata.group_labeling(group_column)?;

    let results = compare_groups_with(&matrix, &labels, &comparison, &MannWhitneyU::default())?;
    results.to_tsv(output_path)?;

    eprintln!("Done! {} features tested", results.len());
    eprint!("{}", results.summary());

    if !results.is_empty() {
        eprintln!("\nTop 5 hits:");
        for r in results.iter().take(5) {
            eprintln!(
                "  {}: log2FC={:.3}, q={:.2e}",
                r.feature, r.log2_fold_change, r.p_adjusted
            );
        }
    }
    Ok(())
}

/// Pairwise distance matrix
fn cmd_distance(abundance_path: &Path, metric: DistanceMetric, output: Option<&Path>) -> Result<()> {
    let matrix = AbundanceMatrix::from_tsv(abundance_path)?;
    let dm = distance_matrix_for(&matrix, metric)?;

    let mut writer = open_output(output)?;
    dm.write_tsv(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Generate example analysis configuration
fn cmd_example_config(output_path: &Path) -> Result<()> {
    let config = AnalysisConfig {
        filter: Some(FilterConfig {
            min_prevalence: 0.1,
            min_abundance: 1.0,
        }),
        ..AnalysisConfig::default()
    };
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
