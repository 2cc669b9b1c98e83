// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use serde::Serialize;
use skyscan_cli::{catalog_from_json, config_from_json, Pipeline, PipelineConfig, PipelineOutput};
use skyscan_cluster::ClusterRegime;
use skyscan_core::{CatalogEntry, PipelineStage, ProgressSink, ScanError, StageDiagnostics};
use skyscan_eval::ClusteringMetrics;
use skyscan_features::{FeatureConfig, FeatureExtractor};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

struct Cli {
    command: Command,
}

enum Command {
    Run(RunArgs),
    Extract(ExtractArgs),
}

#[derive(Debug)]
struct RunArgs {
    input: PathBuf,
    out_dir: PathBuf,
    config: Option<PathBuf>,
    eps: Option<f64>,
    min_points: Option<usize>,
    contamination: Option<f64>,
    trees: Option<usize>,
    seed: Option<u64>,
    min_cluster_size: Option<usize>,
    summary: Option<PathBuf>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            out_dir: PathBuf::from("."),
            config: None,
            eps: None,
            min_points: None,
            contamination: None,
            trees: None,
            seed: None,
            min_cluster_size: None,
            summary: None,
        }
    }
}

#[derive(Debug, Default)]
struct ExtractArgs {
    input: PathBuf,
    output: Option<PathBuf>,
}

#[derive(Debug)]
enum CliError {
    Scan(ScanError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
    Csv {
        context: String,
        source: csv::Error,
    },
    InvalidInput(String),
}

impl CliError {
    fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Scan(ScanError::InvalidInput(_)) | Self::InvalidInput(_) => "invalid_input",
            Self::Scan(ScanError::EmptyDataset(_)) => "empty_dataset",
            Self::Scan(ScanError::NumericalIssue(_)) => "numerical_issue",
            Self::Scan(ScanError::NotSupported(_)) => "not_supported",
            Self::Scan(ScanError::ResourceLimit(_)) => "resource_limit",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Csv { .. } => "csv_error",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
            Self::Csv { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scan(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<ScanError> for CliError {
    fn from(value: ScanError) -> Self {
        Self::Scan(value)
    }
}

#[derive(Serialize)]
struct InputSummary {
    path: String,
    entries: usize,
    analyzed: usize,
    skipped: usize,
}

#[derive(Serialize)]
struct TotalsOutput {
    clusters: usize,
    noise: usize,
    anomalies: usize,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    command: &'static str,
    input: InputSummary,
    config: &'a PipelineConfig,
    totals: TotalsOutput,
    metrics: &'a Option<ClusteringMetrics>,
    regimes: &'a [ClusterRegime],
    outputs: Vec<String>,
    stages: &'a [StageDiagnostics],
}

#[derive(Serialize)]
struct ExtractOutput {
    command: &'static str,
    input: InputSummary,
    ranges: Vec<ColumnRangeOutput>,
    features: Vec<FeatureRowOutput>,
}

#[derive(Serialize)]
struct ColumnRangeOutput {
    column: &'static str,
    min: f64,
    max: f64,
}

#[derive(Serialize)]
struct FeatureRowOutput {
    norad_id: u32,
    name: String,
    inclination: f64,
    eccentricity: f64,
    mean_motion: f64,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

/// Reports stage completions on stderr, keeping stdout for the JSON summary.
struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn on_stage_complete(&self, stage: PipelineStage, fraction: f32, detail: &str) {
        if detail.is_empty() {
            eprintln!("[{:3.0}%] {}", f64::from(fraction) * 100.0, stage.as_str());
        } else {
            eprintln!(
                "[{:3.0}%] {}: {detail}",
                f64::from(fraction) * 100.0,
                stage.as_str()
            );
        }
    }
}

fn main() {
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let Some(cli) = parse_cli_from_env()? else {
        return Ok(());
    };

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Extract(args) => handle_extract(args),
    }
}

fn parse_cli_from_env() -> Result<Option<Cli>, CliError> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    parse_cli(args.as_slice())
}

fn parse_cli(args: &[String]) -> Result<Option<Cli>, CliError> {
    if args.is_empty() {
        print_root_help();
        return Ok(None);
    }

    if matches!(args[0].as_str(), "-h" | "--help") {
        print_root_help();
        return Ok(None);
    }
    if matches!(args[0].as_str(), "-V" | "--version") {
        print_version();
        return Ok(None);
    }

    let command_name = args[0].clone();
    let rest = &args[1..];

    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name.as_str())?;
        return Ok(None);
    }
    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        print_version();
        return Ok(None);
    }

    let command = match command_name.as_str() {
        "run" => Command::Run(parse_run_args(rest)?),
        "extract" => Command::Extract(parse_extract_args(rest)?),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: run, extract"
            )));
        }
    };

    Ok(Some(Cli { command }))
}

fn parse_run_args(tokens: &[String]) -> Result<RunArgs, CliError> {
    let mut args = RunArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--out-dir" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.out_dir = PathBuf::from(raw);
            }
            "--config" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.config = Some(PathBuf::from(raw));
            }
            "--eps" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.eps = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            "--min-points" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.min_points = Some(parse_usize_arg(raw.as_str(), flag)?);
            }
            "--contamination" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.contamination = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            "--trees" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.trees = Some(parse_usize_arg(raw.as_str(), flag)?);
            }
            "--seed" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.seed = Some(parse_u64_arg(raw.as_str(), flag)?);
            }
            "--min-cluster-size" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.min_cluster_size = Some(parse_usize_arg(raw.as_str(), flag)?);
            }
            "--summary" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.summary = Some(PathBuf::from(raw));
            }
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown run option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(CliError::invalid_input("run requires --input <path>"));
    }

    Ok(args)
}

fn parse_extract_args(tokens: &[String]) -> Result<ExtractArgs, CliError> {
    let mut args = ExtractArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--output" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.output = Some(PathBuf::from(raw));
            }
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown extract option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(CliError::invalid_input("extract requires --input <path>"));
    }

    Ok(args)
}

fn split_flag(token: &str) -> Result<(&str, Option<String>), CliError> {
    if !token.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "unexpected positional argument '{token}'; expected --flag value"
        )));
    }
    if let Some((flag, value)) = token.split_once('=') {
        return Ok((flag, Some(value.to_string())));
    }
    Ok((token, None))
}

fn take_flag_value(
    flag: &str,
    inline_value: Option<String>,
    tokens: &[String],
    idx: &mut usize,
) -> Result<String, CliError> {
    if let Some(value) = inline_value {
        return Ok(value);
    }

    *idx += 1;
    let value = tokens
        .get(*idx)
        .ok_or_else(|| CliError::invalid_input(format!("{flag} requires a value")))?;
    if value.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "{flag} requires a value, but got option '{value}'"
        )));
    }
    Ok(value.clone())
}

fn parse_usize_arg(raw: &str, flag: &str) -> Result<usize, CliError> {
    raw.parse::<usize>().map_err(|_| {
        CliError::invalid_input(format!(
            "{flag} expects a non-negative integer, got '{raw}'"
        ))
    })
}

fn parse_u64_arg(raw: &str, flag: &str) -> Result<u64, CliError> {
    raw.parse::<u64>().map_err(|_| {
        CliError::invalid_input(format!(
            "{flag} expects a non-negative integer, got '{raw}'"
        ))
    })
}

fn parse_f64_arg(raw: &str, flag: &str) -> Result<f64, CliError> {
    raw.parse::<f64>()
        .map_err(|_| CliError::invalid_input(format!("{flag} expects a number, got '{raw}'")))
}

fn print_version() {
    println!("skyscan {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "skyscan {}\n\nUSAGE:\n  skyscan <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  run       Run the full catalog analysis and write report tables\n  extract   Parse a catalog and print the extracted orbital features\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nRun 'skyscan <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), CliError> {
    match command {
        "run" => {
            println!(
                "USAGE:\n  skyscan run --input <catalog.json> [OPTIONS]\n\nOPTIONS:\n  --input <path>              Required catalog JSON\n  --out-dir <path>            Directory for report CSVs. Default: .\n  --config <path>             Pipeline config JSON; omitted blocks use defaults\n  --eps <float>               Override clustering radius\n  --min-points <usize>        Override core-point density threshold\n  --contamination <float>     Override expected anomaly fraction\n  --trees <usize>             Override forest size\n  --seed <u64>                Override forest seed\n  --min-cluster-size <usize>  Override smallest scoreable cluster\n  --summary <path>            Write the JSON run summary to file instead of stdout"
            );
            Ok(())
        }
        "extract" => {
            println!(
                "USAGE:\n  skyscan extract --input <catalog.json> [OPTIONS]\n\nOPTIONS:\n  --input <path>              Required catalog JSON\n  --output <path>             Write JSON output to file"
            );
            Ok(())
        }
        _ => Err(CliError::invalid_input(format!(
            "unknown command '{command}'; expected one of: run, extract"
        ))),
    }
}

fn handle_run(args: RunArgs) -> Result<(), CliError> {
    let entries = load_catalog(args.input.as_path())?;
    let config = resolve_config(&args)?;
    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run_with_progress(entries.as_slice(), &StderrProgress)?;

    fs::create_dir_all(args.out_dir.as_path()).map_err(|source| {
        CliError::io(
            format!("failed to create '{}'", args.out_dir.display()),
            source,
        )
    })?;

    let mut written = Vec::new();
    written.push(write_population_csv(&args.out_dir, &output)?);
    written.push(write_flagged_csv(&args.out_dir, &output)?);
    written.push(write_regimes_csv(&args.out_dir, &output)?);
    written.push(write_metrics_csv(&args.out_dir, &output)?);
    written.push(write_category_rates_csv(&args.out_dir, &output)?);
    written.push(write_cluster_rates_csv(&args.out_dir, &output)?);

    let analyzed = output.population.len();
    write_json_output(
        &RunOutput {
            command: "run",
            input: InputSummary {
                path: args.input.display().to_string(),
                entries: entries.len(),
                analyzed,
                skipped: output.skipped_entries,
            },
            config: pipeline.config(),
            totals: TotalsOutput {
                clusters: output.cluster_count(),
                noise: output.noise_count(),
                anomalies: output.anomaly_count(),
            },
            metrics: &output.metrics,
            regimes: &output.regimes,
            outputs: written,
            stages: &output.stages,
        },
        args.summary.as_deref(),
    )
}

fn handle_extract(args: ExtractArgs) -> Result<(), CliError> {
    let entries = load_catalog(args.input.as_path())?;
    let extractor = FeatureExtractor::new(FeatureConfig::default())?;
    let population = extractor.extract(entries.as_slice())?;

    let ranges = population
        .matrix
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let values = population.matrix.column(index)?;
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Ok(ColumnRangeOutput {
                column: column.as_str(),
                min,
                max,
            })
        })
        .collect::<Result<Vec<_>, ScanError>>()?;

    let features = population
        .accepted
        .iter()
        .zip(&population.features)
        .map(|(&index, feature)| FeatureRowOutput {
            norad_id: entries[index].norad_id,
            name: entries[index].name.clone(),
            inclination: feature.inclination_deg,
            eccentricity: feature.eccentricity,
            mean_motion: feature.mean_motion_rev_day,
        })
        .collect::<Vec<_>>();

    write_json_output(
        &ExtractOutput {
            command: "extract",
            input: InputSummary {
                path: args.input.display().to_string(),
                entries: entries.len(),
                analyzed: population.accepted.len(),
                skipped: population.skipped,
            },
            ranges,
            features,
        },
        args.output.as_deref(),
    )
}

fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    catalog_from_json(raw.as_str()).map_err(CliError::from)
}

fn resolve_config(args: &RunArgs) -> Result<PipelineConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|source| {
                CliError::io(format!("failed to read '{}'", path.display()), source)
            })?;
            config_from_json(raw.as_str())?
        }
        None => PipelineConfig::default(),
    };

    if let Some(eps) = args.eps {
        config.dbscan.eps = eps;
    }
    if let Some(min_points) = args.min_points {
        config.dbscan.min_points = min_points;
    }
    if let Some(contamination) = args.contamination {
        config.anomaly.forest.contamination = contamination;
    }
    if let Some(trees) = args.trees {
        config.anomaly.forest.num_trees = trees;
    }
    if let Some(seed) = args.seed {
        config.anomaly.forest.seed = seed;
    }
    if let Some(min_cluster_size) = args.min_cluster_size {
        config.anomaly.min_cluster_size = min_cluster_size;
    }

    config.validate()?;
    Ok(config)
}

fn csv_writer(dir: &Path, file: &str) -> Result<(PathBuf, csv::Writer<fs::File>), CliError> {
    let path = dir.join(file);
    let writer = csv::Writer::from_path(path.as_path())
        .map_err(|source| CliError::csv(format!("failed to open '{}'", path.display()), source))?;
    Ok((path, writer))
}

fn finish_csv(path: PathBuf, mut writer: csv::Writer<fs::File>) -> Result<String, CliError> {
    writer
        .flush()
        .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))?;
    Ok(path.display().to_string())
}

fn write_record(
    path: &Path,
    writer: &mut csv::Writer<fs::File>,
    fields: &[String],
) -> Result<(), CliError> {
    writer
        .write_record(fields)
        .map_err(|source| CliError::csv(format!("failed to write '{}'", path.display()), source))
}

fn write_population_csv(dir: &Path, output: &PipelineOutput) -> Result<String, CliError> {
    let (path, mut writer) = csv_writer(dir, "population.csv")?;
    write_record(
        &path,
        &mut writer,
        &[
            "OBJECT_NAME".to_string(),
            "NORAD_CAT_ID".to_string(),
            "COUNTRY".to_string(),
            "LAUNCH_DATE".to_string(),
            "object_type".to_string(),
            "inclination".to_string(),
            "eccentricity".to_string(),
            "mean_motion".to_string(),
            "cluster".to_string(),
            "orbit_type".to_string(),
            "anomaly".to_string(),
            "anomaly_score".to_string(),
        ],
    )?;
    for record in &output.population {
        // The anomaly column keeps the 1 / -1 report convention.
        let anomaly = if record.anomaly.is_anomaly() { -1 } else { 1 };
        write_record(
            &path,
            &mut writer,
            &[
                record.name.clone(),
                record.norad_id.to_string(),
                record.country.clone(),
                record.launch_date.clone(),
                record.category.as_str().to_string(),
                format!("{}", record.inclination_deg),
                format!("{}", record.eccentricity),
                format!("{}", record.mean_motion_rev_day),
                record.cluster.to_string(),
                record.regime.as_str().to_string(),
                anomaly.to_string(),
                record
                    .anomaly_score
                    .map(|score| format!("{score}"))
                    .unwrap_or_default(),
            ],
        )?;
    }
    finish_csv(path, writer)
}

fn write_flagged_csv(dir: &Path, output: &PipelineOutput) -> Result<String, CliError> {
    let (path, mut writer) = csv_writer(dir, "flagged_anomalies.csv")?;
    write_record(
        &path,
        &mut writer,
        &[
            "OBJECT_NAME".to_string(),
            "NORAD_CAT_ID".to_string(),
            "COUNTRY".to_string(),
            "cluster".to_string(),
            "orbit_type".to_string(),
            "inclination".to_string(),
            "mean_motion".to_string(),
            "cluster_mean_mean_motion".to_string(),
            "diff_from_cluster_mean".to_string(),
            "explanation".to_string(),
        ],
    )?;
    for explanation in &output.explanations {
        write_record(
            &path,
            &mut writer,
            &[
                explanation.name.clone(),
                explanation.norad_id.to_string(),
                explanation.country.clone(),
                explanation.cluster.to_string(),
                explanation.regime.as_str().to_string(),
                format!("{}", explanation.inclination_deg),
                format!("{}", explanation.mean_motion_rev_day),
                explanation
                    .cluster_mean_mean_motion
                    .map(|mean| format!("{mean}"))
                    .unwrap_or_default(),
                explanation
                    .deviation
                    .map(|diff| format!("{diff}"))
                    .unwrap_or_default(),
                explanation.summary.clone(),
            ],
        )?;
    }
    finish_csv(path, writer)
}

fn write_regimes_csv(dir: &Path, output: &PipelineOutput) -> Result<String, CliError> {
    let (path, mut writer) = csv_writer(dir, "cluster_regimes.csv")?;
    write_record(
        &path,
        &mut writer,
        &[
            "cluster".to_string(),
            "size".to_string(),
            "mean_mean_motion".to_string(),
            "orbit_type".to_string(),
            "comment".to_string(),
        ],
    )?;
    for regime in &output.regimes {
        write_record(
            &path,
            &mut writer,
            &[
                regime.cluster.to_string(),
                regime.size.to_string(),
                format!("{}", regime.mean_mean_motion),
                regime.regime.as_str().to_string(),
                regime.regime.comment().to_string(),
            ],
        )?;
    }
    finish_csv(path, writer)
}

fn write_metrics_csv(dir: &Path, output: &PipelineOutput) -> Result<String, CliError> {
    let (path, mut writer) = csv_writer(dir, "clustering_metrics.csv")?;
    write_record(
        &path,
        &mut writer,
        &[
            "silhouette".to_string(),
            "davies_bouldin".to_string(),
            "calinski_harabasz".to_string(),
            "evaluated_points".to_string(),
            "evaluated_clusters".to_string(),
        ],
    )?;
    // Undefined metrics keep the row, with empty cells rather than zeros.
    let row = match &output.metrics {
        Some(metrics) => vec![
            format!("{}", metrics.silhouette),
            format!("{}", metrics.davies_bouldin),
            format!("{}", metrics.calinski_harabasz),
            metrics.evaluated_points.to_string(),
            metrics.evaluated_clusters.to_string(),
        ],
        None => vec![String::new(); 5],
    };
    write_record(&path, &mut writer, &row)?;
    finish_csv(path, writer)
}

fn write_category_rates_csv(dir: &Path, output: &PipelineOutput) -> Result<String, CliError> {
    let (path, mut writer) = csv_writer(dir, "anomaly_rate_by_category.csv")?;
    write_record(
        &path,
        &mut writer,
        &[
            "object_type".to_string(),
            "anomaly_count".to_string(),
            "total_count".to_string(),
            "anomaly_rate_percent".to_string(),
        ],
    )?;
    for rate in &output.category_rates {
        write_record(
            &path,
            &mut writer,
            &[
                rate.category.as_str().to_string(),
                rate.anomaly_count.to_string(),
                rate.total_count.to_string(),
                format!("{}", rate.rate_percent),
            ],
        )?;
    }
    finish_csv(path, writer)
}

fn write_cluster_rates_csv(dir: &Path, output: &PipelineOutput) -> Result<String, CliError> {
    let (path, mut writer) = csv_writer(dir, "cluster_contamination_rates.csv")?;
    write_record(
        &path,
        &mut writer,
        &[
            "cluster".to_string(),
            "anomaly_count".to_string(),
            "total_count".to_string(),
            "contamination_rate_percent".to_string(),
        ],
    )?;
    for rate in &output.cluster_rates {
        write_record(
            &path,
            &mut writer,
            &[
                rate.cluster.to_string(),
                rate.anomaly_count.to_string(),
                rate.total_count.to_string(),
                format!("{}", rate.rate_percent),
            ],
        )?;
    }
    finish_csv(path, writer)
}

fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}
