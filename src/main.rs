//! signaldrift CLI entry point.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use signaldrift::config::{parse_split_date, AnalysisConfig, ConfigIO, SplitStrategy};
use signaldrift::constants::{DEFAULT_DATA_PATH, DEFAULT_DATE_COLUMN, DEFAULT_DATE_FORMAT, DIAGNOSE_ROWS};
use signaldrift::data::{diagnose, resolve_data_path};
use signaldrift::engine::run_analysis;
use signaldrift::errors::DriftError;
use signaldrift::logging;
use signaldrift::report::{print_metrics_report, write_json_report};
use signaldrift::stats::KsMethod;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "signaldrift")]
#[command(about = "Distribution drift between two time windows of trip data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the reference and current windows of every feature
    Analyze(AnalyzeArgs),

    /// Inspect the head of a data file
    Diagnose {
        /// Path to the CSV file
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Fallback paths tried when the data file is missing
        #[arg(long = "fallback")]
        fallbacks: Vec<PathBuf>,

        /// Number of records to inspect
        #[arg(long, default_value_t = DIAGNOSE_ROWS)]
        rows: usize,

        /// Name of the timestamp column
        #[arg(long, default_value = DEFAULT_DATE_COLUMN)]
        date_column: String,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// JSON configuration file, flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the CSV file
    #[arg(long)]
    data: Option<PathBuf>,

    /// Fallback paths tried when the data file is missing
    #[arg(long = "fallback")]
    fallbacks: Vec<PathBuf>,

    /// Directory for charts and the JSON report
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// First day of the current window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_split_date, conflicts_with = "split_half")]
    split_date: Option<NaiveDate>,

    /// Split the time-ordered rows into two equal halves
    #[arg(long)]
    split_half: bool,

    /// Comma separated feature columns
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Read at most this many records
    #[arg(long, conflicts_with = "all_rows")]
    max_rows: Option<usize>,

    /// Read the whole file
    #[arg(long)]
    all_rows: bool,

    /// KS p-value method: auto, exact, asymptotic
    #[arg(long)]
    ks_method: Option<KsMethod>,

    /// Worker threads, all cores by default
    #[arg(long)]
    threads: Option<usize>,

    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,

    /// Also write drift_report.json to the output directory
    #[arg(long)]
    json: bool,
}

impl AnalyzeArgs {
    fn to_config(&self) -> Result<AnalysisConfig, DriftError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load_config(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(data) = &self.data {
            config = config.set_data_path(data);
        }
        if !self.fallbacks.is_empty() {
            config = config.set_fallback_paths(self.fallbacks.clone());
        }
        if let Some(dir) = &self.output_dir {
            config = config.set_output_dir(dir);
        }
        if let Some(date) = self.split_date {
            config = config.set_split(SplitStrategy::Date(date));
        }
        if self.split_half {
            config = config.set_split(SplitStrategy::Half);
        }
        if !self.features.is_empty() {
            config = config.set_features(self.features.clone());
        }
        if self.max_rows.is_some() {
            config = config.set_max_rows(self.max_rows);
        }
        if self.all_rows {
            config = config.set_max_rows(None);
        }
        if let Some(method) = self.ks_method {
            config = config.set_ks_method(method);
        }
        if self.threads.is_some() {
            config = config.set_num_threads(self.threads);
        }
        if self.no_plots {
            config = config.set_plots(false);
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(logging::level_for_verbosity(cli.verbose)) {
        eprintln!("Unable to install logger: {}", e);
    }

    let result = match cli.command {
        Commands::Analyze(args) => analyze_command(&args),
        Commands::Diagnose {
            data,
            fallbacks,
            rows,
            date_column,
        } => diagnose_command(&data, &fallbacks, rows, &date_column),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn analyze_command(args: &AnalyzeArgs) -> Result<(), DriftError> {
    let config = args.to_config()?;
    println!("🚀 Starting SignalDrift Analysis...");

    let run = run_analysis(&config)?;
    println!("✅ Loaded {} rows from {}.", run.table.len(), run.data_path.display());

    match config.split {
        SplitStrategy::Date(date) => {
            println!("   Reference Window (< {}): {} samples", date, run.windows.reference.len());
            println!("   Current Window (>= {}): {} samples", date, run.windows.current.len());
        }
        SplitStrategy::Half => {
            println!("   Reference Window (first half): {} samples", run.windows.reference.len());
            println!("   Current Window (second half): {} samples", run.windows.current.len());
        }
    }

    println!("\n🔍 Calculating Drift Metrics...");
    for outcome in &run.summary.outcomes {
        match &outcome.result {
            Ok(metrics) => print_metrics_report(metrics),
            Err(e) => println!("❌ {}: {}\n", outcome.feature, e),
        }
    }

    if config.plots {
        for (feature, result) in run.write_plots(&config.output_dir) {
            match result {
                Ok(path) => println!("Saved plot: {}", path.display()),
                Err(e) => println!("❌ Plotting Error ({}): {}", feature, e),
            }
        }
    }

    if args.json {
        let metrics: Vec<_> = run.summary.metrics().collect();
        match write_json_report(&config.output_dir, &metrics) {
            Ok(path) => println!("Saved report: {}", path.display()),
            Err(e) => println!("❌ Report Error: {}", e),
        }
    }

    let drifted = run.summary.drifted_features();
    if !drifted.is_empty() {
        println!("\nDrifted features: {}", drifted.join(", "));
    }
    println!("\n✨ Analysis Complete. Output saved to '{}/'.", config.output_dir.display());
    Ok(())
}

fn diagnose_command(data: &Path, fallbacks: &[PathBuf], rows: usize, date_column: &str) -> Result<(), DriftError> {
    println!("🔬 Diagnostics Tool");
    let path = resolve_data_path(data, fallbacks)?;
    println!("Loading from {}", path.display());
    let file = File::open(&path).map_err(|e| DriftError::UnableToRead(format!("{}: {}", path.display(), e)))?;
    let diagnosis = diagnose(BufReader::new(file), date_column, DEFAULT_DATE_FORMAT, rows)?;

    println!("\nColumns ({} records inspected):", diagnosis.rows_read);
    for column in &diagnosis.columns {
        println!("   {:<24} {:?} ({} non-empty)", column.name, column.kind, column.non_empty);
    }

    println!("\nChecking date column {}:", date_column);
    match &diagnosis.date_column {
        Ok(parsed) => {
            for date in &diagnosis.sample_dates {
                println!("   {}", date);
            }
            println!("✅ {} of {} timestamps parsed", parsed, diagnosis.rows_read);
        }
        Err(reason) => println!("❌ Date parsing failed: {}", reason),
    }
    Ok(())
}
