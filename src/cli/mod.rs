//! Car price CLI
//!
//! Command-line interface for cleaning the sales dataset, scoring single
//! records and running the prediction service.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::inference::{ModelBundle, PricePredictor};
use crate::preprocessing::{describe, ColumnType, PreprocessingConfig, TrainingPipeline};
use crate::record::parse_record_json;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "carprice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Used-car price prediction: dataset cleaning, encoding replay and serving")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean the raw sales dataset and optionally fit the encoders
    Preprocess {
        /// Raw dataset (CSV or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Cleaned table output (CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Directory to write the fitted encoders and scaler to
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Year vehicle ages are measured against (default: current year)
        #[arg(long)]
        reference_year: Option<i32>,
    },

    /// Price a single vehicle record
    Predict {
        /// Directory holding the fitted artifacts and model.json
        #[arg(short, long)]
        artifacts: PathBuf,

        /// Record as inline JSON or a path to a JSON file
        #[arg(short, long)]
        record: String,

        /// Year vehicle ages are measured against (default: current year)
        #[arg(long)]
        reference_year: Option<i32>,
    },

    /// Show dataset information
    Info {
        /// Dataset file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Start the prediction service
    Serve {
        /// Directory holding the fitted artifacts and model.json
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Year vehicle ages are measured against (default: current year)
        #[arg(long)]
        reference_year: Option<i32>,
    },
}

// ─── Data loading ──────────────────────────────────────────────────────────────

/// Load a CSV or Parquet dataset. CSV schema inference scans the whole file
/// so unit-suffixed columns are never mistaken for numbers.
pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let df = match ext {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "parquet" => ParquetReader::new(std::fs::File::open(path)?)
            .finish()?,
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };

    Ok(df)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_preprocess(
    data_path: &Path,
    output_path: &Path,
    artifacts_dir: Option<&Path>,
    reference_year: Option<i32>,
) -> anyhow::Result<()> {
    section("Preprocess");

    step_run("Loading data");
    let df = load_data(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let mut config = PreprocessingConfig::default();
    if let Some(year) = reference_year {
        config = config.with_reference_year(year);
    }
    let pipeline = TrainingPipeline::new(config);

    step_run("Cleaning");
    let start = Instant::now();
    let output = pipeline.run(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    for stage in &output.report.stages {
        println!(
            "    {:<12} {:>8} rows {:>4} cols",
            muted(&stage.stage),
            stage.rows,
            stage.columns
        );
    }
    if !output.report.removed_manufacturers.is_empty() {
        println!(
            "    {} {}",
            muted("dropped manufacturers:"),
            output.report.removed_manufacturers.join(", ")
        );
    }

    let mut cleaned = output.frame;
    step_run(&format!("Saving → {}", output_path.display()));
    let mut file = std::fs::File::create(output_path)?;
    CsvWriter::new(&mut file).finish(&mut cleaned)?;
    step_done(&format!("{} rows × {} cols", cleaned.height(), cleaned.width()));

    if let Some(dir) = artifacts_dir {
        step_run(&format!("Fitting encoders → {}", dir.display()));
        let fitted = pipeline.fit_artifacts(&cleaned)?;
        fitted.write_to(dir)?;
        step_done(&format!("{} one-hot features", fitted.one_hot.n_features_out()));
    }

    println!();
    Ok(())
}

pub fn cmd_predict(
    artifacts_dir: &Path,
    record: &str,
    reference_year: Option<i32>,
) -> anyhow::Result<()> {
    section("Predict");

    let json = if Path::new(record).is_file() {
        std::fs::read_to_string(record)?
    } else {
        record.to_string()
    };
    let record = parse_record_json(&json)?;

    step_run("Loading model bundle");
    let bundle = Arc::new(ModelBundle::load(artifacts_dir)?);
    step_done(&format!("{} features, {} trees", bundle.schema().len(), bundle.forest().n_trees()));

    let mut predictor = PricePredictor::new(bundle);
    if let Some(year) = reference_year {
        predictor = predictor.with_reference_year(year);
    }

    let prediction = predictor.predict(&record)?;
    step_ok(&format!("{} {}", record.manufacturer, record.model));
    println!("  {:<12} {}", muted("Age"), prediction.age);
    println!("  {:<12} {}", muted("Reference"), prediction.reference_year);
    println!("  {:<12} {}", muted("Price"), format!("{:.2}", prediction.price).white().bold());

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_data(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);
    println!();

    println!(
        "  {:<20} {:<12} {:>6} {:>10} {:>10}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique"),
        muted("Median")
    );
    println!("  {}", dim(&"─".repeat(62)));

    for stats in describe(&df)? {
        let kind = match stats.dtype {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "text",
            ColumnType::Unknown => "other",
        };
        println!(
            "  {:<20} {:<12} {:>6} {:>10} {:>10}",
            stats.name,
            kind.truecolor(140, 140, 140),
            stats.null_count,
            stats.unique_count.map_or("-".to_string(), |u| u.to_string()),
            stats.median.map_or("-".to_string(), |m| format!("{:.2}", m))
        );
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(
    artifacts_dir: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    reference_year: Option<i32>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(dir) = artifacts_dir {
        config.artifacts_dir = dir.display().to_string();
    }
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if reference_year.is_some() {
        config.reference_year = reference_year;
    }

    let base = format!("http://{}:{}", config.host, config.port);
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Car Price Service".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Predict   ", &format!("POST {}/predict", base)));
    line_box(&kv("Health    ", &format!("{}/health", base)));
    line_box(&kv("Artifacts ", &config.artifacts_dir));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
