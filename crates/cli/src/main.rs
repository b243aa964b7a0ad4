//! mdsite - render markdown pages the way the site does

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use mdsite_core::{current_year, html_date_string, readable_date};
use mdsite_render::{BatchInput, BatchOptions, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "mdsite")]
#[command(version, about = "Markdown rendering pipeline for a static site", long_about = None)]
#[command(after_help = "EXAMPLES:
    mdsite render post.md                 Print the HTML of one page
    mdsite render post.md --json          Print HTML, headings and TOC as JSON
    mdsite batch posts/*.md --threads 4   Render many pages in parallel
    mdsite date 2024-03-05T23:30:00Z      Format a date for a template")]
struct Cli {
    /// Pipeline configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one markdown file
    Render {
        /// Markdown file to render
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the rendered document as JSON instead of bare HTML
        #[arg(long)]
        json: bool,
    },
    /// Render several markdown files in parallel and print a JSON report
    Batch {
        /// Markdown files to render
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Maximum worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Stop at the first file that fails
        #[arg(long)]
        fail_fast: bool,
    },
    /// Format a timestamp with a template date filter
    Date {
        /// RFC 3339 timestamp or a plain yyyy-mm-dd date
        #[arg(value_name = "DATE")]
        date: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = DateFormat::Readable)]
        format: DateFormat,

        /// Zone offset such as +09:00 (defaults to UTC)
        #[arg(long, value_name = "+HH:MM")]
        offset: Option<String>,
    },
    /// Print the current year
    Year,
}

#[derive(Clone, Copy, ValueEnum)]
enum DateFormat {
    /// dd LLL yyyy
    Readable,
    /// yyyy-mm-dd
    Html,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match main_result(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main_result(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render { file, json } => render_command(cli.config.as_deref(), &file, json),
        Commands::Batch {
            files,
            threads,
            fail_fast,
        } => batch_command(cli.config.as_deref(), files, threads, fail_fast),
        Commands::Date {
            date,
            format,
            offset,
        } => date_command(&date, format, offset.as_deref()),
        Commands::Year => {
            println!("{}", current_year());
            Ok(())
        }
    }
}

fn build_pipeline(config: Option<&Path>) -> Result<Pipeline> {
    let config = match config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    Ok(Pipeline::new(config)?)
}

fn render_command(config: Option<&Path>, file: &Path, json: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let doc = pipeline
        .render(&source)
        .with_context(|| format!("Failed to render {}", file.display()))?;
    log::debug!("{}: {} heading(s)", file.display(), doc.headings.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print!("{}", doc.html);
    }
    Ok(())
}

fn batch_command(
    config: Option<&Path>,
    files: Vec<PathBuf>,
    threads: Option<usize>,
    fail_fast: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config)?;

    let inputs = files
        .iter()
        .map(|path| {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(BatchInput {
                id: path.display().to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let options = BatchOptions {
        max_threads: threads,
        continue_on_error: !fail_fast,
    };
    let report = pipeline.render_batch(inputs, &options);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.stats.failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", report.stats.failed, report.stats.total);
    }
    Ok(())
}

fn date_command(date: &str, format: DateFormat, offset: Option<&str>) -> Result<()> {
    let date = parse_date(date)?;
    let zone = match offset {
        Some(offset) => offset
            .parse::<FixedOffset>()
            .with_context(|| format!("Invalid zone offset: {offset}"))?,
        None => FixedOffset::east_opt(0).context("UTC offset")?,
    };

    let formatted = match format {
        DateFormat::Readable => readable_date(&date, &zone),
        DateFormat::Html => html_date_string(&date, &zone),
    };
    println!("{formatted}");
    Ok(())
}

fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {input}"))?;
    let midnight = day.and_hms_opt(0, 0, 0).context("midnight is a valid time")?;
    Ok(midnight.and_utc())
}
