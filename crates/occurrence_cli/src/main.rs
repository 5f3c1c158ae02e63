//! Command-line front end for the occurrence log.
//!
//! # Responsibility
//! - Parse flags/env into core calls against one CSV file.
//! - Render query, aggregate and conflict outputs as text or JSON.

mod render;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use occurrence_core::{
    default_log_level, init_logging, AggregateMetric, AggregateScope, FileCsvStorage,
    OccurrenceInput, OccurrenceQuery, OccurrenceService, PersonId, SortMode,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Log attendance occurrences per person in a CSV file.
#[derive(Parser)]
#[command(name = "occurrences", version, about)]
struct Cli {
    /// CSV file holding the occurrences.
    #[arg(long, env = "OCCURRENCES_CSV", global = true)]
    csv: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "OCCURRENCES_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; logging is off when unset.
    #[arg(long, env = "OCCURRENCES_LOG_DIR", global = true)]
    log_dir: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode the CSV file and report identity conflicts.
    Check,
    /// Replace the CSV file contents with another CSV document.
    Import {
        /// CSV document to import (current or legacy header).
        source: PathBuf,
    },
    /// List occurrences.
    List(ListArgs),
    /// Record a new occurrence.
    Add(OccurrenceArgs),
    /// Edit an existing occurrence.
    Edit {
        id: String,
        #[command(flatten)]
        fields: OccurrenceArgs,
    },
    /// Delete an occurrence.
    Remove { id: String },
    /// Per-person totals.
    Totals {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_enum, default_value_t = MetricArg::Minutes)]
        metric: MetricArg,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Dashboard figures for one day (defaults to today, UTC).
    Summary {
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the person ID a name would be stored under.
    PreviewId { name: String },
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    person_id: Option<String>,
    #[arg(long = "type")]
    occurrence_type: Option<String>,
    /// Accent/case-insensitive substring of the person name.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Date)]
    sort: SortArg,
}

#[derive(Args)]
struct OccurrenceArgs {
    #[arg(long)]
    name: String,
    /// `YYYY-MM-DD`
    #[arg(long)]
    date: String,
    /// `90`, `1:30` or `1h30m`
    #[arg(long)]
    duration: String,
    #[arg(long = "type")]
    occurrence_type: Option<String>,
}

impl From<OccurrenceArgs> for OccurrenceInput {
    fn from(value: OccurrenceArgs) -> Self {
        Self {
            person_name: value.name,
            occurrence_type: value.occurrence_type,
            date: value.date,
            duration: value.duration,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Duration,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Minutes,
    Count,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_exit module=cli status=error");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to start file logging")?;
    }

    let Some(csv_path) = cli.csv else {
        bail!("no CSV file given; pass --csv or set OCCURRENCES_CSV");
    };

    let mut service = OccurrenceService::new();
    service
        .connect(FileCsvStorage::new(&csv_path))
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let out = render::Output::new(cli.json);

    match cli.command {
        Command::Check => {
            out.conflicts(service.store().occurrences().len(), service.conflicts())?;
        }
        Command::Import { source } => {
            let text = std::fs::read_to_string(&source)
                .with_context(|| format!("failed to read {}", source.display()))?;
            let report = service.import_text(&text)?;
            service.save()?;
            out.import_report(&report)?;
        }
        Command::List(args) => {
            let query = OccurrenceQuery {
                person_id: args.person_id.map(PersonId::new),
                occurrence_type: args.occurrence_type,
                person_search: args.search,
                date: args.date,
                sort: match args.sort {
                    SortArg::Date => SortMode::DateDesc,
                    SortArg::Duration => SortMode::DurationDesc,
                },
            };
            out.occurrences(&service.store().query(&query))?;
        }
        Command::Add(fields) => {
            let created = service.record(&fields.into())?;
            out.occurrence(&created)?;
        }
        Command::Edit { id, fields } => {
            let updated = service.edit(&id, &fields.into())?;
            out.occurrence(&updated)?;
        }
        Command::Remove { id } => {
            let removed = service.remove(&id)?;
            out.occurrence(&removed)?;
        }
        Command::Totals {
            date,
            metric,
            limit,
        } => {
            let scope = AggregateScope {
                date,
                metric: match metric {
                    MetricArg::Minutes => AggregateMetric::Minutes,
                    MetricArg::Count => AggregateMetric::Count,
                },
                limit,
            };
            out.totals(&service.store().aggregate(&scope))?;
        }
        Command::Summary { date } => {
            let date = date.unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
            out.summary(&service.store().daily_summary(&date))?;
        }
        Command::PreviewId { name } => {
            out.preview_id(&name, &service.store().preview_person_id(&name))?;
        }
    }

    Ok(())
}
