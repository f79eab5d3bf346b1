//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use crate::domain::{format_timestamp, parse_timestamp, Clock, DraftKind, FixedClock, SystemClock};
use crate::publisher::{Plan, Publisher};
use crate::storage::{Site, Tank};

#[derive(Parser)]
#[command(name = "blogpub")]
#[command(author, version, about = "Scheduled publishing for a blog draft backlog")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Site root that configured paths are relative to
    #[arg(long, global = true, env = "BLOGPUB_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Configuration file (defaults to blogpub.toml in the site root)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the draft and posted directories and a starter config
    Init,

    /// Publish one draft per due slot
    Publish {
        /// Treat this RFC 3339 instant as the current time
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Show what would be published without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the schedule and the drafts it would publish
    Status {
        /// Treat this RFC 3339 instant as the current time
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },

    /// List drafts in publish order
    Drafts,

    /// Create a new draft in the tank
    New {
        /// Post title
        title: String,

        /// Plain-text body (blank lines separate paragraphs)
        #[arg(long)]
        content: Option<String>,
    },

    /// Rebuild the root manifest from the partition manifests
    Rebuild,
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s).map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second install (e.g. from tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::new(cli.format);

    tracing::debug!(root = %cli.root.display(), "blogpub starting");

    match cli.command {
        Commands::Init => {
            let site = Site::init(&cli.root)?;
            tracing::debug!(
                tank = %site.tank_dir().display(),
                posted = %site.posted_dir().display(),
                "created site directories"
            );
            output.success(&format!("Initialized blog at {}", site.root().display()));
        }

        Commands::Publish { now, dry_run } => {
            let site = open_site(&cli.root, cli.config.as_deref())?;
            match now {
                Some(now) => publish(&site, FixedClock(now), dry_run, &output)?,
                None => publish(&site, SystemClock, dry_run, &output)?,
            }
        }

        Commands::Status { now } => {
            let site = open_site(&cli.root, cli.config.as_deref())?;
            let plan = match now {
                Some(now) => Publisher::new(&site, FixedClock(now))?.plan()?,
                None => Publisher::new(&site, SystemClock)?.plan()?,
            };
            show_plan(&plan, &output);
        }

        Commands::Drafts => {
            let site = open_site(&cli.root, cli.config.as_deref())?;
            list_drafts(&site, &output)?;
        }

        Commands::New { title, content } => {
            let site = open_site(&cli.root, cli.config.as_deref())?;
            if title.trim().is_empty() {
                anyhow::bail!("Title must not be empty");
            }
            let path = site.tank().create(&title, content.as_deref().unwrap_or(""))?;
            if output.is_json() {
                output.data(&serde_json::json!({
                    "title": title.trim(),
                    "path": path,
                }));
            } else {
                output.success(&format!("Created draft {}", path.display()));
            }
        }

        Commands::Rebuild => {
            let site = open_site(&cli.root, cli.config.as_deref())?;
            let manifest = site.manifests().rebuild_root()?;
            if output.is_json() {
                output.data(&manifest);
            } else {
                output.success(&format!(
                    "Rebuilt root manifest with {} post(s).",
                    manifest.len()
                ));
            }
        }
    }

    Ok(())
}

fn open_site(root: &Path, config: Option<&Path>) -> Result<Site> {
    match config {
        Some(path) => Site::open_with_config(root, path)
            .with_context(|| format!("Failed to open site with config {}", path.display())),
        None => Site::open(root),
    }
}

fn publish<C: Clock>(site: &Site, clock: C, dry_run: bool, output: &Output) -> Result<()> {
    let publisher = Publisher::new(site, clock)?;

    if dry_run {
        let plan = publisher.plan()?;
        if output.is_json() {
            output.data(&plan);
        } else {
            for planned in &plan.slots {
                output.row(&[&format_timestamp(planned.slot), &planned.draft.display().to_string()]);
            }
            output.success(&format!(
                "Would publish {} post(s) ({} slot(s) due, {} draft(s)).",
                plan.slots.len(),
                plan.due,
                plan.drafts
            ));
        }
        return Ok(());
    }

    let report = publisher.run()?;
    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    if let Some(recovery) = &report.recovery {
        output.success(&format!(
            "Finished {} commit(s) from an interrupted run.",
            recovery.commits
        ));
    }
    for entry in &report.published {
        output.row(&[&entry.date, &entry.url]);
    }
    for skipped in &report.skipped {
        output.row(&["skipped", &skipped.path.display().to_string(), &skipped.reason]);
    }
    output.success(&report.summary());
    Ok(())
}

fn show_plan(plan: &Plan, output: &Output) {
    if output.is_json() {
        output.data(plan);
        return;
    }

    let seeded = if plan.seeded { " (backfill start)" } else { "" };
    println!("Last published: {}{}", format_timestamp(plan.last_published_at), seeded);
    println!("Next due:       {}", format_timestamp(plan.next_due));
    println!("Slots due:      {}", plan.due);
    println!("Drafts:         {}", plan.drafts);
    if plan.pending_commits > 0 {
        println!("Pending:        {} commit(s) from an interrupted run", plan.pending_commits);
    }
    for planned in &plan.slots {
        println!("  {}  {}", format_timestamp(planned.slot), planned.draft.display());
    }
}

fn list_drafts(site: &Site, output: &Output) -> Result<()> {
    let drafts = site.tank().list()?;

    if output.is_json() {
        let items: Vec<_> = drafts
            .iter()
            .map(|path| match Tank::read_unit(path) {
                Ok(unit) => serde_json::json!({
                    "path": path,
                    "slug": unit.slug,
                    "title": unit.title,
                    "kind": kind_name(unit.kind),
                }),
                Err(e) => serde_json::json!({
                    "path": path,
                    "error": e.to_string(),
                }),
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if drafts.is_empty() {
        output.success("No items in the tank.");
        return Ok(());
    }

    for path in &drafts {
        let name = path.display().to_string();
        match Tank::read_unit(path) {
            Ok(unit) => output.row(&[unit.slug.as_str(), kind_name(unit.kind), &unit.title]),
            Err(e) => output.row(&[&name, "unreadable", &e.to_string()]),
        }
    }
    Ok(())
}

fn kind_name(kind: DraftKind) -> &'static str {
    match kind {
        DraftKind::Bundle => "bundle",
        DraftKind::Flat => "flat",
    }
}
