//! storescrub: sanitize per-application configuration stores.
//!
//! Editors and IDEs keep state in three unrelated formats: SQLite key/value
//! tables, JSON documents and XML option trees. This crate finds those files
//! across platform-specific install locations and either purges entries that
//! match a sensitive-term set or replaces identifier fields with fresh random
//! values.
//!
//! # Safety contract
//!
//! Every mutation goes through [`core::backup::Mutator::guarded`]:
//!
//! 1. the store must still exist;
//! 2. a byte copy is written to `<store>.backup` and digest-checked;
//! 3. the format adapter runs and the store is re-opened to verify it;
//! 4. on any error the backup is copied back and the outcome says whether
//!    that worked.
//!
//! Backups are never deleted. One store failing never stops the run.
//!
//! # Crate Structure
//!
//! - [`core`]: term codec, identifier generator, descriptors, locator,
//!   mutator, file lock, orchestrator, config and console output
//! - [`plugins`]: the tabular (SQLite), document (JSON) and tree (XML) adapters
//!
//! # Examples
//!
//! ```bash
//! # What would be touched
//! storescrub scan
//!
//! # Purge matching entries from every supported store
//! storescrub purge
//!
//! # Fresh telemetry identifiers for Cursor only, then lock the file
//! storescrub regenerate --app cursor --lock
//! ```

pub mod core;
pub mod plugins;

use crate::core::backup::MutationContext;
use crate::core::config::{self, ScrubConfig};
use crate::core::console::{ConsoleReporter, QuietReporter, Reporter};
use crate::core::descriptor::{self, ApplicationDescriptor, Layout, PlatformDirs};
use crate::core::error::ScrubError;
use crate::core::ident::FieldPlan;
use crate::core::locate;
use crate::core::orchestrate::Orchestrator;
use crate::core::outcome::RunSummary;
use crate::core::store::{DiscoveredStore, Operation};
use crate::core::terms;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "storescrub",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find and sanitize per-application configuration stores"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
    /// Restrict to these application keys (see `storescrub apps`).
    #[clap(long = "app", global = true)]
    apps: Vec<String>,
    /// Config file (defaults to <config_dir>/storescrub/config.toml).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text", global = true)]
    format: String,
    /// Make document stores read-only after regenerating identifiers.
    #[clap(long, global = true)]
    lock: bool,
    /// Skip scanning for VS Code-like editors under non-standard names.
    #[clap(long, global = true)]
    no_family_scan: bool,
    /// Process distinct stores concurrently.
    #[clap(long, global = true)]
    parallel: bool,
    /// Debug-level diagnostics on stderr.
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List built-in applications and the operations they support
    Apps,
    /// List discovered stores without changing anything
    Scan,
    /// Remove entries matching the sensitive-term set
    Purge,
    /// Replace identifier fields with fresh random values
    Regenerate,
    /// Purge, then regenerate
    All,
}

#[derive(Debug, Serialize)]
struct StoreListing {
    app: String,
    key: String,
    format: String,
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct AppListing {
    key: String,
    name: String,
    discovery: &'static str,
    operations: Vec<Operation>,
}

pub fn run() -> Result<(), ScrubError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = match cli.format.as_str() {
        "json" => true,
        "text" => false,
        other => {
            return Err(ScrubError::ConfigError(format!(
                "unknown output format '{}', expected 'text' or 'json'",
                other
            )));
        }
    };
    let config = config::load_config(cli.config.as_deref())?;
    let catalog = select_catalog(&cli, &config)?;
    let reporter: &dyn Reporter = if json {
        &QuietReporter as &dyn Reporter
    } else {
        &ConsoleReporter
    };

    match cli.command {
        Command::Apps => print_apps(&catalog, json),
        Command::Scan => {
            let dirs = PlatformDirs::detect();
            let stores = locate::discover(&catalog, &dirs);
            print_stores(&stores, json)
        }
        Command::Purge => execute(&cli, &config, &catalog, &[Operation::Purge], reporter, json),
        Command::Regenerate => execute(&cli, &config, &catalog, &[Operation::Regenerate], reporter, json),
        Command::All => execute(
            &cli,
            &config,
            &catalog,
            &[Operation::Purge, Operation::Regenerate],
            reporter,
            json,
        ),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("storescrub=debug")
        } else {
            EnvFilter::new("storescrub=warn")
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn select_catalog(cli: &Cli, config: &ScrubConfig) -> Result<Vec<ApplicationDescriptor>, ScrubError> {
    let builtin = descriptor::builtin();
    let keys = if cli.apps.is_empty() {
        config.discovery.apps.clone()
    } else {
        cli.apps.clone()
    };
    for key in &keys {
        if !builtin.iter().any(|d| d.key.eq_ignore_ascii_case(key)) {
            return Err(ScrubError::ConfigError(format!(
                "unknown application '{}' (see `storescrub apps`)",
                key
            )));
        }
    }
    let family = config.discovery.family_scan && !cli.no_family_scan;
    Ok(descriptor::select(builtin, &keys, family))
}

fn execute(
    cli: &Cli,
    config: &ScrubConfig,
    catalog: &[ApplicationDescriptor],
    ops: &[Operation],
    reporter: &dyn Reporter,
    json: bool,
) -> Result<(), ScrubError> {
    let dirs = PlatformDirs::detect();
    let stores: Vec<DiscoveredStore<'_>> = locate::discover(catalog, &dirs)
        .into_iter()
        .filter(|s| {
            ops.iter()
                .any(|op| s.format.supports(*op) && s.descriptor.supports(*op))
        })
        .collect();

    if stores.is_empty() {
        reporter.error("No supported stores found on this system");
        return Err(ScrubError::NotFound(
            "no store supports the requested operation".to_string(),
        ));
    }
    reporter.info(&format!("Found {} store(s)", stores.len()));

    let terms = terms::decode(config.seeds());
    if terms.is_empty() && ops.contains(&Operation::Purge) {
        reporter.warning("No usable search terms; purge will match nothing");
    }
    let plan = FieldPlan::telemetry();
    let ctx = MutationContext {
        terms: &terms,
        plan: &plan,
        lock: cli.lock || config.regenerate.lock,
    };

    let summary = Orchestrator::new(ctx, reporter)
        .parallel(cli.parallel)
        .run(&stores, ops);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        report_summary(&summary, reporter);
    }

    if summary.all_failed() {
        return Err(ScrubError::AllStoresFailed(summary.targeted()));
    }
    Ok(())
}

fn report_summary(summary: &RunSummary, reporter: &dyn Reporter) {
    let line = format!(
        "Summary: {} succeeded, {} unchanged, {} failed ({} entries affected)",
        summary.succeeded,
        summary.no_op,
        summary.failed,
        summary.total_affected()
    );
    if summary.failed == 0 {
        reporter.success(&line);
    } else if summary.all_failed() {
        reporter.error(&line);
    } else {
        reporter.warning(&line);
    }
}

fn print_apps(catalog: &[ApplicationDescriptor], json: bool) -> Result<(), ScrubError> {
    let listing: Vec<AppListing> = catalog
        .iter()
        .map(|d| AppListing {
            key: d.key.clone(),
            name: d.name.clone(),
            discovery: match d.layout {
                Layout::Rooted { .. } => "rooted",
                Layout::Family(_) => "family-scan",
            },
            operations: d.operations.clone(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    for app in &listing {
        let ops: Vec<&str> = app.operations.iter().map(|o| o.as_str()).collect();
        println!("  {:<16} {:<28} [{}] {}", app.key, app.name, app.discovery, ops.join(", "));
    }
    Ok(())
}

fn print_stores(stores: &[DiscoveredStore<'_>], json: bool) -> Result<(), ScrubError> {
    let listing: Vec<StoreListing> = stores
        .iter()
        .map(|s| StoreListing {
            app: s.descriptor.name.clone(),
            key: s.descriptor.key.clone(),
            format: s.format.to_string(),
            path: s.path.clone(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    if listing.is_empty() {
        println!("No stores found");
        return Ok(());
    }
    for s in &listing {
        println!("  [{:<8}] {}: {}", s.format, s.app, s.path.display());
    }
    println!("\n{} store(s) found", listing.len());
    Ok(())
}
