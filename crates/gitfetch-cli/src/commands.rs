use std::time::Duration;

use anyhow::Context;
use colored::{ColoredString, Colorize};
use gitfetch_registry::{Registry, RegistryError, RegistryLocation};
use gitfetch_sync::{
    CancellationToken, FetchDispatcher, FetchReport, FetchSettings, GitFetcher, OutcomeKind,
    RepoOutcome,
};
use gitfetch_types::RepositoryPath;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let location = match cli.config {
        Some(file) => RegistryLocation::at(file),
        None => RegistryLocation::from_env()?,
    };
    let mut registry = Registry::open(location)?;

    match cli.command {
        None => cmd_fetch(&mut registry, cli.format, cli.timeout).await,
        Some(Command::Add(args)) => cmd_add(&mut registry, args),
        Some(Command::Remove(args)) => cmd_remove(&mut registry, args),
        Some(Command::List) => cmd_list(&registry, cli.format),
        Some(Command::Workers(args)) => cmd_workers(&mut registry, args),
    }
}

fn cmd_add(registry: &mut Registry, args: PathArgs) -> anyhow::Result<()> {
    let path = add_repository(registry, &args.path)?;
    registry.save()?;
    println!("{} Registered {}", "✓".green().bold(), path.to_string().bold());
    Ok(())
}

fn cmd_remove(registry: &mut Registry, args: PathArgs) -> anyhow::Result<()> {
    match remove_repository(registry, &args.path) {
        Ok(path) => {
            registry.save()?;
            println!("Removed {}", path.to_string().bold());
        }
        Err(RegistryError::NotFound(path)) => println!("{} not found", path.yellow()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn cmd_list(registry: &Registry, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(registry.document())?),
        OutputFormat::Text if registry.is_empty() => println!("No repositories"),
        OutputFormat::Text => {
            for path in registry.list() {
                println!("{path}");
            }
        }
    }
    Ok(())
}

fn cmd_workers(registry: &mut Registry, args: WorkersArgs) -> anyhow::Result<()> {
    let count = registry.set_workers(args.count)?;
    registry.save()?;
    println!("Using {} workers", count.get().to_string().bold());
    Ok(())
}

async fn cmd_fetch(registry: &mut Registry, format: OutputFormat, timeout: u64) -> anyhow::Result<()> {
    let paths = registry.list();
    if paths.is_empty() {
        println!("No repositories. Register one with {}", "gitfetch add PATH".bold());
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let deadline = (timeout > 0).then(|| Duration::from_secs(timeout));
    let watcher = spawn_cancel_triggers(cancel.clone(), deadline);

    let dispatcher = FetchDispatcher::new(GitFetcher::from_env(FetchSettings::default()));
    let result = dispatcher.fetch_all(paths, registry.worker_count(), cancel).await;
    watcher.abort();
    let report = result.context("fetch run could not start")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    let invalid = report.invalid_paths();
    if registry.prune(&invalid) > 0 {
        registry.save()?;
        for path in &invalid {
            eprintln!("{} unregistered {}", "!".yellow().bold(), path);
        }
    }
    Ok(())
}

/// Validate and register `input`. The registry is not saved.
fn add_repository(registry: &mut Registry, input: &str) -> anyhow::Result<RepositoryPath> {
    let path = normalize(RepositoryPath::parse(input)?);
    if let Err(e) = git2::Repository::open(path.as_path()) {
        anyhow::bail!("{input} is not a valid repository: {}", e.message());
    }
    registry.add(path.clone())?;
    Ok(path)
}

/// Unregister `input`, matching either its canonical form or the raw string.
fn remove_repository(registry: &mut Registry, input: &str) -> Result<RepositoryPath, RegistryError> {
    let raw = RepositoryPath::new(input);
    let canonical = normalize(raw.clone());
    if registry.remove(&canonical).is_ok() {
        return Ok(canonical);
    }
    registry.remove(&raw)?;
    Ok(raw)
}

fn normalize(path: RepositoryPath) -> RepositoryPath {
    match std::fs::canonicalize(path.as_path()) {
        Ok(abs) => RepositoryPath::new(abs.to_string_lossy()),
        Err(_) => path,
    }
}

fn status_label(kind: OutcomeKind) -> ColoredString {
    match kind {
        OutcomeKind::Fetched => kind.label().green().bold(),
        OutcomeKind::UpToDate => kind.label().green(),
        OutcomeKind::NotFetched => kind.label().red().bold(),
        OutcomeKind::InvalidRepository => kind.label().yellow().bold(),
        OutcomeKind::NotAttempted => kind.label().dimmed(),
    }
}

fn print_report(report: &FetchReport) {
    for outcome in &report.outcomes {
        let label = status_label(outcome.summary);
        match outcome.outcome.reason() {
            Some(reason) => println!("{}: {} ({})", outcome.path.to_string().bold(), label, reason),
            None => println!("{}: {}", outcome.path.to_string().bold(), label),
        }
        if let RepoOutcome::Synced { unresolved, .. } = &outcome.outcome {
            for err in unresolved {
                println!("  {} {}", "skipped".dimmed(), err);
            }
        }
    }

    let counts: Vec<String> = OutcomeKind::ALL
        .iter()
        .map(|kind| (kind, report.count(*kind)))
        .filter(|(_, n)| *n > 0)
        .map(|(kind, n)| format!("{n} {kind}"))
        .collect();
    println!("\n{} repositories: {}", report.len(), counts.join(", "));
}

/// Cancel `cancel` on SIGINT, SIGTERM, or once `deadline` elapses.
fn spawn_cancel_triggers(cancel: CancellationToken, deadline: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let expired = async {
            match deadline {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            () = shutdown_signal() => {}
            () = expired => warn!("deadline reached, cancelling pending fetches"),
            () = cancel.cancelled() => return,
        }
        cancel.cancel();
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, cancelling"),
        () = terminate => info!("received SIGTERM, cancelling"),
    }
}
