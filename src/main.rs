use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use jsonwatch::{
    CycleReport, FileStore, Overrides, PathAddress, PollScheduler, RoutingFetcher, Sampler,
    Settings,
};

#[derive(Parser, Debug)]
#[command(name = "jsonwatch")]
#[command(about = "Track values inside a polled JSON document as time series")]
struct Args {
    /// TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Document URL (http://, https:// or file://)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Polling interval in milliseconds (minimum 100)
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// Directory for persisted selection and series
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll until Ctrl-C, printing every sampled value
    Watch,
    /// Run a single cycle and print the fetched document
    Sample,
    /// Start tracking a path (e.g. `stats.items.0.count`)
    Track { path: String },
    /// Stop tracking a path, keeping its series
    Untrack { path: String },
    /// Track a path if untracked, untrack it otherwise
    Toggle { path: String },
    /// Stop tracking a path and delete its series
    Delete { path: String },
    /// List tracked paths and stored series
    List,
    /// Print a series as JSON, most recent first
    Export {
        path: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        url: args.url,
        interval_ms: args.interval,
        store_dir: args.store,
        log_level: args.log_level,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;
    init_tracing(&settings.log_level);

    let fetcher = RoutingFetcher::new().context("failed to create HTTP client")?;
    let sampler = Arc::new(Sampler::open(
        settings.url.clone(),
        Arc::new(fetcher),
        Arc::new(FileStore::new(&settings.store_dir)),
    ));

    match args.command {
        Command::Watch => run_watch(sampler, settings.interval()),
        Command::Sample => run_sample(&sampler),
        Command::Track { path } => {
            let address = parse_path(&path);
            if sampler.select(address) {
                println!("Tracking {}", path);
            } else {
                println!("Already tracking {}", path);
            }
            check_saved(&sampler)
        }
        Command::Untrack { path } => {
            let address = parse_path(&path);
            if sampler.deselect(&address) {
                println!("Stopped tracking {} (series kept)", path);
            } else {
                println!("Not tracking {}", path);
            }
            check_saved(&sampler)
        }
        Command::Toggle { path } => {
            if sampler.toggle(parse_path(&path)) {
                println!("Tracking {}", path);
            } else {
                println!("Stopped tracking {} (series kept)", path);
            }
            check_saved(&sampler)
        }
        Command::Delete { path } => {
            if sampler.delete_path(&parse_path(&path)) {
                println!("Deleted {}", path);
            } else {
                println!("Nothing stored for {}", path);
            }
            check_saved(&sampler)
        }
        Command::List => {
            list(&sampler);
            Ok(())
        }
        Command::Export { path, output } => export(&sampler, &path, output),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_path(token: &str) -> PathAddress {
    PathAddress::from_token(token)
}

fn check_saved(sampler: &Sampler) -> Result<()> {
    match sampler.persist_warning() {
        Some(warning) => bail!("change was not saved: {}", warning),
        None => Ok(()),
    }
}

/// Poll with the scheduler until Ctrl-C
fn run_watch(sampler: Arc<Sampler>, interval: Duration) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let (tx, mut rx) = mpsc::channel(64);
        let mut scheduler = PollScheduler::new(sampler.clone()).with_reports(tx);

        if sampler.selection().is_empty() {
            eprintln!("No paths tracked yet; use `jsonwatch track <path>`.");
        }
        eprintln!(
            "Polling {} every {} ms (Ctrl-C to stop)",
            sampler.url(),
            scheduler.start(interval).as_millis()
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                report = rx.recv() => match report {
                    Some(report) => print_report(&sampler, &report),
                    None => break,
                },
            }
        }

        scheduler.shutdown().await;
        Ok(())
    })
}

fn print_report(sampler: &Sampler, report: &CycleReport) {
    if let Some(err) = &report.fetch_error {
        println!("{} fetch failed: {}", report.started_at_ms, err);
        return;
    }

    sampler.with_state(|state| {
        for path in &report.appended {
            let Some(latest) = state.series.get(path).and_then(|s| s.latest()) else {
                continue;
            };
            match latest.normalized {
                Some(normalized) => println!(
                    "{} {} → {} ({:.3})",
                    latest.timestamp_ms, path, latest.value, normalized
                ),
                None => println!("{} {} → {}", latest.timestamp_ms, path, latest.value),
            }
        }
    });

    for path in &report.absent {
        println!("{} {} (absent)", report.started_at_ms, path);
    }
    if let Some(err) = &report.persist_error {
        eprintln!("warning: state not saved: {}", err);
    }
}

/// Run one cycle and print the document
fn run_sample(sampler: &Sampler) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(sampler.run_cycle());

    println!("{}", serde_json::to_string_pretty(&report.document)?);
    print_report(sampler, &report);

    match report.fetch_error {
        Some(err) => Err(err).with_context(|| format!("failed to fetch {}", report.url)),
        None => Ok(()),
    }
}

fn list(sampler: &Sampler) {
    sampler.with_state(|state| {
        if state.selection.is_empty() && state.series.is_empty() {
            println!("Nothing tracked.");
            return;
        }

        println!("{:<40} {:>8}  LATEST", "PATH", "SAMPLES");
        for path in state.selection.iter() {
            let series = state.series.get(path);
            let len = series.map_or(0, |s| s.len());
            let latest = series
                .and_then(|s| s.latest())
                .map(|o| o.value.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:<40} {:>8}  {}", path.to_string(), len, latest);
        }

        let untracked: Vec<_> = state
            .series
            .iter()
            .filter(|(path, _)| !state.selection.contains(path))
            .collect();
        if !untracked.is_empty() {
            println!();
            println!("Untracked series:");
            for (path, series) in untracked {
                println!("{:<40} {:>8}", path.to_string(), series.len());
            }
        }
    });
}

fn export(sampler: &Sampler, token: &str, output: Option<PathBuf>) -> Result<()> {
    let Some(json) = sampler.export(&parse_path(token))? else {
        bail!("no series stored for {}", token);
    };

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} to {}", token, path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
