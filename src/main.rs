//! Activity Sync CLI
//!
//! Terminal front end for the activity-recognition service.

use activity_sync::{
    view::{activity_style, format_confidence, format_timestamp, stats_view},
    BlockingDataClient, Completion, Config, HistoryScreen, HistoryStatus, HistoryWindow,
    HttpTransport, LiveScreen, SyncEvent, SyncSession, VERSION,
};
use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "activity-sync")]
#[command(version = VERSION)]
#[command(about = "Live activity recognition monitor", long_about = None)]
struct Cli {
    /// Override the activity service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the service and show live predictions and counts
    Watch {
        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Show recorded predictions for a time window
    History {
        /// Lookback window in hours (1, 6, 24 or 168)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Fetch the latest prediction once
    Realtime,

    /// Fetch aggregate counts once
    Stats,

    /// Show configuration
    Config,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = load_config(cli.base_url).and_then(|config| match cli.command {
        Commands::Watch { interval_ms } => cmd_watch(config, interval_ms),
        Commands::History { hours } => cmd_history(config, hours),
        Commands::Realtime => cmd_realtime(config),
        Commands::Stats => cmd_stats(config),
        Commands::Config => cmd_config(config),
    });

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("activity_sync=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(base_url: Option<String>) -> anyhow::Result<Config> {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config ({e}); using defaults");
            Config::default()
        }
    };
    if let Some(url) = base_url {
        config.base_url = url;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_watch(mut config: Config, interval_ms: Option<u64>) -> anyhow::Result<()> {
    if let Some(ms) = interval_ms {
        config.poll_interval = Duration::from_millis(ms);
        config.validate()?;
    }

    println!("Activity Sync v{VERSION}");
    println!("  Service: {}", config.base_url);
    println!("  Poll interval: {}ms", config.poll_interval.as_millis());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    runtime.block_on(async {
        let (mut session, mut events) = SyncSession::connect(&config)?;
        session.start_polling(config.poll_interval)?;

        let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel();
        ctrlc::set_handler(move || {
            let _ = stop_tx.send(());
        })
        .context("Error setting Ctrl+C handler")?;

        let mut screen = LiveScreen::new();
        loop {
            tokio::select! {
                _ = stop_rx.recv() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        if screen.apply(&event) {
                            render_live(&screen, &event);
                        }
                    }
                    None => break,
                },
            }
        }

        println!();
        println!("Stopping...");
        let ledger = session.ledger().clone();
        session.teardown();
        println!();
        println!("{}", ledger.summary());
        anyhow::Ok(())
    })
}

fn render_live(screen: &LiveScreen, event: &SyncEvent) {
    let now = Utc::now().format("%H:%M:%S");
    match event {
        SyncEvent::Realtime(_) => {
            let view = &screen.realtime;
            println!(
                "[{now}] {} {:<20} Confidence: {:>6}  Updated: {}",
                view.icon, view.activity, view.confidence, view.updated
            );
        }
        SyncEvent::RealtimeFailed(_) => {
            if let Some(notice) = &screen.notice {
                eprintln!("[{now}] {notice}");
            }
        }
        SyncEvent::Stats(_) => {
            if let Some(stats) = &screen.stats {
                println!(
                    "[{now}] Total: {} | Walking: {} | Running: {} | Idle: {}",
                    stats.total, stats.walking, stats.running, stats.idle
                );
            }
        }
        _ => {}
    }
}

fn cmd_history(config: Config, hours: Option<u32>) -> anyhow::Result<()> {
    let window = match hours {
        Some(h) => HistoryWindow::try_from(h).map_err(anyhow::Error::msg)?,
        None => config.default_window,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    let screen = runtime.block_on(async {
        let (mut session, mut events) = SyncSession::connect(&config)?;
        let mut screen = HistoryScreen::new(window);
        screen.begin_load(window);
        session.load_history(window)?;

        while screen.is_loading() {
            match events.recv().await {
                Some(event) => {
                    screen.apply(&event);
                }
                None => break,
            }
        }
        session.teardown();
        anyhow::Ok(screen)
    })?;

    println!("Activity History ({})", screen.window);
    println!("==========================");
    println!();

    match &screen.status {
        HistoryStatus::Loaded => {
            for row in &screen.rows {
                println!(
                    "{:<20} {:>7}  {}",
                    row.activity, row.confidence, row.timestamp
                );
            }
            println!();
            println!("{} record(s)", screen.rows.len());
        }
        HistoryStatus::Empty => println!("No records found"),
        HistoryStatus::Failed(message) => bail!("{message}"),
        HistoryStatus::Idle | HistoryStatus::Loading => bail!("History load did not complete"),
    }
    Ok(())
}

/// Blocking client whose request is cancelled by Ctrl+C.
fn blocking_client(config: &Config) -> anyhow::Result<BlockingDataClient<HttpTransport>> {
    let transport = HttpTransport::from_config(config)?;
    let client = BlockingDataClient::new(transport)?;
    let canceller = client.canceller();
    ctrlc::set_handler(move || canceller.cancel_all()).context("Error setting Ctrl+C handler")?;
    Ok(client)
}

fn cmd_realtime(config: Config) -> anyhow::Result<()> {
    let client = blocking_client(&config)?;
    match client.fetch_realtime() {
        Completion::Finished(Ok(prediction)) => {
            let style = activity_style(&prediction.activity);
            println!("{} {}", style.icon, prediction.activity);
            println!("Confidence: {}", format_confidence(prediction.confidence));
            println!("Updated: {}", format_timestamp(&prediction.timestamp));
            Ok(())
        }
        Completion::Finished(Err(e)) => Err(e.into()),
        Completion::Cancelled => bail!("Request was cancelled"),
    }
}

fn cmd_stats(config: Config) -> anyhow::Result<()> {
    let client = blocking_client(&config)?;
    match client.fetch_stats() {
        Completion::Finished(Ok(stats)) => {
            let view = stats_view(&stats);
            println!("Total records: {}", view.total);
            println!("  Walking: {}", view.walking);
            println!("  Running: {}", view.running);
            println!("  Idle: {}", view.idle);
            if let Some(calibrating) = view.calibrating {
                println!("  Calibrating: {calibrating}");
            }
            Ok(())
        }
        Completion::Finished(Err(e)) => Err(e.into()),
        Completion::Cancelled => bail!("Request was cancelled"),
    }
}

fn cmd_config(config: Config) -> anyhow::Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
