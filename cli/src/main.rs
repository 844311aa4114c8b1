//! Smart Parking CLI host
//!
//! Drives the parking store from the command line against an in-memory
//! feed. Useful for checking configs and replaying recorded feed snapshots.
//!
//! ```sh
//! # Validate config (default ~/.config/smart-parking/config.toml)
//! parking-cli check
//!
//! # Show the board for a recorded snapshot
//! parking-cli status --snapshot feed.json
//!
//! # Book car spot 2 for two hours
//! parking-cli book car 2 --user Alice --vehicle TN01AB1234 --hours 2
//!
//! # Replay newline-delimited snapshots from stdin
//! parking-cli watch < feed.ndjson
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use smart_parking::support::logging::init_tracing;
use smart_parking::support::shutdown::listen_for_ctrl_c;
use smart_parking::{
    default_config_path, spawn_feed_listener, AppConfig, Category, FeedMessage, FeedSnapshot,
    InMemoryFeed, ParkingStateStore, ParkingView, ShutdownSignal,
};

#[derive(Parser, Debug)]
#[command(
    name = "parking-cli",
    version,
    about = "Parking spot board and booking against a sensor feed"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file and exit.
    Check,
    /// Apply a feed snapshot and print the board.
    Status {
        /// JSON file holding the feed root document.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Book a spot, optionally after applying a snapshot.
    Book {
        category: Category,
        spot: u32,
        #[arg(long)]
        user: String,
        #[arg(long)]
        vehicle: String,
        /// One of 1, 2, 3, 4, 8, 24.
        #[arg(long, default_value_t = 1)]
        hours: u32,
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Cancel the booking again right after it is confirmed.
        #[arg(long)]
        then_cancel: bool,
    },
    /// Read newline-delimited feed snapshots from stdin and print the board
    /// after each one.
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let (mut config, load_error) = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::default(), Some(e)),
        }
    } else {
        (AppConfig::default(), None)
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config.logging);

    if let Some(e) = load_error {
        if matches!(cli.command, Command::Check) {
            return Err(e.into());
        }
        error!("Failed to load config from {}: {}", config_path.display(), e);
        error!("Using default configuration.");
    } else {
        info!("Configuration: {}", config_path.display());
    }

    match cli.command {
        Command::Check => {
            println!("Configuration is valid");
            println!("   Config file   : {}", config_path.display());
            println!("   Feed root     : {}", config.feed.root_path);
            println!("   Write timeout : {}ms", config.feed.write_timeout_ms);
            for category in Category::ALL {
                println!("   {:<13} : {} spots", category.label(), config.pools.size(category));
            }
            println!("   Log level     : {}", config.logging.level);
            Ok(())
        }
        Command::Status { snapshot } => {
            let store = ParkingStateStore::new(&config, Arc::new(InMemoryFeed::new()));
            if let Some(path) = snapshot {
                store.apply_feed_update(&read_snapshot(&path)?).await;
            }
            print_board(&store.view().await);
            Ok(())
        }
        Command::Book {
            category,
            spot,
            user,
            vehicle,
            hours,
            snapshot,
            then_cancel,
        } => {
            let feed = Arc::new(InMemoryFeed::new());
            let store = ParkingStateStore::new(&config, feed.clone());
            if let Some(path) = snapshot {
                store.apply_feed_update(&read_snapshot(&path)?).await;
            }

            let booking = store
                .request_booking(category, spot, &user, &vehicle, hours)
                .await?;
            println!("Parking spot {} booked successfully!", spot);
            println!("{}", serde_json::to_string_pretty(&booking)?);
            for path in feed.paths() {
                println!("   written: {}", path);
            }

            if then_cancel {
                store.cancel_booking(category, spot).await?;
                println!("Booking cancelled successfully!");
            }
            print_board(&store.view().await);
            Ok(())
        }
        Command::Watch => watch(config).await,
    }
}

fn read_snapshot(path: &Path) -> Result<FeedSnapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

async fn watch(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = ParkingStateStore::shared(&config, Arc::new(InMemoryFeed::new()));
    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_ctrl_c(shutdown.clone()));

    let (tx, rx) = mpsc::channel(16);
    let mut events = store.subscribe();
    let listener = spawn_feed_listener(store.clone(), rx, shutdown.clone());

    let printer = tokio::spawn(async move {
        while let Some(message) = events.recv().await {
            if message.event.event_type() == "feed_applied" || message.event.event_type() == "feed_error" {
                print_board(&message.view);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => {
                        let message = match serde_json::from_str(&line) {
                            Ok(value) => FeedMessage::Snapshot(value),
                            Err(e) => {
                                warn!("Unreadable snapshot line: {}", e);
                                FeedMessage::Error(e.to_string())
                            }
                        };
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = shutdown.notified().wait() => break,
        }
    }

    drop(tx);
    listener.await?;
    // The store owns the bus; dropping it ends the printer.
    drop(store);
    printer.await?;
    Ok(())
}

fn print_board(view: &ParkingView) {
    let connection = if view.loading {
        "waiting for feed"
    } else if view.connected {
        "connected"
    } else {
        "disconnected"
    };
    println!("── Parking board ({}) ──", connection);

    for category in Category::ALL {
        let summary = view.summary.get(category);
        println!(
            "{}: {} available / {} occupied / {} total",
            category.label(),
            summary.available_count,
            summary.occupied_count,
            summary.total_count
        );
        for spot in view.spots(category) {
            let booking = spot
                .booking
                .as_ref()
                .map(|b| format!("  {} {} {}", b.user_name, b.vehicle_number, b.duration))
                .unwrap_or_default();
            println!("   #{:<3} {:<10} sensor {:<8}{}", spot.id, spot.status(), spot.sensor_id, booking);
        }
    }

    if let Some(feed_summary) = &view.feed_summary {
        if !feed_summary.agrees_with(&view.summary) {
            println!("(gateway summary differs from spot data)");
        }
    }
}
