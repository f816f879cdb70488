use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use prometheus_behavior::behaviors::{BehaviorManager, EventRelay};
use prometheus_behavior::bus::ChannelBus;
use prometheus_behavior::common::{Location, ScheduledEvent};
use prometheus_behavior::config::BehaviorConfig;
use prometheus_behavior::control::SimulatedBase;
use prometheus_behavior::navigation::{MemoryLocationStore, NAVIGATION_RESPONSE};
use prometheus_behavior::BehaviorCore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Run the behavior handlers against a simulated base
#[derive(Parser, Debug)]
#[command(name = "behavior_sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Behavior parameters (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Locations, events and responses (JSON); a small demo map if omitted
    #[arg(long, value_name = "PATH")]
    locations: Option<PathBuf>,

    /// Emotional state to start in
    #[arg(long, default_value = "neutral")]
    emotion: String,

    /// Something a person says, heard ten seconds apart in order
    #[arg(long = "say")]
    utterances: Vec<String>,

    /// Seconds the simulated base needs to reach a goal
    #[arg(long, default_value_t = 8)]
    travel_secs: u64,

    /// Stop after this many seconds
    #[arg(long, default_value_t = 120)]
    duration: u64,
}

fn demo_store(map: &str) -> MemoryLocationStore {
    let now = Local::now();
    let lab = Location::new("robotics lab", map, 12.0, 4.0)
        .with_environment(0.3)
        .with_crowded(true);
    MemoryLocationStore::new()
        .with_location(Location::new("office", map, 0.0, 0.0).with_environment(0.1))
        .with_location(
            Location::new("cafeteria", map, 25.0, -3.0)
                .with_environment(0.2)
                .with_crowded(true),
        )
        .with_location(lab.clone())
        .with_event(ScheduledEvent {
            name: "open lab".to_string(),
            location: lab,
            start: now,
            end: now + chrono::Duration::hours(2),
        })
        .with_response(NAVIGATION_RESPONSE, "happy", "I really like the LOCATION")
        .with_response(NAVIGATION_RESPONSE, "neutral", "The LOCATION is fine I guess")
        .with_response(NAVIGATION_RESPONSE, "angry", "Do not talk to me about the LOCATION")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BehaviorConfig::from_json_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => BehaviorConfig::default(),
    };
    let store = match &args.locations {
        Some(path) => MemoryLocationStore::from_json_file(path)
            .with_context(|| format!("loading locations from {}", path.display()))?,
        None => demo_store(&config.map_name),
    };
    info!(
        map = %config.map_name,
        locations = store.locations.len(),
        events = store.events.len(),
        "starting behavior simulation"
    );

    let (bus, mut outbound) = ChannelBus::new();
    let base = Arc::new(SimulatedBase::new(Duration::from_secs(args.travel_secs)));
    let manager = BehaviorManager::new(config, base, Arc::new(store), Arc::new(bus));
    manager.on_emotion(&args.emotion);

    let mut core = BehaviorCore::new();
    core.register(manager);
    core.init()?;

    {
        let manager: &BehaviorManager = core
            .behavior_manager_mut()
            .context("behavior manager is not registered")?;
        let script = async {
            for text in args.utterances {
                tokio::time::sleep(Duration::from_secs(10)).await;
                info!(%text, "human says");
                manager.on_speech(&text);
            }
            std::future::pending::<()>().await
        };
        tokio::select! {
            _ = EventRelay::new().run(manager, &mut outbound) => {}
            _ = script => {}
            _ = tokio::time::sleep(Duration::from_secs(args.duration)) => info!("simulation finished"),
            _ = tokio::signal::ctrl_c() => info!("interrupted"),
        }
    }

    if let Err(e) = core.shutdown() {
        warn!(error = %e, "shutdown failed");
    }
    Ok(())
}
