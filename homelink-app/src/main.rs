// homelink -- command-line host for the homelink device adapters.
//
// Reads a TOML file describing Nuvo zones, BenQ projectors and HAI panel
// entities, then polls or commands them.
//
// Usage:
//   homelink --config homelink.toml status
//   homelink --config homelink.toml poll
//   homelink zone 1 on
//   homelink zone 1 source Sonos
//   homelink zone 1 volume 0.5
//   homelink zone 1 mute true
//   homelink zone 1 snapshot-restore 60
//   homelink projector on
//   homelink --log-level debug projector --name "Theater Projector" status
//   homelink light 12 on 128
//   homelink switch 14 off

mod config;
mod devices;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use homelink::nuvo::NuvoZone;
use homelink::{Entity, EntityEvent, Light, MediaPlayer, Switch};

use crate::config::AppConfig;
use crate::devices::{Devices, print_table, row, zone_row};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// homelink -- poll and control home-theater and home-control devices.
#[derive(Parser)]
#[command(name = "homelink", version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, short, default_value = "homelink.toml")]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set (e.g. info, debug,
    /// homelink_nuvo=trace).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Update every configured entity once and print a table.
    Status,

    /// Poll every entity forever at the configured interval.
    Poll,

    /// Control a Nuvo zone.
    Zone {
        /// Zone number (1-6).
        id: u8,
        #[command(subcommand)]
        action: ZoneAction,
    },

    /// Control a BenQ projector.
    Projector {
        /// Projector name; defaults to the first configured projector.
        #[arg(long)]
        name: Option<String>,
        #[command(subcommand)]
        action: ProjectorAction,
    },

    /// Control an HAI light.
    Light {
        /// Light id on the panel.
        id: String,
        #[command(subcommand)]
        action: LightAction,
    },

    /// Control an HAI switch.
    Switch {
        /// Switch id on the panel.
        id: String,
        action: OnOff,
    },
}

#[derive(Subcommand)]
enum ZoneAction {
    On,
    Off,
    /// Select a source by its configured name.
    Source { name: String },
    /// Set volume, 0.0 (silent) to 1.0 (loudest).
    Volume { level: f64 },
    /// Request mute or unmute. The amplifier only toggles.
    Mute { state: Toggle },
    /// One volume step louder.
    Up,
    /// One volume step quieter.
    Down,
    /// Remember the zone's status, hold for a while, then put it back.
    ///
    /// Ctrl-C ends the hold early; the zone is still restored.
    SnapshotRestore {
        /// Seconds to hold before restoring.
        #[arg(default_value_t = 30)]
        hold_secs: u64,
    },
}

#[derive(Subcommand)]
enum ProjectorAction {
    On,
    Off,
    /// Power state, lamp hours, input and lamp mode.
    Status,
}

#[derive(Subcommand)]
enum LightAction {
    /// Turn on, optionally at a brightness (0-255).
    On { brightness: Option<u8> },
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnOff {
    On,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    True,
    False,
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

async fn load_devices(cli: &Cli) -> Result<(AppConfig, Devices)> {
    let config = AppConfig::load(&cli.config)?;
    if config.is_empty() {
        bail!("{} configures no devices", cli.config.display());
    }
    let devices = Devices::connect(&config).await?;
    if devices.is_empty() {
        warn!("configuration names no entities");
    }
    Ok((config, devices))
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_status(devices: &mut Devices) -> Result<()> {
    let failures = devices.update_all().await;
    print_table(&devices.rows());

    if failures > 0 {
        println!();
        println!("{failures} of {} entities could not be updated.", devices.len());
    }
    Ok(())
}

async fn cmd_poll(config: &AppConfig, devices: &mut Devices) -> Result<()> {
    let mut receivers = devices.subscribe_all();
    let mut interval = tokio::time::interval(config.poll_interval());

    println!(
        "Polling {} entities every {}s (Ctrl-C to stop)...",
        devices.len(),
        config.poll_interval_secs
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let failures = devices.update_all().await;
                debug!(failures, "Poll complete");
                drain_events(&mut receivers);
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                println!("Stopping.");
                return Ok(());
            }
        }
    }
}

fn drain_events(receivers: &mut [tokio::sync::broadcast::Receiver<EntityEvent>]) {
    for rx in receivers.iter_mut() {
        loop {
            match rx.try_recv() {
                Ok(event) => println!("[event] {event:?}"),
                Err(TryRecvError::Lagged(n)) => {
                    warn!(missed = n, "Event consumer too slow");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

async fn cmd_zone(devices: &mut Devices, id: u8, action: &ZoneAction) -> Result<()> {
    let zone = devices.zone_mut(id)?;

    // Volume steps and mute need the current reading.
    zone.update()
        .await
        .with_context(|| format!("zone {id} did not answer"))?;

    match action {
        ZoneAction::On => zone.turn_on().await?,
        ZoneAction::Off => zone.turn_off().await?,
        ZoneAction::Source { name } => {
            if !zone.source_list().iter().any(|s| s == name) {
                bail!(
                    "unknown source '{name}'. Configured: {}",
                    zone.source_list().join(", ")
                );
            }
            zone.select_source(name).await?;
        }
        ZoneAction::Volume { level } => {
            if !(0.0..=1.0).contains(level) {
                bail!("volume must be between 0.0 and 1.0, got {level}");
            }
            zone.set_volume_level(*level).await?;
        }
        ZoneAction::Mute { state } => {
            zone.mute_volume(matches!(state, Toggle::True)).await?;
        }
        ZoneAction::Up => zone.volume_up().await?,
        ZoneAction::Down => zone.volume_down().await?,
        ZoneAction::SnapshotRestore { hold_secs } => {
            snapshot_hold_restore(zone, Duration::from_secs(*hold_secs)).await?;
        }
    }
    info!(zone = %zone.info().name, "Command sent");

    zone.update().await.ok();
    print_table(&[zone_row(zone)]);
    Ok(())
}

/// Snapshot `zone`, wait out `hold` (or Ctrl-C), then restore it.
async fn snapshot_hold_restore(zone: &mut NuvoZone, hold: Duration) -> Result<()> {
    zone.snapshot().await.context("snapshot failed")?;
    if let Some(status) = zone.snapshot_status() {
        println!("Snapshot of zone {}: {status:?}", zone.zone_id());
    }

    if !hold.is_zero() {
        println!("Holding for {}s (Ctrl-C to restore now)...", hold.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(hold) => {}
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
            }
        }
    }

    zone.restore().await.context("restore failed")?;
    Ok(())
}

async fn cmd_projector(
    devices: &mut Devices,
    name: Option<&str>,
    action: &ProjectorAction,
) -> Result<()> {
    let projector = devices.projector_mut(name)?;

    match action {
        ProjectorAction::On => {
            projector.turn_on().await?;
            println!("{}: on", projector.info().name);
        }
        ProjectorAction::Off => {
            projector.turn_off().await?;
            println!("{}: off", projector.info().name);
        }
        ProjectorAction::Status => {
            projector
                .update()
                .await
                .with_context(|| format!("{} did not answer", projector.info().name))?;
            println!("Name:       {}", projector.info().name);
            println!("Power:      {}", projector.state());
            for (label, value) in projector.attributes().entries() {
                println!("{:<11} {}", format!("{label}:"), value);
            }
            match projector.model_name().await {
                Ok(model) => println!("{:<11} {}", "Model:", model),
                Err(e) => debug!(error = %e, "Model name query failed"),
            }
        }
    }
    Ok(())
}

async fn cmd_light(devices: &mut Devices, id: &str, action: &LightAction) -> Result<()> {
    let light = devices.light_mut(id)?;

    match action {
        LightAction::On { brightness: None } => light.turn_on().await?,
        LightAction::On {
            brightness: Some(b),
        } => light.turn_on_with_brightness(*b).await?,
        LightAction::Off => light.turn_off().await?,
    }

    print_table(&[row(light, format!("brightness {}", light.brightness()))]);
    Ok(())
}

async fn cmd_switch(devices: &mut Devices, id: &str, action: OnOff) -> Result<()> {
    let switch = devices.switch_mut(id)?;

    match action {
        OnOff::On => switch.turn_on().await?,
        OnOff::Off => switch.turn_off().await?,
    }
    println!("{}: {}", switch.info().name, switch.state());
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let (config, mut devices) = load_devices(&cli).await?;

    match &cli.command {
        Command::Status => cmd_status(&mut devices).await,
        Command::Poll => cmd_poll(&config, &mut devices).await,
        Command::Zone { id, action } => cmd_zone(&mut devices, *id, action).await,
        Command::Projector { name, action } => {
            cmd_projector(&mut devices, name.as_deref(), action).await
        }
        Command::Light { id, action } => cmd_light(&mut devices, id, action).await,
        Command::Switch { id, action } => cmd_switch(&mut devices, id, *action).await,
    }
}
