//! Poll Nuvo zones and print entity events as they arrive.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run -p homelink --example monitor_zones -- 192.168.1.50
//! ```

use std::time::Duration;

use homelink::nuvo::NuvoBuilder;
use homelink::{Entity, EntityEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.1.50".to_string());

    println!("Connecting to Nuvo amplifier via {host}...");
    let mut zones = NuvoBuilder::new(&host)
        .zone(1, "Kitchen")
        .zone(2, "Patio")
        .source(1, "Sonos")
        .source(2, "TV")
        .build()
        .await?;

    let mut receivers: Vec<_> = zones.iter().map(|z| z.subscribe()).collect();
    let mut interval = tokio::time::interval(Duration::from_secs(5));

    for _ in 0..12 {
        interval.tick().await;
        for zone in &mut zones {
            if let Err(e) = zone.update().await {
                println!("{:<10} update failed: {e}", zone.info().name);
            }
        }
        for rx in &mut receivers {
            while let Ok(event) = rx.try_recv() {
                match event {
                    EntityEvent::StateChanged { entity, state } => {
                        println!("{entity:<10} power  -> {state}");
                    }
                    EntityEvent::VolumeChanged { entity, level } => {
                        println!("{entity:<10} volume -> {:.0}%", level * 100.0);
                    }
                    EntityEvent::MuteChanged { entity, muted } => {
                        println!("{entity:<10} muted  -> {muted}");
                    }
                    EntityEvent::SourceChanged { entity, source } => {
                        println!(
                            "{entity:<10} source -> {}",
                            source.as_deref().unwrap_or("(unconfigured)")
                        );
                    }
                    other => println!("{other:?}"),
                }
            }
        }
    }

    Ok(())
}
