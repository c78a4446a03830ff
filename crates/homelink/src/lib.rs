//! # homelink -- Home-automation adapters for serial and REST devices
//!
//! `homelink` is an asynchronous Rust library that puts a small set of
//! home-theater and home-control devices behind one entity model that a
//! home-automation host can poll and command.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! homelink = { version = "0.1", features = ["nuvo"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Poll every zone of a Nuvo amplifier:
//!
//! ```no_run
//! use homelink::{Entity, MediaPlayer};
//! use homelink::nuvo::NuvoBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut zones = NuvoBuilder::new("192.168.1.50")
//!         .zone(1, "Kitchen")
//!         .source(1, "Sonos")
//!         .build()
//!         .await?;
//!
//!     for zone in &mut zones {
//!         zone.update().await?;
//!         println!("{}: {} {:?}", zone.info().name, zone.state(), zone.volume_level());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                            |
//! |------------------------|----------------------------------------------------|
//! | `homelink-core`        | Entity traits, events, [`Transport`], [`Bridge`], errors |
//! | `homelink-transport`   | TCP, serial and hex-bridge transports              |
//! | `homelink-nuvo`        | Nuvo Essentia zone status codec and zone entity    |
//! | `homelink-benq`        | BenQ projector serial protocol                     |
//! | `homelink-hai`         | HAI panel REST adapters                            |
//! | **`homelink`**         | This facade crate -- re-exports everything         |
//!
//! ## Feature Flags
//!
//! | Feature | Enables                               | Default |
//! |---------|---------------------------------------|---------|
//! | `nuvo`  | [`nuvo`] module                       | yes     |
//! | `benq`  | [`benq`] module                       | yes     |
//! | `hai`   | [`hai`] module                        | yes     |
//! | `full`  | All device backends                   | no      |
//!
//! ## Events
//!
//! Every entity emits [`EntityEvent`]s when a poll or command changes its
//! state:
//!
//! ```no_run
//! use homelink::{Entity, EntityEvent};
//! # async fn example(entity: &dyn Entity) {
//! let mut events = entity.subscribe();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         EntityEvent::StateChanged { entity, state } => println!("{entity}: {state}"),
//!         other => println!("{other:?}"),
//!     }
//! }
//! # }
//! ```

pub use homelink_core::*;

/// Transports and the hex bridge used by the serial-protocol backends.
pub mod transport {
    pub use homelink_transport::*;
}

/// Nuvo Essentia multi-zone amplifier backend.
///
/// Provides [`NuvoZone`](nuvo::NuvoZone) and [`NuvoBuilder`](nuvo::NuvoBuilder)
/// plus the zone status codec they are built on.
#[cfg(feature = "nuvo")]
pub mod nuvo {
    pub use homelink_nuvo::*;
}

/// BenQ projector backend.
///
/// Provides [`BenqProjector`](benq::BenqProjector) and
/// [`BenqBuilder`](benq::BenqBuilder).
#[cfg(feature = "benq")]
pub mod benq {
    pub use homelink_benq::*;
}

/// HAI home-control panel backend.
///
/// Provides [`HaiLight`](hai::HaiLight), [`HaiSwitch`](hai::HaiSwitch) and
/// [`HaiZone`](hai::HaiZone) on a shared [`HaiClient`](hai::HaiClient).
#[cfg(feature = "hai")]
pub mod hai {
    pub use homelink_hai::*;
}

/// Platform names of the enabled device backends, as reported in
/// [`EntityInfo::platform`].
///
/// # Example
///
/// ```
/// for platform in homelink::platforms() {
///     println!("{platform}");
/// }
/// ```
pub fn platforms() -> Vec<&'static str> {
    let mut platforms = Vec::new();

    #[cfg(feature = "nuvo")]
    platforms.push(nuvo::zone::PLATFORM);

    #[cfg(feature = "benq")]
    platforms.push(benq::projector::PLATFORM);

    #[cfg(feature = "hai")]
    platforms.push(hai::PLATFORM);

    platforms
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(all(feature = "nuvo", feature = "benq", feature = "hai"))]
    fn default_platforms() {
        assert_eq!(super::platforms(), vec!["nuvo", "benq", "hai"]);
    }
}
