//! HAI home-control panel adapters for homelink.
//!
//! The panel is reached through a small JSON REST API:
//!
//! | Entity       | Endpoint                    | Host surface |
//! |--------------|-----------------------------|--------------|
//! | [`HaiLight`] | `GET/PUT /api/light/{id}`   | [`Light`](homelink_core::Light) |
//! | [`HaiSwitch`]| `GET/PUT /api/light/{id}`   | [`Switch`](homelink_core::Switch) |
//! | [`HaiZone`]  | `GET /api/zone/{id}`        | [`BinarySensor`](homelink_core::BinarySensor) |
//!
//! All adapters share one [`HaiClient`], built from a [`HaiConfig`].
//!
//! # Example
//!
//! ```no_run
//! use homelink_core::{Entity, Light};
//! use homelink_hai::{HaiClient, HaiConfig, HaiLight};
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let client = HaiClient::new(HaiConfig::new("hai.local"))?;
//! let mut porch = HaiLight::new(client.clone(), "12", "Porch");
//! porch.update().await?;
//! porch.turn_on_with_brightness(128).await?;
//! # Ok(())
//! # }
//! ```

mod base;
pub mod client;
pub mod config;
pub mod light;
pub mod switch;
pub mod zone;

pub use base::PLATFORM;
pub use client::HaiClient;
pub use config::HaiConfig;
pub use light::HaiLight;
pub use switch::HaiSwitch;
pub use zone::HaiZone;
