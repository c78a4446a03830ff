//! TOML configuration for the `homelink` command-line host.
//!
//! ```toml
//! poll_interval_secs = 30
//!
//! [nuvo]
//! host = "192.168.1.50"
//! [nuvo.zones]
//! 1 = { name = "Kitchen" }
//! [nuvo.sources]
//! 1 = { name = "Sonos" }
//!
//! [[benq]]
//! host = "192.168.1.51"
//! name = "Theater Projector"
//!
//! [[benq]]
//! serial_port = "/dev/ttyUSB0"
//! name = "Den Projector"
//!
//! [hai]
//! host = "hai.local"
//! lights = [{ id = "12", name = "Porch" }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use homelink::benq::BenqBuilder;
use homelink::hai::HaiConfig;
use homelink::nuvo::NuvoBuilder;

/// Default seconds between polls in `homelink poll`.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub nuvo: Option<NuvoSection>,

    #[serde(default)]
    pub benq: Vec<BenqSection>,

    #[serde(default)]
    pub hai: Option<HaiSection>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// A zone or source entry: `1 = { name = "Kitchen" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NuvoSection {
    /// Bridge host. Exactly one of `host` and `serial_port` is set.
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Local RS-232 device, e.g. `/dev/ttyUSB0`.
    pub serial_port: Option<String>,
    pub response_timeout_ms: Option<u64>,

    /// Keyed by zone number. TOML table keys are always strings.
    #[serde(default)]
    pub zones: BTreeMap<String, Named>,

    #[serde(default)]
    pub sources: BTreeMap<String, Named>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenqSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub serial_port: Option<String>,
    pub name: Option<String>,
    pub timeout_secs: Option<u64>,
    pub write_timeout_secs: Option<u64>,
    pub attribute_delay_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HaiSection {
    #[serde(flatten)]
    pub panel: HaiConfig,

    #[serde(default)]
    pub lights: Vec<HaiEntry>,

    #[serde(default)]
    pub switches: Vec<HaiEntry>,

    #[serde(default)]
    pub zones: Vec<HaiZoneEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HaiEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HaiZoneEntry {
    pub id: String,
    pub name: String,
    #[serde(default = "default_device_class")]
    pub device_class: String,
}

fn default_device_class() -> String {
    "opening".to_string()
}

impl AppConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        if config.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if let Some(nuvo) = &config.nuvo {
            check_link("[nuvo]", nuvo.host.as_deref(), nuvo.serial_port.as_deref())?;
        }
        for (i, benq) in config.benq.iter().enumerate() {
            check_link(
                &format!("[[benq]] #{}", i + 1),
                benq.host.as_deref(),
                benq.serial_port.as_deref(),
            )?;
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn is_empty(&self) -> bool {
        self.nuvo.is_none() && self.benq.is_empty() && self.hai.is_none()
    }
}

fn check_link(section: &str, host: Option<&str>, serial_port: Option<&str>) -> Result<()> {
    match (host, serial_port) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        (Some(_), Some(_)) => bail!("{section}: set either host or serial_port, not both"),
        (None, None) => bail!("{section}: host or serial_port is required"),
    }
}

fn parse_id(kind: &str, key: &str) -> Result<u8> {
    key.trim()
        .parse::<u8>()
        .with_context(|| format!("{kind} key '{key}' is not a number"))
}

impl NuvoSection {
    /// Builder with every configured zone and source applied.
    ///
    /// Range checks on the ids happen in [`NuvoBuilder`].
    pub fn builder(&self) -> Result<NuvoBuilder> {
        let mut builder = NuvoBuilder::new(self.host.as_deref().unwrap_or_default());
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(ms) = self.response_timeout_ms {
            builder = builder.response_timeout(Duration::from_millis(ms));
        }
        for (key, zone) in &self.zones {
            builder = builder.zone(parse_id("zone", key)?, &zone.name);
        }
        for (key, source) in &self.sources {
            builder = builder.source(parse_id("source", key)?, &source.name);
        }
        Ok(builder)
    }
}

impl BenqSection {
    pub fn builder(&self) -> BenqBuilder {
        let mut builder = BenqBuilder::new(self.host.as_deref().unwrap_or_default());
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.write_timeout_secs {
            builder = builder.write_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.attribute_delay_secs {
            builder = builder.attribute_delay(Duration::from_secs(secs));
        }
        builder
    }
}
