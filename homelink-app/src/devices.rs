//! Every entity named in the configuration, connected and ready to poll.

use std::fmt::Display;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast;
use tracing::{info, warn};

use homelink::benq::BenqProjector;
use homelink::hai::{HaiClient, HaiLight, HaiSwitch, HaiZone};
use homelink::nuvo::NuvoZone;
use homelink::{BinarySensor, Entity, EntityEvent, Light, MediaPlayer};

use crate::config::{AppConfig, HaiSection};

#[derive(Debug, Default)]
pub struct Devices {
    pub zones: Vec<NuvoZone>,
    pub projectors: Vec<BenqProjector>,
    pub lights: Vec<HaiLight>,
    pub switches: Vec<HaiSwitch>,
    pub sensors: Vec<HaiZone>,
}

/// One line of the status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub platform: &'static str,
    pub name: String,
    pub state: String,
    pub available: bool,
    pub details: String,
}

impl Devices {
    /// Open every configured bridge and panel client.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let mut devices = Devices::default();

        if let Some(nuvo) = &config.nuvo {
            let builder = nuvo.builder()?;
            let (zones, link) = match &nuvo.serial_port {
                Some(port) => (builder.build_serial(port).await, port.clone()),
                None => {
                    let addr = builder.addr();
                    (builder.build().await, addr)
                }
            };
            devices.zones =
                zones.with_context(|| format!("failed to connect to Nuvo amplifier at {link}"))?;
            info!(link = %link, zones = devices.zones.len(), "Nuvo zones ready");
        }

        for section in &config.benq {
            let builder = section.builder();
            let (projector, link) = match &section.serial_port {
                Some(port) => (builder.build_serial(port).await, port.clone()),
                None => {
                    let addr = builder.addr();
                    (builder.build().await, addr)
                }
            };
            let projector = projector
                .with_context(|| format!("failed to connect to BenQ projector at {link}"))?;
            info!(link = %link, projector = %projector.info().name, "Projector ready");
            devices.projectors.push(projector);
        }

        if let Some(hai) = &config.hai {
            devices.add_hai(hai)?;
        }

        Ok(devices)
    }

    fn add_hai(&mut self, hai: &HaiSection) -> Result<()> {
        let client = HaiClient::new(hai.panel.clone())
            .with_context(|| format!("failed to create HAI client for {}", hai.panel.host))?;

        for light in &hai.lights {
            self.lights
                .push(HaiLight::new(client.clone(), &light.id, &light.name));
        }
        for switch in &hai.switches {
            self.switches
                .push(HaiSwitch::new(client.clone(), &switch.id, &switch.name));
        }
        for zone in &hai.zones {
            self.sensors.push(HaiZone::new(
                client.clone(),
                &zone.id,
                &zone.name,
                &zone.device_class,
            ));
        }
        info!(
            panel = %client.config().api_url(),
            lights = self.lights.len(),
            switches = self.switches.len(),
            zones = self.sensors.len(),
            "HAI entities ready"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
            + self.projectors.len()
            + self.lights.len()
            + self.switches.len()
            + self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entities_mut(&mut self) -> Vec<&mut dyn Entity> {
        let mut entities: Vec<&mut dyn Entity> = Vec::with_capacity(self.len());
        entities.extend(self.zones.iter_mut().map(|e| e as &mut dyn Entity));
        entities.extend(self.projectors.iter_mut().map(|e| e as &mut dyn Entity));
        entities.extend(self.lights.iter_mut().map(|e| e as &mut dyn Entity));
        entities.extend(self.switches.iter_mut().map(|e| e as &mut dyn Entity));
        entities.extend(self.sensors.iter_mut().map(|e| e as &mut dyn Entity));
        entities
    }

    /// Event receivers for every entity, in table order.
    pub fn subscribe_all(&mut self) -> Vec<broadcast::Receiver<EntityEvent>> {
        self.entities_mut().into_iter().map(|e| e.subscribe()).collect()
    }

    /// Update every entity once. Returns how many updates failed.
    ///
    /// A failing entity is logged and left unavailable; the rest are
    /// still polled.
    pub async fn update_all(&mut self) -> usize {
        let mut failures = 0;
        for entity in self.entities_mut() {
            if let Err(e) = entity.update().await {
                warn!(
                    entity = %entity.info().name,
                    platform = entity.info().platform,
                    error = %e,
                    "Update failed"
                );
                failures += 1;
            }
        }
        failures
    }

    pub fn rows(&self) -> Vec<StatusRow> {
        let mut rows = Vec::with_capacity(self.len());
        rows.extend(self.zones.iter().map(zone_row));
        rows.extend(self.projectors.iter().map(|p| {
            let details = p
                .attributes()
                .entries()
                .iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            row(p, details)
        }));
        rows.extend(
            self.lights
                .iter()
                .map(|l| row(l, format!("brightness {}", l.brightness()))),
        );
        rows.extend(self.switches.iter().map(|s| row(s, String::new())));
        rows.extend(
            self.sensors
                .iter()
                .map(|s| row(s, format!("class {}", s.device_class()))),
        );
        rows
    }

    pub fn zone_mut(&mut self, id: u8) -> Result<&mut NuvoZone> {
        match self.zones.iter_mut().find(|z| z.zone_id().get() == id) {
            Some(zone) => Ok(zone),
            None => bail!("zone {id} is not configured"),
        }
    }

    /// Projector by name, or the only/first one when no name is given.
    pub fn projector_mut(&mut self, name: Option<&str>) -> Result<&mut BenqProjector> {
        let found = match name {
            Some(name) => self
                .projectors
                .iter_mut()
                .find(|p| p.info().name.eq_ignore_ascii_case(name)),
            None => self.projectors.first_mut(),
        };
        match (found, name) {
            (Some(projector), _) => Ok(projector),
            (None, Some(name)) => bail!("projector '{name}' is not configured"),
            (None, None) => bail!("no projector is configured"),
        }
    }

    pub fn light_mut(&mut self, id: &str) -> Result<&mut HaiLight> {
        match self.lights.iter_mut().find(|l| l.id() == id) {
            Some(light) => Ok(light),
            None => bail!("light '{id}' is not configured"),
        }
    }

    pub fn switch_mut(&mut self, id: &str) -> Result<&mut HaiSwitch> {
        match self.switches.iter_mut().find(|s| s.id() == id) {
            Some(switch) => Ok(switch),
            None => bail!("switch '{id}' is not configured"),
        }
    }
}

pub fn row(entity: &dyn Entity, details: String) -> StatusRow {
    StatusRow {
        platform: entity.info().platform,
        name: entity.info().name.clone(),
        state: entity.state().to_string(),
        available: entity.available(),
        details,
    }
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn zone_row(zone: &NuvoZone) -> StatusRow {
    let details = format!(
        "zone {}, volume {}, source {}, muted {}",
        zone.zone_id(),
        or_dash(zone.volume_level().map(|v| format!("{v:.2}"))),
        or_dash(zone.source()),
        or_dash(zone.is_volume_muted()),
    );
    row(zone, details)
}

/// Print rows as an aligned table.
pub fn print_table(rows: &[StatusRow]) {
    if rows.is_empty() {
        println!("No entities configured.");
        return;
    }

    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);

    println!(
        "{:<8}  {:<name_width$}  {:<7}  {:<9}  Details",
        "Platform", "Name", "State", "Available",
    );
    println!(
        "{:<8}  {:<name_width$}  {:<7}  {:<9}  -------",
        "--------",
        "-".repeat(name_width),
        "-------",
        "---------",
    );
    for r in rows {
        println!(
            "{:<8}  {:<name_width$}  {:<7}  {:<9}  {}",
            r.platform,
            r.name,
            r.state,
            if r.available { "yes" } else { "no" },
            r.details,
        );
    }
}
