//! Rendering of monitor updates.

use airco2_core::MeasurementKind;
use airco2_hardware::MonitorUpdate;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One named reading, as a home-automation entity would expose it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub name: &'static str,
    pub unit: &'static str,
    pub icon: &'static str,
    pub value: Option<f64>,
}

/// JSON document printed for each update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub device: Option<String>,
    pub available: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub entities: Vec<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reading {
    pub fn from_update(update: &MonitorUpdate) -> Self {
        let prefix = update.device_id.as_deref().unwrap_or("airco2");

        let entities = MeasurementKind::ALL
            .iter()
            .map(|kind| Entity {
                id: kind.entity_id(prefix),
                name: kind.name(),
                unit: kind.unit(),
                icon: kind.icon(),
                value: update.snapshot.value(*kind),
            })
            .collect();

        Self {
            device: update.device_id.clone(),
            available: update.snapshot.available,
            last_updated: update.snapshot.last_updated,
            entities,
            error: update.last_error.clone(),
        }
    }
}

/// Single-line human-readable form.
pub fn render_text(update: &MonitorUpdate) -> String {
    let mut line = update.snapshot.to_string();
    if let Some(device) = &update.device {
        line.push_str(&format!(" device={}", device));
    }
    if let Some(error) = &update.last_error {
        line.push_str(&format!(" error=\"{}\"", error));
    }
    line
}

pub fn render_json(update: &MonitorUpdate) -> serde_json::Result<String> {
    serde_json::to_string(&Reading::from_update(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airco2_core::MeasurementSnapshot;
    use airco2_hardware::DeviceLocation;

    fn update() -> MonitorUpdate {
        MonitorUpdate {
            snapshot: MeasurementSnapshot {
                co2: Some(642),
                temperature: Some(22.5),
                humidity: None,
                available: true,
                last_updated: None,
            },
            report: None,
            last_error: None,
            device: Some(
                DeviceLocation::new("/dev/hidraw1")
                    .with_unique_id("04D9:A052")
                    .with_name("Holtek USB-zyTemp"),
            ),
            device_id: Some("04D9:A052".to_string()),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            render_text(&update()),
            "co2=642 ppm temperature=22.50 °C humidity=- % available=true \
             device=/dev/hidraw1 (Holtek USB-zyTemp)"
        );
    }

    #[test]
    fn test_render_text_with_error() {
        let mut update = update();
        update.snapshot.available = false;
        update.device = None;
        update.last_error = Some("Device not found: No matching HID device found".into());

        assert!(render_text(&update).ends_with(
            "available=false error=\"Device not found: No matching HID device found\""
        ));
    }

    #[test]
    fn test_reading_entities() {
        let reading = Reading::from_update(&update());

        let ids: Vec<&str> = reading.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["04D9:A052-co2", "04D9:A052-temperature", "04D9:A052-humidity"]
        );
        assert_eq!(reading.entities[0].value, Some(642.0));
        assert_eq!(reading.entities[2].value, None);
    }

    #[test]
    fn test_entity_ids_stable_while_unplugged() {
        let mut update = update();
        update.device = None;
        update.snapshot.available = false;

        let reading = Reading::from_update(&update);
        assert_eq!(reading.device.as_deref(), Some("04D9:A052"));
        assert_eq!(reading.entities[0].id, "04D9:A052-co2");
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&update()).unwrap()).unwrap();

        assert_eq!(json["device"], "04D9:A052");
        assert_eq!(json["available"], true);
        assert_eq!(json["entities"][0]["unit"], "ppm");
        assert!(json.get("error").is_none());
    }
}
