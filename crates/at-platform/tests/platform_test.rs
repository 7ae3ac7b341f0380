//! End-to-end: config file to platform to accessory values

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use at_accessory::{
    accessory_uuid, AccessoryCache, AccessoryEvent, CharacteristicType, CharacteristicValue,
    ServiceType, Storage,
};
use at_api::{ApiError, ApiResult, SensorSource};
use at_config::{load_config, ConfigError, ConfigWarning};
use at_core::{AirQuality, SensorResult, SensorType};
use at_platform::{Platform, AIR_PRESSURE_SUBTYPE};
use chrono::Utc;
use tempfile::TempDir;

/// Replays a queue of outcomes per serial number
#[derive(Default)]
struct ScriptedSource {
    scripts: Mutex<HashMap<String, Vec<ApiResult<SensorResult>>>>,
}

impl ScriptedSource {
    fn push(&self, serial: &str, outcome: ApiResult<SensorResult>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(serial.to_string())
            .or_default()
            .push(outcome);
    }
}

#[async_trait]
impl SensorSource for ScriptedSource {
    async fn latest(&self, serial_number: &str) -> ApiResult<SensorResult> {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(serial_number) {
            Some(queue) if !queue.is_empty() => queue.remove(0),
            _ => Err(ApiError::NoResults {
                serial: serial_number.to_string(),
            }),
        }
    }
}

const CONFIG: &str = r#"
platform: Home
clientId: !secret airthings_client_id
clientSecret: !secret airthings_client_secret
refreshInterval: 300
devices:
  - name: Living Room
    serialNumber: "2930012345"
    radonLeakThreshold: 150
    co2DetectedThreshold: 900
  - name: Bedroom
    serialNumber: 2920054321
    refreshInterval: 30
  - name: Nameless
"#;

fn write_config(dir: &Path) {
    fs::write(dir.join("config.yaml"), CONFIG).unwrap();
    fs::write(
        dir.join("secrets.yaml"),
        "airthings_client_id: abc\nairthings_client_secret: def\n",
    )
    .unwrap();
}

fn active(cache: &AccessoryCache, serial: &str, service: ServiceType) -> Option<bool> {
    match cache
        .get(accessory_uuid(serial))?
        .service(service, None)?
        .value(CharacteristicType::StatusActive)?
    {
        CharacteristicValue::Bool(active) => Some(*active),
        _ => None,
    }
}

#[test]
fn test_config_warnings_and_defaults() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path());

    let validated = load_config(dir.path(), "config.yaml").unwrap();
    let config = validated.config;

    assert_eq!(config.name, "Home");
    assert_eq!(config.devices.len(), 2);
    assert_eq!(config.devices[0].refresh_interval_secs, 300);
    assert_eq!(config.devices[0].co2_detected_threshold, 900);
    assert_eq!(config.devices[1].serial_number, "2920054321");
    assert_eq!(config.devices[1].refresh_interval_secs, 60);

    assert!(validated
        .warnings
        .iter()
        .any(|w| matches!(w, ConfigWarning::MissingSerialNumber { index: 2 })));
    assert!(validated
        .warnings
        .iter()
        .any(|w| matches!(w, ConfigWarning::RefreshIntervalTooShort { .. })));
}

#[test]
fn test_missing_credentials_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.yaml"),
        "devices:\n  - serialNumber: \"2930012345\"\n",
    )
    .unwrap();

    let err = load_config(dir.path(), "config.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::MissingValue { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_updates_and_degrades() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path());
    let config = load_config(dir.path(), "config.yaml").unwrap().config;

    let source = Arc::new(ScriptedSource::default());
    source.push(
        "2930012345",
        Ok(SensorResult::new("2930012345")
            .recorded_at(Utc::now())
            .with_battery(64.0)
            .with_reading(SensorType::Co2, 950.0)
            .with_reading(SensorType::Humidity, 41.0)
            .with_reading(SensorType::Pressure, 1002.0)
            .with_reading(SensorType::RadonShortTermAvg, 40.0)
            .with_reading(SensorType::Temp, 22.5)
            .with_reading(SensorType::Voc, 120.0)),
    );
    source.push("2930012345", Err(ApiError::RateLimited));
    source.push(
        "2920054321",
        Ok(SensorResult::new("2920054321")
            .recorded_at(Utc::now())
            .with_reading(SensorType::Temp, 19.0)
            .with_reading(SensorType::Humidity, 72.0)),
    );

    let cache = Arc::new(AccessoryCache::new(Storage::new(dir.path())));
    let mut events = cache.subscribe();
    let mut platform = Platform::new(config, cache.clone(), source.clone());
    platform.discover_devices().unwrap();
    platform.start().await;

    tokio::time::sleep(Duration::from_millis(10)).await;

    let living_room = cache.get(accessory_uuid("2930012345")).unwrap();
    let air_quality = living_room.service(ServiceType::AirQualitySensor, None).unwrap();
    // CO2 950 is FAIR, everything else GOOD
    assert_eq!(
        air_quality.value(CharacteristicType::AirQuality),
        Some(&CharacteristicValue::from(AirQuality::Fair.value()))
    );
    let co2 = living_room
        .service(ServiceType::CarbonDioxideSensor, None)
        .unwrap();
    assert_eq!(
        co2.value(CharacteristicType::CarbonDioxideDetected),
        Some(&CharacteristicValue::Int(1))
    );
    let leak = living_room.service(ServiceType::LeakSensor, None).unwrap();
    assert_eq!(
        leak.value(CharacteristicType::LeakDetected),
        Some(&CharacteristicValue::Int(0))
    );
    assert_eq!(
        living_room
            .service(ServiceType::AirPressureSensor, Some(AIR_PRESSURE_SUBTYPE))
            .unwrap()
            .value(CharacteristicType::AirPressure),
        Some(&CharacteristicValue::Int(1002))
    );
    assert_eq!(
        active(&cache, "2930012345", ServiceType::TemperatureSensor),
        Some(true)
    );

    // Humidity 72 is POOR for the bedroom
    let bedroom = cache.get(accessory_uuid("2920054321")).unwrap();
    assert_eq!(
        bedroom
            .service(ServiceType::AirQualitySensor, None)
            .unwrap()
            .value(CharacteristicType::AirQuality),
        Some(&CharacteristicValue::from(AirQuality::Poor.value()))
    );

    // Bedroom polls every 60s, living room every 300s
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(
        active(&cache, "2920054321", ServiceType::TemperatureSensor),
        Some(false)
    );
    assert_eq!(
        active(&cache, "2930012345", ServiceType::TemperatureSensor),
        Some(true)
    );

    tokio::time::sleep(Duration::from_secs(240)).await;
    assert_eq!(
        active(&cache, "2930012345", ServiceType::TemperatureSensor),
        Some(false)
    );
    // Values survive the failed cycle
    let living_room = cache.get(accessory_uuid("2930012345")).unwrap();
    assert_eq!(
        living_room
            .service(ServiceType::TemperatureSensor, None)
            .unwrap()
            .value(CharacteristicType::CurrentTemperature),
        Some(&CharacteristicValue::Float(22.5))
    );

    platform.shutdown().await;
    platform.save_cache().await.unwrap();

    let mut saw_change = false;
    while let Ok(event) = events.try_recv() {
        if let AccessoryEvent::CharacteristicChanged(change) = event {
            saw_change |= change.characteristic == CharacteristicType::CurrentTemperature;
        }
    }
    assert!(saw_change);

    // A restart restores both accessories with their values
    let reloaded = AccessoryCache::new(Storage::new(dir.path()));
    assert_eq!(reloaded.load().await.unwrap(), 2);
    let restored = reloaded.get(accessory_uuid("2930012345")).unwrap();
    assert_eq!(restored.display_name, "Living Room");
    assert_eq!(restored.services().len(), living_room.services().len());
    assert_eq!(
        restored
            .service(ServiceType::TemperatureSensor, None)
            .unwrap()
            .value(CharacteristicType::CurrentTemperature),
        Some(&CharacteristicValue::Float(22.5))
    );
}
