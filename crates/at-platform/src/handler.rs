//! Per-device accessory handler
//!
//! A [`DeviceHandler`] owns the services of one accessory. It decides which
//! services the device exposes, writes each fetched [`SensorResult`] into
//! them and keeps the last result it saw.

use std::sync::Arc;

use at_accessory::hap::{charging_state, co2_detected, leak_detected, low_battery};
use at_accessory::{
    Accessory, AccessoryCache, CharacteristicType, Service, ServiceType,
};
use at_api::{ApiResult, SensorSource};
use at_config::DeviceConfig;
use at_core::{
    classify_with, is_fresh_at, lookup_device, AirQualityBanding, DeviceInfo, SensorResult,
    SensorType, VocConversion, LOW_BATTERY_PERCENTAGE, MANUFACTURER,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PlatformError, PlatformResult};

/// Subtype of the Eve air pressure service
pub const AIR_PRESSURE_SUBTYPE: &str = "air-pressure";

const FIRMWARE_UNKNOWN: &str = "Unknown";

/// Which optional services a device exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub battery: bool,
    pub temperature: bool,
    pub humidity: bool,
    pub co2: bool,
    pub air_pressure: bool,
    pub radon_leak: bool,
}

impl Features {
    pub fn for_device(info: &DeviceInfo, config: &DeviceConfig) -> Self {
        Self {
            battery: !config.battery_disabled,
            temperature: info.sensors.temp,
            humidity: info.sensors.humidity,
            co2: info.sensors.co2,
            air_pressure: info.sensors.pressure,
            radon_leak: info.sensors.radon_short_term_avg && config.radon_leak_threshold.is_some(),
        }
    }
}

/// Air quality characteristics fed by one sensor type
const AIR_QUALITY_READINGS: [(SensorType, CharacteristicType); 5] = [
    (SensorType::Co2, CharacteristicType::CarbonDioxideLevel),
    (SensorType::Humidity, CharacteristicType::CurrentRelativeHumidity),
    (SensorType::Pm25, CharacteristicType::Pm25Density),
    (SensorType::RadonShortTermAvg, CharacteristicType::Radon),
    (SensorType::Voc, CharacteristicType::VocPpb),
];

/// Drives the accessory for one configured device
pub struct DeviceHandler {
    config: DeviceConfig,
    info: DeviceInfo,
    features: Features,
    uuid: Uuid,
    banding: AirQualityBanding,
    voc_conversion: VocConversion,
    cache: Arc<AccessoryCache>,
    /// Last successful result; also held across a fetch so refreshes for
    /// this device never overlap
    last_result: Mutex<Option<SensorResult>>,
}

impl DeviceHandler {
    pub fn new(
        config: DeviceConfig,
        uuid: Uuid,
        banding: AirQualityBanding,
        voc_conversion: VocConversion,
        cache: Arc<AccessoryCache>,
    ) -> Self {
        let info = lookup_device(&config.serial_number);
        if info.is_unknown() {
            warn!(
                serial = %config.serial_number,
                "Unrecognised serial number prefix, no sensors will be exposed"
            );
        }
        let features = Features::for_device(&info, &config);

        Self {
            config,
            info,
            features,
            uuid,
            banding,
            voc_conversion,
            cache,
            last_result: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn serial_number(&self) -> &str {
        &self.config.serial_number
    }

    /// Copy of the last successful result
    pub async fn last_result(&self) -> Option<SensorResult> {
        self.last_result.lock().await.clone()
    }

    /// Snapshot of the accessory this handler drives
    pub fn accessory(&self) -> Option<Accessory> {
        self.cache.get(self.uuid)
    }

    /// Add the wanted services to the accessory and drop the rest
    pub fn configure(&self) -> PlatformResult<()> {
        self.cache
            .update(self.uuid, |accessory| self.configure_services(accessory))
            .ok_or_else(|| PlatformError::AccessoryNotFound {
                serial: self.config.serial_number.clone(),
            })
    }

    fn configure_services(&self, accessory: &mut Accessory) {
        let sensors = self.info.sensors;
        let selection = self.config.air_quality_selection();

        accessory.context.insert(
            "serialNumber".to_string(),
            serde_json::Value::from(self.config.serial_number.as_str()),
        );

        let information =
            accessory.service_or_insert(ServiceType::AccessoryInformation, "Information", None);
        information.set_value(CharacteristicType::Manufacturer, MANUFACTURER);
        information.set_value(CharacteristicType::Model, self.info.model);
        information.set_value(CharacteristicType::Name, self.config.name.as_str());
        information.set_value(
            CharacteristicType::SerialNumber,
            self.config.serial_number.as_str(),
        );
        information.set_value(CharacteristicType::FirmwareRevision, FIRMWARE_UNKNOWN);

        let air_quality =
            accessory.service_or_insert(ServiceType::AirQualitySensor, "Air Quality", None);
        air_quality.characteristic_or_insert(CharacteristicType::StatusActive);
        let wanted = [
            (
                CharacteristicType::CarbonDioxideLevel,
                sensors.co2 && selection.co2,
            ),
            (
                CharacteristicType::CurrentRelativeHumidity,
                sensors.humidity && selection.humidity,
            ),
            (
                CharacteristicType::Pm25Density,
                sensors.pm25 && selection.pm25,
            ),
            (
                CharacteristicType::Radon,
                sensors.radon_short_term_avg && selection.radon,
            ),
            (CharacteristicType::VocDensity, sensors.voc && selection.voc),
            (CharacteristicType::VocPpb, sensors.voc && selection.voc),
            (CharacteristicType::Mold, sensors.mold),
        ];
        for (characteristic, enabled) in wanted {
            if enabled {
                air_quality.characteristic_or_insert(characteristic);
            } else {
                air_quality.remove_characteristic(characteristic);
            }
        }

        adopt_legacy_air_pressure(accessory);

        use CharacteristicType::{CarbonDioxideLevel, StatusActive};
        let features = self.features;
        let optional: [(ServiceType, &str, Option<&str>, bool, &[CharacteristicType]); 6] = [
            (ServiceType::Battery, "Battery", None, features.battery, &[]),
            (
                ServiceType::TemperatureSensor,
                "Temperature",
                None,
                features.temperature,
                &[StatusActive],
            ),
            (
                ServiceType::HumiditySensor,
                "Humidity",
                None,
                features.humidity,
                &[StatusActive],
            ),
            (
                ServiceType::CarbonDioxideSensor,
                "CO2",
                None,
                features.co2,
                &[CarbonDioxideLevel, StatusActive],
            ),
            (
                ServiceType::AirPressureSensor,
                "Air Pressure",
                Some(AIR_PRESSURE_SUBTYPE),
                features.air_pressure,
                &[StatusActive],
            ),
            (
                ServiceType::LeakSensor,
                "Radon",
                None,
                features.radon_leak,
                &[StatusActive],
            ),
        ];
        for (service_type, name, subtype, enabled, characteristics) in optional {
            if enabled {
                let service = accessory.service_or_insert(service_type, name, subtype);
                for characteristic in characteristics {
                    service.characteristic_or_insert(*characteristic);
                }
            } else if accessory.remove_service(service_type, subtype).is_some() {
                debug!("[{}] Removed {} service", accessory.display_name, name);
            }
        }
    }

    /// Log the effective settings for this device
    pub fn log_settings(&self) {
        let name = &self.config.name;
        let features = self.features;
        info!("[{}] Device Settings:", name);
        info!("[{}]  * Name: {}", name, self.config.name);
        info!("[{}]  * Model: {}", name, self.info.model);
        info!("[{}]  * Serial Number: {}", name, self.config.serial_number);
        info!("[{}] Enabled Sensors:", name);
        info!("[{}]  * Air Quality: true", name);
        info!("[{}]  * Battery: {}", name, features.battery);
        info!("[{}]  * Temperature: {}", name, features.temperature);
        info!("[{}]  * Humidity: {}", name, features.humidity);
        info!("[{}]  * CO2: {}", name, features.co2);
        info!("[{}]  * Air Pressure: {}", name, features.air_pressure);
        info!("[{}]  * Radon: {}", name, features.radon_leak);
        info!("[{}] Advanced Settings:", name);
        info!("[{}]  * Debug Logging: {}", name, self.config.debug);
        info!(
            "[{}]  * Refresh Interval: {}s",
            name, self.config.refresh_interval_secs
        );
    }

    /// Fetch the latest result and push it into the accessory
    ///
    /// On failure every service is marked inactive and the previous values
    /// are left in place.
    pub async fn refresh(&self, source: &dyn SensorSource) -> ApiResult<()> {
        let mut last_result = self.last_result.lock().await;

        match source.latest(&self.config.serial_number).await {
            Ok(result) => {
                if self.config.debug {
                    match serde_json::to_string(&result) {
                        Ok(json) => info!("[{}] {}", self.config.name, json),
                        Err(err) => debug!("[{}] Unable to encode result: {}", self.config.name, err),
                    }
                }
                self.update_characteristics(&result, Utc::now());
                *last_result = Some(result);
                Ok(())
            }
            Err(err) => {
                self.set_inactive();
                Err(err)
            }
        }
    }

    /// Write a result into every configured characteristic
    pub fn update_characteristics(&self, result: &SensorResult, now: DateTime<Utc>) {
        self.cache
            .update(self.uuid, |accessory| self.apply(accessory, result, now));
    }

    fn apply(&self, accessory: &mut Accessory, result: &SensorResult, now: DateTime<Utc>) {
        let fresh = is_fresh_at(result.recorded, now);
        // Present readings are active, absent ones follow the result timestamp
        let active = |sensor_type: SensorType| result.has(sensor_type) || fresh;

        if let (Some(battery), Some(percentage)) = (
            accessory.service_mut(ServiceType::Battery, None),
            result.battery_percentage,
        ) {
            battery.set_value(CharacteristicType::BatteryLevel, percentage);
            battery.set_value(
                CharacteristicType::ChargingState,
                charging_state::NOT_CHARGEABLE,
            );
            let status = if percentage <= LOW_BATTERY_PERCENTAGE {
                low_battery::LOW
            } else {
                low_battery::NORMAL
            };
            battery.set_value(CharacteristicType::StatusLowBattery, status);
        }

        if let Some(air_quality) = accessory.service_mut(ServiceType::AirQualitySensor, None) {
            let level = classify_with(
                self.banding,
                result,
                &self.config.air_quality_selection(),
            );
            air_quality.set_value(CharacteristicType::AirQuality, level.value());
            for (sensor_type, characteristic) in AIR_QUALITY_READINGS {
                if let Some(value) = result.value(sensor_type) {
                    set_if_present(air_quality, characteristic, value);
                }
            }
            if let Some(density) = self.voc_conversion.density_for(result) {
                set_if_present(air_quality, CharacteristicType::VocDensity, density);
            }
            if let Some(mold) = result.value(SensorType::Mold) {
                set_if_present(air_quality, CharacteristicType::Mold, mold);
            }
            air_quality.set_value(CharacteristicType::StatusActive, fresh);
        }

        if let Some(temperature) = accessory.service_mut(ServiceType::TemperatureSensor, None) {
            if let Some(value) = result.value(SensorType::Temp) {
                temperature.set_value(CharacteristicType::CurrentTemperature, value);
            }
            temperature.set_value(CharacteristicType::StatusActive, active(SensorType::Temp));
        }

        if let Some(humidity) = accessory.service_mut(ServiceType::HumiditySensor, None) {
            if let Some(value) = result.value(SensorType::Humidity) {
                humidity.set_value(CharacteristicType::CurrentRelativeHumidity, value);
            }
            humidity.set_value(CharacteristicType::StatusActive, active(SensorType::Humidity));
        }

        if let Some(co2) = accessory.service_mut(ServiceType::CarbonDioxideSensor, None) {
            if let Some(value) = result.value(SensorType::Co2) {
                let detected = if value >= self.config.co2_detected_threshold as f64 {
                    co2_detected::ABNORMAL
                } else {
                    co2_detected::NORMAL
                };
                co2.set_value(CharacteristicType::CarbonDioxideDetected, detected);
                co2.set_value(CharacteristicType::CarbonDioxideLevel, value);
            }
            co2.set_value(CharacteristicType::StatusActive, active(SensorType::Co2));
        }

        if let Some(pressure) =
            accessory.service_mut(ServiceType::AirPressureSensor, Some(AIR_PRESSURE_SUBTYPE))
        {
            if let Some(value) = result.value(SensorType::Pressure) {
                pressure.set_value(CharacteristicType::AirPressure, value);
            }
            pressure.set_value(CharacteristicType::StatusActive, active(SensorType::Pressure));
        }

        if let (Some(leak), Some(threshold)) = (
            accessory.service_mut(ServiceType::LeakSensor, None),
            self.config.radon_leak_threshold,
        ) {
            if let Some(value) = result.value(SensorType::RadonShortTermAvg) {
                let detected = if value >= threshold as f64 {
                    leak_detected::DETECTED
                } else {
                    leak_detected::NOT_DETECTED
                };
                leak.set_value(CharacteristicType::LeakDetected, detected);
            }
            leak.set_value(
                CharacteristicType::StatusActive,
                active(SensorType::RadonShortTermAvg),
            );
        }
    }

    /// Mark every service inactive without touching any reading
    pub fn set_inactive(&self) {
        self.cache.update(self.uuid, |accessory| {
            for service in accessory.services_mut() {
                if service.has_characteristic(CharacteristicType::StatusActive) {
                    service.set_value(CharacteristicType::StatusActive, false);
                }
            }
        });
    }
}

/// Give an air pressure service cached without a subtype the current one
///
/// Older caches stored it unsubtyped; adopting it keeps a single service.
fn adopt_legacy_air_pressure(accessory: &mut Accessory) {
    if accessory.has_service(ServiceType::AirPressureSensor, Some(AIR_PRESSURE_SUBTYPE)) {
        return;
    }
    let display_name = accessory.display_name.clone();
    if let Some(legacy) = accessory.service_mut(ServiceType::AirPressureSensor, None) {
        legacy.subtype = Some(AIR_PRESSURE_SUBTYPE.to_string());
        debug!("[{}] Adopted cached Air Pressure service", display_name);
    }
}

/// Write a value only into a characteristic the service already carries
fn set_if_present(service: &mut Service, characteristic: CharacteristicType, value: f64) {
    if service.has_characteristic(characteristic) {
        service.set_value(characteristic, value);
    }
}
