//! Sensor result model returned by the vendor API on each poll

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// What a numeric reading measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorType {
    Co2,
    Humidity,
    Mold,
    Pm1,
    Pm25,
    Pressure,
    RadonShortTermAvg,
    Temp,
    Voc,
    /// Any sensor type this bridge does not expose (light, sound, ...)
    #[serde(other)]
    Unknown,
}

impl SensorType {
    /// The wire name used by the vendor API
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Co2 => "co2",
            SensorType::Humidity => "humidity",
            SensorType::Mold => "mold",
            SensorType::Pm1 => "pm1",
            SensorType::Pm25 => "pm25",
            SensorType::Pressure => "pressure",
            SensorType::RadonShortTermAvg => "radonShortTermAvg",
            SensorType::Temp => "temp",
            SensorType::Voc => "voc",
            SensorType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub sensor_type: SensorType,
    pub value: f64,
    /// Unit reported by the API (informational only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl SensorReading {
    pub fn new(sensor_type: SensorType, value: f64) -> Self {
        Self {
            sensor_type,
            value,
            unit: None,
        }
    }
}

/// The latest values for one device from one poll
///
/// A result is always replaced as a whole by the next successful poll. A
/// sensor missing from this result is absent, it is never filled in from a
/// previous result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorResult {
    pub serial_number: String,

    /// When the device recorded these values
    #[serde(
        default,
        deserialize_with = "deserialize_recorded",
        skip_serializing_if = "Option::is_none"
    )]
    pub recorded: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_percentage: Option<f64>,

    #[serde(default)]
    pub sensors: Vec<SensorReading>,
}

impl SensorResult {
    /// Create an empty result for a serial number
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            ..Default::default()
        }
    }

    /// Set the recorded timestamp
    pub fn recorded_at(mut self, recorded: DateTime<Utc>) -> Self {
        self.recorded = Some(recorded);
        self
    }

    /// Append a reading
    pub fn with_reading(mut self, sensor_type: SensorType, value: f64) -> Self {
        self.sensors.push(SensorReading::new(sensor_type, value));
        self
    }

    /// Set the battery percentage
    pub fn with_battery(mut self, percentage: f64) -> Self {
        self.battery_percentage = Some(percentage);
        self
    }

    /// Value of the first reading of the given type, if present this poll
    pub fn value(&self, sensor_type: SensorType) -> Option<f64> {
        self.sensors
            .iter()
            .find(|reading| reading.sensor_type == sensor_type)
            .map(|reading| reading.value)
    }

    pub fn has(&self, sensor_type: SensorType) -> bool {
        self.value(sensor_type).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Accept RFC 3339 timestamps as well as naive ISO timestamps (taken as UTC)
fn deserialize_recorded<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_api_result() {
        let result: SensorResult = serde_json::from_str(
            r#"{
                "serialNumber": "2930123456",
                "recorded": "2024-03-01T10:15:00Z",
                "batteryPercentage": 87,
                "sensors": [
                    {"sensorType": "co2", "value": 612, "unit": "ppm"},
                    {"sensorType": "radonShortTermAvg", "value": 41, "unit": "bq"},
                    {"sensorType": "lux", "value": 3, "unit": "lux"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(result.serial_number, "2930123456");
        assert_eq!(
            result.recorded,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap())
        );
        assert_eq!(result.battery_percentage, Some(87.0));
        assert_eq!(result.value(SensorType::Co2), Some(612.0));
        assert_eq!(result.value(SensorType::RadonShortTermAvg), Some(41.0));
        assert_eq!(result.sensors[2].sensor_type, SensorType::Unknown);
        assert!(!result.has(SensorType::Humidity));
    }

    #[test]
    fn test_naive_recorded_is_utc() {
        let result: SensorResult = serde_json::from_str(
            r#"{"serialNumber": "2960000001", "recorded": "2024-03-01T10:15:00", "sensors": []}"#,
        )
        .unwrap();

        assert_eq!(
            result.recorded,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_optional_fields() {
        let result: SensorResult =
            serde_json::from_str(r#"{"serialNumber": "2900000001"}"#).unwrap();

        assert!(result.recorded.is_none());
        assert!(result.battery_percentage.is_none());
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_recorded_is_error() {
        let result = serde_json::from_str::<SensorResult>(
            r#"{"serialNumber": "2900000001", "recorded": "yesterday"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sensor_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&SensorType::RadonShortTermAvg).unwrap(),
            "\"radonShortTermAvg\""
        );
        assert_eq!(SensorType::Pm25.to_string(), "pm25");
    }
}
