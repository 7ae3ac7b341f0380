//! Platform and device configuration
//!
//! The raw schema mirrors the camelCase keys users write in `config.yaml`.
//! [`RawPlatformConfig::validate`] turns it into a [`PlatformConfig`] with
//! every default applied. Bad numbers never abort: they are replaced by
//! their default and reported as a [`ConfigWarning`].

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use at_core::{
    AirQualityBanding, AirQualitySelection, VocConversion, DEFAULT_CO2_DETECTED_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{error, warn};

use crate::error::{ConfigError, ConfigResult};

/// Default platform display name
pub const DEFAULT_PLATFORM_NAME: &str = "Airthings";

/// Refresh interval used when none is configured, in seconds
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 150;

/// Shortest refresh interval accepted, in seconds
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 60;

/// Largest integer that survives a round trip through an IEEE double
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Platform configuration as written in `config.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlatformConfig {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub client_id: Option<Value>,
    #[serde(default)]
    pub client_secret: Option<Value>,
    #[serde(default)]
    pub devices: Vec<RawDeviceConfig>,
    #[serde(default)]
    pub debug: Option<Value>,
    #[serde(default)]
    pub refresh_interval: Option<Value>,
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    #[serde(default)]
    pub air_quality_bands: Option<String>,
    #[serde(default)]
    pub voc_conversion: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
}

/// One `devices:` entry as written in `config.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<Value>,
    #[serde(default)]
    pub debug: Option<Value>,
    #[serde(default)]
    pub battery_disabled: Option<Value>,
    #[serde(default)]
    pub co2_air_quality_disabled: Option<Value>,
    #[serde(default)]
    pub humidity_air_quality_disabled: Option<Value>,
    #[serde(default)]
    pub pm25_air_quality_disabled: Option<Value>,
    #[serde(default)]
    pub radon_air_quality_disabled: Option<Value>,
    #[serde(default)]
    pub voc_air_quality_disabled: Option<Value>,
    #[serde(default)]
    pub co2_detected_threshold: Option<Value>,
    #[serde(default)]
    pub radon_leak_threshold: Option<Value>,
    #[serde(default)]
    pub refresh_interval: Option<Value>,
}

/// Vendor API client credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Validated platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub name: String,
    pub credentials: Credentials,
    pub devices: Vec<DeviceConfig>,
    pub debug: bool,
    pub refresh_interval_secs: u64,
    pub banding: AirQualityBanding,
    pub voc_conversion: VocConversion,
    pub storage_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub token_url: Option<String>,
}

/// Validated per-device configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub name: String,
    pub serial_number: String,
    pub debug: bool,
    pub battery_disabled: bool,
    pub co2_air_quality_disabled: bool,
    pub humidity_air_quality_disabled: bool,
    pub pm25_air_quality_disabled: bool,
    pub radon_air_quality_disabled: bool,
    pub voc_air_quality_disabled: bool,
    pub co2_detected_threshold: i64,
    /// `None` disables the radon leak sensor
    pub radon_leak_threshold: Option<i64>,
    pub refresh_interval_secs: u64,
}

impl DeviceConfig {
    /// Device config with every option at its default
    pub fn new(serial_number: impl Into<String>) -> Self {
        let serial_number = serial_number.into();
        Self {
            name: format!("{} {}", DEFAULT_PLATFORM_NAME, serial_number),
            serial_number,
            debug: false,
            battery_disabled: false,
            co2_air_quality_disabled: false,
            humidity_air_quality_disabled: false,
            pm25_air_quality_disabled: false,
            radon_air_quality_disabled: false,
            voc_air_quality_disabled: false,
            co2_detected_threshold: DEFAULT_CO2_DETECTED_THRESHOLD,
            radon_leak_threshold: None,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }

    /// Sensors counted towards the air quality aggregate
    pub fn air_quality_selection(&self) -> AirQualitySelection {
        AirQualitySelection {
            co2: !self.co2_air_quality_disabled,
            humidity: !self.humidity_air_quality_disabled,
            pm25: !self.pm25_air_quality_disabled,
            radon: !self.radon_air_quality_disabled,
            voc: !self.voc_air_quality_disabled,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// A configuration problem that was corrected rather than rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Value failed the integer check and was replaced by its default
    InvalidInteger { key: String },
    /// Non-boolean flag, read by truthiness
    InvalidBoolean { key: String },
    /// Refresh interval below the minimum was raised to it
    RefreshIntervalTooShort { key: String },
    /// Device entry without a serial number was skipped
    MissingSerialNumber { index: usize },
    /// A later entry for an already configured serial was skipped
    DuplicateSerialNumber { serial: String },
    /// Unrecognised strategy name, default used
    UnknownOption { key: String, value: String },
}

impl ConfigWarning {
    /// Log this warning at the appropriate level
    pub fn log(&self) {
        match self {
            ConfigWarning::MissingSerialNumber { .. } => error!("{}", self),
            _ => warn!("{}", self),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::InvalidInteger { key } => {
                write!(f, "Invalid config value: {} (not a valid integer)", key)
            }
            ConfigWarning::InvalidBoolean { key } => {
                write!(f, "Invalid config value: {} (not true or false)", key)
            }
            ConfigWarning::RefreshIntervalTooShort { key } => write!(
                f,
                "Invalid config value: {} (<{}s may cause rate limiting)",
                key, MIN_REFRESH_INTERVAL_SECS
            ),
            ConfigWarning::MissingSerialNumber { index } => write!(
                f,
                "Missing required config value: serialNumber (device #{} skipped)",
                index + 1
            ),
            ConfigWarning::DuplicateSerialNumber { serial } => {
                write!(f, "Duplicate device serialNumber {} skipped", serial)
            }
            ConfigWarning::UnknownOption { key, value } => {
                write!(f, "Invalid config value: {} (unknown option '{}')", key, value)
            }
        }
    }
}

/// Validated configuration plus the corrections applied to it
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: PlatformConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Outcome of reading an optional integer field
enum IntegerField {
    Absent,
    Valid(i64),
    Invalid,
}

/// JavaScript-style falsiness: null, zero, empty string and false
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Integer whose magnitude fits in 53 bits
fn safe_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };

    if let Some(i) = n.as_i64() {
        return (i.abs() <= MAX_SAFE_INTEGER).then_some(i);
    }
    if n.as_u64().is_some() {
        // Anything that only fits in u64 exceeds the safe range
        return None;
    }

    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn integer_field(value: Option<&Value>) -> IntegerField {
    match value {
        None => IntegerField::Absent,
        Some(v) if is_falsy(v) => IntegerField::Absent,
        Some(v) => match safe_integer(v) {
            Some(i) => IntegerField::Valid(i),
            None => IntegerField::Invalid,
        },
    }
}

/// Optional on/off flag
///
/// Null counts as absent. Anything other than a boolean is read by its
/// truthiness and reported.
fn flag_field(
    value: Option<&Value>,
    key: String,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<bool> {
    match value? {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        other => {
            warnings.push(ConfigWarning::InvalidBoolean { key });
            Some(!is_falsy(other))
        }
    }
}

/// Text value for ids and serials, which YAML may parse as numbers
fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn device_key(serial: &str, field: &str) -> String {
    format!("devices[{}].{}", serial, field)
}

/// Normalize a refresh interval, falling back to `fallback` seconds
fn refresh_interval(
    value: Option<&Value>,
    key: String,
    fallback: u64,
    warnings: &mut Vec<ConfigWarning>,
) -> u64 {
    match integer_field(value) {
        IntegerField::Absent => fallback,
        IntegerField::Invalid => {
            warnings.push(ConfigWarning::InvalidInteger { key });
            fallback
        }
        IntegerField::Valid(secs) if secs < MIN_REFRESH_INTERVAL_SECS as i64 => {
            warnings.push(ConfigWarning::RefreshIntervalTooShort { key });
            MIN_REFRESH_INTERVAL_SECS
        }
        IntegerField::Valid(secs) => secs as u64,
    }
}

impl RawPlatformConfig {
    /// Parse the raw schema from a loaded YAML document
    ///
    /// An empty document parses to an empty config, which then fails
    /// validation for missing credentials.
    pub fn from_yaml(yaml: Value) -> ConfigResult<Self> {
        let yaml = match yaml {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(_) => yaml,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "root".to_string(),
                    reason: "configuration must be a mapping".to_string(),
                })
            }
        };

        serde_yaml::from_value(yaml).map_err(|e| ConfigError::InvalidValue {
            key: "root".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate and normalize, logging every correction
    pub fn validate(&self) -> ConfigResult<ValidatedConfig> {
        let client_id = text_field(self.client_id.as_ref())
            .ok_or(ConfigError::MissingValue { key: "clientId" })?;
        let client_secret = text_field(self.client_secret.as_ref())
            .ok_or(ConfigError::MissingValue { key: "clientSecret" })?;

        let mut warnings = Vec::new();

        let debug = flag_field(self.debug.as_ref(), "debug".to_string(), &mut warnings)
            .unwrap_or(false);
        let refresh_interval_secs = refresh_interval(
            self.refresh_interval.as_ref(),
            "refreshInterval".to_string(),
            DEFAULT_REFRESH_INTERVAL_SECS,
            &mut warnings,
        );

        let banding = match self.air_quality_bands.as_deref() {
            None => AirQualityBanding::default(),
            Some(s) => s.parse().unwrap_or_else(|_| {
                warnings.push(ConfigWarning::UnknownOption {
                    key: "airQualityBands".to_string(),
                    value: s.to_string(),
                });
                AirQualityBanding::default()
            }),
        };

        let voc_conversion = match self.voc_conversion.as_deref() {
            None => VocConversion::default(),
            Some(s) => s.parse().unwrap_or_else(|_| {
                warnings.push(ConfigWarning::UnknownOption {
                    key: "vocConversion".to_string(),
                    value: s.to_string(),
                });
                VocConversion::default()
            }),
        };

        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(self.devices.len());
        for (index, raw) in self.devices.iter().enumerate() {
            let Some(serial) = text_field(raw.serial_number.as_ref()) else {
                warnings.push(ConfigWarning::MissingSerialNumber { index });
                continue;
            };
            if !seen.insert(serial.clone()) {
                warnings.push(ConfigWarning::DuplicateSerialNumber { serial });
                continue;
            }
            devices.push(raw.validate(
                serial,
                debug,
                refresh_interval_secs,
                &mut warnings,
            ));
        }

        for warning in &warnings {
            warning.log();
        }

        Ok(ValidatedConfig {
            config: PlatformConfig {
                name: self
                    .platform
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_PLATFORM_NAME.to_string()),
                credentials: Credentials {
                    client_id,
                    client_secret,
                },
                devices,
                debug,
                refresh_interval_secs,
                banding,
                voc_conversion,
                storage_path: self.storage_path.clone(),
                api_base_url: self.api_base_url.clone(),
                token_url: self.token_url.clone(),
            },
            warnings,
        })
    }
}

impl RawDeviceConfig {
    fn validate(
        &self,
        serial_number: String,
        platform_debug: bool,
        platform_refresh_secs: u64,
        warnings: &mut Vec<ConfigWarning>,
    ) -> DeviceConfig {
        let co2_detected_threshold = match integer_field(self.co2_detected_threshold.as_ref()) {
            IntegerField::Absent => DEFAULT_CO2_DETECTED_THRESHOLD,
            IntegerField::Valid(v) => v,
            IntegerField::Invalid => {
                warnings.push(ConfigWarning::InvalidInteger {
                    key: device_key(&serial_number, "co2DetectedThreshold"),
                });
                DEFAULT_CO2_DETECTED_THRESHOLD
            }
        };

        let radon_leak_threshold = match integer_field(self.radon_leak_threshold.as_ref()) {
            IntegerField::Absent => None,
            IntegerField::Valid(v) => Some(v),
            IntegerField::Invalid => {
                warnings.push(ConfigWarning::InvalidInteger {
                    key: device_key(&serial_number, "radonLeakThreshold"),
                });
                None
            }
        };

        let refresh_interval_secs = refresh_interval(
            self.refresh_interval.as_ref(),
            device_key(&serial_number, "refreshInterval"),
            platform_refresh_secs,
            warnings,
        );

        let mut flag = |value: &Option<Value>, field: &str| {
            flag_field(value.as_ref(), device_key(&serial_number, field), warnings)
        };
        let debug = flag(&self.debug, "debug").unwrap_or(platform_debug);
        let battery_disabled = flag(&self.battery_disabled, "batteryDisabled").unwrap_or(false);
        let co2_air_quality_disabled =
            flag(&self.co2_air_quality_disabled, "co2AirQualityDisabled").unwrap_or(false);
        let humidity_air_quality_disabled =
            flag(&self.humidity_air_quality_disabled, "humidityAirQualityDisabled")
                .unwrap_or(false);
        let pm25_air_quality_disabled =
            flag(&self.pm25_air_quality_disabled, "pm25AirQualityDisabled").unwrap_or(false);
        let radon_air_quality_disabled =
            flag(&self.radon_air_quality_disabled, "radonAirQualityDisabled").unwrap_or(false);
        let voc_air_quality_disabled =
            flag(&self.voc_air_quality_disabled, "vocAirQualityDisabled").unwrap_or(false);

        DeviceConfig {
            name: self
                .name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{} {}", DEFAULT_PLATFORM_NAME, serial_number)),
            debug,
            battery_disabled,
            co2_air_quality_disabled,
            humidity_air_quality_disabled,
            pm25_air_quality_disabled,
            radon_air_quality_disabled,
            voc_air_quality_disabled,
            co2_detected_threshold,
            radon_leak_threshold,
            refresh_interval_secs,
            serial_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> RawPlatformConfig {
        RawPlatformConfig::from_yaml(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    fn validate(yaml: &str) -> ValidatedConfig {
        parse(yaml).validate().unwrap()
    }

    const CREDS: &str = "clientId: id\nclientSecret: secret\n";

    #[test]
    fn test_defaults() {
        let v = validate(&format!(
            "{}devices:\n  - serialNumber: \"2930012345\"\n",
            CREDS
        ));
        assert!(v.warnings.is_empty());
        assert_eq!(v.config.name, "Airthings");
        assert_eq!(v.config.refresh_interval_secs, 150);
        assert_eq!(v.config.banding, AirQualityBanding::Standard);
        assert_eq!(v.config.voc_conversion, VocConversion::Fixed);

        let device = &v.config.devices[0];
        assert_eq!(device, &DeviceConfig::new("2930012345"));
        assert_eq!(device.name, "Airthings 2930012345");
        assert_eq!(device.refresh_interval(), Duration::from_secs(150));
        assert_eq!(device.air_quality_selection(), AirQualitySelection::ALL);
    }

    #[test]
    fn test_refresh_interval_clamped() {
        let v = validate(&format!("{}refreshInterval: 30\n", CREDS));
        assert_eq!(v.config.refresh_interval_secs, 60);
        assert_eq!(
            v.warnings,
            vec![ConfigWarning::RefreshIntervalTooShort {
                key: "refreshInterval".to_string()
            }]
        );
        assert_eq!(
            v.warnings[0].to_string(),
            "Invalid config value: refreshInterval (<60s may cause rate limiting)"
        );
    }

    #[test]
    fn test_refresh_interval_not_integer() {
        let v = validate(&format!("{}refreshInterval: abc\n", CREDS));
        assert_eq!(v.config.refresh_interval_secs, 150);
        assert_eq!(
            v.warnings[0].to_string(),
            "Invalid config value: refreshInterval (not a valid integer)"
        );

        let v = validate(&format!("{}refreshInterval: 90.5\n", CREDS));
        assert_eq!(v.config.refresh_interval_secs, 150);
        assert_eq!(v.warnings.len(), 1);
    }

    #[test]
    fn test_zero_counts_as_absent() {
        let v = validate(&format!(
            "{}refreshInterval: 0\ndevices:\n  - serialNumber: \"2930012345\"\n    co2DetectedThreshold: 0\n    radonLeakThreshold: \"\"\n",
            CREDS
        ));
        assert!(v.warnings.is_empty());
        assert_eq!(v.config.refresh_interval_secs, 150);
        assert_eq!(v.config.devices[0].co2_detected_threshold, 1000);
        assert_eq!(v.config.devices[0].radon_leak_threshold, None);
    }

    #[test]
    fn test_integral_float_accepted() {
        let v = validate(&format!("{}refreshInterval: 300.0\n", CREDS));
        assert!(v.warnings.is_empty());
        assert_eq!(v.config.refresh_interval_secs, 300);
    }

    #[test]
    fn test_device_overrides() {
        let v = validate(&format!(
            r#"{}refreshInterval: 200
debug: true
devices:
  - name: Basement
    serialNumber: 2950001234
    debug: false
    batteryDisabled: true
    co2AirQualityDisabled: true
    vocAirQualityDisabled: true
    co2DetectedThreshold: 1500
    radonLeakThreshold: 150
    refreshInterval: 120
  - serialNumber: "2930000001"
"#,
            CREDS
        ));
        assert!(v.warnings.is_empty());

        let basement = &v.config.devices[0];
        assert_eq!(basement.name, "Basement");
        assert_eq!(basement.serial_number, "2950001234");
        assert!(!basement.debug);
        assert!(basement.battery_disabled);
        assert_eq!(basement.co2_detected_threshold, 1500);
        assert_eq!(basement.radon_leak_threshold, Some(150));
        assert_eq!(basement.refresh_interval_secs, 120);
        let selection = basement.air_quality_selection();
        assert!(!selection.co2 && !selection.voc);
        assert!(selection.humidity && selection.pm25 && selection.radon);

        let second = &v.config.devices[1];
        assert!(second.debug);
        assert_eq!(second.refresh_interval_secs, 200);
    }

    #[test]
    fn test_invalid_thresholds() {
        let v = validate(&format!(
            "{}devices:\n  - serialNumber: \"2950001234\"\n    co2DetectedThreshold: lots\n    radonLeakThreshold: 1.5\n    refreshInterval: 10\n",
            CREDS
        ));
        let device = &v.config.devices[0];
        assert_eq!(device.co2_detected_threshold, 1000);
        assert_eq!(device.radon_leak_threshold, None);
        assert_eq!(device.refresh_interval_secs, 60);
        assert_eq!(
            v.warnings,
            vec![
                ConfigWarning::InvalidInteger {
                    key: "devices[2950001234].co2DetectedThreshold".to_string()
                },
                ConfigWarning::InvalidInteger {
                    key: "devices[2950001234].radonLeakThreshold".to_string()
                },
                ConfigWarning::RefreshIntervalTooShort {
                    key: "devices[2950001234].refreshInterval".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_credentials() {
        let err = parse("clientSecret: secret\n").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { key: "clientId" }));

        let err = parse("clientId: id\nclientSecret: \"\"\n")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { key: "clientSecret" }));
        assert_eq!(err.to_string(), "Missing required config value: clientSecret");

        let empty = RawPlatformConfig::from_yaml(Value::Null).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_missing_and_duplicate_serials() {
        let v = validate(&format!(
            "{}devices:\n  - name: No Serial\n  - serialNumber: \"2930000001\"\n  - serialNumber: \"2930000001\"\n    name: Copy\n",
            CREDS
        ));
        assert_eq!(v.config.devices.len(), 1);
        assert_eq!(
            v.warnings,
            vec![
                ConfigWarning::MissingSerialNumber { index: 0 },
                ConfigWarning::DuplicateSerialNumber {
                    serial: "2930000001".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_strategies() {
        let v = validate(&format!(
            "{}airQualityBands: extended\nvocConversion: idealGas\n",
            CREDS
        ));
        assert_eq!(v.config.banding, AirQualityBanding::Extended);
        assert_eq!(v.config.voc_conversion, VocConversion::IdealGas);

        let v = validate(&format!("{}airQualityBands: strict\n", CREDS));
        assert_eq!(v.config.banding, AirQualityBanding::Standard);
        assert_eq!(v.warnings.len(), 1);
    }

    #[test]
    fn test_malformed_flags_do_not_abort() {
        let v = validate(&format!(
            r#"{}debug: "yes"
devices:
  - serialNumber: "2930000001"
    batteryDisabled: 1
    co2AirQualityDisabled: [co2]
    vocAirQualityDisabled: ""
    humidityAirQualityDisabled: ~
    refreshInterval: 90
"#,
            CREDS
        ));

        assert!(v.config.debug);
        let device = &v.config.devices[0];
        assert!(device.debug);
        assert!(device.battery_disabled);
        assert!(device.co2_air_quality_disabled);
        assert!(!device.voc_air_quality_disabled);
        assert!(!device.humidity_air_quality_disabled);
        assert_eq!(device.refresh_interval_secs, 90);
        assert_eq!(
            v.warnings,
            vec![
                ConfigWarning::InvalidBoolean {
                    key: "debug".to_string()
                },
                ConfigWarning::InvalidBoolean {
                    key: "devices[2930000001].batteryDisabled".to_string()
                },
                ConfigWarning::InvalidBoolean {
                    key: "devices[2930000001].co2AirQualityDisabled".to_string()
                },
                ConfigWarning::InvalidBoolean {
                    key: "devices[2930000001].vocAirQualityDisabled".to_string()
                },
            ]
        );
        assert_eq!(
            v.warnings[1].to_string(),
            "Invalid config value: devices[2930000001].batteryDisabled (not true or false)"
        );
    }

    #[test]
    fn test_credentials_debug_redacted() {
        let v = validate(CREDS);
        let debug = format!("{:?}", v.config.credentials);
        assert!(debug.contains("\"id\""));
        assert!(!debug.contains("\"secret\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_safe_integer_bounds() {
        let max: Value = serde_yaml::from_str("9007199254740991").unwrap();
        assert_eq!(safe_integer(&max), Some(MAX_SAFE_INTEGER));
        let over: Value = serde_yaml::from_str("9007199254740992").unwrap();
        assert_eq!(safe_integer(&over), None);
        assert_eq!(safe_integer(&Value::Bool(true)), None);
        assert_eq!(safe_integer(&Value::String("60".to_string())), None);
    }
}
