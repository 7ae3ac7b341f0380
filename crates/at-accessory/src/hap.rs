//! HomeKit service and characteristic definitions
//!
//! Only the types the bridge exposes are modelled, each with the value
//! format and range HomeKit enforces for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::CharacteristicValue;

/// Service types exposed by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    AccessoryInformation,
    Battery,
    AirQualitySensor,
    TemperatureSensor,
    HumiditySensor,
    CarbonDioxideSensor,
    LeakSensor,
    /// Eve air pressure sensor
    AirPressureSensor,
}

impl ServiceType {
    /// Characteristics every instance of this service carries
    pub fn required_characteristics(&self) -> &'static [CharacteristicType] {
        use CharacteristicType::*;
        match self {
            ServiceType::AccessoryInformation => {
                &[Manufacturer, Model, Name, SerialNumber, FirmwareRevision]
            }
            ServiceType::Battery => &[BatteryLevel, ChargingState, StatusLowBattery],
            ServiceType::AirQualitySensor => &[AirQuality],
            ServiceType::TemperatureSensor => &[CurrentTemperature],
            ServiceType::HumiditySensor => &[CurrentRelativeHumidity],
            ServiceType::CarbonDioxideSensor => &[CarbonDioxideDetected],
            ServiceType::LeakSensor => &[LeakDetected],
            ServiceType::AirPressureSensor => &[AirPressure],
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Characteristic types exposed by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicType {
    Manufacturer,
    Model,
    Name,
    SerialNumber,
    FirmwareRevision,
    BatteryLevel,
    ChargingState,
    StatusLowBattery,
    AirQuality,
    CarbonDioxideLevel,
    CarbonDioxideDetected,
    CurrentRelativeHumidity,
    CurrentTemperature,
    #[serde(rename = "PM2_5Density")]
    Pm25Density,
    #[serde(rename = "VOCDensity")]
    VocDensity,
    StatusActive,
    LeakDetected,
    /// Radon short-term average in Bq/m³
    Radon,
    /// Raw VOC reading in ppb
    VocPpb,
    /// Eve air pressure in mBar
    AirPressure,
    /// Mold risk index
    Mold,
}

/// Wire format of a characteristic value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bool,
    UInt8,
    UInt16,
    Float,
    String,
}

/// Format, unit and range of a characteristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicProps {
    pub format: Format,
    pub unit: Option<&'static str>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_step: Option<f64>,
}

impl CharacteristicProps {
    fn new(format: Format) -> Self {
        Self {
            format,
            unit: None,
            min_value: None,
            max_value: None,
            min_step: None,
        }
    }

    fn range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self.min_step = Some(step);
        self
    }

    fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Bring a value into this characteristic's format and range
    ///
    /// Numbers are clamped to the valid range and rounded for integer
    /// formats. A value of the wrong kind is returned unchanged.
    pub fn coerce(&self, value: CharacteristicValue) -> CharacteristicValue {
        let number = match (&self.format, value.as_f64()) {
            (Format::Bool | Format::String, _) | (_, None) => return value,
            (_, Some(n)) => n,
        };

        let mut n = number;
        if let Some(min) = self.min_value {
            n = n.max(min);
        }
        if let Some(max) = self.max_value {
            n = n.min(max);
        }

        match self.format {
            Format::UInt8 | Format::UInt16 => CharacteristicValue::Int(n.round() as i64),
            _ => CharacteristicValue::Float(n),
        }
    }

    /// Initial value for a freshly added characteristic
    pub fn default_value(&self) -> CharacteristicValue {
        match self.format {
            Format::Bool => CharacteristicValue::Bool(false),
            Format::String => CharacteristicValue::String(String::new()),
            _ => self.coerce(CharacteristicValue::Int(0)),
        }
    }
}

impl CharacteristicType {
    pub fn props(&self) -> CharacteristicProps {
        use CharacteristicType::*;
        match self {
            Manufacturer | Model | Name | SerialNumber | FirmwareRevision => {
                CharacteristicProps::new(Format::String)
            }
            BatteryLevel => CharacteristicProps::new(Format::UInt8)
                .range(0.0, 100.0, 1.0)
                .unit("percentage"),
            ChargingState => CharacteristicProps::new(Format::UInt8).range(0.0, 2.0, 1.0),
            StatusLowBattery | CarbonDioxideDetected | LeakDetected => {
                CharacteristicProps::new(Format::UInt8).range(0.0, 1.0, 1.0)
            }
            AirQuality => CharacteristicProps::new(Format::UInt8).range(0.0, 5.0, 1.0),
            CarbonDioxideLevel => CharacteristicProps::new(Format::Float)
                .range(0.0, 100_000.0, 1.0)
                .unit("ppm"),
            CurrentRelativeHumidity => CharacteristicProps::new(Format::Float)
                .range(0.0, 100.0, 1.0)
                .unit("percentage"),
            CurrentTemperature => CharacteristicProps::new(Format::Float)
                .range(-270.0, 100.0, 0.1)
                .unit("celsius"),
            Pm25Density | VocDensity => CharacteristicProps::new(Format::Float)
                .range(0.0, 1000.0, 1.0)
                .unit("µg/m³"),
            StatusActive => CharacteristicProps::new(Format::Bool),
            Radon => CharacteristicProps::new(Format::Float)
                .range(0.0, 16383.0, 1.0)
                .unit("Bq/m³"),
            VocPpb => CharacteristicProps::new(Format::Float)
                .range(0.0, 65535.0, 1.0)
                .unit("ppb"),
            AirPressure => CharacteristicProps::new(Format::UInt16)
                .range(0.0, 1200.0, 1.0)
                .unit("mBar"),
            Mold => CharacteristicProps::new(Format::UInt8).range(0.0, 10.0, 1.0),
        }
    }
}

impl fmt::Display for CharacteristicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// CarbonDioxideDetected values
pub mod co2_detected {
    pub const NORMAL: i64 = 0;
    pub const ABNORMAL: i64 = 1;
}

/// LeakDetected values
pub mod leak_detected {
    pub const NOT_DETECTED: i64 = 0;
    pub const DETECTED: i64 = 1;
}

/// StatusLowBattery values
pub mod low_battery {
    pub const NORMAL: i64 = 0;
    pub const LOW: i64 = 1;
}

/// ChargingState values
pub mod charging_state {
    pub const NOT_CHARGEABLE: i64 = 2;
}
