//! Air quality classification
//!
//! Each enabled sensor that reported a value this poll is mapped to a band,
//! and the aggregate is the worst band across those sensors. With no
//! contributing sensor the aggregate stays [`AirQuality::Unknown`].
//!
//! Two banding tables exist. [`AirQualityBanding::Standard`] is the
//! GOOD/FAIR/POOR table:
//!
//! | Sensor | Good | Fair | Poor |
//! |---|---|---|---|
//! | CO2 (ppm) | <800 | 800–999 | ≥1000 |
//! | Humidity (%RH) | 30–59 | 25–29, 60–69 | <25, ≥70 |
//! | PM2.5 (µg/m³) | <10 | 10–24 | ≥25 |
//! | Radon (Bq/m³) | <100 | 100–149 | ≥150 |
//! | VOC (ppb) | <250 | 250–1999 | ≥2000 |
//!
//! [`AirQualityBanding::Extended`] adds an INFERIOR band between FAIR and POOR
//! with wider limits, and reports EXCELLENT for a poll that returned readings
//! but none worse than that.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sensor::{SensorResult, SensorType};

/// Air quality level, ordered by severity
///
/// Discriminants are the HomeKit AirQuality characteristic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AirQuality {
    Unknown = 0,
    Excellent = 1,
    Good = 2,
    Fair = 3,
    Inferior = 4,
    Poor = 5,
}

impl AirQuality {
    /// Characteristic value for this level
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Banding table used to classify individual readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AirQualityBanding {
    /// GOOD / FAIR / POOR
    #[default]
    Standard,
    /// GOOD / FAIR / INFERIOR / POOR
    Extended,
}

#[derive(Debug, Error)]
#[error("unknown air quality banding '{0}' (expected 'standard' or 'extended')")]
pub struct ParseBandingError(String);

impl FromStr for AirQualityBanding {
    type Err = ParseBandingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(AirQualityBanding::Standard),
            "extended" => Ok(AirQualityBanding::Extended),
            other => Err(ParseBandingError(other.to_string())),
        }
    }
}

impl AirQualityBanding {
    /// Band for a single reading
    ///
    /// Returns `None` for sensor types that do not take part in the aggregate.
    pub fn classify_reading(self, sensor_type: SensorType, value: f64) -> Option<AirQuality> {
        match self {
            AirQualityBanding::Standard => standard_band(sensor_type, value),
            AirQualityBanding::Extended => extended_band(sensor_type, value),
        }
    }
}

fn standard_band(sensor_type: SensorType, v: f64) -> Option<AirQuality> {
    use AirQuality::*;

    let band = match sensor_type {
        SensorType::Co2 => {
            if v >= 1000.0 {
                Poor
            } else if v >= 800.0 {
                Fair
            } else {
                Good
            }
        }
        SensorType::Humidity => {
            if v < 25.0 || v >= 70.0 {
                Poor
            } else if v < 30.0 || v >= 60.0 {
                Fair
            } else {
                Good
            }
        }
        SensorType::Pm25 => {
            if v >= 25.0 {
                Poor
            } else if v >= 10.0 {
                Fair
            } else {
                Good
            }
        }
        SensorType::RadonShortTermAvg => {
            if v >= 150.0 {
                Poor
            } else if v >= 100.0 {
                Fair
            } else {
                Good
            }
        }
        SensorType::Voc => {
            if v >= 2000.0 {
                Poor
            } else if v >= 250.0 {
                Fair
            } else {
                Good
            }
        }
        _ => return None,
    };

    Some(band)
}

fn extended_band(sensor_type: SensorType, v: f64) -> Option<AirQuality> {
    use AirQuality::*;

    // (fair, inferior, poor) lower limits, exclusive
    let ladder = |fair: f64, inferior: f64, poor: f64| {
        if v > poor {
            Poor
        } else if v > inferior {
            Inferior
        } else if v > fair {
            Fair
        } else {
            Good
        }
    };

    let band = match sensor_type {
        SensorType::Co2 => ladder(1000.0, 2000.0, 5000.0),
        SensorType::Humidity => {
            if v > 70.0 || v < 25.0 {
                Poor
            } else if v > 65.0 || v < 30.0 {
                Inferior
            } else if v > 60.0 || v < 35.0 {
                Fair
            } else {
                Good
            }
        }
        SensorType::Pm25 => ladder(55.0, 150.0, 250.0),
        SensorType::RadonShortTermAvg => ladder(150.0, 300.0, 600.0),
        SensorType::Voc => ladder(125.0, 250.0, 2000.0),
        _ => return None,
    };

    Some(band)
}

/// Which sensors take part in the air quality aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualitySelection {
    pub co2: bool,
    pub humidity: bool,
    pub pm25: bool,
    pub radon: bool,
    pub voc: bool,
}

impl AirQualitySelection {
    pub const ALL: AirQualitySelection = AirQualitySelection {
        co2: true,
        humidity: true,
        pm25: true,
        radon: true,
        voc: true,
    };

    pub const NONE: AirQualitySelection = AirQualitySelection {
        co2: false,
        humidity: false,
        pm25: false,
        radon: false,
        voc: false,
    };

    /// Whether readings of `sensor_type` are counted
    pub fn includes(&self, sensor_type: SensorType) -> bool {
        match sensor_type {
            SensorType::Co2 => self.co2,
            SensorType::Humidity => self.humidity,
            SensorType::Pm25 => self.pm25,
            SensorType::RadonShortTermAvg => self.radon,
            SensorType::Voc => self.voc,
            _ => false,
        }
    }
}

impl Default for AirQualitySelection {
    fn default() -> Self {
        Self::ALL
    }
}

/// Classify a result with the standard banding table
pub fn classify(result: &SensorResult, selection: &AirQualitySelection) -> AirQuality {
    classify_with(AirQualityBanding::Standard, result, selection)
}

/// Classify a result with the given banding table
pub fn classify_with(
    banding: AirQualityBanding,
    result: &SensorResult,
    selection: &AirQualitySelection,
) -> AirQuality {
    const AGGREGATED: [SensorType; 5] = [
        SensorType::Co2,
        SensorType::Humidity,
        SensorType::Pm25,
        SensorType::RadonShortTermAvg,
        SensorType::Voc,
    ];

    let start = match banding {
        AirQualityBanding::Extended if !result.is_empty() => AirQuality::Excellent,
        _ => AirQuality::Unknown,
    };

    AGGREGATED
        .iter()
        .filter(|sensor_type| selection.includes(**sensor_type))
        .filter_map(|sensor_type| {
            result
                .value(*sensor_type)
                .and_then(|value| banding.classify_reading(*sensor_type, value))
        })
        .fold(start, AirQuality::max)
}
