//! VOC unit conversion from ppb to µg/m³

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sensor::{SensorResult, SensorType};

/// Fixed ppb to µg/m³ factor for the reference VOC mixture
const FIXED_FACTOR: f64 = 2.2727;

/// Molar mass of the reference VOC mixture in g/mol
const REFERENCE_MOLAR_MASS: f64 = 78.0;

/// Molar volume at 0 °C and 1013 hPa in L/mol
const MOLAR_VOLUME: f64 = 22.41;

const DEFAULT_TEMPERATURE_C: f64 = 25.0;
const DEFAULT_PRESSURE_HPA: f64 = 1013.0;

/// How VOC ppb readings are converted to a mass density
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VocConversion {
    /// Constant factor of 2.2727
    #[default]
    Fixed,
    /// Corrected for the current temperature and pressure
    IdealGas,
}

#[derive(Debug, Error)]
#[error("unknown VOC conversion '{0}' (expected 'fixed' or 'idealGas')")]
pub struct ParseConversionError(String);

impl FromStr for VocConversion {
    type Err = ParseConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(VocConversion::Fixed),
            "idealGas" => Ok(VocConversion::IdealGas),
            other => Err(ParseConversionError(other.to_string())),
        }
    }
}

impl VocConversion {
    /// Convert a ppb reading to µg/m³
    ///
    /// Temperature (°C) and pressure (hPa) are only used by
    /// [`VocConversion::IdealGas`] and default to 25 °C and 1013 hPa.
    pub fn to_density(self, ppb: f64, temperature: Option<f64>, pressure: Option<f64>) -> f64 {
        match self {
            VocConversion::Fixed => ppb * FIXED_FACTOR,
            VocConversion::IdealGas => {
                let temperature = temperature.unwrap_or(DEFAULT_TEMPERATURE_C);
                let pressure = pressure.unwrap_or(DEFAULT_PRESSURE_HPA);
                let molar_volume = MOLAR_VOLUME
                    * ((temperature + 273.0) / 273.0)
                    * (DEFAULT_PRESSURE_HPA / pressure);
                ppb * REFERENCE_MOLAR_MASS / molar_volume
            }
        }
    }

    /// VOC density for a result, if it carries a VOC reading
    pub fn density_for(self, result: &SensorResult) -> Option<f64> {
        let ppb = result.value(SensorType::Voc)?;
        Some(self.to_density(
            ppb,
            result.value(SensorType::Temp),
            result.value(SensorType::Pressure),
        ))
    }
}
