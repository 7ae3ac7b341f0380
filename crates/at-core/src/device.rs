//! Device catalog keyed by serial-number prefix
//!
//! Adding a new model is a data change: append a row to [`DEVICE_CATALOG`].

use serde::Serialize;

/// Number of leading serial-number characters that identify the model
pub const SERIAL_PREFIX_LEN: usize = 4;

/// Which sensors a device model carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSupport {
    pub co2: bool,
    pub humidity: bool,
    pub mold: bool,
    pub pm1: bool,
    pub pm25: bool,
    pub pressure: bool,
    pub radon_short_term_avg: bool,
    pub temp: bool,
    pub voc: bool,
}

impl SensorSupport {
    /// A device with no sensors at all
    pub const NONE: SensorSupport = SensorSupport {
        co2: false,
        humidity: false,
        mold: false,
        pm1: false,
        pm25: false,
        pressure: false,
        radon_short_term_avg: false,
        temp: false,
        voc: false,
    };
}

/// Model name and sensor set for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub model: &'static str,
    pub sensors: SensorSupport,
}

impl DeviceInfo {
    /// Sentinel for serial numbers that match no catalog entry
    pub const UNKNOWN: DeviceInfo = DeviceInfo {
        model: "Unknown",
        sensors: SensorSupport::NONE,
    };

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

/// Known models in lookup order
pub const DEVICE_CATALOG: &[(&str, DeviceInfo)] = &[
    (
        "2900",
        DeviceInfo {
            model: "Wave",
            sensors: SensorSupport {
                humidity: true,
                radon_short_term_avg: true,
                temp: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "2920",
        DeviceInfo {
            model: "Wave Mini",
            sensors: SensorSupport {
                humidity: true,
                mold: true,
                temp: true,
                voc: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "2930",
        DeviceInfo {
            model: "Wave Plus",
            sensors: SensorSupport {
                co2: true,
                humidity: true,
                pressure: true,
                radon_short_term_avg: true,
                temp: true,
                voc: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "2950",
        DeviceInfo {
            model: "Wave Radon",
            sensors: SensorSupport {
                humidity: true,
                radon_short_term_avg: true,
                temp: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "2960",
        DeviceInfo {
            model: "View Plus",
            sensors: SensorSupport {
                co2: true,
                humidity: true,
                pm1: true,
                pm25: true,
                pressure: true,
                radon_short_term_avg: true,
                temp: true,
                voc: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "2980",
        DeviceInfo {
            model: "View Pollution",
            sensors: SensorSupport {
                humidity: true,
                pm1: true,
                pm25: true,
                temp: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "2989",
        DeviceInfo {
            model: "View Radon",
            sensors: SensorSupport {
                humidity: true,
                radon_short_term_avg: true,
                temp: true,
                ..SensorSupport::NONE
            },
        },
    ),
    (
        "3220",
        DeviceInfo {
            model: "Wave Enhance",
            sensors: SensorSupport {
                co2: true,
                humidity: true,
                pressure: true,
                temp: true,
                voc: true,
                ..SensorSupport::NONE
            },
        },
    ),
];

/// Look up a device by serial number
///
/// Total: serial numbers shorter than the prefix or with an unknown prefix
/// map to [`DeviceInfo::UNKNOWN`].
pub fn lookup_device(serial_number: &str) -> DeviceInfo {
    let Some(prefix) = serial_number.get(..SERIAL_PREFIX_LEN) else {
        return DeviceInfo::UNKNOWN;
    };

    DEVICE_CATALOG
        .iter()
        .find(|(key, _)| *key == prefix)
        .map(|(_, info)| *info)
        .unwrap_or(DeviceInfo::UNKNOWN)
}
