//! Core types for the Airthings bridge
//!
//! This crate provides the vendor-independent pieces of the bridge: the
//! sensor result model returned by each poll, the serial-number device
//! catalog, the air quality classifier, the freshness policy and the VOC
//! unit conversions. Everything here is pure and free of I/O.

mod air_quality;
mod device;
mod freshness;
mod sensor;
mod voc;

pub use air_quality::{
    classify, classify_with, AirQuality, AirQualityBanding, AirQualitySelection,
    ParseBandingError,
};
pub use device::{lookup_device, DeviceInfo, SensorSupport, DEVICE_CATALOG, SERIAL_PREFIX_LEN};
pub use freshness::{is_fresh, is_fresh_at, FRESHNESS_WINDOW};
pub use sensor::{SensorReading, SensorResult, SensorType};
pub use voc::{ParseConversionError, VocConversion};

/// Manufacturer string written to accessory information
pub const MANUFACTURER: &str = "Airthings";

/// Battery percentage at or below which the battery is reported low
pub const LOW_BATTERY_PERCENTAGE: f64 = 10.0;

/// Default CO2 "detected" threshold in ppm
pub const DEFAULT_CO2_DETECTED_THRESHOLD: i64 = 1000;
