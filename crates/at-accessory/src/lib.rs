//! Accessory object model for the Airthings bridge
//!
//! An [`Accessory`] exposes [`Service`]s, each carrying typed
//! [`Characteristic`]s. The [`AccessoryCache`] owns all accessories,
//! persists them across restarts and broadcasts value changes to whatever
//! publishes them to the home hub.

mod accessory;
mod cache;
pub mod hap;
mod storage;
mod value;

pub use accessory::{accessory_uuid, Accessory, Characteristic, Service, ServiceKey};
pub use cache::{AccessoryCache, AccessoryEvent, CharacteristicChange, STORAGE_KEY};
pub use hap::{CharacteristicProps, CharacteristicType, Format, ServiceType};
pub use storage::{Storable, Storage, StorageError, StorageFile, StorageResult};
pub use value::CharacteristicValue;
