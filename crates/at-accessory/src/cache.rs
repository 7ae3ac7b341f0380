//! Accessory cache
//!
//! Holds every accessory the bridge publishes, keyed by UUID. Accessories
//! survive restarts through [`Storage`], and every change to a
//! characteristic value is broadcast to subscribers.

use std::collections::HashMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::accessory::{Accessory, ServiceKey};
use crate::hap::{CharacteristicType, ServiceType};
use crate::storage::{Storable, Storage, StorageResult};
use crate::value::CharacteristicValue;

/// Storage key for cached accessories
pub const STORAGE_KEY: &str = "airthings.accessories";

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A characteristic value that changed
#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicChange {
    pub accessory: Uuid,
    pub display_name: String,
    pub service_type: ServiceType,
    pub subtype: Option<String>,
    pub characteristic: CharacteristicType,
    /// `None` when the characteristic was just added
    pub old_value: Option<CharacteristicValue>,
    pub new_value: CharacteristicValue,
}

/// Notifications published by the cache
#[derive(Debug, Clone, PartialEq)]
pub enum AccessoryEvent {
    Registered { uuid: Uuid, display_name: String },
    Restored { uuid: Uuid, display_name: String },
    Unregistered { uuid: Uuid, display_name: String },
    CharacteristicChanged(CharacteristicChange),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CachedAccessories {
    accessories: Vec<Accessory>,
}

impl Storable for CachedAccessories {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = 1;
    const MINOR_VERSION: u32 = 1;
}

/// Concurrent accessory store with persistence and change notifications
pub struct AccessoryCache {
    accessories: DashMap<Uuid, Accessory>,
    storage: Option<Storage>,
    events: broadcast::Sender<AccessoryEvent>,
}

impl AccessoryCache {
    /// Cache persisted to the given storage
    pub fn new(storage: Storage) -> Self {
        Self::with_storage(Some(storage))
    }

    /// Cache that is never written to disk
    pub fn in_memory() -> Self {
        Self::with_storage(None)
    }

    fn with_storage(storage: Option<Storage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accessories: DashMap::new(),
            storage,
            events,
        }
    }

    /// Load cached accessories from storage, returning how many were loaded
    pub async fn load(&self) -> StorageResult<usize> {
        let Some(storage) = &self.storage else {
            return Ok(0);
        };

        let cached = storage.load::<CachedAccessories>().await?.unwrap_or_default();
        let count = cached.accessories.len();
        for accessory in cached.accessories {
            info!("[{}] Loading accessory from cache...", accessory.display_name);
            self.accessories.insert(accessory.uuid, accessory);
        }
        Ok(count)
    }

    /// Persist every accessory
    pub async fn save(&self) -> StorageResult<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        let mut accessories = self.accessories();
        accessories.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        storage.save(&CachedAccessories { accessories }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryEvent> {
        self.events.subscribe()
    }

    /// Add a new accessory, replacing any with the same UUID
    pub fn register(&self, accessory: Accessory) {
        debug!(uuid = %accessory.uuid, "Registering accessory {}", accessory.display_name);
        let event = AccessoryEvent::Registered {
            uuid: accessory.uuid,
            display_name: accessory.display_name.clone(),
        };
        self.accessories.insert(accessory.uuid, accessory);
        self.publish(event);
    }

    /// Rename a cached accessory that is in use again
    ///
    /// Returns `false` if no accessory has this UUID.
    pub fn restore(&self, uuid: Uuid, display_name: &str) -> bool {
        let Some(mut accessory) = self.accessories.get_mut(&uuid) else {
            return false;
        };
        accessory.display_name = display_name.to_string();
        drop(accessory);

        self.publish(AccessoryEvent::Restored {
            uuid,
            display_name: display_name.to_string(),
        });
        true
    }

    pub fn unregister(&self, uuid: Uuid) -> Option<Accessory> {
        let (_, accessory) = self.accessories.remove(&uuid)?;
        debug!(uuid = %uuid, "Unregistered accessory {}", accessory.display_name);
        self.publish(AccessoryEvent::Unregistered {
            uuid,
            display_name: accessory.display_name.clone(),
        });
        Some(accessory)
    }

    /// Snapshot of one accessory
    pub fn get(&self, uuid: Uuid) -> Option<Accessory> {
        self.accessories.get(&uuid).map(|a| a.value().clone())
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.accessories.contains_key(&uuid)
    }

    /// Mutate an accessory in place and publish the values that changed
    pub fn update<R>(&self, uuid: Uuid, f: impl FnOnce(&mut Accessory) -> R) -> Option<R> {
        let mut accessory = self.accessories.get_mut(&uuid)?;

        let before: HashMap<(ServiceKey, CharacteristicType), CharacteristicValue> = accessory
            .snapshot()
            .into_iter()
            .map(|(service, ty, value)| ((service, ty), value))
            .collect();

        let result = f(accessory.value_mut());

        let display_name = accessory.display_name.clone();
        let changes: Vec<CharacteristicChange> = accessory
            .snapshot()
            .into_iter()
            .filter_map(|(service, ty, value)| {
                let old_value = before.get(&(service.clone(), ty)).cloned();
                if old_value.as_ref() == Some(&value) {
                    return None;
                }
                Some(CharacteristicChange {
                    accessory: uuid,
                    display_name: display_name.clone(),
                    service_type: service.service_type,
                    subtype: service.subtype,
                    characteristic: ty,
                    old_value,
                    new_value: value,
                })
            })
            .collect();
        drop(accessory);

        for change in changes {
            trace!(
                "[{}] {} {} -> {}",
                change.display_name,
                change.service_type,
                change.characteristic,
                change.new_value
            );
            self.publish(AccessoryEvent::CharacteristicChanged(change));
        }

        Some(result)
    }

    pub fn uuids(&self) -> Vec<Uuid> {
        self.accessories.iter().map(|entry| *entry.key()).collect()
    }

    pub fn accessories(&self) -> Vec<Accessory> {
        self.accessories
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }

    fn publish(&self, event: AccessoryEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::accessory_uuid;
    use tempfile::TempDir;

    fn office() -> Accessory {
        let mut accessory = Accessory::new("Office", accessory_uuid("2930012345"));
        accessory.service_or_insert(ServiceType::Battery, "Battery", None);
        accessory
    }

    #[test]
    fn test_register_get_unregister() {
        let cache = AccessoryCache::in_memory();
        let uuid = accessory_uuid("2930012345");
        let mut events = cache.subscribe();

        cache.register(office());
        assert!(cache.contains(uuid));
        assert_eq!(cache.get(uuid).unwrap().display_name, "Office");
        assert_eq!(cache.len(), 1);

        let removed = cache.unregister(uuid).unwrap();
        assert_eq!(removed.display_name, "Office");
        assert!(cache.is_empty());
        assert!(cache.unregister(uuid).is_none());

        assert!(matches!(
            events.try_recv().unwrap(),
            AccessoryEvent::Registered { .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            AccessoryEvent::Unregistered { .. }
        ));
    }

    #[test]
    fn test_restore_renames() {
        let cache = AccessoryCache::in_memory();
        let uuid = accessory_uuid("2930012345");
        cache.register(office());

        assert!(cache.restore(uuid, "Study"));
        assert_eq!(cache.get(uuid).unwrap().display_name, "Study");
        assert!(!cache.restore(accessory_uuid("unknown"), "Nope"));
    }

    #[test]
    fn test_update_publishes_changes_only() {
        let cache = AccessoryCache::in_memory();
        let uuid = accessory_uuid("2930012345");
        cache.register(office());
        let mut events = cache.subscribe();

        cache
            .update(uuid, |a| {
                a.service_or_insert(ServiceType::Battery, "Battery", None)
                    .set_value(CharacteristicType::BatteryLevel, 87i64);
            })
            .unwrap();

        match events.try_recv().unwrap() {
            AccessoryEvent::CharacteristicChanged(change) => {
                assert_eq!(change.service_type, ServiceType::Battery);
                assert_eq!(change.characteristic, CharacteristicType::BatteryLevel);
                assert_eq!(change.old_value, Some(CharacteristicValue::Int(0)));
                assert_eq!(change.new_value, CharacteristicValue::Int(87));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(events.try_recv().is_err());

        // Writing the same value again is silent
        cache
            .update(uuid, |a| {
                a.service_or_insert(ServiceType::Battery, "Battery", None)
                    .set_value(CharacteristicType::BatteryLevel, 87i64);
            })
            .unwrap();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_update_missing_accessory() {
        let cache = AccessoryCache::in_memory();
        assert!(cache.update(accessory_uuid("2930012345"), |_| ()).is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let uuid = accessory_uuid("2930012345");

        let cache = AccessoryCache::new(Storage::new(dir.path()));
        cache.register(office());
        cache.update(uuid, |a| {
            a.service_or_insert(ServiceType::Battery, "Battery", None)
                .set_value(CharacteristicType::BatteryLevel, 55i64);
        });
        cache.save().await.unwrap();
        assert!(dir.path().join(".storage").join(STORAGE_KEY).exists());

        let reloaded = AccessoryCache::new(Storage::new(dir.path()));
        assert_eq!(reloaded.load().await.unwrap(), 1);
        assert_eq!(reloaded.get(uuid), cache.get(uuid));
    }

    #[tokio::test]
    async fn test_in_memory_never_touches_disk() {
        let cache = AccessoryCache::in_memory();
        cache.register(office());
        cache.save().await.unwrap();
        assert_eq!(cache.load().await.unwrap(), 0);
    }
}
