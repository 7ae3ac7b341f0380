//! Accessory, service and characteristic objects
//!
//! Services are addressed by their type plus an optional subtype, and
//! characteristics by their type. Lookup-or-create is idempotent: asking
//! twice for the same identifier returns the same object.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hap::{CharacteristicProps, CharacteristicType, ServiceType};
use crate::value::CharacteristicValue;

/// Namespace for accessory UUIDs derived from serial numbers
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6f3b_2d1c_9a4e_5b7f_8c21_d0e9_a4f6_b813);

/// Stable accessory UUID for a device serial number
pub fn accessory_uuid(serial_number: &str) -> Uuid {
    Uuid::new_v5(&ACCESSORY_NAMESPACE, serial_number.as_bytes())
}

/// A single value slot on a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub characteristic_type: CharacteristicType,
    value: CharacteristicValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
}

impl Characteristic {
    pub fn new(characteristic_type: CharacteristicType) -> Self {
        Self {
            characteristic_type,
            value: characteristic_type.props().default_value(),
            last_updated: None,
        }
    }

    pub fn props(&self) -> CharacteristicProps {
        self.characteristic_type.props()
    }

    pub fn value(&self) -> &CharacteristicValue {
        &self.value
    }

    /// When the value last changed
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Write a value, coerced to this characteristic's props
    ///
    /// Returns `true` if the stored value changed.
    pub fn set_value(&mut self, value: impl Into<CharacteristicValue>) -> bool {
        let value = self.props().coerce(value.into());
        if value == self.value {
            return false;
        }
        self.value = value;
        self.last_updated = Some(Utc::now());
        true
    }
}

/// A capability exposed by an accessory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub name: String,
    #[serde(default)]
    characteristics: Vec<Characteristic>,
}

impl Service {
    /// Create a service with its required characteristics
    pub fn new(service_type: ServiceType, name: impl Into<String>, subtype: Option<&str>) -> Self {
        Self {
            service_type,
            subtype: subtype.map(str::to_string),
            name: name.into(),
            characteristics: service_type
                .required_characteristics()
                .iter()
                .map(|ty| Characteristic::new(*ty))
                .collect(),
        }
    }

    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    pub fn characteristic(&self, ty: CharacteristicType) -> Option<&Characteristic> {
        self.characteristics
            .iter()
            .find(|c| c.characteristic_type == ty)
    }

    pub fn has_characteristic(&self, ty: CharacteristicType) -> bool {
        self.characteristic(ty).is_some()
    }

    /// Get a characteristic, adding it with its default value if missing
    pub fn characteristic_or_insert(&mut self, ty: CharacteristicType) -> &mut Characteristic {
        let index = match self
            .characteristics
            .iter()
            .position(|c| c.characteristic_type == ty)
        {
            Some(index) => index,
            None => {
                self.characteristics.push(Characteristic::new(ty));
                self.characteristics.len() - 1
            }
        };
        &mut self.characteristics[index]
    }

    /// Remove a characteristic, required ones excepted
    pub fn remove_characteristic(&mut self, ty: CharacteristicType) -> Option<Characteristic> {
        if self.service_type.required_characteristics().contains(&ty) {
            return None;
        }
        let index = self
            .characteristics
            .iter()
            .position(|c| c.characteristic_type == ty)?;
        Some(self.characteristics.remove(index))
    }

    pub fn value(&self, ty: CharacteristicType) -> Option<&CharacteristicValue> {
        self.characteristic(ty).map(Characteristic::value)
    }

    /// Write a value, adding the characteristic if needed
    ///
    /// Returns `true` if the stored value changed.
    pub fn set_value(&mut self, ty: CharacteristicType, value: impl Into<CharacteristicValue>) -> bool {
        self.characteristic_or_insert(ty).set_value(value)
    }

    fn matches(&self, service_type: ServiceType, subtype: Option<&str>) -> bool {
        self.service_type == service_type && self.subtype.as_deref() == subtype
    }
}

/// A bridged accessory representing one physical device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    pub uuid: Uuid,
    pub display_name: String,
    /// Free-form data kept with the cached accessory
    #[serde(default)]
    pub context: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    services: Vec<Service>,
}

impl Accessory {
    pub fn new(display_name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            uuid,
            display_name: display_name.into(),
            context: IndexMap::new(),
            services: Vec::new(),
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn services_mut(&mut self) -> impl Iterator<Item = &mut Service> {
        self.services.iter_mut()
    }

    pub fn service(&self, service_type: ServiceType, subtype: Option<&str>) -> Option<&Service> {
        self.services.iter().find(|s| s.matches(service_type, subtype))
    }

    pub fn service_mut(
        &mut self,
        service_type: ServiceType,
        subtype: Option<&str>,
    ) -> Option<&mut Service> {
        self.services
            .iter_mut()
            .find(|s| s.matches(service_type, subtype))
    }

    pub fn has_service(&self, service_type: ServiceType, subtype: Option<&str>) -> bool {
        self.service(service_type, subtype).is_some()
    }

    /// Get a service, adding it if missing
    ///
    /// `name` is only used when the service is created.
    pub fn service_or_insert(
        &mut self,
        service_type: ServiceType,
        name: &str,
        subtype: Option<&str>,
    ) -> &mut Service {
        let index = match self
            .services
            .iter()
            .position(|s| s.matches(service_type, subtype))
        {
            Some(index) => index,
            None => {
                self.services.push(Service::new(service_type, name, subtype));
                self.services.len() - 1
            }
        };
        &mut self.services[index]
    }

    pub fn remove_service(
        &mut self,
        service_type: ServiceType,
        subtype: Option<&str>,
    ) -> Option<Service> {
        let index = self
            .services
            .iter()
            .position(|s| s.matches(service_type, subtype))?;
        Some(self.services.remove(index))
    }

    /// Every characteristic value, keyed by where it lives
    pub(crate) fn snapshot(&self) -> Vec<(ServiceKey, CharacteristicType, CharacteristicValue)> {
        self.services
            .iter()
            .flat_map(|service| {
                let key = ServiceKey {
                    service_type: service.service_type,
                    subtype: service.subtype.clone(),
                };
                service
                    .characteristics
                    .iter()
                    .map(move |c| (key.clone(), c.characteristic_type, c.value.clone()))
            })
            .collect()
    }
}

/// Identifies a service within an accessory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceKey {
    pub service_type: ServiceType,
    pub subtype: Option<String>,
}
