//! The Airthings platform
//!
//! Owns the accessory cache, the shared sensor source and one
//! [`DeviceHandler`] per configured device. Discovery reconciles the cache
//! with the configuration, then [`Platform::start`] spawns one refresh loop
//! per device.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use at_accessory::{accessory_uuid, Accessory, AccessoryCache, Storage};
use at_api::{AirthingsClient, Endpoints, SensorSource};
use at_config::PlatformConfig;
use futures::future::join_all;
use indexmap::IndexMap;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::PlatformResult;
use crate::handler::DeviceHandler;
use crate::refresh::run_refresh_loop;

pub struct Platform {
    config: PlatformConfig,
    cache: Arc<AccessoryCache>,
    source: Arc<dyn SensorSource>,
    /// Handlers keyed by serial number, in configuration order
    handlers: IndexMap<String, Arc<DeviceHandler>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Platform {
    pub fn new(
        config: PlatformConfig,
        cache: Arc<AccessoryCache>,
        source: Arc<dyn SensorSource>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            cache,
            source,
            handlers: IndexMap::new(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Build the API client and a persistent cache from the configuration
    ///
    /// The cache lives under `storagePath`, or `config_dir` if unset.
    pub fn from_config(config: PlatformConfig, config_dir: &Path) -> PlatformResult<Self> {
        let endpoints = Endpoints::new(config.api_base_url.as_deref(), config.token_url.as_deref());
        let client = AirthingsClient::with_endpoints(
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
            endpoints,
        )?;

        let storage_dir = config.storage_path.as_deref().unwrap_or(config_dir);
        let cache = AccessoryCache::new(Storage::new(storage_dir));

        Ok(Self::new(config, Arc::new(cache), Arc::new(client)))
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AccessoryCache> {
        &self.cache
    }

    pub fn handler(&self, serial_number: &str) -> Option<&Arc<DeviceHandler>> {
        self.handlers.get(serial_number)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Arc<DeviceHandler>> {
        self.handlers.values()
    }

    /// Load cached accessories from disk
    pub async fn load_cache(&self) -> PlatformResult<usize> {
        let count = self.cache.load().await?;
        debug!("Loaded {} cached accessories", count);
        Ok(count)
    }

    pub async fn save_cache(&self) -> PlatformResult<()> {
        self.cache.save().await?;
        Ok(())
    }

    /// Reconcile cached accessories with the configured devices
    ///
    /// Cached accessories are restored, new ones registered and cached
    /// accessories with no configured device removed.
    pub fn discover_devices(&mut self) -> PlatformResult<()> {
        let name = self.config.name.clone();
        let mut configured = HashSet::new();

        for device in &self.config.devices {
            let uuid = accessory_uuid(&device.serial_number);
            configured.insert(uuid);

            if self.cache.restore(uuid, &device.name) {
                info!(
                    "[{}] Restoring existing accessory from cache with serial {}",
                    name, device.serial_number
                );
            } else {
                info!(
                    "[{}] Adding new accessory with serial {}",
                    name, device.serial_number
                );
                self.cache.register(Accessory::new(device.name.clone(), uuid));
            }

            let handler = DeviceHandler::new(
                device.clone(),
                uuid,
                self.config.banding,
                self.config.voc_conversion,
                self.cache.clone(),
            );
            handler.configure()?;
            handler.log_settings();
            self.handlers
                .insert(device.serial_number.clone(), Arc::new(handler));
        }

        for uuid in self.cache.uuids() {
            if configured.contains(&uuid) {
                continue;
            }
            if let Some(accessory) = self.cache.unregister(uuid) {
                info!(
                    "[{}] Removing orphaned accessory from cache: {}",
                    name, accessory.display_name
                );
            }
        }

        Ok(())
    }

    /// Spawn one refresh loop per device
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Platform already running");
            return;
        }

        info!(
            "[{}] Starting refresh for {} device(s)",
            self.config.name,
            self.handlers.len()
        );

        let mut tasks = self.tasks.lock().await;
        for handler in self.handlers.values() {
            tasks.push(tokio::spawn(run_refresh_loop(
                handler.clone(),
                self.source.clone(),
                self.running.clone(),
                self.shutdown_tx.subscribe(),
            )));
        }
    }

    /// Stop every refresh loop and wait for them to finish
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("[{}] Stopping refresh", self.config.name);
        let _ = self.shutdown_tx.send(());

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for result in join_all(tasks).await {
            if let Err(err) = result {
                warn!("Refresh task ended abnormally: {}", err);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
