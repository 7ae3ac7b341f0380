//! Periodic refresh of one device

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use at_api::SensorSource;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, instrument, warn};

use crate::handler::DeviceHandler;

/// Poll one device until shutdown is signalled
///
/// The first cycle runs immediately. A failed cycle is logged and the loop
/// carries on with the next tick.
pub(crate) async fn run_refresh_loop(
    handler: Arc<DeviceHandler>,
    source: Arc<dyn SensorSource>,
    running: Arc<AtomicBool>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(handler.config().refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    _ = refresh_cycle(&handler, source.as_ref()) => {}
                    _ = shutdown_rx.recv() => break,
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    debug!("[{}] Refresh loop stopped", handler.config().name);
}

/// Run a single fetch-and-update cycle, returning whether it succeeded
#[instrument(
    skip_all,
    fields(device = %handler.config().name, serial = %handler.serial_number())
)]
pub(crate) async fn refresh_cycle(handler: &DeviceHandler, source: &dyn SensorSource) -> bool {
    match handler.refresh(source).await {
        Ok(()) => {
            debug!("Sensor values updated");
            true
        }
        Err(err) => {
            error!("[{}] {}", handler.config().name, err);
            if err.is_rate_limited() {
                warn!(
                    "[{}] Rate limited by the Airthings API, increase refreshInterval to poll less often",
                    handler.config().name
                );
            }
            false
        }
    }
}
