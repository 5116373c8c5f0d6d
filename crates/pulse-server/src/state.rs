//! Shared application state.

use std::sync::Arc;

use parking_lot::RwLock;
use pulse_core::PulseConfig;
use pulse_forecast::ForecastStore;
use pulse_insights::{InsightService, TextGenerator};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use crate::map::MapAnnotator;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: PulseConfig,
    pub insights: InsightService,
    pub map: MapAnnotator,
    /// Served forecast snapshot, replaced wholesale on refresh.
    forecasts: RwLock<Arc<ForecastStore>>,
    /// Held from the start of a refresh until its store is served.
    refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Build state, loading the persisted forecast store if present.
    pub fn new(config: PulseConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let store = ForecastStore::load_or_empty(&config.data_paths.forecast_store);
        info!("Serving {} building forecasts", store.len());
        Self::with_store(config, generator, store)
    }

    pub fn with_store(
        config: PulseConfig,
        generator: Arc<dyn TextGenerator>,
        store: ForecastStore,
    ) -> Self {
        let map = MapAnnotator::new(config.data_paths.map_file.clone());
        Self {
            config,
            insights: InsightService::new(generator),
            map,
            forecasts: RwLock::new(Arc::new(store)),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current forecast snapshot.
    pub fn forecasts(&self) -> Arc<ForecastStore> {
        self.forecasts.read().clone()
    }

    /// Swap in a freshly built store.
    pub fn replace_forecasts(&self, store: ForecastStore) {
        *self.forecasts.write() = Arc::new(store);
    }

    /// Claim the refresh slot, or `None` if a refresh is running.
    ///
    /// The guard is owned so it can travel with the refresh work and
    /// outlive the request that started it.
    pub fn try_begin_refresh(&self) -> Option<OwnedMutexGuard<()>> {
        self.refresh_lock.clone().try_lock_owned().ok()
    }
}
