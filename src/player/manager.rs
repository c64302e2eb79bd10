//! Provider registry and the background initializer loop.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigStore;

use super::provider::PlayerProvider;

/// Cadence of the background initializer loop.
const INIT_INTERVAL: Duration = Duration::from_secs(1);

/// Owns the provider set and the "current" selection.
///
/// Initialization is admission-controlled: a background loop wakes once a
/// second and initializes at most one provider per tick, in registration
/// order, so auth flows never race each other for the login surface.
pub struct PlayerManager {
    providers: Vec<Arc<dyn PlayerProvider>>,
    current: RwLock<Option<Arc<dyn PlayerProvider>>>,
    config: Arc<ConfigStore>,
    cancel: CancellationToken,
    init_task: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerManager {
    pub fn new(providers: Vec<Arc<dyn PlayerProvider>>, config: Arc<ConfigStore>) -> Self {
        let manager = Self {
            providers,
            current: RwLock::new(None),
            config,
            cancel: CancellationToken::new(),
            init_task: Mutex::new(None),
        };
        manager.select_default();
        manager
    }

    /// Picks the provider whose key matches the configured default, if any.
    pub fn select_default(&self) {
        let default_key = self.config.read().player.default_provider.clone();
        if let Some(provider) = self.providers.iter().find(|p| p.key() == default_key) {
            tracing::info!(provider = provider.key(), "Selected default provider");
            *self.current.write().unwrap() = Some(provider.clone());
        }
    }

    /// Spawns the initializer loop. Runs until [`PlayerManager::dispose`].
    pub fn start(self: &Arc<Self>) {
        let manager = self.clone();
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(INIT_INTERVAL);
            // A slow initialize should push the next tick out, not pile
            // catch-up ticks behind it.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let next = manager
                            .providers
                            .iter()
                            .find(|p| !p.initialized())
                            .cloned();
                        if let Some(provider) = next {
                            tracing::debug!(provider = provider.key(), "Initializing provider");
                            provider.initialize().await;
                        }
                    }
                }
            }
        });
        *self.init_task.lock().unwrap() = Some(handle);
    }

    /// True while any provider has not finished its first initialization.
    pub fn providers_loading(&self) -> bool {
        self.providers.iter().any(|p| !p.initialized())
    }

    pub fn providers(&self) -> &[Arc<dyn PlayerProvider>] {
        &self.providers
    }

    pub fn current(&self) -> Option<Arc<dyn PlayerProvider>> {
        self.current.read().unwrap().clone()
    }

    /// Makes the provider with `key` current. Returns false when no
    /// registered provider carries that key.
    pub fn select(&self, key: &str) -> bool {
        match self.providers.iter().find(|p| p.key() == key) {
            Some(provider) => {
                *self.current.write().unwrap() = Some(provider.clone());
                true
            }
            None => false,
        }
    }

    /// Host-tick sweep over every provider's `update` hook.
    pub fn update_all(&self) {
        for provider in &self.providers {
            provider.update();
        }
    }

    /// Stops the initializer loop and disposes every provider.
    pub fn dispose(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.init_task.lock().unwrap().take() {
            handle.abort();
        }
        for provider in &self.providers {
            provider.dispose();
        }
    }
}
