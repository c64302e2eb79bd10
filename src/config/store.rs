//! Settings ownership, persistence, and the debounced autosave
//!
//! `ConfigStore` is the single owner of the `ConfigDocument`. Everything
//! else reads through [`ConfigStore::read`] and mutates through
//! [`ConfigStore::mutate`], which hands out the document's typed setters.
//! Mutation is expected from the host tick thread only; background tasks
//! that need to write (token storage after login) are the documented
//! exception and go through the same lock.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::events::{ConfigChanged, EventBus};
use crate::host::SettingsPersistence;

use super::document::ConfigDocument;

/// Minimum spacing between two autosaves. Coalesces mutation bursts (a
/// dragged slider) into a bounded save rate.
const SAVE_COOLDOWN: Duration = Duration::from_millis(10);

pub struct ConfigStore {
    document: RwLock<ConfigDocument>,
    persistence: Arc<dyn SettingsPersistence>,
    bus: Arc<EventBus>,
    next_save: Mutex<Option<Instant>>,
}

impl ConfigStore {
    /// Loads the persisted document through the host hook, falling back to
    /// defaults when nothing was stored yet or the stored shape no longer
    /// parses.
    pub fn load(persistence: Arc<dyn SettingsPersistence>, bus: Arc<EventBus>) -> Self {
        let document = match persistence.load_settings() {
            Ok(Some(value)) => match serde_json::from_value::<ConfigDocument>(value) {
                Ok(document) => {
                    tracing::debug!(version = document.version, "Loaded settings document");
                    document
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored settings unreadable, using defaults");
                    ConfigDocument::default()
                }
            },
            Ok(None) => {
                tracing::info!("No stored settings, using defaults");
                ConfigDocument::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using defaults");
                ConfigDocument::default()
            }
        };

        Self {
            document: RwLock::new(document),
            persistence,
            bus,
            next_save: Mutex::new(None),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ConfigDocument> {
        self.document.read().unwrap()
    }

    /// Runs `f` with mutable access to the document. Dirty flags flip inside
    /// the setters; the next [`ConfigStore::tick`] picks the change up.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut ConfigDocument) -> R) -> R {
        f(&mut self.document.write().unwrap())
    }

    pub fn is_dirty(&self) -> bool {
        self.document.read().unwrap().is_dirty()
    }

    /// Clears every dirty flag, then hands the document to the persistence
    /// hook. Flag clearing happens first so a mutation arriving during the
    /// write is kept dirty for the next save rather than lost.
    pub fn save(&self) -> Result<()> {
        let value = {
            let mut document = self.document.write().unwrap();
            document.mark_clean();
            serde_json::to_value(&*document)?
        };
        self.persistence.save_settings(&value)?;
        tracing::debug!("Settings saved");
        Ok(())
    }

    /// Host-tick hook: save and broadcast when the document is dirty and the
    /// cooldown window has passed. Called at frame rate; cheap when clean.
    pub fn tick(&self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&self, now: Instant) {
        if !self.is_dirty() {
            return;
        }
        {
            let next_save = self.next_save.lock().unwrap();
            if let Some(at) = *next_save {
                if now < at {
                    return;
                }
            }
        }

        if let Err(e) = self.save() {
            tracing::error!(error = %e, "Autosave failed");
        }
        // Subscribers mirror the in-memory document, which is current even
        // when the disk write failed.
        self.bus.publish(&ConfigChanged);
        *self.next_save.lock().unwrap() = Some(now + SAVE_COOLDOWN);
    }
}
