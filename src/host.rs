//! Host integration boundary
//!
//! The crate is embedded, not standalone: the host owns the render loop, the
//! settings storage, and the chat surface. These traits are what a host
//! implements to plug those in. `JsonFileSettings` is a ready-made
//! persistence hook for hosts that just want a file on disk.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;

/// Storage for the settings document. The document is opaque JSON from the
/// host's point of view; the core owns its shape.
pub trait SettingsPersistence: Send + Sync {
    /// Returns the previously saved document, or `None` on first run.
    fn load_settings(&self) -> Result<Option<Value>>;

    fn save_settings(&self, document: &Value) -> Result<()>;
}

/// Where user-facing lines end up (a chat log, a toast area, stderr).
/// Formatting and localization are the sink's business; the core hands over
/// plain text.
pub trait ChatSink: Send + Sync {
    fn notify(&self, message: &str);

    fn notify_error(&self, message: &str);

    /// Called when the playing track changes; `title` is the bare track name.
    fn notify_track_changed(&self, title: &str);
}

/// File-backed settings persistence using pretty-printed JSON.
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsPersistence for JsonFileSettings {
    fn load_settings(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save_settings(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(document)?)?;
        Ok(())
    }
}
