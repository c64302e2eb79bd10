//! Settings: the dirty-tracked document and its owning store
//!
//! - `document`: the settings tree, per-group dirty flags, typed setters
//! - `store`: ownership, load/save through the host hook, debounced autosave

mod document;
mod store;

pub use document::{AutoPlaySettings, ConfigDocument, PlayerSettings, SpotifySettings, StoredToken};
pub use store::ConfigStore;
