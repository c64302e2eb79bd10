//! Playback providers, their registry and per-frame display helpers.

mod autoplay;
mod manager;
mod progress;
mod provider;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use autoplay::AutoPlayWatcher;
pub use manager::PlayerManager;
pub use progress::ProgressTracker;
pub use provider::PlayerProvider;
pub use state::{PlaybackSnapshot, ProviderLifecycle, RepeatMode, TrackInfo};
