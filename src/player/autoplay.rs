//! Automatic resume when the host enters an activity.

use std::sync::Arc;

use crate::config::ConfigStore;

use super::manager::PlayerManager;

/// Rising-edge watcher over the host's "in activity" signal.
///
/// When the signal flips from false to true while the auto-play setting is
/// on and the current provider is paused, playback is resumed once. Staying
/// in the activity, or pausing manually while inside it, does not trigger
/// again until the signal drops and rises anew.
pub struct AutoPlayWatcher {
    config: Arc<ConfigStore>,
    players: Arc<PlayerManager>,
    was_in_activity: bool,
}

impl AutoPlayWatcher {
    pub fn new(config: Arc<ConfigStore>, players: Arc<PlayerManager>) -> Self {
        Self {
            config,
            players,
            was_in_activity: false,
        }
    }

    /// Feed one sample of the host's activity signal, once per tick.
    pub fn observe(&mut self, in_activity: bool) {
        let Some(provider) = self.players.current() else {
            return;
        };

        if self.config.read().auto_play.play_in_activity
            && in_activity
            && !self.was_in_activity
            && !provider.snapshot().is_playing
        {
            tracing::debug!(provider = provider.key(), "Resuming playback on activity start");
            provider.set_playing(true);
        }

        self.was_in_activity = in_activity;
    }
}
