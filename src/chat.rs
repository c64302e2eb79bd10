//! User-facing chat notifications.

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::host::ChatSink;

/// Routes user-facing lines to the host's chat sink.
///
/// Playback chatter and track announcements honor the
/// `display_chat_messages` setting; errors and explicitly requested output
/// are always delivered.
pub struct ChatRelay {
    config: Arc<ConfigStore>,
    sink: Arc<dyn ChatSink>,
}

impl ChatRelay {
    pub fn new(config: Arc<ConfigStore>, sink: Arc<dyn ChatSink>) -> Self {
        Self { config, sink }
    }

    /// Playback chatter. Dropped when chat messages are turned off.
    pub fn display_message(&self, message: &str) {
        if !self.config.read().display_chat_messages {
            return;
        }
        self.sink.notify(message);
    }

    /// Track-change announcement with the bare title; the sink owns the
    /// wording. Dropped when chat messages are turned off.
    pub fn display_song_title(&self, title: &str) {
        if !self.config.read().display_chat_messages {
            return;
        }
        self.sink.notify_track_changed(title);
    }

    /// Delivered regardless of the chat message setting.
    pub fn display_error(&self, message: &str) {
        self.sink.notify_error(message);
    }

    /// Delivered regardless of the chat message setting.
    pub fn print(&self, message: &str) {
        self.sink.notify(message);
    }

    pub fn display_no_provider(&self) {
        self.sink.notify(
            "You have no provider selected. Please configure one in Overtune's configuration.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::host::testing::{MemorySettings, RecordingChat};

    fn relay() -> (ChatRelay, Arc<RecordingChat>, Arc<ConfigStore>) {
        let config = Arc::new(ConfigStore::load(
            Arc::new(MemorySettings::default()),
            Arc::new(EventBus::new()),
        ));
        let sink = Arc::new(RecordingChat::default());
        (
            ChatRelay::new(config.clone(), sink.clone()),
            sink,
            config,
        )
    }

    #[test]
    fn messages_and_titles_respect_the_chat_setting() {
        let (relay, sink, config) = relay();

        relay.display_message("Paused playback.");
        relay.display_song_title("Ultima");
        assert_eq!(sink.messages.lock().unwrap().as_slice(), ["Paused playback."]);
        assert_eq!(sink.track_changes.lock().unwrap().as_slice(), ["Ultima"]);

        config.mutate(|doc| doc.set_display_chat_messages(false));
        relay.display_message("Skipping to next track.");
        relay.display_song_title("Answers");
        assert_eq!(sink.messages.lock().unwrap().len(), 1);
        assert_eq!(sink.track_changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn errors_and_prints_ignore_the_chat_setting() {
        let (relay, sink, config) = relay();
        config.mutate(|doc| doc.set_display_chat_messages(false));

        relay.display_error("That command wasn't found.");
        relay.print("Overtune Command Help:");
        relay.display_no_provider();

        assert_eq!(sink.errors.lock().unwrap().len(), 1);
        assert_eq!(sink.messages.lock().unwrap().len(), 2);
    }
}
