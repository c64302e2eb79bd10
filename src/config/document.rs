//! The settings document and its dirty-tracked groups
//!
//! Every group tracks its own dirty flag; the document is dirty when any
//! group or document-level field changed since the last save. Mutation goes
//! through the generated setters, which compare first so writing an equal
//! value never dirties anything. Dirty flags are runtime-only and never
//! serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generates a `set_<field>` per entry that flips the struct's dirty flag
/// when the value actually changes.
macro_rules! dirty_setters {
    ($target:ident { $($setter:ident => $field:ident: $ty:ty),+ $(,)? }) => {
        impl $target {
            $(
                pub fn $setter(&mut self, value: $ty) {
                    if self.$field != value {
                        self.$field = value;
                        self.dirty = true;
                    }
                }
            )+

            pub fn is_dirty(&self) -> bool {
                self.dirty
            }

            pub(crate) fn mark_clean(&mut self) {
                self.dirty = false;
            }
        }
    };
}

/// Display and behavior settings for the player panel.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub accent_color: [f32; 4],
    pub transparency: f32,
    pub player_window_shown: bool,
    pub compact_player: bool,
    pub no_buttons: bool,
    pub player_locked: bool,
    pub disable_input: bool,
    pub show_time_elapsed: bool,
    pub only_open_when_logged_in: bool,
    pub first_run_complete: bool,
    pub debug_window_open: bool,
    /// Key of the provider selected at startup (e.g. "spotify").
    pub default_provider: String,
    #[serde(skip)]
    dirty: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            accent_color: [0.08, 0.72, 0.33, 1.0],
            transparency: 1.0,
            player_window_shown: true,
            compact_player: false,
            no_buttons: false,
            player_locked: false,
            disable_input: false,
            show_time_elapsed: false,
            only_open_when_logged_in: true,
            first_run_complete: false,
            debug_window_open: false,
            default_provider: String::new(),
            dirty: false,
        }
    }
}

dirty_setters!(PlayerSettings {
    set_accent_color => accent_color: [f32; 4],
    set_transparency => transparency: f32,
    set_player_window_shown => player_window_shown: bool,
    set_compact_player => compact_player: bool,
    set_no_buttons => no_buttons: bool,
    set_player_locked => player_locked: bool,
    set_disable_input => disable_input: bool,
    set_show_time_elapsed => show_time_elapsed: bool,
    set_only_open_when_logged_in => only_open_when_logged_in: bool,
    set_first_run_complete => first_run_complete: bool,
    set_debug_window_open => debug_window_open: bool,
    set_default_provider => default_provider: String,
});

/// Credential blob for the Spotify session. The core only ever checks for
/// presence; the fields themselves are consumed by the Spotify provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifySettings {
    pub token: Option<StoredToken>,
    /// Set when the logged-in account is not Premium; transport controls
    /// are rejected server-side for such accounts.
    pub limited_access: bool,
    #[serde(skip)]
    dirty: bool,
}

dirty_setters!(SpotifySettings {
    set_token => token: Option<StoredToken>,
    set_limited_access => limited_access: bool,
});

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPlaySettings {
    /// Resume playback automatically when the host reports entering an
    /// activity (see `player::AutoPlayWatcher`).
    pub play_in_activity: bool,
    #[serde(skip)]
    dirty: bool,
}

dirty_setters!(AutoPlaySettings {
    set_play_in_activity => play_in_activity: bool,
});

/// The whole persisted settings tree plus runtime-only flags.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    pub version: u32,
    pub display_chat_messages: bool,
    pub player: PlayerSettings,
    pub spotify: SpotifySettings,
    pub auto_play: AutoPlaySettings,
    /// Whether the settings panel is open. Never persisted, but flipping it
    /// still dirties the document so the change broadcast fires.
    #[serde(skip)]
    pub config_shown: bool,
    #[serde(skip)]
    dirty: bool,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            version: 1,
            display_chat_messages: true,
            player: PlayerSettings::default(),
            spotify: SpotifySettings::default(),
            auto_play: AutoPlaySettings::default(),
            config_shown: false,
            dirty: false,
        }
    }
}

impl ConfigDocument {
    pub fn set_display_chat_messages(&mut self, value: bool) {
        if self.display_chat_messages != value {
            self.display_chat_messages = value;
            self.dirty = true;
        }
    }

    pub fn set_config_shown(&mut self, value: bool) {
        if self.config_shown != value {
            self.config_shown = value;
            self.dirty = true;
        }
    }

    /// True when any group or document-level field changed since the last
    /// save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
            || self.player.is_dirty()
            || self.spotify.is_dirty()
            || self.auto_play.is_dirty()
    }

    /// Clears the document flag and every group flag. After this returns no
    /// part of the tree reports dirty.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
        self.player.mark_clean();
        self.spotify.mark_clean();
        self.auto_play.mark_clean();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_mutation_dirties_group_and_document() {
        let mut document = ConfigDocument::default();
        assert!(!document.is_dirty());

        document.player.set_transparency(0.5);

        assert!(document.player.is_dirty());
        assert!(document.is_dirty());
        assert!(!document.spotify.is_dirty());
    }

    #[test]
    fn setting_equal_value_stays_clean() {
        let mut document = ConfigDocument::default();
        document.player.set_transparency(1.0);
        document.auto_play.set_play_in_activity(false);
        document.set_display_chat_messages(true);
        assert!(!document.is_dirty());
    }

    #[test]
    fn mark_clean_clears_every_flag() {
        let mut document = ConfigDocument::default();
        document.player.set_compact_player(true);
        document.spotify.set_limited_access(true);
        document.auto_play.set_play_in_activity(true);
        document.set_config_shown(true);
        assert!(document.is_dirty());

        document.mark_clean();

        assert!(!document.is_dirty());
        assert!(!document.player.is_dirty());
        assert!(!document.spotify.is_dirty());
        assert!(!document.auto_play.is_dirty());
    }

    #[test]
    fn document_level_fields_dirty_the_document_directly() {
        let mut document = ConfigDocument::default();
        document.set_display_chat_messages(false);
        assert!(document.is_dirty());
        assert!(!document.player.is_dirty());
    }

    #[test]
    fn runtime_flags_are_not_serialized() {
        let mut document = ConfigDocument::default();
        document.set_config_shown(true);
        document.player.set_no_buttons(true);

        let value = serde_json::to_value(&document).expect("serialize");
        assert!(value.get("config_shown").is_none());
        assert!(value["player"].get("dirty").is_none());

        let reloaded: ConfigDocument = serde_json::from_value(value).expect("deserialize");
        assert!(!reloaded.config_shown);
        assert!(!reloaded.is_dirty());
        assert!(reloaded.player.no_buttons);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let value = serde_json::json!({ "player": { "compact_player": true } });
        let document: ConfigDocument = serde_json::from_value(value).expect("deserialize");
        assert!(document.player.compact_player);
        assert_eq!(document.player.transparency, 1.0);
        assert!(document.display_chat_messages);
        assert!(document.player.only_open_when_logged_in);
    }
}
