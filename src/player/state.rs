//! Playback state value types shared between providers and consumers.

/// Repeat mode as reported by the backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    Context,
    Track,
}

/// Metadata for the track a provider is currently on.
///
/// `id` is `None` when nothing is queued; transport commands check it before
/// hitting the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub id: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u32,
}

impl Default for TrackInfo {
    fn default() -> Self {
        Self {
            id: None,
            title: "No track playing".to_string(),
            artists: Vec::new(),
            album: String::new(),
            duration_ms: 0,
        }
    }
}

impl TrackInfo {
    /// Artist names joined for single-line display.
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// Everything a provider knows about playback at one instant.
///
/// Providers build a fresh value and swap it in whole; consumers clone the
/// latest one and never see a half-written state.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSnapshot {
    pub service_name: String,
    pub requires_login: bool,
    pub is_logged_in: bool,
    pub is_authenticating: bool,
    pub is_playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub progress_ms: u32,
    pub track: TrackInfo,
}

impl PlaybackSnapshot {
    /// Whether there is a track context to aim transport commands at.
    pub fn has_active_track(&self) -> bool {
        self.track.id.is_some()
    }
}

/// Coarse lifecycle bucket derived from a provider's flags, for panels that
/// pick between "connecting", "log in" and "player" views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderLifecycle {
    Uninitialized,
    Initializing,
    NoCredentials,
    AuthPending,
    Ready,
}
