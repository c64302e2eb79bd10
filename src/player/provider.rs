//! The playback provider capability.

use async_trait::async_trait;

use super::state::{PlaybackSnapshot, ProviderLifecycle};

/// One external playback service (Spotify, a local player, ...).
///
/// Providers own their remote session and background polling; consumers only
/// ever read the latest [`PlaybackSnapshot`] and issue fire-and-forget
/// transport calls. All methods take `&self` so providers can live behind
/// `Arc` and rely on interior mutability.
#[async_trait]
pub trait PlayerProvider: Send + Sync {
    /// Stable machine key, matched against the configured default provider.
    fn key(&self) -> &'static str;

    /// Human-readable service name for panels and log lines.
    fn display_name(&self) -> &'static str;

    /// Flips to true after the first `initialize` attempt finishes, whether
    /// or not it found credentials, and never resets afterwards.
    fn initialized(&self) -> bool;

    /// True only while `initialize` is running.
    fn initializing(&self) -> bool {
        false
    }

    /// The latest published snapshot.
    fn snapshot(&self) -> PlaybackSnapshot;

    /// One-shot setup: look for stored credentials, refresh them when
    /// present and start the service's own polling. Fails softly: on any
    /// failure the provider still ends up `initialized` with
    /// `requires_login` raised instead of returning an error.
    async fn initialize(&self);

    /// Per-host-tick bookkeeping hook. The service's real work happens on
    /// its own background tasks, so most providers leave this empty.
    fn update(&self) {}

    /// Begins the out-of-band login flow and raises `is_authenticating`.
    fn start_auth(&self);

    /// Restarts a pending login flow without touching any other state.
    fn retry_auth(&self);

    /// Drops `is_logged_in` and runs the login flow again. `initialized`
    /// stays true.
    fn re_auth(&self);

    // Transport controls. Each one is a no-op when the snapshot has no
    // active track, and success only ever shows up in a later snapshot.

    fn toggle_repeat(&self);

    fn set_playing(&self, playing: bool);

    fn skip(&self, forward: bool);

    fn set_shuffle(&self, shuffle: bool);

    fn set_volume(&self, volume: u8);

    /// Cancels background auth and poll work. Called on teardown, before
    /// the provider is dropped.
    fn dispose(&self);

    /// Lifecycle bucket derived from the flags above.
    fn lifecycle(&self) -> ProviderLifecycle {
        if self.initialized() {
            let snapshot = self.snapshot();
            if snapshot.is_logged_in || !snapshot.requires_login {
                ProviderLifecycle::Ready
            } else if snapshot.is_authenticating {
                ProviderLifecycle::AuthPending
            } else {
                ProviderLifecycle::NoCredentials
            }
        } else if self.initializing() {
            ProviderLifecycle::Initializing
        } else {
            ProviderLifecycle::Uninitialized
        }
    }
}
