//! Scriptable in-memory provider for registry and command tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use super::provider::PlayerProvider;
use super::state::{PlaybackSnapshot, TrackInfo};

/// One observed trait call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Initialize,
    StartAuth,
    RetryAuth,
    ReAuth,
    ToggleRepeat,
    SetPlaying(bool),
    Skip(bool),
    SetShuffle(bool),
    SetVolume(u8),
    Dispose,
}

pub struct FakeProvider {
    key: &'static str,
    fail_init: bool,
    stall_init: bool,
    initialized: AtomicBool,
    state: RwLock<PlaybackSnapshot>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeProvider {
    fn with_flags(key: &'static str, fail_init: bool, stall_init: bool) -> Arc<Self> {
        Arc::new(Self {
            key,
            fail_init,
            stall_init,
            initialized: AtomicBool::new(false),
            state: RwLock::new(PlaybackSnapshot {
                service_name: key.to_string(),
                requires_login: true,
                ..PlaybackSnapshot::default()
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn new(key: &'static str) -> Arc<Self> {
        Self::with_flags(key, false, false)
    }

    /// Initialization completes degraded: `requires_login` stays raised.
    pub fn failing(key: &'static str) -> Arc<Self> {
        Self::with_flags(key, true, false)
    }

    /// Initialization never completes, so the registry keeps retrying.
    pub fn stalled(key: &'static str) -> Arc<Self> {
        Self::with_flags(key, false, true)
    }

    /// Already initialized, logged in and playing a track.
    pub fn ready_with_track(key: &'static str) -> Arc<Self> {
        let provider = Self::new(key);
        provider.initialized.store(true, Ordering::SeqCst);
        provider.mutate_snapshot(|state| {
            state.is_logged_in = true;
            state.is_playing = true;
            state.progress_ms = 30_000;
            state.track = TrackInfo {
                id: Some("fake-track-1".to_string()),
                title: "Weight of the World".to_string(),
                artists: vec!["Keiichi Okabe".to_string()],
                album: "NieR: Automata OST".to_string(),
                duration_ms: 200_000,
            };
        });
        provider
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutate_snapshot(&self, mutate: impl FnOnce(&mut PlaybackSnapshot)) {
        let mut state = self.state.write().unwrap();
        mutate(&mut state);
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Records the call only when a track context exists, like a real
    /// provider's transport guard.
    fn record_transport(&self, call: FakeCall) {
        if self.snapshot().has_active_track() {
            self.record(call);
        }
    }
}

#[async_trait]
impl PlayerProvider for FakeProvider {
    fn key(&self) -> &'static str {
        self.key
    }

    fn display_name(&self) -> &'static str {
        "Fake"
    }

    fn initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.state.read().unwrap().clone()
    }

    async fn initialize(&self) {
        self.record(FakeCall::Initialize);
        if self.stall_init {
            return;
        }
        self.mutate_snapshot(|state| {
            if self.fail_init {
                state.requires_login = true;
                state.is_logged_in = false;
            } else {
                state.is_logged_in = true;
            }
        });
        self.initialized.store(true, Ordering::SeqCst);
    }

    fn start_auth(&self) {
        self.record(FakeCall::StartAuth);
        self.mutate_snapshot(|state| state.is_authenticating = true);
    }

    fn retry_auth(&self) {
        self.record(FakeCall::RetryAuth);
    }

    fn re_auth(&self) {
        self.record(FakeCall::ReAuth);
        self.mutate_snapshot(|state| {
            state.is_logged_in = false;
            state.is_authenticating = true;
        });
    }

    fn toggle_repeat(&self) {
        self.record_transport(FakeCall::ToggleRepeat);
    }

    fn set_playing(&self, playing: bool) {
        self.record_transport(FakeCall::SetPlaying(playing));
    }

    fn skip(&self, forward: bool) {
        self.record_transport(FakeCall::Skip(forward));
    }

    fn set_shuffle(&self, shuffle: bool) {
        self.record_transport(FakeCall::SetShuffle(shuffle));
    }

    fn set_volume(&self, volume: u8) {
        self.record_transport(FakeCall::SetVolume(volume));
    }

    fn dispose(&self) {
        self.record(FakeCall::Dispose);
    }
}
