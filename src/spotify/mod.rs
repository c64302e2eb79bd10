//! Spotify playback provider.
//!
//! Wraps the Web API behind the [`PlayerProvider`] capability: session
//! restore and login flows, a background playback poll, and fire-and-forget
//! transport calls aimed at the user's active device.

mod auth;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use rspotify::AuthCodeSpotify;
use rspotify::model::{CurrentPlaybackContext, PlayableItem, SubscriptionLevel};
use rspotify::prelude::*;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::chat::ChatRelay;
use crate::config::{ConfigStore, StoredToken};
use crate::player::{PlaybackSnapshot, PlayerProvider, RepeatMode, TrackInfo};

/// Poll cadence for the playback endpoint once a session exists.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How often the token maintenance loop looks at the expiry.
const TOKEN_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Refresh when less than this many seconds of token lifetime remain.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

pub struct SpotifyProvider {
    me: Weak<SpotifyProvider>,
    config: Arc<ConfigStore>,
    chat: Arc<ChatRelay>,
    state: RwLock<PlaybackSnapshot>,
    client: tokio::sync::RwLock<Option<AuthCodeSpotify>>,
    initialized: AtomicBool,
    initializing: AtomicBool,
    upkeep_started: AtomicBool,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    auth_task: Mutex<Option<JoinHandle<()>>>,
    last_track_id: Mutex<Option<String>>,
}

impl SpotifyProvider {
    pub fn new(config: Arc<ConfigStore>, chat: Arc<ChatRelay>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            config,
            chat,
            state: RwLock::new(PlaybackSnapshot {
                service_name: "Spotify".to_string(),
                requires_login: true,
                ..PlaybackSnapshot::default()
            }),
            client: tokio::sync::RwLock::new(None),
            initialized: AtomicBool::new(false),
            initializing: AtomicBool::new(false),
            upkeep_started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            auth_task: Mutex::new(None),
            last_track_id: Mutex::new(None),
        })
    }

    /// Clone-mutate-swap so readers never observe a half-updated snapshot.
    fn update_state(&self, mutate: impl FnOnce(&mut PlaybackSnapshot)) {
        let mut state = self.state.write().unwrap();
        let mut next = state.clone();
        mutate(&mut next);
        *state = next;
    }

    async fn restore_session(&self, stored: StoredToken) -> anyhow::Result<()> {
        let refreshed = auth::refresh_login(&stored.refresh_token).await?;
        self.config
            .mutate(|doc| doc.spotify.set_token(Some(refreshed.clone())));
        let client = auth::build_client(&refreshed).await?;
        self.finish_login(client).await
    }

    /// Shared tail of both login paths: verify the account, publish the
    /// client and make sure the playback poll is running.
    async fn finish_login(&self, client: AuthCodeSpotify) -> anyhow::Result<()> {
        let user = client.me().await?;
        tracing::info!(user_id = %user.id.id(), "Spotify session established");

        let premium = matches!(user.product, Some(SubscriptionLevel::Premium));
        self.apply_access_level(premium);

        *self.client.write().await = Some(client);
        self.update_state(|state| {
            state.is_logged_in = true;
            state.is_authenticating = false;
        });

        if !self.upkeep_started.swap(true, Ordering::SeqCst) {
            self.start_polling();
            self.start_token_maintenance();
        }
        Ok(())
    }

    /// Non-premium accounts cannot use the transport endpoints, so the
    /// player falls back to a display-only layout. Warned about once, not
    /// on every login.
    fn apply_access_level(&self, premium: bool) {
        if premium {
            self.config
                .mutate(|doc| doc.spotify.set_limited_access(false));
            return;
        }

        if !self.config.read().spotify.limited_access {
            self.chat.display_error(
                "Uh-oh, it looks like you're not premium on Spotify. Some features in Overtune have been disabled.",
            );
        }
        self.config.mutate(|doc| {
            doc.spotify.set_limited_access(true);
            doc.player.set_compact_player(false);
            doc.player.set_no_buttons(true);
        });
    }

    /// Replaces any pending login attempt with a fresh one. Only one
    /// browser flow may run at a time; they share the redirect listener.
    fn spawn_auth_flow(&self) {
        let Some(provider) = self.me.upgrade() else {
            return;
        };
        if let Some(previous) = self.auth_task.lock().unwrap().take() {
            previous.abort();
        }
        let handle = tokio::spawn(async move {
            provider.run_auth_flow().await;
        });
        *self.auth_task.lock().unwrap() = Some(handle);
    }

    async fn run_auth_flow(&self) {
        let result = async {
            let token = auth::browser_login().await?;
            self.config
                .mutate(|doc| doc.spotify.set_token(Some(token.clone())));
            let client = auth::build_client(&token).await?;
            self.finish_login(client).await
        }
        .await;

        // On failure `is_authenticating` stays raised; retry_auth is the
        // recovery path.
        if let Err(e) = result {
            tracing::error!(error = %e, "Spotify authentication failed");
        }
    }

    fn start_polling(&self) {
        let Some(provider) = self.me.upgrade() else {
            return;
        };
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => provider.poll_playback().await,
                }
            }
        });
        self.tasks.lock().unwrap().push(handle);
    }

    fn start_token_maintenance(&self) {
        let Some(provider) = self.me.upgrade() else {
            return;
        };
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TOKEN_CHECK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => provider.maintain_token().await,
                }
            }
        });
        self.tasks.lock().unwrap().push(handle);
    }

    /// Refreshes the access token ahead of its expiry so the poll and
    /// transport calls never see a 401 mid-session.
    async fn maintain_token(&self) {
        let stored = self.config.read().spotify.token.clone();
        let Some(stored) = stored else { return };
        let Some(expires_at) = stored.expires_at else {
            return;
        };
        let remaining = expires_at - chrono::Utc::now();
        if remaining.num_seconds() >= TOKEN_REFRESH_MARGIN_SECS {
            return;
        }

        tracing::info!("Spotify token expiring soon, refreshing");
        match auth::refresh_login(&stored.refresh_token).await {
            Ok(refreshed) => {
                self.config
                    .mutate(|doc| doc.spotify.set_token(Some(refreshed.clone())));
                match auth::build_client(&refreshed).await {
                    Ok(client) => *self.client.write().await = Some(client),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not rebuild Spotify client after refresh");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Spotify token refresh failed");
            }
        }
    }

    async fn poll_playback(&self) {
        let client = self.client.read().await.clone();
        let Some(client) = client else { return };

        match client.current_playback(None, None::<Vec<_>>).await {
            Ok(Some(playback)) => self.apply_playback(&playback),
            Ok(None) => {
                tracing::trace!("No playback context on any device");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Spotify playback poll failed");
            }
        }
    }

    fn apply_playback(&self, playback: &CurrentPlaybackContext) {
        let track = match &playback.item {
            Some(PlayableItem::Track(track)) => TrackInfo {
                id: track.id.as_ref().map(|id| id.id().to_string()),
                title: track.name.clone(),
                artists: track.artists.iter().map(|a| a.name.clone()).collect(),
                album: track.album.name.clone(),
                duration_ms: track.duration.num_milliseconds() as u32,
            },
            Some(PlayableItem::Episode(episode)) => TrackInfo {
                id: Some(episode.id.id().to_string()),
                title: episode.name.clone(),
                artists: vec![episode.show.name.clone()],
                album: "Podcast".to_string(),
                duration_ms: episode.duration.num_milliseconds() as u32,
            },
            _ => TrackInfo::default(),
        };

        if track.id.is_some() {
            let mut last = self.last_track_id.lock().unwrap();
            if *last != track.id {
                *last = track.id.clone();
                drop(last);
                self.chat.display_song_title(&track.title);
            }
        }

        let repeat = match playback.repeat_state {
            rspotify::model::RepeatState::Off => RepeatMode::Off,
            rspotify::model::RepeatState::Context => RepeatMode::Context,
            rspotify::model::RepeatState::Track => RepeatMode::Track,
        };
        let progress_ms = playback
            .progress
            .map(|d| d.num_milliseconds() as u32)
            .unwrap_or(0);
        let is_playing = playback.is_playing;
        let shuffle = playback.shuffle_state;

        self.update_state(|state| {
            state.is_playing = is_playing;
            state.shuffle = shuffle;
            state.repeat = repeat;
            state.progress_ms = progress_ms;
            state.track = track;
        });
    }

    /// Spawns one remote transport call against the active device. Errors
    /// are logged and otherwise swallowed; the next snapshot is the source
    /// of truth either way.
    fn spawn_transport<F, Fut>(&self, operation: F)
    where
        F: FnOnce(AuthCodeSpotify, Option<String>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), rspotify::ClientError>> + Send,
    {
        let Some(provider) = self.me.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let client = provider.client.read().await.clone();
            let Some(client) = client else { return };
            let device_id = active_device_id(&client).await;
            if let Err(e) = operation(client, device_id).await {
                tracing::warn!(error = %e, "Spotify transport call failed");
            }
        });
    }
}

async fn active_device_id(client: &AuthCodeSpotify) -> Option<String> {
    match client.device().await {
        Ok(devices) => devices.into_iter().find(|d| d.is_active).and_then(|d| d.id),
        Err(e) => {
            tracing::debug!(error = %e, "Could not list playback devices");
            None
        }
    }
}

#[async_trait]
impl PlayerProvider for SpotifyProvider {
    fn key(&self) -> &'static str {
        "spotify"
    }

    fn display_name(&self) -> &'static str {
        "Spotify"
    }

    fn initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn initializing(&self) -> bool {
        self.initializing.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.state.read().unwrap().clone()
    }

    async fn initialize(&self) {
        if self.initialized.load(Ordering::SeqCst) {
            return;
        }
        self.initializing.store(true, Ordering::SeqCst);

        let stored = self.config.read().spotify.token.clone();
        match stored {
            None => {
                tracing::info!("No stored Spotify session, waiting for login");
            }
            Some(token) => {
                if let Err(e) = self.restore_session(token).await {
                    tracing::warn!(error = %e, "Stored Spotify session could not be restored");
                    self.update_state(|state| {
                        state.requires_login = true;
                        state.is_logged_in = false;
                    });
                }
            }
        }

        self.initializing.store(false, Ordering::SeqCst);
        self.initialized.store(true, Ordering::SeqCst);
    }

    fn start_auth(&self) {
        self.update_state(|state| state.is_authenticating = true);
        self.spawn_auth_flow();
    }

    fn retry_auth(&self) {
        tracing::info!("Retrying Spotify login");
        self.spawn_auth_flow();
    }

    fn re_auth(&self) {
        self.update_state(|state| state.is_logged_in = false);
        self.start_auth();
    }

    fn toggle_repeat(&self) {
        let snapshot = self.snapshot();
        if !snapshot.has_active_track() {
            return;
        }
        let next = match snapshot.repeat {
            RepeatMode::Off => rspotify::model::RepeatState::Context,
            RepeatMode::Context => rspotify::model::RepeatState::Track,
            RepeatMode::Track => rspotify::model::RepeatState::Off,
        };
        self.spawn_transport(move |client, device_id| async move {
            client.repeat(next, device_id.as_deref()).await
        });
    }

    fn set_playing(&self, playing: bool) {
        if !self.snapshot().has_active_track() {
            return;
        }
        self.spawn_transport(move |client, device_id| async move {
            if playing {
                client.resume_playback(device_id.as_deref(), None).await
            } else {
                client.pause_playback(device_id.as_deref()).await
            }
        });
    }

    fn skip(&self, forward: bool) {
        if !self.snapshot().has_active_track() {
            return;
        }
        self.spawn_transport(move |client, device_id| async move {
            if forward {
                client.next_track(device_id.as_deref()).await
            } else {
                client.previous_track(device_id.as_deref()).await
            }
        });
    }

    fn set_shuffle(&self, shuffle: bool) {
        if !self.snapshot().has_active_track() {
            return;
        }
        self.spawn_transport(move |client, device_id| async move {
            client.shuffle(shuffle, device_id.as_deref()).await
        });
    }

    fn set_volume(&self, volume: u8) {
        if !self.snapshot().has_active_track() {
            return;
        }
        let volume = volume.min(100);
        self.spawn_transport(move |client, device_id| async move {
            client.volume(volume, device_id.as_deref()).await
        });
    }

    fn dispose(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.auth_task.lock().unwrap().take() {
            handle.abort();
        }
        for handle in self.tasks.lock().unwrap().drain(..) {
            handle.abort();
        }
    }
}
