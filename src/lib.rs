//! Overtune - a now-playing overlay core for host applications
//!
//! This crate drives external music services (Spotify) from inside a host
//! application that supplies a per-frame tick, a settings persistence hook,
//! and a chat/notification sink. It is organized into modules by
//! responsibility:
//!
//! - `player`: provider capability, registry, snapshots, progress display
//! - `spotify`: the Spotify provider implementation
//! - `commands`: slash-command dispatch (`/tune ...`)
//! - `config`: dirty-tracked settings with debounced autosave
//! - `events`: in-process publish/subscribe
//! - `chat`: chat message routing and gating
//! - `host`: the traits a host implements to embed the crate
//! - `app`: the composition root hosts construct

pub mod app;
pub mod chat;
pub mod commands;
pub mod config;
pub mod events;
pub mod host;
pub mod logging;
pub mod player;
pub mod spotify;

pub use app::{App, HostHooks};
pub use chat::ChatRelay;
pub use commands::{ArgKind, CallbackResponse, CommandDispatcher, ROOT_COMMAND};
pub use config::{ConfigDocument, ConfigStore};
pub use events::{ConfigChanged, EventBus};
pub use host::{ChatSink, JsonFileSettings, SettingsPersistence};
pub use player::{
    AutoPlayWatcher, PlaybackSnapshot, PlayerManager, PlayerProvider, ProgressTracker,
    ProviderLifecycle, RepeatMode, TrackInfo,
};
pub use spotify::SpotifyProvider;
