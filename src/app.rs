//! The composition root a host embeds.

use std::sync::{Arc, Mutex};

use crate::chat::ChatRelay;
use crate::commands::{CommandDispatcher, register_player_commands};
use crate::config::ConfigStore;
use crate::events::{ConfigChanged, EventBus};
use crate::host::{ChatSink, SettingsPersistence};
use crate::player::{AutoPlayWatcher, PlayerManager, PlayerProvider};
use crate::spotify::SpotifyProvider;

/// Owner name for the app's own bus subscriptions.
const BUS_OWNER: &str = "overtune-app";

/// The two host-supplied halves of the integration: where settings live
/// and where user-facing lines go.
pub struct HostHooks {
    pub persistence: Arc<dyn SettingsPersistence>,
    pub chat: Arc<dyn ChatSink>,
}

/// Wires the player core together and exposes the entry points a host
/// drives: the per-frame tick, the root command, and shutdown.
pub struct App {
    bus: Arc<EventBus>,
    config: Arc<ConfigStore>,
    commands: Arc<CommandDispatcher>,
    players: Arc<PlayerManager>,
    autoplay: Mutex<AutoPlayWatcher>,
}

impl App {
    /// Builds the component graph and starts the provider initializer
    /// loop. Must be called from within a tokio runtime.
    pub fn new(hooks: HostHooks) -> Self {
        let bus = Arc::new(EventBus::new());
        let config = Arc::new(ConfigStore::load(hooks.persistence, bus.clone()));
        let chat = Arc::new(ChatRelay::new(config.clone(), hooks.chat));

        let providers: Vec<Arc<dyn PlayerProvider>> =
            vec![SpotifyProvider::new(config.clone(), chat.clone())];
        let players = Arc::new(PlayerManager::new(providers, config.clone()));
        players.start();

        let commands = CommandDispatcher::new(chat.clone());
        register_player_commands(&commands, &players, &config, &chat);

        // Picks up a default-provider key written while nothing was
        // selected yet (the first-run welcome flow). A manual selection is
        // never overridden.
        {
            let players = players.clone();
            bus.subscribe::<ConfigChanged>(BUS_OWNER, move |_| {
                if players.current().is_none() {
                    players.select_default();
                }
            });
        }

        let autoplay = Mutex::new(AutoPlayWatcher::new(config.clone(), players.clone()));

        Self {
            bus,
            config,
            commands,
            players,
            autoplay,
        }
    }

    /// Per-frame host tick: flushes pending settings saves and runs every
    /// provider's update hook. Cheap when nothing changed.
    pub fn on_frame(&self) {
        self.config.tick();
        self.players.update_all();
    }

    /// [`App::on_frame`] plus the host's activity flag, driving auto-play
    /// on the activity rising edge.
    pub fn on_frame_with_activity(&self, in_activity: bool) {
        self.on_frame();
        self.autoplay.lock().unwrap().observe(in_activity);
    }

    /// Root-command surface; `raw` is everything after the command name.
    pub fn handle_command(&self, raw: &str) {
        self.commands.dispatch(raw);
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn players(&self) -> &Arc<PlayerManager> {
        &self.players
    }

    pub fn commands(&self) -> &Arc<CommandDispatcher> {
        &self.commands
    }

    /// Stops background work, drops the app's bus handlers and flushes any
    /// unsaved settings.
    pub fn shutdown(&self) {
        self.players.dispose();
        self.bus.unsubscribe(BUS_OWNER);
        if self.config.is_dirty() {
            if let Err(e) = self.config.save() {
                tracing::error!(error = %e, "Final settings save failed");
            }
        }
    }
}
