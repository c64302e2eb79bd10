//! Slash-command registry and dispatch.
//!
//! The host owns the actual command-line surface; it registers
//! [`ROOT_COMMAND`] and forwards whatever the user typed after it to
//! [`CommandDispatcher::dispatch`]. Commands carry a tiny grammar: no
//! argument, an on/off/toggle word, or a single integer.

use std::sync::{Arc, Mutex, Weak};

use crate::chat::ChatRelay;
use crate::config::ConfigStore;
use crate::player::PlayerManager;

/// Root command the host should register on its command-line surface.
pub const ROOT_COMMAND: &str = "/tune";

/// Argument grammar of a registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    None,
    Boolean,
    Int,
}

/// Tells a callback how to apply the payload it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResponse {
    None,
    Set,
    Toggle,
}

type CommandCallback = Arc<dyn Fn(bool, i32, CallbackResponse) + Send + Sync>;

struct CommandEntry {
    name: String,
    kind: ArgKind,
    aliases: Vec<String>,
    help: Option<String>,
    callback: CommandCallback,
}

/// Named command table matched in registration order.
pub struct CommandDispatcher {
    chat: Arc<ChatRelay>,
    entries: Mutex<Vec<CommandEntry>>,
}

impl CommandDispatcher {
    /// Builds the dispatcher with the `help` command already registered.
    /// `help` carries an empty alias, so a bare root command lands on it.
    pub fn new(chat: Arc<ChatRelay>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let dispatcher = Self {
                chat: chat.clone(),
                entries: Mutex::new(Vec::new()),
            };
            let weak = weak.clone();
            dispatcher.register(
                "help",
                ArgKind::None,
                &[""],
                Some("Show command help."),
                move |_, _, _| {
                    if let Some(dispatcher) = weak.upgrade() {
                        dispatcher
                            .chat
                            .print(&format!("Overtune Command Help:\n{}", dispatcher.help_text()));
                    }
                },
            );
            dispatcher
        })
    }

    /// Registers a command. Names and aliases are matched case-insensitively
    /// at dispatch; re-registering an existing name replaces that entry in
    /// place, keeping its position in the help listing.
    pub fn register(
        &self,
        name: &str,
        kind: ArgKind,
        aliases: &[&str],
        help: Option<&str>,
        callback: impl Fn(bool, i32, CallbackResponse) + Send + Sync + 'static,
    ) {
        let entry = CommandEntry {
            name: name.to_lowercase(),
            kind,
            aliases: aliases.iter().map(|alias| alias.to_lowercase()).collect(),
            help: help.map(str::to_string),
            callback: Arc::new(callback),
        };

        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Routes one raw argument string, e.g. `"volume 50"`.
    pub fn dispatch(&self, raw: &str) {
        let lowered = raw.to_lowercase();
        let mut tokens = lowered.split_whitespace();
        let command = tokens.next().unwrap_or("");
        let argument = tokens.next();

        // The callback may re-enter the registry (help does), so the table
        // lock is released before invoking it.
        let matched = {
            let entries = self.entries.lock().unwrap();
            entries
                .iter()
                .find(|entry| {
                    entry.name == command || entry.aliases.iter().any(|alias| alias == command)
                })
                .map(|entry| (entry.kind, entry.name.clone(), entry.callback.clone()))
        };

        let Some((kind, name, callback)) = matched else {
            self.chat.display_error(&format!(
                "That command wasn't found. For a list of commands please type: '{ROOT_COMMAND} help'"
            ));
            return;
        };

        match kind {
            ArgKind::None => callback(false, 0, CallbackResponse::None),
            ArgKind::Boolean => match argument {
                None | Some("toggle") => callback(false, 0, CallbackResponse::Toggle),
                Some("on") => callback(true, 0, CallbackResponse::Set),
                Some("off") => callback(false, 0, CallbackResponse::Set),
                // Anything else is dropped without feedback.
                Some(other) => {
                    tracing::debug!(command = %name, token = other, "Ignoring unknown boolean argument");
                }
            },
            ArgKind::Int => match argument {
                None => self.chat.display_error(&format!(
                    "You need to provide a number for the '{name}' command!"
                )),
                Some(token) => match token.parse::<i32>() {
                    Ok(value) => callback(false, value, CallbackResponse::Set),
                    Err(_) => {
                        tracing::debug!(command = %name, token, "Ignoring non-numeric argument");
                    }
                },
            },
        }
    }

    /// One line per command that carries help text, in registration order.
    pub fn help_text(&self) -> String {
        let entries = self.entries.lock().unwrap();
        let lines: Vec<String> = entries
            .iter()
            .filter_map(|entry| {
                let help = entry.help.as_ref()?;
                let mut label = entry.name.clone();
                for alias in entry.aliases.iter().filter(|alias| !alias.is_empty()) {
                    label.push('/');
                    label.push_str(alias);
                }
                Some(format!(
                    "{label} - {help} (ex: '{}{}')",
                    entry.name,
                    command_example(entry.kind)
                ))
            })
            .collect();
        lines.join("\n")
    }
}

fn command_example(kind: ArgKind) -> &'static str {
    match kind {
        ArgKind::None => "",
        ArgKind::Boolean => " on/off/toggle",
        ArgKind::Int => " 50",
    }
}

/// Registers the built-in player commands.
pub fn register_player_commands(
    dispatcher: &CommandDispatcher,
    players: &Arc<PlayerManager>,
    config: &Arc<ConfigStore>,
    chat: &Arc<ChatRelay>,
) {
    let cfg = config.clone();
    dispatcher.register(
        "config",
        ArgKind::Boolean,
        &["settings"],
        Some("Toggles config display."),
        move |value, _, response| {
            cfg.mutate(|doc| {
                let shown = match response {
                    CallbackResponse::Set => value,
                    CallbackResponse::Toggle => !doc.config_shown,
                    CallbackResponse::None => doc.config_shown,
                };
                doc.set_config_shown(shown);
            });
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "shuffle",
        ArgKind::Boolean,
        &[],
        Some("Toggle shuffle."),
        move |value, _, response| {
            let Some(provider) = p.current() else { return };
            let target = match response {
                CallbackResponse::Set => value,
                CallbackResponse::Toggle => !provider.snapshot().shuffle,
                CallbackResponse::None => return,
            };
            c.display_message(if target {
                "Turned on shuffle."
            } else {
                "Turned off shuffle."
            });
            provider.set_shuffle(target);
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "next",
        ArgKind::None,
        &["skip"],
        Some("Skip to the next track."),
        move |_, _, _| {
            let Some(provider) = p.current() else { return };
            c.display_message("Skipping to next track.");
            provider.skip(true);
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "back",
        ArgKind::None,
        &["previous"],
        Some("Go back a track."),
        move |_, _, _| {
            let Some(provider) = p.current() else { return };
            c.display_message("Going back a track.");
            provider.skip(false);
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "pause",
        ArgKind::None,
        &["stop"],
        Some("Pause playback."),
        move |_, _, _| {
            let Some(provider) = p.current() else { return };
            c.display_message("Paused playback.");
            provider.set_playing(false);
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "play",
        ArgKind::None,
        &[],
        Some("Continue playback."),
        move |_, _, _| {
            let Some(provider) = p.current() else { return };
            let snapshot = provider.snapshot();
            if snapshot.has_active_track() {
                c.display_song_title(&snapshot.track.title);
            }
            provider.set_playing(true);
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "volume",
        ArgKind::Int,
        &[],
        Some("Set playback volume."),
        move |_, value, _| {
            let Some(provider) = p.current() else {
                c.display_no_provider();
                return;
            };
            c.display_message(&format!("Set volume to: {value}"));
            provider.set_volume(value.clamp(0, 100) as u8);
        },
    );

    let p = players.clone();
    let c = chat.clone();
    dispatcher.register(
        "relogin",
        ArgKind::None,
        &["reauth"],
        Some("Re-opens the login window and lets you login again"),
        move |_, _, _| {
            let Some(provider) = p.current() else {
                c.display_no_provider();
                return;
            };
            provider.re_auth();
        },
    );

    let cfg = config.clone();
    dispatcher.register(
        "display",
        ArgKind::Boolean,
        &[],
        Some("Toggle player display."),
        move |value, _, response| {
            cfg.mutate(|doc| {
                let shown = match response {
                    CallbackResponse::Set => value,
                    CallbackResponse::Toggle => !doc.player.player_window_shown,
                    CallbackResponse::None => doc.player.player_window_shown,
                };
                doc.player.set_player_window_shown(shown);
            });
        },
    );
}
