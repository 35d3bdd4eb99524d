//! The window's two local streams: UI events in on stdin, chrome commands
//! out on stdout.
//!
//! The embedding chrome renders from the replica and sends user
//! interactions as JSON lines. Ordinary interactions arrive as `dispatch`
//! events carrying an action verbatim; resize gestures arrive as `resize`
//! events because they need layout coordination before anything is
//! dispatched. Outbound, `render` tells the chrome to repaint from the
//! attached state and `set_size` forces the OS window to a corrected size.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dexwatch_core::counts::{self, StateCount};
use dexwatch_core::layout::{self, LayoutResponse, ResizeGesture};
use dexwatch_core::{catalog, profiles, ActionEnvelope, Dispatcher};
use dexwatch_protocol::{Action, RootState, WindowKind};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// An ordinary interaction; the chrome sends the action as-is.
    Dispatch { action: Action },
    /// A native resize gesture, pre-coordination.
    Resize { width: u32, height: u32 },
}

/// A tracker cell with its sprite resolved against the active profile's
/// sprite set, so the chrome paints without knowing catalog rules.
#[derive(Debug, Serialize)]
pub struct SpriteCell {
    pub id: u32,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ChromeCommand<'a> {
    SetSize {
        width: u32,
        height: u32,
    },
    Render {
        window: &'static str,
        state: &'a RootState,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        counts: Vec<StateCount>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        sprites: Vec<SpriteCell>,
    },
}

pub fn emit_render(kind: WindowKind, state: &RootState) {
    emit(&render_command(kind, state));
}

/// Builds the render payload for one window kind: the counter window gets
/// its visible counts, the tracker gets sprite URLs resolved against the
/// active profile's sprite set, and the settings editor just gets state.
fn render_command(kind: WindowKind, state: &RootState) -> ChromeCommand<'_> {
    let counts = match kind {
        WindowKind::Count => counts::visible_counts(state),
        _ => Vec::new(),
    };
    let sprites = match kind {
        WindowKind::Tracker => {
            let set = &state.settings.active_profile.sprite_set;
            state
                .tracker
                .pokemon
                .iter()
                .map(|item| SpriteCell {
                    id: item.definition.id,
                    url: catalog::sprite_url(set, &item.definition),
                })
                .collect()
        }
        _ => Vec::new(),
    };
    ChromeCommand::Render {
        window: kind.as_str(),
        state,
        counts,
        sprites,
    }
}

fn emit(command: &ChromeCommand<'_>) {
    let line = match serde_json::to_string(command) {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, "Failed to encode chrome command");
            return;
        }
    };
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if writeln!(handle, "{}", line).and_then(|_| handle.flush()).is_err() {
        warn!("Chrome command stream is gone");
    }
}

/// Reads UI events until stdin closes.
pub fn stdin_loop(kind: WindowKind, profiles_dir: PathBuf, runtime: &Arc<Mutex<Dispatcher>>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "Failed to read UI event");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<UiEvent>(&line) {
            Ok(event) => handle_event(kind, &profiles_dir, runtime, event),
            Err(err) => {
                warn!(error = %err, "Ignoring unparseable UI event");
            }
        }
    }
}

pub fn handle_event(
    kind: WindowKind,
    profiles_dir: &Path,
    runtime: &Arc<Mutex<Dispatcher>>,
    event: UiEvent,
) {
    match event {
        UiEvent::Dispatch { action } => {
            let action = match prepare_profile_action(kind, profiles_dir, runtime, action) {
                Some(action) => action,
                None => return,
            };
            if let Ok(mut dispatcher) = runtime.lock() {
                dispatcher.dispatch(ActionEnvelope::local(action));
            }
        }
        UiEvent::Resize { width, height } => {
            let gesture = ResizeGesture { width, height };
            if let Ok(mut dispatcher) = runtime.lock() {
                let response = layout::on_resize(kind, dispatcher.store().state(), gesture);
                match response {
                    LayoutResponse::Absorb => {}
                    LayoutResponse::Snap { size, action } => {
                        debug!(width = size.width, height = size.height, "Forcing snapped size");
                        emit(&ChromeCommand::SetSize {
                            width: size.width,
                            height: size.height,
                        });
                        dispatcher.dispatch(ActionEnvelope::local(action));
                    }
                    LayoutResponse::PassThrough { action } => {
                        dispatcher.dispatch(ActionEnvelope::local(action));
                    }
                }
            }
        }
    }
}

// The settings editor owns profile files: it writes the file before the
// save action goes out (filling in a derived file name on first save) and
// removes the file when a profile is deleted. The reducers themselves never
// touch disk.
fn prepare_profile_action(
    kind: WindowKind,
    profiles_dir: &Path,
    runtime: &Arc<Mutex<Dispatcher>>,
    action: Action,
) -> Option<Action> {
    if kind != WindowKind::Settings {
        return Some(action);
    }

    match action {
        Action::SaveProfile { profile } => match profiles::write_profile(profiles_dir, &profile) {
            Ok(written) => Some(Action::SaveProfile { profile: written }),
            Err(err) => {
                warn!(error = %err, profile = %profile.name, "Failed to write profile file");
                // State still updates; the file catches up on the next save.
                Some(Action::SaveProfile { profile })
            }
        },
        Action::DeleteProfile { profile_id } => {
            if let Ok(dispatcher) = runtime.lock() {
                let doomed = dispatcher
                    .store()
                    .state()
                    .profiles
                    .profiles
                    .iter()
                    .find(|profile| profile.id == profile_id)
                    .cloned();
                if let Some(profile) = doomed {
                    if let Err(err) = profiles::delete_profile_file(profiles_dir, &profile) {
                        warn!(error = %err, profile = %profile.name, "Failed to delete profile file");
                    }
                }
            }
            Some(Action::DeleteProfile { profile_id })
        }
        other => Some(other),
    }
}
