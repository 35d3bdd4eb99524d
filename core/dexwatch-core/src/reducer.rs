//! Pure reducers, one per state slice.
//!
//! Every reducer is total: an action it does not recognize returns the input
//! slice unchanged. Reducers never perform I/O and never fail; semantic
//! misses (an id that matches nothing) are no-ops.

use dexwatch_protocol::{
    Action, Profile, ProfilesState, RootState, SettingsState, TrackerState, WindowDimensions,
};

/// Runs one action through every slice reducer and assembles the next root
/// state. Slices are reduced independently; an action addresses at most one
/// of them.
pub fn reduce(state: &RootState, action: &Action) -> RootState {
    RootState {
        tracker: reduce_tracker(&state.tracker, action),
        settings: reduce_settings(&state.settings, action),
        profiles: reduce_profiles(&state.profiles, action),
    }
}

pub fn reduce_tracker(state: &TrackerState, action: &Action) -> TrackerState {
    match action {
        Action::SetPokemonState { id, state: new_state } => TrackerState {
            pokemon: state
                .pokemon
                .iter()
                .map(|item| {
                    if item.definition.id == *id {
                        let mut updated = item.clone();
                        updated.state = new_state.clone();
                        updated
                    } else {
                        item.clone()
                    }
                })
                .collect(),
        },
        _ => state.clone(),
    }
}

pub fn reduce_settings(state: &SettingsState, action: &Action) -> SettingsState {
    match action {
        Action::SetCellSize { size } => SettingsState {
            cell_size: *size,
            ..state.clone()
        },
        Action::SetFontFamily { font_family } => SettingsState {
            font_family: font_family.clone(),
            ..state.clone()
        },
        Action::SetTrackerBackgroundColor { color } => {
            let mut next = state.clone();
            next.background_colors.tracker = color.clone();
            next
        }
        Action::SetCountBackgroundColor { color } => {
            let mut next = state.clone();
            next.background_colors.count = color.clone();
            next
        }
        Action::SetTrackerDimensions { width, height } => {
            let mut next = state.clone();
            next.dimensions.tracker = WindowDimensions {
                width: *width,
                height: *height,
            };
            next
        }
        Action::SetCountDimensions { width, height } => {
            let mut next = state.clone();
            next.dimensions.count = WindowDimensions {
                width: *width,
                height: *height,
            };
            next
        }
        Action::SetActiveProfile { profile } => SettingsState {
            active_profile: profile.clone(),
            ..state.clone()
        },
        _ => state.clone(),
    }
}

pub fn reduce_profiles(state: &ProfilesState, action: &Action) -> ProfilesState {
    match action {
        Action::SaveProfile { profile } => ProfilesState {
            profiles: upsert_profile(&state.profiles, profile),
        },
        Action::DeleteProfile { profile_id } => ProfilesState {
            profiles: state
                .profiles
                .iter()
                .filter(|profile| profile.id != *profile_id)
                .cloned()
                .collect(),
        },
        _ => state.clone(),
    }
}

// Upsert by id: replace in place to preserve order, append when no id
// matches. The single-primary invariant is normalized in the same update.
fn upsert_profile(profiles: &[Profile], incoming: &Profile) -> Vec<Profile> {
    let incoming = incoming.normalized_primary();
    let mut replaced = false;
    let mut next: Vec<Profile> = profiles
        .iter()
        .map(|profile| {
            if profile.id == incoming.id {
                replaced = true;
                incoming.clone()
            } else {
                profile.clone()
            }
        })
        .collect();
    if !replaced {
        next.push(incoming);
    }
    next
}
