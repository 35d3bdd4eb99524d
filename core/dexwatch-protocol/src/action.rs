//! State mutations, serialized in the `{"type", "payload"}` shape the
//! snapshot format inherited from the original renderer actions.
//!
//! Reducers must treat any action they do not recognize as a no-op, so new
//! variants can be added without touching every slice.

use serde::{Deserialize, Serialize};

use crate::state::Profile;
use crate::wire::ErrorInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    #[serde(rename = "SET_POKEMON_STATE")]
    SetPokemonState { id: u32, state: String },

    #[serde(rename = "SET_CELL_SIZE")]
    SetCellSize { size: u32 },

    #[serde(rename = "SET_FONT_FAMILY", rename_all = "camelCase")]
    SetFontFamily { font_family: String },

    #[serde(rename = "SET_TRACKER_BACKGROUND_COLOR")]
    SetTrackerBackgroundColor { color: String },

    #[serde(rename = "SET_COUNT_BACKGROUND_COLOR")]
    SetCountBackgroundColor { color: String },

    #[serde(rename = "SET_TRACKER_DIMENSIONS")]
    SetTrackerDimensions { width: u32, height: u32 },

    #[serde(rename = "SET_COUNT_DIMENSIONS")]
    SetCountDimensions { width: u32, height: u32 },

    #[serde(rename = "SET_ACTIVE_PROFILE")]
    SetActiveProfile { profile: Profile },

    #[serde(rename = "SAVE_PROFILE")]
    SaveProfile { profile: Profile },

    #[serde(rename = "DELETE_PROFILE", rename_all = "camelCase")]
    DeleteProfile { profile_id: String },
}

impl Action {
    /// A short name for logging. Matches the wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetPokemonState { .. } => "SET_POKEMON_STATE",
            Action::SetCellSize { .. } => "SET_CELL_SIZE",
            Action::SetFontFamily { .. } => "SET_FONT_FAMILY",
            Action::SetTrackerBackgroundColor { .. } => "SET_TRACKER_BACKGROUND_COLOR",
            Action::SetCountBackgroundColor { .. } => "SET_COUNT_BACKGROUND_COLOR",
            Action::SetTrackerDimensions { .. } => "SET_TRACKER_DIMENSIONS",
            Action::SetCountDimensions { .. } => "SET_COUNT_DIMENSIONS",
            Action::SetActiveProfile { .. } => "SET_ACTIVE_PROFILE",
            Action::SaveProfile { .. } => "SAVE_PROFILE",
            Action::DeleteProfile { .. } => "DELETE_PROFILE",
        }
    }

    /// Structural validation, applied before an action enters any store.
    /// Semantic misses (an unknown item id, an unmatched profile id on
    /// delete) stay reducer-level no-ops.
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        match self {
            Action::SetPokemonState { state, .. } => {
                require_non_empty(state, "state")?;
            }
            Action::SetCellSize { size } => {
                if *size == 0 {
                    return Err(ErrorInfo::new(
                        "invalid_cell_size",
                        "cell size must be greater than zero",
                    ));
                }
            }
            Action::SetFontFamily { font_family } => {
                require_non_empty(font_family, "fontFamily")?;
            }
            Action::SetTrackerBackgroundColor { color }
            | Action::SetCountBackgroundColor { color } => {
                require_non_empty(color, "color")?;
            }
            Action::SetTrackerDimensions { width, height }
            | Action::SetCountDimensions { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err(ErrorInfo::new(
                        "invalid_dimensions",
                        "window dimensions must be greater than zero",
                    ));
                }
            }
            Action::SetActiveProfile { profile } | Action::SaveProfile { profile } => {
                require_non_empty(&profile.id, "profile.id")?;
                require_non_empty(&profile.name, "profile.name")?;
            }
            Action::DeleteProfile { profile_id } => {
                require_non_empty(profile_id, "profileId")?;
            }
        }
        Ok(())
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ErrorInfo> {
    if value.trim().is_empty() {
        return Err(ErrorInfo::new(
            "missing_field",
            format!("{} is required", field),
        ));
    }
    Ok(())
}
