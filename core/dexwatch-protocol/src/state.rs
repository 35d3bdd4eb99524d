//! The replicated root state and its three slices.
//!
//! Slices are independent: nothing here holds a live reference across slice
//! boundaries. The active profile embedded in settings is a copy of a
//! profiles-slice entry and may drift until explicitly re-set.

use serde::{Deserialize, Serialize};

/// Immutable reference to an entry in the static species catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesRef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub default_state: Option<String>,
}

/// One cell of the tracker grid: a species plus the name of its current
/// tracking state. The state name is free-form; a name that matches no
/// definition in the active profile simply renders unstyled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerItem {
    pub definition: SpeciesRef,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(default)]
    pub pokemon: Vec<TrackerItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStateDefinition {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub is_primary: Option<bool>,
    #[serde(default)]
    pub show_count: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSet {
    pub name: String,
    pub path: String,
    pub gen: u32,
}

/// A user-defined tracking bundle. `id` is assigned once when the profile is
/// loaded from disk and is the only stable identity; `file_name` maps the
/// profile back to its on-disk representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sprite_set: SpriteSet,
    #[serde(default)]
    pub states: Vec<TrackerStateDefinition>,
    #[serde(default)]
    pub pokemon: Vec<SpeciesRef>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Profile {
    /// Returns a copy with at most one primary state definition. When several
    /// are flagged the first wins; the rest are cleared in the same update.
    pub fn normalized_primary(&self) -> Profile {
        let mut profile = self.clone();
        let mut seen_primary = false;
        for definition in profile.states.iter_mut() {
            if definition.is_primary == Some(true) {
                if seen_primary {
                    definition.is_primary = Some(false);
                }
                seen_primary = true;
            }
        }
        profile
    }

    /// Marks the named state definition primary and clears the flag on every
    /// other definition in this profile.
    pub fn set_primary_state(&mut self, name: &str) {
        for definition in self.states.iter_mut() {
            definition.is_primary = Some(definition.name == name);
        }
    }

    pub fn primary_state(&self) -> Option<&TrackerStateDefinition> {
        self.states
            .iter()
            .find(|definition| definition.is_primary == Some(true))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub tracker: WindowDimensions,
    pub count: WindowDimensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundColors {
    pub tracker: String,
    pub count: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsState {
    pub cell_size: u32,
    pub font_family: String,
    pub background_colors: BackgroundColors,
    pub dimensions: Dimensions,
    pub active_profile: Profile,
}

impl Default for SettingsState {
    fn default() -> Self {
        SettingsState {
            cell_size: 48,
            font_family: "Avenir, Trebuchet MS, sans-serif".to_string(),
            background_colors: BackgroundColors {
                tracker: "#ffffff".to_string(),
                count: "#ffffff".to_string(),
            },
            dimensions: Dimensions {
                tracker: WindowDimensions {
                    width: 960,
                    height: 360,
                },
                count: WindowDimensions {
                    width: 150,
                    height: 75,
                },
            },
            active_profile: Profile::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilesState {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// The full replicated state tree. The host holds the canonical instance;
/// every window holds a replica seeded at connection time and mutated only
/// by replayed actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    #[serde(default)]
    pub tracker: TrackerState,
    #[serde(default)]
    pub settings: SettingsState,
    #[serde(default)]
    pub profiles: ProfilesState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str, primary: bool) -> TrackerStateDefinition {
        TrackerStateDefinition {
            name: name.to_string(),
            color: "#ffffff".to_string(),
            is_primary: Some(primary),
            show_count: None,
        }
    }

    #[test]
    fn settings_defaults_match_template() {
        let settings = SettingsState::default();
        assert_eq!(settings.cell_size, 48);
        assert_eq!(settings.dimensions.tracker.width, 960);
        assert_eq!(settings.dimensions.count.height, 75);
        assert_eq!(settings.background_colors.tracker, "#ffffff");
    }

    #[test]
    fn normalized_primary_keeps_first_flag() {
        let profile = Profile {
            states: vec![
                definition("blank", true),
                definition("caught", true),
                definition("shiny", false),
            ],
            ..Profile::default()
        };

        let normalized = profile.normalized_primary();
        assert_eq!(normalized.states[0].is_primary, Some(true));
        assert_eq!(normalized.states[1].is_primary, Some(false));
        assert_eq!(normalized.states[2].is_primary, Some(false));
    }

    #[test]
    fn set_primary_state_flips_all_others() {
        let mut profile = Profile {
            states: vec![
                definition("blank", true),
                definition("caught", false),
                definition("shiny", false),
            ],
            ..Profile::default()
        };

        profile.set_primary_state("caught");
        assert_eq!(profile.states[0].is_primary, Some(false));
        assert_eq!(profile.states[1].is_primary, Some(true));
        assert_eq!(profile.states[2].is_primary, Some(false));
        assert_eq!(profile.primary_state().map(|d| d.name.as_str()), Some("caught"));
    }

    #[test]
    fn snapshot_field_names_are_stable() {
        let state = RootState::default();
        let value = serde_json::to_value(&state).expect("serialize");
        assert!(value.get("tracker").and_then(|t| t.get("pokemon")).is_some());
        let settings = value.get("settings").expect("settings");
        assert!(settings.get("cellSize").is_some());
        assert!(settings.get("fontFamily").is_some());
        assert!(settings.get("backgroundColors").is_some());
        assert!(settings.get("activeProfile").is_some());
        assert!(value.get("profiles").and_then(|p| p.get("profiles")).is_some());
    }

    #[test]
    fn profile_tolerates_missing_optional_fields() {
        let profile: Profile = serde_json::from_str(
            r#"{"name":"Kanto","spriteSet":{"name":"Red/Blue/Yellow","path":"gen1rb","gen":1},
                "states":[{"name":"caught","color":"#a7e29a"}],
                "pokemon":[{"id":25,"name":"Pikachu"}]}"#,
        )
        .expect("deserialize");

        assert!(profile.id.is_empty());
        assert_eq!(profile.file_name, None);
        assert_eq!(profile.states[0].is_primary, None);
        assert_eq!(profile.pokemon[0].sprite, None);
    }
}
