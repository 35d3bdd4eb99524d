//! Profile file management.
//!
//! Profiles live as individual JSON files under the data root's `profiles`
//! directory. On first run the bundled default profile asset is copied
//! there. Loading assigns each profile a fresh ULID, the only stable
//! identity for the running session, and records the source file name.
//!
//! Reducers never touch these files. The host seeds and loads the directory
//! at startup; the settings window writes and deletes profile files as the
//! editor saves and removes profiles.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use dexwatch_protocol::{Profile, RootState};

use crate::error::{CoreError, Result};

pub const DEFAULT_PROFILE_ASSET: &str = include_str!("../assets/profiles/all-gen1.json");
const DEFAULT_PROFILE_FILE_NAME: &str = "all-gen1.json";

static BUNDLED_DEFAULT: Lazy<Profile> = Lazy::new(|| {
    let mut profile: Profile = serde_json::from_str(DEFAULT_PROFILE_ASSET)
        .expect("bundled default profile asset is valid JSON");
    profile.file_name = Some(DEFAULT_PROFILE_FILE_NAME.to_string());
    profile
});

static FILE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-z0-9]+").expect("file name pattern compiles"));

/// The profile compiled into the binary, used both for first-run seeding and
/// as the default-state template's active profile.
pub fn bundled_default_profile() -> &'static Profile {
    &BUNDLED_DEFAULT
}

/// Copies the bundled profile assets into `dir` when the directory does not
/// exist yet. An existing directory is left alone, even if empty.
pub fn seed_default_profiles(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }

    info!(dir = %dir.display(), "Seeding default profiles");
    fs_err::create_dir_all(dir).map_err(|err| CoreError::io(dir, err))?;
    let target = dir.join(DEFAULT_PROFILE_FILE_NAME);
    fs_err::write(&target, DEFAULT_PROFILE_ASSET).map_err(|err| CoreError::io(&target, err))?;
    Ok(())
}

/// Loads every `*.json` profile in `dir`, assigning each a fresh ULID and
/// its file name. Unreadable entries are skipped with a warning; a failed
/// directory read yields no profiles. Results are ordered by file name so
/// the profile list is stable across restarts.
pub fn load_profiles(dir: &Path) -> Vec<Profile> {
    let entries = match fs_err::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "Failed to read profiles directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    files.sort();

    let mut profiles = Vec::with_capacity(files.len());
    for path in files {
        let raw = match fs_err::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read profile file");
                continue;
            }
        };
        let mut profile: Profile = match serde_json::from_str(&raw) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping malformed profile file");
                continue;
            }
        };
        profile.id = ulid::Ulid::new().to_string();
        profile.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        profiles.push(profile);
    }
    profiles
}

/// Fills in ids that the snapshot did not carry. The active-profile copy
/// reuses the id of the canonical entry with the same name when one exists,
/// so the copy and its source keep matching ids.
pub fn assign_profile_ids(state: &mut RootState) {
    for profile in state.profiles.profiles.iter_mut() {
        if profile.id.trim().is_empty() {
            profile.id = ulid::Ulid::new().to_string();
        }
    }

    if state.settings.active_profile.id.trim().is_empty() {
        let matching = state
            .profiles
            .profiles
            .iter()
            .find(|profile| profile.name == state.settings.active_profile.name)
            .map(|profile| profile.id.clone());
        state.settings.active_profile.id =
            matching.unwrap_or_else(|| ulid::Ulid::new().to_string());
    }
}

/// Derives an on-disk file name from a profile name: lowercased, with runs
/// of anything outside `a-z0-9` collapsed to a single dash.
pub fn profile_file_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = FILE_NAME_PATTERN.replace_all(&lowered, "-");
    format!("{}.json", slug.trim_matches('-'))
}

/// Writes `profile` into `dir`, deriving a file name from the profile name
/// when none is set. Returns the profile with its file name filled in, ready
/// to be dispatched.
pub fn write_profile(dir: &Path, profile: &Profile) -> Result<Profile> {
    let mut profile = profile.clone();
    if profile.file_name.is_none() {
        profile.file_name = Some(profile_file_name(&profile.name));
    }
    let file_name = profile.file_name.clone().unwrap_or_default();
    let target = dir.join(file_name);

    fs_err::create_dir_all(dir).map_err(|err| CoreError::io(dir, err))?;
    let payload = serde_json::to_vec_pretty(&profile).map_err(|err| CoreError::Malformed {
        path: target.clone(),
        details: err.to_string(),
    })?;
    fs_err::write(&target, payload).map_err(|err| CoreError::io(&target, err))?;
    Ok(profile)
}

/// Removes the file backing `profile`, if it has one. A profile that never
/// reached disk is a no-op.
pub fn delete_profile_file(dir: &Path, profile: &Profile) -> Result<()> {
    let Some(file_name) = profile.file_name.as_ref() else {
        return Ok(());
    };
    let target = dir.join(file_name);
    if target.exists() {
        fs_err::remove_file(&target).map_err(|err| CoreError::io(&target, err))?;
    }
    Ok(())
}
