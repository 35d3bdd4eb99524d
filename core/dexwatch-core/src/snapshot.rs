//! The persistence gateway: load-merge-save of the state snapshot.
//!
//! The snapshot file is owned exclusively by the host process. Loading
//! deep-merges the stored tree over the compiled-in default template with a
//! schema-aware recursive merge: the template's shape decides which keys
//! exist, leaves present in the snapshot win, absent leaves fall back to the
//! default, and keys the template does not know are discarded. That rule is
//! what lets the schema grow across versions without migration scripts.
//!
//! Arrays replace wholesale, never concatenate, so the tracker contents come
//! only from the snapshot; the default template intentionally carries none.
//!
//! Saving is best-effort: a write failure is logged and swallowed, and the
//! in-memory state stays authoritative for the running session.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use dexwatch_protocol::RootState;

use crate::error::{CoreError, Result};
use crate::pipeline::SnapshotSink;
use crate::profiles;

/// The compiled-in default-state template: empty tracker, stock settings,
/// and the bundled default profile both as the active profile and as the
/// only entry in the profiles slice.
pub fn default_state() -> RootState {
    let bundled = profiles::bundled_default_profile().clone();
    let mut state = RootState::default();
    state.settings.active_profile = bundled.clone();
    state.profiles.profiles = vec![bundled];
    state
}

/// Merges a loaded snapshot over the default template. Always succeeds; a
/// snapshot too malformed to merge yields the defaults.
pub fn merge_with_defaults(snapshot: &Value) -> RootState {
    let template = match serde_json::to_value(default_state()) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Failed to serialize default state template");
            return default_state();
        }
    };

    let merged = merge_value(&template, snapshot);
    match serde_json::from_value(merged) {
        Ok(state) => state,
        Err(err) => {
            warn!(error = %err, "Merged snapshot did not deserialize; using defaults");
            default_state()
        }
    }
}

// Recursive merge keyed by the template's shape. Walking the template's
// keys (not the snapshot's) is what drops stale fields from old snapshots.
fn merge_value(template: &Value, snapshot: &Value) -> Value {
    match (template, snapshot) {
        (Value::Object(template_map), Value::Object(snapshot_map)) => {
            let mut merged = serde_json::Map::with_capacity(template_map.len());
            for (key, template_child) in template_map {
                let child = match snapshot_map.get(key) {
                    Some(snapshot_child) => merge_value(template_child, snapshot_child),
                    None => template_child.clone(),
                };
                merged.insert(key.clone(), child);
            }
            Value::Object(merged)
        }
        (_, Value::Null) => template.clone(),
        (Value::Null, _) => snapshot.clone(),
        (template, snapshot) if same_shape(template, snapshot) => snapshot.clone(),
        // A leaf whose type disagrees with the template is stale data.
        _ => template.clone(),
    }
}

fn same_shape(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
    )
}

/// Reads and merges the snapshot at `path`. Missing or corrupt files recover
/// to the default template; this never fails.
pub fn load_state(path: &Path) -> RootState {
    if !path.exists() {
        info!(path = %path.display(), "No snapshot found; starting from defaults");
        return default_state();
    }

    let raw = match fs_err::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read snapshot; using defaults");
            return default_state();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => merge_with_defaults(&value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Snapshot is not valid JSON; using defaults");
            default_state()
        }
    }
}

/// Serializes the full state and atomically replaces the snapshot file
/// (temp file + rename, so a crash mid-write never leaves a torn snapshot).
pub fn save_state(path: &Path, state: &RootState) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let payload = serde_json::to_vec_pretty(state).map_err(|err| CoreError::Malformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|err| CoreError::io(parent, err))?;
    temp.write_all(&payload)
        .map_err(|err| CoreError::io(path, err))?;
    temp.persist(path)
        .map_err(|err| CoreError::io(path, err.error))?;
    Ok(())
}

/// [`SnapshotSink`] wired into the host pipeline: writes the settled state
/// after every applied action.
pub struct SnapshotGateway {
    path: PathBuf,
}

impl SnapshotGateway {
    pub fn new(path: PathBuf) -> Self {
        SnapshotGateway { path }
    }
}

impl SnapshotSink for SnapshotGateway {
    fn persist(&mut self, state: &RootState) {
        if let Err(err) = save_state(&self.path, state) {
            warn!(path = %self.path.display(), error = %err, "Failed to persist snapshot");
        }
    }
}
