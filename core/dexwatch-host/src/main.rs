//! dexwatch host entrypoint.
//!
//! The single authoritative process: it loads and merges the persisted
//! snapshot before accepting any window connection, owns the canonical
//! store, and replays every applied action to all connected windows.

use std::env;
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dexwatch_core::{profiles, snapshot, Dispatcher, SnapshotGateway, StorageConfig, Store};

mod connection;
mod registry;

use connection::{handle_connection, HostRuntime};
use registry::{RegistryFanout, WindowRegistry};

fn main() {
    init_logging();

    let storage = match StorageConfig::resolve() {
        Ok(storage) => storage,
        Err(err) => {
            error!(error = %err, "Failed to resolve data directory");
            std::process::exit(1);
        }
    };
    if let Err(err) = storage.ensure_dirs() {
        error!(error = %err, "Failed to prepare data directory");
        std::process::exit(1);
    }

    // Load-merge must settle before the socket exists: a window's seed is
    // always the merged snapshot, never a half-initialized state.
    let state = startup_state(&storage);

    let registry = Arc::new(Mutex::new(WindowRegistry::new()));
    let dispatcher = Dispatcher::host(Store::new(state))
        .with_persistence(Box::new(SnapshotGateway::new(storage.snapshot_file())))
        .with_fanout(Box::new(RegistryFanout::new(Arc::clone(&registry))));
    let runtime = Arc::new(HostRuntime {
        dispatcher: Mutex::new(dispatcher),
        registry,
    });

    let socket_path = storage.socket_file();
    if let Err(err) = remove_existing_socket(&socket_path) {
        error!(error = %err, path = %socket_path.display(), "Failed to remove existing socket");
        std::process::exit(1);
    }
    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, path = %socket_path.display(), "Failed to bind host socket");
            std::process::exit(1);
        }
    };

    info!(path = %socket_path.display(), "dexwatch host started");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let runtime = Arc::clone(&runtime);
                thread::spawn(|| handle_connection(stream, runtime));
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept window connection");
            }
        }
    }
}

/// Builds the canonical startup state: snapshot merged over defaults, the
/// profiles slice refreshed from the profiles directory, and session ids
/// assigned.
fn startup_state(storage: &StorageConfig) -> dexwatch_protocol::RootState {
    let mut state = snapshot::load_state(&storage.snapshot_file());

    if let Err(err) = profiles::seed_default_profiles(&storage.profiles_dir()) {
        warn!(error = %err, "Failed to seed default profiles");
    }
    let loaded = profiles::load_profiles(&storage.profiles_dir());
    if !loaded.is_empty() {
        state.profiles.profiles = loaded;
    }

    // Profile ids regenerate every load; re-point the active-profile copy at
    // its canonical entry so the ids keep matching. The copy's contents are
    // still the snapshot's and may lag edits until re-set.
    if let Some(canonical) = state
        .profiles
        .profiles
        .iter()
        .find(|profile| profile.name == state.settings.active_profile.name)
    {
        state.settings.active_profile.id = canonical.id.clone();
    }
    profiles::assign_profile_ids(&mut state);

    info!(
        profiles = state.profiles.profiles.len(),
        tracked = state.tracker.pokemon.len(),
        "Startup state ready"
    );
    state
}

fn init_logging() {
    let debug_enabled = env::var("DEXWATCH_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn remove_existing_socket(socket_path: &Path) -> Result<(), String> {
    if socket_path.exists() {
        fs_err::remove_file(socket_path)
            .map_err(|err| format!("Failed to remove existing socket: {}", err))?;
    }
    Ok(())
}
