//! dexwatch-window: the runtime behind one OS window.
//!
//! Each window process holds a replica of the host's state. Native UI
//! events arrive as JSON lines on stdin; commands for the window chrome
//! (forced resizes, render refreshes) leave as JSON lines on stdout. The
//! replica is seeded once at connection time and from then on changes only
//! through actions replayed by the host; a locally-dispatched action is
//! forwarded, not applied.
//!
//! Stdout belongs to the chrome command stream, so logs go to a file under
//! the data root.

mod host_link;
mod logging;
mod ui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use dexwatch_core::{Dispatcher, StorageConfig, Store};
use dexwatch_protocol::WindowKind;

use host_link::HostLink;

#[derive(Parser)]
#[command(name = "dexwatch-window")]
#[command(about = "dexwatch window process runtime")]
#[command(version)]
struct Cli {
    /// Which window surface this process backs
    #[arg(long, value_enum)]
    kind: KindArg,

    /// Override the host socket path
    #[arg(long)]
    socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Tracker,
    Count,
    Settings,
}

impl KindArg {
    fn to_kind(self) -> WindowKind {
        match self {
            KindArg::Tracker => WindowKind::Tracker,
            KindArg::Count => WindowKind::Count,
            KindArg::Settings => WindowKind::Settings,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let kind = cli.kind.to_kind();

    let storage = match StorageConfig::resolve() {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("Failed to resolve data directory: {}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = storage.ensure_dirs() {
        eprintln!("Failed to prepare data directory: {}", err);
        std::process::exit(1);
    }
    let _logging_guard = logging::init(&storage, kind);

    let socket = cli.socket.unwrap_or_else(|| storage.socket_file());
    if let Err(err) = run(kind, &socket, &storage) {
        error!(error = %err, "Window runtime failed");
        std::process::exit(1);
    }
}

fn run(kind: WindowKind, socket: &std::path::Path, storage: &StorageConfig) -> Result<(), String> {
    let link = HostLink::connect(socket, kind)?;
    info!(
        window = kind.as_str(),
        window_id = %link.window_id,
        "Connected to host"
    );

    let HostLink {
        seed,
        reader,
        forward,
        ..
    } = link;

    let mut dispatcher = Dispatcher::mirror(Store::new(seed), Box::new(forward));
    dispatcher
        .store_mut()
        .subscribe(move |state| ui::emit_render(kind, state));

    // The replica is live; hand the chrome its first frame.
    ui::emit_render(kind, dispatcher.store().state());

    let runtime = Arc::new(Mutex::new(dispatcher));
    let replay_runtime = Arc::clone(&runtime);
    thread::spawn(move || host_link::replay_loop(reader, replay_runtime));

    ui::stdin_loop(kind, storage.profiles_dir(), &runtime);
    info!(window = kind.as_str(), "UI stream closed; window shutting down");
    Ok(())
}
