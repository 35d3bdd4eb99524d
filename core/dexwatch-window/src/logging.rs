//! File-backed logging for window processes.
//!
//! Stdout carries chrome commands, so tracing output is appended to
//! `logs/window-<kind>.log` under the data root. The returned guard must
//! stay alive for the lifetime of the process or buffered lines are lost.

use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use dexwatch_core::StorageConfig;
use dexwatch_protocol::WindowKind;

pub fn init(storage: &StorageConfig, kind: WindowKind) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(
        storage.logs_dir(),
        format!("window-{}.log", kind.as_str()),
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let debug_enabled = env::var("DEXWATCH_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}
