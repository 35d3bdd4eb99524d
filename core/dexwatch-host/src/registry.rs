//! The live-window registry and broadcast fanout.
//!
//! Every connected window owns one registered handle. Broadcasting writes
//! the same replay line to each handle in registration order; a handle whose
//! write fails belongs to a window that is gone, so it is dropped from the
//! registry without ceremony.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use dexwatch_core::pipeline::BroadcastFanout;
use dexwatch_protocol::{Action, ErrorInfo, HostMessage, WindowKind};

pub struct WindowHandle {
    window_id: String,
    kind: WindowKind,
    stream: UnixStream,
}

impl WindowHandle {
    pub fn new(window_id: String, kind: WindowKind, stream: UnixStream) -> Self {
        WindowHandle {
            window_id,
            kind,
            stream,
        }
    }
}

#[derive(Default)]
pub struct WindowRegistry {
    windows: Vec<WindowHandle>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        WindowRegistry::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn register(&mut self, handle: WindowHandle) {
        info!(
            window = handle.kind.as_str(),
            window_id = %handle.window_id,
            "Window registered"
        );
        self.windows.push(handle);
    }

    pub fn unregister(&mut self, window_id: &str) {
        self.windows.retain(|handle| handle.window_id != window_id);
    }

    /// Writes one raw line to every window, dropping windows that are gone.
    pub fn broadcast_line(&mut self, line: &[u8]) {
        self.windows.retain_mut(|handle| {
            match handle.stream.write_all(line).and_then(|_| handle.stream.flush()) {
                Ok(()) => true,
                Err(err) => {
                    // Not an error: a closed window's replica is discarded.
                    info!(
                        window = handle.kind.as_str(),
                        window_id = %handle.window_id,
                        error = %err,
                        "Dropping unreachable window from broadcast"
                    );
                    false
                }
            }
        });
    }

    /// Writes one raw line to a single window, dropping it when unreachable.
    pub fn send_line_to(&mut self, window_id: &str, line: &[u8]) {
        self.windows.retain_mut(|handle| {
            if handle.window_id != window_id {
                return true;
            }
            match handle.stream.write_all(line).and_then(|_| handle.stream.flush()) {
                Ok(()) => true,
                Err(err) => {
                    info!(
                        window_id = %handle.window_id,
                        error = %err,
                        "Dropping unreachable window"
                    );
                    false
                }
            }
        });
    }

    pub fn send_error(&mut self, window_id: &str, error: ErrorInfo) {
        match encode_line(&HostMessage::Error { error }) {
            Ok(line) => self.send_line_to(window_id, &line),
            Err(err) => warn!(error = %err, "Failed to encode error message"),
        }
    }
}

pub fn encode_line(message: &HostMessage) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    Ok(line)
}

/// Host-side pipeline fanout: serializes each applied action once and
/// replays it to every registered window.
pub struct RegistryFanout {
    registry: Arc<Mutex<WindowRegistry>>,
}

impl RegistryFanout {
    pub fn new(registry: Arc<Mutex<WindowRegistry>>) -> Self {
        RegistryFanout { registry }
    }
}

impl BroadcastFanout for RegistryFanout {
    fn broadcast(&mut self, action: &Action) {
        let line = match encode_line(&HostMessage::Replay {
            action: action.clone(),
        }) {
            Ok(line) => line,
            Err(err) => {
                warn!(action = action.kind(), error = %err, "Failed to encode replay");
                return;
            }
        };
        if let Ok(mut registry) = self.registry.lock() {
            registry.broadcast_line(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::os::unix::net::UnixListener;
    use tempfile::TempDir;

    fn socket_pair(dir: &TempDir, name: &str) -> (UnixStream, UnixStream) {
        let path = dir.path().join(name);
        let listener = UnixListener::bind(&path).unwrap();
        let client = UnixStream::connect(&path).unwrap();
        let (server, _) = listener.accept().unwrap();
        (server, client)
    }

    #[test]
    fn broadcast_reaches_every_registered_window() {
        let dir = TempDir::new().unwrap();
        let (server_a, client_a) = socket_pair(&dir, "a.sock");
        let (server_b, client_b) = socket_pair(&dir, "b.sock");

        let registry = Arc::new(Mutex::new(WindowRegistry::new()));
        registry.lock().unwrap().register(WindowHandle::new(
            "win-a".to_string(),
            WindowKind::Tracker,
            server_a,
        ));
        registry.lock().unwrap().register(WindowHandle::new(
            "win-b".to_string(),
            WindowKind::Count,
            server_b,
        ));

        let mut fanout = RegistryFanout::new(Arc::clone(&registry));
        fanout.broadcast(&Action::SetCellSize { size: 64 });

        for client in [client_a, client_b] {
            let mut line = String::new();
            BufReader::new(client).read_line(&mut line).unwrap();
            let message: HostMessage = serde_json::from_str(&line).unwrap();
            match message {
                HostMessage::Replay { action } => {
                    assert_eq!(action, Action::SetCellSize { size: 64 })
                }
                other => panic!("expected replay, got {:?}", other),
            }
        }
    }

    #[test]
    fn unreachable_window_is_dropped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let (server_a, client_a) = socket_pair(&dir, "a.sock");
        let (server_b, client_b) = socket_pair(&dir, "b.sock");

        let registry = Arc::new(Mutex::new(WindowRegistry::new()));
        registry.lock().unwrap().register(WindowHandle::new(
            "win-a".to_string(),
            WindowKind::Tracker,
            server_a,
        ));
        registry.lock().unwrap().register(WindowHandle::new(
            "win-b".to_string(),
            WindowKind::Count,
            server_b,
        ));

        // Window A closes; the next broadcast must still reach B.
        drop(client_a);

        let mut fanout = RegistryFanout::new(Arc::clone(&registry));
        // Two broadcasts: the first may land in the dead socket's buffer
        // before the reset arrives, the second must surface the failure.
        fanout.broadcast(&Action::SetCellSize { size: 52 });
        std::thread::sleep(std::time::Duration::from_millis(50));
        fanout.broadcast(&Action::SetCellSize { size: 64 });

        assert_eq!(registry.lock().unwrap().len(), 1);

        let mut reader = BufReader::new(client_b);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let message: HostMessage = serde_json::from_str(&line).unwrap();
        match message {
            HostMessage::Replay { action } => assert_eq!(action, Action::SetCellSize { size: 52 }),
            other => panic!("expected replay, got {:?}", other),
        }
    }

    #[test]
    fn unregister_removes_exactly_one_window() {
        let dir = TempDir::new().unwrap();
        let (server_a, _client_a) = socket_pair(&dir, "a.sock");
        let (server_b, _client_b) = socket_pair(&dir, "b.sock");

        let mut registry = WindowRegistry::new();
        registry.register(WindowHandle::new(
            "win-a".to_string(),
            WindowKind::Tracker,
            server_a,
        ));
        registry.register(WindowHandle::new(
            "win-b".to_string(),
            WindowKind::Count,
            server_b,
        ));

        registry.unregister("win-a");
        assert_eq!(registry.len(), 1);
        registry.unregister("win-unknown");
        assert_eq!(registry.len(), 1);
    }
}
