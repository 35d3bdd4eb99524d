//! Client side of the host socket: handshake, forwarding, and the replay
//! stream.
//!
//! The host is the only writer. A forward that cannot be delivered is a
//! lost action, logged by the dispatch pipeline; there is no local fallback
//! because a mirror must never apply its own pre-image.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::RngCore;
use tracing::{info, warn};

use dexwatch_core::pipeline::ForwardLink;
use dexwatch_core::{ActionEnvelope, CoreError, Dispatcher};
use dexwatch_protocol::{
    Action, ClientMessage, HostMessage, RootState, WindowKind, MAX_MESSAGE_BYTES, PROTOCOL_VERSION,
};

pub struct HostLink {
    pub window_id: String,
    pub seed: RootState,
    pub reader: BufReader<UnixStream>,
    pub forward: StreamForwardLink,
}

impl HostLink {
    /// Connects, introduces this window, and blocks until the host's seed
    /// snapshot arrives. Everything after the seed is a replay stream.
    pub fn connect(socket: &Path, kind: WindowKind) -> Result<Self, String> {
        let stream = UnixStream::connect(socket)
            .map_err(|err| format!("Failed to connect to host socket: {}", err))?;
        let reader_stream = stream
            .try_clone()
            .map_err(|err| format!("Failed to clone host stream: {}", err))?;
        let mut reader = BufReader::new(reader_stream);

        let window_id = make_window_id();
        let hello = ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            window: kind,
            window_id: window_id.clone(),
            sent_at: Utc::now().to_rfc3339(),
        };
        let mut forward = StreamForwardLink { stream };
        forward
            .write_message(&hello)
            .map_err(|err| format!("Failed to send hello: {}", err))?;

        let line = read_line(&mut reader)?
            .ok_or_else(|| "Host closed the connection during handshake".to_string())?;
        let message: HostMessage = serde_json::from_slice(&line)
            .map_err(|err| format!("Seed was not valid JSON: {}", err))?;

        match message {
            HostMessage::Seed {
                protocol_version,
                state,
            } => {
                if protocol_version != PROTOCOL_VERSION {
                    return Err(format!(
                        "Host speaks protocol {} but this window expects {}",
                        protocol_version, PROTOCOL_VERSION
                    ));
                }
                Ok(HostLink {
                    window_id,
                    seed: state,
                    reader,
                    forward,
                })
            }
            HostMessage::Error { error } => {
                Err(format!("Host rejected handshake: {}: {}", error.code, error.message))
            }
            HostMessage::Replay { .. } => {
                Err("Host sent a replay before the seed".to_string())
            }
        }
    }
}

/// [`ForwardLink`] over the duplex host connection.
pub struct StreamForwardLink {
    stream: UnixStream,
}

impl StreamForwardLink {
    fn write_message(&mut self, message: &ClientMessage) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(message)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        line.push(b'\n');
        self.stream.write_all(&line)?;
        self.stream.flush()
    }
}

impl ForwardLink for StreamForwardLink {
    fn forward(&mut self, action: &Action) -> dexwatch_core::Result<()> {
        let message = ClientMessage::Forward {
            action: action.clone(),
            sent_at: Utc::now().to_rfc3339(),
        };
        self.write_message(&message)
            .map_err(|err| CoreError::LinkLost(err.to_string()))
    }
}

/// Applies the host's replay stream to the mirror until the connection
/// closes. Runs on its own thread; the replica dies with the host, so a
/// clean EOF ends the process.
pub fn replay_loop(mut reader: BufReader<UnixStream>, runtime: Arc<Mutex<Dispatcher>>) {
    loop {
        let line = match read_line(&mut reader) {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Host connection closed; window shutting down");
                std::process::exit(0);
            }
            Err(err) => {
                warn!(error = %err, "Replay stream failed; window shutting down");
                std::process::exit(1);
            }
        };

        match serde_json::from_slice::<HostMessage>(&line) {
            Ok(HostMessage::Replay { action }) => {
                if let Ok(mut dispatcher) = runtime.lock() {
                    dispatcher.dispatch(ActionEnvelope::replay(action));
                }
            }
            Ok(HostMessage::Error { error }) => {
                warn!(code = %error.code, message = %error.message, "Host rejected an action");
            }
            Ok(HostMessage::Seed { .. }) => {
                warn!("Ignoring unexpected seed after startup");
            }
            Err(err) => {
                warn!(error = %err, "Ignoring unparseable host message");
            }
        }
    }
}

fn read_line(reader: &mut BufReader<UnixStream>) -> Result<Option<Vec<u8>>, String> {
    loop {
        let mut buffer = Vec::new();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => {
                if buffer.len() > MAX_MESSAGE_BYTES {
                    return Err("host message exceeded maximum size".to_string());
                }
                while buffer.last().map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
                    buffer.pop();
                }
                if buffer.is_empty() {
                    continue;
                }
                return Ok(Some(buffer));
            }
            Err(err) => return Err(format!("failed to read host message: {}", err)),
        }
    }
}

fn make_window_id() -> String {
    let mut random = rand::thread_rng();
    format!(
        "win-{}-{}-{:x}",
        Utc::now().timestamp_millis(),
        std::process::id(),
        random.next_u64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexwatch_core::Store;
    use std::os::unix::net::UnixListener;
    use tempfile::TempDir;

    fn write_line(stream: &mut UnixStream, message: &HostMessage) {
        let mut line = serde_json::to_vec(message).unwrap();
        line.push(b'\n');
        stream.write_all(&line).unwrap();
        stream.flush().unwrap();
    }

    fn read_client_message(stream: &mut UnixStream) -> ClientMessage {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn connect_performs_hello_seed_handshake() {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("host.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let hello = read_client_message(&mut stream);
            match &hello {
                ClientMessage::Hello {
                    protocol_version,
                    window,
                    window_id,
                    ..
                } => {
                    assert_eq!(*protocol_version, PROTOCOL_VERSION);
                    assert_eq!(*window, WindowKind::Tracker);
                    assert!(window_id.starts_with("win-"));
                }
                other => panic!("expected hello, got {:?}", other),
            }

            let mut state = RootState::default();
            state.settings.cell_size = 52;
            write_line(
                &mut stream,
                &HostMessage::Seed {
                    protocol_version: PROTOCOL_VERSION,
                    state,
                },
            );
            stream
        });

        let link = HostLink::connect(&socket, WindowKind::Tracker).expect("connect");
        assert_eq!(link.seed.settings.cell_size, 52);
        server.join().unwrap();
    }

    #[test]
    fn connect_surfaces_handshake_rejection() {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("host.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _ = read_client_message(&mut stream);
            write_line(
                &mut stream,
                &HostMessage::Error {
                    error: dexwatch_protocol::ErrorInfo::new(
                        "protocol_mismatch",
                        "unsupported protocol version",
                    ),
                },
            );
        });

        let result = HostLink::connect(&socket, WindowKind::Count);
        server.join().unwrap();
        let message = result.err().expect("handshake should fail");
        assert!(message.contains("protocol_mismatch"));
    }

    #[test]
    fn forward_link_writes_forward_messages() {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("host.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let client = UnixStream::connect(&socket).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut link = StreamForwardLink { stream: client };
        link.forward(&Action::SetCellSize { size: 64 }).unwrap();

        match read_client_message(&mut server) {
            ClientMessage::Forward { action, sent_at } => {
                assert_eq!(action, Action::SetCellSize { size: 64 });
                assert!(chrono::DateTime::parse_from_rfc3339(&sent_at).is_ok());
            }
            other => panic!("expected forward, got {:?}", other),
        }
    }

    #[test]
    fn replayed_actions_mutate_the_mirror() {
        // Drives the replay path directly through a mirror dispatcher; the
        // forward link writes into a scratch socket nobody reads.
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("scratch.sock");
        let _listener = UnixListener::bind(&socket).unwrap();
        let scratch = UnixStream::connect(&socket).unwrap();

        let mut dispatcher = Dispatcher::mirror(
            Store::new(RootState::default()),
            Box::new(StreamForwardLink { stream: scratch }),
        );
        dispatcher.dispatch(ActionEnvelope::replay(Action::SetCellSize { size: 96 }));
        assert_eq!(dispatcher.store().state().settings.cell_size, 96);
    }
}
