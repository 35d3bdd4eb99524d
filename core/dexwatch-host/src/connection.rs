//! Per-window connection handling.
//!
//! A window opens one duplex connection for its whole lifetime: `hello`,
//! then the host's `seed`, then any number of `forward` messages inbound
//! while `replay` messages stream outbound through the registry.
//!
//! Seeding and registration happen under the dispatcher lock, so a window
//! never observes a gap between its seed snapshot and the replay stream:
//! every action applied after the seed was taken reaches it as a replay.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use dexwatch_core::{ActionEnvelope, Dispatcher};
use dexwatch_protocol::{
    ClientMessage, ErrorInfo, HostMessage, WindowKind, MAX_MESSAGE_BYTES, PROTOCOL_VERSION,
};

use crate::registry::{encode_line, WindowHandle, WindowRegistry};

pub struct HostRuntime {
    pub dispatcher: Mutex<Dispatcher>,
    pub registry: Arc<Mutex<WindowRegistry>>,
}

pub fn handle_connection(stream: UnixStream, runtime: Arc<HostRuntime>) {
    let reader_stream = match stream.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            warn!(error = %err, "Failed to clone window stream");
            return;
        }
    };
    let mut reader = BufReader::new(reader_stream);
    let mut stream = stream;

    let (window_id, kind) = match read_hello(&mut reader) {
        Ok(hello) => hello,
        Err(err) => {
            warn!(code = %err.code, message = %err.message, "Rejected window handshake");
            write_error(&mut stream, err);
            return;
        }
    };

    seed_window(&runtime, window_id.clone(), kind, stream);
    info!(window = kind.as_str(), window_id = %window_id, "Window connected");

    loop {
        let line = match read_message(&mut reader) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(window_id = %window_id, code = %err.code, "Closing window connection");
                break;
            }
        };

        match serde_json::from_slice::<ClientMessage>(&line) {
            Ok(ClientMessage::Forward { action, .. }) => {
                if let Err(err) = action.validate() {
                    warn!(
                        window_id = %window_id,
                        action = action.kind(),
                        code = %err.code,
                        "Rejected forwarded action"
                    );
                    send_error(&runtime, &window_id, err);
                    continue;
                }
                debug!(window_id = %window_id, action = action.kind(), "Forwarded action received");
                if let Ok(mut dispatcher) = runtime.dispatcher.lock() {
                    dispatcher.dispatch(ActionEnvelope::local(action));
                }
            }
            Ok(ClientMessage::Hello { .. }) => {
                send_error(
                    &runtime,
                    &window_id,
                    ErrorInfo::new("already_connected", "hello is only valid once"),
                );
            }
            Err(err) => {
                send_error(
                    &runtime,
                    &window_id,
                    ErrorInfo::new(
                        "invalid_json",
                        format!("message was not valid JSON: {}", err),
                    ),
                );
            }
        }
    }

    if let Ok(mut registry) = runtime.registry.lock() {
        registry.unregister(&window_id);
    }
    info!(window = kind.as_str(), window_id = %window_id, "Window disconnected");
}

fn read_hello(reader: &mut BufReader<UnixStream>) -> Result<(String, WindowKind), ErrorInfo> {
    let line = match read_message(reader) {
        Ok(Some(line)) => line,
        Ok(None) => return Err(ErrorInfo::new("empty_request", "connection closed before hello")),
        Err(err) => return Err(err),
    };

    let message: ClientMessage = serde_json::from_slice(&line).map_err(|err| {
        ErrorInfo::new("invalid_json", format!("hello was not valid JSON: {}", err))
    })?;
    message.validate()?;

    match message {
        ClientMessage::Hello {
            window, window_id, ..
        } => Ok((window_id, window)),
        ClientMessage::Forward { .. } => Err(ErrorInfo::new(
            "hello_required",
            "first message must be hello",
        )),
    }
}

// Registration and the seed write share one dispatcher lock so no broadcast
// can slip between the snapshot and the window joining the fanout.
fn seed_window(runtime: &HostRuntime, window_id: String, kind: WindowKind, stream: UnixStream) {
    let dispatcher = match runtime.dispatcher.lock() {
        Ok(dispatcher) => dispatcher,
        Err(_) => {
            warn!("Host dispatcher lock poisoned; dropping window");
            return;
        }
    };

    let seed = HostMessage::Seed {
        protocol_version: PROTOCOL_VERSION,
        state: dispatcher.store().state().clone(),
    };
    let line = match encode_line(&seed) {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, "Failed to encode seed");
            return;
        }
    };

    if let Ok(mut registry) = runtime.registry.lock() {
        registry.register(WindowHandle::new(window_id.clone(), kind, stream));
        registry.send_line_to(&window_id, &line);
    }
}

fn send_error(runtime: &HostRuntime, window_id: &str, error: ErrorInfo) {
    if let Ok(mut registry) = runtime.registry.lock() {
        registry.send_error(window_id, error);
    }
}

fn write_error(stream: &mut UnixStream, error: ErrorInfo) {
    if let Ok(line) = encode_line(&HostMessage::Error { error }) {
        let _ = stream.write_all(&line);
        let _ = stream.flush();
    }
}

fn read_message(reader: &mut BufReader<UnixStream>) -> Result<Option<Vec<u8>>, ErrorInfo> {
    loop {
        let mut buffer = Vec::new();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => {
                if buffer.len() > MAX_MESSAGE_BYTES {
                    return Err(ErrorInfo::new(
                        "request_too_large",
                        "message exceeded maximum size",
                    ));
                }
                while buffer.last().map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
                    buffer.pop();
                }
                if buffer.is_empty() {
                    continue;
                }
                return Ok(Some(buffer));
            }
            Err(err) => {
                return Err(ErrorInfo::new(
                    "read_error",
                    format!("failed to read message: {}", err),
                ));
            }
        }
    }
}
