//! Messages exchanged over the host socket.
//!
//! One persistent duplex connection per window, newline-delimited JSON both
//! ways. The window opens with `hello`, the host answers with `seed`, and
//! from then on the window sends `forward` while the host streams `replay`.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::state::RootState;
use crate::PROTOCOL_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Tracker,
    Count,
    Settings,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Tracker => "tracker",
            WindowKind::Count => "count",
            WindowKind::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello {
        protocol_version: u32,
        window: WindowKind,
        window_id: String,
        sent_at: String,
    },
    Forward {
        action: Action,
        sent_at: String,
    },
}

impl ClientMessage {
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        match self {
            ClientMessage::Hello {
                protocol_version,
                window_id,
                sent_at,
                ..
            } => {
                if *protocol_version != PROTOCOL_VERSION {
                    return Err(ErrorInfo::new(
                        "protocol_mismatch",
                        "unsupported protocol version",
                    ));
                }
                if window_id.trim().is_empty() {
                    return Err(ErrorInfo::new("invalid_window_id", "window_id is required"));
                }
                if window_id.len() > 128 {
                    return Err(ErrorInfo::new(
                        "invalid_window_id",
                        "window_id must be 128 characters or fewer",
                    ));
                }
                require_rfc3339(sent_at)
            }
            ClientMessage::Forward { action, sent_at } => {
                action.validate()?;
                require_rfc3339(sent_at)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostMessage {
    Seed {
        protocol_version: u32,
        state: RootState,
    },
    Replay {
        action: Action,
    },
    Error {
        error: ErrorInfo,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

fn require_rfc3339(value: &str) -> Result<(), ErrorInfo> {
    if DateTime::parse_from_rfc3339(value).is_err() {
        return Err(ErrorInfo::new("invalid_timestamp", "sent_at must be RFC3339"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> ClientMessage {
        ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            window: WindowKind::Tracker,
            window_id: "win-1".to_string(),
            sent_at: "2026-02-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn validates_hello() {
        assert!(hello().validate().is_ok());
    }

    #[test]
    fn rejects_protocol_mismatch() {
        let message = ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION + 1,
            window: WindowKind::Count,
            window_id: "win-1".to_string(),
            sent_at: "2026-02-01T12:00:00Z".to_string(),
        };
        assert_eq!(message.validate().unwrap_err().code, "protocol_mismatch");
    }

    #[test]
    fn rejects_blank_window_id() {
        let message = ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            window: WindowKind::Settings,
            window_id: "  ".to_string(),
            sent_at: "2026-02-01T12:00:00Z".to_string(),
        };
        assert_eq!(message.validate().unwrap_err().code, "invalid_window_id");
    }

    #[test]
    fn rejects_bad_timestamp() {
        let message = ClientMessage::Forward {
            action: Action::SetCellSize { size: 48 },
            sent_at: "not-a-time".to_string(),
        };
        assert_eq!(message.validate().unwrap_err().code, "invalid_timestamp");
    }

    #[test]
    fn forward_validates_inner_action() {
        let message = ClientMessage::Forward {
            action: Action::SetCellSize { size: 0 },
            sent_at: "2026-02-01T12:00:00Z".to_string(),
        };
        assert_eq!(message.validate().unwrap_err().code, "invalid_cell_size");
    }

    #[test]
    fn messages_round_trip_as_tagged_json() {
        let line = serde_json::to_string(&hello()).expect("serialize");
        assert!(line.contains(r#""kind":"hello""#));
        assert!(line.contains(r#""window":"tracker""#));

        let replay = HostMessage::Replay {
            action: Action::SetCellSize { size: 64 },
        };
        let value = serde_json::to_value(&replay).expect("serialize");
        assert_eq!(value["kind"], serde_json::json!("replay"));
        assert_eq!(value["action"]["type"], serde_json::json!("SET_CELL_SIZE"));

        let parsed: HostMessage =
            serde_json::from_value(value).expect("deserialize");
        match parsed {
            HostMessage::Replay { action } => {
                assert_eq!(action, Action::SetCellSize { size: 64 })
            }
            other => panic!("expected replay, got {:?}", other),
        }
    }
}
