//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::board::ButtonCombo;
use crate::events::BoardEvent;

/// Requests from clients to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current board status
    GetStatus,

    /// Press buttons, as if held together on the controller
    Press { buttons: ButtonCombo },

    /// Release buttons
    Release { buttons: ButtonCombo },

    /// Ping to check connectivity
    Ping,
}

/// Responses from daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current board status
    Status(BoardStatus),

    /// Button command queued for the dispatcher
    Accepted,

    /// Pong response to ping
    Pong,

    /// Error response
    Error { code: String, message: String },
}

/// Board status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardStatus {
    /// Daemon version
    pub version: String,

    /// Board name from the board file
    pub board: String,

    /// Number of button combos with a sound
    pub sounds: usize,

    /// Most recent board event
    pub last_event: Option<BoardEvent>,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// When the board was loaded, seconds since the Unix epoch
    pub busy_time: u64,
}

impl Default for BoardStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            board: String::new(),
            sounds: 0,
            last_event: None,
            uptime_secs: 0,
            busy_time: 0,
        }
    }
}
