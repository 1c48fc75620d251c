//! Controller listener
//!
//! Reads controller lines from stdin on a dedicated thread and forwards
//! the resulting commands to the dispatcher.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::board::BoardCommand;

use super::buttons::{parse_line, HeldButtons};

/// Listens for button edges and feeds the dispatcher
pub struct InputListener {
    command_tx: mpsc::Sender<BoardCommand>,
    running: Arc<AtomicBool>,
}

impl InputListener {
    /// Create a new input listener
    pub fn new(command_tx: mpsc::Sender<BoardCommand>) -> Self {
        Self {
            command_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start reading stdin on a dedicated thread
    ///
    /// The thread runs until `stop()` is called and the next line arrives,
    /// stdin closes, or the dispatcher goes away.
    pub fn start(&self) -> Result<(), InputError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(InputError::AlreadyRunning);
        }

        let command_tx = self.command_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("input-listener".to_string())
            .spawn(move || {
                info!("input listener thread started");

                let stdin = std::io::stdin();
                if let Err(e) = run_input_loop(stdin.lock(), &command_tx, &running) {
                    error!(?e, "input listener error");
                }

                running.store(false, Ordering::SeqCst);
                info!("input listener thread stopped");
            })
            .map_err(|e| InputError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    /// Stop the input listener
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the listener is currently running
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur in the input listener
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input listener is already running")]
    AlreadyRunning,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("malformed controller line: {0:?}")]
    Malformed(String),

    #[error("failed to read controller input")]
    Read(#[from] std::io::Error),
}

/// Read lines until EOF, a stop request, or a closed channel
fn run_input_loop<R: BufRead>(
    reader: R,
    command_tx: &mpsc::Sender<BoardCommand>,
    running: &AtomicBool,
) -> Result<(), InputError> {
    let mut held = HeldButtons::default();

    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let action = match parse_line(&line?) {
            Ok(Some(action)) => action,
            Ok(None) => continue,
            Err(e) => {
                warn!(%e, "ignoring controller line");
                continue;
            }
        };

        let command = held.apply(action);
        debug!(?command, "button edge");

        if command_tx.blocking_send(command).is_err() {
            warn!("failed to send button command - channel closed?");
            break;
        }
    }

    Ok(())
}
