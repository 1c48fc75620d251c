//! Unix domain socket server for IPC
//!
//! Lets other programs press and release buttons and query what the board
//! is doing. Button requests go through the same command channel as the
//! controller, so the dispatcher still sees one event at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::board::BoardCommand;
use crate::events::BoardEvent;

use super::protocol::{BoardStatus, Request, Response};

const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    command_tx: mpsc::Sender<BoardCommand>,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared server state
struct ServerState {
    status: BoardStatus,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        status: BoardStatus,
        command_tx: mpsc::Sender<BoardCommand>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path)
            .context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status,
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state,
            command_tx,
            shutdown_tx,
        })
    }

    /// Record the latest board event for status queries
    pub async fn set_last_event(&self, event: BoardEvent) {
        let mut state = self.state.write().await;
        state.status.last_event = Some(event);
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref()
            .context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let command_tx = self.command_tx.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, state, command_tx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        mut stream: UnixStream,
        state: Arc<RwLock<ServerState>>,
        command_tx: mpsc::Sender<BoardCommand>,
    ) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            let mut msg_buf = vec![0u8; len];
            stream.read_exact(&mut msg_buf).await?;

            let response = match serde_json::from_slice::<Request>(&msg_buf) {
                Ok(request) => {
                    debug!(?request, "received request");
                    Self::process_request(request, &state, &command_tx).await
                }
                Err(e) => Response::Error {
                    code: "bad_request".to_string(),
                    message: e.to_string(),
                },
            };

            Self::send_message(&mut stream, &response).await?;
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        state: &Arc<RwLock<ServerState>>,
        command_tx: &mpsc::Sender<BoardCommand>,
    ) -> Response {
        let command = match request {
            Request::Ping => return Response::Pong,

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                return Response::Status(state.status.clone());
            }

            Request::Press { buttons } => BoardCommand::Press(buttons),
            Request::Release { buttons } => BoardCommand::Release(buttons),
        };

        info!(?command, "button command via IPC");
        match command_tx.send(command).await {
            Ok(()) => Response::Accepted,
            Err(_) => Response::Error {
                code: "dispatcher_closed".to_string(),
                message: "the dispatcher is no longer running".to_string(),
            },
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ButtonCombo;

    fn state() -> Arc<RwLock<ServerState>> {
        Arc::new(RwLock::new(ServerState {
            status: BoardStatus {
                board: "office".to_string(),
                sounds: 3,
                ..BoardStatus::default()
            },
            start_time: std::time::Instant::now(),
        }))
    }

    #[test]
    fn test_ping() {
        let (tx, _rx) = mpsc::channel(1);
        let response = tokio_test::block_on(Server::process_request(Request::Ping, &state(), &tx));
        assert!(matches!(response, Response::Pong));
    }

    #[tokio::test]
    async fn test_status() {
        let (tx, _rx) = mpsc::channel(1);
        let response = Server::process_request(Request::GetStatus, &state(), &tx).await;
        match response {
            Response::Status(status) => {
                assert_eq!(status.board, "office");
                assert_eq!(status.sounds, 3);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_press_forwarded_to_dispatcher() {
        let (tx, mut rx) = mpsc::channel(4);
        let buttons = ButtonCombo::new([1, 2]);

        let response = Server::process_request(
            Request::Press { buttons: buttons.clone() },
            &state(),
            &tx,
        )
        .await;

        assert!(matches!(response, Response::Accepted));
        assert_eq!(rx.recv().await, Some(BoardCommand::Press(buttons)));
    }

    #[tokio::test]
    async fn test_closed_dispatcher() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let response = Server::process_request(
            Request::Release { buttons: ButtonCombo::new([1]) },
            &state(),
            &tx,
        )
        .await;

        assert!(matches!(response, Response::Error { ref code, .. } if code == "dispatcher_closed"));
    }

    #[tokio::test]
    async fn test_socket_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("board.sock");
        let (tx, mut rx) = mpsc::channel(4);
        let server = Server::new(&socket_path, BoardStatus::default(), tx).unwrap();

        let client = async {
            let mut stream = UnixStream::connect(&socket_path).await.unwrap();

            for request in [r#"{"type":"press","buttons":[4]}"#, "not json"] {
                stream.write_all(&(request.len() as u32).to_le_bytes()).await.unwrap();
                stream.write_all(request.as_bytes()).await.unwrap();

                let mut len_buf = [0u8; 4];
                stream.read_exact(&mut len_buf).await.unwrap();
                let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
                stream.read_exact(&mut body).await.unwrap();
                let response: Response = serde_json::from_slice(&body).unwrap();

                if request.starts_with('{') {
                    assert!(matches!(response, Response::Accepted));
                } else {
                    assert!(matches!(response, Response::Error { ref code, .. } if code == "bad_request"));
                }
            }
        };

        tokio::select! {
            result = server.run() => panic!("server exited: {:?}", result),
            _ = client => {}
        }

        assert_eq!(rx.recv().await, Some(BoardCommand::Press(ButtonCombo::new([4]))));
        server.shutdown().await;
        assert!(!socket_path.exists());
    }
}
