//! IPC server implementation

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_api::{Command, ErrorCode, ErrorInfo, Event, Request, Response};
use tally_util::ClientId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::{IpcError, IpcResult};

/// Capacity of the event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Message from a client connection to the service loop
#[derive(Debug)]
pub enum ServerMessage {
    Request {
        client_id: ClientId,
        request: Request,
    },
    ClientConnected {
        client_id: ClientId,
    },
    ClientDisconnected {
        client_id: ClientId,
    },
}

/// IPC Server
pub struct IpcServer {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    clients: Arc<RwLock<HashMap<ClientId, ClientHandle>>>,
    event_tx: broadcast::Sender<Event>,
    message_tx: mpsc::UnboundedSender<ServerMessage>,
    message_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<ServerMessage>>>>,
}

struct ClientHandle {
    response_tx: mpsc::UnboundedSender<String>,
    subscribed: bool,
}

impl IpcServer {
    /// Create a new IPC server
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            listener: None,
            clients: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            message_tx,
            message_rx: Arc::new(Mutex::new(Some(message_rx))),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket, replacing a stale one
    pub async fn start(&mut self) -> IpcResult<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner and group only
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o660))?;

        info!(path = %self.socket_path.display(), "IPC server listening");

        self.listener = Some(listener);

        Ok(())
    }

    /// Get receiver for server messages. Only the first caller gets it.
    pub async fn take_message_receiver(&self) -> Option<mpsc::UnboundedReceiver<ServerMessage>> {
        self.message_rx.lock().await.take()
    }

    /// Accept connections in a loop
    pub async fn run(&self) -> IpcResult<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| IpcError::ServerError("Server not started".into()))?;

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let client_id = ClientId::new();
                    info!(client_id = %client_id, "Client connected");
                    self.handle_client(stream, client_id).await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_client(&self, stream: UnixStream, client_id: ClientId) {
        let (read_half, write_half) = stream.into_split();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel::<String>();

        self.clients.write().await.insert(
            client_id.clone(),
            ClientHandle {
                response_tx: response_tx.clone(),
                subscribed: false,
            },
        );

        let _ = self.message_tx.send(ServerMessage::ClientConnected {
            client_id: client_id.clone(),
        });

        // Reader: one request per line
        let clients = self.clients.clone();
        let message_tx = self.message_tx.clone();
        let reader_id = client_id.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(client_id = %reader_id, "Client disconnected (EOF)");
                        break;
                    }
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }

                        match serde_json::from_str::<Request>(line) {
                            Ok(request) => {
                                if matches!(request.command, Command::SubscribeEvents) {
                                    let mut clients = clients.write().await;
                                    if let Some(handle) = clients.get_mut(&reader_id) {
                                        handle.subscribed = true;
                                    }
                                }

                                let _ = message_tx.send(ServerMessage::Request {
                                    client_id: reader_id.clone(),
                                    request,
                                });
                            }
                            Err(e) => {
                                warn!(client_id = %reader_id, error = %e, "Invalid request");
                                let response = Response::error(
                                    0,
                                    ErrorInfo::new(
                                        ErrorCode::InvalidRequest,
                                        format!("Malformed request: {}", e),
                                    ),
                                );
                                if let Ok(json) = serde_json::to_string(&response) {
                                    let _ = response_tx.send(json);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        debug!(client_id = %reader_id, error = %e, "Read error");
                        break;
                    }
                }
            }

            // Dropping the handle closes the writer's response channel
            clients.write().await.remove(&reader_id);
        });

        // Writer: responses plus events for subscribers
        let mut event_rx = self.event_tx.subscribe();
        let clients = self.clients.clone();
        let message_tx = self.message_tx.clone();
        let writer_id = client_id;
        tokio::spawn(async move {
            let mut writer = write_half;

            loop {
                let line = tokio::select! {
                    response = response_rx.recv() => match response {
                        Some(json) => json,
                        None => break,
                    },

                    event = event_rx.recv() => match event {
                        Ok(event) => {
                            let subscribed = clients
                                .read()
                                .await
                                .get(&writer_id)
                                .is_some_and(|h| h.subscribed);
                            if !subscribed {
                                continue;
                            }
                            match serde_json::to_string(&event) {
                                Ok(json) => json,
                                Err(e) => {
                                    warn!(error = %e, "Failed to serialize event");
                                    continue;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(client_id = %writer_id, skipped, "Client lagging, events dropped");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };

                let mut msg = line;
                msg.push('\n');
                if let Err(e) = writer.write_all(msg.as_bytes()).await {
                    debug!(client_id = %writer_id, error = %e, "Write error");
                    break;
                }
            }

            clients.write().await.remove(&writer_id);
            let _ = message_tx.send(ServerMessage::ClientDisconnected {
                client_id: writer_id,
            });
        });
    }

    /// Send a response to a specific client
    pub async fn send_response(&self, client_id: &ClientId, response: Response) -> IpcResult<()> {
        let json = serde_json::to_string(&response)?;

        let clients = self.clients.read().await;
        let handle = clients.get(client_id).ok_or(IpcError::ConnectionClosed)?;
        handle
            .response_tx
            .send(json)
            .map_err(|_| IpcError::ConnectionClosed)
    }

    /// Broadcast an event to all subscribed clients
    pub fn broadcast_event(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    /// Get connected client count
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Remove the socket file
    pub fn shutdown(&self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
