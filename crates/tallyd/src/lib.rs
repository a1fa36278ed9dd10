//! tallyd service
//!
//! Wires the session registry to the IPC server:
//! - requests from chat transports are routed to the registry
//! - replies go back to the requesting client
//! - lifecycle changes are broadcast to subscribers

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tally_api::{
    API_VERSION, Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, Response,
    ResponsePayload,
};
use tally_config::SettlementConfig;
use tally_core::{CoreEvent, Dispatch, SessionRegistry};
use tally_ipc::{IpcServer, ServerMessage};
use tally_util::{ChatId, ClientId, TallyError};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Time given to connection writers to flush the shutdown event
const SHUTDOWN_FLUSH: Duration = Duration::from_millis(100);

/// Main service state
pub struct Service {
    registry: Arc<Mutex<SessionRegistry>>,
    ipc: Arc<IpcServer>,
    socket_path: PathBuf,
}

impl Service {
    /// Build the registry and bind the IPC socket
    pub async fn new(rules: SettlementConfig, socket_path: impl AsRef<Path>) -> Result<Self> {
        let socket_path = socket_path.as_ref().to_path_buf();
        let registry = SessionRegistry::new(rules);

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to bind socket {:?}", socket_path))?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        Ok(Self {
            registry: Arc::new(Mutex::new(registry)),
            ipc: Arc::new(ipc),
            socket_path,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut ipc_messages = self
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = self.ipc.clone();
        let accept_handle = tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        tokio::pin!(shutdown);

        info!("Service running");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(&self.registry, &self.ipc, msg).await;
                }
            }
        }

        info!("Shutting down tallyd");

        let dropped = self.registry.lock().await.clear();
        if dropped > 0 {
            info!(sessions = dropped, "Discarding unfinished sessions");
        }

        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        tokio::time::sleep(SHUTDOWN_FLUSH).await;

        accept_handle.abort();
        self.ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_ipc_message(
        registry: &Arc<Mutex<SessionRegistry>>,
        ipc: &Arc<IpcServer>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let response = if request.api_version != API_VERSION {
                    warn!(
                        client_id = %client_id,
                        got = request.api_version,
                        expected = API_VERSION,
                        "Unsupported API version"
                    );
                    Response::error(
                        request.request_id,
                        ErrorInfo::new(
                            ErrorCode::UnsupportedVersion,
                            format!(
                                "API version {} not supported (expected {})",
                                request.api_version, API_VERSION
                            ),
                        ),
                    )
                } else {
                    let (response, event) =
                        handle_command(registry, &client_id, request.request_id, request.command)
                            .await;
                    if let Some(event) = event {
                        ipc.broadcast_event(Event::new(event_payload(event)));
                    }
                    response
                };

                if let Err(e) = ipc.send_response(&client_id, response).await {
                    debug!(client_id = %client_id, error = %e, "Client gone before response");
                }
            }

            ServerMessage::ClientConnected { client_id } => {
                info!(client_id = %client_id, "Client connected");
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
            }
        }
    }
}

/// Execute one command against the registry.
///
/// Returns the response for the caller plus the lifecycle event to broadcast,
/// if any.
pub async fn handle_command(
    registry: &Mutex<SessionRegistry>,
    client_id: &ClientId,
    request_id: u64,
    command: Command,
) -> (Response, Option<CoreEvent>) {
    let now = tally_util::now();

    match command {
        Command::Start { chat_id } => {
            let chat_id = match require_chat(chat_id) {
                Ok(chat_id) => chat_id,
                Err(e) => return (error_response(request_id, &e), None),
            };
            let dispatch = registry.lock().await.start(&chat_id, now);
            replies(request_id, dispatch)
        }

        Command::Deliver { chat_id, text } => {
            let chat_id = match require_chat(chat_id) {
                Ok(chat_id) => chat_id,
                Err(e) => return (error_response(request_id, &e), None),
            };
            let mut registry = registry.lock().await;
            match registry.deliver_text(&chat_id, &text) {
                Ok(dispatch) => replies(request_id, dispatch),
                Err(e) => no_session_hint(&registry, request_id, chat_id, &e),
            }
        }

        Command::Cancel { chat_id } => {
            let chat_id = match require_chat(chat_id) {
                Ok(chat_id) => chat_id,
                Err(e) => return (error_response(request_id, &e), None),
            };
            let mut registry = registry.lock().await;
            match registry.cancel(&chat_id) {
                Ok(dispatch) => replies(request_id, dispatch),
                Err(e) => no_session_hint(&registry, request_id, chat_id, &e),
            }
        }

        Command::GetSession { chat_id } => {
            let view = registry.lock().await.session(&chat_id).map(|s| s.to_view());
            (
                Response::success(request_id, ResponsePayload::Session(view)),
                None,
            )
        }

        Command::GetHealth => {
            let active_sessions = registry.lock().await.active_sessions();
            let health = HealthStatus {
                live: true,
                ready: true,
                active_sessions,
            };
            (
                Response::success(request_id, ResponsePayload::Health(health)),
                None,
            )
        }

        Command::SubscribeEvents => {
            debug!(client_id = %client_id, "Client subscribed to events");
            (
                Response::success(
                    request_id,
                    ResponsePayload::Subscribed {
                        client_id: client_id.clone(),
                    },
                ),
                None,
            )
        }

        Command::Ping => (Response::success(request_id, ResponsePayload::Pong), None),
    }
}

fn require_chat(chat_id: ChatId) -> Result<ChatId, TallyError> {
    if chat_id.as_str().trim().is_empty() {
        return Err(TallyError::invalid_request("chat_id must not be empty"));
    }
    Ok(chat_id)
}

fn replies(request_id: u64, dispatch: Dispatch) -> (Response, Option<CoreEvent>) {
    if let Some(error) = &dispatch.error {
        debug!(chat_id = %dispatch.chat_id, error = %error, "Input re-prompted");
    }
    (
        Response::replies(request_id, dispatch.chat_id, dispatch.replies),
        dispatch.event,
    )
}

/// Text or cancel for a chat without a session gets a hint, not an error
fn no_session_hint(
    registry: &SessionRegistry,
    request_id: u64,
    chat_id: ChatId,
    error: &TallyError,
) -> (Response, Option<CoreEvent>) {
    match error {
        TallyError::NoActiveSession(_) => {
            debug!(chat_id = %chat_id, "No active session, sending hint");
            let hint = registry.conversation().messages.no_session();
            (Response::replies(request_id, chat_id, vec![hint]), None)
        }
        other => (error_response(request_id, other), None),
    }
}

fn error_response(request_id: u64, error: &TallyError) -> Response {
    Response::error(request_id, ErrorInfo::from(error))
}

/// Map a registry event onto the wire
pub fn event_payload(event: CoreEvent) -> EventPayload {
    match event {
        CoreEvent::SessionStarted { chat_id } => EventPayload::SessionStarted { chat_id },
        CoreEvent::SessionSettled {
            chat_id,
            participants,
            total,
            average,
            transfer_count,
        } => EventPayload::SessionSettled {
            chat_id,
            participants,
            total,
            average,
            transfer_count,
        },
        CoreEvent::SessionCancelled { chat_id } => EventPayload::SessionCancelled { chat_id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_api::ResponseResult;

    fn registry() -> Mutex<SessionRegistry> {
        Mutex::new(SessionRegistry::default())
    }

    fn messages_of(response: Response) -> Vec<String> {
        match response.result {
            ResponseResult::Ok(ResponsePayload::Replies { messages, .. }) => messages,
            other => panic!("Expected replies, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_chat_id_is_invalid() {
        let registry = registry();
        let (response, event) = handle_command(
            &registry,
            &ClientId::new(),
            1,
            Command::Start {
                chat_id: ChatId::new("  "),
            },
        )
        .await;

        assert!(event.is_none());
        match response.result {
            ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::InvalidRequest),
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn text_without_session_gets_hint() {
        let registry = registry();
        let (response, event) = handle_command(
            &registry,
            &ClientId::new(),
            4,
            Command::Deliver {
                chat_id: ChatId::new("trip"),
                text: "3".into(),
            },
        )
        .await;

        assert!(event.is_none());
        assert_eq!(response.request_id, 4);
        assert_eq!(
            messages_of(response),
            vec!["Чтобы начать расчет, отправь /start".to_string()]
        );
    }

    #[tokio::test]
    async fn start_emits_started_event() {
        let registry = registry();
        let (response, event) = handle_command(
            &registry,
            &ClientId::new(),
            1,
            Command::Start {
                chat_id: ChatId::new("trip"),
            },
        )
        .await;

        assert_eq!(messages_of(response).len(), 1);
        assert_eq!(
            event.map(event_payload).map(|p| matches!(p, EventPayload::SessionStarted { .. })),
            Some(true)
        );
    }

    #[tokio::test]
    async fn health_counts_sessions() {
        let registry = registry();
        let client = ClientId::new();
        for chat in ["a", "b"] {
            handle_command(
                &registry,
                &client,
                1,
                Command::Start {
                    chat_id: ChatId::new(chat),
                },
            )
            .await;
        }

        let (response, _) = handle_command(&registry, &client, 2, Command::GetHealth).await;
        match response.result {
            ResponseResult::Ok(ResponsePayload::Health(health)) => {
                assert!(health.live && health.ready);
                assert_eq!(health.active_sessions, 2);
            }
            other => panic!("Expected health, got {:?}", other),
        }
    }

    #[test]
    fn settled_event_keeps_totals() {
        let payload = event_payload(CoreEvent::SessionSettled {
            chat_id: ChatId::new("trip"),
            participants: 3,
            total: 2100.0,
            average: 700.0,
            transfer_count: 2,
        });

        assert!(matches!(
            payload,
            EventPayload::SessionSettled {
                participants: 3,
                transfer_count: 2,
                ..
            }
        ));
    }
}
