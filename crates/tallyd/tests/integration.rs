//! Integration tests for tallyd
//!
//! These tests verify the end-to-end behavior of the service: whole
//! conversations through the registry, and the same conversation driven
//! over the Unix socket by an IPC client.

use chrono::Local;
use std::time::Duration;
use tally_api::{
    Command, ErrorCode, EventPayload, Request, Response, ResponsePayload, ResponseResult,
    SessionState,
};
use tally_config::SettlementConfig;
use tally_core::{CoreEvent, SessionError, SessionRegistry};
use tally_ipc::IpcClient;
use tally_util::ChatId;
use tallyd::Service;
use tempfile::tempdir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::oneshot;

fn rules(max_participants: Option<u32>) -> SettlementConfig {
    SettlementConfig {
        max_participants,
        ..SettlementConfig::default()
    }
}

fn messages_of(response: Response) -> Vec<String> {
    match response.result {
        ResponseResult::Ok(ResponsePayload::Replies { messages, .. }) => messages,
        other => panic!("Expected replies, got {:?}", other),
    }
}

// ============================================================================
// Registry conversations
// ============================================================================

#[test]
fn test_full_conversation() {
    let mut registry = SessionRegistry::default();
    let chat = ChatId::new("weekend");

    let greeting = registry.start(&chat, Local::now());
    assert!(greeting.replies[0].contains("Сколько человек участвует?"));

    let prompt = registry.deliver_text(&chat, "3").unwrap();
    assert!(prompt.replies[0].starts_with("Отлично!"));

    let report = registry
        .deliver_text(&chat, "Вася: 1000\nПетя: 500\nМаша: 600")
        .unwrap();

    assert!(report.error.is_none());
    let text = &report.replies[0];
    assert!(text.contains("💸 Общая сумма затрат: 2100.00 ₽"));
    assert!(text.contains("🧮 Cумма на одного участника: 700.00 ₽"));
    assert!(text.contains("Петя → Вася: 200.00 ₽"));
    assert!(text.contains("Маша → Вася: 100.00 ₽"));
    assert!(matches!(
        report.event,
        Some(CoreEvent::SessionSettled {
            participants: 3,
            transfer_count: 2,
            ..
        })
    ));
    assert_eq!(registry.active_sessions(), 0);
}

#[test]
fn test_corrections_keep_progress() {
    let mut registry = SessionRegistry::default();
    let chat = ChatId::new("weekend");
    registry.start(&chat, Local::now());

    let d = registry.deliver_text(&chat, "abc").unwrap();
    assert!(matches!(d.error, Some(SessionError::InvalidNumber { .. })));

    let d = registry.deliver_text(&chat, "1").unwrap();
    assert!(matches!(
        d.error,
        Some(SessionError::TooFewParticipants { got: 1, min: 2 })
    ));
    assert_eq!(
        registry.session(&chat).map(|s| s.state()),
        Some(SessionState::AwaitingCount)
    );

    registry.deliver_text(&chat, " 3 ").unwrap();

    let d = registry
        .deliver_text(&chat, "Вася: 1000\nПетя: 500")
        .unwrap();
    assert!(matches!(
        d.error,
        Some(SessionError::CountMismatch {
            expected: 3,
            got: 2
        })
    ));
    let session = registry.session(&chat).unwrap();
    assert_eq!(session.state(), SessionState::AwaitingExpenses);
    assert_eq!(session.expected_participants(), Some(3));

    let d = registry
        .deliver_text(&chat, "Вася: 1000\nПетя: 500\nМаша: 600")
        .unwrap();
    assert!(d.error.is_none());
    assert!(registry.session(&chat).is_none());
}

#[test]
fn test_even_split() {
    let mut registry = SessionRegistry::default();
    let chat = ChatId::new("lunch");
    registry.start(&chat, Local::now());
    registry.deliver_text(&chat, "2").unwrap();

    let d = registry.deliver_text(&chat, "A: 500\nB: 500").unwrap();

    assert!(d.replies[0].contains("500.00 ₽"));
    assert!(d.replies[0].contains("никто никому не должен"));
    assert!(matches!(
        d.event,
        Some(CoreEvent::SessionSettled {
            transfer_count: 0,
            ..
        })
    ));
}

#[test]
fn test_configured_maximum() {
    let mut registry = SessionRegistry::new(rules(Some(4)));
    let chat = ChatId::new("party");
    registry.start(&chat, Local::now());

    let d = registry.deliver_text(&chat, "12").unwrap();

    assert!(matches!(
        d.error,
        Some(SessionError::TooManyParticipants { got: 12, max: 4 })
    ));
    assert_eq!(
        registry.session(&chat).map(|s| s.state()),
        Some(SessionState::AwaitingCount)
    );
}

// ============================================================================
// Over the socket
// ============================================================================

#[tokio::test]
async fn test_conversation_over_ipc() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("tallyd.sock");

    let service = Service::new(SettlementConfig::default(), &socket_path)
        .await
        .unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(service.run(async move {
        let _ = stop_rx.await;
    }));

    let mut events = IpcClient::connect(&socket_path)
        .await
        .unwrap()
        .subscribe()
        .await
        .unwrap();
    let mut client = IpcClient::connect(&socket_path).await.unwrap();
    let chat = ChatId::new("trip");

    let hint = client
        .send(Command::Deliver {
            chat_id: chat.clone(),
            text: "hello".into(),
        })
        .await
        .unwrap();
    assert_eq!(
        messages_of(hint),
        vec!["Чтобы начать расчет, отправь /start".to_string()]
    );

    let greeting = client
        .send(Command::Start {
            chat_id: chat.clone(),
        })
        .await
        .unwrap();
    assert_eq!(messages_of(greeting).len(), 1);

    client
        .send(Command::Deliver {
            chat_id: chat.clone(),
            text: "3".into(),
        })
        .await
        .unwrap();

    let session = client
        .send(Command::GetSession {
            chat_id: chat.clone(),
        })
        .await
        .unwrap();
    match session.result {
        ResponseResult::Ok(ResponsePayload::Session(Some(view))) => {
            assert_eq!(view.state, SessionState::AwaitingExpenses);
            assert_eq!(view.expected_participants, Some(3));
        }
        other => panic!("Expected session view, got {:?}", other),
    }

    let report = client
        .send(Command::Deliver {
            chat_id: chat.clone(),
            text: "Вася: 1000\nПетя: 500\nМаша: 600".into(),
        })
        .await
        .unwrap();
    let report = messages_of(report);
    assert!(report[0].contains("Петя → Вася: 200.00 ₽"));

    let started = events.next().await.unwrap();
    assert!(matches!(started.payload, EventPayload::SessionStarted { .. }));
    let settled = events.next().await.unwrap();
    match settled.payload {
        EventPayload::SessionSettled {
            chat_id,
            total,
            average,
            transfer_count,
            ..
        } => {
            assert_eq!(chat_id, chat);
            assert_eq!(total, 2100.0);
            assert_eq!(average, 700.0);
            assert_eq!(transfer_count, 2);
        }
        other => panic!("Expected SessionSettled, got {:?}", other),
    }

    stop_tx.send(()).unwrap();
    let shutdown = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(shutdown.payload, EventPayload::Shutdown));

    handle.await.unwrap().unwrap();
    assert!(!socket_path.exists());
}

#[tokio::test]
async fn test_unsupported_api_version() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("tallyd.sock");

    let service = Service::new(SettlementConfig::default(), &socket_path)
        .await
        .unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(service.run(async move {
        let _ = stop_rx.await;
    }));

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request = Request::new(5, Command::Ping);
    request.api_version = 99;
    let line = format!("{}\n", serde_json::to_string(&request).unwrap());
    write_half.write_all(line.as_bytes()).await.unwrap();

    let mut reply = String::new();
    reader.read_line(&mut reply).await.unwrap();
    let response: Response = serde_json::from_str(reply.trim()).unwrap();

    assert_eq!(response.request_id, 5);
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::UnsupportedVersion),
        other => panic!("Expected error, got {:?}", other),
    }

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
