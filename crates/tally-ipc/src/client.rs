//! IPC client implementation

use std::path::Path;
use tally_api::{Command, Event, Request, Response, ResponseResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use crate::{IpcError, IpcResult};

/// IPC Client for connecting to tallyd
pub struct IpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_request_id: u64,
}

impl IpcClient {
    /// Connect to tallyd
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
        })
    }

    /// Send a command and wait for its response
    pub async fn send(&mut self, command: Command) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = Request::new(request_id, command);
        let mut json = serde_json::to_string(&request)?;
        json.push('\n');

        self.writer.write_all(json.as_bytes()).await?;

        let line = read_line(&mut self.reader).await?;
        let response: Response = serde_json::from_str(&line)?;

        if response.request_id != request_id {
            return Err(IpcError::InvalidMessage(format!(
                "Expected response to request {}, got {}",
                request_id, response.request_id
            )));
        }

        Ok(response)
    }

    /// Subscribe to events and consume this client to return an event stream
    pub async fn subscribe(mut self) -> IpcResult<EventStream> {
        let response = self.send(Command::SubscribeEvents).await?;

        if let ResponseResult::Err(e) = response.result {
            return Err(IpcError::ServerError(e.message));
        }

        Ok(EventStream {
            reader: self.reader,
        })
    }
}

/// Stream of events from tallyd
pub struct EventStream {
    reader: BufReader<OwnedReadHalf>,
}

impl EventStream {
    /// Wait for the next event
    pub async fn next(&mut self) -> IpcResult<Event> {
        let line = read_line(&mut self.reader).await?;
        let event: Event = serde_json::from_str(&line)?;
        Ok(event)
    }
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> IpcResult<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(IpcError::ConnectionClosed);
    }
    Ok(line.trim().to_string())
}
