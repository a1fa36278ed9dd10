//! tally-chat - talk to tallyd from a terminal
//!
//! Each terminal session is one chat. `/start` and `/cancel` are sent as
//! commands; anything else is collected until an empty line and delivered as
//! a single multi-line message, so a whole expense list can be pasted at once.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tally_api::{Command, ResponsePayload, ResponseResult};
use tally_ipc::IpcClient;
use tally_util::{ChatId, default_socket_path};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// tally-chat - Terminal front-end for the tally settlement service
#[derive(Parser, Debug)]
#[command(name = "tally-chat")]
#[command(about = "Terminal front-end for the tally settlement service", long_about = None)]
struct Args {
    /// Socket path (or set TALLY_SOCKET env var)
    #[arg(short, long, env = "TALLY_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    /// Chat identifier this terminal speaks as
    #[arg(long, default_value = "terminal")]
    chat: String,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

/// Turns terminal lines into commands for one chat
struct Composer {
    chat_id: ChatId,
    pending: Vec<String>,
}

impl Composer {
    fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            pending: Vec::new(),
        }
    }

    /// Feed one line; returns a command once one is complete.
    ///
    /// `/start` and `/cancel` are only recognized at the beginning of a
    /// message.
    fn push_line(&mut self, line: &str) -> Option<Command> {
        let trimmed = line.trim();

        if self.pending.is_empty() {
            match trimmed {
                "/start" => {
                    return Some(Command::Start {
                        chat_id: self.chat_id.clone(),
                    });
                }
                "/cancel" => {
                    return Some(Command::Cancel {
                        chat_id: self.chat_id.clone(),
                    });
                }
                "" => return None,
                _ => {}
            }
        }

        if trimmed.is_empty() {
            return self.finish();
        }

        self.pending.push(line.to_string());
        None
    }

    /// Deliver whatever is pending
    fn finish(&mut self) -> Option<Command> {
        if self.pending.is_empty() {
            return None;
        }
        let text = self.pending.join("\n");
        self.pending.clear();
        Some(Command::Deliver {
            chat_id: self.chat_id.clone(),
            text,
        })
    }
}

async fn send(client: &mut IpcClient, command: Command) -> Result<()> {
    debug!(command = ?command, "Sending");
    let response = client
        .send(command)
        .await
        .context("Lost connection to tallyd")?;

    match response.result {
        ResponseResult::Ok(ResponsePayload::Replies { messages, .. }) => {
            for message in messages {
                println!("{}\n", message.trim_end());
            }
        }
        ResponseResult::Ok(other) => {
            debug!(payload = ?other, "Unexpected payload");
        }
        ResponseResult::Err(e) => {
            eprintln!("error ({:?}): {}", e.code, e.message);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut client = IpcClient::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to tallyd at {:?}", args.socket))?;

    println!("Connected as chat '{}'. Send /start to begin.\n", args.chat);

    let mut composer = Composer::new(ChatId::new(args.chat));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if let Some(command) = composer.push_line(&line) {
            send(&mut client, command).await?;
        }
    }

    if let Some(command) = composer.finish() {
        send(&mut client, command).await?;
    }

    Ok(())
}
