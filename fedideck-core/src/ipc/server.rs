// Fedideck - A multi-column Mastodon desktop client
// Copyright (C) 2025 Fedideck Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! IPC server on a Unix socket or a Windows named pipe

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::models::{error_codes, IpcError, IpcMessage};

use super::handler::MessageHandler;

/// Run the IPC server until a shutdown request arrives
pub async fn run_server(socket_path: &str, handler: Arc<MessageHandler>, tick: Duration) -> Result<()> {
    info!("Starting IPC server on {}", socket_path);

    let ticker = tokio::spawn(handler.clone().run_ticker(tick));

    #[cfg(windows)]
    let result = run_windows_pipe_server(socket_path, handler.clone()).await;

    #[cfg(not(windows))]
    let result = run_unix_socket_server(socket_path, handler.clone()).await;

    handler.shutdown();
    if let Err(e) = ticker.await {
        warn!("Ticker ended abnormally: {}", e);
    }
    result
}

#[cfg(windows)]
async fn run_windows_pipe_server(pipe_name: &str, handler: Arc<MessageHandler>) -> Result<()> {
    use tokio::net::windows::named_pipe::{PipeMode, ServerOptions};

    let mut shutdown = handler.shutdown_signal();
    let mut first = true;

    loop {
        let pipe = ServerOptions::new()
            .first_pipe_instance(first)
            .pipe_mode(PipeMode::Byte)
            .create(pipe_name)
            .context("Failed to create named pipe")?;
        first = false;

        info!("Waiting for client connection...");

        tokio::select! {
            result = pipe.connect() => {
                match result {
                    Ok(()) => {
                        info!("Client connected");
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(pipe, handler).await {
                                error!("Client handler error: {:#}", e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            }
            _ = shutdown.recv() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(not(windows))]
async fn run_unix_socket_server(socket_path: &str, handler: Arc<MessageHandler>) -> Result<()> {
    use tokio::net::UnixListener;

    // a stale socket from a crashed run blocks the bind
    let _ = std::fs::remove_file(socket_path);

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind Unix socket {}", socket_path))?;
    let mut shutdown = handler.shutdown_signal();

    info!("Listening on {}", socket_path);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        info!("Client connected");
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(stream, handler).await {
                                error!("Client handler error: {:#}", e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            }
            _ = shutdown.recv() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let _ = std::fs::remove_file(socket_path);
    Ok(())
}

async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, message: &IpcMessage) -> Result<()> {
    let line = serde_json::to_string(message)?;
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    debug!("Sent: {}", line);
    Ok(())
}

/// Answer one client's requests and forward every session event to it
async fn serve_client<S>(stream: S, handler: Arc<MessageHandler>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut events = handler.subscribe_events();
    let mut shutdown = handler.shutdown_signal();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Client disconnected");
                        break;
                    }
                    Err(e) => {
                        error!("Read error: {}", e);
                        break;
                    }
                };

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!("Received: {}", trimmed);

                let response = match serde_json::from_str::<IpcMessage>(trimmed) {
                    Ok(msg) => handler.handle_message(msg).await,
                    Err(e) => {
                        warn!("Failed to parse message: {}", e);
                        IpcMessage::response_err(
                            "unknown",
                            IpcError::new(error_codes::PARSE_ERROR, format!("Failed to parse message: {}", e)),
                        )
                    }
                };
                write_message(&mut writer, &response).await?;
            }
            event = events.recv() => {
                match event {
                    Ok(event) => write_message(&mut writer, &event).await?,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Client is {} events behind, skipping them", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preferences;
    use crate::store::SettingsStore;
    use serde_json::json;
    use tokio::io::duplex;
    use tokio_test::assert_ok;

    async fn connected_client() -> (
        tokio::io::Lines<BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>>,
        tokio::io::WriteHalf<tokio::io::DuplexStream>,
        Arc<MessageHandler>,
    ) {
        let store = assert_ok!(SettingsStore::in_memory().await);
        let handler = Arc::new(MessageHandler::new(store, Preferences::default()));
        let (client, server) = duplex(64 * 1024);
        tokio::spawn(serve_client(server, handler.clone()));

        let (reader, writer) = tokio::io::split(client);
        (BufReader::new(reader).lines(), writer, handler)
    }

    async fn read_message<R: AsyncRead + Unpin>(lines: &mut tokio::io::Lines<BufReader<R>>) -> IpcMessage {
        let line = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn requests_get_line_delimited_responses() {
        let (mut lines, mut writer, _handler) = connected_client().await;

        let request = IpcMessage::request("ping", None);
        assert_ok!(write_message(&mut writer, &request).await);

        let response = read_message(&mut lines).await;
        assert_eq!(response.id, request.id);
        assert_eq!(response.result.unwrap()["pong"], true);
    }

    #[tokio::test]
    async fn garbage_lines_get_parse_errors() {
        let (mut lines, mut writer, _handler) = connected_client().await;

        assert_ok!(writer.write_all(b"{not json\n\n").await);

        let response = read_message(&mut lines).await;
        assert_eq!(response.id, "unknown");
        assert_eq!(response.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn settings_requests_keep_their_order() {
        let (mut lines, mut writer, _handler) = connected_client().await;

        let set = IpcMessage::request("settings.set", Some(json!({ "key": "ui.layout", "value": "wide" })));
        let get = IpcMessage::request("settings.get", Some(json!({ "key": "ui.layout" })));
        assert_ok!(write_message(&mut writer, &set).await);
        assert_ok!(write_message(&mut writer, &get).await);

        assert_eq!(read_message(&mut lines).await.id, set.id);
        let response = read_message(&mut lines).await;
        assert_eq!(response.id, get.id);
        assert_eq!(response.result.unwrap()["value"], "wide");
    }

    #[tokio::test]
    async fn shutdown_closes_the_connection() {
        let (mut lines, mut writer, _handler) = connected_client().await;

        let request = IpcMessage::request("shutdown", None);
        assert_ok!(write_message(&mut writer, &request).await);

        let response = read_message(&mut lines).await;
        assert_eq!(response.result.unwrap()["status"], "shutting_down");
        assert!(lines.next_line().await.unwrap().is_none());
    }
}
