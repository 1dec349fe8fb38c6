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

//! Logging
//!
//! JSON lines into daily rolling files under the data directory, plus a
//! human readable console layer on stderr (stdout is left alone so the UI
//! can own the terminal when it spawns the core).

use anyhow::Result;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logger configuration
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub file_prefix: String,
    pub level: Level,
    pub console_output: bool,
    pub file_output: bool,
    pub rotation: Rotation,
}

impl LoggerConfig {
    pub fn in_dir(log_dir: PathBuf) -> Self {
        Self {
            log_dir,
            file_prefix: "fedideck".to_string(),
            level: Level::INFO,
            console_output: true,
            file_output: true,
            rotation: Rotation::DAILY,
        }
    }

    /// Filter used when `RUST_LOG` is not set
    fn default_filter(&self) -> Result<EnvFilter> {
        Ok(EnvFilter::new(format!("fedideck_core={}", self.level))
            .add_directive(format!("ipc={}", self.level).parse()?)
            .add_directive(format!("api={}", self.level).parse()?)
            .add_directive(format!("streaming={}", self.level).parse()?)
            .add_directive("megalodon=warn".parse()?))
    }
}

pub struct Logger;

impl Logger {
    pub fn init_with_config(config: LoggerConfig) -> Result<()> {
        if config.file_output {
            std::fs::create_dir_all(&config.log_dir)?;
        }

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => config.default_filter()?,
        };

        let file_layer = config.file_output.then(|| {
            let appender =
                RollingFileAppender::new(config.rotation.clone(), &config.log_dir, &config.file_prefix);
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .json()
        });

        let console_layer = config.console_output.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
        });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()?;

        Ok(())
    }
}

/// Log a call to the instance; pass the elapsed milliseconds once it finished
#[macro_export]
macro_rules! log_api_call {
    ($method:expr, $endpoint:expr) => {
        tracing::debug!(
            target: "api",
            method = $method,
            endpoint = $endpoint,
            "API call started"
        )
    };
    ($method:expr, $endpoint:expr, $duration:expr) => {
        tracing::info!(
            target: "api",
            method = $method,
            endpoint = $endpoint,
            duration_ms = $duration,
            "API call completed"
        )
    };
}

#[macro_export]
macro_rules! log_ipc {
    (request, $method:expr, $id:expr) => {
        tracing::debug!(
            target: "ipc",
            direction = "request",
            method = $method,
            id = $id,
            "IPC request received"
        )
    };
    (response, $method:expr, $id:expr, $success:expr) => {
        tracing::debug!(
            target: "ipc",
            direction = "response",
            method = $method,
            id = $id,
            success = $success,
            "IPC response sent"
        )
    };
    (event, $event:expr) => {
        tracing::trace!(
            target: "ipc",
            direction = "event",
            event = $event,
            "IPC event sent"
        )
    };
}

#[macro_export]
macro_rules! log_stream {
    (connected, $account:expr, $stream:expr) => {
        tracing::info!(
            target: "streaming",
            event = "connected",
            account = $account,
            stream = $stream,
            "Stream connected"
        )
    };
    (disconnected, $account:expr, $stream:expr, $reason:expr) => {
        tracing::warn!(
            target: "streaming",
            event = "disconnected",
            account = $account,
            stream = $stream,
            reason = $reason,
            "Stream disconnected"
        )
    };
    (message, $stream:expr, $msg_type:expr) => {
        tracing::trace!(
            target: "streaming",
            event = "message",
            stream = $stream,
            message_type = $msg_type,
            "Stream message received"
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let config = LoggerConfig::in_dir(PathBuf::from("/tmp/fedideck-logs"));
        assert!(config.default_filter().is_ok());
        assert_eq!(config.file_prefix, "fedideck");
    }
}
