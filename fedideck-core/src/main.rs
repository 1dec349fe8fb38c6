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

//! Fedideck Core - headless backend for the Fedideck desktop client
//!
//! Runs as a background process next to the UI and talks to it over a local
//! socket using line-delimited JSON messages.

mod api;
mod config;
mod error;
mod feed;
mod history;
mod html;
mod ipc;
mod logger;
mod models;
mod session;
mod store;
mod streaming;

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use config::{CoreConfig, Preferences};
use ipc::MessageHandler;
use logger::{Logger, LoggerConfig};
use models::{methods, IpcMessage};
use store::SettingsStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = CoreConfig::from_env()?;
    Logger::init_with_config(LoggerConfig::in_dir(config.log_dir()))?;

    info!("Fedideck Core starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let store = SettingsStore::open(&config.database_path())
        .await
        .context("Failed to open settings database")?;
    let prefs = Preferences::load(&store).await?;
    let autologin = store
        .get_default_account()
        .await?
        .filter(|account| account.autologin);

    let handler = Arc::new(MessageHandler::new(store, prefs));

    if let Some(account) = autologin {
        info!("Logging in {} automatically", account.acct);
        let request = IpcMessage::request(methods::AUTH_LOGIN, Some(json!({ "account_id": account.id })));
        let response = handler.handle_message(request).await;
        if let Some(e) = response.error {
            warn!("Automatic login failed: {}", e.message);
        }
    }

    match ipc::run_server(&config.socket_path, handler, config.tick).await {
        Ok(()) => {
            info!("Fedideck Core shutting down gracefully");
        }
        Err(e) => {
            error!("Fatal error in IPC server: {:#}", e);
            return Err(e);
        }
    }

    Ok(())
}
