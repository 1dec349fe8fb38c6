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

//! IPC message handler

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::api::{is_token_rejected, normalize_url, MastodonClient, OAuthFlow, SocialApi};
use crate::config::{FeatureSet, Preferences, UI_PREFIX};
use crate::error::{CoreError, CoreResult};
use crate::history;
use crate::models::{
    error_codes, methods, IpcError, IpcMessage, LoginStatus, MediaUploadRequest, MessageType,
    NewPost, StatusAction, StatusEdit, StoredAccount, Visibility,
};
use crate::session::{ColumnSettings, Session, SessionEvent, WorkerMessage};
use crate::store::SettingsStore;
use crate::log_ipc;

/// Events buffered per client before a slow client starts missing some
const EVENT_BUFFER: usize = 1024;

struct ActiveSession {
    /// Tells results of a replaced session's workers apart
    generation: u64,
    session: Session,
}

/// Handles incoming IPC messages and routes them to the session, the store
/// or the OAuth flow
pub struct MessageHandler {
    store: SettingsStore,
    prefs: RwLock<Preferences>,
    oauth: OAuthFlow,
    active: Mutex<Option<ActiveSession>>,
    generation: AtomicU64,
    events: broadcast::Sender<IpcMessage>,
    shutdown_tx: broadcast::Sender<()>,
}

#[derive(Deserialize)]
struct VoteParams {
    status_id: String,
    poll_id: String,
    choices: Vec<u32>,
}

fn require(params: Option<&Value>) -> CoreResult<&Value> {
    params.ok_or_else(|| CoreError::InvalidParams("Missing params".to_string()))
}

fn str_param<'a>(params: Option<&'a Value>, key: &str) -> CoreResult<&'a str> {
    require(params)?
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::InvalidParams(format!("Missing {}", key)))
}

fn opt_str_param<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a str> {
    params.and_then(|p| p.get(key)).and_then(Value::as_str)
}

fn opt_index_param(params: Option<&Value>, key: &str) -> Option<usize> {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_u64)
        .map(|v| v as usize)
}

fn parse<T: DeserializeOwned>(params: Option<&Value>) -> CoreResult<T> {
    serde_json::from_value(require(params)?.clone())
        .map_err(|e| CoreError::InvalidParams(format!("Invalid params: {}", e)))
}

fn to_json<T: Serialize>(value: &T) -> CoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// "user" on a local instance becomes "user@host"
fn full_acct(acct: &str, instance_url: &str) -> String {
    if acct.contains('@') {
        return acct.to_string();
    }
    let host = instance_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    format!("{}@{}", acct, host)
}

impl MessageHandler {
    pub fn new(store: SettingsStore, prefs: Preferences) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            store,
            prefs: RwLock::new(prefs),
            oauth: OAuthFlow::new(),
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
            events,
            shutdown_tx,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<IpcMessage> {
        self.events.subscribe()
    }

    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    fn broadcast(&self, account_id: &str, events: Vec<SessionEvent>) {
        for event in events {
            log_ipc!(event, event.name());
            // nobody listening is fine
            let _ = self.events.send(event.to_ipc(account_id));
        }
    }

    /// Handle an incoming IPC message
    pub async fn handle_message(self: &Arc<Self>, msg: IpcMessage) -> IpcMessage {
        let method = msg.method.clone().unwrap_or_default();
        log_ipc!(request, method.as_str(), msg.id.as_str());

        let response = if msg.message_type != MessageType::Request {
            IpcMessage::response_err(
                &msg.id,
                IpcError::new(error_codes::INVALID_REQUEST, "Only requests are accepted"),
            )
        } else {
            match self.dispatch(&method, msg.params.as_ref()).await {
                Ok(value) => IpcMessage::response_ok(&msg.id, value),
                Err(e) => {
                    warn!("{} failed: {}", method, e);
                    IpcMessage::response_err(&msg.id, e.into())
                }
            }
        };

        log_ipc!(response, method.as_str(), msg.id.as_str(), !response.is_error());
        response
    }

    async fn dispatch(self: &Arc<Self>, method: &str, params: Option<&Value>) -> CoreResult<Value> {
        match method {
            // System
            methods::PING => Ok(json!({
                "pong": true,
                "timestamp": Utc::now().to_rfc3339()
            })),
            methods::SHUTDOWN => {
                info!("Shutdown requested via IPC");
                self.logout().await;
                self.shutdown();
                Ok(json!({ "status": "shutting_down" }))
            }

            // Authentication
            methods::AUTH_START => self.auth_start(params).await,
            methods::AUTH_CALLBACK => self.auth_callback(params).await,
            methods::AUTH_LOGIN => self.auth_login(params).await,
            methods::AUTH_LOGOUT => {
                let account = self.logout().await;
                Ok(json!({ "success": true, "account": account }))
            }
            methods::AUTH_GET_ACCOUNTS => self.auth_get_accounts().await,
            methods::AUTH_SET_DEFAULT => {
                let account_id = str_param(params, "account_id")?;
                self.known_account(account_id).await?;
                self.store.set_default_account(account_id).await?;
                Ok(json!({ "success": true }))
            }
            methods::AUTH_DELETE => self.auth_delete(params).await,

            // Columns
            methods::COLUMN_OPEN => {
                let name = str_param(params, "column")?;
                let info = self.with_session(|s| s.open_column(name, Instant::now())).await?;
                to_json(&info)
            }
            methods::COLUMN_CLOSE => {
                let name = str_param(params, "column")?;
                let (account_id, unread, events) = self
                    .with_session(|s| {
                        let unread = s.close_column(name)?;
                        Ok((s.account_id().to_string(), unread, s.take_unread_change()))
                    })
                    .await?;
                self.broadcast(&account_id, events.into_iter().collect());
                Ok(json!({ "column": name, "unread": unread }))
            }
            methods::COLUMN_LIST => {
                let infos = self.with_session(|s| Ok(s.column_infos(Instant::now()))).await?;
                to_json(&infos)
            }
            methods::COLUMN_RELOAD => {
                let name = str_param(params, "column")?;
                self.with_session(|s| s.reload_column(name, Instant::now())).await?;
                Ok(json!({ "column": name, "reloading": true }))
            }
            methods::COLUMN_SNAPSHOT => {
                let name = str_param(params, "column")?;
                self.with_session(|s| s.snapshot(name)).await
            }
            methods::COLUMN_MARK_READ => {
                let name = str_param(params, "column")?;
                let id = opt_str_param(params, "id");
                let (account_id, count, events) = self
                    .with_session(|s| {
                        let count = s.mark_read(name, id)?;
                        Ok((s.account_id().to_string(), count, s.take_unread_change()))
                    })
                    .await?;
                self.broadcast(&account_id, events.into_iter().collect());
                Ok(json!({ "column": name, "marked": count }))
            }
            methods::COLUMN_NEXT_UNREAD => {
                let name = str_param(params, "column")?;
                let after = opt_str_param(params, "after");
                let next = self.with_session(|s| s.next_unread(name, after)).await?;
                Ok(json!({ "column": name, "id": next }))
            }
            methods::WINDOW_SET_ACTIVE => {
                let active = require(params)?
                    .get("active")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| CoreError::InvalidParams("Missing active".to_string()))?;
                if let Some(current) = self.active.lock().await.as_mut() {
                    current.session.set_window_active(active);
                }
                Ok(json!({ "active": active }))
            }

            // Posts
            methods::POST_CREATE => self.post_create(params).await,
            methods::POST_FAVOURITE => self.start_action(params, StatusAction::Favourite).await,
            methods::POST_UNFAVOURITE => self.start_action(params, StatusAction::Unfavourite).await,
            methods::POST_BOOST => self.start_action(params, StatusAction::Boost).await,
            methods::POST_UNBOOST => self.start_action(params, StatusAction::Unboost).await,
            methods::POST_BOOKMARK => self.start_action(params, StatusAction::Bookmark).await,
            methods::POST_UNBOOKMARK => self.start_action(params, StatusAction::Unbookmark).await,
            methods::POST_MUTE => self.start_action(params, StatusAction::Mute).await,
            methods::POST_UNMUTE => self.start_action(params, StatusAction::Unmute).await,
            methods::POST_DELETE => self.start_action(params, StatusAction::Delete).await,
            methods::POST_RELOAD => self.start_action(params, StatusAction::Reload).await,
            methods::POST_CONTEXT => {
                let column = str_param(params, "column")?;
                let status_id = str_param(params, "status_id")?;
                self.with_session(|s| s.load_context(column, status_id)).await?;
                Ok(json!({ "column": column, "status_id": status_id, "started": true }))
            }
            methods::POST_HISTORY => {
                let status_id = str_param(params, "status_id")?;
                let history = self.history(status_id).await?;
                Ok(json!({
                    "status_id": status_id,
                    "labels": history::version_labels(&history),
                    "versions": history,
                }))
            }
            methods::POST_DIFF => {
                let status_id = str_param(params, "status_id")?;
                let history = self.history(status_id).await?;
                let diff = history::compare(
                    &history,
                    opt_index_param(params, "from"),
                    opt_index_param(params, "to"),
                )?;
                to_json(&diff)
            }

            // Polls
            methods::POLL_VOTE => {
                let vote: VoteParams = parse(params)?;
                if vote.choices.is_empty() {
                    return Err(CoreError::InvalidParams("No choices given".to_string()));
                }
                self.with_session(|s| {
                    s.vote(&vote.status_id, &vote.poll_id, vote.choices.clone());
                    Ok(())
                })
                .await?;
                Ok(json!({ "status_id": vote.status_id, "started": true }))
            }
            methods::POLL_REFRESH => self.start_action(params, StatusAction::Reload).await,

            // Notifications
            methods::NOTIFICATIONS_DISMISS => {
                let notification_id = str_param(params, "notification_id")?;
                let (account_id, api) = self.api().await?;
                api.dismiss_notification(notification_id).await?;
                debug!("Notification {} dismissed", notification_id);

                let events = self.with_session(|s| Ok(s.remove_notification(notification_id))).await?;
                self.broadcast(&account_id, events);
                Ok(json!({ "success": true }))
            }
            methods::NOTIFICATIONS_CLEAR => {
                let (account_id, api) = self.api().await?;
                api.clear_notifications().await?;
                info!("All notifications cleared");

                let events = self.with_session(|s| Ok(s.clear_notifications())).await?;
                self.broadcast(&account_id, events);
                Ok(json!({ "success": true }))
            }

            // Users
            methods::USER_FOLLOW => {
                let account_id = str_param(params, "account_id")?;
                let (_, api) = self.api().await?;
                to_json(&api.follow(account_id, false).await?)
            }
            methods::USER_NOTIFY => {
                let account_id = str_param(params, "account_id")?;
                let notify = params
                    .and_then(|p| p.get("notify"))
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let (_, api) = self.api().await?;
                to_json(&api.follow(account_id, notify).await?)
            }
            methods::USER_UNFOLLOW => {
                let account_id = str_param(params, "account_id")?;
                let (_, api) = self.api().await?;
                to_json(&api.unfollow(account_id).await?)
            }

            // Media
            methods::MEDIA_UPLOAD => {
                let request: MediaUploadRequest = parse(params)?;
                debug!("Uploading media from: {}", request.file_path);
                let (_, api) = self.api().await?;
                to_json(&api.upload_media(&request).await?)
            }

            // Instance
            methods::INSTANCE_GET => {
                self.with_session(|s| {
                    Ok(json!({
                        "instance": s.instance(),
                        "custom_emojis": s.emojis(),
                    }))
                })
                .await
            }

            // Preferences and UI state
            methods::PREFS_GET => to_json(&*self.prefs.read().await),
            methods::PREFS_SET => self.prefs_set(params).await,
            methods::SETTINGS_GET => match opt_str_param(params, "key") {
                Some(key) => {
                    let value = self.store.get_setting(key).await?;
                    Ok(json!({ "key": key, "value": value }))
                }
                None => to_json(&self.store.get_settings_with_prefix(UI_PREFIX).await?),
            },
            methods::SETTINGS_SET => self.settings_set(params).await,

            _ => Err(CoreError::MethodNotFound(method.to_string())),
        }
    }

    async fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> CoreResult<T>) -> CoreResult<T> {
        let mut guard = self.active.lock().await;
        let active = guard.as_mut().ok_or(CoreError::NotAuthenticated)?;
        f(&mut active.session)
    }

    /// Account id and API handle of the active session, for calls made
    /// without holding the session lock
    async fn api(&self) -> CoreResult<(String, Arc<dyn SocialApi>)> {
        self.with_session(|s| Ok((s.account_id().to_string(), s.api()))).await
    }

    async fn feature_set(&self, params: Option<&Value>) -> FeatureSet {
        match opt_str_param(params, "feature_set") {
            Some(name) => FeatureSet::from_name(name),
            None => self.prefs.read().await.feature_set,
        }
    }

    async fn known_account(&self, account_id: &str) -> CoreResult<StoredAccount> {
        self.store
            .get_account(account_id)
            .await?
            .ok_or_else(|| CoreError::UnknownAccount(account_id.to_string()))
    }

    async fn auth_start(&self, params: Option<&Value>) -> CoreResult<Value> {
        let instance_url = normalize_url(str_param(params, "instance_url")?);
        let feature_set = self.feature_set(params).await;

        let saved_credentials = self
            .store
            .get_accounts()
            .await?
            .into_iter()
            .filter(|a| a.instance_url == instance_url)
            .find_map(|a| Some((a.client_id?, a.client_secret?)));

        match self.oauth.start(&instance_url, feature_set, saved_credentials).await {
            Ok(response) => to_json(&response),
            Err(e) => {
                self.broadcast(&instance_url, vec![SessionEvent::LoginStatus(LoginStatus::CreateApp)]);
                Err(e.into())
            }
        }
    }

    async fn auth_callback(self: &Arc<Self>, params: Option<&Value>) -> CoreResult<Value> {
        let instance_url = normalize_url(str_param(params, "instance_url")?);
        let code = str_param(params, "code")?;
        let feature_set = self.feature_set(params).await;

        let login_failed = |e: anyhow::Error| {
            self.broadcast(&instance_url, vec![SessionEvent::LoginStatus(LoginStatus::Login)]);
            CoreError::from(e)
        };

        let (client, app) = self
            .oauth
            .complete(&instance_url, code, feature_set)
            .await
            .map_err(login_failed)?;
        let access_token = client.access_token().to_string();
        let api: Arc<dyn SocialApi> = Arc::new(client);
        let me = api.verify_credentials().await.map_err(login_failed)?;

        let now = Utc::now();
        let account = match self.store.find_account(&instance_url, &me.username).await? {
            Some(existing) => StoredAccount {
                display_name: me.display_name.clone(),
                access_token,
                client_id: Some(app.client_id),
                client_secret: Some(app.client_secret),
                feature_set: feature_set.name().to_string(),
                last_used_at: now,
                avatar_url: Some(me.avatar.clone()),
                ..existing
            },
            None => StoredAccount {
                id: uuid::Uuid::new_v4().to_string(),
                instance_url: instance_url.clone(),
                username: me.username.clone(),
                acct: full_acct(&me.acct, &instance_url),
                display_name: me.display_name.clone(),
                access_token,
                client_id: Some(app.client_id),
                client_secret: Some(app.client_secret),
                feature_set: feature_set.name().to_string(),
                autologin: true,
                added_at: now,
                last_used_at: now,
                is_default: false,
                avatar_url: Some(me.avatar.clone()),
            },
        };
        self.store.save_account(&account).await?;
        info!("Saved login {}", account.acct);

        self.activate(account, api).await
    }

    async fn auth_login(self: &Arc<Self>, params: Option<&Value>) -> CoreResult<Value> {
        let account = match opt_str_param(params, "account_id") {
            Some(account_id) => self.known_account(account_id).await?,
            None => self
                .store
                .get_default_account()
                .await?
                .ok_or(CoreError::NotAuthenticated)?,
        };

        let feature_set = FeatureSet::from_name(&account.feature_set);
        let client = match MastodonClient::from_token(&account.instance_url, &account.access_token, feature_set) {
            Ok(client) => client,
            Err(e) => {
                self.broadcast(&account.id, vec![SessionEvent::LoginStatus(LoginStatus::CreateEndpoint)]);
                return Err(e.into());
            }
        };

        self.activate(account, Arc::new(client)).await
    }

    async fn auth_get_accounts(&self) -> CoreResult<Value> {
        let accounts = self.store.get_accounts().await?;
        let active = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|a| a.session.account_id().to_string());

        Ok(json!({
            "authenticated": active.is_some(),
            "active": active,
            "accounts": accounts,
        }))
    }

    async fn auth_delete(&self, params: Option<&Value>) -> CoreResult<Value> {
        let account_id = str_param(params, "account_id")?;

        let is_active = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|a| a.session.account_id() == account_id)
            .unwrap_or(false);
        if is_active {
            self.logout().await;
        }

        if !self.store.delete_account(account_id).await? {
            return Err(CoreError::UnknownAccount(account_id.to_string()));
        }
        Ok(json!({ "success": true }))
    }

    /// Make `account` the active session
    pub async fn activate(
        self: &Arc<Self>,
        account: StoredAccount,
        api: Arc<dyn SocialApi>,
    ) -> CoreResult<Value> {
        let settings = ColumnSettings::from(&*self.prefs.read().await);
        let (tx, rx) = mpsc::unbounded_channel();

        let session = match Session::connect(&account.id, api, settings, tx).await {
            Ok(session) => session,
            Err(e) => {
                let status = if is_token_rejected(&e) {
                    LoginStatus::Revoked
                } else {
                    LoginStatus::Login
                };
                self.broadcast(&account.id, vec![SessionEvent::LoginStatus(status)]);
                return Err(e.into());
            }
        };

        let result = json!({
            "account": account,
            "user": session.me(),
            "instance": session.instance(),
        });

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self
            .active
            .lock()
            .await
            .replace(ActiveSession { generation, session });
        if let Some(mut previous) = previous {
            info!("Replacing session of {}", previous.session.account_id());
            previous.session.shutdown();
        }
        self.spawn_pump(generation, account.id.clone(), rx);

        self.store.set_default_account(&account.id).await?;
        self.broadcast(&account.id, vec![SessionEvent::LoginStatus(LoginStatus::Success)]);
        Ok(result)
    }

    /// End the active session, returning its account id
    async fn logout(&self) -> Option<String> {
        let mut active = self.active.lock().await.take()?;
        active.session.shutdown();
        info!("Logged out {}", active.session.account_id());
        Some(active.session.account_id().to_string())
    }

    /// Feed worker results of one session back into it
    fn spawn_pump(
        self: &Arc<Self>,
        generation: u64,
        account_id: String,
        mut rx: mpsc::UnboundedReceiver<WorkerMessage>,
    ) {
        let handler = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let events = {
                    let mut guard = handler.active.lock().await;
                    match guard.as_mut() {
                        Some(active) if active.generation == generation => {
                            active.session.handle(message, Instant::now())
                        }
                        _ => continue,
                    }
                };
                handler.broadcast(&account_id, events);
            }
            debug!("Workers of {} finished", account_id);
        });
    }

    /// Drain queues and poll due columns every `tick` until shutdown
    pub async fn run_ticker(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        let mut shutdown = self.shutdown_signal();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let ticked = self.active.lock().await.as_mut().map(|active| {
                        let account_id = active.session.account_id().to_string();
                        (account_id, active.session.tick(Instant::now()))
                    });
                    if let Some((account_id, events)) = ticked {
                        self.broadcast(&account_id, events);
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }

    async fn start_action(&self, params: Option<&Value>, action: StatusAction) -> CoreResult<Value> {
        let status_id = str_param(params, "status_id")?;
        self.with_session(|s| {
            s.start_action(status_id, action);
            Ok(())
        })
        .await?;
        Ok(json!({ "status_id": status_id, "action": action, "started": true }))
    }

    async fn post_create(&self, params: Option<&Value>) -> CoreResult<Value> {
        let mut new_post: NewPost = parse(params)?;
        if new_post.content.trim().is_empty() && new_post.media_ids.is_empty() {
            return Err(CoreError::InvalidParams("Post is empty".to_string()));
        }

        {
            let prefs = self.prefs.read().await;
            if new_post.visibility.is_none() {
                new_post.visibility = Some(Visibility::from_setting(&prefs.preferred_post_visibility));
            }
            if new_post.language.is_none() {
                new_post.language = Some(prefs.preferred_post_language.clone());
            }
        }

        let (_, api) = self.api().await?;
        let post = api.create_post(&new_post).await?;
        Ok(json!({ "scheduled": post.is_none(), "post": post }))
    }

    /// Edit history of a post, fetched unless a column already holds it
    async fn history(&self, status_id: &str) -> CoreResult<Vec<StatusEdit>> {
        let (account_id, api, cached) = self
            .with_session(|s| Ok((s.account_id().to_string(), s.api(), s.cached_history(status_id))))
            .await?;
        if let Some(history) = cached {
            return Ok(history);
        }

        let history = api.status_history(status_id).await?;
        let events = self
            .with_session(|s| Ok(s.store_history(status_id, history.clone())))
            .await?;
        self.broadcast(&account_id, events);
        Ok(history)
    }

    async fn prefs_set(&self, params: Option<&Value>) -> CoreResult<Value> {
        let name = str_param(params, "name")?;
        let value = require(params)?
            .get("value")
            .cloned()
            .ok_or_else(|| CoreError::InvalidParams("Missing value".to_string()))?;

        let (settings, prefs) = {
            let mut prefs = self.prefs.write().await;
            prefs.apply(name, value)?;
            prefs.save(&self.store).await?;
            (ColumnSettings::from(&*prefs), to_json(&*prefs)?)
        };

        if let Some(active) = self.active.lock().await.as_mut() {
            active.session.apply_settings(settings, Instant::now());
        }
        Ok(prefs)
    }

    async fn settings_set(&self, params: Option<&Value>) -> CoreResult<Value> {
        let key = str_param(params, "key")?;
        if !key.starts_with(UI_PREFIX) {
            return Err(CoreError::InvalidParams(format!(
                "Only {}* keys can be set directly",
                UI_PREFIX
            )));
        }

        match require(params)?.get("value") {
            None | Some(Value::Null) => self.store.delete_setting(key).await?,
            Some(Value::String(value)) => self.store.set_setting(key, value).await?,
            Some(other) => self.store.set_setting(key, &other.to_string()).await?,
        }
        Ok(json!({ "key": key, "success": true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use tokio_test::assert_ok;

    async fn handler() -> Arc<MessageHandler> {
        let store = assert_ok!(SettingsStore::in_memory().await);
        Arc::new(MessageHandler::new(store, Preferences::default()))
    }

    fn stored_account(id: &str) -> StoredAccount {
        StoredAccount {
            id: id.to_string(),
            instance_url: "https://example.social".to_string(),
            username: "user1".to_string(),
            acct: "user1@example.social".to_string(),
            display_name: "User 1".to_string(),
            access_token: "secret-token".to_string(),
            client_id: Some("client".to_string()),
            client_secret: Some("client-secret".to_string()),
            feature_set: "mainline".to_string(),
            autologin: true,
            added_at: Utc::now(),
            last_used_at: Utc::now(),
            is_default: false,
            avatar_url: None,
        }
    }

    async fn logged_in(api: Arc<FakeApi>) -> Arc<MessageHandler> {
        let handler = handler().await;
        let account = stored_account("acct-1");
        assert_ok!(handler.store.save_account(&account).await);
        assert_ok!(handler.activate(account, api).await);
        handler
    }

    async fn call(handler: &Arc<MessageHandler>, method: &str, params: Value) -> IpcMessage {
        handler
            .handle_message(IpcMessage::request(method, Some(params)))
            .await
    }

    #[tokio::test]
    async fn ping_answers_with_the_request_id() {
        let handler = handler().await;
        let request = IpcMessage::request(methods::PING, None);
        let response = handler.handle_message(request.clone()).await;

        assert_eq!(response.id, request.id);
        assert_eq!(response.result.unwrap()["pong"], true);
    }

    #[tokio::test]
    async fn unknown_methods_and_missing_params_are_errors() {
        let handler = handler().await;

        let response = call(&handler, "timeline.get", json!({})).await;
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        let response = call(&handler, methods::AUTH_START, json!({})).await;
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn column_methods_need_a_login() {
        let handler = handler().await;
        let response = call(&handler, methods::COLUMN_OPEN, json!({ "column": "home" })).await;
        assert_eq!(response.error.unwrap().code, error_codes::NOT_AUTHENTICATED);
    }

    #[tokio::test]
    async fn preferences_are_validated_and_saved() {
        let handler = handler().await;

        let response = call(&handler, methods::PREFS_SET, json!({ "name": "max_timeline_length", "value": 80 })).await;
        assert_eq!(response.result.unwrap()["max_timeline_length"], 80);
        let reloaded = assert_ok!(Preferences::load(&handler.store).await);
        assert_eq!(reloaded.max_timeline_length, 80);

        let response = call(&handler, methods::PREFS_SET, json!({ "name": "max_timeline_length", "value": "lots" })).await;
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn ui_settings_are_opaque_but_scoped() {
        let handler = handler().await;

        let response = call(&handler, methods::SETTINGS_SET, json!({ "key": "prefs.theme", "value": "dark" })).await;
        assert!(response.is_error());

        let response = call(&handler, methods::SETTINGS_SET, json!({ "key": "ui.history_window.size", "value": "640x480" })).await;
        assert!(!response.is_error());

        let response = call(&handler, methods::SETTINGS_GET, json!({ "key": "ui.history_window.size" })).await;
        assert_eq!(response.result.unwrap()["value"], "640x480");
    }

    #[tokio::test]
    async fn accounts_are_listed_without_secrets() {
        let handler = logged_in(Arc::new(FakeApi::new())).await;

        let response = call(&handler, methods::AUTH_GET_ACCOUNTS, json!({})).await;
        let result = response.result.unwrap();
        assert_eq!(result["active"], "acct-1");
        assert!(!result.to_string().contains("secret-token"));
        assert!(!result.to_string().contains("client-secret"));
    }

    #[tokio::test]
    async fn columns_open_through_ipc() {
        let handler = logged_in(Arc::new(FakeApi::new())).await;

        let response = call(&handler, methods::COLUMN_OPEN, json!({ "column": "home" })).await;
        assert_eq!(response.result.unwrap()["name"], "home");

        let response = call(&handler, methods::COLUMN_OPEN, json!({ "column": "home" })).await;
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);

        let response = call(&handler, methods::COLUMN_LIST, json!({})).await;
        assert_eq!(response.result.unwrap().as_array().unwrap().len(), 1);

        let response = call(&handler, methods::COLUMN_CLOSE, json!({ "column": "nope" })).await;
        assert_eq!(response.error.unwrap().code, error_codes::UNKNOWN_ENTITY);
    }

    #[tokio::test]
    async fn failed_actions_reach_subscribers() {
        let api = Arc::new(FakeApi::new());
        api.fail("favourite");
        let handler = logged_in(api).await;
        let mut events = handler.subscribe_events();

        let response = call(&handler, methods::POST_FAVOURITE, json!({ "status_id": "77" })).await;
        assert_eq!(response.result.unwrap()["started"], true);

        let failed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = events.recv().await.unwrap();
                if event.method.as_deref() == Some(crate::models::events::ACTION_FAILED) {
                    return event;
                }
            }
        })
        .await
        .unwrap();
        let params = failed.params.unwrap();
        assert_eq!(params["status_id"], "77");
        assert_eq!(params["account"], "acct-1");
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let handler = logged_in(Arc::new(FakeApi::new())).await;

        let response = call(&handler, methods::AUTH_LOGOUT, json!({})).await;
        assert_eq!(response.result.unwrap()["account"], "acct-1");

        let response = call(&handler, methods::INSTANCE_GET, json!({})).await;
        assert_eq!(response.error.unwrap().code, error_codes::NOT_AUTHENTICATED);
    }

    #[tokio::test]
    async fn new_posts_take_preferred_defaults() {
        let api = Arc::new(FakeApi::new());
        let handler = logged_in(api.clone()).await;

        let response = call(&handler, methods::POST_CREATE, json!({ "content": "  " })).await;
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);

        let response = call(&handler, methods::POST_CREATE, json!({ "content": "hello" })).await;
        let result = response.result.unwrap();
        assert_eq!(result["scheduled"], false);
        assert_eq!(result["post"]["language"], "en");
        assert!(api.calls().contains(&"create_post hello".to_string()));
    }

    #[tokio::test]
    async fn edit_history_is_fetched_and_compared() {
        let api = Arc::new(FakeApi::new());
        let edit = |content: &str| StatusEdit {
            content: content.to_string(),
            spoiler_text: String::new(),
            sensitive: false,
            created_at: Utc::now(),
            account: None,
            poll: None,
            media_attachments: Vec::new(),
            emojis: Vec::new(),
        };
        api.histories
            .lock()
            .unwrap()
            .insert("50".to_string(), vec![edit("<p>first</p>"), edit("<p>second</p>")]);
        let handler = logged_in(api.clone()).await;

        let response = call(&handler, methods::POST_HISTORY, json!({ "status_id": "50" })).await;
        let result = response.result.unwrap();
        assert_eq!(result["versions"].as_array().unwrap().len(), 2);
        assert_eq!(result["labels"].as_array().unwrap().len(), 2);

        let response = call(&handler, methods::POST_DIFF, json!({ "status_id": "50" })).await;
        let result = response.result.unwrap();
        assert_eq!(result["from"], 0);
        assert_eq!(result["to"], 1);

        let response = call(&handler, methods::POST_DIFF, json!({ "status_id": "50", "from": 0, "to": 7 })).await;
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn clearing_notifications_calls_the_server() {
        let api = Arc::new(FakeApi::new());
        let handler = logged_in(api.clone()).await;

        let response = call(&handler, methods::NOTIFICATIONS_CLEAR, json!({})).await;
        assert_eq!(response.result.unwrap()["success"], true);
        assert!(api.calls().contains(&"clear_notifications".to_string()));

        api.fail("dismiss_notification");
        let response = call(&handler, methods::NOTIFICATIONS_DISMISS, json!({ "notification_id": "3" })).await;
        assert_eq!(response.error.unwrap().code, error_codes::API_ERROR);
    }

    #[test]
    fn local_accts_get_the_instance_host() {
        assert_eq!(full_acct("alice", "https://example.social"), "alice@example.social");
        assert_eq!(full_acct("bob@elsewhere.net", "https://example.social"), "bob@elsewhere.net");
    }
}
