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

//! Logged-in account state
//!
//! A [`Session`] owns the columns of one account. Everything slow (polls,
//! status actions, thread and history fetches, streams) runs on a spawned
//! task that reports back with a single [`WorkerMessage`]; the owner feeds
//! those into [`Session::handle`] and forwards the resulting events.

mod column;

pub use column::*;

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{is_token_rejected, SocialApi};
use crate::config::Preferences;
use crate::error::{CoreError, CoreResult};
use crate::models::{
    events, ActionOutcome, ColumnContent, ColumnKind, CustomEmoji, InstanceInfo, IpcMessage,
    LoginStatus, PageRequest, Post, StatusAction, StatusContext, StatusEdit, User,
};
use crate::streaming::{StreamEvent, StreamManager, StreamMessage};

/// Result of a worker, sent back to the owning session
pub enum WorkerMessage {
    Stream(StreamMessage),
    Fetched {
        column: String,
        result: Result<ColumnPage>,
    },
    Action {
        status_id: String,
        action: StatusAction,
        result: Result<Option<Post>>,
    },
    Context {
        column: String,
        status_id: String,
        result: Result<StatusContext>,
    },
    History {
        status_id: String,
        result: Result<Vec<StatusEdit>>,
    },
}

impl From<StreamMessage> for WorkerMessage {
    fn from(message: StreamMessage) -> Self {
        WorkerMessage::Stream(message)
    }
}

/// Something the UI should hear about
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ColumnChanged {
        column: String,
        changes: ColumnChanges,
    },
    UnreadChanged {
        columns: BTreeMap<String, usize>,
        total: usize,
    },
    RefreshCountdown {
        columns: BTreeMap<String, u64>,
    },
    StreamConnected {
        stream: String,
    },
    StreamDisconnected {
        stream: String,
        reason: String,
    },
    LoginStatus(LoginStatus),
    ActionFailed {
        status_id: String,
        action: StatusAction,
        message: String,
    },
    Error {
        message: String,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::ColumnChanged { .. } => events::COLUMN_CHANGED,
            SessionEvent::UnreadChanged { .. } => events::UNREAD_CHANGED,
            SessionEvent::RefreshCountdown { .. } => events::REFRESH_COUNTDOWN,
            SessionEvent::StreamConnected { .. } => events::STREAM_CONNECTED,
            SessionEvent::StreamDisconnected { .. } => events::STREAM_DISCONNECTED,
            SessionEvent::LoginStatus(_) => events::LOGIN_STATUS,
            SessionEvent::ActionFailed { .. } => events::ACTION_FAILED,
            SessionEvent::Error { .. } => events::ERROR,
        }
    }

    pub fn to_ipc(&self, account_id: &str) -> IpcMessage {
        let params = match self {
            SessionEvent::ColumnChanged { column, changes } => {
                json!({ "account": account_id, "column": column, "changes": changes })
            }
            SessionEvent::UnreadChanged { columns, total } => {
                json!({ "account": account_id, "columns": columns, "total": total })
            }
            SessionEvent::RefreshCountdown { columns } => {
                json!({ "account": account_id, "columns": columns })
            }
            SessionEvent::StreamConnected { stream } => {
                json!({ "account": account_id, "stream": stream })
            }
            SessionEvent::StreamDisconnected { stream, reason } => {
                json!({ "account": account_id, "stream": stream, "reason": reason })
            }
            SessionEvent::LoginStatus(status) => json!({
                "account": account_id,
                "status": status,
                "message": status.message(),
            }),
            SessionEvent::ActionFailed {
                status_id,
                action,
                message,
            } => json!({
                "account": account_id,
                "status_id": status_id,
                "action": action,
                "message": message,
            }),
            SessionEvent::Error { message } => {
                json!({ "account": account_id, "message": message })
            }
        };
        IpcMessage::event(self.name(), params)
    }
}

/// Column limits taken from the preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSettings {
    pub max_len: usize,
    pub interval: Duration,
}

impl From<&Preferences> for ColumnSettings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            max_len: prefs.max_timeline_length,
            interval: prefs.refresh_interval(),
        }
    }
}

fn spawn_worker<F>(tx: &mpsc::UnboundedSender<WorkerMessage>, work: F)
where
    F: Future<Output = WorkerMessage> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        // the session may be gone by now
        let _ = tx.send(work.await);
    });
}

async fn fetch_page(api: Arc<dyn SocialApi>, kind: ColumnKind, page: PageRequest) -> Result<ColumnPage> {
    Ok(match kind.content() {
        ColumnContent::Posts => ColumnPage::Posts(api.timeline(&kind, &page).await?),
        ColumnContent::Notifications => ColumnPage::Notifications(api.notifications(&page).await?),
        ColumnContent::Conversations => ColumnPage::Conversations(api.conversations(&page).await?),
    })
}

fn push_changes(events: &mut Vec<SessionEvent>, column: &str, changes: ColumnChanges) {
    if !changes.is_empty() {
        events.push(SessionEvent::ColumnChanged {
            column: column.to_string(),
            changes,
        });
    }
}

pub struct Session {
    account_id: String,
    api: Arc<dyn SocialApi>,
    me: User,
    instance: InstanceInfo,
    emojis: Vec<CustomEmoji>,
    columns: HashMap<String, Column>,
    /// Column names in the order they were opened
    order: Vec<String>,
    streams: StreamManager<WorkerMessage>,
    worker_tx: mpsc::UnboundedSender<WorkerMessage>,
    settings: ColumnSettings,
    window_active: bool,
    pending_history: HashSet<String>,
    last_unread: BTreeMap<String, usize>,
}

impl Session {
    /// Check the credentials and load what the columns need about the account
    pub async fn connect(
        account_id: &str,
        api: Arc<dyn SocialApi>,
        settings: ColumnSettings,
        worker_tx: mpsc::UnboundedSender<WorkerMessage>,
    ) -> Result<Self> {
        let me = api.verify_credentials().await?;
        let (instance, emojis) = futures::join!(api.instance(), api.custom_emojis());
        let instance = instance?;
        let emojis = match emojis {
            Ok(emojis) => emojis,
            Err(e) => {
                warn!("Custom emojis unavailable: {:#}", e);
                Vec::new()
            }
        };

        info!("Session ready for {} on {}", me.acct, instance.uri);
        let streams = StreamManager::new(api.clone(), &me.acct, worker_tx.clone());

        Ok(Self {
            account_id: account_id.to_string(),
            api,
            me,
            instance,
            emojis,
            columns: HashMap::new(),
            order: Vec::new(),
            streams,
            worker_tx,
            settings,
            window_active: true,
            pending_history: HashSet::new(),
            last_unread: BTreeMap::new(),
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn api(&self) -> Arc<dyn SocialApi> {
        self.api.clone()
    }

    pub fn me(&self) -> &User {
        &self.me
    }

    pub fn instance(&self) -> &InstanceInfo {
        &self.instance
    }

    pub fn emojis(&self) -> &[CustomEmoji] {
        &self.emojis
    }

    pub fn column(&self, name: &str) -> CoreResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))
    }

    fn column_mut(&mut self, name: &str) -> CoreResult<&mut Column> {
        self.columns
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))
    }

    pub fn open_column(&mut self, name: &str, now: Instant) -> CoreResult<ColumnInfo> {
        let kind = ColumnKind::from_name(name).ok_or_else(|| CoreError::UnknownColumn(name.to_string()))?;
        let key = kind.name();
        if self.columns.contains_key(&key) {
            return Err(CoreError::ColumnAlreadyOpen(key));
        }

        if let Some(stream) = kind.stream() {
            self.streams.start(&stream);
        }
        let column = Column::new(kind, &self.me.id, self.settings.interval, now);
        let info = column.info(now);

        info!("Opened column {}", key);
        self.columns.insert(key.clone(), column);
        self.order.push(key);
        Ok(info)
    }

    /// Close a column, returning how many unread entries it had
    pub fn close_column(&mut self, name: &str) -> CoreResult<usize> {
        let column = self
            .columns
            .remove(name)
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))?;
        self.order.retain(|n| n != name);

        if let Some(stream) = column.kind().stream() {
            self.streams.stop(&stream);
        }
        info!("Closed column {}", name);
        Ok(column.unread_count())
    }

    pub fn column_infos(&self, now: Instant) -> Vec<ColumnInfo> {
        self.order
            .iter()
            .filter_map(|name| self.columns.get(name))
            .map(|c| c.info(now))
            .collect()
    }

    pub fn reload_column(&mut self, name: &str, now: Instant) -> CoreResult<()> {
        self.column_mut(name)?.schedule_mut().force_reload(now);
        Ok(())
    }

    pub fn snapshot(&self, name: &str) -> CoreResult<Value> {
        Ok(self.column(name)?.snapshot())
    }

    /// Mark one entry, or the whole column, read
    pub fn mark_read(&mut self, name: &str, id: Option<&str>) -> CoreResult<usize> {
        Ok(self.column_mut(name)?.mark_read(id))
    }

    pub fn next_unread(&self, name: &str, after: Option<&str>) -> CoreResult<Option<String>> {
        Ok(self.column(name)?.next_unread(after))
    }

    #[cfg(test)]
    pub fn unread_total(&self) -> usize {
        self.columns.values().map(Column::unread_count).sum()
    }

    pub fn set_window_active(&mut self, active: bool) {
        self.window_active = active;
    }

    pub fn apply_settings(&mut self, settings: ColumnSettings, now: Instant) {
        if settings.interval != self.settings.interval {
            for column in self.columns.values_mut() {
                column.schedule_mut().set_interval(settings.interval, now);
            }
        }
        self.settings = settings;
    }

    /// Run a status action on its own worker; the outcome arrives through `handle`
    pub fn start_action(&self, status_id: &str, action: StatusAction) {
        debug!("Starting {} on {}", action.name(), status_id);
        let api = self.api.clone();
        let status_id = status_id.to_string();
        spawn_worker(&self.worker_tx, async move {
            let result = api.status_action(&status_id, action).await;
            WorkerMessage::Action {
                status_id,
                action,
                result,
            }
        });
    }

    /// Vote, then reload the post so every column shows the new results
    pub fn vote(&self, status_id: &str, poll_id: &str, choices: Vec<u32>) {
        let api = self.api.clone();
        let status_id = status_id.to_string();
        let poll_id = poll_id.to_string();
        spawn_worker(&self.worker_tx, async move {
            let result = match api.vote_poll(&poll_id, &choices).await {
                Ok(_) => api.status(&status_id).await.map(Some),
                Err(e) => Err(e),
            };
            WorkerMessage::Action {
                status_id,
                action: StatusAction::Reload,
                result,
            }
        });
    }

    /// Fetch the thread around a post and add it to the column
    pub fn load_context(&self, column: &str, status_id: &str) -> CoreResult<()> {
        if self.column(column)?.kind().content() != ColumnContent::Posts {
            return Err(CoreError::InvalidParams(format!("{} does not show posts", column)));
        }

        let api = self.api.clone();
        let column = column.to_string();
        let status_id = status_id.to_string();
        spawn_worker(&self.worker_tx, async move {
            let result = api.status_context(&status_id).await;
            WorkerMessage::Context {
                column,
                status_id,
                result,
            }
        });
        Ok(())
    }

    /// Edit history already attached to a post in any column
    pub fn cached_history(&self, status_id: &str) -> Option<Vec<StatusEdit>> {
        self.order
            .iter()
            .filter_map(|name| self.columns.get(name))
            .find_map(|c| c.history(status_id).cloned())
    }

    /// Attach edit history to the post in every column showing it
    pub fn store_history(&mut self, status_id: &str, history: Vec<StatusEdit>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for name in &self.order {
            if let Some(column) = self.columns.get_mut(name) {
                let changes = column.set_history(status_id, history.clone());
                push_changes(&mut events, name, changes);
            }
        }
        events
    }

    /// Drop a dismissed notification from the notification columns
    pub fn remove_notification(&mut self, id: &str) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for name in &self.order {
            if let Some(column) = self.columns.get_mut(name) {
                if column.kind().content() == ColumnContent::Notifications {
                    let changes = column.remove(id);
                    push_changes(&mut events, name, changes);
                }
            }
        }
        events.extend(self.take_unread_change());
        events
    }

    pub fn clear_notifications(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for name in &self.order {
            if let Some(column) = self.columns.get_mut(name) {
                if column.kind().content() == ColumnContent::Notifications {
                    let changes = column.clear();
                    push_changes(&mut events, name, changes);
                }
            }
        }
        events.extend(self.take_unread_change());
        events
    }

    /// Poll due columns, drain queues, purge and report the countdown
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut countdown = BTreeMap::new();

        for name in &self.order {
            let Some(column) = self.columns.get_mut(name) else {
                continue;
            };

            if let Some(page) = column.due_fetch(now, self.settings.max_len) {
                debug!("Polling {} since {:?}", name, page.since_id);
                let api = self.api.clone();
                let kind = column.kind().clone();
                let column_name = name.clone();
                spawn_worker(&self.worker_tx, async move {
                    let result = fetch_page(api, kind, page).await;
                    WorkerMessage::Fetched {
                        column: column_name,
                        result,
                    }
                });
            }

            if column.has_queued() {
                column.schedule_mut().postpone(now);
            }
            let mut changes = column.add_queued();
            changes.extend(column.purge(self.settings.max_len, self.window_active));
            push_changes(&mut events, name, changes);

            countdown.insert(name.clone(), column.schedule().remaining(now).as_secs());
        }

        self.follow_edits(&events);
        events.extend(self.take_unread_change());
        if !countdown.is_empty() {
            events.push(SessionEvent::RefreshCountdown { columns: countdown });
        }
        events
    }

    /// Apply a finished worker's result
    pub fn handle(&mut self, message: WorkerMessage, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match message {
            WorkerMessage::Stream(message) => self.handle_stream(message, &mut events),
            WorkerMessage::Fetched { column, result } => match result {
                Ok(page) => match self.columns.get_mut(&column) {
                    Some(c) => c.fetched(now, page),
                    None => debug!("Dropping page for closed column {}", column),
                },
                Err(e) => {
                    if let Some(c) = self.columns.get_mut(&column) {
                        c.schedule_mut().failed(now);
                    }
                    events.push(self.failure(&format!("Failed to refresh {}", column), &e));
                }
            },
            WorkerMessage::Action {
                status_id,
                action,
                result,
            } => match result {
                Ok(status) => {
                    let outcome = ActionOutcome {
                        status_id,
                        action,
                        status,
                    };
                    for name in &self.order {
                        if let Some(column) = self.columns.get_mut(name) {
                            let changes = column.apply_action(&outcome);
                            push_changes(&mut events, name, changes);
                        }
                    }
                }
                Err(e) => {
                    warn!("{} on {} failed: {:#}", action.name(), status_id, e);
                    events.push(SessionEvent::ActionFailed {
                        status_id,
                        action,
                        message: format!("{:#}", e),
                    });
                }
            },
            WorkerMessage::Context {
                column,
                status_id,
                result,
            } => match result {
                Ok(context) => {
                    if let Some(c) = self.columns.get_mut(&column) {
                        context
                            .ancestors
                            .into_iter()
                            .chain(context.descendants)
                            .for_each(|post| c.queue_post(post));
                        let changes = c.add_queued();
                        push_changes(&mut events, &column, changes);
                    }
                }
                Err(e) => {
                    events.push(self.failure(&format!("Failed to load the thread of {}", status_id), &e))
                }
            },
            WorkerMessage::History { status_id, result } => {
                self.pending_history.remove(&status_id);
                match result {
                    Ok(history) => events.extend(self.store_history(&status_id, history)),
                    Err(e) => events.push(
                        self.failure(&format!("Failed to load the edits of {}", status_id), &e),
                    ),
                }
            }
        }

        self.follow_edits(&events);
        events.extend(self.take_unread_change());
        events
    }

    fn handle_stream(&mut self, message: StreamMessage, events: &mut Vec<SessionEvent>) {
        let StreamMessage { stream, event } = message;

        match event {
            StreamEvent::Connected => events.push(SessionEvent::StreamConnected {
                stream: stream.name(),
            }),
            StreamEvent::Disconnected(reason) => events.push(SessionEvent::StreamDisconnected {
                stream: stream.name(),
                reason,
            }),
            StreamEvent::Update(post) => {
                for column in self.columns.values_mut() {
                    if column.kind().stream().as_ref() == Some(&stream) {
                        column.queue_post(post.clone());
                    }
                }
            }
            StreamEvent::Notification(notification) => {
                for column in self.columns.values_mut() {
                    if column.kind().stream().as_ref() == Some(&stream) {
                        column.queue_notification(notification.clone());
                    }
                }
            }
            StreamEvent::Conversation(conversation) => {
                for column in self.columns.values_mut() {
                    if column.kind().stream().as_ref() == Some(&stream) {
                        column.queue_conversation(conversation.clone());
                    }
                }
            }
            StreamEvent::Delete(id) => {
                for name in &self.order {
                    if let Some(column) = self.columns.get_mut(name) {
                        if column.kind().content() == ColumnContent::Posts {
                            let changes = column.remove(&id);
                            push_changes(events, name, changes);
                        }
                    }
                }
            }
            StreamEvent::StatusUpdate(post) => {
                for name in &self.order {
                    if let Some(column) = self.columns.get_mut(name) {
                        let changes = column.update_post(post.clone());
                        push_changes(events, name, changes);
                    }
                }
            }
        }
    }

    /// Fetch the history of every post reported as edited
    fn follow_edits(&mut self, events: &[SessionEvent]) {
        for event in events {
            let SessionEvent::ColumnChanged { changes, .. } = event else {
                continue;
            };
            for status_id in changes.edited() {
                if !self.pending_history.insert(status_id.clone()) {
                    continue;
                }
                let api = self.api.clone();
                spawn_worker(&self.worker_tx, async move {
                    let result = api.status_history(&status_id).await;
                    WorkerMessage::History { status_id, result }
                });
            }
        }
    }

    fn failure(&self, what: &str, error: &anyhow::Error) -> SessionEvent {
        warn!("{}: {:#}", what, error);
        if is_token_rejected(error) {
            SessionEvent::LoginStatus(LoginStatus::Revoked)
        } else {
            SessionEvent::Error {
                message: format!("{}: {:#}", what, error),
            }
        }
    }

    /// Unread counts, if they changed since the last report
    pub fn take_unread_change(&mut self) -> Option<SessionEvent> {
        let columns: BTreeMap<String, usize> = self
            .columns
            .iter()
            .map(|(name, c)| (name.clone(), c.unread_count()))
            .collect();
        if columns == self.last_unread {
            return None;
        }

        self.last_unread = columns.clone();
        Some(SessionEvent::UnreadChanged {
            total: columns.values().sum(),
            columns,
        })
    }

    pub fn shutdown(&mut self) {
        self.streams.stop_all();
    }
}
