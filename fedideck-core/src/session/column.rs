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

//! A column: one feed plus its polling schedule

use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::feed::{FeedChange, FlatFeed, PostEntry, PostFeed, RefreshSchedule};
use crate::models::{
    ActionOutcome, ColumnContent, ColumnKind, Conversation, Notification, PageRequest, Post,
    StatusEdit,
};

/// Largest page Mastodon serves for timelines and notifications
const MAX_PAGE_SIZE: usize = 40;

pub enum ColumnFeed {
    Posts(PostFeed),
    Notifications(FlatFeed<Notification>),
    Conversations(FlatFeed<Conversation>),
}

/// One fetched page
#[derive(Debug, Clone)]
pub enum ColumnPage {
    Posts(Vec<Post>),
    Notifications(Vec<Notification>),
    Conversations(Vec<Conversation>),
}

impl ColumnPage {
    pub fn ids(&self) -> Vec<String> {
        match self {
            ColumnPage::Posts(posts) => posts.iter().map(|p| p.id.clone()).collect(),
            ColumnPage::Notifications(items) => items.iter().map(|n| n.id.clone()).collect(),
            ColumnPage::Conversations(items) => items.iter().map(|c| c.id.clone()).collect(),
        }
    }
}

/// Changes of one column, in the order they happened
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ColumnChanges {
    Posts(Vec<FeedChange<PostEntry>>),
    Notifications(Vec<FeedChange<Notification>>),
    Conversations(Vec<FeedChange<Conversation>>),
}

impl ColumnChanges {
    pub fn len(&self) -> usize {
        match self {
            ColumnChanges::Posts(c) => c.len(),
            ColumnChanges::Notifications(c) => c.len(),
            ColumnChanges::Conversations(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `other`; both must belong to the same column
    pub fn extend(&mut self, other: ColumnChanges) {
        match (self, other) {
            (ColumnChanges::Posts(a), ColumnChanges::Posts(b)) => a.extend(b),
            (ColumnChanges::Notifications(a), ColumnChanges::Notifications(b)) => a.extend(b),
            (ColumnChanges::Conversations(a), ColumnChanges::Conversations(b)) => a.extend(b),
            _ => {}
        }
    }

    /// Posts whose content changed on the server
    pub fn edited(&self) -> Vec<String> {
        match self {
            ColumnChanges::Posts(changes) => changes
                .iter()
                .filter_map(|c| match c {
                    FeedChange::Edited { id } => Some(id.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Column summary for the UI
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub title: String,
    pub entries: usize,
    pub unread: usize,
    pub refresh_in_secs: u64,
}

pub struct Column {
    kind: ColumnKind,
    feed: ColumnFeed,
    schedule: RefreshSchedule,
}

impl Column {
    pub fn new(kind: ColumnKind, my_id: &str, interval: Duration, now: Instant) -> Self {
        let feed = match kind.content() {
            ColumnContent::Posts => ColumnFeed::Posts(PostFeed::new(&kind, my_id)),
            ColumnContent::Notifications => {
                ColumnFeed::Notifications(FlatFeed::new(kind.counts_unread()))
            }
            ColumnContent::Conversations => {
                ColumnFeed::Conversations(FlatFeed::new(kind.counts_unread()))
            }
        };

        Self {
            kind,
            feed,
            schedule: RefreshSchedule::new(interval, now),
        }
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn schedule(&self) -> &RefreshSchedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut RefreshSchedule {
        &mut self.schedule
    }

    pub fn len(&self) -> usize {
        match &self.feed {
            ColumnFeed::Posts(f) => f.len(),
            ColumnFeed::Notifications(f) => f.len(),
            ColumnFeed::Conversations(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.feed {
            ColumnFeed::Posts(f) => f.is_empty(),
            ColumnFeed::Notifications(f) => f.is_empty(),
            ColumnFeed::Conversations(f) => f.is_empty(),
        }
    }

    /// Whether fetched or streamed entries wait for the next drain
    pub fn has_queued(&self) -> bool {
        match &self.feed {
            ColumnFeed::Posts(f) => f.has_queued(),
            ColumnFeed::Notifications(f) => f.has_queued(),
            ColumnFeed::Conversations(f) => f.has_queued(),
        }
    }

    pub fn unread_count(&self) -> usize {
        match &self.feed {
            ColumnFeed::Posts(f) => f.unread_count(),
            ColumnFeed::Notifications(f) => f.unread_count(),
            ColumnFeed::Conversations(f) => f.unread_count(),
        }
    }

    pub fn info(&self, now: Instant) -> ColumnInfo {
        ColumnInfo {
            name: self.kind.name(),
            title: self.kind.display_name(),
            entries: self.len(),
            unread: self.unread_count(),
            refresh_in_secs: self.schedule.remaining(now).as_secs(),
        }
    }

    /// Claim the next poll if it is due, asking for up to `max_len` entries
    pub fn due_fetch(&mut self, now: Instant, max_len: usize) -> Option<PageRequest> {
        let plan = self.schedule.plan(now)?;
        Some(PageRequest {
            limit: Some(max_len.clamp(1, MAX_PAGE_SIZE) as u32),
            since_id: plan.since_id,
            ..Default::default()
        })
    }

    /// Queue a fetched page for the next drain
    pub fn fetched(&mut self, now: Instant, page: ColumnPage) {
        let ids = page.ids();
        self.schedule.completed(now, ids.iter().map(String::as_str));

        match (&mut self.feed, page) {
            (ColumnFeed::Posts(feed), ColumnPage::Posts(posts)) => {
                posts.into_iter().for_each(|p| feed.queue_post(p))
            }
            (ColumnFeed::Notifications(feed), ColumnPage::Notifications(items)) => {
                items.into_iter().for_each(|n| feed.queue(n))
            }
            (ColumnFeed::Conversations(feed), ColumnPage::Conversations(items)) => {
                items.into_iter().for_each(|c| feed.queue(c))
            }
            _ => {}
        }
    }

    pub fn queue_post(&mut self, post: Post) {
        if let ColumnFeed::Posts(feed) = &mut self.feed {
            feed.queue_post(post);
        }
    }

    pub fn queue_notification(&mut self, notification: Notification) {
        if let ColumnFeed::Notifications(feed) = &mut self.feed {
            feed.queue(notification);
        }
    }

    pub fn queue_conversation(&mut self, conversation: Conversation) {
        if let ColumnFeed::Conversations(feed) = &mut self.feed {
            feed.queue(conversation);
        }
    }

    pub fn add_queued(&mut self) -> ColumnChanges {
        match &mut self.feed {
            ColumnFeed::Posts(f) => ColumnChanges::Posts(f.add_queued()),
            ColumnFeed::Notifications(f) => ColumnChanges::Notifications(f.add_queued()),
            ColumnFeed::Conversations(f) => ColumnChanges::Conversations(f.add_queued()),
        }
    }

    /// Trim to `max_len` entries. Unread entries of columns that count them
    /// are only dropped while the window is active.
    pub fn purge(&mut self, max_len: usize, window_active: bool) -> ColumnChanges {
        let trim_flat = window_active || !self.kind.counts_unread();
        match &mut self.feed {
            ColumnFeed::Posts(f) => ColumnChanges::Posts(f.purge(max_len, window_active)),
            ColumnFeed::Notifications(f) => {
                ColumnChanges::Notifications(if trim_flat { f.purge(max_len) } else { Vec::new() })
            }
            ColumnFeed::Conversations(f) => {
                ColumnChanges::Conversations(if trim_flat { f.purge(max_len) } else { Vec::new() })
            }
        }
    }

    /// Remove a post, or the notification/conversation with that id
    pub fn remove(&mut self, id: &str) -> ColumnChanges {
        match &mut self.feed {
            ColumnFeed::Posts(f) => ColumnChanges::Posts(f.remove_post(id)),
            ColumnFeed::Notifications(f) => ColumnChanges::Notifications(f.remove(id)),
            ColumnFeed::Conversations(f) => ColumnChanges::Conversations(f.remove(id)),
        }
    }

    pub fn clear(&mut self) -> ColumnChanges {
        match &mut self.feed {
            ColumnFeed::Posts(f) => {
                let roots = f.roots().to_vec();
                ColumnChanges::Posts(roots.iter().flat_map(|id| f.remove_post(id)).collect())
            }
            ColumnFeed::Notifications(f) => ColumnChanges::Notifications(f.clear()),
            ColumnFeed::Conversations(f) => ColumnChanges::Conversations(f.clear()),
        }
    }

    /// Replace a post this column already shows, e.g. after an edit
    pub fn update_post(&mut self, post: Post) -> ColumnChanges {
        match &mut self.feed {
            ColumnFeed::Posts(f) => {
                let target = post.reblog.as_ref().map(|r| r.id.clone()).unwrap_or_else(|| post.id.clone());
                if f.contains(&target) {
                    ColumnChanges::Posts(f.add_post(post))
                } else {
                    ColumnChanges::Posts(Vec::new())
                }
            }
            ColumnFeed::Notifications(_) => ColumnChanges::Notifications(Vec::new()),
            ColumnFeed::Conversations(_) => ColumnChanges::Conversations(Vec::new()),
        }
    }

    pub fn apply_action(&mut self, outcome: &ActionOutcome) -> ColumnChanges {
        match &mut self.feed {
            ColumnFeed::Posts(f) => ColumnChanges::Posts(f.apply_action(outcome)),
            ColumnFeed::Notifications(_) => ColumnChanges::Notifications(Vec::new()),
            ColumnFeed::Conversations(_) => ColumnChanges::Conversations(Vec::new()),
        }
    }

    pub fn set_history(&mut self, id: &str, history: Vec<StatusEdit>) -> ColumnChanges {
        match &mut self.feed {
            ColumnFeed::Posts(f) => {
                let mut changes = Vec::new();
                if f.set_history(id, history) {
                    if let Some(entry) = f.entry(id) {
                        changes.push(FeedChange::Updated {
                            id: id.to_string(),
                            entry: entry.clone(),
                        });
                    }
                }
                ColumnChanges::Posts(changes)
            }
            ColumnFeed::Notifications(_) => ColumnChanges::Notifications(Vec::new()),
            ColumnFeed::Conversations(_) => ColumnChanges::Conversations(Vec::new()),
        }
    }

    pub fn history(&self, id: &str) -> Option<&Vec<StatusEdit>> {
        match &self.feed {
            ColumnFeed::Posts(f) => f.entry(id).and_then(|e| e.history.as_ref()),
            _ => None,
        }
    }

    /// Mark one entry (or all with `None`) read. Returns how many were unread.
    pub fn mark_read(&mut self, id: Option<&str>) -> usize {
        match (&mut self.feed, id) {
            (ColumnFeed::Posts(f), Some(id)) => f.mark_read(id) as usize,
            (ColumnFeed::Posts(f), None) => f.mark_all_read(),
            (ColumnFeed::Notifications(f), Some(id)) => f.mark_read(id) as usize,
            (ColumnFeed::Notifications(f), None) => f.mark_all_read(),
            (ColumnFeed::Conversations(f), Some(id)) => f.mark_read(id) as usize,
            (ColumnFeed::Conversations(f), None) => f.mark_all_read(),
        }
    }

    pub fn next_unread(&self, after: Option<&str>) -> Option<String> {
        match &self.feed {
            ColumnFeed::Posts(f) => f.next_unread(after),
            ColumnFeed::Notifications(f) => f.next_unread(after),
            ColumnFeed::Conversations(f) => f.next_unread(after),
        }
    }

    /// Everything the column shows, in display order
    pub fn snapshot(&self) -> Value {
        match &self.feed {
            ColumnFeed::Posts(f) => {
                let depths = f.display_order();
                let entries: Vec<Value> = f
                    .snapshot()
                    .into_iter()
                    .zip(depths)
                    .map(|(entry, (_, depth))| json!({ "depth": depth, "entry": entry }))
                    .collect();
                json!({ "kind": "posts", "entries": entries })
            }
            ColumnFeed::Notifications(f) => {
                let entries: Vec<Value> = f
                    .snapshot()
                    .into_iter()
                    .map(|n| json!({ "unread": f.is_unread(&n.id), "entry": n }))
                    .collect();
                json!({ "kind": "notifications", "entries": entries })
            }
            ColumnFeed::Conversations(f) => {
                let entries: Vec<Value> = f
                    .snapshot()
                    .into_iter()
                    .map(|c| json!({ "unread": f.is_unread(&c.id), "entry": c }))
                    .collect();
                json!({ "kind": "conversations", "entries": entries })
            }
        }
    }
}
