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

//! Flat feed for notification and conversation columns

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{Conversation, Notification};

use super::{compare_ids, FeedChange};

/// An item a [`FlatFeed`] can hold
pub trait FeedEntry: Clone + Serialize {
    fn entry_id(&self) -> &str;

    /// Read state reported by the server, if the item type carries one
    fn server_unread(&self) -> Option<bool> {
        None
    }
}

impl FeedEntry for Notification {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

impl FeedEntry for Conversation {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn server_unread(&self) -> Option<bool> {
        Some(self.unread)
    }
}

/// Newest-first list without threading
#[derive(Debug)]
pub struct FlatFeed<T> {
    counts_unread: bool,
    entries: HashMap<String, T>,
    order: Vec<String>,
    unread: HashSet<String>,
    queue: Vec<T>,
}

impl<T: FeedEntry> FlatFeed<T> {
    pub fn new(counts_unread: bool) -> Self {
        Self {
            counts_unread,
            entries: HashMap::new(),
            order: Vec::new(),
            unread: HashSet::new(),
            queue: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn is_unread(&self, id: &str) -> bool {
        self.unread.contains(id)
    }

    pub fn unread_count(&self) -> usize {
        if self.counts_unread {
            self.unread.len()
        } else {
            0
        }
    }

    /// Insert a new item in id order, or replace a known one
    pub fn add(&mut self, item: T) -> Vec<FeedChange<T>> {
        let id = item.entry_id().to_string();

        if let Some(existing) = self.entries.get_mut(&id) {
            match item.server_unread() {
                Some(true) => {
                    self.unread.insert(id.clone());
                }
                Some(false) => {
                    self.unread.remove(&id);
                }
                None => {}
            }
            *existing = item.clone();
            return vec![FeedChange::Updated { id, entry: item }];
        }

        let index = self
            .order
            .iter()
            .position(|o| compare_ids(o, &id) == Ordering::Less)
            .unwrap_or(self.order.len());
        self.order.insert(index, id.clone());
        if item.server_unread().unwrap_or(true) {
            self.unread.insert(id.clone());
        }
        self.entries.insert(id.clone(), item.clone());

        vec![FeedChange::Inserted {
            id,
            index,
            parent: None,
            entry: item,
        }]
    }

    pub fn remove(&mut self, id: &str) -> Vec<FeedChange<T>> {
        if self.entries.remove(id).is_none() {
            return Vec::new();
        }
        self.order.retain(|o| o != id);
        self.unread.remove(id);
        vec![FeedChange::Removed { id: id.to_string() }]
    }

    pub fn clear(&mut self) -> Vec<FeedChange<T>> {
        let ids = std::mem::take(&mut self.order);
        self.entries.clear();
        self.unread.clear();
        ids.into_iter().map(|id| FeedChange::Removed { id }).collect()
    }

    /// Drop the oldest items beyond `max_len`
    pub fn purge(&mut self, max_len: usize) -> Vec<FeedChange<T>> {
        let mut changes = Vec::new();
        while self.order.len() > max_len {
            let Some(oldest) = self.order.last().cloned() else {
                break;
            };
            changes.extend(self.remove(&oldest));
        }
        changes
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        self.unread.remove(id)
    }

    pub fn mark_all_read(&mut self) -> usize {
        let count = self.unread.len();
        self.unread.clear();
        count
    }

    /// First unread item strictly after `after`
    pub fn next_unread(&self, after: Option<&str>) -> Option<String> {
        let start = after
            .and_then(|a| self.order.iter().position(|id| id == a))
            .map(|i| i + 1)
            .unwrap_or(0);

        self.order[start..]
            .iter()
            .find(|id| self.unread.contains(id.as_str()))
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<&T> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .collect()
    }

    /// Queue an item for the next drain, replacing a queued copy with the same id
    pub fn queue(&mut self, item: T) {
        match self
            .queue
            .iter_mut()
            .find(|q| q.entry_id() == item.entry_id())
        {
            Some(queued) => *queued = item,
            None => self.queue.push(item),
        }
    }

    pub fn has_queued(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn add_queued(&mut self) -> Vec<FeedChange<T>> {
        let queued = std::mem::take(&mut self.queue);
        queued.into_iter().flat_map(|item| self.add(item)).collect()
    }
}
