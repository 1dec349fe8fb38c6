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

//! Column kinds and paging requests

use serde::{Deserialize, Serialize};

/// What a column shows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnKind {
    /// Posts from followed accounts
    Home,
    Notifications,
    /// Posts from the instance
    Local,
    /// Posts from all known instances
    Public,
    /// Direct messages
    Conversations,
    Favourites,
    Bookmarks,
    Hashtag { tag: String },
    List { list_id: String },
}

/// Entry type a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnContent {
    Posts,
    Notifications,
    Conversations,
}

/// Streaming endpoint feeding a column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamKind {
    User,
    Local,
    Public,
    Direct,
    Hashtag(String),
    List(String),
}

impl ColumnKind {
    /// Parse a column name as used over IPC ("home", "tag:rust", "list:42", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(tag) = name.strip_prefix("tag:") {
            let tag = tag.trim_start_matches('#');
            return (!tag.is_empty()).then(|| ColumnKind::Hashtag { tag: tag.to_string() });
        }
        if let Some(list_id) = name.strip_prefix("list:") {
            return (!list_id.is_empty()).then(|| ColumnKind::List { list_id: list_id.to_string() });
        }

        match name {
            "home" => Some(ColumnKind::Home),
            "notifications" => Some(ColumnKind::Notifications),
            "local" => Some(ColumnKind::Local),
            "public" => Some(ColumnKind::Public),
            "conversations" => Some(ColumnKind::Conversations),
            "favorites" | "favourites" => Some(ColumnKind::Favourites),
            "bookmarks" => Some(ColumnKind::Bookmarks),
            _ => None,
        }
    }

    /// Name used as the column key
    pub fn name(&self) -> String {
        match self {
            ColumnKind::Home => "home".to_string(),
            ColumnKind::Notifications => "notifications".to_string(),
            ColumnKind::Local => "local".to_string(),
            ColumnKind::Public => "public".to_string(),
            ColumnKind::Conversations => "conversations".to_string(),
            ColumnKind::Favourites => "favorites".to_string(),
            ColumnKind::Bookmarks => "bookmarks".to_string(),
            ColumnKind::Hashtag { tag } => format!("tag:{}", tag),
            ColumnKind::List { list_id } => format!("list:{}", list_id),
        }
    }

    /// Get a display name for this column
    pub fn display_name(&self) -> String {
        match self {
            ColumnKind::Home => "Home".to_string(),
            ColumnKind::Notifications => "Notifications".to_string(),
            ColumnKind::Local => "Local".to_string(),
            ColumnKind::Public => "Federated".to_string(),
            ColumnKind::Conversations => "Conversations".to_string(),
            ColumnKind::Favourites => "Favorites".to_string(),
            ColumnKind::Bookmarks => "Bookmarks".to_string(),
            ColumnKind::Hashtag { tag } => format!("#{}", tag),
            ColumnKind::List { list_id } => format!("List: {}", list_id),
        }
    }

    pub fn content(&self) -> ColumnContent {
        match self {
            ColumnKind::Notifications => ColumnContent::Notifications,
            ColumnKind::Conversations => ColumnContent::Conversations,
            _ => ColumnContent::Posts,
        }
    }

    /// Firehose columns move too fast for unread tracking to mean anything
    pub fn counts_unread(&self) -> bool {
        !matches!(self, ColumnKind::Local | ColumnKind::Public)
    }

    /// Firehose columns are trimmed even while the window is in the background
    pub fn always_purge(&self) -> bool {
        matches!(self, ColumnKind::Local | ColumnKind::Public)
    }

    pub fn stream(&self) -> Option<StreamKind> {
        match self {
            ColumnKind::Home | ColumnKind::Notifications => Some(StreamKind::User),
            ColumnKind::Local => Some(StreamKind::Local),
            ColumnKind::Public => Some(StreamKind::Public),
            ColumnKind::Conversations => Some(StreamKind::Direct),
            ColumnKind::Hashtag { tag } => Some(StreamKind::Hashtag(tag.clone())),
            ColumnKind::List { list_id } => Some(StreamKind::List(list_id.clone())),
            ColumnKind::Favourites | ColumnKind::Bookmarks => None,
        }
    }
}

impl StreamKind {
    pub fn name(&self) -> String {
        match self {
            StreamKind::User => "user".to_string(),
            StreamKind::Local => "public:local".to_string(),
            StreamKind::Public => "public".to_string(),
            StreamKind::Direct => "direct".to_string(),
            StreamKind::Hashtag(tag) => format!("hashtag:{}", tag),
            StreamKind::List(id) => format!("list:{}", id),
        }
    }
}

/// Paging parameters for a column fetch
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of entries to return
    pub limit: Option<u32>,
    /// Return entries older than this ID
    pub max_id: Option<String>,
    /// Return entries newer than this ID
    pub since_id: Option<String>,
    /// Return entries immediately newer than this ID
    pub min_id: Option<String>,
}

impl PageRequest {
    /// Query string for the REST pass-through (without the leading '?')
    pub fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }
        for (key, value) in [
            ("max_id", &self.max_id),
            ("since_id", &self.since_id),
            ("min_id", &self.min_id),
        ] {
            if let Some(value) = value {
                parts.push(format!("{}={}", key, urlencoding::encode(value)));
            }
        }
        parts.join("&")
    }
}
