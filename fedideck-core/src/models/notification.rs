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

//! Notification and conversation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Post, User};

/// Type of notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Someone mentioned you
    Mention,
    /// Someone boosted your post
    Reblog,
    /// Someone favorited your post
    Favourite,
    /// Someone followed you
    Follow,
    /// Someone requested to follow you
    FollowRequest,
    /// A poll you voted in has ended
    Poll,
    /// Someone you enabled notifications for posted
    Status,
    /// A post you interacted with was edited
    Update,
    #[serde(other)]
    Unknown,
}

/// A notification from Mastodon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    pub created_at: DateTime<Utc>,

    /// The account that triggered the notification
    pub account: User,

    /// The mentioning, boosted or favourited post; follows carry none
    pub status: Option<Post>,
}

/// A direct-message conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,

    /// Participants other than the current user
    #[serde(default)]
    pub accounts: Vec<User>,

    pub last_status: Option<Post>,

    #[serde(default)]
    pub unread: bool,
}
