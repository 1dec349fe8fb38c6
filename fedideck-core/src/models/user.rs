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

//! User model representing a Mastodon account

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Mastodon user/account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: String,

    /// Username (without domain)
    pub username: String,

    /// Full account name (user@domain or user for local)
    pub acct: String,

    /// Display name
    #[serde(default)]
    pub display_name: String,

    /// Profile bio (HTML)
    #[serde(default)]
    pub note: String,

    /// URL to the user's profile page
    pub url: String,

    /// URL to the user's avatar image
    #[serde(default)]
    pub avatar: String,

    /// URL to the static avatar (for GIF avatars)
    #[serde(default)]
    pub avatar_static: String,

    /// URL to the user's header image
    #[serde(default)]
    pub header: String,

    /// URL to the static header
    #[serde(default)]
    pub header_static: String,

    /// Whether the account is locked (requires follow approval)
    #[serde(default)]
    pub locked: bool,

    /// Custom fields on the profile
    #[serde(default)]
    pub fields: Vec<ProfileField>,

    /// Custom emoji used in display name or bio
    #[serde(default)]
    pub emojis: Vec<CustomEmoji>,

    /// Whether this is a bot account
    #[serde(default)]
    pub bot: bool,

    /// Whether this is a group account
    #[serde(default)]
    pub group: bool,

    /// Whether profile is discoverable
    pub discoverable: Option<bool>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account last posted
    pub last_status_at: Option<String>,

    /// Number of posts
    #[serde(default)]
    pub statuses_count: u64,

    /// Number of followers
    #[serde(default)]
    pub followers_count: u64,

    /// Number of accounts following
    #[serde(default)]
    pub following_count: u64,
}

/// A custom field on a user's profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileField {
    pub name: String,
    pub value: String,
    pub verified_at: Option<DateTime<Utc>>,
}

/// A custom emoji
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomEmoji {
    pub shortcode: String,
    pub url: String,
    pub static_url: String,
    #[serde(default)]
    pub visible_in_picker: bool,
    pub category: Option<String>,
}

/// Relationship between the current user and another account
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Relationship {
    pub id: String,
    pub following: bool,
    pub showing_reblogs: bool,
    pub notifying: bool,
    pub languages: Option<Vec<String>>,
    pub followed_by: bool,
    pub blocking: bool,
    pub blocked_by: bool,
    pub muting: bool,
    pub muting_notifications: bool,
    pub requested: bool,
    pub requested_by: bool,
    pub domain_blocking: bool,
    pub endorsed: bool,
    pub note: String,
}
