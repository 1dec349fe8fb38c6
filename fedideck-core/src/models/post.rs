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

//! Post model representing a Mastodon status/toot
//!
//! Field names follow the Mastodon REST payloads so responses fetched through
//! the REST pass-through deserialize without an intermediate type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CustomEmoji, MediaAttachment, User};

/// Visibility level for a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    /// Parse a stored preference value, falling back to public
    pub fn from_setting(value: &str) -> Self {
        match value {
            "unlisted" => Visibility::Unlisted,
            "private" => Visibility::Private,
            "direct" => Visibility::Direct,
            _ => Visibility::Public,
        }
    }
}

/// A poll attached to a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poll {
    pub id: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub votes_count: u64,
    pub voters_count: Option<u64>,
    pub options: Vec<PollOption>,
    pub voted: Option<bool>,
    pub own_votes: Option<Vec<u32>>,
}

/// A single option in a poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollOption {
    pub title: String,
    pub votes_count: Option<u64>,
}

/// Application that posted the status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub name: String,
    pub website: Option<String>,
}

/// A Mastodon post/status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Unique identifier for this post
    pub id: String,

    /// URI of the post (ActivityPub)
    pub uri: String,

    /// URL to the post's HTML representation
    pub url: Option<String>,

    /// The account that authored this post
    pub account: User,

    /// HTML content of the post
    pub content: String,

    /// Plain text content
    #[serde(default)]
    pub plain_content: Option<String>,

    /// Content warning text (if any)
    #[serde(default)]
    pub spoiler_text: String,

    /// Visibility of this post
    #[serde(default)]
    pub visibility: Visibility,

    /// Whether this is a sensitive post
    #[serde(default)]
    pub sensitive: bool,

    /// When this post was created
    pub created_at: DateTime<Utc>,

    /// When this post was last edited (if ever)
    pub edited_at: Option<DateTime<Utc>>,

    /// Language of the post (ISO 639-1)
    pub language: Option<String>,

    /// ID of the post this is replying to
    pub in_reply_to_id: Option<String>,

    /// ID of the account this is replying to
    pub in_reply_to_account_id: Option<String>,

    /// Media attachments
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,

    /// Hashtags mentioned in the post
    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Accounts mentioned in the post
    #[serde(default)]
    pub mentions: Vec<Mention>,

    /// Custom emoji used in the post
    #[serde(default)]
    pub emojis: Vec<CustomEmoji>,

    /// Number of boosts
    #[serde(default)]
    pub reblogs_count: u64,

    /// Number of favorites
    #[serde(default)]
    pub favourites_count: u64,

    /// Number of replies
    #[serde(default)]
    pub replies_count: u64,

    /// The boosted post (if this is a boost)
    pub reblog: Option<Box<Post>>,

    /// Poll attached to this post
    pub poll: Option<Poll>,

    /// Application used to post this
    pub application: Option<Application>,

    /// Whether the current user has boosted this
    pub reblogged: Option<bool>,

    /// Whether the current user has favorited this
    pub favourited: Option<bool>,

    /// Whether the current user has bookmarked this
    pub bookmarked: Option<bool>,

    /// Whether the current user has muted this conversation
    pub muted: Option<bool>,

    /// Whether this is pinned on the author's profile
    pub pinned: Option<bool>,
}

/// A hashtag mentioned in a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub name: String,
    pub url: String,
}

/// An account mentioned in a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mention {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub url: String,
}

/// Ancestors and descendants of a post
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatusContext {
    pub ancestors: Vec<Post>,
    pub descendants: Vec<Post>,
}

/// One revision of an edited post, as returned by the status history endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEdit {
    pub content: String,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub sensitive: bool,
    pub created_at: DateTime<Utc>,
    pub account: Option<User>,
    /// Histories only carry the poll options, not the results
    pub poll: Option<EditedPoll>,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    #[serde(default)]
    pub emojis: Vec<CustomEmoji>,
}

/// Poll as preserved in a status history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditedPoll {
    pub options: Vec<EditedPollOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditedPollOption {
    pub title: String,
}

/// Request to create a new post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub content: String,
    pub spoiler_text: Option<String>,
    /// Falls back to the preferred visibility when absent
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub sensitive: bool,
    /// Falls back to the preferred language when absent
    pub language: Option<String>,
    pub in_reply_to_id: Option<String>,
    #[serde(default)]
    pub media_ids: Vec<String>,
    pub poll: Option<NewPoll>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request to create a poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPoll {
    pub options: Vec<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub hide_totals: bool,
}

/// Something the user can do to a status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Favourite,
    Unfavourite,
    Boost,
    Unboost,
    Bookmark,
    Unbookmark,
    Mute,
    Unmute,
    Delete,
    Reload,
}

impl StatusAction {
    pub fn name(&self) -> &'static str {
        match self {
            StatusAction::Favourite => "favourite",
            StatusAction::Unfavourite => "unfavourite",
            StatusAction::Boost => "boost",
            StatusAction::Unboost => "unboost",
            StatusAction::Bookmark => "bookmark",
            StatusAction::Unbookmark => "unbookmark",
            StatusAction::Mute => "mute",
            StatusAction::Unmute => "unmute",
            StatusAction::Delete => "delete",
            StatusAction::Reload => "reload",
        }
    }
}

/// Result of a finished status action, routed back to every column
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionOutcome {
    pub status_id: String,
    pub action: StatusAction,
    /// The status as the server returned it; `None` after a delete
    pub status: Option<Post>,
}
