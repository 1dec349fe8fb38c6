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

//! Builders for test payloads

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use super::{Conversation, Notification, NotificationType, Post, User, Visibility};

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("user{}", id),
        acct: format!("user{}@example.social", id),
        display_name: format!("User {}", id),
        note: String::new(),
        url: format!("https://example.social/@user{}", id),
        avatar: String::new(),
        avatar_static: String::new(),
        header: String::new(),
        header_static: String::new(),
        locked: false,
        fields: vec![],
        emojis: vec![],
        bot: false,
        group: false,
        discoverable: None,
        created_at: Utc.with_ymd_and_hms(2022, 11, 1, 12, 0, 0).unwrap(),
        last_status_at: None,
        statuses_count: 0,
        followers_count: 0,
        following_count: 0,
    }
}

pub fn post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        uri: format!("https://example.social/statuses/{}", id),
        url: Some(format!("https://example.social/@user1/{}", id)),
        account: user("1"),
        content: format!("<p>post {}</p>", id),
        plain_content: None,
        spoiler_text: String::new(),
        visibility: Visibility::Public,
        sensitive: false,
        created_at: Utc.with_ymd_and_hms(2023, 3, 4, 10, 0, 0).unwrap(),
        edited_at: None,
        language: Some("en".to_string()),
        in_reply_to_id: None,
        in_reply_to_account_id: None,
        media_attachments: vec![],
        tags: vec![],
        mentions: vec![],
        emojis: vec![],
        reblogs_count: 0,
        favourites_count: 0,
        replies_count: 0,
        reblog: None,
        poll: None,
        application: None,
        reblogged: None,
        favourited: None,
        bookmarked: None,
        muted: None,
        pinned: None,
    }
}

pub fn reply(id: &str, parent: &str) -> Post {
    Post {
        in_reply_to_id: Some(parent.to_string()),
        in_reply_to_account_id: Some("1".to_string()),
        ..post(id)
    }
}

/// A boost with id `wrapper_id` by account `booster` of `inner`
pub fn boost(wrapper_id: &str, booster: &str, inner: Post) -> Post {
    Post {
        account: user(booster),
        content: String::new(),
        reblog: Some(Box::new(inner)),
        ..post(wrapper_id)
    }
}

pub fn notification(id: &str) -> Notification {
    Notification {
        id: id.to_string(),
        notification_type: NotificationType::Mention,
        created_at: Utc.with_ymd_and_hms(2023, 3, 4, 10, 0, 0).unwrap(),
        account: user("2"),
        status: Some(post(id)),
    }
}

pub fn conversation(id: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        accounts: vec![user("3")],
        last_status: Some(post(id)),
        unread: true,
    }
}

/// An account as the Mastodon REST API sends it
pub fn account_json(id: &str) -> Value {
    json!({
        "id": id,
        "username": format!("user{}", id),
        "acct": format!("user{}", id),
        "display_name": format!("User {}", id),
        "locked": false,
        "bot": false,
        "discoverable": true,
        "group": false,
        "created_at": "2022-11-01T00:00:00.000Z",
        "note": "<p>hello</p>",
        "url": format!("https://example.social/@user{}", id),
        "avatar": "https://files.example.social/avatars/original/missing.png",
        "avatar_static": "https://files.example.social/avatars/original/missing.png",
        "header": "https://files.example.social/headers/original/missing.png",
        "header_static": "https://files.example.social/headers/original/missing.png",
        "followers_count": 12,
        "following_count": 3,
        "statuses_count": 140,
        "last_status_at": "2023-03-04",
        "noindex": false,
        "emojis": [],
        "roles": [],
        "fields": [
            { "name": "Site", "value": "<a href=\"https://example.org\">example.org</a>", "verified_at": null }
        ]
    })
}

/// A plain public status as the Mastodon REST API sends it
pub fn status_json(id: &str, account_id: &str) -> Value {
    json!({
        "id": id,
        "created_at": "2023-03-04T10:00:00.000Z",
        "in_reply_to_id": null,
        "in_reply_to_account_id": null,
        "sensitive": false,
        "spoiler_text": "",
        "visibility": "public",
        "language": "en",
        "uri": format!("https://example.social/users/user{}/statuses/{}", account_id, id),
        "url": format!("https://example.social/@user{}/{}", account_id, id),
        "replies_count": 0,
        "reblogs_count": 0,
        "favourites_count": 0,
        "edited_at": null,
        "favourited": false,
        "reblogged": false,
        "muted": false,
        "bookmarked": false,
        "content": format!("<p>post {}</p>", id),
        "filtered": [],
        "reblog": null,
        "application": null,
        "account": account_json(account_id),
        "media_attachments": [],
        "mentions": [],
        "tags": [],
        "emojis": [],
        "card": null,
        "poll": null
    })
}
