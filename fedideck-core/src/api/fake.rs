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

//! In-process [`SocialApi`] for tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::models::fixtures;
use crate::models::{
    ColumnKind, Conversation, CustomEmoji, InstanceInfo, MediaAttachment, MediaType,
    MediaUploadRequest, NewPost, Notification, PageRequest, Poll, Post, Relationship,
    StatusAction, StatusContext, StatusEdit, StreamKind, User,
};
use crate::streaming::StreamEvent;

use super::SocialApi;

/// Canned responses. Pages are handed out in order; an exhausted queue
/// answers with an empty page.
pub struct FakeApi {
    pub me: User,
    pub pages: Mutex<HashMap<String, VecDeque<Vec<Post>>>>,
    pub notification_pages: Mutex<VecDeque<Vec<Notification>>>,
    pub conversation_pages: Mutex<VecDeque<Vec<Conversation>>>,
    pub statuses: Mutex<HashMap<String, Post>>,
    pub contexts: Mutex<HashMap<String, StatusContext>>,
    pub histories: Mutex<HashMap<String, Vec<StatusEdit>>>,
    pub polls: Mutex<HashMap<String, Poll>>,
    /// Sent on every stream connection before it closes
    pub stream_events: Mutex<Vec<StreamEvent>>,
    /// Every call as "method arg"
    pub calls: Mutex<Vec<String>>,
    /// Calls whose method name is listed here fail
    pub failing: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            me: fixtures::user("1"),
            pages: Mutex::new(HashMap::new()),
            notification_pages: Mutex::new(VecDeque::new()),
            conversation_pages: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            contexts: Mutex::new(HashMap::new()),
            histories: Mutex::new(HashMap::new()),
            polls: Mutex::new(HashMap::new()),
            stream_events: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn push_page(&self, column: &str, posts: Vec<Post>) {
        self.pages
            .lock()
            .unwrap()
            .entry(column.to_string())
            .or_default()
            .push_back(posts);
    }

    pub fn fail(&self, method: &str) {
        self.failing.lock().unwrap().push(method.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str, arg: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{} {}", method, arg).trim().to_string());
        if self.failing.lock().unwrap().iter().any(|m| m == method) {
            return Err(anyhow!("{} failed", method));
        }
        Ok(())
    }
}

#[async_trait]
impl SocialApi for FakeApi {
    async fn verify_credentials(&self) -> Result<User> {
        self.record("verify_credentials", "")?;
        Ok(self.me.clone())
    }

    async fn instance(&self) -> Result<InstanceInfo> {
        self.record("instance", "")?;
        Ok(InstanceInfo {
            url: "https://example.social".to_string(),
            uri: "example.social".to_string(),
            title: "Example".to_string(),
            description: String::new(),
            version: "4.2.0".to_string(),
            user_count: None,
            status_count: None,
            domain_count: None,
            thumbnail: None,
            max_toot_chars: Some(500),
            max_media_attachments: Some(4),
            languages: vec!["en".to_string()],
            registrations: false,
            approval_required: false,
        })
    }

    async fn custom_emojis(&self) -> Result<Vec<CustomEmoji>> {
        self.record("custom_emojis", "")?;
        Ok(Vec::new())
    }

    async fn timeline(&self, kind: &ColumnKind, page: &PageRequest) -> Result<Vec<Post>> {
        let name = kind.name();
        self.record("timeline", &format!("{} {}", name, page.query_string()))?;
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get_mut(&name)
            .and_then(|pages| pages.pop_front())
            .unwrap_or_default())
    }

    async fn notifications(&self, page: &PageRequest) -> Result<Vec<Notification>> {
        self.record("notifications", &page.query_string())?;
        Ok(self.notification_pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn conversations(&self, page: &PageRequest) -> Result<Vec<Conversation>> {
        self.record("conversations", &page.query_string())?;
        Ok(self.conversation_pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn status(&self, id: &str) -> Result<Post> {
        self.record("status", id)?;
        self.statuses
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found"))
    }

    async fn status_context(&self, id: &str) -> Result<StatusContext> {
        self.record("status_context", id)?;
        Ok(self.contexts.lock().unwrap().get(id).cloned().unwrap_or_default())
    }

    async fn status_history(&self, id: &str) -> Result<Vec<StatusEdit>> {
        self.record("status_history", id)?;
        Ok(self.histories.lock().unwrap().get(id).cloned().unwrap_or_default())
    }

    async fn status_action(&self, id: &str, action: StatusAction) -> Result<Option<Post>> {
        self.record(action.name(), id)?;
        if action == StatusAction::Delete {
            return Ok(None);
        }

        let mut post = self
            .statuses
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| fixtures::post(id));
        match action {
            StatusAction::Favourite => {
                post.favourited = Some(true);
                post.favourites_count += 1;
            }
            StatusAction::Unfavourite => post.favourited = Some(false),
            StatusAction::Boost => post.reblogged = Some(true),
            StatusAction::Unboost => post.reblogged = Some(false),
            StatusAction::Bookmark => post.bookmarked = Some(true),
            StatusAction::Unbookmark => post.bookmarked = Some(false),
            StatusAction::Mute => post.muted = Some(true),
            StatusAction::Unmute => post.muted = Some(false),
            StatusAction::Delete | StatusAction::Reload => {}
        }
        Ok(Some(post))
    }

    async fn vote_poll(&self, poll_id: &str, choices: &[u32]) -> Result<Poll> {
        self.record("vote_poll", poll_id)?;
        let mut poll = self
            .polls
            .lock()
            .unwrap()
            .get(poll_id)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found"))?;
        poll.voted = Some(true);
        poll.own_votes = Some(choices.to_vec());
        Ok(poll)
    }

    async fn dismiss_notification(&self, id: &str) -> Result<()> {
        self.record("dismiss_notification", id)
    }

    async fn clear_notifications(&self) -> Result<()> {
        self.record("clear_notifications", "")
    }

    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>> {
        self.record("create_post", &post.content)?;
        if post.scheduled_at.is_some() {
            return Ok(None);
        }
        Ok(Some(Post {
            content: post.content.clone(),
            in_reply_to_id: post.in_reply_to_id.clone(),
            visibility: post.visibility.clone().unwrap_or_default(),
            language: post.language.clone(),
            ..fixtures::post("9000")
        }))
    }

    async fn upload_media(&self, request: &MediaUploadRequest) -> Result<MediaAttachment> {
        self.record("upload_media", &request.file_path)?;
        Ok(MediaAttachment {
            id: "m1".to_string(),
            media_type: MediaType::Image,
            url: "https://example.social/m1.png".to_string(),
            preview_url: None,
            remote_url: None,
            meta: None,
            description: request.description.clone(),
            blurhash: None,
        })
    }

    async fn follow(&self, account_id: &str, notify: bool) -> Result<Relationship> {
        self.record("follow", &format!("{} {}", account_id, notify))?;
        Ok(Relationship {
            id: account_id.to_string(),
            following: true,
            notifying: notify,
            ..Default::default()
        })
    }

    async fn unfollow(&self, account_id: &str) -> Result<Relationship> {
        self.record("unfollow", account_id)?;
        Ok(Relationship {
            id: account_id.to_string(),
            ..Default::default()
        })
    }

    async fn stream(&self, kind: &StreamKind, tx: mpsc::Sender<StreamEvent>) -> Result<()> {
        self.record("stream", &kind.name())?;
        let events = self.stream_events.lock().unwrap().clone();
        let _ = tx.send(StreamEvent::Connected).await;
        for event in events {
            let _ = tx.send(event).await;
        }
        Ok(())
    }
}
