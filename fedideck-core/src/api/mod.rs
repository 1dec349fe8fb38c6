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

//! Protocol client
//!
//! Everything the core asks of an instance goes through [`SocialApi`]. The
//! production implementation wraps megalodon and falls back to plain REST
//! calls for endpoints megalodon does not model.

mod client;
mod converter;
mod rest;

#[cfg(test)]
pub mod fake;

pub use client::*;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::{
    ColumnKind, Conversation, CustomEmoji, InstanceInfo, MediaAttachment, MediaUploadRequest,
    NewPost, Notification, PageRequest, Poll, Post, Relationship, StatusAction, StatusContext,
    StatusEdit, StreamKind, User,
};
use crate::streaming::StreamEvent;

/// Calls the core makes against a logged-in account
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn verify_credentials(&self) -> Result<User>;

    async fn instance(&self) -> Result<InstanceInfo>;

    async fn custom_emojis(&self) -> Result<Vec<CustomEmoji>>;

    /// One page of a post column
    async fn timeline(&self, kind: &ColumnKind, page: &PageRequest) -> Result<Vec<Post>>;

    async fn notifications(&self, page: &PageRequest) -> Result<Vec<Notification>>;

    async fn conversations(&self, page: &PageRequest) -> Result<Vec<Conversation>>;

    async fn status(&self, id: &str) -> Result<Post>;

    async fn status_context(&self, id: &str) -> Result<StatusContext>;

    /// Every version of an edited status, oldest first
    async fn status_history(&self, id: &str) -> Result<Vec<StatusEdit>>;

    /// Run an action; returns the status as the server reports it afterwards,
    /// or `None` for a delete
    async fn status_action(&self, id: &str, action: StatusAction) -> Result<Option<Post>>;

    async fn vote_poll(&self, poll_id: &str, choices: &[u32]) -> Result<Poll>;

    async fn dismiss_notification(&self, id: &str) -> Result<()>;

    async fn clear_notifications(&self) -> Result<()>;

    /// Publish a post; `None` when the server scheduled it for later
    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>>;

    async fn upload_media(&self, request: &MediaUploadRequest) -> Result<MediaAttachment>;

    /// Follow, optionally with notifications for every new post
    async fn follow(&self, account_id: &str, notify: bool) -> Result<Relationship>;

    async fn unfollow(&self, account_id: &str) -> Result<Relationship>;

    /// Stream events into `tx` until the connection ends
    async fn stream(&self, kind: &StreamKind, tx: mpsc::Sender<StreamEvent>) -> Result<()>;
}
