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

//! Mastodon API client implementation

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use megalodon::{
    self,
    generator,
    megalodon::GetHomeTimelineInputOptions,
    megalodon::GetLocalTimelineInputOptions,
    megalodon::GetPublicTimelineInputOptions,
    megalodon::PostStatusInputOptions,
    streaming::Message,
    Megalodon,
    SNS,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::config::FeatureSet;
use crate::models::{
    AuthResponse, ColumnKind, Conversation, CustomEmoji, InstanceInfo, MediaAttachment,
    MediaUploadRequest, NewPost, Notification, OAuthApp, PageRequest, Poll, Post, Relationship,
    StatusAction, StatusContext, StatusEdit, StreamKind, User, Visibility,
};
use crate::streaming::StreamEvent;
use crate::{log_api_call, log_stream};

use super::converter::convert_notification;
use super::rest::RestClient;
use super::SocialApi;

/// Application name shown on the instance's authorized apps page
const APP_NAME: &str = "Fedideck";
const APP_WEBSITE: &str = "https://github.com/fedideck/fedideck";
const SCOPES: &[&str] = &["read", "write", "follow", "push"];
/// Out-of-band redirect: the instance shows the code for the user to paste
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Page size when the caller does not ask for one
const DEFAULT_PAGE_SIZE: u32 = 40;

fn sns_for(feature_set: FeatureSet) -> SNS {
    match feature_set {
        FeatureSet::Pleroma => SNS::Pleroma,
        FeatureSet::Mainline | FeatureSet::Fedibird => SNS::Mastodon,
    }
}

/// OAuth logins in progress, keyed by instance URL
#[derive(Default)]
pub struct OAuthFlow {
    pending: Mutex<HashMap<String, OAuthApp>>,
}

impl OAuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the app (or reuse saved client credentials) and build the
    /// authorization URL for the user to open
    pub async fn start(
        &self,
        instance_url: &str,
        feature_set: FeatureSet,
        saved_credentials: Option<(String, String)>,
    ) -> Result<AuthResponse> {
        let instance_url = normalize_url(instance_url);
        info!("Starting OAuth flow for {}", instance_url);

        let app = match saved_credentials {
            Some((client_id, client_secret)) => {
                debug!("Reusing saved client credentials for {}", instance_url);
                OAuthApp {
                    client_id,
                    client_secret,
                    redirect_uri: REDIRECT_URI.to_string(),
                    instance_url: instance_url.clone(),
                }
            }
            None => {
                let client = generator(sns_for(feature_set), instance_url.clone(), None, None)?;

                let app_data = client
                    .register_app(
                        APP_NAME.to_string(),
                        &megalodon::megalodon::AppInputOptions {
                            redirect_uris: Some(REDIRECT_URI.to_string()),
                            scopes: Some(SCOPES.iter().map(|s| s.to_string()).collect()),
                            website: Some(APP_WEBSITE.to_string()),
                        },
                    )
                    .await
                    .context("Failed to register application")?;

                OAuthApp {
                    client_id: app_data.client_id.clone(),
                    client_secret: app_data.client_secret.clone(),
                    redirect_uri: REDIRECT_URI.to_string(),
                    instance_url: instance_url.clone(),
                }
            }
        };

        let auth_url = authorization_url(&app);
        self.pending.lock().await.insert(instance_url, app);

        Ok(AuthResponse {
            auth_url,
            state: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Exchange the pasted code for a token. Returns the logged-in client and
    /// the app credentials so they can be saved with the account.
    pub async fn complete(
        &self,
        instance_url: &str,
        code: &str,
        feature_set: FeatureSet,
    ) -> Result<(MastodonClient, OAuthApp)> {
        let instance_url = normalize_url(instance_url);

        let app = self
            .pending
            .lock()
            .await
            .remove(&instance_url)
            .with_context(|| format!("No pending login for {}", instance_url))?;

        let client = generator(sns_for(feature_set), instance_url.clone(), None, None)?;

        let token_data = client
            .fetch_access_token(
                app.client_id.clone(),
                app.client_secret.clone(),
                code.trim().to_string(),
                app.redirect_uri.clone(),
            )
            .await
            .context("Failed to fetch access token")?;

        info!("Access token obtained for {}", instance_url);

        let client = MastodonClient::from_token(&instance_url, &token_data.access_token, feature_set)?;
        Ok((client, app))
    }

    #[cfg(test)]
    pub async fn is_pending(&self, instance_url: &str) -> bool {
        self.pending.lock().await.contains_key(&normalize_url(instance_url))
    }
}

/// Authorization page for an app registration
pub fn authorization_url(app: &OAuthApp) -> String {
    format!(
        "{}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}",
        app.instance_url,
        urlencoding::encode(&app.client_id),
        urlencoding::encode(&app.redirect_uri),
        SCOPES.join("+")
    )
}

/// Whether an error means the instance no longer accepts the access token
pub fn is_token_rejected(err: &anyhow::Error) -> bool {
    let message = format!("{:#}", err).to_lowercase();
    ["401", "unauthorized", "invalid_token", "access token is invalid", "revoked"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Mastodon API client
pub struct MastodonClient {
    client: Arc<Box<dyn Megalodon + Send + Sync>>,
    rest: RestClient,
    instance_url: String,
    access_token: String,
}

impl MastodonClient {
    /// Create a client from an existing access token
    pub fn from_token(instance_url: &str, access_token: &str, feature_set: FeatureSet) -> Result<Self> {
        let instance_url = normalize_url(instance_url);

        let client = generator(
            sns_for(feature_set),
            instance_url.clone(),
            Some(access_token.to_string()),
            None,
        )?;

        Ok(Self {
            client: Arc::new(client),
            rest: RestClient::new(&instance_url, access_token)?,
            instance_url,
            access_token: access_token.to_string(),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

#[async_trait]
impl SocialApi for MastodonClient {
    async fn verify_credentials(&self) -> Result<User> {
        let response = self
            .client
            .verify_account_credentials()
            .await
            .context("Failed to verify credentials")?;

        Ok(User::from(&response.json))
    }

    async fn instance(&self) -> Result<InstanceInfo> {
        let response = self
            .client
            .get_instance()
            .await
            .context("Failed to get instance info")?;

        let instance = &response.json;

        Ok(InstanceInfo {
            url: self.instance_url.clone(),
            uri: instance.uri.clone(),
            title: instance.title.clone(),
            description: instance.description.clone(),
            version: instance.version.clone(),
            user_count: Some(instance.stats.user_count as u64),
            status_count: Some(instance.stats.status_count as u64),
            domain_count: Some(instance.stats.domain_count as u64),
            thumbnail: instance.thumbnail.clone(),
            max_toot_chars: Some(instance.configuration.statuses.max_characters as u32),
            max_media_attachments: instance
                .configuration
                .statuses
                .max_media_attachments
                .map(|v| v as u32),
            languages: instance.languages.clone(),
            registrations: instance.registrations,
            approval_required: instance.approval_required,
        })
    }

    async fn custom_emojis(&self) -> Result<Vec<CustomEmoji>> {
        let response = self
            .client
            .get_instance_custom_emojis()
            .await
            .context("Failed to get custom emojis")?;

        Ok(response.json.iter().map(CustomEmoji::from).collect())
    }

    async fn timeline(&self, kind: &ColumnKind, page: &PageRequest) -> Result<Vec<Post>> {
        let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let name = kind.name();
        log_api_call!("timeline", &name);
        let start = Instant::now();

        let statuses = match kind {
            ColumnKind::Home => {
                let options = GetHomeTimelineInputOptions {
                    max_id: page.max_id.clone(),
                    since_id: page.since_id.clone(),
                    min_id: page.min_id.clone(),
                    limit: Some(limit),
                    ..Default::default()
                };
                self.client.get_home_timeline(Some(&options)).await
            }
            ColumnKind::Local => {
                let options = GetLocalTimelineInputOptions {
                    max_id: page.max_id.clone(),
                    since_id: page.since_id.clone(),
                    min_id: page.min_id.clone(),
                    limit: Some(limit),
                    ..Default::default()
                };
                self.client.get_local_timeline(Some(&options)).await
            }
            ColumnKind::Public => {
                let options = GetPublicTimelineInputOptions {
                    max_id: page.max_id.clone(),
                    since_id: page.since_id.clone(),
                    min_id: page.min_id.clone(),
                    limit: Some(limit),
                    ..Default::default()
                };
                self.client.get_public_timeline(Some(&options)).await
            }
            ColumnKind::Hashtag { tag } => {
                let options = megalodon::megalodon::GetTagTimelineInputOptions {
                    max_id: page.max_id.clone(),
                    since_id: page.since_id.clone(),
                    min_id: page.min_id.clone(),
                    limit: Some(limit),
                    ..Default::default()
                };
                self.client.get_tag_timeline(tag.clone(), Some(&options)).await
            }
            ColumnKind::List { list_id } => {
                let options = megalodon::megalodon::GetListTimelineInputOptions {
                    max_id: page.max_id.clone(),
                    since_id: page.since_id.clone(),
                    min_id: page.min_id.clone(),
                    limit: Some(limit),
                };
                self.client.get_list_timeline(list_id.clone(), Some(&options)).await
            }
            ColumnKind::Favourites => self.client.get_favourites(None).await,
            ColumnKind::Bookmarks => self.client.get_bookmarks(None).await,
            ColumnKind::Notifications | ColumnKind::Conversations => {
                bail!("{} is not a post column", kind.display_name())
            }
        }
        .with_context(|| format!("Failed to fetch {} timeline", name))?;

        log_api_call!("timeline", &name, start.elapsed().as_millis() as u64);
        Ok(statuses.json.iter().map(Post::from).collect())
    }

    async fn notifications(&self, page: &PageRequest) -> Result<Vec<Notification>> {
        let options = megalodon::megalodon::GetNotificationsInputOptions {
            max_id: page.max_id.clone(),
            since_id: page.since_id.clone(),
            min_id: page.min_id.clone(),
            limit: Some(page.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
            ..Default::default()
        };

        let response = self
            .client
            .get_notifications(Some(&options))
            .await
            .context("Failed to fetch notifications")?;

        Ok(response.json.iter().filter_map(convert_notification).collect())
    }

    async fn conversations(&self, page: &PageRequest) -> Result<Vec<Conversation>> {
        let query = page.query_string();
        let path = if query.is_empty() {
            "conversations".to_string()
        } else {
            format!("conversations?{}", query)
        };
        self.rest.get(&path).await.context("Failed to fetch conversations")
    }

    async fn status(&self, id: &str) -> Result<Post> {
        let response = self
            .client
            .get_status(id.to_string())
            .await
            .with_context(|| format!("Failed to fetch post {}", id))?;

        Ok(Post::from(&response.json))
    }

    async fn status_context(&self, id: &str) -> Result<StatusContext> {
        self.rest
            .get(&format!("statuses/{}/context", urlencoding::encode(id)))
            .await
            .context("Failed to fetch thread")
    }

    async fn status_history(&self, id: &str) -> Result<Vec<StatusEdit>> {
        self.rest
            .get(&format!("statuses/{}/history", urlencoding::encode(id)))
            .await
            .context("Failed to fetch edit history")
    }

    async fn status_action(&self, id: &str, action: StatusAction) -> Result<Option<Post>> {
        let id = id.to_string();
        log_api_call!(action.name(), &id);

        let response = match action {
            StatusAction::Favourite => self.client.favourite_status(id).await,
            StatusAction::Unfavourite => self.client.unfavourite_status(id).await,
            StatusAction::Boost => self.client.reblog_status(id).await,
            StatusAction::Unboost => self.client.unreblog_status(id).await,
            StatusAction::Bookmark => self.client.bookmark_status(id).await,
            StatusAction::Unbookmark => self.client.unbookmark_status(id).await,
            StatusAction::Mute => self.client.mute_status(id).await,
            StatusAction::Unmute => self.client.unmute_status(id).await,
            StatusAction::Reload => self.client.get_status(id).await,
            StatusAction::Delete => {
                self.client
                    .delete_status(id)
                    .await
                    .context("Failed to delete post")?;
                return Ok(None);
            }
        }
        .with_context(|| format!("Failed to {} post", action.name()))?;

        Ok(Some(Post::from(&response.json)))
    }

    async fn vote_poll(&self, poll_id: &str, choices: &[u32]) -> Result<Poll> {
        self.rest
            .post(
                &format!("polls/{}/votes", urlencoding::encode(poll_id)),
                &json!({ "choices": choices }),
            )
            .await
            .context("Failed to vote")
    }

    async fn dismiss_notification(&self, id: &str) -> Result<()> {
        self.client
            .dismiss_notification(id.to_string())
            .await
            .context("Failed to dismiss notification")?;

        Ok(())
    }

    async fn clear_notifications(&self) -> Result<()> {
        self.client
            .dismiss_notifications()
            .await
            .context("Failed to clear notifications")?;

        Ok(())
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<Option<Post>> {
        let visibility = match new_post.visibility.clone().unwrap_or_default() {
            Visibility::Public => megalodon::entities::StatusVisibility::Public,
            Visibility::Unlisted => megalodon::entities::StatusVisibility::Unlisted,
            Visibility::Private => megalodon::entities::StatusVisibility::Private,
            Visibility::Direct => megalodon::entities::StatusVisibility::Direct,
        };

        let poll = new_post.poll.as_ref().map(|p| megalodon::megalodon::PollOptions {
            options: p.options.clone(),
            expires_in: Some(p.expires_in),
            multiple: Some(p.multiple),
            hide_totals: Some(p.hide_totals),
        });

        let options = PostStatusInputOptions {
            in_reply_to_id: new_post.in_reply_to_id.clone(),
            sensitive: Some(new_post.sensitive),
            spoiler_text: new_post.spoiler_text.clone().filter(|s| !s.is_empty()),
            visibility: Some(visibility),
            language: new_post.language.clone(),
            media_ids: if new_post.media_ids.is_empty() {
                None
            } else {
                Some(new_post.media_ids.clone())
            },
            poll,
            scheduled_at: new_post.scheduled_at,
            ..Default::default()
        };

        let response = self
            .client
            .post_status(new_post.content.clone(), Some(&options))
            .await
            .context("Failed to create post")?;

        match &response.json {
            megalodon::megalodon::PostStatusOutput::Status(status) => {
                Ok(Some(Post::from(status)))
            }
            megalodon::megalodon::PostStatusOutput::ScheduledStatus(_) => {
                info!("Post scheduled for later");
                Ok(None)
            }
        }
    }

    async fn upload_media(&self, request: &MediaUploadRequest) -> Result<MediaAttachment> {
        let path = std::path::Path::new(&request.file_path);
        if !path.exists() {
            bail!("File not found: {}", request.file_path);
        }

        let options = megalodon::megalodon::UploadMediaInputOptions {
            description: request.description.clone(),
            focus: request.focus.as_ref().map(|f| format!("{},{}", f.x, f.y)),
            ..Default::default()
        };

        let response = self
            .client
            .upload_media(request.file_path.clone(), Some(&options))
            .await
            .context("Failed to upload media")?;

        let attachment = match &response.json {
            megalodon::entities::UploadMedia::Attachment(att) => MediaAttachment::from(att),
            // Still processing on the server: only the id is final
            megalodon::entities::UploadMedia::AsyncAttachment(async_att) => MediaAttachment {
                id: async_att.id.clone(),
                media_type: crate::models::MediaType::Unknown,
                url: async_att.url.clone().unwrap_or_default(),
                preview_url: async_att.preview_url.clone(),
                remote_url: None,
                meta: None,
                description: async_att.description.clone(),
                blurhash: async_att.blurhash.clone(),
            },
        };

        info!("Media uploaded: {}", attachment.id);
        Ok(attachment)
    }

    async fn follow(&self, account_id: &str, notify: bool) -> Result<Relationship> {
        self.rest
            .post(
                &format!("accounts/{}/follow", urlencoding::encode(account_id)),
                &json!({ "notify": notify }),
            )
            .await
            .context("Failed to follow")
    }

    async fn unfollow(&self, account_id: &str) -> Result<Relationship> {
        self.rest
            .post(
                &format!("accounts/{}/unfollow", urlencoding::encode(account_id)),
                &json!({}),
            )
            .await
            .context("Failed to unfollow")
    }

    async fn stream(&self, kind: &StreamKind, tx: mpsc::Sender<StreamEvent>) -> Result<()> {
        let stream = match kind {
            StreamKind::User => self.client.user_streaming().await,
            StreamKind::Local => self.client.local_streaming().await,
            StreamKind::Public => self.client.public_streaming().await,
            StreamKind::Direct => self.client.direct_streaming().await,
            StreamKind::Hashtag(tag) => self.client.tag_streaming(tag.clone()).await,
            StreamKind::List(list_id) => self.client.list_streaming(list_id.clone()).await,
        };

        let name = kind.name();
        log_stream!(connected, self.instance_url.as_str(), name.as_str());
        if tx.send(StreamEvent::Connected).await.is_err() {
            return Ok(());
        }

        stream
            .listen(Box::new(move |message| {
                let tx = tx.clone();
                let name = name.clone();

                Box::pin(async move {
                    let event = match message {
                        Message::Update(status) => {
                            log_stream!(message, &name, "update");
                            Some(StreamEvent::Update(Post::from(&status)))
                        }
                        Message::Notification(notification) => {
                            log_stream!(message, &name, "notification");
                            convert_notification(&notification).map(StreamEvent::Notification)
                        }
                        Message::Conversation(conversation) => {
                            log_stream!(message, &name, "conversation");
                            Some(StreamEvent::Conversation(Conversation::from(&conversation)))
                        }
                        Message::Delete(id) => {
                            log_stream!(message, &name, "delete");
                            Some(StreamEvent::Delete(id))
                        }
                        Message::StatusUpdate(status) => {
                            log_stream!(message, &name, "status_update");
                            Some(StreamEvent::StatusUpdate(Post::from(&status)))
                        }
                        _ => None,
                    };

                    if let Some(event) = event {
                        let _ = tx.send(event).await;
                    }
                })
            }))
            .await;

        Ok(())
    }
}

/// Normalize an instance URL
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    url.trim_end_matches('/').to_string()
}
