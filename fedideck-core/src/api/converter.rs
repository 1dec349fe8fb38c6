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

//! megalodon entities into the core's models

use megalodon::entities;
use megalodon::entities::attachment::{AttachmentMeta, AttachmentType, MetaSub};
use megalodon::entities::notification::NotificationType as RemoteNotificationType;

use crate::html::html_to_text;
use crate::models::{
    Application, Conversation, CustomEmoji, MediaAttachment, MediaDimensions, MediaFocus,
    MediaMeta, MediaType, Mention, Notification, NotificationType, Poll, PollOption, Post,
    ProfileField, Tag, User, Visibility,
};

/// Deref-coerces boxed and plain statuses alike
fn post(status: &entities::Status) -> Post {
    Post::from(status)
}

impl From<&entities::Status> for Post {
    fn from(status: &entities::Status) -> Self {
        Post {
            id: status.id.clone(),
            uri: status.uri.clone(),
            url: status.url.clone(),
            account: User::from(&status.account),
            plain_content: Some(html_to_text(&status.content)),
            content: status.content.clone(),
            spoiler_text: status.spoiler_text.clone(),
            visibility: Visibility::from(&status.visibility),
            sensitive: status.sensitive,
            created_at: status.created_at,
            edited_at: status.edited_at,
            language: status.language.clone(),
            in_reply_to_id: status.in_reply_to_id.clone(),
            in_reply_to_account_id: status.in_reply_to_account_id.clone(),
            media_attachments: status.media_attachments.iter().map(MediaAttachment::from).collect(),
            tags: status
                .tags
                .iter()
                .map(|t| Tag { name: t.name.clone(), url: t.url.clone() })
                .collect(),
            mentions: status
                .mentions
                .iter()
                .map(|m| Mention {
                    id: m.id.clone(),
                    username: m.username.clone(),
                    acct: m.acct.clone(),
                    url: m.url.clone(),
                })
                .collect(),
            emojis: status.emojis.iter().map(CustomEmoji::from).collect(),
            reblogs_count: status.reblogs_count as u64,
            favourites_count: status.favourites_count as u64,
            replies_count: status.replies_count as u64,
            reblog: status.reblog.as_ref().map(|inner| Box::new(post(inner))),
            poll: status.poll.as_ref().map(Poll::from),
            application: status.application.as_ref().map(|a| Application {
                name: a.name.clone(),
                website: a.website.clone(),
            }),
            reblogged: status.reblogged,
            favourited: status.favourited,
            bookmarked: status.bookmarked,
            muted: status.muted,
            pinned: status.pinned,
        }
    }
}

impl From<&entities::Account> for User {
    fn from(account: &entities::Account) -> Self {
        User {
            id: account.id.clone(),
            username: account.username.clone(),
            acct: account.acct.clone(),
            display_name: account.display_name.clone(),
            note: account.note.clone(),
            url: account.url.clone(),
            avatar: account.avatar.clone(),
            avatar_static: account.avatar_static.clone(),
            header: account.header.clone(),
            header_static: account.header_static.clone(),
            locked: account.locked,
            fields: account
                .fields
                .iter()
                .map(|f| ProfileField {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    verified_at: f.verified_at,
                })
                .collect(),
            emojis: account.emojis.iter().map(CustomEmoji::from).collect(),
            bot: account.bot,
            group: account.group.unwrap_or(false),
            discoverable: account.discoverable,
            created_at: account.created_at,
            last_status_at: None,
            statuses_count: account.statuses_count as u64,
            followers_count: account.followers_count as u64,
            following_count: account.following_count as u64,
        }
    }
}

impl From<&entities::StatusVisibility> for Visibility {
    fn from(visibility: &entities::StatusVisibility) -> Self {
        use entities::StatusVisibility as Remote;
        match visibility {
            Remote::Public => Visibility::Public,
            // local-only posts are closest to unlisted for the UI
            Remote::Unlisted | Remote::Local => Visibility::Unlisted,
            Remote::Private => Visibility::Private,
            Remote::Direct => Visibility::Direct,
        }
    }
}

impl From<&entities::Attachment> for MediaAttachment {
    fn from(media: &entities::Attachment) -> Self {
        let media_type = match media.r#type {
            AttachmentType::Image => MediaType::Image,
            AttachmentType::Video => MediaType::Video,
            AttachmentType::Gifv => MediaType::Gifv,
            AttachmentType::Audio => MediaType::Audio,
            AttachmentType::Unknown => MediaType::Unknown,
        };

        MediaAttachment {
            id: media.id.clone(),
            media_type,
            url: media.url.clone(),
            preview_url: media.preview_url.clone(),
            remote_url: media.remote_url.clone(),
            meta: media.meta.as_ref().map(MediaMeta::from),
            description: media.description.clone(),
            blurhash: media.blurhash.clone(),
        }
    }
}

impl From<&AttachmentMeta> for MediaMeta {
    fn from(meta: &AttachmentMeta) -> Self {
        MediaMeta {
            original: meta.original.as_ref().map(MediaDimensions::from),
            small: meta.small.as_ref().map(MediaDimensions::from),
            focus: meta.focus.as_ref().map(|f| MediaFocus { x: f.x, y: f.y }),
            length: meta.length.clone(),
            duration: meta.duration,
            fps: meta.fps.map(|f| f as u32),
            audio_encode: meta.audio_encode.clone(),
            audio_bitrate: meta.audio_bitrate.clone(),
            audio_channels: meta.audio_channel.clone(),
        }
    }
}

impl From<&MetaSub> for MediaDimensions {
    fn from(sub: &MetaSub) -> Self {
        MediaDimensions {
            width: sub.width.map(|w| w as u32),
            height: sub.height.map(|h| h as u32),
            size: sub.size.clone(),
            aspect: sub.aspect,
            frame_rate: sub.frame_rate.clone(),
            duration: sub.duration,
            bitrate: sub.bitrate.map(|b| b as u64),
        }
    }
}

impl From<&entities::Emoji> for CustomEmoji {
    fn from(emoji: &entities::Emoji) -> Self {
        CustomEmoji {
            shortcode: emoji.shortcode.clone(),
            url: emoji.url.clone(),
            static_url: emoji.static_url.clone(),
            visible_in_picker: emoji.visible_in_picker,
            category: emoji.category.clone(),
        }
    }
}

impl From<&entities::Poll> for Poll {
    fn from(poll: &entities::Poll) -> Self {
        Poll {
            id: poll.id.clone(),
            expires_at: poll.expires_at,
            expired: poll.expired,
            multiple: poll.multiple,
            votes_count: poll.votes_count as u64,
            voters_count: poll.voters_count.map(|c| c as u64),
            options: poll
                .options
                .iter()
                .map(|o| PollOption {
                    title: o.title.clone(),
                    votes_count: o.votes_count.map(|c| c as u64),
                })
                .collect(),
            voted: poll.voted,
            own_votes: None,
        }
    }
}

impl From<&entities::Conversation> for Conversation {
    fn from(conversation: &entities::Conversation) -> Self {
        Conversation {
            id: conversation.id.clone(),
            accounts: conversation.accounts.iter().map(User::from).collect(),
            last_status: conversation.last_status.as_ref().map(|s| post(s)),
            unread: conversation.unread,
        }
    }
}

impl From<&RemoteNotificationType> for NotificationType {
    fn from(kind: &RemoteNotificationType) -> Self {
        match kind {
            RemoteNotificationType::Mention => NotificationType::Mention,
            RemoteNotificationType::Reblog => NotificationType::Reblog,
            RemoteNotificationType::Favourite => NotificationType::Favourite,
            RemoteNotificationType::Follow => NotificationType::Follow,
            RemoteNotificationType::FollowRequest => NotificationType::FollowRequest,
            RemoteNotificationType::PollExpired => NotificationType::Poll,
            RemoteNotificationType::Update => NotificationType::Update,
            _ => NotificationType::Unknown,
        }
    }
}

/// Notifications without an account (seen on some servers) are dropped
pub fn convert_notification(notification: &entities::Notification) -> Option<Notification> {
    let account = notification.account.as_ref()?;

    Some(Notification {
        id: notification.id.clone(),
        notification_type: NotificationType::from(&notification.r#type),
        created_at: notification.created_at,
        account: User::from(account),
        status: notification.status.as_ref().map(|s| post(s)),
    })
}
