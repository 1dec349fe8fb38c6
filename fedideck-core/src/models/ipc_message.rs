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

//! IPC message models for communication between the core and the UI process

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of IPC message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Event,
}

/// An IPC message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcMessage {
    /// Unique message ID (UUID)
    pub id: String,

    #[serde(rename = "type")]
    pub message_type: MessageType,

    /// Method name for requests and events
    pub method: Option<String>,

    /// Parameters for requests, payload for events
    pub params: Option<Value>,

    /// Result for responses
    pub result: Option<Value>,

    /// Error for failed responses
    pub error: Option<IpcError>,
}

impl IpcMessage {
    /// Create a new request message
    pub fn request(method: &str, params: Option<Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_type: MessageType::Request,
            method: Some(method.to_string()),
            params,
            result: None,
            error: None,
        }
    }

    /// Create a success response
    pub fn response_ok(id: &str, result: Value) -> Self {
        Self {
            id: id.to_string(),
            message_type: MessageType::Response,
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn response_err(id: &str, error: IpcError) -> Self {
        Self {
            id: id.to_string(),
            message_type: MessageType::Response,
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }

    /// Create an event message
    pub fn event(method: &str, params: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_type: MessageType::Event,
            method: Some(method.to_string()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Error in an IPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl IpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Standard error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application-specific errors
    pub const NOT_AUTHENTICATED: i32 = -1001;
    pub const NETWORK_ERROR: i32 = -1003;
    pub const API_ERROR: i32 = -1004;
    pub const STORAGE_ERROR: i32 = -1006;
    pub const UNKNOWN_ENTITY: i32 = -1007;
}

/// IPC method names
pub mod methods {
    // Authentication
    pub const AUTH_START: &str = "auth.start";
    pub const AUTH_CALLBACK: &str = "auth.callback";
    pub const AUTH_LOGIN: &str = "auth.login";
    pub const AUTH_LOGOUT: &str = "auth.logout";
    pub const AUTH_GET_ACCOUNTS: &str = "auth.get_accounts";
    pub const AUTH_SET_DEFAULT: &str = "auth.set_default";
    pub const AUTH_DELETE: &str = "auth.delete";

    // Columns
    pub const COLUMN_OPEN: &str = "column.open";
    pub const COLUMN_CLOSE: &str = "column.close";
    pub const COLUMN_LIST: &str = "column.list";
    pub const COLUMN_RELOAD: &str = "column.reload";
    pub const COLUMN_SNAPSHOT: &str = "column.snapshot";
    pub const COLUMN_MARK_READ: &str = "column.mark_read";
    pub const COLUMN_NEXT_UNREAD: &str = "column.next_unread";

    // Posts
    pub const POST_CREATE: &str = "post.create";
    pub const POST_FAVOURITE: &str = "post.favourite";
    pub const POST_UNFAVOURITE: &str = "post.unfavourite";
    pub const POST_BOOST: &str = "post.boost";
    pub const POST_UNBOOST: &str = "post.unboost";
    pub const POST_BOOKMARK: &str = "post.bookmark";
    pub const POST_UNBOOKMARK: &str = "post.unbookmark";
    pub const POST_MUTE: &str = "post.mute";
    pub const POST_UNMUTE: &str = "post.unmute";
    pub const POST_DELETE: &str = "post.delete";
    pub const POST_RELOAD: &str = "post.reload";
    pub const POST_CONTEXT: &str = "post.context";
    pub const POST_HISTORY: &str = "post.history";
    pub const POST_DIFF: &str = "post.diff";

    // Polls
    pub const POLL_VOTE: &str = "poll.vote";
    pub const POLL_REFRESH: &str = "poll.refresh";

    // Notifications
    pub const NOTIFICATIONS_DISMISS: &str = "notifications.dismiss";
    pub const NOTIFICATIONS_CLEAR: &str = "notifications.clear";

    // Users
    pub const USER_FOLLOW: &str = "user.follow";
    pub const USER_UNFOLLOW: &str = "user.unfollow";
    pub const USER_NOTIFY: &str = "user.notify";

    // Media
    pub const MEDIA_UPLOAD: &str = "media.upload";

    // Instance
    pub const INSTANCE_GET: &str = "instance.get";

    // Window
    pub const WINDOW_SET_ACTIVE: &str = "window.set_active";

    // Preferences and UI state
    pub const PREFS_GET: &str = "prefs.get";
    pub const PREFS_SET: &str = "prefs.set";
    pub const SETTINGS_GET: &str = "settings.get";
    pub const SETTINGS_SET: &str = "settings.set";

    // System
    pub const PING: &str = "ping";
    pub const SHUTDOWN: &str = "shutdown";
}

/// Event names pushed to the UI
pub mod events {
    pub const COLUMN_CHANGED: &str = "event.column_changed";
    pub const UNREAD_CHANGED: &str = "event.unread_changed";
    pub const REFRESH_COUNTDOWN: &str = "event.refresh_countdown";
    pub const STREAM_CONNECTED: &str = "event.stream_connected";
    pub const STREAM_DISCONNECTED: &str = "event.stream_disconnected";
    pub const LOGIN_STATUS: &str = "event.login_status";
    pub const ACTION_FAILED: &str = "event.action_failed";
    pub const ERROR: &str = "event.error";
}
