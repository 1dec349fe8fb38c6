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

//! Account model for managing logins on multiple instances

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored login (for multi-account support)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAccount {
    /// Unique identifier (local)
    pub id: String,

    /// Instance URL (e.g., "https://mastodon.social")
    pub instance_url: String,

    /// Username
    pub username: String,

    /// Full account name (@user@domain)
    pub acct: String,

    /// Display name
    pub display_name: String,

    /// OAuth access token
    #[serde(skip_serializing, default)]
    pub access_token: String,

    /// Client credentials of the app registered on the instance, reused on re-login
    pub client_id: Option<String>,

    #[serde(skip_serializing, default)]
    pub client_secret: Option<String>,

    /// API flavour of the instance ("mainline", "fedibird", "pleroma")
    pub feature_set: String,

    /// Log in automatically on startup
    #[serde(default)]
    pub autologin: bool,

    /// When this account was added
    pub added_at: DateTime<Utc>,

    /// When this account was last used
    pub last_used_at: DateTime<Utc>,

    /// Whether this is the default/active account
    pub is_default: bool,

    /// Avatar URL
    pub avatar_url: Option<String>,
}

/// Outcome of a login attempt, reported to the UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    /// Registering the client application failed
    CreateApp,
    /// Building the API endpoint failed
    CreateEndpoint,
    /// Exchanging the authorization code failed
    Login,
    /// The saved access token was rejected
    Revoked,
}

impl LoginStatus {
    pub fn message(&self) -> &'static str {
        match self {
            LoginStatus::Success => "Success",
            LoginStatus::CreateApp => "Error while creating client ID and secret",
            LoginStatus::CreateEndpoint => "Error while creating API endpoint with client ID and secret",
            LoginStatus::Login => "Error while logging in",
            LoginStatus::Revoked => "The saved access token is no longer valid",
        }
    }
}

/// OAuth application registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub instance_url: String,
}

/// OAuth authorization response with auth URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// URL to open in browser for authorization
    pub auth_url: String,
    /// State parameter for verification
    pub state: String,
}

/// Instance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Instance URL
    pub url: String,
    /// Domain as reported by the instance, used in "@user@domain" labels
    pub uri: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub user_count: Option<u64>,
    pub status_count: Option<u64>,
    pub domain_count: Option<u64>,
    pub thumbnail: Option<String>,
    /// Maximum post length
    pub max_toot_chars: Option<u32>,
    pub max_media_attachments: Option<u32>,
    pub languages: Vec<String>,
    pub registrations: bool,
    pub approval_required: bool,
}
