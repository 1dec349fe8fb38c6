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

//! Errors crossing the IPC boundary

use thiserror::Error;

use crate::models::{error_codes, IpcError};

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column already open: {0}")]
    ColumnAlreadyOpen(String),

    #[error("Unknown method: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// IPC error code for this error
    pub fn code(&self) -> i32 {
        match self {
            CoreError::NotAuthenticated => error_codes::NOT_AUTHENTICATED,
            CoreError::UnknownAccount(_) | CoreError::UnknownColumn(_) => error_codes::UNKNOWN_ENTITY,
            CoreError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            CoreError::ColumnAlreadyOpen(_) | CoreError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            CoreError::Network(_) => error_codes::NETWORK_ERROR,
            CoreError::Api(_) => error_codes::API_ERROR,
            CoreError::Storage(_) => error_codes::STORAGE_ERROR,
            CoreError::Serialization(_) => error_codes::PARSE_ERROR,
            CoreError::Io(_) | CoreError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        // keep the whole context chain, it is what the user gets to see
        CoreError::Api(format!("{:#}", e))
    }
}

impl From<CoreError> for IpcError {
    fn from(e: CoreError) -> Self {
        IpcError::new(e.code(), e.to_string())
    }
}
