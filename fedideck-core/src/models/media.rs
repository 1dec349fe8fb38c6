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

//! Media attachment model

use serde::{Deserialize, Serialize};

/// Type of media attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Gifv,
    Audio,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Gifv => "gifv",
            MediaType::Audio => "audio",
            MediaType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A media attachment on a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAttachment {
    pub id: String,

    #[serde(rename = "type")]
    pub media_type: MediaType,

    /// Missing while the server is still processing the upload
    #[serde(default)]
    pub url: String,

    pub preview_url: Option<String>,

    pub remote_url: Option<String>,

    #[serde(default)]
    pub meta: Option<MediaMeta>,

    /// Alt text
    pub description: Option<String>,

    pub blurhash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MediaMeta {
    pub original: Option<MediaDimensions>,
    pub small: Option<MediaDimensions>,
    pub focus: Option<MediaFocus>,
    pub length: Option<String>,
    pub duration: Option<f64>,
    pub fps: Option<u32>,
    pub audio_encode: Option<String>,
    pub audio_bitrate: Option<String>,
    pub audio_channels: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MediaDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<String>,
    pub aspect: Option<f64>,
    pub frame_rate: Option<String>,
    pub duration: Option<f64>,
    pub bitrate: Option<u64>,
}

/// Focus point for cropping, both axes in -1.0..=1.0
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaFocus {
    pub x: f64,
    pub y: f64,
}

/// Request to upload media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUploadRequest {
    /// Path to the file to upload
    pub file_path: String,
    /// Alt text description
    pub description: Option<String>,
    /// Focus point
    pub focus: Option<MediaFocus>,
}
