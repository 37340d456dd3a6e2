//! Video metadata owned by the hosting application
//!
//! The controller only reads [`Video`]. This module also maps the
//! platform's `videos.list` response into it and holds the display
//! formatting applied on the way in.

use crate::utils::format_hms;
use serde::{Deserialize, Serialize};

/// Duration label shown for content that is currently broadcasting
pub const LIVE_DURATION_LABEL: &str = "AO VIVO";

/// Broadcast status reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveBroadcastContent {
    Live,
    Upcoming,
    #[default]
    None,
}

/// A playable video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Opaque platform identifier
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub thumbnail_high: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: String,
    /// Pre-formatted display duration, [`LIVE_DURATION_LABEL`] while live
    #[serde(default)]
    pub duration: String,
    /// Pre-formatted view count
    #[serde(default)]
    pub view_count: String,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub live_broadcast_content: LiveBroadcastContent,
}

impl Video {
    /// Create a non-live video with only an id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            thumbnail: String::new(),
            thumbnail_high: String::new(),
            channel_title: String::new(),
            published_at: String::new(),
            duration: String::new(),
            view_count: String::new(),
            is_live: false,
            live_broadcast_content: LiveBroadcastContent::None,
        }
    }

    /// Set the display duration
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Set the broadcast status, keeping `is_live` consistent with it
    pub fn with_broadcast(mut self, content: LiveBroadcastContent) -> Self {
        self.live_broadcast_content = content;
        self.is_live = content == LiveBroadcastContent::Live;
        if self.is_live {
            self.duration = LIVE_DURATION_LABEL.to_string();
        }
        self
    }

    /// Re-derive `is_live` from the broadcast status
    ///
    /// Returns true if the stored flag disagreed and was corrected.
    pub fn normalize(&mut self) -> bool {
        let expected = self.live_broadcast_content == LiveBroadcastContent::Live;
        let corrected = self.is_live != expected;
        if corrected {
            log::warn!(
                "Video {} had is_live={} with broadcast status {:?}",
                self.id,
                self.is_live,
                self.live_broadcast_content
            );
            self.is_live = expected;
        }
        corrected
    }

    /// Duration string to show in the player
    pub fn display_duration(&self) -> &str {
        if self.is_live {
            LIVE_DURATION_LABEL
        } else {
            &self.duration
        }
    }
}

/// Response body of the platform's `videos.list` call
#[derive(Debug, Clone, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<ApiVideo>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// One `video` resource as returned by the platform
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideo {
    pub id: String,
    pub snippet: ApiSnippet,
    pub content_details: Option<ApiContentDetails>,
    pub statistics: Option<ApiStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: ApiThumbnails,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: String,
    pub live_broadcast_content: Option<LiveBroadcastContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiThumbnails {
    pub default: Option<ApiThumbnail>,
    pub medium: Option<ApiThumbnail>,
    pub high: Option<ApiThumbnail>,
    pub maxres: Option<ApiThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatistics {
    pub view_count: Option<String>,
}

impl From<ApiVideo> for Video {
    fn from(item: ApiVideo) -> Self {
        let thumbs = &item.snippet.thumbnails;
        let url = |t: &Option<ApiThumbnail>| t.as_ref().map(|t| t.url.clone());

        let thumbnail = url(&thumbs.medium).or_else(|| url(&thumbs.default)).unwrap_or_default();
        let thumbnail_high = url(&thumbs.maxres)
            .or_else(|| url(&thumbs.high))
            .or_else(|| url(&thumbs.medium))
            .unwrap_or_default();

        let duration = item
            .content_details
            .as_ref()
            .and_then(|c| c.duration.as_deref())
            .map(format_iso_duration)
            .unwrap_or_default();

        let view_count = item
            .statistics
            .as_ref()
            .and_then(|s| s.view_count.as_deref())
            .map(format_view_count)
            .unwrap_or_else(|| "0".to_string());

        let broadcast = item.snippet.live_broadcast_content.unwrap_or_default();

        Video {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnail,
            thumbnail_high,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            duration,
            view_count,
            is_live: false,
            live_broadcast_content: LiveBroadcastContent::None,
        }
        .with_broadcast(broadcast)
    }
}

/// Format an ISO-8601 duration such as `PT1H2M3S` as `1:02:03`
///
/// Only the `PT` time form the platform emits is understood; anything else
/// yields an empty string.
pub fn format_iso_duration(iso: &str) -> String {
    let Some(body) = iso.strip_prefix("PT") else {
        return String::new();
    };
    if body.is_empty() {
        return String::new();
    }

    let (mut hours, mut minutes, mut seconds) = (0u64, 0u64, 0u64);
    let mut digits = String::new();
    let mut last_unit = 0u8;

    for ch in body.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let rank = match ch {
            'H' => 1,
            'M' => 2,
            'S' => 3,
            _ => return String::new(),
        };
        if digits.is_empty() || rank <= last_unit {
            return String::new();
        }
        let Ok(value) = digits.parse::<u64>() else {
            return String::new();
        };
        match rank {
            1 => hours = value,
            2 => minutes = value,
            _ => seconds = value,
        }
        digits.clear();
        last_unit = rank;
    }

    if !digits.is_empty() {
        return String::new();
    }

    format_hms(hours, minutes, seconds)
}

/// Format a raw view count as `1.2M`, `3.4K` or the raw value
pub fn format_view_count(count: &str) -> String {
    let Ok(num) = count.trim().parse::<u64>() else {
        return count.to_string();
    };
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
