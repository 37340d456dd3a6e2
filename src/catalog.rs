//! Video catalog backing the browse surface
//!
//! Holds the videos the hosting application shows and answers the simple
//! lookups the shell needs before handing a [`Video`] to the player.

use crate::utils::error::{PlayerError, Result};
use crate::video::{Video, VideoListResponse};
use serde::Deserialize;
use std::path::Path;

/// Whether the channel is broadcasting right now
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStatus {
    pub is_live: bool,
    pub live_video: Option<Video>,
}

/// Accepted on-disk catalog shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    ApiResponse(VideoListResponse),
    Videos(Vec<Video>),
}

/// In-memory list of videos
#[derive(Debug, Clone, Default)]
pub struct VideoCatalog {
    videos: Vec<Video>,
}

impl VideoCatalog {
    /// Build a catalog, normalizing the live flag of every entry
    pub fn new(mut videos: Vec<Video>) -> Self {
        for video in &mut videos {
            video.normalize();
        }
        Self { videos }
    }

    /// Parse a `videos.list` response or a plain JSON array of videos
    pub fn from_json(json: &str) -> Result<Self> {
        let videos = match serde_json::from_str::<CatalogFile>(json)? {
            CatalogFile::ApiResponse(response) => {
                response.items.into_iter().map(Video::from).collect()
            }
            CatalogFile::Videos(videos) => videos,
        };
        Ok(Self::new(videos))
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        log::info!("Loaded {} videos from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Look a video up by id
    pub fn get(&self, id: &str) -> Result<&Video> {
        self.videos
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| PlayerError::NotFound(format!("video {}", id)))
    }

    /// Case-insensitive substring match on title or description
    ///
    /// A blank query matches nothing. Results keep catalog order.
    pub fn search(&self, query: &str) -> Vec<&Video> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.videos
            .iter()
            .filter(|v| {
                v.title.to_lowercase().contains(&query)
                    || v.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// The live video if there is one, otherwise the first entry
    pub fn featured(&self) -> Option<&Video> {
        self.videos
            .iter()
            .find(|v| v.is_live)
            .or_else(|| self.videos.first())
    }

    pub fn live_status(&self) -> LiveStatus {
        let live_video = self.videos.iter().find(|v| v.is_live).cloned();
        LiveStatus {
            is_live: live_video.is_some(),
            live_video,
        }
    }
}
