//! Where the browse surface gets its videos
//!
//! With a platform API key configured, channel uploads, search results and
//! the live status come from the platform data API. Without a key the static
//! catalog answers everything, and it also stands in whenever a request fails.

use crate::catalog::{LiveStatus, VideoCatalog};
use crate::utils::config::CatalogConfig;
use crate::utils::error::{PlayerError, Result};
use crate::video::{ApiSnippet, ApiThumbnail, LiveBroadcastContent, Video, VideoListResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parts requested when resolving channel uploads
const CHANNEL_PARTS: &str = "snippet,contentDetails,statistics,liveStreamingDetails";
const SEARCH_PARTS: &str = "snippet,contentDetails,statistics";

/// Response body of the platform's `search.list` call
#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
    snippet: ApiSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: Option<String>,
}

impl SearchResult {
    /// Build the live video straight from a search hit
    ///
    /// Search hits carry no statistics, so the view count stays empty.
    fn into_live_video(self) -> Option<Video> {
        let id = self.id.video_id?;
        let thumbs = &self.snippet.thumbnails;
        let url = |t: &Option<ApiThumbnail>| t.as_ref().map(|t| t.url.clone()).unwrap_or_default();

        let mut video = Video::new(id, self.snippet.title.clone());
        video.description = self.snippet.description.clone();
        video.thumbnail = url(&thumbs.medium);
        video.thumbnail_high = url(&thumbs.high);
        video.channel_title = self.snippet.channel_title.clone();
        video.published_at = self.snippet.published_at.clone();
        Some(video.with_broadcast(LiveBroadcastContent::Live))
    }
}

/// Client for the platform data API, scoped to one channel
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    channel_id: String,
    max_results: u32,
}

impl PlatformClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PlayerError::Config("platform API key is not configured".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlayerError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            channel_id: config.channel_id.clone(),
            max_results: config.max_results,
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("GET {} {:?}", url, params);

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| PlayerError::Api(format!("{} request failed: {}", endpoint, e)))?;

        if !response.status().is_success() {
            return Err(PlayerError::Api(format!(
                "{} returned HTTP {}",
                endpoint,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PlayerError::Api(format!("Invalid {} response: {}", endpoint, e)))
    }

    /// Resolve search hits into full video resources
    async fn resolve(&self, hits: SearchListResponse, parts: &str) -> Result<Vec<Video>> {
        let ids: Vec<String> = hits
            .items
            .into_iter()
            .filter_map(|hit| hit.id.video_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = ids.join(",");
        let response: VideoListResponse = self
            .get("videos", &[("id", ids.as_str()), ("part", parts)])
            .await?;
        Ok(response.items.into_iter().map(Video::from).collect())
    }

    /// Most recent uploads of the channel, newest first
    pub async fn channel_videos(&self) -> Result<Vec<Video>> {
        let max_results = self.max_results.to_string();
        let hits: SearchListResponse = self
            .get(
                "search",
                &[
                    ("channelId", self.channel_id.as_str()),
                    ("part", "snippet"),
                    ("type", "video"),
                    ("order", "date"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;
        self.resolve(hits, CHANNEL_PARTS).await
    }

    /// Videos of the channel matching `query`; a blank query matches nothing
    pub async fn search(&self, query: &str) -> Result<Vec<Video>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let max_results = self.max_results.to_string();
        let hits: SearchListResponse = self
            .get(
                "search",
                &[
                    ("channelId", self.channel_id.as_str()),
                    ("q", query),
                    ("part", "snippet"),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;
        self.resolve(hits, SEARCH_PARTS).await
    }

    /// Whether the channel is broadcasting right now
    pub async fn live_status(&self) -> Result<LiveStatus> {
        let hits: SearchListResponse = self
            .get(
                "search",
                &[
                    ("channelId", self.channel_id.as_str()),
                    ("part", "snippet"),
                    ("type", "video"),
                    ("eventType", "live"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        let live_video = hits
            .items
            .into_iter()
            .next()
            .and_then(SearchResult::into_live_video);
        Ok(LiveStatus {
            is_live: live_video.is_some(),
            live_video,
        })
    }
}

/// Video data source chosen at startup
#[derive(Debug)]
pub enum VideoSource {
    /// No API key: serve the static catalog
    Static(VideoCatalog),
    /// Query the platform, answering from `fallback` when a request fails
    Api {
        client: PlatformClient,
        fallback: VideoCatalog,
    },
}

impl VideoSource {
    pub fn from_config(config: &CatalogConfig, fallback: VideoCatalog) -> Result<Self> {
        if config.use_static_data() {
            log::info!(
                "No platform API key configured, serving {} static videos",
                fallback.len()
            );
            return Ok(Self::Static(fallback));
        }

        log::info!("Fetching videos for channel {}", config.channel_id);
        Ok(Self::Api {
            client: PlatformClient::new(config)?,
            fallback,
        })
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// The static catalog
    pub fn fallback(&self) -> &VideoCatalog {
        match self {
            Self::Static(catalog) => catalog,
            Self::Api { fallback, .. } => fallback,
        }
    }

    /// Current channel uploads
    pub async fn videos(&self) -> VideoCatalog {
        match self {
            Self::Static(catalog) => catalog.clone(),
            Self::Api { client, fallback } => match client.channel_videos().await {
                Ok(videos) => VideoCatalog::new(videos),
                Err(e) => {
                    log::warn!("Loading videos failed, using the static catalog: {}", e);
                    fallback.clone()
                }
            },
        }
    }

    pub async fn search(&self, query: &str) -> Vec<Video> {
        match self {
            Self::Static(catalog) => catalog.search(query).into_iter().cloned().collect(),
            Self::Api { client, fallback } => match client.search(query).await {
                Ok(videos) => videos,
                Err(e) => {
                    log::warn!("Search failed, using the static catalog: {}", e);
                    fallback.search(query).into_iter().cloned().collect()
                }
            },
        }
    }

    /// Live status as last reported by the source
    ///
    /// Errors are passed through so a watcher can keep its previous answer.
    pub async fn live_status(&self) -> Result<LiveStatus> {
        match self {
            Self::Static(catalog) => Ok(catalog.live_status()),
            Self::Api { client, .. } => client.live_status().await,
        }
    }
}

/// Background task re-checking the live status on a fixed period
///
/// The first check runs immediately. A failed check keeps the previous
/// status. Dropping the watcher stops the task.
pub struct LiveStatusWatcher {
    status: watch::Receiver<LiveStatus>,
    handle: JoinHandle<()>,
}

impl LiveStatusWatcher {
    /// Spawn on the current runtime
    pub fn spawn(source: Arc<VideoSource>, period: Duration) -> Self {
        let (tx, status) = watch::channel(source.fallback().live_status());

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match source.live_status().await {
                    Ok(latest) => {
                        tx.send_if_modified(|current| {
                            if *current == latest {
                                return false;
                            }
                            match &latest.live_video {
                                Some(video) => log::info!("Channel is live: {}", video.title),
                                None => log::info!("Channel is no longer live"),
                            }
                            *current = latest;
                            true
                        });
                    }
                    Err(e) => log::warn!("Live status check failed: {}", e),
                }
            }
        });

        Self { status, handle }
    }

    pub fn current(&self) -> LiveStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<LiveStatus> {
        self.status.clone()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for LiveStatusWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
