//! Core YouTube API client functionality.

use crate::Error;
use crate::youtube_api::{
    channels::{Channel, ChannelListResponse},
    search::SearchListResponse,
    videos::{Video, VideoListResponse},
};
use eyre::Context;
use http::Method;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// Where the Data API lives unless configured otherwise.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Client for the read-only parts of the YouTube Data API v3.
///
/// Every request carries the access token as a bearer token. The token is taken as-is; making
/// sure it is fresh is the job of [`crate::credentials::CredentialStore::acquire`], which runs
/// before a client is built.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Creates a client that authenticates with `access_token` against the API at `base_url`.
    pub fn new(access_token: impl Into<String>, base_url: impl Into<String>) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build YouTube API HTTP client")?;
        Ok(Self {
            access_token: access_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Makes an authenticated request to `<base>/<resource>` and parses the JSON answer.
    ///
    /// A transport failure, a non-success status, or an unparseable body is an [`Error::Api`].
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn make_authenticated_request<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        query_params: &[(&str, &str)],
    ) -> eyre::Result<T> {
        let url = format!("{}/{resource}", self.base_url);
        let response = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.access_token)
            .query(query_params)
            .send()
            .await
            .wrap_err_with(|| {
                Error::Api(format!("send {method} request to YouTube API: {url}"))
            })?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Api(format!(
                "YouTube API {method} {resource} request failed with status {status_code}: {error_text}"
            ))
            .into());
        }

        response.json().await.wrap_err_with(|| {
            Error::Api(format!("parse YouTube {resource} API response as JSON"))
        })
    }

    /// Gets statistics and basic details for a single channel by its ID.
    ///
    /// Uses the `channels.list` API with `part=statistics,snippet`. An ID that matches no
    /// channel is an [`Error::NotFound`].
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.readonly`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self))]
    pub async fn channel_statistics(&self, channel_id: &str) -> eyre::Result<Channel> {
        let query_params = [("part", "statistics,snippet"), ("id", channel_id)];
        let channels: ChannelListResponse = self
            .make_authenticated_request(Method::GET, "channels", &query_params)
            .await?;

        tracing::debug!(
            channel_id,
            returned_items = channels.items.len(),
            "fetched channel statistics"
        );

        match channels.items.into_iter().next() {
            Some(channel) => Ok(channel),
            None => Err(Error::NotFound(format!("channel {channel_id}")).into()),
        }
    }

    /// Gets statistics and basic details for a single video by its ID.
    ///
    /// Uses the `videos.list` API with `part=statistics,snippet`. An ID that matches no video
    /// is an [`Error::NotFound`].
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self))]
    pub async fn video_statistics(&self, video_id: &str) -> eyre::Result<Video> {
        let query_params = [("part", "statistics,snippet"), ("id", video_id)];
        let videos: VideoListResponse = self
            .make_authenticated_request(Method::GET, "videos", &query_params)
            .await?;

        tracing::debug!(
            video_id,
            returned_items = videos.items.len(),
            "fetched video statistics"
        );

        match videos.items.into_iter().next() {
            Some(video) => Ok(video),
            None => Err(Error::NotFound(format!("video {video_id}")).into()),
        }
    }

    /// Finds the channel that best matches `query` (a handle without its `@`, or a name).
    ///
    /// Uses `search.list` with `type=channel` and a single result. No match is an
    /// [`Error::NotFound`].
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    pub async fn search_channel_id(&self, query: &str) -> eyre::Result<String> {
        let query_params = [
            ("part", "snippet"),
            ("q", query),
            ("type", "channel"),
            ("maxResults", "1"),
        ];
        let results: SearchListResponse = self
            .make_authenticated_request(Method::GET, "search", &query_params)
            .await?;

        results
            .items
            .iter()
            .find_map(|item| item.channel_id())
            .map(str::to_string)
            .ok_or_else(|| Error::NotFound(format!("no channel matches {query:?}")).into())
    }

    /// Returns the ID of one video published by `channel_id`, if the search finds any.
    ///
    /// Search failures are logged and reported as `None`, same as an empty result; callers are
    /// expected to fall back to asking the user.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    pub async fn one_video_for_channel(&self, channel_id: &str) -> Option<String> {
        let query_params = [
            ("part", "snippet"),
            ("channelId", channel_id),
            ("maxResults", "1"),
            ("type", "video"),
        ];
        let results: SearchListResponse = match self
            .make_authenticated_request(Method::GET, "search", &query_params)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "error finding videos for channel");
                return None;
            }
        };

        let video_id = results
            .items
            .into_iter()
            .find_map(|item| item.id.video_id);
        if video_id.is_none() {
            tracing::info!(channel_id, "channel search returned no videos");
        }
        video_id
    }
}
