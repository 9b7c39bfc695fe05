//! YouTube Search API types.

use serde::{Deserialize, Serialize};

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

/// A search result points at a video, channel, or playlist matching the query.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    #[serde(default)]
    pub snippet: Option<SearchResultSnippet>,
}

/// Identifies the resource a [`SearchResult`] matched.
///
/// Exactly one of the IDs is set, according to `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultId {
    /// The resource type, e.g. `youtube#video`.
    pub kind: String,
    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSnippet {
    /// The channel that published the matched resource (for a channel, the channel itself).
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

impl SearchResult {
    /// The channel this result belongs to.
    pub fn channel_id(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|s| s.channel_id.as_deref())
            .or(self.id.channel_id.as_deref())
    }
}
