//! YouTube Videos API types and functionality.

use crate::youtube_api::types::Field;
use serde::{Deserialize, Serialize};

/// Response structure for the `videos.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    /// A list of videos that match the request criteria.
    #[serde(default)]
    pub items: Vec<Video>,
}

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
}

/// Basic details about the video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSnippet {
    pub title: Option<String>,
}

/// Statistics about the video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStatistics {
    /// The number of times the video has been viewed.
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    /// The number of users who have indicated that they liked the video.
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    /// The number of comments for the video.
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}

impl Video {
    pub fn title(&self) -> Field {
        self.snippet.as_ref().and_then(|s| s.title.as_ref()).into()
    }

    pub fn view_count(&self) -> Field {
        self.statistics.as_ref().and_then(|s| s.view_count.as_ref()).into()
    }

    pub fn like_count(&self) -> Field {
        self.statistics.as_ref().and_then(|s| s.like_count.as_ref()).into()
    }

    pub fn comment_count(&self) -> Field {
        self.statistics.as_ref().and_then(|s| s.comment_count.as_ref()).into()
    }
}
