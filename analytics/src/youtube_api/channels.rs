//! YouTube Channels API types and functionality.

use crate::youtube_api::types::Field;
use serde::{Deserialize, Serialize};

/// Response structure for the `channels.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// A list of channels that match the request criteria.
    ///
    /// The API drops this member entirely when nothing matched.
    #[serde(default)]
    pub items: Vec<Channel>,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// Only the `snippet` and `statistics` parts are requested.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: Option<ChannelSnippet>,
    #[serde(default)]
    pub statistics: Option<ChannelStatistics>,
}

/// The snippet object contains basic details about the channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: Option<String>,
}

/// Statistics about the channel.
///
/// All counts arrive as decimal strings.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#statistics>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStatistics {
    /// The number of times the channel has been viewed.
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    /// The number of subscribers that the channel has.
    ///
    /// Absent when the channel owner hides it.
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    /// Indicates whether the channel's subscriber count is publicly visible.
    #[serde(rename = "hiddenSubscriberCount", default)]
    pub hidden_subscriber_count: bool,
    /// The number of public videos uploaded to the channel.
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
}

impl Channel {
    pub fn title(&self) -> Field {
        self.snippet.as_ref().and_then(|s| s.title.as_ref()).into()
    }

    pub fn subscriber_count(&self) -> Field {
        self.statistics
            .as_ref()
            .filter(|s| !s.hidden_subscriber_count)
            .and_then(|s| s.subscriber_count.as_ref())
            .into()
    }

    pub fn video_count(&self) -> Field {
        self.statistics.as_ref().and_then(|s| s.video_count.as_ref()).into()
    }

    pub fn view_count(&self) -> Field {
        self.statistics.as_ref().and_then(|s| s.view_count.as_ref()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_response_has_no_items() {
        let response: ChannelListResponse = serde_json::from_str(
            r#"{"kind": "youtube#channelListResponse", "pageInfo": {"totalResults": 0, "resultsPerPage": 5}}"#,
        )
        .unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn missing_members_are_not_available() {
        let channel: Channel = serde_json::from_str(
            r#"{"id": "UC1", "statistics": {"viewCount": "9", "hiddenSubscriberCount": true, "subscriberCount": "0"}}"#,
        )
        .unwrap();
        assert_eq!(channel.title(), Field::NotAvailable);
        assert_eq!(channel.subscriber_count(), Field::NotAvailable);
        assert_eq!(channel.video_count(), Field::NotAvailable);
        assert_eq!(channel.view_count(), Field::Value("9".to_string()));
    }
}
