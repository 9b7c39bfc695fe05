//! Turning whatever the user typed into a channel ID.
//!
//! People refer to channels in many ways: a raw `UC...` ID, a `/channel/` URL, a legacy `/c/` or
//! `/user/` URL, a handle URL, or a bare `@handle`. Only the first two carry the ID itself;
//! everything else has to be looked up through the search API.

use crate::youtube_api::YouTubeClient;
use regex::Regex;
use std::sync::LazyLock;

static CHANNEL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/channel/([^/?&]+)").expect("valid regex"));
static LEGACY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/(?:c|user)/([^/?&]+)").expect("valid regex"));
static HANDLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/@([^/?&]+)").expect("valid regex"));

/// A reference to a channel, as given by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// A canonical channel ID; usable directly.
    Id(String),
    /// A handle or name that still has to be searched for.
    ///
    /// Usually `@name`, but input that matches no known shape is kept verbatim.
    Handle(String),
}

impl ChannelRef {
    /// Classifies raw user input. Never fails; unknown shapes become a [`ChannelRef::Handle`].
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('@') {
            return ChannelRef::Handle(raw.to_string());
        }
        if let Some(m) = CHANNEL_URL.captures(raw) {
            return ChannelRef::Id(m[1].to_string());
        }
        if let Some(m) = LEGACY_URL.captures(raw) {
            return ChannelRef::Handle(format!("@{}", &m[1]));
        }
        if let Some(m) = HANDLE_URL.captures(raw) {
            return ChannelRef::Handle(format!("@{}", &m[1]));
        }
        ChannelRef::Handle(raw.to_string())
    }
}

/// Produces the channel ID `channel` refers to.
///
/// An [`ChannelRef::Id`] is returned without touching the network. A handle is searched for
/// (without its `@`), and the first matching channel wins; no match is a
/// [`crate::Error::NotFound`].
#[tracing::instrument(skip(client))]
pub async fn resolve_channel(client: &YouTubeClient, channel: &ChannelRef) -> eyre::Result<String> {
    match channel {
        ChannelRef::Id(id) => Ok(id.clone()),
        ChannelRef::Handle(handle) => {
            let query = handle.trim_start_matches('@');
            let id = client.search_channel_id(query).await?;
            tracing::debug!(handle, channel_id = %id, "resolved handle");
            Ok(id)
        }
    }
}
