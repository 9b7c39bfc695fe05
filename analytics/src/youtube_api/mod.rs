//! YouTube Data API v3 client library.
//!
//! This module covers the read-only slice of the API needed to summarize a channel: looking
//! channels and videos up by ID, and searching for a channel by name or for one of a channel's
//! videos.
//!
//! Response members the API may leave out are modelled as `Option`s and surfaced through
//! accessors returning [`Field`], so a missing statistic reads as [`Field::NotAvailable`]
//! instead of failing the whole call.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_analytics::youtube_api::{DEFAULT_API_BASE, YouTubeClient};
//!
//! # async fn example(access_token: String) -> eyre::Result<()> {
//! let client = YouTubeClient::new(access_token, DEFAULT_API_BASE)?;
//! let channel = client.channel_statistics("UC_x5XG1OV2P6uZZ5FSM9Ttw").await?;
//! println!("{} has {} subscribers", channel.title(), channel.subscriber_count());
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod client;
pub mod search;
pub mod types;
pub mod videos;

pub use client::{DEFAULT_API_BASE, YouTubeClient};
pub use types::Field;

pub use channels::{Channel, ChannelSnippet, ChannelStatistics};
pub use search::{SearchResult, SearchResultId, SearchResultSnippet};
pub use videos::{Video, VideoSnippet, VideoStatistics};
