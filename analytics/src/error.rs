//! The kinds of failure a run can hit.
//!
//! Functions in this crate return [`eyre::Result`]. When a failure belongs to one of the kinds
//! below, the [`Error`] sits in the report's chain and can be recovered with
//! [`eyre::Report::downcast_ref`]:
//!
//! ```rust
//! # use youtube_analytics::Error;
//! # fn check(report: eyre::Report) {
//! if let Some(Error::NotFound(what)) = report.downcast_ref::<Error>() {
//!     eprintln!("nothing matched {what}");
//! }
//! # }
//! ```

/// Classified failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unusable client-secret descriptor or token file.
    #[error("configuration error: {0}")]
    Config(String),
    /// The refresh exchange or the consent flow failed.
    #[error("authorization failed: {0}")]
    Auth(String),
    /// The API answered, but with no items for the given ID or query.
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other remote-call failure.
    #[error("YouTube API request failed: {0}")]
    Api(String),
}
