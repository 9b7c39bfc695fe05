//! Command-line and environment configuration.

use crate::credentials::CredentialStore;
use crate::youtube_api::DEFAULT_API_BASE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Read-only access is all a statistics summary needs.
pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Older `.env` files spell the channel variable this way.
const LEGACY_CHANNEL_VAR: &str = "yourube_id";

#[derive(Parser, Debug)]
#[command(author, version, about = "Print a YouTube channel's and video's public statistics")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Channel to report on: a channel ID, channel URL, legacy /c/ or /user/ URL, or @handle
    #[arg(long, env = "YOUTUBE_ID")]
    pub channel: Option<String>,

    /// Where the OAuth token is persisted between runs
    #[arg(long, env = "YOUTUBE_TOKEN_FILE", default_value = "token.json")]
    pub token_file: PathBuf,

    /// OAuth client secrets file; discovered next to the working directory if not given
    #[arg(long, env = "YOUTUBE_CLIENT_SECRET")]
    pub client_secret: Option<PathBuf>,

    /// OAuth scope to request (repeatable)
    #[arg(long = "scope", default_value = READONLY_SCOPE)]
    pub scopes: Vec<String>,

    /// Base URL of the YouTube Data API
    #[arg(long, env = "YOUTUBE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print channel and video statistics (the default)
    Report,
    /// Only obtain and persist OAuth credentials
    Auth,
}

/// Everything a run needs to know, resolved from [`Args`] and the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,
    /// The raw channel string, if any was configured.
    pub channel: Option<String>,
    pub credentials: CredentialStore,
    pub api_base: String,
}

impl Config {
    /// Builds the run configuration, relative to the working directory `cwd`.
    pub fn from_args(args: Args, cwd: PathBuf) -> Self {
        let channel = args
            .channel
            .or_else(|| std::env::var(LEGACY_CHANNEL_VAR).ok())
            .filter(|c| !c.trim().is_empty());
        Self {
            command: args.command.unwrap_or(Command::Report),
            channel,
            credentials: CredentialStore {
                token_path: cwd.join(args.token_file),
                scopes: args.scopes,
                client_secrets: args.client_secret.map(|p| cwd.join(p)),
                search_dir: cwd,
            },
            api_base: args.api_base,
        }
    }
}
