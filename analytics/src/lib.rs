//! Print a YouTube channel's and one of its videos' public statistics.
//!
//! A run goes through the same steps every time, strictly one after the other:
//!
//! 1. obtain OAuth credentials ([`credentials`], [`oauth`])
//! 2. turn the configured channel string into a channel ID ([`resolve`])
//! 3. fetch and print the channel's statistics ([`youtube_api`], [`report`])
//! 4. find one of the channel's videos, then fetch and print its statistics
//!
//! A failed or skipped statistics step ends the run with an error line instead of the closing
//! success message. Failures are reported on the console; they never turn into a non-zero exit.

use crate::config::Config;
use crate::credentials::Credential;
use crate::prompt::Prompt;
use crate::resolve::ChannelRef;
use crate::youtube_api::YouTubeClient;
use eyre::Context;
use std::io::Write;

pub mod config;
pub mod credentials;
mod error;
mod oauth;
pub mod prompt;
pub mod report;
pub mod resolve;
pub mod youtube_api;

#[cfg(test)]
mod test_support;

pub use error::Error;

/// Obtains and persists credentials, and nothing else.
pub async fn run_auth(
    config: &Config,
    prompter: &mut dyn Prompt,
    out: &mut dyn Write,
) -> eyre::Result<()> {
    match config.credentials.acquire(prompter, out).await {
        Ok(_) => writeln!(out, "Credentials setup completed successfully!")?,
        Err(e) => writeln!(out, "Credentials setup failed: {e:#}")?,
    }
    Ok(())
}

/// Runs the full statistics report.
///
/// Only I/O errors (on `out` or while prompting) are returned; everything else is printed and
/// ends the run.
pub async fn run_report(
    config: &Config,
    prompter: &mut dyn Prompt,
    out: &mut dyn Write,
) -> eyre::Result<()> {
    writeln!(out, "YouTube Analytics")?;
    writeln!(out, "=================")?;

    let Some(raw_channel) = &config.channel else {
        writeln!(out, "Error: No YouTube ID configured")?;
        writeln!(
            out,
            "Please add 'YOUTUBE_ID=\"your-channel-url\"' to your .env file or pass --channel"
        )?;
        return Ok(());
    };
    writeln!(out, "Using YouTube ID: {raw_channel}")?;

    let credential = match config.credentials.acquire(prompter, out).await {
        Ok(credential) => credential,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "could not obtain credentials");
            writeln!(out, "Failed to initialize YouTube API client: {e:#}")?;
            return Ok(());
        }
    };

    writeln!(out, "\nTesting API connection...")?;
    let client = match connect(&credential, &config.api_base) {
        Ok(client) => client,
        Err(e) => {
            writeln!(out, "Error running analytics: {e:#}")?;
            return Ok(());
        }
    };
    writeln!(out, "✓ API connection successful")?;

    match statistics(&client, raw_channel, prompter, out).await {
        Ok(()) => writeln!(out, "\nAnalytics completed successfully!")?,
        Err(e) if e.downcast_ref::<std::io::Error>().is_some() => return Err(e),
        Err(e) => writeln!(out, "Error running analytics: {e:#}")?,
    }
    Ok(())
}

/// Prints the channel's statistics, then those of one video.
///
/// Either step failing or being skipped ends the report early.
async fn statistics(
    client: &YouTubeClient,
    raw_channel: &str,
    prompter: &mut dyn Prompt,
    out: &mut dyn Write,
) -> eyre::Result<()> {
    let channel_id = channel_id(client, raw_channel, prompter).await?;

    writeln!(out, "\nRetrieving channel statistics...")?;
    let Some(channel_id) = channel_id else {
        eyre::bail!("channel ID not provided");
    };
    let channel = client
        .channel_statistics(&channel_id)
        .await
        .wrap_err("Failed to retrieve channel statistics")?;
    report::write_channel(out, &channel)?;

    writeln!(out, "\nRetrieving video statistics...")?;
    let video_id = match client.one_video_for_channel(&channel_id).await {
        Some(video_id) => {
            writeln!(out, "Found video from channel: {video_id}")?;
            Some(video_id)
        }
        None => ask_or_skip(
            prompter,
            "Enter a YouTube video ID (or press Enter to skip test): ",
        )?,
    };
    let Some(video_id) = video_id else {
        eyre::bail!("video ID not provided");
    };
    let video = client
        .video_statistics(&video_id)
        .await
        .wrap_err("Failed to retrieve video analytics")?;
    report::write_video(out, &video)?;
    Ok(())
}

fn connect(credential: &Credential, api_base: &str) -> eyre::Result<YouTubeClient> {
    YouTubeClient::new(credential.access_token.clone(), api_base)
}

/// Resolves the configured channel, asking the user when that fails.
async fn channel_id(
    client: &YouTubeClient,
    raw_channel: &str,
    prompter: &mut dyn Prompt,
) -> eyre::Result<Option<String>> {
    let channel = ChannelRef::parse(raw_channel);
    match resolve::resolve_channel(client, &channel).await {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            tracing::warn!(channel = raw_channel, error = %format!("{e:#}"), "error resolving handle to ID");
            ask_or_skip(
                prompter,
                "Enter your YouTube channel ID (or press Enter to skip test): ",
            )
        }
    }
}

fn ask_or_skip(prompter: &mut dyn Prompt, question: &str) -> eyre::Result<Option<String>> {
    let answer = prompter.ask(question)?;
    Ok(Some(answer).filter(|a| !a.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Command, READONLY_SCOPE};
    use crate::credentials::CredentialStore;
    use crate::prompt::scripted::Scripted;
    use crate::test_support::{Route, StubServer};
    use jiff::{SignedDuration, Timestamp};
    use serde_json::json;
    use std::path::Path;

    fn write_valid_token(path: &Path) {
        let credential = Credential {
            access_token: "ya29.valid".to_string(),
            refresh_token: Some("1//r".to_string()),
            token_uri: "http://127.0.0.1:9/token".to_string(),
            client_id: "c".to_string(),
            client_secret: None,
            scopes: vec![READONLY_SCOPE.to_string()],
            expiry: Some(Timestamp::now() + SignedDuration::from_secs(3600)),
        };
        std::fs::write(path, serde_json::to_string(&credential).unwrap()).unwrap();
    }

    fn config(dir: &Path, channel: Option<&str>, api_base: &str) -> Config {
        Config {
            command: Command::Report,
            channel: channel.map(str::to_string),
            credentials: CredentialStore {
                token_path: dir.join("token.json"),
                scopes: vec![READONLY_SCOPE.to_string()],
                client_secrets: None,
                search_dir: dir.to_path_buf(),
            },
            api_base: api_base.to_string(),
        }
    }

    async fn run_with(
        routes: Vec<Route>,
        channel: &str,
        prompter: &mut Scripted,
    ) -> (String, Vec<String>) {
        let server = StubServer::start(routes).await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Some(channel), server.base_url());
        write_valid_token(&config.credentials.token_path);

        let mut out = Vec::new();
        run_report(&config, prompter, &mut out).await.unwrap();
        (String::from_utf8(out).unwrap(), server.requests())
    }

    #[tokio::test]
    async fn end_to_end_channel_url() {
        let routes = vec![
            (
                "/channels",
                200,
                json!({"items": [{
                    "id": "UC123",
                    "statistics": {"subscriberCount": "10", "videoCount": "2", "viewCount": "500"},
                    "snippet": {"title": "Demo"}
                }]}),
            ),
            (
                "/search",
                200,
                json!({"items": [{"id": {"kind": "youtube#video", "videoId": "v1"}}]}),
            ),
            (
                "/videos",
                200,
                json!({"items": [{
                    "id": "v1",
                    "snippet": {"title": "First"},
                    "statistics": {"viewCount": "50", "likeCount": "5", "commentCount": "1"}
                }]}),
            ),
        ];
        let mut prompter = Scripted::default();
        let (out, requests) =
            run_with(routes, "https://youtube.com/channel/UC123", &mut prompter).await;

        for line in [
            "Using YouTube ID: https://youtube.com/channel/UC123",
            "✓ API connection successful",
            "Channel Name: Demo",
            "Subscribers: 10",
            "Videos: 2",
            "Total Views: 500",
            "Found video from channel: v1",
            "Title: First",
            "Views: 50",
            "Likes: 5",
            "Comments: 1",
            "Analytics completed successfully!",
        ] {
            assert!(out.contains(line), "missing {line:?} in:\n{out}");
        }
        assert!(prompter.asked.is_empty());
        // a channel URL carries the ID, so the only search is the video lookup
        assert_eq!(requests.len(), 3);
        assert!(requests[0].starts_with("GET /channels?"));
    }

    #[tokio::test]
    async fn skipped_channel_prompt_ends_the_run() {
        let routes = vec![("/search", 200, json!({"items": []}))];
        let mut prompter = Scripted::new([""]);
        let (out, requests) = run_with(routes, "@nobody", &mut prompter).await;

        assert_eq!(prompter.asked.len(), 1);
        assert!(
            out.contains("Error running analytics: channel ID not provided"),
            "{out}"
        );
        assert!(!out.contains("Retrieving video statistics"), "{out}");
        assert!(!out.contains("Analytics completed successfully!"), "{out}");
        // only the handle search
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn failed_channel_fetch_ends_the_run() {
        let routes = vec![
            ("/channels", 500, json!({"error": {"code": 500}})),
            ("/search", 200, json!({"items": []})),
        ];
        let mut prompter = Scripted::default();
        let (out, requests) =
            run_with(routes, "https://youtube.com/channel/UCgone", &mut prompter).await;

        assert!(
            out.contains("Error running analytics: Failed to retrieve channel statistics"),
            "{out}"
        );
        assert!(!out.contains("Analytics completed successfully!"), "{out}");
        assert!(prompter.asked.is_empty());
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn skipped_video_prompt_ends_the_run() {
        let routes = vec![
            (
                "/channels",
                200,
                json!({"items": [{"snippet": {"title": "Demo"}}]}),
            ),
            ("/search", 200, json!({"items": []})),
        ];
        let mut prompter = Scripted::new([""]);
        let (out, _) = run_with(routes, "https://youtube.com/channel/UC123", &mut prompter).await;

        assert!(out.contains("Channel Name: Demo"), "{out}");
        assert!(out.contains("Subscribers: N/A"), "{out}");
        assert!(
            out.contains("Error running analytics: video ID not provided"),
            "{out}"
        );
        assert!(!out.contains("Analytics completed successfully!"), "{out}");
    }

    #[tokio::test]
    async fn failed_video_fetch_ends_the_run() {
        let routes = vec![
            (
                "/channels",
                200,
                json!({"items": [{"snippet": {"title": "Demo"}}]}),
            ),
            ("/search", 200, json!({"items": []})),
        ];
        // the API has no /videos answer for the prompted ID
        let mut prompter = Scripted::new(["vid"]);
        let (out, _) = run_with(routes, "https://youtube.com/channel/UC123", &mut prompter).await;

        assert!(
            out.contains("Error running analytics: Failed to retrieve video analytics"),
            "{out}"
        );
        assert!(!out.contains("Analytics completed successfully!"), "{out}");
    }

    #[tokio::test]
    async fn missing_channel_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), None, "http://127.0.0.1:9");
        let mut out = Vec::new();
        run_report(&config, &mut Scripted::default(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Error: No YouTube ID configured"), "{out}");
        assert!(!out.contains("Testing API connection"), "{out}");
    }

    #[tokio::test]
    async fn auth_reports_success_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), None, "http://127.0.0.1:9");
        config.command = Command::Auth;
        write_valid_token(&config.credentials.token_path);

        let mut out = Vec::new();
        run_auth(&config, &mut Scripted::default(), &mut out)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Credentials setup completed successfully!\n"
        );
    }
}
