use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_analytics::config::{Args, Command, Config};
use youtube_analytics::prompt::Terminal;
use youtube_analytics::{run_auth, run_report};

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    // settings in .env are visible to clap's env fallbacks below
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env file: {e}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cwd = std::env::current_dir().context("determine working directory")?;
    let config = Config::from_args(args, cwd);
    tracing::debug!(?config, "starting");

    let mut prompter = Terminal;
    let mut stdout = std::io::stdout();
    match config.command {
        Command::Report => run_report(&config, &mut prompter, &mut stdout).await,
        Command::Auth => run_auth(&config, &mut prompter, &mut stdout).await,
    }
}
