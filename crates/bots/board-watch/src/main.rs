use std::io;
use std::sync::Arc;

use board_watch::config::{Command, DevCommand, Opts};
use board_watch::discord::DiscordClient;
use board_watch::extractor::{Extractor, ExtractorError};
use board_watch::fetcher::{FetchError, Fetcher as _, HttpFetcher};
use board_watch::health::{HealthServer, HealthServerError, shutdown_signal};
use board_watch::notifier::NotifyError;
use board_watch::poll::PollCycle;
use board_watch::scheduler::PollScheduler;
use board_watch::status::StatusSource;
use board_watch::{LOG_TARGET, PROJECT_NAME};
use clap::Parser;
use snafu::{OptionExt as _, ResultExt as _, Snafu};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Snafu)]
pub enum BotError {
    #[snafu(display("HTTP client initialization failed: {source}"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("Extractor initialization failed: {source}"))]
    Extractor { source: ExtractorError },
    #[snafu(display("Fetch error: {source}"))]
    Fetch { source: FetchError },
    #[snafu(display("Chat credentials rejected: {source}"))]
    Credentials { source: NotifyError },
    #[snafu(display("Bot token is required for bot operation"))]
    MissingBotToken,
    #[snafu(display("Health server error: {source}"))]
    HealthServer { source: HealthServerError },
    #[snafu(display("Logging initialization failed"))]
    Logging,
}

pub type BotResult<T> = std::result::Result<T, BotError>;

#[snafu::report]
#[tokio::main]
async fn main() -> BotResult<()> {
    init_logging()?;

    let opts = Opts::parse();

    if let Some(Command::Dev { dev_command }) = &opts.command {
        return handle_dev_command(&opts, dev_command).await;
    }

    run_bot(opts).await
}

async fn run_bot(opts: Opts) -> BotResult<()> {
    info!(target: LOG_TARGET, "Starting {PROJECT_NAME}");

    let token = opts.bot_token.as_deref().context(MissingBotTokenSnafu)?;
    let discord = DiscordClient::new(
        &opts.discord_api_base,
        token,
        opts.channel_id.clone(),
        opts.poll_interval(),
    )
    .context(HttpClientSnafu)?;
    discord
        .verify_credentials()
        .await
        .context(CredentialsSnafu)?;

    let fetcher = HttpFetcher::new(opts.fetch_timeout()).context(HttpClientSnafu)?;
    let extractor = Extractor::new().context(ExtractorSnafu)?;
    let cycle = Arc::new(PollCycle::new(
        opts.target_url.clone(),
        Arc::new(fetcher),
        extractor,
        Arc::new(discord),
    ));

    let status = StatusSource {
        target_url: opts.target_url.clone(),
        destination: opts.channel_id.clone(),
        poll_interval: opts.poll_interval(),
        watermark: cycle.watermark(),
    };
    info!(target: LOG_TARGET, report = %status.report(), "Bot configuration");

    let server = HealthServer::bind(opts.health_addr(), status)
        .await
        .context(HealthServerSnafu)?;
    let scheduler = PollScheduler::new(cycle, opts.poll_interval());

    info!(target: LOG_TARGET, "Bot is running. Press Ctrl+C to stop.");

    tokio::select! {
        res = server.run() => res.context(HealthServerSnafu)?,
        _ = scheduler.run() => {},
        _ = shutdown_signal() => {},
    }

    info!(target: LOG_TARGET, "Bot stopped");
    Ok(())
}

async fn handle_dev_command(opts: &Opts, dev_command: &DevCommand) -> BotResult<()> {
    match dev_command {
        DevCommand::Extract => {
            info!(target: LOG_TARGET, url = %opts.target_url, "Testing extraction");

            let fetcher = HttpFetcher::new(opts.fetch_timeout()).context(HttpClientSnafu)?;
            let extractor = Extractor::new().context(ExtractorSnafu)?;

            let markup = fetcher.fetch(&opts.target_url).await.context(FetchSnafu)?;
            match extractor.extract(&markup, &opts.target_url, &fetcher).await {
                Some(post) => {
                    println!("Newest post on {}:", opts.target_url);
                    println!("  Title: {}", post.title);
                    println!("  Link: {}", post.link);
                }
                None => println!("No post found on {}", opts.target_url),
            }

            Ok(())
        }
    }
}

pub fn init_logging() -> BotResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| BotError::Logging)?;

    Ok(())
}
