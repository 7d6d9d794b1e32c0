use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::discord::DEFAULT_API_BASE;

/// Board Watch - polls a forum board and announces new posts in chat
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Forum listing page to watch
    #[arg(long, env = "TARGET_URL")]
    pub target_url: Url,

    /// Chat channel to announce new posts in
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Chat bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Port of the liveness endpoint
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Interval between polls in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_secs: u64,

    /// Timeout of a single page fetch in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout_secs: u64,

    /// Root of the chat REST API
    #[arg(long, env = "DISCORD_API_BASE", default_value = DEFAULT_API_BASE, hide = true)]
    pub discord_api_base: String,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Development commands
    Dev {
        #[command(subcommand)]
        dev_command: DevCommand,
    },
}

#[derive(Debug, Parser)]
pub enum DevCommand {
    /// Fetch the target page once and print the newest post
    Extract,
}

impl Opts {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn health_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Opts::try_parse_from([
            "board-watch",
            "--target-url",
            "https://cafe.example.com/board",
        ])
        .unwrap();

        assert!(opts.command.is_none());
        assert_eq!(opts.poll_interval(), Duration::from_secs(60));
        assert_eq!(opts.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(opts.port, 8080);
        assert_eq!(opts.health_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(opts.discord_api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn malformed_channel_id_is_accepted() {
        let opts = Opts::try_parse_from([
            "board-watch",
            "--target-url",
            "https://cafe.example.com/board",
            "--channel-id",
            "general",
        ])
        .unwrap();

        assert_eq!(opts.channel_id.as_deref(), Some("general"));
    }

    #[test]
    fn rejects_zero_interval_and_bad_url() {
        assert!(
            Opts::try_parse_from([
                "board-watch",
                "--target-url",
                "https://cafe.example.com/board",
                "--poll-interval-secs",
                "0",
            ])
            .is_err()
        );
        assert!(Opts::try_parse_from(["board-watch", "--target-url", "not a url"]).is_err());
    }

    #[test]
    fn dev_extract_subcommand() {
        let opts = Opts::try_parse_from([
            "board-watch",
            "--target-url",
            "https://cafe.example.com/board",
            "dev",
            "extract",
        ])
        .unwrap();

        assert!(matches!(
            opts.command,
            Some(Command::Dev {
                dev_command: DevCommand::Extract
            })
        ));
    }
}
