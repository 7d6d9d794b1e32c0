pub mod config;
pub mod discord;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod notifier;
pub mod poll;
pub mod post;
pub mod scheduler;
pub mod status;
pub mod watermark;

pub const PROJECT_NAME: &str = "board-watch";
pub const LOG_TARGET: &str = "board_watch::main";
