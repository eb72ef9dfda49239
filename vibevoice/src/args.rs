use std::path::PathBuf;

use clap::Parser;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "vibevoice.toml";

/// Self-hosted text-to-speech service
#[derive(Debug, Parser)]
#[command(name = "vibevoice", about = "Text-to-speech HTTP service with a fallback model chain")]
pub struct Args {
    /// Path to configuration file [default: vibevoice.toml, skipped when absent]
    #[arg(short, long, env = "VIBEVOICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "VIBEVOICE_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,

    /// Log filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}
