//! Command-line arguments for the ticker display.
use std::path::PathBuf;

use clap::Parser;
use ticker_common::net::PROVIDER_BASE_URL;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON file holding the persisted symbol, price, credential and rotation settings.
    #[clap(long, default_value = "ticker-settings.json")]
    pub settings: PathBuf,

    /// Provider credential, used when none has been stored yet.
    #[clap(long, env = "TICKER_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Base URL of the quote provider.
    #[clap(long, default_value = PROVIDER_BASE_URL)]
    pub provider_url: String,

    /// Control loop period in milliseconds.
    #[clap(long, default_value_t = 250)]
    pub tick_ms: u64,

    /// Render loop period in milliseconds.
    #[clap(long, default_value_t = 200)]
    pub render_ms: u64,

    /// Pause between hiding and showing the quote on a rotation swap, in milliseconds.
    #[clap(long, default_value_t = 100)]
    pub fade_ms: u64,

    /// Use the offline random-walk source instead of the provider.
    #[clap(long)]
    pub demo: bool,
}
