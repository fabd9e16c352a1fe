use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::WidgetConfig;
use crate::error::Result;
use crate::history::RecentKind;

#[derive(Parser)]
#[command(name = "reel-widgets")]
#[command(version)]
#[command(about = "Drive the recommender page widgets from a terminal")]
pub struct Args {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON file backing the key-value store
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Origin serving /api/autocomplete (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Fetch suggestions for one prefix
    Suggest {
        /// Prefix to complete
        prefix: String,
    },
    /// Read lines from stdin as keystrokes and print the dropdown as it changes
    Watch,
    /// Append a submitted query to the recent history
    Record {
        #[arg(long, value_enum, default_value = "search")]
        kind: RecentKind,
        value: String,
    },
    /// Print recent history, most recent first
    Recent,
    /// Show the stored theme, or flip it with --toggle
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

/// Load the config file (if any) and apply command-line overrides.
pub fn resolve_config(args: &Args) -> Result<WidgetConfig> {
    let mut config = match &args.config {
        Some(path) => WidgetConfig::load(path)?,
        None => WidgetConfig::default(),
    };
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(path) = &args.store {
        config.store_path = path.display().to_string();
    }
    Ok(config)
}
