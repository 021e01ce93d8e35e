//! CLI for pixgrab.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pixgrab_core::config;
use std::path::PathBuf;

use commands::{run_keyword, show_config, KeywordArgs};

/// Top-level CLI for pixgrab.
#[derive(Debug, Parser)]
#[command(name = "pixgrab")]
#[command(about = "pixgrab: download the search results of a keyword", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Search a keyword and download the matching artworks.
    Keyword {
        /// Search keyword (tag).
        keyword: String,
        /// Order by popularity instead of recency.
        #[arg(long)]
        popular: bool,
        /// Content filter: safe, r18 or all.
        #[arg(long, default_value = "safe")]
        mode: String,
        /// Number of artworks to look for (60 per search page).
        #[arg(short = 'n', long, default_value = "200", value_name = "N")]
        images: usize,
        /// Maximum number of artworks to download (default from config).
        #[arg(long, value_name = "N")]
        capacity: Option<usize>,
        /// Worker threads per phase (default from config).
        #[arg(long, value_name = "N")]
        threads: Option<usize>,
        /// Directory to save into (default from config, else the current directory).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Show the config file path and effective settings.
    Config,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg.download);

        match cli.command {
            CliCommand::Keyword {
                keyword,
                popular,
                mode,
                images,
                capacity,
                threads,
                download_dir,
            } => run_keyword(
                cfg,
                KeywordArgs {
                    keyword,
                    popular,
                    mode,
                    images,
                    capacity,
                    threads,
                    download_dir,
                },
            )?,
            CliCommand::Config => show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
