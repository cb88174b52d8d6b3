use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use nse_screener::commands::{chat_cmd, scrape_cmd};
use nse_screener::models::settings::AppSettings;

#[derive(Debug, Parser)]
#[command(name = "nse-screener", version, about = "NSE fundamentals scraper and conversational stock screener")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape fundamentals for the symbol universe into the database
    Scrape {
        #[command(flatten)]
        common: CommonArgs,
        /// Number of symbols to take from the universe
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        /// Base delay between symbols, in seconds
        #[arg(long)]
        delay: Option<f64>,
    },
    /// Chat with the screener about the stored stocks
    Chat {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Print a summary of the stored data
    Summary {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Settings file (JSON)
    #[arg(long, default_value = "screener.json")]
    config: PathBuf,
    /// SQLite database path
    #[arg(long)]
    db: Option<PathBuf>,
}

impl CommonArgs {
    fn load(&self) -> Result<AppSettings> {
        let mut settings = AppSettings::load(&self.config)?;
        if let Some(db) = &self.db {
            settings.db_path = db.clone();
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scrape { common, limit, batch_size, delay } => {
            nse_screener::init_logging("info");
            let mut settings = common.load()?;
            if let Some(limit) = limit {
                settings.symbol_limit = limit;
            }
            if let Some(batch_size) = batch_size {
                settings.batch_size = batch_size;
            }
            if let Some(delay) = delay {
                settings.delay_secs = delay;
            }
            scrape_cmd::run_scrape(&settings).await?;
        }
        Command::Chat { common } => {
            // keep log lines out of the paced output unless RUST_LOG asks for them
            nse_screener::init_logging("warn");
            let settings = common.load()?;
            chat_cmd::run_chat(&settings).await?;
        }
        Command::Summary { common } => {
            nse_screener::init_logging("info");
            let settings = common.load()?;
            scrape_cmd::run_summary(&settings)?;
        }
    }
    Ok(())
}
