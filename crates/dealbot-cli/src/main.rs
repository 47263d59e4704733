mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dealbot-cli")]
#[command(about = "Deal bot command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the configured sources and run one posting cycle.
    Post,
    /// List recently posted deals.
    Recent {
        #[arg(long, default_value_t = 24)]
        hours: i64,
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long)]
        category: Option<String>,
    },
    /// Print aggregate deal statistics.
    Stats,
    /// Delete deals older than the retention window.
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Validate one or more URLs against the posting gates.
    Validate {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Post => commands::post().await,
        Commands::Recent {
            hours,
            limit,
            category,
        } => commands::recent(hours, limit, category.as_deref()).await,
        Commands::Stats => commands::stats().await,
        Commands::Cleanup { days } => commands::cleanup(days).await,
        Commands::Validate { urls } => commands::validate(&urls).await,
    }
}
