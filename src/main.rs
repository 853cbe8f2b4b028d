//! `Peystream` CLI - Browse and play short dramas from every source

mod cmd;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use peystream::config::API_BASE_ENV;
use peystream::{Catalog, Config, DubbedTab, Source, UpstreamClient};

#[derive(Parser)]
#[command(name = "peystream")]
#[command(about = "Multi-source short-drama catalog browser")]
#[command(version)]
struct Cli {
    /// Upstream API base URL
    #[arg(long, global = true, env = API_BASE_ENV)]
    api_base: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Disable the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Landing page: featured, trending, latest, dubbed, theaters
    Home,

    /// Trending dramas from DramaBox and Melolo
    Trending {
        /// Shuffle the merged list
        #[arg(short, long)]
        shuffle: bool,
    },

    /// Latest releases, new entries first
    Latest,

    /// Personalised picks from DramaBox and NetShort
    ForYou,

    /// Indonesian-dubbed dramas across all sources
    Dubbed {
        /// Ordering tab (popular, newest)
        #[arg(short, long, default_value = "popular")]
        tab: DubbedTab,
    },

    /// Everything browsable for one source
    Category {
        /// Source (dramabox, netshort, melolo)
        source: Source,
    },

    /// Search all sources
    Search {
        /// Search query
        query: String,
    },

    /// Drama metadata and episode list
    Detail {
        /// Source (dramabox, netshort, melolo)
        source: Source,

        /// Drama id
        id: String,
    },

    /// Resolve the media URL of an episode
    Play {
        /// Source (dramabox, netshort, melolo)
        source: Source,

        /// Drama id
        id: String,

        /// Episode number
        #[arg(short, long, default_value = "1")]
        episode: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let catalog = build_catalog(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Home => cmd::browse::cmd_home(&catalog, json).await?,
        Commands::Trending { shuffle } => cmd::browse::cmd_trending(&catalog, shuffle, json).await?,
        Commands::Latest => cmd::browse::cmd_latest(&catalog, json).await?,
        Commands::ForYou => cmd::browse::cmd_for_you(&catalog, json).await?,
        Commands::Dubbed { tab } => cmd::browse::cmd_dubbed(&catalog, tab, json).await?,
        Commands::Category { source } => cmd::browse::cmd_category(&catalog, source, json).await?,
        Commands::Search { query } => cmd::browse::cmd_search(&catalog, &query, json).await?,
        Commands::Detail { source, id } => cmd::detail::cmd_detail(&catalog, source, &id, json).await?,
        Commands::Play { source, id, episode } => {
            cmd::play::cmd_play(&catalog, source, &id, episode, json).await?;
        }
    }

    Ok(())
}

/// Config file, then environment, then command-line flags.
fn build_catalog(cli: &Cli) -> Result<Catalog> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(base) = &cli.api_base {
        config = config.with_base_url(base);
        config.validate().context("Invalid --api-base")?;
    }
    if cli.no_cache {
        config.cache_ttl_secs = 0;
    }
    let client = UpstreamClient::new(&config).context("Failed to build HTTP client")?;
    Ok(Catalog::new(client))
}
