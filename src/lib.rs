//! `Peystream` - Multi-source short-drama catalog core
//!
//! # Features
//!
//! - **Normalization**: DramaBox, NetShort and Melolo payloads mapped onto one model
//! - **Aggregation**: concurrent fan-out with partial-failure tolerance and dedup
//! - **Playback**: lazy stream lookup with stale-result protection
//! - **HTTP**: HTTP/2, TLS 1.3, Brotli/Zstd compression, TTL response cache
//!
//! # Example
//!
//! ```rust,no_run
//! use peystream::{Catalog, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Catalog::from_config(&Config::load()?)?;
//!     let home = catalog.home().await;
//!     println!("{} trending dramas", home.trending.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod http_client;
pub mod model;
pub mod playback;
pub mod source;

#[cfg(test)]
mod testing;

pub use cache::{CachePolicy, NoCache, TtlCache};
pub use catalog::{Catalog, DedupKey};
pub use config::Config;
pub use error::{ConfigError, UpstreamError};
pub use http_client::{HttpTransport, Transport, UpstreamClient};
pub use model::{Drama, DramaDetail, DubbedTab, Episode, HomeFeed, ParseDubbedTabError, ParseSourceError, Source};
pub use playback::{resolve_episode, PlaybackSession, Resolution, Selection};
pub use source::DramaSource;

/// Version of peystream
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
