//! Catalog aggregation across sources.
//!
//! Every page is assembled from several list endpoints fetched
//! concurrently. Results are concatenated in call-declaration order, never
//! completion order, and a failing source only contributes an empty list.
//!
//! # Example
//!
//! ```rust,no_run
//! use peystream::{Catalog, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let catalog = Catalog::from_config(&Config::load()?)?;
//! for drama in catalog.search_all("ceo").await {
//!     println!("[{}] {}", drama.source, drama.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod merge;

use futures::future::join_all;
use rand::Rng;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::ConfigError;
use crate::http_client::UpstreamClient;
use crate::model::{Drama, DramaDetail, DubbedTab, HomeFeed, Source};
use crate::source::{DramaBoxProvider, DramaSource, MeloloProvider, NetShortProvider};

pub use merge::{concat, dedup, prioritize_new, shuffle, DedupKey};

/// Entry point for every catalog page.
pub struct Catalog {
    dramabox: DramaBoxProvider,
    netshort: NetShortProvider,
    melolo: MeloloProvider,
}

impl Catalog {
    /// Build all providers over one shared client.
    pub fn new(client: UpstreamClient) -> Self {
        Self {
            dramabox: DramaBoxProvider::new(client.clone()),
            netshort: NetShortProvider::new(client.clone()),
            melolo: MeloloProvider::new(client),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(UpstreamClient::new(config)?))
    }

    pub fn dramabox(&self) -> &DramaBoxProvider {
        &self.dramabox
    }

    pub fn netshort(&self) -> &NetShortProvider {
        &self.netshort
    }

    pub fn melolo(&self) -> &MeloloProvider {
        &self.melolo
    }

    /// Provider serving `source`.
    pub fn provider(&self, source: Source) -> &dyn DramaSource {
        match source {
            Source::DramaBox => &self.dramabox,
            Source::NetShort => &self.netshort,
            Source::Melolo => &self.melolo,
        }
    }

    /// Landing page sections. The featured entry is the first trending one.
    #[instrument(skip(self))]
    pub async fn home(&self) -> HomeFeed {
        let (trending, latest, dubbed, theaters) = tokio::join!(
            self.dramabox.trending(),
            self.dramabox.latest(),
            self.dramabox.dubbed(DubbedTab::Popular),
            self.netshort.theaters(),
        );
        info!(
            trending = trending.len(),
            latest = latest.len(),
            dubbed = dubbed.len(),
            theaters = theaters.len(),
            "Home feed assembled"
        );
        HomeFeed {
            featured: trending.first().cloned(),
            trending,
            latest,
            dubbed,
            theaters,
        }
    }

    /// Dubbed entries from every list that may contain them.
    ///
    /// The newest tab reverses the merged list before deduplication, so the
    /// surviving copy of a duplicate is the one closest to the newest end.
    #[instrument(skip(self))]
    pub async fn dubbed(&self, tab: DubbedTab) -> Vec<Drama> {
        let (box_popular, box_newest, theaters, for_you, melolo_trending, melolo_latest) = tokio::join!(
            self.dramabox.dubbed(DubbedTab::Popular),
            self.dramabox.dubbed(DubbedTab::Newest),
            self.netshort.theaters(),
            self.netshort.for_you(1),
            self.melolo.trending(),
            self.melolo.latest(),
        );

        let mut dubbed: Vec<Drama> = concat([
            box_popular,
            box_newest,
            theaters,
            for_you,
            melolo_trending,
            melolo_latest,
        ])
        .into_iter()
        .filter(|drama| drama.is_dubbed)
        .collect();

        if tab == DubbedTab::Newest {
            dubbed.reverse();
        }
        dedup(dubbed, DedupKey::SourceAndId)
    }

    /// Latest releases from DramaBox and Melolo, new entries first.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> Vec<Drama> {
        let (dramabox, melolo) = tokio::join!(self.dramabox.latest(), self.melolo.latest());
        let mut latest = dedup(concat([dramabox, melolo]), DedupKey::Id);
        prioritize_new(&mut latest);
        latest
    }

    /// Everything browsable for a single source.
    #[instrument(skip(self))]
    pub async fn category(&self, source: Source) -> Vec<Drama> {
        let merged = match source {
            Source::DramaBox => {
                let (trending, latest, dubbed) = tokio::join!(
                    self.dramabox.trending(),
                    self.dramabox.latest(),
                    self.dramabox.dubbed(DubbedTab::Popular),
                );
                concat([trending, latest, dubbed])
            }
            Source::NetShort => {
                let (theaters, for_you) =
                    tokio::join!(self.netshort.theaters(), self.netshort.for_you(1));
                concat([theaters, for_you])
            }
            Source::Melolo => {
                let (trending, latest) = tokio::join!(self.melolo.trending(), self.melolo.latest());
                concat([trending, latest])
            }
        };
        dedup(merged, DedupKey::Id)
    }

    /// Personalised picks: DramaBox for-you, then NetShort for-you page 1.
    #[instrument(skip(self))]
    pub async fn for_you(&self) -> Vec<Drama> {
        let (dramabox, netshort) = tokio::join!(self.dramabox.for_you(), self.netshort.for_you(1));
        dedup(concat([dramabox, netshort]), DedupKey::SourceAndId)
    }

    /// Search every source. Results are concatenated DramaBox, NetShort,
    /// Melolo without deduplication; a blank query yields nothing.
    #[instrument(skip(self))]
    pub async fn search_all(&self, query: &str) -> Vec<Drama> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let searches = Source::ALL.map(|source| self.provider(source).search(query));
        concat(join_all(searches).await)
    }

    /// Trending from DramaBox and Melolo in random order.
    pub async fn all_trending(&self) -> Vec<Drama> {
        let mut merged = self.all_trending_unshuffled().await;
        shuffle(&mut merged, &mut rand::thread_rng());
        merged
    }

    /// [`all_trending`](Self::all_trending) with a caller-supplied RNG.
    pub async fn all_trending_with<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Vec<Drama> {
        let mut merged = self.all_trending_unshuffled().await;
        shuffle(&mut merged, rng);
        merged
    }

    /// Latest from DramaBox and Melolo in random order.
    pub async fn all_latest(&self) -> Vec<Drama> {
        let mut merged = self.latest_unshuffled().await;
        shuffle(&mut merged, &mut rand::thread_rng());
        merged
    }

    /// [`all_latest`](Self::all_latest) with a caller-supplied RNG.
    pub async fn all_latest_with<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Vec<Drama> {
        let mut merged = self.latest_unshuffled().await;
        shuffle(&mut merged, rng);
        merged
    }

    /// Trending from DramaBox then Melolo, in fetch order.
    pub async fn all_trending_unshuffled(&self) -> Vec<Drama> {
        let (dramabox, melolo) = tokio::join!(self.dramabox.trending(), self.melolo.trending());
        concat([dramabox, melolo])
    }

    async fn latest_unshuffled(&self) -> Vec<Drama> {
        let (dramabox, melolo) = tokio::join!(self.dramabox.latest(), self.melolo.latest());
        concat([dramabox, melolo])
    }

    /// Detail page data. `None` renders as "not found".
    #[instrument(skip(self))]
    pub async fn detail(&self, source: Source, id: &str) -> Option<DramaDetail> {
        self.provider(source).detail(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use crate::testing::FakeTransport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::time::Duration;

    fn keys(dramas: &[Drama]) -> Vec<String> {
        dramas.iter().map(|d| format!("{}:{}", d.source, d.id)).collect()
    }

    #[tokio::test]
    async fn one_failing_source_leaves_the_other() {
        let transport = FakeTransport::new()
            .fail("/dramabox/latest", UpstreamError::Transport("connection reset".into()))
            .route("/melolo/latest", json!({"books": [{"book_id": "m1"}, {"book_id": "m2"}]}));
        let catalog = Catalog::new(transport.client());

        let latest = catalog.latest().await;
        assert_eq!(keys(&latest), ["melolo:m1", "melolo:m2"]);
    }

    #[tokio::test]
    async fn every_source_failing_yields_empty_pages() {
        let catalog = Catalog::new(FakeTransport::new().client());
        assert!(catalog.latest().await.is_empty());
        assert!(catalog.dubbed(DubbedTab::Popular).await.is_empty());
        assert!(catalog.search_all("moon").await.is_empty());
        assert_eq!(catalog.home().await, HomeFeed::default());
    }

    #[tokio::test]
    async fn merge_order_follows_declaration_not_completion() {
        // DramaBox answers last but still comes first
        let transport = FakeTransport::new()
            .route_delayed("/dramabox/trending", json!([{"bookId": "d1"}]), Duration::from_millis(60))
            .route("/melolo/trending", json!({"books": [{"book_id": "m1"}]}));
        let catalog = Catalog::new(transport.client());

        let merged = catalog.all_trending_unshuffled().await;
        assert_eq!(keys(&merged), ["dramabox:d1", "melolo:m1"]);
    }

    #[tokio::test]
    async fn search_all_concatenates_without_dedup() {
        let transport = FakeTransport::new()
            .route("/dramabox/search?query=blade", json!([{"bookId": "1"}]))
            .route("/netshort/search?query=blade", json!([{"shortPlayId": "1"}]))
            .route("/melolo/search?query=blade", json!([{"book_id": "1"}, {"book_id": "1"}]));
        let catalog = Catalog::new(transport.client());

        let results = catalog.search_all("  blade ").await;
        assert_eq!(keys(&results), ["dramabox:1", "netshort:1", "melolo:1", "melolo:1"]);
    }

    #[tokio::test]
    async fn blank_search_makes_no_calls() {
        let transport = FakeTransport::new();
        let catalog = Catalog::new(transport.client());
        assert!(catalog.search_all("   ").await.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn latest_dedups_by_id_and_puts_new_first() {
        let transport = FakeTransport::new()
            .route("/dramabox/latest", json!([{"bookId": "1"}, {"bookId": "2"}]))
            .route("/melolo/latest", json!({"books": [{"book_id": "2"}, {"book_id": "3"}]}));
        let catalog = Catalog::new(transport.client());

        let latest = catalog.latest().await;
        assert_eq!(keys(&latest), ["dramabox:1", "dramabox:2", "melolo:3"]);
        assert!(latest.iter().all(|d| d.is_new));
    }

    #[tokio::test]
    async fn dubbed_filters_and_dedups_by_source_and_id() {
        let dub = |id: &str| json!({"bookId": id, "bookName": format!("Drama {id} (Sulih Suara)")});
        let transport = FakeTransport::new()
            .route("/dramabox/dubindo?classify=terpopuler", json!([dub("1"), {"bookId": "2", "bookName": "Plain"}]))
            .route("/dramabox/dubindo?classify=terbaru", json!([dub("3"), dub("1")]))
            .route(
                "/netshort/theaters",
                json!([{"contentInfos": [{"shortPlayId": "1", "shortPlayName": "Net (sulih suara)"}]}]),
            )
            .route("/melolo/latest", json!({"books": [{"book_id": "9", "book_name": "Mel (SULIH SUARA)"}]}));
        let catalog = Catalog::new(transport.client());

        let popular = catalog.dubbed(DubbedTab::Popular).await;
        assert_eq!(keys(&popular), ["dramabox:1", "dramabox:3", "netshort:1", "melolo:9"]);

        let newest = catalog.dubbed(DubbedTab::Newest).await;
        assert_eq!(keys(&newest), ["melolo:9", "netshort:1", "dramabox:1", "dramabox:3"]);
    }

    #[tokio::test]
    async fn category_merges_source_lists() {
        let transport = FakeTransport::new()
            .route("/netshort/theaters", json!([{"contentInfos": [{"shortPlayId": "a"}, {"shortPlayId": "b"}]}]))
            .route("/netshort/foryou?page=1", json!([{"shortPlayId": "b"}, {"shortPlayId": "c"}]));
        let catalog = Catalog::new(transport.client());

        let netshort = catalog.category(Source::NetShort).await;
        assert_eq!(keys(&netshort), ["netshort:a", "netshort:b", "netshort:c"]);
        assert!(catalog.category(Source::Melolo).await.is_empty());
    }

    #[tokio::test]
    async fn home_features_first_trending() {
        let transport = FakeTransport::new()
            .route("/dramabox/trending", json!([{"bookId": "t1"}, {"bookId": "t2"}]))
            .route("/netshort/theaters", json!([{"contentInfos": [{"shortPlayId": "n1"}]}]));
        let catalog = Catalog::new(transport.client());

        let home = catalog.home().await;
        assert_eq!(home.featured.map(|d| d.id).as_deref(), Some("t1"));
        assert_eq!(home.trending.len(), 2);
        assert_eq!(home.theaters.len(), 1);
        assert!(home.latest.is_empty());
    }

    #[tokio::test]
    async fn all_trending_keeps_contents() {
        let transport = FakeTransport::new()
            .route("/dramabox/trending", json!([{"bookId": "1"}, {"bookId": "2"}]))
            .route("/melolo/trending", json!({"books": [{"book_id": "3"}]}));
        let catalog = Catalog::new(transport.client());

        let mut shuffled = keys(&catalog.all_trending_with(&mut StdRng::seed_from_u64(3)).await);
        shuffled.sort();
        assert_eq!(shuffled, ["dramabox:1", "dramabox:2", "melolo:3"]);

        let mut unseeded = keys(&catalog.all_trending().await);
        unseeded.sort();
        assert_eq!(unseeded, shuffled);
    }

    #[tokio::test]
    async fn all_latest_keeps_contents_and_new_flags() {
        let transport = FakeTransport::new()
            .route("/dramabox/latest", json!([{"bookId": "1"}, {"bookId": "2"}]))
            .route("/melolo/latest", json!({"books": [{"book_id": "3"}, {"book_id": "4"}]}));
        let catalog = Catalog::new(transport.client());

        let first = catalog.all_latest_with(&mut StdRng::seed_from_u64(11)).await;
        let again = catalog.all_latest_with(&mut StdRng::seed_from_u64(11)).await;
        assert_eq!(first, again);
        assert!(first.iter().all(|d| d.is_new));

        let mut shuffled = keys(&first);
        shuffled.sort();
        assert_eq!(shuffled, ["dramabox:1", "dramabox:2", "melolo:3", "melolo:4"]);

        let mut unseeded = keys(&catalog.all_latest().await);
        unseeded.sort();
        assert_eq!(unseeded, shuffled);
    }

    #[tokio::test]
    async fn for_you_merges_dramabox_then_netshort() {
        let transport = FakeTransport::new()
            .route("/dramabox/foryou", json!([{"bookId": "1"}, {"bookId": "1"}, {"bookId": "2"}]))
            .route("/netshort/foryou?page=1", json!([{"shortPlayId": "1"}]));
        let catalog = Catalog::new(transport.client());

        let picks = catalog.for_you().await;
        assert_eq!(keys(&picks), ["dramabox:1", "dramabox:2", "netshort:1"]);
    }

    #[tokio::test]
    async fn detail_routes_by_source() {
        let transport = FakeTransport::new().route(
            "/melolo/detail?bookId=7",
            json!({"video_data": {"series_title": "Seven", "video_list": [{"vid": "v1"}]}}),
        );
        let catalog = Catalog::new(transport.client());

        let detail = catalog.detail(Source::Melolo, "7").await.unwrap();
        assert_eq!(detail.drama.title, "Seven");
        assert!(catalog.detail(Source::DramaBox, "7").await.is_none());
    }
}
