//! NetShort source provider
//!
//! Catalog items rarely report an episode count; the all-episodes endpoint
//! doubles as the detail endpoint and carries inline play URLs.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fields::{first_present, first_string, flag, value_to_u32, FieldTable};
use crate::http_client::UpstreamClient;
use crate::model::{order_episodes, Drama, DramaDetail, Episode, Source};
use crate::source::provider::{
    encode, episode, fetch_list, is_dubbed_title, list_items, position_number, ContextHints,
    DramaSource,
};

pub const FIELDS: FieldTable = FieldTable {
    id: &["shortPlayId", "id"],
    title: &["shortPlayName", "title", "name"],
    cover: &["shortPlayCover", "groupShortPlayCover", "cover", "coverUrl"],
    description: &["description"],
    episode_count: &["totalEpisode", "episodeCount", "totalReserveNum"],
};

/// Maximum items kept from the flattened theaters groups.
pub const THEATER_LIMIT: usize = 30;

/// `script` code NetShort uses for its popular shelf.
const SCRIPT_POPULAR: i64 = 3;

/// Normalize a NetShort catalog item. `None` when it carries no id.
pub fn normalize(item: &Value, hints: ContextHints) -> Option<Drama> {
    let id = FIELDS.id(item)?;
    let title = FIELDS.title(item);
    let native_trending = item.get("script").and_then(Value::as_i64) == Some(SCRIPT_POPULAR);
    Some(Drama {
        id,
        is_dubbed: is_dubbed_title(&title),
        title,
        cover: FIELDS.cover(item),
        description: FIELDS.description(item),
        episode_count: FIELDS.episode_count(item),
        source: Source::NetShort,
        is_trending: hints.trending || native_trending,
        is_new: hints.new || flag(item, "isNewLabel"),
    })
}

/// Normalize one entry of `shortPlayEpisodeInfos`.
pub fn normalize_episode(item: &Value, index: usize) -> Episode {
    let episode_no = first_present(item, &["episodeNo"])
        .and_then(value_to_u32)
        .unwrap_or_else(|| position_number(index));
    episode(
        first_string(item, &["episodeId", "id"]),
        first_string(item, &["episodeName"]),
        episode_no,
        first_string(item, &["playVoucher", "videoUrl", "url"]),
        first_string(item, &["duration"]),
        index,
    )
}

fn episodes_from(data: &Value) -> Vec<Episode> {
    let mut episodes: Vec<Episode> = list_items(data, Some("shortPlayEpisodeInfos"))
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_episode(item, index))
        .collect();
    order_episodes(&mut episodes);
    episodes
}

fn detail_from(id: &str, data: &Value) -> DramaDetail {
    let episodes = episodes_from(data);
    let title = first_string(data, &["shortPlayName"]).unwrap_or_default();
    let episode_count = match first_present(data, &["totalEpisode"]).and_then(value_to_u32) {
        Some(n) if n > 0 => n,
        _ => u32::try_from(episodes.len()).unwrap_or(u32::MAX),
    };
    DramaDetail {
        drama: Drama {
            id: first_string(data, &["shortPlayId"]).unwrap_or_else(|| id.to_string()),
            is_dubbed: is_dubbed_title(&title),
            title,
            cover: first_string(data, &["shortPlayCover"]).unwrap_or_default(),
            description: first_string(data, &["shotIntroduce"]).unwrap_or_default(),
            episode_count,
            source: Source::NetShort,
            is_trending: false,
            is_new: false,
        },
        author: None,
        tags: Vec::new(),
        episodes,
    }
}

pub struct NetShortProvider {
    client: UpstreamClient,
}

impl NetShortProvider {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Theater shelves, flattened across groups in upstream order.
    #[instrument(skip(self))]
    pub async fn theaters(&self) -> Vec<Drama> {
        let Some(data) = self.client.fetch_data("/netshort/theaters").await else {
            return Vec::new();
        };
        let dramas: Vec<Drama> = list_items(&data, None)
            .iter()
            .filter_map(|group| group.get("contentInfos").and_then(Value::as_array))
            .flatten()
            .filter_map(|item| normalize(item, ContextHints::NONE))
            .take(THEATER_LIMIT)
            .collect();
        debug!(count = dramas.len(), "Flattened theater groups");
        dramas
    }

    /// Personalised feed page (1-based).
    #[instrument(skip(self))]
    pub async fn for_you(&self, page: u32) -> Vec<Drama> {
        let endpoint = format!("/netshort/foryou?page={page}");
        fetch_list(&self.client, &endpoint, None, None, |item| {
            normalize(item, ContextHints::NONE)
        })
        .await
    }

    async fn fetch_all_episodes(&self, id: &str) -> Option<Value> {
        self.client
            .fetch_data(&format!("/netshort/allepisode?shortPlayId={}", encode(id)))
            .await
    }
}

#[async_trait]
impl DramaSource for NetShortProvider {
    fn source(&self) -> Source {
        Source::NetShort
    }

    async fn search(&self, query: &str) -> Vec<Drama> {
        let endpoint = format!("/netshort/search?query={}", encode(query));
        fetch_list(&self.client, &endpoint, None, None, |item| {
            normalize(item, ContextHints::NONE)
        })
        .await
    }

    async fn episodes(&self, id: &str) -> Vec<Episode> {
        self.fetch_all_episodes(id)
            .await
            .map(|data| episodes_from(&data))
            .unwrap_or_default()
    }

    async fn detail(&self, id: &str) -> Option<DramaDetail> {
        self.fetch_all_episodes(id)
            .await
            .map(|data| detail_from(id, &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use serde_json::json;

    #[test]
    fn normalize_reads_native_flags() {
        let item = json!({
            "shortPlayId": "ns-1",
            "shortPlayName": "Runaway Heiress (Sulih suara)",
            "groupShortPlayCover": "https://img/g.jpg",
            "script": 3,
            "isNewLabel": true
        });
        let drama = normalize(&item, ContextHints::NONE).unwrap();
        assert_eq!(drama.cover, "https://img/g.jpg");
        assert_eq!(drama.episode_count, 0);
        assert!(drama.is_dubbed);
        assert!(drama.is_trending);
        assert!(drama.is_new);
    }

    #[test]
    fn other_script_codes_are_not_trending() {
        let item = json!({"shortPlayId": "ns-2", "script": 1});
        let drama = normalize(&item, ContextHints::NONE).unwrap();
        assert!(!drama.is_trending);
        assert!(normalize(&item, ContextHints::TRENDING).unwrap().is_trending);
    }

    #[test]
    fn episode_prefers_play_voucher() {
        let item = json!({"episodeId": "e1", "episodeNo": 2, "playVoucher": "https://v/pv.m3u8", "videoUrl": "https://v/other.mp4"});
        let ep = normalize_episode(&item, 0);
        assert_eq!(ep.video_url, "https://v/pv.m3u8");
        assert_eq!(ep.title, "Episode 2");
        assert_eq!(ep.episode_no, 2);
    }

    #[test]
    fn missing_episode_number_uses_position() {
        assert_eq!(normalize_episode(&json!({"episodeId": "e"}), 4).episode_no, 5);
        assert_eq!(normalize_episode(&json!({"episodeId": "e"}), usize::MAX).episode_no, u32::MAX);
    }

    #[tokio::test]
    async fn theaters_flatten_groups_and_cap() {
        let group = |start: usize| {
            json!({
                "groupName": "shelf",
                "contentInfos": (start..start + 20).map(|i| json!({"shortPlayId": i.to_string()})).collect::<Vec<_>>()
            })
        };
        let transport = FakeTransport::new().route("/netshort/theaters", json!([group(0), {"groupName": "empty"}, group(20)]));
        let provider = NetShortProvider::new(transport.client());

        let dramas = provider.theaters().await;
        assert_eq!(dramas.len(), THEATER_LIMIT);
        assert_eq!(dramas[0].id, "0");
        assert_eq!(dramas[20].id, "20");
    }

    #[tokio::test]
    async fn for_you_passes_page() {
        let transport = FakeTransport::new().route("/netshort/foryou?page=2", json!([{"shortPlayId": "x"}]));
        let provider = NetShortProvider::new(transport.client());
        assert_eq!(provider.for_you(2).await.len(), 1);
        assert!(provider.for_you(1).await.is_empty());
    }

    #[tokio::test]
    async fn detail_reads_drama_fields_from_episode_payload() {
        let transport = FakeTransport::new().route(
            "/netshort/allepisode?shortPlayId=ns-9",
            json!({"data": {
                "shortPlayName": "Runaway Heiress",
                "shotIntroduce": "She runs.",
                "shortPlayCover": "https://img/c.jpg",
                "totalEpisode": 0,
                "shortPlayEpisodeInfos": [
                    {"episodeId": "e2", "episodeNo": 2},
                    {"episodeId": "e1", "episodeNo": 1, "playVoucher": "https://v/1.m3u8"}
                ]
            }}),
        );
        let provider = NetShortProvider::new(transport.client());

        let detail = provider.detail("ns-9").await.unwrap();
        assert_eq!(detail.drama.id, "ns-9");
        assert_eq!(detail.drama.title, "Runaway Heiress");
        assert_eq!(detail.drama.description, "She runs.");
        assert_eq!(detail.drama.episode_count, 2);
        assert_eq!(detail.episodes[0].id, "e1");
        assert!(detail.episodes[0].has_video());
    }

    #[tokio::test]
    async fn failed_detail_is_none() {
        let provider = NetShortProvider::new(FakeTransport::new().client());
        assert!(provider.detail("ns-9").await.is_none());
        assert!(provider.episodes("ns-9").await.is_empty());
    }
}
