//! DramaBox source provider
//!
//! Episodes carry their media URLs inline inside a CDN list, so no stream
//! lookup is ever needed.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::fields::{first_present, first_string, value_to_u32, FieldTable};
use crate::http_client::UpstreamClient;
use crate::model::{order_episodes, Drama, DramaDetail, DubbedTab, Episode, Source};
use crate::source::provider::{
    encode, episode, fetch_list, is_dubbed_title, list_items, position_number, string_list,
    ContextHints, DramaSource, LIST_LIMIT,
};

/// Catalog item fields. `coverWap` is the thumbnail-sized cover.
pub const FIELDS: FieldTable = FieldTable {
    id: &["bookId", "id"],
    title: &["bookName", "name", "title"],
    cover: &["coverWap", "cover", "coverUrl"],
    description: &["introduction", "description", "desc"],
    episode_count: &["chapterCount", "totalChapter"],
};

/// Detail page covers: full-size art before the thumbnail.
const DETAIL_COVER_FIELDS: [&str; 4] = ["cover", "shortPlayCover", "coverUrl", "coverWap"];

/// Preferred rendition heights when no variant is flagged as default.
const PREFERRED_QUALITIES: [u64; 2] = [720, 540];

/// Normalize a DramaBox catalog item. `None` when it carries no id.
pub fn normalize(item: &Value, hints: ContextHints) -> Option<Drama> {
    let id = FIELDS.id(item)?;
    let title = FIELDS.title(item);
    Some(Drama {
        id,
        is_dubbed: is_dubbed_title(&title),
        title,
        cover: FIELDS.cover(item),
        description: FIELDS.description(item),
        episode_count: FIELDS.episode_count(item),
        source: Source::DramaBox,
        is_trending: hints.trending,
        is_new: hints.new,
    })
}

/// Normalize one entry of the all-episodes list.
pub fn normalize_episode(item: &Value, index: usize) -> Episode {
    let episode_no = match item.get("chapterIndex").and_then(value_to_u32) {
        Some(chapter_index) => chapter_index.saturating_add(1),
        None => first_present(item, &["chapterNo"])
            .and_then(value_to_u32)
            .unwrap_or_else(|| position_number(index)),
    };

    let video_url = cdn_video_path(item).or_else(|| first_string(item, &["videoUrl", "url", "video"]));

    episode(
        first_string(item, &["chapterId", "id"]),
        first_string(item, &["chapterName", "name"]).or_else(|| Some(format!("Episode {}", position_number(index)))),
        episode_no,
        video_url,
        first_string(item, &["duration"]),
        index,
    )
}

/// Pick a media URL out of `cdnList[].videoPathList[]`.
///
/// CDN: the one flagged `isDefault == 1`, else the first. Variant: the
/// default one, else 720p, else 540p, else the first.
fn cdn_video_path(item: &Value) -> Option<String> {
    let cdns = item.get("cdnList")?.as_array()?;
    let cdn = cdns.iter().find(|c| is_default(c)).or_else(|| cdns.first())?;
    let paths = cdn.get("videoPathList")?.as_array()?;

    let video = paths
        .iter()
        .find(|v| is_default(v))
        .or_else(|| {
            PREFERRED_QUALITIES.iter().find_map(|quality| {
                paths
                    .iter()
                    .find(|v| v.get("quality").and_then(Value::as_u64) == Some(*quality))
            })
        })
        .or_else(|| paths.first())?;

    first_string(video, &["videoPath"])
}

fn is_default(value: &Value) -> bool {
    value.get("isDefault").and_then(Value::as_i64) == Some(1)
}

/// Build a detail record from the detail payload and the episode list.
fn detail_from(id: &str, data: &Value, episodes: Vec<Episode>) -> DramaDetail {
    let book = data.get("book").filter(|b| b.is_object()).unwrap_or(data);
    let title = first_string(book, &["bookName", "shortPlayName", "name", "title"]).unwrap_or_default();
    let episode_count = match FIELDS.episode_count(book) {
        0 => u32::try_from(episodes.len()).unwrap_or(u32::MAX),
        n => n,
    };

    DramaDetail {
        drama: Drama {
            id: FIELDS.id(book).unwrap_or_else(|| id.to_string()),
            is_dubbed: is_dubbed_title(&title),
            title,
            cover: first_string(book, &DETAIL_COVER_FIELDS).unwrap_or_default(),
            description: FIELDS.description(book),
            episode_count,
            source: Source::DramaBox,
            is_trending: false,
            is_new: false,
        },
        author: first_string(book, &["author"]),
        tags: string_list(book.get("tags")),
        episodes,
    }
}

pub struct DramaBoxProvider {
    client: UpstreamClient,
}

impl DramaBoxProvider {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Trending list, flagged as trending.
    #[instrument(skip(self))]
    pub async fn trending(&self) -> Vec<Drama> {
        fetch_list(&self.client, "/dramabox/trending", None, Some(LIST_LIMIT), |item| {
            normalize(item, ContextHints::TRENDING)
        })
        .await
    }

    /// Latest releases, flagged as new.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> Vec<Drama> {
        fetch_list(&self.client, "/dramabox/latest", None, Some(LIST_LIMIT), |item| {
            normalize(item, ContextHints::LATEST)
        })
        .await
    }

    /// Indonesian-dubbed catalog in the given order.
    #[instrument(skip(self))]
    pub async fn dubbed(&self, tab: DubbedTab) -> Vec<Drama> {
        let classify = match tab {
            DubbedTab::Popular => "terpopuler",
            DubbedTab::Newest => "terbaru",
        };
        let endpoint = format!("/dramabox/dubindo?classify={classify}");
        fetch_list(&self.client, &endpoint, None, Some(LIST_LIMIT), |item| {
            normalize(item, ContextHints::NONE)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn for_you(&self) -> Vec<Drama> {
        fetch_list(&self.client, "/dramabox/foryou", None, Some(LIST_LIMIT), |item| {
            normalize(item, ContextHints::NONE)
        })
        .await
    }

    async fn fetch_detail(&self, id: &str) -> Option<Value> {
        self.client
            .fetch_data(&format!("/dramabox/detail?bookId={}", encode(id)))
            .await
    }
}

#[async_trait]
impl DramaSource for DramaBoxProvider {
    fn source(&self) -> Source {
        Source::DramaBox
    }

    async fn search(&self, query: &str) -> Vec<Drama> {
        let endpoint = format!("/dramabox/search?query={}", encode(query));
        fetch_list(&self.client, &endpoint, None, None, |item| {
            normalize(item, ContextHints::NONE)
        })
        .await
    }

    async fn episodes(&self, id: &str) -> Vec<Episode> {
        let endpoint = format!("/dramabox/allepisode?bookId={}", encode(id));
        let Some(data) = self.client.fetch_data(&endpoint).await else {
            return Vec::new();
        };
        let mut episodes: Vec<Episode> = list_items(&data, None)
            .iter()
            .enumerate()
            .map(|(index, item)| normalize_episode(item, index))
            .collect();
        order_episodes(&mut episodes);
        episodes
    }

    async fn detail(&self, id: &str) -> Option<DramaDetail> {
        // Metadata and episodes live behind separate endpoints
        let (data, episodes) = tokio::join!(self.fetch_detail(id), self.episodes(id));
        data.map(|data| detail_from(id, &data, episodes))
    }
}
