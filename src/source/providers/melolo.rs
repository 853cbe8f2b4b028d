//! Melolo source provider
//!
//! Covers are frequently HEIC, which browsers cannot display, so they are
//! routed through an image proxy. Episodes never carry a media URL: each
//! one is resolved through the stream endpoint by its `vid`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fields::{first_present, first_string, flag, is_truthy, value_to_u32, FieldTable};
use crate::http_client::UpstreamClient;
use crate::model::{order_episodes, Drama, DramaDetail, Episode, Source};
use crate::source::provider::{
    encode, episode, fetch_list, is_dubbed_title, list_items, position_number, ContextHints,
    DramaSource, LIST_LIMIT,
};

pub const FIELDS: FieldTable = FieldTable {
    id: &["book_id", "bookId", "id"],
    title: &["book_name", "title", "name"],
    cover: &["thumb_url", "cover", "coverUrl"],
    description: &["abstract", "description"],
    episode_count: &["serial_count", "episode_count", "episodeCount"],
};

/// Stream lookup response fields in priority order.
pub const STREAM_URL_FIELDS: [&str; 4] = ["main_url", "backup_url", "videoUrl", "url"];

const IMAGE_PROXY: &str = "https://wsrv.nl/";
const PROXY_OUTPUT: &str = "webp";
const THUMB_WIDTH: u32 = 300;
const THUMB_HEIGHT: u32 = 450;

/// Rewrite HEIC covers through the image proxy as WebP thumbnails.
pub fn convert_image_url(url: &str) -> String {
    if url.contains(".heic") {
        format!(
            "{IMAGE_PROXY}?url={}&output={PROXY_OUTPUT}&w={THUMB_WIDTH}&h={THUMB_HEIGHT}",
            urlencoding::encode(url)
        )
    } else {
        url.to_string()
    }
}

/// Normalize a Melolo catalog item. `None` when it carries no id.
pub fn normalize(item: &Value, hints: ContextHints) -> Option<Drama> {
    let id = FIELDS.id(item)?;
    let title = FIELDS.title(item);
    Some(Drama {
        id,
        is_dubbed: is_dubbed_title(&title),
        title,
        cover: convert_image_url(&FIELDS.cover(item)),
        description: FIELDS.description(item),
        episode_count: FIELDS.episode_count(item),
        source: Source::Melolo,
        is_trending: hints.trending || flag(item, "is_hot"),
        is_new: hints.new || flag(item, "is_new_book"),
    })
}

/// Normalize one entry of `video_data.video_list`. The media URL is always
/// left empty for lazy resolution.
pub fn normalize_episode(item: &Value, index: usize) -> Episode {
    let episode_no = first_present(item, &["vid_index"])
        .and_then(value_to_u32)
        .unwrap_or_else(|| position_number(index));
    episode(
        first_string(item, &["vid", "id"]),
        first_string(item, &["title"]),
        episode_no,
        None,
        first_string(item, &["duration"]),
        index,
    )
}

/// Pick the media URL out of a stream lookup payload.
pub fn stream_url_from(data: &Value) -> Option<String> {
    if let Value::String(url) = data {
        return Some(url.clone()).filter(|u| !u.is_empty());
    }
    first_string(data, &STREAM_URL_FIELDS)
}

fn video_data(data: &Value) -> &Value {
    data.get("video_data").filter(|v| is_truthy(v)).unwrap_or(data)
}

fn episodes_from(video_data: &Value) -> Vec<Episode> {
    let mut episodes: Vec<Episode> = list_items(video_data, Some("video_list"))
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_episode(item, index))
        .collect();
    order_episodes(&mut episodes);
    episodes
}

fn detail_from(id: &str, data: &Value) -> DramaDetail {
    let video_data = video_data(data);
    let episodes = episodes_from(video_data);
    let title = first_string(video_data, &["series_title"]).unwrap_or_default();
    let episode_count = match first_present(video_data, &["episode_cnt"]).and_then(value_to_u32) {
        Some(n) if n > 0 => n,
        _ => u32::try_from(episodes.len()).unwrap_or(u32::MAX),
    };
    DramaDetail {
        drama: Drama {
            id: id.to_string(),
            is_dubbed: is_dubbed_title(&title),
            title,
            cover: convert_image_url(&first_string(video_data, &["series_cover"]).unwrap_or_default()),
            description: first_string(video_data, &["series_intro"]).unwrap_or_default(),
            episode_count,
            source: Source::Melolo,
            is_trending: false,
            is_new: false,
        },
        author: None,
        tags: Vec::new(),
        episodes,
    }
}

pub struct MeloloProvider {
    client: UpstreamClient,
}

impl MeloloProvider {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn trending(&self) -> Vec<Drama> {
        fetch_list(&self.client, "/melolo/trending", Some("books"), Some(LIST_LIMIT), |item| {
            normalize(item, ContextHints::TRENDING)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn latest(&self) -> Vec<Drama> {
        fetch_list(&self.client, "/melolo/latest", Some("books"), Some(LIST_LIMIT), |item| {
            normalize(item, ContextHints::LATEST)
        })
        .await
    }

    async fn fetch_detail(&self, id: &str) -> Option<Value> {
        self.client
            .fetch_data(&format!("/melolo/detail?bookId={}", encode(id)))
            .await
    }
}

#[async_trait]
impl DramaSource for MeloloProvider {
    fn source(&self) -> Source {
        Source::Melolo
    }

    async fn search(&self, query: &str) -> Vec<Drama> {
        let endpoint = format!("/melolo/search?query={}", encode(query));
        fetch_list(&self.client, &endpoint, None, None, |item| {
            normalize(item, ContextHints::NONE)
        })
        .await
    }

    async fn episodes(&self, id: &str) -> Vec<Episode> {
        self.fetch_detail(id)
            .await
            .map(|data| episodes_from(video_data(&data)))
            .unwrap_or_default()
    }

    async fn detail(&self, id: &str) -> Option<DramaDetail> {
        self.fetch_detail(id).await.map(|data| detail_from(id, &data))
    }

    #[instrument(skip(self))]
    async fn stream_url(&self, episode_id: &str) -> Option<String> {
        let endpoint = format!("/melolo/stream?videoId={}", encode(episode_id));
        let url = self
            .client
            .fetch_data(&endpoint)
            .await
            .and_then(|data| stream_url_from(&data));
        debug!(found = url.is_some(), "Stream lookup finished");
        url
    }
}
