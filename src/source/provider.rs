//! Source provider trait and shared normalization helpers.
//!
//! A [`DramaSource`] fetches one provider's catalog through the shared
//! [`UpstreamClient`] and returns normalized [`Drama`] / [`Episode`] /
//! [`DramaDetail`] values.

use std::borrow::Cow;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::http_client::UpstreamClient;
use crate::model::{Drama, DramaDetail, Episode, Source};

/// Lowercase marker that upstream titles carry for Indonesian dubs.
pub const DUBBED_MARKER: &str = "(sulih suara)";

/// Maximum items kept from a single list endpoint.
pub const LIST_LIMIT: usize = 20;

/// What the caller knows about the list an item came from.
///
/// A flag set here wins over whatever the item itself says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextHints {
    pub trending: bool,
    pub new: bool,
}

impl ContextHints {
    pub const NONE: Self = Self { trending: false, new: false };
    /// Item came from a trending endpoint.
    pub const TRENDING: Self = Self { trending: true, new: false };
    /// Item came from a latest endpoint.
    pub const LATEST: Self = Self { trending: false, new: true };
}

/// Case-insensitive check for the dubbed marker.
pub fn is_dubbed_title(title: &str) -> bool {
    title.to_lowercase().contains(DUBBED_MARKER)
}

/// Trait for drama providers.
///
/// Implementors cover the operations every source supports. Source-specific
/// lists (trending, theaters, ...) are inherent methods on each provider.
#[async_trait]
pub trait DramaSource: Send + Sync {
    /// Which source this provider serves.
    fn source(&self) -> Source;

    /// Short lowercase provider name (e.g., `"dramabox"`).
    fn name(&self) -> &'static str {
        self.source().slug()
    }

    /// Search the provider's catalog. Empty on failure.
    async fn search(&self, query: &str) -> Vec<Drama>;

    /// All episodes of a drama in playback order.
    async fn episodes(&self, id: &str) -> Vec<Episode>;

    /// Drama metadata plus episodes. `None` when the drama cannot be loaded.
    async fn detail(&self, id: &str) -> Option<DramaDetail>;

    /// Secondary media URL lookup for an episode without an inline URL.
    /// Only sources with a stream endpoint override this.
    async fn stream_url(&self, episode_id: &str) -> Option<String> {
        let _ = episode_id;
        None
    }
}

/// Items of a list payload: either a bare array or an array under `wrapper`.
pub(crate) fn list_items<'a>(data: &'a Value, wrapper: Option<&str>) -> &'a [Value] {
    if let Some(items) = wrapper
        .and_then(|key| data.get(key))
        .and_then(Value::as_array)
    {
        return items;
    }
    data.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Fetch a list endpoint, normalize each item and keep at most `limit`.
pub(crate) async fn fetch_list<F>(
    client: &UpstreamClient,
    endpoint: &str,
    wrapper: Option<&str>,
    limit: Option<usize>,
    normalize: F,
) -> Vec<Drama>
where
    F: Fn(&Value) -> Option<Drama> + Send,
{
    let Some(data) = client.fetch_data(endpoint).await else {
        return Vec::new();
    };
    let items = list_items(&data, wrapper);
    let dramas: Vec<Drama> = items
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(normalize)
        .collect();
    debug!(endpoint, count = dramas.len(), "Normalized list");
    dramas
}

/// Percent-encode a query parameter value.
pub(crate) fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// 1-based episode number for list position `index`, saturating at
/// `u32::MAX`.
pub(crate) fn position_number(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1)
}

/// Build an [`Episode`] from already-resolved parts, applying the generic
/// `Episode N` title when upstream sends none.
pub(crate) fn episode(
    id: Option<String>,
    title: Option<String>,
    episode_no: u32,
    video_url: Option<String>,
    duration: Option<String>,
    index: usize,
) -> Episode {
    Episode {
        id: id.unwrap_or_else(|| index.to_string()),
        title: title.unwrap_or_else(|| format!("Episode {episode_no}")),
        episode_no,
        video_url: video_url.unwrap_or_default(),
        duration: duration.unwrap_or_default(),
    }
}

/// Tags as plain strings; non-string entries are skipped.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|tag| match tag {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Object(_) => tag
                        .get("tagName")
                        .or_else(|| tag.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
