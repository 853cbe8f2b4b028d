//! Unified catalog model shared by every source.
//!
//! Upstream providers name the same things differently; everything past the
//! normalizers only ever sees [`Drama`], [`Episode`] and [`DramaDetail`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// One of the three upstream content providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// DramaBox (source A).
    DramaBox,
    /// NetShort (source B).
    NetShort,
    /// Melolo (source C). The only source that needs a stream lookup.
    Melolo,
}

impl Source {
    /// Every source, in the order search results are concatenated.
    pub const ALL: [Source; 3] = [Source::DramaBox, Source::NetShort, Source::Melolo];

    /// Lowercase routing slug (`"dramabox"`, `"netshort"`, `"melolo"`).
    pub fn slug(self) -> &'static str {
        match self {
            Source::DramaBox => "dramabox",
            Source::NetShort => "netshort",
            Source::Melolo => "melolo",
        }
    }

    /// Human-readable provider name.
    pub fn display_name(self) -> &'static str {
        match self {
            Source::DramaBox => "DramaBox",
            Source::NetShort => "NetShort",
            Source::Melolo => "Melolo",
        }
    }

    /// Whether episodes from this source carry no inline media URL and
    /// need a follow-up stream lookup keyed by episode id.
    pub fn requires_stream_lookup(self) -> bool {
        matches!(self, Source::Melolo)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Returned when a string does not name a known source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source '{0}' (expected dramabox, netshort or melolo)")]
pub struct ParseSourceError(pub String);

impl FromStr for Source {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dramabox" | "a" => Ok(Source::DramaBox),
            "netshort" | "b" => Ok(Source::NetShort),
            "melolo" | "c" => Ok(Source::Melolo),
            _ => Err(ParseSourceError(s.to_string())),
        }
    }
}

/// Ordering tab of the dubbed catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DubbedTab {
    /// Most popular first.
    #[default]
    Popular,
    /// Newest first.
    Newest,
}

/// Returned when a string does not name a dubbed tab.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab '{0}' (expected popular or newest)")]
pub struct ParseDubbedTabError(pub String);

impl FromStr for DubbedTab {
    type Err = ParseDubbedTabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popular" | "terpopuler" => Ok(DubbedTab::Popular),
            "newest" | "latest" | "terbaru" => Ok(DubbedTab::Newest),
            _ => Err(ParseDubbedTabError(s.to_string())),
        }
    }
}

/// A catalog entry as rendered in lists.
///
/// Identity is `(source, id)`: ids are only unique within a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drama {
    pub id: String,
    pub title: String,
    /// Cover image URL, possibly empty.
    pub cover: String,
    pub description: String,
    /// Zero when the upstream list does not report it.
    pub episode_count: u32,
    pub source: Source,
    pub is_dubbed: bool,
    pub is_trending: bool,
    pub is_new: bool,
}

impl Drama {
    /// `(source, id)` identity key.
    pub fn key(&self) -> (Source, &str) {
        (self.source, self.id.as_str())
    }
}

/// A single playable episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub title: String,
    /// 1-based position; defines playback order.
    pub episode_no: u32,
    /// Direct media URL. Empty means it has to be resolved lazily.
    pub video_url: String,
    /// Display duration, empty when unknown.
    pub duration: String,
}

impl Episode {
    /// Whether a media URL is already known for this episode.
    pub fn has_video(&self) -> bool {
        !self.video_url.is_empty()
    }
}

/// A drama together with its episode list, as shown on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DramaDetail {
    #[serde(flatten)]
    pub drama: Drama,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub episodes: Vec<Episode>,
}

/// Sections of the landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HomeFeed {
    /// First trending entry, if any.
    pub featured: Option<Drama>,
    pub trending: Vec<Drama>,
    pub latest: Vec<Drama>,
    pub dubbed: Vec<Drama>,
    pub theaters: Vec<Drama>,
}

/// Stably sort episodes by `episode_no`; equal numbers keep fetch order.
pub fn order_episodes(episodes: &mut [Episode]) {
    episodes.sort_by_key(|ep| ep.episode_no);
}
