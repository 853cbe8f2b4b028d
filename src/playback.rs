//! Episode playback resolution.
//!
//! An episode either carries its media URL inline or, for sources that need
//! it, gets one from a stream lookup keyed by episode id. A
//! [`PlaybackSession`] tracks which episode is current and makes sure a
//! slow lookup for an episode the user already left can never overwrite the
//! one they picked afterwards.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::model::{order_episodes, Episode, Source};
use crate::source::DramaSource;

/// Where an episode's media URL stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "url", rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolving,
    Resolved(String),
    Failed,
}

impl Resolution {
    /// The playable URL, once resolved.
    pub fn url(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(url) => Some(url),
            _ => None,
        }
    }
}

/// Resolve the media URL of `episode` served by `provider`.
///
/// An inline URL wins without any network call. Otherwise only sources with
/// a stream endpoint get a lookup; the rest fail immediately.
#[instrument(skip_all, fields(source = provider.name(), episode = %episode.id))]
pub async fn resolve_episode(provider: &dyn DramaSource, episode: &Episode) -> Resolution {
    if episode.has_video() {
        return Resolution::Resolved(episode.video_url.clone());
    }
    if !provider.source().requires_stream_lookup() {
        debug!("No inline URL and no stream endpoint");
        return Resolution::Failed;
    }
    match provider.stream_url(&episode.id).await {
        Some(url) => Resolution::Resolved(url),
        None => Resolution::Failed,
    }
}

/// Result of one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// This selection was still current when its lookup finished.
    Committed(Resolution),
    /// A later selection took over while this one was resolving.
    Superseded,
    /// No episode at that position or with that id.
    NotFound,
}

#[derive(Debug, Default)]
struct SessionState {
    episodes: Vec<Episode>,
    current: Option<usize>,
    ticket: u64,
    resolution: Resolution,
}

/// Player state for one drama.
pub struct PlaybackSession<'a> {
    provider: &'a dyn DramaSource,
    state: Mutex<SessionState>,
}

impl<'a> PlaybackSession<'a> {
    /// Start a session over `episodes`, sorted into playback order.
    pub fn new(provider: &'a dyn DramaSource, mut episodes: Vec<Episode>) -> Self {
        order_episodes(&mut episodes);
        Self {
            provider,
            state: Mutex::new(SessionState {
                episodes,
                ..SessionState::default()
            }),
        }
    }

    /// Fetch the episode list of `drama_id` and start a session over it.
    pub async fn load(provider: &'a dyn DramaSource, drama_id: &str) -> Self {
        let episodes = provider.episodes(drama_id).await;
        Self::new(provider, episodes)
    }

    pub fn source(&self) -> Source {
        self.provider.source()
    }

    pub async fn episodes(&self) -> Vec<Episode> {
        self.state.lock().await.episodes.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.episodes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn current_index(&self) -> Option<usize> {
        self.state.lock().await.current
    }

    /// The currently selected episode, including a written-back URL.
    pub async fn current(&self) -> Option<Episode> {
        let state = self.state.lock().await;
        state.current.and_then(|i| state.episodes.get(i).cloned())
    }

    pub async fn resolution(&self) -> Resolution {
        self.state.lock().await.resolution.clone()
    }

    /// Make the episode at `index` current and resolve its media URL.
    ///
    /// The lock is released while resolving. On completion the result is
    /// committed only if no other selection started in the meantime.
    #[instrument(skip(self), fields(source = %self.provider.source()))]
    pub async fn select(&self, index: usize) -> Selection {
        let (ticket, episode) = {
            let mut state = self.state.lock().await;
            let Some(episode) = state.episodes.get(index).cloned() else {
                return Selection::NotFound;
            };
            state.ticket += 1;
            state.current = Some(index);
            state.resolution = Resolution::Resolving;
            (state.ticket, episode)
        };

        let resolution = resolve_episode(self.provider, &episode).await;

        let mut state = self.state.lock().await;
        if state.ticket != ticket {
            info!(episode = %episode.id, "Discarding superseded resolution");
            return Selection::Superseded;
        }
        if let Resolution::Resolved(url) = &resolution {
            if let Some(slot) = state.episodes.get_mut(index) {
                slot.video_url.clone_from(url);
            }
        }
        state.resolution = resolution.clone();
        Selection::Committed(resolution)
    }

    /// Select the episode with the given id.
    pub async fn select_id(&self, episode_id: &str) -> Selection {
        let index = {
            let state = self.state.lock().await;
            state.episodes.iter().position(|ep| ep.id == episode_id)
        };
        match index {
            Some(index) => self.select(index).await,
            None => Selection::NotFound,
        }
    }

    /// Advance to the next episode. `None` on the last one. With nothing
    /// selected yet this starts at the first episode.
    pub async fn next(&self) -> Option<Selection> {
        let target = {
            let state = self.state.lock().await;
            let target = state.current.map_or(0, |i| i + 1);
            (target < state.episodes.len()).then_some(target)
        }?;
        Some(self.select(target).await)
    }

    /// Go back one episode. `None` on the first one or with nothing selected.
    pub async fn previous(&self) -> Option<Selection> {
        let target = {
            let state = self.state.lock().await;
            state.current.and_then(|i| i.checked_sub(1))
        }?;
        Some(self.select(target).await)
    }
}

impl std::fmt::Debug for PlaybackSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("source", &self.provider.source())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DramaBoxProvider, MeloloProvider, NetShortProvider};
    use crate::testing::FakeTransport;
    use serde_json::json;
    use std::time::Duration;

    fn episode(id: &str, no: u32, url: &str) -> Episode {
        Episode {
            id: id.to_string(),
            title: format!("Episode {no}"),
            episode_no: no,
            video_url: url.to_string(),
            duration: String::new(),
        }
    }

    fn melolo_episodes(count: u32) -> Vec<Episode> {
        (1..=count).map(|n| episode(&format!("v{n}"), n, "")).collect()
    }

    #[tokio::test]
    async fn inline_url_needs_no_lookup() {
        let transport = FakeTransport::new();
        let provider = MeloloProvider::new(transport.client());

        let resolution = resolve_episode(&provider, &episode("v1", 1, "https://cdn/1.mp4")).await;
        assert_eq!(resolution, Resolution::Resolved("https://cdn/1.mp4".into()));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn stream_lookup_prefers_main_url() {
        let transport = FakeTransport::new().route(
            "/melolo/stream?videoId=v1",
            json!({"data": {"backup_url": "https://b/1.mp4", "main_url": "https://m/1.mp4"}}),
        );
        let provider = MeloloProvider::new(transport.client());

        let resolution = resolve_episode(&provider, &episode("v1", 1, "")).await;
        assert_eq!(resolution.url(), Some("https://m/1.mp4"));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn sources_without_stream_endpoint_fail() {
        let transport = FakeTransport::new();
        let dramabox = DramaBoxProvider::new(transport.client());
        let netshort = NetShortProvider::new(transport.client());

        assert_eq!(dramabox.name(), "dramabox");
        assert_eq!(resolve_episode(&dramabox, &episode("c1", 1, "")).await, Resolution::Failed);
        assert_eq!(resolve_episode(&netshort, &episode("e1", 1, "")).await, Resolution::Failed);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_lookup_fails() {
        let transport = FakeTransport::new().route("/melolo/stream?videoId=v1", json!({"data": {"main_url": ""}}));
        let provider = MeloloProvider::new(transport.client());
        assert_eq!(resolve_episode(&provider, &episode("v1", 1, "")).await, Resolution::Failed);
    }

    #[tokio::test]
    async fn late_completion_does_not_overwrite_newer_selection() {
        let transport = FakeTransport::new()
            .route_delayed(
                "/melolo/stream?videoId=v2",
                json!({"main_url": "https://m/2.mp4"}),
                Duration::from_millis(80),
            )
            .route("/melolo/stream?videoId=v5", json!({"main_url": "https://m/5.mp4"}));
        let provider = MeloloProvider::new(transport.client());
        let session = PlaybackSession::new(&provider, melolo_episodes(6));

        let (second, fifth) = tokio::join!(session.select_id("v2"), session.select_id("v5"));

        assert_eq!(second, Selection::Superseded);
        assert_eq!(fifth, Selection::Committed(Resolution::Resolved("https://m/5.mp4".into())));
        assert_eq!(session.current().await.unwrap().id, "v5");
        assert_eq!(session.resolution().await.url(), Some("https://m/5.mp4"));
        // The superseded result is never written back
        assert!(!session.episodes().await[1].has_video());
    }

    #[tokio::test]
    async fn resolved_url_is_written_back() {
        let transport = FakeTransport::new().route("/melolo/stream?videoId=v1", json!({"url": "https://u/1.mp4"}));
        let provider = MeloloProvider::new(transport.client());
        let session = PlaybackSession::new(&provider, melolo_episodes(2));

        session.select(0).await;
        assert_eq!(session.current().await.unwrap().video_url, "https://u/1.mp4");

        // Reselecting uses the inline URL now
        session.select(0).await;
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn navigation_is_bounded() {
        let transport = FakeTransport::new();
        let provider = DramaBoxProvider::new(transport.client());
        let episodes = vec![episode("c2", 2, "https://v/2.mp4"), episode("c1", 1, "https://v/1.mp4")];
        let session = PlaybackSession::new(&provider, episodes);

        assert!(session.previous().await.is_none());
        assert!(session.next().await.is_some());
        assert_eq!(session.current().await.unwrap().id, "c1");
        assert!(session.next().await.is_some());
        assert_eq!(session.current_index().await, Some(1));
        assert!(session.next().await.is_none());
        assert_eq!(session.current_index().await, Some(1));
        assert!(session.previous().await.is_some());
        assert!(session.previous().await.is_none());
        assert_eq!(session.current().await.unwrap().id, "c1");

        assert_eq!(session.select(9).await, Selection::NotFound);
        assert_eq!(session.select_id("missing").await, Selection::NotFound);
        assert_eq!(session.current_index().await, Some(0));
    }

    #[tokio::test]
    async fn failed_resolution_is_reported() {
        let provider = NetShortProvider::new(FakeTransport::new().client());
        let session = PlaybackSession::new(&provider, vec![episode("e1", 1, "")]);
        assert_eq!(session.select(0).await, Selection::Committed(Resolution::Failed));
        assert_eq!(session.resolution().await, Resolution::Failed);
    }

    #[tokio::test]
    async fn load_fetches_ordered_episodes() {
        let transport = FakeTransport::new().route(
            "/netshort/allepisode?shortPlayId=ns-1",
            json!({"shortPlayEpisodeInfos": [{"episodeId": "e2", "episodeNo": 2}, {"episodeId": "e1", "episodeNo": 1}]}),
        );
        let provider = NetShortProvider::new(transport.client());
        let session = PlaybackSession::load(&provider, "ns-1").await;
        assert_eq!(session.source(), Source::NetShort);
        assert_eq!(session.len().await, 2);
        assert_eq!(session.episodes().await[0].id, "e1");
        assert_eq!(session.resolution().await, Resolution::Unresolved);
    }
}
