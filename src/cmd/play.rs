use anyhow::{bail, Result};
use serde::Serialize;

use peystream::{Catalog, PlaybackSession, Resolution, Selection, Source};

use super::output::print_json;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayReport {
    source: Source,
    drama_id: String,
    episode_id: String,
    episode_no: u32,
    resolution: Resolution,
}

pub async fn cmd_play(catalog: &Catalog, source: Source, id: &str, episode_no: u32, json: bool) -> Result<()> {
    let session = PlaybackSession::load(catalog.provider(source), id).await;
    if session.is_empty().await {
        bail!("No episodes found for {source}/{id}");
    }

    // Episode numbers normally match list positions, but not always
    let episodes = session.episodes().await;
    let Some(index) = episodes
        .iter()
        .position(|ep| ep.episode_no == episode_no)
        .or_else(|| usize::try_from(episode_no).ok()?.checked_sub(1).filter(|i| *i < episodes.len()))
    else {
        bail!("Episode {episode_no} not found ({} available)", episodes.len());
    };

    eprintln!("🎬 Resolving episode {episode_no} of {}/{id}", session.source().display_name());
    let resolution = match session.select(index).await {
        Selection::Committed(resolution) => resolution,
        Selection::Superseded | Selection::NotFound => session.resolution().await,
    };
    let Some(episode) = session.current().await else {
        bail!("Episode {episode_no} not found");
    };

    if json {
        return print_json(&PlayReport {
            source,
            drama_id: id.to_string(),
            episode_id: episode.id,
            episode_no: episode.episode_no,
            resolution,
        });
    }

    println!("📺 {}", episode.title);
    match resolution {
        Resolution::Resolved(url) => {
            println!("   ✅ {url}");
            Ok(())
        }
        _ => bail!("Video unavailable for episode {}", episode.episode_no),
    }
}
