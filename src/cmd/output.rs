use anyhow::Result;
use serde::Serialize;

use peystream::{Drama, Episode};

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One titled section of dramas.
pub fn print_dramas(heading: &str, dramas: &[Drama]) {
    println!("\n{heading} ({})", dramas.len());
    if dramas.is_empty() {
        println!("   (nothing)");
        return;
    }
    for drama in dramas {
        println!("{}", drama_line(drama));
    }
}

pub fn drama_line(drama: &Drama) -> String {
    let mut badges = String::new();
    if drama.is_trending {
        badges.push_str(" 🔥");
    }
    if drama.is_new {
        badges.push_str(" 🆕");
    }
    if drama.is_dubbed {
        badges.push_str(" 🎙️");
    }
    let episodes = if drama.episode_count > 0 {
        format!(" · {} eps", drama.episode_count)
    } else {
        String::new()
    };
    format!(
        "   [{}] {} {}{episodes}{badges}",
        drama.source,
        drama.id,
        truncate_text(&drama.title, 60)
    )
}

pub fn episode_line(episode: &Episode) -> String {
    let duration = if episode.duration.is_empty() {
        String::new()
    } else {
        format!(" ({})", episode.duration)
    };
    let media = if episode.has_video() { "▶" } else { "…" };
    format!(
        "   {media} E{:<3} {}{duration}",
        episode.episode_no,
        truncate_text(&episode.title, 60)
    )
}

/// Truncate on character boundaries, marking the cut with `...`.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
