use anyhow::{bail, Result};

use peystream::{Catalog, Source};

use super::output::{episode_line, print_json};

pub async fn cmd_detail(catalog: &Catalog, source: Source, id: &str, json: bool) -> Result<()> {
    eprintln!("📡 Fetching {} drama {id}", source.display_name());
    let Some(detail) = catalog.detail(source, id).await else {
        bail!("Drama not found: {source}/{id}");
    };
    if json {
        return print_json(&detail);
    }

    let drama = &detail.drama;
    println!("📺 {}", drama.title);
    println!("   Source: {}", source.display_name());
    if let Some(author) = &detail.author {
        println!("   Author: {author}");
    }
    if !detail.tags.is_empty() {
        println!("   Tags: {}", detail.tags.join(", "));
    }
    println!("   Episodes: {}", drama.episode_count);
    if !drama.cover.is_empty() {
        println!("   Cover: {}", drama.cover);
    }
    if !drama.description.is_empty() {
        println!("\n{}", drama.description);
    }

    println!("\n📋 Episodes ({})", detail.episodes.len());
    for episode in &detail.episodes {
        println!("{}", episode_line(episode));
    }
    Ok(())
}
