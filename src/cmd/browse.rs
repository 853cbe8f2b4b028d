use anyhow::Result;

use peystream::{Catalog, DubbedTab, Source};

use super::output::{drama_line, print_dramas, print_json};

pub async fn cmd_home(catalog: &Catalog, json: bool) -> Result<()> {
    let home = catalog.home().await;
    if json {
        return print_json(&home);
    }

    match &home.featured {
        Some(featured) => {
            println!("⭐ Featured");
            println!("{}", drama_line(featured));
            if !featured.description.is_empty() {
                println!("      {}", super::output::truncate_text(&featured.description, 120));
            }
        }
        None => println!("⭐ Featured: (nothing)"),
    }
    print_dramas("🔥 Trending", &home.trending);
    print_dramas("🆕 Latest", &home.latest);
    print_dramas("🎙️ Dubbed", &home.dubbed);
    print_dramas("🎭 Theaters", &home.theaters);
    Ok(())
}

pub async fn cmd_trending(catalog: &Catalog, shuffle: bool, json: bool) -> Result<()> {
    let dramas = if shuffle {
        catalog.all_trending().await
    } else {
        catalog.all_trending_unshuffled().await
    };
    if json {
        return print_json(&dramas);
    }
    print_dramas("🔥 Trending", &dramas);
    Ok(())
}

pub async fn cmd_latest(catalog: &Catalog, json: bool) -> Result<()> {
    let dramas = catalog.latest().await;
    if json {
        return print_json(&dramas);
    }
    print_dramas("🆕 Latest", &dramas);
    Ok(())
}

pub async fn cmd_for_you(catalog: &Catalog, json: bool) -> Result<()> {
    let dramas = catalog.for_you().await;
    if json {
        return print_json(&dramas);
    }
    print_dramas("✨ For you", &dramas);
    Ok(())
}

pub async fn cmd_dubbed(catalog: &Catalog, tab: DubbedTab, json: bool) -> Result<()> {
    let dramas = catalog.dubbed(tab).await;
    if json {
        return print_json(&dramas);
    }
    let heading = match tab {
        DubbedTab::Popular => "🎙️ Dubbed · popular",
        DubbedTab::Newest => "🎙️ Dubbed · newest",
    };
    print_dramas(heading, &dramas);
    Ok(())
}

pub async fn cmd_category(catalog: &Catalog, source: Source, json: bool) -> Result<()> {
    let dramas = catalog.category(source).await;
    if json {
        return print_json(&dramas);
    }
    print_dramas(&format!("📚 {}", source.display_name()), &dramas);
    Ok(())
}

pub async fn cmd_search(catalog: &Catalog, query: &str, json: bool) -> Result<()> {
    let results = catalog.search_all(query).await;
    if json {
        return print_json(&results);
    }
    eprintln!("🔍 Searching: {query}");
    print_dramas("📋 Results", &results);
    Ok(())
}
