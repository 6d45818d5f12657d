mod error;
mod github;
mod readme;
mod stats;
mod svg;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use github::GithubClient;
use svg::{RenderConfig, Theme};
use tracing_subscriber::EnvFilter;

const USERNAME: &str = "kholcomb";
const LIGHT_SVG: &str = "light_mode.svg";
const DARK_SVG: &str = "dark_mode.svg";
const CACHE_DIR: &str = "cache";
const CACHE_FILE: &str = "cache/stats.json";
const README: &str = "README.md";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let token = std::env::var("GITHUB_TOKEN").ok();
    let client = GithubClient::new(token);

    println!("Fetching GitHub stats for @{USERNAME}...");
    let stats = stats::aggregate(&client, USERNAME).await?;

    println!("✓ Found {} repositories", stats.public_repos);
    println!("✓ Total stars: {}", stats.total_stars);
    println!("✓ Followers: {}", stats.followers);

    println!("\nGenerating SVG graphics...");
    let config = RenderConfig::default();

    let light = svg::generate_svg(&stats, Theme::Light, &config);
    fs::write(LIGHT_SVG, light).with_context(|| format!("Failed to write {LIGHT_SVG}"))?;
    println!("✓ Generated {LIGHT_SVG}");

    let dark = svg::generate_svg(&stats, Theme::Dark, &config);
    fs::write(DARK_SVG, dark).with_context(|| format!("Failed to write {DARK_SVG}"))?;
    println!("✓ Generated {DARK_SVG}");

    fs::create_dir_all(CACHE_DIR).context("Failed to create cache directory")?;
    let cache = serde_json::to_string_pretty(&stats).context("Failed to serialize stats cache")?;
    fs::write(CACHE_FILE, cache).with_context(|| format!("Failed to write {CACHE_FILE}"))?;
    println!("✓ Saved stats cache");

    if readme::refresh_readme(Path::new(README), Utc::now())
        .context("Failed to update README cache-busting parameters")?
    {
        println!("✓ Refreshed {README} image references");
    }

    println!("\nAll done.");
    Ok(())
}
