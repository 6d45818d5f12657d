//! Aggregation of raw GitHub API payloads into the stats record consumed by
//! the renderer and serialized to the on-disk cache.
//!
//! Fork repositories never count toward stars, top repositories, or the
//! language distribution. Per-repository language fetches are best-effort:
//! a failed fetch drops that repository's contribution and nothing else.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::github::GithubClient;

const TOP_LANGUAGES: usize = 5;
const TOP_REPOS: usize = 3;

/// Payload of `GET /users/{username}`. The counts are required; a response
/// without them fails deserialization and aborts the run.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
}

/// One element of the paginated repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub description: Option<String>,
    pub stargazers_count: u32,
    pub language: Option<String>,
    pub fork: bool,
    pub languages_url: String,
}

/// Outcome of one repository's language-byte fetch. Failures are carried as
/// values so the warn-and-continue contract stays explicit.
#[derive(Debug)]
pub enum LanguageFetch {
    Fetched { bytes: BTreeMap<String, u64> },
    Failed { repo: String, reason: String },
}

/// One language's share of the accumulated byte counts. `percent` is
/// normalized against total bytes across all languages, not just the
/// retained top five, so displayed percentages may sum below 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub name: String,
    pub bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoHighlight {
    pub name: String,
    pub stars: u32,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// The aggregation result: sole input to the renderer and the cache artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub username: String,
    pub name: String,
    pub bio: String,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    pub total_stars: u32,
    pub languages: Vec<LanguageShare>,
    pub top_repos: Vec<RepoHighlight>,
    pub generated_at: String,
}

/// Run the full pipeline: profile, repository listing, per-repo language
/// enrichment, then derive the summary statistics.
pub async fn aggregate(client: &GithubClient, username: &str) -> Result<AggregatedStats> {
    let profile = client.fetch_profile(username).await?;
    let repos = client.fetch_repositories(username).await?;
    let fetches = fetch_language_bytes(client, &repos).await;

    let generated_at = Utc::now().format("%B %d, %Y at %I:%M %p UTC").to_string();
    Ok(compute_stats(&profile, &repos, fetches, generated_at))
}

/// Fetch each non-fork repository's language breakdown, one request at a
/// time. Repos without a primary language still get their endpoint queried.
async fn fetch_language_bytes(client: &GithubClient, repos: &[RepoSummary]) -> Vec<LanguageFetch> {
    let mut outcomes = Vec::new();

    for repo in repos.iter().filter(|r| !r.fork) {
        let outcome = match client.fetch_languages(&repo.languages_url).await {
            Ok(bytes) => LanguageFetch::Fetched { bytes },
            Err(e) => LanguageFetch::Failed {
                repo: repo.name.clone(),
                reason: e.to_string(),
            },
        };
        outcomes.push(outcome);
    }

    outcomes
}

/// Derive the stats record from the fetched pieces. Pure.
pub fn compute_stats(
    profile: &UserProfile,
    repos: &[RepoSummary],
    language_fetches: Vec<LanguageFetch>,
    generated_at: String,
) -> AggregatedStats {
    let owned: Vec<&RepoSummary> = repos.iter().filter(|r| !r.fork).collect();

    let total_stars = owned.iter().map(|r| r.stargazers_count).sum();

    // Stable sort: equal star counts keep their listing order.
    let mut ranked = owned.clone();
    ranked.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    let top_repos = ranked
        .iter()
        .take(TOP_REPOS)
        .map(|r| RepoHighlight {
            name: r.name.clone(),
            stars: r.stargazers_count,
            description: r.description.clone(),
            language: r.language.clone(),
        })
        .collect();

    let name = profile
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| profile.login.clone());

    AggregatedStats {
        username: profile.login.clone(),
        name,
        bio: profile.bio.clone().unwrap_or_default(),
        followers: profile.followers,
        following: profile.following,
        public_repos: profile.public_repos,
        total_stars,
        languages: rank_languages(language_fetches),
        top_repos,
        generated_at,
    }
}

/// Fold per-repo outcomes into the top-5 language shares. Percentages are
/// computed over total bytes across all languages before truncation; a zero
/// total yields 0.0 for every share.
fn rank_languages(fetches: Vec<LanguageFetch>) -> Vec<LanguageShare> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();

    for fetch in fetches {
        match fetch {
            LanguageFetch::Fetched { bytes } => {
                for (language, count) in bytes {
                    *totals.entry(language).or_insert(0) += count;
                }
            }
            LanguageFetch::Failed { repo, reason } => {
                warn!(repo = %repo, reason = %reason, "skipping language breakdown for repo");
            }
        }
    }

    let total_bytes: u64 = totals.values().sum();

    // Stable sort over the BTreeMap's name order: byte ties rank alphabetically.
    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(name, bytes)| {
            let percent = if total_bytes == 0 {
                0.0
            } else {
                bytes as f64 / total_bytes as f64 * 100.0
            };
            LanguageShare {
                name,
                bytes,
                percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            login: "alice".to_string(),
            name: None,
            bio: None,
            followers: 10,
            following: 5,
            public_repos: 2,
        }
    }

    fn repo(name: &str, fork: bool, stars: u32, language: Option<&str>) -> RepoSummary {
        RepoSummary {
            name: name.to_string(),
            description: None,
            stargazers_count: stars,
            language: language.map(str::to_string),
            fork,
            languages_url: format!("https://api.github.com/repos/alice/{name}/languages"),
        }
    }

    fn fetched(bytes: &[(&str, u64)]) -> LanguageFetch {
        LanguageFetch::Fetched {
            bytes: bytes.iter().map(|(l, n)| (l.to_string(), *n)).collect(),
        }
    }

    #[test]
    fn end_to_end_scenario() {
        let repos = vec![
            repo("a", false, 5, Some("Go")),
            repo("b", true, 100, Some("Go")),
        ];
        let fetches = vec![fetched(&[("Go", 1000)])];

        let stats = compute_stats(&profile(), &repos, fetches, "now".to_string());

        assert_eq!(stats.total_stars, 5);
        assert_eq!(stats.top_repos.len(), 1);
        assert_eq!(stats.top_repos[0].name, "a");
        assert_eq!(stats.languages.len(), 1);
        assert_eq!(stats.languages[0].name, "Go");
        assert_eq!(stats.languages[0].percent, 100.0);
    }

    #[test]
    fn forks_never_contribute() {
        let repos = vec![
            repo("owned", false, 2, Some("Rust")),
            repo("forked", true, 9000, Some("C")),
        ];
        let fetches = vec![fetched(&[("Rust", 500)])];

        let stats = compute_stats(&profile(), &repos, fetches, "now".to_string());

        assert_eq!(stats.total_stars, 2);
        assert!(stats.top_repos.iter().all(|r| r.name != "forked"));
        assert!(stats.languages.iter().all(|l| l.name != "C"));
    }

    #[test]
    fn top_repo_star_ties_keep_listing_order() {
        let repos = vec![
            repo("first", false, 7, None),
            repo("second", false, 7, None),
            repo("third", false, 9, None),
            repo("fourth", false, 7, None),
        ];

        let stats = compute_stats(&profile(), &repos, Vec::new(), "now".to_string());

        let names: Vec<&str> = stats.top_repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn percentages_normalize_against_all_languages() {
        // Six languages; the sixth is dropped from display but its bytes
        // still count toward the denominator.
        let fetches = vec![fetched(
            &[
                ("A", 500),
                ("B", 200),
                ("C", 120),
                ("D", 100),
                ("E", 60),
                ("F", 20),
            ],
        )];

        let stats = compute_stats(&profile(), &[], fetches, "now".to_string());

        assert_eq!(stats.languages.len(), 5);
        assert!(stats.languages.iter().all(|l| l.name != "F"));

        let displayed: f64 = stats.languages.iter().map(|l| l.percent).sum();
        assert!(displayed < 100.0);
        assert!((displayed - 98.0).abs() < 1e-9);
    }

    #[test]
    fn language_byte_counts_accumulate_across_repos() {
        let fetches = vec![
            fetched(&[("Rust", 300), ("Shell", 50)]),
            fetched(&[("Rust", 700)]),
        ];

        let stats = compute_stats(&profile(), &[], fetches, "now".to_string());

        assert_eq!(stats.languages[0].name, "Rust");
        assert_eq!(stats.languages[0].bytes, 1000);
        assert!((stats.languages[0].percent - 1000.0 / 1050.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn failed_enrichment_is_omitted_not_fatal() {
        let fetches = vec![
            fetched(&[("Rust", 100)]),
            LanguageFetch::Failed {
                repo: "bad".to_string(),
                reason: "HTTP 500".to_string(),
            },
        ];

        let stats = compute_stats(&profile(), &[], fetches, "now".to_string());

        assert_eq!(stats.languages.len(), 1);
        assert_eq!(stats.languages[0].percent, 100.0);
    }

    #[test]
    fn zero_byte_total_yields_zero_percentages() {
        let fetches = vec![fetched(&[("Rust", 0)])];

        let stats = compute_stats(&profile(), &[], fetches, "now".to_string());

        assert_eq!(stats.languages.len(), 1);
        assert_eq!(stats.languages[0].percent, 0.0);
    }

    #[test]
    fn no_owned_repos_yields_empty_sections() {
        let repos = vec![repo("forked", true, 50, Some("Go"))];

        let stats = compute_stats(&profile(), &repos, Vec::new(), "now".to_string());

        assert_eq!(stats.total_stars, 0);
        assert!(stats.languages.is_empty());
        assert!(stats.top_repos.is_empty());
    }

    #[test]
    fn display_name_falls_back_to_login() {
        let mut p = profile();
        p.name = Some(String::new());
        let stats = compute_stats(&p, &[], Vec::new(), "now".to_string());
        assert_eq!(stats.name, "alice");

        let mut p = profile();
        p.name = Some("Alice L.".to_string());
        let stats = compute_stats(&p, &[], Vec::new(), "now".to_string());
        assert_eq!(stats.name, "Alice L.");
    }

    #[test]
    fn stats_cache_round_trips_through_json() {
        let repos = vec![repo("a", false, 5, Some("Go"))];
        let stats = compute_stats(
            &profile(),
            &repos,
            vec![fetched(&[("Go", 1000)])],
            "January 01, 2024 at 12:00 AM UTC".to_string(),
        );

        let json = serde_json::to_string_pretty(&stats).unwrap();
        let back: AggregatedStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
