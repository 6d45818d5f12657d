use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{RETRY_AFTER, USER_AGENT};
use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::stats::{RepoSummary, UserProfile};

const API_ROOT: &str = "https://api.github.com";
const PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct GithubClient {
    token: Option<Arc<String>>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a REST client. Requests go out unauthenticated when `token`
    /// is `None`; GitHub allows that at a lower rate limit.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Arc::new),
            http: Arc::new(Client::new()),
        }
    }

    /// Low-level GET with basic retry/backoff.
    async fn get_json(&self, url: &str) -> Result<Value> {
        const MAX_RETRIES: usize = 4;
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let mut req = self.http.get(url).header(USER_AGENT, "kholcomb-profile-stats");
            if let Some(token) = &self.token {
                req = req.bearer_auth(token.as_str());
            }

            let resp = req.send().await.map_err(|e| StatsError::Transport {
                endpoint: url.to_string(),
                source: e,
            })?;

            let status = resp.status();
            if status.is_success() {
                let body = resp.text().await.map_err(|e| StatsError::Transport {
                    endpoint: url.to_string(),
                    source: e,
                })?;
                return serde_json::from_str(&body).map_err(|e| StatsError::DataShape {
                    endpoint: url.to_string(),
                    source: e,
                });
            }

            // If rate limited, honor Retry-After header when present
            if status.as_u16() == 429 && attempt < MAX_RETRIES {
                let wait_secs = resp
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                debug!(url, attempt, wait_secs, "rate limited, backing off");
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            // Retry on 5xx server errors
            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                debug!(url, attempt, "server error, backing off");
                sleep(backoff).await;
                continue;
            }

            return Err(StatsError::Remote {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }
    }

    /// Fetch the profile record for `username`.
    pub async fn fetch_profile(&self, username: &str) -> Result<UserProfile> {
        let url = format!("{API_ROOT}/users/{username}");
        let json = self.get_json(&url).await?;
        serde_json::from_value(json).map_err(|e| StatsError::DataShape {
            endpoint: url,
            source: e,
        })
    }

    /// Fetch the complete repository listing for `username`, in listing order.
    pub async fn fetch_repositories(&self, username: &str) -> Result<Vec<RepoSummary>> {
        collect_pages(|page| {
            let url =
                format!("{API_ROOT}/users/{username}/repos?per_page={PAGE_SIZE}&page={page}");
            async move {
                let json = self.get_json(&url).await?;
                serde_json::from_value(json).map_err(|e| StatsError::DataShape {
                    endpoint: url,
                    source: e,
                })
            }
        })
        .await
    }

    /// Fetch one repository's language byte breakdown from its
    /// repository-supplied `languages_url`.
    pub async fn fetch_languages(&self, languages_url: &str) -> Result<BTreeMap<String, u64>> {
        let json = self.get_json(languages_url).await?;
        serde_json::from_value(json).map_err(|e| StatsError::DataShape {
            endpoint: languages_url.to_string(),
            source: e,
        })
    }
}

/// Accumulate pages from `fetch_page(1..)` until the first empty page.
///
/// An empty page terminates the loop; a failed page fails the whole listing.
pub(crate) async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = fetch_page(page).await?;
        if batch.is_empty() {
            return Ok(all);
        }
        all.extend(batch);
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test]
    async fn pagination_stops_on_first_empty_page() {
        let pages = vec![vec![1u32; 100], vec![1; 100], vec![1; 37], vec![]];
        let requests = Cell::new(0u32);

        let collected = collect_pages(|page| {
            requests.set(requests.get() + 1);
            let batch = pages[(page - 1) as usize].clone();
            async move { Ok(batch) }
        })
        .await
        .unwrap();

        assert_eq!(requests.get(), 4);
        assert_eq!(collected.len(), 237);
    }

    #[tokio::test]
    async fn pagination_surfaces_page_failures() {
        let result = collect_pages(|page| async move {
            if page == 1 {
                Ok(vec![1u32; 100])
            } else {
                Err(StatsError::Remote {
                    endpoint: format!("page {page}"),
                    status: 502,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(StatsError::Remote { status: 502, .. })));
    }

    #[tokio::test]
    async fn empty_first_page_yields_empty_listing() {
        let collected: Vec<u32> = collect_pages(|_| async { Ok(Vec::new()) }).await.unwrap();
        assert!(collected.is_empty());
    }
}
