use thiserror::Error;

/// Fatal failures of the aggregation pipeline.
///
/// Per-repository language-fetch failures and a missing README are not
/// represented here: they are handled at their origin and never propagate.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("GitHub API returned HTTP {status} for {endpoint}")]
    Remote { endpoint: String, status: u16 },

    #[error("network error calling {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected payload shape from {endpoint}")]
    DataShape {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StatsError>;
