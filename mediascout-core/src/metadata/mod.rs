//! Movie metadata lookups.

/// Sliding-window limiter and retry policy.
pub mod rate_limit;
/// Candidate ordering.
pub mod ranking;
/// The TMDB v3 client.
pub mod tmdb;

use async_trait::async_trait;
use mediascout_model::{Candidate, ParsedTitle, PosterOption};

use crate::error::Result;

pub use rate_limit::{RateLimitRule, RateLimitSnapshot, RateLimiter, RetryPolicy};
pub use ranking::{normalize_title, rank_candidates};
pub use tmdb::{TmdbClient, TmdbSettings};

/// A remote movie catalogue.
///
/// Implementations rank their own results: `search` returns candidates best
/// first, already truncated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Candidates for a parsed title, best first.
    async fn search(&self, title: &ParsedTitle) -> Result<Vec<Candidate>>;

    /// Full record for one id.
    async fn movie_details(&self, external_id: u64) -> Result<Candidate>;

    /// Alternative posters, at most a handful.
    async fn posters(&self, external_id: u64) -> Result<Vec<PosterOption>>;
}
