use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use mediascout_model::{Candidate, ParsedTitle, PosterOption};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::MetadataProvider;
use super::rate_limit::{RateLimitRule, RateLimiter, RetryPolicy};
use super::ranking::rank_candidates;
use crate::error::{Result, ScoutError};

/// Default TMDB v3 API root.
pub const TMDB_V3_BASE: &str = "https://api.themoviedb.org/3";
/// Default TMDB image host.
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

const MAX_POSTERS: usize = 6;
const POSTER_THUMB_SIZE: &str = "w185";
const POSTER_FULL_SIZE: &str = "original";

/// Connection and lookup settings for [`TmdbClient`].
#[derive(Clone)]
pub struct TmdbSettings {
    /// v3 API key, sent as a query parameter.
    pub api_key: String,
    /// Locale for titles and overviews, e.g. `en-US`.
    pub language: String,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Image host used to build poster URLs.
    pub image_base: String,
    /// Candidates kept per search after ranking.
    pub max_results: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Client-side request ceiling.
    pub rate_limit: RateLimitRule,
    /// Retries for transient failures.
    pub retry: RetryPolicy,
}

impl fmt::Debug for TmdbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbSettings")
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .field("base_url", &self.base_url)
            .field("image_base", &self.image_base)
            .field("max_results", &self.max_results)
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .finish()
    }
}

impl TmdbSettings {
    /// Defaults for the public TMDB service.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            language: "en-US".to_string(),
            base_url: TMDB_V3_BASE.to_string(),
            image_base: TMDB_IMAGE_BASE.to_string(),
            max_results: 10,
            timeout: Duration::from_secs(10),
            rate_limit: RateLimitRule::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    api_key: &'a str,
    query: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<u16>,
}

#[derive(Debug, Serialize)]
struct LanguageQuery<'a> {
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<MovieResult>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    id: u64,
    title: String,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    overview: Option<String>,
}

impl MovieResult {
    fn into_candidate(self) -> Candidate {
        let year = self
            .release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok());
        Candidate {
            external_id: self.id,
            title: self.title,
            original_title: self.original_title,
            year,
            poster_reference: self.poster_path.filter(|p| !p.trim().is_empty()),
            popularity_score: self.popularity,
            overview: self.overview.filter(|o| !o.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    posters: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct TmdbErrorBody {
    #[serde(default)]
    status_message: Option<String>,
}

/// TMDB v3 client. Every request goes through the shared [`RateLimiter`].
pub struct TmdbClient {
    http: reqwest::Client,
    settings: TmdbSettings,
    limiter: RateLimiter,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl TmdbClient {
    /// A client with its own rate limiter.
    pub fn new(settings: TmdbSettings) -> Result<Self> {
        let limiter = RateLimiter::new(settings.rate_limit);
        Self::with_limiter(settings, limiter)
    }

    /// Share an existing limiter, e.g. between several clients.
    pub fn with_limiter(
        settings: TmdbSettings,
        limiter: RateLimiter,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| {
                ScoutError::Internal(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            settings,
            limiter,
        })
    }

    /// Settings in use.
    pub fn settings(&self) -> &TmdbSettings {
        &self.settings
    }

    /// The limiter every request waits on.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn image_url(&self, size: &str, file_path: &str) -> String {
        format!(
            "{}/{}{}",
            self.settings.image_base.trim_end_matches('/'),
            size,
            file_path
        )
    }

    /// GET with rate limiting and bounded retries on transient failures.
    async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let max_attempts = self.settings.retry.max_attempts.max(1);
        let mut failures = 0;

        loop {
            self.limiter.acquire().await;
            let err = match self.get_json_once(&url, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            failures += 1;
            if failures >= max_attempts {
                warn!("TMDB {} failed after {} attempts: {}", path, failures, err);
                return Err(err);
            }

            let backoff = self.settings.retry.delay_for(failures);
            match &err {
                ScoutError::RateLimited { retry_after } => {
                    let delay = retry_after.unwrap_or(backoff);
                    warn!("TMDB rate limited on {}, pausing {:?}", path, delay);
                    self.limiter.penalize(delay).await;
                }
                _ => {
                    warn!(
                        "TMDB {} attempt {} failed: {}, retrying in {:?}",
                        path, failures, err, backoff
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    async fn get_json_once<Q, T>(&self, url: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ScoutError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| ScoutError::ServiceUnavailable(e.to_string()))?;
            return serde_json::from_slice(&body)
                .map_err(|e| ScoutError::Parse(e.to_string()));
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let message = response
            .json::<TmdbErrorBody>()
            .await
            .ok()
            .and_then(|body| body.status_message)
            .unwrap_or_else(|| format!("TMDB request failed with status {status}"));

        Err(match status {
            StatusCode::UNAUTHORIZED => ScoutError::InvalidApiKey,
            StatusCode::NOT_FOUND => ScoutError::MetadataNotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ScoutError::RateLimited { retry_after },
            s if s.is_server_error() => ScoutError::ServiceUnavailable(message),
            _ => ScoutError::Api(message),
        })
    }

    async fn search_page(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<Candidate>> {
        let query = SearchQuery {
            api_key: &self.settings.api_key,
            query: title,
            language: &self.settings.language,
            year,
        };
        let page: SearchPage = self.get_json("/search/movie", &query).await?;
        Ok(page
            .results
            .into_iter()
            .map(MovieResult::into_candidate)
            .collect())
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search(&self, title: &ParsedTitle) -> Result<Vec<Candidate>> {
        if title.is_blank() {
            return Ok(Vec::new());
        }

        let mut results = self.search_page(&title.title, title.year).await?;
        if results.is_empty() && title.year.is_some() {
            debug!("No TMDB results for {}, retrying without year", title);
            results = self.search_page(&title.title, None).await?;
        }

        debug!("TMDB returned {} results for {}", results.len(), title);
        Ok(rank_candidates(title, results, self.settings.max_results))
    }

    async fn movie_details(&self, external_id: u64) -> Result<Candidate> {
        let query = LanguageQuery {
            api_key: &self.settings.api_key,
            language: Some(&self.settings.language),
        };
        let movie: MovieResult = self
            .get_json(&format!("/movie/{external_id}"), &query)
            .await?;
        Ok(movie.into_candidate())
    }

    async fn posters(&self, external_id: u64) -> Result<Vec<PosterOption>> {
        let query = LanguageQuery {
            api_key: &self.settings.api_key,
            language: None,
        };
        let images: ImagesResponse = self
            .get_json(&format!("/movie/{external_id}/images"), &query)
            .await?;

        Ok(images
            .posters
            .into_iter()
            .take(MAX_POSTERS)
            .map(|poster| PosterOption {
                thumb_url: self.image_url(POSTER_THUMB_SIZE, &poster.file_path),
                full_url: self.image_url(POSTER_FULL_SIZE, &poster.file_path),
                path: poster.file_path,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router};
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, HeaderValue};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use serde_json::{Value, json};

    #[derive(Clone, Default)]
    struct Recorder {
        hits: Arc<AtomicUsize>,
        queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    impl Recorder {
        fn record(&self, query: HashMap<String, String>) -> usize {
            self.queries.lock().unwrap().push(query);
            self.hits.fetch_add(1, Ordering::SeqCst) + 1
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        fn query(&self, idx: usize) -> HashMap<String, String> {
            self.queries.lock().unwrap()[idx].clone()
        }
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> TmdbClient {
        let settings = TmdbSettings {
            base_url,
            image_base: "https://img.test/t/p".to_string(),
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            ..TmdbSettings::new("test-key")
        };
        TmdbClient::new(settings).unwrap()
    }

    fn movie(id: u64, title: &str, date: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "original_title": title,
            "release_date": date,
            "poster_path": format!("/{id}.jpg"),
            "popularity": 10.0,
            "overview": "",
        })
    }

    async fn search_handler(
        State(recorder): State<Recorder>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let has_year = query.contains_key("year");
        recorder.record(query);
        if has_year {
            return Json(json!({ "results": [] }));
        }
        Json(json!({
            "results": [
                movie(1, "The Matrix Reloaded", "2003-05-15"),
                movie(2, "The Matrix", "1999-03-31"),
                movie(3, "The Matrix", ""),
            ]
        }))
    }

    #[tokio::test]
    async fn search_ranks_and_sends_expected_params() {
        let recorder = Recorder::default();
        let router = Router::new()
            .route("/search/movie", get(search_handler))
            .with_state(recorder.clone());
        let client = client(spawn_server(router).await);

        let results = client
            .search(&ParsedTitle::new("The Matrix", None))
            .await
            .unwrap();

        let ids: Vec<_> = results.iter().map(|c| c.external_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(results[0].year, Some(1999));
        assert_eq!(results[1].year, None);
        assert_eq!(results[0].poster_reference.as_deref(), Some("/2.jpg"));
        assert_eq!(results[0].overview, None);

        let query = recorder.query(0);
        assert_eq!(query["api_key"], "test-key");
        assert_eq!(query["query"], "The Matrix");
        assert_eq!(query["language"], "en-US");
        assert!(!query.contains_key("year"));
    }

    #[tokio::test]
    async fn empty_year_search_falls_back_to_title_only() {
        let recorder = Recorder::default();
        let router = Router::new()
            .route("/search/movie", get(search_handler))
            .with_state(recorder.clone());
        let client = client(spawn_server(router).await);

        let results = client
            .search(&ParsedTitle::new("The Matrix", Some(1999)))
            .await
            .unwrap();

        assert_eq!(recorder.hits(), 2);
        assert_eq!(recorder.query(0)["year"], "1999");
        assert!(!recorder.query(1).contains_key("year"));
        assert_eq!(results[0].external_id, 2);
    }

    #[tokio::test]
    async fn blank_title_skips_the_service() {
        let client = client("http://127.0.0.1:9".to_string());
        let results = client.search(&ParsedTitle::new("  ", None)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn rate_limited_response_is_retried() {
        let recorder = Recorder::default();
        let router = Router::new()
            .route(
                "/search/movie",
                get(
                    |State(recorder): State<Recorder>,
                     Query(query): Query<HashMap<String, String>>| async move {
                        if recorder.record(query) == 1 {
                            let mut headers = HeaderMap::new();
                            headers.insert(RETRY_AFTER, HeaderValue::from_static("0"));
                            return (StatusCode::TOO_MANY_REQUESTS, headers).into_response();
                        }
                        axum::Json(json!({ "results": [movie(7, "Heat", "1995-12-15")] }))
                            .into_response()
                    },
                ),
            )
            .with_state(recorder.clone());
        let client = client(spawn_server(router).await);

        let results = client
            .search(&ParsedTitle::new("Heat", Some(1995)))
            .await
            .unwrap();

        assert_eq!(recorder.hits(), 2);
        assert_eq!(results[0].external_id, 7);
        assert_eq!(client.limiter().snapshot().await.in_window, 2);
    }

    #[tokio::test]
    async fn server_errors_give_up_after_max_attempts() {
        let recorder = Recorder::default();
        let router = Router::new()
            .route(
                "/search/movie",
                get(
                    |State(recorder): State<Recorder>,
                     Query(query): Query<HashMap<String, String>>| async move {
                        recorder.record(query);
                        StatusCode::SERVICE_UNAVAILABLE
                    },
                ),
            )
            .with_state(recorder.clone());
        let client = client(spawn_server(router).await);

        let err = client
            .search(&ParsedTitle::new("Heat", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ScoutError::ServiceUnavailable(_)));
        assert_eq!(recorder.hits(), 3);
    }

    #[tokio::test]
    async fn invalid_key_is_not_retried() {
        let recorder = Recorder::default();
        let router = Router::new()
            .route(
                "/search/movie",
                get(
                    |State(recorder): State<Recorder>,
                     Query(query): Query<HashMap<String, String>>| async move {
                        recorder.record(query);
                        (
                            StatusCode::UNAUTHORIZED,
                            axum::Json(json!({ "status_message": "Invalid API key" })),
                        )
                    },
                ),
            )
            .with_state(recorder.clone());
        let client = client(spawn_server(router).await);

        let err = client
            .search(&ParsedTitle::new("Heat", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ScoutError::InvalidApiKey));
        assert_eq!(recorder.hits(), 1);
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(format!("http://{addr}"));
        let err = client
            .search(&ParsedTitle::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn stalled_service_times_out_as_unavailable() {
        let recorder = Recorder::default();
        let router = Router::new()
            .route(
                "/search/movie",
                get(
                    |State(recorder): State<Recorder>,
                     Query(query): Query<HashMap<String, String>>| async move {
                        recorder.record(query);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        axum::Json(json!({ "results": [] }))
                    },
                ),
            )
            .with_state(recorder.clone());
        let settings = TmdbSettings {
            base_url: spawn_server(router).await,
            timeout: Duration::from_millis(50),
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            ..TmdbSettings::new("test-key")
        };
        let client = TmdbClient::new(settings).unwrap();

        let started = std::time::Instant::now();
        let err = client
            .search(&ParsedTitle::new("Heat", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ScoutError::ServiceUnavailable(_)));
        assert!(err.is_retryable());
        assert_eq!(recorder.hits(), 2);
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn details_and_posters() {
        let router = Router::new()
            .route(
                "/movie/{id}",
                get(|Path(id): Path<u64>| async move {
                    if id == 603 {
                        axum::Json(movie(603, "The Matrix", "1999-03-31")).into_response()
                    } else {
                        (
                            StatusCode::NOT_FOUND,
                            axum::Json(json!({
                                "status_message": "The resource you requested could not be found."
                            })),
                        )
                            .into_response()
                    }
                }),
            )
            .route(
                "/movie/{id}/images",
                get(|Path(_id): Path<u64>| async move {
                    let posters: Vec<_> = (0..8)
                        .map(|i| json!({ "file_path": format!("/p{i}.jpg"), "width": 500 }))
                        .collect();
                    axum::Json(json!({ "id": 603, "posters": posters, "backdrops": [] }))
                }),
            );
        let client = client(spawn_server(router).await);

        let details = client.movie_details(603).await.unwrap();
        assert_eq!(details.title, "The Matrix");
        assert_eq!(details.year, Some(1999));

        let err = client.movie_details(1).await.unwrap_err();
        assert!(matches!(err, ScoutError::MetadataNotFound(ref m) if m.contains("could not be found")));

        let posters = client.posters(603).await.unwrap();
        assert_eq!(posters.len(), 6);
        assert_eq!(posters[0].path, "/p0.jpg");
        assert_eq!(posters[0].thumb_url, "https://img.test/t/p/w185/p0.jpg");
        assert_eq!(posters[0].full_url, "https://img.test/t/p/original/p0.jpg");
    }

    #[test]
    fn debug_redacts_the_key() {
        let settings = TmdbSettings::new("super-secret");
        assert!(!format!("{settings:?}").contains("super-secret"));
    }
}
