use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use serde_json::{Value, json};
use tempfile::TempDir;

use mediascout_core::model::{Candidate, ParsedTitle, PosterOption};
use mediascout_core::{
    ArtworkSource, CoverSettings, CoverWriter, MetadataProvider, Result,
    ScoutError, SelectionWorkflow, TitleParser, WorkflowOptions,
};
use mediascout_server::handlers::encode_directory;
use mediascout_server::infra::minidlna::{MinidlnaClient, MinidlnaSettings};
use mediascout_server::{AppState, create_app};

#[derive(Debug)]
struct FakeCatalogue {
    movies: Vec<Candidate>,
}

#[async_trait]
impl MetadataProvider for FakeCatalogue {
    async fn search(&self, title: &ParsedTitle) -> Result<Vec<Candidate>> {
        let wanted = title.title.to_lowercase();
        Ok(self
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&wanted))
            .cloned()
            .collect())
    }

    async fn movie_details(&self, external_id: u64) -> Result<Candidate> {
        self.movies
            .iter()
            .find(|m| m.external_id == external_id)
            .cloned()
            .ok_or_else(|| {
                ScoutError::MetadataNotFound(format!("movie {external_id}"))
            })
    }

    async fn posters(&self, external_id: u64) -> Result<Vec<PosterOption>> {
        Ok(vec![PosterOption {
            path: format!("/alt-{external_id}.jpg"),
            thumb_url: format!("http://img/w185/alt-{external_id}.jpg"),
            full_url: format!("http://img/original/alt-{external_id}.jpg"),
        }])
    }
}

#[derive(Debug)]
struct FakeArtwork {
    images: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl ArtworkSource for FakeArtwork {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| ScoutError::Fetch(format!("{url}: HTTP 404")))
    }
}

fn png() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
        200,
        300,
        image::Rgb([200, 40, 40]),
    ))
    .write_to(&mut out, ImageFormat::Png)
    .unwrap();
    out.into_inner()
}

fn movie(id: u64, title: &str, year: u16, poster: &str) -> Candidate {
    Candidate {
        external_id: id,
        title: title.into(),
        original_title: None,
        year: Some(year),
        poster_reference: Some(poster.into()),
        popularity_score: 10.0,
        overview: None,
    }
}

struct Fixture {
    _media: TempDir,
    root: std::path::PathBuf,
    server: TestServer,
}

fn fixture() -> Fixture {
    fixture_with(|state| state)
}

fn fixture_with(customize: impl FnOnce(AppState) -> AppState) -> Fixture {
    let media = TempDir::new().unwrap();
    let root = media.path().to_path_buf();
    fs::write(root.join("The.Matrix.1999.1080p.BluRay.x264.mkv"), b"v").unwrap();
    fs::write(root.join("Alien (1979).mkv"), b"v").unwrap();
    fs::write(root.join("Covered.mkv"), b"v").unwrap();
    fs::write(root.join("Covered.jpg"), b"j").unwrap();
    fs::write(root.join("notes.txt"), b"n").unwrap();

    let settings = CoverSettings::default();
    let artwork = FakeArtwork {
        images: HashMap::from([(settings.artwork_url("/matrix.jpg"), png())]),
    };
    let catalogue = FakeCatalogue {
        movies: vec![
            movie(603, "The Matrix", 1999, "/matrix.jpg"),
            movie(348, "Alien", 1979, "/missing.jpg"),
        ],
    };
    let workflow = SelectionWorkflow::new(
        TitleParser::default(),
        Arc::new(catalogue),
        CoverWriter::new(Arc::new(artwork), settings),
        WorkflowOptions::default(),
    );
    let state = customize(AppState::new(
        workflow,
        vec![root.clone()],
        vec!["mkv".into()],
    ));
    let server = TestServer::new(create_app(state)).unwrap();

    Fixture {
        _media: media,
        root,
        server,
    }
}

fn key(root: &Path) -> String {
    encode_directory(&root.to_string_lossy())
}

#[tokio::test]
async fn health_reports_ok() {
    let fx = fixture();
    let response = fx.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["directories"], 1);
    assert!(body.get("rate_limit").is_none());
    assert!(body.get("minidlna").is_none());
}

#[tokio::test]
async fn directories_list_counts_missing_covers() {
    let fx = fixture();
    let body: Value = fx.server.get("/api/directories").await.json();
    let entry = &body["directories"][0];
    assert_eq!(entry["directory_b64"], key(&fx.root));
    assert_eq!(entry["total_files"], 3);
    assert_eq!(entry["missing_covers"], 2);
    assert_eq!(entry["status"], "action_needed");
}

#[tokio::test]
async fn scan_rejects_unconfigured_directories() {
    let fx = fixture();
    let other = TempDir::new().unwrap();

    let response = fx
        .server
        .get(&format!("/api/scan/{}", key(other.path())))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 403);
    assert_eq!(body["error"]["message"], "Directory not allowed");

    fx.server
        .get("/api/scan/not*base64")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn scan_lists_needs_cover_files_with_parsed_titles() {
    let fx = fixture();
    let response = fx.server.get(&format!("/api/scan/{}", key(&fx.root))).await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["total_files"], 3);
    assert_eq!(body["missing_covers"], 2);
    let files = body["files"].as_array().unwrap();
    assert_eq!(files[0]["media_file"]["stem"], "Alien (1979)");
    assert_eq!(files[0]["parsed"]["title"], "Alien");
    assert_eq!(files[0]["parsed"]["year"], 1979);
    assert_eq!(files[1]["parsed"]["title"], "The Matrix");
    assert_eq!(files[1]["parsed"]["year"], 1999);
}

#[tokio::test]
async fn candidates_are_built_for_each_file() {
    let fx = fixture();
    let response = fx
        .server
        .post("/api/candidates")
        .json(&json!({ "directory_b64": key(&fx.root) }))
        .await;
    response.assert_status_ok();
    let sets: Value = response.json();
    let sets = sets.as_array().unwrap();

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[1]["candidates"][0]["external_id"], 603);
    assert!(sets.iter().all(|s| s["state"] == "awaiting_selection"));
}

#[tokio::test]
async fn search_needs_a_title() {
    let fx = fixture();
    let response = fx
        .server
        .post("/api/search-movie")
        .json(&json!({ "title": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = fx
        .server
        .post("/api/search-movie")
        .json(&json!({ "title": "alien", "year": 1979 }))
        .await
        .json();
    assert_eq!(body["results"][0]["title"], "Alien");
}

#[tokio::test]
async fn movie_details_include_posters() {
    let fx = fixture();
    let body: Value = fx.server.get("/api/movies/603").await.json();
    assert_eq!(body["movie"]["title"], "The Matrix");
    assert_eq!(body["posters"][0]["path"], "/alt-603.jpg");

    fx.server
        .get("/api/movies/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    fx.server
        .get("/api/movies/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn save_covers_reports_each_file_in_order() {
    let fx = fixture();
    let matrix = fx.root.join("The.Matrix.1999.1080p.BluRay.x264.mkv");
    let alien = fx.root.join("Alien (1979).mkv");
    let outside = TempDir::new().unwrap();
    let stray = outside.path().join("Stray.mkv");
    fs::write(&stray, b"v").unwrap();

    let response = fx
        .server
        .post("/api/save-covers")
        .json(&json!({
            "selections": [
                {
                    "path": matrix,
                    "candidate": movie(603, "The Matrix", 1999, "/matrix.jpg"),
                },
                {
                    "path": alien,
                    "candidate": movie(348, "Alien", 1979, "/missing.jpg"),
                },
                { "path": stray },
                { "path": fx.root.join("Covered.mkv") },
            ]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["written"], 1);
    assert_eq!(body["failed"], 2);
    assert_eq!(body["skipped"], 1);
    let statuses: Vec<&str> = body["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, ["written", "failed", "failed", "skipped"]);
    assert!(
        body["outcomes"][2]["error"]
            .as_str()
            .unwrap()
            .contains("outside configured directories")
    );

    let cover = image::open(fx.root.join("The.Matrix.1999.1080p.BluRay.x264.jpg"))
        .unwrap();
    assert_eq!(cover.dimensions(), (160, 160));
    assert!(!fx.root.join("Alien (1979).jpg").exists());

    let rescan: Value = fx
        .server
        .get(&format!("/api/scan/{}", key(&fx.root)))
        .await
        .json();
    assert_eq!(rescan["missing_covers"], 1);
}

#[tokio::test]
async fn save_covers_rejects_paths_without_a_stem() {
    let fx = fixture();
    fx.server
        .post("/api/save-covers")
        .json(&json!({ "selections": [{ "path": fx.root.join("noext") }] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

async fn spawn_portainer(webhook_status: StatusCode) -> String {
    let router = axum::Router::new()
        .route("/", axum::routing::get(|| async { "MiniDLNA status" }))
        .route(
            "/api/webhooks/rescan",
            axum::routing::post(move || async move { webhook_status }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn minidlna(base: &str) -> MinidlnaClient {
    MinidlnaClient::new(MinidlnaSettings {
        status_url: Some(base.to_string()),
        webhook_url: Some(format!("{base}/api/webhooks/rescan")),
        status_timeout: Duration::from_secs(2),
        status_ttl: Duration::from_secs(60),
        webhook_timeout: Duration::from_secs(2),
        accept_invalid_certs: false,
    })
    .unwrap()
}

#[tokio::test]
async fn rescan_without_webhook_is_not_found() {
    let fx = fixture();
    let response = fx.server.post("/api/trigger-minidlna").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "minidlna rescan is not configured");
}

#[tokio::test]
async fn rescan_and_status_go_through_minidlna() {
    let base = spawn_portainer(StatusCode::NO_CONTENT).await;
    let client = minidlna(&base);
    let fx = fixture_with(|state| state.with_minidlna(client));

    let health: Value = fx.server.get("/health").await.json();
    assert_eq!(health["minidlna"], "up");

    let response = fx.server.post("/api/trigger-minidlna").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Minidlna rescan triggered successfully");
}

#[tokio::test]
async fn failed_webhook_is_a_bad_gateway() {
    let base = spawn_portainer(StatusCode::INTERNAL_SERVER_ERROR).await;
    let client = minidlna(&base);
    let fx = fixture_with(|state| state.with_minidlna(client));

    let response = fx.server.post("/api/trigger-minidlna").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("500")
    );
}
