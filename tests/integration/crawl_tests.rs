//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small challenge catalog and run the
//! full two-phase crawl end-to-end through the static browser driver.

use kata_harvest::config::{
    Config, CrawlerConfig, DetailPolicy, ListingSelectors, OutputConfig, SiteConfig,
    UserAgentConfig,
};
use kata_harvest::crawler::Coordinator;
use kata_harvest::output::{generate_summary, ExerciseExporter, RecordExporter};
use kata_harvest::state::RequestState;
use kata_harvest::storage::{SqliteStorage, Storage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock catalog
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_requests_per_crawl: 50,
            max_concurrency: 4,
            max_request_retries: 1,
            load_more_timeout_ms: 100,
            content_timeout_ms: 1_000,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().to_string(),
            summary_path: "./test_summary.md".to_string(),
            dataset_dir: "./dataset".to_string(),
        },
        site: SiteConfig {
            seed_url: format!("{}/challenges", base_url),
            challenge_url_pattern: format!("{}/challenge/[.*]", base_url),
        },
        listing: ListingSelectors::default(),
        detail: DetailPolicy::default(),
    }
}

fn listing_page(entries: &[(&str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(href, difficulty)| {
            format!(
                r#"<div class="item"><a class="content" href="{}">link</a><div class="difficulty">{}</div></div>"#,
                href, difficulty
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Challenges</title></head><body>
        <div class="list">{}</div>
        <div class="ui container"><button>Load More</button></div>
        </body></html>"#,
        items
    )
}

fn challenge_page(title: &str, tags: &[&str]) -> String {
    let tags: String = tags
        .iter()
        .map(|tag| format!(r#"<a class="ui label">{}</a>"#, tag))
        .collect();

    format!(
        r#"<html><head><title>{title} | Catalog</title></head><body>
        <h2 class="content">{title}</h2>
        {tags}
        <div class="instructions"><div class="meta">hidden</div><div><p>Solve {title}.</p></div></div>
        <div role="tab">Instructions</div><div role="tab">Results</div><div role="tab">Code</div>
        <div role="tab">Comments</div><div role="tab">Solutions</div><div role="tab">Tests</div>
        <div id="Code"><div class="CodeMirror-code"><pre>function solve() {{</pre><pre>}}</pre></div></div>
        <div id="Lab"><div class="CodeMirror-code"><pre>Test.assertEquals(solve(), true)</pre></div></div>
        </body></html>"#,
        title = title,
        tags = tags
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn temp_db() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("harvest.db");
    (dir, path)
}

#[tokio::test]
async fn test_full_harvest_three_difficulties() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/challenges",
        listing_page(&[
            ("/challenge/easy1", "Easy"),
            ("/challenge/med1", "Medium"),
            ("/challenge/hard1", "Hard"),
        ]),
        1,
    )
    .await;
    mount_html(&server, "/challenge/easy1", challenge_page("Add Two", &["math"]), 1).await;
    mount_html(&server, "/challenge/med1", challenge_page("Reverse", &["strings", "loops"]), 1).await;
    mount_html(&server, "/challenge/hard1", challenge_page("Sudoku", &["arrays"]), 1).await;

    let (_dir, db_path) = temp_db();
    let config = create_test_config(&base_url, &db_path);

    let mut coordinator =
        Coordinator::new(config, "test-hash", true).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.dispatched, 4);
    assert_eq!(report.handled, 4);
    assert_eq!(report.failed, 0);
    assert_eq!(report.records, 3);

    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    let mut records = storage.get_records().expect("Failed to load records");
    records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    assert_eq!(records.len(), 3);

    let easy = records
        .iter()
        .find(|r| r.title == "Add Two")
        .expect("Missing easy record");
    assert_eq!(easy.difficulty, "Easy");
    assert_eq!(easy.source_url, format!("{}/challenge/easy1", base_url));
    assert_eq!(easy.challenge_id.as_deref(), Some("easy1"));
    assert_eq!(easy.tags, vec!["math"]);
    assert_eq!(easy.instructions, "<p>Solve Add Two.</p>");
    assert_eq!(easy.code, "function solve() {\n}");
    assert_eq!(easy.tests, "Test.assertEquals(solve(), true)");

    let medium = records
        .iter()
        .find(|r| r.title == "Reverse")
        .expect("Missing medium record");
    assert_eq!(medium.difficulty, "Medium");
    assert_eq!(medium.tags, vec!["strings", "loops"]);

    let hard = records
        .iter()
        .find(|r| r.title == "Sudoku")
        .expect("Missing hard record");
    assert_eq!(hard.difficulty, "Hard");

    assert_eq!(
        storage
            .count_requests_by_state(RequestState::Handled)
            .expect("Failed to count handled"),
        4
    );
}

#[tokio::test]
async fn test_duplicate_links_are_visited_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    let absolute = format!("{}/challenge/dup", base_url);
    mount_html(
        &server,
        "/challenges",
        listing_page(&[
            ("/challenge/dup", "Easy"),
            (&absolute, "Easy"),
            ("/challenge/dup/", "Easy"),
            ("/challenge/dup#comments", "Easy"),
        ]),
        1,
    )
    .await;
    mount_html(&server, "/challenge/dup", challenge_page("Dup", &[]), 1).await;

    let (_dir, db_path) = temp_db();
    let config = create_test_config(&base_url, &db_path);

    let mut coordinator =
        Coordinator::new(config, "test-hash", true).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.dispatched, 2);
    assert_eq!(report.records, 1);

    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    assert_eq!(storage.count_total_requests().expect("Failed to count"), 2);
}

#[tokio::test]
async fn test_missing_challenge_page_fails_after_retries() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/challenges",
        listing_page(&[("/challenge/ok", "Easy"), ("/challenge/gone", "Hard")]),
        1,
    )
    .await;
    mount_html(&server, "/challenge/ok", challenge_page("Fine", &[]), 1).await;
    Mock::given(method("GET"))
        .and(path("/challenge/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let (_dir, db_path) = temp_db();
    let config = create_test_config(&base_url, &db_path);

    let mut coordinator =
        Coordinator::new(config, "test-hash", true).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.handled, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.records, 1);

    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    let summary = generate_summary(&storage).expect("Failed to build summary");
    assert_eq!(summary.status, "completed");
    assert_eq!(summary.config_hash, "test-hash");
    assert_eq!(summary.failed_requests.len(), 1);
    assert!(summary.failed_requests[0].url.ends_with("/challenge/gone"));
    assert!(summary.failed_requests[0].message.contains("404"));
}

#[tokio::test]
async fn test_links_outside_pattern_are_ignored() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/challenges",
        listing_page(&[("/challenge/real", "Easy"), ("/user/someone", "Easy")]),
        1,
    )
    .await;
    mount_html(&server, "/challenge/real", challenge_page("Real", &[]), 1).await;
    mount_html(&server, "/user/someone", String::from("<html></html>"), 0).await;

    let (_dir, db_path) = temp_db();
    let config = create_test_config(&base_url, &db_path);

    let mut coordinator =
        Coordinator::new(config, "test-hash", true).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.records, 1);
}

#[tokio::test]
async fn test_harvest_then_export_exercises() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/challenges",
        listing_page(&[("/challenge/a1", "Very Easy")]),
        1,
    )
    .await;
    mount_html(&server, "/challenge/a1", challenge_page("Is It True?", &[]), 1).await;

    let (dir, db_path) = temp_db();
    let config = create_test_config(&base_url, &db_path);

    let mut coordinator =
        Coordinator::new(config, "test-hash", true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Harvest failed");

    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    let records = storage.get_records().expect("Failed to load records");

    let out = dir.path().join("exercises");
    let summary = ExerciseExporter::new(&out)
        .export(&records)
        .expect("Export failed");
    assert_eq!(summary.written, 1);

    let folder = out.join("very-easy").join("is-it-true");
    let code = std::fs::read_to_string(folder.join("code.js")).expect("Missing code.js");
    assert_eq!(
        code,
        "function solve() {\n  // Your code here.\n}\n\nmodule.exports = solve;\n"
    );
    assert!(folder.join("code.spec.js").exists());
    assert!(folder.join("package.json").exists());

    let readme = std::fs::read_to_string(folder.join("README.md")).expect("Missing README.md");
    assert!(readme.starts_with("# Is It True?"));
    assert!(readme.contains("Solve Is It True"));
    assert!(!readme.contains("<p>"));
}
