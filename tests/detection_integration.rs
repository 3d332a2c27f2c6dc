//! End-to-end detection against a fake GitHub API.

use lang_monitor::github::GitHubClient;
use lang_monitor::notify::Channels;
use lang_monitor::{App, Config, Error};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn commits(sha: &str) -> serde_json::Value {
    serde_json::json!([{
        "sha": sha,
        "commit": {
            "message": "Update strings\n\ndetails",
            "author": {"name": "Alice", "date": "2024-05-01T10:00:00Z"}
        }
    }])
}

async fn mount_commit(server: &MockServer, file: &str, sha: &str) {
    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits"))
        .and(query_param("path", file))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits(sha)))
        .mount(server)
        .await;
}

fn write_config(dir: &Path, content: &str) -> Config {
    let config_path = dir.join("monitors.json");
    fs::write(&config_path, content).unwrap();
    Config {
        config_path,
        state_path: dir.join("state.json"),
        github_output: Some(dir.join("github_output")),
        ..Config::default()
    }
}

fn app(server: &MockServer, config: Config) -> App<GitHubClient> {
    let client = GitHubClient::new(server.uri(), None).unwrap();
    App::new(config, client, Channels::default())
}

fn stored_sha(state_path: &Path, key: &str) -> Option<String> {
    let state: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(state_path).unwrap()).unwrap();
    state["monitors"][key]["last_sha"]
        .as_str()
        .map(ToString::to_string)
}

/// First run baselines silently; a new commit on the next run is reported.
#[tokio::test]
async fn test_baseline_then_update() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        r#"{"monitors": [{"name": "app", "repo": "o/r", "paths": ["f.txt"]}]}"#,
    );
    let state_path = config.state_path.clone();
    let output_path = tmp.path().join("github_output");

    let server = MockServer::start().await;
    mount_commit(&server, "f.txt", "aaa1111").await;

    let first = app(&server, config.clone()).run().await.unwrap();
    assert!(first.updates.is_empty());
    assert_eq!(
        stored_sha(&state_path, "o/r:main:f.txt").as_deref(),
        Some("aaa1111")
    );

    server.reset().await;
    mount_commit(&server, "f.txt", "bbb2222").await;

    let second = app(&server, config.clone()).run().await.unwrap();
    assert_eq!(second.updates.len(), 1);
    let update = &second.updates[0];
    assert_eq!(update.old_sha, "aaa1111");
    assert_eq!(update.new_sha, "bbb2222");
    assert_eq!(update.commit_message, "Update strings");
    assert_eq!(
        update.compare_url,
        "https://github.com/o/r/compare/aaa1111...bbb2222"
    );
    assert_eq!(
        stored_sha(&state_path, "o/r:main:f.txt").as_deref(),
        Some("bbb2222")
    );

    // Same commit again: nothing new.
    let third = app(&server, config).run().await.unwrap();
    assert!(third.updates.is_empty());

    let output = fs::read_to_string(output_path).unwrap();
    assert_eq!(
        output,
        "has_updates=false\nupdate_count=0\n\
         has_updates=true\nupdate_count=1\n\
         has_updates=false\nupdate_count=0\n"
    );
}

/// Glob patterns expand against the branch tree, fetched once per run.
#[tokio::test]
async fn test_glob_expansion_uses_tree() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        r#"{
            "templates": {"locales": {"pathsGlob": ["locales/*.json"]}},
            "monitors": [
                {"template": "locales", "repo": "o/r"},
                {"repo": "o/r", "paths_regex": ["^docs/.*\\.md$"]}
            ]
        }"#,
    );
    let state_path = config.state_path.clone();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/git/trees/main"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tree": [
                {"path": "locales", "type": "tree"},
                {"path": "locales/en.json", "type": "blob"},
                {"path": "locales/fr.json", "type": "blob"},
                {"path": "docs/guide.md", "type": "blob"},
                {"path": "src/main.rs", "type": "blob"}
            ],
            "truncated": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    for (file, sha) in [
        ("locales/en.json", "e1"),
        ("locales/fr.json", "f1"),
        ("docs/guide.md", "d1"),
    ] {
        mount_commit(&server, file, sha).await;
    }

    let summary = app(&server, config).run().await.unwrap();
    assert_eq!(summary.stats.baselined, 3);
    assert_eq!(summary.stats.tree_fetches, 1);
    assert_eq!(stored_sha(&state_path, "o/r:main:locales/fr.json").as_deref(), Some("f1"));
    assert_eq!(stored_sha(&state_path, "o/r:main:docs/guide.md").as_deref(), Some("d1"));
    assert!(stored_sha(&state_path, "o/r:main:src/main.rs").is_none());
}

/// A missing path is skipped without affecting the other paths.
#[tokio::test]
async fn test_not_found_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        r#"{"monitors": [{"repo": "o/r", "paths": ["gone.txt", "f.txt"]}]}"#,
    );
    let state_path = config.state_path.clone();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits"))
        .and(query_param("path", "gone.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_commit(&server, "f.txt", "aaa1111").await;

    let summary = app(&server, config).run().await.unwrap();
    assert_eq!(summary.stats.fetch_errors, 1);
    assert_eq!(stored_sha(&state_path, "o/r:main:f.txt").as_deref(), Some("aaa1111"));
    assert!(stored_sha(&state_path, "o/r:main:gone.txt").is_none());
}

/// An empty configuration is the only failing outcome.
#[tokio::test]
async fn test_no_monitors_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), r#"{"monitors": [], "batch": []}"#);
    let state_path = config.state_path.clone();

    let server = MockServer::start().await;
    let err = app(&server, config).run().await.unwrap_err();

    assert!(matches!(err, Error::NoMonitors));
    assert!(!state_path.exists());
}
