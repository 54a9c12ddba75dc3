//! Uses the single integration test approach.
//!
//! Every test spawns the `arteria-runfolder` binary against its own
//! temporary monitored directories and talks to it over HTTP.


use std::fs;
use std::path::Path;
use std::process::Command;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

use common::{
    HOUR, KillOnDrop, MISEQ_XML, NOVASEQ_XML, get_free_port, get_service_bin, service_config,
    spawn_service_with_config, wait_for_listening, write_runfolder,
};

/// A running service plus the temp dirs it monitors.
struct Harness {
    _guard: KillOnDrop,
    base: String,
    root_a: TempDir,
    root_b: TempDir,
    _config_dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let port = get_free_port();
        let root_a = tempfile::tempdir().unwrap();
        let root_b = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        let child = spawn_service_with_config(
            config_dir.path(),
            &service_config(port, &[root_a.path(), root_b.path()]),
        );
        let guard = KillOnDrop(child);
        wait_for_listening(port, 5).await;
        Self {
            _guard: guard,
            base: format!("http://127.0.0.1:{port}"),
            root_a,
            root_b,
            _config_dir: config_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn runfolder_url(&self, runfolder: &Path) -> String {
        self.url(&format!("/api/1.0/runfolders/path{}", runfolder.display()))
    }
}

async fn runfolders(client: &Client, url: &str) -> Vec<Value> {
    let response = client.get(url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "listing {url}");
    let body: Value = response.json().await.unwrap();
    body["runfolders"].as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_version_is_served_at_both_prefixes() {
    let harness = Harness::start().await;
    let client = Client::new();
    for path in ["/version", "/api/1.0/version"] {
        let response = client.get(harness.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}

#[tokio::test]
async fn test_lists_runfolders_across_monitored_directories() {
    let harness = Harness::start().await;
    write_runfolder(harness.root_a.path(), "runfolder1", NOVASEQ_XML, "CopyComplete.txt", HOUR);
    write_runfolder(harness.root_b.path(), "runfolder2", MISEQ_XML, "RTAComplete.txt", HOUR);
    // Completion marker still within the grace period.
    write_runfolder(
        harness.root_a.path(),
        "in_progress",
        NOVASEQ_XML,
        "CopyComplete.txt",
        core::time::Duration::ZERO,
    );
    fs::create_dir(harness.root_b.path().join("not_a_runfolder")).unwrap();

    let client = Client::new();
    assert_eq!(runfolders(&client, &harness.url("/api/1.0/runfolders")).await.len(), 2);
    assert_eq!(
        runfolders(&client, &harness.url("/api/1.0/runfolders?state=ready")).await.len(),
        2
    );
    assert!(
        runfolders(&client, &harness.url("/api/1.0/runfolders?state=started"))
            .await
            .is_empty(),
        "nothing has been started yet"
    );

    let response = client
        .get(harness.url("/api/1.0/runfolders?state=nonsense"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_state_changes_through_path_endpoint() {
    let harness = Harness::start().await;
    let runfolder =
        write_runfolder(harness.root_a.path(), "runfolder1", NOVASEQ_XML, "CopyComplete.txt", HOUR);
    let url = harness.runfolder_url(&runfolder);
    let client = Client::new();

    let body: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["state"], "ready");
    assert_eq!(body["metadata"]["reagent_kit_barcode"], "RK0001");
    assert_eq!(body["metadata"]["library_tube_barcode"], "NV0012345-LIB");
    assert!(
        body["link"].as_str().unwrap().ends_with(&format!(
            "/api/1.0/runfolders/path{}",
            runfolder.display()
        )),
        "unexpected link: {body}"
    );

    let response = client
        .post(&url)
        .form(&[("state", "STARTED")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let state_file = runfolder.join(".arteria").join("state");
    assert_eq!(fs::read_to_string(&state_file).unwrap(), "started");

    let started = runfolders(&client, &harness.url("/api/1.0/runfolders?state=started")).await;
    assert_eq!(started.len(), 1);

    let response = client
        .post(&url)
        .form(&[("state", "bogus")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        fs::read_to_string(&state_file).unwrap(),
        "started",
        "rejected update must not touch the state file"
    );

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "state": "done" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fs::read_to_string(&state_file).unwrap(), "done");
}

#[tokio::test]
async fn test_path_endpoint_rejects_unknown_runfolders() {
    let harness = Harness::start().await;
    let client = Client::new();

    let missing = harness.root_a.path().join("no_such_runfolder");
    let response = client.get(harness.runfolder_url(&missing)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let young = write_runfolder(
        harness.root_a.path(),
        "young",
        NOVASEQ_XML,
        "CopyComplete.txt",
        core::time::Duration::ZERO,
    );
    let response = client.get(harness.runfolder_url(&young)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let outside = tempfile::tempdir().unwrap();
    let unmonitored =
        write_runfolder(outside.path(), "runfolder", NOVASEQ_XML, "CopyComplete.txt", HOUR);
    let response = client.get(harness.runfolder_url(&unmonitored)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        !unmonitored.join(".arteria").exists(),
        "unmonitored runfolders are never touched"
    );
}

#[tokio::test]
async fn test_next_and_pickup() {
    let harness = Harness::start().await;
    let client = Client::new();

    let response = client.get(harness.url("/api/1.0/runfolders/next")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let runfolder =
        write_runfolder(harness.root_b.path(), "runfolder1", MISEQ_XML, "RTAComplete.txt", HOUR);

    let response = client.get(harness.url("/api/1.0/runfolders/next")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"], "ready");

    let response = client.get(harness.url("/api/1.0/runfolders/pickup")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"], "pending");
    assert_eq!(
        fs::read_to_string(runfolder.join(".arteria").join("state")).unwrap(),
        "pending"
    );

    let response = client.get(harness.url("/api/1.0/runfolders/pickup")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_list_command_prints_json_lines() {
    let root = tempfile::tempdir().unwrap();
    let config_dir = tempfile::tempdir().unwrap();
    write_runfolder(root.path(), "runfolder1", NOVASEQ_XML, "CopyComplete.txt", HOUR);
    // A state file with an unknown token only hides its own runfolder.
    let broken = write_runfolder(root.path(), "broken", NOVASEQ_XML, "CopyComplete.txt", HOUR);
    fs::create_dir(broken.join(".arteria")).unwrap();
    fs::write(broken.join(".arteria").join("state"), "garbage").unwrap();
    let config_path = config_dir.path().join("arteria_runfolder.toml");
    fs::write(&config_path, service_config(get_free_port(), &[root.path()])).unwrap();

    let output = Command::new(get_service_bin())
        .args(["list", "--config", config_path.to_str().unwrap(), "--state", "ready"])
        .output()
        .expect("failed to run arteria-runfolder list");
    assert!(output.status.success(), "list failed: {output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1, "unexpected output: {stdout}");
    assert_eq!(lines[0]["state"], "ready");
    assert!(
        lines[0]["path"].as_str().unwrap().ends_with("/runfolder1"),
        "unexpected output: {stdout}"
    );
    assert_eq!(lines[0]["metadata"]["reagent_kit_barcode"], "RK0001");

    let output = Command::new(get_service_bin())
        .args(["list", "--config", config_path.to_str().unwrap()])
        .output()
        .expect("failed to run arteria-runfolder list");
    assert!(output.status.success(), "unfiltered list failed: {output:?}");
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 1);
}

#[tokio::test]
async fn test_corrupt_state_file_does_not_fail_listing() {
    let harness = Harness::start().await;
    write_runfolder(harness.root_a.path(), "runfolder1", NOVASEQ_XML, "CopyComplete.txt", HOUR);
    let broken =
        write_runfolder(harness.root_b.path(), "broken", MISEQ_XML, "RTAComplete.txt", HOUR);
    fs::create_dir(broken.join(".arteria")).unwrap();
    fs::write(broken.join(".arteria").join("state"), "garbage").unwrap();

    let client = Client::new();
    let listed = runfolders(&client, &harness.url("/api/1.0/runfolders")).await;
    assert_eq!(listed.len(), 1, "unexpected listing: {listed:?}");
    assert_eq!(listed[0]["state"], "ready");
}

#[test]
fn test_service_refuses_config_without_monitored_directories() {
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("arteria_runfolder.toml");
    fs::write(&config_path, "[runfolders]\nmonitored_directories = []\n").unwrap();

    let output = Command::new(get_service_bin())
        .args(["service", "--config", config_path.to_str().unwrap()])
        .output()
        .expect("failed to run arteria-runfolder");
    assert!(!output.status.success(), "service must not start without monitored directories");
}
