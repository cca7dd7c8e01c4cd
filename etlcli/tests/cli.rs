use assert_cmd::Command;
use predicates::prelude::*;

fn etlcli() -> Command {
    Command::cargo_bin("etlcli").unwrap()
}

#[test]
fn offline_run_prints_every_query() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pipeline.db");

    etlcli()
        .args(["--offline", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("1) Top 5 users by number of posts:"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("3) Posts with short titles (<10 chars):"))
        .stdout(predicate::str::contains("ETL pipeline finished successfully"));

    assert!(db.exists());
}

#[test]
fn json_output_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pipeline.db");

    let output = etlcli()
        .args(["--offline", "--json", "--db"])
        .arg(&db)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["users_origin"], "fallback");
    assert_eq!(summary["posts_origin"], "fallback");
    assert_eq!(summary["loaded"]["users"], 2);

    let report = &summary["report"];
    assert_eq!(report["top_posters"][0]["username"], "alice");
    assert_eq!(report["top_posters"][0]["post_count"], 2);
    assert_eq!(report["user_posts"].as_array().unwrap().len(), 3);
}

#[test]
fn unreachable_api_falls_back_to_samples() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pipeline.db");

    etlcli()
        .args(["--api-base", "http://127.0.0.1:9", "--timeout", "1", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("bob"));
}

#[test]
fn missing_config_file_fails() {
    etlcli()
        .args(["--offline", "--config", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("here.json"));
}

#[test]
fn zero_timeout_is_rejected() {
    etlcli()
        .args(["--offline", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http_timeout_secs"));
}
