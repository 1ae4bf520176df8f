//! CLI integration tests
//!
//! Drive the built `adamsdb` binary against a scratch database file.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(db: &Path, args: &[&str]) -> Output {
    let cli_bin = env!("CARGO_BIN_EXE_adamsdb");
    Command::new(cli_bin)
        .env_remove("ADAMSDB_DB")
        .env("RUST_LOG", "off")
        .arg("--db")
        .arg(db)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn add(db: &Path, host: &str, log_type: &str, generation: &str) -> i64 {
    let output = run(
        db,
        &[
            "add",
            "--host",
            host,
            "--ip",
            "10.0.0.1",
            "--type",
            log_type,
            "--status",
            "NEW",
            "--source",
            "svc-a",
            "--message",
            "boom",
            "--generation",
            generation,
        ],
    );
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    stdout(&output).parse().expect("add prints the new id")
}

#[test]
fn test_init_then_tables() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("logs.db");

    let output = run(&db, &["init"]);
    assert!(output.status.success());

    let output = run(&db, &["tables"]);
    assert!(output.status.success());
    let tables = stdout(&output);
    assert!(tables.lines().any(|l| l == "LOG"), "tables: {}", tables);
    assert!(tables.lines().any(|l| l == "schema_version"));
}

#[test]
fn test_add_get_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("logs.db");

    let id = add(&db, "h1", "ERR", "2024-03-01T12:00:00Z");
    assert_eq!(id, 1);

    let output = run(&db, &["get", "1"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["host"], "h1");
    assert_eq!(json["type"], "ERR");
    assert_eq!(json["status"], "NEW");
    assert_eq!(json["source"], "svc-a");
}

#[test]
fn test_get_missing_record_fails() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("logs.db");
    run(&db, &["init"]);

    let output = run(&db, &["get", "42"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_NOT_FOUND"));
}

#[test]
fn test_query_latest_with_limit() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("logs.db");

    add(&db, "web-1", "ERR", "2024-03-01 12:00:00");
    add(&db, "web-2", "ERR", "2024-03-01 12:00:01");
    add(&db, "db-1", "WARN", "2024-03-01 12:00:02");

    let output = run(&db, &["query", "--type", "^ERR$", "--latest", "--limit", "1"]);
    assert!(output.status.success());
    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["host"], "web-2");

    let output = run(&db, &["query", "--host", "^web-"]);
    assert_eq!(stdout(&output).lines().count(), 2);

    let output = run(&db, &["query", "--host", "("]);
    assert!(!output.status.success());
}

#[test]
fn test_update_status_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("logs.db");
    let id = add(&db, "h1", "ERR", "2024-03-01T12:00:00Z").to_string();

    let output = run(&db, &["update-status", &id, "DONE"]);
    assert!(output.status.success());

    let output = run(&db, &["query", "--status", "DONE"]);
    assert_eq!(stdout(&output).lines().count(), 1);

    let output = run(&db, &["remove", &id]);
    assert!(output.status.success());

    let output = run(&db, &["remove", &id]);
    assert!(!output.status.success());
}

#[test]
fn test_config_file_supplies_database() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("from-config.db");
    let config = temp_dir.path().join("adamsdb.toml");
    std::fs::write(
        &config,
        format!(
            "[database]\nurl = \"sqlite://{}\"\n\n[logging]\nprofile = \"production\"\n",
            db.display()
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_adamsdb"))
        .env_remove("ADAMSDB_DB")
        .env("RUST_LOG", "off")
        .arg("--config")
        .arg(&config)
        .arg("init")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(db.exists());
}
