use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::Utc;
use predicates::prelude::*;
use tempfile::TempDir;

const REPORT: &str = "Паков 120\nВес 350\nПакетосварка 12\nФлекса 5\nЭкструзия\nмягкие 3\nтвердые 2";

/// Temp workspace with a config file pointing the data dir inside it.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    let data_dir = dir.path().join("data");
    fs::write(
        &config,
        serde_json::json!({
            "buffer": { "commit_delay_secs": 120 },
            "storage": { "data_dir": data_dir },
        })
        .to_string(),
    )
    .unwrap();
    (dir, config)
}

fn shiftrep(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shiftrep").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

fn text_event(id: i64, text: &str, timestamp: &str) -> String {
    serde_json::json!({
        "type": "text",
        "id": id,
        "author": "Иван",
        "text": text,
        "timestamp": timestamp,
    })
    .to_string()
}

#[test]
fn test_parse_sample_report() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .args(["parse", REPORT])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"accepted\""))
        .stdout(predicate::str::contains("\"total_waste\": \"22\""));
}

#[test]
fn test_parse_text_format_from_stdin() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .args(["parse", "--format", "text", "--author", "Иван"])
        .write_stdin(REPORT)
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ Принято от Иван:"))
        .stdout(predicate::str::contains("♻️ Итого отходов: 22"));
}

#[test]
fn test_parse_rejects_chatter() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .args(["parse", "--format", "text", "Сегодня на смене 3 человека"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not a report"));
}

#[test]
fn test_replay_writes_period_file() {
    let (dir, config) = workspace();
    let events = dir.path().join("events.jsonl");
    let edited = REPORT.replace("Вес 350", "Вес 360");
    fs::write(
        &events,
        [
            text_event(1, REPORT, "2024-05-01T08:00:00Z"),
            serde_json::json!({
                "type": "edited",
                "id": 1,
                "text": edited,
                "timestamp": "2024-05-01T08:01:30Z",
            })
            .to_string(),
            text_event(2, "всем привет", "2024-05-01T08:02:00Z"),
        ]
        .join("\n"),
    )
    .unwrap();

    shiftrep(&config)
        .arg("replay")
        .arg(&events)
        .arg("--stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 committed"))
        .stdout(predicate::str::contains("Иван:"));

    let csv = fs::read_to_string(dir.path().join("data").join("2024-05.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Дата,Имя,Паков,Вес,Пакетосварка,Флекса,Экструзия,Итого");
    assert_eq!(lines[1], "2024-05-01 08:00,Иван,120,360,12,5,5,22");
}

#[test]
fn test_replay_dry_run_writes_nothing() {
    let (dir, config) = workspace();
    let events = dir.path().join("events.jsonl");
    fs::write(&events, text_event(1, REPORT, "2024-05-01T08:00:00Z")).unwrap();

    shiftrep(&config)
        .arg("replay")
        .arg(&events)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!dir.path().join("data").exists());
}

#[test]
fn test_replay_reports_bad_line() {
    let (dir, config) = workspace();
    let events = dir.path().join("events.jsonl");
    fs::write(&events, "{\"type\":\"text\"}\n").unwrap();

    shiftrep(&config)
        .arg("replay")
        .arg(&events)
        .assert()
        .failure()
        .stderr(predicate::str::contains("events.jsonl:1"));
}

#[test]
fn test_import_then_stats_and_export() {
    let (dir, config) = workspace();
    let now = Utc::now().format("%Y-%m-%d %H:%M").to_string();
    let input = dir.path().join("import.csv");
    fs::write(
        &input,
        format!(
            "Дата,Имя,Паков,Вес,Пакетосварка,Флекса,Экструзия,Итого\n\
             {now},Пётр,100,200,1,2,3,6\n"
        ),
    )
    .unwrap();

    shiftrep(&config)
        .arg("import")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 rows"));

    shiftrep(&config)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Пётр:"))
        .stdout(predicate::str::contains("🗓 Смен: 1"));

    let period = Utc::now().format("%Y-%m").to_string();
    shiftrep(&config)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{period}.csv")));

    let copy = dir.path().join("out").join("export.csv");
    shiftrep(&config)
        .args(["export", "--output"])
        .arg(&copy)
        .assert()
        .success();
    assert!(fs::read_to_string(&copy).unwrap().contains("Пётр"));
}

#[test]
fn test_stats_empty() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("📊 Статистика пуста."));
}

#[test]
fn test_reset_requires_confirmation() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    shiftrep(&config).args(["reset", "--yes"]).assert().success();
}

#[test]
fn test_config_get_and_set() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .args(["config", "get", "buffer.commit_delay_secs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("120"));

    shiftrep(&config)
        .args(["config", "set", "parser.min_fields", "4"])
        .assert()
        .success();

    shiftrep(&config)
        .args(["config", "get", "parser.min_fields"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4"));

    shiftrep(&config)
        .args(["config", "get", "parser.nope"])
        .assert()
        .failure();
}

#[test]
fn test_out_of_range_delay_is_rejected() {
    let (_dir, config) = workspace();

    shiftrep(&config)
        .args(["config", "set", "buffer.commit_delay_secs", "10000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("commit_delay_secs"));

    shiftrep(&config)
        .args(["config", "get", "buffer.commit_delay_secs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("120"));

    shiftrep(&config)
        .args(["watch", "--delay", "10000000000000000"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("commit_delay_secs"));
}
