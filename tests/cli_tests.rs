#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::fs;
use tempfile::{TempDir, tempdir};

struct Session {
    dir: TempDir,
}

impl Session {
    fn new() -> Self {
        Self {
            dir: tempdir().expect("create temp dir"),
        }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    #[allow(deprecated)]
    fn run(&self, script: &str) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("cli").expect("cli binary");
        cmd.env_remove("GANTT_CONFIG")
            .env("GANTT_DATA", self.path("tasks.json"))
            .env("GANTT_HOLIDAYS", self.path("holidays.json"))
            .write_stdin(script.to_string())
            .assert()
    }
}

#[test]
fn cli_starts_with_sample_rows() {
    Session::new()
        .run("show\nquit\n")
        .success()
        .stdout(str_contains("Requirements"))
        .stdout(str_contains("Basic design"))
        .stdout(str_contains("2025/08/20"));
}

#[test]
fn cli_set_duration_recomputes_end_date() {
    Session::new()
        .run("set 2 duration 3\nquit\n")
        .success()
        .stdout(str_contains("Task 2: start 2025/08/20 end 2025/08/22 days 3."));
}

#[test]
fn cli_reports_invalid_dates() {
    Session::new()
        .run("set 2 startDate 2025/8/1\nquit\n")
        .success()
        .stdout(str_contains("Error: startDate expects a date"));
}

#[test]
fn cli_uses_holiday_file() {
    let session = Session::new();
    fs::write(
        session.path("holidays.json"),
        r#"{"holidays": [{"date": "2025-08-21", "name": "Company holiday"}]}"#,
    )
    .unwrap();
    session
        .run("holidays\nset 2 endDate 2025/08/25\nquit\n")
        .success()
        .stdout(str_contains("1 holidays loaded."))
        .stdout(str_contains("2025/08/21 Company holiday"))
        .stdout(str_contains("days 3."));
}

#[test]
fn cli_delete_command_removes_task() {
    Session::new()
        .run("delete 3\ndelete 3\nquit\n")
        .success()
        .stdout(str_contains("Deleted task 3."))
        .stdout(str_contains("Task 3 not found."));
}

#[test]
fn cli_selection_and_removal() {
    Session::new()
        .run("select 2\nselect 3\nremove-selected\nquit\n")
        .success()
        .stdout(str_contains("Selected task 3."))
        .stdout(str_contains("Removed 2 rows."));
}

#[test]
fn cli_moves_rows_and_drags_bars() {
    Session::new()
        .run("move 5,4 0\nbar 2 planned move 1\nbar 2 progress move 1\nquit\n")
        .success()
        .stdout(str_contains("Moved 2 rows."))
        .stdout(str_contains(
            "Task 2: planned bar now 2025/08/21 - 2025/08/26 (4 business days).",
        ))
        .stdout(str_contains("cannot be dragged"));
}

#[test]
fn cli_shows_display_range() {
    Session::new()
        .run("range\nquit\n")
        .success()
        .stdout(str_contains("Range 2025/08/13 - 2025/10/05 (54 days)."));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let session = Session::new();
    let path = session.path("saved.json");
    let script = format!("theme Persisted\nsave json {path}\ntheme Scratch\nload json {path}\nshow\nquit\n");
    let assert = session.run(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Loaded 6 rows from"));
    let after_reload = output.split("Loaded 6 rows from").last().unwrap_or_default();
    assert!(after_reload.contains("Persisted"));
    assert!(
        !after_reload.contains("Scratch"),
        "scratch row should not appear after reload:\n{after_reload}"
    );
}

#[test]
fn cli_saves_to_configured_data_path() {
    let session = Session::new();
    session
        .run("task Deploy Kato\nsave json\nquit\n")
        .success()
        .stdout(str_contains("Saved 6 rows to"));

    session
        .run("show\nquit\n")
        .success()
        .stdout(str_contains("Deploy"))
        .stdout(str_contains("Kato"));
}

#[test]
fn cli_exports_csv() {
    let session = Session::new();
    let path = session.path("rows.csv");
    session
        .run(&format!("export-csv {path}\nquit\n"))
        .success()
        .stdout(str_contains("Exported 5 rows"));
    let csv = fs::read_to_string(&path).unwrap();
    assert!(csv.starts_with("id,type,themeName"));
    assert!(csv.contains("Research"));
}
