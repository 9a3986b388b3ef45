#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shiftclock-cli").unwrap();
    cmd.arg("--settings")
        .arg(dir.join("settings.json"))
        .arg("--holidays")
        .arg(dir.join("holidays.json"));
    cmd
}

fn setup_four_three(dir: &Path) {
    cli(dir)
        .args([
            "set-rotation",
            "--identity",
            "four-three",
            "--base-date",
            "2024-06-01",
            "--base-index",
            "0",
        ])
        .assert()
        .success();
    cli(dir)
        .args(["set-timezone", "--tz", "UTC"])
        .assert()
        .success();
}

#[test]
fn shift_of_a_date() {
    let dir = tempdir().unwrap();
    setup_four_three(dir.path());
    cli(dir.path())
        .args(["shift", "--date", "2024-06-07"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-06-07 night"));
}

#[test]
fn next_night_alarm() {
    let dir = tempdir().unwrap();
    setup_four_three(dir.path());
    cli(dir.path())
        .args(["--now", "2024-06-07T23:00:00Z", "next-alarm", "--shift", "night"])
        .assert()
        .success()
        .stdout(predicate::str::contains("night 2024-06-14T22:00:00+00:00"));
}

#[test]
fn fallback_exits_with_warning_code() {
    let dir = tempdir().unwrap();
    setup_four_three(dir.path());
    cli(dir.path())
        .args([
            "--now",
            "2024-06-06T10:00:00Z",
            "next-alarm",
            "--shift",
            "day",
            "--time",
            "07:00",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("day 2024-06-07T07:00:00+00:00"));
}

#[test]
fn invalid_alarm_time_is_rejected() {
    let dir = tempdir().unwrap();
    cli(dir.path())
        .args(["set-alarm", "--shift", "night", "--time", "22h"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid local time"));
}

#[test]
fn imported_holiday_shows_in_month() {
    let dir = tempdir().unwrap();
    setup_four_three(dir.path());
    let csv = dir.path().join("h.csv");
    fs::write(&csv, "date,name,is_rest_day\n2024-06-07,Férié,true\n").unwrap();
    cli(dir.path())
        .args(["import-holidays", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 holiday(s) imported"));

    cli(dir.path())
        .args(["month", "--year", "2024", "--month", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-06-07 Fri off (Férié, chômé)"))
        .stdout(predicate::str::contains("2024-06-30 Sun"));
}

#[test]
fn unknown_rotation_on_command_line_fails() {
    let dir = tempdir().unwrap();
    cli(dir.path())
        .args(["set-rotation", "--identity", "weekly", "--base-date", "2024-06-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown rotation"));
}
