use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn decode_classifies_a_connection_open_request() {
    Command::cargo_bin("sysex-conf")
        .unwrap()
        .args(["decode", "f0005343000001f7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ConnOpen"));
}

#[test]
fn decode_rejects_a_foreign_frame() {
    Command::cargo_bin("sysex-conf")
        .unwrap()
        .args(["decode", "f000206b000001f7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("manufacturer id"));
}

#[test]
fn demo_round_trips_a_connection_open() {
    Command::cargo_bin("sysex-conf")
        .unwrap()
        .args(["demo", "f0005343000001f7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<- f00053430100f7"))
        .stdout(predicate::str::contains("connection open: true"));
}
