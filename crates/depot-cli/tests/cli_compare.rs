use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn depot_cmd() -> Command {
    Command::cargo_bin("depot").unwrap()
}

#[test]
fn test_compare_prints_ordering() {
    depot_cmd()
        .args(["compare", "1.8.1", "1.10.0"])
        .assert()
        .success()
        .stdout("-1\n");

    depot_cmd()
        .args(["compare", "2.0", "2"])
        .assert()
        .success()
        .stdout("0\n");

    depot_cmd()
        .args(["compare", "1.0", "1.0-SNAPSHOT"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_compare_requires_two_versions() {
    depot_cmd()
        .args(["compare", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<B>"));
}
