use std::io::Write;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn dex() -> std::process::Command {
    let mut cmd = std::process::Command::cargo_bin("dex").expect("dex binary");
    cmd.env_remove("DEX_CONFIG")
        .env_remove(dex_db::ENV_DB_URL)
        .env("RUST_LOG", "error");
    cmd
}

fn yaml_file(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(body.as_bytes()).expect("write yaml");
    f
}

fn hash_line(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find(|l| l.starts_with("config_hash="))
        .map(str::to_string)
        .expect("config_hash line")
}

#[test]
fn help_lists_commands() {
    dex()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrap"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("upstream"))
        .stdout(predicate::str::contains("config-hash"));
}

#[test]
fn config_hash_ignores_key_order_and_layers() {
    let a = yaml_file("sync:\n  batch_size: 25\n  batch_delay_ms: 100\n");
    let b = yaml_file("sync:\n  batch_delay_ms: 100\n  batch_size: 25\n");

    let out_a = dex()
        .arg("config-hash")
        .arg(a.path())
        .output()
        .expect("run dex");
    let out_b = dex()
        .arg("config-hash")
        .arg(b.path())
        .output()
        .expect("run dex");
    assert!(out_a.status.success() && out_b.status.success());
    assert_eq!(hash_line(&out_a.stdout), hash_line(&out_b.stdout));

    let overlay = yaml_file("sync:\n  batch_size: 10\n");
    dex()
        .arg("config-hash")
        .arg(a.path())
        .arg(overlay.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"batch_size\":10"))
        .stdout(predicate::str::contains("\"batch_delay_ms\":100"));
}

#[test]
fn config_hash_rejects_secret_literal() {
    let f = yaml_file("store:\n  database_url_env: \"postgres://user:pw@db/catalog\"\n");
    dex()
        .arg("config-hash")
        .arg(f.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("pw@db").not());
}

#[test]
fn non_positive_limits_are_rejected_before_any_fetch() {
    dex()
        .args(["upstream", "list", "--limit", "0"])
        .assert()
        .failure()
        .code(2);
    dex()
        .args(["seed", "--limit", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn blank_entity_key_is_rejected() {
    dex().args(["import", "  "]).assert().failure().code(2);
}

#[test]
fn blank_or_unsafe_category_is_rejected() {
    for name in ["", "  ", "fi/re", "fire?x=1"] {
        dex()
            .args(["upstream", "category", name])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("invalid category"));
    }
}

#[test]
fn db_commands_require_database_url() {
    dex()
        .args(["db", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(dex_db::ENV_DB_URL));
}
