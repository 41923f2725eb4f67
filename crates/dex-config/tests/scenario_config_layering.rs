use dex_config::{
    load_layered_yaml, load_layered_yaml_from_strings, report_unused_keys, ConfigConsumer,
    UnusedKeyPolicy,
};

const BASE_YAML: &str = r#"
upstream:
  base_url: "https://pokeapi.co/api/v2"
  timeout_secs: 10
sync:
  bootstrap_target: 300
  batch_size: 50
  batch_delay_ms: 500
catalog:
  language: "es"
store:
  database_url_env: "DEX_DATABASE_URL"
"#;

const BASE_YAML_REORDERED: &str = r#"
store:
  database_url_env: "DEX_DATABASE_URL"
catalog:
  language: "es"
sync:
  batch_delay_ms: 500
  batch_size: 50
  bootstrap_target: 300
upstream:
  timeout_secs: 10
  base_url: "https://pokeapi.co/api/v2"
"#;

const OVERLAY_YAML: &str = r#"
sync:
  bootstrap_target: 20
  batch_delay_ms: 0
"#;

#[test]
fn hash_is_stable_across_key_order() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn later_layer_overrides_earlier_key_by_key() {
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let app = merged.app().unwrap();

    assert_eq!(app.sync.bootstrap_target, 20);
    assert_eq!(app.sync.batch_delay_ms, 0);
    // Untouched sibling survives the merge.
    assert_eq!(app.sync.batch_size, 50);
    assert_eq!(app.upstream.timeout_secs, 10);

    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_ne!(merged.config_hash, base.config_hash);
}

#[test]
fn secret_literal_is_rejected_without_echoing_it() {
    let yaml = r#"
store:
  database_url_env: "postgres://dex:hunter2@db:5432/dex"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err().to_string();
    assert!(err.contains("CONFIG_SECRET_DETECTED"));
    assert!(err.contains("/store/database_url_env"));
    assert!(!err.contains("hunter2"));
}

#[test]
fn unused_keys_warn_or_fail() {
    let yaml = r#"
sync:
  batch_size: 10
daemon:
  addr: "127.0.0.1:9000"
legacy:
  poll_seconds: 5
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let daemon = report_unused_keys(
        ConfigConsumer::Daemon,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )
    .unwrap();
    assert_eq!(daemon.unused_leaf_pointers, vec!["/legacy/poll_seconds"]);

    // The CLI never reads /daemon.
    let cli = report_unused_keys(ConfigConsumer::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)
        .unwrap();
    assert_eq!(
        cli.unused_leaf_pointers,
        vec!["/daemon/addr", "/legacy/poll_seconds"]
    );

    let err = report_unused_keys(ConfigConsumer::Cli, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn layered_files_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&local, OVERLAY_YAML).unwrap();

    let loaded = load_layered_yaml(&[base.to_str().unwrap(), local.to_str().unwrap()]).unwrap();
    assert_eq!(loaded.app().unwrap().sync.bootstrap_target, 20);

    let missing = dir.path().join("nope.yaml");
    assert!(load_layered_yaml(&[missing.to_str().unwrap()]).is_err());
}

#[test]
fn shipped_base_config_is_clean_for_daemon() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/base.yaml");
    let loaded = load_layered_yaml(&[path]).unwrap();
    let report = report_unused_keys(
        ConfigConsumer::Daemon,
        &loaded.config_json,
        UnusedKeyPolicy::Fail,
    )
    .unwrap();
    assert!(report.is_clean());
    assert_eq!(loaded.app().unwrap().daemon.addr, "127.0.0.1:8899");
}
