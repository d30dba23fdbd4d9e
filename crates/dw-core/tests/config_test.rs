use dw_core::config::Config;

#[test]
fn default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.watch.interval_secs, 5);
    assert!(!cfg.watch.mute);
    assert!(cfg.motd.path.is_none());
    assert!(cfg.motd.format.is_none());
    assert!(!cfg.motd.fresh_only);
}

#[test]
fn config_roundtrip() {
    let mut cfg = Config::default();
    cfg.watch.interval_secs = 12;
    cfg.watch.mute = true;
    cfg.motd.path = Some("/tmp/motds.csv".into());

    let text = toml::to_string_pretty(&cfg).expect("serialize to toml");
    let parsed: Config = toml::from_str(&text).expect("parse toml back");
    assert_eq!(parsed.watch.interval_secs, 12);
    assert!(parsed.watch.mute);
    assert_eq!(parsed.motd.path.as_deref(), Some("/tmp/motds.csv"));
}

#[test]
fn config_partial_toml() {
    let partial = r#"
[watch]
mute = true
"#;
    let cfg: Config = toml::from_str(partial).expect("parse partial");
    assert!(cfg.watch.mute);
    // defaults should fill in the rest
    assert_eq!(cfg.watch.interval_secs, 5);
    assert!(!cfg.motd.fresh_only);
}

#[test]
fn load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[watch]
interval_secs = 2

[motd]
fresh_only = true
"#,
    )
    .unwrap();

    let cfg = Config::load_from(&path).expect("load from disk");
    assert_eq!(cfg.watch.interval_secs, 2);
    assert!(cfg.motd.fresh_only);

    assert!(Config::load_from(dir.path().join("missing.toml")).is_err());
}
