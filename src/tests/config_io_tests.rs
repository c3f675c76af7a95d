use std::{
    fs,
    path::PathBuf,
    sync::{Mutex, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::config::{self, CONFIG_DIR_ENV, Config};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sequence-transform-tests-{prefix}-{ts}"))
}

fn restore_config_dir(old: Option<std::ffi::OsString>) {
    match old {
        Some(v) => unsafe { std::env::set_var(CONFIG_DIR_ENV, v) },
        None => unsafe { std::env::remove_var(CONFIG_DIR_ENV) },
    }
}

/// Points the config directory at a fresh temp dir for the duration of `f`.
fn with_config_dir(prefix: &str, f: impl FnOnce(&PathBuf)) {
    let _g = lock_env();

    let old = std::env::var_os(CONFIG_DIR_ENV);
    let dir = unique_temp_dir(prefix);
    fs::create_dir_all(&dir).unwrap();
    unsafe { std::env::set_var(CONFIG_DIR_ENV, &dir) };

    f(&dir);

    restore_config_dir(old);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn config_path_honours_override_dir() {
    with_config_dir("path", |dir| {
        assert_eq!(config::config_path().unwrap(), dir.join("config.toml"));
    });
}

#[test]
fn config_save_and_load_roundtrip() {
    with_config_dir("roundtrip", |_| {
        let cfg = Config {
            buffer_capacity: 128,
            idle_timeout_ms: 750,
            match_output: false,
            dictionary_path: Some(PathBuf::from("/tmp/rules.stri")),
            ..Default::default()
        };

        config::save(&cfg).unwrap();
        let loaded = config::load().unwrap();

        assert_eq!(loaded, cfg);
    });
}

#[test]
fn config_load_creates_default_file() {
    with_config_dir("default", |dir| {
        let loaded = config::load().unwrap();
        assert_eq!(loaded, Config::default());
        assert!(dir.join("config.toml").exists());
    });
}

#[test]
fn config_load_fills_missing_fields_with_defaults() {
    with_config_dir("partial", |dir| {
        fs::write(dir.join("config.toml"), "idle_timeout_ms = 250\n").unwrap();

        let loaded = config::load().unwrap();
        assert_eq!(loaded.idle_timeout_ms, 250);
        assert_eq!(loaded.buffer_capacity, Config::default().buffer_capacity);
        assert!(loaded.enhanced_backspace);
    });
}

#[test]
fn config_load_rejects_invalid_values() {
    with_config_dir("invalid-load", |dir| {
        fs::write(dir.join("config.toml"), "rule_search_max_skip = 0\n").unwrap();

        assert!(config::load().is_err());
    });
}

#[test]
fn config_save_rejects_invalid_values() {
    with_config_dir("invalid-save", |dir| {
        let cfg = Config {
            buffer_capacity: 1,
            ..Default::default()
        };

        let err = config::save(&cfg).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("buffer_capacity"));
        assert!(!dir.join("config.toml").exists());
    });
}
