use std::path::PathBuf;

use crate::config::{Config, find_config_problems};

#[test]
fn default_config_is_valid() {
    assert!(find_config_problems(&Config::default()).is_none());
    assert!(Config::default().validate().is_ok());
}

#[test]
fn buffer_capacity_bounds() {
    for capacity in [0, 1, 1025] {
        let cfg = Config {
            buffer_capacity: capacity,
            ..Default::default()
        };
        let error = find_config_problems(&cfg).unwrap();
        assert!(error.contains("buffer_capacity"), "{capacity}: {error}");
    }

    for capacity in [2, 64, 1024] {
        let cfg = Config {
            buffer_capacity: capacity,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }
}

#[test]
fn search_window_bounds() {
    let cfg = Config {
        rule_search_max_window: 0,
        ..Default::default()
    };
    assert!(find_config_problems(&cfg).unwrap().contains("at least 1"));

    let cfg = Config {
        rule_search_max_window: 256,
        ..Default::default()
    };
    assert!(find_config_problems(&cfg).unwrap().contains("must not exceed 255"));
}

#[test]
fn search_skip_bounds() {
    for skip in [0, 17] {
        let cfg = Config {
            rule_search_max_skip: skip,
            ..Default::default()
        };
        assert!(
            find_config_problems(&cfg)
                .unwrap()
                .contains("rule_search_max_skip")
        );
    }
}

#[test]
fn empty_dictionary_path_is_rejected() {
    let cfg = Config {
        dictionary_path: Some(PathBuf::new()),
        ..Default::default()
    };
    assert!(find_config_problems(&cfg).unwrap().contains("dictionary_path"));
}

#[test]
fn error_message_lists_every_problem() {
    let cfg = Config {
        buffer_capacity: 0,
        rule_search_max_window: 0,
        rule_search_max_skip: 0,
        ..Default::default()
    };

    let error = cfg.validate().unwrap_err();
    assert!(error.starts_with("Invalid configuration:"));
    assert_eq!(error.matches('•').count(), 3);
    assert!(error.ends_with("Fix the values above and reload."));
}
