use std::path::PathBuf;

use serde::Deserialize;

use super::Config;

/// On-disk shape of [`Config`] before validation. Missing fields take their
/// defaults so older files keep loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub buffer_capacity: usize,
    pub idle_timeout_ms: u64,
    pub match_output: bool,
    pub enhanced_backspace: bool,
    pub report_missed_rules: bool,
    pub rule_search_max_window: usize,
    pub rule_search_max_skip: usize,
    pub dictionary_path: Option<PathBuf>,
}

impl Default for RawConfig {
    fn default() -> Self {
        let cfg = Config::default();
        Self {
            buffer_capacity: cfg.buffer_capacity,
            idle_timeout_ms: cfg.idle_timeout_ms,
            match_output: cfg.match_output,
            enhanced_backspace: cfg.enhanced_backspace,
            report_missed_rules: cfg.report_missed_rules,
            rule_search_max_window: cfg.rule_search_max_window,
            rule_search_max_skip: cfg.rule_search_max_skip,
            dictionary_path: cfg.dictionary_path,
        }
    }
}
