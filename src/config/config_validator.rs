use std::fmt::Write as _;

use sequence_transform_core::trie::builder::MAX_DELETIONS;

use crate::config::Config;

pub const MIN_BUFFER_CAPACITY: usize = 2;
pub const MAX_BUFFER_CAPACITY: usize = 1024;
/// Completions are at most this long, so a wider window never matches.
pub const MAX_SEARCH_WINDOW: usize = u8::MAX as usize;

pub fn find_config_problems(config: &Config) -> Option<String> {
    let mut problems: Vec<String> = Vec::new();

    if !(MIN_BUFFER_CAPACITY..=MAX_BUFFER_CAPACITY).contains(&config.buffer_capacity) {
        problems.push(format!(
            "buffer_capacity must be between {MIN_BUFFER_CAPACITY} and {MAX_BUFFER_CAPACITY}, got {}",
            config.buffer_capacity
        ));
    }

    if config.rule_search_max_window == 0 {
        problems.push("rule_search_max_window must be at least 1".to_string());
    } else if config.rule_search_max_window > MAX_SEARCH_WINDOW {
        problems.push(format!(
            "rule_search_max_window must not exceed {MAX_SEARCH_WINDOW}, got {}",
            config.rule_search_max_window
        ));
    }

    let max_skip = usize::from(MAX_DELETIONS) + 1;
    if !(1..=max_skip).contains(&config.rule_search_max_skip) {
        problems.push(format!(
            "rule_search_max_skip must be between 1 and {max_skip}, got {}",
            config.rule_search_max_skip
        ));
    }

    if config
        .dictionary_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        problems.push("dictionary_path must not be empty when set".to_string());
    }

    if problems.is_empty() {
        return None;
    }

    let mut error = String::from("Invalid configuration:\n\n");
    for problem in &problems {
        // `String` implements `fmt::Write` infallibly.
        let _ = writeln!(error, "• {problem}");
    }
    error.push_str("\nFix the values above and reload.");
    Some(error)
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        match find_config_problems(self) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
