mod config_io_tests;
mod config_validator_tests;
mod session_tests;

use sequence_transform_core::{Trie, TrieBuilder, code};

use crate::{Session, SimulatedOutput, config::Config, dictionary::builtin_dictionary};

pub(crate) const KEY_GAP_MS: u64 = 10;

pub(crate) fn trie_of(rules: &[(&str, &str, u8)]) -> Trie {
    let mut builder = TrieBuilder::new();
    for &(sequence, completion, deletions) in rules {
        builder.add(sequence, completion, deletions).unwrap();
    }
    builder.build().unwrap()
}

/// Session whose simulated screen starts with the boundary the history
/// starts with, so both read the same.
pub(crate) fn session_with(trie: Trie, config: Config) -> Session<SimulatedOutput> {
    Session::new(config, trie, SimulatedOutput::with_text(" "))
}

pub(crate) fn builtin_session() -> Session<SimulatedOutput> {
    session_with(builtin_dictionary().unwrap(), Config::default())
}

/// Types `text` one key every [`KEY_GAP_MS`], advancing `now_ms`.
pub(crate) fn type_str(session: &mut Session<SimulatedOutput>, text: &str, now_ms: &mut u64) {
    for key in code::encode_str(text).unwrap() {
        *now_ms += KEY_GAP_MS;
        session.process_key(key, *now_ms);
    }
}
