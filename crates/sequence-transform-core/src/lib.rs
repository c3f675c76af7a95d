//! Keystroke-sequence transformation engine.
//!
//! A [`KeyBuffer`] logs typed keys; a [`Trie`] holds the compiled rules; a
//! [`Cursor`] walks the history either as typed or as the text currently on
//! screen. [`find_best_match`] picks the rule to fire for the newest key and
//! [`search_missed_rule`] explains already typed text with a rule the user
//! could have used instead.

pub mod code;
pub mod cursor;
pub mod key_buffer;
pub mod key_stack;
pub mod matcher;
pub mod rule_search;
pub mod trie;

pub use code::{Code, FunctionCode};
pub use cursor::{Cursor, CursorPos};
pub use key_buffer::{KeyAction, KeyBuffer};
pub use key_stack::KeyStack;
pub use matcher::{Match, find_best_match, find_longest_match};
pub use rule_search::{MissedRule, SearchLimits, search_missed_rule};
pub use trie::{
    Node, Payload, Trie, TrieError, TrieOffset,
    builder::{BuildError, Rule, TrieBuilder},
};

#[cfg(test)]
mod tests;
