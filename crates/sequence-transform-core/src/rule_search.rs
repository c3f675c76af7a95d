//! Missed-rule discovery.
//!
//! Given text typed without a shortcut, find the rule that would have
//! produced it. A rule `(sequence, completion, deletions)` leaves the screen
//! as `sequence[..len - 1 - deletions] + completion`, so in the reversed trie
//! the first `1 + deletions` levels (trigger and deleted keys) are never
//! compared with the text. Those are the skip levels. Every deeper level must
//! equal the visible text that precedes the completion.

use crate::{
    code::{self, Code},
    cursor::Cursor,
    key_buffer::KeyBuffer,
    key_stack::{KEY_STACK_CAPACITY, KeyStack},
    trie::{Node, Payload, Trie},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissedRule {
    /// Keys to type, in typing order.
    pub sequence: String,
    pub completion: String,
    pub payload: Payload,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchLimits {
    /// Longest completion considered.
    pub max_window: usize,
    /// Upper bound for skip levels, on top of the dictionary's own.
    pub max_skip_levels: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_window: 32,
            max_skip_levels: 16,
        }
    }
}

struct RuleSearch<'a> {
    trie: &'a Trie,
    /// Visible text, newest first.
    visible: &'a [Code],
    /// Completion length being tested; the compared text starts here.
    search_end: usize,
    skip_levels: usize,
    max_found_length: usize,
    stack: KeyStack,
    best: Option<MissedRule>,
}

/// Searches the visible text that ends `history_offset` keys back for the
/// rule that explains its tail. Longer sequences win; among equal lengths
/// the first one found (shortest completion, fewest deletions, trie order)
/// is kept.
#[must_use]
pub fn search_missed_rule(
    buffer: &KeyBuffer,
    trie: &Trie,
    history_offset: usize,
    limits: SearchLimits,
) -> Option<MissedRule> {
    let mut cursor = Cursor::new(buffer, trie);
    if !cursor.init(history_offset, true) {
        return None;
    }
    let visible = cursor.read_to_end(limits.max_window + KEY_STACK_CAPACITY);

    let max_window = limits.max_window.min(visible.len());
    let max_skip = (usize::from(trie.max_deletions()) + 1)
        .min(limits.max_skip_levels)
        .max(1);

    let mut search = RuleSearch {
        trie,
        visible: &visible,
        search_end: 0,
        skip_levels: 0,
        max_found_length: 0,
        stack: KeyStack::new(),
        best: None,
    };

    for search_end in 1..=max_window {
        for skip_levels in 1..=max_skip {
            search.search_end = search_end;
            search.skip_levels = skip_levels;
            search.stack.reset();
            search.descend(0);
        }
    }

    if let Some(found) = &search.best {
        tracing::debug!(
            sequence = %found.sequence,
            completion = %found.completion,
            "missed rule found"
        );
    }
    search.best
}

impl RuleSearch<'_> {
    fn descend(&mut self, offset: usize) {
        let trie = self.trie;
        let Some(node) = trie.decode(offset) else {
            return;
        };
        match node {
            Node::Match { payload, branch } => {
                self.consider(payload);
                if let Some(next) = branch {
                    self.descend(next);
                }
            }
            Node::Chain { codes, next } => {
                let base = self.stack.len();
                if codes.iter().all(|&c| self.accepts(c) && self.stack.push(c)) {
                    self.descend(next);
                }
                self.stack.truncate(base);
            }
            Node::Branch(branch) => {
                for (c, child) in branch.entries() {
                    if self.accepts(c) && self.stack.push(c) {
                        self.descend(child);
                        self.stack.pop();
                    }
                }
            }
        }
    }

    /// Whether `c` may be pushed at the current depth.
    fn accepts(&self, c: Code) -> bool {
        let level = self.stack.len();
        if level < self.skip_levels {
            return true;
        }
        self.visible.get(self.search_end + level - self.skip_levels) == Some(&c)
    }

    fn consider(&mut self, payload: Payload) {
        let depth = self.stack.len();
        let deletions = usize::from(payload.num_deletions);
        if deletions + 1 != self.skip_levels || depth < self.skip_levels {
            return;
        }
        if depth <= self.max_found_length {
            return;
        }
        // Deleted keys were on screen; a meta-symbol there never was.
        if self.stack.as_slice()[1..=deletions]
            .iter()
            .any(|&c| code::is_meta(c))
        {
            return;
        }
        if usize::from(payload.completion_len) != self.search_end {
            return;
        }
        let trie = self.trie;
        let Some(completion) = trie.completion(&payload) else {
            return;
        };

        let matches = completion.iter().enumerate().all(|(i, &c)| {
            let expected = match code::backref_distance(c) {
                Some(n) => self.backref(n, deletions),
                None => Some(c),
            };
            expected.is_some() && expected == self.visible.get(self.search_end - 1 - i).copied()
        });
        if !matches {
            return;
        }

        self.max_found_length = depth;
        let completion: Vec<Code> = self.visible[..self.search_end]
            .iter()
            .rev()
            .copied()
            .collect();
        self.best = Some(MissedRule {
            sequence: self.stack.to_string(),
            completion: code::decode_codes(&completion),
            payload,
        });
    }

    /// What a back-reference in a candidate completion would have read: a
    /// deleted key for `n <= deletions`, otherwise text before the sequence.
    fn backref(&self, n: u8, deletions: usize) -> Option<Code> {
        let n = usize::from(n);
        if n <= deletions {
            return self.stack.get(n);
        }
        self.visible.get(self.search_end + n - 1 - deletions).copied()
    }
}
