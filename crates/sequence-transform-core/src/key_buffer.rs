use std::{collections::VecDeque, fmt};

use crate::{
    code::{self, Code},
    trie::TrieOffset,
};

/// One historical keystroke and the rule (if any) it fired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyAction {
    pub code: Code,
    /// Offset of the trie match node that fired when this key was typed.
    pub action_taken: Option<TrieOffset>,
}

impl KeyAction {
    #[must_use]
    pub const fn plain(code: Code) -> Self {
        Self {
            code,
            action_taken: None,
        }
    }
}

/// Fixed-capacity log of keystrokes, addressed most recent first.
///
/// The buffer is never empty: after a reset it holds a single boundary
/// entry, so a match at the start of the history sees a word break.
#[derive(Clone, Debug)]
pub struct KeyBuffer {
    cap: usize,
    buf: VecDeque<KeyAction>,
}

impl KeyBuffer {
    /// `capacity` is clamped to at least 2 so a key always fits next to the
    /// boundary.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(2);
        let mut buf = VecDeque::with_capacity(cap);
        buf.push_back(KeyAction::plain(code::BOUNDARY));
        Self { cap, buf }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn push(&mut self, code: Code) {
        while self.buf.len() >= self.cap {
            let _ = self.buf.pop_front();
        }
        self.buf.push_back(KeyAction::plain(code::to_lower(code)));
    }

    /// Removes the `n` most recent keys. Popping everything resets.
    pub fn pop(&mut self, n: usize) {
        if n >= self.buf.len() {
            self.reset();
            return;
        }
        self.buf.truncate(self.buf.len() - n);
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.buf.push_back(KeyAction::plain(code::BOUNDARY));
    }

    /// `index >= 0` is the `index`-th most recent key; a negative index
    /// counts from the oldest (`-1` is the oldest).
    #[must_use]
    pub fn get(&self, index: isize) -> Option<KeyAction> {
        let pos = if index >= 0 {
            let back = index.unsigned_abs();
            self.buf.len().checked_sub(back + 1)?
        } else {
            index.unsigned_abs() - 1
        };
        self.buf.get(pos).copied()
    }

    /// Same as `get` for non-negative indices.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<KeyAction> {
        let pos = self.buf.len().checked_sub(index.checked_add(1)?)?;
        self.buf.get(pos).copied()
    }

    /// Records that the key at `index` fired the match node at `offset`.
    /// Returns `false` if there is no such key.
    pub fn set_action(&mut self, index: usize, offset: TrieOffset) -> bool {
        let Some(pos) = self
            .buf
            .len()
            .checked_sub(index.saturating_add(1))
        else {
            return false;
        };
        let Some(slot) = self.buf.get_mut(pos) else {
            return false;
        };
        slot.action_taken = Some(offset);
        true
    }

    /// Drops the annotation at `index`, turning it back into a plain key.
    pub fn clear_action(&mut self, index: usize) -> bool {
        let Some(pos) = self.buf.len().checked_sub(index.saturating_add(1)) else {
            return false;
        };
        self.buf
            .get_mut(pos)
            .is_some_and(|slot| slot.action_taken.take().is_some())
    }
}

/// Raw keys oldest first, for logs.
impl fmt::Display for KeyBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.buf {
            write!(f, "{}", code::to_char(key.code))?;
        }
        Ok(())
    }
}
