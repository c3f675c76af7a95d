use std::fmt;

use crate::code::{self, Code};

/// Deepest trie descent the rule search will follow.
pub const KEY_STACK_CAPACITY: usize = 64;

/// Small bounded LIFO of codes used as scratch space by the rule search.
#[derive(Clone, Debug)]
pub struct KeyStack {
    codes: [Code; KEY_STACK_CAPACITY],
    len: usize,
}

impl Default for KeyStack {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStack {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            codes: [code::NONE; KEY_STACK_CAPACITY],
            len: 0,
        }
    }

    /// Returns `false` when the stack is full; the code is not stored.
    pub fn push(&mut self, code: Code) -> bool {
        let Some(slot) = self.codes.get_mut(self.len) else {
            return false;
        };
        *slot = code;
        self.len += 1;
        true
    }

    pub fn pop(&mut self) -> Option<Code> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.codes[self.len])
    }

    /// Drops everything above `len`.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Code at `depth`, counted from the bottom (first pushed).
    #[must_use]
    pub fn get(&self, depth: usize) -> Option<Code> {
        self.as_slice().get(depth).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Code] {
        &self.codes[..self.len]
    }

    /// Compares the contents, bottom first, with `codes`.
    #[must_use]
    pub fn compare(&self, codes: &[Code]) -> bool {
        self.as_slice() == codes
    }
}

/// Renders the stack top first. A trie descent pushes the newest key first,
/// so this yields the keys in typing order.
impl fmt::Display for KeyStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in self.as_slice().iter().rev() {
            write!(f, "{}", code::to_char(c))?;
        }
        Ok(())
    }
}
