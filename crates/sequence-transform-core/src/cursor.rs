//! Traversal of the key history, newest to oldest.
//!
//! In raw mode the cursor yields the keys as typed. In output mode it yields
//! the virtual output: the text on screen once every fired rule has deleted
//! and inserted its characters. Annotated slots stand for their completion,
//! read from its last character backwards (`sub_index` 0 is the last one),
//! and deletions are netted against older output as the walk goes. A plain
//! token slot (a token that fired nothing) takes no room on screen and is
//! stepped over.

use crate::{
    code::{self, Code},
    key_buffer::KeyBuffer,
    trie::{Payload, Trie, TrieOffset},
};

/// Snapshot of a cursor's position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorPos {
    /// History slot, 0 is the newest key. Equal to the buffer length at end.
    pub index: usize,
    /// Character inside the slot's completion, counted from its end.
    pub sub_index: usize,
    /// Steps taken since the cursor was initialised.
    pub segment_len: usize,
    pub as_output: bool,
}

impl CursorPos {
    /// Orders positions by `(index, sub_index)`, index dominant.
    #[must_use]
    pub fn longer_than(&self, other: &CursorPos) -> bool {
        (self.index, self.sub_index) > (other.index, other.sub_index)
    }
}

#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    buffer: &'a KeyBuffer,
    trie: &'a Trie,
    pos: CursorPos,
    cache: Option<(TrieOffset, Payload)>,
}

impl<'a> Cursor<'a> {
    /// A raw-mode cursor on the newest key.
    #[must_use]
    pub fn new(buffer: &'a KeyBuffer, trie: &'a Trie) -> Self {
        Self {
            buffer,
            trie,
            pos: CursorPos::default(),
            cache: None,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &'a KeyBuffer {
        self.buffer
    }

    #[must_use]
    pub fn trie(&self) -> &'a Trie {
        self.trie
    }

    /// Positions the cursor `history_offset` keys back. In output mode the
    /// cursor moves on to the first visible character; `false` means there
    /// is none (everything older was deleted) and the cursor is at end.
    pub fn init(&mut self, history_offset: usize, as_output: bool) -> bool {
        self.pos = CursorPos {
            index: history_offset,
            sub_index: 0,
            segment_len: 0,
            as_output,
        };
        if self.at_end() {
            self.park();
            return false;
        }
        if as_output && !self.seek_output(history_offset, 0) {
            tracing::trace!(history_offset, "no visible output in history");
            return false;
        }
        true
    }

    /// Output-mode cursor seated on the trigger key at `history_offset`. The
    /// trigger is read as typed even when it is a token, so the output pass
    /// can match token-triggered rules against the text before them.
    pub fn init_trigger(&mut self, history_offset: usize) -> bool {
        self.pos = CursorPos {
            index: history_offset,
            sub_index: 0,
            segment_len: 0,
            as_output: true,
        };
        if self.at_end() {
            self.park();
            return false;
        }
        true
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos.index >= self.buffer.len()
    }

    #[must_use]
    pub fn save(&self) -> CursorPos {
        self.pos
    }

    pub fn restore(&mut self, pos: CursorPos) {
        self.pos = pos;
    }

    #[must_use]
    pub fn longer_than(&self, other: &CursorPos) -> bool {
        self.pos.longer_than(other)
    }

    /// Steps to the next older key (raw) or visible character (output).
    pub fn next(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        let moved = if self.pos.as_output {
            self.next_output()
        } else {
            self.pos.index += 1;
            if self.at_end() {
                self.park();
                false
            } else {
                true
            }
        };
        if moved {
            self.pos.segment_len += 1;
        }
        moved
    }

    fn next_output(&mut self) -> bool {
        let index = self.pos.index;
        match self.action_payload(index) {
            Some(payload) => {
                if self.pos.sub_index + 1 < usize::from(payload.completion_len) {
                    self.pos.sub_index += 1;
                    return true;
                }
                self.seek_output(index + 1, usize::from(payload.num_deletions))
            }
            None => self.seek_output(index + 1, 0),
        }
    }

    /// Switches a raw cursor to output mode, moving to the first visible
    /// character at or before the current key.
    pub fn convert_to_output(&mut self) -> bool {
        if self.pos.as_output {
            return !self.at_end();
        }
        self.pos.as_output = true;
        self.pos.sub_index = 0;
        if self.at_end() {
            self.park();
            return false;
        }
        self.seek_output(self.pos.index, 0)
    }

    /// Code under the cursor, or [`code::NONE`] at end.
    pub fn get_code(&mut self) -> Code {
        let Some(key) = self.buffer.at(self.pos.index) else {
            return code::NONE;
        };
        if !self.pos.as_output {
            return key.code;
        }
        let Some(payload) = self.action_payload(self.pos.index) else {
            return key.code;
        };

        let trie = self.trie;
        let Some(completion) = trie.completion(&payload) else {
            return code::NONE;
        };
        let Some(&c) = completion
            .len()
            .checked_sub(self.pos.sub_index + 1)
            .and_then(|i| completion.get(i))
        else {
            return code::NONE;
        };

        match code::backref_distance(c) {
            Some(n) => self.resolve_backref(self.pos.index, n),
            None => c,
        }
    }

    /// Reads codes from the current position to the end of the history,
    /// newest first, stopping after `limit` codes.
    pub fn read_to_end(&mut self, limit: usize) -> Vec<Code> {
        let mut out = Vec::new();
        while !self.at_end() && out.len() < limit {
            out.push(self.get_code());
            if !self.next() {
                break;
            }
        }
        out
    }

    /// The `n`-th visible character before `slot`, as the screen looked when
    /// that slot's rule fired. Slot's own deletions do not apply there.
    fn resolve_backref(&mut self, slot: usize, n: u8) -> Code {
        let saved = self.save();
        self.pos = CursorPos {
            index: slot + 1,
            sub_index: 0,
            segment_len: saved.segment_len,
            as_output: false,
        };

        let mut resolved = code::NONE;
        if self.convert_to_output() && (1..n).all(|_| self.next()) {
            resolved = self.get_code();
        }
        if resolved == code::NONE {
            tracing::trace!(slot, n, "back-reference points past the history");
        }

        self.restore(saved);
        resolved
    }

    /// Moves to the first visible character at or older than `index`, with
    /// `pending` deletions still to apply to older output.
    fn seek_output(&mut self, mut index: usize, mut pending: usize) -> bool {
        while index < self.buffer.len() {
            match self.action_payload(index) {
                None if self.is_plain_token(index) => {}
                None if pending == 0 => {
                    self.pos.index = index;
                    self.pos.sub_index = 0;
                    return true;
                }
                None => pending -= 1,
                Some(payload) => {
                    let len = usize::from(payload.completion_len);
                    if pending < len {
                        self.pos.index = index;
                        self.pos.sub_index = pending;
                        return true;
                    }
                    pending = pending - len + usize::from(payload.num_deletions);
                }
            }
            index += 1;
        }
        self.park();
        false
    }

    fn is_plain_token(&self, index: usize) -> bool {
        self.buffer
            .at(index)
            .is_some_and(|key| key.action_taken.is_none() && code::is_token(key.code))
    }

    fn park(&mut self) {
        self.pos.index = self.buffer.len();
        self.pos.sub_index = 0;
    }

    /// Payload of the rule fired at `index`; `None` for a plain key.
    fn action_payload(&mut self, index: usize) -> Option<Payload> {
        let offset = self.buffer.at(index)?.action_taken?;
        if let Some((cached, payload)) = self.cache
            && cached == offset
        {
            return Some(payload);
        }
        let payload = self.trie.payload_at(offset)?;
        self.cache = Some((offset, payload));
        Some(payload)
    }
}
