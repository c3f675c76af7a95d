//! Immutable binary dictionary.
//!
//! `data` holds the nodes, addressed in bytes; a word is two bytes, big-endian.
//! The leading byte of a node carries the tag bits:
//!
//! | node   | leading byte | followed by                                         |
//! |--------|--------------|-----------------------------------------------------|
//! | chain  | `0x00`       | codes, `0x00` terminator, next node                 |
//! | branch | `0x40`       | `(code, child word)` entries, `0x00` terminator     |
//! | match  | `0x80`       | `func << 4 \| deletions`, length, completion word   |
//!
//! A match node with bit 6 also set is chained: a branch node follows it.
//! Patterns are stored newest key first, so a walk from the root reads the
//! history backwards starting at the trigger key.

pub mod builder;

use std::borrow::Cow;

use thiserror::Error;

use crate::code::{Code, FunctionCode};

/// Byte offset of a node inside the trie data.
pub type TrieOffset = u16;

const MATCH_BIT: u8 = 0x80;
const BRANCH_BIT: u8 = 0x40;
const MATCH_NODE_LEN: usize = 5;
const BRANCH_ENTRY_LEN: usize = 3;
const DELETIONS_MASK: u8 = 0x0F;

/// Largest `data` array a word offset can address.
pub const MAX_DATA_LEN: usize = TrieOffset::MAX as usize + 1;

pub const CONTAINER_MAGIC: &[u8; 4] = b"STRI";
pub const CONTAINER_VERSION: u8 = 1;
const CONTAINER_HEADER_LEN: usize = 4 + 1 + 1 + 4 + 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrieError {
    #[error("dictionary is truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("not a sequence-transform dictionary")]
    BadMagic,
    #[error("unsupported dictionary version {0}")]
    UnsupportedVersion(u8),
    #[error("{0} trailing bytes after dictionary")]
    TrailingBytes(usize),
    #[error("trie data is {0} bytes, more than a word offset can address")]
    TooLarge(usize),
    #[error("dictionary has no nodes")]
    Empty,
}

/// What a fired rule does: delete, insert a completion, run a function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub num_deletions: u8,
    pub completion_len: u8,
    pub completion_offset: u16,
    pub function: FunctionCode,
}

#[derive(Copy, Clone, Debug)]
pub enum Node<'a> {
    Chain { codes: &'a [Code], next: usize },
    Branch(Branch<'a>),
    Match {
        payload: Payload,
        /// Offset of the trailing branch of a chained match.
        branch: Option<usize>,
    },
}

#[derive(Copy, Clone, Debug)]
pub struct Branch<'a> {
    trie: &'a Trie,
    offset: usize,
}

impl<'a> Branch<'a> {
    /// Offset of the child selected by `code`.
    #[must_use]
    pub fn child(&self, code: Code) -> Option<usize> {
        self.entries()
            .find(|&(c, _)| c == code)
            .map(|(_, child)| child)
    }

    #[must_use]
    pub fn entries(&self) -> BranchEntries<'a> {
        BranchEntries {
            trie: self.trie,
            pos: self.offset + 1,
        }
    }
}

/// `(code, child offset)` pairs in trie order.
pub struct BranchEntries<'a> {
    trie: &'a Trie,
    pos: usize,
}

impl Iterator for BranchEntries<'_> {
    type Item = (Code, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let code = self.trie.byte(self.pos)?;
        if code == 0 {
            return None;
        }
        let child = self.trie.word(self.pos + 1)?;
        self.pos += BRANCH_ENTRY_LEN;
        Some((code, usize::from(child)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trie {
    data: Cow<'static, [u8]>,
    completions: Cow<'static, [u8]>,
    max_deletions: u8,
}

impl Trie {
    /// `max_deletions` is the largest deletion count of any rule, as
    /// reported by the dictionary compiler.
    #[must_use]
    pub fn new(data: Vec<u8>, completions: Vec<u8>, max_deletions: u8) -> Self {
        Self {
            data: Cow::Owned(data),
            completions: Cow::Owned(completions),
            max_deletions,
        }
    }

    /// Wraps tables compiled into the binary.
    #[must_use]
    pub const fn from_static(
        data: &'static [u8],
        completions: &'static [u8],
        max_deletions: u8,
    ) -> Self {
        Self {
            data: Cow::Borrowed(data),
            completions: Cow::Borrowed(completions),
            max_deletions,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn completions(&self) -> &[u8] {
        &self.completions
    }

    #[must_use]
    pub fn max_deletions(&self) -> u8 {
        self.max_deletions
    }

    fn out_of_bounds(&self, table: &'static str, offset: usize, len: usize) {
        tracing::error!(table, offset, len, "trie read out of bounds");
        if cfg!(debug_assertions) {
            panic!("trie {table} read out of bounds: offset {offset}, len {len}");
        }
    }

    fn byte(&self, offset: usize) -> Option<u8> {
        let b = self.data.get(offset).copied();
        if b.is_none() {
            self.out_of_bounds("data", offset, self.data.len());
        }
        b
    }

    fn word(&self, offset: usize) -> Option<u16> {
        let hi = self.byte(offset)?;
        let lo = self.byte(offset + 1)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    /// Decodes the node at `offset`. `None` only on a bounds violation.
    #[must_use]
    pub fn decode(&self, offset: usize) -> Option<Node<'_>> {
        let lead = self.byte(offset)?;

        if lead & MATCH_BIT != 0 {
            let packed = self.byte(offset + 1)?;
            let completion_len = self.byte(offset + 2)?;
            let completion_offset = self.word(offset + 3)?;
            let payload = Payload {
                num_deletions: packed & DELETIONS_MASK,
                completion_len,
                completion_offset,
                function: FunctionCode::from_bits(packed >> 4),
            };
            let branch = (lead & BRANCH_BIT != 0).then_some(offset + MATCH_NODE_LEN);
            return Some(Node::Match { payload, branch });
        }

        if lead & BRANCH_BIT != 0 {
            return Some(Node::Branch(Branch { trie: self, offset }));
        }

        let start = offset + 1;
        let Some(len) = self.data.get(start..).and_then(|rest| rest.iter().position(|&b| b == 0))
        else {
            self.out_of_bounds("data", start, self.data.len());
            return None;
        };
        Some(Node::Chain {
            codes: &self.data[start..start + len],
            next: start + len + 1,
        })
    }

    /// Payload of the match node a history slot was annotated with.
    #[must_use]
    pub fn payload_at(&self, offset: TrieOffset) -> Option<Payload> {
        match self.decode(usize::from(offset))? {
            Node::Match { payload, .. } => Some(payload),
            _ => {
                tracing::error!(offset, "annotation does not point at a match node");
                None
            }
        }
    }

    /// Completion text of `payload`, possibly holding back-references.
    #[must_use]
    pub fn completion(&self, payload: &Payload) -> Option<&[Code]> {
        let start = usize::from(payload.completion_offset);
        let end = start + usize::from(payload.completion_len);
        let text = self.completions.get(start..end);
        if text.is_none() {
            self.out_of_bounds("completions", end, self.completions.len());
        }
        text
    }

    /// Parses the on-disk container written by [`Trie::to_container`].
    pub fn from_container(bytes: &[u8]) -> Result<Self, TrieError> {
        if bytes.len() < CONTAINER_HEADER_LEN {
            return Err(TrieError::Truncated {
                needed: CONTAINER_HEADER_LEN,
                available: bytes.len(),
            });
        }
        if &bytes[..4] != CONTAINER_MAGIC {
            return Err(TrieError::BadMagic);
        }
        let version = bytes[4];
        if version != CONTAINER_VERSION {
            return Err(TrieError::UnsupportedVersion(version));
        }
        let max_deletions = bytes[5];
        let read_len = |at: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[at..at + 4]);
            usize::try_from(u32::from_be_bytes(raw)).unwrap_or(usize::MAX)
        };
        let data_len = read_len(6);
        let completions_len = read_len(10);

        if data_len == 0 {
            return Err(TrieError::Empty);
        }
        if data_len > MAX_DATA_LEN {
            return Err(TrieError::TooLarge(data_len));
        }

        let needed = CONTAINER_HEADER_LEN
            .saturating_add(data_len)
            .saturating_add(completions_len);
        if bytes.len() < needed {
            return Err(TrieError::Truncated {
                needed,
                available: bytes.len(),
            });
        }
        if bytes.len() > needed {
            return Err(TrieError::TrailingBytes(bytes.len() - needed));
        }

        let data_end = CONTAINER_HEADER_LEN + data_len;
        Ok(Self::new(
            bytes[CONTAINER_HEADER_LEN..data_end].to_vec(),
            bytes[data_end..].to_vec(),
            max_deletions,
        ))
    }

    #[must_use]
    pub fn to_container(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(CONTAINER_HEADER_LEN + self.data.len() + self.completions.len());
        out.extend_from_slice(CONTAINER_MAGIC);
        out.push(CONTAINER_VERSION);
        out.push(self.max_deletions);
        for len in [self.data.len(), self.completions.len()] {
            let len = u32::try_from(len).unwrap_or(u32::MAX);
            out.extend_from_slice(&len.to_be_bytes());
        }
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.completions);
        out
    }
}
