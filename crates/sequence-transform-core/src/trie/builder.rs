//! Minimal encoder for the trie format.
//!
//! Rules are inserted as given: completions are interned into the shared pool
//! (an identical run already in the pool is reused) but no back-reference
//! factoring is attempted. Branch entries keep insertion order, which is the
//! order the match walk and the rule search visit them in.

use thiserror::Error;

use super::{BRANCH_BIT, MATCH_BIT, MAX_DATA_LEN, Payload, Trie, TrieOffset};
use crate::code::{self, Code, FunctionCode, MAX_BACKREF};

pub const MAX_DELETIONS: u8 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("rule has an empty sequence")]
    EmptySequence,
    #[error("character {0:?} is not part of the alphabet")]
    UnsupportedChar(char),
    #[error("code 0 cannot appear in a sequence")]
    NulInSequence,
    #[error("{0} deletions exceed the limit of {MAX_DELETIONS}")]
    TooManyDeletions(u8),
    #[error("completion of {0} codes exceeds 255")]
    CompletionTooLong(usize),
    #[error("sequence {0:?} is defined twice")]
    DuplicateSequence(String),
    #[error("back-reference distance {0} exceeds {MAX_BACKREF}")]
    BackrefTooFar(u8),
    #[error("encoded dictionary does not fit word offsets")]
    TooLarge,
}

/// One dictionary entry: typing `sequence` (trigger last) deletes
/// `num_deletions` characters shown before the trigger and types `completion`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub sequence: Vec<Code>,
    pub completion: Vec<Code>,
    pub num_deletions: u8,
    pub function: FunctionCode,
}

impl Rule {
    pub fn new(sequence: &str, completion: &str, num_deletions: u8) -> Result<Self, BuildError> {
        Ok(Self {
            sequence: encode(sequence)?,
            completion: encode(completion)?,
            num_deletions,
            function: FunctionCode::None,
        })
    }

    /// A rule whose completion starts with the `backrefs` visible characters
    /// before the trigger, oldest first, followed by `tail`.
    pub fn with_backrefs(
        sequence: &str,
        backrefs: u8,
        tail: &str,
        num_deletions: u8,
    ) -> Result<Self, BuildError> {
        let mut completion = (1..=backrefs)
            .rev()
            .map(|n| code::backref(n).ok_or(BuildError::BackrefTooFar(n)))
            .collect::<Result<Vec<_>, _>>()?;
        completion.extend(encode(tail)?);
        Ok(Self {
            sequence: encode(sequence)?,
            completion,
            num_deletions,
            function: FunctionCode::None,
        })
    }

    #[must_use]
    pub fn with_function(mut self, function: FunctionCode) -> Self {
        self.function = function;
        self
    }
}

/// Encodes rule text, failing on characters outside the alphabet.
pub fn encode(text: &str) -> Result<Vec<Code>, BuildError> {
    text.chars()
        .map(|ch| code::from_char(ch).ok_or(BuildError::UnsupportedChar(ch)))
        .collect()
}

#[derive(Debug, Default)]
struct BuildNode {
    children: Vec<(Code, BuildNode)>,
    payload: Option<Payload>,
}

impl BuildNode {
    fn child_mut(&mut self, code: Code) -> &mut BuildNode {
        let pos = match self.children.iter().position(|(c, _)| *c == code) {
            Some(pos) => pos,
            None => {
                self.children.push((code, BuildNode::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[pos].1
    }
}

#[derive(Debug, Default)]
pub struct TrieBuilder {
    root: BuildNode,
    completions: Vec<Code>,
    max_deletions: u8,
}

impl TrieBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for [`Rule::new`] followed by [`TrieBuilder::add_rule`].
    pub fn add(
        &mut self,
        sequence: &str,
        completion: &str,
        num_deletions: u8,
    ) -> Result<&mut Self, BuildError> {
        self.add_rule(Rule::new(sequence, completion, num_deletions)?)
    }

    pub fn add_rule(&mut self, rule: Rule) -> Result<&mut Self, BuildError> {
        if rule.sequence.is_empty() {
            return Err(BuildError::EmptySequence);
        }
        if rule.sequence.contains(&code::NONE) {
            return Err(BuildError::NulInSequence);
        }
        if rule.num_deletions > MAX_DELETIONS {
            return Err(BuildError::TooManyDeletions(rule.num_deletions));
        }
        let completion_len = u8::try_from(rule.completion.len())
            .map_err(|_| BuildError::CompletionTooLong(rule.completion.len()))?;

        let completion_offset = self.intern(&rule.completion)?;
        let payload = Payload {
            num_deletions: rule.num_deletions,
            completion_len,
            completion_offset,
            function: rule.function,
        };

        let mut node = &mut self.root;
        for &c in rule.sequence.iter().rev() {
            node = node.child_mut(c);
        }
        if node.payload.is_some() {
            return Err(BuildError::DuplicateSequence(code::decode_codes(&rule.sequence)));
        }
        node.payload = Some(payload);
        self.max_deletions = self.max_deletions.max(rule.num_deletions);
        Ok(self)
    }

    fn intern(&mut self, completion: &[Code]) -> Result<u16, BuildError> {
        if completion.is_empty() {
            return Ok(0);
        }
        let offset = self
            .completions
            .windows(completion.len())
            .position(|w| w == completion)
            .unwrap_or_else(|| {
                let at = self.completions.len();
                self.completions.extend_from_slice(completion);
                at
            });
        u16::try_from(offset).map_err(|_| BuildError::TooLarge)
    }

    pub fn build(self) -> Result<Trie, BuildError> {
        let mut data = Vec::new();
        if self.root.children.is_empty() {
            write_branch(&self.root, &mut data)?;
        } else {
            write_node(&self.root, &mut data)?;
        }
        if data.len() > MAX_DATA_LEN {
            return Err(BuildError::TooLarge);
        }
        Ok(Trie::new(data, self.completions, self.max_deletions))
    }
}

fn write_node(node: &BuildNode, out: &mut Vec<u8>) -> Result<usize, BuildError> {
    let offset = out.len();

    if let Some(payload) = node.payload {
        let lead = if node.children.is_empty() {
            MATCH_BIT
        } else {
            MATCH_BIT | BRANCH_BIT
        };
        out.push(lead);
        out.push((payload.function.bits() << 4) | payload.num_deletions);
        out.push(payload.completion_len);
        out.extend_from_slice(&payload.completion_offset.to_be_bytes());
        if !node.children.is_empty() {
            write_branch(node, out)?;
        }
        return Ok(offset);
    }

    if node.children.len() == 1 {
        out.push(0);
        let mut cur = node;
        while cur.payload.is_none() && cur.children.len() == 1 {
            let (c, child) = &cur.children[0];
            out.push(*c);
            cur = child;
        }
        out.push(0);
        write_node(cur, out)?;
        return Ok(offset);
    }

    write_branch(node, out)?;
    Ok(offset)
}

fn write_branch(node: &BuildNode, out: &mut Vec<u8>) -> Result<(), BuildError> {
    let header = out.len();
    out.push(BRANCH_BIT);
    for (c, _) in &node.children {
        out.push(*c);
        out.extend_from_slice(&[0, 0]);
    }
    out.push(0);

    for (i, (_, child)) in node.children.iter().enumerate() {
        let child_offset = write_node(child, out)?;
        let word = TrieOffset::try_from(child_offset).map_err(|_| BuildError::TooLarge)?;
        let at = header + 1 + i * 3 + 1;
        out[at..at + 2].copy_from_slice(&word.to_be_bytes());
    }
    Ok(())
}
