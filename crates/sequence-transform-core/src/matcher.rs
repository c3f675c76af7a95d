use crate::{
    cursor::{Cursor, CursorPos},
    key_buffer::KeyBuffer,
    trie::{Node, Payload, Trie, TrieOffset},
};

/// A rule whose pattern matches the tail of the history.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Match {
    /// Offset of the match node, stored in the trigger slot once applied.
    pub offset: TrieOffset,
    pub payload: Payload,
    /// Where the cursor stood after the last pattern code.
    pub end: CursorPos,
}

/// Walks the trie from its root along `cursor` and returns the match that
/// ends furthest back. A match only replaces the current best when it is
/// strictly longer, so ties keep the one found first.
///
/// The walk never backtracks: a branch has at most one child per code.
pub fn find_longest_match(cursor: &mut Cursor<'_>) -> Option<Match> {
    let trie = cursor.trie();
    let mut best: Option<Match> = None;
    let mut offset = 0usize;

    loop {
        let Some(node) = trie.decode(offset) else {
            break;
        };
        match node {
            Node::Match { payload, branch } => {
                if best.as_ref().is_none_or(|b| cursor.longer_than(&b.end)) {
                    let Ok(node_offset) = TrieOffset::try_from(offset) else {
                        break;
                    };
                    best = Some(Match {
                        offset: node_offset,
                        payload,
                        end: cursor.save(),
                    });
                }
                let Some(next) = branch else {
                    break;
                };
                offset = next;
            }
            Node::Chain { codes, next } => {
                let mut matched = true;
                for &c in codes {
                    if cursor.at_end() || cursor.get_code() != c {
                        matched = false;
                        break;
                    }
                    cursor.next();
                }
                if !matched {
                    break;
                }
                offset = next;
            }
            Node::Branch(branch) => {
                if cursor.at_end() {
                    break;
                }
                let Some(child) = branch.child(cursor.get_code()) else {
                    break;
                };
                cursor.next();
                offset = child;
            }
        }
    }

    best
}

/// Runs the raw pass and, when `match_output` is set, the output pass over
/// the newest key. The output match wins only if strictly longer.
#[must_use]
pub fn find_best_match(buffer: &KeyBuffer, trie: &Trie, match_output: bool) -> Option<Match> {
    let mut cursor = Cursor::new(buffer, trie);

    let mut best = if cursor.init(0, false) {
        find_longest_match(&mut cursor)
    } else {
        None
    };

    if match_output
        && cursor.init_trigger(0)
        && let Some(found) = find_longest_match(&mut cursor)
        && best.as_ref().is_none_or(|b| found.end.longer_than(&b.end))
    {
        tracing::trace!(offset = found.offset, "output pass match is longer");
        best = Some(found);
    }

    best
}
