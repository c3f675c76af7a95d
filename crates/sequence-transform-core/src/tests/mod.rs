
use crate::{
    KeyBuffer, Match, Trie, TrieBuilder,
    code::{self, Code},
    cursor::Cursor,
    find_best_match,
    trie::builder::Rule,
};

pub(crate) fn trie_of(rules: &[(&str, &str, u8)]) -> Trie {
    let mut builder = TrieBuilder::new();
    for &(sequence, completion, deletions) in rules {
        builder.add(sequence, completion, deletions).unwrap();
    }
    builder.build().unwrap()
}

/// "develop" for `dv`, and "development" for `dvt` written as seven
/// back-references to the text `dv` left on screen plus "ment".
pub(crate) fn develop_trie() -> Trie {
    let mut builder = TrieBuilder::new();
    builder.add("dv", "develop", 1).unwrap();
    builder
        .add_rule(Rule::with_backrefs("dvt", 7, "ment", 7).unwrap())
        .unwrap();
    builder.build().unwrap()
}

pub(crate) fn text_of(codes: &[Code]) -> String {
    code::decode_codes(codes)
}

/// Drives the engine the way a host integration would and mirrors the
/// emitted edits into `screen`.
pub(crate) struct Typist<'t> {
    pub trie: &'t Trie,
    pub buffer: KeyBuffer,
    pub screen: String,
    pub match_output: bool,
}

impl<'t> Typist<'t> {
    pub fn new(trie: &'t Trie) -> Self {
        Self {
            trie,
            buffer: KeyBuffer::new(64),
            screen: String::new(),
            match_output: true,
        }
    }

    pub fn type_str(&mut self, text: &str) {
        for c in code::encode_str(text).unwrap() {
            self.type_code(c);
        }
    }

    pub fn type_code(&mut self, c: Code) -> Option<Match> {
        self.buffer.push(c);
        let Some(found) = find_best_match(&self.buffer, self.trie, self.match_output) else {
            // A token that fires nothing stays in the history, unseen.
            if !code::is_token(c) {
                self.screen.push(code::to_char(c));
            }
            return None;
        };

        assert!(self.buffer.set_action(0, found.offset));
        let mut cursor = Cursor::new(&self.buffer, self.trie);
        let len = usize::from(found.payload.completion_len);
        let mut completion = if len > 0 && cursor.init(0, true) {
            cursor.read_to_end(len)
        } else {
            Vec::new()
        };
        completion.reverse();

        for _ in 0..found.payload.num_deletions {
            self.screen.pop();
        }
        self.screen.push_str(&text_of(&completion));
        Some(found)
    }

    /// Whole visible text, oldest first, as the output cursor sees it.
    pub fn visible(&self) -> String {
        let mut cursor = Cursor::new(&self.buffer, self.trie);
        if !cursor.init(0, true) {
            return String::new();
        }
        let mut codes = cursor.read_to_end(usize::MAX);
        codes.reverse();
        text_of(&codes)
    }
}
