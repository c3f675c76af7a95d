//! Per-keystroke driver around the engine.
//!
//! A [`Session`] owns the key history and a dictionary, runs the match
//! engine for every key and sends the resulting edits to an
//! [`OutputSink`]. Everything is synchronous; the idle timeout is polled with
//! the caller's clock.

use sequence_transform_core::{
    Code, Cursor, FunctionCode, KeyBuffer, Match, MissedRule, Trie, code, find_best_match,
    search_missed_rule,
};

use crate::{
    config::Config,
    domain::outcome::{Emission, KeyOutcome, SkipReason},
    output::OutputSink,
};

pub struct Session<S: OutputSink> {
    config: Config,
    trie: Trie,
    buffer: KeyBuffer,
    sink: S,
    last_key_ms: Option<u64>,
    /// Upper-case the next emitted letter.
    pending_shift: bool,
    /// Drop the next key if it is the boundary.
    suppress_boundary: bool,
}

impl<S: OutputSink> Session<S> {
    pub fn new(config: Config, trie: Trie, sink: S) -> Self {
        let buffer = KeyBuffer::new(config.buffer_capacity);
        Self {
            config,
            trie,
            buffer,
            sink,
            last_key_ms: None,
            pending_shift: false,
            suppress_boundary: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn buffer(&self) -> &KeyBuffer {
        &self.buffer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Handles one keystroke typed at `now_ms` and emits its edit.
    pub fn process_key(&mut self, key: Code, now_ms: u64) -> KeyOutcome {
        self.poll_idle(now_ms);
        self.last_key_ms = Some(now_ms);

        if !code::is_printable(key) && !code::is_token(key) {
            tracing::trace!(key, "code outside the key alphabet ignored");
            return KeyOutcome::Skipped(SkipReason::InvalidCode);
        }
        if std::mem::take(&mut self.suppress_boundary) && key == code::BOUNDARY {
            tracing::trace!("boundary suppressed");
            return KeyOutcome::Skipped(SkipReason::SuppressedBoundary);
        }

        let outcome = self.handle_key(key, true);
        if let Some(emission) = outcome.emission() {
            self.emit(emission);
        }
        outcome
    }

    /// Undoes the newest keystroke. With enhanced backspace the edit turns
    /// the screen back into what it showed before that key, so a fired rule
    /// is taken back as a whole.
    pub fn backspace(&mut self, now_ms: u64) -> KeyOutcome {
        self.poll_idle(now_ms);
        self.last_key_ms = Some(now_ms);
        self.suppress_boundary = false;

        let emission = if !self.config.enhanced_backspace || self.buffer.len() <= 1 {
            self.buffer.reset();
            Emission::new(1, "")
        } else {
            let before = self.visible_codes();
            self.buffer.pop(1);
            let after = self.visible_codes();
            let common = before
                .iter()
                .zip(&after)
                .take_while(|(a, b)| a == b)
                .count();
            Emission::new(before.len() - common, code::decode_codes(&after[common..]))
        };

        tracing::trace!(
            deletions = emission.deletions,
            retyped = %emission.text,
            "backspace"
        );
        self.emit(&emission);
        KeyOutcome::Erased(emission)
    }

    /// Drops the history when no key arrived for the configured timeout.
    /// Returns whether it did.
    pub fn poll_idle(&mut self, now_ms: u64) -> bool {
        let timeout = self.config.idle_timeout_ms;
        let Some(last) = self.last_key_ms else {
            return false;
        };
        let idle_ms = now_ms.saturating_sub(last);
        if timeout == 0 || idle_ms < timeout {
            return false;
        }

        tracing::info!(idle_ms, "idle timeout, history reset");
        self.reset();
        true
    }

    /// Looks for a rule that would have produced the text just typed. A
    /// trailing plain boundary is skipped.
    pub fn find_missed_rule(&self) -> Option<MissedRule> {
        let history_offset = match self.buffer.at(0) {
            Some(key) if key.code == code::BOUNDARY && key.action_taken.is_none() => 1,
            _ => 0,
        };
        search_missed_rule(
            &self.buffer,
            &self.trie,
            history_offset,
            self.config.search_limits(),
        )
    }

    /// The text the history accounts for, oldest first, in lower case.
    pub fn visible_text(&self) -> String {
        code::decode_codes(&self.visible_codes())
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
        self.last_key_ms = None;
        self.pending_shift = false;
        self.suppress_boundary = false;
    }

    fn handle_key(&mut self, key: Code, allow_repeat: bool) -> KeyOutcome {
        self.buffer.push(key);

        let fired = find_best_match(&self.buffer, &self.trie, self.config.match_output)
            .and_then(|found| self.apply_rule(found));
        let Some((found, completion)) = fired else {
            if code::is_token(key) {
                // Kept in the history; a plain token shows nothing.
                tracing::trace!(key = %code::to_char(key), "token completes no rule");
                return KeyOutcome::Skipped(SkipReason::UnmatchedToken);
            }
            if key == code::BOUNDARY && self.config.report_missed_rules {
                self.report_missed_rule();
            }
            let text = self.shifted(code::to_char(key).to_string());
            return KeyOutcome::Typed(Emission::new(0, text));
        };

        let function = found.payload.function;
        tracing::debug!(
            offset = found.offset,
            deletions = found.payload.num_deletions,
            completion = %completion,
            function = function.as_str(),
            "rule fired"
        );

        let mut emission = Emission::new(
            usize::from(found.payload.num_deletions),
            self.shifted(completion),
        );
        match function {
            FunctionCode::None => {}
            FunctionCode::OneShotShift => self.pending_shift = true,
            FunctionCode::SuppressBoundary => self.suppress_boundary = true,
            FunctionCode::RepeatLastKey if allow_repeat => {
                if let Some(previous) = self.buffer.at(1) {
                    let repeated = self.handle_key(previous.code, false);
                    if let Some(next) = repeated.emission() {
                        emission = emission.then(next.clone());
                    }
                }
            }
            FunctionCode::RepeatLastKey => {
                tracing::trace!("nested repeat ignored");
            }
        }

        KeyOutcome::Fired { emission, function }
    }

    /// Annotates slot 0 with `found` and reads its completion. A completion
    /// that refers past the start of the history is refused and the slot is
    /// left plain.
    fn apply_rule(&mut self, found: Match) -> Option<(Match, String)> {
        let annotated = self.buffer.set_action(0, found.offset);
        debug_assert!(annotated, "slot 0 exists right after a push");

        match self.read_completion(&found) {
            Some(completion) => Some((found, completion)),
            None => {
                self.buffer.clear_action(0);
                tracing::debug!(
                    offset = found.offset,
                    "completion refers past the history, rule refused"
                );
                None
            }
        }
    }

    /// Completion of the rule just applied at slot 0, back-references
    /// resolved against the screen as it was before the trigger. `None` when
    /// a back-reference has nothing to resolve to.
    fn read_completion(&self, found: &Match) -> Option<String> {
        let len = usize::from(found.payload.completion_len);
        if len == 0 {
            return Some(String::new());
        }
        let mut cursor = Cursor::new(&self.buffer, &self.trie);
        if !cursor.init(0, true) {
            return None;
        }
        let mut codes = cursor.read_to_end(len);
        if codes.len() < len || codes.contains(&code::NONE) {
            return None;
        }
        codes.reverse();
        Some(code::decode_codes(&codes))
    }

    fn visible_codes(&self) -> Vec<Code> {
        let mut cursor = Cursor::new(&self.buffer, &self.trie);
        if !cursor.init(0, true) {
            return Vec::new();
        }
        let mut codes = cursor.read_to_end(usize::MAX);
        codes.reverse();
        codes
    }

    fn report_missed_rule(&self) {
        // The word before this boundary came from a rule already.
        if self
            .buffer
            .at(1)
            .is_some_and(|key| key.action_taken.is_some())
        {
            return;
        }
        if let Some(found) = self.find_missed_rule() {
            tracing::info!(
                sequence = %found.sequence,
                completion = %found.completion,
                "missed rule"
            );
        }
    }

    fn shifted(&mut self, mut text: String) -> String {
        if !self.pending_shift {
            return text;
        }
        if let Some(pos) = text.find(|c: char| c.is_ascii_alphabetic()) {
            text[pos..=pos].make_ascii_uppercase();
            self.pending_shift = false;
        }
        text
    }

    fn emit(&mut self, emission: &Emission) {
        if emission.deletions > 0 {
            self.sink.delete(emission.deletions);
        }
        if !emission.text.is_empty() {
            self.sink.type_text(&emission.text);
        }
    }
}
