use sequence_transform_core::FunctionCode;

/// Edit sent to the host for one key: erase `deletions` characters, then
/// type `text`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    pub deletions: usize,
    pub text: String,
}

impl Emission {
    pub fn new(deletions: usize, text: impl Into<String>) -> Self {
        Self {
            deletions,
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.deletions == 0 && self.text.is_empty()
    }

    /// Folds `next` into this edit as if both had been sent in turn.
    /// Deletions first eat text this edit would have typed.
    pub fn then(mut self, next: Emission) -> Emission {
        let typed = self.text.chars().count();
        if next.deletions <= typed {
            let keep = typed - next.deletions;
            self.text = self.text.chars().take(keep).collect();
        } else {
            self.deletions += next.deletions - typed;
            self.text.clear();
        }
        self.text.push_str(&next.text);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// No rule fired; the key itself was typed.
    Typed(Emission),
    Fired {
        emission: Emission,
        function: FunctionCode,
    },
    Erased(Emission),
    Skipped(SkipReason),
}

impl KeyOutcome {
    pub fn emission(&self) -> Option<&Emission> {
        match self {
            KeyOutcome::Typed(e) | KeyOutcome::Erased(e) => Some(e),
            KeyOutcome::Fired { emission, .. } => Some(emission),
            KeyOutcome::Skipped(_) => None,
        }
    }

    pub fn fired(&self) -> bool {
        matches!(self, KeyOutcome::Fired { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a printable character or a sequence token.
    InvalidCode,
    /// A sequence token that completes no rule. It stays in the history but
    /// shows nothing.
    UnmatchedToken,
    SuppressedBoundary,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::InvalidCode => "invalid_code",
            SkipReason::UnmatchedToken => "unmatched_token",
            SkipReason::SuppressedBoundary => "suppressed_boundary",
        }
    }
}
