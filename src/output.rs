//! Where corrections go. The engine never touches the host directly; it
//! hands deletions and text to an [`OutputSink`].

/// Receives the edits a session decides on, in order.
pub trait OutputSink {
    /// Erases `count` characters before the caret.
    fn delete(&mut self, count: usize);

    fn type_text(&mut self, text: &str);
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn delete(&mut self, count: usize) {
        (**self).delete(count);
    }

    fn type_text(&mut self, text: &str) {
        (**self).type_text(text);
    }
}

/// In-memory screen, used by tests and the replay binary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulatedOutput {
    text: String,
    deleted: usize,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from text already on screen.
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            deleted: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Total characters erased so far.
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.deleted = 0;
    }
}

impl OutputSink for SimulatedOutput {
    fn delete(&mut self, count: usize) {
        for _ in 0..count {
            if self.text.pop().is_none() {
                break;
            }
            self.deleted += 1;
        }
    }

    fn type_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}
