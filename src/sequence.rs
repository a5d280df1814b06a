use crate::keycode;
use std::time::Duration;

/// Default time allowed between two steps of a sequence
pub const DEFAULT_SEQUENCE_TIMEOUT: Duration = Duration::from_millis(500);

/// Result of feeding one key to a [`SequenceMatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceProgress {
    /// Wrong key or too slow; the matcher is back at the start
    Rejected,
    /// Step accepted, more keys needed
    Advanced { matched: usize, remaining: usize },
    /// Final step accepted; the matcher has reset itself
    Completed,
}

/// Recognizes an ordered list of keys pressed within a rolling time budget
/// (e.g. `"g g"` or `"a b c"`). A `*` step accepts any key.
///
/// Timeouts are detected lazily: nothing happens when the budget runs out,
/// the next key simply starts over.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    /// Expected code for each step
    codes: Vec<u32>,
    /// Maximum gap between consecutive steps
    timeout: Duration,
    /// Index of the next expected step
    index: usize,
    /// Raw codes accepted so far
    accumulated: Vec<u32>,
    /// Clock reading of the last accepted step
    last_event: Option<Duration>,
}

impl SequenceMatcher {
    /// Create a matcher from space-separated key names
    pub fn new(keys: &str) -> Self {
        Self::with_timeout(keys, DEFAULT_SEQUENCE_TIMEOUT)
    }

    pub fn with_timeout(keys: &str, timeout: Duration) -> Self {
        Self::from_codes(keys.split_whitespace().map(keycode::resolve).collect(), timeout)
    }

    pub fn from_codes(codes: Vec<u32>, timeout: Duration) -> Self {
        Self {
            codes,
            timeout,
            index: 0,
            accumulated: Vec::new(),
            last_event: None,
        }
    }

    /// Feed one key event with code `code`, observed at clock reading `now`
    pub fn feed(&mut self, code: u32, now: Duration) -> SequenceProgress {
        let expected = match self.codes.get(self.index) {
            Some(&expected) => expected,
            None => {
                self.reset();
                return SequenceProgress::Rejected;
            }
        };

        if expected != keycode::WILDCARD && expected != code {
            self.reset();
            return SequenceProgress::Rejected;
        }

        if let Some(previous) = self.last_event {
            if now.saturating_sub(previous) > self.timeout {
                self.reset();
                return SequenceProgress::Rejected;
            }
        }

        self.accumulated.push(code);
        self.index += 1;
        self.last_event = Some(now);

        if self.index == self.codes.len() {
            self.reset();
            return SequenceProgress::Completed;
        }

        SequenceProgress::Advanced {
            matched: self.index,
            remaining: self.codes.len() - self.index,
        }
    }

    /// Back to the initial state
    pub fn reset(&mut self) {
        self.index = 0;
        self.accumulated.clear();
        self.last_event = None;
    }

    /// Number of steps matched so far
    pub fn progress(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Codes accepted in the current attempt
    pub fn accumulated(&self) -> &[u32] {
        &self.accumulated
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Human-readable form like `g → g`
    pub fn describe(&self) -> String {
        self.codes
            .iter()
            .map(|&code| keycode::describe(code))
            .collect::<Vec<_>>()
            .join(" → ")
    }
}
