use crate::actions::Operator;
use crate::keys::{render_keys, Key};

/// Largest count accepted; further digits are ignored.
const MAX_COUNT: usize = 99_999;

/// An operator that has matched and is waiting for its motion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperator {
    pub operator: Operator,
    pub count: Option<usize>,
    pub register: Option<char>,
    /// Keys that matched the operator, used to spot the doubled form (`dd`).
    pub trigger: Vec<Key>,
}

/// Keys typed so far for the action being assembled.
///
/// Cleared once an action executes or the sequence is aborted.
#[derive(Debug, Clone, Default)]
pub struct RecordedState {
    /// Every key of the current action, including count and register.
    pub typed: Vec<Key>,
    /// Keys left after peeling count and register; matched against actions.
    pub pending: Vec<Key>,
    pub count: Option<usize>,
    pub register: Option<char>,
    /// A `"` was typed and the register name is next.
    pub awaiting_register: bool,
    /// The keys so far can only continue with a `{char}` argument.
    pub awaiting_char: bool,
    pub operator: Option<PendingOperator>,
}

impl RecordedState {
    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.operator.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn push_digit(&mut self, digit: u32) {
        let current = self.count.unwrap_or(0);
        let next = current * 10 + digit as usize;
        if next <= MAX_COUNT {
            self.count = Some(next);
        }
    }

    /// Count to use for the action about to run: a count typed before the
    /// operator multiplies the one typed before the motion (`2d3w` = 6).
    pub fn effective_count(&self) -> Option<usize> {
        let operator_count = self.operator.as_ref().and_then(|op| op.count);
        match (operator_count, self.count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1))),
        }
    }

    /// Register for the action about to run.
    pub fn effective_register(&self) -> Option<char> {
        self.register
            .or_else(|| self.operator.as_ref().and_then(|op| op.register))
    }

    /// Pending keys as shown in the status line.
    pub fn display(&self) -> String {
        render_keys(&self.typed)
    }
}
