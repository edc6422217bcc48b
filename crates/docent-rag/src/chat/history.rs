//! Append-only conversation log.

use super::Exchange;

/// Ordered log of every exchange in a session.
///
/// The log is never truncated; only the view handed to the prompt builder
/// is bounded, via [`recent`](Self::recent).
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    exchanges: Vec<Exchange>,
}

impl ConversationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an exchange.
    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    /// Returns every exchange, oldest first.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Returns the last `n` exchanges, oldest first.
    pub fn recent(&self, n: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(n);
        &self.exchanges[start..]
    }

    /// Returns the number of exchanges.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Discards every exchange.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(count: usize) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        for i in 0..count {
            history.push(Exchange::new(format!("q{i}"), format!("a{i}")));
        }
        history
    }

    #[test]
    fn recent_is_bounded_and_ordered() {
        let history = history(7);
        let recent: Vec<&str> = history.recent(5).iter().map(|e| e.user_text()).collect();

        assert_eq!(recent, vec!["q2", "q3", "q4", "q5", "q6"]);
        assert_eq!(history.len(), 7);
    }

    #[test]
    fn recent_with_short_history() {
        assert_eq!(history(2).recent(5).len(), 2);
        assert!(history(3).recent(0).is_empty());
    }

    #[test]
    fn clear_empties_log() {
        let mut history = history(3);
        history.clear();
        assert!(history.is_empty());
    }
}
