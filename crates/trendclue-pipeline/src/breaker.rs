//! One-shot strategy breaker shared by the learned/deterministic stages.

use crate::error::CompletionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// No learned call has been made yet.
    Untested,
    /// At least one learned call succeeded and none has failed.
    LearnedAvailable,
    /// A learned call failed. Terminal for the rest of the run.
    FallbackOnly,
}

impl BreakerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerState::Untested => "untested",
            BreakerState::LearnedAvailable => "learned",
            BreakerState::FallbackOnly => "fallback",
        }
    }
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects the learned strategy until its first failure, then the
/// deterministic one for the remainder of the run. Never reverts.
#[derive(Debug)]
pub struct StrategyBreaker {
    stage: &'static str,
    state: BreakerState,
}

impl StrategyBreaker {
    #[must_use]
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            state: BreakerState::Untested,
        }
    }

    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.state
    }

    #[must_use]
    pub fn allows_learned(&self) -> bool {
        self.state != BreakerState::FallbackOnly
    }

    pub fn record_success(&mut self) {
        if self.state == BreakerState::Untested {
            self.state = BreakerState::LearnedAvailable;
        }
    }

    /// Trip the breaker. Logs at WARN only on the first trip.
    pub fn record_failure(&mut self, error: &CompletionError) {
        if self.state == BreakerState::FallbackOnly {
            return;
        }
        tracing::warn!(
            stage = self.stage,
            error = %error,
            "learned strategy unavailable; using deterministic fallback for the rest of the run"
        );
        self.state = BreakerState::FallbackOnly;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untested_and_allows_learned() {
        let breaker = StrategyBreaker::new("extract");
        assert_eq!(breaker.state(), BreakerState::Untested);
        assert!(breaker.allows_learned());
    }

    #[test]
    fn success_moves_to_learned_available() {
        let mut breaker = StrategyBreaker::new("extract");
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::LearnedAvailable);
        assert!(breaker.allows_learned());
    }

    #[test]
    fn failure_is_terminal() {
        let mut breaker = StrategyBreaker::new("effects");
        breaker.record_success();
        breaker.record_failure(&CompletionError::EmptyResponse);
        assert_eq!(breaker.state(), BreakerState::FallbackOnly);

        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::FallbackOnly);
        assert!(!breaker.allows_learned());
    }

    #[test]
    fn failure_on_first_call_trips_immediately() {
        let mut breaker = StrategyBreaker::new("effects");
        breaker.record_failure(&CompletionError::Disabled);
        assert_eq!(breaker.state(), BreakerState::FallbackOnly);
    }

    #[test]
    fn state_labels() {
        assert_eq!(BreakerState::LearnedAvailable.to_string(), "learned");
        assert_eq!(BreakerState::FallbackOnly.as_str(), "fallback");
    }
}
