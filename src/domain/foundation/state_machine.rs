//! Finite lifecycle enums with checked transitions.

use super::ValidationError;

/// A lifecycle enum whose legal moves are listed by `valid_transitions`.
///
/// ```ignore
/// let next = SessionState::Handshaking.transition_to(SessionState::Active)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// States reachable in one step; empty for terminal states.
    fn valid_transitions(&self) -> Vec<Self>;

    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state",
                format!("{:?} cannot move to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Outcome of a single outbound write
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Write {
        Queued,
        Sent,
        Dropped,
    }

    impl StateMachine for Write {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Write::Queued => vec![Write::Sent, Write::Dropped],
                Write::Sent | Write::Dropped => vec![],
            }
        }
    }

    #[test]
    fn allowed_transition_returns_target() {
        assert_eq!(Write::Queued.transition_to(Write::Dropped), Ok(Write::Dropped));
    }

    #[test]
    fn rejected_transition_names_both_states() {
        let err = Write::Sent.transition_to(Write::Queued).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Sent"), "{}", message);
        assert!(message.contains("Queued"), "{}", message);
    }

    #[test]
    fn states_without_exits_are_terminal() {
        assert!(!Write::Queued.is_terminal());
        assert!(Write::Sent.is_terminal());
        assert!(Write::Dropped.is_terminal());
    }
}
