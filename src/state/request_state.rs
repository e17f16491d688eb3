/// Lifecycle of a request in the crawl queue
use std::fmt;

/// Represents where a queued request is in its lifecycle
///
/// ```text
/// Pending ──dequeue──▶ InProgress ──ok──▶ Handled
///    ▲                     │
///    └──────reclaim────────┤
///                          └──retries exhausted──▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Waiting in the queue
    Pending,

    /// Leased to a worker
    InProgress,

    /// The handler completed
    Handled,

    /// The handler failed and no retries are left
    Failed,
}

impl RequestState {
    /// Returns true if the request will not be dequeued again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Handled | Self::Failed)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Handled)
                | (Self::InProgress, Self::Pending)
                | (Self::InProgress, Self::Failed)
        )
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Handled => "handled",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "handled" => Some(Self::Handled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn all_states() -> [Self; 4] {
        [Self::Pending, Self::InProgress, Self::Handled, Self::Failed]
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!RequestState::Pending.is_terminal());
        assert!(!RequestState::InProgress.is_terminal());
        assert!(RequestState::Handled.is_terminal());
        assert!(RequestState::Failed.is_terminal());
    }

    #[test]
    fn test_transitions() {
        use RequestState::*;

        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Handled));
        assert!(InProgress.can_transition_to(Pending));
        assert!(InProgress.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Handled));
        assert!(!Handled.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(InProgress));
    }

    #[test]
    fn test_roundtrip_db_string() {
        for state in RequestState::all_states() {
            let parsed = RequestState::from_db_string(state.to_db_string());
            assert_eq!(Some(state), parsed, "Failed roundtrip for {:?}", state);
        }
        assert_eq!(RequestState::from_db_string("fetching"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(RequestState::InProgress.to_string(), "in_progress");
    }
}
