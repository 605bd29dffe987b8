use crate::EngineError;

/// The states a booking record moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    PendingChange,
    Approved,
    Rejected,
    Cancelled,
    /// An approved reservation replaced by an approved change request.
    Superseded,
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Pending => write!(f, "pending"),
            RequestState::PendingChange => write!(f, "pending-change"),
            RequestState::Approved => write!(f, "approved"),
            RequestState::Rejected => write!(f, "rejected"),
            RequestState::Cancelled => write!(f, "cancelled"),
            RequestState::Superseded => write!(f, "superseded"),
        }
    }
}

pub fn validate_transition(from: RequestState, to: RequestState) -> Result<(), EngineError> {
    let valid = matches!(
        (from, to),
        (
            RequestState::Pending | RequestState::PendingChange,
            RequestState::Approved | RequestState::Rejected
        ) | (
            RequestState::Approved,
            RequestState::Cancelled | RequestState::Superseded
        )
    );

    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        assert!(validate_transition(RequestState::Pending, RequestState::Approved).is_ok());
        assert!(validate_transition(RequestState::Pending, RequestState::Rejected).is_ok());
        assert!(validate_transition(RequestState::PendingChange, RequestState::Approved).is_ok());
        assert!(validate_transition(RequestState::PendingChange, RequestState::Rejected).is_ok());
        assert!(validate_transition(RequestState::Approved, RequestState::Cancelled).is_ok());
        assert!(validate_transition(RequestState::Approved, RequestState::Superseded).is_ok());
    }

    #[test]
    fn invalid_transitions() {
        assert!(validate_transition(RequestState::Pending, RequestState::Cancelled).is_err());
        assert!(validate_transition(RequestState::Rejected, RequestState::Approved).is_err());
        assert!(validate_transition(RequestState::Cancelled, RequestState::Approved).is_err());
        assert!(validate_transition(RequestState::Approved, RequestState::Approved).is_err());
        assert!(validate_transition(RequestState::Superseded, RequestState::Pending).is_err());
        assert!(validate_transition(RequestState::Pending, RequestState::PendingChange).is_err());
    }
}
