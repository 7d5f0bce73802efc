use crate::capabilities::HttpResult;
use crate::config::AdminConfig;
use crate::model::CaseId;
use crate::validation::Decision;

/// Inputs to the core.
///
/// Every event the shell sends that starts or times out work carries
/// `now_ms`, milliseconds read from one clock the shell picks (wall clock
/// or monotonic, as long as it is always the same one). The core never
/// reads a clock itself: request start times, timeouts and toast expiry
/// are all measured against these readings.
#[derive(Debug)]
pub enum Event {
    Noop,

    /// Replaces the configuration of a default-built model.
    Configure(AdminConfig),

    LoadRequested {
        now_ms: u64,
    },
    DecisionRequested {
        case_id: CaseId,
        decision: Decision,
        now_ms: u64,
    },
    DismissNotification,

    /// Sent periodically by the shell; drives timeouts and toast expiry.
    /// `now_ms` must come from the same clock as the other events.
    Tick {
        now_ms: u64,
    },

    // Responses. These are stamped with the latest shell time seen.
    PendingCasesLoaded {
        ticket: u64,
        result: Box<HttpResult>,
    },
    DecisionSettled {
        case_id: CaseId,
        ticket: u64,
        decision: Decision,
        request_id: String,
        result: Box<HttpResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::LoadRequested { .. } => "load_requested",
            Self::DecisionRequested { .. } => "decision_requested",
            Self::DismissNotification => "dismiss_notification",
            Self::Tick { .. } => "tick",
            Self::PendingCasesLoaded { .. } => "pending_cases_loaded",
            Self::DecisionSettled { .. } => "decision_settled",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LoadRequested { .. } | Self::DecisionRequested { .. } | Self::DismissNotification
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Event::LoadRequested { now_ms: 0 }.name(), "load_requested");
        assert_eq!(Event::Tick { now_ms: 0 }.name(), "tick");
        assert_eq!(
            Event::Configure(AdminConfig::default()).name(),
            "configure"
        );
    }

    #[test]
    fn user_initiated_events() {
        assert!(Event::LoadRequested { now_ms: 0 }.is_user_initiated());
        assert!(Event::DismissNotification.is_user_initiated());
        assert!(Event::DecisionRequested {
            case_id: CaseId::new("1"),
            decision: Decision::Confirm,
            now_ms: 0,
        }
        .is_user_initiated());
        assert!(!Event::Noop.is_user_initiated());
        assert!(!Event::Tick { now_ms: 5 }.is_user_initiated());
    }
}
