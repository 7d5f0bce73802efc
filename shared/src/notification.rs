use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// Only success messages expire; errors stay until replaced or cleared.
    pub expires_at_ms: Option<u64>,
}

impl Notification {
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|at| now_ms >= at)
    }
}

/// Single notification slot. Setting either kind replaces whatever was there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    current: Option<Notification>,
    success_ttl_ms: u64,
}

impl NotificationState {
    #[must_use]
    pub fn new(success_ttl_ms: u64) -> Self {
        Self {
            current: None,
            success_ttl_ms,
        }
    }

    pub fn set_success_ttl_ms(&mut self, ttl_ms: u64) {
        self.success_ttl_ms = ttl_ms;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.current = Some(Notification {
            message: message.into(),
            kind: NotificationKind::Error,
            expires_at_ms: None,
        });
    }

    pub fn set_success(&mut self, message: impl Into<String>, now_ms: u64) {
        self.current = Some(Notification {
            message: message.into(),
            kind: NotificationKind::Success,
            expires_at_ms: Some(now_ms.saturating_add(self.success_ttl_ms)),
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Drops an expired success message. Returns whether anything changed.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now_ms)) {
            self.current = None;
            return true;
        }
        false
    }

    #[must_use]
    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|n| n.kind == NotificationKind::Error)
            .map(|n| n.message.as_str())
    }

    #[must_use]
    pub fn success(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|n| n.kind == NotificationKind::Success)
            .map(|n| n.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let state = NotificationState::new(3_000);
        assert!(state.current().is_none());
        assert!(state.error().is_none());
        assert!(state.success().is_none());
    }

    #[test]
    fn error_replaces_success() {
        let mut state = NotificationState::new(3_000);
        state.set_success("ok", 0);
        state.set_error("boom");
        assert_eq!(state.error(), Some("boom"));
        assert_eq!(state.success(), None);
    }

    #[test]
    fn success_replaces_error() {
        let mut state = NotificationState::new(3_000);
        state.set_error("boom");
        state.set_success("ok", 0);
        assert_eq!(state.success(), Some("ok"));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn same_kind_replaces_previous() {
        let mut state = NotificationState::new(3_000);
        state.set_error("first");
        state.set_error("second");
        assert_eq!(state.error(), Some("second"));
    }

    #[test]
    fn success_expires_after_ttl() {
        let mut state = NotificationState::new(3_000);
        state.set_success("ok", 1_000);
        assert!(!state.expire(3_999));
        assert_eq!(state.success(), Some("ok"));
        assert!(state.expire(4_000));
        assert!(state.current().is_none());
    }

    #[test]
    fn errors_never_expire() {
        let mut state = NotificationState::new(10);
        state.set_error("boom");
        assert!(!state.expire(u64::MAX));
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn clear_empties_the_slot() {
        let mut state = NotificationState::new(3_000);
        state.set_error("boom");
        state.clear();
        assert!(state.current().is_none());
    }
}
