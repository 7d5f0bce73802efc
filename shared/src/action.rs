//! Per-case in-flight action bookkeeping.
//!
//! The tracker only records; it never refuses a `begin`. Keeping two
//! decisions for one case apart is the caller's job (see
//! [`crate::Model::check_submission`]), the tracker just reflects the latest
//! value so the view can disable a row's buttons.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::CaseId;
use crate::validation::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    None,
    Confirming,
    Refusing,
}

impl ActionStatus {
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub const fn decision(self) -> Option<Decision> {
        match self {
            Self::None => None,
            Self::Confirming => Some(Decision::Confirm),
            Self::Refusing => Some(Decision::Refuse),
        }
    }
}

impl From<Decision> for ActionStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Confirm => Self::Confirming,
            Decision::Refuse => Self::Refusing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightAction {
    pub decision: Decision,
    /// Distinguishes this attempt from any earlier one on the same case.
    pub ticket: u64,
    pub started_at_ms: u64,
}

impl InFlightAction {
    #[must_use]
    pub fn is_expired(&self, now_ms: u64, timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) >= timeout_ms
    }
}

#[derive(Debug, Default)]
pub struct ActionTracker {
    actions: HashMap<CaseId, InFlightAction>,
    next_ticket: u64,
}

impl ActionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `decision` as in progress for `case_id` and returns the
    /// attempt's ticket. Overwrites whatever was recorded before.
    pub fn begin(&mut self, case_id: CaseId, decision: Decision, now_ms: u64) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.actions.insert(
            case_id,
            InFlightAction {
                decision,
                ticket,
                started_at_ms: now_ms,
            },
        );
        ticket
    }

    /// Clears the case's action state, whatever it was.
    pub fn end(&mut self, case_id: &CaseId) -> Option<InFlightAction> {
        self.actions.remove(case_id)
    }

    /// Clears the case's action state only if `ticket` is the attempt
    /// currently recorded. Returns `None` for a stale ticket.
    pub fn settle(&mut self, case_id: &CaseId, ticket: u64) -> Option<InFlightAction> {
        match self.actions.get(case_id) {
            Some(action) if action.ticket == ticket => self.actions.remove(case_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn status_of(&self, case_id: &CaseId) -> ActionStatus {
        self.actions
            .get(case_id)
            .map_or(ActionStatus::None, |a| a.decision.into())
    }

    #[must_use]
    pub fn is_idle(&self, case_id: &CaseId) -> bool {
        !self.actions.contains_key(case_id)
    }

    #[must_use]
    pub fn in_flight(&self, case_id: &CaseId) -> Option<&InFlightAction> {
        self.actions.get(case_id)
    }

    /// Removes every action that has been in flight for `timeout_ms` or
    /// longer and returns them in the order they began.
    pub fn expire(&mut self, now_ms: u64, timeout_ms: u64) -> Vec<(CaseId, InFlightAction)> {
        let expired_ids: Vec<CaseId> = self
            .actions
            .iter()
            .filter(|(_, action)| action.is_expired(now_ms, timeout_ms))
            .map(|(id, _)| id.clone())
            .collect();

        let mut expired: Vec<(CaseId, InFlightAction)> = expired_ids
            .into_iter()
            .filter_map(|id| self.actions.remove(&id).map(|action| (id, action)))
            .collect();
        expired.sort_by_key(|(_, action)| action.ticket);
        expired
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
