//! The list of cases awaiting validation and the state of the request that
//! refreshes it.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capabilities::{read_reply, ApiReply, HttpResult, TransportFailure};
use crate::model::{Case, CaseId, Model};
use crate::{MSG_CONNECTION_ERROR, MSG_LOAD_FAILED, MSG_TIMED_OUT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("server rejected the pending-case request: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("pending-case request timed out")]
    TimedOut,
}

impl LoadError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
            } => message.clone(),
            Self::Rejected { message: None } => MSG_LOAD_FAILED.into(),
            Self::Unreachable(_) => MSG_CONNECTION_ERROR.into(),
            Self::TimedOut => MSG_TIMED_OUT.into(),
        }
    }
}

impl From<TransportFailure> for LoadError {
    fn from(e: TransportFailure) -> Self {
        Self::Unreachable(e.0)
    }
}

/// Maps a decoded reply to the loader's result. A success without `data`
/// is not a well-formed list and counts as a rejection.
pub fn cases_from_reply(reply: ApiReply<Vec<Case>>) -> Result<Vec<Case>, LoadError> {
    match reply {
        ApiReply::Success(Some(cases)) => Ok(cases),
        ApiReply::Success(None) => Err(LoadError::Rejected { message: None }),
        ApiReply::Rejected { status, message } => {
            debug!(status, "pending-case request rejected");
            Err(LoadError::Rejected { message })
        }
    }
}

/// Reads the response to `GET /api/enquetes/a-valider`.
pub fn read_pending_cases(result: HttpResult) -> Result<Vec<Case>, LoadError> {
    cases_from_reply(read_reply(result)?)
}

/// Ordered, duplicate-free list of pending cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PendingCases {
    cases: Vec<Case>,
}

impl PendingCases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list. Returns how many incoming entries were
    /// dropped because they were not pending or repeated an identifier.
    pub fn replace_all(&mut self, incoming: Vec<Case>) -> usize {
        let total = incoming.len();
        let mut seen = HashSet::with_capacity(total);
        let mut cases = Vec::with_capacity(total);

        for case in incoming {
            if !case.validation_status.is_pending() {
                warn!(
                    case_id = %case.id,
                    status = case.validation_status.as_str(),
                    "dropping non-pending case from pending list"
                );
                continue;
            }
            if !seen.insert(case.id.clone()) {
                warn!(case_id = %case.id, "dropping duplicate case from pending list");
                continue;
            }
            cases.push(case);
        }

        self.cases = cases;
        total - self.cases.len()
    }

    /// Removes one case, keeping the order of the rest.
    pub fn remove(&mut self, case_id: &CaseId) -> Option<Case> {
        let index = self.cases.iter().position(|c| &c.id == case_id)?;
        Some(self.cases.remove(index))
    }

    #[must_use]
    pub fn get(&self, case_id: &CaseId) -> Option<&Case> {
        self.cases.iter().find(|c| &c.id == case_id)
    }

    #[must_use]
    pub fn contains(&self, case_id: &CaseId) -> bool {
        self.get(case_id).is_some()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<CaseId> {
        self.cases.iter().map(|c| c.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Case] {
        &self.cases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlightLoad {
    ticket: u64,
    started_at_ms: u64,
}

/// Pending list plus the bookkeeping of the request refreshing it.
#[derive(Debug, Default)]
pub struct CaseListLoader {
    cases: PendingCases,
    in_flight: Option<InFlightLoad>,
    next_ticket: u64,
    /// Cases decided while the current load was in flight. Its reply may
    /// predate the decision, so they are kept out of the refreshed list.
    decided_during_load: HashSet<CaseId>,
    loaded: bool,
}

impl CaseListLoader {
    #[must_use]
    pub fn cases(&self) -> &PendingCases {
        &self.cases
    }

    pub fn cases_mut(&mut self) -> &mut PendingCases {
        &mut self.cases
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn in_flight_ticket(&self) -> Option<u64> {
        self.in_flight.map(|l| l.ticket)
    }

    /// Whether at least one load has succeeded.
    #[must_use]
    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    /// Removes a case the backend has just decided. If a load is running,
    /// the case is also kept out of that load's reply.
    pub fn remove_decided(&mut self, case_id: &CaseId) -> Option<Case> {
        if self.in_flight.is_some() {
            self.decided_during_load.insert(case_id.clone());
        }
        self.cases.remove(case_id)
    }

    /// Marks a load as started. Returns `None` when one is already running.
    pub fn begin(&mut self, now_ms: u64) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        self.next_ticket += 1;
        self.decided_during_load.clear();
        self.in_flight = Some(InFlightLoad {
            ticket: self.next_ticket,
            started_at_ms: now_ms,
        });
        Some(self.next_ticket)
    }

    /// Settles the load identified by `ticket`. On success the list is
    /// replaced wholesale, minus cases decided while the load ran; on
    /// failure it is left as it was. Returns `None` when `ticket` is not the
    /// load in flight.
    pub fn complete(
        &mut self,
        ticket: u64,
        outcome: Result<Vec<Case>, LoadError>,
    ) -> Option<Result<&[Case], LoadError>> {
        if self.in_flight_ticket() != Some(ticket) {
            return None;
        }
        self.in_flight = None;
        let decided = std::mem::take(&mut self.decided_during_load);

        Some(outcome.map(|incoming| {
            let incoming = incoming
                .into_iter()
                .filter(|case| {
                    let keep = !decided.contains(&case.id);
                    if !keep {
                        debug!(case_id = %case.id, "skipping case decided during load");
                    }
                    keep
                })
                .collect();
            self.cases.replace_all(incoming);
            self.loaded = true;
            self.cases.as_slice()
        }))
    }

    /// Abandons a load that has run for `timeout_ms` or longer.
    pub fn expire(&mut self, now_ms: u64, timeout_ms: u64) -> bool {
        match self.in_flight {
            Some(load) if now_ms.saturating_sub(load.started_at_ms) >= timeout_ms => {
                self.in_flight = None;
                self.decided_during_load.clear();
                true
            }
            _ => false,
        }
    }
}

impl Model {
    /// Starts a refresh of the pending list. Clears the notification slot.
    /// Returns the load's ticket, or `None` if a load is already running.
    pub fn begin_load(&mut self, now_ms: u64) -> Option<u64> {
        let ticket = self.pending.begin(now_ms)?;
        self.notification.clear();
        Some(ticket)
    }

    /// Applies the outcome of load `ticket` and publishes an error
    /// notification on failure. Returns the number of pending cases, or
    /// `None` for a load that was already settled.
    pub fn finish_load(
        &mut self,
        ticket: u64,
        outcome: Result<Vec<Case>, LoadError>,
    ) -> Option<Result<usize, LoadError>> {
        let Some(settled) = self.pending.complete(ticket, outcome) else {
            debug!(ticket, "ignoring response for a load that already settled");
            return None;
        };

        match settled {
            Ok(cases) => {
                let count = cases.len();
                info!(count, "pending cases loaded");
                Some(Ok(count))
            }
            Err(e) => {
                match &e {
                    LoadError::Unreachable(reason) => {
                        warn!(%reason, "pending cases: backend unreachable");
                    }
                    other => warn!(error = %other, "pending cases: load failed"),
                }
                self.notification.set_error(e.user_message());
                Some(Err(e))
            }
        }
    }

    /// Times out a stuck load. Returns whether one was abandoned.
    pub fn expire_load(&mut self, now_ms: u64) -> bool {
        if !self.pending.expire(now_ms, self.config.load_timeout_ms) {
            return false;
        }
        warn!(timeout_ms = self.config.load_timeout_ms, "pending-case request timed out");
        self.notification.set_error(LoadError::TimedOut.user_message());
        true
    }
}
