//! Confirm/refuse submissions for a single case.
//!
//! A submission is split in two halves around the `Http` effect:
//! [`Model::begin_submission`] marks the case busy and hands back a ticket,
//! [`Model::settle_submission`] applies the response. The ticket lets a
//! response that arrives after its attempt was timed out be told apart from
//! the current one.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capabilities::{read_reply, ApiReply, HttpResult};
use crate::model::{CaseId, Model};
use crate::{
    MSG_CONFIRMED, MSG_CONNECTION_ERROR, MSG_REFUSED, MSG_TIMED_OUT, MSG_VALIDATION_FAILED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Refuse,
}

impl Decision {
    /// The `action` value the backend expects.
    #[must_use]
    pub const fn wire_action(self) -> &'static str {
        match self {
            Self::Confirm => "confirmer",
            Self::Refuse => "refuser",
        }
    }

    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Confirm => MSG_CONFIRMED,
            Self::Refuse => MSG_REFUSED,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Refuse => "refuse",
        }
    }
}

/// Body of `PUT /api/enquete/valider/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRequest<'a> {
    pub action: &'static str,
    pub admin_nom: &'a str,
}

impl<'a> ValidationRequest<'a> {
    #[must_use]
    pub fn new(decision: Decision, admin_name: &'a str) -> Self {
        Self {
            action: decision.wire_action(),
            admin_nom: admin_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("server rejected the decision: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("decision request timed out")]
    TimedOut,

    #[error("an action is already in progress for this case")]
    ActionInProgress,

    #[error("case is not in the pending list")]
    UnknownCase,
}

impl SubmitError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
            } => message.clone(),
            Self::Rejected { message: None } | Self::ActionInProgress | Self::UnknownCase => {
                MSG_VALIDATION_FAILED.into()
            }
            Self::Transport(_) => MSG_CONNECTION_ERROR.into(),
            Self::TimedOut => MSG_TIMED_OUT.into(),
        }
    }
}

/// Reads the response to a decision request. The reply's `data` is ignored.
pub fn read_decision(result: HttpResult) -> Result<(), SubmitError> {
    match read_reply::<IgnoredAny>(result) {
        Ok(ApiReply::Success(_)) => Ok(()),
        Ok(ApiReply::Rejected { status, message }) => {
            debug!(status, "decision rejected by backend");
            Err(SubmitError::Rejected { message })
        }
        Err(failure) => Err(SubmitError::Transport(failure.0)),
    }
}

/// A started submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: u64,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The response belonged to the case's current attempt.
    Settled(Result<(), SubmitError>),
    /// The attempt had already been settled (timed out) before the response came.
    Stale,
}

impl Model {
    /// Refuses a submission before anything is sent.
    pub fn check_submission(&self, case_id: &CaseId) -> Result<(), SubmitError> {
        if !self.actions.is_idle(case_id) {
            return Err(SubmitError::ActionInProgress);
        }
        if !self.pending.cases().contains(case_id) {
            return Err(SubmitError::UnknownCase);
        }
        Ok(())
    }

    /// Marks `case_id` busy with `decision` and clears the notification
    /// slot. Returns the attempt's ticket and request id.
    pub fn begin_submission(
        &mut self,
        case_id: CaseId,
        decision: Decision,
        now_ms: u64,
    ) -> Submission {
        self.notification.clear();
        let ticket = self.actions.begin(case_id, decision, now_ms);
        Submission {
            ticket,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Applies the outcome of attempt `ticket` on `case_id`.
    pub fn settle_submission(
        &mut self,
        case_id: &CaseId,
        ticket: u64,
        decision: Decision,
        outcome: Result<(), SubmitError>,
        now_ms: u64,
    ) -> Settlement {
        if self.actions.settle(case_id, ticket).is_none() {
            match outcome {
                Ok(()) => {
                    // The backend applied it; the row must go regardless.
                    self.pending.remove_decided(case_id);
                    info!(%case_id, ticket, decision = decision.as_str(), "late decision applied");
                }
                Err(e) => {
                    debug!(%case_id, ticket, error = %e, "ignoring late decision failure");
                }
            }
            return Settlement::Stale;
        }

        match outcome {
            Ok(()) => {
                self.pending.remove_decided(case_id);
                self.notification
                    .set_success(decision.success_message(), now_ms);
                info!(%case_id, decision = decision.as_str(), "decision applied");
                Settlement::Settled(Ok(()))
            }
            Err(e) => {
                warn!(%case_id, decision = decision.as_str(), error = %e, "decision failed");
                self.notification.set_error(e.user_message());
                Settlement::Settled(Err(e))
            }
        }
    }

    /// Times out submissions older than the configured action timeout.
    /// Returns the affected cases.
    pub fn expire_submissions(&mut self, now_ms: u64) -> Vec<CaseId> {
        let expired = self
            .actions
            .expire(now_ms, self.config.action_timeout_ms);
        if expired.is_empty() {
            return Vec::new();
        }

        for (case_id, action) in &expired {
            warn!(
                %case_id,
                ticket = action.ticket,
                decision = action.decision.as_str(),
                "decision request timed out"
            );
        }
        self.notification
            .set_error(SubmitError::TimedOut.user_message());
        expired.into_iter().map(|(id, _)| id).collect()
    }
}
