use serde::{Deserialize, Serialize};

use crate::action::ActionStatus;
use crate::model::{Case, Model};
use crate::notification::{Notification, NotificationKind};
use crate::MSG_NO_PENDING_CASES;

/// One table row, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRow {
    pub id: String,
    pub case_number: String,
    pub request_type_label: String,
    pub subject_name: String,
    pub investigator_name: String,
    pub result_code: Option<String>,
    pub result_label: Option<String>,
    pub elements_found: String,
    pub updated_at: String,
    pub action: ActionStatus,
    /// Both buttons are disabled while any decision on this row is in flight.
    pub actions_disabled: bool,
}

impl CaseRow {
    fn new(case: &Case, action: ActionStatus) -> Self {
        Self {
            id: case.id.to_string(),
            case_number: case.case_number.clone().unwrap_or_default(),
            request_type_label: case.request_type.label().to_string(),
            subject_name: case.subject_name(),
            investigator_name: case.investigator_name.clone().unwrap_or_default(),
            result_code: case.result_code.map(|c| c.code().to_string()),
            result_label: case.result_code.map(|c| c.label().to_string()),
            elements_found: case.elements_found.clone().unwrap_or_default(),
            updated_at: case.display_updated_at(),
            action,
            actions_disabled: !action.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub message: String,
    pub kind: NotificationKind,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            message: n.message.clone(),
            kind: n.kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub loading: bool,
    pub rows: Vec<CaseRow>,
    pub pending_count: usize,
    pub in_progress_count: usize,
    pub notification: Option<NotificationView>,
    /// Set only after a successful load left nothing pending.
    pub empty_message: Option<String>,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let rows: Vec<CaseRow> = model
            .cases()
            .iter()
            .map(|case| CaseRow::new(case, model.actions.status_of(&case.id)))
            .collect();
        let loading = model.is_loading();
        let settled_empty = !loading && model.pending.has_loaded() && rows.is_empty();

        Self {
            loading,
            pending_count: rows.len(),
            in_progress_count: rows.iter().filter(|r| r.actions_disabled).count(),
            empty_message: settled_empty.then(|| MSG_NO_PENDING_CASES.to_string()),
            notification: model.notification.current().map(NotificationView::from),
            rows,
        }
    }
}
