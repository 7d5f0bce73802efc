use tracing::{debug, info, warn};

use crate::capabilities::{ApiEndpoint, Capabilities};
use crate::event::Event;
use crate::model::{CaseId, Model};
use crate::pending::{read_pending_cases, LoadError};
use crate::validation::{read_decision, Decision, SubmitError, ValidationRequest};
use crate::view::ViewModel;

const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Default)]
pub struct App;

impl App {
    fn start_load(model: &mut Model, caps: &Capabilities) {
        let url = match ApiEndpoint::PendingCases.url(&model.config.api_base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build pending-cases URL");
                model
                    .notification
                    .set_error(LoadError::Unreachable(e.to_string()).user_message());
                return;
            }
        };

        let now_ms = model.now_ms();
        let Some(ticket) = model.begin_load(now_ms) else {
            debug!("load already in flight, ignoring request");
            return;
        };

        debug!(ticket, %url, "loading pending cases");
        caps.http
            .get(url)
            .header("Accept", "application/json")
            .send(move |result| Event::PendingCasesLoaded {
                ticket,
                result: Box::new(result),
            });
    }

    fn start_submission(
        model: &mut Model,
        case_id: CaseId,
        decision: Decision,
        caps: &Capabilities,
    ) {
        if let Err(e) = model.check_submission(&case_id) {
            warn!(%case_id, decision = decision.as_str(), error = %e, "decision refused locally");
            return;
        }

        let url = match ApiEndpoint::ValidateCase(case_id.clone()).url(&model.config.api_base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(%case_id, error = %e, "cannot build validation URL");
                model
                    .notification
                    .set_error(SubmitError::Transport(e.to_string()).user_message());
                return;
            }
        };

        let now_ms = model.now_ms();
        let submission = model.begin_submission(case_id.clone(), decision, now_ms);
        let body = ValidationRequest::new(decision, &model.config.admin_name);

        let builder = match caps
            .http
            .put(url)
            .header(REQUEST_ID_HEADER, submission.request_id.as_str())
            .body_json(&body)
        {
            Ok(builder) => builder,
            Err(e) => {
                warn!(%case_id, error = ?e, "cannot encode validation body");
                model.actions.end(&case_id);
                model
                    .notification
                    .set_error(SubmitError::Rejected { message: None }.user_message());
                return;
            }
        };

        info!(
            %case_id,
            decision = decision.as_str(),
            request_id = %submission.request_id,
            "submitting decision"
        );

        let ticket = submission.ticket;
        let request_id = submission.request_id;
        builder.send(move |result| Event::DecisionSettled {
            case_id,
            ticket,
            decision,
            request_id,
            result: Box::new(result),
        });
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_user_initiated() {
            debug!(event = event.name(), "user action");
        }

        match event {
            Event::Noop => {}

            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(api_base_url = %config.api_base_url, "configuration applied");
                    model.reconfigure(config);
                }
                Err(e) => warn!(error = %e, "rejected configuration"),
            },

            Event::LoadRequested { now_ms } => {
                model.observe_time(now_ms);
                Self::start_load(model, caps);
                caps.render.render();
            }

            Event::DecisionRequested {
                case_id,
                decision,
                now_ms,
            } => {
                model.observe_time(now_ms);
                Self::start_submission(model, case_id, decision, caps);
                caps.render.render();
            }

            Event::DismissNotification => {
                model.notification.clear();
                caps.render.render();
            }

            Event::Tick { now_ms } => {
                model.observe_time(now_ms);
                let now_ms = model.now_ms();
                let expired = model.expire_submissions(now_ms);
                let load_expired = model.expire_load(now_ms);
                let toast_expired = model.notification.expire(now_ms);

                if !expired.is_empty() || load_expired || toast_expired {
                    caps.render.render();
                }
            }

            Event::PendingCasesLoaded { ticket, result } => {
                let outcome = read_pending_cases(*result);
                if model.finish_load(ticket, outcome).is_some() {
                    caps.render.render();
                }
            }

            Event::DecisionSettled {
                case_id,
                ticket,
                decision,
                request_id,
                result,
            } => {
                let outcome = read_decision(*result);
                debug!(%case_id, %request_id, ok = outcome.is_ok(), "decision response");
                let now_ms = model.now_ms();
                model.settle_submission(&case_id, ticket, decision, outcome, now_ms);
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
