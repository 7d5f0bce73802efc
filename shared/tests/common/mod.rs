#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_http::protocol::{HttpResponse, HttpResult};
use enquete_core::{App, CaseId, Effect, Event, Model};
use serde_json::{json, Value};

pub type Tester = AppTester<App, Effect>;
pub type AppUpdate = Update<Effect, Event>;

/// Method, URL, body and headers of an HTTP request the core asked for.
pub struct SentRequest {
    pub method: String,
    pub url: String,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl SentRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub fn http_requests(update: &AppUpdate) -> Vec<SentRequest> {
    update
        .effects()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(SentRequest {
                method: request.operation.method.clone(),
                url: request.operation.url.clone(),
                body: request.operation.body.clone(),
                headers: request
                    .operation
                    .headers
                    .iter()
                    .map(|h| (h.name.clone(), h.value.clone()))
                    .collect(),
            }),
            Effect::Render(_) => None,
        })
        .collect()
}

pub fn renders(update: &AppUpdate) -> bool {
    update.effects().any(|e| matches!(e, Effect::Render(_)))
}

/// Answers the HTTP request in `update` the way a shell would and feeds the
/// resulting events back into the app.
pub fn respond(app: &Tester, model: &mut Model, update: &mut AppUpdate, result: HttpResult) {
    let request = update
        .effects_mut()
        .find_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            Effect::Render(_) => None,
        })
        .expect("update should carry an HTTP request");

    let resolved = app.resolve(request, result).expect("request resolves");
    for event in resolved.events {
        app.update(event, model);
    }
}

pub fn json_reply(status: u16, body: &Value) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).json(body).build())
}

pub fn unreachable(reason: &str) -> HttpResult {
    HttpResult::Err(crux_http::Error::Io(reason.to_string()))
}

pub fn pending_case(id: u64) -> Value {
    json!({
        "id": id,
        "numeroDossier": format!("D-{id:03}"),
        "typeDemande": "ENQ",
        "nom": "Dupont",
        "prenom": "Jean",
        "enqueteurNom": "Martin",
        "code_resultat": "P",
        "elements_retrouves": "A",
        "statut_validation": "en_attente",
        "updated_at": "2024-03-05T14:07:00Z"
    })
}

pub fn cases_reply(ids: &[u64]) -> HttpResult {
    let data: Vec<Value> = ids.iter().copied().map(pending_case).collect();
    json_reply(200, &json!({"success": true, "data": data}))
}

/// Runs one full successful load of `ids` at `now_ms`.
pub fn load(app: &Tester, model: &mut Model, ids: &[u64], now_ms: u64) {
    let mut update = app.update(Event::LoadRequested { now_ms }, model);
    respond(app, model, &mut update, cases_reply(ids));
    assert!(!model.is_loading());
}

pub fn decide(
    app: &Tester,
    model: &mut Model,
    id: u64,
    decision: enquete_core::Decision,
    now_ms: u64,
) -> AppUpdate {
    app.update(
        Event::DecisionRequested {
            case_id: CaseId::from(id),
            decision,
            now_ms,
        },
        model,
    )
}

pub fn ids(model: &Model) -> Vec<CaseId> {
    model.cases().iter().map(|c| c.id.clone()).collect()
}
