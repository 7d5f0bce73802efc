use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::CaseId;

/// What the `Http` capability hands back to the core.
pub type HttpResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("base URL '{0}' cannot be used as a base")]
    CannotBeABase(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBase { url: String, reason: String },
}

/// The REST routes this core talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEndpoint {
    PendingCases,
    ValidateCase(CaseId),
}

impl ApiEndpoint {
    pub fn method(&self) -> HttpMethod {
        match self {
            ApiEndpoint::PendingCases => HttpMethod::Get,
            ApiEndpoint::ValidateCase(_) => HttpMethod::Put,
        }
    }

    fn segments(&self) -> Vec<&str> {
        match self {
            ApiEndpoint::PendingCases => vec!["api", "enquetes", "a-valider"],
            ApiEndpoint::ValidateCase(id) => vec!["api", "enquete", "valider", id.as_str()],
        }
    }

    /// Joins the route onto `base`, keeping any path prefix the base already
    /// has. Each segment is percent-encoded.
    pub fn url(&self, base: &str) -> Result<String, EndpointError> {
        let mut url = Url::parse(base).map_err(|e| EndpointError::InvalidBase {
            url: base.to_string(),
            reason: e.to_string(),
        })?;

        url.path_segments_mut()
            .map_err(|()| EndpointError::CannotBeABase(base.to_string()))?
            .pop_if_empty()
            .extend(self.segments());

        Ok(url.to_string())
    }
}

/// Every backend reply is wrapped in `{success, data?, error?, message?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A settled request that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply<T> {
    Success(Option<T>),
    Rejected { status: u16, message: Option<String> },
}

/// The request never produced a response (network down, DNS, CORS...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {0}")]
pub struct TransportFailure(pub String);

/// Interprets a response body. A reply only counts as success when the
/// status is 2xx *and* the envelope says `success: true`; a body that does
/// not decode is a rejection with no server message.
pub fn decode_reply<T: DeserializeOwned>(status: u16, body: &[u8]) -> ApiReply<T> {
    let success_status = (200..300).contains(&status);

    match serde_json::from_slice::<ApiEnvelope<T>>(body) {
        Ok(envelope) if success_status && envelope.success => ApiReply::Success(envelope.data),
        Ok(envelope) => ApiReply::Rejected {
            status,
            message: envelope
                .error
                .or(envelope.message)
                .filter(|m| !m.trim().is_empty()),
        },
        Err(e) => {
            tracing::warn!(status, error = %e, "undecodable backend reply");
            ApiReply::Rejected {
                status,
                message: None,
            }
        }
    }
}

/// Splits what the `Http` capability returned into "reached the backend"
/// and "never got there".
///
/// `crux_http` hands 4xx/5xx replies back as `Error::Http` carrying the
/// status and body, so those still count as backend replies.
pub fn read_reply<T: DeserializeOwned>(result: HttpResult) -> Result<ApiReply<T>, TransportFailure> {
    match result {
        Ok(mut response) => {
            let status: u16 = response.status().into();
            let body = response.take_body().unwrap_or_default();
            Ok(decode_reply(status, &body))
        }
        Err(crux_http::Error::Http(error)) => {
            let status: u16 = error.code.into();
            Ok(decode_reply(status, &error.body.unwrap_or_default()))
        }
        Err(e) => Err(TransportFailure(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IgnoredAny;

    #[test]
    fn pending_cases_url() {
        let url = ApiEndpoint::PendingCases
            .url("http://localhost:5000")
            .unwrap();
        assert_eq!(url, "http://localhost:5000/api/enquetes/a-valider");
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let url = ApiEndpoint::PendingCases
            .url("https://eos.example.com/backend/")
            .unwrap();
        assert_eq!(url, "https://eos.example.com/backend/api/enquetes/a-valider");
    }

    #[test]
    fn validate_url_encodes_case_id() {
        let url = ApiEndpoint::ValidateCase(CaseId::new("12 3"))
            .url("http://localhost:5000")
            .unwrap();
        assert_eq!(url, "http://localhost:5000/api/enquete/valider/12%203");
    }

    #[test]
    fn endpoint_methods() {
        assert_eq!(ApiEndpoint::PendingCases.method(), HttpMethod::Get);
        assert_eq!(
            ApiEndpoint::ValidateCase(CaseId::new("1")).method().as_str(),
            "PUT"
        );
    }

    #[test]
    fn bad_base_is_reported() {
        assert!(ApiEndpoint::PendingCases.url("not a url").is_err());
        assert!(matches!(
            ApiEndpoint::PendingCases.url("mailto:admin@example.com"),
            Err(EndpointError::CannotBeABase(_))
        ));
    }

    #[test]
    fn success_envelope() {
        let reply: ApiReply<Vec<u32>> = decode_reply(200, br#"{"success": true, "data": [1, 2]}"#);
        assert_eq!(reply, ApiReply::Success(Some(vec![1, 2])));
    }

    #[test]
    fn success_flag_false_is_rejection() {
        let reply: ApiReply<IgnoredAny> =
            decode_reply(200, br#"{"success": false, "error": "already processed"}"#);
        match reply {
            ApiReply::Rejected { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message.as_deref(), Some("already processed"));
            }
            ApiReply::Success(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn message_field_is_fallback() {
        let reply: ApiReply<IgnoredAny> =
            decode_reply(404, br#"{"success": false, "message": "introuvable"}"#);
        assert!(matches!(
            reply,
            ApiReply::Rejected { status: 404, message: Some(ref m) } if m == "introuvable"
        ));
    }

    #[test]
    fn non_2xx_with_success_true_is_rejection() {
        let reply: ApiReply<IgnoredAny> = decode_reply(500, br#"{"success": true}"#);
        assert!(matches!(reply, ApiReply::Rejected { status: 500, message: None }));
    }

    #[test]
    fn html_error_page_is_rejection_without_message() {
        let reply: ApiReply<IgnoredAny> = decode_reply(502, b"<html>Bad Gateway</html>");
        assert!(matches!(reply, ApiReply::Rejected { status: 502, message: None }));
    }

    #[test]
    fn io_and_timeout_errors_are_transport_failures() {
        let io: Result<ApiReply<IgnoredAny>, _> =
            read_reply(Err(crux_http::Error::Io("connection refused".into())));
        assert!(matches!(io, Err(TransportFailure(ref m)) if m.contains("connection refused")));

        let timeout: Result<ApiReply<IgnoredAny>, _> = read_reply(Err(crux_http::Error::Timeout));
        assert!(timeout.is_err());
    }

    #[test]
    fn blank_server_message_is_dropped() {
        let reply: ApiReply<IgnoredAny> = decode_reply(200, br#"{"success": false, "error": " "}"#);
        assert!(matches!(reply, ApiReply::Rejected { message: None, .. }));
    }
}
