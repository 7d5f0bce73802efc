use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::action::ActionTracker;
use crate::config::AdminConfig;
use crate::notification::NotificationState;
use crate::pending::CaseListLoader;

/// Opaque case identifier. The backend sends integer ids; strings are
/// accepted too so the core never depends on the id's shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CaseId(pub String);

impl CaseId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for CaseId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for CaseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Scalar::deserialize(deserializer).map(|s| Self(s.into_string()))
    }
}

/// JSON scalar that the backend may send either quoted or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Unsigned(n) => n.to_string(),
            Self::Signed(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
        }
    }
}

fn scalar_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

fn text_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestType {
    Investigation,
    Dispute,
    #[default]
    Unknown,
}

impl RequestType {
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "enq" | "enquete" | "enquête" | "investigation" => Self::Investigation,
            "con" | "contestation" | "dispute" => Self::Dispute,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Investigation => "enquete",
            Self::Dispute => "contestation",
            Self::Unknown => "inconnu",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Investigation => "Enquête",
            Self::Dispute => "Contestation",
            Self::Unknown => "Inconnu",
        }
    }
}

impl Serialize for RequestType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RequestType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map_or(Self::Unknown, |s| Self::from_wire(&s)))
    }
}

/// Outcome code attached by the investigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Positive,
    Negative,
    AddressConfirmed,
    CancelledByAgency,
    Untreatable,
    CancelledByClient,
}

impl ResultCode {
    pub const ALL: [Self; 6] = [
        Self::Positive,
        Self::Negative,
        Self::AddressConfirmed,
        Self::CancelledByAgency,
        Self::Untreatable,
        Self::CancelledByClient,
    ];

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "P" => Some(Self::Positive),
            "N" => Some(Self::Negative),
            "H" => Some(Self::AddressConfirmed),
            "Z" => Some(Self::CancelledByAgency),
            "I" => Some(Self::Untreatable),
            "Y" => Some(Self::CancelledByClient),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Positive => "P",
            Self::Negative => "N",
            Self::AddressConfirmed => "H",
            Self::CancelledByAgency => "Z",
            Self::Untreatable => "I",
            Self::CancelledByClient => "Y",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positif",
            Self::Negative => "Négatif",
            Self::AddressConfirmed => "Adresse confirmée",
            Self::CancelledByAgency => "Annulée (agence)",
            Self::Untreatable => "Intraitable",
            Self::CancelledByClient => "Annulée (EOS)",
        }
    }
}

impl Serialize for ResultCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

// Unknown or blank codes read as "no code" instead of failing the whole list.
fn result_code_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ResultCode>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|s| ResultCode::from_code(&s)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationStatus {
    #[default]
    Pending,
    Confirmed,
    Refused,
    Unknown,
}

impl ValidationStatus {
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "en_attente" | "pending" => Self::Pending,
            "confirmee" | "confirmée" | "confirmed" => Self::Confirmed,
            "refusee" | "refusée" | "refused" => Self::Refused,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "en_attente",
            Self::Confirmed => "confirmee",
            Self::Refused => "refusee",
            Self::Unknown => "inconnu",
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl Serialize for ValidationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValidationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map_or(Self::Pending, |s| Self::from_wire(&s)))
    }
}

/// One enquête awaiting an admin decision, as sent by
/// `GET /api/enquetes/a-valider`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    #[serde(rename = "numeroDossier", default, deserialize_with = "scalar_opt")]
    pub case_number: Option<String>,
    #[serde(rename = "typeDemande", default)]
    pub request_type: RequestType,
    #[serde(rename = "nom", default, deserialize_with = "text_opt")]
    pub last_name: Option<String>,
    #[serde(rename = "prenom", default, deserialize_with = "text_opt")]
    pub first_name: Option<String>,
    #[serde(rename = "enqueteurNom", default, deserialize_with = "text_opt")]
    pub investigator_name: Option<String>,
    #[serde(rename = "code_resultat", default, deserialize_with = "result_code_opt")]
    pub result_code: Option<ResultCode>,
    #[serde(rename = "elements_retrouves", default, deserialize_with = "text_opt")]
    pub elements_found: Option<String>,
    #[serde(rename = "statut_validation", default)]
    pub validation_status: ValidationStatus,
    #[serde(default, deserialize_with = "text_opt")]
    pub updated_at: Option<String>,
}

impl Case {
    #[must_use]
    pub fn new(id: impl Into<CaseId>) -> Self {
        Self {
            id: id.into(),
            case_number: None,
            request_type: RequestType::Unknown,
            last_name: None,
            first_name: None,
            investigator_name: None,
            result_code: None,
            elements_found: None,
            validation_status: ValidationStatus::Pending,
            updated_at: None,
        }
    }

    /// "Prénom Nom", skipping whichever half is missing.
    #[must_use]
    pub fn subject_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn display_updated_at(&self) -> String {
        self.updated_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default()
    }
}

/// Formats a backend timestamp as `DD/MM/YYYY HH:MM`.
///
/// Accepts RFC 3339, RFC 2822 (the HTTP-date style some backends emit for
/// datetimes) and naive `YYYY-MM-DD HH:MM:SS[.f]` strings. Anything else is
/// returned unchanged.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    const DISPLAY: &str = "%d/%m/%Y %H:%M";
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format(DISPLAY).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt.format(DISPLAY).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return dt.format(DISPLAY).to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }

    raw.to_string()
}

#[derive(Debug)]
pub struct Model {
    pub config: AdminConfig,
    pub pending: CaseListLoader,
    pub actions: ActionTracker,
    pub notification: NotificationState,
    /// Latest time reported by the shell. Never moves backwards.
    clock_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self::with_config(AdminConfig::default())
    }
}

impl Model {
    #[must_use]
    pub fn with_config(config: AdminConfig) -> Self {
        let notification = NotificationState::new(config.success_notification_ms);
        Self {
            config,
            pending: CaseListLoader::default(),
            actions: ActionTracker::default(),
            notification,
            clock_ms: 0,
        }
    }

    /// Advances the model clock to `now_ms`. Older readings are ignored.
    pub fn observe_time(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Swaps the configuration. Loaded cases and in-flight actions survive;
    /// only later requests use the new endpoint.
    pub fn reconfigure(&mut self, config: AdminConfig) {
        self.notification
            .set_success_ttl_ms(config.success_notification_ms);
        self.config = config;
    }

    #[must_use]
    pub fn cases(&self) -> &[Case] {
        self.pending.cases().as_slice()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_id_accepts_numbers_and_strings() {
        let a: CaseId = serde_json::from_str("42").unwrap();
        let b: CaseId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
    }

    #[test]
    fn decodes_backend_case() {
        let json = r#"{
            "id": 7,
            "numeroDossier": 120045,
            "typeDemande": "ENQ",
            "nom": "DUPONT",
            "prenom": "Marie",
            "enqueteurNom": "Martin",
            "code_resultat": "P",
            "elements_retrouves": "A,T",
            "statut_validation": "en_attente",
            "updated_at": "2024-03-15T14:02:26"
        }"#;
        let case: Case = serde_json::from_str(json).unwrap();
        assert_eq!(case.id, CaseId::new("7"));
        assert_eq!(case.case_number.as_deref(), Some("120045"));
        assert_eq!(case.request_type, RequestType::Investigation);
        assert_eq!(case.subject_name(), "Marie DUPONT");
        assert_eq!(case.result_code, Some(ResultCode::Positive));
        assert!(case.validation_status.is_pending());
        assert_eq!(case.display_updated_at(), "15/03/2024 14:02");
    }

    #[test]
    fn sparse_case_uses_defaults() {
        let case: Case = serde_json::from_str(
            r#"{"id": "x1", "code_resultat": "", "nom": null, "typeDemande": null}"#,
        )
        .unwrap();
        assert_eq!(case.result_code, None);
        assert_eq!(case.last_name, None);
        assert_eq!(case.request_type, RequestType::Unknown);
        assert_eq!(case.validation_status, ValidationStatus::Pending);
        assert_eq!(case.subject_name(), "");
    }

    #[test]
    fn unknown_status_is_not_pending() {
        let case: Case =
            serde_json::from_str(r#"{"id": 1, "statut_validation": "archivee"}"#).unwrap();
        assert_eq!(case.validation_status, ValidationStatus::Unknown);
        assert!(!case.validation_status.is_pending());
    }

    #[test]
    fn result_codes_round_trip_through_their_letter() {
        for code in ResultCode::ALL {
            assert_eq!(ResultCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ResultCode::from_code("q"), None);
        assert_eq!(ResultCode::from_code("h"), Some(ResultCode::AddressConfirmed));
    }

    #[test]
    fn timestamp_formats() {
        assert_eq!(format_timestamp("2024-03-15T14:02:26.123Z"), "15/03/2024 14:02");
        assert_eq!(
            format_timestamp("Fri, 15 Mar 2024 14:02:26 GMT"),
            "15/03/2024 14:02"
        );
        assert_eq!(format_timestamp("2024-03-15 09:05:00"), "15/03/2024 09:05");
        assert_eq!(format_timestamp("2024-03-15"), "15/03/2024");
        assert_eq!(format_timestamp("hier"), "hier");
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut model = Model::default();
        model.observe_time(5_000);
        model.observe_time(4_000);
        assert_eq!(model.now_ms(), 5_000);
        model.observe_time(6_000);
        assert_eq!(model.now_ms(), 6_000);
    }

    #[test]
    fn reconfigure_keeps_loaded_state() {
        let mut model = Model::default();
        model.pending.cases_mut().replace_all(vec![Case::new("1")]);
        model.reconfigure(AdminConfig::new("https://eos.example.com"));
        assert_eq!(model.cases().len(), 1);
        assert_eq!(model.config.api_base_url, "https://eos.example.com");
    }
}
