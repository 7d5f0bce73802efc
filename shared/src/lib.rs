// lib.rs - enquête validation core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod action;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;
pub mod notification;
pub mod pending;
pub mod validation;
pub mod view;

pub use action::{ActionStatus, ActionTracker, InFlightAction};
pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{AdminConfig, ConfigError};
pub use crux_core::App as CruxApp;
pub use event::Event;
pub use model::{Case, CaseId, Model, RequestType, ResultCode, ValidationStatus};
pub use notification::{Notification, NotificationKind, NotificationState};
pub use pending::{CaseListLoader, LoadError, PendingCases};
pub use validation::{Decision, Settlement, SubmitError, Submission};
pub use view::{CaseRow, NotificationView, ViewModel};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_ADMIN_NAME: &str = "Administrateur";
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SUCCESS_NOTIFICATION_MS: u64 = 3_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;

pub const MSG_CONNECTION_ERROR: &str = "Erreur de connexion au serveur";
pub const MSG_LOAD_FAILED: &str = "Erreur lors du chargement des enquêtes";
pub const MSG_VALIDATION_FAILED: &str = "Erreur lors de la validation de l'enquête";
pub const MSG_TIMED_OUT: &str = "Délai dépassé, veuillez réessayer";
pub const MSG_CONFIRMED: &str = "Enquête confirmée avec succès";
pub const MSG_REFUSED: &str = "Enquête refusée avec succès";
pub const MSG_NO_PENDING_CASES: &str = "Aucune enquête en attente de validation";
