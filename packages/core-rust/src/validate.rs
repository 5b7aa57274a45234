//! Launch payload validation.
//!
//! Rules run in a fixed order and the first failing rule is reported, so a
//! given bad payload always yields the same [`ValidationError`]. Fields the
//! validator does not know about are ignored.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::registry::ModuleRegistry;
use crate::types::{NewLaunchRequest, Requester};

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;

/// WHATWG addr-spec with at least two domain labels.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email pattern is a valid regex")
});

/// Why a launch payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("\"{0}\" is required")]
    MissingField(&'static str),
    #[error("\"{field}\" must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("\"module\" must be one of the known modules, got \"{0}\"")]
    UnknownModule(String),
    #[error("\"requester.email\" must be a valid email")]
    InvalidEmail,
}

impl ValidationError {
    /// The payload field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MalformedBody(_) | Self::NotAnObject => None,
            Self::MissingField(field) | Self::WrongType { field, .. } => Some(*field),
            Self::UnknownModule(_) => Some("module"),
            Self::InvalidEmail => Some("requester.email"),
        }
    }
}

/// Checks inbound launch payloads against the module registry and the
/// requester shape.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    registry: Arc<ModuleRegistry>,
}

impl RequestValidator {
    /// Creates a validator whose accepted module set is exactly `registry`.
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this validator accepts modules from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Parses a raw request body and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedBody`] for invalid JSON, otherwise
    /// whatever [`validate`](Self::validate) reports.
    pub fn validate_bytes(&self, body: &[u8]) -> Result<NewLaunchRequest, ValidationError> {
        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        self.validate(&payload)
    }

    /// Validates a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule as a [`ValidationError`].
    pub fn validate(&self, payload: &Value) -> Result<NewLaunchRequest, ValidationError> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;

        let module = match object.get("module") {
            None => return Err(ValidationError::MissingField("module")),
            Some(Value::String(module)) => module,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "module",
                    expected: "string",
                })
            }
        };
        if !self.registry.contains(module) {
            return Err(ValidationError::UnknownModule(module.clone()));
        }

        let requester = match object.get("requester") {
            None => return Err(ValidationError::MissingField("requester")),
            Some(Value::Object(requester)) => requester,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "requester",
                    expected: "object",
                })
            }
        };

        let email = match requester.get("email") {
            None => return Err(ValidationError::MissingField("requester.email")),
            Some(Value::String(email)) => email,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "requester.email",
                    expected: "string",
                })
            }
        };
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(NewLaunchRequest {
            module: module.clone(),
            requester: Requester {
                email: email.clone(),
            },
        })
    }
}

/// Email syntax check used for `requester.email`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN {
        return false;
    }
    let Some((local, _domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.len() > MAX_LOCAL_PART_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }
    EMAIL_RE.is_match(email)
}
