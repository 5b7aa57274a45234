use serde::{Deserialize, Serialize};

/// Identity of whoever asked for a module launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Contact address, syntax-checked by the validator.
    pub email: String,
}

/// A launch request that passed validation but has not been stored yet.
///
/// Carries no identifier and no timestamp: both are assigned by the
/// request store at write time, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLaunchRequest {
    /// Module identifier, guaranteed to be present in the module registry.
    pub module: String,
    /// Who asked for the launch.
    pub requester: Requester,
}

/// A durably recorded launch request.
///
/// Created once by a successful store append and never mutated afterwards.
/// Serialized with camelCase field names; this is also the stored document
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Store-assigned, globally unique identifier.
    pub request_id: String,
    /// Module identifier.
    pub module: String,
    /// Who asked for the launch.
    pub requester: Requester,
    /// Store-assigned write time in millis since the Unix epoch.
    /// Non-decreasing in insertion order within one store.
    pub requested_at: i64,
}

impl LaunchRequest {
    /// Builds the stored record from a validated request plus the values the
    /// store assigns.
    #[must_use]
    pub fn from_new(new: NewLaunchRequest, request_id: String, requested_at: i64) -> Self {
        Self {
            request_id,
            module: new.module,
            requester: new.requester,
            requested_at,
        }
    }
}

/// Wire payload published to a module's channel.
///
/// Only the request id travels downstream; consumers re-fetch the full
/// request from the store when they need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchEvent {
    /// Identifier returned by the store's append.
    pub request_id: String,
}

impl LaunchEvent {
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Encodes the event as `{"requestId":"..."}`.
    ///
    /// # Errors
    ///
    /// Returns an error only if JSON serialization fails, which cannot happen
    /// for a single string field but is propagated rather than assumed.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_event_encodes_only_request_id() {
        let bytes = LaunchEvent::new("r1").to_json_bytes().unwrap();
        assert_eq!(bytes, br#"{"requestId":"r1"}"#);
    }

    #[test]
    fn launch_request_uses_camel_case_document_fields() {
        let request = LaunchRequest::from_new(
            NewLaunchRequest {
                module: "alpha-fold".to_string(),
                requester: Requester {
                    email: "a@b.com".to_string(),
                },
            },
            "r1".to_string(),
            1_700_000_000_000,
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requestId"], "r1");
        assert_eq!(json["module"], "alpha-fold");
        assert_eq!(json["requester"]["email"], "a@b.com");
        assert_eq!(json["requestedAt"], 1_700_000_000_000_i64);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
