//! Wire types exchanged with the session backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path of the session probe endpoint.
pub const ME_PATH: &str = "/api/users/me";
/// Path of the account creation endpoint.
pub const SIGNUP_PATH: &str = "/api/users/signup";
/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/api/users/login";
/// Path of the logout endpoint.
pub const LOGOUT_PATH: &str = "/api/users/logout";

const ADMIN_ROLE: &str = "admin";

/// A user record as returned by the backend.
///
/// The record is opaque apart from the optional `role` field, which decides whether
/// the user is treated as an administrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Wraps a raw JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the `role` field if it is a string.
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// Returns `true` if the role is exactly `"admin"`.
    pub fn has_admin_role(&self) -> bool {
        self.role() == Some(ADMIN_ROLE)
    }

    /// Returns an arbitrary field of the record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A demo administrator record, supplied by the caller and stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminProfile(Value);

impl AdminProfile {
    /// Wraps any JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the stored value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the record, returning the stored value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for AdminProfile {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Body of `POST /api/users/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/users/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload of a successful signup or login.
///
/// Only `user` is interpreted. Any other fields the backend sends are kept in `extra`
/// so the caller receives the payload unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `GET /api/users/me`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Error payload the backend attaches to failed requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Extracts the human readable message from a raw error body.
    ///
    /// Bodies that are not JSON, or whose `message` is not a non-empty string, yield `None`.
    pub fn message_from_bytes(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ApiErrorBody>(body)
            .ok()?
            .message
            .filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serde_test::{Token, assert_ser_tokens};

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).expect("profile")
    }

    #[test]
    fn role_is_read_only_when_it_is_a_string() {
        assert_eq!(profile(json!({"role": "admin"})).role(), Some("admin"));
        assert_eq!(profile(json!({"role": 7})).role(), None);
        assert_eq!(profile(json!({"name": "Ann"})).role(), None);
    }

    #[test]
    fn admin_role_comparison_is_exact() {
        assert!(profile(json!({"role": "admin"})).has_admin_role());
        assert!(!profile(json!({"role": "Admin"})).has_admin_role());
        assert!(!profile(json!({"role": "user"})).has_admin_role());
    }

    #[test]
    fn login_request_serializes_email_then_password() {
        let request = LoginRequest {
            email: "a@b.com".to_string(),
            password: "pw".to_string(),
        };
        assert_ser_tokens(
            &request,
            &[
                Token::Struct {
                    name: "LoginRequest",
                    len: 2,
                },
                Token::Str("email"),
                Token::Str("a@b.com"),
                Token::Str("password"),
                Token::Str("pw"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn signup_request_carries_name() {
        let request = SignupRequest {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret".to_string(),
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({"name": "Ann", "email": "ann@example.com", "password": "secret"})
        );
    }

    #[test]
    fn auth_response_keeps_unknown_fields() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user": {"name": "Ann"},
            "token_hint": "cookie",
        }))
        .expect("deserialize");
        assert_eq!(response.user, Some(profile(json!({"name": "Ann"}))));
        assert_eq!(response.extra.get("token_hint"), Some(&json!("cookie")));
    }

    #[test]
    fn session_response_tolerates_missing_or_null_user() {
        let empty: SessionResponse = serde_json::from_value(json!({})).expect("empty");
        assert!(empty.user.is_none());
        let null: SessionResponse = serde_json::from_value(json!({"user": null})).expect("null");
        assert!(null.user.is_none());
    }

    #[test]
    fn error_message_is_extracted_leniently() {
        assert_eq!(
            ApiErrorBody::message_from_bytes(br#"{"message":"Invalid credentials"}"#),
            Some("Invalid credentials".to_string())
        );
        assert_eq!(ApiErrorBody::message_from_bytes(br#"{"message":""}"#), None);
        assert_eq!(ApiErrorBody::message_from_bytes(br#"{"error":"x"}"#), None);
        assert_eq!(ApiErrorBody::message_from_bytes(b"<html>502</html>"), None);
    }
}
