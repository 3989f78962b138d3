use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod highlight;

pub use highlight::{escape_html, highlight_html, normalize_terms};

/// Envelope `code` meaning success.
pub const SUCCESS_CODE: i64 = 0;
/// Envelope `code` reserved for "authentication required/expired".
pub const UNAUTHORIZED_CODE: i64 = 401;
/// Message used when a failing envelope carries no usable `msg`.
pub const DEFAULT_ERROR_MESSAGE: &str = "request error";
/// Code reported for envelopes whose `code` is not an integer.
pub const NON_INTEGER_CODE: i64 = -1;

/// The logged-in credential and its role.
///
/// Token and role are always set or cleared together; a value built with an
/// empty token or an empty role is the logged-out session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    role: String,
}

impl Session {
    pub fn new(token: impl AsRef<str>, role: impl AsRef<str>) -> Self {
        let token = token.as_ref().trim();
        let role = role.as_ref().trim();
        if token.is_empty() || role.is_empty() {
            return Self::default();
        }
        Self {
            token: token.to_string(),
            role: role.to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Wire envelope `{code, msg, data}`.
///
/// Fields stay raw JSON so that envelopes with a non-integer `code` or a
/// non-string `msg` can still be classified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub msg: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    /// Numeric equality, so `0` and `0.0` both match `0`.
    pub fn code_is(&self, expected: i64) -> bool {
        match &self.code {
            Value::Number(n) => n
                .as_i64()
                .map(|c| c == expected)
                .or_else(|| n.as_f64().map(|c| c == expected as f64))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code_is(SUCCESS_CODE)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code_is(UNAUTHORIZED_CODE)
    }

    /// Integer code, or [`NON_INTEGER_CODE`].
    pub fn code(&self) -> i64 {
        self.code.as_i64().unwrap_or(NON_INTEGER_CODE)
    }

    /// `msg` when it is a non-empty string, otherwise [`DEFAULT_ERROR_MESSAGE`].
    pub fn message(&self) -> &str {
        self.msg
            .as_ref()
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
    }

    /// `data`, with a missing field read as `null`.
    pub fn into_data(self) -> Value {
        self.data.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Session::new(resp.token, resp.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_pairs_token_and_role() {
        let session = Session::new(" abc ", "PM");
        assert!(session.is_authenticated());
        assert_eq!(session.token(), "abc");
        assert_eq!(session.role(), "PM");

        assert_eq!(Session::new("abc", ""), Session::default());
        assert_eq!(Session::new("", "PM"), Session::default());
        assert!(!Session::new("  ", "PM").is_authenticated());
    }

    #[test]
    fn test_envelope_classification() {
        let env: Envelope = serde_json::from_str(r#"{"code":7,"msg":"bad"}"#).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.code(), 7);
        assert_eq!(env.message(), "bad");
        assert_eq!(env.into_data(), Value::Null);

        let env: Envelope = serde_json::from_str(r#"{"code":0.0,"data":{"x":1}}"#).unwrap();
        assert!(env.is_success());
        assert_eq!(env.into_data(), serde_json::json!({"x": 1}));

        let env: Envelope = serde_json::from_str(r#"{"code":"401","msg":""}"#).unwrap();
        assert!(!env.is_unauthorized());
        assert_eq!(env.code(), NON_INTEGER_CODE);
        assert_eq!(env.message(), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_login_response_into_session() {
        let session: Session = LoginResponse {
            token: "t0k".to_string(),
            role: "MARKET".to_string(),
        }
        .into();
        assert_eq!(session.role(), "MARKET");
    }
}
