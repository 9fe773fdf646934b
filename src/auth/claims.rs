use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String, // subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>, // issued at (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // expires at (unix seconds)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn for_subject(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            iat: None,
            exp: None,
            extra: Map::new(),
        }
    }
}

/// Fixed token header.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    pub fn rs256() -> Self {
        Self {
            alg: "RS256".into(),
            typ: "JWT".into(),
        }
    }
}
