use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `GET /auth/validate`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenValidation {
    pub valid: bool,
    pub user: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /health`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
