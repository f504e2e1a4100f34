//! Wire representation of an error reply and conversions from [`Error`].

use serde::{Deserialize, Serialize};

use super::types::Error;

/// An error object carried in a [`Reply`](crate::protocol::Reply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorObject {
    /// Create an error object with just a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&Error> for ErrorObject {
    fn from(err: &Error) -> Self {
        let data = match err.root() {
            Error::NoMatch { uri } => Some(serde_json::json!({ "uri": uri })),
            Error::MissingParameter { name } => Some(serde_json::json!({ "parameter": name })),
            Error::Handler { uri, .. } => Some(serde_json::json!({ "uri": uri })),
            Error::DuplicatePattern { pattern } => {
                Some(serde_json::json!({ "pattern": pattern }))
            }
            Error::InvalidTemplate { template, .. } => {
                Some(serde_json::json!({ "template": template }))
            }
            Error::MethodNotFound { method } => Some(serde_json::json!({ "method": method })),
            _ => None,
        };

        Self {
            code: err.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<Error> for ErrorObject {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}
