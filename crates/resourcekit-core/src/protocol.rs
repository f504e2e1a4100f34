//! Request and reply envelope carried by transports.
//!
//! The envelope is intentionally small: a request names a method and
//! optional parameters, and a reply echoes the request ID with either a
//! result or an error object. Each message is one JSON object.
//!
//! ```text
//! -> {"id":1,"method":"resources/read","params":{"uri":"db://users/42"}}
//! <- {"id":1,"result":{"contents":[{"uri":"db://users/42","text":"..."}]}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, ErrorObject};
use crate::types::ReadResourceRequest;

/// Method names understood by the server.
pub mod methods {
    /// List literal resources.
    pub const RESOURCES_LIST: &str = "resources/list";
    /// List resource templates.
    pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
    /// Read a resource by URI.
    pub const RESOURCES_READ: &str = "resources/read";
}

/// Identifier correlating a reply with its request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for RequestId {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// An incoming request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request identifier echoed in the reply.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Create a request without parameters.
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    /// Create a request with parameters.
    pub fn with_params(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }

    /// Convenience constructor for `resources/read`.
    pub fn read(id: impl Into<RequestId>, uri: impl Into<String>) -> Self {
        Self::with_params(
            id,
            methods::RESOURCES_READ,
            serde_json::json!({ "uri": uri.into() }),
        )
    }
}

/// A request decoded into its typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `resources/list`
    ListResources,
    /// `resources/templates/list`
    ListResourceTemplates,
    /// `resources/read`
    ReadResource(ReadResourceRequest),
}

impl Method {
    /// Decode a request's method and parameters.
    pub fn parse(request: &Request) -> Result<Self, Error> {
        match request.method.as_str() {
            methods::RESOURCES_LIST => Ok(Self::ListResources),
            methods::RESOURCES_TEMPLATES_LIST => Ok(Self::ListResourceTemplates),
            methods::RESOURCES_READ => {
                let params = request
                    .params
                    .as_ref()
                    .ok_or_else(|| Error::invalid_request("resources/read: missing params"))?;
                let uri = params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::invalid_request("resources/read: missing uri"))?;
                Ok(Self::ReadResource(ReadResourceRequest {
                    uri: uri.to_string(),
                }))
            }
            other => Err(Error::method_not_found(other)),
        }
    }

    /// The wire name of this method.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ListResources => methods::RESOURCES_LIST,
            Self::ListResourceTemplates => methods::RESOURCES_TEMPLATES_LIST,
            Self::ReadResource(_) => methods::RESOURCES_READ,
        }
    }
}

/// A reply to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// The request identifier, or `None` when the request could not be parsed.
    pub id: Option<RequestId>,
    /// Successful result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Reply {
    /// Create a successful reply.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error reply.
    pub fn error(id: Option<RequestId>, error: impl Into<ErrorObject>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Whether this reply carries an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Any message carried by a transport.
///
/// An object with a `method` key decodes as a [`Request`] and must be a
/// valid one. Otherwise it decodes as a [`Reply`] only if it has a
/// `result` or `error` key. Anything else fails to decode, so the
/// sender can be answered with a parse error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A request from a client.
    Request(Request),
    /// A reply from the server.
    Reply(Reply),
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = Value::deserialize(deserializer)?;
        let Some(object) = value.as_object() else {
            return Err(D::Error::custom("message must be a JSON object"));
        };

        if object.contains_key("method") {
            serde_json::from_value(value)
                .map(Self::Request)
                .map_err(|e| D::Error::custom(format!("invalid request: {e}")))
        } else if object.contains_key("result") || object.contains_key("error") {
            serde_json::from_value(value)
                .map(Self::Reply)
                .map_err(|e| D::Error::custom(format!("invalid reply: {e}")))
        } else {
            Err(D::Error::custom(
                "message has neither a method nor a result or error",
            ))
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

impl From<Reply> for Message {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}
