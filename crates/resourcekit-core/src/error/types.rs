//! The primary error type for resourcekit.

use miette::Diagnostic;
use thiserror::Error as ThisError;

use super::codes;

/// A boxed error type for source chains.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for registration, lookup, handler invocation
/// and serving.
#[derive(ThisError, Diagnostic, Debug)]
pub enum Error {
    // ========================================================================
    // Registration Errors
    // ========================================================================
    /// The pattern has already been registered.
    #[error("Duplicate resource pattern: {pattern}")]
    #[diagnostic(
        code(resourcekit::registry::duplicate_pattern),
        help("Each literal URI or URI template may only be registered once")
    )]
    DuplicatePattern {
        /// The pattern that was registered twice.
        pattern: String,
    },

    /// A URI template could not be compiled.
    #[error("Invalid URI template '{template}': {reason}")]
    #[diagnostic(code(resourcekit::template::invalid))]
    InvalidTemplate {
        /// The offending template string.
        template: String,
        /// Why compilation failed.
        reason: String,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No registered pattern matches the requested URI.
    #[error("No resource matches URI: {uri}")]
    #[diagnostic(
        code(resourcekit::registry::no_match),
        help("Verify the URI is correct and a matching resource is registered")
    )]
    NoMatch {
        /// The URI that was requested.
        uri: String,
    },

    // ========================================================================
    // Handler Errors
    // ========================================================================
    /// A required parameter was missing or empty.
    #[error("Missing required parameter: {name}")]
    #[diagnostic(code(resourcekit::handler::missing_parameter))]
    MissingParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A resource handler failed.
    #[error("Resource handler failed for '{uri}': {message}")]
    #[diagnostic(code(resourcekit::handler::failed))]
    Handler {
        /// The URI being read.
        uri: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// An operation was cancelled.
    #[error("Operation cancelled: {operation}")]
    #[diagnostic(code(resourcekit::cancelled))]
    Cancelled {
        /// The operation that was cancelled.
        operation: String,
    },

    // ========================================================================
    // Envelope Errors
    // ========================================================================
    /// A message could not be parsed.
    #[error("Parse error: {message}")]
    #[diagnostic(
        code(resourcekit::protocol::parse_error),
        help("Each message must be a single line of JSON")
    )]
    Parse {
        /// Human-readable error message.
        message: String,
        /// The underlying parse error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// The message is not a valid request.
    #[error("Invalid request: {message}")]
    #[diagnostic(code(resourcekit::protocol::invalid_request))]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The requested method is not served.
    #[error("Method not found: {method}")]
    #[diagnostic(code(resourcekit::protocol::method_not_found))]
    MethodNotFound {
        /// The method that was requested.
        method: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport-level error.
    #[error("Transport error: {message}")]
    #[diagnostic(code(resourcekit::transport::error))]
    Transport {
        /// Human-readable error message.
        message: String,
        /// The underlying transport error.
        #[source]
        source: Option<BoxError>,
    },

    // ========================================================================
    // Internal / Context
    // ========================================================================
    /// An internal error.
    #[error("Internal error: {message}")]
    #[diagnostic(code(resourcekit::internal), severity(error))]
    Internal {
        /// Human-readable error message.
        message: String,
    },

    /// An error with additional context.
    #[error("{context}: {source}")]
    #[diagnostic(code(resourcekit::context))]
    WithContext {
        /// The context message.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

// ============================================================================
// Error Construction Helpers
// ============================================================================

impl Error {
    /// Create a duplicate pattern error.
    pub fn duplicate_pattern(pattern: impl Into<String>) -> Self {
        Self::DuplicatePattern {
            pattern: pattern.into(),
        }
    }

    /// Create an invalid template error.
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Create a no-match error.
    pub fn no_match(uri: impl Into<String>) -> Self {
        Self::NoMatch { uri: uri.into() }
    }

    /// Create a missing parameter error.
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a handler error.
    pub fn handler(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            uri: uri.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a handler error with an underlying source.
    pub fn handler_with_source<E: std::error::Error + Send + Sync + 'static>(
        uri: impl Into<String>,
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Handler {
            uri: uri.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a parse error with a source.
    pub fn parse_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Create a transport error with a source.
    pub fn transport<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The numeric code used when this error is sent as a reply.
    ///
    /// Context wrappers report the code of the error they wrap.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::DuplicatePattern { .. } => codes::DUPLICATE_PATTERN,
            Self::InvalidTemplate { .. } => codes::INVALID_TEMPLATE,
            Self::NoMatch { .. } => codes::RESOURCE_NOT_FOUND,
            Self::MissingParameter { .. } => codes::INVALID_PARAMS,
            Self::Handler { .. } => codes::HANDLER_ERROR,
            Self::Cancelled { .. } => codes::REQUEST_CANCELLED,
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::InvalidRequest { .. } => codes::INVALID_REQUEST,
            Self::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            Self::Transport { .. } => codes::SERVER_ERROR_START,
            Self::Internal { .. } => codes::INTERNAL_ERROR,
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// Whether the requester can correct this error by changing its request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NoMatch { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidRequest { .. }
            | Self::MethodNotFound { .. }
            | Self::Parse { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Whether this error represents cancellation, possibly behind context.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Strip context wrappers and return the innermost error.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_with_source(err.to_string(), err)
    }
}
