//! Numeric error codes carried in error replies.
//!
//! The protocol-level codes follow JSON-RPC 2.0 so that replies stay
//! familiar to MCP clients; resource-specific codes live in the server
//! error range.

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;

/// The message is not a valid request.
pub const INVALID_REQUEST: i32 = -32600;

/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;

/// Internal error.
pub const INTERNAL_ERROR: i32 = -32603;

/// Server error range start. Used for transport failures.
pub const SERVER_ERROR_START: i32 = -32000;

/// Server error range end.
pub const SERVER_ERROR_END: i32 = -32099;

// Resource-specific codes

/// A resource handler failed.
pub const HANDLER_ERROR: i32 = -32001;

/// No registered pattern matched the requested URI.
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// The pattern is already registered.
pub const DUPLICATE_PATTERN: i32 = -32003;

/// The URI template could not be compiled.
pub const INVALID_TEMPLATE: i32 = -32004;

/// The request was cancelled before it completed.
pub const REQUEST_CANCELLED: i32 = -32800;
