//! # resourcekit-core
//!
//! Core types for serving Model Context Protocol (MCP) resources.
//!
//! This crate provides the foundational building blocks shared by the
//! server and transport crates:
//!
//! - **Resource types**: descriptors, templates, contents and list/read results
//! - **URI templates**: compiling `db://users/{id}` style patterns and
//!   extracting named parameters from concrete URIs
//! - **Envelope types**: the request/reply messages carried by transports
//! - **Error handling**: unified [`Error`] type with rich diagnostics
//!
//! This crate does not depend on any async runtime.
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::template::UriTemplate;
//!
//! let template = UriTemplate::parse("db://users/{id}").unwrap();
//! let params = template.matches("db://users/42").unwrap();
//! assert_eq!(params.get("id"), Some("42"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod protocol;
pub mod template;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{Error, ErrorObject, ResultExt};
pub use protocol::{Message, Method, Reply, Request, RequestId};
pub use template::{ParameterMap, UriTemplate};
pub use types::{
    ListResourceTemplatesResult, ListResourcesResult, ReadResourceRequest, ReadResourceResult,
    Resource, ResourceContents, ResourceTemplate,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, ErrorObject, ResultExt};
    pub use crate::protocol::{Message, Method, Reply, Request, RequestId};
    pub use crate::template::{ParameterMap, UriTemplate};
    pub use crate::types::{
        ListResourceTemplatesResult, ListResourcesResult, ReadResourceRequest,
        ReadResourceResult, Resource, ResourceContents, ResourceTemplate,
    };
}
