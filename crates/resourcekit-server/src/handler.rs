//! Resource handlers and registration definitions.
//!
//! A handler receives the request [`Context`], the concrete URI being read
//! and the [`ParameterMap`] captured by the matched template, and returns
//! the resource contents. Handlers are plain async closures:
//!
//! ```rust
//! use resourcekit_core::types::ResourceContents;
//! use resourcekit_server::handler::ResourceDefinition;
//!
//! let user = ResourceDefinition::new("User", |_ctx, uri, params| async move {
//!     let id = params.require("id")?;
//!     Ok(ResourceContents::text(uri, format!("user {id}")))
//! })
//! .description("A user record")
//! .mime_type("text/plain");
//!
//! assert_eq!(user.name, "User");
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use resourcekit_core::error::Error;
use resourcekit_core::template::ParameterMap;
use resourcekit_core::types::ResourceContents;

use crate::context::Context;

/// The future returned by a boxed resource handler.
pub type HandlerFuture = BoxFuture<'static, Result<ResourceContents, Error>>;

/// A type-erased resource handler.
pub type BoxedResourceFn =
    Arc<dyn Fn(Context, String, ParameterMap) -> HandlerFuture + Send + Sync>;

/// Box an async closure into a [`BoxedResourceFn`].
pub fn handler_fn<F, Fut>(handler: F) -> BoxedResourceFn
where
    F: Fn(Context, String, ParameterMap) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResourceContents, Error>> + Send + 'static,
{
    Arc::new(move |ctx, uri, params| Box::pin(handler(ctx, uri, params)))
}

/// Everything needed to register a resource: descriptor metadata plus the
/// handler that produces its contents.
///
/// The fields are public so the definition can be written as a struct
/// literal; the constructor and setters are a shorthand for the same thing.
#[derive(Clone)]
pub struct ResourceDefinition {
    /// Human-readable name.
    pub name: String,
    /// Description of what the resource contains.
    pub description: Option<String>,
    /// MIME type of the produced content.
    pub mime_type: Option<String>,
    /// The handler producing the contents.
    pub handler: BoxedResourceFn,
}

impl ResourceDefinition {
    /// Create a definition from a name and an async handler.
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Context, String, ParameterMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResourceContents, Error>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            mime_type: None,
            handler: handler_fn(handler),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the MIME type.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}
