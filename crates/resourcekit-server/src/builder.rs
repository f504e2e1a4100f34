//! Fluent server builder.
//!
//! Registration happens here, before serving starts. Each
//! [`ServerBuilder::resource`] call is fallible so that duplicate or
//! malformed patterns surface at setup time rather than on first read.
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::types::ResourceContents;
//! use resourcekit_server::{ResourceDefinition, ServerBuilder, ServerInfo};
//!
//! # fn main() -> Result<(), resourcekit_core::Error> {
//! let server = ServerBuilder::new(ServerInfo::new("settings-server", "1.0.0"))
//!     .resource(
//!         "config://settings",
//!         ResourceDefinition::new("Settings", |_ctx, uri, _params| async move {
//!             Ok(ResourceContents::text(uri, "{}"))
//!         }),
//!     )?
//!     .build();
//!
//! assert_eq!(server.info().name, "settings-server");
//! assert_eq!(server.registry().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use resourcekit_core::error::Error;
use serde::{Deserialize, Serialize};

use crate::config::RuntimeConfig;
use crate::handler::ResourceDefinition;
use crate::registry::ResourceRegistry;
use crate::server::Server;

/// Name and version reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl ServerInfo {
    /// Create server info.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Builder for a [`Server`].
#[derive(Debug)]
pub struct ServerBuilder {
    info: ServerInfo,
    config: RuntimeConfig,
    registry: ResourceRegistry,
}

impl ServerBuilder {
    /// Start building a server.
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            config: RuntimeConfig::default(),
            registry: ResourceRegistry::new(),
        }
    }

    /// Set the runtime configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a resource or resource template.
    pub fn resource(
        mut self,
        pattern: impl Into<String>,
        definition: ResourceDefinition,
    ) -> Result<Self, Error> {
        self.registry.register(pattern, definition)?;
        Ok(self)
    }

    /// Register a resource through a mutable reference.
    ///
    /// Useful when registrations are driven by a loop.
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        definition: ResourceDefinition,
    ) -> Result<&mut Self, Error> {
        self.registry.register(pattern, definition)?;
        Ok(self)
    }

    /// Finish building. The registry is frozen from here on.
    #[must_use]
    pub fn build(self) -> Server {
        tracing::debug!(
            server = %self.info.name,
            resources = self.registry.len(),
            templates = self.registry.template_count(),
            "Built server"
        );
        Server::new(self.info, self.config, Arc::new(self.registry))
    }
}
