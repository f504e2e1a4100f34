//! Test fixtures for resource serving.
//!
//! This module provides pre-built servers for common testing scenarios.

use resourcekit_core::error::Error;
use resourcekit_core::types::ResourceContents;
use resourcekit_server::{ResourceDefinition, Server, ServerBuilder, ServerInfo};

/// Name reported by [`sample_server`].
pub const SAMPLE_SERVER_NAME: &str = "sample-resources";

/// Create the registrations used by [`sample_server`], in registration order.
///
/// Returns:
/// - `config://settings`: literal, JSON settings
/// - `db://users/{id}`: template, one user record per `id`
/// - `file://{path}`: template, echoes the path
/// - `file://readme.txt`: literal that shadows `file://{path}`
/// - `fail://{reason}`: template whose handler always fails
#[must_use]
pub fn sample_definitions() -> Vec<(&'static str, ResourceDefinition)> {
    vec![
        (
            "config://settings",
            ResourceDefinition::new("Settings", |_ctx, uri, _params| async move {
                let settings = serde_json::json!({ "debug": true, "level": "info" });
                Ok(ResourceContents::text(uri, settings.to_string()))
            })
            .description("Application settings")
            .mime_type("application/json"),
        ),
        (
            "db://users/{id}",
            ResourceDefinition::new("User", |_ctx, uri, params| async move {
                let id = params.require("id")?;
                let user = serde_json::json!({ "id": id, "name": format!("user-{id}") });
                Ok(ResourceContents::text(uri, user.to_string()))
            })
            .description("A user record")
            .mime_type("application/json"),
        ),
        (
            "file://{path}",
            ResourceDefinition::new("File", |_ctx, uri, params| async move {
                let path = params.require("path")?;
                Ok(ResourceContents::text(uri, format!("contents of {path}")))
            })
            .mime_type("text/plain"),
        ),
        (
            "file://readme.txt",
            ResourceDefinition::new("Readme", |_ctx, uri, _params| async move {
                Ok(ResourceContents::text(uri, "read me first"))
            })
            .mime_type("text/markdown"),
        ),
        (
            "fail://{reason}",
            ResourceDefinition::new("Failing", |_ctx, uri, params| async move {
                let reason = params.require("reason")?;
                Err(Error::handler(uri, reason))
            }),
        ),
    ]
}

/// Build a server with every registration from [`sample_definitions`].
///
/// # Panics
///
/// Panics if the fixture registrations conflict, which would be a bug in
/// this module.
#[must_use]
pub fn sample_server() -> Server {
    let mut builder = ServerBuilder::new(ServerInfo::new(SAMPLE_SERVER_NAME, "0.1.0"));
    for (pattern, definition) in sample_definitions() {
        builder
            .register(pattern, definition)
            .unwrap_or_else(|e| panic!("fixture pattern '{pattern}' rejected: {e}"));
    }
    builder.build()
}
