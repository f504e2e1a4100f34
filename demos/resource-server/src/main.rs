//! Resource server over stdio.
//!
//! Serves three resources:
//!
//! - `config://settings`: the runtime configuration as JSON
//! - `db://users/{id}`: a profile for the user with the given id
//! - `docs://{topic}`: a short text document per topic
//!
//! Requests are read from stdin and replies written to stdout, one JSON
//! object per line. Logs go to stderr, filtered by `RUST_LOG`.
//!
//! ```text
//! $ echo '{"id":1,"method":"resources/read","params":{"uri":"db://users/42"}}' | resource-server
//! {"id":1,"result":{"contents":[{"uri":"db://users/42","mimeType":"application/json","text":"..."}]}}
//! ```
//!
//! An optional first argument names a JSON file holding the runtime
//! configuration, e.g. `{"max_concurrent_requests": 8}`.
//!
//! SIGINT or SIGTERM stops the server. It exits 0 after a clean shutdown or
//! end of input, and 1 on any other failure.

use std::path::Path;

use miette::{IntoDiagnostic, WrapErr};
use resourcekit::prelude::*;

fn load_config(path: Option<&Path>) -> miette::Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid config file {}", path.display()))
}

fn build_server(config: RuntimeConfig) -> Result<Server, Error> {
    let settings = serde_json::to_string_pretty(&config)
        .map_err(|e| Error::internal(format!("Failed to render settings: {e}")))?;

    let server = ServerBuilder::new(ServerInfo::new("resource-server", env!("CARGO_PKG_VERSION")))
        .config(config)
        .resource(
            "config://settings",
            ResourceDefinition::new("Settings", move |_ctx, uri, _params| {
                let settings = settings.clone();
                async move { Ok(ResourceContents::text(uri, settings)) }
            })
            .description("Runtime configuration of this server")
            .mime_type("application/json"),
        )?
        .resource(
            "db://users/{id}",
            ResourceDefinition::new("User profile", |_ctx, uri, params| async move {
                let id = params.require("id")?;
                let profile = serde_json::json!({
                    "id": id,
                    "name": format!("User {id}"),
                    "email": format!("user{id}@example.com"),
                });
                Ok(ResourceContents::text(uri, profile.to_string()))
            })
            .description("Profile of a user by id")
            .mime_type("application/json"),
        )?
        .resource(
            "docs://{topic}",
            ResourceDefinition::new("Documentation", |_ctx, uri, params| async move {
                let topic = params.require("topic")?;
                Ok(ResourceContents::text(
                    uri,
                    format!("# {topic}\n\nNo documentation has been written for {topic} yet.\n"),
                ))
            })
            .description("Documentation page for a topic")
            .mime_type("text/markdown"),
        )?
        .build();

    Ok(server)
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to listen for SIGINT");
                return;
            }
            tracing::info!("Received SIGINT");
        }
        () = terminate => tracing::info!("Received SIGTERM"),
        () = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging to stderr (stdout carries replies)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;
    let server = build_server(config)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    server
        .serve(StdioTransport::new(), shutdown.clone())
        .await
        .wrap_err("Resource server failed")?;

    shutdown.cancel();
    tracing::info!("Resource server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_resources() {
        let server = build_server(RuntimeConfig::default()).unwrap();
        assert_eq!(server.registry().len(), 1);
        assert_eq!(server.registry().template_count(), 2);

        let profile = server
            .read("db://users/42", &Context::detached())
            .await
            .unwrap();
        assert!(profile.as_text().unwrap().contains("user42@example.com"));

        let settings = server
            .read("config://settings", &Context::detached())
            .await
            .unwrap();
        assert!(settings.as_text().unwrap().contains("max_concurrent_requests"));
    }

    #[test]
    fn test_default_config_without_path() {
        assert_eq!(load_config(None).unwrap(), RuntimeConfig::default());
    }
}
