//! Resource registry and handler invocation.
//!
//! The registry maps literal URIs and URI templates to a descriptor and a
//! handler. It is populated during setup and only read afterwards, so the
//! serve loop shares it behind an `Arc` without locking.
//!
//! # Resolution order
//!
//! 1. An exact literal registration always wins.
//! 2. Among matching templates, the one with the fewest placeholders wins.
//! 3. Then the longest fixed prefix (text before the first placeholder).
//! 4. Then the most literal characters overall.
//! 5. Then the earliest registration.
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::types::ResourceContents;
//! use resourcekit_server::handler::ResourceDefinition;
//! use resourcekit_server::registry::ResourceRegistry;
//!
//! let mut registry = ResourceRegistry::new();
//! registry
//!     .register(
//!         "db://users/{id}",
//!         ResourceDefinition::new("User", |_ctx, uri, _params| async move {
//!             Ok(ResourceContents::text(uri, "{}"))
//!         }),
//!     )
//!     .unwrap();
//!
//! let found = registry.lookup("db://users/42").unwrap();
//! assert_eq!(found.params().get("id"), Some("42"));
//! assert!(registry.lookup("db://orders/42").is_err());
//! ```

use std::cmp::Reverse;
use std::collections::HashMap;

use resourcekit_core::error::{Error, ResultExt};
use resourcekit_core::template::{ParameterMap, UriTemplate};
use resourcekit_core::types::{Resource, ResourceContents, ResourceTemplate};

use crate::context::Context;
use crate::handler::{BoxedResourceFn, ResourceDefinition};

/// Immutable metadata attached to a pattern at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// The pattern as registered (literal URI or URI template).
    pub pattern: String,
    /// Human-readable name.
    pub name: String,
    /// Description of what the resource contains.
    pub description: Option<String>,
    /// MIME type of the produced content.
    pub mime_type: Option<String>,
}

impl ResourceDescriptor {
    /// Convert to the listing form for a literal resource.
    #[must_use]
    pub fn to_resource(&self) -> Resource {
        Resource {
            uri: self.pattern.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    /// Convert to the listing form for a resource template.
    #[must_use]
    pub fn to_template(&self) -> ResourceTemplate {
        ResourceTemplate {
            uri_template: self.pattern.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

struct Entry {
    template: UriTemplate,
    descriptor: ResourceDescriptor,
    handler: BoxedResourceFn,
}

impl Entry {
    fn is_literal(&self) -> bool {
        self.template.is_literal()
    }
}

/// The result of a successful lookup.
pub struct ResourceMatch<'a> {
    descriptor: &'a ResourceDescriptor,
    handler: &'a BoxedResourceFn,
    params: ParameterMap,
    templated: bool,
}

impl ResourceMatch<'_> {
    /// The descriptor registered for the matched pattern.
    #[must_use]
    pub fn descriptor(&self) -> &ResourceDescriptor {
        self.descriptor
    }

    /// The parameters captured from the URI. Empty for literal matches.
    #[must_use]
    pub fn params(&self) -> &ParameterMap {
        &self.params
    }

    /// Whether the match came from a template rather than a literal.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.templated
    }

    /// Invoke the matched handler.
    pub async fn invoke(self, uri: &str, ctx: &Context) -> Result<ResourceContents, Error> {
        let mut contents = (self.handler)(ctx.clone(), uri.to_string(), self.params).await?;
        if contents.mime_type.is_none() {
            contents.mime_type.clone_from(&self.descriptor.mime_type);
        }
        Ok(contents)
    }
}

impl std::fmt::Debug for ResourceMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceMatch")
            .field("descriptor", &self.descriptor)
            .field("params", &self.params)
            .field("templated", &self.templated)
            .finish_non_exhaustive()
    }
}

/// Registry of literal resources and resource templates.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: Vec<Entry>,
    /// Pattern string -> index into `entries`.
    by_pattern: HashMap<String, usize>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern with its definition.
    ///
    /// Patterns without placeholders are literal resources; patterns with
    /// placeholders are templates. Fails with [`Error::DuplicatePattern`] if
    /// the identical pattern is already registered, or
    /// [`Error::InvalidTemplate`] if the pattern does not compile.
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        definition: ResourceDefinition,
    ) -> Result<(), Error> {
        let pattern = pattern.into();
        if self.by_pattern.contains_key(&pattern) {
            return Err(Error::duplicate_pattern(pattern));
        }

        let template = UriTemplate::parse(&pattern)?;
        tracing::debug!(
            pattern = %pattern,
            name = %definition.name,
            placeholders = template.placeholder_count(),
            "Registered resource"
        );

        let ResourceDefinition {
            name,
            description,
            mime_type,
            handler,
        } = definition;

        self.by_pattern.insert(pattern.clone(), self.entries.len());
        self.entries.push(Entry {
            template,
            descriptor: ResourceDescriptor {
                pattern,
                name,
                description,
                mime_type,
            },
            handler,
        });
        Ok(())
    }

    /// Find the best registration for a concrete URI.
    ///
    /// Fails with [`Error::NoMatch`] when no pattern fits.
    pub fn lookup(&self, uri: &str) -> Result<ResourceMatch<'_>, Error> {
        if let Some(entry) = self
            .by_pattern
            .get(uri)
            .map(|&i| &self.entries[i])
            .filter(|entry| entry.is_literal())
        {
            return Ok(ResourceMatch {
                descriptor: &entry.descriptor,
                handler: &entry.handler,
                params: ParameterMap::new(),
                templated: false,
            });
        }

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_literal())
            .filter_map(|(order, entry)| {
                entry
                    .template
                    .matches(uri)
                    .ok()
                    .map(|params| (order, entry, params))
            })
            .min_by_key(|(order, entry, _)| {
                (
                    entry.template.placeholder_count(),
                    Reverse(entry.template.literal_prefix().len()),
                    Reverse(entry.template.literal_len()),
                    *order,
                )
            })
            .map(|(_, entry, params)| ResourceMatch {
                descriptor: &entry.descriptor,
                handler: &entry.handler,
                params,
                templated: true,
            })
            .ok_or_else(|| Error::no_match(uri))
    }

    /// Resolve a URI and invoke its handler.
    ///
    /// This is a direct call-through: no retries, caching or rate limiting.
    /// Handler errors are returned with the URI attached as context, except
    /// [`Error::MissingParameter`] and [`Error::Cancelled`], which are
    /// returned as the handler produced them.
    pub async fn read(&self, uri: &str, ctx: &Context) -> Result<ResourceContents, Error> {
        if ctx.is_cancelled() {
            return Err(Error::cancelled(format!("read {uri}")));
        }

        let found = self.lookup(uri)?;
        tracing::debug!(
            uri = %uri,
            pattern = %found.descriptor().pattern,
            params = found.params().len(),
            "Dispatching resource read"
        );

        match found.invoke(uri, ctx).await {
            Err(e @ (Error::MissingParameter { .. } | Error::Cancelled { .. })) => {
                tracing::debug!(uri = %uri, error = %e, "Resource read rejected");
                Err(e)
            }
            result => result
                .inspect_err(|e| tracing::warn!(uri = %uri, error = %e, "Resource handler failed"))
                .with_context(|| format!("Failed to read resource '{uri}'")),
        }
    }

    /// Get the descriptor registered under an exact pattern string.
    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<&ResourceDescriptor> {
        self.by_pattern
            .get(pattern)
            .map(|&i| &self.entries[i].descriptor)
    }

    /// List literal resources in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Resource> {
        self.entries
            .iter()
            .filter(|e| e.is_literal())
            .map(|e| e.descriptor.to_resource())
            .collect()
    }

    /// List resource templates in registration order.
    #[must_use]
    pub fn list_templates(&self) -> Vec<ResourceTemplate> {
        self.entries
            .iter()
            .filter(|e| !e.is_literal())
            .map(|e| e.descriptor.to_template())
            .collect()
    }

    /// Number of literal resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_literal()).count()
    }

    /// Number of resource templates.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.entries.len() - self.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.descriptor.pattern))
            .finish()
    }
}
