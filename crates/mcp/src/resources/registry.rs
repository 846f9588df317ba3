// Resource template registry: URI pattern -> read handler

use crate::RegistryError;
use anyhow::Result;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use toolwire_core::protocol::ResourceTemplateDescriptor;
use toolwire_core::template::UriTemplate;
use toolwire_core::{ReadResourceResult, ResourceContents};

/// Resource read handler.
///
/// Shared across sessions like [`crate::tools::Tool`]; stateful handlers
/// synchronize internally.
#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Read the resource at `uri`; `bindings` holds the placeholder values
    async fn read(&self, uri: &str, bindings: &HashMap<String, String>)
        -> Result<ReadResourceResult>;
}

pub struct ResourceTemplateEntry {
    pub name: String,
    pub template: UriTemplate,
    pub description: Option<String>,
    handler: Arc<dyn ResourceHandler>,
}

impl ResourceTemplateEntry {
    pub fn descriptor(&self) -> ResourceTemplateDescriptor {
        ResourceTemplateDescriptor {
            uri_template: self.template.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Templates are tried in registration order; the first match wins.
#[derive(Default)]
pub struct ResourceRegistry {
    templates: Vec<ResourceTemplateEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        template: &str,
        description: Option<String>,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.templates.iter().any(|t| t.name == name) {
            return Err(RegistryError::DuplicateResource(name));
        }

        let template = UriTemplate::parse(template)?;
        tracing::debug!(resource = %name, template = %template, "Registered resource template");
        self.templates.push(ResourceTemplateEntry {
            name,
            template,
            description,
            handler,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplateDescriptor> {
        self.templates.iter().map(|t| t.descriptor()).collect()
    }

    /// Find the first template matching `uri`
    pub fn resolve(&self, uri: &str) -> Option<(&ResourceTemplateEntry, HashMap<String, String>)> {
        self.templates
            .iter()
            .find_map(|entry| entry.template.matches(uri).map(|bindings| (entry, bindings)))
    }

    /// Read `uri` through the first matching template.
    ///
    /// An unmatched URI is `ResourceNotFound`; a failing handler yields a
    /// single content item describing the failure.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, RegistryError> {
        let (entry, bindings) = self
            .resolve(uri)
            .ok_or_else(|| RegistryError::ResourceNotFound(uri.to_string()))?;

        match AssertUnwindSafe(entry.handler.read(uri, &bindings))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(resource = %entry.name, uri, error = %e, "Resource handler failed");
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(uri, format!("Error: {:#}", e))],
                })
            }
            Err(_) => {
                tracing::error!(resource = %entry.name, uri, "Resource handler panicked");
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(
                        uri,
                        format!("Error: resource {} panicked", entry.name),
                    )],
                })
            }
        }
    }
}
