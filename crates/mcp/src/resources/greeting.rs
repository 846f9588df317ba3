// Greeting demo resource

use crate::resources::ResourceHandler;
use anyhow::{Context, Result};
use std::collections::HashMap;
use toolwire_core::{ReadResourceResult, ResourceContents};

/// Answers `<scheme>://{name}` with `Hello, {name}!`
pub struct GreetingResource;

#[async_trait::async_trait]
impl ResourceHandler for GreetingResource {
    async fn read(
        &self,
        uri: &str,
        bindings: &HashMap<String, String>,
    ) -> Result<ReadResourceResult> {
        let name = bindings
            .get("name")
            .context("greeting template has no {name} placeholder")?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(uri, format!("Hello, {}!", name))],
        })
    }
}
