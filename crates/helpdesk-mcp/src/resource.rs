//! Resource descriptors for read-only data snapshots

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{ReadResourceResult, ResourceContents, ResourceInfo};
use crate::registry::Keyed;

/// Handler producing a textual snapshot of a resource
///
/// Contract: reads are idempotent and side-effect free, so retrying after a
/// transient downstream failure is always safe.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Produce the current snapshot
    async fn read(&self) -> Result<String>;
}

/// Registered metadata + handler for one resource URI
#[derive(Clone)]
pub struct ResourceDescriptor {
    uri: String,
    name: String,
    description: String,
    mime_type: String,
    handler: Arc<dyn ResourceHandler>,
}

impl ResourceDescriptor {
    /// Create a descriptor for a `text/plain` resource
    pub fn new(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ResourceHandler>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: description.into(),
            mime_type: "text/plain".to_string(),
            handler,
        }
    }

    /// Override the mime type (e.g. `application/json`)
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Resource URI (unique registry key)
    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Listing metadata for `resources/list`
    pub fn info(&self) -> ResourceInfo {
        ResourceInfo {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    /// Read the snapshot and wrap it for `resources/read`
    pub async fn read(&self) -> Result<ReadResourceResult> {
        let text = self.handler.read().await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: self.uri.clone(),
                mime_type: self.mime_type.clone(),
                text,
            }],
        })
    }
}

impl std::fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("uri", &self.uri)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

impl Keyed for ResourceDescriptor {
    fn key(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSnapshot(&'static str);

    #[async_trait]
    impl ResourceHandler for FixedSnapshot {
        async fn read(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_read_wraps_snapshot() {
        let resource = ResourceDescriptor::new(
            "tickets://recent",
            "Recent tickets",
            "The most recent tickets",
            Arc::new(FixedSnapshot("#1 printer on fire")),
        );
        let result = resource.read().await.unwrap();
        assert_eq!(result.contents.len(), 1);
        assert_eq!(result.contents[0].uri, "tickets://recent");
        assert_eq!(result.contents[0].mime_type, "text/plain");
        assert_eq!(result.contents[0].text, "#1 printer on fire");
    }

    #[tokio::test]
    async fn test_read_is_repeatable() {
        let resource = ResourceDescriptor::new(
            "tickets://recent",
            "Recent tickets",
            "The most recent tickets",
            Arc::new(FixedSnapshot("stable")),
        );
        let first = resource.read().await.unwrap();
        let second = resource.read().await.unwrap();
        assert_eq!(first.contents[0].text, second.contents[0].text);
    }

    #[test]
    fn test_mime_type_override() {
        let resource = ResourceDescriptor::new(
            "tickets://stats",
            "Ticket stats",
            "Aggregate counts",
            Arc::new(FixedSnapshot("{}")),
        )
        .with_mime_type("application/json");
        assert_eq!(resource.info().mime_type, "application/json");
    }
}
