use async_trait::async_trait;

use crate::error::FetchError;

/// Retrieves the raw page for an event source.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body.
    ///
    /// Fails with [`FetchError`] on non-2xx status or transport failure.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Pulls text out of a fetched page.
pub trait Extractor: Send + Sync {
    /// Text of every element matching `selector`, in document order.
    /// Returns an empty vec when nothing matches.
    fn extract(&self, html: &str, selector: &str) -> Vec<String>;
}
