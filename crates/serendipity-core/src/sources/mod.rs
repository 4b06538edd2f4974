//! Fetch and extract collaborators used by the event aggregator.

mod http;
mod selector;
mod traits;

pub use http::HttpFetcher;
pub use selector::SelectorExtractor;
pub use traits::{Extractor, Fetcher};
