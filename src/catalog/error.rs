use thiserror::Error;

/// Failure of a catalog request.
///
/// Cloneable so a cached failure can be handed to every reader of its key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The request could not complete (transport error or unexpected status).
    #[error("network failure for {url}: {message}")]
    Network { url: String, message: String },

    /// The resource, or the hash being identified, has no match.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response arrived but could not be decoded.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}
