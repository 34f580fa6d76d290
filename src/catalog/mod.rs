//! Read-only access to the remote catalog: request keys, payloads, the
//! source abstraction and the in-memory cache.

pub mod cache;
pub mod error;

pub use cache::{CatalogCache, Fetch, FetchTicket};
pub use error::CatalogError;

use crate::model::{Build, PartialBuild, ServerType, Stats, Version};

/// Identifies one catalog resource together with the parameters that govern
/// its fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Types,
    Versions { type_id: String },
    Builds { type_id: String, version_id: String },
    /// Full detail of a single build, by build id.
    Build { build_id: u64 },
    Stats,
}

impl CacheKey {
    pub fn versions(type_id: Option<&str>) -> Option<Self> {
        Some(CacheKey::Versions {
            type_id: type_id?.to_string(),
        })
    }

    pub fn builds(type_id: Option<&str>, version_id: Option<&str>) -> Option<Self> {
        Some(CacheKey::Builds {
            type_id: type_id?.to_string(),
            version_id: version_id?.to_string(),
        })
    }

    pub fn build(build_id: Option<u64>) -> Option<Self> {
        build_id.map(|build_id| CacheKey::Build { build_id })
    }
}

/// A decoded catalog response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Types(Vec<ServerType>),
    Versions(Vec<Version>),
    Builds(Vec<PartialBuild>),
    Build(Box<Build>),
    Stats(Stats),
}

impl Payload {
    /// Whether this payload is the right shape for `key`.
    pub fn answers(&self, key: &CacheKey) -> bool {
        matches!(
            (self, key),
            (Payload::Types(_), CacheKey::Types)
                | (Payload::Versions(_), CacheKey::Versions { .. })
                | (Payload::Builds(_), CacheKey::Builds { .. })
                | (Payload::Build(_), CacheKey::Build { .. })
                | (Payload::Stats(_), CacheKey::Stats)
        )
    }
}

/// The remote catalog service.
///
/// Calls block the calling thread; the runtime runs them off the UI thread.
pub trait CatalogSource: Send + Sync {
    fn types(&self) -> Result<Vec<ServerType>, CatalogError>;

    fn versions(&self, type_id: &str) -> Result<Vec<Version>, CatalogError>;

    fn builds(&self, type_id: &str, version_id: &str) -> Result<Vec<PartialBuild>, CatalogError>;

    /// Looks a build up by content hash (hex) or by numeric build id.
    fn build(&self, identifier: &str) -> Result<Build, CatalogError>;

    fn stats(&self) -> Result<Stats, CatalogError>;

    /// Fetches whatever `key` names.
    fn fetch(&self, key: &CacheKey) -> Result<Payload, CatalogError> {
        match key {
            CacheKey::Types => self.types().map(Payload::Types),
            CacheKey::Versions { type_id } => self.versions(type_id).map(Payload::Versions),
            CacheKey::Builds {
                type_id,
                version_id,
            } => self.builds(type_id, version_id).map(Payload::Builds),
            CacheKey::Build { build_id } => self
                .build(&build_id.to_string())
                .map(|build| Payload::Build(Box::new(build))),
            CacheKey::Stats => self.stats().map(Payload::Stats),
        }
    }
}
