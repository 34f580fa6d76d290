//! Type → version → build selection with auto-selection and invalidation.
//!
//! Every transition is a plain method on [`Selection`]. Data-arrival
//! transitions (`types_arrived`, `versions_arrived`, `builds_arrived`) are
//! invoked by the reconciliation step in `AppState` whenever the cache holds a
//! list for the relevant key; they are idempotent and carry the key they were
//! computed for, so a list that belongs to a previous selection is ignored.

use crate::catalog::CacheKey;
use crate::model::{Build, PartialBuild, ServerType, Version};
use thiserror::Error;

/// A selection that does not match the lists it must belong to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("type `{0}` is not in the catalog")]
    UnknownType(String),
    #[error("version `{version_id}` does not belong to type `{type_id}`")]
    UnknownVersion { type_id: String, version_id: String },
    #[error("build {0} does not belong to the selected version")]
    UnknownBuild(u64),
    #[error("no type is selected")]
    NoType,
    #[error("no version is selected")]
    NoVersion,
}

/// The build whose panel is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBuild {
    pub summary: PartialBuild,
    /// Full detail, once fetched.
    pub detail: Option<Build>,
}

impl OpenBuild {
    pub fn id(&self) -> u64 {
        self.summary.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    type_id: Option<String>,
    version_id: Option<String>,
    open_build: Option<OpenBuild>,
    /// Show snapshot versions in the version list.
    pub include_snapshots: bool,
}

/// Picks the version to select when the current one is missing: the first
/// release or untagged entry, else the first entry.
pub fn default_version(versions: &[Version]) -> Option<&Version> {
    versions
        .iter()
        .find(|version| version.is_release_like())
        .or_else(|| versions.first())
}

impl Selection {
    pub fn new(include_snapshots: bool) -> Self {
        Self {
            include_snapshots,
            ..Self::default()
        }
    }

    /// Seeds the selection from external state (command line, shared link).
    /// The values are validated once the lists arrive.
    pub fn restore(&mut self, type_id: Option<String>, version_id: Option<String>) {
        self.version_id = version_id.filter(|_| type_id.is_some());
        self.type_id = type_id;
        self.open_build = None;
    }

    pub fn type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn open_build(&self) -> Option<&OpenBuild> {
        self.open_build.as_ref()
    }

    pub fn versions_key(&self) -> Option<CacheKey> {
        CacheKey::versions(self.type_id())
    }

    pub fn builds_key(&self) -> Option<CacheKey> {
        CacheKey::builds(self.type_id(), self.version_id())
    }

    /// Key of the open build's detail, while it is still missing.
    pub fn missing_detail_key(&self) -> Option<CacheKey> {
        self.open_build
            .as_ref()
            .filter(|open| open.detail.is_none())
            .and_then(|open| CacheKey::build(Some(open.id())))
    }

    /// Types arrived. Returns `true` if the selection changed.
    ///
    /// A restored type that is not in the list is cleared before the first
    /// type is auto-selected.
    pub fn types_arrived(&mut self, types: &[ServerType]) -> bool {
        let mut changed = false;
        if let Some(type_id) = &self.type_id
            && !types.iter().any(|t| &t.identifier == type_id)
        {
            log::warn!("{}; clearing selection", SelectionError::UnknownType(type_id.clone()));
            self.clear_type();
            changed = true;
        }

        if self.type_id.is_none()
            && let Some(first) = types.first()
        {
            log::debug!("auto-selecting type {}", first.identifier);
            self.type_id = Some(first.identifier.clone());
            changed = true;
        }
        changed
    }

    /// The user picked a type from `types`.
    pub fn select_type(&mut self, types: &[ServerType], type_id: &str) -> Result<bool, SelectionError> {
        if !types.iter().any(|t| t.identifier == type_id) {
            return Err(SelectionError::UnknownType(type_id.to_string()));
        }
        if self.type_id() == Some(type_id) {
            return Ok(false);
        }
        self.type_id = Some(type_id.to_string());
        self.version_id = None;
        self.open_build = None;
        Ok(true)
    }

    /// Versions arrived for `type_id`. Returns `true` if the selection changed.
    pub fn versions_arrived(&mut self, type_id: &str, versions: &[Version]) -> bool {
        if self.type_id() != Some(type_id) {
            return false;
        }
        if let Some(version_id) = self.version_id()
            && versions.iter().any(|v| v.id() == version_id)
        {
            return false;
        }

        let next = default_version(versions).map(|v| v.id().to_string());
        if let Some(stale) = &self.version_id {
            log::debug!("version {} is not offered by {}, reselecting", stale, type_id);
        }
        let changed = next != self.version_id || self.open_build.is_some();
        self.version_id = next;
        self.open_build = None;
        changed
    }

    /// The user picked a version of the current type.
    pub fn select_version(
        &mut self,
        versions: &[Version],
        version_id: &str,
    ) -> Result<bool, SelectionError> {
        let type_id = self.type_id.as_deref().ok_or(SelectionError::NoType)?;
        if !versions.iter().any(|v| v.id() == version_id) {
            return Err(SelectionError::UnknownVersion {
                type_id: type_id.to_string(),
                version_id: version_id.to_string(),
            });
        }
        if self.version_id() == Some(version_id) {
            return Ok(false);
        }
        self.version_id = Some(version_id.to_string());
        self.open_build = None;
        Ok(true)
    }

    /// Builds arrived for `(type_id, version_id)`. An open build missing from
    /// the list is closed. Returns `true` if the selection changed.
    pub fn builds_arrived(&mut self, type_id: &str, version_id: &str, builds: &[PartialBuild]) -> bool {
        if self.type_id() != Some(type_id) || self.version_id() != Some(version_id) {
            return false;
        }
        match &self.open_build {
            Some(open) if !builds.iter().any(|b| b.id == open.id()) => {
                log::warn!("{}; closing build panel", SelectionError::UnknownBuild(open.id()));
                self.open_build = None;
                true
            }
            _ => false,
        }
    }

    /// The user opened a build from the current build list.
    pub fn open(&mut self, builds: &[PartialBuild], build_id: u64) -> Result<&OpenBuild, SelectionError> {
        let type_id = self.type_id.as_deref().ok_or(SelectionError::NoType)?;
        let version_id = self.version_id.as_deref().ok_or(SelectionError::NoVersion)?;
        let summary = builds
            .iter()
            .find(|b| b.id == build_id && b.type_id == type_id && b.version.id() == version_id)
            .ok_or(SelectionError::UnknownBuild(build_id))?;

        if self
            .open_build
            .as_ref()
            .is_some_and(|open| open.id() != build_id)
        {
            self.open_build = None;
        }
        Ok(self.open_build.get_or_insert_with(|| OpenBuild {
            summary: summary.clone(),
            detail: None,
        }))
    }

    /// Attaches fetched detail to the open build if it is the same build.
    pub fn detail_arrived(&mut self, build: &Build) -> bool {
        match &mut self.open_build {
            Some(open) if open.id() == build.id() && open.detail.as_ref() != Some(build) => {
                open.detail = Some(build.clone());
                true
            }
            _ => false,
        }
    }

    /// Closes the build panel, leaving type and version alone.
    pub fn close_build(&mut self) -> bool {
        self.open_build.take().is_some()
    }

    pub fn toggle_snapshots(&mut self) {
        self.include_snapshots = !self.include_snapshots;
    }

    /// Versions to display: snapshots are hidden unless enabled, except the
    /// selected version which is always shown.
    pub fn visible_versions<'a>(&self, versions: &'a [Version]) -> Vec<&'a Version> {
        versions
            .iter()
            .filter(|v| {
                self.include_snapshots || !v.is_snapshot() || Some(v.id()) == self.version_id()
            })
            .collect()
    }

    fn clear_type(&mut self) {
        self.type_id = None;
        self.version_id = None;
        self.open_build = None;
    }
}
