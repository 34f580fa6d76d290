//! Catalog data model shared by the cache, the state machines and the UI.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Jar filename used when a build does not name one.
pub const DEFAULT_JAR_LOCATION: &str = "server.jar";

/// A server-software distribution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerType {
    /// Stable identifier (e.g. "VANILLA", "PAPER").
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub compatibility: Vec<String>,
    #[serde(default)]
    pub experimental: bool,
    #[serde(default)]
    pub deprecated: bool,
    /// Total build count across all versions, maintained by the catalog.
    #[serde(default)]
    pub builds: u64,
}

/// Release channel tag carried by a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum VersionKind {
    #[serde(rename = "RELEASE")]
    Release,
    #[serde(rename = "SNAPSHOT")]
    Snapshot,
}

/// Identifier of a version in one of the catalog's two numbering schemes.
///
/// Game versions (`versionId`) are used by types that follow the game's
/// releases; project versions (`projectVersionId`) by types that ship their
/// own version line. Exactly one is ever present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionRef {
    Game(String),
    Project(String),
}

impl VersionRef {
    /// Builds a reference from the two optional wire fields, rejecting records
    /// that carry both or neither.
    pub fn from_parts(
        version_id: Option<String>,
        project_version_id: Option<String>,
    ) -> Result<Self, &'static str> {
        match (version_id, project_version_id) {
            (Some(id), None) => Ok(VersionRef::Game(id)),
            (None, Some(id)) => Ok(VersionRef::Project(id)),
            (Some(_), Some(_)) => Err("both versionId and projectVersionId are set"),
            (None, None) => Err("neither versionId nor projectVersionId is set"),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            VersionRef::Game(id) | VersionRef::Project(id) => id,
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, VersionRef::Project(_))
    }
}

/// A released line of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub latest: VersionRef,
    pub kind: Option<VersionKind>,
    pub builds: u64,
    pub java: Option<u32>,
    pub supported: Option<bool>,
    pub created: Option<String>,
}

impl Version {
    /// The identifier used for selection and for the builds endpoint.
    pub fn id(&self) -> &str {
        self.latest.id()
    }

    pub fn is_snapshot(&self) -> bool {
        self.kind == Some(VersionKind::Snapshot)
    }

    /// Untagged versions count as releases.
    pub fn is_release_like(&self) -> bool {
        matches!(self.kind, None | Some(VersionKind::Release))
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Latest {
            version_id: Option<String>,
            project_version_id: Option<String>,
        }

        #[derive(Deserialize)]
        struct Proxy {
            latest: Latest,
            #[serde(rename = "type")]
            kind: Option<VersionKind>,
            #[serde(default)]
            builds: u64,
            java: Option<u32>,
            supported: Option<bool>,
            created: Option<String>,
        }

        let proxy = Proxy::deserialize(deserializer)?;
        let latest = VersionRef::from_parts(proxy.latest.version_id, proxy.latest.project_version_id)
            .map_err(de::Error::custom)?;

        Ok(Version {
            latest,
            kind: proxy.kind,
            builds: proxy.builds,
            java: proxy.java,
            supported: proxy.supported,
            created: proxy.created,
        })
    }
}

/// Summary of a single build as returned by the builds listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialBuild {
    pub id: u64,
    /// Identifier of the owning type.
    pub type_id: String,
    pub version: VersionRef,
    /// 1-based build number within the version.
    pub build_number: u32,
    pub name: Option<String>,
    pub jar_size: Option<u64>,
    pub zip_size: Option<u64>,
    /// ISO 8601 creation timestamp.
    pub created: Option<String>,
}

impl PartialBuild {
    /// A first build of a project version is the version release itself
    /// rather than an incremental build.
    pub fn is_version_release(&self) -> bool {
        self.build_number == 1 && self.version.is_project()
    }
}

impl<'de> Deserialize<'de> for PartialBuild {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Proxy {
            id: u64,
            #[serde(rename = "type")]
            type_id: String,
            version_id: Option<String>,
            project_version_id: Option<String>,
            build_number: u32,
            name: Option<String>,
            jar_size: Option<u64>,
            zip_size: Option<u64>,
            created: Option<String>,
        }

        let proxy = Proxy::deserialize(deserializer)?;
        let version = VersionRef::from_parts(proxy.version_id, proxy.project_version_id)
            .map_err(de::Error::custom)?;

        Ok(PartialBuild {
            id: proxy.id,
            type_id: proxy.type_id,
            version,
            build_number: proxy.build_number,
            name: proxy.name,
            jar_size: proxy.jar_size,
            zip_size: proxy.zip_size,
            created: proxy.created,
        })
    }
}

/// Full build detail with resolved download locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(flatten)]
    pub summary: PartialBuild,
    pub jar_url: Option<String>,
    pub zip_url: Option<String>,
    pub jar_location: Option<String>,
}

impl Build {
    pub fn id(&self) -> u64 {
        self.summary.id
    }

    /// Filename the jar must be saved as.
    pub fn jar_location(&self) -> &str {
        self.jar_location
            .as_deref()
            .filter(|location| !location.is_empty())
            .unwrap_or(DEFAULT_JAR_LOCATION)
    }

    pub fn has_artifact(&self) -> bool {
        self.jar_url.is_some() || self.zip_url.is_some()
    }
}

/// Aggregate catalog counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub builds: u64,
    #[serde(default)]
    pub hashes: u64,
}

/// Decodes a list response.
///
/// Accepts a bare array, an envelope carrying the list under `field`, or an
/// object keyed by record identifier. For keyed objects the key is written
/// into `key_field` when the record does not carry it.
pub fn decode_list<T: DeserializeOwned>(
    body: &str,
    field: &str,
    key_field: Option<&str>,
) -> serde_json::Result<Vec<T>> {
    let value: Value = serde_json::from_str(body)?;
    let payload = unwrap_envelope(value, field);

    match payload {
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        Value::Object(map) => map
            .into_iter()
            .filter(|(key, _)| key != "success")
            .map(|(key, mut record)| {
                if let (Some(key_field), Value::Object(fields)) = (key_field, &mut record)
                    && !fields.contains_key(key_field)
                {
                    fields.insert(key_field.to_string(), Value::String(key));
                }
                serde_json::from_value(record)
            })
            .collect(),
        other => Err(de::Error::custom(format!(
            "expected a list or keyed object for `{}`, found {}",
            field,
            kind_name(&other)
        ))),
    }
}

/// Decodes a single-record response, bare or wrapped in an envelope.
pub fn decode_one<T: DeserializeOwned>(body: &str, field: &str) -> serde_json::Result<T> {
    let value: Value = serde_json::from_str(body)?;
    serde_json::from_value(unwrap_envelope(value, field))
}

fn unwrap_envelope(value: Value, field: &str) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(field) => {
            map.remove(field).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
