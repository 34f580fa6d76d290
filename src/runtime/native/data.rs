//! Blocking HTTP access to the catalog service and local filesystem helpers.

use crate::app_core::fingerprint::DroppedFile;
use crate::app_core::progress::DownloadProgress;
use crate::app_core::state::ArtifactKind;
use crate::catalog::{CatalogError, CatalogSource};
use crate::model::{self, Build, PartialBuild, ServerType, Stats, Version};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://versions.mcjars.app/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("app", "mcjars", "jarscope")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    Ok(data_dir)
}

pub fn http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(concat!("jarscope/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Catalog service client.
pub struct CatalogClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        endpoint(&self.base_url, segments)
    }

    fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        log::debug!("GET {}", url);
        let network = |message: String| CatalogError::Network {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| network(err.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(network(format!("HTTP {}", status)));
        }
        response.text().map_err(|err| network(err.to_string()))
    }

    fn get_list<T: DeserializeOwned>(
        &self,
        url: &str,
        field: &str,
        key_field: Option<&str>,
    ) -> Result<Vec<T>, CatalogError> {
        let body = self.get_text(url)?;
        model::decode_list(&body, field, key_field).map_err(|err| decode_error(url, err))
    }

    fn get_one<T: DeserializeOwned>(&self, url: &str, field: &str) -> Result<T, CatalogError> {
        let body = self.get_text(url)?;
        model::decode_one(&body, field).map_err(|err| decode_error(url, err))
    }
}

fn decode_error(url: &str, err: serde_json::Error) -> CatalogError {
    CatalogError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Joins path segments onto the base address.
fn endpoint(base_url: &str, segments: &[&str]) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    for segment in segments {
        url.push('/');
        url.push_str(segment.trim_matches('/'));
    }
    url
}

impl CatalogSource for CatalogClient {
    fn types(&self) -> Result<Vec<ServerType>, CatalogError> {
        self.get_list(&self.endpoint(&["types"]), "types", Some("identifier"))
    }

    fn versions(&self, type_id: &str) -> Result<Vec<Version>, CatalogError> {
        self.get_list(&self.endpoint(&["versions", type_id]), "versions", None)
    }

    fn builds(&self, type_id: &str, version_id: &str) -> Result<Vec<PartialBuild>, CatalogError> {
        self.get_list(
            &self.endpoint(&["builds", type_id, version_id]),
            "builds",
            None,
        )
    }

    fn build(&self, identifier: &str) -> Result<Build, CatalogError> {
        self.get_one(&self.endpoint(&["build", identifier]), "build")
    }

    fn stats(&self) -> Result<Stats, CatalogError> {
        self.get_one(&self.endpoint(&["stats"]), "stats")
    }
}

/// File name an artifact of `build` is saved under.
///
/// Jars use the build's `jarLocation`; zips use the last path segment of
/// their URL. Returns `None` when the artifact is not available.
pub fn artifact_file_name(build: &Build, kind: ArtifactKind) -> Option<String> {
    match kind {
        ArtifactKind::Jar => {
            build.jar_url.as_ref()?;
            let location = build.jar_location();
            let name = location.rsplit('/').next().unwrap_or(location);
            (!name.is_empty()).then(|| name.to_string())
        }
        ArtifactKind::Zip => {
            let url = build.zip_url.as_deref()?;
            let path = url.split(['?', '#']).next().unwrap_or(url);
            let name = path.trim_end_matches('/').rsplit('/').next()?;
            if name.is_empty() || name.contains(':') {
                Some(format!("build-{}.zip", build.id()))
            } else {
                Some(name.to_string())
            }
        }
    }
}

pub fn artifact_url(build: &Build, kind: ArtifactKind) -> Option<&str> {
    match kind {
        ArtifactKind::Jar => build.jar_url.as_deref(),
        ArtifactKind::Zip => build.zip_url.as_deref(),
    }
}

/// Downloads `build`'s artifact into `dir`, returning the written path.
pub fn download_artifact<F>(
    client: &reqwest::blocking::Client,
    build: &Build,
    kind: ArtifactKind,
    dir: &Path,
    mut on_progress: F,
) -> Result<PathBuf>
where
    F: FnMut(DownloadProgress),
{
    let url = artifact_url(build, kind)
        .ok_or_else(|| anyhow::anyhow!("Build {} has no {:?} artifact", build.id(), kind))?;
    let name = artifact_file_name(build, kind)
        .ok_or_else(|| anyhow::anyhow!("Build {} has no {:?} artifact", build.id(), kind))?;
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(name);
    log::info!("downloading {} to {}", url, path.display());
    download_to_path(client, url, &path, Some(&mut on_progress))?;
    Ok(path)
}

pub fn download_to_path(
    client: &reqwest::blocking::Client,
    url: &str,
    path: &Path,
    mut on_progress: Option<&mut dyn FnMut(DownloadProgress)>,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to request {}", url))?;
    if !response.status().is_success() {
        anyhow::bail!("Failed to download {}: {}", url, response.status());
    }
    let total = response.content_length();
    let partial = path.with_extension("part");
    let mut file = fs::File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    let mut downloaded = 0u64;
    let mut buffer = [0u8; 65536];

    if let Some(cb) = on_progress.as_deref_mut() {
        cb(DownloadProgress { downloaded, total });
    }

    loop {
        let read = response.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])?;
        downloaded += read as u64;
        if let Some(cb) = on_progress.as_deref_mut() {
            cb(DownloadProgress { downloaded, total });
        }
    }
    file.flush()?;
    drop(file);

    fs::rename(&partial, path)
        .with_context(|| format!("Failed to move download into {}", path.display()))?;
    Ok(())
}

/// Keeps the pasted paths that name a regular file. Pasted prose yields none.
pub fn existing_files(files: Vec<DroppedFile>) -> Vec<DroppedFile> {
    files.into_iter().filter(|file| file.path.is_file()).collect()
}
