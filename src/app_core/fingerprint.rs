//! Drag-and-drop build identification.
//!
//! `Idle → Dragging → Hashing → {Resolved | NotFound | Errored} → Idle`.
//!
//! The flow does no I/O. A drop yields a [`FingerprintCommand`] that the
//! runtime executes, reporting back with a [`FingerprintEvent`]. Each drop
//! starts a new attempt; events from older attempts are discarded, so the
//! last drop wins.

use crate::catalog::CatalogError;
use crate::model::Build;
use std::path::PathBuf;

/// A file delivered by a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub path: PathBuf,
}

impl DroppedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Drag/drop input over the page surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropEvent {
    DragEnter { has_files: bool },
    DragOver { has_files: bool },
    DragLeave,
    Drop(Vec<DroppedFile>),
    /// The user closed the result view.
    Dismiss,
}

/// Identifies one drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(pub u64);

/// Work the runtime must perform for the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintCommand {
    /// Read the whole file and hash it.
    Hash { attempt: AttemptId, file: DroppedFile },
    /// Resolve a digest against the identification endpoint.
    Lookup { attempt: AttemptId, hash: String },
}

impl FingerprintCommand {
    pub fn attempt(&self) -> AttemptId {
        match self {
            FingerprintCommand::Hash { attempt, .. } | FingerprintCommand::Lookup { attempt, .. } => {
                *attempt
            }
        }
    }
}

/// Result of a [`FingerprintCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintEvent {
    Hashed {
        attempt: AttemptId,
        result: Result<String, String>,
    },
    LookedUp {
        attempt: AttemptId,
        result: Result<Build, CatalogError>,
    },
}

impl FingerprintEvent {
    pub fn attempt(&self) -> AttemptId {
        match self {
            FingerprintEvent::Hashed { attempt, .. } | FingerprintEvent::LookedUp { attempt, .. } => {
                *attempt
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FingerprintPhase {
    #[default]
    Idle,
    Dragging,
    /// Reading, hashing or looking up. `hash` is set once the digest is known.
    Hashing {
        file: DroppedFile,
        hash: Option<String>,
    },
    Resolved {
        file: DroppedFile,
        hash: String,
        build: Box<Build>,
    },
    NotFound {
        file: DroppedFile,
        hash: String,
    },
    Errored {
        file: DroppedFile,
    },
}

/// Outcome of feeding a [`DropEvent`] to the flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Handled {
    /// The host must suppress its default handling (navigation to the file).
    pub prevent_default: bool,
    pub command: Option<FingerprintCommand>,
}

#[derive(Debug, Clone, Default)]
pub struct FingerprintFlow {
    phase: FingerprintPhase,
    attempt: u64,
}

impl FingerprintFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &FingerprintPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == FingerprintPhase::Idle
    }

    /// Work is outstanding; the progress view stays up until a result is known.
    pub fn is_working(&self) -> bool {
        matches!(self.phase, FingerprintPhase::Hashing { .. })
    }

    /// Finished without a match. Lookup misses and failures look the same.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self.phase,
            FingerprintPhase::NotFound { .. } | FingerprintPhase::Errored { .. }
        )
    }

    pub fn resolved_build(&self) -> Option<&Build> {
        match &self.phase {
            FingerprintPhase::Resolved { build, .. } => Some(build),
            _ => None,
        }
    }

    pub fn current_attempt(&self) -> AttemptId {
        AttemptId(self.attempt)
    }

    /// Feeds a drag/drop event. Defined for every phase.
    pub fn handle(&mut self, event: DropEvent) -> Handled {
        match event {
            DropEvent::DragEnter { has_files } | DropEvent::DragOver { has_files } => {
                if !has_files {
                    return Handled::default();
                }
                if self.phase == FingerprintPhase::Idle {
                    self.phase = FingerprintPhase::Dragging;
                }
                Handled {
                    prevent_default: true,
                    command: None,
                }
            }
            DropEvent::DragLeave => {
                if self.phase == FingerprintPhase::Dragging {
                    self.phase = FingerprintPhase::Idle;
                }
                Handled::default()
            }
            DropEvent::Drop(files) => {
                let Some(file) = files.into_iter().next() else {
                    if self.phase == FingerprintPhase::Dragging {
                        self.phase = FingerprintPhase::Idle;
                    }
                    return Handled {
                        prevent_default: true,
                        command: None,
                    };
                };
                // Superseding the previous attempt makes its late events stale.
                self.attempt += 1;
                let attempt = self.current_attempt();
                log::info!("identifying {} (attempt {})", file.name, self.attempt);
                self.phase = FingerprintPhase::Hashing {
                    file: file.clone(),
                    hash: None,
                };
                Handled {
                    prevent_default: true,
                    command: Some(FingerprintCommand::Hash { attempt, file }),
                }
            }
            DropEvent::Dismiss => {
                if self.is_working() {
                    // Cancel: results of this attempt will no longer apply.
                    self.attempt += 1;
                }
                self.phase = FingerprintPhase::Idle;
                Handled::default()
            }
        }
    }

    /// Applies the result of a command. Returns the follow-up command, if any.
    pub fn complete(&mut self, event: FingerprintEvent) -> Option<FingerprintCommand> {
        if event.attempt() != self.current_attempt() {
            log::debug!("dropping result of superseded attempt {:?}", event.attempt());
            return None;
        }
        let FingerprintPhase::Hashing { file, hash } = &mut self.phase else {
            return None;
        };

        match event {
            FingerprintEvent::Hashed { attempt, result } => {
                if hash.is_some() {
                    return None;
                }
                match result {
                    Ok(digest) => {
                        *hash = Some(digest.clone());
                        Some(FingerprintCommand::Lookup {
                            attempt,
                            hash: digest,
                        })
                    }
                    Err(err) => {
                        log::warn!("could not hash {}: {}", file.name, err);
                        let file = file.clone();
                        self.phase = FingerprintPhase::Errored { file };
                        None
                    }
                }
            }
            FingerprintEvent::LookedUp { result, .. } => {
                let Some(digest) = hash.clone() else {
                    return None;
                };
                let file = file.clone();
                self.phase = match result {
                    Ok(build) => {
                        log::info!("{} matches build {}", file.name, build.id());
                        FingerprintPhase::Resolved {
                            file,
                            hash: digest,
                            build: Box::new(build),
                        }
                    }
                    Err(err) if err.is_not_found() => {
                        log::info!("no build matches {}", digest);
                        FingerprintPhase::NotFound { file, hash: digest }
                    }
                    Err(err) => {
                        log::warn!("lookup of {} failed: {}", digest, err);
                        FingerprintPhase::Errored { file }
                    }
                };
                None
            }
        }
    }
}
