use jarscope::app_core::fingerprint::{DropEvent, FingerprintPhase};
use jarscope::app_core::input::parse_dropped_paths;
use jarscope::app_core::selection::Selection;
use jarscope::app_core::state::{AppAction, AppState, ArtifactKind};
use jarscope::catalog::{CatalogError, CatalogSource};
use jarscope::digest;
use jarscope::model::{Build, PartialBuild, ServerType, Stats, Version};
use jarscope::runtime::native::worker;
use jarscope::theme::Theme;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Mutex;

/// Catalog served from memory; records every request it answers.
struct MemoryCatalog {
    known_hash: String,
    requests: Mutex<Vec<String>>,
}

impl MemoryCatalog {
    fn new(known_hash: String) -> Self {
        Self {
            known_hash,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn log(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn build_json(id: u64, type_id: &str, version_id: &str, number: u32) -> serde_json::Value {
    json!({
        "id": id,
        "type": type_id,
        "versionId": version_id,
        "buildNumber": number,
        "jarUrl": format!("https://cdn.test/{}/{}/{}.jar", type_id, version_id, number),
        "jarLocation": "server.jar",
    })
}

impl CatalogSource for MemoryCatalog {
    fn types(&self) -> Result<Vec<ServerType>, CatalogError> {
        self.log("types".to_string());
        Ok(serde_json::from_value(json!([
            { "identifier": "VANILLA", "name": "Vanilla", "builds": 2 },
            { "identifier": "PAPER", "name": "Paper", "builds": 3 },
        ]))
        .unwrap())
    }

    fn versions(&self, type_id: &str) -> Result<Vec<Version>, CatalogError> {
        self.log(format!("versions/{}", type_id));
        let versions = match type_id {
            "VANILLA" => json!([
                { "latest": { "versionId": "24w14a" }, "type": "SNAPSHOT" },
                { "latest": { "versionId": "1.20.6" }, "type": "RELEASE" },
            ]),
            "PAPER" => json!([
                { "latest": { "versionId": "1.21" }, "type": "RELEASE" },
            ]),
            _ => return Err(CatalogError::NotFound(type_id.to_string())),
        };
        Ok(serde_json::from_value(versions).unwrap())
    }

    fn builds(&self, type_id: &str, version_id: &str) -> Result<Vec<PartialBuild>, CatalogError> {
        self.log(format!("builds/{}/{}", type_id, version_id));
        Ok(serde_json::from_value(json!([
            build_json(11, type_id, version_id, 2),
            build_json(10, type_id, version_id, 1),
        ]))
        .unwrap())
    }

    fn build(&self, identifier: &str) -> Result<Build, CatalogError> {
        self.log(format!("build/{}", identifier));
        if identifier == self.known_hash || identifier == "11" {
            Ok(serde_json::from_value(build_json(11, "PAPER", "1.21", 2)).unwrap())
        } else if identifier == "10" {
            Ok(serde_json::from_value(build_json(10, "PAPER", "1.21", 1)).unwrap())
        } else {
            Err(CatalogError::NotFound(identifier.to_string()))
        }
    }

    fn stats(&self) -> Result<Stats, CatalogError> {
        self.log("stats".to_string());
        Ok(Stats {
            builds: 5,
            hashes: 12,
        })
    }
}

fn new_app(selection: Selection) -> AppState {
    AppState::new(
        Theme::Dracula.config(),
        "test".to_string(),
        "memory://".to_string(),
        PathBuf::from("."),
        selection,
    )
}

/// Executes queued actions against `source` until nothing is left.
fn settle(app: &mut AppState, source: &MemoryCatalog) -> Vec<AppAction> {
    let mut downloads = Vec::new();
    loop {
        let actions = app.take_actions();
        if actions.is_empty() {
            return downloads;
        }
        for action in actions {
            match action {
                AppAction::Fetch(ticket) => {
                    let result = source.fetch(&ticket.key);
                    app.apply_fetch(ticket, result);
                }
                AppAction::Fingerprint(command) => {
                    let event = worker::execute_fingerprint(source, command);
                    app.apply_fingerprint(event);
                }
                download @ AppAction::Download { .. } => downloads.push(download),
            }
        }
    }
}

#[test]
fn browse_from_cold_start_to_open_build() {
    let source = MemoryCatalog::new(String::new());
    let mut app = new_app(Selection::new(false));

    app.start();
    settle(&mut app, &source);

    assert_eq!(app.selection.type_id(), Some("VANILLA"));
    assert_eq!(app.selection.version_id(), Some("1.20.6"));
    let visible: Vec<&str> = app.visible_versions().iter().map(|v| v.id()).collect();
    assert_eq!(visible, vec!["1.20.6"]);

    app.select_type_at(1);
    assert_eq!(app.selection.version_id(), None);
    settle(&mut app, &source);
    assert_eq!(app.selection.type_id(), Some("PAPER"));
    assert_eq!(app.selection.version_id(), Some("1.21"));

    app.open_build_at(0);
    settle(&mut app, &source);
    let open = app.selection.open_build().unwrap();
    assert_eq!(open.id(), 11);
    assert!(open.detail.is_some());

    app.request_download(ArtifactKind::Jar);
    let downloads = settle(&mut app, &source);
    assert!(matches!(
        downloads.as_slice(),
        [AppAction::Download { kind: ArtifactKind::Jar, .. }]
    ));

    let requests = source.requests();
    assert_eq!(requests.iter().filter(|r| *r == "types").count(), 1);
    assert!(requests.contains(&"builds/PAPER/1.21".to_string()));
    assert!(requests.contains(&"build/11".to_string()));
}

#[test]
fn restored_selection_is_kept_when_valid_and_cleared_when_not() {
    let source = MemoryCatalog::new(String::new());

    let mut restored = Selection::new(false);
    restored.restore(Some("VANILLA".to_string()), Some("24w14a".to_string()));
    let mut app = new_app(restored);
    app.start();
    settle(&mut app, &source);
    assert_eq!(app.selection.version_id(), Some("24w14a"));
    let visible: Vec<&str> = app.visible_versions().iter().map(|v| v.id()).collect();
    assert!(visible.contains(&"24w14a"));

    let mut bogus = Selection::new(false);
    bogus.restore(Some("FORGE".to_string()), None);
    let mut app = new_app(bogus);
    app.start();
    settle(&mut app, &source);
    assert_eq!(app.selection.type_id(), Some("VANILLA"));
    assert!(!source.requests().contains(&"versions/FORGE".to_string()));
}

#[test]
fn dropped_jar_is_identified_by_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("paper-1.21-2.jar");
    std::fs::write(&jar, b"not really a jar").unwrap();
    let hash = digest::fingerprint_hex(b"not really a jar");
    let source = MemoryCatalog::new(hash.clone());
    let mut app = new_app(Selection::new(false));

    let paste = format!("'{}'", jar.display());
    app.handle_drop(DropEvent::Drop(parse_dropped_paths(&paste)));
    assert!(app.fingerprint.is_working());
    settle(&mut app, &source);

    match app.fingerprint.phase() {
        FingerprintPhase::Resolved { hash: found, build, .. } => {
            assert_eq!(found, &hash);
            assert_eq!(build.id(), 11);
        }
        other => panic!("unexpected phase {:?}", other),
    }
    assert!(source.requests().contains(&format!("build/{}", hash)));

    app.handle_drop(DropEvent::Dismiss);
    assert!(app.fingerprint.is_idle());
}

#[test]
fn unknown_jar_ends_in_neutral_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("custom.jar");
    std::fs::write(&jar, b"custom build").unwrap();
    let source = MemoryCatalog::new("feed".to_string());
    let mut app = new_app(Selection::new(false));

    app.handle_drop(DropEvent::Drop(parse_dropped_paths(&jar.display().to_string())));
    settle(&mut app, &source);

    assert!(app.fingerprint.is_empty_result());
    assert!(app.fingerprint.resolved_build().is_none());
}
