//! Shared application state, types, and state-mutation methods.
//!
//! This module is runtime-agnostic. It never performs I/O: work that has to
//! happen outside the UI thread is queued in `pending_actions` and the
//! runtime feeds results back through `apply_fetch` / `apply_fingerprint`.

use crate::app_core::fingerprint::{DropEvent, FingerprintCommand, FingerprintEvent, FingerprintFlow};
use crate::app_core::progress::ProgressStage;
use crate::app_core::selection::{OpenBuild, Selection, SelectionError};
use crate::catalog::{CacheKey, CatalogCache, CatalogError, FetchTicket, Payload};
use crate::model::{Build, PartialBuild, ServerType, Version};
use crate::theme::ThemeConfig;
use ratatui::{layout::Rect, widgets::ListState};
use std::path::PathBuf;
use tui_scrollview::ScrollViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Types,
    Versions,
    Builds,
    Details,
}

/// Which artifact of a build to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Jar,
    Zip,
}

/// Work queued for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Fetch(FetchTicket),
    Fingerprint(FingerprintCommand),
    Download { build: Box<Build>, kind: ArtifactKind },
}

/// Application state for the Ratatui app.
pub struct AppState {
    /// Responses from the catalog service
    pub cache: CatalogCache,
    /// Selected type, version and open build
    pub selection: Selection,
    /// Drag-and-drop identification
    pub fingerprint: FingerprintFlow,
    pub types_list_state: ListState,
    pub versions_list_state: ListState,
    /// Cursor in the build list; a build is opened with Enter
    pub builds_list_state: ListState,
    /// Which pane currently has keyboard focus
    pub focused_pane: FocusPane,
    /// Theme configuration
    pub theme: ThemeConfig,
    /// App version string
    pub app_version: String,
    /// Catalog base address, shown in the status bar
    pub api_url: String,
    /// Where downloaded artifacts are written
    pub download_dir: PathBuf,
    /// State for scrolling the details pane
    pub details_scroll_state: ScrollViewState,
    /// Screen regions recorded during render, used for mouse hit-testing
    pub types_area: Option<Rect>,
    pub versions_area: Option<Rect>,
    pub builds_area: Option<Rect>,
    pub details_area: Option<Rect>,
    /// Flag to quit app
    pub should_quit: bool,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Whether progress modal is visible
    pub show_progress: bool,
    /// Progress modal title
    pub progress_title: String,
    /// Progress stages for modal display
    pub progress_stages: Vec<ProgressStage>,
    /// One-line message for the status bar (last download, rejected intent)
    pub status_message: Option<String>,
    /// Actions to execute after input handling
    pub pending_actions: Vec<AppAction>,
}

impl AppState {
    pub fn new(
        theme: ThemeConfig,
        app_version: String,
        api_url: String,
        download_dir: PathBuf,
        selection: Selection,
    ) -> Self {
        Self {
            cache: CatalogCache::new(),
            selection,
            fingerprint: FingerprintFlow::new(),
            types_list_state: ListState::default(),
            versions_list_state: ListState::default(),
            builds_list_state: ListState::default(),
            focused_pane: FocusPane::Types,
            theme,
            app_version,
            api_url,
            download_dir,
            details_scroll_state: ScrollViewState::default(),
            types_area: None,
            versions_area: None,
            builds_area: None,
            details_area: None,
            should_quit: false,
            show_help: false,
            show_progress: false,
            progress_title: String::new(),
            progress_stages: Vec::new(),
            status_message: None,
            pending_actions: Vec::new(),
        }
    }

    /// Requests the initial data.
    pub fn start(&mut self) {
        self.reconcile();
    }

    pub fn take_actions(&mut self) -> Vec<AppAction> {
        std::mem::take(&mut self.pending_actions)
    }

    fn request(&mut self, key: Option<CacheKey>) {
        if let Some(ticket) = self.cache.request_opt(key) {
            self.pending_actions.push(AppAction::Fetch(ticket));
        }
    }

    /// Brings the selection in line with what the cache holds and requests
    /// whatever the current selection needs next.
    ///
    /// Runs after every cache completion and every user intent; each step is
    /// idempotent.
    pub fn reconcile(&mut self) {
        self.request(Some(CacheKey::Types));
        self.request(Some(CacheKey::Stats));

        // A type or version is only requested with once the list it comes
        // from has confirmed it; restored ids may not exist.
        let Some(types) = self.cache.types().ready() else {
            self.sync_list_states();
            return;
        };
        self.selection.types_arrived(types);

        self.request(self.selection.versions_key());
        let mut versions_known = false;
        if let Some(type_id) = self.selection.type_id().map(str::to_owned)
            && let Some(versions) = self.cache.versions(Some(&type_id)).ready()
        {
            self.selection.versions_arrived(&type_id, versions);
            versions_known = true;
        }

        if versions_known {
            self.request(self.selection.builds_key());
        }
        if let Some(type_id) = self.selection.type_id().map(str::to_owned)
            && let Some(version_id) = self.selection.version_id().map(str::to_owned)
            && let Some(builds) = self
                .cache
                .builds(Some(&type_id), Some(&version_id))
                .ready()
        {
            self.selection.builds_arrived(&type_id, &version_id, builds);
        }

        // A revalidated detail replaces the one already shown.
        let build_id = self.selection.open_build().map(OpenBuild::id);
        match self.cache.build(build_id).ready().cloned() {
            Some(build) => {
                self.selection.detail_arrived(&build);
            }
            None => self.request(self.selection.missing_detail_key()),
        }

        self.evict_out_of_scope();
        self.sync_list_states();
    }

    /// Discards cached lists that no longer belong to the selection.
    fn evict_out_of_scope(&mut self) {
        let type_id = self.selection.type_id().map(str::to_owned);
        let version_id = self.selection.version_id().map(str::to_owned);
        let open_id = self.selection.open_build().map(OpenBuild::id);
        self.cache.retain(|key| match key {
            CacheKey::Types | CacheKey::Stats => true,
            CacheKey::Versions { type_id: t } => Some(t) == type_id.as_ref(),
            CacheKey::Builds {
                type_id: t,
                version_id: v,
            } => Some(t) == type_id.as_ref() && Some(v) == version_id.as_ref(),
            CacheKey::Build { build_id } => Some(*build_id) == open_id,
        });
    }

    fn sync_list_states(&mut self) {
        let type_index = self.types().and_then(|types| {
            types
                .iter()
                .position(|t| Some(t.identifier.as_str()) == self.selection.type_id())
        });
        self.types_list_state.select(type_index);

        let version_index = self
            .visible_versions()
            .iter()
            .position(|v| Some(v.id()) == self.selection.version_id());
        self.versions_list_state.select(version_index);

        let build_count = self.builds().map_or(0, <[PartialBuild]>::len);
        let open_index = self.selection.open_build().and_then(|open| {
            self.builds()
                .and_then(|builds| builds.iter().position(|b| b.id == open.id()))
        });
        let cursor = match (open_index, self.builds_list_state.selected()) {
            (Some(index), _) => Some(index),
            _ if build_count == 0 => None,
            (None, Some(index)) => Some(index.min(build_count - 1)),
            (None, None) => Some(0),
        };
        self.builds_list_state.select(cursor);
    }

    /// Applies a finished catalog fetch.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, result: Result<Payload, CatalogError>) {
        if self.cache.complete(ticket, result) {
            self.reconcile();
        }
    }

    pub fn types(&self) -> Option<&[ServerType]> {
        self.cache.types().ready()
    }

    pub fn versions(&self) -> Option<&[Version]> {
        self.cache.versions(self.selection.type_id()).ready()
    }

    pub fn visible_versions(&self) -> Vec<&Version> {
        self.versions()
            .map(|versions| self.selection.visible_versions(versions))
            .unwrap_or_default()
    }

    pub fn builds(&self) -> Option<&[PartialBuild]> {
        self.cache
            .builds(self.selection.type_id(), self.selection.version_id())
            .ready()
    }

    pub fn selected_type(&self) -> Option<&ServerType> {
        let type_id = self.selection.type_id()?;
        self.types()?.iter().find(|t| t.identifier == type_id)
    }

    pub fn select_type_at(&mut self, index: usize) {
        let Some(types) = self.cache.types().ready() else {
            return;
        };
        let Some(type_id) = types.get(index).map(|t| t.identifier.clone()) else {
            return;
        };
        match self.selection.select_type(types, &type_id) {
            Ok(true) => {
                self.builds_list_state.select(None);
                self.details_scroll_state = ScrollViewState::default();
                self.reconcile();
            }
            Ok(false) => {}
            Err(err) => self.reject(err),
        }
    }

    pub fn select_version_at(&mut self, index: usize) {
        let Some(version_id) = self
            .visible_versions()
            .get(index)
            .map(|v| v.id().to_string())
        else {
            return;
        };
        let Some(versions) = self.cache.versions(self.selection.type_id()).ready() else {
            return;
        };
        match self.selection.select_version(versions, &version_id) {
            Ok(true) => {
                self.builds_list_state.select(None);
                self.details_scroll_state = ScrollViewState::default();
                self.reconcile();
            }
            Ok(false) => {}
            Err(err) => self.reject(err),
        }
    }

    /// Opens the build under the build-list cursor.
    pub fn open_selected_build(&mut self) {
        let Some(index) = self.builds_list_state.selected() else {
            return;
        };
        self.open_build_at(index);
    }

    pub fn open_build_at(&mut self, index: usize) {
        let Some(builds) = self
            .cache
            .builds(self.selection.type_id(), self.selection.version_id())
            .ready()
        else {
            return;
        };
        let Some(build_id) = builds.get(index).map(|b| b.id) else {
            return;
        };
        let opened = self.selection.open(builds, build_id).map(|_| ());
        if let Err(err) = opened {
            self.reject(err);
            return;
        }
        self.builds_list_state.select(Some(index));
        self.details_scroll_state = ScrollViewState::default();
        self.reconcile();
    }

    pub fn close_build(&mut self) {
        if self.selection.close_build() {
            self.details_scroll_state = ScrollViewState::default();
            self.reconcile();
        }
    }

    pub fn toggle_snapshots(&mut self) {
        self.selection.toggle_snapshots();
        self.sync_list_states();
    }

    /// Refetches every key the current view depends on.
    pub fn revalidate(&mut self) {
        let keys = [
            Some(CacheKey::Types),
            Some(CacheKey::Stats),
            self.selection.versions_key(),
            self.selection.builds_key(),
            CacheKey::build(self.selection.open_build().map(OpenBuild::id)),
        ];
        for key in keys.into_iter().flatten() {
            if let Some(ticket) = self.cache.revalidate(key) {
                self.pending_actions.push(AppAction::Fetch(ticket));
            }
        }
    }

    /// Moves the cursor of the focused list by `direction` entries.
    ///
    /// Moving in the type and version lists selects the entry under the
    /// cursor; the build list only moves its cursor.
    pub fn move_selection(&mut self, direction: i32) {
        match self.focused_pane {
            FocusPane::Types => {
                let len = self.types().map_or(0, <[ServerType]>::len);
                if let Some(index) = step(self.types_list_state.selected(), len, direction) {
                    self.select_type_at(index);
                }
            }
            FocusPane::Versions => {
                let len = self.visible_versions().len();
                if let Some(index) = step(self.versions_list_state.selected(), len, direction) {
                    self.select_version_at(index);
                }
            }
            FocusPane::Builds => {
                let len = self.builds().map_or(0, <[PartialBuild]>::len);
                let next = step(self.builds_list_state.selected(), len, direction);
                self.builds_list_state.select(next);
            }
            FocusPane::Details => {
                if direction < 0 {
                    self.details_scroll_state.scroll_up();
                } else {
                    self.details_scroll_state.scroll_down();
                }
            }
        }
    }

    pub fn focus_pane(&mut self, pane: FocusPane) {
        self.focused_pane = pane;
    }

    pub fn focus_next_pane(&mut self) {
        let next = match self.focused_pane {
            FocusPane::Types => FocusPane::Versions,
            FocusPane::Versions => FocusPane::Builds,
            FocusPane::Builds => FocusPane::Details,
            FocusPane::Details => FocusPane::Types,
        };
        self.focus_pane(next);
    }

    pub fn focus_prev_pane(&mut self) {
        let prev = match self.focused_pane {
            FocusPane::Types => FocusPane::Details,
            FocusPane::Versions => FocusPane::Types,
            FocusPane::Builds => FocusPane::Versions,
            FocusPane::Details => FocusPane::Builds,
        };
        self.focus_pane(prev);
    }

    /// Feeds a drag/drop event to the identification flow.
    pub fn handle_drop(&mut self, event: DropEvent) -> bool {
        let handled = self.fingerprint.handle(event);
        if let Some(command) = handled.command {
            self.pending_actions.push(AppAction::Fingerprint(command));
        }
        handled.prevent_default
    }

    pub fn apply_fingerprint(&mut self, event: FingerprintEvent) {
        if let Some(command) = self.fingerprint.complete(event) {
            self.pending_actions.push(AppAction::Fingerprint(command));
        }
    }

    /// Queues a download of the open build's artifact.
    pub fn request_download(&mut self, kind: ArtifactKind) {
        let Some(build) = self.selection.open_build().and_then(|open| open.detail.as_ref()) else {
            self.status_message = Some("Open a build first".to_string());
            return;
        };
        let available = match kind {
            ArtifactKind::Jar => build.jar_url.is_some(),
            ArtifactKind::Zip => build.zip_url.is_some(),
        };
        if !available {
            self.status_message = Some(format!("Build {} has no {:?} artifact", build.id(), kind));
            return;
        }
        self.pending_actions.push(AppAction::Download {
            build: Box::new(build.clone()),
            kind,
        });
    }

    fn reject(&mut self, err: SelectionError) {
        log::warn!("rejected selection: {}", err);
        self.status_message = Some(err.to_string());
        self.sync_list_states();
    }

    pub fn start_progress(&mut self, title: impl Into<String>, stages: &[&str]) {
        self.show_progress = true;
        self.progress_title = title.into();
        self.progress_stages = stages
            .iter()
            .map(|label| ProgressStage {
                label: (*label).to_string(),
                ratio: 0.0,
                done: false,
            })
            .collect();
    }

    pub fn update_stage(&mut self, label: &str, ratio: f64) {
        if let Some(stage) = self
            .progress_stages
            .iter_mut()
            .find(|stage| stage.label == label)
        {
            stage.ratio = ratio.clamp(0.0, 1.0);
            if stage.ratio >= 1.0 {
                stage.done = true;
            }
        }
    }

    pub fn finish_stage(&mut self, label: &str) {
        self.update_stage(label, 1.0);
    }

    pub fn clear_progress(&mut self) {
        self.show_progress = false;
        self.progress_title.clear();
        self.progress_stages.clear();
    }
}

/// Next cursor position in a list of `len` entries, clamped to its bounds.
fn step(current: Option<usize>, len: usize, direction: i32) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let distance = direction.unsigned_abs() as usize;
    let next = match current {
        None => 0,
        Some(index) if direction < 0 => index.saturating_sub(distance),
        Some(index) => index.saturating_add(distance).min(len - 1),
    };
    Some(next)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app_core::fingerprint::{DroppedFile, FingerprintPhase};
    use crate::app_core::selection::tests::{partial_build, server_type, version};
    use crate::model::VersionKind;
    use crate::theme::Theme;

    pub(crate) fn make_test_app() -> AppState {
        AppState::new(
            Theme::Dracula.config(),
            "v0".to_string(),
            "http://catalog.test".to_string(),
            PathBuf::from("."),
            Selection::default(),
        )
    }

    /// Completes the pending fetch for `key` with `payload`.
    pub(crate) fn answer(app: &mut AppState, key: &CacheKey, payload: Payload) {
        let actions = app.take_actions();
        let mut rest = Vec::new();
        let mut answered = None;
        for action in actions {
            match action {
                AppAction::Fetch(ticket) if &ticket.key == key && answered.is_none() => {
                    answered = Some(ticket)
                }
                other => rest.push(other),
            }
        }
        app.pending_actions = rest;
        let ticket = answered.unwrap_or_else(|| panic!("no pending fetch for {:?}", key));
        app.apply_fetch(ticket, Ok(payload));
    }

    fn pending_keys(app: &AppState) -> Vec<CacheKey> {
        app.pending_actions
            .iter()
            .filter_map(|action| match action {
                AppAction::Fetch(ticket) => Some(ticket.key.clone()),
                _ => None,
            })
            .collect()
    }

    fn vanilla_versions() -> Payload {
        Payload::Versions(vec![
            version("1.21", Some(VersionKind::Release)),
            version("1.21-pre1", Some(VersionKind::Snapshot)),
        ])
    }

    #[test]
    fn test_start_requests_types_and_stats_once() {
        let mut app = make_test_app();
        app.start();
        app.reconcile();
        assert_eq!(pending_keys(&app), vec![CacheKey::Types, CacheKey::Stats]);
    }

    #[test]
    fn test_browse_scenario() {
        let mut app = make_test_app();
        app.start();
        answer(
            &mut app,
            &CacheKey::Types,
            Payload::Types(vec![server_type("vanilla"), server_type("paper")]),
        );
        assert_eq!(app.selection.type_id(), Some("vanilla"));
        assert_eq!(app.types_list_state.selected(), Some(0));

        let versions_key = CacheKey::Versions {
            type_id: "vanilla".into(),
        };
        answer(&mut app, &versions_key, vanilla_versions());
        assert_eq!(app.selection.version_id(), Some("1.21"));
        assert_eq!(app.visible_versions().len(), 1);

        let builds_key = CacheKey::Builds {
            type_id: "vanilla".into(),
            version_id: "1.21".into(),
        };
        answer(
            &mut app,
            &builds_key,
            Payload::Builds(vec![partial_build(1, "vanilla", "1.21", 1)]),
        );
        app.open_build_at(0);
        assert_eq!(app.selection.open_build().map(OpenBuild::id), Some(1));
        assert!(pending_keys(&app).contains(&CacheKey::Build { build_id: 1 }));

        let detail = Build {
            summary: partial_build(1, "vanilla", "1.21", 1),
            jar_url: Some("https://example.invalid/server.jar".into()),
            zip_url: None,
            jar_location: None,
        };
        answer(
            &mut app,
            &CacheKey::Build { build_id: 1 },
            Payload::Build(Box::new(detail.clone())),
        );
        assert_eq!(
            app.selection.open_build().and_then(|open| open.detail.as_ref()),
            Some(&detail)
        );
    }

    #[test]
    fn test_revalidated_detail_replaces_open_build() {
        let mut app = make_test_app();
        app.start();
        answer(&mut app, &CacheKey::Types, Payload::Types(vec![server_type("vanilla")]));
        answer(
            &mut app,
            &CacheKey::Versions {
                type_id: "vanilla".into(),
            },
            vanilla_versions(),
        );
        answer(
            &mut app,
            &CacheKey::Builds {
                type_id: "vanilla".into(),
                version_id: "1.21".into(),
            },
            Payload::Builds(vec![partial_build(1, "vanilla", "1.21", 1)]),
        );
        app.open_build_at(0);

        let detail = |url: &str| Build {
            summary: partial_build(1, "vanilla", "1.21", 1),
            jar_url: Some(url.into()),
            zip_url: None,
            jar_location: None,
        };
        let build_key = CacheKey::Build { build_id: 1 };
        answer(&mut app, &build_key, Payload::Build(Box::new(detail("https://old/server.jar"))));

        app.revalidate();
        assert!(pending_keys(&app).contains(&build_key));
        answer(&mut app, &build_key, Payload::Build(Box::new(detail("https://new/server.jar"))));

        let shown = app
            .selection
            .open_build()
            .and_then(|open| open.detail.as_ref())
            .and_then(|build| build.jar_url.as_deref());
        assert_eq!(shown, Some("https://new/server.jar"));

        app.take_actions();
        app.request_download(ArtifactKind::Jar);
        match app.take_actions().as_slice() {
            [AppAction::Download { build, .. }] => {
                assert_eq!(build.jar_url.as_deref(), Some("https://new/server.jar"));
            }
            other => panic!("unexpected actions {:?}", other),
        }
    }

    #[test]
    fn test_restored_ids_wait_for_their_lists() {
        let mut app = make_test_app();
        app.selection.restore(Some("paper".into()), Some("1.21".into()));
        app.start();
        assert_eq!(pending_keys(&app), vec![CacheKey::Types, CacheKey::Stats]);

        answer(
            &mut app,
            &CacheKey::Types,
            Payload::Types(vec![server_type("vanilla"), server_type("paper")]),
        );
        assert_eq!(app.selection.type_id(), Some("paper"));
        assert!(!pending_keys(&app).iter().any(|key| matches!(key, CacheKey::Builds { .. })));

        answer(
            &mut app,
            &CacheKey::Versions {
                type_id: "paper".into(),
            },
            Payload::Versions(vec![version("1.21", Some(VersionKind::Release))]),
        );
        assert!(pending_keys(&app).contains(&CacheKey::Builds {
            type_id: "paper".into(),
            version_id: "1.21".into(),
        }));
    }

    #[test]
    fn test_type_switch_clears_before_new_versions_arrive() {
        let mut app = make_test_app();
        app.start();
        answer(
            &mut app,
            &CacheKey::Types,
            Payload::Types(vec![server_type("vanilla"), server_type("paper")]),
        );
        answer(
            &mut app,
            &CacheKey::Versions {
                type_id: "vanilla".into(),
            },
            vanilla_versions(),
        );
        assert_eq!(app.selection.version_id(), Some("1.21"));

        app.select_type_at(1);
        assert_eq!(app.selection.type_id(), Some("paper"));
        assert_eq!(app.selection.version_id(), None);
        assert!(app.versions().is_none());
        assert!(app.builds().is_none());
        // The old type's version list is gone from the cache.
        assert!(
            !app.cache
                .keys()
                .any(|k| matches!(k, CacheKey::Versions { type_id } if type_id == "vanilla"))
        );
    }

    #[test]
    fn test_stale_versions_response_is_ignored() {
        let mut app = make_test_app();
        app.start();
        answer(
            &mut app,
            &CacheKey::Types,
            Payload::Types(vec![server_type("vanilla"), server_type("paper")]),
        );
        let stale = app
            .take_actions()
            .into_iter()
            .find_map(|action| match action {
                AppAction::Fetch(ticket)
                    if matches!(&ticket.key, CacheKey::Versions { type_id } if type_id == "vanilla") =>
                {
                    Some(ticket)
                }
                _ => None,
            })
            .expect("versions fetch for vanilla");

        app.select_type_at(1);
        app.apply_fetch(stale, Ok(vanilla_versions()));
        assert_eq!(app.selection.type_id(), Some("paper"));
        assert_eq!(app.selection.version_id(), None);
    }

    #[test]
    fn test_failed_versions_fetch_leaves_no_selection() {
        let mut app = make_test_app();
        app.start();
        answer(
            &mut app,
            &CacheKey::Types,
            Payload::Types(vec![server_type("vanilla")]),
        );
        let ticket = app
            .take_actions()
            .into_iter()
            .find_map(|action| match action {
                AppAction::Fetch(ticket) if matches!(ticket.key, CacheKey::Versions { .. }) => {
                    Some(ticket)
                }
                _ => None,
            })
            .unwrap();
        app.apply_fetch(
            ticket,
            Err(CatalogError::Network {
                url: "http://catalog.test/versions/vanilla".into(),
                message: "reset".into(),
            }),
        );
        assert_eq!(app.selection.version_id(), None);
        assert!(app.versions().is_none());
        assert!(pending_keys(&app).is_empty());

        app.revalidate();
        assert!(pending_keys(&app).contains(&CacheKey::Versions {
            type_id: "vanilla".into()
        }));
    }

    #[test]
    fn test_download_requires_detail_with_url() {
        let mut app = make_test_app();
        app.request_download(ArtifactKind::Jar);
        assert!(app.pending_actions.is_empty());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_drop_queues_hash_command() {
        let mut app = make_test_app();
        let prevented = app.handle_drop(DropEvent::Drop(vec![DroppedFile::from_path("/tmp/a.jar")]));
        assert!(prevented);
        assert!(matches!(
            app.pending_actions.as_slice(),
            [AppAction::Fingerprint(FingerprintCommand::Hash { .. })]
        ));
        assert!(matches!(
            app.fingerprint.phase(),
            FingerprintPhase::Hashing { .. }
        ));
    }

    #[test]
    fn test_step_clamps() {
        assert_eq!(step(None, 3, 1), Some(0));
        assert_eq!(step(Some(2), 3, 1), Some(2));
        assert_eq!(step(Some(0), 3, -1), Some(0));
        assert_eq!(step(Some(1), 0, 1), None);
        assert_eq!(step(Some(1), 30, 10), Some(11));
        assert_eq!(step(Some(25), 30, i32::MAX), Some(29));
        assert_eq!(step(Some(25), 30, -i32::MAX), Some(0));
    }
}
