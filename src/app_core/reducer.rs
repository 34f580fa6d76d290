//! Shared event reducer: handlers for key and mouse events.
//!
//! The terminal runtime calls these functions after converting crossterm
//! events to [`AppKeyEvent`] / [`AppMouseEvent`]. Work that needs I/O is left
//! in `app.pending_actions` for the runtime to execute.

use crate::app_core::fingerprint::DropEvent;
use crate::app_core::input::{AppKeyCode, AppKeyEvent, AppMouseEvent, AppMouseKind};
use crate::app_core::state::{AppState, ArtifactKind, FocusPane};
use ratatui::layout::{Margin, Rect};

pub const SCROLL_LINES: u16 = 1;

/// Returns the pane that contains the given cell coordinates, if any.
pub fn pane_at(app: &AppState, column: u16, row: u16) -> Option<FocusPane> {
    [
        (app.types_area, FocusPane::Types),
        (app.versions_area, FocusPane::Versions),
        (app.builds_area, FocusPane::Builds),
        (app.details_area, FocusPane::Details),
    ]
    .into_iter()
    .find_map(|(area, pane)| {
        area.filter(|area| area.contains((column, row).into()))
            .map(|_| pane)
    })
}

fn pane_area(app: &AppState, pane: FocusPane) -> Option<Rect> {
    match pane {
        FocusPane::Types => app.types_area,
        FocusPane::Versions => app.versions_area,
        FocusPane::Builds => app.builds_area,
        FocusPane::Details => app.details_area,
    }
}

/// Number of list rows visible in a bordered pane.
fn page_size(app: &AppState, pane: FocusPane) -> i32 {
    pane_area(app, pane)
        .map(|area| area.height.saturating_sub(2).max(1))
        .unwrap_or(10) as i32
}

/// Handle a runtime-agnostic key event, mutating `app` in place.
///
/// May queue `app.pending_actions`; the runtime is responsible for acting on
/// them after this function returns.
pub fn handle_key_event(app: &mut AppState, event: AppKeyEvent) {
    if event.is_release {
        return;
    }

    let code = event.code;
    let ctrl = event.ctrl;

    if ctrl && code == AppKeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if !app.fingerprint.is_idle() {
        match code {
            AppKeyCode::Esc | AppKeyCode::Enter => {
                app.handle_drop(DropEvent::Dismiss);
            }
            AppKeyCode::Char('q') => app.should_quit = true,
            _ => {}
        }
        return;
    }

    if app.show_help {
        if matches!(code, AppKeyCode::Char('?') | AppKeyCode::Esc) {
            app.show_help = false;
        }
        return;
    }

    if ctrl && code == AppKeyCode::Char('r') {
        app.revalidate();
        return;
    }

    match code {
        AppKeyCode::Tab | AppKeyCode::Right if !event.shift => app.focus_next_pane(),
        AppKeyCode::Tab | AppKeyCode::BackTab | AppKeyCode::Left => app.focus_prev_pane(),
        AppKeyCode::Char('q') => app.should_quit = true,
        AppKeyCode::Char('?') => app.show_help = true,
        AppKeyCode::Char('s') => app.toggle_snapshots(),
        AppKeyCode::Char('d') => app.request_download(ArtifactKind::Jar),
        AppKeyCode::Char('z') => app.request_download(ArtifactKind::Zip),
        AppKeyCode::Char('k') | AppKeyCode::Up => app.move_selection(-1),
        AppKeyCode::Char('j') | AppKeyCode::Down => app.move_selection(1),
        AppKeyCode::Enter => match app.focused_pane {
            FocusPane::Types | FocusPane::Versions => app.focus_next_pane(),
            FocusPane::Builds => {
                app.open_selected_build();
                if app.selection.open_build().is_some() {
                    app.focus_pane(FocusPane::Details);
                }
            }
            FocusPane::Details => {}
        },
        AppKeyCode::Esc => {
            if app.selection.open_build().is_some() {
                app.close_build();
                if app.focused_pane == FocusPane::Details {
                    app.focus_pane(FocusPane::Builds);
                }
            } else {
                app.status_message = None;
            }
        }
        AppKeyCode::Home => {
            if app.focused_pane == FocusPane::Details {
                app.details_scroll_state = tui_scrollview::ScrollViewState::default();
            } else {
                app.move_selection(-i32::MAX);
            }
        }
        AppKeyCode::End => {
            if app.focused_pane == FocusPane::Details {
                app.details_scroll_state.scroll_to_bottom();
            } else {
                app.move_selection(i32::MAX);
            }
        }
        AppKeyCode::PageUp => {
            if app.focused_pane == FocusPane::Details {
                app.details_scroll_state.scroll_page_up();
            } else {
                app.move_selection(-page_size(app, app.focused_pane));
            }
        }
        AppKeyCode::PageDown => {
            if app.focused_pane == FocusPane::Details {
                app.details_scroll_state.scroll_page_down();
            } else {
                app.move_selection(page_size(app, app.focused_pane));
            }
        }
        _ => {}
    }
}

/// Handle a runtime-agnostic mouse event.
///
/// `event.column` and `event.row` must already be in terminal cell coordinates.
/// Returns `true` if the UI needs to be redrawn.
pub fn handle_mouse_event(app: &mut AppState, event: AppMouseEvent) -> bool {
    if !app.fingerprint.is_idle() || app.show_help || app.show_progress {
        return false;
    }

    let Some(pane) = pane_at(app, event.column, event.row) else {
        return false;
    };

    match event.kind {
        AppMouseKind::ScrollUp | AppMouseKind::ScrollDown => {
            let direction = if event.kind == AppMouseKind::ScrollDown {
                SCROLL_LINES as i32
            } else {
                -(SCROLL_LINES as i32)
            };
            let previous_focus = app.focused_pane;
            app.focus_pane(pane);
            app.move_selection(direction);
            app.focus_pane(previous_focus);
            true
        }
        AppMouseKind::LeftDown => {
            app.focus_pane(pane);
            if let Some(index) = clicked_row(app, pane, event.row) {
                match pane {
                    FocusPane::Types => app.select_type_at(index),
                    FocusPane::Versions => app.select_version_at(index),
                    FocusPane::Builds => app.open_build_at(index),
                    FocusPane::Details => {}
                }
            }
            true
        }
    }
}

/// Maps a click row to an entry index of the list shown in `pane`.
fn clicked_row(app: &AppState, pane: FocusPane, row: u16) -> Option<usize> {
    let (offset, len) = match pane {
        FocusPane::Types => (
            app.types_list_state.offset(),
            app.types().map_or(0, <[_]>::len),
        ),
        FocusPane::Versions => (
            app.versions_list_state.offset(),
            app.visible_versions().len(),
        ),
        FocusPane::Builds => (
            app.builds_list_state.offset(),
            app.builds().map_or(0, <[_]>::len),
        ),
        FocusPane::Details => return None,
    };
    let content = pane_area(app, pane)?.inner(Margin::new(1, 1));
    if row < content.y || row >= content.y + content.height {
        return None;
    }
    let index = offset + (row - content.y) as usize;
    (index < len).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_core::fingerprint::{DroppedFile, FingerprintPhase};
    use crate::app_core::selection::tests::{partial_build, server_type, version};
    use crate::app_core::state::AppAction;
    use crate::app_core::state::tests::{answer, make_test_app};
    use crate::catalog::{CacheKey, Payload};
    use crate::model::VersionKind;

    fn make_key(code: AppKeyCode) -> AppKeyEvent {
        AppKeyEvent::new(code)
    }

    fn make_mouse(kind: AppMouseKind, column: u16, row: u16) -> AppMouseEvent {
        AppMouseEvent { kind, column, row }
    }

    /// App with two types, two versions of the first and three builds loaded.
    fn loaded_app() -> AppState {
        let mut app = make_test_app();
        app.start();
        answer(
            &mut app,
            &CacheKey::Types,
            Payload::Types(vec![server_type("PAPER"), server_type("VANILLA")]),
        );
        answer(
            &mut app,
            &CacheKey::Versions {
                type_id: "PAPER".to_string(),
            },
            Payload::Versions(vec![
                version("1.21", Some(VersionKind::Release)),
                version("1.20.6", Some(VersionKind::Release)),
            ]),
        );
        answer(
            &mut app,
            &CacheKey::Builds {
                type_id: "PAPER".to_string(),
                version_id: "1.21".to_string(),
            },
            Payload::Builds(vec![
                partial_build(3, "PAPER", "1.21", 130),
                partial_build(2, "PAPER", "1.21", 129),
                partial_build(1, "PAPER", "1.21", 128),
            ]),
        );
        app.types_area = Some(Rect::new(0, 0, 20, 10));
        app.versions_area = Some(Rect::new(20, 0, 20, 10));
        app.builds_area = Some(Rect::new(40, 0, 20, 10));
        app.details_area = Some(Rect::new(60, 0, 40, 10));
        app
    }

    #[test]
    fn test_tab_cycles_panes() {
        let mut app = make_test_app();
        assert_eq!(app.focused_pane, FocusPane::Types);

        handle_key_event(&mut app, make_key(AppKeyCode::Tab));
        assert_eq!(app.focused_pane, FocusPane::Versions);

        handle_key_event(&mut app, make_key(AppKeyCode::Tab));
        handle_key_event(&mut app, make_key(AppKeyCode::Tab));
        assert_eq!(app.focused_pane, FocusPane::Details);

        handle_key_event(&mut app, make_key(AppKeyCode::Tab));
        assert_eq!(app.focused_pane, FocusPane::Types);

        handle_key_event(&mut app, make_key(AppKeyCode::BackTab));
        assert_eq!(app.focused_pane, FocusPane::Details);
    }

    #[test]
    fn test_arrow_keys_select_type() {
        let mut app = loaded_app();
        assert_eq!(app.selection.type_id(), Some("PAPER"));

        handle_key_event(&mut app, make_key(AppKeyCode::Down));
        assert_eq!(app.selection.type_id(), Some("VANILLA"));
        assert_eq!(app.selection.version_id(), None);

        handle_key_event(&mut app, make_key(AppKeyCode::Down));
        assert_eq!(app.selection.type_id(), Some("VANILLA"));

        handle_key_event(&mut app, make_key(AppKeyCode::Home));
        assert_eq!(app.selection.type_id(), Some("PAPER"));
    }

    #[test]
    fn test_enter_opens_build_and_esc_closes_it() {
        let mut app = loaded_app();
        app.focus_pane(FocusPane::Builds);

        assert_eq!(app.builds_list_state.selected(), Some(0));
        handle_key_event(&mut app, make_key(AppKeyCode::Down));
        assert_eq!(app.builds_list_state.selected(), Some(1));
        assert!(app.selection.open_build().is_none());

        handle_key_event(&mut app, make_key(AppKeyCode::Enter));
        assert_eq!(app.selection.open_build().map(|b| b.id()), Some(2));
        assert_eq!(app.focused_pane, FocusPane::Details);

        handle_key_event(&mut app, make_key(AppKeyCode::Esc));
        assert!(app.selection.open_build().is_none());
        assert_eq!(app.focused_pane, FocusPane::Builds);
    }

    #[test]
    fn test_ctrl_r_revalidates_current_view() {
        let mut app = loaded_app();
        app.take_actions();

        handle_key_event(&mut app, AppKeyEvent::ctrl(AppKeyCode::Char('r')));

        let keys: Vec<CacheKey> = app
            .take_actions()
            .into_iter()
            .filter_map(|action| match action {
                AppAction::Fetch(ticket) => Some(ticket.key),
                _ => None,
            })
            .collect();
        assert!(keys.contains(&CacheKey::Types));
        assert!(keys.contains(&CacheKey::Builds {
            type_id: "PAPER".to_string(),
            version_id: "1.21".to_string(),
        }));
        assert_eq!(app.selection.version_id(), Some("1.21"));
    }

    #[test]
    fn test_help_swallows_keys_until_closed() {
        let mut app = make_test_app();
        handle_key_event(&mut app, make_key(AppKeyCode::Char('?')));
        assert!(app.show_help);

        handle_key_event(&mut app, make_key(AppKeyCode::Char('q')));
        assert!(!app.should_quit);

        handle_key_event(&mut app, make_key(AppKeyCode::Esc));
        assert!(!app.show_help);

        handle_key_event(&mut app, make_key(AppKeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_esc_dismisses_identification() {
        let mut app = make_test_app();
        app.handle_drop(DropEvent::Drop(vec![DroppedFile::from_path("/tmp/x.jar")]));
        assert!(!app.fingerprint.is_idle());

        handle_key_event(&mut app, make_key(AppKeyCode::Char('s')));
        assert!(!app.selection.include_snapshots);

        handle_key_event(&mut app, make_key(AppKeyCode::Esc));
        assert!(matches!(app.fingerprint.phase(), FingerprintPhase::Idle));
    }

    #[test]
    fn test_handle_key_event_ignores_release() {
        let mut app = make_test_app();
        let release_event = AppKeyEvent {
            is_release: true,
            ..make_key(AppKeyCode::Char('q'))
        };
        handle_key_event(&mut app, release_event);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_mouse_click_version_selects_it() {
        let mut app = loaded_app();

        let redraw = handle_mouse_event(&mut app, make_mouse(AppMouseKind::LeftDown, 25, 2));

        assert!(redraw);
        assert_eq!(app.focused_pane, FocusPane::Versions);
        assert_eq!(app.selection.version_id(), Some("1.20.6"));
    }

    #[test]
    fn test_mouse_click_below_list_only_focuses() {
        let mut app = loaded_app();

        handle_mouse_event(&mut app, make_mouse(AppMouseKind::LeftDown, 45, 8));

        assert_eq!(app.focused_pane, FocusPane::Builds);
        assert!(app.selection.open_build().is_none());
    }

    #[test]
    fn test_mouse_scroll_moves_hovered_list_without_focus() {
        let mut app = loaded_app();
        app.focus_pane(FocusPane::Details);

        let redraw = handle_mouse_event(&mut app, make_mouse(AppMouseKind::ScrollDown, 45, 3));

        assert!(redraw);
        assert_eq!(app.focused_pane, FocusPane::Details);
        assert_eq!(app.builds_list_state.selected(), Some(1));
    }

    #[test]
    fn test_mouse_outside_panes_is_ignored() {
        let mut app = loaded_app();
        assert!(!handle_mouse_event(
            &mut app,
            make_mouse(AppMouseKind::LeftDown, 150, 40)
        ));
    }
}
