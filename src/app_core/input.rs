//! Runtime-agnostic input event types.
//!
//! The terminal runtime converts crossterm events into these types before
//! calling the shared reducer. Terminals deliver a file dragged onto the
//! window as a bracketed paste of its path; [`parse_dropped_paths`] turns that
//! text into the file list of a drop.

use crate::app_core::fingerprint::DroppedFile;

/// Runtime-agnostic key codes used by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKeyCode {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Enter,
    Esc,
    Home,
    End,
    PageUp,
    PageDown,
}

/// A runtime-agnostic keyboard event.
#[derive(Debug, Clone, Copy)]
pub struct AppKeyEvent {
    pub code: AppKeyCode,
    pub ctrl: bool,
    pub shift: bool,
    /// `true` when the key was released (ignored by the reducer).
    pub is_release: bool,
}

impl AppKeyEvent {
    pub fn new(code: AppKeyCode) -> Self {
        Self {
            code,
            ctrl: false,
            shift: false,
            is_release: false,
        }
    }

    pub fn ctrl(code: AppKeyCode) -> Self {
        Self {
            ctrl: true,
            ..Self::new(code)
        }
    }
}

/// The kind of a runtime-agnostic mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMouseKind {
    LeftDown,
    ScrollUp,
    ScrollDown,
}

/// A runtime-agnostic mouse event in terminal cell coordinates.
#[derive(Debug, Clone, Copy)]
pub struct AppMouseEvent {
    pub kind: AppMouseKind,
    pub column: u16,
    pub row: u16,
}

/// Splits pasted text into file paths.
///
/// Handles one path per line as well as several space-separated paths on a
/// line, single or double quotes, backslash-escaped spaces and `file://`
/// URIs. Blank input yields no files.
pub fn parse_dropped_paths(text: &str) -> Vec<DroppedFile> {
    let mut paths = Vec::new();
    for line in text.lines() {
        let mut current = String::new();
        let mut quote: Option<char> = None;
        let mut chars = line.trim().chars();

        while let Some(c) = chars.next() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), c) => current.push(c),
                (None, '\'' | '"') => quote = Some(c),
                (None, '\\') => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                (None, c) if c.is_whitespace() => {
                    if !current.is_empty() {
                        paths.push(std::mem::take(&mut current));
                    }
                }
                (None, c) => current.push(c),
            }
        }
        if !current.is_empty() {
            paths.push(current);
        }
    }

    paths
        .into_iter()
        .map(|path| match path.strip_prefix("file://") {
            Some(stripped) => stripped.to_string(),
            None => path,
        })
        .map(DroppedFile::from_path)
        .collect()
}
