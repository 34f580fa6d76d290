use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect, Size},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, LineGauge, List, ListItem, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use tui_scrollview::{ScrollView, ScrollbarVisibility};

use crate::app_core::fingerprint::FingerprintPhase;
use crate::app_core::progress::ProgressStage;
use crate::app_core::state::{AppState, FocusPane};
use crate::catalog::Fetch;
use crate::model::{Build, PartialBuild, ServerType, Version, VersionKind, VersionRef};
use crate::theme::{TagStyle, ThemeConfig};
use unicode_width::UnicodeWidthStr;

/// Main UI entry point that renders the entire application layout.
pub fn ui(f: &mut Frame, app: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Panes
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(18),
            Constraint::Percentage(20),
            Constraint::Percentage(24),
            Constraint::Percentage(38),
        ])
        .split(chunks[0]);

    app.types_area = Some(main_chunks[0]);
    app.versions_area = Some(main_chunks[1]);
    app.builds_area = Some(main_chunks[2]);
    app.details_area = Some(main_chunks[3]);

    render_types(f, app, main_chunks[0]);
    render_versions(f, app, main_chunks[1]);
    render_builds(f, app, main_chunks[2]);
    render_details(f, app, main_chunks[3]);
    render_status_bar(f, app, chunks[1]);

    if app.show_progress {
        render_progress_modal(f, app);
    } else if !app.fingerprint.is_idle() {
        render_fingerprint_modal(f, app);
    } else if app.show_help {
        render_help_overlay(f, app);
    }
}

/// Text shown in place of a list that has nothing to render.
fn placeholder<T: ?Sized>(fetch: &Fetch<'_, T>, not_applicable: &'static str) -> &'static str {
    match fetch {
        Fetch::NotApplicable => not_applicable,
        Fetch::Loading => "Loading…",
        Fetch::Failed(_) => "No data",
        Fetch::Ready(_) => "Nothing here",
    }
}

fn render_types(f: &mut Frame, app: &mut AppState, area: Rect) {
    let tags = app.theme.tag_style;
    let fetch = app.cache.types();
    let items: Vec<ListItem<'static>> = fetch
        .ready()
        .map(|types| types.iter().map(|t| type_item(t, &tags)).collect())
        .unwrap_or_default();
    let empty = placeholder(&fetch, "");
    let title = format!(" Types ({}) ", items.len());
    render_list_pane(f, app, area, FocusPane::Types, title, items, empty);
}

fn type_item(server_type: &ServerType, tags: &TagStyle) -> ListItem<'static> {
    let mut spans = vec![Span::raw(server_type.name.clone())];
    if server_type.experimental {
        spans.push(Span::styled(" exp", Style::default().fg(tags.experimental)));
    }
    if server_type.deprecated {
        spans.push(Span::styled(" dep", Style::default().fg(tags.deprecated)));
    }
    ListItem::new(Line::from(spans))
}

fn render_versions(f: &mut Frame, app: &mut AppState, area: Rect) {
    let tags = app.theme.tag_style;
    let fetch = app.cache.versions(app.selection.type_id());
    let items: Vec<ListItem<'static>> = fetch
        .ready()
        .map(|versions| {
            app.selection
                .visible_versions(versions)
                .into_iter()
                .map(|v| version_item(v, &tags))
                .collect()
        })
        .unwrap_or_default();
    let empty = placeholder(&fetch, "Select a type");
    let title = if app.selection.include_snapshots {
        format!(" Versions ({}) +snapshots ", items.len())
    } else {
        format!(" Versions ({}) ", items.len())
    };
    render_list_pane(f, app, area, FocusPane::Versions, title, items, empty);
}

fn version_item(version: &Version, tags: &TagStyle) -> ListItem<'static> {
    let mut spans = vec![Span::raw(version.id().to_string())];
    match version.kind {
        Some(VersionKind::Snapshot) => {
            spans.push(Span::styled(" snapshot", Style::default().fg(tags.snapshot)));
        }
        Some(VersionKind::Release) => {
            spans.push(Span::styled(" ●", Style::default().fg(tags.release)));
        }
        None => {}
    }
    if version.supported == Some(false) {
        spans.push(Span::styled(" eol", Style::default().fg(tags.deprecated)));
    }
    ListItem::new(Line::from(spans))
}

fn render_builds(f: &mut Frame, app: &mut AppState, area: Rect) {
    let tags = app.theme.tag_style;
    let open_id = app.selection.open_build().map(|open| open.id());
    let fetch = app
        .cache
        .builds(app.selection.type_id(), app.selection.version_id());
    let items: Vec<ListItem<'static>> = fetch
        .ready()
        .map(|builds| {
            builds
                .iter()
                .map(|b| build_item(b, Some(b.id) == open_id, &tags))
                .collect()
        })
        .unwrap_or_default();
    let empty = placeholder(&fetch, "Select a version");
    let title = format!(" Builds ({}) ", items.len());
    render_list_pane(f, app, area, FocusPane::Builds, title, items, empty);
}

fn build_item(build: &PartialBuild, is_open: bool, tags: &TagStyle) -> ListItem<'static> {
    let mut spans = vec![Span::raw(build_label(build))];
    if build.is_version_release() {
        spans.push(Span::styled(" release", Style::default().fg(tags.release)));
    }
    if let Some(created) = &build.created {
        spans.push(Span::styled(
            format!(" {}", created.get(..10).unwrap_or(created)),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    if is_open {
        spans.insert(0, Span::raw("▸ "));
    }
    ListItem::new(Line::from(spans))
}

pub fn build_label(build: &PartialBuild) -> String {
    match &build.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("#{}", build.build_number),
    }
}

/// Renders one of the three bordered list columns.
fn render_list_pane(
    f: &mut Frame,
    app: &mut AppState,
    area: Rect,
    pane: FocusPane,
    title: String,
    items: Vec<ListItem<'static>>,
    empty: &'static str,
) {
    let is_focused = app.focused_pane == pane;
    let hint = match pane {
        FocusPane::Builds => " Enter open ",
        _ => " ↑/↓ select ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if is_focused {
            app.theme.border_selected
        } else {
            app.theme.border
        })
        .title_style(app.theme.title)
        .title(title)
        .title_bottom(if is_focused {
            Line::from(hint).right_aligned()
        } else {
            Line::from("").right_aligned()
        })
        .title_alignment(Alignment::Left)
        .style(app.theme.list_normal);

    if items.is_empty() {
        let text = Paragraph::new(empty)
            .style(app.theme.text.add_modifier(Modifier::DIM))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(text, area);
        return;
    }

    let len = items.len();
    let list = List::new(items)
        .block(block)
        .style(app.theme.list_normal)
        .scroll_padding(2)
        .highlight_style(app.theme.list_selected);

    let state = match pane {
        FocusPane::Types => &mut app.types_list_state,
        FocusPane::Versions => &mut app.versions_list_state,
        _ => &mut app.builds_list_state,
    };
    f.render_stateful_widget(list, area, state);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
    let mut scrollbar_state = ScrollbarState::new(len).position(state.selected().unwrap_or(0));
    f.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

/// Renders the details pane: the open build, or the selected type and version.
fn render_details(f: &mut Frame, app: &mut AppState, area: Rect) {
    let is_focused = app.focused_pane == FocusPane::Details;
    let title = if app.selection.open_build().is_some() {
        " Build "
    } else {
        " Details "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if is_focused {
            app.theme.border_selected
        } else {
            app.theme.border
        })
        .style(app.theme.text)
        .title(title)
        .title_alignment(Alignment::Left)
        .title_style(app.theme.title)
        .title_bottom(if is_focused {
            Line::from(" ↑/↓ scroll • Esc close ").right_aligned()
        } else {
            Line::from("").right_aligned()
        });

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let horizontal_padding = 1;
    let content_width = inner_area.width.saturating_sub(horizontal_padding * 2);
    if content_width == 0 || inner_area.height == 0 {
        return;
    }

    let lines = details_lines(app);
    let content_height = wrapped_height(&lines, content_width);

    let mut scroll_view = ScrollView::new(Size::new(content_width, content_height))
        .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
        .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

    let scroll_area = scroll_view.area();
    scroll_view.buf_mut().set_style(scroll_area, app.theme.text);
    scroll_view.render_widget(
        Paragraph::new(Text::from(lines))
            .style(app.theme.text)
            .wrap(Wrap { trim: false }),
        Rect::new(0, 0, content_width, content_height),
    );

    let scroll_view_area = Rect::new(
        inner_area.x + horizontal_padding,
        inner_area.y,
        content_width,
        inner_area.height,
    );
    f.render_stateful_widget(scroll_view, scroll_view_area, &mut app.details_scroll_state);
}

/// Rows needed to show `lines` wrapped at `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

fn field(theme: &ThemeConfig, key: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{: <12}", key), theme.title),
        Span::raw(value.into()),
    ])
}

fn details_lines(app: &AppState) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let dim = theme.text.add_modifier(Modifier::DIM);

    if let Some(open) = app.selection.open_build() {
        let mut lines = summary_lines(theme, &open.summary);
        lines.push(Line::from(""));
        match (&open.detail, app.cache.build(Some(open.id()))) {
            (Some(detail), _) => lines.extend(artifact_lines(theme, detail)),
            (None, Fetch::Failed(_)) => lines.push(Line::styled("No data", dim)),
            (None, _) => lines.push(Line::styled("Loading…", dim)),
        }
        return lines;
    }

    let Some(server_type) = app.selected_type() else {
        return vec![Line::styled("Select a type", dim)];
    };
    let mut lines = vec![
        Line::styled(server_type.name.clone(), theme.title),
        Line::from(""),
        field(theme, "Identifier", server_type.identifier.clone()),
        field(theme, "Builds", server_type.builds.to_string()),
    ];
    if let Some(homepage) = &server_type.homepage {
        lines.push(field(theme, "Homepage", homepage.clone()));
    }
    if !server_type.categories.is_empty() {
        lines.push(field(theme, "Categories", server_type.categories.join(", ")));
    }
    if !server_type.compatibility.is_empty() {
        lines.push(field(
            theme,
            "Compatible",
            server_type.compatibility.join(", "),
        ));
    }
    if let Some(description) = &server_type.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.clone()));
    }

    let version = app.selection.version_id().and_then(|id| {
        app.versions()
            .and_then(|versions| versions.iter().find(|v| v.id() == id))
    });
    if let Some(version) = version {
        lines.push(Line::from(""));
        lines.push(Line::styled(format!("Version {}", version.id()), theme.title));
        lines.push(field(theme, "Builds", version.builds.to_string()));
        if let Some(java) = version.java {
            lines.push(field(theme, "Java", java.to_string()));
        }
        if let Some(supported) = version.supported {
            lines.push(field(theme, "Supported", if supported { "yes" } else { "no" }));
        }
        if let Some(created) = &version.created {
            lines.push(field(theme, "Created", created.clone()));
        }
    }
    lines
}

fn summary_lines(theme: &ThemeConfig, build: &PartialBuild) -> Vec<Line<'static>> {
    let version = match &build.version {
        VersionRef::Game(id) => id.clone(),
        VersionRef::Project(id) => format!("{} (project)", id),
    };
    let mut lines = vec![
        Line::styled(build_label(build), theme.title),
        Line::from(""),
        field(theme, "Id", build.id.to_string()),
        field(theme, "Type", build.type_id.clone()),
        field(theme, "Version", version),
        field(theme, "Build", build.build_number.to_string()),
    ];
    if let Some(created) = &build.created {
        lines.push(field(theme, "Created", created.clone()));
    }
    if let Some(size) = build.jar_size {
        lines.push(field(theme, "Jar size", format_size(size)));
    }
    if let Some(size) = build.zip_size {
        lines.push(field(theme, "Zip size", format_size(size)));
    }
    lines
}

fn artifact_lines(theme: &ThemeConfig, build: &Build) -> Vec<Line<'static>> {
    if !build.has_artifact() {
        return vec![Line::styled(
            "No downloadable artifact",
            theme.text.add_modifier(Modifier::DIM),
        )];
    }
    let mut lines = Vec::new();
    if let Some(url) = &build.jar_url {
        lines.push(field(theme, "Jar", url.clone()));
        lines.push(field(theme, "Save as", build.jar_location().to_string()));
    }
    if let Some(url) = &build.zip_url {
        lines.push(field(theme, "Zip", url.clone()));
    }
    lines.push(Line::from(""));
    let mut keys = Vec::new();
    if build.jar_url.is_some() {
        keys.push(Span::styled("d ", theme.title));
        keys.push(Span::raw("download jar  "));
    }
    if build.zip_url.is_some() {
        keys.push(Span::styled("z ", theme.title));
        keys.push(Span::raw("download zip"));
    }
    lines.push(Line::from(keys));
    lines
}

/// Human-readable byte count using binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Renders the multisection status bar at the bottom.
fn render_status_bar(f: &mut Frame, app: &mut AppState, area: Rect) {
    let area = Rect::new(
        area.x + 1,
        area.y,
        area.width.saturating_sub(2),
        area.height,
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(35),
        ])
        .split(area);

    render_status_bar_shortcuts(f, app, chunks[0]);
    render_status_bar_stats(f, app, chunks[1]);
    render_status_bar_message(f, app, chunks[2]);
}

fn render_status_bar_shortcuts(f: &mut Frame, app: &mut AppState, area: Rect) {
    let key_style = app.theme.title;
    let bar_style = app.theme.text.add_modifier(Modifier::DIM);

    let shortcuts = Line::from(vec![
        Span::styled("s ", key_style),
        Span::raw("snapshots  "),
        Span::styled("Ctrl+R ", key_style),
        Span::raw("refresh  "),
        Span::styled("? ", key_style),
        Span::raw("help  "),
        Span::styled("q ", key_style),
        Span::raw("quit"),
    ]);

    f.render_widget(
        Paragraph::new(shortcuts)
            .style(bar_style)
            .alignment(Alignment::Left),
        area,
    );
}

fn render_status_bar_stats(f: &mut Frame, app: &mut AppState, area: Rect) {
    let bar_style = app.theme.text.add_modifier(Modifier::DIM);
    let text = match app.cache.stats() {
        Fetch::Ready(stats) => format!("Builds: {} • Hashes: {}", stats.builds, stats.hashes),
        Fetch::Loading => "Stats: …".to_string(),
        _ => String::new(),
    };

    f.render_widget(
        Paragraph::new(Line::from(text))
            .style(bar_style)
            .alignment(Alignment::Center),
        area,
    );
}

fn render_status_bar_message(f: &mut Frame, app: &mut AppState, area: Rect) {
    let bar_style = app.theme.text.add_modifier(Modifier::DIM);
    let text = match &app.status_message {
        Some(message) => message.clone(),
        None => format!("{} {}", app.api_url, app.app_version),
    };

    f.render_widget(
        Paragraph::new(Line::from(text))
            .style(bar_style)
            .alignment(Alignment::Right),
        area,
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

/// Renders the identification result for a dropped file.
fn render_fingerprint_modal(f: &mut Frame, app: &mut AppState) {
    let theme = &app.theme;
    let dim = theme.text.add_modifier(Modifier::DIM);

    let (title, mut lines) = match app.fingerprint.phase() {
        FingerprintPhase::Idle => return,
        FingerprintPhase::Dragging => (
            " Identify ",
            vec![Line::from("Drop a server jar to identify it")],
        ),
        FingerprintPhase::Hashing { file, .. } => (
            " Identify ",
            vec![
                Line::from(file.name.clone()),
                Line::from(""),
                Line::styled("Identifying…", dim),
            ],
        ),
        FingerprintPhase::Resolved { file, hash, build } => {
            let mut lines = vec![Line::from(file.name.clone()), Line::styled(hash.clone(), dim)];
            lines.push(Line::from(""));
            lines.extend(summary_lines(theme, &build.summary));
            (" Match ", lines)
        }
        FingerprintPhase::NotFound { file, .. } | FingerprintPhase::Errored { file } => (
            " Identify ",
            vec![
                Line::from(file.name.clone()),
                Line::from(""),
                Line::styled("No matching build", dim),
            ],
        ),
    };
    lines.push(Line::from(""));
    lines.push(Line::styled("Esc close", dim));

    let area = f.area();
    let popup_width = area.width.min(72).saturating_sub(4);
    let popup_height = (lines.len() as u16 + 4).min(area.height.saturating_sub(2));
    if popup_width == 0 || popup_height == 0 {
        return;
    }
    let popup_rect = centered_rect(area, popup_width, popup_height);

    f.render_widget(Clear, popup_rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_selected)
        .style(theme.text)
        .title(title)
        .title_style(theme.title);

    let inner_area = block.inner(popup_rect);
    f.render_widget(block, popup_rect);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        inner_area.inner(Margin::new(1, 1)),
    );
}

fn render_help_overlay(f: &mut Frame, app: &mut AppState) {
    let area = f.area();
    let popup_width = area.width.min(64).saturating_sub(4);
    let popup_height = 26.min(area.height.saturating_sub(2));
    if popup_width == 0 || popup_height == 0 {
        return;
    }
    let popup_rect = centered_rect(area, popup_width, popup_height);

    f.render_widget(Clear, popup_rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_selected)
        .style(app.theme.text)
        .title(" Help ")
        .border_type(ratatui::widgets::BorderType::Double)
        .title_style(app.theme.title);

    let inner_area = block.inner(popup_rect);
    f.render_widget(block, popup_rect);

    let key_style = app.theme.title;
    let desc_style = app.theme.text;
    let header_style = key_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let format_section = |title: &str, items: Vec<(&str, &str)>| -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(title.to_string(), header_style))];
        for (key, desc) in items {
            lines.push(Line::from(vec![
                Span::styled(format!("{: <16}", key), key_style),
                Span::styled(desc.to_string(), desc_style),
            ]));
        }
        lines
    };

    let mut lines = format_section(
        "Navigation",
        vec![
            ("Tab | Shift+Tab", "cycle panes"),
            ("↑/↓ | j/k", "select type or version, move build cursor"),
            ("Enter", "open build"),
            ("Esc", "close build"),
            ("Mouse Click", "select entry"),
            ("q", "quit"),
        ],
    );
    lines.push(Line::from(""));
    lines.extend(format_section(
        "Catalog",
        vec![
            ("s", "show or hide snapshots"),
            ("Ctrl+R", "refresh everything in view"),
            ("d", "download jar of the open build"),
            ("z", "download zip of the open build"),
        ],
    ));
    lines.push(Line::from(""));
    lines.extend(format_section(
        "Identify",
        vec![
            ("Drop a file", "drag a jar onto the terminal"),
            ("Paste a path", "same as dropping the file"),
        ],
    ));

    f.render_widget(Paragraph::new(lines), inner_area.inner(Margin::new(1, 1)));
}

fn render_progress_modal(f: &mut Frame, app: &mut AppState) {
    let area = f.area();
    let stages_len = app.progress_stages.len().max(1) as u16;
    let popup_width = area.width.min(68).saturating_sub(4);
    let popup_height = area.height.saturating_sub(2).min(stages_len + 4);
    if popup_width == 0 || popup_height == 0 {
        return;
    }
    let popup_rect = centered_rect(area, popup_width, popup_height);

    f.render_widget(Clear, popup_rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_selected)
        .style(app.theme.text)
        .title(format!(" {} ", app.progress_title))
        .title_style(app.theme.title);

    let inner_area = block.inner(popup_rect);
    f.render_widget(block, popup_rect);

    let content_area = inner_area.inner(Margin::new(1, 1));
    if content_area.width == 0 || content_area.height == 0 {
        return;
    }

    let min_gauge_width = 10u16;
    let percent_width = 4u16;
    let mut label_width = app
        .progress_stages
        .iter()
        .map(|stage| stage.label.width())
        .max()
        .unwrap_or(0) as u16;
    if content_area.width <= min_gauge_width {
        label_width = 0;
    } else {
        label_width = label_width.min(
            content_area
                .width
                .saturating_sub(min_gauge_width + percent_width + 2),
        );
    }
    let gap = if label_width > 0 { 1 } else { 0 };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); stages_len as usize])
        .split(content_area);

    for (idx, row) in rows.iter().enumerate() {
        let stage = app
            .progress_stages
            .get(idx)
            .cloned()
            .unwrap_or_else(|| ProgressStage {
                label: "Working".to_string(),
                ratio: 0.0,
                done: false,
            });
        let ratio = stage.ratio.clamp(0.0, 1.0);
        let row_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(label_width),
                Constraint::Length(gap),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(percent_width),
            ])
            .split(*row);

        if label_width > 0 {
            f.render_widget(
                Paragraph::new(stage.label).style(app.theme.text),
                row_chunks[0],
            );
        }

        let gauge = LineGauge::default()
            .filled_style(app.theme.title)
            .unfilled_style(app.theme.border)
            .ratio(ratio)
            .label("");
        f.render_widget(gauge, row_chunks[2]);

        f.render_widget(
            Paragraph::new(format!("{:.0}%", ratio * 100.0))
                .style(app.theme.text)
                .alignment(Alignment::Right),
            row_chunks[4],
        );
    }
}
