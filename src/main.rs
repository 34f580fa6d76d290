//! # jarscope
//!
//! A terminal user interface (TUI) for browsing a server-jar catalog and
//! identifying jars by their content fingerprint.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use jarscope::app_core::fingerprint::{DropEvent, DroppedFile, FingerprintFlow, FingerprintPhase};
use jarscope::app_core::input::{
    AppKeyCode, AppKeyEvent, AppMouseEvent, AppMouseKind, parse_dropped_paths,
};
use jarscope::app_core::progress::DownloadProgress;
use jarscope::app_core::reducer;
use jarscope::app_core::selection::Selection;
use jarscope::app_core::state::{AppAction, AppState, ArtifactKind};
use jarscope::catalog::CatalogSource;
use jarscope::model::Build;
use jarscope::runtime::native::data::{self, CatalogClient};
use jarscope::runtime::native::worker::{self, Completion, Worker};
use jarscope::{theme, ui};
use ratatui::{Terminal, backend::CrosstermBackend};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const LOG_FILE: &str = "jarscope.log";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "jarscope: a terminal user interface for browsing server-jar catalogs.\n\
                  Drop (or paste the path of) a jar onto the terminal to identify its build."
)]
struct Args {
    /// Catalog service base address
    #[arg(long, env = "JARSCOPE_API_URL", default_value = data::DEFAULT_API_URL)]
    api_url: String,

    /// Type to select on start (e.g. PAPER)
    #[arg(long = "type")]
    type_id: Option<String>,

    /// Version to select on start (e.g. 1.21)
    #[arg(long)]
    version_id: Option<String>,

    /// Show snapshot versions
    #[arg(long)]
    snapshots: bool,

    /// UI theme (dracula, solarized, gruvbox, everforest_light)
    #[arg(short, long)]
    theme: Option<String>,

    /// Directory downloaded artifacts are saved to
    #[arg(short, long, default_value = ".")]
    download_dir: PathBuf,

    /// Print the available types and exit
    #[arg(long)]
    list_types: bool,

    /// Identify a jar by its fingerprint and exit
    #[arg(long, value_name = "FILE")]
    identify: Option<PathBuf>,

    /// Show all paths used by the application
    #[arg(long)]
    config: bool,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Sends log records to a file; the terminal belongs to the UI.
fn init_logging(log_path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Crossterm → shared-reducer adapters
// ---------------------------------------------------------------------------

fn crossterm_to_app_key_event(
    code: KeyCode,
    modifiers: KeyModifiers,
    kind: KeyEventKind,
) -> Option<AppKeyEvent> {
    if matches!(kind, KeyEventKind::Release) {
        return None;
    }

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let shift = modifiers.contains(KeyModifiers::SHIFT);
    let super_key = modifiers.contains(KeyModifiers::SUPER);

    let key_code = match code {
        KeyCode::Char(c) => AppKeyCode::Char(c),
        KeyCode::Enter => AppKeyCode::Enter,
        KeyCode::Esc => AppKeyCode::Esc,
        KeyCode::Up => AppKeyCode::Up,
        KeyCode::Down => AppKeyCode::Down,
        KeyCode::Left => AppKeyCode::Left,
        KeyCode::Right => AppKeyCode::Right,
        KeyCode::Home => AppKeyCode::Home,
        KeyCode::End => AppKeyCode::End,
        KeyCode::PageUp => AppKeyCode::PageUp,
        KeyCode::PageDown => AppKeyCode::PageDown,
        KeyCode::Tab => AppKeyCode::Tab,
        KeyCode::BackTab => AppKeyCode::BackTab,
        _ => return None,
    };

    Some(AppKeyEvent {
        code: key_code,
        ctrl: ctrl || super_key,
        shift,
        is_release: false,
    })
}

fn crossterm_to_app_mouse_event(mouse: &event::MouseEvent) -> Option<AppMouseEvent> {
    let kind = match mouse.kind {
        MouseEventKind::Down(event::MouseButton::Left) => AppMouseKind::LeftDown,
        MouseEventKind::ScrollUp => AppMouseKind::ScrollUp,
        MouseEventKind::ScrollDown => AppMouseKind::ScrollDown,
        _ => return None,
    };
    Some(AppMouseEvent {
        kind,
        column: mouse.column,
        row: mouse.row,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    let app_version = format!("v{}", env!("CARGO_PKG_VERSION"));

    let theme_name = args.theme.as_deref().unwrap_or("dracula");
    let theme_enum = theme::Theme::from_str(theme_name).map_err(anyhow::Error::msg)?;
    let theme = theme_enum.config();

    let data_dir = data::get_data_dir()?;
    let log_path = data_dir.join(LOG_FILE);

    if args.config {
        println!("App Paths:");
        println!("  Data:      {}", data_dir.display());
        println!("  Log:       {}", log_path.display());
        println!("  Downloads: {}", args.download_dir.display());
        println!("  Catalog:   {}", args.api_url);
        return Ok(());
    }

    init_logging(&log_path)?;
    log::info!("jarscope {} starting against {}", app_version, args.api_url);

    let client = CatalogClient::new(&args.api_url)?;

    if args.list_types {
        return list_types(&client);
    }

    if let Some(path) = &args.identify {
        return identify(&client, path);
    }

    let mut selection = Selection::new(args.snapshots);
    selection.restore(args.type_id.clone(), args.version_id.clone());

    let http = data::http_client()?;
    let worker = Worker::new(Arc::new(client));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = AppState::new(
        theme,
        app_version,
        args.api_url.clone(),
        args.download_dir.clone(),
        selection,
    );

    let res = run_app(&mut terminal, &mut app, &worker, &http);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        log::error!("exiting with error: {:#}", err);
    }
    res
}

fn list_types(client: &CatalogClient) -> Result<()> {
    let types = client
        .types()
        .with_context(|| format!("Failed to load types from {}", client.base_url()))?;
    for server_type in types {
        let mut flags = Vec::new();
        if server_type.experimental {
            flags.push("experimental");
        }
        if server_type.deprecated {
            flags.push("deprecated");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!(
            "{: <14} {} ({} builds){}",
            server_type.identifier, server_type.name, server_type.builds, flags
        );
    }
    Ok(())
}

/// Runs the identification flow to completion without a terminal UI.
fn identify(source: &dyn CatalogSource, path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let mut flow = FingerprintFlow::new();
    let mut next = flow
        .handle(DropEvent::Drop(vec![DroppedFile::from_path(path)]))
        .command;
    while let Some(command) = next {
        let event = worker::execute_fingerprint(source, command);
        next = flow.complete(event);
    }

    match flow.phase() {
        FingerprintPhase::Resolved { hash, build, .. } => {
            println!("{}", hash);
            print_build(build);
        }
        FingerprintPhase::NotFound { hash, .. } => {
            println!("{}", hash);
            println!("no matching build");
        }
        _ => println!("no matching build"),
    }
    Ok(())
}

fn print_build(build: &Build) {
    let summary = &build.summary;
    println!("type:     {}", summary.type_id);
    println!("version:  {}", summary.version.id());
    println!("build:    {} (id {})", ui::build_label(summary), summary.id);
    if let Some(created) = &summary.created {
        println!("created:  {}", created);
    }
    if let Some(url) = &build.jar_url {
        println!("jar:      {}", url);
    }
    if let Some(url) = &build.zip_url {
        println!("zip:      {}", url);
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    worker: &Worker,
    http: &reqwest::blocking::Client,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    app.start();
    execute_actions(terminal, app, worker, http)?;
    terminal.draw(|f| ui::ui(f, app))?;

    loop {
        if app.should_quit {
            break;
        }

        let mut dirty = false;
        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(event) = crossterm_to_app_key_event(key.code, key.modifiers, key.kind)
                    {
                        reducer::handle_key_event(app, event);
                        dirty = true;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(event) = crossterm_to_app_mouse_event(&mouse) {
                        dirty |= reducer::handle_mouse_event(app, event);
                    }
                }
                Event::Paste(text) => {
                    let files = data::existing_files(parse_dropped_paths(&text));
                    log::debug!("paste parsed as a drop of {} file(s)", files.len());
                    app.handle_drop(DropEvent::Drop(files));
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        while let Some(completion) = worker.try_recv() {
            match completion {
                Completion::Catalog { ticket, result } => app.apply_fetch(ticket, result),
                Completion::Fingerprint(event) => app.apply_fingerprint(event),
            }
            dirty = true;
        }

        if !app.pending_actions.is_empty() {
            execute_actions(terminal, app, worker, http)?;
            dirty = true;
        }

        if dirty {
            terminal.draw(|f| ui::ui(f, app))?;
        }
    }
    Ok(())
}

fn execute_actions<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    worker: &Worker,
    http: &reqwest::blocking::Client,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    for action in app.take_actions() {
        match action {
            AppAction::Fetch(ticket) => {
                log::debug!("fetching {:?}", ticket.key);
                worker.dispatch_fetch(ticket);
            }
            AppAction::Fingerprint(command) => worker.dispatch_fingerprint(command),
            AppAction::Download { build, kind } => {
                download_with_ui(terminal, app, http, &build, kind)?;
            }
        }
    }
    Ok(())
}

/// Downloads an artifact while drawing the progress modal.
///
/// Download failures end up in the status bar; only drawing errors propagate.
fn download_with_ui<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    http: &reqwest::blocking::Client,
    build: &Build,
    kind: ArtifactKind,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let stage = match kind {
        ArtifactKind::Jar => "Downloading jar",
        ArtifactKind::Zip => "Downloading zip",
    };
    app.start_progress(format!("Build {}", ui::build_label(&build.summary)), &[stage]);
    terminal.draw(|f| ui::ui(f, app))?;

    let download_dir = app.download_dir.clone();
    let mut last_ratio = -1.0;
    let mut last_draw = Instant::now();
    let mut draw_error: Option<anyhow::Error> = None;
    let result = data::download_artifact(
        http,
        build,
        kind,
        &download_dir,
        |progress: DownloadProgress| {
            let ratio = progress.ratio();
            let elapsed_ok = last_draw.elapsed() >= Duration::from_millis(120);
            let ratio_ok = (ratio - last_ratio).abs() >= 0.01;
            let should_draw = if progress.total.is_some() {
                ratio_ok || elapsed_ok
            } else {
                elapsed_ok
            };
            if !should_draw || draw_error.is_some() {
                return;
            }
            app.update_stage(stage, ratio);
            if let Err(err) = terminal.draw(|f| ui::ui(f, app)) {
                draw_error = Some(anyhow::Error::from(err));
            } else {
                last_draw = Instant::now();
                last_ratio = ratio;
            }
        },
    );

    if let Some(err) = draw_error {
        return Err(err);
    }

    match result {
        Ok(path) => {
            log::info!("saved {}", path.display());
            app.finish_stage(stage);
            terminal.draw(|f| ui::ui(f, app))?;
            app.status_message = Some(format!("Saved {}", path.display()));
        }
        Err(err) => {
            log::error!("download failed: {:#}", err);
            app.status_message = Some(format!("Download failed: {}", err));
        }
    }
    app.clear_progress();
    Ok(())
}
