mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::{App, MenuItem};
use crate::state::app_settings::AppSettings;
use crate::state::debounce::ScheduleDebouncer;
use crate::state::live::LiveEvent;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::session::GameSession;
use blaseball_api::client::BlaseballApi;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

type Session = GameSession<BlaseballApi>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(initial_game) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    log::set_max_level(log::LevelFilter::Error);
    tui_logger::set_default_level(log::LevelFilter::Error);

    let settings = AppSettings::load();
    let api = BlaseballApi::with_root(&settings.api_root);
    info!("using API root {}", api.root());
    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (live_evt_tx, live_evt_rx) = mpsc::channel::<LiveEvent>(100);
    let (schedule_tx, schedule_rx) = mpsc::channel::<(u32, u32)>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(api.clone(), network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Schedule picker loads, debounced
    let debouncer = ScheduleDebouncer::new(schedule_rx, network_req_tx.clone());
    let debounce_task = tokio::spawn(debouncer.run());

    // The session owns the live channel task for whichever game is selected
    let session = GameSession::new(Arc::new(api), live_evt_tx, network_req_tx.clone());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(
        terminal,
        app,
        session,
        initial_game,
        ui_event_rx,
        network_req_tx,
        network_resp_rx,
        live_evt_rx,
        schedule_tx,
    )
    .await;

    input_handler.abort();
    network_task.abort();
    debounce_task.abort();

    Ok(())
}

/// `None` when the process should exit without starting the UI; otherwise the
/// game id given on the command line, if any.
fn handle_cli_args() -> Option<Option<String>> {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return Some(None);
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            None
        }
        "-V" | "--version" => {
            println!("boxscore {}", env!("CARGO_PKG_VERSION"));
            None
        }
        _ if arg.starts_with('-') || args.next().is_some() => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
        _ => Some(Some(arg)),
    }
}

fn usage_text() -> &'static str {
    "boxscore - live Blaseball box scores in the terminal

Usage:
  boxscore [GAME_ID]
  boxscore --help
  boxscore --version

Environment:
  BOXSCORE_API_ROOT    API base URL (default https://www.blaseball.com)
  BOXSCORE_LOG         Log level: error, warn, info, debug or trace (default error)
  XDG_CONFIG_HOME      Where boxscore/settings.json is kept (default ~/.config)"
}

#[allow(clippy::too_many_arguments)]
async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut session: Session,
    initial_game: Option<String>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut live_events: mpsc::Receiver<LiveEvent>,
    schedule_selections: mpsc::Sender<(u32, u32)>,
) {
    let mut loading = LoadingState::default();
    let mut initial_game = initial_game;

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(
                    ui_event,
                    &app,
                    &mut session,
                    &mut initial_game,
                    &network_requests,
                    &schedule_selections,
                )
                .await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &mut session, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(live_event) = live_events.recv() => {
                let should_redraw = handle_live_event(live_event, &app, &mut session).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    session: &mut Session,
    initial_game: &mut Option<String>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    schedule_selections: &mpsc::Sender<(u32, u32)>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            if let Err(e) = network_requests.send(NetworkRequest::LoadSimulation).await {
                error!("Failed to queue simulation load: {e}");
            }
            if let Some(game_id) = initial_game.take() {
                let view = session.select(Some(&game_id)).await;
                let mut guard = app.lock().await;
                guard.update_tab(MenuItem::BoxScore);
                guard.on_view_published(view);
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, session, schedule_selections).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    session: &mut Session,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
        }
        NetworkResponse::SimulationLoaded { simulation } => {
            let (season, day) = app.lock().await.on_simulation_loaded(simulation);
            if let Err(e) = network_requests
                .send(NetworkRequest::LoadSchedule { season, day })
                .await
            {
                error!("Failed to queue schedule load: {e}");
            }
        }
        NetworkResponse::ScheduleLoaded { season, day, games, day_count } => {
            let mut guard = app.lock().await;
            guard.on_schedule_loaded(season, day, games, day_count);
        }
        NetworkResponse::Synced { tag, outcome } => {
            let view = session.on_reply(tag, outcome).await;
            let mut guard = app.lock().await;
            if Arc::ptr_eq(&view, &guard.state.view) {
                return false;
            }
            guard.on_view_published(view);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    true
}

async fn handle_live_event(event: LiveEvent, app: &Arc<Mutex<App>>, session: &mut Session) -> bool {
    if !session.is_current(&event) {
        return false;
    }
    if let LiveEvent::StateChanged { game_id, state, .. } = &event {
        app.lock().await.on_live_state(game_id, *state);
    }
    let snapshot = matches!(event, LiveEvent::Snapshot { .. });

    match session.on_live_event(event).await {
        Some(view) => {
            let mut guard = app.lock().await;
            if snapshot {
                guard.on_live_snapshot();
            }
            guard.on_view_published(view);
            true
        }
        None => !snapshot,
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

/// Best effort; also runs from the panic hook, so failures are ignored.
pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
