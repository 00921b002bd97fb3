use crate::app::{App, MenuItem};
use crate::state::live::Connector;
use crate::state::session::GameSession;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::error;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings<C: Connector>(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    session: &mut GameSession<C>,
    schedule_selections: &mpsc::Sender<(u32, u32)>,
) {
    let mut guard = app.lock().await;
    let mut reload_schedule = None;

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Schedule),
        (_, Char('2'), _) => guard.update_tab(MenuItem::BoxScore),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Schedule navigation
        (MenuItem::Schedule, Char('j') | KeyCode::Down, _) => guard.state.schedule.select_down(),
        (MenuItem::Schedule, Char('k') | KeyCode::Up, _) => guard.state.schedule.select_up(),
        (MenuItem::Schedule, Char('l') | KeyCode::Right, _) => reload_schedule = guard.schedule_next_day(),
        (MenuItem::Schedule, Char('h') | KeyCode::Left, _) => reload_schedule = guard.schedule_prev_day(),
        (MenuItem::Schedule, Char(']'), _) => reload_schedule = guard.schedule_next_season(),
        (MenuItem::Schedule, Char('['), _) => reload_schedule = guard.schedule_prev_season(),
        (MenuItem::Schedule, KeyCode::Enter, _) => {
            if let Some(game_id) = guard.schedule_select_game() {
                let view = session.select(Some(&game_id)).await;
                guard.on_view_published(view);
            }
        }

        // Box score
        (MenuItem::BoxScore, KeyCode::Esc, _) => {
            let view = session.select(None).await;
            guard.on_view_published(view);
            guard.update_tab(MenuItem::Schedule);
        }

        // Global
        (_, Char('t'), _) => guard.toggle_color_scheme(),
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    if let Some(selection) = reload_schedule {
        drop(guard);
        if let Err(e) = schedule_selections.send(selection).await {
            error!("Failed to queue schedule load: {e}");
        }
    }
}
