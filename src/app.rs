use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::live::ChannelState;
use crate::state::sync::GameView;
use blaseball_api::{Game, SimulationData};
use chrono::Local;
use log::warn;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Schedule,
    BoxScore,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self { state: AppState::new(), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network / sync handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Jump the picker to the simulation's current day. Returns the
    /// season/day to load.
    pub fn on_simulation_loaded(&mut self, simulation: SimulationData) -> (u32, u32) {
        self.state.last_error = None;
        self.state.schedule.season = simulation.season;
        self.state.schedule.day = simulation.day;
        self.state.schedule.selected = 0;
        (simulation.season, simulation.day)
    }

    pub fn on_schedule_loaded(&mut self, season: u32, day: u32, games: Vec<Game>, day_count: u32) {
        self.state.last_error = None;
        self.state.schedule.load(season, day, games, day_count);
    }

    pub fn on_view_published(&mut self, view: Arc<GameView>) {
        if view.game_id != self.state.view.game_id {
            self.state.live = Default::default();
            self.state.live.game_id = view.game_id.clone();
        }
        self.state.view = view;
    }

    pub fn on_live_snapshot(&mut self) {
        self.state.live.last_update = Some(Local::now().format("%H:%M:%S").to_string());
    }

    pub fn on_live_state(&mut self, game_id: &str, state: ChannelState) {
        if self.state.live.game_id.as_deref() == Some(game_id) {
            self.state.live.state = Some(state);
        }
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn toggle_color_scheme(&mut self) {
        if let Err(e) = self.settings.toggle_color_scheme() {
            warn!("could not save color scheme: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // Schedule navigation. Each returns the season/day to (re)load if the
    // selection moved
    // -----------------------------------------------------------------------

    pub fn schedule_next_day(&mut self) -> Option<(u32, u32)> {
        self.state.schedule.next_day().then(|| self.schedule_key())
    }

    pub fn schedule_prev_day(&mut self) -> Option<(u32, u32)> {
        self.state.schedule.prev_day().then(|| self.schedule_key())
    }

    pub fn schedule_next_season(&mut self) -> Option<(u32, u32)> {
        self.state.schedule.next_season().then(|| self.schedule_key())
    }

    pub fn schedule_prev_season(&mut self) -> Option<(u32, u32)> {
        self.state.schedule.prev_season().then(|| self.schedule_key())
    }

    /// The game under the cursor, switching to the box score as a side-effect.
    pub fn schedule_select_game(&mut self) -> Option<String> {
        let game_id = self.state.schedule.selected_game_id()?.to_string();
        self.update_tab(MenuItem::BoxScore);
        Some(game_id)
    }

    fn schedule_key(&self) -> (u32, u32) {
        (self.state.schedule.season, self.state.schedule.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_view_resets_live_status() {
        let mut app = App::new(AppSettings::default());
        let view = GameView { game_id: Some("g1".into()), ..Default::default() };
        app.on_view_published(Arc::new(view));
        app.on_live_state("g1", ChannelState::Open);
        app.on_live_state("g0", ChannelState::Reconnecting);
        assert_eq!(app.state.live.state, Some(ChannelState::Open));

        let view = GameView { game_id: Some("g2".into()), ..Default::default() };
        app.on_view_published(Arc::new(view));
        assert_eq!(app.state.live.state, None);
        assert_eq!(app.state.live.game_id.as_deref(), Some("g2"));
    }

    #[test]
    fn selecting_a_game_opens_box_score() {
        let mut app = App::new(AppSettings::default());
        app.on_schedule_loaded(0, 0, vec![Game { id: "g1".into(), ..Default::default() }], 99);
        assert_eq!(app.schedule_select_game().as_deref(), Some("g1"));
        assert_eq!(app.state.active_tab, MenuItem::BoxScore);
    }
}
