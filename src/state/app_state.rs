use crate::app::MenuItem;
use crate::state::live::ChannelState;
use crate::state::sync::GameView;
use blaseball_api::Game;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Schedule picker state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ScheduleState {
    /// Zero-based, as the API counts them.
    pub season: u32,
    pub day: u32,
    /// Days in `season`, once known.
    pub day_count: Option<u32>,
    pub games: Vec<Game>,
    /// Season/day the current `games` belong to.
    pub loaded_for: Option<(u32, u32)>,
    pub selected: usize,
}

impl ScheduleState {
    /// Store a loaded day. Results for a selection the user has already moved
    /// away from are dropped.
    pub fn load(&mut self, season: u32, day: u32, games: Vec<Game>, day_count: u32) {
        if (season, day) != (self.season, self.day) {
            return;
        }
        self.day_count = Some(day_count);
        self.games = games;
        self.loaded_for = Some((season, day));
        self.selected = self.selected.min(self.games.len().saturating_sub(1));
    }

    pub fn is_current(&self) -> bool {
        self.loaded_for == Some((self.season, self.day))
    }

    pub fn next_day(&mut self) -> bool {
        let last = self.day_count.map(|c| c.saturating_sub(1)).unwrap_or(u32::MAX);
        if self.day >= last {
            return false;
        }
        self.day += 1;
        self.selected = 0;
        true
    }

    pub fn prev_day(&mut self) -> bool {
        if self.day == 0 {
            return false;
        }
        self.day -= 1;
        self.selected = 0;
        true
    }

    pub fn next_season(&mut self) -> bool {
        self.season += 1;
        self.day = 0;
        self.day_count = None;
        self.selected = 0;
        true
    }

    pub fn prev_season(&mut self) -> bool {
        if self.season == 0 {
            return false;
        }
        self.season -= 1;
        self.day = 0;
        self.day_count = None;
        self.selected = 0;
        true
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.games.len() {
            self.selected += 1;
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_game_id(&self) -> Option<&str> {
        if !self.is_current() {
            return None;
        }
        self.games.get(self.selected).map(|g| g.id.as_str())
    }
}

// ---------------------------------------------------------------------------
// Live channel status (display only)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LiveStatus {
    pub game_id: Option<String>,
    pub state: Option<ChannelState>,
    /// Local time of the last applied snapshot, "HH:MM:SS".
    pub last_update: Option<String>,
}

// ---------------------------------------------------------------------------
// Top-level application state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub schedule: ScheduleState,
    /// Latest published game view; swapped, never edited.
    pub view: Arc<GameView>,
    pub live: LiveStatus,
    pub last_error: Option<String>,
    pub show_logs: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn games(ids: &[&str]) -> Vec<Game> {
        ids.iter()
            .map(|id| Game { id: id.to_string(), ..Default::default() })
            .collect()
    }

    #[test]
    fn day_navigation_is_clamped() {
        let mut schedule = ScheduleState { day_count: Some(3), ..Default::default() };
        assert!(!schedule.prev_day());
        assert!(schedule.next_day());
        assert!(schedule.next_day());
        assert!(!schedule.next_day());
        assert_eq!(schedule.day, 2);
    }

    #[test]
    fn season_change_resets_day() {
        let mut schedule = ScheduleState { season: 4, day: 50, day_count: Some(99), ..Default::default() };
        assert!(schedule.prev_season());
        assert_eq!((schedule.season, schedule.day, schedule.day_count), (3, 0, None));
        assert!(schedule.next_season());
        assert_eq!(schedule.season, 4);
    }

    #[test]
    fn loads_for_an_old_selection_are_dropped() {
        let mut schedule = ScheduleState { season: 1, day: 2, ..Default::default() };
        schedule.load(1, 1, games(&["stale"]), 10);
        assert!(schedule.games.is_empty());
        assert_eq!(schedule.selected_game_id(), None);

        schedule.load(1, 2, games(&["a", "b"]), 10);
        schedule.select_down();
        schedule.select_down();
        assert_eq!(schedule.selected_game_id(), Some("b"));

        schedule.next_day();
        assert_eq!(schedule.selected_game_id(), None, "games belong to the previous day");
    }
}
