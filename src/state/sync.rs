//! Game synchronization: keeps the game, its statsheet cascade and the lineup
//! order coherent for one selected game id.
//!
//! [`GameSync`] does no I/O. Inputs are selections, fetch replies and live
//! snapshots; outputs are [`SyncCommand`]s for the caller to carry out, and a
//! [`GameView`] that is rebuilt and swapped in whole after every change.

use blaseball_api::{Game, GameStatsheet, LineupOrder, PlayerStatsheet, TeamStatsheet, aggregate};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Stamped on every fetch. `generation` changes on each game-id switch and
/// `seq` is unique per issued request, so replies for an old game or an
/// overtaken request can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub generation: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Game { game_id: String },
    GameStatsheets { ids: Vec<String> },
    TeamStatsheets { ids: Vec<String> },
    PlayerStatsheets { ids: Vec<String> },
    Lineup { home_team: String, away_team: String },
}

#[derive(Debug, Clone)]
pub enum FetchResult {
    Game(Game),
    GameStatsheets(Vec<GameStatsheet>),
    TeamStatsheets(Vec<TeamStatsheet>),
    PlayerStatsheets(Vec<PlayerStatsheet>),
    Lineup(LineupOrder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Fetch { tag: RequestTag, request: FetchRequest },
    OpenLiveChannel { game_id: String },
    CloseLiveChannel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    /// Waiting for the game record itself.
    Loading,
    /// Game known, some statsheet tier still in flight.
    Cascading,
    Published,
    Failed,
}

/// What the presentation layer is allowed to see. Always replaced whole.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    pub game_id: Option<String>,
    pub game: Option<Game>,
    pub game_statsheets: Vec<GameStatsheet>,
    pub team_statsheets: Vec<TeamStatsheet>,
    /// Aggregated, one per player, in lineup order once the lineup is known.
    pub players: Vec<PlayerStatsheet>,
    pub lineup_known: bool,
    pub phase: SyncPhase,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus<'a> {
    NoGameSelected,
    Loading,
    WaitingForStart,
    Error(&'a str),
    Ready,
}

impl GameView {
    pub fn status(&self) -> ViewStatus<'_> {
        if let Some(err) = self.error.as_deref() {
            return ViewStatus::Error(err);
        }
        if self.game_id.is_none() {
            return ViewStatus::NoGameSelected;
        }
        if self.game.is_none() {
            return ViewStatus::Loading;
        }
        match (self.players.is_empty(), self.phase) {
            (true, SyncPhase::Cascading) => ViewStatus::Loading,
            (true, _) => ViewStatus::WaitingForStart,
            (false, _) => ViewStatus::Ready,
        }
    }

    /// Players of one team, in published order.
    pub fn team_players<'a>(&'a self, team_id: &'a str) -> impl Iterator<Item = &'a PlayerStatsheet> {
        self.players.iter().filter(move |p| p.team_id == team_id)
    }
}

/// Game fields whose change is taken as "statistics changed upstream".
///
/// The API has no direct signal for new stats, so batters, base runners and
/// the statsheet id stand in for one.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WatchedFields {
    statsheet: String,
    base_runners: Vec<String>,
    away_batter: Option<String>,
    home_batter: Option<String>,
}

impl WatchedFields {
    fn of(game: &Game) -> Self {
        Self {
            statsheet: game.statsheet.clone(),
            base_runners: game.base_runners.clone(),
            away_batter: game.away_batter.clone(),
            home_batter: game.home_batter.clone(),
        }
    }
}

/// One stage of the statsheet cascade.
#[derive(Debug)]
struct Tier<T> {
    items: Vec<T>,
    /// Ids of the most recent request for this tier.
    requested: Vec<String>,
    in_flight: Option<u64>,
    /// Set when a watched game field changed; cleared once a request for this
    /// tier goes out.
    dirty: bool,
}

impl<T> Default for Tier<T> {
    fn default() -> Self {
        Self { items: Vec::new(), requested: Vec::new(), in_flight: None, dirty: false }
    }
}

impl<T> Tier<T> {
    /// Whether a request for `ids` is due. Empty ids never are: the tier
    /// keeps its last good items until ids show up.
    fn wants(&self, ids: &[String]) -> bool {
        !ids.is_empty() && (self.dirty || ids != self.requested.as_slice())
    }

    fn accept(&mut self, seq: u64) -> bool {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct GameSync {
    generation: u64,
    next_seq: u64,
    game_id: Option<String>,
    game: Option<Game>,
    game_in_flight: Option<u64>,
    watched: Option<WatchedFields>,
    game_sheets: Tier<GameStatsheet>,
    team_sheets: Tier<TeamStatsheet>,
    player_sheets: Tier<PlayerStatsheet>,
    lineup: Option<LineupOrder>,
    lineup_in_flight: Option<u64>,
    players: Vec<PlayerStatsheet>,
    error: Option<String>,
    live_open: bool,
    view: Arc<GameView>,
}

impl GameSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Arc<GameView> {
        Arc::clone(&self.view)
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    #[cfg(test)]
    pub fn live_open(&self) -> bool {
        self.live_open
    }

    /// Switch the active game. Everything tied to the previous id is dropped
    /// and its live channel closed before anything for the new id starts.
    pub fn select(&mut self, game_id: Option<&str>) -> Vec<SyncCommand> {
        if self.game_id.as_deref() == game_id {
            return Vec::new();
        }
        info!("active game {:?} -> {:?}", self.game_id, game_id);

        let mut commands = Vec::new();
        if self.live_open {
            commands.push(SyncCommand::CloseLiveChannel);
        }

        *self = Self {
            generation: self.generation + 1,
            next_seq: self.next_seq,
            game_id: game_id.map(str::to_string),
            ..Self::default()
        };

        if let Some(game_id) = game_id {
            let tag = self.next_tag();
            self.game_in_flight = Some(tag.seq);
            commands.push(SyncCommand::Fetch {
                tag,
                request: FetchRequest::Game { game_id: game_id.to_string() },
            });
        }

        self.publish();
        commands
    }

    /// Feed back the outcome of a fetch issued by an earlier command.
    pub fn on_reply(&mut self, tag: RequestTag, outcome: Result<FetchResult, String>) -> Vec<SyncCommand> {
        if tag.generation != self.generation {
            debug!("dropping reply for stale generation {}", tag.generation);
            return Vec::new();
        }

        let result = match outcome {
            Ok(result) => result,
            Err(message) => {
                self.on_failure(tag.seq, message);
                return Vec::new();
            }
        };

        if self.error.is_some() {
            return Vec::new();
        }

        let commands = match result {
            FetchResult::Game(game) => {
                if self.game_in_flight != Some(tag.seq) {
                    return Vec::new();
                }
                self.game_in_flight = None;
                self.on_game_fetched(game)
            }
            FetchResult::GameStatsheets(sheets) => {
                if !self.game_sheets.accept(tag.seq) {
                    return Vec::new();
                }
                self.game_sheets.items = sheets;
                self.request_team_sheets()
            }
            FetchResult::TeamStatsheets(sheets) => {
                if !self.team_sheets.accept(tag.seq) {
                    return Vec::new();
                }
                self.team_sheets.items = sheets;
                self.request_player_sheets()
            }
            FetchResult::PlayerStatsheets(sheets) => {
                if !self.player_sheets.accept(tag.seq) {
                    return Vec::new();
                }
                self.player_sheets.items = sheets;
                self.reaggregate();
                Vec::new()
            }
            FetchResult::Lineup(lineup) => {
                if self.lineup_in_flight != Some(tag.seq) {
                    return Vec::new();
                }
                self.lineup_in_flight = None;
                debug!("lineup resolved with {} players", lineup.len());
                self.lineup = Some(lineup);
                self.reaggregate();
                Vec::new()
            }
        };

        self.publish();
        commands
    }

    /// A pushed game snapshot from the live channel.
    pub fn on_live_snapshot(&mut self, game_id: &str, game: Game) -> Vec<SyncCommand> {
        if self.game_id.as_deref() != Some(game_id) || game.id != game_id {
            debug!("ignoring live snapshot for {} (active {:?})", game.id, self.game_id);
            return Vec::new();
        }
        if game.game_complete {
            info!("game {game_id} complete, live updates finished");
            self.live_open = false;
        }
        let commands = self.apply_game(game);
        self.publish();
        commands
    }

    /// The live channel went away on its own (game over or task gone).
    pub fn on_live_closed(&mut self, game_id: &str) {
        if self.game_id.as_deref() == Some(game_id) {
            self.live_open = false;
        }
    }

    fn on_game_fetched(&mut self, game: Game) -> Vec<SyncCommand> {
        let mut commands = Vec::new();
        if !game.game_complete && !self.live_open {
            self.live_open = true;
            commands.push(SyncCommand::OpenLiveChannel { game_id: game.id.clone() });
        }

        let tag = self.next_tag();
        self.lineup_in_flight = Some(tag.seq);
        commands.push(SyncCommand::Fetch {
            tag,
            request: FetchRequest::Lineup {
                home_team: game.home_team.clone(),
                away_team: game.away_team.clone(),
            },
        });

        commands.extend(self.apply_game(game));
        commands
    }

    /// Replace the game and, if any watched field moved, restart the cascade.
    fn apply_game(&mut self, game: Game) -> Vec<SyncCommand> {
        let watched = WatchedFields::of(&game);
        let changed = self.watched.as_ref() != Some(&watched);
        self.game = Some(game);
        self.watched = Some(watched);

        if !changed || self.error.is_some() {
            return Vec::new();
        }
        self.game_sheets.dirty = true;
        self.team_sheets.dirty = true;
        self.player_sheets.dirty = true;
        self.request_game_sheets()
    }

    fn request_game_sheets(&mut self) -> Vec<SyncCommand> {
        let ids: Vec<String> = self
            .game
            .as_ref()
            .and_then(Game::statsheet_id)
            .map(str::to_string)
            .into_iter()
            .collect();
        if !self.game_sheets.wants(&ids) {
            return Vec::new();
        }
        let tag = self.issue_tag(Stage::Game, &ids);
        vec![SyncCommand::Fetch { tag, request: FetchRequest::GameStatsheets { ids } }]
    }

    fn request_team_sheets(&mut self) -> Vec<SyncCommand> {
        let ids: Vec<String> = self
            .game_sheets
            .items
            .iter()
            .flat_map(GameStatsheet::team_statsheet_ids)
            .map(str::to_string)
            .collect();
        if !self.team_sheets.wants(&ids) {
            return Vec::new();
        }
        let tag = self.issue_tag(Stage::Team, &ids);
        vec![SyncCommand::Fetch { tag, request: FetchRequest::TeamStatsheets { ids } }]
    }

    fn request_player_sheets(&mut self) -> Vec<SyncCommand> {
        let ids: Vec<String> = self
            .team_sheets
            .items
            .iter()
            .flat_map(|sheet| sheet.player_stats.iter().cloned())
            .collect();
        if !self.player_sheets.wants(&ids) {
            return Vec::new();
        }
        let tag = self.issue_tag(Stage::Player, &ids);
        vec![SyncCommand::Fetch { tag, request: FetchRequest::PlayerStatsheets { ids } }]
    }

    fn on_failure(&mut self, seq: u64, message: String) {
        if self.lineup_in_flight == Some(seq) {
            // Ordering is cosmetic; keep showing stats in fetch order.
            warn!("lineup lookup failed, keeping unsorted order: {message}");
            self.lineup_in_flight = None;
            return;
        }

        let current = self.game_in_flight == Some(seq)
            || self.game_sheets.in_flight == Some(seq)
            || self.team_sheets.in_flight == Some(seq)
            || self.player_sheets.in_flight == Some(seq);
        if !current {
            debug!("dropping failure for superseded request {seq}: {message}");
            return;
        }

        self.game_in_flight = None;
        self.game_sheets.in_flight = None;
        self.team_sheets.in_flight = None;
        self.player_sheets.in_flight = None;
        if self.error.is_none() {
            error!("sync failed for {:?}: {message}", self.game_id);
            self.error = Some(message);
        }
        self.publish();
    }

    fn reaggregate(&mut self) {
        self.players = aggregate(&self.player_sheets.items, self.lineup.as_ref());
    }

    fn next_tag(&mut self) -> RequestTag {
        self.next_seq += 1;
        RequestTag { generation: self.generation, seq: self.next_seq }
    }

    fn issue_tag(&mut self, stage: Stage, ids: &[String]) -> RequestTag {
        let tag = self.next_tag();
        let (requested, in_flight, dirty) = match stage {
            Stage::Game => (
                &mut self.game_sheets.requested,
                &mut self.game_sheets.in_flight,
                &mut self.game_sheets.dirty,
            ),
            Stage::Team => (
                &mut self.team_sheets.requested,
                &mut self.team_sheets.in_flight,
                &mut self.team_sheets.dirty,
            ),
            Stage::Player => (
                &mut self.player_sheets.requested,
                &mut self.player_sheets.in_flight,
                &mut self.player_sheets.dirty,
            ),
        };
        *requested = ids.to_vec();
        *in_flight = Some(tag.seq);
        *dirty = false;
        tag
    }

    fn phase(&self) -> SyncPhase {
        if self.game_id.is_none() {
            SyncPhase::Idle
        } else if self.error.is_some() {
            SyncPhase::Failed
        } else if self.game.is_none() {
            SyncPhase::Loading
        } else if self.game_sheets.in_flight.is_some()
            || self.team_sheets.in_flight.is_some()
            || self.player_sheets.in_flight.is_some()
        {
            SyncPhase::Cascading
        } else {
            SyncPhase::Published
        }
    }

    fn publish(&mut self) {
        self.view = Arc::new(GameView {
            game_id: self.game_id.clone(),
            game: self.game.clone(),
            game_statsheets: self.game_sheets.items.clone(),
            team_statsheets: self.team_sheets.items.clone(),
            players: self.players.clone(),
            lineup_known: self.lineup.is_some(),
            phase: self.phase(),
            error: self.error.clone(),
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Game,
    Team,
    Player,
}
