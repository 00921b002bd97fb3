use crate::state::network::LoadingState;
use crate::state::sync::{FetchRequest, FetchResult, RequestTag};
use blaseball_api::{Game, SimulationData};
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadSimulation,
    LoadSchedule { season: u32, day: u32 },
    /// A cascade fetch issued by the game synchronizer.
    Sync { tag: RequestTag, request: FetchRequest },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    SimulationLoaded { simulation: SimulationData },
    ScheduleLoaded { season: u32, day: u32, games: Vec<Game>, day_count: u32 },
    /// Failures travel inside `outcome`; the synchronizer decides what is fatal.
    Synced { tag: RequestTag, outcome: Result<FetchResult, String> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
