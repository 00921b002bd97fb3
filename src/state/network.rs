use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::sync::{FetchRequest, FetchResult};
use blaseball_api::client::{ApiError, BlaseballApi};
use futures_util::future;
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Executes network requests. Each request runs on its own task so the lineup
/// lookup never waits behind the statsheet cascade.
pub struct NetworkWorker {
    client: BlaseballApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    in_flight: Arc<AtomicUsize>,
}

impl NetworkWorker {
    pub fn new(
        client: BlaseballApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let client = self.client.clone();
            let responses = self.responses.clone();
            let in_flight = self.in_flight.clone();

            start_loading_animation(&in_flight, &responses).await;
            tokio::spawn(async move {
                let response = handle_request(&client, request).await;
                let is_ok = !matches!(
                    response,
                    NetworkResponse::Error { .. } | NetworkResponse::Synced { outcome: Err(_), .. }
                );
                debug!("network request complete");
                stop_loading_animation(&in_flight, &responses, is_ok).await;

                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
    }
}

async fn handle_request(client: &BlaseballApi, request: NetworkRequest) -> NetworkResponse {
    match request {
        NetworkRequest::LoadSimulation => {
            debug!("loading simulation data");
            match client.fetch_simulation_data().await {
                Ok(simulation) => NetworkResponse::SimulationLoaded { simulation },
                Err(e) => NetworkResponse::Error { message: e.to_string() },
            }
        }
        NetworkRequest::LoadSchedule { season, day } => {
            debug!("loading schedule for season {season} day {day}");
            let loaded = future::try_join(
                client.fetch_games(season, day),
                client.fetch_season_day_count(season),
            )
            .await;
            match loaded {
                Ok((games, count)) => NetworkResponse::ScheduleLoaded {
                    season,
                    day,
                    games,
                    day_count: count.day_count,
                },
                Err(e) => NetworkResponse::Error { message: e.to_string() },
            }
        }
        NetworkRequest::Sync { tag, request } => {
            let outcome = execute(client, request).await.map_err(|e| e.to_string());
            NetworkResponse::Synced { tag, outcome }
        }
    }
}

/// Run one cascade fetch against the API.
pub async fn execute(client: &BlaseballApi, request: FetchRequest) -> Result<FetchResult, ApiError> {
    match request {
        FetchRequest::Game { game_id } => client.fetch_game(&game_id).await.map(FetchResult::Game),
        FetchRequest::GameStatsheets { ids } => client
            .fetch_game_statsheets(&ids)
            .await
            .map(FetchResult::GameStatsheets),
        FetchRequest::TeamStatsheets { ids } => client
            .fetch_team_statsheets(&ids)
            .await
            .map(FetchResult::TeamStatsheets),
        FetchRequest::PlayerStatsheets { ids } => client
            .fetch_player_statsheets(&ids)
            .await
            .map(FetchResult::PlayerStatsheets),
        FetchRequest::Lineup { home_team, away_team } => client
            .resolve_lineup(&home_team, &away_team)
            .await
            .map(FetchResult::Lineup),
    }
}

/// Only the first of several concurrent requests starts the spinner task.
async fn start_loading_animation(in_flight: &Arc<AtomicUsize>, responses: &mpsc::Sender<NetworkResponse>) {
    if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
        return;
    }

    let mut loading_state = LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged { loading_state })
        .await;

    let responses = responses.clone();
    let in_flight = in_flight.clone();

    tokio::spawn(async move {
        let mut spinner_index = 1;
        let mut interval = tokio::time::interval(Duration::from_millis(33));
        loop {
            interval.tick().await;
            if in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            loading_state.spinner_char = SPINNER_CHARS[spinner_index];
            spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
            let _ = responses
                .send(NetworkResponse::LoadingStateChanged { loading_state })
                .await;
        }
    });
}

async fn stop_loading_animation(in_flight: &Arc<AtomicUsize>, responses: &mpsc::Sender<NetworkResponse>, is_ok: bool) {
    if in_flight.fetch_sub(1, Ordering::SeqCst) > 1 {
        return;
    }
    tokio::time::sleep(Duration::from_millis(15)).await;

    let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged {
            loading_state: LoadingState { is_loading: false, spinner_char },
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::sync::RequestTag;

    #[tokio::test]
    async fn failed_sync_fetch_comes_back_as_outcome() {
        // nothing listens on port 9, the connection is refused
        let client = BlaseballApi::with_root("http://127.0.0.1:9");
        let tag = RequestTag { generation: 3, seq: 7 };
        let response = handle_request(
            &client,
            NetworkRequest::Sync { tag, request: FetchRequest::Game { game_id: "g1".into() } },
        )
        .await;

        match response {
            NetworkResponse::Synced { tag: got, outcome } => {
                assert_eq!(got, tag);
                assert!(outcome.unwrap_err().contains("Network error"));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_id_fetches_succeed_without_network() {
        let client = BlaseballApi::with_root("http://127.0.0.1:9");
        let result = execute(&client, FetchRequest::PlayerStatsheets { ids: Vec::new() }).await;
        assert!(matches!(result, Ok(FetchResult::PlayerStatsheets(sheets)) if sheets.is_empty()));
    }
}
