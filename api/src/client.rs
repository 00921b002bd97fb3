use crate::stream::SseDecoder;
use crate::{
    Game, GameStatsheet, LineupOrder, PlayerStatsheet, SeasonDayCount, SimulationData, Team,
    TeamStatsheet,
};
use futures_util::{Stream, StreamExt, future, stream};
use log::debug;
use reqwest::{Client, StatusCode, Url, header};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_API_ROOT: &str = "https://www.blaseball.com";

/// Client for the Blaseball database endpoints and the live event stream.
#[derive(Debug, Clone)]
pub struct BlaseballApi {
    client: Client,
    root: String,
    timeout: Duration,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Stream(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Stream(msg) => write!(f, "Stream error: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl BlaseballApi {
    /// Build a client against a different API root (mirrors, local fixtures).
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("boxscore/0.1 (terminal box score viewer)")
                .build()
                .unwrap_or_default(),
            root: root.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub async fn fetch_game(&self, game_id: &str) -> ApiResult<Game> {
        self.get(&format!("database/gameById/{game_id}"), &[]).await
    }

    pub async fn fetch_game_statsheets(&self, ids: &[String]) -> ApiResult<Vec<GameStatsheet>> {
        self.get_by_ids("database/gameStatsheets", ids).await
    }

    pub async fn fetch_team_statsheets(&self, ids: &[String]) -> ApiResult<Vec<TeamStatsheet>> {
        self.get_by_ids("database/teamStatsheets", ids).await
    }

    pub async fn fetch_player_statsheets(&self, ids: &[String]) -> ApiResult<Vec<PlayerStatsheet>> {
        self.get_by_ids("database/playerStatsheets", ids).await
    }

    /// All games scheduled on one day of a season (both zero-based).
    pub async fn fetch_games(&self, season: u32, day: u32) -> ApiResult<Vec<Game>> {
        let season = season.to_string();
        let day = day.to_string();
        self.get("database/games", &[("season", season.as_str()), ("day", day.as_str())])
            .await
    }

    pub async fn fetch_season_day_count(&self, season: u32) -> ApiResult<SeasonDayCount> {
        let season = season.to_string();
        self.get("database/seasondaycount", &[("season", season.as_str())])
            .await
    }

    /// Current season and day of the simulation.
    pub async fn fetch_simulation_data(&self) -> ApiResult<SimulationData> {
        self.get("database/simulationData", &[]).await
    }

    pub async fn fetch_team(&self, team_id: &str) -> ApiResult<Team> {
        self.get("database/team", &[("id", team_id)]).await
    }

    /// Fetch both teams concurrently and merge their lineups.
    pub async fn resolve_lineup(&self, home_team: &str, away_team: &str) -> ApiResult<LineupOrder> {
        let (home, away) =
            future::try_join(self.fetch_team(home_team), self.fetch_team(away_team)).await?;
        Ok(LineupOrder::from_teams(&away, &home))
    }

    /// Open the live push stream. Items are raw JSON payloads, one per event;
    /// the stream ends when the server closes the connection.
    ///
    /// No request timeout is applied, the connection is expected to stay open.
    pub async fn open_event_stream(
        &self,
    ) -> ApiResult<impl Stream<Item = ApiResult<String>> + Send + 'static> {
        let url = format!("{}/events/streamData", self.root);
        debug!("opening event stream {url}");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.clone()))?;

        let mut decoder = SseDecoder::default();
        Ok(response.bytes_stream().flat_map(move |chunk| {
            let items: Vec<ApiResult<String>> = match chunk {
                Ok(bytes) => decoder.push(&bytes).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(ApiError::Network(e, url.clone()))],
            };
            stream::iter(items)
        }))
    }

    async fn get_by_ids<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        ids: &[String],
    ) -> ApiResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.join(",");
        self.get(path, &[("ids", ids.as_str())]).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let base = format!("{}/{path}", self.root);
        let url = if query.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, query)
        }
        .map_err(|e| ApiError::Other(format!("invalid url {base}: {e}")))?;
        let url_text = url.to_string();
        debug!("GET {url_text}");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url_text.clone()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url_text));
        }

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url_text)),
            Err(e) => Err(ApiError::Api(e, url_text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use mockito::Matcher;

    #[tokio::test]
    async fn fetch_game_decodes_camel_case_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/database/gameById/g1")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"g1","season":11,"day":98,"awayTeam":"a","homeTeam":"h",
                    "awayTeamNickname":"Crabs","homeTeamNickname":"Tigers",
                    "awayBatter":null,"homeBatter":"p9","baseRunners":["p3"],
                    "statsheet":"s1","gameComplete":false}"#,
            )
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        let game = api.fetch_game("g1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(game.season, 11);
        assert_eq!(game.away_team_nickname, "Crabs");
        assert_eq!(game.away_batter, None);
        assert_eq!(game.home_batter.as_deref(), Some("p9"));
        assert_eq!(game.base_runners, vec!["p3"]);
        assert_eq!(game.statsheet_id(), Some("s1"));
    }

    #[tokio::test]
    async fn statsheet_ids_are_joined_into_one_query_param() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/database/teamStatsheets")
            .match_query(Matcher::UrlEncoded("ids".into(), "t1,t2".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"t1","team":"a","playerStats":["p1a","p1b"]},{"id":"t2","team":"h","playerStats":[]}]"#)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        let sheets = api
            .fetch_team_statsheets(&["t1".to_string(), "t2".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].player_stats, vec!["p1a", "p1b"]);
    }

    #[tokio::test]
    async fn empty_id_list_skips_the_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        assert!(api.fetch_player_statsheets(&[]).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_counters_default_to_zero() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/playerStatsheets")
            .match_query(Matcher::UrlEncoded("ids".into(), "x".into()))
            .with_body(r#"[{"id":"x","playerId":"p1","name":"Jessica Telephone","hits":2}]"#)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        let sheets = api.fetch_player_statsheets(&["x".to_string()]).await.unwrap();
        assert_eq!(sheets[0].hits, 2.0);
        assert_eq!(sheets[0].at_bats, 0.0);
        assert_eq!(sheets[0].player_id, "p1");
    }

    #[tokio::test]
    async fn fractional_counters_and_null_names_decode() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/playerStatsheets")
            .match_query(Matcher::UrlEncoded("ids".into(), "x,y".into()))
            .with_body(
                r#"[{"id":"x","playerId":"p1","rbis":1.5,"name":null},
                    {"id":"y","playerId":"p2","team":null,"hits":null,"runs":2}]"#,
            )
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        let sheets = api
            .fetch_player_statsheets(&["x".to_string(), "y".to_string()])
            .await
            .unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].rbis, 1.5);
        assert_eq!(sheets[0].name, "");
        assert_eq!(sheets[1].team, "");
        assert_eq!(sheets[1].hits, 0.0);
        assert_eq!(sheets[1].runs, 2.0);
    }

    #[tokio::test]
    async fn null_statsheet_reads_as_not_yet_allocated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/gameById/g1")
            .with_body(r#"{"id":"g1","statsheet":null,"baseRunners":null,"homeTeamName":null}"#)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        let game = api.fetch_game("g1").await.unwrap();
        assert_eq!(game.id, "g1");
        assert_eq!(game.statsheet_id(), None);
        assert!(game.base_runners.is_empty());
        assert_eq!(game.home_team_name, "");
    }

    #[tokio::test]
    async fn not_found_and_bad_bodies_are_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/gameById/missing")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/database/simulationData")
            .with_body("<html>oops</html>")
            .create_async()
            .await;
        server
            .mock("GET", "/database/gameById/boom")
            .with_status(500)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        assert!(matches!(api.fetch_game("missing").await, Err(ApiError::NotFound(_))));
        assert!(matches!(api.fetch_simulation_data().await, Err(ApiError::Parsing(..))));
        assert!(matches!(api.fetch_game("boom").await, Err(ApiError::Api(..))));
    }

    #[tokio::test]
    async fn resolve_lineup_merges_both_teams() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/team")
            .match_query(Matcher::UrlEncoded("id".into(), "home".into()))
            .with_body(r#"{"id":"home","lineup":["h1","h2"]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/database/team")
            .match_query(Matcher::UrlEncoded("id".into(), "away".into()))
            .with_body(r#"{"id":"away","lineup":["a1","a2","a3"]}"#)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        let lineup = api.resolve_lineup("home", "away").await.unwrap();
        assert_eq!(lineup.len(), 5);
        assert_eq!(lineup.position("a3"), 2);
        assert_eq!(lineup.position("h2"), 1);
    }

    #[tokio::test]
    async fn resolve_lineup_fails_when_either_team_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/database/team")
            .match_query(Matcher::UrlEncoded("id".into(), "home".into()))
            .with_body(r#"{"id":"home","lineup":["h1"]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/database/team")
            .match_query(Matcher::UrlEncoded("id".into(), "away".into()))
            .with_status(500)
            .create_async()
            .await;

        let api = BlaseballApi::with_root(server.url());
        assert!(api.resolve_lineup("home", "away").await.is_err());
    }

    #[tokio::test]
    async fn event_stream_yields_decoded_payloads() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/events/streamData")
            .match_header("accept", "text/event-stream")
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"value\":1}\n\n: ping\n\ndata: {\"value\":2}\n\n")
            .create_async()
            .await;

        let api = BlaseballApi::with_root(format!("{}/", server.url()));
        let events: Vec<String> = api
            .open_event_stream()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(events, vec![r#"{"value":1}"#, r#"{"value":2}"#]);
    }
}
