use crate::state::live::{ChannelState, Connector, LiveEvent, LiveSlot};
use crate::state::messages::NetworkRequest;
use crate::state::sync::{FetchResult, GameSync, GameView, RequestTag, SyncCommand};
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs a [`GameSync`]: forwards its fetches to the network worker and owns
/// the live channel it opens and closes.
pub struct GameSession<C> {
    sync: GameSync,
    live: LiveSlot<C>,
    network_requests: mpsc::Sender<NetworkRequest>,
}

impl<C: Connector> GameSession<C> {
    pub fn new(
        connector: Arc<C>,
        live_events: mpsc::Sender<LiveEvent>,
        network_requests: mpsc::Sender<NetworkRequest>,
    ) -> Self {
        Self {
            sync: GameSync::new(),
            live: LiveSlot::new(connector, live_events),
            network_requests,
        }
    }

    pub fn view(&self) -> Arc<GameView> {
        self.sync.view()
    }

    pub async fn select(&mut self, game_id: Option<&str>) -> Arc<GameView> {
        let commands = self.sync.select(game_id);
        self.dispatch(commands).await;
        self.view()
    }

    pub async fn on_reply(&mut self, tag: RequestTag, outcome: Result<FetchResult, String>) -> Arc<GameView> {
        let commands = self.sync.on_reply(tag, outcome);
        self.dispatch(commands).await;
        self.view()
    }

    /// Whether `event` came from the channel that is open now.
    pub fn is_current(&self, event: &LiveEvent) -> bool {
        self.live.current_epoch() == Some(event.epoch())
    }

    /// Apply a live channel event. `None` when it changed nothing visible,
    /// which includes events left over from a closed channel.
    pub async fn on_live_event(&mut self, event: LiveEvent) -> Option<Arc<GameView>> {
        if !self.is_current(&event) {
            debug!("dropping live event from closed channel {}", event.epoch());
            return None;
        }
        match event {
            LiveEvent::Snapshot { game_id, game, .. } => {
                let before = self.view();
                let commands = self.sync.on_live_snapshot(&game_id, game);
                self.dispatch(commands).await;
                let after = self.view();
                (!Arc::ptr_eq(&before, &after)).then_some(after)
            }
            LiveEvent::StateChanged { game_id, state: ChannelState::Closed, .. } => {
                if self.sync.game_id() == Some(game_id.as_str()) {
                    self.sync.on_live_closed(&game_id);
                    self.live.close();
                }
                None
            }
            LiveEvent::StateChanged { .. } => None,
        }
    }

    async fn dispatch(&mut self, commands: Vec<SyncCommand>) {
        for command in commands {
            match command {
                SyncCommand::Fetch { tag, request } => {
                    if let Err(e) = self
                        .network_requests
                        .send(NetworkRequest::Sync { tag, request })
                        .await
                    {
                        error!("Failed to queue sync fetch: {e}");
                    }
                }
                SyncCommand::OpenLiveChannel { game_id } => self.live.open(&game_id),
                SyncCommand::CloseLiveChannel => self.live.close(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::live::EventStream;
    use crate::state::sync::FetchRequest;
    use blaseball_api::Game;
    use futures_util::future::BoxFuture;
    use futures_util::stream::{self, StreamExt};

    /// Connects to a stream that never yields, like a quiet server.
    struct IdleConnector;

    impl Connector for IdleConnector {
        fn connect(&self) -> BoxFuture<'_, Result<EventStream, String>> {
            Box::pin(async { Ok(stream::pending().boxed()) })
        }
    }

    fn session() -> (GameSession<IdleConnector>, mpsc::Receiver<NetworkRequest>, mpsc::Receiver<LiveEvent>) {
        let (net_tx, net_rx) = mpsc::channel(16);
        let (live_tx, live_rx) = mpsc::channel(16);
        (GameSession::new(Arc::new(IdleConnector), live_tx, net_tx), net_rx, live_rx)
    }

    fn next_sync(rx: &mut mpsc::Receiver<NetworkRequest>) -> (RequestTag, FetchRequest) {
        match rx.try_recv() {
            Ok(NetworkRequest::Sync { tag, request }) => (tag, request),
            other => panic!("expected a sync request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_reach_network_worker_and_live_slot() {
        let (mut session, mut net_rx, _live_rx) = session();

        session.select(Some("G1")).await;
        let (tag, request) = next_sync(&mut net_rx);
        assert_eq!(request, FetchRequest::Game { game_id: "G1".into() });

        let game = Game { id: "G1".into(), statsheet: "S1".into(), ..Default::default() };
        session.on_reply(tag, Ok(FetchResult::Game(game))).await;
        assert_eq!(session.live.active(), Some("G1"));
        assert!(matches!(next_sync(&mut net_rx).1, FetchRequest::Lineup { .. }));
        assert!(matches!(next_sync(&mut net_rx).1, FetchRequest::GameStatsheets { .. }));

        session.select(Some("G2")).await;
        assert_eq!(session.live.active(), None);
        assert_eq!(next_sync(&mut net_rx).1, FetchRequest::Game { game_id: "G2".into() });
    }

    /// Selects `game_id` and answers its game fetch so the live channel opens.
    async fn open_game(session: &mut GameSession<IdleConnector>, net_rx: &mut mpsc::Receiver<NetworkRequest>, game_id: &str) -> u64 {
        session.select(Some(game_id)).await;
        let (tag, _) = next_sync(net_rx);
        let game = Game { id: game_id.into(), statsheet: "S1".into(), ..Default::default() };
        session.on_reply(tag, Ok(FetchResult::Game(game))).await;
        while net_rx.try_recv().is_ok() {}
        session.live.current_epoch().unwrap()
    }

    #[tokio::test]
    async fn snapshot_for_unsubscribed_game_changes_nothing() {
        let (mut session, mut net_rx, _live_rx) = session();
        let epoch = open_game(&mut session, &mut net_rx, "G1").await;
        let before = session.view();

        let stray = LiveEvent::Snapshot {
            epoch,
            game_id: "G2".into(),
            game: Game { id: "G2".into(), ..Default::default() },
        };
        assert!(session.on_live_event(stray).await.is_none());
        assert!(Arc::ptr_eq(&before, &session.view()));
    }

    #[tokio::test]
    async fn events_from_a_closed_channel_are_dropped_after_reopening() {
        let (mut session, mut net_rx, _live_rx) = session();
        let old_epoch = open_game(&mut session, &mut net_rx, "G1").await;

        session.select(None).await;
        session.select(Some("G1")).await;
        assert_eq!(session.live.current_epoch(), None);

        let stale = LiveEvent::Snapshot {
            epoch: old_epoch,
            game_id: "G1".into(),
            game: Game { id: "G1".into(), statsheet: "S-old".into(), ..Default::default() },
        };
        assert!(!session.is_current(&stale));
        assert!(session.on_live_event(stale).await.is_none());
        assert!(session.view().game.is_none());

        let (tag, _) = next_sync(&mut net_rx);
        session.on_reply(tag, Ok(FetchResult::Game(Game { id: "G1".into(), ..Default::default() }))).await;
        let new_epoch = session.live.current_epoch().unwrap();
        assert_ne!(old_epoch, new_epoch);

        let stale_close = LiveEvent::StateChanged { epoch: old_epoch, game_id: "G1".into(), state: ChannelState::Closed };
        session.on_live_event(stale_close).await;
        assert_eq!(session.live.current_epoch(), Some(new_epoch));
    }
}
