use blaseball_api::Game;
use blaseball_api::client::BlaseballApi;
use blaseball_api::stream::find_game;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

/// Fixed delay between a dropped connection and the next attempt.
pub const RECONNECT_BACKOFF: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
    Reconnecting,
}

impl ChannelState {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelState::Closed => "closed",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "live",
            ChannelState::Reconnecting => "reconnecting",
        }
    }
}

#[derive(Debug, Clone)]
/// `epoch` identifies the channel that sent the event. A game can be closed
/// and reopened under the same id, so the id alone does not tell old
/// channels from new ones.
pub enum LiveEvent {
    StateChanged { epoch: u64, game_id: String, state: ChannelState },
    Snapshot { epoch: u64, game_id: String, game: Game },
}

impl LiveEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            LiveEvent::StateChanged { epoch, .. } | LiveEvent::Snapshot { epoch, .. } => *epoch,
        }
    }
}

/// Raw event payloads from one connection; ends when the connection drops.
pub type EventStream = BoxStream<'static, Result<String, String>>;

/// Opens push-event connections.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'_, Result<EventStream, String>>;
}

impl Connector for BlaseballApi {
    fn connect(&self) -> BoxFuture<'_, Result<EventStream, String>> {
        Box::pin(async move {
            let stream = self.open_event_stream().await.map_err(|e| e.to_string())?;
            Ok(stream.map(|item| item.map_err(|e| e.to_string())).boxed())
        })
    }
}

/// Follows one game on the push stream until it completes.
///
/// Transport errors and server-side closes are retried forever after
/// [`RECONNECT_BACKOFF`]; the owner stops a channel by dropping its
/// [`LiveChannel`] handle.
pub struct LiveWorker<C> {
    pub epoch: u64,
    pub game_id: String,
    pub connector: Arc<C>,
    pub events: mpsc::Sender<LiveEvent>,
    pub backoff: Duration,
}

impl<C: Connector> LiveWorker<C> {
    pub async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            if !self.notify(ChannelState::Connecting).await {
                return;
            }

            match self.connector.connect().await {
                Ok(mut stream) => {
                    info!("listening for game updates (id={})", self.game_id);
                    attempt = 0;
                    if !self.notify(ChannelState::Open).await {
                        return;
                    }

                    while let Some(item) = stream.next().await {
                        let payload = match item {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!("live stream error (id={}): {e}", self.game_id);
                                break;
                            }
                        };
                        let game = match find_game(&payload, &self.game_id) {
                            Ok(Some(game)) => game,
                            Ok(None) => continue,
                            Err(e) => {
                                debug!("skipping live event: {e}");
                                continue;
                            }
                        };

                        let complete = game.game_complete;
                        let snapshot = LiveEvent::Snapshot { epoch: self.epoch, game_id: self.game_id.clone(), game };
                        if self.events.send(snapshot).await.is_err() {
                            return;
                        }
                        if complete {
                            info!("game {} complete, closing live channel", self.game_id);
                            self.notify(ChannelState::Closed).await;
                            return;
                        }
                    }
                }
                Err(e) => warn!("live connect failed (id={}): {e}", self.game_id),
            }

            attempt += 1;
            warn!(
                "live channel for {} dropped, retrying in {}ms (attempt {attempt})",
                self.game_id,
                self.backoff.as_millis()
            );
            if !self.notify(ChannelState::Reconnecting).await {
                return;
            }
            sleep(self.backoff).await;
        }
    }

    async fn notify(&self, state: ChannelState) -> bool {
        self.events
            .send(LiveEvent::StateChanged { epoch: self.epoch, game_id: self.game_id.clone(), state })
            .await
            .is_ok()
    }
}

/// Handle to a running [`LiveWorker`]. Dropping it closes the connection.
#[derive(Debug)]
pub struct LiveChannel {
    epoch: u64,
    game_id: String,
    task: JoinHandle<()>,
}

impl LiveChannel {
    pub fn open<C: Connector>(
        epoch: u64,
        game_id: String,
        connector: Arc<C>,
        events: mpsc::Sender<LiveEvent>,
        backoff: Duration,
    ) -> Self {
        let worker = LiveWorker { epoch, game_id: game_id.clone(), connector, events, backoff };
        Self { epoch, game_id, task: tokio::spawn(worker.run()) }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Holds the single live channel. Opening a new one always closes the old one
/// first.
pub struct LiveSlot<C> {
    connector: Arc<C>,
    events: mpsc::Sender<LiveEvent>,
    backoff: Duration,
    next_epoch: u64,
    current: Option<LiveChannel>,
}

impl<C: Connector> LiveSlot<C> {
    pub fn new(connector: Arc<C>, events: mpsc::Sender<LiveEvent>) -> Self {
        Self { connector, events, backoff: RECONNECT_BACKOFF, next_epoch: 0, current: None }
    }

    pub fn open(&mut self, game_id: &str) {
        self.close();
        self.next_epoch += 1;
        info!("opening live channel {} for {game_id}", self.next_epoch);
        self.current = Some(LiveChannel::open(
            self.next_epoch,
            game_id.to_string(),
            Arc::clone(&self.connector),
            self.events.clone(),
            self.backoff,
        ));
    }

    pub fn close(&mut self) {
        if let Some(channel) = self.current.take() {
            info!("closing live channel for {}", channel.game_id());
        }
    }

    /// Epoch of the open channel. Events stamped with any other epoch come
    /// from a channel that has since been closed.
    pub fn current_epoch(&self) -> Option<u64> {
        self.current.as_ref().map(LiveChannel::epoch)
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<&str> {
        self.current.as_ref().map(LiveChannel::game_id)
    }
}
