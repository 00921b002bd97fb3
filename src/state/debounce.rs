use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

pub const SCHEDULE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Turns a burst of season/day changes into a single schedule load.
/// A load goes out once no new selection has arrived for `quiet`, and only for
/// the last selection of the burst.
pub struct ScheduleDebouncer {
    selections: mpsc::Receiver<(u32, u32)>,
    network_requests: mpsc::Sender<NetworkRequest>,
    quiet: Duration,
}

impl ScheduleDebouncer {
    pub fn new(
        selections: mpsc::Receiver<(u32, u32)>,
        network_requests: mpsc::Sender<NetworkRequest>,
    ) -> Self {
        Self { selections, network_requests, quiet: SCHEDULE_DEBOUNCE }
    }

    pub async fn run(mut self) {
        let mut pending: Option<(u32, u32)> = None;
        loop {
            let Some((season, day)) = pending else {
                match self.selections.recv().await {
                    Some(selection) => pending = Some(selection),
                    None => return,
                }
                continue;
            };

            tokio::select! {
                next = self.selections.recv() => match next {
                    Some(selection) => pending = Some(selection),
                    None => {
                        self.flush(season, day).await;
                        return;
                    }
                },
                _ = sleep(self.quiet) => {
                    pending = None;
                    if !self.flush(season, day).await {
                        return;
                    }
                }
            }
        }
    }

    async fn flush(&self, season: u32, day: u32) -> bool {
        self.network_requests
            .send(NetworkRequest::LoadSchedule { season, day })
            .await
            .is_ok()
    }
}
