use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use dw_core::level::{DayExtractor, ExtractorState, ReadError, WorldSnapshot};

use crate::announce::Announcer;
use crate::shutdown::ShutdownSignal;

/// A polling session over one level file.
///
/// Drives the extractor at a fixed interval and announces day changes.
/// The loop is sequential, so at most one tick's work is ever in flight;
/// a slow read simply delays the next nominal fire time.
pub struct WatchSession {
    extractor: DayExtractor,
    state: ExtractorState,
    announcer: Announcer,
    interval: Duration,
}

impl WatchSession {
    pub fn new(extractor: DayExtractor, announcer: Announcer, interval: Duration) -> Self {
        Self {
            extractor,
            state: ExtractorState::new(),
            announcer,
            interval,
        }
    }

    pub fn extractor(&self) -> &DayExtractor {
        &self.extractor
    }

    /// Perform one poll: read the file, compute the snapshot, and announce
    /// when the day differs from the last recorded one.
    ///
    /// Returns the snapshot when a change was announced, `None` when the
    /// day is unchanged. Errors are terminal for the session.
    pub fn poll_once(&mut self) -> Result<Option<WorldSnapshot>, ReadError> {
        let snapshot = self.extractor.read(&mut self.state)?;
        if self.state.record(snapshot.day) {
            self.announcer.announce(&snapshot, self.extractor.format());
            Ok(Some(snapshot))
        } else {
            debug!(day = snapshot.day, "day unchanged");
            Ok(None)
        }
    }

    /// Run the poll loop until shutdown or a read failure.
    ///
    /// The first poll fires immediately; subsequent polls fire every
    /// `interval`. A `ReadError` ends the loop with `Err`; a shutdown
    /// signal ends it with `Ok(())`.
    pub async fn run(mut self, shutdown: ShutdownSignal) -> Result<(), ReadError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = shutdown.subscribe();

        info!(
            path = %self.extractor.path().display(),
            format = ?self.extractor.format(),
            interval_secs = self.interval.as_secs(),
            "watching level file"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll_once() {
                        Ok(Some(snapshot)) => {
                            debug!(day = snapshot.day, world = %snapshot.world_name, "day change announced");
                        }
                        Ok(None) => {}
                        Err(err) => {
                            error!(path = %self.extractor.path().display(), error = %err, "read failed, stopping watch");
                            return Err(err);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("watch loop stopped");
                    return Ok(());
                }
            }
        }
    }
}
