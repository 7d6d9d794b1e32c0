use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, trace};

use crate::poll::PollCycle;

const LOG_TARGET: &str = "board_watch::scheduler";

/// Fires [`PollCycle::tick`] on a fixed cadence.
///
/// Every tick runs on its own task so a slow cycle does not hold up the
/// timer; the cycle itself drops ticks that overlap a running one.
pub struct PollScheduler {
    cycle: Arc<PollCycle>,
    period: Duration,
}

impl PollScheduler {
    pub fn new(cycle: Arc<PollCycle>, period: Duration) -> Self {
        Self { cycle, period }
    }

    /// Run forever. The first tick fires immediately.
    #[instrument(name = "poll-scheduler", skip(self), fields(period_secs = self.period.as_secs()))]
    pub async fn run(self) {
        info!(target: LOG_TARGET, "Starting poll scheduler");
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            trace!(target: LOG_TARGET, "Woke up");

            let cycle = self.cycle.clone();
            tokio::spawn(async move {
                cycle.tick().await;
            });
        }
    }
}
