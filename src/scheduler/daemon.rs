use std::{sync::Arc, time::Duration};

use chrono::{FixedOffset, Utc};
use tokio::{task::JoinHandle, time::sleep};
use tracing::info;

use crate::scheduler::{Scheduler, cadence::HourlyCadence};

/// Spawns the hourly polling daemon: sleep until the next top of the hour in
/// the report timezone, then hand the tick to the scheduler.
pub fn spawn_hourly_daemon(scheduler: Arc<Scheduler>, tz: FixedOffset) -> JoinHandle<()> {
    let cadence = HourlyCadence::new(tz);
    PollDaemon {
        scheduler,
        cadence,
        tz,
    }
    .spawn()
}

struct PollDaemon {
    scheduler: Arc<Scheduler>,
    cadence: HourlyCadence,
    tz: FixedOffset,
}

impl PollDaemon {
    fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        loop {
            let now = Utc::now();
            let next = self.cadence.next_run_from(now);
            let wait = duration_until(next, now);
            info!(
                next_run_utc = %next.to_rfc3339(),
                next_run_local = %next.with_timezone(&self.tz).to_rfc3339(),
                wait_seconds = wait.as_secs(),
                "scheduled next polling tick"
            );
            sleep(wait).await;

            let fired_at = crate::util::time::now().with_timezone(&self.tz);
            self.scheduler.run_hour(fired_at).await;
        }
    }
}

fn duration_until(next: chrono::DateTime<Utc>, now: chrono::DateTime<Utc>) -> Duration {
    match (next - now).to_std() {
        Ok(duration) => duration,
        Err(_) => Duration::from_secs(0),
    }
}
