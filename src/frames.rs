use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::panel::Panel;

/// Display-frame driver: advances ramps and fires panel timers.
pub async fn run(panel: Arc<Mutex<Panel>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        panel.lock().await.tick(Instant::now());
    }
}
