use crate::models::StopwatchState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

const TICK_PERIOD: Duration = Duration::from_secs(1);

pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Handle to the running tick task. Dropping it stops the ticks.
struct Ticker(JoinHandle<()>);

impl Ticker {
    fn spawn(state: Arc<Mutex<StopwatchState>>, period: Duration) -> Self {
        Self(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut state = state.lock().await;
                if !state.running {
                    break;
                }
                state.elapsed_seconds = state.elapsed_seconds.saturating_add(1);
            }
        }))
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct Stopwatch {
    state: Arc<Mutex<StopwatchState>>,
    ticker: Option<Ticker>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StopwatchState::default())),
            ticker: None,
        }
    }

    pub async fn snapshot(&self) -> StopwatchState {
        *self.state.lock().await
    }

    pub async fn start(&mut self) -> StopwatchState {
        let mut state = self.state.lock().await;
        if !state.running {
            state.running = true;
            self.ticker = Some(Ticker::spawn(Arc::clone(&self.state), TICK_PERIOD));
            debug!(elapsed = state.elapsed_seconds, "stopwatch started");
        }
        *state
    }

    pub async fn pause(&mut self) -> StopwatchState {
        let mut state = self.state.lock().await;
        state.running = false;
        self.ticker = None;
        debug!(elapsed = state.elapsed_seconds, "stopwatch paused");
        *state
    }

    pub async fn toggle(&mut self) -> StopwatchState {
        if self.snapshot().await.running {
            self.pause().await
        } else {
            self.start().await
        }
    }

    pub async fn reset(&mut self) -> StopwatchState {
        let mut state = self.state.lock().await;
        self.ticker = None;
        *state = StopwatchState::default();
        debug!("stopwatch reset");
        *state
    }
}
