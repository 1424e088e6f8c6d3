use crate::stopwatch::Stopwatch;
use crate::streak::StreakEngine;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub streak: Arc<StreakEngine>,
    pub stopwatch: Arc<Mutex<Stopwatch>>,
}

impl AppState {
    pub fn new(streak: StreakEngine) -> Self {
        Self {
            streak: Arc::new(streak),
            stopwatch: Arc::new(Mutex::new(Stopwatch::new())),
        }
    }
}
