use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/check-in", post(handlers::check_in_form))
        .route("/timer", get(handlers::timer_page))
        .route("/timer/toggle", post(handlers::timer_toggle_form))
        .route("/timer/reset", post(handlers::timer_reset_form))
        .route("/api/streak", get(handlers::get_streak))
        .route("/api/check-in", post(handlers::check_in))
        .route("/api/stopwatch", get(handlers::get_stopwatch))
        .route("/api/stopwatch/:action", post(handlers::stopwatch_action))
        .with_state(state)
}
