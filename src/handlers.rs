use crate::errors::AppError;
use crate::models::{
    CheckInOutcome, CheckInResponse, NoticeQuery, StopwatchResponse, StopwatchState, StreakResponse,
    StreakState,
};
use crate::state::AppState;
use crate::stopwatch::format_elapsed;
use crate::streak::{iso_instant, marked_dates};
use crate::ui::{render_streak_page, render_timer_page};
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Json,
};
use chrono::Local;

const ALREADY_NOTICE: &str = "already";

pub async fn index(State(state): State<AppState>, Query(query): Query<NoticeQuery>) -> Html<String> {
    let streak = state.streak.snapshot().await;
    let notice = query
        .notice
        .as_deref()
        .filter(|notice| *notice == ALREADY_NOTICE)
        .map(|_| CheckInOutcome::AlreadyCheckedInToday.message());
    Html(render_streak_page(&streak, Local::now().date_naive(), notice))
}

pub async fn check_in_form(State(state): State<AppState>) -> Redirect {
    let (outcome, _) = state.streak.check_in().await;
    if outcome.changed_state() {
        Redirect::to("/")
    } else {
        Redirect::to(&format!("/?notice={ALREADY_NOTICE}"))
    }
}

pub async fn get_streak(State(state): State<AppState>) -> Json<StreakResponse> {
    Json(to_response(&state.streak.snapshot().await))
}

pub async fn check_in(State(state): State<AppState>) -> Json<CheckInResponse> {
    let (outcome, streak) = state.streak.check_in().await;
    Json(CheckInResponse {
        outcome,
        message: outcome.message().to_string(),
        streak: to_response(&streak),
    })
}

pub async fn timer_page(State(state): State<AppState>) -> Html<String> {
    let stopwatch = state.stopwatch.lock().await.snapshot().await;
    Html(render_timer_page(&stopwatch))
}

pub async fn timer_toggle_form(State(state): State<AppState>) -> Redirect {
    state.stopwatch.lock().await.toggle().await;
    Redirect::to("/timer")
}

pub async fn timer_reset_form(State(state): State<AppState>) -> Redirect {
    state.stopwatch.lock().await.reset().await;
    Redirect::to("/timer")
}

pub async fn get_stopwatch(State(state): State<AppState>) -> Json<StopwatchResponse> {
    let stopwatch = state.stopwatch.lock().await.snapshot().await;
    Json(to_stopwatch_response(stopwatch))
}

pub async fn stopwatch_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<Json<StopwatchResponse>, AppError> {
    let mut stopwatch = state.stopwatch.lock().await;
    let updated = match action.as_str() {
        "start" => stopwatch.start().await,
        "pause" => stopwatch.pause().await,
        "toggle" => stopwatch.toggle().await,
        "reset" => stopwatch.reset().await,
        _ => {
            return Err(AppError::bad_request(
                "action must be 'start', 'pause', 'toggle' or 'reset'",
            ))
        }
    };
    Ok(Json(to_stopwatch_response(updated)))
}

fn to_response(streak: &StreakState) -> StreakResponse {
    StreakResponse {
        count: streak.count,
        last_check_in: streak.last_check_in.as_ref().map(iso_instant),
        checked_in_dates: streak.checked_in_dates.clone(),
        marked_dates: marked_dates(streak),
    }
}

fn to_stopwatch_response(stopwatch: StopwatchState) -> StopwatchResponse {
    StopwatchResponse {
        elapsed_seconds: stopwatch.elapsed_seconds,
        running: stopwatch.running,
        display: format_elapsed(stopwatch.elapsed_seconds),
    }
}
