use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MARKED_DATE_COLOR: &str = "#50cebb";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreakState {
    pub count: u32,
    pub last_check_in: Option<DateTime<Utc>>,
    pub checked_in_dates: Vec<String>,
}

/// Per-user document kept in the remote store. Field names follow the
/// document's wire format; a missing field reads as its zero value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakDocument {
    #[serde(default)]
    pub streak: u32,
    #[serde(rename = "lastDate", default, skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
    #[serde(rename = "checkedInDates", default)]
    pub checked_in_dates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInOutcome {
    FirstCheckIn,
    Continued,
    Reset,
    AlreadyCheckedInToday,
}

impl CheckInOutcome {
    pub fn changed_state(self) -> bool {
        !matches!(self, CheckInOutcome::AlreadyCheckedInToday)
    }

    pub fn message(self) -> &'static str {
        match self {
            CheckInOutcome::FirstCheckIn => "First check-in recorded.",
            CheckInOutcome::Continued => "Streak continued.",
            CheckInOutcome::Reset => "Streak restarted.",
            CheckInOutcome::AlreadyCheckedInToday => "Already checked in today!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkedDate {
    pub selected: bool,
    pub marked: bool,
    #[serde(rename = "selectedColor")]
    pub selected_color: String,
}

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub count: u32,
    pub last_check_in: Option<String>,
    pub checked_in_dates: Vec<String>,
    pub marked_dates: BTreeMap<String, MarkedDate>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub outcome: CheckInOutcome,
    pub message: String,
    pub streak: StreakResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopwatchState {
    pub elapsed_seconds: u64,
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct StopwatchResponse {
    pub elapsed_seconds: u64,
    pub running: bool,
    pub display: String,
}

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}
