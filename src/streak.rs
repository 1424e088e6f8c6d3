use crate::models::{CheckInOutcome, MARKED_DATE_COLOR, MarkedDate, StreakState};
use crate::storage::StreakStore;
use chrono::{DateTime, Local, NaiveTime, SecondsFormat, TimeZone, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Upper bound on the gap between two consecutive check-in days. Wider than
/// 24h so a DST shift does not break a streak.
const ADJACENT_DAY_TOLERANCE_MS: i64 = 36 * 60 * 60 * 1000;

pub fn is_yesterday<Tz: TimeZone>(later: &DateTime<Tz>, earlier: &DateTime<Tz>) -> bool {
    let diff = later.timestamp_millis() - earlier.timestamp_millis();
    diff > 0 && diff < ADJACENT_DAY_TOLERANCE_MS
}

/// Local midnight of the day containing `instant`, in the instant's own zone.
pub fn start_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = instant.date_naive().and_time(NaiveTime::MIN);
    instant
        .timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| instant.clone())
}

/// Applies one check-in at `now` to `state`.
///
/// Returns [`CheckInOutcome::AlreadyCheckedInToday`] without touching the
/// state when the last check-in falls on the same local day. A gap of more
/// than one day, or a last check-in in the future, restarts the streak and
/// drops the earlier dates.
pub fn check_in<Tz: TimeZone>(state: &mut StreakState, now: &DateTime<Tz>) -> CheckInOutcome {
    let today = start_of_day(now);
    let today_key = date_key(&today);

    let outcome = match state.last_check_in {
        None => CheckInOutcome::FirstCheckIn,
        Some(last) => {
            let last = start_of_day(&last.with_timezone(&now.timezone()));
            if today == last {
                return CheckInOutcome::AlreadyCheckedInToday;
            }
            if is_yesterday(&today, &last) {
                CheckInOutcome::Continued
            } else {
                CheckInOutcome::Reset
            }
        }
    };

    if outcome == CheckInOutcome::Continued {
        state.count = state.count.saturating_add(1);
        if !state.checked_in_dates.contains(&today_key) {
            state.checked_in_dates.push(today_key);
        }
    } else {
        state.count = 1;
        state.checked_in_dates = vec![today_key];
    }
    state.last_check_in = Some(today.with_timezone(&Utc));

    outcome
}

pub fn marked_dates(state: &StreakState) -> BTreeMap<String, MarkedDate> {
    state
        .checked_in_dates
        .iter()
        .map(|date| {
            (
                date.clone(),
                MarkedDate {
                    selected: true,
                    marked: true,
                    selected_color: MARKED_DATE_COLOR.to_string(),
                },
            )
        })
        .collect()
}

/// ISO-8601 instant with millisecond precision, e.g. `2024-01-10T00:00:00.000Z`.
pub fn iso_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn date_key<Tz: TimeZone>(day: &DateTime<Tz>) -> String {
    day.date_naive().format("%Y-%m-%d").to_string()
}

/// In-memory streak for the configured user, written through to the store
/// after every change.
pub struct StreakEngine {
    state: Mutex<StreakState>,
    save_lock: Mutex<()>,
    store: StreakStore,
}

impl StreakEngine {
    pub async fn load(store: StreakStore) -> Self {
        let state = store.load().await;
        info!(
            count = state.count,
            dates = state.checked_in_dates.len(),
            "loaded streak"
        );
        Self {
            state: Mutex::new(state),
            save_lock: Mutex::new(()),
            store,
        }
    }

    pub async fn snapshot(&self) -> StreakState {
        self.state.lock().await.clone()
    }

    pub async fn check_in(&self) -> (CheckInOutcome, StreakState) {
        self.check_in_at(Local::now()).await
    }

    /// The transition runs under the state lock, so a second check-in for the
    /// same day always observes the first. The save lock is taken before the
    /// state lock is released: saves land in transition order while readers
    /// only wait for the transition itself.
    #[instrument(skip_all)]
    pub async fn check_in_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> (CheckInOutcome, StreakState) {
        let mut state = self.state.lock().await;
        let outcome = check_in(&mut state, &now);
        let updated = state.clone();

        if !outcome.changed_state() {
            info!("already checked in today");
            return (outcome, updated);
        }

        info!(?outcome, count = updated.count, "check-in recorded");
        let _save_guard = self.save_lock.lock().await;
        drop(state);

        if let Some(last) = updated.last_check_in {
            self.store
                .save(updated.count, &updated.checked_in_dates, &iso_instant(&last))
                .await;
        }

        (outcome, updated)
    }
}
