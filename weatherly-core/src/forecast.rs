//! Buckets 3-hour forecast entries into calendar-day summaries.
//!
//! Days are derived in the caller's time zone. The entry for a day that is
//! seen first supplies the description and icon; later entries for the same
//! day only widen the min/max bounds. When the provider's list is not sorted
//! by time this may pick a non-representative condition, which is accepted.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::model::{DailySummary, ForecastEntry};

/// Upper bound on the number of summaries returned.
pub const MAX_FORECAST_DAYS: usize = 5;

/// Summarise `entries` per calendar day in `tz`, skipping `today`.
///
/// Output follows the order in which each date first appears in `entries`
/// and is capped at [`MAX_FORECAST_DAYS`]. No padding is added when fewer
/// days are available.
pub fn daily_summaries<Tz: TimeZone>(
    entries: &[ForecastEntry],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DailySummary> {
    let mut days: Vec<DailySummary> = Vec::new();

    for entry in entries {
        let Some(utc) = DateTime::from_timestamp(entry.timestamp, 0) else {
            continue;
        };
        let date = utc.with_timezone(tz).date_naive();

        if date == today {
            continue;
        }

        match days.iter_mut().find(|d| d.date == date) {
            Some(day) => {
                day.temp_min_c = day.temp_min_c.min(entry.temp_min_c);
                day.temp_max_c = day.temp_max_c.max(entry.temp_max_c);
            }
            None => days.push(DailySummary {
                date,
                weekday: date.format("%a").to_string(),
                temp_min_c: entry.temp_min_c,
                temp_max_c: entry.temp_max_c,
                description: entry.description.clone(),
                icon: entry.icon.clone(),
            }),
        }
    }

    days.truncate(MAX_FORECAST_DAYS);
    days
}

/// [`daily_summaries`] using the local time zone and the current local date.
pub fn daily_summaries_local(entries: &[ForecastEntry]) -> Vec<DailySummary> {
    let today = Local::now().date_naive();
    daily_summaries(entries, today, &Local)
}
