//! Step history and trend summary.
//!
//! History is a fixed sample week; only today's entry is live. The summary
//! combines both for the trends view.

use crate::DailyLogEntry;
use chrono::NaiveDate;
use once_cell::sync::Lazy;

/// Number of days listed in the recent-activity view
pub const RECENT_DAYS: usize = 5;

/// Sample history shown before today (oldest first)
pub static SAMPLE_HISTORY: Lazy<Vec<DailyLogEntry>> = Lazy::new(|| {
    [
        ((2023, 10, 24), 6_500, 250, 4.2),
        ((2023, 10, 25), 8_200, 340, 5.5),
        ((2023, 10, 26), 4_500, 180, 3.1),
        ((2023, 10, 27), 11_000, 480, 7.8),
        ((2023, 10, 28), 9_500, 410, 6.5),
        ((2023, 10, 29), 12_500, 550, 8.9),
    ]
    .into_iter()
    .filter_map(|((y, m, d), steps, calories, distance_km)| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| DailyLogEntry {
            date,
            steps,
            calories,
            distance_km,
        })
    })
    .collect()
});

/// Totals and highlights over a run of days
#[derive(Clone, Debug, PartialEq)]
pub struct HistorySummary {
    pub total_steps: u64,
    /// Whole steps per day, rounded down
    pub average_steps: u64,
    pub best_day: DailyLogEntry,
    /// Most recent days, newest first
    pub recent: Vec<DailyLogEntry>,
}

/// Summarize `history` followed by `today`
pub fn summarize(history: &[DailyLogEntry], today: DailyLogEntry) -> HistorySummary {
    let days: Vec<DailyLogEntry> = history
        .iter()
        .cloned()
        .chain(std::iter::once(today))
        .collect();

    let total_steps: u64 = days.iter().map(|d| d.steps).sum();
    let average_steps = total_steps / days.len() as u64;

    // Later days win ties
    let mut best_day = days[0].clone();
    for day in &days[1..] {
        if day.steps >= best_day.steps {
            best_day = day.clone();
        }
    }

    let recent = days.iter().rev().take(RECENT_DAYS).cloned().collect();

    tracing::debug!(
        "Summarized {} days: {} total, {} average",
        days.len(),
        total_steps,
        average_steps
    );

    HistorySummary {
        total_steps,
        average_steps,
        best_day,
        recent,
    }
}
