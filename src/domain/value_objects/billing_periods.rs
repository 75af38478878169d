use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A date range with an optional open end, as used by subscription windows,
/// pauses and blocks. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if date < self.start {
            return false;
        }
        match self.end {
            Some(end) => date <= end,
            None => true,
        }
    }

    /// Clips the interval to a closed window, returning the overlapping part.
    fn clip(&self, window_start: NaiveDate, window_end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start.max(window_start);
        let end = match self.end {
            Some(end) => end.min(window_end),
            None => window_end,
        };

        if start > end { None } else { Some((start, end)) }
    }
}

/// True when the date falls inside any of the intervals.
pub fn date_in_any(intervals: &[DateInterval], date: NaiveDate) -> bool {
    intervals.iter().any(|interval| interval.contains(date))
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((first, last))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month_bounds(year, month) {
        Some((first, last)) => (last - first).num_days() as u32 + 1,
        None => 0,
    }
}

/// The part of a calendar month a subscription should be billed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillablePeriod {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub billable_days: u32,
}

/// Clips the subscription window to the given month and subtracts the days
/// covered by pauses. Returns None when the subscription does not overlap
/// the month at all; a fully paused month comes back with zero billable days.
pub fn billable_period(
    date_start: NaiveDate,
    date_end: Option<NaiveDate>,
    pauses: &[DateInterval],
    year: i32,
    month: u32,
) -> Option<BillablePeriod> {
    let (first_day, last_day) = month_bounds(year, month)?;
    let window = DateInterval::new(date_start, date_end);
    let (period_start, period_end) = window.clip(first_day, last_day)?;

    let period_days = (period_end - period_start).num_days() + 1;

    let mut paused_days: i64 = 0;
    for pause in pauses {
        if let Some((pause_start, pause_end)) = pause.clip(period_start, period_end) {
            paused_days += (pause_end - pause_start).num_days() + 1;
        }
    }

    let billable_days = (period_days - paused_days).max(0) as u32;

    Some(BillablePeriod {
        period_start,
        period_end,
        billable_days,
    })
}

/// True when the month has at least one day inside the subscription window.
pub fn active_in_month(
    date_start: NaiveDate,
    date_end: Option<NaiveDate>,
    year: i32,
    month: u32,
) -> bool {
    match month_bounds(year, month) {
        Some((first_day, last_day)) => {
            date_start <= last_day && date_end.map_or(true, |end| end >= first_day)
        }
        None => false,
    }
}
