use crate::api::resource::Complaint;
use crate::utils::datetime;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

/// Bucket granularity for trend charts.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrendPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl TrendPeriod {
    pub fn buckets(&self) -> u32 {
        match self {
            TrendPeriod::Daily => 7,
            TrendPeriod::Weekly => 4,
            TrendPeriod::Monthly => 12,
        }
    }

    pub fn parse(raw: &str) -> Option<TrendPeriod> {
        match raw.trim().to_lowercase().as_str() {
            "daily" => Some(TrendPeriod::Daily),
            "weekly" => Some(TrendPeriod::Weekly),
            "monthly" => Some(TrendPeriod::Monthly),
            _ => None,
        }
    }

    /// The day `steps` buckets before `now`.
    ///
    fn step_back(&self, now: DateTime<Utc>, steps: u32) -> DateTime<Utc> {
        match self {
            TrendPeriod::Daily => now - Duration::days(i64::from(steps)),
            TrendPeriod::Weekly => now - Duration::days(i64::from(steps) * 7),
            TrendPeriod::Monthly => now.checked_sub_months(Months::new(steps)).unwrap_or(now),
        }
    }

    fn label(&self, day: NaiveDate) -> String {
        match self {
            TrendPeriod::Daily => day.format("%a").to_string(),
            TrendPeriod::Weekly => format!("Week {}", (day.day() + 6) / 7),
            TrendPeriod::Monthly => day.format("%b").to_string(),
        }
    }
}

/// One point of a trend chart.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    pub date: String,
    pub count: usize,
    pub label: String,
}

/// Trend buckets, oldest first, ending at `now`.
///
/// Each bucket counts complaints created on exactly that calendar day (UTC),
/// for every period kind. Weekly and monthly buckets are therefore samples of
/// a single day, not sums over the week or month.
pub fn trend(complaints: &[Complaint], period: TrendPeriod, now: DateTime<Utc>) -> Vec<TrendBucket> {
    let created: Vec<NaiveDate> = complaints
        .iter()
        .filter_map(|c| datetime::parse_timestamp(&c.created_at))
        .map(|at| at.date_naive())
        .collect();

    (0..period.buckets())
        .rev()
        .map(|steps| {
            let day = period.step_back(now, steps).date_naive();
            TrendBucket {
                date: day.format("%Y-%m-%d").to_string(),
                count: created.iter().filter(|c| **c == day).count(),
                label: period.label(day),
            }
        })
        .collect()
}
