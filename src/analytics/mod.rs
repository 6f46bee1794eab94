//! Derived analytics over normalized complaints.
//!
//! Everything here is a pure function of its inputs plus an explicit `now`,
//! so results are never cached between calls.

mod metrics;
mod notifications;
mod overview;
mod trend;

pub use metrics::{
    ComplaintCounts, DashboardMetrics, DateWindowCounts, MetricTrends, PerformanceSummary,
    UserCounts,
};
pub(crate) use metrics::number_or;
pub use notifications::{alert_kind, metric_notifications};
pub use overview::{Analytics, Breakdown, DashboardAnalytics, Overview, Trends};
pub use trend::{trend, TrendBucket, TrendPeriod};

use crate::api::resource::Complaint;
use serde::Serialize;

/// One slice of a group-by-count breakdown.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub name: String,
    pub count: usize,
    pub percentage: u32,
}

/// `round(count / total * 100)`, or `0` for an empty population.
///
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Count occurrences of each name, keeping first-appearance order.
///
pub fn distribution<I, S>(names: I) -> Vec<Distribution>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut total = 0;
    for name in names {
        let name = name.into();
        total += 1;
        match counts.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }
    counts
        .into_iter()
        .map(|(name, count)| Distribution {
            name,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

pub fn by_status(complaints: &[Complaint]) -> Vec<Distribution> {
    distribution(complaints.iter().map(|c| c.status.as_str()))
}

pub fn by_priority(complaints: &[Complaint]) -> Vec<Distribution> {
    distribution(complaints.iter().map(|c| c.priority.as_str()))
}

pub fn by_category(complaints: &[Complaint]) -> Vec<Distribution> {
    distribution(complaints.iter().map(|c| c.category.as_str()))
}

/// Complaints without a region are grouped under `"Unknown"`.
///
pub fn by_region(complaints: &[Complaint]) -> Vec<Distribution> {
    distribution(complaints.iter().map(|c| {
        if c.region.is_empty() {
            "Unknown"
        } else {
            c.region.as_str()
        }
    }))
}

/// Name of the largest slice; ties go to the first one seen.
///
pub fn top(distribution: &[Distribution]) -> Option<&str> {
    distribution
        .iter()
        .fold(None, |best: Option<&Distribution>, slice| match best {
            Some(best) if best.count >= slice.count => Some(best),
            _ => Some(slice),
        })
        .map(|slice| slice.name.as_str())
}
