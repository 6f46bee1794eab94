use super::metrics::number_or;
use super::trend::{trend, TrendBucket, TrendPeriod};
use super::{by_category, by_priority, by_region, by_status, percentage, top, Distribution};
use crate::api::resource::{Complaint, Status};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_complaints: usize,
    pub resolved_complaints: usize,
    pub pending_complaints: usize,
    pub average_resolution_time: f64,
    pub customer_satisfaction: f64,
    pub response_time: f64,
    pub resolution_rate: u32,
    pub escalation_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub complaints_over_time: Vec<TrendBucket>,
    pub resolution_time_over_time: Vec<TrendBucket>,
    pub satisfaction_over_time: Vec<TrendBucket>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub by_category: Vec<Distribution>,
    pub by_region: Vec<Distribution>,
    pub by_priority: Vec<Distribution>,
    pub by_status: Vec<Distribution>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPerformance {
    pub team_metrics: Vec<Value>,
    pub channel_metrics: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Insights {
    pub trends: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Analytics page payload. The backend has no analytics action, so this is
/// derived from dashboard stats plus the complaint list.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub overview: Overview,
    pub trends: Trends,
    pub breakdown: Breakdown,
    pub performance: TeamPerformance,
    pub insights: Insights,
}

impl Analytics {
    /// All-zero analytics, returned when the inputs could not be fetched.
    ///
    pub fn empty() -> Analytics {
        Analytics::default()
    }

    pub fn build(stats: &Value, complaints: &[Complaint], now: DateTime<Utc>) -> Analytics {
        let performance = |key: &str, default: f64| {
            number_or(stats.get("performance").and_then(|p| p.get(key)), default)
        };
        let total = complaints.len();
        let resolved = complaints
            .iter()
            .filter(|c| c.status == Status::Resolved)
            .count();
        let pending = complaints
            .iter()
            .filter(|c| matches!(c.status, Status::Pending | Status::Open))
            .count();

        Analytics {
            overview: Overview {
                total_complaints: total,
                resolved_complaints: resolved,
                pending_complaints: pending,
                average_resolution_time: performance("averageResolutionTime", 2.5),
                customer_satisfaction: performance("customerSatisfaction", 4.2),
                response_time: performance("responseTime", 1.8),
                resolution_rate: percentage(resolved, total),
                escalation_rate: performance("escalationRate", 15.0),
            },
            trends: Trends {
                complaints_over_time: trend(complaints, TrendPeriod::Daily, now),
                resolution_time_over_time: trend(complaints, TrendPeriod::Weekly, now),
                satisfaction_over_time: trend(complaints, TrendPeriod::Monthly, now),
            },
            breakdown: Breakdown {
                by_category: by_category(complaints),
                by_region: by_region(complaints),
                by_priority: by_priority(complaints),
                by_status: by_status(complaints),
            },
            performance: TeamPerformance::default(),
            insights: Insights::default(),
        }
    }
}

/// Chart data for the session dashboard.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub status_distribution: Vec<Distribution>,
    pub priority_distribution: Vec<Distribution>,
    pub region_distribution: Vec<Distribution>,
    pub category_distribution: Vec<Distribution>,
    pub monthly_trends: Vec<TrendBucket>,
    pub top_region: String,
    pub top_category: String,
}

impl DashboardAnalytics {
    pub fn build(complaints: &[Complaint], now: DateTime<Utc>) -> DashboardAnalytics {
        let region_distribution = by_region(complaints);
        let category_distribution = by_category(complaints);
        DashboardAnalytics {
            status_distribution: by_status(complaints),
            priority_distribution: by_priority(complaints),
            top_region: top(&region_distribution).unwrap_or("N/A").to_string(),
            top_category: top(&category_distribution).unwrap_or("N/A").to_string(),
            monthly_trends: trend(complaints, TrendPeriod::Monthly, now),
            region_distribution,
            category_distribution,
        }
    }
}
