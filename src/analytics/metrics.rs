use crate::api::resource::{Complaint, Priority, Status};
use crate::utils::datetime;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

/// Defaults used where neither complaints nor dashboard stats carry a value.
///
const DEFAULT_SATISFACTION: f64 = 4.2;
const DEFAULT_RESPONSE_TIME: f64 = 2.5;
const DEFAULT_FIRST_RESPONSE_TIME: f64 = 1.8;
const DEFAULT_RESPONSE_CHANGE: f64 = -8.0;
const DEFAULT_SATISFACTION_CHANGE: f64 = 5.0;
const DEFAULT_USERS: UserCounts = UserCounts {
    total: 150,
    active: 120,
    online: 45,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintCounts {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
    pub pending: u64,
    pub escalated: u64,
    pub cancelled: u64,
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub resolution_rate: f64,
    pub avg_resolution_time: f64,
    pub customer_satisfaction: f64,
    pub response_time: f64,
    pub first_response_time: f64,
    pub escalation_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrends {
    pub complaints_change: f64,
    pub resolution_change: f64,
    pub response_change: f64,
    pub satisfaction_change: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub online: u64,
}

/// Complaints created in each calendar window (UTC).
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindowCounts {
    pub today: u64,
    pub yesterday: u64,
    pub this_week: u64,
    pub last_week: u64,
    pub this_month: u64,
    pub last_month: u64,
    pub this_year: u64,
}

/// Headline numbers for the dashboard.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub complaints: ComplaintCounts,
    pub performance: PerformanceSummary,
    pub trends: MetricTrends,
    pub users: UserCounts,
    pub date_filters: DateWindowCounts,
}

struct Windows {
    today: DateTime<Utc>,
    yesterday: DateTime<Utc>,
    week: DateTime<Utc>,
    last_week: DateTime<Utc>,
    month: DateTime<Utc>,
    last_month: DateTime<Utc>,
    year: DateTime<Utc>,
}

impl Windows {
    fn at(now: DateTime<Utc>) -> Self {
        let today = datetime::start_of_day(now);
        let week = datetime::start_of_week(now);
        Windows {
            today,
            yesterday: today - Duration::days(1),
            week,
            last_week: week - Duration::days(7),
            month: datetime::start_of_month(now, 0),
            last_month: datetime::start_of_month(now, 1),
            year: datetime::start_of_year(now),
        }
    }
}

fn tally(scoped: &[&Complaint], pred: &dyn Fn(&Complaint) -> bool) -> u64 {
    scoped.iter().copied().filter(|c| pred(*c)).count() as u64
}

/// Created at or after `from`, and before `until` when given. Unparseable
/// timestamps fall in no window.
///
fn created_in(complaint: &Complaint, from: DateTime<Utc>, until: Option<DateTime<Utc>>) -> bool {
    datetime::parse_timestamp(&complaint.created_at)
        .map(|at| at >= from && until.map_or(true, |until| at < until))
        .unwrap_or(false)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn change(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    round2((current as f64 - previous as f64) / previous as f64 * 100.0)
}

impl DashboardMetrics {
    /// Compute metrics from the complaint list. With `region` set, only
    /// complaints in that region are counted.
    ///
    pub fn from_complaints(
        complaints: &[Complaint],
        region: Option<&str>,
        now: DateTime<Utc>,
    ) -> DashboardMetrics {
        let scoped: Vec<&Complaint> = complaints
            .iter()
            .filter(|c| region.map_or(true, |region| c.region == region))
            .collect();
        let windows = Windows::at(now);

        let count = |pred: &dyn Fn(&Complaint) -> bool| tally(&scoped, pred);

        let counts = ComplaintCounts {
            total: scoped.len() as u64,
            open: count(&|c: &Complaint| c.status == Status::Open),
            in_progress: count(&|c: &Complaint| c.status == Status::InProgress),
            resolved: count(&|c: &Complaint| c.status == Status::Resolved),
            closed: count(&|c: &Complaint| c.status == Status::Closed),
            pending: count(&|c: &Complaint| c.status == Status::Pending),
            escalated: count(&|c: &Complaint| c.status == Status::Escalated),
            cancelled: count(&|c: &Complaint| c.status == Status::Cancelled),
            critical: count(&|c: &Complaint| c.priority == Priority::Critical),
            high: count(&|c: &Complaint| c.priority == Priority::High),
            medium: count(&|c: &Complaint| c.priority == Priority::Medium),
            low: count(&|c: &Complaint| c.priority == Priority::Low),
        };

        let dates = DateWindowCounts {
            today: count(&|c: &Complaint| created_in(c, windows.today, None)),
            yesterday: count(&|c: &Complaint| created_in(c, windows.yesterday, Some(windows.today))),
            this_week: count(&|c: &Complaint| created_in(c, windows.week, None)),
            last_week: count(&|c: &Complaint| created_in(c, windows.last_week, Some(windows.week))),
            this_month: count(&|c: &Complaint| created_in(c, windows.month, None)),
            last_month: count(&|c: &Complaint| created_in(c, windows.last_month, Some(windows.month))),
            this_year: count(&|c: &Complaint| created_in(c, windows.year, None)),
        };

        let resolution_hours: Vec<f64> = scoped
            .iter()
            .filter(|c| c.status == Status::Resolved)
            .filter_map(|c| {
                let created = datetime::parse_timestamp(&c.created_at)?;
                let updated = datetime::parse_timestamp(&c.updated_at)?;
                Some((updated - created).num_seconds() as f64 / 3600.0)
            })
            .collect();
        let avg_resolution_time = if resolution_hours.is_empty() {
            0.0
        } else {
            resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64
        };

        let rate = |part: u64| {
            if counts.total == 0 {
                0.0
            } else {
                round2(part as f64 / counts.total as f64 * 100.0)
            }
        };

        let resolved_this_month = count(&|c: &Complaint| {
            c.status == Status::Resolved && created_in(c, windows.month, None)
        });
        let resolved_last_month = count(&|c: &Complaint| {
            c.status == Status::Resolved
                && created_in(c, windows.last_month, Some(windows.month))
        });

        DashboardMetrics {
            performance: PerformanceSummary {
                resolution_rate: rate(counts.resolved),
                avg_resolution_time: round2(avg_resolution_time),
                customer_satisfaction: DEFAULT_SATISFACTION,
                response_time: DEFAULT_RESPONSE_TIME,
                first_response_time: DEFAULT_FIRST_RESPONSE_TIME,
                escalation_rate: rate(counts.escalated),
            },
            trends: MetricTrends {
                complaints_change: change(dates.this_month, dates.last_month),
                resolution_change: change(resolved_this_month, resolved_last_month),
                response_change: DEFAULT_RESPONSE_CHANGE,
                satisfaction_change: DEFAULT_SATISFACTION_CHANGE,
            },
            users: DEFAULT_USERS,
            complaints: counts,
            date_filters: dates,
        }
    }

    /// Build metrics from a `getDashboardStats` payload when the complaint
    /// list is unavailable. Missing or zero values take the documented
    /// defaults.
    ///
    pub fn from_stats(data: &Value) -> DashboardMetrics {
        let count = |key: &str| data.get(key).and_then(Value::as_u64).unwrap_or(0);
        let nested = |group: &str, key: &str, default: f64| {
            number_or(data.get(group).and_then(|g| g.get(key)), default)
        };
        let users = |key: &str, default: u64| match data.get(key).and_then(Value::as_u64) {
            Some(n) if n > 0 => n,
            _ => default,
        };

        let dates = DateWindowCounts {
            today: count("todayComplaints"),
            yesterday: count("yesterdayComplaints"),
            this_week: count("weekComplaints"),
            last_week: count("lastWeekComplaints"),
            this_month: count("monthComplaints"),
            last_month: count("lastMonthComplaints"),
            this_year: count("yearComplaints"),
        };

        DashboardMetrics {
            complaints: ComplaintCounts {
                total: count("totalComplaints"),
                open: count("openComplaints"),
                in_progress: count("inProgressComplaints"),
                resolved: count("resolvedComplaints"),
                closed: count("closedComplaints"),
                pending: count("pendingComplaints"),
                escalated: count("escalatedComplaints"),
                cancelled: count("cancelledComplaints"),
                critical: count("criticalComplaints"),
                high: count("highPriorityComplaints"),
                medium: count("mediumPriorityComplaints"),
                low: count("lowPriorityComplaints"),
            },
            performance: PerformanceSummary {
                resolution_rate: nested("performance", "resolutionRate", 85.0),
                avg_resolution_time: nested("performance", "avgResolutionTime", 24.0),
                customer_satisfaction: nested(
                    "performance",
                    "customerSatisfaction",
                    DEFAULT_SATISFACTION,
                ),
                response_time: nested("performance", "responseTime", DEFAULT_RESPONSE_TIME),
                first_response_time: nested(
                    "performance",
                    "firstResponseTime",
                    DEFAULT_FIRST_RESPONSE_TIME,
                ),
                escalation_rate: nested("performance", "escalationRate", 5.0),
            },
            trends: MetricTrends {
                complaints_change: nested("trends", "complaintsChange", 5.0),
                resolution_change: nested("trends", "resolutionChange", 12.0),
                response_change: nested("trends", "responseChange", DEFAULT_RESPONSE_CHANGE),
                satisfaction_change: nested(
                    "trends",
                    "satisfactionChange",
                    DEFAULT_SATISFACTION_CHANGE,
                ),
            },
            users: UserCounts {
                total: users("totalUsers", DEFAULT_USERS.total),
                active: users("activeUsers", DEFAULT_USERS.active),
                online: users("onlineUsers", DEFAULT_USERS.online),
            },
            date_filters: dates,
        }
    }
}

/// Numeric stat, with zero and absent values replaced by `default`.
///
pub(crate) fn number_or(value: Option<&Value>, default: f64) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(n) if n != 0.0 => n,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::{Fake, Faker};
    use serde_json::json;

    fn complaint(status: Status, priority: Priority, created: &str, updated: &str) -> Complaint {
        let mut complaint: Complaint = Faker.fake();
        complaint.status = status;
        complaint.priority = priority;
        complaint.created_at = created.to_string();
        complaint.updated_at = updated.to_string();
        complaint.region = "Addis Ababa".to_string();
        complaint
    }

    fn now() -> DateTime<Utc> {
        datetime::parse_timestamp("2024-08-14T15:00:00Z").unwrap()
    }

    #[test]
    fn test_counts_and_rates() {
        let complaints = vec![
            complaint(
                Status::Resolved,
                Priority::Critical,
                "2024-08-14T09:00:00Z",
                "2024-08-14T13:00:00Z",
            ),
            complaint(
                Status::Resolved,
                Priority::High,
                "2024-08-13T09:00:00Z",
                "2024-08-13T11:00:00Z",
            ),
            complaint(
                Status::Escalated,
                Priority::High,
                "2024-07-20T09:00:00Z",
                "2024-07-21T09:00:00Z",
            ),
            complaint(
                Status::Open,
                Priority::Low,
                "2024-08-11T09:00:00Z",
                "2024-08-11T09:00:00Z",
            ),
        ];
        let metrics = DashboardMetrics::from_complaints(&complaints, None, now());
        assert_eq!(metrics.complaints.total, 4);
        assert_eq!(metrics.complaints.resolved, 2);
        assert_eq!(metrics.complaints.critical, 1);
        assert_eq!(metrics.complaints.high, 2);
        assert_eq!(metrics.performance.resolution_rate, 50.0);
        assert_eq!(metrics.performance.escalation_rate, 25.0);
        assert_eq!(metrics.performance.avg_resolution_time, 3.0);

        assert_eq!(metrics.date_filters.today, 1);
        assert_eq!(metrics.date_filters.yesterday, 1);
        // Week starts Sunday 2024-08-11.
        assert_eq!(metrics.date_filters.this_week, 3);
        assert_eq!(metrics.date_filters.this_month, 3);
        assert_eq!(metrics.date_filters.last_month, 1);
        assert_eq!(metrics.date_filters.this_year, 4);
        // 3 this month against 1 last month.
        assert_eq!(metrics.trends.complaints_change, 200.0);
        // No resolved complaints last month.
        assert_eq!(metrics.trends.resolution_change, 0.0);
    }

    #[test]
    fn test_region_scoping() {
        let mut other = complaint(
            Status::Open,
            Priority::Low,
            "2024-08-14T09:00:00Z",
            "2024-08-14T09:00:00Z",
        );
        other.region = "Tigray".to_string();
        let complaints = vec![
            other,
            complaint(
                Status::Open,
                Priority::Low,
                "2024-08-14T09:00:00Z",
                "2024-08-14T09:00:00Z",
            ),
        ];
        let metrics = DashboardMetrics::from_complaints(&complaints, Some("Tigray"), now());
        assert_eq!(metrics.complaints.total, 1);
        let metrics = DashboardMetrics::from_complaints(&complaints, None, now());
        assert_eq!(metrics.complaints.total, 2);
    }

    #[test]
    fn test_empty_complaints() {
        let metrics = DashboardMetrics::from_complaints(&[], None, now());
        assert_eq!(metrics.complaints.total, 0);
        assert_eq!(metrics.performance.resolution_rate, 0.0);
        assert_eq!(metrics.performance.avg_resolution_time, 0.0);
    }

    #[test]
    fn test_from_stats_defaults() {
        let metrics = DashboardMetrics::from_stats(&json!({
            "totalComplaints": 12,
            "criticalComplaints": 2,
            "performance": { "resolutionRate": 0, "responseTime": 5.5 },
        }));
        assert_eq!(metrics.complaints.total, 12);
        assert_eq!(metrics.complaints.critical, 2);
        assert_eq!(metrics.performance.resolution_rate, 85.0);
        assert_eq!(metrics.performance.response_time, 5.5);
        assert_eq!(metrics.performance.avg_resolution_time, 24.0);
        assert_eq!(metrics.trends.resolution_change, 12.0);
        assert_eq!(metrics.users.total, 150);
    }
}
