//! Payloads for operations the backend does not implement. They are built
//! locally from constants or from other backend data.

use super::client::ApiResponse;
use crate::analytics::number_or;
use crate::api::resource::Role;
use crate::utils::datetime;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Default settings, grouped the way the settings screen shows them.
///
pub fn settings() -> Value {
    json!({
        "general": {
            "siteName": "Ethiopian Electric Utility",
            "language": "en",
            "timezone": "Africa/Addis_Ababa",
            "dateFormat": "DD/MM/YYYY",
            "currency": "ETB"
        },
        "notifications": {
            "emailEnabled": true,
            "smsEnabled": false,
            "pushEnabled": true,
            "frequency": "immediate"
        },
        "security": {
            "sessionTimeout": 30,
            "passwordPolicy": "strong",
            "twoFactorAuth": false,
            "loginAttempts": 3
        },
        "system": {
            "maintenanceMode": false,
            "debugMode": false,
            "logLevel": "info",
            "backupFrequency": "daily"
        }
    })
}

/// Read/write/delete grant on one resource.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
}

impl Permission {
    const NONE: Permission = Permission {
        read: false,
        write: false,
        delete: false,
    };
    const READ: Permission = Permission {
        read: true,
        write: false,
        delete: false,
    };
    const READ_WRITE: Permission = Permission {
        read: true,
        write: true,
        delete: false,
    };
    const ALL: Permission = Permission {
        read: true,
        write: true,
        delete: true,
    };
}

/// Resources covered by the permission matrix, in display order.
pub const RESOURCES: [&str; 6] = [
    "dashboard",
    "users",
    "complaints",
    "reports",
    "settings",
    "analytics",
];

/// Grants for `role`, one per entry of [`RESOURCES`].
///
pub fn role_permissions(role: Role) -> [Permission; 6] {
    use Permission as P;
    match role {
        Role::Admin => [P::ALL, P::ALL, P::ALL, P::ALL, P::ALL, P::READ_WRITE],
        Role::Manager => [
            P::READ_WRITE,
            P::READ_WRITE,
            P::READ_WRITE,
            P::READ_WRITE,
            P::READ,
            P::READ,
        ],
        Role::Foreman => [P::READ, P::READ, P::READ_WRITE, P::READ, P::NONE, P::READ],
        Role::CallAttendant | Role::Technician => {
            [P::READ, P::NONE, P::READ_WRITE, P::NONE, P::NONE, P::NONE]
        }
        Role::Customer => [P::NONE; 6],
    }
}

/// Staff permission matrix keyed by role and then resource. Customers have
/// no staff grants and are left out.
///
pub fn permission_matrix() -> Value {
    let matrix: Map<String, Value> = Role::ALL
        .into_iter()
        .filter(|role| *role != Role::Customer)
        .map(|role| {
            let grants: Map<String, Value> = RESOURCES
                .iter()
                .zip(role_permissions(role))
                .map(|(resource, permission)| {
                    (resource.to_string(), json!(permission))
                })
                .collect();
            (role.as_str().to_string(), Value::Object(grants))
        })
        .collect();
    Value::Object(matrix)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReportFilters {
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    pub priorities: Vec<String>,
}

/// A generated report descriptor.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub generated_at: String,
    pub generated_by: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub format: String,
    pub period: ReportPeriod,
    pub filters: ReportFilters,
}

pub fn download_url(report_id: &str) -> String {
    format!("/api/reports/{}/download", report_id)
}

struct ReportSeed {
    title: &'static str,
    kind: &'static str,
    description: &'static str,
    hours_ago: i64,
    generated_by: &'static str,
    status: &'static str,
    size: Option<&'static str>,
    format: &'static str,
    period_days: i64,
    regions: &'static [&'static str],
    categories: &'static [&'static str],
    priorities: &'static [&'static str],
}

const REPORT_SEEDS: [ReportSeed; 5] = [
    ReportSeed {
        title: "Monthly Complaints Summary",
        kind: "summary",
        description: "Summary of all complaints for the current month",
        hours_ago: 2,
        generated_by: "System Administrator",
        status: "ready",
        size: Some("2.4 MB"),
        format: "pdf",
        period_days: 30,
        regions: &[],
        categories: &[],
        priorities: &[],
    },
    ReportSeed {
        title: "Regional Performance Analysis",
        kind: "regional",
        description: "Performance metrics broken down by region",
        hours_ago: 4,
        generated_by: "Regional Manager",
        status: "ready",
        size: Some("1.8 MB"),
        format: "excel",
        period_days: 90,
        regions: &["Addis Ababa", "Oromia"],
        categories: &[],
        priorities: &[],
    },
    ReportSeed {
        title: "Performance Metrics Dashboard",
        kind: "performance",
        description: "Key performance indicators and metrics",
        hours_ago: 6,
        generated_by: "Data Analyst",
        status: "ready",
        size: Some("3.2 MB"),
        format: "pdf",
        period_days: 7,
        regions: &[],
        categories: &["Power Outage", "Billing"],
        priorities: &["high", "critical"],
    },
    ReportSeed {
        title: "Detailed Analytics Report",
        kind: "analytics",
        description: "Comprehensive analytics and trends analysis",
        hours_ago: 8,
        generated_by: "Analytics Team",
        status: "generating",
        size: None,
        format: "excel",
        period_days: 60,
        regions: &[],
        categories: &[],
        priorities: &[],
    },
    ReportSeed {
        title: "Detailed Complaint Report",
        kind: "detailed",
        description: "Detailed breakdown of all complaint data",
        hours_ago: 12,
        generated_by: "Operations Manager",
        status: "failed",
        size: None,
        format: "csv",
        period_days: 14,
        regions: &["Tigray", "Amhara"],
        categories: &["Power Outage"],
        priorities: &["critical"],
    },
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// The fixed report list, timestamped relative to `now`. Only ready
/// reports carry a download link and size.
///
pub fn reports(now: DateTime<Utc>) -> Vec<Report> {
    REPORT_SEEDS
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let id = format!("RPT-{:03}", index + 1);
            let ready = seed.status == "ready";
            Report {
                title: seed.title.to_string(),
                kind: seed.kind.to_string(),
                description: seed.description.to_string(),
                generated_at: datetime::to_iso(now - Duration::hours(seed.hours_ago)),
                generated_by: seed.generated_by.to_string(),
                status: seed.status.to_string(),
                download_url: ready.then(|| download_url(&id)),
                size: seed.size.map(str::to_string),
                format: seed.format.to_string(),
                period: ReportPeriod {
                    start: datetime::to_iso(now - Duration::days(seed.period_days)),
                    end: datetime::to_iso(now),
                },
                filters: ReportFilters {
                    regions: owned(seed.regions),
                    categories: owned(seed.categories),
                    priorities: owned(seed.priorities),
                },
                id,
            }
        })
        .collect()
}

/// A quick report, ready immediately. The caller's fields are kept; `id`
/// defaults to `report_<millis>`.
///
pub fn create_report(report: &Map<String, Value>, now: DateTime<Utc>) -> ApiResponse<Value> {
    let id = report
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("report_{}", now.timestamp_millis()));

    let mut data = report.clone();
    data.insert("id".to_string(), json!(id));
    data.insert("status".to_string(), json!("ready"));
    data.insert("downloadUrl".to_string(), json!(download_url(&id)));
    data.insert("size".to_string(), json!("1.2 MB"));
    ApiResponse::ok(Value::Object(data)).with_message("Report generated successfully")
}

pub fn download_report(report_id: &str) -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "downloadUrl": download_url(report_id) }))
        .with_message("Download URL generated")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Efficiency,
    Speed,
    Satisfaction,
    Quality,
}

/// One KPI card.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    pub id: &'static str,
    pub title: &'static str,
    pub value: f64,
    pub target: f64,
    pub unit: &'static str,
    pub trend: TrendDirection,
    pub trend_value: i32,
    pub description: &'static str,
    pub category: MetricCategory,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub metrics: Vec<PerformanceMetric>,
    pub team_performance: Vec<Value>,
}

/// KPI cards derived from a `getDashboardStats` payload. Missing or zero
/// values take the documented defaults.
///
pub fn performance_metrics(stats: &Value) -> PerformanceReport {
    let performance = |key: &str, default: f64| {
        number_or(stats.get("performance").and_then(|p| p.get(key)), default)
    };
    let metric = |id, title, value, target, unit, trend, trend_value, description, category| {
        PerformanceMetric {
            id,
            title,
            value,
            target,
            unit,
            trend,
            trend_value,
            description,
            category,
        }
    };

    PerformanceReport {
        metrics: vec![
            metric(
                "resolution-efficiency",
                "Resolution Efficiency",
                performance("resolutionRate", 85.0),
                90.0,
                "%",
                TrendDirection::Up,
                5,
                "Percentage of complaints resolved successfully",
                MetricCategory::Efficiency,
            ),
            metric(
                "response-time",
                "Average Response Time",
                performance("averageResponseTime", 2.5),
                2.0,
                "hours",
                TrendDirection::Down,
                -15,
                "Average time to first response",
                MetricCategory::Speed,
            ),
            metric(
                "customer-satisfaction",
                "Customer Satisfaction",
                performance("customerSatisfaction", 4.2),
                4.5,
                "/5",
                TrendDirection::Up,
                7,
                "Average customer satisfaction rating",
                MetricCategory::Satisfaction,
            ),
            metric(
                "quality-score",
                "Quality Score",
                performance("qualityScore", 92.0),
                95.0,
                "%",
                TrendDirection::Up,
                2,
                "Overall service quality score",
                MetricCategory::Quality,
            ),
        ],
        team_performance: stats
            .get("teamPerformance")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_matrix_shape() {
        let matrix = permission_matrix();
        let roles = matrix.as_object().unwrap();
        assert_eq!(roles.len(), 5);
        assert!(!roles.contains_key("customer"));
        assert_eq!(
            matrix["admin"]["analytics"],
            json!({ "read": true, "write": true, "delete": false })
        );
        assert_eq!(matrix["manager"]["settings"]["write"], json!(false));
        assert_eq!(matrix["foreman"]["complaints"]["write"], json!(true));
        assert_eq!(matrix["call-attendant"]["users"]["read"], json!(false));
        assert_eq!(matrix["technician"]["dashboard"]["read"], json!(true));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = settings();
        assert_eq!(settings["general"]["timezone"], json!("Africa/Addis_Ababa"));
        assert_eq!(settings["security"]["loginAttempts"], json!(3));
        assert_eq!(settings["system"]["backupFrequency"], json!("daily"));
    }

    #[test]
    fn test_fixed_reports() {
        let now = datetime::parse_timestamp("2024-08-14T12:00:00Z").unwrap();
        let reports = reports(now);
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[0].id, "RPT-001");
        assert_eq!(reports[0].generated_at, "2024-08-14T10:00:00.000Z");
        assert_eq!(
            reports[1].download_url.as_deref(),
            Some("/api/reports/RPT-002/download")
        );
        assert_eq!(reports[3].status, "generating");
        assert_eq!(reports[3].download_url, None);
        assert_eq!(reports[4].filters.regions, vec!["Tigray", "Amhara"]);

        let value = serde_json::to_value(&reports[3]).unwrap();
        assert_eq!(value["type"], json!("analytics"));
        assert!(value.get("downloadUrl").is_none());
    }

    #[test]
    fn test_create_report_keeps_fields() {
        let now = datetime::parse_timestamp("2024-08-14T12:00:00Z").unwrap();
        let request = json!({ "title": "Quick summary", "format": "pdf" });
        let response = create_report(request.as_object().unwrap(), now);
        let data = response.data.unwrap();
        assert_eq!(data["id"], json!(format!("report_{}", now.timestamp_millis())));
        assert_eq!(data["title"], json!("Quick summary"));
        assert_eq!(data["status"], json!("ready"));
        assert_eq!(data["size"], json!("1.2 MB"));
        assert_eq!(
            response.message.as_deref(),
            Some("Report generated successfully")
        );

        let request = json!({ "id": "R-7" });
        let data = create_report(request.as_object().unwrap(), now).data.unwrap();
        assert_eq!(data["downloadUrl"], json!("/api/reports/R-7/download"));
    }

    #[test]
    fn test_performance_metrics_defaults() {
        let report = performance_metrics(&json!({
            "performance": { "resolutionRate": 77, "customerSatisfaction": 0 },
            "teamPerformance": [{ "name": "North" }],
        }));
        assert_eq!(report.metrics.len(), 4);
        assert_eq!(report.metrics[0].value, 77.0);
        assert_eq!(report.metrics[1].value, 2.5);
        assert_eq!(report.metrics[1].trend, TrendDirection::Down);
        assert_eq!(report.metrics[2].value, 4.2);
        assert_eq!(report.metrics[3].value, 92.0);
        assert_eq!(report.team_performance.len(), 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metrics"][1]["trendValue"], json!(-15));
        assert_eq!(value["metrics"][3]["category"], json!("quality"));
    }
}
