use super::metrics::DashboardMetrics;
use crate::api::resource::{Notification, NotificationType, Priority};
use crate::utils::datetime;
use chrono::{DateTime, Utc};

const RESOLUTION_RATE_THRESHOLD: f64 = 80.0;
const RESPONSE_TIME_THRESHOLD: f64 = 4.0;

const CRITICAL: &str = "critical";
const RESOLUTION: &str = "resolution";
const RESPONSE: &str = "response";

/// Alerts raised by threshold checks on freshly computed metrics, most
/// severe first. They are never sent to the backend.
///
pub fn metric_notifications(metrics: &DashboardMetrics, now: DateTime<Utc>) -> Vec<Notification> {
    let stamp = now.timestamp_millis();
    let created_at = datetime::to_iso(now);
    let alert = |id: String, title: &str, message: String, kind, priority| Notification {
        id,
        title: title.to_string(),
        message,
        kind,
        priority,
        is_read: false,
        created_at: created_at.clone(),
        related_complaint_id: None,
        action_required: true,
    };

    let mut alerts = Vec::new();
    if metrics.complaints.critical > 0 {
        alerts.push(alert(
            format!("{}-{}", CRITICAL, stamp),
            "Critical Complaints Alert",
            format!(
                "You have {} critical complaints requiring immediate attention.",
                metrics.complaints.critical
            ),
            NotificationType::Error,
            Priority::Critical,
        ));
    }
    if metrics.performance.resolution_rate < RESOLUTION_RATE_THRESHOLD {
        alerts.push(alert(
            format!("{}-{}", RESOLUTION, stamp),
            "Low Resolution Rate",
            format!(
                "Resolution rate is {}%. Consider reviewing processes.",
                metrics.performance.resolution_rate
            ),
            NotificationType::Warning,
            Priority::High,
        ));
    }
    if metrics.performance.response_time > RESPONSE_TIME_THRESHOLD {
        alerts.push(alert(
            format!("{}-{}", RESPONSE, stamp),
            "High Response Time",
            format!(
                "Average response time is {}h. Target is under 2h.",
                metrics.performance.response_time
            ),
            NotificationType::Warning,
            Priority::Medium,
        ));
    }
    alerts
}

/// Kind of a locally raised metric alert, or `None` for anything that came
/// from the backend.
///
pub fn alert_kind(notification: &Notification) -> Option<&'static str> {
    if !notification.action_required {
        return None;
    }
    let (kind, stamp) = notification.id.split_once('-')?;
    if stamp.is_empty() || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    [CRITICAL, RESOLUTION, RESPONSE].into_iter().find(|k| *k == kind)
}
