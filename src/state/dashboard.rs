use super::error::StateError;
use crate::analytics::{alert_kind, metric_notifications, DashboardAnalytics, DashboardMetrics};
use crate::api::resource::Notification;
use chrono::{DateTime, Utc};
use log::*;

/// Data shown on the dashboard. Nothing here is persisted; the last
/// successful refresh of each part wins.
///
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    metrics: Option<DashboardMetrics>,
    notifications: Vec<Notification>,
    analytics: Option<DashboardAnalytics>,
    metrics_refreshed_at: Option<DateTime<Utc>>,
    notifications_refreshed_at: Option<DateTime<Utc>>,
    analytics_refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        DashboardState::default()
    }

    pub fn metrics(&self) -> Option<&DashboardMetrics> {
        self.metrics.as_ref()
    }

    /// Store fresh metrics and put the alerts they trigger on top, in place
    /// of the alerts raised by the previous metrics. An alert of a kind that
    /// was already read stays read.
    ///
    pub fn set_metrics(&mut self, metrics: DashboardMetrics, now: DateTime<Utc>) -> &mut Self {
        let mut alerts = metric_notifications(&metrics, now);
        if !alerts.is_empty() {
            debug!("Metrics raised {} notification(s)", alerts.len());
        }
        let (previous, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.notifications)
            .into_iter()
            .partition(|n| alert_kind(n).is_some());
        for alert in alerts.iter_mut() {
            alert.is_read = previous
                .iter()
                .any(|old| old.is_read && alert_kind(old) == alert_kind(alert));
        }
        alerts.extend(rest);
        self.notifications = alerts;
        self.metrics = Some(metrics);
        self.metrics_refreshed_at = Some(now);
        self
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    /// Replace the backend notifications, keeping locally raised alerts
    /// at the top as they are.
    ///
    pub fn set_notifications(
        &mut self,
        notifications: Vec<Notification>,
        now: DateTime<Utc>,
    ) -> &mut Self {
        let mut merged: Vec<Notification> = std::mem::take(&mut self.notifications)
            .into_iter()
            .filter(|n| alert_kind(n).is_some())
            .collect();
        merged.extend(notifications);
        self.notifications = merged;
        self.notifications_refreshed_at = Some(now);
        self
    }

    pub fn mark_read(&mut self, id: &str) -> Result<&mut Self, StateError> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StateError::NotificationNotFound { id: id.to_string() })?;
        notification.is_read = true;
        Ok(self)
    }

    pub fn mark_all_read(&mut self) -> &mut Self {
        self.notifications.iter_mut().for_each(|n| n.is_read = true);
        self
    }

    pub fn analytics(&self) -> Option<&DashboardAnalytics> {
        self.analytics.as_ref()
    }

    pub fn set_analytics(&mut self, analytics: DashboardAnalytics, now: DateTime<Utc>) -> &mut Self {
        self.analytics = Some(analytics);
        self.analytics_refreshed_at = Some(now);
        self
    }

    /// Most recent successful refresh of any part.
    ///
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        [
            self.metrics_refreshed_at,
            self.notifications_refreshed_at,
            self.analytics_refreshed_at,
        ]
        .into_iter()
        .flatten()
        .max()
    }
}
