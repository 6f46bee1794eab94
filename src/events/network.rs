use crate::analytics::{DashboardAnalytics, DashboardMetrics};
use crate::api::{ApiService, ComplaintFilters};
use crate::state::DashboardState;
use anyhow::{anyhow, Result};
use chrono::Utc;
use log::*;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Specify different network event types.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RefreshMetrics,
    RefreshNotifications,
    RefreshAnalytics,
    RefreshAll,
    MarkNotificationRead { id: String },
    MarkAllNotificationsRead,
}

/// Specify struct for managing dashboard state with network events.
///
pub struct Handler<'a> {
    state: &'a Arc<Mutex<DashboardState>>,
    api: &'a ApiService,
    region: Option<String>,
}

impl<'a> Handler<'a> {
    /// Return new instance with reference to state.
    ///
    pub fn new(state: &'a Arc<Mutex<DashboardState>>, api: &'a ApiService) -> Self {
        Handler {
            state,
            api,
            region: None,
        }
    }

    /// Scope complaint metrics to one region.
    ///
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Handle network events by type.
    ///
    pub async fn handle(&self, event: Event) -> Result<()> {
        debug!("Processing network event '{:?}'...", event);
        match event {
            Event::RefreshMetrics => self.refresh_metrics().await?,
            Event::RefreshNotifications => self.refresh_notifications().await?,
            Event::RefreshAnalytics => self.refresh_analytics().await?,
            Event::RefreshAll => self.refresh_all().await?,
            Event::MarkNotificationRead { id } => self.mark_notification_read(id).await?,
            Event::MarkAllNotificationsRead => {
                self.state.lock().await.mark_all_read();
            }
        }
        Ok(())
    }

    /// Update state with metrics computed from the complaint list, or from
    /// the backend's dashboard stats when the list is unavailable.
    ///
    async fn refresh_metrics(&self) -> Result<()> {
        info!("Refreshing dashboard metrics...");
        let complaints = self.api.get_complaints(&ComplaintFilters::default()).await?;
        let now = Utc::now();
        let metrics = match complaints.successful_data() {
            Some(complaints) => {
                DashboardMetrics::from_complaints(complaints, self.region.as_deref(), now)
            }
            None => {
                warn!("Complaint list unavailable; using dashboard stats for metrics");
                let stats = self.api.get_dashboard_stats().await?;
                match stats.successful_data() {
                    Some(data) => DashboardMetrics::from_stats(data),
                    None => {
                        return Err(anyhow!(
                            "Dashboard stats unavailable: {}",
                            stats.error.unwrap_or_default()
                        ))
                    }
                }
            }
        };
        self.state.lock().await.set_metrics(metrics, now);
        info!("Dashboard metrics refreshed.");
        Ok(())
    }

    /// Update state with the latest notifications.
    ///
    async fn refresh_notifications(&self) -> Result<()> {
        info!("Refreshing notifications...");
        let response = self.api.get_notifications().await?;
        let notifications = response.data.unwrap_or_default();
        info!("Received {} notification(s).", notifications.len());
        self.state
            .lock()
            .await
            .set_notifications(notifications, Utc::now());
        Ok(())
    }

    /// Update state with chart data built from the complaint list.
    ///
    async fn refresh_analytics(&self) -> Result<()> {
        info!("Refreshing dashboard analytics...");
        let response = self.api.get_complaints(&ComplaintFilters::default()).await?;
        let complaints = match response.successful_data() {
            Some(complaints) => complaints,
            None => {
                return Err(anyhow!(
                    "Complaint list unavailable: {}",
                    response.error.clone().unwrap_or_default()
                ))
            }
        };
        let now = Utc::now();
        let analytics = DashboardAnalytics::build(complaints, now);
        self.state.lock().await.set_analytics(analytics, now);
        Ok(())
    }

    /// Run every refresh concurrently. Each one updates state on its own, so
    /// a failure in one leaves the others' results in place.
    ///
    async fn refresh_all(&self) -> Result<()> {
        let (metrics, notifications, analytics) = tokio::join!(
            self.refresh_metrics(),
            self.refresh_notifications(),
            self.refresh_analytics()
        );
        let failed: Vec<String> = [
            ("metrics", metrics),
            ("notifications", notifications),
            ("analytics", analytics),
        ]
        .into_iter()
        .filter_map(|(part, result)| {
            result.err().map(|e| {
                error!("Failed to refresh {}: {}", part, e);
                part.to_string()
            })
        })
        .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Refresh failed for {}", failed.join(", ")))
        }
    }

    async fn mark_notification_read(&self, id: String) -> Result<()> {
        self.state.lock().await.mark_read(&id)?;
        // Locally raised alerts are unknown to the backend.
        if let Err(e) = self.api.mark_notification_as_read(&id).await {
            warn!("Failed to mark notification {} as read: {}", id, e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use serde_json::json;

    fn demo_service() -> ApiService {
        ApiService::new("http://127.0.0.1:9/exec", true).unwrap()
    }

    #[tokio::test]
    async fn refresh_all_in_demo_mode() {
        let api = demo_service();
        let state = Arc::new(Mutex::new(DashboardState::new()));
        let handler = Handler::new(&state, &api);
        handler.handle(Event::RefreshAll).await.unwrap();

        let state = state.lock().await;
        let metrics = state.metrics().unwrap();
        assert_eq!(metrics.complaints.total, 10);
        assert_eq!(metrics.complaints.critical, 3);
        assert!(state.notifications()[0].id.starts_with("critical-"));
        assert_eq!(state.analytics().unwrap().status_distribution.len(), 7);
        assert!(state.last_refresh().is_some());
    }

    #[tokio::test]
    async fn region_scoped_metrics() {
        let api = demo_service();
        let state = Arc::new(Mutex::new(DashboardState::new()));
        let handler = Handler::new(&state, &api).with_region(Some("Oromia".to_string()));
        handler.handle(Event::RefreshMetrics).await.unwrap();
        let state = state.lock().await;
        assert_eq!(state.metrics().unwrap().complaints.total, 3);
    }

    #[tokio::test]
    async fn failed_list_falls_back_to_stats() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/exec")
                    .query_param("action", "getComplaints");
                then.status(200)
                    .json_body(json!({ "success": false, "error": "Sheet locked" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/exec")
                    .query_param("action", "getDashboardStats");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": { "totalComplaints": 42, "criticalComplaints": 0 }
                }));
            })
            .await;

        let api = ApiService::new(&server.url("/exec"), false).unwrap();
        let state = Arc::new(Mutex::new(DashboardState::new()));
        let handler = Handler::new(&state, &api);
        handler.handle(Event::RefreshMetrics).await.unwrap();
        assert_eq!(state.lock().await.metrics().unwrap().complaints.total, 42);

        // Analytics needs the list itself, so only that refresh fails.
        assert!(handler.handle(Event::RefreshAnalytics).await.is_err());
        assert!(api.mode().is_live());
    }

    #[tokio::test]
    async fn mark_read_events() {
        let api = demo_service();
        let state = Arc::new(Mutex::new(DashboardState::new()));
        let handler = Handler::new(&state, &api);
        handler.handle(Event::RefreshMetrics).await.unwrap();

        let id = state.lock().await.notifications()[0].id.clone();
        handler
            .handle(Event::MarkNotificationRead { id })
            .await
            .unwrap();
        assert!(state.lock().await.notifications()[0].is_read);

        let missing = Event::MarkNotificationRead {
            id: "missing".to_string(),
        };
        assert!(handler.handle(missing).await.is_err());
    }
}
