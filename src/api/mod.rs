//! Request dispatcher for the complaint-management backend.
//!
//! [`ApiService`] exposes one method per backend action. Transport and
//! decode failures never reach the caller: the first one switches the
//! session to demo data and every later call is answered from the
//! [`DemoStore`] until [`ApiService::reset`] is called. Only validation
//! problems and illegal status transitions are returned as errors, and
//! both are detected before anything is sent.

pub mod client;
mod demo;
mod error;
pub mod normalize;
pub mod resource;
pub mod synthesized;
pub mod transport;

pub use client::{ApiResponse, Client, Pagination};
pub use demo::{DateFilter, DemoStore, DEMO_MESSAGE};
pub use error::ApiError;
pub use transport::{Action, ActionRequest, CallStyle, TransportKind, WireRequest};

use crate::analytics::Analytics;
use crate::state::{workflow, DegradedReason, ServiceMode};
use crate::utils::datetime;
use chrono::Utc;
use log::*;
use normalize::{compact, DefaultingCounts, Normalizer};
use resource::*;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::{Mutex, PoisonError};
use synthesized::{PerformanceReport, Report};

/// Filters understood by `getComplaints`.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplaintFilters {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub region: Option<String>,
    pub date_filter: Option<DateFilter>,
    pub search: Option<String>,
}

impl ComplaintFilters {
    fn apply(&self, request: ActionRequest) -> ActionRequest {
        request
            .param("status", self.status.map(|s| s.as_str()))
            .param("priority", self.priority.map(|p| p.as_str()))
            .param("category", self.category.map(|c| c.as_str()))
            .param("region", self.region.clone())
            .param("dateFilter", self.date_filter.map(|d| d.as_str()))
            .param("search", self.search.clone())
    }
}

/// Which customer identifier `searchCustomer` matches on.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CustomerKey {
    Contract,
    BusinessPartner,
}

impl CustomerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerKey::Contract => "contract",
            CustomerKey::BusinessPartner => "business",
        }
    }
}

/// Authenticated user plus session token.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Responsible for dispatching backend actions and reshaping their results
/// into canonical records.
///
#[derive(Debug)]
pub struct ApiService {
    client: Client,
    normalizer: Normalizer,
    demo: DemoStore,
    mode: Mutex<ServiceMode>,
    force_demo: bool,
}

impl ApiService {
    /// Returns a new service for the base URL. With `force_demo` set, the
    /// backend is never contacted.
    ///
    pub fn new(base_url: &str, force_demo: bool) -> Result<ApiService, ApiError> {
        info!("Initializing API service for {}", base_url);
        let mode = if force_demo {
            info!("Demo mode is forced by configuration");
            ServiceMode::Degraded(DegradedReason::Forced)
        } else {
            ServiceMode::Live
        };
        Ok(ApiService {
            client: Client::new(base_url)?,
            normalizer: Normalizer::new(),
            demo: DemoStore::seeded(Utc::now()),
            mode: Mutex::new(mode),
            force_demo,
        })
    }

    pub fn mode(&self) -> ServiceMode {
        self.mode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn transport(&self) -> TransportKind {
        self.client.transport()
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// How often unparsable enum values were replaced by defaults.
    ///
    pub fn defaulting_stats(&self) -> DefaultingCounts {
        self.normalizer.stats()
    }

    pub fn demo(&self) -> &DemoStore {
        &self.demo
    }

    /// Return to the live backend after a failure. Forced demo mode stays.
    ///
    pub fn reset(&self) {
        if self.force_demo {
            return;
        }
        let mut mode = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        if mode.is_degraded() {
            info!("Leaving demo mode; the backend will be tried again");
        }
        *mode = ServiceMode::Live;
    }

    fn degrade(&self, reason: DegradedReason) {
        let mut mode = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        if mode.is_live() {
            *mode = ServiceMode::Degraded(reason);
            warn!("Switching to {} for the rest of the session", *mode);
        }
    }

    /// Send one action, falling back to demo data on any failure.
    ///
    async fn request(&self, request: ActionRequest) -> ApiResponse<Value> {
        if self.mode().is_degraded() {
            debug!("Demo mode is active; answering {} locally", request.action);
            return self.demo.respond(&request, Utc::now());
        }
        match self.client.dispatch(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Request for {} failed: {}", request.action, e);
                let reason = match &e {
                    ApiError::Decode { source, .. } => DegradedReason::Decode(source.to_string()),
                    other => DegradedReason::Transport(other.to_string()),
                };
                self.degrade(reason);
                self.demo.respond(&request, Utc::now())
            }
        }
    }

    fn complaints_from(&self, response: ApiResponse<Value>) -> ApiResponse<Vec<Complaint>> {
        response.map(|data| self.normalizer.many(Some(&data), Normalizer::complaint))
    }

    /// Authenticate; in demo mode any password is accepted.
    ///
    pub async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<Session>, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        let request = ActionRequest::body(Action::Login)
            .param("email", email)
            .param("password", password)
            .param("timestamp", datetime::now_iso());
        let response = self.request(request).await;
        Ok(response.map(|data| Session {
            user: self.normalizer.user(data.get("user").unwrap_or(&Value::Null)),
            token: data
                .get("token")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }))
    }

    /// Dashboard stats scoped to a role and region.
    ///
    pub async fn get_dashboard_data(
        &self,
        role: Option<Role>,
        region: Option<&str>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let request = ActionRequest::query(Action::GetDashboardStats)
            .param("role", role.map(|r| r.as_str()))
            .param("region", region);
        Ok(self.request(request).await)
    }

    pub async fn get_users(&self) -> Result<ApiResponse<Vec<User>>, ApiError> {
        let response = self.request(ActionRequest::query(Action::GetUsers)).await;
        Ok(response.map(|data| self.normalizer.many(Some(&data), Normalizer::user)))
    }

    pub async fn get_complaints(
        &self,
        filters: &ComplaintFilters,
    ) -> Result<ApiResponse<Vec<Complaint>>, ApiError> {
        let request = filters.apply(ActionRequest::query(Action::GetComplaints));
        Ok(self.complaints_from(self.request(request).await))
    }

    /// Like [`ApiService::get_complaints`], with a single-page pagination
    /// block attached to successful results.
    ///
    pub async fn search_complaints(
        &self,
        filters: &ComplaintFilters,
    ) -> Result<ApiResponse<Vec<Complaint>>, ApiError> {
        let response = self.get_complaints(filters).await?;
        if !response.success {
            return Ok(response);
        }
        let total = response.data.as_ref().map(Vec::len).unwrap_or(0);
        Ok(response.with_pagination(Pagination::single_page(total)))
    }

    pub async fn create_user(&self, user: &Map<String, Value>) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::body(Action::CreateUser).merge(user)).await)
    }

    pub async fn update_user(&self, user: &Map<String, Value>) -> Result<ApiResponse<Value>, ApiError> {
        require_id(user, "User ID is required for update")?;
        Ok(self.request(ActionRequest::body(Action::UpdateUser).merge(user)).await)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        require_text(user_id, "User ID is required")?;
        let request = ActionRequest::body(Action::DeleteUser).param("id", user_id);
        Ok(self.request(request).await)
    }

    pub async fn reset_user_password(
        &self,
        user_id: &str,
        new_password: Option<&str>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        require_text(user_id, "User ID is required")?;
        let request = ActionRequest::body(Action::ResetUserPassword)
            .param("id", user_id)
            .param("newPassword", new_password);
        Ok(self.request(request).await)
    }

    pub async fn get_customers(&self) -> Result<ApiResponse<Vec<Customer>>, ApiError> {
        let response = self.request(ActionRequest::query(Action::GetCustomers)).await;
        Ok(response.map(|data| self.normalizer.many(Some(&data), Normalizer::customer)))
    }

    pub async fn search_customer(
        &self,
        key: CustomerKey,
        value: &str,
    ) -> Result<ApiResponse<Customer>, ApiError> {
        require_text(value, "Search value is required")?;
        let request = ActionRequest::query(Action::SearchCustomer)
            .param("type", key.as_str())
            .param("value", value);
        let response = self.request(request).await;
        Ok(response.map(|data| self.normalizer.customer(&data)))
    }

    pub async fn create_complaint(
        &self,
        complaint: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let request = ActionRequest::body(Action::CreateComplaint).merge(complaint);
        Ok(self.request(request).await)
    }

    /// Send the full updated record. The caller refetches the list after.
    ///
    pub async fn update_complaint(
        &self,
        complaint: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        require_id(complaint, "Complaint ID is required for update")?;
        debug!("Updating complaint with fields {:?}", complaint.keys().collect::<Vec<_>>());
        let request = ActionRequest::body(Action::UpdateComplaint).merge(complaint);
        Ok(self.request(request).await)
    }

    /// Move a complaint to `status`, appending `note` to its notes. Illegal
    /// transitions are rejected without contacting the backend.
    ///
    pub async fn update_complaint_status(
        &self,
        complaint: &Complaint,
        status: Status,
        note: Option<&str>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        workflow::check_transition(complaint.status, status)?;

        let mut notes = complaint.notes.clone();
        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            notes.push(note.to_string());
        }
        let mut update = Map::new();
        update.insert("id".to_string(), json!(complaint.id));
        update.insert("status".to_string(), json!(status));
        update.insert("notes".to_string(), json!(notes));
        update.insert("updatedAt".to_string(), json!(datetime::now_iso()));
        if matches!(status, Status::Resolved | Status::Closed) && complaint.resolved_at.is_none() {
            update.insert("resolvedAt".to_string(), json!(datetime::now_iso()));
        }
        info!(
            "Changing complaint {} status from {} to {}",
            complaint.id, complaint.status, status
        );
        self.update_complaint(&update).await
    }

    pub async fn bulk_update_complaints(
        &self,
        complaint_ids: &[String],
        update: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        if complaint_ids.is_empty() {
            return Err(ApiError::Validation(
                "At least one complaint ID is required".to_string(),
            ));
        }
        let request = ActionRequest::body(Action::BulkUpdateComplaints)
            .param("complaintIds", json!(complaint_ids))
            .merge(update);
        Ok(self.request(request).await)
    }

    pub async fn get_dashboard_stats(&self) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::query(Action::GetDashboardStats)).await)
    }

    pub async fn get_activity_feed(&self) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::query(Action::GetActivityFeed)).await)
    }

    /// KPI cards derived from dashboard stats.
    ///
    pub async fn get_performance_metrics(
        &self,
        period: Option<&str>,
    ) -> Result<ApiResponse<PerformanceReport>, ApiError> {
        let request = ActionRequest::query(Action::GetDashboardStats).param("period", period);
        let response = self.request(request).await;
        Ok(response.map(|stats| synthesized::performance_metrics(&stats)))
    }

    pub async fn health_check(&self) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::query(Action::HealthCheck)).await)
    }

    pub async fn get_saved_searches(&self) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::query(Action::GetSavedSearches)).await)
    }

    /// Default settings; the backend has no read action for them.
    ///
    pub fn get_settings(&self) -> ApiResponse<Value> {
        ApiResponse::ok(synthesized::settings())
    }

    pub async fn update_settings(
        &self,
        settings: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::body(Action::UpdateSettings).merge(settings)).await)
    }

    pub fn get_permission_matrix(&self) -> ApiResponse<Value> {
        ApiResponse::ok(synthesized::permission_matrix())
    }

    pub async fn update_permission_matrix(
        &self,
        permissions: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let request = ActionRequest::body(Action::UpdatePermissionMatrix).merge(permissions);
        Ok(self.request(request).await)
    }

    /// Backend notifications when there are any, otherwise the activity feed
    /// converted to notifications, otherwise nothing. Demo notifications are
    /// never shown.
    ///
    pub async fn get_notifications(&self) -> Result<ApiResponse<Vec<Notification>>, ApiError> {
        let response = self.request(ActionRequest::query(Action::GetNotifications)).await;
        let stored = self.normalizer.many(response.successful_data(), Normalizer::notification);
        if !stored.is_empty() {
            return Ok(ApiResponse::ok(stored));
        }

        debug!("No stored notifications; deriving them from the activity feed");
        let feed = self.request(ActionRequest::query(Action::GetActivityFeed)).await;
        let derived = match feed.successful_data() {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.normalizer.activity_notification(item, index))
                .collect(),
            _ => Vec::new(),
        };
        Ok(ApiResponse::ok(derived))
    }

    pub async fn mark_notification_as_read(
        &self,
        notification_id: &str,
    ) -> Result<ApiResponse<Value>, ApiError> {
        require_text(notification_id, "Notification ID is required")?;
        let request = ActionRequest::body(Action::MarkNotificationAsRead).param("id", notification_id);
        Ok(self.request(request).await)
    }

    pub async fn create_notification(
        &self,
        notification: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let request = ActionRequest::body(Action::CreateNotification).merge(notification);
        Ok(self.request(request).await)
    }

    pub async fn get_system_status(&self) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::query(Action::GetSystemStatus)).await)
    }

    pub async fn export_data(
        &self,
        kind: &str,
        options: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        require_text(kind, "Export type is required")?;
        let request = ActionRequest::body(Action::ExportData)
            .param("type", kind)
            .merge(&compact(options));
        Ok(self.request(request).await)
    }

    /// Analytics joined from dashboard stats and the complaint list. When
    /// either is unavailable the all-zero structure is returned.
    ///
    pub async fn get_analytics(&self) -> Result<ApiResponse<Analytics>, ApiError> {
        let (stats, complaints) = tokio::join!(
            self.request(ActionRequest::query(Action::GetDashboardStats)),
            self.request(ActionRequest::query(Action::GetComplaints))
        );
        if !(stats.success && complaints.success) {
            warn!("Analytics inputs unavailable; returning empty analytics");
            return Ok(ApiResponse::ok(Analytics::empty()));
        }
        let complaints = self.normalizer.many(complaints.data.as_ref(), Normalizer::complaint);
        let stats = stats.data.unwrap_or_else(|| json!({}));
        Ok(ApiResponse::ok(Analytics::build(&stats, &complaints, Utc::now())))
    }

    pub async fn initialize_sheets(&self) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::body(Action::InitializeSheets)).await)
    }

    /// The fixed report list, offered only while complaints and users can
    /// both be fetched.
    ///
    pub async fn get_reports(&self) -> Result<ApiResponse<Vec<Report>>, ApiError> {
        let (complaints, users) = tokio::join!(
            self.request(ActionRequest::query(Action::GetComplaints)),
            self.request(ActionRequest::query(Action::GetUsers))
        );
        if complaints.success && users.success {
            Ok(ApiResponse::ok(synthesized::reports(Utc::now())))
        } else {
            warn!("Report inputs unavailable; returning no reports");
            Ok(ApiResponse::ok(Vec::new()))
        }
    }

    pub async fn generate_report(
        &self,
        report: &Map<String, Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        Ok(self.request(ActionRequest::body(Action::GenerateReport).merge(report)).await)
    }

    /// Quick report, generated locally and ready immediately.
    ///
    pub fn create_report(&self, report: &Map<String, Value>) -> ApiResponse<Value> {
        synthesized::create_report(report, Utc::now())
    }

    pub fn download_report(&self, report_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        require_text(report_id, "Report ID is required")?;
        Ok(synthesized::download_report(report_id))
    }
}

fn require_text(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(message.to_string()));
    }
    Ok(())
}

fn require_id(record: &Map<String, Value>, message: &str) -> Result<(), ApiError> {
    let present = match record.get("id") {
        Some(Value::String(id)) => !id.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    };
    if present {
        Ok(())
    } else {
        Err(ApiError::Validation(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateError;
    use httpmock::MockServer;

    fn forced_demo() -> ApiService {
        ApiService::new("http://127.0.0.1:9/exec", true).unwrap()
    }

    #[tokio::test]
    async fn first_failure_pins_demo_mode() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET").path("/exec");
                then.status(500).body("Internal error");
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        assert!(service.mode().is_live());

        let first = service
            .get_complaints(&ComplaintFilters::default())
            .await
            .unwrap();
        assert!(first.success);
        assert_eq!(first.data.unwrap().len(), 10);
        assert!(matches!(
            service.mode(),
            ServiceMode::Degraded(DegradedReason::Transport(_))
        ));

        let second = service
            .get_complaints(&ComplaintFilters::default())
            .await
            .unwrap();
        assert_eq!(second.data.unwrap().len(), 10);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn decode_failure_degrades_and_reset_restores() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/exec");
                then.status(200).body("<html>Sign in</html>");
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        let health = service.health_check().await.unwrap();
        assert_eq!(health.data.unwrap()["mode"], json!("demo"));
        assert!(matches!(
            service.mode(),
            ServiceMode::Degraded(DegradedReason::Decode(_))
        ));

        service.reset();
        assert!(service.mode().is_live());
    }

    #[tokio::test]
    async fn unusual_envelope_keeps_live_mode() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/exec")
                    .query_param("action", "getComplaints");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": [{ "id": "C-1" }],
                    "pagination": { "page": 1, "total": 1 },
                    "error": { "code": 0 }
                }));
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        for _ in 0..2 {
            let response = service
                .get_complaints(&ComplaintFilters::default())
                .await
                .unwrap();
            assert_eq!(response.data.unwrap()[0].id, "C-1");
        }
        assert!(service.mode().is_live());
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn live_complaints_are_normalized() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/exec")
                    .query_param("action", "getComplaints")
                    .query_param("status", "open");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": [
                        { "ID": "C-1", "Priority": "URGENT", "Customer Name": "Abebe" },
                        { "id": "C-2", "priority": "high", "customer": { "name": "Tigist" } }
                    ]
                }));
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        let filters = ComplaintFilters {
            status: Some(Status::Open),
            ..ComplaintFilters::default()
        };
        let response = service.search_complaints(&filters).await.unwrap();
        mock.assert_async().await;

        let complaints = response.data.unwrap();
        assert_eq!(complaints[0].priority, Priority::Medium);
        assert_eq!(complaints[0].customer.name, "Abebe");
        assert_eq!(complaints[1].priority, Priority::High);
        assert_eq!(complaints[1].customer.name, "Tigist");
        assert_eq!(response.pagination.unwrap().total, 2);
        assert_eq!(service.defaulting_stats().priority, 1);
        assert!(service.mode().is_live());
    }

    #[tokio::test]
    async fn demo_login_matches_known_email() {
        let service = forced_demo();
        let session = service
            .login("admin@eeu.gov.et", "anything")
            .await
            .unwrap();
        assert!(session.success);
        let session = session.data.unwrap();
        assert_eq!(session.user.email, "admin@eeu.gov.et");
        assert_eq!(session.user.role, Role::Admin);
        assert!(session.token.starts_with("demo-token-"));

        let other = service
            .login("stranger@example.com", "secret")
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(other.user.email, service.demo().users()[0].email);
    }

    #[tokio::test]
    async fn forced_demo_stays_after_reset() {
        let service = forced_demo();
        service.reset();
        assert_eq!(
            service.mode(),
            ServiceMode::Degraded(DegradedReason::Forced)
        );
    }

    #[tokio::test]
    async fn validation_errors_are_returned() {
        let service = forced_demo();
        let result = service.update_complaint(&Map::new()).await;
        match result {
            Err(ApiError::Validation(message)) => {
                assert_eq!(message, "Complaint ID is required for update")
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(service.login("", "x").await.is_err());
        assert!(service.bulk_update_complaints(&[], &Map::new()).await.is_err());
        assert!(service.download_report(" ").is_err());
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_before_sending() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/exec");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        let mut complaint = service.demo().complaints()[0].clone();
        complaint.status = Status::Resolved;

        let result = service
            .update_complaint_status(&complaint, Status::Open, None)
            .await;
        match result {
            Err(ApiError::Transition(StateError::InvalidTransition { allowed, .. })) => {
                assert_eq!(allowed, vec![Status::Closed])
            }
            other => panic!("unexpected result {:?}", other),
        }
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn legal_transition_sends_update() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/exec")
                    .body_contains("\"action\":\"updateComplaint\"")
                    .body_contains("\"status\":\"in_progress\"")
                    .body_contains("Crew dispatched");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        let complaint = service.demo().complaints()[0].clone();
        assert_eq!(complaint.status, Status::Open);
        let response = service
            .update_complaint_status(&complaint, Status::InProgress, Some("Crew dispatched"))
            .await
            .unwrap();
        mock.assert_async().await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn notifications_fall_back_to_activity_feed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/exec")
                    .query_param("action", "getNotifications");
                then.status(200).json_body(json!({ "success": true, "data": [] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/exec")
                    .query_param("action", "getActivityFeed");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": [
                        { "action": "Complaint created", "description": "CMP-1 opened" },
                        { "details": "Status changed", "type": "warning" }
                    ]
                }));
            })
            .await;

        let service = ApiService::new(&server.url("/exec"), false).unwrap();
        let notifications = service.get_notifications().await.unwrap().data.unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].id, "notif-1");
        assert_eq!(notifications[0].title, "Complaint created");
        assert_eq!(notifications[1].message, "Status changed");
        assert_eq!(notifications[1].kind, NotificationType::Warning);
    }

    #[tokio::test]
    async fn demo_notifications_are_never_shown() {
        let service = forced_demo();
        let response = service.get_notifications().await.unwrap();
        assert!(response.success);
        assert_eq!(response.data, Some(Vec::new()));
    }

    #[tokio::test]
    async fn analytics_and_reports_in_demo_mode() {
        let service = forced_demo();
        let analytics = service.get_analytics().await.unwrap().data.unwrap();
        assert_eq!(analytics.overview.total_complaints, 10);
        assert_eq!(analytics.overview.resolved_complaints, 2);
        assert_eq!(analytics.overview.resolution_rate, 20);
        assert_eq!(analytics.overview.escalation_rate, 15.0);

        let reports = service.get_reports().await.unwrap().data.unwrap();
        assert_eq!(reports.len(), 5);
    }

    #[tokio::test]
    async fn synthesized_answers() {
        let service = forced_demo();
        assert_eq!(
            service.get_settings().data.unwrap()["general"]["currency"],
            json!("ETB")
        );
        assert!(service.get_permission_matrix().data.unwrap()["admin"].is_object());
        let download = service.download_report("RPT-001").unwrap();
        assert_eq!(
            download.data.unwrap()["downloadUrl"],
            json!("/api/reports/RPT-001/download")
        );
        let metrics = service.get_performance_metrics(None).await.unwrap();
        // The demo store answers stats with an empty list, so defaults apply.
        assert_eq!(metrics.data.unwrap().metrics[0].value, 85.0);
    }
}
