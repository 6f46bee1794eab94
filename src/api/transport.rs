//! Transport selection for the single action-dispatch endpoint.
//!
//! The wire shape depends only on the configured base URL:
//!
//! - a development proxy (`…/api`) and a serverless function proxy
//!   (`…/.netlify/functions/…`) always get a POST with a JSON body;
//! - the backend addressed directly gets POST bodies sent as `text/plain`
//!   (a "simple" request, so browsers skip the CORS preflight) and GET
//!   parameters in the query string.

use super::error::ApiError;
use reqwest::{Method, Url};
use serde_json::{Map, Value};
use std::fmt;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Backend operation named by the `action` field of every request.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Login,
    GetComplaints,
    CreateComplaint,
    UpdateComplaint,
    BulkUpdateComplaints,
    GetUsers,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ResetUserPassword,
    GetCustomers,
    SearchCustomer,
    GetDashboardStats,
    GetActivityFeed,
    HealthCheck,
    GetSavedSearches,
    UpdateSettings,
    UpdatePermissionMatrix,
    GetNotifications,
    MarkNotificationAsRead,
    CreateNotification,
    GetSystemStatus,
    ExportData,
    InitializeSheets,
    GenerateReport,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::GetComplaints => "getComplaints",
            Action::CreateComplaint => "createComplaint",
            Action::UpdateComplaint => "updateComplaint",
            Action::BulkUpdateComplaints => "bulkUpdateComplaints",
            Action::GetUsers => "getUsers",
            Action::CreateUser => "createUser",
            Action::UpdateUser => "updateUser",
            Action::DeleteUser => "deleteUser",
            Action::ResetUserPassword => "resetUserPassword",
            Action::GetCustomers => "getCustomers",
            Action::SearchCustomer => "searchCustomer",
            Action::GetDashboardStats => "getDashboardStats",
            Action::GetActivityFeed => "getActivityFeed",
            Action::HealthCheck => "healthCheck",
            Action::GetSavedSearches => "getSavedSearches",
            Action::UpdateSettings => "updateSettings",
            Action::UpdatePermissionMatrix => "updatePermissionMatrix",
            Action::GetNotifications => "getNotifications",
            Action::MarkNotificationAsRead => "markNotificationAsRead",
            Action::CreateNotification => "createNotification",
            Action::GetSystemStatus => "getSystemStatus",
            Action::ExportData => "exportData",
            Action::InitializeSheets => "initializeSheets",
            Action::GenerateReport => "generateReport",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the call reads (parameters) or writes (body).
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallStyle {
    Query,
    Body,
}

/// A backend call before a wire shape has been chosen.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    pub action: Action,
    pub style: CallStyle,
    pub params: Map<String, Value>,
}

impl ActionRequest {
    /// Read-style call; parameters travel as a query string or JSON body
    /// depending on the transport.
    ///
    pub fn query(action: Action) -> Self {
        ActionRequest {
            action,
            style: CallStyle::Query,
            params: Map::new(),
        }
    }

    /// Write-style call with a JSON body.
    ///
    pub fn body(action: Action) -> Self {
        ActionRequest {
            action,
            style: CallStyle::Body,
            params: Map::new(),
        }
    }

    /// Add a parameter. Null values and empty strings are skipped.
    ///
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        let skip = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if !skip {
            self.params.insert(key.to_string(), value);
        }
        self
    }

    /// Merge every field of a JSON object into the parameters. Later keys
    /// win; the `action` key is reserved.
    ///
    pub fn merge(mut self, fields: &Map<String, Value>) -> Self {
        for (key, value) in fields {
            if key != "action" {
                self.params.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// Full payload including the `action` discriminator.
    ///
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(
            "action".to_string(),
            Value::String(self.action.as_str().to_string()),
        );
        for (key, value) in &self.params {
            payload.insert(key.clone(), value.clone());
        }
        payload
    }

    /// Query pairs including `action`, scalars rendered as text.
    ///
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.payload()
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => return None,
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect()
    }

    /// Parameter as text, for demo filtering.
    ///
    pub fn text_param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// One of the three deployment shapes.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    DevProxy,
    FunctionProxy,
    Direct,
}

/// Fully resolved HTTP request.
///
#[derive(Clone, Debug, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<&'static str>,
    pub body: Option<String>,
}

impl TransportKind {
    /// Pick the transport by looking at the configured base URL.
    ///
    pub fn detect(base_url: &str) -> TransportKind {
        let path = base_url.split(['?', '#']).next().unwrap_or(base_url);
        if path.contains("/.netlify/functions/") {
            TransportKind::FunctionProxy
        } else if path.trim_end_matches('/').ends_with("/api") {
            TransportKind::DevProxy
        } else {
            TransportKind::Direct
        }
    }

    /// Build the wire request for `request` against `base_url`.
    ///
    pub fn build(&self, base_url: &str, request: &ActionRequest) -> Result<WireRequest, ApiError> {
        let body = serde_json::to_string(&Value::Object(request.payload()))?;
        match (self, request.style) {
            (TransportKind::DevProxy | TransportKind::FunctionProxy, _) => Ok(WireRequest {
                method: Method::POST,
                url: with_action_query(base_url, request)?,
                content_type: Some(CONTENT_TYPE_JSON),
                body: Some(body),
            }),
            (TransportKind::Direct, CallStyle::Body) => Ok(WireRequest {
                method: Method::POST,
                url: base_url.to_string(),
                content_type: Some(CONTENT_TYPE_TEXT),
                body: Some(body),
            }),
            (TransportKind::Direct, CallStyle::Query) => {
                let mut url = parse_url(base_url)?;
                url.query_pairs_mut().extend_pairs(request.query_pairs());
                Ok(WireRequest {
                    method: Method::GET,
                    url: url.to_string(),
                    content_type: None,
                    body: None,
                })
            }
        }
    }
}

/// Proxies route on the body, but the action is kept in the query string so
/// access logs show which operation was called.
///
fn with_action_query(base_url: &str, request: &ActionRequest) -> Result<String, ApiError> {
    let mut url = parse_url(base_url)?;
    url.query_pairs_mut()
        .append_pair("action", request.action.as_str());
    Ok(url.to_string())
}

fn parse_url(base_url: &str) -> Result<Url, ApiError> {
    Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
        url: base_url.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIRECT: &str = "https://script.google.com/macros/s/abc/exec";
    const DEV: &str = "http://localhost:3001/api";
    const FUNCTION: &str = "https://eeu.example.org/.netlify/functions/proxy";

    #[test]
    fn test_detect() {
        assert_eq!(TransportKind::detect(DIRECT), TransportKind::Direct);
        assert_eq!(TransportKind::detect(DEV), TransportKind::DevProxy);
        assert_eq!(TransportKind::detect("http://localhost:3001/api/"), TransportKind::DevProxy);
        assert_eq!(TransportKind::detect(FUNCTION), TransportKind::FunctionProxy);
        assert_eq!(
            TransportKind::detect("https://example.org/apiary"),
            TransportKind::Direct
        );
    }

    #[test]
    fn test_direct_query_uses_get_with_params() {
        let request = ActionRequest::query(Action::GetComplaints)
            .param("status", "open")
            .param("priority", "");
        let wire = TransportKind::Direct.build(DIRECT, &request).unwrap();
        assert_eq!(wire.method, Method::GET);
        assert!(wire.url.starts_with(DIRECT));
        assert!(wire.url.contains("action=getComplaints"));
        assert!(wire.url.contains("status=open"));
        assert!(!wire.url.contains("priority"));
        assert_eq!(wire.body, None);
        assert_eq!(wire.content_type, None);
    }

    #[test]
    fn test_direct_body_uses_text_plain() {
        let request = ActionRequest::body(Action::DeleteUser).param("id", "12");
        let wire = TransportKind::Direct.build(DIRECT, &request).unwrap();
        assert_eq!(wire.method, Method::POST);
        assert_eq!(wire.url, DIRECT);
        assert_eq!(wire.content_type, Some(CONTENT_TYPE_TEXT));
        let body: Value = serde_json::from_str(wire.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "action": "deleteUser", "id": "12" }));
    }

    #[test]
    fn test_proxies_always_post_json() {
        for (kind, base) in [
            (TransportKind::DevProxy, DEV),
            (TransportKind::FunctionProxy, FUNCTION),
        ] {
            let request = ActionRequest::query(Action::GetComplaints).param("status", "open");
            let wire = kind.build(base, &request).unwrap();
            assert_eq!(wire.method, Method::POST);
            assert_eq!(wire.content_type, Some(CONTENT_TYPE_JSON));
            assert!(wire.url.ends_with("?action=getComplaints"));
            let body: Value = serde_json::from_str(wire.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({ "action": "getComplaints", "status": "open" }));
        }
    }

    #[test]
    fn test_merge_keeps_action_reserved() {
        let fields = json!({ "action": "deleteUser", "title": "Outage" });
        let request =
            ActionRequest::body(Action::CreateComplaint).merge(fields.as_object().unwrap());
        assert_eq!(request.payload()["action"], json!("createComplaint"));
        assert_eq!(request.text_param("title"), Some("Outage"));
    }

    #[test]
    fn test_invalid_base_url() {
        let request = ActionRequest::query(Action::HealthCheck);
        let result = TransportKind::Direct.build("not a url", &request);
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));
    }
}
