//! Proxies that sit between a browser and the backend.
//!
//! Two flavours share one router:
//! - the development proxy: `GET /health` and `ANY /api/*`, forwarded with
//!   the `/api` prefix stripped
//! - the function proxy: `/.netlify/functions/proxy[/<action>]`, which
//!   resolves the action and always forwards a POST with a JSON body
//!
//! Every response, errors and preflights included, carries the same CORS
//! headers.

mod error;

pub use error::ProxyError;

use axum::body::{Body, Bytes};
use axum::extract::{Query, Request, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use log::*;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
pub const PREFLIGHT_MAX_AGE: &str = "86400";

const FUNCTION_NAME: &str = "proxy";

/// Shared state for both proxies.
///
#[derive(Clone, Debug)]
pub struct ProxyState {
    backend_url: String,
    http: reqwest::Client,
}

impl ProxyState {
    pub fn new(backend_url: impl Into<String>) -> Self {
        ProxyState {
            backend_url: backend_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }
}

/// Build the router for both proxies.
///
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api", any(forward))
        .route("/api/{*rest}", any(forward))
        .route("/.netlify/functions/proxy", any(function_proxy))
        .route("/.netlify/functions/proxy/{action}", any(function_proxy))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Serve both proxies on `port` until Ctrl+C.
///
pub async fn serve(port: u16, backend_url: &str) -> Result<(), ProxyError> {
    serve_with_shutdown(port, backend_url, shutdown_signal()).await
}

pub async fn serve_with_shutdown<S>(
    port: u16,
    backend_url: &str,
    shutdown: S,
) -> Result<(), ProxyError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ProxyError::Bind { port, source })?;

    info!("EEU Complaint Management Proxy Server running on port {}", port);
    info!("Proxying requests to: {}", backend_url);
    info!("Health check: http://localhost:{}/health", port);
    info!("API endpoint: http://localhost:{}/api", port);

    axum::serve(listener, router(ProxyState::new(backend_url)))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ProxyError::Serve)?;

    info!("Proxy server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Attach the CORS headers to every response and answer preflights
/// directly.
///
pub async fn cors(request: Request, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let mut response = if preflight {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    if preflight {
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE),
        );
    }
    response
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "service": "EEU Complaint Management Proxy Server",
    }))
}

/// Development proxy: strip `/api`, forward as POST JSON and pass the
/// backend's answer through untouched.
///
async fn forward(
    State(state): State<ProxyState>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let rest = uri.path().strip_prefix("/api").unwrap_or_default();
    let url = format!("{}{}", state.backend_url.trim_end_matches('/'), rest);
    let payload = if body.is_empty() {
        Value::Object(merge_query(Map::new(), &query)).to_string().into_bytes()
    } else {
        body.to_vec()
    };
    info!("Proxying {} to backend", uri);

    let upstream = state
        .http
        .post(&url)
        .query(&query)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
        .map_err(|e| {
            error!("Proxy error: {}", e);
            ProxyError::Forward(e.to_string())
        })?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    info!("Response from backend: {}", status);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ProxyError::Forward(e.to_string()))?;

    Ok((
        status,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(bytes.to_vec()),
    )
        .into_response())
}

/// Function proxy: resolve the action, forward as POST JSON and insist on
/// a successful JSON answer.
///
async fn function_proxy(
    State(state): State<ProxyState>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let payload = resolve_payload(&body, &query, uri.path())?;
    debug!("Forwarding to backend: {}", Value::Object(payload.clone()));

    let response = state
        .http
        .post(&state.backend_url)
        .json(&payload)
        .send()
        .await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        error!("Backend answered {}: {}", status, text);
        return Err(ProxyError::UpstreamStatus {
            status: status.as_u16(),
            body: text,
        });
    }
    let data: Value = serde_json::from_str(&text).map_err(|e| {
        error!("Failed to parse backend response as JSON: {}", e);
        ProxyError::InvalidJson(text)
    })?;
    Ok(Json(data))
}

/// Body fields first, then query parameters for keys the body leaves
/// empty. The action comes from the body, the query, or the last path
/// segment.
///
fn resolve_payload(
    body: &[u8],
    query: &HashMap<String, String>,
    path: &str,
) -> Result<Map<String, Value>, ProxyError> {
    let parsed = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => Map::new(),
        Err(e) => {
            if !body.is_empty() {
                warn!("Ignoring unparsable request body: {}", e);
            }
            Map::new()
        }
    };
    let mut payload = merge_query(parsed, query);

    let has_action = payload
        .get("action")
        .and_then(Value::as_str)
        .map_or(false, |a| !a.is_empty());
    if !has_action {
        match path.rsplit('/').next() {
            Some(segment) if !segment.is_empty() && segment != FUNCTION_NAME => {
                payload.insert("action".to_string(), Value::from(segment));
            }
            _ => {
                error!("No action specified in request");
                return Err(ProxyError::NoAction);
            }
        }
    }
    Ok(payload)
}

fn merge_query(mut fields: Map<String, Value>, query: &HashMap<String, String>) -> Map<String, Value> {
    for (key, value) in query {
        let missing = match fields.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => true,
            Some(Value::String(text)) => text.is_empty(),
            Some(_) => false,
        };
        if missing {
            fields.insert(key.clone(), Value::from(value.as_str()));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use tower::ServiceExt;

    async fn send(app: Router, request: axum::http::Request<Body>) -> (StatusCode, Response) {
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOW_ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    fn post(uri: &str, body: Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_resolve_payload() {
        let query: HashMap<String, String> = [
            ("action".to_string(), "getUsers".to_string()),
            ("region".to_string(), "Oromia".to_string()),
        ]
        .into_iter()
        .collect();

        let body = json!({ "action": "login", "region": "Amhara", "search": "" }).to_string();
        let payload = resolve_payload(body.as_bytes(), &query, "/.netlify/functions/proxy").unwrap();
        assert_eq!(payload["action"], "login");
        assert_eq!(payload["region"], "Amhara");
        assert_eq!(payload["search"], "");

        let payload = resolve_payload(b"not json", &query, "/.netlify/functions/proxy").unwrap();
        assert_eq!(payload["action"], "getUsers");
        assert_eq!(payload["region"], "Oromia");

        let payload =
            resolve_payload(b"", &HashMap::new(), "/.netlify/functions/proxy/healthCheck").unwrap();
        assert_eq!(payload["action"], "healthCheck");

        assert!(matches!(
            resolve_payload(b"{}", &HashMap::new(), "/.netlify/functions/proxy"),
            Err(ProxyError::NoAction)
        ));
    }

    #[tokio::test]
    async fn health_reports_service() {
        let app = router(ProxyState::new("http://127.0.0.1:9/exec"));
        let request = axum::http::Request::get("/health").body(Body::empty()).unwrap();
        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        let body = json_of(response).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["service"], "EEU Complaint Management Proxy Server");
    }

    #[tokio::test]
    async fn preflight_is_answered_directly() {
        let app = router(ProxyState::new("http://127.0.0.1:9/exec"));
        let request = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/.netlify/functions/proxy")
            .body(Body::empty())
            .unwrap();
        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_MAX_AGE],
            PREFLIGHT_MAX_AGE
        );
    }

    #[tokio::test]
    async fn function_proxy_requires_action() {
        let app = router(ProxyState::new("http://127.0.0.1:9/exec"));
        let (status, response) = send(app, post("/.netlify/functions/proxy", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_cors(&response);
        let body = json_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No action specified");
        assert_eq!(body["message"], "Request must include an action parameter");
    }

    #[tokio::test]
    async fn function_proxy_forwards_as_post_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/exec")
                    .header("content-type", "application/json")
                    .json_body(json!({ "action": "getUsers", "region": "Amhara" }));
                then.status(200)
                    .json_body(json!({ "success": true, "data": [] }));
            })
            .await;

        let app = router(ProxyState::new(server.url("/exec")));
        let request = post(
            "/.netlify/functions/proxy/getUsers?region=Amhara",
            json!({}),
        );
        let (status, response) = send(app, request).await;
        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        assert_eq!(json_of(response).await["success"], true);
    }

    #[tokio::test]
    async fn function_proxy_reports_backend_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/exec");
                then.status(503).body("Service unavailable");
            })
            .await;

        let app = router(ProxyState::new(server.url("/exec")));
        let request = post("/.netlify/functions/proxy", json!({ "action": "healthCheck" }));
        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body = json_of(response).await;
        assert_eq!(body["error"], "Proxy error");
        assert_eq!(
            body["details"],
            "Google Apps Script error: 503 - Service unavailable"
        );
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn function_proxy_rejects_non_json_answers() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/exec");
                then.status(200).body("<html>Sign in</html>");
            })
            .await;

        let app = router(ProxyState::new(server.url("/exec")));
        let request = post("/.netlify/functions/proxy", json!({ "action": "getUsers" }));
        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_of(response).await;
        assert_eq!(
            body["details"],
            "Invalid JSON response from Google Apps Script: <html>Sign in</html>"
        );
    }

    #[tokio::test]
    async fn dev_proxy_strips_prefix() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/exec")
                    .json_body(json!({ "action": "login", "email": "admin@eeu.gov.et" }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "success": true }));
            })
            .await;

        let app = router(ProxyState::new(server.url("/exec")));
        let request = post(
            "/api",
            json!({ "action": "login", "email": "admin@eeu.gov.et" }),
        );
        let (status, response) = send(app, request).await;
        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        assert_eq!(json_of(response).await["success"], true);
    }

    #[tokio::test]
    async fn dev_proxy_reports_connection_errors() {
        let app = router(ProxyState::new("http://127.0.0.1:9/exec"));
        let request = post("/api/anything", json!({ "action": "getUsers" }));
        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body = json_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Proxy server error");
    }
}
