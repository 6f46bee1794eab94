//! HTTP client for the action-dispatch backend.
//!
//! This module executes the wire request chosen by the transport selector
//! and decodes the `{ success, data, error, message, pagination }` envelope
//! every backend action answers with.

use super::error::ApiError;
use super::transport::{ActionRequest, TransportKind};
use log::*;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page information attached to list results.
///
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Everything on one page.
    ///
    pub fn single_page(total: usize) -> Self {
        Pagination {
            page: 1,
            limit: total as u64,
            total: total as u64,
            total_pages: 1,
            has_next: false,
            has_prev: false,
        }
    }
}

/// Response envelope shared by every backend action.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Convert the payload, keeping the envelope.
    ///
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            message: self.message,
            pagination: self.pagination,
        }
    }

    /// Payload of a successful response.
    ///
    pub fn successful_data(&self) -> Option<&T> {
        if self.success {
            self.data.as_ref()
        } else {
            None
        }
    }
}

impl ApiResponse<Value> {
    /// Read an envelope out of any JSON document. Fields of an unexpected
    /// shape are tolerated; a body that is not an object becomes the data
    /// of an unsuccessful response.
    ///
    pub fn from_json(body: Value) -> Self {
        let mut fields = match body {
            Value::Object(fields) => fields,
            other => {
                warn!("Response body is not an envelope object");
                return ApiResponse {
                    data: Some(other),
                    ..ApiResponse::failure("Unexpected response shape")
                };
            }
        };
        ApiResponse {
            success: fields.get("success").and_then(Value::as_bool).unwrap_or(false),
            data: fields.remove("data").filter(|data| !data.is_null()),
            error: fields.get("error").and_then(as_text),
            message: fields.get("message").and_then(as_text),
            pagination: fields
                .remove("pagination")
                .and_then(|raw| serde_json::from_value(raw).ok()),
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Sends action requests to the configured backend URL.
///
#[derive(Debug)]
pub struct Client {
    base_url: String,
    transport: TransportKind,
    http_client: reqwest::Client,
}

impl Client {
    /// Returns a new client; the transport is fixed by the URL.
    ///
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let transport = TransportKind::detect(base_url);
        debug!("Using {:?} transport for {}", transport, base_url);
        Ok(Client {
            base_url: base_url.to_owned(),
            transport,
            http_client: reqwest::Client::builder().build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Send one action and decode the response envelope.
    ///
    pub async fn dispatch(&self, request: &ActionRequest) -> Result<ApiResponse<Value>, ApiError> {
        let wire = self.transport.build(&self.base_url, request)?;
        debug!("Making {} request for {} to {}", wire.method, request.action, wire.url);

        let mut builder = self.http_client.request(wire.method, &wire.url);
        if let Some(content_type) = wire.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = wire.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("Unable to read response"));

        if !status.is_success() {
            error!("API request failed with status {}: {}", status, text);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok(ApiResponse::from_json(body)),
            Err(source) => {
                error!("Failed to parse response as JSON: {}. Response body: {}", source, text);
                Err(ApiError::Decode { source, body: text })
            }
        }
    }
}
