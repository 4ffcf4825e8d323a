use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderName};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::Instrument;
use uuid::Uuid;

use crate::{config::ClientConfig, error::ApiError};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// FormFile
///
/// A file sent as one part of a `multipart/form-data` body.
#[derive(Clone, PartialEq)]
pub struct FormFile {
    /// Form field name the backend reads the file from.
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FormFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFile")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// ApiRequest
///
/// One concrete request shape: method, path relative to the gateway base URL,
/// query parameters and an optional body, either JSON or a multipart file.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub file: Option<FormFile>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            file: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// `POST path` carrying `file` as multipart form data.
    pub fn upload(path: impl Into<String>, file: FormFile) -> Self {
        let mut request = Self::new(Method::Post, path);
        request.file = Some(file);
        request
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a query parameter. Blank values are dropped, so optional filters
    /// can be passed straight from form state.
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        let value = value.trim();
        if !value.is_empty() {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn with_query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// `METHOD path`, for logs and mock routing.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

// 1. Transport Contract
/// Transport
///
/// Sends one request to the backend and returns the parsed response body.
/// Implemented by `HttpGateway` for real traffic and by `ScriptedTransport` in
/// tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Any non-success outcome is an `Err`; the resolver treats every error
    /// alike and moves on to its next candidate.
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Value, ApiError>;
}

/// TransportState
///
/// The concrete type used to share the transport across the API facades.
pub type TransportState = Arc<dyn Transport>;

// 2. The Real Implementation (reqwest)
/// HttpGateway
///
/// Thin wrapper over a `reqwest` client: JSON in and out, bearer token when the
/// session has one, and a cookie store so backend-set cookies ride along on
/// later calls.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URLs (e.g. confirm links handed out by the backend) pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpGateway {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Value, ApiError> {
        let req_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %request.method,
            path = %request.path,
            req_id = %req_id,
        );

        async move {
            let mut builder = self
                .client
                .request(request.method.into(), self.url_for(&request.path))
                .header(ACCEPT, "application/json")
                .header(X_REQUEST_ID, req_id.to_string());

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(token) = bearer {
                builder = builder.bearer_auth(token);
            }
            if let Some(file) = &request.file {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.mime)?;
                builder = builder.multipart(Form::new().part(file.field.clone(), part));
            } else if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                tracing::warn!(error = %e, "transport failure");
                ApiError::from(e)
            })?;

            let status = response.status();
            let text = response.text().await?;
            let body = parse_body(&text);

            if !status.is_success() {
                tracing::warn!(status = status.as_u16(), "backend rejected request");
                return Err(ApiError::from_status(status.as_u16(), body));
            }

            tracing::debug!(status = status.as_u16(), "backend answered");
            Ok(body)
        }
        .instrument(span)
        .await
    }
}

/// Empty bodies become `null`; bodies that are not JSON are kept as a string so
/// error text can still reach the user.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

// 3. The Scripted Implementation (For Tests)
/// RecordedCall
///
/// A request as `ScriptedTransport` saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub request: ApiRequest,
    pub bearer: Option<String>,
}

/// ScriptedTransport
///
/// Answers each `METHOD path` with a fixed scripted result and records every
/// request it receives, so tests can assert which candidates were issued.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, Result<Value, ApiError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: Method, path: &str, body: Value) -> Self {
        self.routes.insert(route_key(method, path), Ok(body));
        self
    }

    pub fn fail(mut self, method: Method, path: &str, error: ApiError) -> Self {
        self.routes.insert(route_key(method, path), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Issued routes in order, as `METHOD path`.
    pub fn issued(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| call.request.describe())
            .collect()
    }
}

fn route_key(method: Method, path: &str) -> String {
    format!("{} {}", method, path)
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                request: request.clone(),
                bearer: bearer.map(str::to_string),
            });

        match self.routes.get(&request.describe()) {
            Some(result) => result.clone(),
            None => Err(ApiError::from_status(404, json!({ "detail": "Not Found" }))),
        }
    }
}
