// REST client for the StayJ API.
// Requests go through a pluggable Transport so the booking logic can be
// exercised against the in-crate mock server.

use crate::availability::AvailabilitySet;
use crate::config::{ClientConfig, ClientError};
use crate::models::{
    Guesthouse, GuesthouseId, GuesthousePatch, GuesthouseSummary, GuestReservation,
    HostReservation, HostedGuesthouse, NewGuesthouse, NewReservation, NewReview, ReservationId,
    Review, ReviewId, ReviewPatch, Room, User, UserId, UserPatch,
};
use crate::search::SearchParams;
use crate::session_store::SessionStore;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use reqwest::Method;

pub const USER_ID_HEADER: &str = "user-id";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // Non-2xx response; message comes from the body when it has one
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    // Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Endpoint needs a user-id header and there is no session
    #[error("Login required")]
    MissingIdentity,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::MissingIdentity => "Please log in to continue.".to_string(),
            ApiError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            ApiError::Parse(_) | ApiError::InvalidRequest(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

// How an endpoint uses the session identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    None,
    // Sent when a session exists
    Optional,
    // Request is refused locally without a session
    Required,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub identity: Identity,
}

impl RequestOptions {
    pub fn identified() -> Self {
        Self {
            identity: Identity::Required,
            ..Default::default()
        }
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;
        Ok(Self { client, timeout_ms })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Network(format!("Request timeout after {}ms", self.timeout_ms))
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
}

pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    stats: Mutex<ClientStats>,
}

impl ApiClient {
    // Create a client talking HTTP to `config.base_url`
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout_ms)?;
        Ok(Self::with_transport(config, Arc::new(transport), session))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            transport,
            session,
            stats: Mutex::new(ClientStats::default()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    /// Sends one request and returns the decoded JSON body.
    ///
    /// An empty 2xx body decodes to `Value::Null`. Nothing is retried.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut url = reqwest::Url::parse(&self.config.endpoint(path))
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", path, e)))?;
        if !options.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &options.query {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let user_id = match options.identity {
            Identity::None => None,
            Identity::Optional => self.session.get().user_id,
            Identity::Required => {
                Some(self.session.get().user_id.ok_or(ApiError::MissingIdentity)?)
            }
        };
        if let Some(id) = user_id {
            headers.push((USER_ID_HEADER.to_string(), id.to_string()));
        }
        headers.extend(options.headers);

        let body = options
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        debug!(%method, path, identified = user_id.is_some(), "Sending API request");
        self.stats.lock().requests_sent += 1;

        let request = HttpRequest {
            method: method.clone(),
            url: url.to_string(),
            headers,
            body,
        };
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, path, error = %e, "API request failed");
                self.stats.lock().requests_failed += 1;
                return Err(e);
            }
        };

        if !(200..300).contains(&response.status) {
            let message = extract_message(&response.body, response.status);
            warn!(%method, path, status = response.status, %message, "API returned an error status");
            self.stats.lock().requests_failed += 1;
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        self.stats.lock().requests_succeeded += 1;
        if response.body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    // `request` followed by decoding into a typed response
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = self.request(method, path, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub async fn search_guesthouses(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<GuesthouseSummary>, ApiError> {
        let options = RequestOptions {
            identity: Identity::Optional,
            ..Default::default()
        }
        .with_query("name", params.name.clone())
        .with_query("check_in", params.check_in.to_string())
        .with_query("check_out", params.check_out.to_string())
        .with_query("people", params.people.to_string());

        self.call(Method::GET, "/guesthouse/search", options).await
    }

    pub async fn get_guesthouse_detail(&self, id: GuesthouseId) -> Result<Guesthouse, ApiError> {
        self.call(
            Method::GET,
            &format!("/guesthouse/{}", id),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn get_guesthouse_rooms(
        &self,
        id: GuesthouseId,
        available_ids: Option<&AvailabilitySet>,
    ) -> Result<Vec<Room>, ApiError> {
        let mut options = RequestOptions::default();
        if let Some(set) = available_ids {
            options = options.with_query("room_available", set.to_query_value());
        }
        self.call(Method::GET, &format!("/guesthouse/{}/rooms", id), options)
            .await
    }

    pub async fn get_reviews(&self, id: GuesthouseId) -> Result<Vec<Review>, ApiError> {
        self.call(
            Method::GET,
            &format!("/guesthouse/{}/reviews", id),
            RequestOptions::default(),
        )
        .await
    }

    /// Posts a reservation and returns the server-assigned id when the
    /// response carries one.
    pub async fn create_reservation(
        &self,
        data: &NewReservation,
    ) -> Result<Option<ReservationId>, ApiError> {
        let options = RequestOptions::identified().with_body(data)?;
        let value = self.request(Method::POST, "/reservation", options).await?;
        Ok(reservation_id_from(&value))
    }

    pub async fn cancel_reservation(&self, id: ReservationId) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/reservation/{}", id),
            RequestOptions::identified(),
        )
        .await?;
        Ok(())
    }

    pub async fn list_my_reservations(&self) -> Result<Vec<GuestReservation>, ApiError> {
        self.call(Method::GET, "/reservation/my", RequestOptions::identified())
            .await
    }

    // The profile endpoints carry the profile owner's id as the identity header
    pub async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        let options = RequestOptions::default().with_header(USER_ID_HEADER, id.to_string());
        self.call(Method::GET, &format!("/user/{}", id), options)
            .await
    }

    pub async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<(), ApiError> {
        let options = RequestOptions::default()
            .with_header(USER_ID_HEADER, id.to_string())
            .with_body(patch)?;
        self.request(Method::PATCH, "/user-info", options).await?;
        Ok(())
    }

    pub async fn create_review(&self, data: &NewReview) -> Result<(), ApiError> {
        let options = RequestOptions::identified().with_body(data)?;
        self.request(Method::POST, "/review", options).await?;
        Ok(())
    }

    pub async fn update_review(&self, id: ReviewId, patch: &ReviewPatch) -> Result<(), ApiError> {
        let options = RequestOptions::identified().with_body(patch)?;
        self.request(Method::PATCH, &format!("/review/{}", id), options)
            .await?;
        Ok(())
    }

    pub async fn delete_review(&self, id: ReviewId) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/review/{}", id),
            RequestOptions::identified(),
        )
        .await?;
        Ok(())
    }

    pub async fn my_guesthouses(&self) -> Result<Vec<HostedGuesthouse>, ApiError> {
        self.call(Method::GET, "/guesthouse/mylist", RequestOptions::identified())
            .await
    }

    // Returns the raw response; the server echoes the stored guesthouse or a status object
    pub async fn create_guesthouse(&self, data: &NewGuesthouse) -> Result<Value, ApiError> {
        let options = RequestOptions::identified().with_body(data)?;
        self.request(Method::POST, "/guesthouse", options).await
    }

    pub async fn update_guesthouse(
        &self,
        id: GuesthouseId,
        patch: &GuesthousePatch,
    ) -> Result<(), ApiError> {
        let options = RequestOptions::identified().with_body(patch)?;
        self.request(Method::PATCH, &format!("/guesthouse/{}", id), options)
            .await?;
        Ok(())
    }

    pub async fn delete_guesthouse(&self, id: GuesthouseId) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/guesthouse/{}", id),
            RequestOptions::identified(),
        )
        .await?;
        Ok(())
    }

    pub async fn guesthouse_reservations(
        &self,
        id: GuesthouseId,
    ) -> Result<Vec<HostReservation>, ApiError> {
        self.call(
            Method::GET,
            &format!("/guesthouse/{}/reservations", id),
            RequestOptions::identified(),
        )
        .await
    }
}

fn extract_message(body: &[u8], status: u16) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.trim().is_empty() {
                    return message.trim().to_string();
                }
            }
        }
    }
    trimmed.to_string()
}

// Server responses name the new id either `reservation_id` or `id`
pub(crate) fn reservation_id_from(value: &Value) -> Option<ReservationId> {
    value
        .get("reservation_id")
        .or_else(|| value.get("id"))
        .and_then(Value::as_i64)
        .or_else(|| value.as_i64())
}
