//! REST client for the chat backend.
//!
//! Covers the calls a chat frontend makes around the socket: login, user
//! lookup, room history and posting a message outside the socket. Every
//! authenticated call sends `Authorization: Bearer {token}`; a 401 is reported
//! as [`ApiError::Unauthorized`] so callers can prompt for a new login.

use parley_proto::{HistoryRecord, LoginResponse, RoomId, UserRecord};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// REST errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL or path could not be joined.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Request failed before a response arrived.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Token missing, invalid or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// Server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status
        status: StatusCode,
        /// Response body, for diagnostics
        body: String,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Shape(String),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    recipient_id: u64,
    content: &'a str,
}

/// Client for the REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create an unauthenticated client for `base` (e.g. `http://127.0.0.1:8000`).
    pub fn new(base: &str) -> Result<Self, ApiError> {
        Ok(Self { http: reqwest::Client::new(), base: Url::parse(base)?, token: None })
    }

    /// Use an existing bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Current bearer token, if logged in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// `POST /api/token/login/`. Stores the returned token on success.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let url = self.base.join("api/token/login/")?;
        let response =
            self.http.post(url).json(&LoginRequest { username, password }).send().await?;

        let login: LoginResponse = check(response).await?.json().await?;
        tracing::info!(user_id = login.user.id, username = %login.user.username, "logged in");

        self.token = Some(login.token.clone());
        Ok(login)
    }

    /// `GET /api/user/`.
    pub async fn users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let url = self.base.join("api/user/")?;
        let response = check(self.authorized(self.http.get(url)).send().await?).await?;
        parse_user_list(response.json().await?)
    }

    /// `GET /api/user/{id}`.
    pub async fn user(&self, user_id: u64) -> Result<UserRecord, ApiError> {
        let url = self.base.join(&format!("api/user/{user_id}"))?;
        Ok(check(self.authorized(self.http.get(url)).send().await?).await?.json().await?)
    }

    /// `GET /api/chat/messages?room_name={room}`, oldest first.
    pub async fn messages(&self, room: &RoomId) -> Result<Vec<HistoryRecord>, ApiError> {
        let mut url = self.base.join("api/chat/messages")?;
        url.query_pairs_mut().append_pair("room_name", room.as_str());

        Ok(check(self.authorized(self.http.get(url)).send().await?).await?.json().await?)
    }

    /// `POST /api/chat/message`. Stores a message without the socket.
    pub async fn send_message(
        &self,
        recipient_id: u64,
        content: &str,
    ) -> Result<HistoryRecord, ApiError> {
        let url = self.base.join("api/chat/message")?;
        let body = SendMessageRequest { recipient_id, content };
        let request = self.authorized(self.http.post(url)).json(&body);

        Ok(check(request.send().await?).await?.json().await?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }
    Ok(response)
}

/// Extract users from any of the list shapes the backend has returned: a bare
/// array, `{"users": [...]}`, or a paginated `{"results": [...]}`.
pub fn parse_user_list(body: Value) -> Result<Vec<UserRecord>, ApiError> {
    let list = match body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => object
            .remove("users")
            .filter(Value::is_array)
            .or_else(|| object.remove("results").filter(Value::is_array))
            .ok_or_else(|| ApiError::Shape("no user array in response".to_string()))?,
        other => return Err(ApiError::Shape(format!("expected array or object, got {other}"))),
    };

    serde_json::from_value(list).map_err(|e| ApiError::Shape(e.to_string()))
}
