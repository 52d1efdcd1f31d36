//! API client for the Career Champ backend.
//!
//! Every request re-reads the token store and, when a token is present,
//! sends it as `Authorization: Bearer <token>`. A client bound to a session
//! sends nothing once that session has ended, even if the store still holds a
//! token. The client never changes the session itself: a 401 comes back as
//! `ApiError::Unauthorized` and the caller decides whether to log out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, multipart, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{SessionController, TokenStore};
use crate::models::{
    search_query, ChatReply, ChatRequest, ChatSession, ChatSessionSummary, Job, JobSearchRequest,
    JobsResponse, LoginRequest, Ping, RegisterRequest, RegisterResponse, ResumeFormat,
    TokenResponse,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Multipart field name the resume endpoint reads the file from.
const RESUME_FIELD: &str = "file";

/// API client for Career Champ.
/// Clone is cheap - reqwest::Client and the store are both behind Arcs.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    session: Option<SessionController>,
}

impl ApiClient {
    /// Create a client for `base_url` that reads its bearer token from `store`.
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            session: None,
        })
    }

    /// Create a client that reads the session's store and only sends the
    /// token while the session is authenticated.
    pub fn with_session(base_url: &str, session: &SessionController) -> Result<Self> {
        let mut client = Self::new(base_url, session.store())?;
        client.session = Some(session.clone());
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(session) = &self.session {
            if !session.is_authenticated() {
                return Ok(headers);
            }
        }
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token, sending request without it");
                None
            }
        };
        if let Some(token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Stored token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;
        Self::parse(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;
        Self::parse(response, &url).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;
        Self::parse(response, &url).await
    }

    // ===== Account =====

    /// Exchange credentials for an access token. The token is returned, not
    /// stored: hand it to `SessionController::login`.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/auth/login", &body)
            .await
            .map_err(|e| match e.downcast::<ApiError>() {
                Ok(api_error) => api_error.for_login().into(),
                Err(other) => other,
            })
            .context("Login request failed")
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/auth/register", &body)
            .await
            .context("Registration request failed")
    }

    // ===== Jobs =====

    pub async fn available_jobs(&self) -> Result<Vec<Job>> {
        let response: JobsResponse = self.get("/jobs/available").await?;
        Ok(response.into_jobs())
    }

    /// Search jobs. A blank query lists every available job instead.
    pub async fn search_jobs(&self, query: &str) -> Result<Vec<Job>> {
        let Some(query) = search_query(Some(query)) else {
            return self.available_jobs().await;
        };
        let body = JobSearchRequest {
            query: query.to_string(),
        };
        let response: JobsResponse = self.post("/jobs/search", &body).await?;
        Ok(response.into_jobs())
    }

    // ===== Resume =====

    /// Upload a PDF or Word resume as multipart form data.
    pub async fn upload_resume(&self, path: &Path) -> Result<serde_json::Value> {
        let format = ResumeFormat::from_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read resume file {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(format.mime_type())
            .context("Invalid resume content type")?;
        let form = multipart::Form::new().part(RESUME_FIELD, part);

        let url = self.url("/resume/upload");
        debug!(url = %url, "POST multipart");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await
            .context("Failed to upload resume")?;
        Self::parse(response, &url).await
    }

    // ===== Chatbot =====

    pub async fn new_chat_session(&self) -> Result<ChatSession> {
        self.post_empty("/chatbot/session/new").await
    }

    pub async fn send_chat_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply> {
        let body = ChatRequest {
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        };
        self.post("/chatbot/message", &body).await
    }

    pub async fn chat_session_summary(&self, session_id: &str) -> Result<ChatSessionSummary> {
        self.get(&format!("/chatbot/session/{}/summary", session_id))
            .await
    }

    // ===== Health =====

    pub async fn ping(&self) -> Result<Ping> {
        self.get("/ping").await.context("Backend not reachable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn client_with(store: Arc<MemoryTokenStore>) -> ApiClient {
        ApiClient::new("http://localhost:3000/", store).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client_with(Arc::new(MemoryTokenStore::new()));
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/ping"), "http://localhost:3000/ping");
    }

    #[test]
    fn test_no_authorization_without_token() {
        let client = client_with(Arc::new(MemoryTokenStore::new()));
        let headers = client.auth_headers().unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_bearer_reads_store_on_every_request() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = client_with(store.clone());

        store.save("first.token.value").unwrap();
        let headers = client.auth_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer first.token.value"
        );

        store.save("second.token.value").unwrap();
        let headers = client.auth_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer second.token.value"
        );

        store.clear().unwrap();
        assert!(client.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_clones_share_store() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = client_with(store.clone());
        let clone = client.clone();

        store.save("shared").unwrap();
        assert!(clone.auth_headers().unwrap().contains_key(header::AUTHORIZATION));
    }

    #[test]
    fn test_token_with_newline_is_rejected_as_header() {
        let store = Arc::new(MemoryTokenStore::with_token("bad\ntoken"));
        let client = client_with(store);
        assert!(client.auth_headers().is_err());
    }

    #[tokio::test]
    async fn test_session_bound_client_stops_sending_after_logout() {
        use crate::auth::{ManualClock, SessionConfig};
        use chrono::{Duration as ChronoDuration, Utc};

        let store = Arc::new(MemoryTokenStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let session = SessionController::with_clock(store.clone(), clock, SessionConfig::default());
        session.init();
        let client = ApiClient::with_session("http://localhost:3000", &session).unwrap();

        let token = crate::auth::claims::test_tokens::token(
            "42",
            (Utc::now() + ChronoDuration::hours(1)).timestamp(),
        );
        session.login(token.as_str()).unwrap();
        assert!(client.auth_headers().unwrap().contains_key(header::AUTHORIZATION));

        session.logout().unwrap();
        // A token written behind the session's back is not sent either
        store.save(&token).unwrap();
        assert!(client.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_file_before_reading() {
        let client = client_with(Arc::new(MemoryTokenStore::new()));
        let err = client
            .upload_resume(Path::new("/nonexistent/resume.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("PDF or Word"));
    }
}
