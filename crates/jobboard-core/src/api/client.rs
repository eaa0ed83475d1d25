//! Authenticated request dispatcher for the job board API.
//!
//! `ApiClient::send` attaches the stored bearer token, and on a 401 runs the
//! refresh protocol once before retrying. When the session cannot be
//! refreshed it is cleared and `ApiError::LoginRequired` is returned so the
//! caller can send the user back to the login flow.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::{AuthEvent, LogoutReason, SessionStore};
use crate::config::Config;
use crate::models::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshTokenResponse, UserProfile,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_ENDPOINT: &str = "/mobile/auth/login";

const REFRESH_ENDPOINT: &str = "/api/v1/mobile/auth/refresh";

/// Shown when a failed login carries no usable message
const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your email and password.";

/// Join an endpoint onto the base URL.
///
/// One leading `/` is dropped from the endpoint and one trailing `/` from the
/// base. An empty base yields a root-relative path.
pub fn join_url(base: &str, endpoint: &str) -> String {
    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
    if base.is_empty() {
        return format!("/{}", endpoint);
    }
    let base = base.strip_suffix('/').unwrap_or(base);
    format!("{}/{}", base, endpoint)
}

/// Method, extra headers and body of one logical request.
/// The body is kept as text so the request can be re-issued after a refresh.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: header::HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Add a header. Caller headers win over the default content type.
    pub fn header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let body = serde_json::to_string(body).context("Failed to serialize request body")?;
        Ok(self.body(body))
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub is_first_login: bool,
}

/// API client for the job board.
/// Clone is cheap - reqwest::Client and the session store are reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client for the configured API, sharing `session`
    pub fn new(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api_url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    fn request_headers(options: &RequestOptions, token: Option<&str>) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Access token is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    async fn dispatch(&self, url: &str, options: &RequestOptions, token: Option<&str>) -> Result<Response> {
        let headers = Self::request_headers(options, token)?;
        let mut request = self.client.request(options.method.clone(), url).headers(headers);
        if let Some(ref body) = options.body {
            request = request.body(body.clone());
        }

        debug!(method = %options.method, url, authenticated = token.is_some(), "Sending request");
        request
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to send {} request to {}", options.method, url))
    }

    /// Perform one request with the stored credentials.
    ///
    /// A 401 on a request that carried a token triggers one refresh and one
    /// retry when `retry_on_401` is set; the retry's response is returned
    /// whatever its status. Any other response is returned as received.
    pub async fn send(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        retry_on_401: bool,
    ) -> Result<Response> {
        let url = self.api_url(endpoint);
        let token = self.session.access_token();

        let response = self.dispatch(&url, options, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !retry_on_401 || token.is_none() {
            return Ok(response);
        }

        debug!(url = %url, "Access token rejected, refreshing");
        if !self.refresh_session().await {
            self.force_logout();
            return Err(ApiError::LoginRequired.into());
        }

        match self.session.access_token() {
            Some(new_token) => {
                debug!(url = %url, "Retrying with refreshed token");
                self.dispatch(&url, options, Some(&new_token)).await
            }
            None => Ok(response),
        }
    }

    /// Clear the session after an unrecoverable 401.
    fn force_logout(&self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        warn!("Session expired, login required");
        self.session
            .notify(&AuthEvent::LoggedOut(LogoutReason::SessionExpired));
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Never goes through `send`, so a rejected refresh cannot trigger another
    /// refresh. Returns false on any failure.
    pub async fn refresh_session(&self) -> bool {
        let refresh_token = match self.session.refresh_token() {
            Some(token) => token,
            None => {
                debug!("No refresh token stored");
                return false;
            }
        };

        let refreshed = match self.request_refresh(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return false;
            }
        };

        let token = match refreshed.token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                warn!("Token refresh response did not contain a token");
                return false;
            }
        };

        let new_refresh = refreshed.refresh_token.filter(|t| !t.is_empty());
        if let Err(e) = self.session.update_tokens(&token, new_refresh.as_deref()) {
            warn!(error = %e, "Failed to store refreshed token");
            return false;
        }

        info!(rotated_refresh_token = new_refresh.is_some(), "Access token refreshed");
        self.session.notify(&AuthEvent::TokenRefreshed);
        true
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<RefreshTokenResponse> {
        let url = self.api_url(REFRESH_ENDPOINT);
        let options = RequestOptions::post().json(&RefreshRequest { refresh_token })?;

        let response = self.dispatch(&url, &options, None).await?;
        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse token refresh response")
    }

    /// Log in with email and password and store the resulting session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let url = self.api_url(LOGIN_ENDPOINT);
        let options = RequestOptions::post().json(&LoginRequest { email, password })?;

        let response = self.dispatch(&url, &options, None).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ApiError::message_from_body(&body)
                .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
            warn!(%status, "Login rejected");
            return Err(ApiError::LoginFailed(message).into());
        }

        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        let token = login
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("Login response did not contain a token".into()))?;

        if let Some(ref token_type) = login.token_type {
            if !token_type.eq_ignore_ascii_case("bearer") {
                warn!(%token_type, "Unexpected token type, sending it as a bearer token");
            }
        }

        let refresh_token = login.refresh_token.as_deref().filter(|t| !t.is_empty());
        let user = login.to_profile();
        self.session
            .set_session(token, refresh_token, &user)
            .context("Failed to store session")?;

        info!(user = %user.email, role = ?user.role, "Login successful");
        self.session.notify(&AuthEvent::LoggedIn);

        Ok(LoginOutcome {
            user,
            is_first_login: login.is_first_login,
        })
    }

    /// End the session at the user's request
    pub fn logout(&self) -> Result<()> {
        self.session.logout()
    }

    /// Check if response is successful, returning an error with body if not.
    pub(crate) async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use wiremock::matchers::{body_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::MemoryStore;
    use crate::models::Role;

    fn user() -> UserProfile {
        UserProfile {
            id: 42,
            uuid: "3f1c".to_string(),
            email: "awa@example.com".to_string(),
            full_name: "Awa Ouedraogo".to_string(),
            role: Role::JobSeeker,
            is_premium: false,
        }
    }

    fn client_for(base_url: &str) -> ApiClient {
        let config = Config {
            api_base_url: base_url.to_string(),
            ..Config::default()
        };
        let session = Arc::new(SessionStore::new(Box::new(MemoryStore::new())));
        ApiClient::new(&config, session).unwrap()
    }

    fn record_events(client: &ApiClient) -> Arc<Mutex<Vec<AuthEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        client
            .session()
            .subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    async fn mount_refresh(server: &MockServer, status: u16, body: serde_json::Value, times: u64) {
        Mock::given(method("POST"))
            .and(path(REFRESH_ENDPOINT))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(times)
            .mount(server)
            .await;
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://api.example.com", "/mobile/offers"), "https://api.example.com/mobile/offers");
        assert_eq!(join_url("https://api.example.com/", "mobile/offers"), "https://api.example.com/mobile/offers");
        assert_eq!(join_url("https://api.example.com/", "/mobile/offers"), "https://api.example.com/mobile/offers");
        assert_eq!(join_url("", "/mobile/offers"), "/mobile/offers");
        assert_eq!(join_url("", "mobile/offers"), "/mobile/offers");
        // Only one slash is normalized on each side
        assert_eq!(join_url("https://api.example.com//", "//x"), "https://api.example.com///x");
    }

    #[test]
    fn test_caller_headers_take_precedence() {
        let options = RequestOptions::get().header(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain"),
        );
        let headers = ApiClient::request_headers(&options, Some("T1")).unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer T1");

        let headers = ApiClient::request_headers(&RequestOptions::get(), None).unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(header::AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_no_token_never_authenticates_or_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"token": "T2"}), 0).await;

        let client = client_for(&server.uri());
        let events = record_events(&client);

        let response = client
            .send("/mobile/offers?page=0&size=20", &RequestOptions::get(), true)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_401_without_retry_is_returned_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .and(header_eq("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"token": "T2"}), 0).await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();

        let response = client
            .send("/mobile/offers", &RequestOptions::get(), false)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.text().await.unwrap(), "expired");

        assert_eq!(client.session().access_token().as_deref(), Some("T1"));
        assert_eq!(client.session().refresh_token().as_deref(), Some("R1"));
        assert_eq!(client.session().user(), Some(user()));
    }

    #[tokio::test]
    async fn test_refresh_and_retry_with_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .and(header_eq("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("stale"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_ENDPOINT))
            .and(body_json(json!({"refreshToken": "R1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "T2"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .and(header_eq("authorization", "Bearer T2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": [], "totalPages": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();
        let events = record_events(&client);

        let response = client
            .send("/mobile/offers?page=0&size=20", &RequestOptions::get(), true)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["totalPages"], 0);

        assert_eq!(client.session().access_token().as_deref(), Some("T2"));
        assert_eq!(client.session().refresh_token().as_deref(), Some("R1"));
        assert_eq!(client.session().user(), Some(user()));
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::TokenRefreshed]);

        // Refresh request must not carry the stale bearer token
        let requests = server.received_requests().await.unwrap();
        let refresh = requests
            .iter()
            .find(|r| r.url.path() == REFRESH_ENDPOINT)
            .unwrap();
        assert!(!refresh.headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_retry_result_is_returned_without_looping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"token": "T2", "refreshToken": "R2"}), 1).await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();

        let response = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(client.session().access_token().as_deref(), Some("T2"));
        assert_eq!(client.session().refresh_token().as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_refresh_rejected_forces_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 403, json!({"message": "refresh token revoked"}), 1).await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();
        let events = record_events(&client);

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(ApiError::is_login_required(&err));

        assert!(!client.session().is_authenticated());
        assert_eq!(client.session().refresh_token(), None);
        assert_eq!(client.session().user(), None);
        assert_eq!(
            *events.lock().unwrap(),
            vec![AuthEvent::LoggedOut(LogoutReason::SessionExpired)]
        );
    }

    #[tokio::test]
    async fn test_missing_refresh_token_forces_logout_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"token": "T2"}), 0).await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", None, &user()).unwrap();
        let events = record_events(&client);

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(ApiError::is_login_required(&err));
        assert!(!client.session().is_authenticated());
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_token_in_body_forces_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"refreshToken": "R2"}), 1).await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();
        let events = record_events(&client);

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(ApiError::is_login_required(&err));
        assert!(!client.session().is_authenticated());
        assert_eq!(client.session().refresh_token(), None);
        assert_eq!(
            *events.lock().unwrap(),
            vec![AuthEvent::LoggedOut(LogoutReason::SessionExpired)]
        );
    }

    #[tokio::test]
    async fn test_refresh_unparseable_body_forces_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();
        let events = record_events(&client);

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(ApiError::is_login_required(&err));
        assert!(!client.session().is_authenticated());
        assert_eq!(client.session().refresh_token(), None);
        assert_eq!(client.session().user(), None);
        assert_eq!(
            *events.lock().unwrap(),
            vec![AuthEvent::LoggedOut(LogoutReason::SessionExpired)]
        );
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_forces_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        // Outlives the client timeout, so the refresh call fails in transport
        Mock::given(method("POST"))
            .and(path(REFRESH_ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"token": "T2"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = Config {
            api_base_url: server.uri(),
            request_timeout_secs: 1,
            ..Config::default()
        };
        let session = Arc::new(SessionStore::new(Box::new(MemoryStore::new())));
        let client = ApiClient::new(&config, session).unwrap();
        client.session().set_session("T1", Some("R1"), &user()).unwrap();
        let events = record_events(&client);

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(ApiError::is_login_required(&err));
        assert!(!client.session().is_authenticated());
        assert_eq!(client.session().refresh_token(), None);
        assert_eq!(
            *events.lock().unwrap(),
            vec![AuthEvent::LoggedOut(LogoutReason::SessionExpired)]
        );
    }

    #[tokio::test]
    async fn test_empty_refresh_token_from_login_is_not_used() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "T1",
                "refreshToken": "",
                "id": 42,
                "uuid": "3f1c",
                "email": "awa@example.com",
                "fullName": "Awa Ouedraogo",
                "role": "JOB_SEEKER"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"token": "T2"}), 0).await;

        let client = client_for(&server.uri());
        client.login("awa@example.com", "secret").await.unwrap();
        assert!(client.session().is_authenticated());
        assert_eq!(client.session().refresh_token(), None);

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(ApiError::is_login_required(&err));
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_non_401_errors_are_returned_as_received() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mobile/offers"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 200, json!({"token": "T2"}), 0).await;

        let client = client_for(&server.uri());
        client.session().set_session("T1", Some("R1"), &user()).unwrap();

        let response = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(client.session().access_token().as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn test_post_body_and_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mobile/applications"))
            .and(header_eq("content-type", "application/json"))
            .and(header_eq("x-client", "cli"))
            .and(body_json(json!({"jobId": "a1b2"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/", server.uri()));
        let options = RequestOptions::post()
            .header(
                header::HeaderName::from_static("x-client"),
                header::HeaderValue::from_static("cli"),
            )
            .json(&json!({"jobId": "a1b2"}))
            .unwrap();

        let response = client.send("mobile/applications", &options, true).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        // Nothing listens on port 1
        let client = client_for("http://127.0.0.1:1");
        client.session().set_session("T1", Some("R1"), &user()).unwrap();

        let err = client
            .send("/mobile/offers", &RequestOptions::get(), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NetworkError(_))
        ));
        assert_eq!(client.session().access_token().as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn test_login_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_ENDPOINT))
            .and(body_json(json!({"email": "awa@example.com", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "T1",
                "refreshToken": "R1",
                "type": "Bearer",
                "id": 42,
                "uuid": "3f1c",
                "email": "awa@example.com",
                "fullName": "Awa Ouedraogo",
                "role": "JOB_SEEKER",
                "isFirstLogin": true,
                "isPremium": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let events = record_events(&client);

        let outcome = client.login("awa@example.com", "secret").await.unwrap();
        assert!(outcome.is_first_login);
        assert_eq!(outcome.user, user());

        assert!(client.session().is_authenticated());
        assert_eq!(client.session().access_token().as_deref(), Some("T1"));
        assert_eq!(client.session().user().map(|u| u.role), Some(Role::JobSeeker));
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::LoggedIn]);
    }

    #[tokio::test]
    async fn test_login_failure_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_ENDPOINT))
            .and(body_json(json!({"email": "awa@example.com", "password": "wrong"})))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGIN_ENDPOINT))
            .and(body_json(json!({"email": "awa@example.com", "password": "down"})))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());

        let err = client.login("awa@example.com", "wrong").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::LoginFailed(m)) if m == "Invalid credentials"
        ));

        let err = client.login("awa@example.com", "down").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::LoginFailed(m)) if m == LOGIN_FAILED_MESSAGE
        ));
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_and_notifies() {
        let client = client_for("http://127.0.0.1:1");
        client.session().set_session("T1", Some("R1"), &user()).unwrap();
        let events = record_events(&client);

        client.logout().unwrap();
        assert!(!client.session().is_authenticated());
        assert_eq!(
            *events.lock().unwrap(),
            vec![AuthEvent::LoggedOut(LogoutReason::UserRequested)]
        );
    }
}
