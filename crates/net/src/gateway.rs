//! API gateway
//!
//! Every backend call goes through [`Gateway::request`]:
//!
//! 1. An expired access token gets exactly one refresh attempt. If that fails
//!    the session is cleared, the navigator is sent to the landing route and
//!    the original request is never issued.
//! 2. `Authorization: Bearer` is attached when a token exists; caller headers
//!    are merged on top of the defaults.
//! 3. A 401 clears the session and navigates as well.
//! 4. Other non-2xx responses become [`Error::Http`].
//! 5. Success bodies are decoded leniently: empty, non-JSON or malformed
//!    bodies become an empty object instead of an error.

use std::sync::Arc;
use std::time::Duration;

use finagent_core::session::token;
use finagent_core::{ClientConfig, RefreshRequest, SessionContext, TokenPair};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::navigator::{Navigator, LANDING_ROUTE};

/// Token refresh endpoint
pub const REFRESH_ENDPOINT: &str = "/auth/refresh";

const SESSION_EXPIRED: &str = "Authentication expired. Please sign in again.";
const SESSION_REJECTED: &str = "Authentication failed. Please sign in again.";

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self> {
        Self::with_body(Method::POST, body)
    }

    pub fn delete<B: Serialize>(body: &B) -> Result<Self> {
        Self::with_body(Method::DELETE, body)
    }

    fn with_body<B: Serialize>(method: Method, body: &B) -> Result<Self> {
        Ok(Self {
            method,
            body: Some(serde_json::to_value(body)?),
            ..Self::default()
        })
    }

    /// Add a header, replacing any default of the same name
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a query string parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Authenticated HTTP wrapper around the backend
pub struct Gateway {
    http: Client,
    base_url: String,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the response body into `T`
    #[instrument(
        skip(self, options),
        fields(request_id = %Uuid::new_v4(), method = %options.method)
    )]
    pub async fn request<T>(&self, endpoint: &str, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let token = self.resolve_token().await?;
        let url = format!("{}{}", self.base_url, endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored access token is not a valid header value, sending without it"),
            }
        }
        // Caller headers win over defaults
        headers.extend(options.headers);

        let mut request = self.http.request(options.method, &url).headers(headers);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!("Request rejected as unauthorized");
            self.expire_session();
            return Err(Error::Auth(SESSION_REJECTED.into()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = response.text().await?;

        Ok(materialize(normalize_body(content_type.as_deref(), &text)))
    }

    /// The token to send, refreshing it first if it has expired
    async fn resolve_token(&self) -> Result<Option<String>> {
        let Some(current) = self.session.access_token() else {
            return Ok(None);
        };

        if !token::is_expired(&current) {
            return Ok(Some(current));
        }

        debug!("Access token expired, attempting refresh");
        match self.refresh().await {
            Ok(pair) => Ok(Some(pair.access_token)),
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.expire_session();
                Err(Error::Auth(SESSION_EXPIRED.into()))
            }
        }
    }

    /// Exchange the stored refresh token for a new pair
    async fn refresh(&self) -> Result<TokenPair> {
        let refresh_token = self
            .session
            .refresh_token()
            .ok_or_else(|| Error::Auth("No refresh token stored".into()))?;

        let url = format!("{}{}", self.base_url, REFRESH_ENDPOINT);
        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let pair: TokenPair = response.json().await?;
        self.session.replace_tokens(&pair)?;
        Ok(pair)
    }

    /// Drop the local session and send the user to the landing route
    fn expire_session(&self) {
        if let Err(e) = self.session.clear_tokens() {
            error!(error = %e, "Failed to clear session tokens");
        }
        self.navigator.navigate(LANDING_ROUTE);
    }
}

/// Build an endpoint path from raw segments, percent-encoding each one
pub fn endpoint_path(segments: &[&str]) -> Result<String> {
    let mut url = Url::parse("http://localhost/").map_err(|e| Error::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidUrl("base URL cannot hold a path".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Turn a success body into JSON, degrading to `{}` when it is not JSON
pub fn normalize_body(content_type: Option<&str>, text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return empty_object();
    }

    let declared_json = content_type
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    let looks_json = trimmed.starts_with('{') || trimmed.starts_with('[');

    if !(declared_json || looks_json) {
        debug!("Response body is not JSON, treating as empty");
        return empty_object();
    }

    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        warn!(error = %e, "Malformed JSON response, treating as empty");
        empty_object()
    })
}

/// Deserialize into `T`, falling back to `T::default()` on shape mismatch
fn materialize<T: DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "Response did not match expected shape, using empty value");
        T::default()
    })
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::CountingNavigator;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use chrono::Utc;
    use finagent_core::{MemoryStore, SessionEvent};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jwt(exp: i64) -> String {
        format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{exp}}}"#))
        )
    }

    fn valid_jwt() -> String {
        jwt(Utc::now().timestamp() + 3600)
    }

    fn expired_jwt() -> String {
        jwt(Utc::now().timestamp() - 60)
    }

    struct Harness {
        gateway: Gateway,
        session: Arc<SessionContext>,
        navigator: Arc<CountingNavigator>,
    }

    fn harness(uri: &str) -> Harness {
        let session = Arc::new(SessionContext::init(Arc::new(MemoryStore::new())).unwrap());
        let navigator = Arc::new(CountingNavigator::new());
        let config = ClientConfig {
            api_url: format!("{uri}/"),
            ..ClientConfig::default()
        };
        let gateway = Gateway::new(&config, session.clone(), navigator.clone()).unwrap();
        Harness {
            gateway,
            session,
            navigator,
        }
    }

    #[tokio::test]
    async fn test_attaches_bearer_and_merges_caller_headers() {
        let server = MockServer::start().await;
        let token = valid_jwt();

        Mock::given(method("GET"))
            .and(path("/user/1"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .and(header("x-client", "cli"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&token).unwrap();

        let options = RequestOptions::get().header(
            HeaderName::from_static("x-client"),
            HeaderValue::from_static("cli"),
        );
        let value: Value = h.gateway.request("/user/1", options).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let _: Value = h.gateway.request("/holding/", RequestOptions::get()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_once_then_uses_new_token() {
        let server = MockServer::start().await;
        let new_access = valid_jwt();

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refresh_token": "refresh-old"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": &new_access,
                "refresh_token": "refresh-new",
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/user/1"))
            .and(header("authorization", format!("Bearer {new_access}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&expired_jwt()).unwrap();
        h.session.set_refresh_token("refresh-old").unwrap();
        let mut events = h.session.subscribe();

        let value: Value = h.gateway.request("/user/1", RequestOptions::get()).await.unwrap();

        assert_eq!(value["id"], "1");
        assert_eq!(h.session.access_token(), Some(new_access));
        assert_eq!(h.session.refresh_token(), Some("refresh-new".to_string()));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
        assert_eq!(h.navigator.redirects(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_never_issues_original_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(403).set_body_string("revoked"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/holding/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&expired_jwt()).unwrap();
        h.session.set_refresh_token("refresh-old").unwrap();

        let err = h
            .gateway
            .request::<Value>("/holding/", RequestOptions::get())
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert!(h.session.access_token().is_none());
        assert!(h.session.refresh_token().is_none());
        assert_eq!(h.navigator.redirects(), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&expired_jwt()).unwrap();

        let err = h
            .gateway
            .request::<Value>("/user/1", RequestOptions::get())
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert!(h.session.access_token().is_none());
        assert_eq!(h.navigator.redirects(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_refresh_response_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&expired_jwt()).unwrap();
        h.session.set_refresh_token("refresh-old").unwrap();

        let err = h
            .gateway
            .request::<Value>("/user/1", RequestOptions::get())
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert!(h.session.refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_expired_requests_tolerate_double_refresh() {
        let server = MockServer::start().await;
        let new_access = valid_jwt();

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": &new_access,
                "refresh_token": "refresh-new",
            })))
            .expect(1..=2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&expired_jwt()).unwrap();
        h.session.set_refresh_token("refresh-old").unwrap();

        let (a, b) = tokio::join!(
            h.gateway.request::<Value>("/user/1", RequestOptions::get()),
            h.gateway.request::<Value>("/user/1", RequestOptions::get()),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(h.session.access_token(), Some(new_access));
    }

    #[tokio::test]
    async fn test_401_clears_session_and_navigates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.session.set_access_token(&valid_jwt()).unwrap();
        h.session.set_refresh_token("r").unwrap();

        let err = h
            .gateway
            .request::<Value>("/user/1", RequestOptions::get())
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert!(h.session.access_token().is_none());
        assert!(h.session.refresh_token().is_none());
        assert_eq!(h.navigator.redirects(), 1);
    }

    #[tokio::test]
    async fn test_non_success_is_http_error_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"detail":"bad"}"#))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let token = valid_jwt();
        h.session.set_access_token(&token).unwrap();

        let options = RequestOptions::post(&json!({"stock": ""})).unwrap();
        let err = h
            .gateway
            .request::<Value>("/holding/", options)
            .await
            .unwrap_err();

        match err {
            Error::Http { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, r#"{"detail":"bad"}"#);
            }
            other => panic!("expected Http error, got {other:?}"),
        }
        // A plain HTTP error leaves the session alone
        assert_eq!(h.session.access_token(), Some(token));
        assert_eq!(h.navigator.redirects(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let h = harness(&crate::api::test_support::unreachable_uri());
        let err = h
            .gateway
            .request::<Value>("/user/1", RequestOptions::get())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_lenient_bodies_degrade_to_default() {
        let server = MockServer::start().await;

        Mock::given(path("/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(path("/text"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
            .mount(&server)
            .await;
        Mock::given(path("/array"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"stock":"AAPL"}]"#))
            .mount(&server)
            .await;

        let h = harness(&server.uri());

        let empty: Value = h.gateway.request("/empty", RequestOptions::get()).await.unwrap();
        assert_eq!(empty, json!({}));

        let text: Value = h.gateway.request("/text", RequestOptions::get()).await.unwrap();
        assert_eq!(text, json!({}));

        let broken: Vec<String> = h.gateway.request("/broken", RequestOptions::get()).await.unwrap();
        assert!(broken.is_empty());

        let array: Value = h.gateway.request("/array", RequestOptions::get()).await.unwrap();
        assert_eq!(array, json!([{"stock": "AAPL"}]));
    }

    #[test]
    fn test_endpoint_path_encodes_segments() {
        assert_eq!(endpoint_path(&["user", "u1"]).unwrap(), "/user/u1");
        assert_eq!(
            endpoint_path(&["user", "a/b?c#d"]).unwrap(),
            "/user/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_normalize_body() {
        assert_eq!(normalize_body(None, "   "), json!({}));
        assert_eq!(normalize_body(None, "hello"), json!({}));
        assert_eq!(normalize_body(None, " [1, 2] "), json!([1, 2]));
        assert_eq!(
            normalize_body(Some("application/json; charset=utf-8"), "42"),
            json!(42)
        );
        assert_eq!(normalize_body(Some("text/html"), "<p>"), json!({}));
        assert_eq!(normalize_body(None, "{\"a\":"), json!({}));
    }
}
