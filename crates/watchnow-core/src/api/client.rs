//! API client for communicating with the WatchNow REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests to browse movies, manage reviews and read profiles.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, redirect, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Movie, MovieFilter, NewMovie, NewReview, ProfileUpdate, RegisteredUser, Registration, Review,
    UserProfile,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix for every data endpoint.
const API_PREFIX: &str = "/api";

/// Form login endpoint, served from the server root rather than under `/api`.
const LOGIN_PATH: &str = "/login";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Session cookies issued by the backend, in order of preference.
const SESSION_COOKIE_NAMES: [&str; 2] = ["JSESSIONID", "SESSION"];

/// Stored-form prefixes for the two credential transports.
const BEARER_PREFIX: &str = "bearer:";
const COOKIE_PREFIX: &str = "cookie:";

/// Proof of an established session.
///
/// The backend may either hand back a token in the login response body or
/// establish a server-side session and identify it with a cookie. Both are
/// kept opaque; only the transport differs.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `Authorization: Bearer <token>`.
    Bearer(String),
    /// Sent as `Cookie: NAME=value`.
    SessionCookie(String),
}

impl Credential {
    /// Serialize for durable storage.
    pub fn to_stored(&self) -> String {
        match self {
            Credential::Bearer(token) => format!("{}{}", BEARER_PREFIX, token),
            Credential::SessionCookie(cookie) => format!("{}{}", COOKIE_PREFIX, cookie),
        }
    }

    /// Parse a stored value. Untagged values are treated as bearer tokens.
    pub fn from_stored(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let credential = if let Some(token) = raw.strip_prefix(BEARER_PREFIX) {
            Credential::Bearer(token.to_string())
        } else if let Some(cookie) = raw.strip_prefix(COOKIE_PREFIX) {
            Credential::SessionCookie(cookie.to_string())
        } else {
            Credential::Bearer(raw.to_string())
        };
        match &credential {
            Credential::Bearer(v) | Credential::SessionCookie(v) if v.is_empty() => None,
            _ => Some(credential),
        }
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => write!(f, "Credential::Bearer(..)"),
            Credential::SessionCookie(_) => write!(f, "Credential::SessionCookie(..)"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// API client for the WatchNow backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    /// Used only for form login; redirects are inspected rather than followed.
    login_client: Client,
    server_url: Arc<str>,
    credential: Option<Credential>,
}

impl ApiClient {
    /// Create a new API client for the server at `server_url`
    /// (e.g. `http://localhost:8080`).
    pub fn new(server_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let login_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            login_client,
            server_url: Arc::from(server_url.trim_end_matches('/')),
            credential: None,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Create a new ApiClient with the given credential, sharing the connection pool.
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        Self {
            client: self.client.clone(),
            login_client: self.login_client.clone(),
            server_url: Arc::clone(&self.server_url),
            credential,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.server_url, API_PREFIX, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let invalid = |_: header::InvalidHeaderValue| {
            ApiError::InvalidResponse("Stored credential is not a valid header".into())
        };
        match &self.credential {
            Some(Credential::Bearer(token)) => {
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(invalid)?,
                );
            }
            Some(Credential::SessionCookie(cookie)) => {
                headers.insert(
                    header::COOKIE,
                    header::HeaderValue::from_str(cookie).map_err(invalid)?,
                );
            }
            None => {}
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(url = url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.api_url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.api_url(path);
        debug!(url = %url, method = %method, "Sending JSON request");
        let response = self
            .client
            .request(method, &url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    // ===== Authentication =====

    /// Submit the login form and return the credential for the new session.
    ///
    /// A `401`, or a redirect back to the login page with an `error` marker,
    /// means the email/password pair was rejected.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ApiError> {
        let url = format!("{}{}", self.server_url, LOGIN_PATH);
        debug!(url = %url, "Submitting login form");

        let response = self
            .login_client
            .post(&url)
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidCredentials);
        }
        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if location.contains("error") {
                return Err(ApiError::InvalidCredentials);
            }
        } else if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let cookie = session_cookie(response.headers());
        let body = response.text().await.unwrap_or_default();

        if let Some(token) = token_from_body(&body) {
            return Ok(Credential::Bearer(token));
        }
        cookie.map(Credential::SessionCookie).ok_or_else(|| {
            ApiError::InvalidResponse(
                "Login succeeded but the server issued no session credential".to_string(),
            )
        })
    }

    /// Create an account. Does not sign the new user in.
    pub async fn register(&self, registration: &Registration) -> Result<RegisteredUser, ApiError> {
        self.send_json(Method::POST, "/users/register", registration)
            .await
    }

    // ===== Movies =====

    pub async fn list_movies(&self, filter: &MovieFilter) -> Result<Vec<Movie>, ApiError> {
        self.get("/movies", &filter.query_pairs()).await
    }

    pub async fn get_movie(&self, movie_id: &str) -> Result<Movie, ApiError> {
        self.get(&format!("/movies/{}", movie_id), &[]).await
    }

    pub async fn add_movie(&self, movie: &NewMovie) -> Result<Movie, ApiError> {
        self.send_json(Method::POST, "/movies", movie).await
    }

    // ===== Reviews =====

    pub async fn list_movie_reviews(&self, movie_id: &str) -> Result<Vec<Review>, ApiError> {
        self.get(&format!("/movies/{}/reviews", movie_id), &[]).await
    }

    pub async fn add_review(&self, movie_id: &str, review: &NewReview) -> Result<Review, ApiError> {
        self.send_json(Method::POST, &format!("/movies/{}/reviews", movie_id), review)
            .await
    }

    pub async fn delete_review(&self, review_id: &str) -> Result<(), ApiError> {
        let url = self.api_url(&format!("/reviews/{}", review_id));
        debug!(url = %url, "DELETE");
        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    pub async fn list_user_reviews(&self, user_id: &str) -> Result<Vec<Review>, ApiError> {
        self.get(&format!("/users/{}/reviews", user_id), &[]).await
    }

    // ===== Profile =====

    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/users/me", &[]).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me", update).await
    }
}

/// Pick the session cookie out of the `Set-Cookie` headers, as `NAME=value`.
fn session_cookie(headers: &header::HeaderMap) -> Option<String> {
    let pairs: Vec<String> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
        .filter(|pair| pair.contains('='))
        .collect();

    SESSION_COOKIE_NAMES
        .iter()
        .find_map(|name| {
            pairs
                .iter()
                .find(|pair| pair.split('=').next() == Some(*name))
                .cloned()
        })
        .or_else(|| pairs.into_iter().next())
}

fn token_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<TokenResponse>(body)
        .ok()
        .and_then(|r| r.token)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri()).expect("client")
    }

    #[test]
    fn test_credential_stored_form() {
        let bearer = Credential::Bearer("abc".to_string());
        assert_eq!(bearer.to_stored(), "bearer:abc");
        assert_eq!(Credential::from_stored("bearer:abc"), Some(bearer));

        let cookie = Credential::SessionCookie("JSESSIONID=xyz".to_string());
        assert_eq!(cookie.to_stored(), "cookie:JSESSIONID=xyz");
        assert_eq!(Credential::from_stored("cookie:JSESSIONID=xyz"), Some(cookie));

        // Legacy untagged values are bearer tokens
        assert_eq!(
            Credential::from_stored("legacy-token"),
            Some(Credential::Bearer("legacy-token".to_string()))
        );
        assert_eq!(Credential::from_stored(""), None);
        assert_eq!(Credential::from_stored("bearer:"), None);
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let debug = format!("{:?}", Credential::Bearer("secret".to_string()));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_session_cookie_prefers_known_names() {
        let mut headers = header::HeaderMap::new();
        headers.append(header::SET_COOKIE, "theme=dark; Path=/".parse().unwrap());
        headers.append(
            header::SET_COOKIE,
            "JSESSIONID=abc123; Path=/; HttpOnly".parse().unwrap(),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("JSESSIONID=abc123"));

        let mut other = header::HeaderMap::new();
        other.append(header::SET_COOKIE, "sid=1; Path=/".parse().unwrap());
        assert_eq!(session_cookie(&other).as_deref(), Some("sid=1"));

        assert_eq!(session_cookie(&header::HeaderMap::new()), None);
    }

    #[test]
    fn test_server_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/").expect("client");
        assert_eq!(client.server_url(), "http://localhost:8080");
        assert_eq!(client.api_url("/movies"), "http://localhost:8080/api/movies");
    }

    #[tokio::test]
    async fn login_redirect_with_session_cookie() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("username=a%40b.com"))
            .and(body_string_contains("password=x"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/")
                    .insert_header("Set-Cookie", "JSESSIONID=abc123; Path=/; HttpOnly"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let credential = client_for(&server)
            .login("a@b.com", "x")
            .await
            .expect("login succeeds");
        assert_eq!(
            credential,
            Credential::SessionCookie("JSESSIONID=abc123".to_string())
        );
    }

    #[tokio::test]
    async fn login_token_in_body() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-1"})))
            .mount(&server)
            .await;

        let credential = client_for(&server).login("a@b.com", "x").await.expect("login");
        assert_eq!(credential, Credential::Bearer("t-1".to_string()));
    }

    #[tokio::test]
    async fn login_rejected_is_invalid_credentials() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("password=wrong"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login?error"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.login("a@b.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));

        let err = client.login("a@b.com", "other").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_without_credential_is_invalid_response() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = client_for(&server).login("a@b.com", "x").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn login_unreachable_server_is_network_error() {
        let client = ApiClient::new("http://127.0.0.1:1").expect("client");
        let err = client.login("a@b.com", "x").await.unwrap_err();
        assert!(err.is_network());
        assert!(!matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn list_movies_sends_filters() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/movies"))
            .and(query_param("genre", "Drama"))
            .and(query_param("year", "1994"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "m1", "title": "The Shawshank Redemption", "genres": ["Drama"], "releaseYear": 1994}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let filter = MovieFilter {
            genre: Some("Drama".to_string()),
            year: Some(1994),
            ..Default::default()
        };
        let movies = client_for(&server).list_movies(&filter).await.expect("movies");
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, "m1");
    }

    #[tokio::test]
    async fn authenticated_requests_carry_credential() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let profile = json!({"id": "u1", "nickname": "neo", "email": "a@b.com", "profilePicture": null});

        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("Authorization", "Bearer t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile.clone()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("Cookie", "JSESSIONID=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .expect(1)
            .mount(&server)
            .await;

        let base = client_for(&server);
        let bearer = base.with_credential(Some(Credential::Bearer("t-1".to_string())));
        assert_eq!(bearer.fetch_profile().await.expect("profile").id, "u1");

        let cookie =
            base.with_credential(Some(Credential::SessionCookie("JSESSIONID=abc".to_string())));
        assert_eq!(cookie.fetch_profile().await.expect("profile").email, "a@b.com");
    }

    #[tokio::test]
    async fn fetch_profile_unauthorized() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_profile().await.unwrap_err();
        assert!(err.is_session_rejection());
    }

    #[tokio::test]
    async fn delete_review_twice_reports_not_found() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/reviews/r1"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/reviews/r1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/movies/m1/reviews"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "r2", "userId": "u1", "movieId": "m1", "rating": 3, "comment": "ok"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server)
            .with_credential(Some(Credential::Bearer("t-1".to_string())));

        client.delete_review("r1").await.expect("first delete");
        let reviews = client.list_movie_reviews("m1").await.expect("reviews");
        assert!(reviews.iter().all(|r| r.id != "r1"));

        let err = client.delete_review("r1").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn register_conflict_surfaces_message() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/users/register"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Email already exists"))
            .mount(&server)
            .await;

        let registration = Registration {
            nickname: "neo".to_string(),
            email: "a@b.com".to_string(),
            password: "x".to_string(),
            profile_picture: None,
        };
        let err = client_for(&server).register(&registration).await.unwrap_err();
        assert_eq!(err.detail(), "Email already exists");
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/movies/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_movie("m1").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
