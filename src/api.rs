// API client module: a small blocking HTTP client for the trickle
// journaling service. It is intentionally small and synchronous; every
// command issues at most a couple of requests and then exits.

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::session::{Session, UserRecord};

/// Production endpoint of the trickle service.
pub const DEFAULT_ENDPOINT: &str = "https://trickle-api.appspot.com";

/// Page size used when listing a user's topics.
pub const TOPICS_PER_PAGE: u32 = 20;

/// Failures surfaced by [`ApiClient`] calls. None of them are retried;
/// a failed call terminates the current command.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered the login request but rejected the credentials.
    #[error("Request is not succeeded")]
    Auth,
    /// Any non-200 response.
    #[error("Request Error(status_code={status})")]
    Request { status: u16 },
    /// The configured access token contains bytes that cannot go into an
    /// Authorization header.
    #[error("Access token is not a valid header value")]
    Token,
    /// Transport failure or a response body that does not decode into the
    /// expected shape.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Blocking API client holding the base URL and an optional bearer token
/// for authenticated calls.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Response of `/v1/auth/sign_in`. `user` and `accessToken` are only
/// present when `success` is true.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub access_token: String,
}

/// A named discussion/journal thread owned by a user. Only the fields the
/// CLI consumes are decoded.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Topic {
    pub id: i64,
    pub title: String,
}

/// A timestamped memo entry attached to a topic.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub created_at: DateTime<Utc>,
    pub topic: Topic,
    pub memo: String,
}

/// Envelope returned by the topic index endpoint.
#[derive(Serialize, Deserialize, Debug)]
pub struct TopicsResponse {
    pub topics: Vec<Topic>,
}

/// Envelope returned by both activity index endpoints.
#[derive(Serialize, Deserialize, Debug)]
pub struct ActivitiesResponse {
    pub activities: Vec<Activity>,
}

impl ApiClient {
    /// Create a client for the given base URL, without a token.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client configured from the environment variable
    /// `TRICKLE_API_ENDPOINT`, falling back to the production endpoint.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("TRICKLE_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
        Self::new(&base_url)
    }

    /// Store a bearer token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Returns whether a token is present in the client.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Headers sent on every request; the Authorization header is attached
    /// only when `auth` is requested and a token is set. A token that is
    /// not header-safe fails before any request goes out.
    fn headers(&self, auth: bool) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if auth {
            if let Some(t) = &self.token {
                let val = format!("Bearer {}", t);
                let val = HeaderValue::from_str(&val).map_err(|_| ApiError::Token)?;
                headers.insert(AUTHORIZATION, val);
            }
        }
        Ok(headers)
    }

    /// Authenticated GET. A query value is serialized into the `json` query
    /// parameter, which is how the service expects its filters.
    pub fn get<T: DeserializeOwned>(&self, path: &str, query: Option<&Value>) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.get(&url).headers(self.headers(true)?);
        if let Some(q) = query {
            req = req.query(&[("json", q.to_string())]);
        }
        let res = req.send()?;
        if res.status().as_u16() != 200 {
            return Err(ApiError::Request {
                status: res.status().as_u16(),
            });
        }
        Ok(res.json()?)
    }

    fn post_raw(
        &self,
        path: &str,
        body: &Value,
        auth: bool,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .headers(self.headers(auth)?)
            .json(body)
            .send()?;
        if res.status().as_u16() != 200 {
            return Err(ApiError::Request {
                status: res.status().as_u16(),
            });
        }
        Ok(res)
    }

    /// Authenticated POST with a JSON body. Same failure contract as `get`.
    pub fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        Ok(self.post_raw(path, body, true)?.json()?)
    }

    /// Authenticate against `/v1/auth/sign_in`. On success the token is kept
    /// on the client and the full session is returned for persistence.
    pub fn login(&mut self, user: &str, password: &str) -> Result<Session, ApiError> {
        let body = json!({ "name": user, "password": password });
        let resp: LoginResponse = self.post_raw("/v1/auth/sign_in", &body, false)?.json()?;
        let me = match resp.user {
            // A usable session needs a user record and a non-empty token.
            Some(user) if resp.success && !resp.access_token.is_empty() => user,
            _ => return Err(ApiError::Auth),
        };
        self.token = Some(resp.access_token.clone());
        Ok(Session {
            me,
            access_token: resp.access_token,
        })
    }

    pub fn get_activity(&self, activity_id: i64) -> Result<Activity, ApiError> {
        self.get("/v1/activities", Some(&json!({ "id": activity_id })))
    }

    pub fn get_user_activities(&self, user_id: i64) -> Result<ActivitiesResponse, ApiError> {
        self.get("/v1/activities/index", Some(&json!({ "userId": user_id })))
    }

    pub fn get_topic_activities(&self, topic_id: i64) -> Result<ActivitiesResponse, ApiError> {
        self.get(
            "/v1/activities/index_by_topic",
            Some(&json!({ "topicId": topic_id })),
        )
    }

    pub fn get_topic(&self, topic_id: i64) -> Result<Topic, ApiError> {
        self.get("/v1/topics", Some(&json!({ "id": topic_id })))
    }

    pub fn get_user_topics(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<TopicsResponse, ApiError> {
        self.get(
            "/v1/topics/index",
            Some(&json!({ "userId": user_id, "page": page, "perPage": per_page })),
        )
    }
}
