//! Typed client for the simulation backend.
//!
//! All endpoints go through one private `send` helper, which owns the base URL,
//! headers, timeouts and status/decoding errors.

pub mod types;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::config::{AppConfig, DatabaseConfig};
use types::{
    BatchProfiles, BatchProfilesRequest, ConnectionStatus, DayReport, FriendIds, PingStatus,
    RandomUser, Recommendations, SimpleProfile, TotalCount, UserId, UserProfile,
};

const USER_AGENT: &str = concat!("synthdash/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP client build failed: {0}")]
    ClientBuild(reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        source: serde_json::Error,
    },
}

/// Request payload, either nothing or a JSON body
enum Body<'a, T: Serialize> {
    Empty,
    Json(&'a T),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(config.base_url.clone()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the raw body of a successful response
    async fn send<B: Serialize>(
        &self,
        method: Method,
        endpoint: &'static str,
        query: Option<UserId>,
        body: Body<'_, B>,
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%method, %url, id = ?query, "api request");

        let mut request = self.http.request(method, &url);
        if let Some(id) = query {
            request = request.query(&[("id", id)]);
        }
        if let Body::Json(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|source| {
            tracing::warn!(endpoint, error = %source, "api request failed");
            ApiError::Transport { endpoint, source }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "api returned error status");
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    async fn request<B, T>(
        &self,
        method: Method,
        endpoint: &'static str,
        query: Option<UserId>,
        body: Body<'_, B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let text = self.send(method, endpoint, query, body).await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode { endpoint, source })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: Option<UserId>,
    ) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, endpoint, query, Body::Empty).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, endpoint, None, Body::Json(body)).await
    }

    /// Reset the simulation on the backend
    pub async fn refresh_db(&self) -> Result<(), ApiError> {
        // Response body is not part of the contract
        self.send::<()>(Method::POST, "/refresh_db", None, Body::Empty)
            .await
            .map(|_| ())
    }

    pub async fn total_count(&self) -> Result<u64, ApiError> {
        let count: TotalCount = self.get("/get_total_count", None).await?;
        Ok(count.total_users)
    }

    /// Advance the simulation by one day
    pub async fn simulate_day(&self) -> Result<DayReport, ApiError> {
        self.post("/simulate_day", &serde_json::json!({})).await
    }

    pub async fn random_user_id(&self) -> Result<UserId, ApiError> {
        let user: RandomUser = self.get("/random_user_id", None).await?;
        Ok(user.user_id)
    }

    pub async fn user_profile(&self, id: UserId) -> Result<UserProfile, ApiError> {
        self.get("/get_user_profile", Some(id)).await
    }

    pub async fn user_friends(&self, id: UserId) -> Result<Vec<UserId>, ApiError> {
        let ids: FriendIds = self.get("/get_user_friends", Some(id)).await?;
        Ok(ids.friends)
    }

    pub async fn batch_simple_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<SimpleProfile>, ApiError> {
        let batch: BatchProfiles = self
            .post("/batch_get_simple_profiles", &BatchProfilesRequest { ids })
            .await?;
        Ok(batch.profiles)
    }

    /// Friends-of-friends recommendations
    pub async fn recommend_fof(&self, id: UserId) -> Result<Vec<UserId>, ApiError> {
        let recs: Recommendations = self.get("/recommend_fof", Some(id)).await?;
        Ok(recs.recommendations)
    }

    /// Recommendations with no graph relation to the user
    pub async fn recommend_strangers(&self, id: UserId) -> Result<Vec<UserId>, ApiError> {
        let recs: Recommendations = self.get("/recommend_strangers", Some(id)).await?;
        Ok(recs.recommendations)
    }

    pub async fn ping(&self) -> Result<PingStatus, ApiError> {
        self.get("/ping", None).await
    }

    pub async fn set_db_connection(
        &self,
        database: &DatabaseConfig,
    ) -> Result<ConnectionStatus, ApiError> {
        self.post("/set_db_connection", database).await
    }

    /// Resolve IDs into display profiles, skipping the round trip for none
    pub async fn resolve_profiles(&self, ids: &[UserId]) -> Result<Vec<SimpleProfile>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.batch_simple_profiles(ids).await
    }

    pub async fn friends_with_profiles(&self, id: UserId) -> Result<Vec<SimpleProfile>, ApiError> {
        let ids = self.user_friends(id).await?;
        self.resolve_profiles(&ids).await
    }

    pub async fn fof_with_profiles(&self, id: UserId) -> Result<Vec<SimpleProfile>, ApiError> {
        let ids = self.recommend_fof(id).await?;
        self.resolve_profiles(&ids).await
    }

    pub async fn strangers_with_profiles(
        &self,
        id: UserId,
    ) -> Result<Vec<SimpleProfile>, ApiError> {
        let ids = self.recommend_strangers(id).await?;
        self.resolve_profiles(&ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[test]
    fn test_rejects_base_url_without_scheme() {
        let config = AppConfig {
            base_url: "localhost:8080/api".to_string(),
            ..Default::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(ApiError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn test_endpoints_decode_typed_responses() {
        let backend = FakeBackend::start().await;
        let client = backend.client();

        assert_eq!(client.total_count().await.unwrap(), 500);
        assert_eq!(client.random_user_id().await.unwrap(), 317);

        let profile = client.user_profile(317).await.unwrap();
        assert_eq!(profile.display_name(), "A. B.");
        assert_eq!(profile.interests.len(), 1);

        assert_eq!(client.user_friends(317).await.unwrap(), vec![12, 45]);

        let report = client.simulate_day().await.unwrap();
        assert_eq!(report.new_users, 10);
        assert_eq!(report.new_friendships, 22);
        assert_eq!(report.total_interactions, 140);

        assert_eq!(client.ping().await.unwrap().status, "ok");
        let status = client
            .set_db_connection(&DatabaseConfig::default())
            .await
            .unwrap();
        assert_eq!(status.status, "connected");
    }

    #[tokio::test]
    async fn test_friends_resolve_in_second_round_trip() {
        let backend = FakeBackend::start().await;
        let client = backend.client();

        let friends = client.friends_with_profiles(317).await.unwrap();
        let ids: Vec<UserId> = friends.iter().map(|p| p.user_id).collect();

        assert_eq!(ids, vec![12, 45]);
        assert_eq!(backend.hits("/get_user_friends"), 1);
        assert_eq!(backend.hits("/batch_get_simple_profiles"), 1);
    }

    #[tokio::test]
    async fn test_empty_id_list_skips_batch_request() {
        let backend = FakeBackend::start().await;
        backend.set_friends(Vec::new());
        let client = backend.client();

        let friends = client.friends_with_profiles(317).await.unwrap();

        assert!(friends.is_empty());
        assert_eq!(backend.hits("/batch_get_simple_profiles"), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let backend = FakeBackend::start().await;
        let client = backend.client();

        let err = client.user_profile(999_999).await.unwrap_err();
        match err {
            ApiError::Status {
                endpoint, status, ..
            } => {
                assert_eq!(endpoint, "/get_user_profile");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let config = AppConfig {
            base_url: "http://127.0.0.1:1/api".to_string(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();

        let err = client.total_count().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { endpoint: "/get_total_count", .. }));
    }
}
