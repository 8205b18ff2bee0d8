// HTTP client for the mediator, auth and face-recognition endpoints

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::MediatorApi;
use crate::config::Config;
use crate::models::{
    ClusterCollection, Face, FaceExtractionCollection, JobMediatorInput, MediatorJob, Token,
};
use crate::types::{AppError, AppResult};

// Tokens are renewed this long before they would expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    authorization: String,
    refresh_at: Instant,
}

pub struct MediatorClient {
    client: Client,
    base_url: Url,
    client_key: String,
    client_secret: String,
    token_ttl: Duration,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl MediatorClient {
    pub fn new(
        host: &str,
        client_key: impl Into<String>,
        client_secret: impl Into<String>,
        token_ttl: Duration,
    ) -> AppResult<Self> {
        let base_url = Url::parse(host)
            .map_err(|e| AppError::Config(format!("invalid mediator host {}: {}", host, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("mediator host {} cannot be a base URL", host)));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            client_key: client_key.into(),
            client_secret: client_secret.into(),
            token_ttl,
            token: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.host,
            config.client_key.clone(),
            config.client_secret.clone(),
            config.pipeline.token_ttl(),
        )
    }

    pub fn host(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Exchange the client key and secret for a token
    pub async fn get_access_token(&self) -> AppResult<Token> {
        let response = self
            .client
            .get(self.endpoint(&["auth", "access-token"]))
            .header("client", &self.client_key)
            .header("secret", &self.client_secret)
            .send()
            .await?;

        decode(response).await
    }

    fn cache_entry(&self, token: &Token) -> CachedToken {
        let ttl = token.expires_in.map(Duration::from_secs).unwrap_or(self.token_ttl);
        debug!(ttl_secs = ttl.as_secs(), "Caching access token");

        CachedToken {
            authorization: token.authorization.clone(),
            refresh_at: Instant::now() + ttl.saturating_sub(TOKEN_REFRESH_MARGIN),
        }
    }

    async fn refresh_token(&self, cached: &mut Option<CachedToken>) -> AppResult<String> {
        let token = self.get_access_token().await?;
        let entry = self.cache_entry(&token);
        let authorization = entry.authorization.clone();
        *cached = Some(entry);
        Ok(authorization)
    }

    async fn authorization(&self) -> AppResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.authorization.clone());
            }
        }
        self.refresh_token(&mut cached).await
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Send an authorized request, renewing the token once on 401
    async fn send_authorized<T, F>(&self, build: F) -> AppResult<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let authorization = self.authorization().await?;
        let response = build(&self.client)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }

        warn!("Mediator rejected the access token, requesting a new one");
        self.invalidate_token().await;
        let authorization = self.authorization().await?;
        let response = build(&self.client)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        // Body decoding reports as Json, so only transport faults stay Http
        let body = response.bytes().await?;
        return Ok(serde_json::from_slice(&body)?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(body);

    Err(AppError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MediatorApi for MediatorClient {
    async fn authenticate(&self) -> AppResult<Token> {
        info!(host = %self.base_url, "Retrieving access token");
        let token = self.get_access_token().await?;
        *self.token.lock().await = Some(self.cache_entry(&token));
        Ok(token)
    }

    async fn create_job(&self, input: &JobMediatorInput) -> AppResult<MediatorJob> {
        let url = self.endpoint(&["jobs"]);
        self.send_authorized(|client| client.post(url.clone()).json(input))
            .await
    }

    async fn get_job_by_id(&self, job_id: &str) -> AppResult<MediatorJob> {
        let url = self.endpoint(&["jobs", job_id]);
        self.send_authorized(|client| client.get(url.clone())).await
    }

    async fn get_face_extraction_collection(
        &self,
        project_service_id: &str,
        face_extraction_id: &str,
    ) -> AppResult<FaceExtractionCollection> {
        let url = self.endpoint(&[
            "face-recognition",
            project_service_id,
            "face-extractions",
            face_extraction_id,
        ]);
        self.send_authorized(|client| client.get(url.clone())).await
    }

    async fn get_face(&self, project_service_id: &str, face_id: &str) -> AppResult<Face> {
        let url = self.endpoint(&["face-recognition", project_service_id, "faces", face_id]);
        self.send_authorized(|client| client.get(url.clone())).await
    }

    async fn get_cluster_collection(
        &self,
        project_service_id: &str,
        cluster_collection_id: &str,
    ) -> AppResult<ClusterCollection> {
        let url = self.endpoint(&[
            "face-recognition",
            project_service_id,
            "cluster-collections",
            cluster_collection_id,
        ]);
        self.send_authorized(|client| client.get(url.clone())).await
    }
}
