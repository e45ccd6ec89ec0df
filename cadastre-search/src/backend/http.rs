//! Client HTTP vers l'API Urbania (reqwest)

use std::time::Duration;

use geojson::{Feature, FeatureCollection};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::CadastreBackend;
use crate::types::GeocodeResult;
use crate::BackendError;

/// URL par défaut de l'API (serveur de développement)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8010/api";

/// User-Agent envoyé par défaut
pub const DEFAULT_USER_AGENT: &str = concat!("urbania-cadastre/", env!("CARGO_PKG_VERSION"));

/// Configuration du client backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    /// Jeton `Bearer` optionnel (pas de rafraîchissement)
    pub token: Option<String>,
    /// Pas de timeout par défaut
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: None,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl BackendConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("URBANIA_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            token: std::env::var("URBANIA_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout: std::env::var("URBANIA_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            user_agent: std::env::var("URBANIA_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.into()),
        }
    }
}

/// Corps d'erreur renvoyé par l'API : `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    #[serde(default)]
    sections: Vec<String>,
}

/// Backend HTTP (async)
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Construit le client HTTP
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::InvalidConfig(format!(
                "base URL must start with http:// or https://: {}",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| BackendError::InvalidConfig("invalid API token".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET JSON avec mapping des statuts en [`BackendError`]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .map(|b| b.error);
            warn!(url = %url, status = status.as_u16(), message = ?message, "Backend error");
            return Err(BackendError::status(status.as_u16(), message));
        }

        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl CadastreBackend for HttpBackend {
    async fn geocode(&self, query: &str, limit: usize) -> Result<Vec<GeocodeResult>, BackendError> {
        let response: GeocodeResponse = self
            .get_json(
                "cadastre/geocode/",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(response.results)
    }

    async fn parcels_by_municipality(&self, code: &str) -> Result<FeatureCollection, BackendError> {
        self.get_json(&format!("cadastre/parcelles/{}/", code), &[])
            .await
    }

    async fn parcel_at(&self, lon: f64, lat: f64) -> Result<Feature, BackendError> {
        self.get_json(
            "cadastre/parcelle/coords/",
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
        )
        .await
    }

    async fn parcel_by_reference(
        &self,
        code: &str,
        section: &str,
        number: &str,
    ) -> Result<Feature, BackendError> {
        self.get_json(
            &format!("cadastre/parcelle/{}/{}/{}/", code, section, number),
            &[],
        )
        .await
    }

    async fn sections(&self, code: &str) -> Result<Vec<String>, BackendError> {
        let response: SectionsResponse = self
            .get_json(&format!("cadastre/sections/{}/", code), &[])
            .await?;
        Ok(response.sections)
    }
}
