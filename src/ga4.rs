// GA4 Data API Client
//
// Thin REST client for `properties/{id}:runReport`. Authentication is either a
// service account exchange through yup-oauth2 or a bearer token handed in
// from outside.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::ServiceAccountAuthenticator;

use crate::config::{materialize_credentials, Config};
use crate::fetcher::ReportSource;
use crate::models::{ReportPage, ReportQuery, RunReportResponse};

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

pub enum Ga4Auth {
    ServiceAccount(DefaultAuthenticator),
    StaticToken(String),
}

impl Ga4Auth {
    /// Static token when one is configured, otherwise the service account key
    /// file (written from the environment blob first if needed)
    pub async fn from_config(config: &Config) -> Result<Self> {
        if let Some(token) = &config.access_token {
            info!("Using pre-issued GA4 access token");
            return Ok(Ga4Auth::StaticToken(token.clone()));
        }

        materialize_credentials(config.credentials_json.as_deref(), &config.credentials_file)?;
        Self::service_account(&config.credentials_file).await
    }

    pub async fn service_account(key_file: &Path) -> Result<Self> {
        let key = yup_oauth2::read_service_account_key(key_file)
            .await
            .with_context(|| format!("failed to load service account key {}", key_file.display()))?;
        let authenticator = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("failed to build service account authenticator")?;
        Ok(Ga4Auth::ServiceAccount(authenticator))
    }

    pub async fn bearer_token(&self) -> Result<String> {
        match self {
            Ga4Auth::StaticToken(token) => Ok(token.clone()),
            Ga4Auth::ServiceAccount(authenticator) => {
                let token = authenticator
                    .token(&[ANALYTICS_READONLY_SCOPE])
                    .await
                    .context("GA4 authentication failed")?;
                token
                    .token()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("GA4 authentication returned no access token"))
            }
        }
    }
}

/// Error body of Google APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

pub struct Ga4Client {
    client: Client,
    base_url: String,
    auth: Ga4Auth,
}

impl Ga4Client {
    pub fn new(base_url: &str, auth: Ga4Auth) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let auth = Ga4Auth::from_config(config).await?;
        Ok(Self::new(&config.ga4_api_base, auth))
    }

    /// Obtain one token up front so bad credentials fail before any fetching
    pub async fn authenticate(&self) -> Result<()> {
        self.auth.bearer_token().await?;
        info!("GA4 authentication succeeded");
        Ok(())
    }

    pub fn run_report_url(&self, property_id: &str) -> String {
        format!("{}/v1beta/properties/{}:runReport", self.base_url, property_id)
    }
}

impl ReportSource for Ga4Client {
    async fn run_report(&self, query: &ReportQuery) -> Result<ReportPage> {
        let token = self.auth.bearer_token().await?;
        let url = self.run_report_url(&query.property_id);
        debug!("POST {} offset={} limit={}", url, query.page_offset, query.page_size);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&query.to_request())
            .send()
            .await
            .context("GA4 runReport request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => bail!(
                    "GA4 API error {} {}: {}",
                    status,
                    parsed.error.status,
                    parsed.error.message
                ),
                Err(_) => bail!("GA4 API error {}: {}", status, body),
            }
        }

        let response: RunReportResponse = resp
            .json()
            .await
            .context("GA4 runReport response parse failed")?;
        Ok(ReportPage::from(response))
    }
}
