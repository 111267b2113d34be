//! Where the GitHub access token comes from.
//!
//! A token is either fixed for the life of the process ([`StaticToken`]) or
//! managed by an external connector that hands out short-lived tokens
//! ([`ConnectorTokenSource`]). The REST client asks its source for a token on
//! every call, so an expired connector token is never reused.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use orrery_config::GitHubConfig;
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::decode;
use crate::error::GitHubError;

pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String, GitHubError>;
}

/// A token known up front, usually a personal access token from the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Read the token from `var`. An unset or blank variable yields a source
    /// that reports "GitHub not connected" when asked.
    pub fn from_env(var: &str) -> Self {
        Self {
            token: std::env::var(var).ok().filter(|t| !t.trim().is_empty()),
        }
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String, GitHubError> {
        self.token.clone().ok_or(GitHubError::NotConnected)
    }
}

/// Connection settings as returned by the connector endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub oauth: Option<OAuthSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthSettings {
    #[serde(default)]
    pub credentials: Option<OAuthCredentials>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCredentials {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl ConnectionSettings {
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        let raw = self.expires_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Settings without a parseable expiry are never reused.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expiry().is_some_and(|expiry| expiry > now)
    }

    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or_else(|| {
                self.oauth
                    .as_ref()?
                    .credentials
                    .as_ref()?
                    .access_token
                    .as_deref()
            })
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionList {
    #[serde(default)]
    items: Vec<ConnectionItem>,
}

#[derive(Debug, Deserialize)]
struct ConnectionItem {
    #[serde(default)]
    settings: Option<ConnectionSettings>,
}

/// Time-limited token fetched from a connector service and cached until it
/// expires.
pub struct ConnectorTokenSource {
    endpoint: String,
    identity: Option<String>,
    identity_header: String,
    agent: ureq::Agent,
    cached: Mutex<Option<ConnectionSettings>>,
}

impl ConnectorTokenSource {
    pub fn new(
        endpoint: impl Into<String>,
        identity: Option<String>,
        identity_header: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            identity,
            identity_header: identity_header.into(),
            agent: ureq::Agent::new(),
            cached: Mutex::new(None),
        }
    }

    fn fetch(&self) -> Result<Option<ConnectionSettings>, GitHubError> {
        let identity = self
            .identity
            .as_deref()
            .filter(|i| !i.is_empty())
            .ok_or(GitHubError::MissingIdentity)?;
        let url = format!(
            "{}?include_secrets=true&connector_names=github",
            self.endpoint
        );
        debug!("Fetching GitHub connection settings from {}", self.endpoint);
        let list: ConnectionList = decode(
            self.agent
                .get(&url)
                .set("Accept", "application/json")
                .set(&self.identity_header, identity)
                .call(),
        )?;
        Ok(list.items.into_iter().next().and_then(|item| item.settings))
    }
}

impl TokenSource for ConnectorTokenSource {
    fn access_token(&self) -> Result<String, GitHubError> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = cached
            .as_ref()
            .filter(|s| s.is_fresh(Utc::now()))
            .and_then(ConnectionSettings::token)
        {
            return Ok(token.to_string());
        }

        let settings = self.fetch()?;
        let token = settings
            .as_ref()
            .and_then(ConnectionSettings::token)
            .map(str::to_string)
            .ok_or(GitHubError::NotConnected)?;
        if let Some(expiry) = settings.as_ref().and_then(ConnectionSettings::expiry) {
            info!("GitHub connection token valid until {expiry}");
        }
        *cached = settings;
        Ok(token)
    }
}

/// The connector when one is configured, otherwise the token environment
/// variable.
pub fn token_source(config: &GitHubConfig) -> Arc<dyn TokenSource> {
    match &config.connector_url {
        Some(endpoint) => Arc::new(ConnectorTokenSource::new(
            endpoint.clone(),
            std::env::var(&config.connector_identity_env).ok(),
            config.connector_identity_header.clone(),
        )),
        None => Arc::new(StaticToken::from_env(&config.token_env)),
    }
}
