//! Configuration module for the admin client
//!
//! This module handles loading and parsing client configuration from TOML files.

use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Default number of entities requested per page when listing everything
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Admin API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Base URL of the admin API
    #[serde(default = "default_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Page size used by exhaustive listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

/// Token authentication against the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether the token header is sent
    #[serde(default)]
    pub enabled: bool,
    /// Header carrying the token
    #[serde(default = "default_auth_header_name")]
    pub header_name: String,
    /// Admin token
    #[serde(default)]
    pub token: String,
}

fn default_auth_header_name() -> String {
    "Kong-Admin-Token".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            header_name: default_auth_header_name(),
            token: String::new(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether request metrics are collected
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Additional headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load configuration from a TOML string
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let config: ClientConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.admin.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "Admin URL '{}' must start with http:// or https://",
                self.admin.url
            );
        }

        if self.admin.timeout == 0 {
            anyhow::bail!("Admin timeout must be greater than zero");
        }

        if self.admin.page_size == 0 {
            anyhow::bail!("Page size must be greater than zero");
        }

        if self.auth.enabled {
            if self.auth.token.is_empty() {
                anyhow::bail!("Token authentication is enabled but no token is configured");
            }
            if HeaderName::from_bytes(self.auth.header_name.as_bytes()).is_err() {
                anyhow::bail!("Invalid auth header name '{}'", self.auth.header_name);
            }
        }

        for name in self.headers.keys() {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                anyhow::bail!("Invalid header name '{}'", name);
            }
        }

        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn admin_url(&self) -> &str {
        self.admin.url.trim().trim_end_matches('/')
    }

    /// Headers to attach to every request, including the auth token when enabled
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.sort();
        if self.auth.enabled {
            headers.push((self.auth.header_name.clone(), self.auth.token.clone()));
        }
        headers
    }
}
