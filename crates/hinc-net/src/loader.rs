//! Resource Loader
//!
//! Blocking GET client built on reqwest, plus `file:` URLs read from disk.

use crate::{Fetch, NetError, Response};
use std::time::Duration;
use url::Url;

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// User agent string
    pub user_agent: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("hinclude/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Load resources from network or disk
pub struct ResourceLoader {
    client: reqwest::blocking::Client,
}

impl ResourceLoader {
    pub fn new() -> Result<Self, NetError> {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetch a URL with GET
    pub fn get(&self, url: &Url) -> Result<Response, NetError> {
        match url.scheme() {
            "http" | "https" => self.get_http(url),
            "file" => get_file(url),
            other => Err(NetError::InvalidUrl(format!("unsupported scheme {other}: {url}"))),
        }
    }

    fn get_http(&self, url: &Url) -> Result<Response, NetError> {
        tracing::info!("HTTP GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| NetError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .bytes()
            .map_err(|e| NetError::Network(e.to_string()))?
            .to_vec();

        tracing::debug!("HTTP {} {} ({} bytes)", status, url, body.len());
        Ok(Response { status, headers, body })
    }
}

impl Fetch for ResourceLoader {
    fn fetch(&self, url: &Url) -> Result<Response, NetError> {
        self.get(url)
    }
}

fn get_file(url: &Url) -> Result<Response, NetError> {
    let path = url
        .to_file_path()
        .map_err(|()| NetError::InvalidUrl(url.to_string()))?;

    tracing::info!("FILE {}", path.display());

    match std::fs::read(&path) {
        Ok(body) => Ok(Response::new(200, body)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Response::new(404, Vec::new())),
        Err(e) => Err(e.into()),
    }
}
