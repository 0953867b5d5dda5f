//! HTTP client for the DevTest Registry.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::endpoints::{Endpoints, DCM_ACCEPT};
use crate::error::DevTestError;
use crate::Result;

/// User agent for registry requests.
pub const USER_AGENT_VALUE: &str = concat!("devtest-client/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn any status other than `expected` into `UnexpectedStatus`.
    pub fn expect_status(self, expected: u16) -> Result<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(self.into_unexpected())
        }
    }

    pub fn into_unexpected(self) -> DevTestError {
        DevTestError::UnexpectedStatus {
            url: self.url,
            status: self.status,
            body: self.body,
        }
    }
}

/// DevTest Registry client
#[derive(Debug, Clone)]
pub struct DevTestClient {
    http: reqwest::Client,
    config: RegistryConfig,
    endpoints: Endpoints,
}

impl DevTestClient {
    /// Create a client; fails on an unusable config.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .danger_accept_invalid_certs(config.trust_any_certificate)
            .build()
            .map_err(|e| DevTestError::Http(format!("failed to create HTTP client: {e}")))?;

        let endpoints = Endpoints::new(&config.base_url());
        Ok(DevTestClient {
            http,
            config,
            endpoints,
        })
    }

    /// Create client from `DEVTEST_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(RegistryConfig::from_env())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Request builder with basic auth when a username is configured.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.username {
            Some(user) => builder.basic_auth(user, self.config.password.as_deref()),
            None => builder,
        }
    }

    /// Send a request and read the whole body.
    pub(crate) async fn send(&self, url: &str, builder: RequestBuilder) -> Result<Reply> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url, status, "registry response");
        Ok(Reply {
            url: url.to_string(),
            status,
            body,
        })
    }

    pub(crate) async fn get(&self, url: &str, accept: Option<&str>) -> Result<Reply> {
        let mut builder = self.request(Method::GET, url);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        self.send(url, builder).await
    }

    pub(crate) async fn post_multipart(
        &self,
        url: &str,
        form: reqwest::multipart::Form,
        accept: Option<&str>,
    ) -> Result<Reply> {
        let mut builder = self.request(Method::POST, url).multipart(form);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        self.send(url, builder).await
    }

    pub(crate) async fn post_empty(&self, url: &str, accept: &str) -> Result<Reply> {
        let builder = self.request(Method::POST, url).header(ACCEPT, accept);
        self.send(url, builder).await
    }

    pub(crate) async fn delete(&self, url: &str, accept: &str) -> Result<Reply> {
        let builder = self.request(Method::DELETE, url).header(ACCEPT, accept);
        self.send(url, builder).await
    }

    /// GET `url` and write the body verbatim to `dest`, creating parent directories.
    ///
    /// Returns the body so callers can inspect what was stored.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<String> {
        let reply = self.get(url, None).await?;
        if !reply.is_success() {
            return Err(reply.into_unexpected());
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &reply.body).await?;
        debug!(url, dest = %dest.display(), bytes = reply.body.len(), "report downloaded");
        Ok(reply.body)
    }

    /// Verify the registry answers with the configured credentials.
    pub async fn check_connection(&self) -> Result<()> {
        let url = self.endpoints.dcm();
        info!(url = %url, "checking DevTest Registry connection");
        let reply = self.get(&url, Some(DCM_ACCEPT)).await?;
        match reply.status {
            200 if reply.body.trim().is_empty() => {
                Err(DevTestError::InvalidCredentials { url: reply.url })
            }
            200 => Ok(()),
            _ => Err(reply.into_unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_missing_host() {
        let err = DevTestClient::new(RegistryConfig::default()).unwrap_err();
        assert!(matches!(err, DevTestError::InvalidConfig(_)));
    }

    #[test]
    fn test_endpoints_follow_config() {
        let client = DevTestClient::new(RegistryConfig::new("registry", 2010).with_secured(true))
            .unwrap();
        assert_eq!(client.endpoints().base_url(), "https://registry:2010");
        assert_eq!(client.config().port, 2010);
    }

    #[test]
    fn test_reply_status_helpers() {
        let reply = Reply {
            url: "u".into(),
            status: 204,
            body: String::new(),
        };
        assert!(reply.is_success());
        let err = reply.expect_status(201).unwrap_err();
        assert!(matches!(err, DevTestError::UnexpectedStatus { status: 204, .. }));
    }
}
