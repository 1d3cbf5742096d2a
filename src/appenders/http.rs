//! HTTP transport for JSON appenders
//!
//! Appenders build the request body; the transport owns the connection,
//! compression and timeouts. [`UreqTransport`] keeps a persistent agent and
//! gzips bodies when compression is enabled.

use crate::core::{AppenderError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

/// TLS settings for `https` endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SslOptions {
    /// Verify the server certificate
    #[serde(default = "default_verify_peer")]
    pub verify_peer: bool,
}

fn default_verify_peer() -> bool {
    true
}

impl Default for SslOptions {
    fn default() -> Self {
        Self { verify_peer: true }
    }
}

/// Connection settings passed through to the transport unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOptions {
    pub url: String,
    pub compress: bool,
    pub ssl: SslOptions,
    /// Time allowed to establish the connection
    pub open_timeout: Duration,
    /// Time allowed to wait for the response
    pub read_timeout: Duration,
    /// Time allowed to wait for `100 Continue`
    pub continue_timeout: Duration,
}

impl HttpOptions {
    pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_CONTINUE_TIMEOUT: Duration = Duration::from_secs(1);

    /// Validate `url` and fill in the defaults
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        validate_url(&url)?;
        Ok(Self {
            url,
            compress: true,
            ssl: SslOptions::default(),
            open_timeout: Self::DEFAULT_OPEN_TIMEOUT,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            continue_timeout: Self::DEFAULT_CONTINUE_TIMEOUT,
        })
    }

    pub fn use_tls(&self) -> bool {
        self.url.starts_with("https://")
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(AppenderError::config("http", "url is required"));
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            AppenderError::config(
                "http",
                format!("url '{}' must start with http:// or https://", url),
            )
        })?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(AppenderError::config(
            "http",
            format!("url '{}' has no host", url),
        ));
    }
    Ok(())
}

/// One request: fixed headers plus a pre-serialized JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<()>;
}

/// Gzip `body` at the default compression level
pub fn gzip(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

/// Blocking transport over a persistent `ureq` agent
#[cfg(feature = "http")]
pub struct UreqTransport {
    agent: ureq::Agent,
    options: HttpOptions,
}

#[cfg(feature = "http")]
impl UreqTransport {
    pub fn new(options: HttpOptions) -> Result<Self> {
        validate_url(&options.url)?;

        let mut config = ureq::Agent::config_builder()
            .timeout_connect(Some(options.open_timeout))
            .timeout_recv_response(Some(options.read_timeout))
            .timeout_await_100(Some(options.continue_timeout));
        if options.use_tls() {
            let tls = ureq::tls::TlsConfig::builder()
                .disable_verification(!options.ssl.verify_peer)
                .build();
            config = config.tls_config(tls);
        }

        Ok(Self {
            agent: config.build().into(),
            options,
        })
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }
}

#[cfg(feature = "http")]
impl HttpTransport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<()> {
        let mut builder = self.agent.post(self.options.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = if self.options.compress {
            let body = gzip(request.body.as_bytes())?;
            builder
                .header("Content-Encoding", "gzip")
                .send(body.as_slice())
        } else {
            builder.send(request.body.as_bytes())
        };

        let delivery =
            |e: ureq::Error| AppenderError::delivery(self.options.url.as_str(), e.to_string());

        // The connection only returns to the agent's pool once the body is consumed.
        let mut response = result.map_err(delivery)?;
        response.body_mut().read_to_vec().map_err(delivery)?;
        Ok(())
    }
}
