//! Blocking HTTP transport
//!
//! [`HttpTransport`] is the production [`Transport`]: one `reqwest` blocking
//! client, built once with the configured timeout and reused for every call.

use crate::config::GatewayConfig;
use crate::core::traits::Transport;
use crate::types::GatewayError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Transport that POSTs form bodies over HTTPS
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build the underlying HTTP client
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the TLS backend cannot be initialised.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, url: &str, body: &str) -> Result<String, GatewayError> {
        tracing::debug!(url, bytes = body.len(), "posting form to gateway");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body.to_string())
            .send()?
            .error_for_status()?;

        let text = response.text()?;
        tracing::debug!(url, bytes = text.len(), "gateway responded");
        Ok(text)
    }
}
