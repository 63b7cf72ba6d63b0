//! Gateway configuration
//!
//! Configuration is resolved once into a [`GatewayConfig`] and handed to the
//! client's constructor. Endpoint selection (live vs. test) is fixed at that
//! point.

use crate::types::GatewayError;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

const LIVE_BASE_URL: &str = "https://www.skipjackic.com/scripts/evolvcc.dll";
const TEST_BASE_URL: &str = "https://developer.skipjackic.com/scripts/evolvcc.dll";

/// Gateway credentials and endpoint selection
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Use the developer (test) endpoints and mark records as test requests
    pub debug_mode: bool,
    pub serial_number: String,
    pub developer_serial_number: String,
    /// Credentials for the report API
    pub login_serial_number: Option<String>,
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Create a configuration with the two identification serial numbers
    ///
    /// Starts in debug mode so a freshly built config never hits the live
    /// endpoints by accident.
    pub fn new(serial_number: impl Into<String>, developer_serial_number: impl Into<String>) -> Self {
        GatewayConfig {
            debug_mode: true,
            serial_number: serial_number.into(),
            developer_serial_number: developer_serial_number.into(),
            login_serial_number: None,
            login_username: None,
            login_password: None,
            timeout: None,
        }
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_report_login(
        mut self,
        serial_number: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.login_serial_number = Some(serial_number.into());
        self.login_username = Some(username.into());
        self.login_password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load configuration from the environment
    ///
    /// A `.env` file is read first if present. Recognized variables:
    ///
    /// - `SKIPJACK_SERIAL_NUMBER` (required)
    /// - `SKIPJACK_DEVELOPER_SERIAL_NUMBER` (required)
    /// - `SKIPJACK_DEBUG` (`true`/`false`/`1`/`0`, default `true`)
    /// - `SKIPJACK_LOGIN_SERIAL_NUMBER`, `SKIPJACK_LOGIN_USERNAME`, `SKIPJACK_LOGIN_PASSWORD`
    /// - `SKIPJACK_TIMEOUT_SECS`
    ///
    /// # Errors
    ///
    /// Returns `Config` if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenv().ok();

        let serial_number = required_var("SKIPJACK_SERIAL_NUMBER")?;
        let developer_serial_number = required_var("SKIPJACK_DEVELOPER_SERIAL_NUMBER")?;

        let debug_mode = match env::var("SKIPJACK_DEBUG") {
            Ok(raw) => parse_flag("SKIPJACK_DEBUG", &raw)?,
            Err(_) => true,
        };

        let timeout = match env::var("SKIPJACK_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    GatewayError::config(format!("SKIPJACK_TIMEOUT_SECS must be an integer, got '{}'", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(GatewayConfig {
            debug_mode,
            serial_number,
            developer_serial_number,
            login_serial_number: env::var("SKIPJACK_LOGIN_SERIAL_NUMBER").ok(),
            login_username: env::var("SKIPJACK_LOGIN_USERNAME").ok(),
            login_password: env::var("SKIPJACK_LOGIN_PASSWORD").ok(),
            timeout,
        })
    }

    /// Endpoints for the configured mode
    pub fn endpoints(&self) -> Endpoints {
        if self.debug_mode {
            Endpoints::with_base(TEST_BASE_URL)
        } else {
            Endpoints::with_base(LIVE_BASE_URL)
        }
    }
}

fn required_var(name: &str) -> Result<String, GatewayError> {
    env::var(name)
        .map_err(|_| GatewayError::config(format!("{} is not set", name)))
        .and_then(|value| {
            if value.trim().is_empty() {
                Err(GatewayError::config(format!("{} is empty", name)))
            } else {
                Ok(value)
            }
        })
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, GatewayError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GatewayError::config(format!(
            "{} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}

/// One URL per gateway operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize: String,
    pub status: String,
    pub change_status: String,
    pub close_batch: String,
    pub report: String,
}

impl Endpoints {
    /// Build the operation URLs under a DLL base URL
    pub fn with_base(base: &str) -> Self {
        let url = |operation: &str| format!("{}?{}", base, operation);
        Endpoints {
            authorize: url("AuthorizeAPI"),
            status: url("SJAPI_TransactionStatusRequest"),
            change_status: url("SJAPI_TransactionChangeStatusRequest"),
            close_batch: url("SJAPI_TransactionCloseCurrentBatchRequest"),
            report: url("SJAPI_ReportDownload"),
        }
    }
}
