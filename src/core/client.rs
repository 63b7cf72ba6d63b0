//! Gateway client
//!
//! One method per gateway operation. Each builds an ordered [`FormParams`]
//! with the identification serials first, performs a single POST through the
//! [`Transport`], and decodes the response. The client never interprets the
//! business meaning of a well-formed response; that belongs to the engine.

use crate::config::{Endpoints, GatewayConfig};
use crate::core::traits::Transport;
use crate::core::transport::HttpTransport;
use crate::io::csv_format::{
    decode_authorize, decode_close_batch, decode_report, decode_status_change, decode_status_rows,
    select_status,
};
use crate::io::{FormParams, SerialFieldStyle};
use crate::types::{
    BatchCloseStatus, DesiredStatus, GatewayError, ReportRow, StatusChangeResult, StatusResult,
    TransactionRecord,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const REPORT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Parameters for a change-status request
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeStatusRequest {
    pub transaction_id: String,
    pub desired: DesiredStatus,
    /// Sent as `szAmount` in dollars with two decimal places
    pub amount: Option<Decimal>,
    /// Sent as `szForceSettlement` for settle and credit requests
    pub force_settlement: bool,
}

impl ChangeStatusRequest {
    /// Request with force settlement on, which is what the gateway expects
    /// for ordinary settle and credit calls
    pub fn new(transaction_id: impl Into<String>, desired: DesiredStatus) -> Self {
        ChangeStatusRequest {
            transaction_id: transaction_id.into(),
            desired,
            amount: None,
            force_settlement: true,
        }
    }

    pub fn with_amount(mut self, amount: Option<Decimal>) -> Self {
        self.amount = amount;
        self
    }

    fn to_params(&self) -> FormParams {
        let mut params = FormParams::new()
            .with("szTransactionId", self.transaction_id.as_str())
            .with("szDesiredStatus", self.desired.as_wire());
        if let Some(amount) = self.amount {
            params.push("szAmount", format!("{:.2}", amount));
        }
        if self.desired.accepts_force_settlement() {
            params.push("szForceSettlement", if self.force_settlement { "1" } else { "0" });
        }
        params
    }
}

/// Date range and filter for a report download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Passed through as `szStatusFilter`; empty means all statuses
    pub status_filter: String,
}

impl ReportQuery {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        ReportQuery {
            start,
            end,
            status_filter: String::new(),
        }
    }

    pub fn with_status_filter(mut self, filter: impl Into<String>) -> Self {
        self.status_filter = filter.into();
        self
    }
}

/// Synchronous client for the gateway's HTTP API
///
/// Endpoint selection is fixed when the client is built.
#[derive(Debug)]
pub struct GatewayClient<T: Transport = HttpTransport> {
    config: GatewayConfig,
    endpoints: Endpoints,
    transport: T,
}

impl GatewayClient<HttpTransport> {
    /// Create a client that talks to the gateway over HTTPS
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> GatewayClient<T> {
    /// Create a client over any transport
    pub fn with_transport(config: GatewayConfig, transport: T) -> Self {
        let endpoints = config.endpoints();
        GatewayClient {
            config,
            endpoints,
            transport,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Authorize a card payment
    ///
    /// `SerialNumber` and `DeveloperSerialNumber` are sent first, followed by
    /// the caller's parameters in their given order.
    ///
    /// # Returns
    ///
    /// The decoded record, stamped live or test according to the configuration.
    /// Its status fields are unset.
    ///
    /// # Errors
    ///
    /// Returns `Transport` on network failure, or `MalformedResponse` if the
    /// response is not a header row and a value row of known fields.
    pub fn authorize(&self, params: FormParams) -> Result<TransactionRecord, GatewayError> {
        let mut form = FormParams::identified(&self.config, SerialFieldStyle::Plain);
        form.extend(params);

        let body = self.transport.post_form(&self.endpoints.authorize, &form.encode())?;
        let record = decode_authorize(&body, !self.config.debug_mode)?;
        tracing::info!(
            transaction_id = %record.transaction_id,
            order_number = %record.order_number,
            return_code = record.return_code,
            approved = record.is_approved(),
            "authorization completed"
        );
        Ok(record)
    }

    /// Query the status of an order
    ///
    /// # Returns
    ///
    /// The row matching `transaction_id` if one was requested and found,
    /// otherwise the most recent row. `None` if no row had the expected shape.
    pub fn transaction_status(
        &self,
        order_number: &str,
        transaction_id: Option<&str>,
    ) -> Result<Option<StatusResult>, GatewayError> {
        let rows = self.status_rows(order_number)?;
        Ok(select_status(rows, transaction_id))
    }

    /// Every well-formed status row for an order, oldest first
    pub fn order_history(&self, order_number: &str) -> Result<Vec<StatusResult>, GatewayError> {
        self.status_rows(order_number)
    }

    fn status_rows(&self, order_number: &str) -> Result<Vec<StatusResult>, GatewayError> {
        let form = FormParams::identified(&self.config, SerialFieldStyle::Prefixed)
            .with("szOrderNumber", order_number);
        let body = self.transport.post_form(&self.endpoints.status, &form.encode())?;
        let rows = decode_status_rows(&body);
        tracing::debug!(order_number, rows = rows.len(), "status rows decoded");
        Ok(rows)
    }

    /// Ask the gateway to move a transaction to a new status
    ///
    /// # Returns
    ///
    /// The decoded result, or `None` if the response did not have the expected
    /// shape. The caller must check the outcome; an unsuccessful change is not
    /// an error here.
    pub fn change_status(
        &self,
        request: &ChangeStatusRequest,
    ) -> Result<Option<StatusChangeResult>, GatewayError> {
        let mut form = FormParams::identified(&self.config, SerialFieldStyle::Prefixed);
        form.extend(request.to_params());

        tracing::debug!(
            transaction_id = %request.transaction_id,
            desired = %request.desired,
            "requesting status change"
        );
        let body = self.transport.post_form(&self.endpoints.change_status, &form.encode())?;
        Ok(decode_status_change(&body))
    }

    /// Close the current open batch
    pub fn close_batch(&self) -> Result<Option<BatchCloseStatus>, GatewayError> {
        let form = FormParams::identified(&self.config, SerialFieldStyle::Prefixed);
        let body = self.transport.post_form(&self.endpoints.close_batch, &form.encode())?;
        Ok(decode_close_batch(&body))
    }

    /// Download a transaction report
    ///
    /// # Errors
    ///
    /// Returns `Config` if the report login credentials are not configured, or
    /// `MalformedResponse` if the payload markers are missing or a typed field
    /// does not parse.
    pub fn report(&self, query: &ReportQuery) -> Result<Vec<ReportRow>, GatewayError> {
        let login = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| GatewayError::config(format!("{} is required for reports", name)))
        };

        let form = FormParams::new()
            .with("szLoginSerialNumber", login(&self.config.login_serial_number, "login serial number")?)
            .with("szUserName", login(&self.config.login_username, "login username")?)
            .with("szPassword", login(&self.config.login_password, "login password")?)
            .with("szStartDate", query.start.format(REPORT_DATE_FORMAT).to_string())
            .with("szEndDate", query.end.format(REPORT_DATE_FORMAT).to_string())
            .with("szStatusFilter", query.status_filter.as_str())
            .with("szShowAllFields", "1")
            .with("szShowHeaders", "1");

        let body = self.transport.post_form(&self.endpoints.report, &form.encode())?;
        let rows = decode_report(&body)?;
        tracing::debug!(rows = rows.len(), "report decoded");
        Ok(rows)
    }
}
