//! I/O module
//!
//! Handles the gateway's wire formats and the crate's own CSV files.
//!
//! # Components
//!
//! - `form` - Ordered form parameters and request body encoding
//! - `csv_format` - Response decoding (authorize, status, change status, close batch, report)
//! - `ledger` - CSV file of stored transaction records
//! - `output` - CSV output for CLI results

pub mod csv_format;
pub mod form;
pub mod ledger;
pub mod output;

pub use csv_format::{
    decode_authorize, decode_close_batch, decode_report, decode_status, decode_status_change,
    decode_status_rows, AuthorizeField,
};
pub use form::{FormParams, SerialFieldStyle};
pub use ledger::{read_ledger, write_ledger};
