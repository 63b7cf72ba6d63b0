//! CSV ledger of stored transaction records
//!
//! The CLI keeps the records it creates in a CSV file between runs. One row per
//! [`TransactionRecord`], with a header row. Status columns hold the gateway's
//! numeric codes; an empty `current_status` means unset.

use crate::types::{GatewayError, TransactionRecord};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read every record from a ledger file
///
/// A missing file is an empty ledger.
///
/// # Errors
///
/// Returns `Io` if the file exists but cannot be opened, or `Csv` if a row
/// does not deserialize.
pub fn read_ledger(path: &Path) -> Result<Vec<TransactionRecord>, GatewayError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "ledger does not exist yet, starting empty");
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    read_records(file)
}

/// Read records from any CSV source
pub fn read_records<R: Read>(source: R) -> Result<Vec<TransactionRecord>, GatewayError> {
    let mut reader = ReaderBuilder::new().trim(Trim::Headers).from_reader(source);
    reader
        .deserialize::<TransactionRecord>()
        .map(|record| record.map_err(GatewayError::from))
        .collect()
}

/// Write records as CSV, sorted by order number then transaction id
pub fn write_records(records: &[TransactionRecord], output: &mut dyn Write) -> Result<(), GatewayError> {
    let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.order_number
            .cmp(&b.order_number)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });

    let mut writer = WriterBuilder::new().from_writer(output);
    for record in sorted {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Replace a ledger file with the given records
///
/// Records are written to a temporary file in the same directory, which is
/// then renamed over `path`. The previous ledger stays intact until the new
/// one is complete.
///
/// # Errors
///
/// Returns `Io` if the temporary file cannot be created or renamed, or `Csv`
/// if a record fails to serialize.
pub fn write_ledger(path: &Path, records: &[TransactionRecord]) -> Result<(), GatewayError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(parent)?;
    write_records(records, file.as_file_mut())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| GatewayError::from(e.error))?;
    Ok(())
}
