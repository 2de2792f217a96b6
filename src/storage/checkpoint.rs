//! JSON checkpoint and output files
//!
//! Both files share one schema: `{ "urls": [ { "url", "completed", "error", "links" } ] }`.
//! Files are pretty-printed with one-space indentation and always written
//! through a sibling temporary file followed by a rename, so readers never
//! observe a partially written registry.

use crate::state::UrlRecord;
use crate::CheckpointError;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    urls: &'a [UrlRecord],
}

#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    urls: Vec<UrlRecord>,
}

/// Serializes registry records into checkpoint file bytes
pub fn encode_records(records: &[UrlRecord]) -> Result<Vec<u8>, CheckpointError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    SnapshotRef { urls: records }
        .serialize(&mut serializer)
        .map_err(CheckpointError::Encode)?;
    Ok(buf)
}

/// Deserializes checkpoint file bytes into registry records
///
/// `source` names the file in error messages.
pub fn decode_records(bytes: &[u8], source: &str) -> Result<Vec<UrlRecord>, CheckpointError> {
    let snapshot: Snapshot =
        serde_json::from_slice(bytes).map_err(|source_err| CheckpointError::Decode {
            path: source.to_string(),
            source: source_err,
        })?;
    Ok(snapshot.urls)
}

/// Reads and decodes records from a file
///
/// # Returns
///
/// * `Ok(None)` - The file does not exist
/// * `Ok(Some(records))` - The file was read and decoded
/// * `Err(CheckpointError)` - The file exists but could not be read or decoded
pub fn read_records(path: &Path) -> Result<Option<Vec<UrlRecord>>, CheckpointError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    decode_records(&bytes, &path.display().to_string()).map(Some)
}

/// Writes records to `path`, replacing any previous file
pub fn write_records(path: &Path, records: &[UrlRecord]) -> Result<(), CheckpointError> {
    let bytes = encode_records(records)?;
    let tmp = temp_path(path);

    std::fs::write(&tmp, &bytes).map_err(|e| io_error(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_error(path, e));
    }

    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Removes a file if it exists
pub fn remove_file_if_present(path: &Path) -> Result<(), CheckpointError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path, e)),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> CheckpointError {
    CheckpointError::Io {
        path: path.display().to_string(),
        source,
    }
}
