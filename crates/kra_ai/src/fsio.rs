//! JSON persistence shared by the file-backed stores.
//!
//! Writes go to `<path>.tmp` and are renamed into place so a crash never leaves
//! a half-written file behind.

use std::fs;
use std::path::Path;

use kra_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn ensure_dir(dir: &Path, code: &str) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new(code, "Failed to create store directory")
            .with_details(format!("path={}; err={}", dir.display(), e))
    })
}

pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    code: &str,
) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(code, "Failed to encode store file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    fs::write(&tmp, json.as_bytes()).map_err(|e| {
        AppError::new(code, "Failed to write store file")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new(code, "Failed to finalize store file write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}

/// Read and decode `path`; `Ok(None)` when it does not exist yet.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path, code: &str) -> Result<Option<T>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(code, "Failed to read store file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        AppError::new(code, "Failed to decode store file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

pub(crate) fn remove_if_exists(path: &Path, code: &str) -> Result<(), AppError> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_file(path).map_err(|e| {
        AppError::new(code, "Failed to delete store file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(bytes))
}
