//! Errores del compact store.
//!
//! Una inconsistencia índice/blob es fatal para ese lookup y sólo para ése:
//! las demás entradas siguen siendo legibles.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry '{key}' already present in compact store")]
    DuplicateEntry { key: String },

    #[error("no compact entry for '{key}'")]
    NotFound { key: String },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("corrupt blob: row reference {off}+{len} out of bounds (blob is {blob_len} bytes)")]
    CorruptBlob { off: u64, len: u32, blob_len: u64 },

    #[error("row hash mismatch at blob offset {off}: index has {expected}, blob has {actual}")]
    RowHashMismatch { off: u64, expected: String, actual: String },

    #[error("output store scan failed: {0}")]
    Scan(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }
}
