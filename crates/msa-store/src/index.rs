//! Índice del compact store: (hash de secuencia, base) -> referencias de fila.
//!
//! El índice serializa a JSON con claves en orden (`BTreeMap`), así dos
//! compactaciones del mismo snapshot producen índices byte-idénticos. Las
//! referencias de una entrada pueden apuntar a regiones no contiguas del
//! blob cuando algunas filas deduplicaron contra artefactos anteriores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use msa_domain::MsaFormat;

pub const INDEX_FILE: &str = "index.json";
pub const BLOB_FILE: &str = "rows.blob";
pub const FORMAT_VERSION: u32 = 1;

/// Clave de una entrada del índice.
pub fn entry_key(seq_hash: &str, database: &str) -> String {
    format!("{seq_hash}/{database}")
}

/// Referencia a una fila única dentro del blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRef {
    pub off: u64,
    pub len: u32,
    /// blake3 hex de los bytes de la fila; permite detectar corrupción del
    /// blob en la lectura.
    pub hash: String,
}

/// Las filas de un artefacto, en su orden original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub format: MsaFormat,
    pub rows: Vec<RowRef>,
}

impl IndexEntry {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn byte_len(&self) -> u64 {
        self.rows.iter().map(|r| r.len as u64).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactIndex {
    pub version: u32,
    pub entries: BTreeMap<String, IndexEntry>,
}

impl Default for CompactIndex {
    fn default() -> Self {
        Self { version: FORMAT_VERSION, entries: BTreeMap::new() }
    }
}

impl CompactIndex {
    pub fn contains(&self, seq_hash: &str, database: &str) -> bool {
        self.entries.contains_key(&entry_key(seq_hash, database))
    }

    pub fn get(&self, seq_hash: &str, database: &str) -> Option<&IndexEntry> {
        self.entries.get(&entry_key(seq_hash, database))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
