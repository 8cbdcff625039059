//! Lectura index-first del compact store.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use msa_core::CompactSource;
use msa_domain::hashing::hash_bytes;

use crate::error::StoreError;
use crate::index::{entry_key, CompactIndex, BLOB_FILE, INDEX_FILE};

/// Reader de un store ya publicado. Carga sólo el índice; cada lookup abre
/// el blob y lee exclusivamente los rangos referenciados.
pub struct CompactStoreReader {
    dir: PathBuf,
    index: CompactIndex,
    blob_len: u64,
}

impl CompactStoreReader {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let index_path = dir.join(INDEX_FILE);
        let text = fs::read_to_string(&index_path).map_err(|e| StoreError::io(&index_path, e))?;
        let index: CompactIndex = serde_json::from_str(&text)
            .map_err(|e| StoreError::CorruptIndex(format!("{index_path:?}: {e}")))?;
        if index.version != crate::index::FORMAT_VERSION {
            return Err(StoreError::CorruptIndex(format!(
                "unsupported version {} (expected {})",
                index.version,
                crate::index::FORMAT_VERSION
            )));
        }
        let blob_path = dir.join(BLOB_FILE);
        let blob_len = fs::metadata(&blob_path)
            .map_err(|e| StoreError::io(&blob_path, e))?
            .len();
        Ok(Self { dir, index, blob_len })
    }

    pub fn index(&self) -> &CompactIndex {
        &self.index
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.index.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Filas de una entrada, en orden original, cada una verificada contra
    /// su hash del índice. Corrupción detectada aquí no afecta otras
    /// entradas.
    pub fn rows(&self, seq_hash: &str, database: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let entry = self
            .index
            .get(seq_hash, database)
            .ok_or_else(|| StoreError::NotFound { key: entry_key(seq_hash, database) })?;

        let blob_path = self.dir.join(BLOB_FILE);
        let mut blob = File::open(&blob_path).map_err(|e| StoreError::io(&blob_path, e))?;

        let mut rows = Vec::with_capacity(entry.rows.len());
        for r in &entry.rows {
            // checked_add: un índice corrupto puede traer off/len arbitrarios
            // y `off + len` no debe desbordar, sólo fallar este lookup.
            let in_bounds = r
                .off
                .checked_add(r.len as u64)
                .map_or(false, |end| end <= self.blob_len);
            if !in_bounds {
                return Err(StoreError::CorruptBlob {
                    off: r.off,
                    len: r.len,
                    blob_len: self.blob_len,
                });
            }
            let mut buf = vec![0u8; r.len as usize];
            blob.seek(SeekFrom::Start(r.off)).map_err(|e| StoreError::io(&blob_path, e))?;
            blob.read_exact(&mut buf).map_err(|e| StoreError::io(&blob_path, e))?;

            let actual = hash_bytes(&buf);
            if actual != r.hash {
                return Err(StoreError::RowHashMismatch {
                    off: r.off,
                    expected: r.hash.clone(),
                    actual,
                });
            }
            rows.push(buf);
        }
        Ok(rows)
    }

    /// Reconstrucción byte-idéntica del artefacto crudo original.
    pub fn lookup(&self, seq_hash: &str, database: &str) -> Result<Vec<u8>, StoreError> {
        Ok(self.rows(seq_hash, database)?.concat())
    }

    pub fn row_count(&self, seq_hash: &str, database: &str) -> Option<usize> {
        self.index.get(seq_hash, database).map(|e| e.row_count())
    }
}

impl CompactSource for CompactStoreReader {
    fn contains(&self, seq_hash: &str, database: &str) -> bool {
        self.index.contains(seq_hash, database)
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
