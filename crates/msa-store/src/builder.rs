//! Construcción batch del compact store (un solo escritor).

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use msa_core::OutputStore;
use msa_domain::hashing::{digest_bytes, hash_bytes};
use msa_domain::MsaFormat;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::index::{entry_key, CompactIndex, IndexEntry, RowRef, BLOB_FILE, INDEX_FILE};
use crate::row::split_rows;

/// Builder append-only: las filas nuevas se escriben al blob en vuelo
/// (`rows.blob.tmp`), el índice se mantiene en memoria y todo se publica con
/// rename en `finish`. Tras `finish` el store es inmutable.
pub struct CompactStoreBuilder {
    dir: PathBuf,
    blob: BufWriter<File>,
    blob_path: PathBuf,
    blob_len: u64,
    /// hash de fila -> (offset, largo) de la copia única en el blob.
    dedup: HashMap<[u8; 32], (u64, u32)>,
    index: CompactIndex,
    max_rows: BTreeMap<String, usize>,
    guard: TmpGuard,
}

/// Borra el blob en vuelo si el builder se abandona sin llegar a `finish`
/// (por ejemplo, una ingesta que falla a mitad de camino).
struct TmpGuard {
    path: PathBuf,
    armed: bool,
}

impl Drop for TmpGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl CompactStoreBuilder {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let blob_path = dir.join(format!("{BLOB_FILE}.tmp"));
        let file = File::create(&blob_path).map_err(|e| StoreError::io(&blob_path, e))?;
        let guard = TmpGuard { path: blob_path.clone(), armed: true };
        Ok(Self {
            dir,
            blob: BufWriter::new(file),
            blob_path,
            blob_len: 0,
            dedup: HashMap::new(),
            index: CompactIndex::default(),
            max_rows: BTreeMap::new(),
            guard,
        })
    }

    /// Tope de filas por base: una entrada se trunca a sus primeras `n`
    /// filas.
    pub fn max_rows(mut self, database: &str, n: usize) -> Self {
        self.max_rows.insert(database.to_string(), n);
        self
    }

    /// Agrega las filas de un artefacto crudo bajo (hash, base).
    pub fn add_artifact(
        &mut self,
        seq_hash: &str,
        database: &str,
        format: MsaFormat,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let key = entry_key(seq_hash, database);
        if self.index.entries.contains_key(&key) {
            return Err(StoreError::DuplicateEntry { key });
        }

        let mut rows = split_rows(format, bytes);
        if let Some(cap) = self.max_rows.get(database) {
            rows.truncate(*cap);
        }

        let mut refs = Vec::with_capacity(rows.len());
        for row in rows {
            let digest = digest_bytes(row);
            let (off, len) = match self.dedup.get(&digest) {
                Some(span) => *span,
                None => {
                    let span = (self.blob_len, row.len() as u32);
                    self.blob.write_all(row).map_err(|e| StoreError::io(&self.blob_path, e))?;
                    self.blob_len += row.len() as u64;
                    self.dedup.insert(digest, span);
                    span
                }
            };
            refs.push(RowRef { off, len, hash: hash_bytes(row) });
        }
        debug!(key, rows = refs.len(), "artifact added to compact store");
        self.index.entries.insert(key, IndexEntry { format, rows: refs });
        Ok(())
    }

    /// Ingesta un snapshot cerrado y estable del OutputStore completo.
    ///
    /// No debe correr mientras el ejecutor escribe esos artefactos (regla de
    /// fases: la compactación lee un store cerrado).
    pub fn ingest_output_store(&mut self, store: &OutputStore) -> Result<usize, StoreError> {
        let scanned = store.scan().map_err(|e| StoreError::Scan(e.to_string()))?;
        let mut added = 0;
        for artifact in scanned {
            let bytes =
                fs::read(&artifact.path).map_err(|e| StoreError::io(&artifact.path, e))?;
            self.add_artifact(&artifact.seq_hash, &artifact.database, artifact.format, &bytes)?;
            added += 1;
        }
        Ok(added)
    }

    /// Publica blob e índice. El índice se escribe al final y vía rename:
    /// un store sin `index.json` completo simplemente no existe para los
    /// lectores.
    pub fn finish(mut self) -> Result<(), StoreError> {
        self.blob.flush().map_err(|e| StoreError::io(&self.blob_path, e))?;
        let file = self
            .blob
            .into_inner()
            .map_err(|e| StoreError::io(&self.blob_path, e.into_error()))?;
        file.sync_all().map_err(|e| StoreError::io(&self.blob_path, e))?;
        drop(file);

        let blob_final = self.dir.join(BLOB_FILE);
        fs::rename(&self.blob_path, &blob_final).map_err(|e| StoreError::io(&blob_final, e))?;
        // El tmp ya no existe: el guard no debe tocar el blob publicado.
        self.guard.armed = false;

        let index_tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        let json = serde_json::to_string_pretty(&self.index)?;
        fs::write(&index_tmp, json).map_err(|e| StoreError::io(&index_tmp, e))?;
        let index_final = self.dir.join(INDEX_FILE);
        fs::rename(&index_tmp, &index_final).map_err(|e| StoreError::io(&index_final, e))?;

        info!(
            dir = %self.dir.display(),
            entries = self.index.len(),
            unique_rows = self.dedup.len(),
            blob_bytes = self.blob_len,
            "compact store written"
        );
        Ok(())
    }
}

/// Merge de dos stores: unión de tablas de deduplicación por hash de fila
/// más concatenación de índices con remapeo de offsets. Las claves de
/// entrada deben ser disjuntas.
pub fn merge(a: &Path, b: &Path, out: &Path) -> Result<(), StoreError> {
    use crate::reader::CompactStoreReader;

    let mut builder = CompactStoreBuilder::create(out)?;
    for dir in [a, b] {
        let reader = CompactStoreReader::open(dir)?;
        for key in reader.keys() {
            let (seq_hash, database) = key
                .split_once('/')
                .ok_or_else(|| StoreError::CorruptIndex(format!("malformed entry key '{key}'")))?;
            let entry = reader
                .index()
                .entries
                .get(key)
                .ok_or_else(|| StoreError::NotFound { key: key.clone() })?;
            let bytes = reader.lookup(seq_hash, database)?;
            builder.add_artifact(seq_hash, database, entry.format, &bytes)?;
        }
    }
    builder.finish()
}
