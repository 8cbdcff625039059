//! OutputStore: un directorio por secuencia, un archivo por (base, variante).
//!
//! Layout (contrato que consumen los lectores aguas abajo, bit a bit):
//! ```text
//! <root>/<hash de secuencia>/
//!   uniref90_hits.a3m
//!   mgnify_hits.a3m
//!   hmm_output.sto        # salida de búsqueda de plantillas
//! ```
//! `exists` es el único oráculo de idempotencia del ejecutor: libre de
//! efectos, verdadero sólo para un archivo existente y no vacío. Las
//! escrituras publican con temp-then-rename, nunca hay un parcial visible
//! en la ruta canónica.

use std::fs;
use std::path::{Path, PathBuf};

use msa_domain::MsaFormat;

use crate::errors::CoreError;
use crate::graph::job::JobKind;

/// Artefacto encontrado al recorrer el store (para compactación).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedArtifact {
    pub seq_hash: String,
    /// Nombre de base para archivos `{db}_hits.*`, `"hmm_output"` para la
    /// salida de plantillas.
    pub database: String,
    pub format: MsaFormat,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sequence_dir(&self, seq_hash: &str) -> PathBuf {
        self.root.join(seq_hash)
    }

    /// Nombre de archivo canónico para un artefacto.
    pub fn artifact_file_name(kind: JobKind, database: &str, format: MsaFormat) -> String {
        match kind {
            JobKind::Search => format!("{database}_hits.{}", format.extension()),
            JobKind::TemplateSearch => "hmm_output.sto".to_string(),
        }
    }

    /// Inversa de `artifact_file_name`: (clave de base, formato) desde un
    /// nombre de archivo del store, `None` para archivos ajenos.
    pub fn parse_artifact_file_name(name: &str) -> Option<(String, MsaFormat)> {
        if name == "hmm_output.sto" {
            return Some(("hmm_output".to_string(), MsaFormat::Sto));
        }
        let (stem, ext) = name.rsplit_once('.')?;
        let format = MsaFormat::from_extension(ext)?;
        let database = stem.strip_suffix("_hits")?;
        Some((database.to_string(), format))
    }

    /// Ruta canónica del artefacto (pura, no toca el filesystem).
    pub fn artifact_path(
        &self,
        seq_hash: &str,
        kind: JobKind,
        database: &str,
        format: MsaFormat,
    ) -> PathBuf {
        self.sequence_dir(seq_hash).join(Self::artifact_file_name(kind, database, format))
    }

    /// Oráculo de idempotencia: existe y es no vacío. Sin efectos.
    pub fn exists(&self, seq_hash: &str, kind: JobKind, database: &str, format: MsaFormat) -> bool {
        let path = self.artifact_path(seq_hash, kind, database, format);
        fs::metadata(&path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
    }

    /// Como `exists`, pero acepta cualquiera de los dos formatos (artefactos
    /// de corridas anteriores con otro `output_format`).
    pub fn find_artifact(&self, seq_hash: &str, kind: JobKind, database: &str) -> Option<PathBuf> {
        for format in [MsaFormat::Sto, MsaFormat::A3m] {
            if self.exists(seq_hash, kind, database, format) {
                return Some(self.artifact_path(seq_hash, kind, database, format));
            }
        }
        None
    }

    /// Crea el directorio de la secuencia; idempotente.
    pub fn prepare_dir(&self, seq_hash: &str) -> Result<PathBuf, CoreError> {
        let dir = self.sequence_dir(seq_hash);
        fs::create_dir_all(&dir).map_err(|e| CoreError::io(&dir, e))?;
        Ok(dir)
    }

    /// Publica un artefacto en vuelo en su ruta canónica vía rename.
    ///
    /// Si `temp` está en otro filesystem y el rename directo falla, copia a
    /// un staging `.partial` junto a la ruta final y renombra desde ahí; la
    /// ruta canónica nunca ve una escritura parcial.
    pub fn commit(&self, temp: &Path, final_path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
        match fs::rename(temp, final_path) {
            Ok(()) => Ok(()),
            Err(_) => {
                let staging = final_path.with_extension("partial");
                fs::copy(temp, &staging).map_err(|e| CoreError::io(&staging, e))?;
                fs::rename(&staging, final_path).map_err(|e| CoreError::io(final_path, e))?;
                let _ = fs::remove_file(temp);
                Ok(())
            }
        }
    }

    pub fn read(
        &self,
        seq_hash: &str,
        kind: JobKind,
        database: &str,
        format: MsaFormat,
    ) -> Result<Vec<u8>, CoreError> {
        let path = self.artifact_path(seq_hash, kind, database, format);
        fs::read(&path).map_err(|e| CoreError::io(&path, e))
    }

    /// Artefactos existentes (no vacíos) de una secuencia, ordenados por
    /// nombre de archivo.
    pub fn artifacts_for(&self, seq_hash: &str) -> Vec<PathBuf> {
        let dir = self.sequence_dir(seq_hash);
        let mut found = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => return found,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };
            if Self::parse_artifact_file_name(name).is_some()
                && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false)
            {
                found.push(path);
            }
        }
        found.sort();
        found
    }

    /// Recorre el store completo: snapshot cerrado para compactación.
    pub fn scan(&self) -> Result<Vec<ScannedArtifact>, CoreError> {
        let mut artifacts = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) => return Err(CoreError::io(&self.root, e)),
        };
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let seq_hash = match entry.file_name().into_string() {
                Ok(s) => s,
                Err(_) => continue,
            };
            for path in self.artifacts_for(&seq_hash) {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                if let Some((database, format)) = Self::parse_artifact_file_name(name) {
                    artifacts.push(ScannedArtifact {
                        seq_hash: seq_hash.clone(),
                        database,
                        format,
                        path,
                    });
                }
            }
        }
        artifacts.sort_by(|a, b| (&a.seq_hash, &a.database).cmp(&(&b.seq_hash, &b.database)));
        Ok(artifacts)
    }
}
