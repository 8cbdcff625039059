//! Resolución de rutas de MSA para un documento de consulta.
//!
//! Una cadena con `main_msa_file_paths` ya provisto pasa tal cual (frontera
//! de confianza: el caller eligió la ubicación y no se valida contra el hash
//! salvo pedido explícito). Sin ruta, se resuelve por hash de secuencia
//! contra el OutputStore y, si está adjunto, contra un compact store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use msa_domain::{DatabaseCatalog, MoleculeType, Sequence};
use tracing::debug;

use crate::errors::CoreError;
use crate::store::OutputStore;

/// Vista mínima de un compact store que el linker sabe consultar. La
/// implementación vive en el crate del store para no invertir dependencias.
pub trait CompactSource {
    fn contains(&self, seq_hash: &str, database: &str) -> bool;

    /// Directorio del compact store, usado como ruta resuelta cuando los
    /// alineamientos sólo existen compactados.
    fn location(&self) -> &Path;
}

/// Entrada de cadena del documento de consulta. El core sólo lee `sequence`
/// y escribe `main_msa_file_paths`; el resto del esquema pertenece al
/// modelo de predicción.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryChain {
    pub chain_id: String,
    pub molecule_type: MoleculeType,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_msa_file_paths: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDocument {
    pub chains: Vec<QueryChain>,
}

impl QueryDocument {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct QueryLinker<'a> {
    store: &'a OutputStore,
    compact: Option<&'a dyn CompactSource>,
    catalog: DatabaseCatalog,
}

impl<'a> QueryLinker<'a> {
    pub fn new(store: &'a OutputStore) -> Self {
        Self { store, compact: None, catalog: DatabaseCatalog::new() }
    }

    pub fn with_compact(mut self, compact: &'a dyn CompactSource) -> Self {
        self.compact = Some(compact);
        self
    }

    /// Resuelve in place las rutas de cada cadena del documento.
    ///
    /// Falla con `UnresolvedAlignment` en la primera cadena sin ruta
    /// explícita para la que no hay alineamiento alguno; nunca degrada en
    /// silencio a "sin MSA".
    pub fn resolve(&self, doc: &mut QueryDocument) -> Result<(), CoreError> {
        for chain in &mut doc.chains {
            if let Some(paths) = &chain.main_msa_file_paths {
                if !paths.is_empty() {
                    debug!(chain = %chain.chain_id, "explicit msa paths, passing through");
                    continue;
                }
            }
            let seq = Sequence::new(&chain.sequence, chain.molecule_type)?;

            let artifacts = self.store.artifacts_for(seq.hash());
            if !artifacts.is_empty() {
                chain.main_msa_file_paths = Some(artifacts);
                continue;
            }

            if let Some(compact) = self.compact {
                let mut names: Vec<&str> = self.catalog.names_for(chain.molecule_type);
                names.push("hmm_output");
                if names.iter().any(|db| compact.contains(seq.hash(), db)) {
                    chain.main_msa_file_paths = Some(vec![compact.location().to_path_buf()]);
                    continue;
                }
            }

            return Err(CoreError::UnresolvedAlignment { chain_id: chain.chain_id.clone() });
        }
        Ok(())
    }
}
