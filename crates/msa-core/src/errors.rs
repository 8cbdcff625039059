//! Errores del core.
//!
//! Los errores estructurales (construcción del grafo, configuración) abortan
//! la corrida; los errores por trabajo se acumulan en el `RunReport` y la
//! corrida continúa ("keep going").

use thiserror::Error;

use msa_domain::{DomainError, MoleculeType};

use crate::exec::adapter::ToolError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Una base pedida en configuración no sirve a ninguna secuencia de
    /// entrada. Se detecta al construir el grafo, antes de ejecutar nada.
    #[error("database '{database}' ({db_type}) is incompatible with every input sequence")]
    IncompatibleDatabase { database: String, db_type: MoleculeType },

    /// Una secuencia quedó sin bases compatibles entre las pedidas.
    #[error("sequence {seq_hash} has no compatible database among the requested set")]
    NoCompatibleDatabase { seq_hash: String },

    /// Búsqueda de plantillas pedida sin búsqueda uniref90 ni artefacto
    /// uniref90 preexistente para la secuencia.
    #[error("template search for sequence {seq_hash} requires a uniref90 job or an existing uniref90 artifact")]
    MissingTemplateDependency { seq_hash: String },

    /// Violación de invariante interna del builder (clave duplicada, ciclo).
    /// Indica un bug, aborta la corrida completa.
    #[error("graph construction invariant violated: {0}")]
    GraphConstruction(String),

    /// Falla de herramienta externa, envuelta en el outcome del trabajo.
    #[error(transparent)]
    ExternalTool(#[from] ToolError),

    /// El linker no encontró alineamiento alguno para una cadena sin ruta
    /// explícita.
    #[error("no stored alignment found for chain '{chain_id}' and no explicit path was given")]
    UnresolvedAlignment { chain_id: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io { path: path.into(), source }
    }
}
