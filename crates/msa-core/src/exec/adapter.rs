//! Seam de herramientas externas.
//!
//! El ejecutor no conoce sintaxis de línea de comandos: pide a un
//! [`ToolAdapter`] que produzca el alineamiento en una ruta temporal y
//! verifica/publica el resultado él mismo. Este trait es el punto de
//! inyección de adapters falsos en los tests.

use std::path::PathBuf;

use thiserror::Error;

use msa_domain::{Database, MsaFormat, SearchTool};

/// Petición de ejecución de una búsqueda: todo lo que un adapter necesita,
/// sin acceso al grafo ni al store.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    /// FASTA de consulta ya escrito por el ejecutor.
    pub query_fasta: PathBuf,
    pub database: Database,
    /// Ruta temporal donde el adapter debe dejar la salida. El ejecutor la
    /// publica con rename; el adapter nunca escribe la ruta canónica.
    pub output_path: PathBuf,
    pub threads: u32,
    pub format: MsaFormat,
    /// Para búsquedas de plantilla: el alineamiento uniref90 del que se
    /// construye el perfil.
    pub profile_msa: Option<PathBuf>,
}

/// Falla de una invocación externa. El trabajo y sus dependientes
/// transitivos quedan Failed/Blocked; los independientes continúan.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool binary '{binary}' not found on PATH")]
    NotFound { binary: String },

    #[error("{tool} exited with status {status:?}: {stderr}")]
    Failed { tool: SearchTool, status: Option<i32>, stderr: String },

    #[error("{tool} exited successfully but produced no output at {path}")]
    EmptyOutput { tool: SearchTool, path: PathBuf },

    #[error("io error while running tool: {0}")]
    Io(String),
}

/// Adapter por familia de herramienta. `run` bloquea hasta que el proceso
/// externo termina; toda la espera del sistema es trabajo externo real.
pub trait ToolAdapter: Send + Sync {
    fn tool(&self) -> SearchTool;

    fn run(&self, request: &ToolRequest) -> Result<(), ToolError>;
}
