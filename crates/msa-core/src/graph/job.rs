//! Nodo del grafo: un trabajo de alineamiento por (secuencia, base, variante).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use msa_domain::{Database, MsaFormat, Sequence};

/// Variante del trabajo. La búsqueda de plantillas reutiliza el perfil
/// producido por la búsqueda uniref90 en lugar de la base cruda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Search,
    TemplateSearch,
}

/// Estado de un trabajo en tiempo de ejecución.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Pending` -> `Skipped` (artefacto preexistente, no se ejecuta nada)
/// - `Pending` -> `Blocked` (una dependencia transitiva falló)
/// - `Running` -> `Done`
/// - `Running` -> `Failed`
///
/// Los estados terminales nunca se abandonan; no hay retries internos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    /// Terminó correctamente en esta corrida.
    Done,
    /// Satisfecho por un artefacto preexistente (skip-if-exists).
    Skipped,
    Failed,
    /// Una dependencia falló; el trabajo nunca se despachó.
    Blocked,
}

impl JobStatus {
    /// Terminal y exitoso: satisface dependencias de trabajos posteriores.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Skipped)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

/// Identidad única de un nodo: (hash de secuencia, nombre de base, variante).
///
/// El orden derivado da la iteración canónica del grafo.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub seq_hash: String,
    pub database: String,
    pub kind: JobKind,
}

impl JobKey {
    pub fn search(seq_hash: &str, database: &str) -> Self {
        Self { seq_hash: seq_hash.to_string(), database: database.to_string(), kind: JobKind::Search }
    }

    pub fn template(seq_hash: &str, database: &str) -> Self {
        Self {
            seq_hash: seq_hash.to_string(),
            database: database.to_string(),
            kind: JobKind::TemplateSearch,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = &self.seq_hash[..self.seq_hash.len().min(12)];
        match self.kind {
            JobKind::Search => write!(f, "{prefix}/{}", self.database),
            JobKind::TemplateSearch => write!(f, "{prefix}/{}#template", self.database),
        }
    }
}

/// Un trabajo de alineamiento. Creado por el builder; sólo el ejecutor muta
/// `status`; nunca se destruye, sólo se marca terminal.
#[derive(Debug, Clone)]
pub struct AlignmentJob {
    pub key: JobKey,
    pub kind: JobKind,
    pub sequence: Sequence,
    pub database: Database,
    pub threads: u32,
    pub format: MsaFormat,
    /// Claves de los trabajos que deben estar satisfechos antes de despachar.
    pub deps: BTreeSet<JobKey>,
    pub status: JobStatus,
}

impl AlignmentJob {
    pub fn new(
        kind: JobKind,
        sequence: Sequence,
        database: Database,
        threads: u32,
        format: MsaFormat,
    ) -> Self {
        let key = match kind {
            JobKind::Search => JobKey::search(sequence.hash(), &database.name),
            JobKind::TemplateSearch => JobKey::template(sequence.hash(), &database.name),
        };
        Self { key, kind, sequence, database, threads, format, deps: BTreeSet::new(), status: JobStatus::Pending }
    }
}
