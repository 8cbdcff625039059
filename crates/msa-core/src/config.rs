//! Configuración tipada de una corrida.
//!
//! Reemplaza la interpolación ad hoc de rutas y los campos JSON sueltos por
//! un struct validado al cargar: opciones reconocidas enumeradas, cada una
//! con efecto declarado. Las combinaciones inválidas se rechazan antes de
//! ejecutar trabajo alguno.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use msa_domain::{DatabaseCatalog, MoleculeType, MsaFormat, SearchTool};

use crate::errors::CoreError;

/// Una cadena de entrada: id de cadena, tipo de molécula y secuencia cruda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInput {
    pub chain_id: String,
    pub molecule_type: MoleculeType,
    pub sequence: String,
}

fn default_threads() -> u32 {
    8
}

fn default_parallel() -> usize {
    4
}

/// Configuración completa de una corrida de alineamiento.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Cadenas de entrada (pueden repetir secuencia; se deduplican por hash).
    pub chains: Vec<ChainInput>,

    /// Nombres de bases pedidas, en orden. Deben existir en el catálogo.
    pub databases: Vec<String>,

    /// Raíz bajo la cual se resuelven las bases (`{base}/{db}/{db}.fasta`).
    pub base_database_path: PathBuf,

    /// Raíz del OutputStore (un directorio por secuencia).
    pub output_dir: PathBuf,

    /// Scratch escribible para artefactos en vuelo (temp-then-rename).
    pub tmpdir: PathBuf,

    /// Override de formato de salida donde la familia de herramienta lo
    /// permite (jackhmmer/nhmmer). hhblits emite a3m y la búsqueda de
    /// plantillas emite sto siempre.
    #[serde(default)]
    pub output_format: Option<MsaFormat>,

    #[serde(default = "default_threads")]
    pub jackhmmer_threads: u32,
    #[serde(default = "default_threads")]
    pub nhmmer_threads: u32,
    #[serde(default = "default_threads")]
    pub hhblits_threads: u32,
    #[serde(default = "default_threads")]
    pub hmmsearch_threads: u32,

    /// Presupuesto de concurrencia: trabajos externos en paralelo.
    #[serde(default = "default_parallel")]
    pub max_parallel_jobs: usize,

    /// Si es true, agrega una búsqueda de plantillas (hmmsearch sobre
    /// pdb_seqres) por secuencia proteica, dependiente del perfil uniref90.
    #[serde(default)]
    pub run_template_search: bool,
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let cfg = Self::from_json_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Valida opciones al cargar, antes de tocar el grafo.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.chains.is_empty() {
            return Err(CoreError::InvalidConfig("no input chains".into()));
        }
        if self.databases.is_empty() {
            return Err(CoreError::InvalidConfig("no databases requested".into()));
        }
        let catalog = DatabaseCatalog::new();
        for name in &self.databases {
            if !catalog.is_known(name) {
                return Err(CoreError::InvalidConfig(format!(
                    "unknown database '{name}' in 'databases'"
                )));
            }
        }
        for (label, threads) in [
            ("jackhmmer_threads", self.jackhmmer_threads),
            ("nhmmer_threads", self.nhmmer_threads),
            ("hhblits_threads", self.hhblits_threads),
            ("hmmsearch_threads", self.hmmsearch_threads),
        ] {
            if threads == 0 {
                return Err(CoreError::InvalidConfig(format!("{label} must be positive")));
            }
        }
        if self.max_parallel_jobs == 0 {
            return Err(CoreError::InvalidConfig("max_parallel_jobs must be positive".into()));
        }
        Ok(())
    }

    /// Bases pedidas, deduplicadas preservando el orden de configuración.
    pub fn requested_databases(&self) -> IndexSet<String> {
        self.databases.iter().cloned().collect()
    }

    pub fn threads_for(&self, tool: SearchTool) -> u32 {
        match tool {
            SearchTool::Jackhmmer => self.jackhmmer_threads,
            SearchTool::Nhmmer => self.nhmmer_threads,
            SearchTool::Hhblits => self.hhblits_threads,
            SearchTool::Hmmsearch => self.hmmsearch_threads,
        }
    }

    /// Formato efectivo para una base: el override de configuración donde la
    /// familia lo permite, el default del catálogo en caso contrario.
    pub fn effective_format(&self, tool: SearchTool, default: MsaFormat) -> MsaFormat {
        match tool {
            SearchTool::Jackhmmer | SearchTool::Nhmmer => self.output_format.unwrap_or(default),
            // hhblits sólo emite a3m; la búsqueda de plantillas sólo sto.
            SearchTool::Hhblits => MsaFormat::A3m,
            SearchTool::Hmmsearch => MsaFormat::Sto,
        }
    }
}
