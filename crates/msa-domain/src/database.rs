//! Catálogo de bases de referencia y familias de herramienta.
//!
//! Cada base conocida tiene una familia de herramienta de búsqueda, un tipo
//! de molécula compatible y un formato de salida por defecto. La resolución
//! de rutas sigue la convención `{base}/{db}/{db}.fasta` (las bases de
//! hhblits son directorios multi-archivo y resuelven a `{base}/{db}`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::DomainError;
use crate::sequence::MoleculeType;

/// Familia de herramienta externa que consulta una base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTool {
    Jackhmmer,
    Nhmmer,
    Hhblits,
    Hmmsearch,
}

impl fmt::Display for SearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchTool::Jackhmmer => "jackhmmer",
            SearchTool::Nhmmer => "nhmmer",
            SearchTool::Hhblits => "hhblits",
            SearchTool::Hmmsearch => "hmmsearch",
        };
        write!(f, "{name}")
    }
}

/// Formato de serialización del alineamiento de salida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MsaFormat {
    Sto,
    A3m,
}

impl MsaFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            MsaFormat::Sto => "sto",
            MsaFormat::A3m => "a3m",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sto" => Some(MsaFormat::Sto),
            "a3m" => Some(MsaFormat::A3m),
            _ => None,
        }
    }
}

impl fmt::Display for MsaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Base de referencia resuelta: nombre, ruta de respaldo, herramienta y
/// compatibilidad de molécula. Inmutable durante una corrida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub backing_path: PathBuf,
    pub tool: SearchTool,
    pub molecule_type: MoleculeType,
    pub format: MsaFormat,
}

impl Database {
    pub fn is_compatible(&self, molecule_type: MoleculeType) -> bool {
        self.molecule_type == molecule_type
    }
}

// (nombre, herramienta, molécula, formato por defecto): jackhmmer para las
// bases de proteína planas, hhblits para las clusterizadas, nhmmer para RNA.
const KNOWN_DATABASES: &[(&str, SearchTool, MoleculeType, MsaFormat)] = &[
    ("uniref90", SearchTool::Jackhmmer, MoleculeType::Protein, MsaFormat::A3m),
    ("mgnify", SearchTool::Jackhmmer, MoleculeType::Protein, MsaFormat::A3m),
    ("uniprot", SearchTool::Jackhmmer, MoleculeType::Protein, MsaFormat::A3m),
    ("pdb_seqres", SearchTool::Jackhmmer, MoleculeType::Protein, MsaFormat::Sto),
    ("uniref30", SearchTool::Hhblits, MoleculeType::Protein, MsaFormat::A3m),
    ("bfd", SearchTool::Hhblits, MoleculeType::Protein, MsaFormat::A3m),
    ("cfdb", SearchTool::Hhblits, MoleculeType::Protein, MsaFormat::A3m),
    ("rfam", SearchTool::Nhmmer, MoleculeType::Rna, MsaFormat::Sto),
    ("rnacentral", SearchTool::Nhmmer, MoleculeType::Rna, MsaFormat::A3m),
    ("nt", SearchTool::Nhmmer, MoleculeType::Rna, MsaFormat::A3m),
];

/// Catálogo de bases conocidas, con resolución de rutas por convención.
#[derive(Debug, Clone, Default)]
pub struct DatabaseCatalog;

impl DatabaseCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Resuelve un nombre pedido en configuración a una `Database`.
    pub fn resolve(&self, name: &str, base_path: &Path) -> Result<Database, DomainError> {
        let (db_name, tool, molecule_type, format) = KNOWN_DATABASES
            .iter()
            .find(|(n, _, _, _)| *n == name)
            .ok_or_else(|| DomainError::UnknownDatabase(name.to_string()))?;
        let backing_path = match tool {
            // hhblits usa un prefijo de directorio multi-archivo.
            SearchTool::Hhblits => base_path.join(db_name),
            _ => base_path.join(db_name).join(format!("{db_name}.fasta")),
        };
        Ok(Database {
            name: db_name.to_string(),
            backing_path,
            tool: *tool,
            molecule_type: *molecule_type,
            format: *format,
        })
    }

    /// Nombres de bases conocidos para un tipo de molécula.
    pub fn names_for(&self, molecule_type: MoleculeType) -> Vec<&'static str> {
        KNOWN_DATABASES
            .iter()
            .filter(|(_, _, m, _)| *m == molecule_type)
            .map(|(n, _, _, _)| *n)
            .collect()
    }

    pub fn is_known(&self, name: &str) -> bool {
        KNOWN_DATABASES.iter().any(|(n, _, _, _)| *n == name)
    }
}
