//! Secuencia canónica identificada por hash de contenido.
//!
//! La identidad de una secuencia es el blake3 del texto normalizado
//! (mayúsculas, sin espacios; `T` se mapea a `U` en RNA). Dos cadenas con la
//! misma secuencia normalizada comparten identidad y por lo tanto comparten
//! trabajo de alineamiento: ésta es la invariante de deduplicación de todo
//! el sistema.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::errors::DomainError;
use crate::hashing::hash_str;

/// Tipo de molécula de una cadena de entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoleculeType {
    Protein,
    Rna,
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoleculeType::Protein => write!(f, "protein"),
            MoleculeType::Rna => write!(f, "rna"),
        }
    }
}

// Aminoácidos estándar más códigos de ambigüedad (B, Z, X) y los raros
// (J, O, U: pirrolisina/selenocisteína aparecen en UniProt).
static PROTEIN_ALPHABET: Lazy<HashSet<char>> =
    Lazy::new(|| "ACDEFGHIKLMNPQRSTVWYBJOUXZ".chars().collect());

// Nucleótidos de RNA más códigos de ambigüedad IUPAC. `T` se acepta en la
// entrada pero se normaliza a `U` antes de hashear.
static RNA_ALPHABET: Lazy<HashSet<char>> =
    Lazy::new(|| "ACGURYSWKMBDHVN".chars().collect());

/// Secuencia normalizada e inmutable, con su hash de contenido.
///
/// Construcción únicamente vía [`Sequence::new`], que valida el alfabeto;
/// los campos son privados para que no exista una `Sequence` sin hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    hash: String,
    molecule_type: MoleculeType,
    raw: String,
}

impl Sequence {
    /// Canonicaliza y valida una secuencia cruda.
    ///
    /// Normaliza a mayúsculas, recorta espacios en los extremos y verifica
    /// cada carácter contra el alfabeto del tipo de molécula. El hash se
    /// calcula sobre el texto ya normalizado, de modo que `"acde"` y
    /// `"ACDE"` producen la misma identidad.
    pub fn new(raw: &str, molecule_type: MoleculeType) -> Result<Self, DomainError> {
        let mut normalized = String::with_capacity(raw.len());
        for c in raw.trim().chars() {
            let mut c = c.to_ascii_uppercase();
            if molecule_type == MoleculeType::Rna && c == 'T' {
                c = 'U';
            }
            let allowed = match molecule_type {
                MoleculeType::Protein => PROTEIN_ALPHABET.contains(&c),
                MoleculeType::Rna => RNA_ALPHABET.contains(&c),
            };
            if !allowed {
                return Err(DomainError::InvalidSequence {
                    molecule: molecule_type.to_string(),
                    character: c,
                    position: normalized.len(),
                });
            }
            normalized.push(c);
        }
        if normalized.is_empty() {
            return Err(DomainError::EmptySequence);
        }
        let hash = hash_str(&normalized);
        Ok(Self { hash, molecule_type, raw: normalized })
    }

    /// Hash de contenido en hex (identidad estable de la secuencia).
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn molecule_type(&self) -> MoleculeType {
        self.molecule_type
    }

    /// Texto normalizado de la secuencia.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Nombre de directorio por-secuencia en el OutputStore. Usamos el hex
    /// completo: los ids de cadena no son estables entre corridas, el hash sí.
    pub fn dir_name(&self) -> &str {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} seq {} ({} aa)>", self.molecule_type, &self.hash[..12], self.raw.len())
    }
}
