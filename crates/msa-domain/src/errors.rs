//! Errores del dominio de secuencias y bases de referencia.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// La secuencia contiene un carácter fuera del alfabeto permitido para
    /// su tipo de molécula. Fatal sólo para esa secuencia.
    #[error("invalid {molecule} sequence: disallowed character '{character}' at position {position}")]
    InvalidSequence {
        molecule: String,
        character: char,
        position: usize,
    },

    /// Secuencia vacía tras normalizar.
    #[error("empty sequence")]
    EmptySequence,

    /// Nombre de base de referencia que el catálogo no reconoce.
    #[error("unknown reference database '{0}'")]
    UnknownDatabase(String),
}
