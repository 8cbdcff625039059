//! msa-domain: tipos de dominio para alineamientos múltiples de secuencia.
//!
//! Provee las piezas puras (sin IO) sobre las que se construye el resto del
//! workspace:
//! - `Sequence`: secuencia canonicalizada e identificada por hash de contenido.
//! - `Database` / `DatabaseCatalog`: catálogo de bases de referencia y su
//!   familia de herramienta de búsqueda.
//! - `DomainError`: errores de validación del dominio.

pub mod database;
pub mod errors;
pub mod hashing;
pub mod sequence;

pub use database::{Database, DatabaseCatalog, MsaFormat, SearchTool};
pub use errors::DomainError;
pub use sequence::{MoleculeType, Sequence};
