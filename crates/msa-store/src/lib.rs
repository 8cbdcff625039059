//! msa-store: store compacto de alineamientos, indexado y deduplicado.
//!
//! Convierte artefactos de texto crudo del OutputStore en un layout de dos
//! archivos, index-first:
//! ```text
//! <store>/
//!   index.json   # (hash de secuencia, base) -> referencias de fila
//!   rows.blob    # bytes de filas únicas, deduplicados por blake3
//! ```
//! Las filas idénticas entre artefactos se almacenan una sola vez; la
//! lectura reconstruye cada artefacto byte a byte (la compactación es
//! lossless para el contenido, sólo cambian IO y tamaño).
//!
//! Construcción: batch de un solo escritor sobre un snapshot cerrado del
//! OutputStore; nunca concurrente con el ejecutor escribiendo los mismos
//! artefactos. Lectura: el índice se carga entero, el blob se lee por
//! referencia (nunca completo en memoria).

pub mod builder;
pub mod error;
pub mod index;
pub mod reader;
pub mod row;

pub use builder::{merge, CompactStoreBuilder};
pub use error::StoreError;
pub use index::{entry_key, CompactIndex, IndexEntry, RowRef, BLOB_FILE, INDEX_FILE};
pub use reader::CompactStoreReader;
pub use row::split_rows;
