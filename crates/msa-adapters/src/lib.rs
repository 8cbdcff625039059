//! msa-adapters: invocación de herramientas de búsqueda externas.
//!
//! Un adapter por familia de herramienta (`jackhmmer`, `nhmmer`, `hhblits`,
//! `hmmsearch`), cada uno dueño de su sintaxis de línea de comandos; el core
//! sólo ve el trait [`msa_core::ToolAdapter`]. Incluye además un adapter
//! falso determinista para tests del ejecutor.
//!
//! Los binarios se resuelven por nombre en PATH y pueden sobreescribirse
//! con variables de entorno (`MSAFLOW_JACKHMMER_BIN`, etc.).

pub mod command;
pub mod fake;
pub mod hhblits;
pub mod hmmer;

pub use fake::FakeAdapter;
pub use hhblits::HhblitsAdapter;
pub use hmmer::{HmmsearchAdapter, JackhmmerAdapter, NhmmerAdapter};

use msa_core::AdapterRegistry;

/// Registro con los cuatro adapters de subproceso reales.
pub fn default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(JackhmmerAdapter::new()));
    registry.register(Box::new(NhmmerAdapter::new()));
    registry.register(Box::new(HhblitsAdapter::new()));
    registry.register(Box::new(HmmsearchAdapter::new()));
    registry
}
