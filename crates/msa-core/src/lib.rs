//! msa-core: grafo de trabajos de alineamiento, ejecutor y store de salida.
//!
//! El core construye, a partir de una configuración tipada y un conjunto de
//! cadenas de entrada, un DAG explícito de trabajos (un nodo por par
//! secuencia×base compatible, más aristas hacia la búsqueda de plantillas),
//! lo ejecuta con un pool de workers bajo semántica skip-if-exists, y
//! resuelve las rutas de MSA de un documento de consulta.
//!
//! El core no conoce sintaxis de línea de comandos: la invocación de
//! herramientas externas queda detrás del trait [`ToolAdapter`].

pub mod config;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod linker;
pub mod store;

pub use config::{ChainInput, RunConfig};
pub use errors::CoreError;
pub use exec::adapter::{ToolAdapter, ToolError, ToolRequest};
pub use exec::report::{JobOutcome, RunReport};
pub use exec::{AdapterRegistry, JobExecutor};
pub use graph::builder::canonicalize_chains;
pub use graph::job::{AlignmentJob, JobKey, JobKind, JobStatus};
pub use graph::JobGraph;
pub use linker::{CompactSource, QueryChain, QueryDocument, QueryLinker};
pub use store::OutputStore;
