//! Adapter falso determinista para tests del ejecutor.
//!
//! Escribe filas sintéticas derivadas de (contenido de la consulta, nombre
//! de base), cuenta invocaciones y puede armarse para fallar en bases
//! elegidas. No toca ningún binario externo.

use std::collections::BTreeSet;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use msa_core::{ToolAdapter, ToolError, ToolRequest};
use msa_domain::{MsaFormat, SearchTool};

#[derive(Default)]
struct FakeState {
    calls: AtomicUsize,
    invoked_databases: Mutex<Vec<String>>,
    fail_databases: Mutex<BTreeSet<String>>,
}

/// Clonable: todos los clones comparten contadores, de modo que un test
/// puede registrar el adapter y seguir inspeccionándolo.
#[derive(Clone)]
pub struct FakeAdapter {
    tool: SearchTool,
    state: Arc<FakeState>,
}

impl FakeAdapter {
    pub fn new(tool: SearchTool) -> Self {
        Self { tool, state: Arc::new(FakeState::default()) }
    }

    /// Arma una falla para todos los trabajos sobre esa base.
    pub fn fail_on(&self, database: &str) {
        self.state
            .fail_databases
            .lock()
            .expect("fake adapter lock")
            .insert(database.to_string());
    }

    /// Invocaciones totales (los skips no cuentan: nunca llegan al adapter).
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn invoked_databases(&self) -> Vec<String> {
        self.state.invoked_databases.lock().expect("fake adapter lock").clone()
    }
}

impl ToolAdapter for FakeAdapter {
    fn tool(&self) -> SearchTool {
        self.tool
    }

    fn run(&self, request: &ToolRequest) -> Result<(), ToolError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .invoked_databases
            .lock()
            .expect("fake adapter lock")
            .push(request.database.name.clone());

        if self
            .state
            .fail_databases
            .lock()
            .expect("fake adapter lock")
            .contains(&request.database.name)
        {
            return Err(ToolError::Failed {
                tool: self.tool,
                status: Some(1),
                stderr: format!("armed failure for database {}", request.database.name),
            });
        }

        let query = fs::read_to_string(&request.query_fasta)
            .map_err(|e| ToolError::Io(format!("fake adapter read query: {e}")))?;
        let seq = query.lines().nth(1).unwrap_or_default();
        let body = match request.format {
            MsaFormat::A3m => {
                format!(">query\n{seq}\n>hit_{db}_1\n{seq}\n>hit_{db}_2\n{seq}\n", db = request.database.name)
            }
            MsaFormat::Sto => {
                format!(
                    "# STOCKHOLM 1.0\nquery {seq}\nhit_{db}_1 {seq}\n//\n",
                    db = request.database.name
                )
            }
        };
        fs::write(&request.output_path, body)
            .map_err(|e| ToolError::Io(format!("fake adapter write output: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msa_domain::DatabaseCatalog;
    use std::path::Path;

    fn request(dir: &Path, database: &str, format: MsaFormat) -> ToolRequest {
        let catalog = DatabaseCatalog::new();
        let query = dir.join("query.fasta");
        fs::write(&query, ">query\nMKVLAW\n").unwrap();
        ToolRequest {
            query_fasta: query,
            database: catalog.resolve(database, Path::new("/db")).unwrap(),
            output_path: dir.join(format!("out.{}", format.extension())),
            threads: 1,
            format,
            profile_msa: None,
        }
    }

    #[test]
    fn writes_deterministic_rows_and_counts_calls() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeAdapter::new(SearchTool::Jackhmmer);
        let req = request(dir.path(), "uniref90", MsaFormat::A3m);

        fake.run(&req).unwrap();
        fake.run(&req).unwrap();
        assert_eq!(fake.calls(), 2);

        let out = fs::read_to_string(&req.output_path).unwrap();
        assert!(out.contains(">hit_uniref90_1"));
        assert!(out.contains("MKVLAW"));
    }

    #[test]
    fn armed_database_fails_with_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeAdapter::new(SearchTool::Jackhmmer);
        fake.fail_on("mgnify");
        let req = request(dir.path(), "mgnify", MsaFormat::A3m);
        assert!(matches!(fake.run(&req), Err(ToolError::Failed { .. })));
        assert!(!req.output_path.exists());
    }
}
