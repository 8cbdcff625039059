//! Ejecutor del grafo: pool de workers bajo presupuesto de concurrencia.
//!
//! Cada worker corre exactamente una invocación externa a la vez y bloquea
//! sólo en ella. La re-evaluación de la frontera de trabajos listos ocurre
//! bajo un lock compartido (Mutex + Condvar): que un trabajo pase a listo es
//! una transición de estado compartido guardada contra carreras.
//!
//! Política: skip-if-exists cortocircuita la ejecución (y satisface
//! dependencias aguas abajo); un trabajo fallido marca Blocked a sus
//! dependientes transitivos y los independientes siguen ("keep going");
//! ningún retry interno: reinvocar la corrida es idempotente.

pub mod adapter;
pub mod report;

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::{Condvar, Mutex};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use msa_domain::SearchTool;

use crate::errors::CoreError;
use crate::graph::builder::TEMPLATE_PROFILE_DATABASE;
use crate::graph::job::{AlignmentJob, JobKey, JobKind, JobStatus};
use crate::graph::JobGraph;
use crate::store::OutputStore;
use adapter::{ToolAdapter, ToolError, ToolRequest};
use report::{JobOutcome, RunReport};

/// Registro de adapters por familia de herramienta.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<SearchTool, Box<dyn ToolAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Box<dyn ToolAdapter>) {
        self.adapters.insert(adapter.tool(), adapter);
    }

    pub fn get(&self, tool: SearchTool) -> Option<&dyn ToolAdapter> {
        self.adapters.get(&tool).map(|b| b.as_ref())
    }
}

/// Estado del scheduler, siempre detrás del lock.
struct Sched {
    /// Dependencias insatisfechas por trabajo pendiente.
    remaining: BTreeMap<JobKey, usize>,
    ready: VecDeque<JobKey>,
    /// Trabajos aún no terminales (pendientes + corriendo).
    live: usize,
    statuses: BTreeMap<JobKey, JobStatus>,
    outcomes: BTreeMap<JobKey, JobOutcome>,
}

impl Sched {
    fn settle(&mut self, key: &JobKey, outcome: JobOutcome) {
        self.statuses.insert(key.clone(), outcome.status);
        self.outcomes.insert(key.clone(), outcome);
        self.live -= 1;
        self.remaining.remove(key);
    }
}

pub struct JobExecutor<'a> {
    adapters: &'a AdapterRegistry,
    store: &'a OutputStore,
    tmpdir: PathBuf,
    max_parallel: usize,
}

impl<'a> JobExecutor<'a> {
    pub fn new(
        adapters: &'a AdapterRegistry,
        store: &'a OutputStore,
        tmpdir: impl Into<PathBuf>,
        max_parallel: usize,
    ) -> Self {
        Self { adapters, store, tmpdir: tmpdir.into(), max_parallel: max_parallel.max(1) }
    }

    /// Ejecuta el grafo completo y devuelve el reporte agregado.
    ///
    /// Los estados finales quedan también escritos en los nodos del grafo.
    pub fn run(&self, graph: &mut JobGraph) -> Result<RunReport, CoreError> {
        // Fail fast: cada familia requerida debe tener adapter registrado.
        for job in graph.jobs() {
            if self.adapters.get(job.database.tool).is_none() {
                return Err(CoreError::InvalidConfig(format!(
                    "no adapter registered for tool family '{}'",
                    job.database.tool
                )));
            }
        }
        fs::create_dir_all(&self.tmpdir).map_err(|e| CoreError::io(&self.tmpdir, e))?;

        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(%run_id, jobs = graph.len(), workers = self.max_parallel, "run started");

        let remaining: BTreeMap<JobKey, usize> =
            graph.jobs().map(|j| (j.key.clone(), j.deps.len())).collect();
        let ready: VecDeque<JobKey> = remaining
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(k, _)| k.clone())
            .collect();
        let sched = Mutex::new(Sched {
            live: remaining.len(),
            remaining,
            ready,
            statuses: BTreeMap::new(),
            outcomes: BTreeMap::new(),
        });
        let cvar = Condvar::new();

        {
            let graph_ref: &JobGraph = graph;
            std::thread::scope(|scope| {
                for _ in 0..self.max_parallel.min(graph_ref.len().max(1)) {
                    scope.spawn(|| self.worker(graph_ref, &sched, &cvar));
                }
            });
        }

        let sched = sched.into_inner().expect("scheduler lock poisoned");
        for (key, status) in &sched.statuses {
            graph.set_status(key, *status);
        }
        let outcomes: Vec<JobOutcome> = sched.outcomes.into_values().collect();

        let report = RunReport { run_id, started_at, finished_at: Utc::now(), outcomes };
        let (done, skipped, failed, blocked) = report.summary();
        info!(%run_id, done, skipped, failed, blocked, "run finished");
        Ok(report)
    }

    fn worker(&self, graph: &JobGraph, sched: &Mutex<Sched>, cvar: &Condvar) {
        loop {
            let key = {
                let mut st = sched.lock().expect("scheduler lock poisoned");
                loop {
                    if st.live == 0 {
                        cvar.notify_all();
                        return;
                    }
                    if let Some(key) = st.ready.pop_front() {
                        st.statuses.insert(key.clone(), JobStatus::Running);
                        break key;
                    }
                    st = cvar.wait(st).expect("scheduler lock poisoned");
                }
            };

            let job = graph.job(&key).expect("scheduled job exists in graph");
            let start = Instant::now();
            let outcome = self.run_one(job, start);
            let failed = matches!(outcome.status, JobStatus::Failed);

            let mut st = sched.lock().expect("scheduler lock poisoned");
            st.settle(&key, outcome);
            if failed {
                self.block_dependents(graph, &key, &mut st);
            } else {
                // Done o Skipped satisfacen por igual a los dependientes.
                for dep_key in graph.dependents_of(&key) {
                    if let Some(d) = st.remaining.get_mut(dep_key) {
                        *d -= 1;
                        if *d == 0 {
                            st.ready.push_back(dep_key.clone());
                        }
                    }
                }
            }
            cvar.notify_all();
        }
    }

    /// Marca Blocked, transitivamente, a todo dependiente aún pendiente.
    fn block_dependents(&self, graph: &JobGraph, failed: &JobKey, st: &mut Sched) {
        let mut queue: VecDeque<JobKey> = graph.dependents_of(failed).cloned().collect();
        while let Some(key) = queue.pop_front() {
            if st.statuses.get(&key).map(|s| s.is_terminal()).unwrap_or(false) {
                continue;
            }
            warn!(job = %key, blocked_by = %failed, "job blocked by failed dependency");
            st.ready.retain(|k| k != &key);
            st.settle(
                &key,
                JobOutcome {
                    key: key.clone(),
                    status: JobStatus::Blocked,
                    error: Some(format!("blocked by failure of {failed}")),
                    artifact: None,
                    duration_ms: 0,
                },
            );
            queue.extend(graph.dependents_of(&key).cloned());
        }
    }

    fn run_one(&self, job: &AlignmentJob, start: Instant) -> JobOutcome {
        let final_path = self.store.artifact_path(
            job.sequence.hash(),
            job.kind,
            &job.database.name,
            job.format,
        );

        // Oráculo de idempotencia: artefacto no vacío ⇒ nada que hacer.
        if self.store.exists(job.sequence.hash(), job.kind, &job.database.name, job.format) {
            debug!(job = %job.key, "artifact exists, skipping");
            return JobOutcome {
                key: job.key.clone(),
                status: JobStatus::Skipped,
                error: None,
                artifact: Some(final_path),
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }

        match self.execute(job, &final_path) {
            Ok(()) => {
                info!(job = %job.key, "job done");
                JobOutcome {
                    key: job.key.clone(),
                    status: JobStatus::Done,
                    error: None,
                    artifact: Some(final_path),
                    duration_ms: start.elapsed().as_millis() as u64,
                }
            }
            Err(err) => {
                warn!(job = %job.key, error = %err, "job failed");
                JobOutcome {
                    key: job.key.clone(),
                    status: JobStatus::Failed,
                    error: Some(err.to_string()),
                    artifact: None,
                    duration_ms: start.elapsed().as_millis() as u64,
                }
            }
        }
    }

    /// Invoca el adapter sobre rutas temporales y publica con rename.
    fn execute(&self, job: &AlignmentJob, final_path: &std::path::Path) -> Result<(), CoreError> {
        let adapter = self
            .adapters
            .get(job.database.tool)
            .expect("adapter presence checked before run");

        // Hash completo: los directorios de trabajo de dos secuencias
        // distintas nunca deben colisionar.
        let scratch = self.tmpdir.join(format!(
            "{}_{}{}",
            job.sequence.hash(),
            job.database.name,
            if job.kind == JobKind::TemplateSearch { "_template" } else { "" },
        ));
        let cleanup = |p: &std::path::Path| {
            let _ = fs::remove_dir_all(p);
        };
        fs::create_dir_all(&scratch).map_err(|e| CoreError::io(&scratch, e))?;

        let result = self.execute_in(job, adapter, &scratch, final_path);
        // Éxito o falla, nada en vuelo queda visible fuera del scratch.
        cleanup(&scratch);
        result
    }

    fn execute_in(
        &self,
        job: &AlignmentJob,
        adapter: &dyn ToolAdapter,
        scratch: &std::path::Path,
        final_path: &std::path::Path,
    ) -> Result<(), CoreError> {
        let query_fasta = scratch.join("query.fasta");
        let fasta = format!(">query\n{}\n", job.sequence.raw());
        fs::write(&query_fasta, fasta).map_err(|e| CoreError::io(&query_fasta, e))?;

        let profile_msa = if job.kind == JobKind::TemplateSearch {
            let profile = self
                .store
                .find_artifact(job.sequence.hash(), JobKind::Search, TEMPLATE_PROFILE_DATABASE)
                .ok_or_else(|| {
                    ToolError::Io(format!(
                        "uniref90 profile alignment missing for sequence {}",
                        job.sequence.hash()
                    ))
                })?;
            Some(profile)
        } else {
            None
        };

        let output_path = scratch.join(format!("out.{}", job.format.extension()));
        let request = ToolRequest {
            query_fasta,
            database: job.database.clone(),
            output_path: output_path.clone(),
            threads: job.threads,
            format: job.format,
            profile_msa,
        };
        adapter.run(&request)?;

        // Salida faltante o vacía con exit 0 es falla igual: un skip futuro
        // no debe confundirla con éxito.
        let len = fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(ToolError::EmptyOutput {
                tool: adapter.tool(),
                path: output_path,
            }
            .into());
        }

        self.store.prepare_dir(job.sequence.hash())?;
        self.store.commit(&output_path, final_path)
    }
}
