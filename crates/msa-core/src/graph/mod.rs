//! Grafo de trabajos de alineamiento.
//!
//! El grafo es una estructura explícita e inspeccionable (nodos = trabajos,
//! aristas = dependencias) construida y validada antes de ejecutar nada, lo
//! que habilita validación dry-run y tests deterministas sin herramientas
//! externas.

pub mod builder;
pub mod job;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::errors::CoreError;
use job::{AlignmentJob, JobKey, JobStatus};

/// DAG de trabajos, con índice inverso de dependientes.
///
/// Los nodos viven en un `BTreeMap` ordenado por clave, de modo que la
/// iteración es canónica: el mismo (conjunto de secuencias, configuración)
/// produce el mismo grafo sin importar el orden de entrada.
#[derive(Debug)]
pub struct JobGraph {
    jobs: BTreeMap<JobKey, AlignmentJob>,
    dependents: BTreeMap<JobKey, BTreeSet<JobKey>>,
}

impl JobGraph {
    pub(crate) fn new(jobs: BTreeMap<JobKey, AlignmentJob>) -> Result<Self, CoreError> {
        let mut dependents: BTreeMap<JobKey, BTreeSet<JobKey>> = BTreeMap::new();
        for (key, job) in &jobs {
            for dep in &job.deps {
                if !jobs.contains_key(dep) {
                    return Err(CoreError::GraphConstruction(format!(
                        "job {key} depends on missing job {dep}"
                    )));
                }
                dependents.entry(dep.clone()).or_default().insert(key.clone());
            }
        }
        let graph = Self { jobs, dependents };
        graph.assert_acyclic()?;
        Ok(graph)
    }

    /// Aserción defensiva de aciclicidad (pasada de Kahn). Por construcción
    /// las aristas sólo van de búsquedas de plantilla a búsquedas simples,
    /// pero un ciclo aquí es un bug del builder y debe abortar.
    fn assert_acyclic(&self) -> Result<(), CoreError> {
        let order = self.topological_order();
        if order.len() != self.jobs.len() {
            return Err(CoreError::GraphConstruction(format!(
                "cycle detected: topological order covers {} of {} jobs",
                order.len(),
                self.jobs.len()
            )));
        }
        Ok(())
    }

    /// Orden topológico determinista (Kahn con frontera ordenada).
    pub fn topological_order(&self) -> Vec<JobKey> {
        let mut indegree: BTreeMap<&JobKey, usize> =
            self.jobs.iter().map(|(k, j)| (k, j.deps.len())).collect();
        let mut frontier: BTreeSet<&JobKey> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(k, _)| *k)
            .collect();
        let mut order = Vec::with_capacity(self.jobs.len());
        while let Some(key) = frontier.iter().next().cloned() {
            frontier.remove(key);
            order.push(key.clone());
            if let Some(deps) = self.dependents.get(key) {
                for dep in deps {
                    let d = indegree.get_mut(dep).expect("dependent is a node");
                    *d -= 1;
                    if *d == 0 {
                        frontier.insert(dep);
                    }
                }
            }
        }
        order
    }

    /// Trabajos sin dependencias pendientes, en orden de clave.
    pub fn ready_queue(&self) -> Vec<JobKey> {
        self.jobs
            .iter()
            .filter(|(_, j)| j.deps.is_empty() && j.status == JobStatus::Pending)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn job(&self, key: &JobKey) -> Option<&AlignmentJob> {
        self.jobs.get(key)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &AlignmentJob> {
        self.jobs.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &JobKey> {
        self.jobs.keys()
    }

    pub fn dependents_of(&self, key: &JobKey) -> impl Iterator<Item = &JobKey> {
        self.dependents.get(key).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub(crate) fn set_status(&mut self, key: &JobKey, status: JobStatus) {
        if let Some(job) = self.jobs.get_mut(key) {
            job.status = status;
        }
    }
}
