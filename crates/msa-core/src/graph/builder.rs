//! Construcción determinista del grafo de trabajos.
//!
//! Identidad de nodo = (hash de secuencia, base, variante); mismo conjunto
//! de secuencias + misma configuración ⇒ mismo grafo (nodos y aristas),
//! independiente del orden de las cadenas de entrada.

use std::collections::BTreeMap;

use msa_domain::{Database, DatabaseCatalog, MoleculeType, Sequence};
use tracing::debug;

use crate::config::{ChainInput, RunConfig};
use crate::errors::CoreError;
use crate::graph::job::{AlignmentJob, JobKey, JobKind};
use crate::graph::JobGraph;
use crate::store::OutputStore;

/// Base sobre la que corre la búsqueda de plantillas y base cuyo perfil
/// consume. Fijas para todo el pipeline.
pub const TEMPLATE_DATABASE: &str = "pdb_seqres";
pub const TEMPLATE_PROFILE_DATABASE: &str = "uniref90";

/// Error de canonicalización de una cadena concreta; la corrida sigue con
/// las demás.
#[derive(Debug, Clone)]
pub struct ChainError {
    pub chain_id: String,
    pub error: msa_domain::DomainError,
}

/// Canonicaliza las cadenas de entrada y deduplica por hash de contenido.
///
/// Devuelve las secuencias únicas (orden canónico por hash) junto con los
/// errores por cadena. Dos cadenas con la misma secuencia normalizada
/// contribuyen una sola `Sequence`: la invariante de deduplicación.
pub fn canonicalize_chains(chains: &[ChainInput]) -> (Vec<Sequence>, Vec<ChainError>) {
    let mut unique: BTreeMap<String, Sequence> = BTreeMap::new();
    let mut errors = Vec::new();
    for chain in chains {
        match Sequence::new(&chain.sequence, chain.molecule_type) {
            Ok(seq) => {
                unique.entry(seq.hash().to_string()).or_insert(seq);
            }
            Err(error) => errors.push(ChainError { chain_id: chain.chain_id.clone(), error }),
        }
    }
    (unique.into_values().collect(), errors)
}

impl JobGraph {
    /// Construye el DAG para un conjunto de secuencias ya canónicas.
    ///
    /// - un trabajo por (secuencia, base compatible pedida);
    /// - una base pedida que no sirve a ninguna secuencia es error de
    ///   construcción (fail fast, antes de ejecutar nada), igual que una
    ///   secuencia sin base compatible;
    /// - con `run_template_search`, cada secuencia proteica gana un trabajo
    ///   de plantillas con arista hacia su trabajo uniref90; si el artefacto
    ///   uniref90 ya existe en el store la dependencia queda satisfecha sin
    ///   re-ejecutar.
    pub fn build(
        sequences: &[Sequence],
        config: &RunConfig,
        catalog: &DatabaseCatalog,
        store: &OutputStore,
    ) -> Result<JobGraph, CoreError> {
        let mut databases: Vec<Database> = Vec::new();
        for name in config.requested_databases() {
            databases.push(catalog.resolve(&name, &config.base_database_path)?);
        }

        // Fail fast: cada base pedida debe servir al menos a una secuencia.
        for db in &databases {
            if !sequences.iter().any(|s| db.is_compatible(s.molecule_type())) {
                return Err(CoreError::IncompatibleDatabase {
                    database: db.name.clone(),
                    db_type: db.molecule_type,
                });
            }
        }

        let mut jobs: BTreeMap<JobKey, AlignmentJob> = BTreeMap::new();
        for sequence in sequences {
            let compatible: Vec<&Database> = databases
                .iter()
                .filter(|db| db.is_compatible(sequence.molecule_type()))
                .collect();
            if compatible.is_empty() {
                return Err(CoreError::NoCompatibleDatabase {
                    seq_hash: sequence.hash().to_string(),
                });
            }
            for db in compatible {
                let format = config.effective_format(db.tool, db.format);
                let job = AlignmentJob::new(
                    JobKind::Search,
                    sequence.clone(),
                    db.clone(),
                    config.threads_for(db.tool),
                    format,
                );
                if jobs.insert(job.key.clone(), job).is_some() {
                    return Err(CoreError::GraphConstruction(format!(
                        "duplicate job key for sequence {} and database {}",
                        sequence.hash(),
                        db.name
                    )));
                }
            }

            if config.run_template_search && sequence.molecule_type() == MoleculeType::Protein {
                let job = Self::template_job(sequence, config, catalog, store, &jobs)?;
                if jobs.insert(job.key.clone(), job).is_some() {
                    return Err(CoreError::GraphConstruction(format!(
                        "duplicate template job for sequence {}",
                        sequence.hash()
                    )));
                }
            }
        }

        let graph = JobGraph::new(jobs)?;
        debug!(jobs = graph.len(), "job graph built");
        Ok(graph)
    }

    fn template_job(
        sequence: &Sequence,
        config: &RunConfig,
        catalog: &DatabaseCatalog,
        store: &OutputStore,
        jobs: &BTreeMap<JobKey, AlignmentJob>,
    ) -> Result<AlignmentJob, CoreError> {
        let mut database = catalog.resolve(TEMPLATE_DATABASE, &config.base_database_path)?;
        database.tool = msa_domain::SearchTool::Hmmsearch;
        database.format = msa_domain::MsaFormat::Sto;

        let mut job = AlignmentJob::new(
            JobKind::TemplateSearch,
            sequence.clone(),
            database,
            config.hmmsearch_threads,
            msa_domain::MsaFormat::Sto,
        );

        let profile_key = JobKey::search(sequence.hash(), TEMPLATE_PROFILE_DATABASE);
        if jobs.contains_key(&profile_key) {
            job.deps.insert(profile_key);
        } else if store
            .find_artifact(sequence.hash(), JobKind::Search, TEMPLATE_PROFILE_DATABASE)
            .is_none()
        {
            // Ni trabajo uniref90 en este grafo ni artefacto previo: la
            // dependencia es insatisfacible y se reporta antes de despachar.
            return Err(CoreError::MissingTemplateDependency {
                seq_hash: sequence.hash().to_string(),
            });
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msa_domain::MsaFormat;

    fn config(databases: &[&str]) -> RunConfig {
        let v = serde_json::json!({
            "chains": [
                {"chain_id": "A", "molecule_type": "protein", "sequence": "MKV"}
            ],
            "databases": databases,
            "base_database_path": "/db",
            "output_dir": "/out",
            "tmpdir": "/tmp/msa"
        });
        RunConfig::from_json_str(&v.to_string()).unwrap()
    }

    fn protein(raw: &str) -> Sequence {
        Sequence::new(raw, MoleculeType::Protein).unwrap()
    }

    fn empty_store() -> (tempfile::TempDir, OutputStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn identical_sequences_share_jobs() {
        // S1 == S2 con dos bases: 2 trabajos, no 4.
        let chains = vec![
            ChainInput { chain_id: "A".into(), molecule_type: MoleculeType::Protein, sequence: "ACDE".into() },
            ChainInput { chain_id: "B".into(), molecule_type: MoleculeType::Protein, sequence: "acde".into() },
        ];
        let (sequences, errors) = canonicalize_chains(&chains);
        assert!(errors.is_empty());
        assert_eq!(sequences.len(), 1);

        let (_dir, store) = empty_store();
        let graph = JobGraph::build(
            &sequences,
            &config(&["uniref90", "mgnify"]),
            &DatabaseCatalog::new(),
            &store,
        )
        .unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn invalid_chain_is_reported_and_others_proceed() {
        let chains = vec![
            ChainInput { chain_id: "A".into(), molecule_type: MoleculeType::Protein, sequence: "MK1".into() },
            ChainInput { chain_id: "B".into(), molecule_type: MoleculeType::Protein, sequence: "MKV".into() },
        ];
        let (sequences, errors) = canonicalize_chains(&chains);
        assert_eq!(sequences.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].chain_id, "A");
    }

    #[test]
    fn graph_is_deterministic_across_input_order() {
        let s1 = protein("ACDEFGHIK");
        let s2 = protein("MKVLAW");
        let cfg = config(&["uniref90", "mgnify"]);
        let catalog = DatabaseCatalog::new();
        let (_dir, store) = empty_store();

        let g1 = JobGraph::build(&[s1.clone(), s2.clone()], &cfg, &catalog, &store).unwrap();
        let g2 = JobGraph::build(&[s2, s1], &cfg, &catalog, &store).unwrap();

        let keys1: Vec<_> = g1.keys().cloned().collect();
        let keys2: Vec<_> = g2.keys().cloned().collect();
        assert_eq!(keys1, keys2);
        for key in g1.keys() {
            let d1: Vec<_> = g1.job(key).unwrap().deps.iter().cloned().collect();
            let d2: Vec<_> = g2.job(key).unwrap().deps.iter().cloned().collect();
            assert_eq!(d1, d2);
        }
        assert_eq!(g1.topological_order(), g2.topological_order());
    }

    #[test]
    fn template_search_adds_dependency_on_uniref90() {
        let seq = protein("MKVLAW");
        let mut cfg = config(&["uniref90"]);
        cfg.run_template_search = true;
        let (_dir, store) = empty_store();

        let graph = JobGraph::build(&[seq.clone()], &cfg, &DatabaseCatalog::new(), &store).unwrap();
        assert_eq!(graph.len(), 2);
        let template_key = JobKey::template(seq.hash(), TEMPLATE_DATABASE);
        let template = graph.job(&template_key).unwrap();
        assert!(template.deps.contains(&JobKey::search(seq.hash(), "uniref90")));
        // El orden topológico pone uniref90 antes de la plantilla.
        let order = graph.topological_order();
        let uniref_pos = order.iter().position(|k| k.database == "uniref90").unwrap();
        let template_pos = order.iter().position(|k| *k == template_key).unwrap();
        assert!(uniref_pos < template_pos);
    }

    #[test]
    fn template_search_without_uniref90_fails_at_build_time() {
        let seq = protein("MKVLAW");
        let mut cfg = config(&["mgnify"]);
        cfg.run_template_search = true;
        let (_dir, store) = empty_store();

        let err = JobGraph::build(&[seq], &cfg, &DatabaseCatalog::new(), &store).unwrap_err();
        assert!(matches!(err, CoreError::MissingTemplateDependency { .. }));
    }

    #[test]
    fn preexisting_uniref90_artifact_satisfies_template_dependency() {
        let seq = protein("MKVLAW");
        let mut cfg = config(&["mgnify"]);
        cfg.run_template_search = true;

        let (_dir, store) = empty_store();
        store.prepare_dir(seq.hash()).unwrap();
        std::fs::write(
            store.artifact_path(seq.hash(), JobKind::Search, "uniref90", MsaFormat::A3m),
            b">q\nMKVLAW\n",
        )
        .unwrap();

        let graph = JobGraph::build(&[seq.clone()], &cfg, &DatabaseCatalog::new(), &store).unwrap();
        let template = graph.job(&JobKey::template(seq.hash(), TEMPLATE_DATABASE)).unwrap();
        assert!(template.deps.is_empty(), "dependency satisfied by existing artifact");
    }

    #[test]
    fn incompatible_database_fails_fast() {
        let seq = protein("MKVLAW");
        let cfg = config(&["uniref90", "rfam"]);
        let (_dir, store) = empty_store();

        let err = JobGraph::build(&[seq], &cfg, &DatabaseCatalog::new(), &store).unwrap_err();
        assert!(matches!(err, CoreError::IncompatibleDatabase { database, .. } if database == "rfam"));
    }

    #[test]
    fn mixed_batch_pairs_each_sequence_with_its_own_databases() {
        let prot = protein("MKVLAW");
        let rna = Sequence::new("ACGUACGU", MoleculeType::Rna).unwrap();
        let cfg = config(&["uniref90", "rfam"]);
        let (_dir, store) = empty_store();

        let graph =
            JobGraph::build(&[prot.clone(), rna.clone()], &cfg, &DatabaseCatalog::new(), &store)
                .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.job(&JobKey::search(prot.hash(), "uniref90")).is_some());
        assert!(graph.job(&JobKey::search(rna.hash(), "rfam")).is_some());
    }

    #[test]
    fn rna_formats_follow_the_layout_contract() {
        let rna = Sequence::new("ACGUACGU", MoleculeType::Rna).unwrap();
        let cfg = config(&["rfam", "rnacentral", "nt"]);
        let (_dir, store) = empty_store();

        let graph = JobGraph::build(&[rna.clone()], &cfg, &DatabaseCatalog::new(), &store).unwrap();
        let fmt = |db: &str| graph.job(&JobKey::search(rna.hash(), db)).unwrap().format;
        assert_eq!(fmt("rfam"), MsaFormat::Sto);
        assert_eq!(fmt("rnacentral"), MsaFormat::A3m);
        assert_eq!(fmt("nt"), MsaFormat::A3m);
    }
}
