//! CLI mínima del pipeline de alineamientos:
//! `msaflow plan|run|compact|link ...`
//!
//! Códigos de salida: 0 ok, 2 uso, 3 entrada inválida, 4 rechazo de dominio
//! (trabajos fallidos, cadena sin alineamientos), 5 error de infraestructura.

use std::path::{Path, PathBuf};
use std::process::exit;

use tracing::info;

use msa_adapters::default_registry;
use msa_core::{
    canonicalize_chains, JobExecutor, JobGraph, OutputStore, QueryDocument, QueryLinker, RunConfig,
};
use msa_domain::DatabaseCatalog;
use msa_store::{CompactStoreBuilder, CompactStoreReader};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let code = match args.get(1).map(String::as_str) {
        Some("plan") => cmd_plan(&args[2..]),
        Some("run") => cmd_run(&args[2..]),
        Some("compact") => cmd_compact(&args[2..]),
        Some("link") => cmd_link(&args[2..]),
        _ => {
            eprintln!("Uso: msaflow <plan|run|compact|link> ...");
            2
        }
    };
    exit(code);
}

/// Toma el valor que sigue a `flag`, en el estilo `--flag valor`.
fn flag_value(args: &[String], flag: &str) -> Option<PathBuf> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            i += 1;
            if i < args.len() {
                return Some(PathBuf::from(&args[i]));
            }
        }
        i += 1;
    }
    None
}

fn load_config(args: &[String], tag: &str) -> Result<RunConfig, i32> {
    let path = match flag_value(args, "--config") {
        Some(p) => p,
        None => {
            eprintln!("Uso: msaflow {tag} --config <FILE>");
            return Err(2);
        }
    };
    match RunConfig::load(&path) {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            eprintln!("[msaflow {tag}] config inválida: {e}");
            Err(3)
        }
    }
}

/// Canonicaliza cadenas y construye el grafo; los errores por cadena van a
/// stderr y la corrida sigue con las válidas.
fn build_graph(config: &RunConfig, store: &OutputStore, tag: &str) -> Result<JobGraph, i32> {
    let (sequences, chain_errors) = canonicalize_chains(&config.chains);
    for err in &chain_errors {
        eprintln!("[msaflow {tag}] cadena '{}' descartada: {}", err.chain_id, err.error);
    }
    if sequences.is_empty() {
        eprintln!("[msaflow {tag}] ninguna cadena válida");
        return Err(3);
    }
    match JobGraph::build(&sequences, config, &DatabaseCatalog::new(), store) {
        Ok(graph) => Ok(graph),
        Err(e) => {
            eprintln!("[msaflow {tag}] error construyendo el grafo: {e}");
            Err(4)
        }
    }
}

/// `msaflow plan --config <FILE>`: imprime el grafo en orden topológico, sin
/// ejecutar nada.
fn cmd_plan(args: &[String]) -> i32 {
    let config = match load_config(args, "plan") {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = OutputStore::new(&config.output_dir);
    let graph = match build_graph(&config, &store, "plan") {
        Ok(g) => g,
        Err(code) => return code,
    };

    println!("{} trabajos:", graph.len());
    for key in graph.topological_order() {
        let job = graph.job(&key).unwrap_or_else(|| unreachable!("key from this graph"));
        let deps = if job.deps.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = job.deps.iter().map(|d| d.to_string()).collect();
            format!("  (espera: {})", names.join(", "))
        };
        let done = store.exists(job.sequence.hash(), job.kind, &job.database.name, job.format);
        println!("  {}{}{}", key, if done { "  [ya existe]" } else { "" }, deps);
    }
    0
}

/// `msaflow run --config <FILE>`: ejecuta el grafo con los adapters reales.
fn cmd_run(args: &[String]) -> i32 {
    let config = match load_config(args, "run") {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = OutputStore::new(&config.output_dir);
    let mut graph = match build_graph(&config, &store, "run") {
        Ok(g) => g,
        Err(code) => return code,
    };

    let registry = default_registry();
    let executor = JobExecutor::new(&registry, &store, &config.tmpdir, config.max_parallel_jobs);
    let report = match executor.run(&mut graph) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[msaflow run] error: {e}");
            return 5;
        }
    };

    let (done, skipped, failed, blocked) = report.summary();
    println!("corrida {}: {done} done, {skipped} skipped, {failed} failed, {blocked} blocked", report.run_id);
    for outcome in report.failures() {
        eprintln!("  {}: {}", outcome.key, outcome.error.as_deref().unwrap_or("?"));
    }
    if report.is_success() {
        0
    } else {
        4
    }
}

/// `msaflow compact --output-dir <DIR> --store <DIR>`: compacta un snapshot
/// cerrado del store de salida en un compact store nuevo.
fn cmd_compact(args: &[String]) -> i32 {
    let (output_dir, store_dir) =
        match (flag_value(args, "--output-dir"), flag_value(args, "--store")) {
            (Some(o), Some(s)) => (o, s),
            _ => {
                eprintln!("Uso: msaflow compact --output-dir <DIR> --store <DIR>");
                return 2;
            }
        };

    let store = OutputStore::new(&output_dir);
    let mut builder = match CompactStoreBuilder::create(&store_dir) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("[msaflow compact] no se pudo crear el store: {e}");
            return 5;
        }
    };
    let added = match builder.ingest_output_store(&store) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("[msaflow compact] error de ingesta: {e}");
            return 5;
        }
    };
    if let Err(e) = builder.finish() {
        eprintln!("[msaflow compact] error publicando el índice: {e}");
        return 5;
    }
    info!(artifacts = added, store = %store_dir.display(), "compactación completa");
    println!("{added} artefactos compactados en {}", store_dir.display());
    0
}

/// `msaflow link --query <FILE> --output-dir <DIR> [--compact <DIR>] [--out <FILE>]`:
/// resuelve in place las rutas de MSA de un documento de consulta.
fn cmd_link(args: &[String]) -> i32 {
    let (query_path, output_dir) =
        match (flag_value(args, "--query"), flag_value(args, "--output-dir")) {
            (Some(q), Some(o)) => (q, o),
            _ => {
                eprintln!(
                    "Uso: msaflow link --query <FILE> --output-dir <DIR> [--compact <DIR>] [--out <FILE>]"
                );
                return 2;
            }
        };

    let mut doc = match read_query(&query_path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let store = OutputStore::new(&output_dir);
    let compact = match flag_value(args, "--compact") {
        Some(dir) => match CompactStoreReader::open(&dir) {
            Ok(r) => Some(r),
            Err(e) => {
                eprintln!("[msaflow link] compact store ilegible: {e}");
                return 5;
            }
        },
        None => None,
    };

    let mut linker = QueryLinker::new(&store);
    if let Some(reader) = &compact {
        linker = linker.with_compact(reader);
    }
    if let Err(e) = linker.resolve(&mut doc) {
        eprintln!("[msaflow link] {e}");
        return 4;
    }

    let json = match doc.to_json_string() {
        Ok(j) => j,
        Err(e) => {
            eprintln!("[msaflow link] error serializando: {e}");
            return 5;
        }
    };
    match flag_value(args, "--out") {
        Some(out) => {
            if let Err(e) = std::fs::write(&out, json) {
                eprintln!("[msaflow link] no se pudo escribir {}: {e}", out.display());
                return 5;
            }
        }
        None => println!("{json}"),
    }
    0
}

fn read_query(path: &Path) -> Result<QueryDocument, i32> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("[msaflow link] no se pudo leer {}: {e}", path.display());
            return Err(3);
        }
    };
    QueryDocument::from_json_str(&text).map_err(|e| {
        eprintln!("[msaflow link] query JSON inválido: {e}");
        3
    })
}
