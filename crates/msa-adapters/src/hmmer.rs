//! Adapters de la familia HMMER: jackhmmer, nhmmer y hmmsearch.

use std::path::Path;

use msa_core::{ToolAdapter, ToolError, ToolRequest};
use msa_domain::SearchTool;

use crate::command::{resolve_binary, run_tool};

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Búsqueda iterativa de perfiles sobre bases de proteína planas
/// (uniref90, mgnify, uniprot, pdb_seqres).
#[derive(Debug, Default)]
pub struct JackhmmerAdapter;

impl JackhmmerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ToolAdapter for JackhmmerAdapter {
    fn tool(&self) -> SearchTool {
        SearchTool::Jackhmmer
    }

    fn run(&self, request: &ToolRequest) -> Result<(), ToolError> {
        let binary = resolve_binary("jackhmmer", "MSAFLOW_JACKHMMER_BIN");
        let args = vec![
            "--cpu".to_string(),
            request.threads.to_string(),
            "--noali".to_string(),
            "-A".to_string(),
            path_arg(&request.output_path),
            path_arg(&request.query_fasta),
            path_arg(&request.database.backing_path),
        ];
        run_tool(self.tool(), &binary, &args)
    }
}

/// Búsqueda de nucleótidos (rfam, rnacentral, nt).
#[derive(Debug, Default)]
pub struct NhmmerAdapter;

impl NhmmerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ToolAdapter for NhmmerAdapter {
    fn tool(&self) -> SearchTool {
        SearchTool::Nhmmer
    }

    fn run(&self, request: &ToolRequest) -> Result<(), ToolError> {
        let binary = resolve_binary("nhmmer", "MSAFLOW_NHMMER_BIN");
        let args = vec![
            "--cpu".to_string(),
            request.threads.to_string(),
            "--noali".to_string(),
            "-A".to_string(),
            path_arg(&request.output_path),
            path_arg(&request.query_fasta),
            path_arg(&request.database.backing_path),
        ];
        run_tool(self.tool(), &binary, &args)
    }
}

/// Búsqueda de plantillas: construye un HMM desde el alineamiento uniref90
/// (`hmmbuild`) y lo corre contra pdb_seqres (`hmmsearch -A`).
#[derive(Debug, Default)]
pub struct HmmsearchAdapter;

impl HmmsearchAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ToolAdapter for HmmsearchAdapter {
    fn tool(&self) -> SearchTool {
        SearchTool::Hmmsearch
    }

    fn run(&self, request: &ToolRequest) -> Result<(), ToolError> {
        let profile_msa = request.profile_msa.as_ref().ok_or_else(|| {
            ToolError::Io("hmmsearch adapter requires a profile alignment".to_string())
        })?;

        // El HMM intermedio vive junto a la salida temporal; nunca toca el
        // store.
        let hmm_path = request.output_path.with_extension("hmm");
        let hmmbuild = resolve_binary("hmmbuild", "MSAFLOW_HMMBUILD_BIN");
        run_tool(
            self.tool(),
            &hmmbuild,
            &[
                "--cpu".to_string(),
                request.threads.to_string(),
                path_arg(&hmm_path),
                path_arg(profile_msa),
            ],
        )?;

        let hmmsearch = resolve_binary("hmmsearch", "MSAFLOW_HMMSEARCH_BIN");
        run_tool(
            self.tool(),
            &hmmsearch,
            &[
                "--cpu".to_string(),
                request.threads.to_string(),
                "--noali".to_string(),
                "-A".to_string(),
                path_arg(&request.output_path),
                path_arg(&hmm_path),
                path_arg(&request.database.backing_path),
            ],
        )
    }
}
