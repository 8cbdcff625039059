//! Adapter de hhblits (bases clusterizadas uniref30/bfd/cfdb).

use msa_core::{ToolAdapter, ToolError, ToolRequest};
use msa_domain::SearchTool;

use crate::command::{resolve_binary, run_tool};

#[derive(Debug, Default)]
pub struct HhblitsAdapter;

impl HhblitsAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ToolAdapter for HhblitsAdapter {
    fn tool(&self) -> SearchTool {
        SearchTool::Hhblits
    }

    fn run(&self, request: &ToolRequest) -> Result<(), ToolError> {
        let binary = resolve_binary("hhblits", "MSAFLOW_HHBLITS_BIN");
        let args = vec![
            "-cpu".to_string(),
            request.threads.to_string(),
            "-i".to_string(),
            request.query_fasta.to_string_lossy().into_owned(),
            // -d toma el prefijo del directorio multi-archivo de la base.
            "-d".to_string(),
            request.database.backing_path.to_string_lossy().into_owned(),
            "-oa3m".to_string(),
            request.output_path.to_string_lossy().into_owned(),
            "-n".to_string(),
            "3".to_string(),
        ];
        run_tool(self.tool(), &binary, &args)
    }
}
