//! Ejecución de subprocesos compartida por los adapters reales.

use std::env;
use std::io::ErrorKind;
use std::process::Command;

use msa_core::ToolError;
use msa_domain::SearchTool;
use tracing::debug;

/// Resuelve el binario de una herramienta: override por entorno o el nombre
/// por defecto en PATH.
pub fn resolve_binary(default_name: &str, env_var: &str) -> String {
    env::var(env_var).unwrap_or_else(|_| default_name.to_string())
}

/// Corre el comando hasta terminar, capturando stdout/stderr.
///
/// Mapea el binario ausente a `ToolError::NotFound` y un exit distinto de
/// cero a `ToolError::Failed` con el stderr capturado.
pub fn run_tool(tool: SearchTool, binary: &str, args: &[String]) -> Result<(), ToolError> {
    debug!(%tool, binary, ?args, "invoking external tool");
    let output = Command::new(binary).args(args).output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ToolError::NotFound { binary: binary.to_string() }
        } else {
            ToolError::Io(format!("could not run '{binary}': {e}"))
        }
    })?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            tool,
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
