//! Partición de artefactos en filas.
//!
//! La fila es la unidad de deduplicación y debe ser lossless: concatenar las
//! filas de un artefacto reproduce sus bytes exactos, saltos de línea
//! incluidos. Para sto la fila es una línea; para a3m es un registro FASTA
//! completo (línea de cabecera más sus líneas de secuencia), de modo que un
//! hit idéntico entre artefactos deduplica como una sola fila.

use msa_domain::MsaFormat;

pub fn split_rows(format: MsaFormat, bytes: &[u8]) -> Vec<&[u8]> {
    match format {
        MsaFormat::Sto => split_lines(bytes),
        MsaFormat::A3m => split_fasta_records(bytes),
    }
}

/// Líneas con su `\n` incluido; la última se conserva aunque no termine en
/// salto de línea.
fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut rows = Vec::new();
    let mut start = 0;
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            rows.push(&bytes[start..=i]);
            start = i + 1;
        }
    }
    if start < bytes.len() {
        rows.push(&bytes[start..]);
    }
    rows
}

/// Registros FASTA: cada fila arranca en una línea `>`; cualquier preámbulo
/// antes del primer `>` es una fila propia.
fn split_fasta_records(bytes: &[u8]) -> Vec<&[u8]> {
    let mut boundaries = Vec::new();
    for (i, b) in bytes.iter().enumerate() {
        let at_line_start = i == 0 || bytes[i - 1] == b'\n';
        if at_line_start && *b == b'>' {
            boundaries.push(i);
        }
    }
    if boundaries.is_empty() {
        return if bytes.is_empty() { Vec::new() } else { vec![bytes] };
    }
    let mut rows = Vec::new();
    if boundaries[0] > 0 {
        rows.push(&bytes[..boundaries[0]]);
    }
    for (n, start) in boundaries.iter().enumerate() {
        let end = boundaries.get(n + 1).copied().unwrap_or(bytes.len());
        rows.push(&bytes[*start..end]);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(rows: &[&[u8]]) -> Vec<u8> {
        rows.concat()
    }

    #[test]
    fn sto_rows_are_lines_and_rejoin_exactly() {
        let input = b"# STOCKHOLM 1.0\nquery MKV\nhit_1 MKV\n//\n";
        let rows = split_rows(MsaFormat::Sto, input);
        assert_eq!(rows.len(), 4);
        assert_eq!(joined(&rows), input);
    }

    #[test]
    fn sto_last_line_without_newline_is_kept() {
        let input = b"query MKV\n//";
        let rows = split_rows(MsaFormat::Sto, input);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], b"//");
        assert_eq!(joined(&rows), input);
    }

    #[test]
    fn a3m_rows_are_whole_fasta_records() {
        let input = b">query\nMKV\n>hit_1\nM-KV\nLLL\n>hit_2\nMKV\n";
        let rows = split_rows(MsaFormat::A3m, input);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], b">query\nMKV\n");
        assert_eq!(rows[1], b">hit_1\nM-KV\nLLL\n");
        assert_eq!(joined(&rows), input);
    }

    #[test]
    fn a3m_preamble_before_first_header_is_its_own_row() {
        let input = b"#meta\n>q\nMKV\n";
        let rows = split_rows(MsaFormat::A3m, input);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], b"#meta\n");
        assert_eq!(joined(&rows), input);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(split_rows(MsaFormat::Sto, b"").is_empty());
        assert!(split_rows(MsaFormat::A3m, b"").is_empty());
    }
}
