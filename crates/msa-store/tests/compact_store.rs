//! Tests de integración del compact store: fidelidad de round-trip,
//! deduplicación real de bytes y detección de corrupción.

use std::fs;

use msa_core::OutputStore;
use msa_domain::MsaFormat;
use msa_store::{merge, CompactStoreBuilder, CompactStoreReader, StoreError, BLOB_FILE, INDEX_FILE};

const SEQ_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const SEQ_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

#[test]
fn roundtrip_is_byte_identical_for_both_formats() {
    let dir = tempfile::tempdir().unwrap();
    let a3m: &[u8] = b">query\nMKVLAW\n>hit_1\nM-KVLAW\n>hit_2\nMKV--AW\n";
    let sto: &[u8] = b"# STOCKHOLM 1.0\nquery MKVLAW\nhit_1 M-KVLAW\n//\n";

    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, a3m).unwrap();
    builder.add_artifact(SEQ_A, "rfam", MsaFormat::Sto, sto).unwrap();
    builder.finish().unwrap();

    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert_eq!(reader.lookup(SEQ_A, "uniref90").unwrap(), a3m);
    assert_eq!(reader.lookup(SEQ_A, "rfam").unwrap(), sto);
    // El orden original de filas se conserva.
    let rows = reader.rows(SEQ_A, "uniref90").unwrap();
    assert_eq!(rows[0], b">query\nMKVLAW\n".to_vec());
    assert_eq!(rows[2], b">hit_2\nMKV--AW\n".to_vec());
}

#[test]
fn shared_rows_are_stored_once_in_the_blob() {
    let dir = tempfile::tempdir().unwrap();
    let shared = b">shared_hit\nMKVLAW\n";
    let a: Vec<u8> = [b">only_a\nAAA\n".as_slice(), shared].concat();
    let b: Vec<u8> = [shared, b">only_b\nBBB\n".as_slice()].concat();

    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, &a).unwrap();
    builder.add_artifact(SEQ_B, "uniref90", MsaFormat::A3m, &b).unwrap();
    builder.finish().unwrap();

    // Blob = filas únicas solamente: la fila compartida aparece una vez.
    let blob = fs::read(dir.path().join(BLOB_FILE)).unwrap();
    let expected = b">only_a\nAAA\n".len() + shared.len() + b">only_b\nBBB\n".len();
    assert_eq!(blob.len(), expected);

    // Y ambos artefactos se reconstruyen completos e intactos.
    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert_eq!(reader.lookup(SEQ_A, "uniref90").unwrap(), a);
    assert_eq!(reader.lookup(SEQ_B, "uniref90").unwrap(), b);
}

#[test]
fn duplicate_entry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">q\nM\n").unwrap();
    let err = builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">q\nM\n").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEntry { .. }));
}

#[test]
fn max_rows_caps_an_entry() {
    let dir = tempfile::tempdir().unwrap();
    let a3m = b">query\nMKV\n>hit_1\nMKV\n>hit_2\nMKV\n>hit_3\nMKV\n";
    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap().max_rows("uniref90", 2);
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, a3m).unwrap();
    builder.finish().unwrap();

    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert_eq!(reader.row_count(SEQ_A, "uniref90"), Some(2));
    assert_eq!(reader.lookup(SEQ_A, "uniref90").unwrap(), b">query\nMKV\n>hit_1\nMKV\n");
}

#[test]
fn abandoned_builder_leaves_no_inflight_blob() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
        builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">q\nM\n").unwrap();
        // Se descarta sin `finish`, como una ingesta que falló a mitad.
    }
    assert!(!dir.path().join(format!("{BLOB_FILE}.tmp")).exists());
    assert!(!dir.path().join(BLOB_FILE).exists());
    assert!(!dir.path().join(INDEX_FILE).exists());
}

#[test]
fn missing_entry_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">q\nM\n").unwrap();
    builder.finish().unwrap();

    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert!(matches!(
        reader.lookup(SEQ_A, "mgnify"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn tampered_blob_is_detected_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">a\nAAA\n").unwrap();
    builder.add_artifact(SEQ_B, "uniref90", MsaFormat::A3m, b">b\nBBB\n").unwrap();
    builder.finish().unwrap();

    // Corromper los bytes de la primera fila del blob.
    let blob_path = dir.path().join(BLOB_FILE);
    let mut blob = fs::read(&blob_path).unwrap();
    blob[1] = b'X';
    fs::write(&blob_path, &blob).unwrap();

    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert!(matches!(
        reader.lookup(SEQ_A, "uniref90"),
        Err(StoreError::RowHashMismatch { .. })
    ));
    // La otra entrada sigue siendo legible.
    assert_eq!(reader.lookup(SEQ_B, "uniref90").unwrap(), b">b\nBBB\n");
}

#[test]
fn truncated_blob_is_out_of_bounds_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">a\nAAAAAAAA\n").unwrap();
    builder.finish().unwrap();

    let blob_path = dir.path().join(BLOB_FILE);
    let blob = fs::read(&blob_path).unwrap();
    fs::write(&blob_path, &blob[..3]).unwrap();

    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert!(matches!(
        reader.lookup(SEQ_A, "uniref90"),
        Err(StoreError::CorruptBlob { .. })
    ));
}

#[test]
fn overflowing_row_offset_in_index_is_corrupt_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = CompactStoreBuilder::create(dir.path()).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, b">a\nAAA\n").unwrap();
    builder.add_artifact(SEQ_B, "uniref90", MsaFormat::A3m, b">b\nBBB\n").unwrap();
    builder.finish().unwrap();

    // Reescribir el offset de la primera fila con un valor cercano a u64::MAX:
    // `off + len` desbordaría si la cota se calculara sin checked_add.
    let index_path = dir.path().join(INDEX_FILE);
    let index = fs::read_to_string(&index_path).unwrap();
    let tampered = index.replacen("\"off\": 0", "\"off\": 18446744073709551614", 1);
    assert_ne!(index, tampered);
    fs::write(&index_path, tampered).unwrap();

    let reader = CompactStoreReader::open(dir.path()).unwrap();
    assert!(matches!(
        reader.lookup(SEQ_A, "uniref90"),
        Err(StoreError::CorruptBlob { .. })
    ));
    // La otra entrada sigue siendo legible.
    assert_eq!(reader.lookup(SEQ_B, "uniref90").unwrap(), b">b\nBBB\n");
}

#[test]
fn merge_remaps_offsets_and_keeps_dedup() {
    let root = tempfile::tempdir().unwrap();
    let (dir_a, dir_b, dir_out) =
        (root.path().join("a"), root.path().join("b"), root.path().join("out"));
    let shared = b">shared\nMKV\n";
    let art_a: Vec<u8> = [b">a\nAAA\n".as_slice(), shared].concat();
    let art_b: Vec<u8> = [shared, b">b\nBBB\n".as_slice()].concat();

    let mut builder = CompactStoreBuilder::create(&dir_a).unwrap();
    builder.add_artifact(SEQ_A, "uniref90", MsaFormat::A3m, &art_a).unwrap();
    builder.finish().unwrap();

    let mut builder = CompactStoreBuilder::create(&dir_b).unwrap();
    builder.add_artifact(SEQ_B, "uniref90", MsaFormat::A3m, &art_b).unwrap();
    builder.finish().unwrap();

    merge(&dir_a, &dir_b, &dir_out).unwrap();

    let merged = CompactStoreReader::open(&dir_out).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.lookup(SEQ_A, "uniref90").unwrap(), art_a);
    assert_eq!(merged.lookup(SEQ_B, "uniref90").unwrap(), art_b);

    // La unión deduplica la fila compartida entre ambos stores.
    let blob = fs::read(dir_out.join(BLOB_FILE)).unwrap();
    let expected = b">a\nAAA\n".len() + shared.len() + b">b\nBBB\n".len();
    assert_eq!(blob.len(), expected);
}

#[test]
fn ingest_reads_a_closed_output_store_snapshot() {
    let root = tempfile::tempdir().unwrap();
    let store = OutputStore::new(root.path().join("alignments"));
    store.prepare_dir(SEQ_A).unwrap();
    let a3m: &[u8] = b">query\nMKV\n>hit\nMKV\n";
    fs::write(
        store.artifact_path(SEQ_A, msa_core::JobKind::Search, "uniref90", MsaFormat::A3m),
        a3m,
    )
    .unwrap();
    fs::write(
        store.artifact_path(SEQ_A, msa_core::JobKind::TemplateSearch, "pdb_seqres", MsaFormat::Sto),
        b"# STOCKHOLM 1.0\n//\n",
    )
    .unwrap();

    let compact_dir = root.path().join("compact");
    let mut builder = CompactStoreBuilder::create(&compact_dir).unwrap();
    assert_eq!(builder.ingest_output_store(&store).unwrap(), 2);
    builder.finish().unwrap();

    let reader = CompactStoreReader::open(&compact_dir).unwrap();
    assert_eq!(reader.lookup(SEQ_A, "uniref90").unwrap(), a3m);
    // La salida de plantillas se indexa bajo la clave 'hmm_output'.
    assert_eq!(reader.lookup(SEQ_A, "hmm_output").unwrap(), b"# STOCKHOLM 1.0\n//\n");
}
