//! Hash helpers – abstracción para poder cambiar de algoritmo sin tocar el
//! resto del workspace. blake3 da digests de 32 bytes, estables entre
//! ejecuciones y máquinas.

use blake3::Hasher;

/// Hashea bytes y devuelve hex (64 caracteres).
pub fn hash_bytes(input: &[u8]) -> String {
    let mut h = Hasher::new();
    h.update(input);
    h.finalize().to_hex().to_string()
}

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    hash_bytes(input.as_bytes())
}

/// Digest crudo de 32 bytes, para tablas de deduplicación en memoria donde
/// el hex sería desperdicio.
pub fn digest_bytes(input: &[u8]) -> [u8; 32] {
    *blake3::hash(input).as_bytes()
}
