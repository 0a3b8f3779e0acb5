/// Map a lock name to the fixed-width key used by the advisory-lock calls.
///
/// CRC-32 (IEEE) of the name's bytes: stable across processes and runs, so
/// every participant derives the same key for the same name. Distinct names
/// may collide to the same key; such names then contend for one lock.
pub fn lock_key(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes())
}

/// The advisory-lock calls take a bigint; the key occupies the low 32 bits.
pub(super) fn key_param(key: u32) -> i64 {
    i64::from(key)
}
