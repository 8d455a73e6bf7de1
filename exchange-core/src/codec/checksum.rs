/// Sums every byte in `bytes` modulo 256 and renders it as three zero-padded ASCII digits
/// (§4.1 "Checksum"), matching `fix_engine.py::_calculate_checksum`.
pub fn compute(bytes: &[u8]) -> String {
    let sum: u32 = bytes.iter().map(|&b| b as u32).sum();
    format!("{:03}", sum % 256)
}

/// True iff `rendered_checksum` (the literal value of tag 10) equals `compute(preceding_bytes)`.
pub fn verify(preceding_bytes: &[u8], rendered_checksum: &str) -> bool {
    compute(preceding_bytes) == rendered_checksum
}
