//! Output assembler

/// Concatenate encoded chunks in order with a single allocation.
///
/// The result length is always the sum of the chunk lengths; chunk order is
/// the byte order of the output.
pub fn assemble(chunks: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = chunks.iter().map(Vec::len).sum();
    let mut out = vec![0u8; total];

    let mut offset = 0;
    for chunk in chunks {
        out[offset..offset + chunk.len()].copy_from_slice(chunk);
        offset += chunk.len();
    }

    out
}
