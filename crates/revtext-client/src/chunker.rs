//! Random chunk splitting.

use rand::Rng;

/// Split `text` into contiguous chunks.
///
/// Every chunk's length is drawn uniformly from `[lmin, lmax]` inclusive,
/// except possibly the last chunk, which is whatever remainder is left.
/// Concatenating the chunks in order reproduces `text` exactly; the index
/// of each chunk in the returned vector is its position for reassembly.
///
/// Callers guarantee `0 < lmin <= lmax` (the CLI validates this before the
/// client runs). Empty input yields no chunks.
pub fn split_into_chunks(text: &[u8], lmin: usize, lmax: usize) -> Vec<Vec<u8>> {
    debug_assert!(lmin >= 1 && lmin <= lmax);

    let mut rng = rand::thread_rng();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let size = rng.gen_range(lmin..=lmax);
        let end = (start + size).min(text.len());
        chunks.push(text[start..end].to_vec());
        start = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size_split() {
        let chunks = split_into_chunks(b"hello world", 5, 5);
        assert_eq!(
            chunks,
            vec![b"hello".to_vec(), b" worl".to_vec(), b"d".to_vec()]
        );
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let text: Vec<u8> = (0..500).map(|i| b'a' + (i % 26) as u8).collect();
        for (lmin, lmax) in [(1, 1), (3, 9), (7, 13), (500, 600)] {
            let chunks = split_into_chunks(&text, lmin, lmax);
            let rejoined: Vec<u8> = chunks.concat();
            assert_eq!(rejoined, text, "bounds {}-{}", lmin, lmax);
        }
    }

    #[test]
    fn test_chunk_lengths_within_bounds() {
        let text = vec![b'x'; 1000];
        let (lmin, lmax) = (10, 25);
        let chunks = split_into_chunks(&text, lmin, lmax);
        assert!(!chunks.is_empty());
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.len() >= lmin && chunk.len() <= lmax);
        }
        // The remainder may be shorter than lmin but never empty or oversized.
        let last = chunks.last().unwrap();
        assert!(!last.is_empty());
        assert!(last.len() <= lmax);
    }

    #[test]
    fn test_single_chunk_when_bounds_cover_input() {
        let chunks = split_into_chunks(b"short", 5, 10);
        assert_eq!(chunks, vec![b"short".to_vec()]);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split_into_chunks(b"", 5, 5).is_empty());
    }
}
