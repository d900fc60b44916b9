//! Ordered chunk storage for one recording session.

/// Append-only buffer of encoded chunks.
///
/// Single producer: chunks are stored in the order they are pushed and the
/// buffer is consumed exactly once by [`ChunkBuffer::assemble`].
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; empty chunks carry nothing and are skipped.
    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.bytes += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn extend<I: IntoIterator<Item = Vec<u8>>>(&mut self, chunks: I) {
        for chunk in chunks {
            self.push(chunk);
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.bytes
    }

    /// Concatenate all chunks in arrival order.
    pub fn assemble(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytes);
        for chunk in self.chunks {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_preserves_arrival_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(b"ab".to_vec());
        buffer.extend([b"c".to_vec(), b"def".to_vec()]);

        assert_eq!(buffer.chunk_count(), 3);
        assert_eq!(buffer.byte_len(), 6);
        assert_eq!(buffer.assemble(), b"abcdef");
    }

    #[test]
    fn test_empty_chunks_are_skipped() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(Vec::new());
        buffer.push(b"x".to_vec());
        buffer.push(Vec::new());

        assert_eq!(buffer.chunk_count(), 1);
        assert_eq!(buffer.assemble(), b"x");
    }

    #[test]
    fn test_empty_buffer_assembles_to_nothing() {
        assert!(ChunkBuffer::new().assemble().is_empty());
    }
}
