//! Encoder seam between the recorder and a concrete video encoder.

use super::RecordError;

/// Raw frame layout handed to an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FrameFormat {
    /// Bytes in one RGBA frame
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A running encoder session.
pub trait VideoEncoder {
    /// Queue one RGBA frame.
    fn push_frame(&mut self, rgba: &[u8]) -> Result<(), RecordError>;

    /// Chunks produced since the last call, in emission order.
    fn take_chunks(&mut self) -> Vec<Vec<u8>>;

    /// Flush and close, returning the chunks not yet taken.
    fn finish(self: Box<Self>) -> Result<Vec<Vec<u8>>, RecordError>;
}

/// Opens encoder sessions.
pub trait EncoderFactory {
    fn open(&mut self, format: FrameFormat) -> Result<Box<dyn VideoEncoder>, RecordError>;
}
