//! WebM encoding through an ffmpeg child process.
//!
//! Raw RGBA frames go in on stdin, WebM container bytes come back on stdout.
//! Each pipe has its own thread so the UI thread never blocks on ffmpeg.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use super::encoder::{EncoderFactory, FrameFormat, VideoEncoder};
use super::RecordError;
use crate::params::RecordingConfig;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Spawns one ffmpeg process per recording session.
#[derive(Debug, Clone)]
pub struct FfmpegFactory {
    ffmpeg_path: Option<PathBuf>,
    bitrate: String,
    queue_frames: usize,
}

impl FfmpegFactory {
    pub fn new(config: &RecordingConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            bitrate: config.bitrate.clone(),
            queue_frames: config.queue_frames,
        }
    }

    /// Resolve the ffmpeg binary: explicit path first, then PATH.
    fn locate(&self) -> Result<PathBuf, RecordError> {
        match &self.ffmpeg_path {
            Some(path) if path.exists() => Ok(path.clone()),
            Some(_) => Err(RecordError::FfmpegNotFound),
            None => which::which("ffmpeg").map_err(|_| RecordError::FfmpegNotFound),
        }
    }
}

/// Command line for a raw-RGBA-in, VP8-WebM-out encode.
#[rustfmt::skip]
pub fn encoder_args(format: FrameFormat, bitrate: &str) -> Vec<String> {
    let size = format!("{}x{}", format.width, format.height);
    let fps = format.fps.to_string();
    [
        "-hide_banner", "-loglevel", "error",
        "-f", "rawvideo", "-pix_fmt", "rgba", "-s", size.as_str(), "-r", fps.as_str(), "-i", "pipe:0",
        "-an",
        "-c:v", "libvpx", "-b:v", bitrate, "-deadline", "realtime", "-cpu-used", "8",
        "-pix_fmt", "yuv420p",
        "-f", "webm", "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl EncoderFactory for FfmpegFactory {
    fn open(&mut self, format: FrameFormat) -> Result<Box<dyn VideoEncoder>, RecordError> {
        let ffmpeg = self.locate()?;
        log::info!(
            "Starting encoder: {} ({}x{} @ {} fps)",
            ffmpeg.display(),
            format.width,
            format.height,
            format.fps
        );

        let mut child = Command::new(&ffmpeg)
            .args(encoder_args(format, &self.bitrate))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RecordError::Spawn)?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RecordError::Pipe("ffmpeg pipes unavailable".to_string()));
        };

        let logger = thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                log::warn!("ffmpeg: {}", line);
            }
        });

        Ok(Box::new(FfmpegEncoder {
            child,
            pipes: EncoderPipes::spawn(stdin, stdout, format.frame_bytes(), self.queue_frames),
            logger: Some(logger),
        }))
    }
}

/// Frame queue into an encoder's input and chunk collection from its output.
///
/// A writer thread drains a bounded frame queue into `input`; a single reader
/// thread forwards whatever `output` yields, so chunks arrive in order.
pub(crate) struct EncoderPipes {
    frame_bytes: usize,
    frame_tx: Option<SyncSender<Vec<u8>>>,
    chunk_rx: Receiver<Vec<u8>>,
    writer: Option<JoinHandle<io::Result<()>>>,
    reader: Option<JoinHandle<()>>,
    dropped_frames: u64,
}

impl EncoderPipes {
    pub(crate) fn spawn<W, R>(input: W, output: R, frame_bytes: usize, queue_frames: usize) -> Self
    where
        W: Write + Send + 'static,
        R: Read + Send + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::sync_channel::<Vec<u8>>(queue_frames);
        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<u8>>();

        let writer = thread::spawn(move || -> io::Result<()> {
            let mut input = input;
            for frame in frame_rx {
                input.write_all(&frame)?;
            }
            input.flush()
            // input dropped here, signalling end of stream
        });

        let reader = thread::spawn(move || {
            let mut output = output;
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            loop {
                match output.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if chunk_tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log::error!("Encoder output read failed: {}", e);
                        break;
                    }
                }
            }
        });

        Self {
            frame_bytes,
            frame_tx: Some(frame_tx),
            chunk_rx,
            writer: Some(writer),
            reader: Some(reader),
            dropped_frames: 0,
        }
    }

    /// Queue a frame without blocking; a full queue drops it.
    pub(crate) fn push_frame(&mut self, rgba: &[u8]) -> Result<(), RecordError> {
        if rgba.len() != self.frame_bytes {
            return Err(RecordError::FrameSize {
                expected: self.frame_bytes,
                actual: rgba.len(),
            });
        }

        let Some(tx) = &self.frame_tx else {
            return Err(RecordError::Pipe("encoder input already closed".to_string()));
        };

        match tx.try_send(rgba.to_vec()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                // Real-time capture: a frame the encoder cannot take is lost
                self.dropped_frames += 1;
                log::debug!("Encoder busy, dropped frame ({} total)", self.dropped_frames);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(RecordError::Pipe("encoder stopped accepting frames".to_string()))
            }
        }
    }

    pub(crate) fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        self.chunk_rx.try_iter().collect()
    }

    pub(crate) fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Flush queued frames and close the input. Blocks until the writer is done.
    pub(crate) fn close_input(&mut self) -> io::Result<()> {
        drop(self.frame_tx.take());
        match self.writer.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(io::Error::other("encoder writer panicked")),
            None => Ok(()),
        }
    }

    /// Wait for the output to end and return the chunks not yet taken.
    pub(crate) fn drain_output(&mut self) -> Vec<Vec<u8>> {
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.take_chunks()
    }
}

struct FfmpegEncoder {
    child: Child,
    pipes: EncoderPipes,
    logger: Option<JoinHandle<()>>,
}

impl VideoEncoder for FfmpegEncoder {
    fn push_frame(&mut self, rgba: &[u8]) -> Result<(), RecordError> {
        self.pipes.push_frame(rgba)
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        self.pipes.take_chunks()
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<Vec<u8>>, RecordError> {
        let write_result = self.pipes.close_input();
        let chunks = self.pipes.drain_output();

        let status = self
            .child
            .wait()
            .map_err(|e| RecordError::Pipe(format!("waiting for ffmpeg: {e}")))?;
        if let Some(logger) = self.logger.take() {
            let _ = logger.join();
        }

        if !status.success() {
            return Err(RecordError::EncoderFailed(format!("ffmpeg exited with {status}")));
        }
        write_result.map_err(|e| RecordError::Pipe(format!("writing frames: {e}")))?;

        if self.pipes.dropped_frames() > 0 {
            log::warn!("Encoder dropped {} frames", self.pipes.dropped_frames());
        }
        Ok(chunks)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Aborted sessions: make sure the child does not outlive us
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[test]
    fn test_encoder_args_describe_raw_input_and_webm_output() {
        let format = FrameFormat {
            width: 640,
            height: 360,
            fps: 30,
        };
        let args = encoder_args(format, "2M");
        let joined = args.join(" ");

        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 640x360 -r 30 -i pipe:0"));
        assert!(joined.contains("-an"));
        assert!(joined.contains("-b:v 2M"));
        assert!(joined.ends_with("-f webm pipe:1"));
    }

    /// Input that holds every write until the gate opens (sender dropped).
    struct GatedInput {
        gate: Receiver<()>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for GatedInput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let _ = self.gate.recv();
            self.written.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Output yielding fixed pieces, one per read.
    struct Pieces(VecDeque<Vec<u8>>);

    impl Read for Pieces {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(piece) = self.0.pop_front() else {
                return Ok(0);
            };
            buf[..piece.len()].copy_from_slice(&piece);
            Ok(piece.len())
        }
    }

    #[test]
    fn test_full_queue_drops_frames_instead_of_blocking() {
        let (open_gate, gate) = mpsc::channel::<()>();
        let written = Arc::new(Mutex::new(Vec::new()));
        let input = GatedInput {
            gate,
            written: Arc::clone(&written),
        };
        let mut pipes = EncoderPipes::spawn(input, io::empty(), 4, 2);

        for i in 0..10u8 {
            pipes.push_frame(&[i; 4]).unwrap();
        }
        // At most one frame in the blocked writer plus two queued
        assert!(pipes.dropped_frames() >= 7);

        drop(open_gate);
        pipes.close_input().unwrap();

        let written = written.lock().clone();
        let accepted = 10 - pipes.dropped_frames() as usize;
        assert_eq!(written.len(), accepted * 4);
        let firsts: Vec<u8> = written.chunks(4).map(|frame| frame[0]).collect();
        assert!(firsts.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_wrong_frame_size_is_rejected() {
        let mut pipes = EncoderPipes::spawn(io::sink(), io::empty(), 16, 2);
        let err = pipes.push_frame(&[0; 4]).unwrap_err();
        assert!(matches!(
            err,
            RecordError::FrameSize {
                expected: 16,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_output_chunks_arrive_in_order() {
        let pieces: VecDeque<Vec<u8>> = [b"EBML".to_vec(), b"seg".to_vec(), b"cluster".to_vec()]
            .into_iter()
            .collect();
        let mut pipes = EncoderPipes::spawn(io::sink(), Pieces(pieces), 4, 2);

        pipes.close_input().unwrap();
        let chunks = pipes.drain_output();
        assert_eq!(
            chunks,
            vec![b"EBML".to_vec(), b"seg".to_vec(), b"cluster".to_vec()]
        );
    }

    #[test]
    fn test_large_output_is_split_and_reassembled() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut pipes = EncoderPipes::spawn(io::sink(), io::Cursor::new(data.clone()), 4, 2);

        pipes.close_input().unwrap();
        let chunks = pipes.drain_output();
        assert!(chunks.len() >= 4);
        assert!(chunks.iter().all(|c| c.len() <= READ_CHUNK_BYTES));
        assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn test_push_after_close_is_pipe_error() {
        let mut pipes = EncoderPipes::spawn(io::sink(), io::empty(), 4, 2);
        pipes.close_input().unwrap();
        assert!(matches!(pipes.push_frame(&[0; 4]), Err(RecordError::Pipe(_))));
    }

    #[test]
    fn test_ffmpeg_writes_webm() {
        if which::which("ffmpeg").is_err() {
            eprintln!("ffmpeg not on PATH; skipping");
            return;
        }

        let mut factory = FfmpegFactory::new(&RecordingConfig::default());
        let format = FrameFormat {
            width: 4,
            height: 4,
            fps: 30,
        };
        let mut encoder = factory.open(format).unwrap();

        let mut chunks = Vec::new();
        for i in 0..5u8 {
            encoder.push_frame(&vec![i * 40; format.frame_bytes()]).unwrap();
            chunks.extend(encoder.take_chunks());
        }
        chunks.extend(encoder.finish().unwrap());

        let bytes = chunks.concat();
        assert!(bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]));
    }

    #[test]
    fn test_missing_explicit_binary_is_not_found() {
        let config = RecordingConfig {
            ffmpeg_path: Some(PathBuf::from("/definitely/not/here/ffmpeg")),
            ..Default::default()
        };
        let mut factory = FfmpegFactory::new(&config);
        let result = factory.open(FrameFormat {
            width: 2,
            height: 2,
            fps: 30,
        });
        assert!(matches!(result, Err(RecordError::FfmpegNotFound)));
    }
}
