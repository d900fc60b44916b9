//! Playable track: decoded audio plus a playhead shared with the output callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::decode::DecodedAudio;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded track (unique per process)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

#[derive(Debug)]
struct Playhead {
    /// Position in source frames (fractional when resampling)
    position: f64,
    state: PlayState,
    connected: bool,
    ended: bool,
}

/// Decoded audio with transport state.
///
/// Clones share the playhead, so the copy handed to the audio callback and the
/// copy held by the analyzer always observe the same position.
#[derive(Clone)]
pub struct Track {
    id: TrackId,
    name: String,
    audio: Arc<DecodedAudio>,
    head: Arc<Mutex<Playhead>>,
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Track {
    pub fn new(name: impl Into<String>, audio: DecodedAudio) -> Self {
        Self {
            id: TrackId(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            audio: Arc::new(audio),
            head: Arc::new(Mutex::new(Playhead {
                position: 0.0,
                state: PlayState::Stopped,
                connected: false,
                ended: false,
            })),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    pub fn duration(&self) -> Duration {
        self.audio.duration()
    }

    /// Start playback from the current position (from the top after the end).
    pub fn play(&self) {
        let mut head = self.head.lock();
        if head.ended {
            head.position = 0.0;
            head.ended = false;
        }
        head.state = PlayState::Playing;
    }

    /// Stop playback and rewind.
    pub fn stop(&self) {
        let mut head = self.head.lock();
        head.state = PlayState::Stopped;
        head.position = 0.0;
        head.ended = false;
    }

    pub fn connect(&self) {
        self.head.lock().connected = true;
    }

    /// Sever the output; the callback renders silence from now on.
    pub fn disconnect(&self) {
        self.head.lock().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.head.lock().connected
    }

    pub fn state(&self) -> PlayState {
        self.head.lock().state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlayState::Playing
    }

    /// True once playback ran off the end of the audio
    pub fn has_ended(&self) -> bool {
        self.head.lock().ended
    }

    pub fn position(&self) -> Duration {
        let head = self.head.lock();
        Duration::from_secs_f64(head.position / self.audio.sample_rate as f64)
    }

    /// Render interleaved output frames, advancing the playhead.
    ///
    /// Channels are mapped by index (extra output channels repeat the last
    /// source channel). Rate conversion is nearest-sample.
    pub fn fill_output(&self, out: &mut [f32], out_channels: usize, out_rate: u32) {
        out.fill(0.0);

        let mut head = self.head.lock();
        if head.state != PlayState::Playing || !head.connected || out_channels == 0 {
            return;
        }

        let src_channels = self.audio.channels.max(1) as usize;
        let total_frames = self.audio.frames();
        let step = self.audio.sample_rate as f64 / out_rate.max(1) as f64;

        for frame in out.chunks_mut(out_channels) {
            let index = head.position as usize;
            if index >= total_frames {
                head.state = PlayState::Stopped;
                head.ended = true;
                head.position = total_frames as f64;
                break;
            }

            let base = index * src_channels;
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = self.audio.samples[base + c.min(src_channels - 1)];
            }
            head.position += step;
        }
    }

    /// The `len` mono frames preceding the playhead (silence while not audible).
    pub fn recent_mono(&self, len: usize) -> Vec<f32> {
        let head = self.head.lock();
        if head.state != PlayState::Playing || !head.connected {
            return vec![0.0; len];
        }

        let end = head.position as usize;
        (0..len)
            .map(|k| match (end + k).checked_sub(len) {
                Some(frame) => self.audio.mono_at(frame),
                None => 0.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_track(frames: usize, channels: u16, sample_rate: u32) -> Track {
        let samples = (0..frames * channels as usize)
            .map(|i| (i / channels as usize) as f32)
            .collect();
        Track::new(
            "ramp",
            DecodedAudio {
                samples,
                channels,
                sample_rate,
            },
        )
    }

    #[test]
    fn test_new_track_is_stopped_and_detached() {
        let track = ramp_track(10, 1, 100);
        assert_eq!(track.state(), PlayState::Stopped);
        assert!(!track.is_connected());
        assert_eq!(track.position(), Duration::ZERO);
    }

    #[test]
    fn test_clones_share_playhead() {
        let track = ramp_track(10, 1, 100);
        let other = track.clone();
        track.play();
        assert!(other.is_playing());
        assert_eq!(track.id(), other.id());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ramp_track(1, 1, 100).id(), ramp_track(1, 1, 100).id());
    }

    #[test]
    fn test_fill_output_advances_and_duplicates_mono() {
        let track = ramp_track(10, 1, 100);
        track.connect();
        track.play();

        let mut out = [0.0f32; 6];
        track.fill_output(&mut out, 2, 100);
        assert_eq!(out, [0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert!((track.position().as_secs_f64() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_fill_output_stops_at_end() {
        let track = ramp_track(3, 1, 100);
        track.connect();
        track.play();

        let mut out = [9.0f32; 5];
        track.fill_output(&mut out, 1, 100);
        assert_eq!(out, [0.0, 1.0, 2.0, 0.0, 0.0]);
        assert!(!track.is_playing());
        assert!(track.has_ended());

        // Playing again restarts from the top
        track.play();
        assert_eq!(track.position(), Duration::ZERO);
    }

    #[test]
    fn test_disconnected_track_renders_silence() {
        let track = ramp_track(10, 1, 100);
        track.connect();
        track.play();
        track.disconnect();

        let mut out = [5.0f32; 4];
        track.fill_output(&mut out, 1, 100);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(track.position(), Duration::ZERO);
    }

    #[test]
    fn test_fill_output_resamples_by_rate_ratio() {
        let track = ramp_track(10, 1, 200);
        track.connect();
        track.play();

        let mut out = [0.0f32; 3];
        track.fill_output(&mut out, 1, 100);
        assert_eq!(out, [0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_recent_mono_window_precedes_playhead() {
        let track = ramp_track(10, 2, 100);
        track.connect();
        track.play();

        let mut out = [0.0f32; 8];
        track.fill_output(&mut out, 2, 100);

        // Playhead at frame 4, window of 6 is zero-padded at the front
        assert_eq!(track.recent_mono(6), vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_recent_mono_is_silent_when_stopped() {
        let track = ramp_track(10, 1, 100);
        track.connect();
        track.play();
        let mut out = [0.0f32; 5];
        track.fill_output(&mut out, 1, 100);
        track.stop();

        assert_eq!(track.recent_mono(4), vec![0.0; 4]);
    }
}
