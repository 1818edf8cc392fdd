use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::ensure_parent_dir;
use crate::foundation::core::WHITE;
use crate::{MergeError, MergeResult, PixelArray};

/// Four-character code written into the MP4 container.
pub const MP4_FOURCC: &str = "mp4v";

/// Output configuration for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct VideoConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Output MP4 path; an existing file is replaced.
    pub out_path: PathBuf,
}

impl VideoConfig {
    /// Build a config whose canvas fits every frame in `frames`.
    pub fn for_frames(frames: &[PixelArray], fps: u32, out_path: impl Into<PathBuf>) -> Self {
        let (width, height) = video_canvas(frames);
        Self {
            width,
            height,
            fps,
            out_path: out_path.into(),
        }
    }

    /// Reject configurations `ffmpeg` cannot encode.
    pub fn validate(&self) -> MergeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MergeError::validation("video width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(MergeError::validation("video framerate must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(MergeError::validation(
                "video width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

/// Canvas size for a frame list: the largest width and height seen, rounded up to even.
pub fn video_canvas(frames: &[PixelArray]) -> (u32, u32) {
    let width = frames.iter().map(|f| f.width).max().unwrap_or(0);
    let height = frames.iter().map(|f| f.height).max().unwrap_or(0);
    (round_up_even(width), round_up_even(height))
}

fn round_up_even(v: u32) -> u32 {
    v + (v % 2)
}

/// Streams raw RGB24 frames into a spawned `ffmpeg` process.
pub struct FfmpegEncoder {
    cfg: VideoConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: PixelArray,
}

impl FfmpegEncoder {
    /// Spawn `ffmpeg` for `cfg`.
    pub fn new(cfg: VideoConfig) -> MergeResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(MergeError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "mpeg4",
            "-vtag",
            MP4_FOURCC,
            "-q:v",
            "2",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            MergeError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MergeError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MergeError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            scratch: PixelArray::white(cfg.width, cfg.height),
            cfg,
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
        })
    }

    /// Append one frame.
    ///
    /// Frames smaller than the canvas are placed top-left on white; they are never resized.
    pub fn encode_frame(&mut self, frame: &PixelArray) -> MergeResult<()> {
        let bytes: &[u8] = if frame.width == self.cfg.width && frame.height == self.cfg.height {
            &frame.data
        } else {
            tracing::debug!(
                frame_w = frame.width,
                frame_h = frame.height,
                canvas_w = self.cfg.width,
                canvas_h = self.cfg.height,
                "padding video frame onto canvas"
            );
            self.scratch
                .data
                .chunks_exact_mut(PixelArray::CHANNELS)
                .for_each(|px| px.copy_from_slice(&WHITE));
            self.scratch.blit(frame, 0, 0);
            &self.scratch.data
        };

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MergeError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        if let Err(write_err) = stdin.write_all(bytes) {
            // ffmpeg closed its end; its stderr says why.
            return Err(match self.reap() {
                Err(exit_err) => exit_err,
                Ok(()) => MergeError::encode(format!(
                    "failed to write frame to ffmpeg stdin: {write_err}"
                )),
            });
        }
        Ok(())
    }

    /// Close the pipe and wait for `ffmpeg` to finish writing the file.
    pub fn finish(mut self) -> MergeResult<()> {
        self.reap()
    }

    fn reap(&mut self) -> MergeResult<()> {
        drop(self.stdin.take());

        let status = self.child.wait().map_err(|e| {
            MergeError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MergeError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| MergeError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(MergeError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Write `frames` as an MP4 at `framerate` frames per second.
pub fn encode_video(frames: &[PixelArray], framerate: u32, out_path: &Path) -> MergeResult<()> {
    if frames.is_empty() {
        return Err(MergeError::validation("video needs at least one frame"));
    }

    let mut enc = FfmpegEncoder::new(VideoConfig::for_frames(frames, framerate, out_path))?;
    for frame in frames {
        enc.encode_frame(frame)?;
    }
    enc.finish()
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
