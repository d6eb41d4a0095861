mod encoder;
mod export;

pub use encoder::{EncodeSettings, FfmpegEncoder, VideoEncoder};
pub use export::{
    artifact_name, EncodeJob, ExportProgress, ExportRequest, Exporter, EncoderLoader,
};

use crate::clock::Clock;
use crate::theme::Theme;
use crate::visual::{draw_guarded, DrawCtx, SetupCtx, Surface, VisualProgram};
use clap::ValueEnum;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::fmt;
use std::time::Duration;

pub const EXPORT_SECONDS: u32 = 10;
pub const EXPORT_FPS: u32 = 60;
// Snapshots stay in memory until the encode pass; two minutes at 60 fps.
pub const MAX_EXPORT_FRAMES: u64 = 7_200;
pub const MAX_EXPORT_SIDE: usize = 8_192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    Busy,
    EncoderUnavailable(String),
    InvalidSettings(String),
    Snapshot(String),
    Encode(String),
    Io(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "an export is already in progress"),
            Self::EncoderUnavailable(msg) => write!(f, "encoder not ready: {msg}"),
            Self::InvalidSettings(msg) => write!(f, "invalid export settings: {msg}"),
            Self::Snapshot(msg) => write!(f, "snapshot failed: {msg}"),
            Self::Encode(msg) => write!(f, "encoding failed: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}

// What to do when a stalled callback lets several frame boundaries pass
// before the next check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatchUp {
    // One snapshot per check; later checks catch up one boundary at a time.
    Single,
    // Every boundary that has passed is captured in the same check.
    Burst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: usize,
    pub height: usize,
    pub seconds: u32,
    pub fps: u32,
    pub catch_up: CatchUp,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1350,
            seconds: EXPORT_SECONDS,
            fps: EXPORT_FPS,
            catch_up: CatchUp::Single,
        }
    }
}

impl CaptureSettings {
    pub fn total_frames(&self) -> u64 {
        u64::from(self.seconds) * u64::from(self.fps)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.seconds))
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::InvalidSettings("width/height must be non-zero".into()));
        }
        if self.width > MAX_EXPORT_SIDE || self.height > MAX_EXPORT_SIDE {
            return Err(ExportError::InvalidSettings(format!(
                "width/height must be at most {MAX_EXPORT_SIDE} (got {}x{})",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // yuv420p subsamples chroma 2x2.
            return Err(ExportError::InvalidSettings(format!(
                "width/height must be even for 4:2:0 output (got {}x{})",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(ExportError::InvalidSettings("fps must be non-zero".into()));
        }
        if self.seconds == 0 {
            return Err(ExportError::InvalidSettings("duration must be non-zero".into()));
        }
        if self.total_frames() > MAX_EXPORT_FRAMES {
            return Err(ExportError::InvalidSettings(format!(
                "{} s at {} fps is {} frames, more than {MAX_EXPORT_FRAMES}",
                self.seconds,
                self.fps,
                self.total_frames()
            )));
        }
        Ok(())
    }
}

// Frame-boundary scheduler. Boundary `k` sits at `k / fps` seconds; snapshot
// `k` becomes due once elapsed time reaches it. The gate completes after
// exactly `seconds * fps` snapshots.
#[derive(Debug, Clone)]
pub struct FrameGate {
    fps: u64,
    total: u64,
    captured: u64,
    catch_up: CatchUp,
}

impl FrameGate {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            fps: u64::from(settings.fps.max(1)),
            total: settings.total_frames(),
            captured: 0,
            catch_up: settings.catch_up,
        }
    }

    pub fn expected_index(&self, elapsed: Duration) -> u64 {
        let idx = elapsed.as_nanos() * u128::from(self.fps) / 1_000_000_000;
        u64::try_from(idx).unwrap_or(u64::MAX)
    }

    pub fn check(&mut self, elapsed: Duration) -> u64 {
        if self.is_complete() {
            return 0;
        }
        let expected = self.expected_index(elapsed);
        if expected < self.captured {
            return 0;
        }
        let due = match self.catch_up {
            CatchUp::Single => 1,
            CatchUp::Burst => expected - self.captured + 1,
        };
        let due = due.min(self.total - self.captured);
        self.captured += due;
        due
    }

    pub fn until_next(&self, elapsed: Duration) -> Duration {
        let boundary_ns =
            (u128::from(self.captured) * 1_000_000_000).div_ceil(u128::from(self.fps));
        let boundary = Duration::from_nanos(u64::try_from(boundary_ns).unwrap_or(u64::MAX));
        boundary.saturating_sub(elapsed)
    }

    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.captured >= self.total
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub index: u64,
    pub png: Vec<u8>,
}

pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, ExportError> {
    let (w, h) = (
        u32::try_from(width).map_err(|_| ExportError::Snapshot("width too large".into()))?,
        u32::try_from(height).map_err(|_| ExportError::Snapshot("height too large".into()))?,
    );
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::Adaptive)
        .write_image(pixels, w, h, ExtendedColorType::Rgba8)
        .map_err(|e| ExportError::Snapshot(e.to_string()))?;
    Ok(out)
}

pub struct CaptureSession {
    settings: CaptureSettings,
    bitrate_bps: u64,
    label: String,
    gate: FrameGate,
    surface: Surface,
    frames: Vec<Snapshot>,
    origin: Option<Duration>,
}

impl CaptureSession {
    pub fn new(settings: CaptureSettings, bitrate_bps: u64, label: impl Into<String>) -> Self {
        Self {
            gate: FrameGate::new(&settings),
            surface: Surface::new(settings.width, settings.height),
            frames: Vec::new(),
            settings,
            bitrate_bps,
            label: label.into(),
            origin: None,
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn bitrate_bps(&self) -> u64 {
        self.bitrate_bps
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frames(&self) -> &[Snapshot] {
        &self.frames
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    pub fn is_complete(&self) -> bool {
        self.gate.is_complete()
    }

    pub(crate) fn into_frames(self) -> Vec<Snapshot> {
        self.frames
    }

    pub fn prepare(&mut self, program: &mut dyn VisualProgram, theme: Theme) {
        program.setup(&SetupCtx {
            width: self.settings.width,
            height: self.settings.height,
            theme,
        });
    }

    pub fn tick(
        &mut self,
        now: Duration,
        program: &mut dyn VisualProgram,
        theme: Theme,
    ) -> Result<u64, ExportError> {
        let origin = *self.origin.get_or_insert(now);
        let due = self.gate.check(now.saturating_sub(origin));
        for _ in 0..due {
            self.snapshot(program, theme)?;
        }
        Ok(due)
    }

    pub fn until_next(&self, now: Duration) -> Duration {
        match self.origin {
            Some(origin) => self.gate.until_next(now.saturating_sub(origin)),
            None => Duration::ZERO,
        }
    }

    fn snapshot(
        &mut self,
        program: &mut dyn VisualProgram,
        theme: Theme,
    ) -> Result<(), ExportError> {
        let index = self.frames.len() as u64;
        let fps = f64::from(self.settings.fps);
        let ctx = DrawCtx {
            width: self.settings.width,
            height: self.settings.height,
            time_seconds: index as f64 / fps,
            delta_seconds: 1.0 / fps,
            frame_index: index,
            theme,
        };
        draw_guarded(program, &ctx, &mut self.surface);
        let png = encode_png(self.surface.pixels(), self.settings.width, self.settings.height)?;
        self.frames.push(Snapshot { index, png });
        Ok(())
    }
}

pub fn run_capture<C: Clock>(
    session: &mut CaptureSession,
    program: &mut dyn VisualProgram,
    theme: Theme,
    clock: &mut C,
    mut progress: impl FnMut(u64, u64),
) -> Result<(), ExportError> {
    let floor = Duration::from_millis(1);
    loop {
        let taken = session.tick(clock.elapsed(), program, theme)?;
        if taken > 0 {
            progress(session.gate.captured(), session.gate.total());
        }
        if session.is_complete() {
            return Ok(());
        }
        clock.wait(session.until_next(clock.elapsed()).max(floor));
    }
}
