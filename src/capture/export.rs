use super::{
    CaptureSession, CaptureSettings, EncodeSettings, ExportError, Snapshot, VideoEncoder,
};
use crate::config::QualityTier;
use crate::theme::Theme;
use crate::visual::VisualProgram;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub type EncoderLoader = Box<dyn Fn() -> Result<Arc<dyn VideoEncoder>, ExportError> + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub bitrate_bps: u64,
    pub label: String,
}

impl ExportRequest {
    pub fn tier(tier: QualityTier) -> Self {
        Self {
            bitrate_bps: tier.bitrate_bps(),
            label: tier.label().to_string(),
        }
    }

    pub fn custom(bitrate_bps: u64) -> Self {
        Self {
            bitrate_bps,
            label: format!("{}k", bitrate_bps / 1000),
        }
    }
}

pub fn artifact_name(label: &str, created: &DateTime<Local>) -> String {
    format!("lissajous-{label}-{}.mp4", created.format("%Y%m%d-%H%M%S"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportProgress {
    Idle,
    Capturing { captured: u64, total: u64 },
    Encoding { frames: u64 },
}

pub struct EncodeJob {
    frames: u64,
    label: String,
    handle: Option<JoinHandle<Result<PathBuf, ExportError>>>,
}

impl EncodeJob {
    pub fn spawn(
        encoder: Arc<dyn VideoEncoder>,
        session: CaptureSession,
        out_dir: PathBuf,
        created: DateTime<Local>,
    ) -> Result<Self, ExportError> {
        let settings = *session.settings();
        let encode = EncodeSettings {
            width: settings.width,
            height: settings.height,
            fps: settings.fps,
            bitrate_bps: session.bitrate_bps(),
        };
        let label = session.label().to_string();
        let frames = session.frame_count();
        let snapshots = session.into_frames();
        let name = artifact_name(&label, &created);

        let handle = std::thread::Builder::new()
            .name("lissaviz-encode".to_string())
            .spawn(move || {
                encode_and_deliver(encoder.as_ref(), &snapshots, &encode, &out_dir, &name)
            })
            .map_err(|e| ExportError::Encode(format!("spawn encode thread: {e}")))?;

        Ok(Self {
            frames,
            label,
            handle: Some(handle),
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    pub fn join(mut self) -> Result<PathBuf, ExportError> {
        let Some(handle) = self.handle.take() else {
            return Err(ExportError::Encode("encode job already joined".into()));
        };
        handle
            .join()
            .unwrap_or_else(|_| Err(ExportError::Encode("encode thread panicked".into())))
    }
}

fn encode_and_deliver(
    encoder: &dyn VideoEncoder,
    frames: &[Snapshot],
    settings: &EncodeSettings,
    out_dir: &Path,
    name: &str,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ExportError::Io(format!("create {}: {e}", out_dir.display())))?;
    let partial = out_dir.join(format!(".{name}.part"));
    let started = std::time::Instant::now();

    if let Err(err) = encoder.encode(frames, settings, &partial) {
        let _ = std::fs::remove_file(&partial);
        return Err(err);
    }

    let dest = unique_path(out_dir, name);
    std::fs::rename(&partial, &dest).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        ExportError::Io(format!("move output to {}: {e}", dest.display()))
    })?;
    tracing::info!(
        encoder = encoder.name(),
        frames = frames.len(),
        bitrate = settings.bitrate_bps,
        elapsed_ms = started.elapsed().as_millis() as u64,
        out = %dest.display(),
        "export written"
    );
    Ok(dest)
}

fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let first = dir.join(name);
    if !first.exists() {
        return first;
    }
    let stem = name.trim_end_matches(".mp4");
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}.mp4")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

enum Active {
    Capturing {
        session: CaptureSession,
        encoder: Arc<dyn VideoEncoder>,
    },
    Encoding(EncodeJob),
}

// Owns the single export slot: idle → capturing → encoding → idle. A
// request while the slot is taken is refused and changes nothing.
pub struct Exporter {
    settings: CaptureSettings,
    out_dir: PathBuf,
    load_encoder: EncoderLoader,
    active: Option<Active>,
}

impl Exporter {
    pub fn new(
        settings: CaptureSettings,
        out_dir: impl Into<PathBuf>,
        load_encoder: EncoderLoader,
    ) -> Self {
        Self {
            settings,
            out_dir: out_dir.into(),
            load_encoder,
            active: None,
        }
    }

    pub fn with_ffmpeg(settings: CaptureSettings, out_dir: impl Into<PathBuf>) -> Self {
        Self::new(settings, out_dir, Box::new(super::FfmpegEncoder::shared))
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.active, Some(Active::Capturing { .. }))
    }

    pub fn progress(&self) -> ExportProgress {
        match &self.active {
            None => ExportProgress::Idle,
            Some(Active::Capturing { session, .. }) => ExportProgress::Capturing {
                captured: session.frame_count(),
                total: session.gate().total(),
            },
            Some(Active::Encoding(job)) => ExportProgress::Encoding {
                frames: job.frames(),
            },
        }
    }

    // Opens a session and resets `program` onto the export surface. Fails
    // without side effects when busy or when the encoder cannot be loaded.
    pub fn start(
        &mut self,
        request: ExportRequest,
        program: &mut dyn VisualProgram,
        theme: Theme,
    ) -> Result<(), ExportError> {
        if self.active.is_some() {
            tracing::warn!(label = %request.label, "export rejected: session active");
            return Err(ExportError::Busy);
        }
        if request.bitrate_bps == 0 {
            return Err(ExportError::InvalidSettings("bitrate must be > 0".into()));
        }
        self.settings.validate()?;
        let encoder = (self.load_encoder)()?;

        let mut session = CaptureSession::new(self.settings, request.bitrate_bps, request.label);
        session.prepare(program, theme);
        tracing::info!(
            label = session.label(),
            bitrate = session.bitrate_bps(),
            frames = self.settings.total_frames(),
            width = self.settings.width,
            height = self.settings.height,
            "export started"
        );
        self.active = Some(Active::Capturing { session, encoder });
        Ok(())
    }

    pub fn tick(
        &mut self,
        now: Duration,
        program: &mut dyn VisualProgram,
        theme: Theme,
    ) -> Result<ExportProgress, ExportError> {
        let Some(Active::Capturing { session, .. }) = self.active.as_mut() else {
            return Ok(self.progress());
        };
        if let Err(err) = session.tick(now, program, theme) {
            self.active = None;
            return Err(err);
        }
        if session.is_complete() {
            self.start_encoding()?;
        }
        Ok(self.progress())
    }

    pub fn until_next(&self, now: Duration) -> Option<Duration> {
        match &self.active {
            Some(Active::Capturing { session, .. }) => Some(session.until_next(now)),
            _ => None,
        }
    }

    pub fn finish_capture(&mut self) -> Result<(), ExportError> {
        let complete = match &self.active {
            Some(Active::Capturing { session, .. }) => session.is_complete(),
            _ => return Ok(()),
        };
        if !complete {
            return Err(ExportError::InvalidSettings("capture has not finished".into()));
        }
        self.start_encoding()
    }

    pub fn session_mut(&mut self) -> Option<&mut CaptureSession> {
        match self.active.as_mut() {
            Some(Active::Capturing { session, .. }) => Some(session),
            _ => None,
        }
    }

    pub fn poll(&mut self) -> Option<Result<PathBuf, ExportError>> {
        let done = matches!(&self.active, Some(Active::Encoding(job)) if job.is_finished());
        if !done {
            return None;
        }
        match self.active.take() {
            Some(Active::Encoding(job)) => Some(job.join()),
            other => {
                self.active = other;
                None
            }
        }
    }

    pub fn wait(&mut self) -> Result<PathBuf, ExportError> {
        match self.active.take() {
            Some(Active::Encoding(job)) => job.join(),
            other => {
                self.active = other;
                Err(ExportError::InvalidSettings("no export is encoding".into()))
            }
        }
    }

    fn start_encoding(&mut self) -> Result<(), ExportError> {
        let Some(Active::Capturing { session, encoder }) = self.active.take() else {
            return Ok(());
        };
        let frames = session.frame_count();
        let job = EncodeJob::spawn(encoder, session, self.out_dir.clone(), Local::now())?;
        tracing::info!(frames, "capture complete, encoding");
        self.active = Some(Active::Encoding(job));
        Ok(())
    }
}
