use super::{ExportError, Snapshot};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
    pub bitrate_bps: u64,
}

pub trait VideoEncoder: Send + Sync {
    fn name(&self) -> &str;
    fn encode(
        &self,
        frames: &[Snapshot],
        settings: &EncodeSettings,
        out: &Path,
    ) -> Result<(), ExportError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    version: String,
}

static SHARED: OnceLock<Result<Arc<FfmpegEncoder>, String>> = OnceLock::new();

impl FfmpegEncoder {
    pub fn probe(program: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let program = program.into();
        let output = match Command::new(&program)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(out) => out,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ExportError::EncoderUnavailable(format!(
                    "{} not found in PATH (install ffmpeg and retry)",
                    program.display()
                )));
            }
            Err(err) => {
                return Err(ExportError::EncoderUnavailable(format!(
                    "failed to run {}: {err}",
                    program.display()
                )));
            }
        };
        if !output.status.success() {
            return Err(ExportError::EncoderUnavailable(format!(
                "{} -version exited with {}",
                program.display(),
                output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("ffmpeg")
            .trim()
            .to_string();
        Ok(Self { program, version })
    }

    // Process-wide encoder, probed on first use. A failed probe is
    // remembered too, so every later export is refused the same way.
    pub fn shared() -> Result<Arc<dyn VideoEncoder>, ExportError> {
        let probed = SHARED.get_or_init(|| {
            let res = Self::probe("ffmpeg").map(Arc::new).map_err(|e| e.to_string());
            match &res {
                Ok(enc) => tracing::info!(version = %enc.version, "encoder loaded"),
                Err(err) => tracing::warn!(%err, "encoder unavailable"),
            }
            res
        });
        match probed {
            Ok(enc) => Ok(enc.clone() as Arc<dyn VideoEncoder>),
            Err(msg) => Err(ExportError::EncoderUnavailable(msg.clone())),
        }
    }

    pub fn args(settings: &EncodeSettings, out: &Path) -> Vec<String> {
        let rate = settings.bitrate_bps.to_string();
        let bufsize = settings.bitrate_bps.saturating_mul(2).to_string();
        let fps = settings.fps.to_string();
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "image2pipe",
            "-framerate",
            fps.as_str(),
            "-c:v",
            "png",
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-b:v",
            rate.as_str(),
            "-minrate",
            rate.as_str(),
            "-maxrate",
            rate.as_str(),
            "-bufsize",
            bufsize.as_str(),
            "-pix_fmt",
            "yuv420p",
            "-r",
            fps.as_str(),
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(out.display().to_string());
        args
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        &self.version
    }

    fn encode(
        &self,
        frames: &[Snapshot],
        settings: &EncodeSettings,
        out: &Path,
    ) -> Result<(), ExportError> {
        let mut child = Command::new(&self.program)
            .args(Self::args(settings, out))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExportError::Encode(format!("spawn {}: {e}", self.program.display())))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExportError::Encode("failed to open ffmpeg stdin".into()))?;
        // Drained alongside the writes so a full stderr pipe cannot stall ffmpeg.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });
        let mut write_err = None;
        for frame in frames {
            if let Err(e) = stdin.write_all(&frame.png) {
                write_err = Some(format!("write frame {} to ffmpeg: {e}", frame.index));
                break;
            }
        }
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| ExportError::Encode(format!("wait for ffmpeg: {e}")))?;
        let stderr = stderr_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(ExportError::Encode(format!(
                "ffmpeg exited with {status}: {}",
                stderr.trim()
            )));
        }
        if let Some(msg) = write_err {
            return Err(ExportError::Encode(msg));
        }
        Ok(())
    }
}
