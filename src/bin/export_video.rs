use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lissaviz::animator::Animator;
use lissaviz::capture::{
    run_capture, CaptureSettings, CatchUp, ExportRequest, Exporter, EXPORT_FPS, EXPORT_SECONDS,
    MAX_EXPORT_FRAMES, MAX_EXPORT_SIDE,
};
use lissaviz::clock::{ManualClock, MonotonicClock};
use lissaviz::config::{Mode, QualityTier};
use lissaviz::keyframes::KeyframeSequence;
use lissaviz::theme::Theme;
use lissaviz::tuning::SpringTuning;
use lissaviz::visual::LissajousProgram;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_video",
    version,
    about = "Render a fixed-length Lissajous clip to MP4 via ffmpeg"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub(crate) out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = QualityTier::High)]
    pub(crate) tier: QualityTier,

    // Explicit bitrate in bits/s; replaces the tier's rate.
    #[arg(long, value_name = "BPS")]
    pub(crate) bitrate: Option<u64>,

    #[arg(long, default_value_t = 1080)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 1350)]
    pub(crate) height: usize,

    #[arg(long, default_value_t = EXPORT_FPS)]
    pub(crate) fps: u32,

    #[arg(long, default_value_t = EXPORT_SECONDS)]
    pub(crate) seconds: u32,

    #[arg(long, value_enum)]
    pub(crate) mode: Option<Mode>,

    #[arg(long, value_name = "FILE")]
    pub(crate) tuning: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub(crate) theme: Option<PathBuf>,

    // Capture against the wall clock instead of stepping virtual time.
    #[arg(long, default_value_t = false)]
    pub(crate) realtime: bool,

    #[arg(long, value_enum, default_value_t = CatchUp::Single)]
    pub(crate) catch_up: CatchUp,
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 || args.width % 2 != 0 || args.width > MAX_EXPORT_SIDE {
        bail!("--width must be a positive even number up to {MAX_EXPORT_SIDE}");
    }
    if args.height == 0 || args.height % 2 != 0 || args.height > MAX_EXPORT_SIDE {
        bail!("--height must be a positive even number up to {MAX_EXPORT_SIDE}");
    }
    if args.fps == 0 {
        bail!("--fps must be >= 1");
    }
    if args.seconds == 0 {
        bail!("--seconds must be >= 1");
    }
    let frames = u64::from(args.seconds) * u64::from(args.fps);
    if frames > MAX_EXPORT_FRAMES {
        bail!("--seconds x --fps is {frames} frames; at most {MAX_EXPORT_FRAMES} are allowed");
    }
    if args.bitrate == Some(0) {
        bail!("--bitrate must be > 0");
    }
    Ok(())
}

pub(crate) fn capture_settings(args: &Cli) -> CaptureSettings {
    CaptureSettings {
        width: args.width,
        height: args.height,
        seconds: args.seconds,
        fps: args.fps,
        catch_up: args.catch_up,
    }
}

pub(crate) fn export_request(args: &Cli) -> ExportRequest {
    match args.bitrate {
        Some(bps) => ExportRequest::custom(bps),
        None => ExportRequest::tier(args.tier),
    }
}

fn main() -> Result<()> {
    lissaviz::logging::init_stderr();
    let args = Cli::parse();
    run(args)
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;

    let mut tuning = match &args.tuning {
        Some(path) => SpringTuning::load(path)
            .with_context(|| format!("load tuning from {}", path.display()))?,
        None => SpringTuning::default(),
    };
    if let Some(mode) = args.mode {
        tuning.mode = mode;
    }
    let theme = match &args.theme {
        Some(path) => {
            Theme::load(path).with_context(|| format!("load theme from {}", path.display()))?
        }
        None => Theme::default(),
    };

    let animator = Animator::new(KeyframeSequence::ratio_ladder(), tuning);
    let mut program = LissajousProgram::new(animator);
    let mut exporter = Exporter::with_ffmpeg(capture_settings(&args), args.out_dir.clone());
    exporter
        .start(export_request(&args), &mut program, theme)
        .context("start export")?;

    let started = Instant::now();
    let fps = u64::from(args.fps);
    let mut progress = |captured: u64, total: u64| {
        if captured % fps == 0 || captured == total {
            eprint!("\rcaptured {captured}/{total}");
            let _ = io::stderr().flush();
        }
    };
    let session = exporter
        .session_mut()
        .context("export did not open a capture session")?;
    if args.realtime {
        let mut clock = MonotonicClock::new();
        run_capture(session, &mut program, theme, &mut clock, &mut progress)
    } else {
        let mut clock = ManualClock::new();
        run_capture(session, &mut program, theme, &mut clock, &mut progress)
    }
    .context("capture")?;
    eprintln!();
    let captured_in = started.elapsed();

    exporter.finish_capture().context("hand off to encoder")?;
    let path = exporter.wait().context("encode")?;

    println!(
        "exported {} frames @ {} fps in {:.2}s -> {}",
        capture_settings(&args).total_frames(),
        args.fps,
        captured_in.as_secs_f64(),
        path.display()
    );
    Ok(())
}
