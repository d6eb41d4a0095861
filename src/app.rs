use crate::animator::Animator;
use crate::capture::{CaptureSettings, ExportError, ExportProgress, ExportRequest, Exporter};
use crate::clock::{Clock, MonotonicClock};
use crate::config::{Config, QualityTier};
use crate::keyframes::KeyframeSequence;
use crate::playback::LiveLoop;
use crate::render::{make_renderer, Frame, Renderer};
use crate::terminal::TerminalGuard;
use crate::theme::Theme;
use crate::tuning::SpringTuning;
use crate::visual::{FrameOutcome, LissajousProgram, SetupCtx, Surface, VisualProgram};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub fn build_tuning(cfg: &Config) -> anyhow::Result<SpringTuning> {
    let mut tuning = match &cfg.tuning {
        Some(path) => SpringTuning::load(path)
            .with_context(|| format!("load tuning from {}", path.display()))?,
        None => SpringTuning::default(),
    };
    if let Some(v) = cfg.stiffness {
        tuning.stiffness = v;
    }
    if let Some(v) = cfg.damping {
        tuning.damping = v;
    }
    if let Some(v) = cfg.mass {
        tuning.mass = v;
    }
    if let Some(v) = cfg.hold_frames {
        tuning.hold_frames = v;
    }
    if let Some(v) = cfg.transition_frames {
        tuning.transition_frames = v;
    }
    if let Some(mode) = cfg.mode {
        tuning.mode = mode;
    }
    tuning.validate().context("invalid spring tuning")?;
    if !tuning.is_non_oscillatory() {
        tracing::warn!(
            stiffness = tuning.stiffness,
            damping = tuning.damping,
            mass = tuning.mass,
            "underdamped tuning: the linear profile will ring before settling"
        );
    }
    Ok(tuning)
}

pub fn build_theme(cfg: &Config) -> anyhow::Result<Theme> {
    let base = match &cfg.theme {
        Some(path) => {
            Theme::load(path).with_context(|| format!("load theme from {}", path.display()))?
        }
        None => Theme::default(),
    };
    base.with_overrides(cfg.fg.as_deref(), cfg.bg.as_deref())
        .context("invalid --fg/--bg color")
}

pub fn capture_settings(cfg: &Config) -> CaptureSettings {
    CaptureSettings {
        width: cfg.export_width as usize,
        height: cfg.export_height as usize,
        ..CaptureSettings::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleMode,
    Export(QualityTier),
    ToggleHud,
    None,
}

pub fn action_for_key(code: KeyCode, mods: KeyModifiers) -> Action {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return Action::Quit;
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Char('m') | KeyCode::Char('M') => Action::ToggleMode,
        KeyCode::Char('e') | KeyCode::Char('E') => Action::Export(QualityTier::High),
        KeyCode::Char('c') | KeyCode::Char('C') => Action::Export(QualityTier::Compact),
        KeyCode::Char('h') | KeyCode::Char('H') => Action::ToggleHud,
        _ => Action::None,
    }
}

pub struct HudInfo<'a> {
    pub animator: &'a Animator,
    pub fps: f32,
    pub skipped: u64,
    pub renderer: &'a str,
    pub export: &'a str,
}

pub fn build_hud(cols: usize, info: &HudInfo<'_>) -> Vec<String> {
    let anim = info.animator;
    let state = anim.state();
    let cursor = anim.sequencer().cursor();
    let lines = [
        format!(
            "Mode: {} | Spring: {} | Phase: {} {} | Key: {}/{} | {}",
            anim.mode().label(),
            anim.engine().profile().label(),
            state.phase.label(),
            state.timer,
            cursor.index + 1,
            anim.sequencer().sequence().len(),
            state.current,
        ),
        format!(
            "FPS: {:>4.1} | Skipped: {} | Renderer: {} | Export: {}",
            info.fps, info.skipped, info.renderer, info.export
        ),
        "Keys: m mode | e export high | c export compact | h HUD | q quit".to_string(),
    ];
    let width = cols.max(1);
    lines.iter().flat_map(|l| hard_wrap(l, width)).collect()
}

fn hard_wrap(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

pub fn export_status(progress: ExportProgress, last: Option<&str>) -> String {
    match progress {
        ExportProgress::Capturing { captured, total } => format!("capturing {captured}/{total}"),
        ExportProgress::Encoding { frames } => format!("encoding {frames} frames"),
        ExportProgress::Idle => last.unwrap_or("idle").to_string(),
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let tuning = build_tuning(&cfg)?;
    let theme = build_theme(&cfg)?;
    let settings = capture_settings(&cfg);
    settings
        .validate()
        .context("invalid --export-width/--export-height")?;

    let animator = Animator::new(KeyframeSequence::ratio_ladder(), tuning);
    let mut program = LissajousProgram::new(animator);
    let mut exporter = Exporter::with_ffmpeg(settings, cfg.export_dir.clone());

    {
        let _term = TerminalGuard::new()?;
        live(&cfg, theme, &mut program, &mut exporter)?;
    }

    // Let a running encode finish so the file is not left half-written.
    if matches!(exporter.progress(), ExportProgress::Encoding { .. }) {
        eprintln!("finishing export...");
        let path = exporter.wait().context("export failed")?;
        println!("saved {}", path.display());
    }
    Ok(())
}

struct Layout {
    cols: u16,
    rows: u16,
    hud_rows: u16,
}

impl Layout {
    fn visual_rows(&self) -> u16 {
        self.rows.saturating_sub(self.hud_rows).max(1)
    }

    fn pixels(&self, cell: (usize, usize)) -> (usize, usize) {
        (
            (self.cols as usize).saturating_mul(cell.0),
            (self.visual_rows() as usize).saturating_mul(cell.1),
        )
    }
}

fn live(
    cfg: &Config,
    theme: Theme,
    program: &mut LissajousProgram,
    exporter: &mut Exporter,
) -> anyhow::Result<()> {
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer: Box<dyn Renderer> = make_renderer(cfg.renderer);
    let cell = renderer.cell_pixels();
    let period = Duration::from_secs(1) / cfg.fps.max(1);

    let (cols, rows) = TerminalGuard::size()?;
    let mut layout = Layout {
        cols,
        rows,
        hud_rows: 0,
    };
    let mut surface = Surface::new(0, 0);
    let mut show_hud = true;
    let mut fps = FpsCounter::new();
    let mut skipped = 0u64;
    let mut last_export: Option<String> = None;
    let mut lp = LiveLoop::new(MonotonicClock::new());

    let (w, h) = layout.pixels(cell);
    surface.resize(w, h);
    program.setup(&SetupCtx {
        width: w,
        height: h,
        theme,
    });

    loop {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match action_for_key(k.code, k.modifiers) {
                        Action::Quit => {
                            lp.stop(program);
                            return Ok(());
                        }
                        Action::ToggleMode => {
                            let next = program.animator().mode().toggled();
                            program.animator_mut().on_mode_change(next);
                        }
                        Action::ToggleHud => show_hud = !show_hud,
                        Action::Export(tier) => {
                            match exporter.start(ExportRequest::tier(tier), program, theme) {
                                Ok(()) => last_export = None,
                                Err(ExportError::Busy) => {
                                    last_export = Some("busy, export already running".into());
                                }
                                Err(err) => {
                                    tracing::warn!(%err, "export not started");
                                    last_export = Some(err.to_string());
                                }
                            }
                        }
                        Action::None => {}
                    }
                }
                Event::Resize(c, r) => {
                    layout.cols = c;
                    layout.rows = r;
                }
                _ => {}
            }
        }

        let (c, r) = crossterm::terminal::size().context("get terminal size")?;
        layout.cols = c;
        layout.rows = r;

        if exporter.is_capturing() {
            let now = lp.clock().elapsed();
            if let Err(err) = exporter.tick(now, program, theme) {
                tracing::warn!(%err, "export aborted");
                last_export = Some(err.to_string());
            }
            if !exporter.is_capturing() {
                // The capture reset the program onto its own surface; bring it back.
                program.setup(&SetupCtx {
                    width: surface.width(),
                    height: surface.height(),
                    theme,
                });
                lp.resync();
            }
        }

        if let Some(result) = exporter.poll() {
            last_export = Some(match result {
                Ok(path) => format!("saved {}", display_name(&path)),
                Err(err) => {
                    tracing::warn!(%err, "export failed");
                    err.to_string()
                }
            });
        }

        let status = export_status(exporter.progress(), last_export.as_deref());
        let hud = if show_hud {
            build_hud(
                layout.cols as usize,
                &HudInfo {
                    animator: program.animator(),
                    fps: fps.fps(),
                    skipped,
                    renderer: renderer.name(),
                    export: &status,
                },
            )
        } else {
            Vec::new()
        };
        layout.hud_rows = (hud.len() as u16).min(layout.rows.saturating_sub(1));

        let (w, h) = layout.pixels(cell);
        if (w, h) != (surface.width(), surface.height()) {
            surface.resize(w, h);
            if !exporter.is_capturing() {
                program.resize(w, h);
            }
        }

        if !exporter.is_capturing()
            && lp.run_frame(program, &mut surface, theme) == Some(FrameOutcome::Skipped)
        {
            skipped += 1;
        }

        let frame = Frame {
            term_cols: layout.cols,
            visual_rows: layout.visual_rows(),
            pixel_width: w,
            pixel_height: h,
            pixels_rgba: surface.pixels(),
            hud: &hud[..layout.hud_rows as usize],
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        match exporter.until_next(lp.clock().elapsed()) {
            Some(next) => std::thread::sleep(next.min(period)),
            None => lp.pace(period),
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let dt = self.last.elapsed().as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = Instant::now();
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
