mod braille;
mod halfblock;

pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;

use crate::config::RendererMode;
use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a [String],
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn cell_pixels(&self) -> (usize, usize);
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    }
}

// Checks that the surface matches the cell grid. On a short buffer a
// one-line message replaces the frame and `false` is returned.
pub(crate) fn check_frame(
    frame: &Frame<'_>,
    cell: (usize, usize),
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let cols = frame.term_cols as usize;
    let rows = frame.visual_rows as usize;
    let (w, h) = (frame.pixel_width, frame.pixel_height);
    if cols == 0 || rows == 0 || w == 0 || h == 0 {
        return Ok(false);
    }
    if w != cols.saturating_mul(cell.0) || h != rows.saturating_mul(cell.1) {
        return Ok(false);
    }
    let need = w.saturating_mul(h).saturating_mul(4);
    if frame.pixels_rgba.len() < need {
        begin_sync(frame, out)?;
        out.write_all(b"\x1b[H\x1b[0m\x1b[2J")?;
        write!(
            out,
            "pixel buffer too small (need {}, got {})",
            need,
            frame.pixels_rgba.len()
        )?;
        end_sync(frame, out)?;
        out.flush()?;
        return Ok(false);
    }
    Ok(true)
}

pub(crate) fn begin_sync(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    Ok(())
}

pub(crate) fn end_sync(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    Ok(())
}

pub(crate) fn write_hud(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    let cols = frame.term_cols as usize;
    for (i, line) in frame.hud.iter().enumerate() {
        let row = frame.visual_rows as usize + i + 1;
        write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
        let clipped: String = line.chars().take(cols).collect();
        out.write_all(clipped.as_bytes())?;
    }
    Ok(())
}

pub(crate) struct ColorCache {
    fg: Option<(u8, u8, u8)>,
    bg: Option<(u8, u8, u8)>,
}

impl ColorCache {
    pub(crate) fn new() -> Self {
        Self { fg: None, bg: None }
    }

    pub(crate) fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
    }

    pub(crate) fn set(
        &mut self,
        out: &mut dyn Write,
        fg: (u8, u8, u8),
        bg: (u8, u8, u8),
    ) -> std::io::Result<()> {
        if self.fg != Some(fg) {
            write!(out, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
            self.fg = Some(fg);
        }
        if self.bg != Some(bg) {
            write!(out, "\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2)?;
            self.bg = Some(bg);
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn rgb_at(pixels: &[u8], width: usize, x: usize, y: usize) -> (u8, u8, u8) {
    let i = (y * width + x) * 4;
    (pixels[i], pixels[i + 1], pixels[i + 2])
}
