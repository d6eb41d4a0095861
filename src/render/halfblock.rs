use crate::render::{
    begin_sync, check_frame, end_sync, rgb_at, write_hud, ColorCache, Frame, Renderer,
};
use std::io::Write;

// One cell per column, two surface rows per cell: the top pixel is the
// glyph color, the bottom one the cell background.
pub struct HalfBlockRenderer {
    colors: ColorCache,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::new(),
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (1, 2)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if !check_frame(frame, self.cell_pixels(), out)? {
            return Ok(());
        }
        let cols = frame.term_cols as usize;
        let w = frame.pixel_width;

        begin_sync(frame, out)?;
        out.write_all(b"\x1b[H\x1b[0m")?;
        // Autowrap off while painting full-width rows.
        out.write_all(b"\x1b[?7l")?;
        self.colors.reset();

        const HALF_BLOCK: char = '\u{2580}';

        for row in 0..frame.visual_rows as usize {
            for x in 0..cols {
                let top = rgb_at(frame.pixels_rgba, w, x, row * 2);
                let bot = rgb_at(frame.pixels_rgba, w, x, row * 2 + 1);
                self.colors.set(out, top, bot)?;
                write!(out, "{HALF_BLOCK}")?;
            }
            out.write_all(b"\r\n")?;
        }

        write_hud(frame, out)?;
        out.write_all(b"\x1b[?7h")?;
        end_sync(frame, out)?;
        out.flush()?;
        Ok(())
    }
}
