use crate::render::{
    begin_sync, check_frame, end_sync, rgb_at, write_hud, ColorCache, Frame, Renderer,
};
use std::io::Write;

// 2x4 dots per cell. Each cell is split at its mid-luma: bright dots take
// the averaged bright color, the rest become the cell background. Thin
// strokes come out four times sharper vertically than half-blocks.
pub struct BrailleRenderer {
    colors: ColorCache,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::new(),
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (2, 4)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if !check_frame(frame, self.cell_pixels(), out)? {
            return Ok(());
        }
        let cols = frame.term_cols as usize;
        let w = frame.pixel_width;

        begin_sync(frame, out)?;
        out.write_all(b"\x1b[H\x1b[0m")?;
        out.write_all(b"\x1b[?7l")?;
        self.colors.reset();

        for row in 0..frame.visual_rows as usize {
            for col in 0..cols {
                let (fg, bg, ch) = braille_cell(frame.pixels_rgba, w, col * 2, row * 4);
                self.colors.set(out, fg, bg)?;
                write!(out, "{ch}")?;
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

type Rgb8 = (u8, u8, u8);

fn braille_cell(pixels: &[u8], w: usize, base_x: usize, base_y: usize) -> (Rgb8, Rgb8, char) {
    let mut rgb = [(0u8, 0u8, 0u8); 8];
    let mut lum = [0u16; 8];
    for dy in 0..4 {
        for dx in 0..2 {
            let i = dy * 2 + dx;
            rgb[i] = rgb_at(pixels, w, base_x + dx, base_y + dy);
            lum[i] = luma_u16(rgb[i]);
        }
    }
    let min_l = lum.iter().copied().min().unwrap_or(0);
    let max_l = lum.iter().copied().max().unwrap_or(0);
    let thr = (min_l + max_l) / 2;

    let mut bits = 0u8;
    let mut on = Average::default();
    let mut off = Average::default();
    for i in 0..8 {
        if lum[i] > thr {
            bits |= DOT_BITS[i];
            on.add(rgb[i]);
        } else {
            off.add(rgb[i]);
        }
    }

    if bits == 0 {
        let c = off.get().unwrap_or((0, 0, 0));
        return (c, c, ' ');
    }
    let fg = on.get().unwrap_or((0, 0, 0));
    let bg = off.get().unwrap_or(fg);
    let ch = char::from_u32(0x2800 + u32::from(bits)).unwrap_or(' ');
    (fg, bg, ch)
}

#[derive(Default)]
struct Average {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl Average {
    fn add(&mut self, (r, g, b): Rgb8) {
        self.r += u32::from(r);
        self.g += u32::from(g);
        self.b += u32::from(b);
        self.n += 1;
    }

    fn get(&self) -> Option<Rgb8> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

#[inline]
fn luma_u16((r, g, b): Rgb8) -> u16 {
    // Rec.709 weights in 8-bit fixed point.
    ((u32::from(r) * 54 + u32::from(g) * 183 + u32::from(b) * 19) >> 8) as u16
}
