use crate::theme::Rgb;

// Double-buffered RGBA8 rendering surface. Programs paint into the back
// buffer through a `Canvas`; `commit` makes it the visible frame.
pub struct Surface {
    w: usize,
    h: usize,
    front: Vec<u8>,
    back: Vec<u8>,
}

impl Surface {
    pub fn new(w: usize, h: usize) -> Self {
        let mut s = Self {
            w: 0,
            h: 0,
            front: Vec::new(),
            back: Vec::new(),
        };
        s.resize(w, h);
        s
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.front.clear();
        self.front.resize(n, 0);
        self.back.clear();
        self.back.resize(n, 0);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn pixels(&self) -> &[u8] {
        &self.front
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas {
            w: self.w,
            h: self.h,
            px: &mut self.back,
        }
    }

    pub fn commit(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

pub struct Canvas<'a> {
    w: usize,
    h: usize,
    px: &'a mut [u8],
}

impl Canvas<'_> {
    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn fill(&mut self, c: Rgb) {
        let rgba = c.to_rgba();
        for px in self.px.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    pub fn put(&mut self, x: usize, y: usize, c: Rgb) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = (y * self.w + x) * 4;
        self.px[i..i + 4].copy_from_slice(&c.to_rgba());
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.px
    }
}
