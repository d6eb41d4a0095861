use super::{Canvas, DrawCtx, DrawError, SetupCtx, VisualProgram};
use crate::animator::Animator;
use crate::keyframes::ParameterSet;
use crate::theme::{Rgb, Theme};
use std::f64::consts::TAU;

const SAMPLES: usize = 2048;
const MARGIN: f64 = 0.84;

// Curve points in `[-1, 1]²` for one parameter set:
// `x = sin(a·t + δ)`, `y = sin(b·t)`, `t ∈ [0, 2π]`.
pub fn sample_curve(p: &ParameterSet, samples: usize) -> Vec<(f64, f64)> {
    let n = samples.max(2);
    (0..=n)
        .map(|i| {
            let t = TAU * i as f64 / n as f64;
            ((p.a * t + p.delta).sin(), (p.b * t).sin())
        })
        .collect()
}

pub struct LissajousProgram {
    animator: Animator,
    coverage: Vec<f32>,
    w: usize,
    h: usize,
}

impl LissajousProgram {
    pub fn new(animator: Animator) -> Self {
        Self {
            animator,
            coverage: Vec::new(),
            w: 0,
            h: 0,
        }
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    pub fn paint(&mut self, params: &ParameterSet, theme: &Theme, canvas: &mut Canvas<'_>) {
        let (w, h) = (canvas.width(), canvas.height());
        if w == 0 || h == 0 {
            return;
        }
        if self.w != w || self.h != h {
            VisualProgram::resize(self, w, h);
        }
        self.coverage.fill(0.0);

        let radius = (w.min(h) as f64) * 0.5 * MARGIN;
        let (cx, cy) = (w as f64 * 0.5, h as f64 * 0.5);
        let stroke = (w.min(h) as f64 / 400.0).max(0.6);

        let pts = sample_curve(params, SAMPLES);
        for pair in pts.windows(2) {
            let (x0, y0) = (cx + pair[0].0 * radius, cy - pair[0].1 * radius);
            let (x1, y1) = (cx + pair[1].0 * radius, cy - pair[1].1 * radius);
            self.stroke_segment(x0, y0, x1, y1, stroke);
        }

        composite(&self.coverage, theme.background, theme.foreground, canvas.pixels_mut());
    }

    fn stroke_segment(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, r: f64) {
        let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let steps = (len * 2.0).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            self.stamp(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, r);
        }
    }

    fn stamp(&mut self, x: f64, y: f64, r: f64) {
        let reach = r + 1.0;
        let x_lo = (x - reach).floor().max(0.0) as usize;
        let y_lo = (y - reach).floor().max(0.0) as usize;
        let x_hi = ((x + reach).ceil().max(0.0) as usize).min(self.w.saturating_sub(1));
        let y_hi = ((y + reach).ceil().max(0.0) as usize).min(self.h.saturating_sub(1));
        for py in y_lo..=y_hi {
            for px in x_lo..=x_hi {
                let dx = px as f64 + 0.5 - x;
                let dy = py as f64 + 0.5 - y;
                let a = (r + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0) as f32;
                let cell = &mut self.coverage[py * self.w + px];
                if a > *cell {
                    *cell = a;
                }
            }
        }
    }
}

fn composite(coverage: &[f32], bg: Rgb, fg: Rgb, out: &mut [u8]) {
    let mix = |a: u8, b: u8, t: f32| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    for (px, &t) in out.chunks_exact_mut(4).zip(coverage) {
        px[0] = mix(bg.r, fg.r, t);
        px[1] = mix(bg.g, fg.g, t);
        px[2] = mix(bg.b, fg.b, t);
        px[3] = 255;
    }
}

impl VisualProgram for LissajousProgram {
    fn name(&self) -> &'static str {
        "lissajous"
    }

    fn setup(&mut self, ctx: &SetupCtx) {
        self.resize(ctx.width, ctx.height);
        self.animator.reset();
    }

    fn draw(&mut self, ctx: &DrawCtx, canvas: &mut Canvas<'_>) -> Result<(), DrawError> {
        let got = (canvas.width(), canvas.height());
        if got != (ctx.width, ctx.height) {
            return Err(DrawError::SurfaceMismatch {
                expected: (ctx.width, ctx.height),
                got,
            });
        }
        self.animator.step();
        let params = self.animator.params();
        self.paint(&params, &ctx.theme, canvas);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.coverage.clear();
        self.coverage.resize(w.saturating_mul(h), 0.0);
    }
}
