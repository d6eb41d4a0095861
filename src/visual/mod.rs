mod lissajous;
mod surface;

use crate::theme::Theme;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

pub use lissajous::{sample_curve, LissajousProgram};
pub use surface::{Canvas, Surface};

pub struct SetupCtx {
    pub width: usize,
    pub height: usize,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy)]
pub struct DrawCtx {
    pub width: usize,
    pub height: usize,
    pub time_seconds: f64,
    pub delta_seconds: f64,
    pub frame_index: u64,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    SurfaceMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    Program(String),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceMismatch { expected, got } => write!(
                f,
                "surface is {}x{} but the frame asked for {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            Self::Program(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DrawError {}

pub trait VisualProgram {
    fn name(&self) -> &'static str;
    fn setup(&mut self, ctx: &SetupCtx);
    fn draw(&mut self, ctx: &DrawCtx, canvas: &mut Canvas<'_>) -> Result<(), DrawError>;
    fn resize(&mut self, _w: usize, _h: usize) {}
    fn destroy(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    // The program failed; the surface still shows the previous frame.
    Skipped,
}

// Runs one `draw` into the surface's back buffer and commits it only on
// success. Errors and panics are logged and turned into a skipped frame.
pub fn draw_guarded(
    program: &mut dyn VisualProgram,
    ctx: &DrawCtx,
    surface: &mut Surface,
) -> FrameOutcome {
    let result = {
        let mut canvas = surface.canvas();
        panic::catch_unwind(AssertUnwindSafe(|| program.draw(ctx, &mut canvas)))
    };

    match result {
        Ok(Ok(())) => {
            surface.commit();
            FrameOutcome::Drawn
        }
        Ok(Err(err)) => {
            tracing::warn!(
                program = program.name(),
                frame = ctx.frame_index,
                %err,
                "frame skipped"
            );
            FrameOutcome::Skipped
        }
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic>".to_string());
            tracing::warn!(
                program = program.name(),
                frame = ctx.frame_index,
                panic = %msg,
                "frame skipped"
            );
            FrameOutcome::Skipped
        }
    }
}
