use crate::clock::Clock;
use crate::theme::Theme;
use crate::visual::{draw_guarded, DrawCtx, FrameOutcome, Surface, VisualProgram};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub time_seconds: f64,
    pub delta_seconds: f64,
    pub frame_index: u64,
}

// Live playback driver: one draw per callback, wall-clock time and delta
// passed through for information only. The simulation advances one fixed
// step per draw, so playback speed follows the achieved frame rate.
pub struct LiveLoop<C: Clock> {
    clock: C,
    last: Duration,
    frame_index: u64,
    stopped: bool,
}

impl<C: Clock> LiveLoop<C> {
    pub fn new(clock: C) -> Self {
        let last = clock.elapsed();
        Self {
            clock,
            last,
            frame_index: 0,
            stopped: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn next_frame(&mut self) -> Option<FrameTiming> {
        if self.stopped {
            return None;
        }
        let now = self.clock.elapsed();
        let delta = now.saturating_sub(self.last);
        self.last = now;
        let timing = FrameTiming {
            time_seconds: now.as_secs_f64(),
            delta_seconds: delta.as_secs_f64(),
            frame_index: self.frame_index,
        };
        self.frame_index += 1;
        Some(timing)
    }

    pub fn run_frame(
        &mut self,
        program: &mut dyn VisualProgram,
        surface: &mut Surface,
        theme: Theme,
    ) -> Option<FrameOutcome> {
        let timing = self.next_frame()?;
        let ctx = DrawCtx {
            width: surface.width(),
            height: surface.height(),
            time_seconds: timing.time_seconds,
            delta_seconds: timing.delta_seconds,
            frame_index: timing.frame_index,
            theme,
        };
        Some(draw_guarded(program, &ctx, surface))
    }

    pub fn pace(&mut self, period: Duration) {
        let spent = self.clock.elapsed().saturating_sub(self.last);
        if spent < period {
            self.clock.wait(period - spent);
        }
    }

    pub fn stop(&mut self, program: &mut dyn VisualProgram) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        program.destroy();
    }

    // Re-arms the loop after a capture borrowed the program, so the first
    // live frame does not report the capture's duration as its delta.
    pub fn resync(&mut self) {
        self.last = self.clock.elapsed();
    }
}
