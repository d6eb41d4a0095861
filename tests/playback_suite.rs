use lissaviz::animator::Animator;
use lissaviz::clock::{Clock, ManualClock};
use lissaviz::keyframes::KeyframeSequence;
use lissaviz::playback::LiveLoop;
use lissaviz::theme::{Rgb, Theme};
use lissaviz::tuning::SpringTuning;
use lissaviz::visual::{
    Canvas, DrawCtx, DrawError, FrameOutcome, LissajousProgram, SetupCtx, Surface, VisualProgram,
};
use std::time::Duration;

#[derive(Default)]
struct Probe {
    deltas: Vec<f64>,
    destroyed: usize,
}

impl VisualProgram for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn setup(&mut self, _ctx: &SetupCtx) {}

    fn draw(&mut self, ctx: &DrawCtx, canvas: &mut Canvas<'_>) -> Result<(), DrawError> {
        self.deltas.push(ctx.delta_seconds);
        canvas.fill(Rgb::new(9, 9, 9));
        Ok(())
    }

    fn destroy(&mut self) {
        self.destroyed += 1;
    }
}

#[test]
fn frames_carry_wall_clock_time_and_delta() {
    let mut lp = LiveLoop::new(ManualClock::new());
    let first = lp.next_frame().expect("running");
    assert_eq!(first.frame_index, 0);
    assert_eq!(first.delta_seconds, 0.0);

    lp.clock_mut().advance(Duration::from_millis(20));
    let second = lp.next_frame().expect("running");
    assert_eq!(second.frame_index, 1);
    assert!((second.time_seconds - 0.020).abs() < 1e-9);
    assert!((second.delta_seconds - 0.020).abs() < 1e-9);
}

#[test]
fn run_frame_draws_and_commits() {
    let mut lp = LiveLoop::new(ManualClock::new());
    let mut surface = Surface::new(3, 2);
    let mut probe = Probe::default();

    let outcome = lp.run_frame(&mut probe, &mut surface, Theme::default());
    assert_eq!(outcome, Some(FrameOutcome::Drawn));
    assert_eq!(&surface.pixels()[..4], &[9, 9, 9, 255]);
}

#[test]
fn stop_destroys_once_and_ends_the_loop() {
    let mut lp = LiveLoop::new(ManualClock::new());
    let mut surface = Surface::new(2, 2);
    let mut probe = Probe::default();

    lp.run_frame(&mut probe, &mut surface, Theme::default());
    lp.stop(&mut probe);
    lp.stop(&mut probe);
    assert!(lp.is_stopped());
    assert_eq!(probe.destroyed, 1);
    assert!(lp.next_frame().is_none());
    assert!(lp.run_frame(&mut probe, &mut surface, Theme::default()).is_none());
    assert_eq!(probe.deltas.len(), 1);
}

#[test]
fn pace_waits_out_the_rest_of_the_period() {
    let mut lp = LiveLoop::new(ManualClock::new());
    lp.next_frame();
    lp.clock_mut().advance(Duration::from_millis(5));
    lp.pace(Duration::from_millis(16));
    assert_eq!(lp.clock().elapsed(), Duration::from_millis(16));

    // Over budget: no extra wait.
    lp.next_frame();
    lp.clock_mut().advance(Duration::from_millis(30));
    lp.pace(Duration::from_millis(16));
    assert_eq!(lp.clock().elapsed(), Duration::from_millis(46));
}

#[test]
fn resync_drops_time_spent_elsewhere_from_the_next_delta() {
    let mut lp = LiveLoop::new(ManualClock::new());
    lp.next_frame();
    lp.clock_mut().advance(Duration::from_secs(12));
    lp.resync();
    lp.clock_mut().advance(Duration::from_millis(16));
    let t = lp.next_frame().expect("running");
    assert!((t.delta_seconds - 0.016).abs() < 1e-9);
}

#[test]
fn simulation_advances_one_step_per_draw_whatever_the_delta() {
    let tuning = SpringTuning {
        hold_frames: 1_000.0,
        ..SpringTuning::default()
    };
    let mut program =
        LissajousProgram::new(Animator::new(KeyframeSequence::ratio_ladder(), tuning));
    let mut surface = Surface::new(16, 16);
    let theme = Theme::default();
    program.setup(&SetupCtx {
        width: 16,
        height: 16,
        theme,
    });

    let mut lp = LiveLoop::new(ManualClock::new());
    for gap in [1u64, 250, 16, 4_000] {
        lp.clock_mut().advance(Duration::from_millis(gap));
        assert_eq!(
            lp.run_frame(&mut program, &mut surface, theme),
            Some(FrameOutcome::Drawn)
        );
    }
    assert_eq!(program.animator().state().timer, 4);
}

#[test]
fn wrong_surface_size_skips_the_frame() {
    let mut program = LissajousProgram::new(Animator::new(
        KeyframeSequence::ratio_ladder(),
        SpringTuning::default(),
    ));
    let mut surface = Surface::new(8, 8);
    let before = surface.pixels().to_vec();
    let ctx = DrawCtx {
        width: 10,
        height: 8,
        time_seconds: 0.0,
        delta_seconds: 0.0,
        frame_index: 0,
        theme: Theme::default(),
    };
    let outcome = lissaviz::visual::draw_guarded(&mut program, &ctx, &mut surface);
    assert_eq!(outcome, FrameOutcome::Skipped);
    assert_eq!(surface.pixels(), &before[..]);
}
