use crate::config::Mode;
use crate::keyframes::{KeyframeSequence, ParameterSet, Sequencer};
use crate::spring::{HarmonicProfile, SpringEngine};
use crate::tuning::SpringTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Hold,
    Transition,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Hold => "HOLD",
            Self::Transition => "TRANSITION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub current: ParameterSet,
    pub velocity: ParameterSet,
    pub target: ParameterSet,
    pub phase: Phase,
    pub timer: u32,
}

impl SimulationState {
    fn at_rest(p: ParameterSet) -> Self {
        Self {
            current: p,
            velocity: ParameterSet::ZERO,
            target: p,
            phase: Phase::Hold,
            timer: 0,
        }
    }

    pub fn is_at_rest(&self) -> bool {
        self.current == self.target && self.velocity == ParameterSet::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    Held,
    TransitionStarted { index: usize },
    Transitioning,
    // `forced` is set when the safety ceiling ended a settlement-driven
    // transition before every field arrived.
    TransitionCompleted { forced: bool },
}

#[derive(Debug, Clone)]
pub struct Animator {
    sequencer: Sequencer,
    engine: SpringEngine,
    tuning: SpringTuning,
    state: SimulationState,
}

impl Animator {
    pub fn new(seq: KeyframeSequence, tuning: SpringTuning) -> Self {
        let state = SimulationState::at_rest(seq.first());
        Self {
            sequencer: Sequencer::new(seq),
            engine: SpringEngine::new(&tuning),
            tuning,
            state,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn params(&self) -> ParameterSet {
        self.state.current
    }

    pub fn mode(&self) -> Mode {
        self.tuning.mode
    }

    pub fn tuning(&self) -> &SpringTuning {
        &self.tuning
    }

    pub fn engine(&self) -> &SpringEngine {
        &self.engine
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn set_harmonic_profile(&mut self, profile: HarmonicProfile) {
        self.engine.set_harmonic(profile);
    }

    pub fn step(&mut self) -> StepEvent {
        self.state.timer = self.state.timer.saturating_add(1);
        let settlement = self.engine.step(
            &mut self.state.current,
            &mut self.state.velocity,
            &self.state.target,
        );

        match self.state.phase {
            Phase::Hold => {
                if f64::from(self.state.timer) < self.tuning.hold_frames {
                    return StepEvent::Held;
                }
                self.state.phase = Phase::Transition;
                self.state.timer = 0;
                self.state.target = self.sequencer.advance();
                let index = self.sequencer.cursor().index;
                tracing::debug!(index, target = %self.state.target, "transition started");
                StepEvent::TransitionStarted { index }
            }
            Phase::Transition => {
                let timer = self.state.timer;
                let (done, forced) = match self.tuning.mode {
                    Mode::StrictTiming => {
                        (f64::from(timer) >= self.tuning.transition_frames, false)
                    }
                    Mode::SettlementDriven => {
                        let arrived =
                            settlement.all() || self.state.current == self.state.target;
                        let ceiling = timer >= self.safety_ceiling();
                        (arrived || ceiling, !arrived && ceiling)
                    }
                };
                if !done {
                    return StepEvent::Transitioning;
                }
                if forced {
                    tracing::debug!(frames = timer, "settlement ceiling reached, forcing arrival");
                }
                self.state.current = self.state.target;
                self.state.velocity = ParameterSet::ZERO;
                self.state.phase = Phase::Hold;
                self.state.timer = 0;
                StepEvent::TransitionCompleted { forced }
            }
        }
    }

    // Switches the physics profile. Position, target, phase and timer are
    // kept; velocity is zeroed so no momentum carries across profiles.
    pub fn on_mode_change(&mut self, mode: Mode) {
        if mode == self.tuning.mode {
            return;
        }
        tracing::info!(from = self.tuning.mode.label(), to = mode.label(), "mode change");
        self.tuning.mode = mode;
        self.engine.apply(&self.tuning);
        self.state.velocity = ParameterSet::ZERO;
    }

    pub fn apply_tuning(&mut self, tuning: SpringTuning) {
        let mode = tuning.mode;
        self.tuning = SpringTuning {
            mode: self.tuning.mode,
            ..tuning
        };
        self.engine.apply(&self.tuning);
        self.on_mode_change(mode);
    }

    pub fn reset(&mut self) {
        self.sequencer.rewind();
        self.state = SimulationState::at_rest(self.sequencer.current());
    }

    fn safety_ceiling(&self) -> u32 {
        self.engine.harmonic().safety_ceiling
    }
}
