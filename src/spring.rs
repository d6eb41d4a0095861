use crate::config::Mode;
use crate::keyframes::{Field, ParameterSet};
use crate::tuning::SpringTuning;

pub const LINEAR_SNAP: f64 = 1e-3;
pub const HARMONIC_SNAP: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicProfile {
    pub min_stiffness: f64,
    pub max_stiffness: f64,
    // Exponent applied to the clamped displacement; must be > 1.
    pub power: f64,
    // Damping ratio relative to critical; must be > 1.
    pub zeta: f64,
    // Frames a transition may run before completion is forced.
    pub safety_ceiling: u32,
}

impl Default for HarmonicProfile {
    fn default() -> Self {
        Self {
            min_stiffness: 0.005,
            max_stiffness: 0.12,
            power: 3.0,
            zeta: 1.3,
            safety_ceiling: 600,
        }
    }
}

impl HarmonicProfile {
    pub fn stiffness_at(&self, distance: f64) -> f64 {
        let t = distance.clamp(0.0, 1.0).powf(self.power);
        self.min_stiffness + (self.max_stiffness - self.min_stiffness) * t
    }

    pub fn damping_for(&self, stiffness: f64, mass: f64) -> f64 {
        2.0 * (mass * stiffness).sqrt() * self.zeta
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Profile {
    Linear,
    Harmonic(HarmonicProfile),
}

impl Profile {
    pub fn for_mode(mode: Mode, harmonic: HarmonicProfile) -> Self {
        match mode {
            Mode::StrictTiming => Self::Linear,
            Mode::SettlementDriven => Self::Harmonic(harmonic),
        }
    }

    pub fn snap_threshold(&self) -> f64 {
        match self {
            Self::Linear => LINEAR_SNAP,
            Self::Harmonic(_) => HARMONIC_SNAP,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Harmonic(_) => "harmonic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settlement {
    pub settled: [bool; 3],
}

impl Settlement {
    pub fn all(&self) -> bool {
        self.settled.iter().all(|s| *s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpringEngine {
    stiffness: f64,
    damping: f64,
    mass: f64,
    harmonic: HarmonicProfile,
    profile: Profile,
}

impl SpringEngine {
    pub fn new(tuning: &SpringTuning) -> Self {
        let harmonic = HarmonicProfile::default();
        Self {
            stiffness: tuning.stiffness,
            damping: tuning.damping,
            mass: tuning.mass,
            harmonic,
            profile: Profile::for_mode(tuning.mode, harmonic),
        }
    }

    pub fn apply(&mut self, tuning: &SpringTuning) {
        self.stiffness = tuning.stiffness;
        self.damping = tuning.damping;
        self.mass = tuning.mass;
        self.profile = Profile::for_mode(tuning.mode, self.harmonic);
    }

    pub fn set_harmonic(&mut self, harmonic: HarmonicProfile) {
        self.harmonic = harmonic;
        if let Profile::Harmonic(_) = self.profile {
            self.profile = Profile::Harmonic(harmonic);
        }
    }

    pub fn harmonic(&self) -> &HarmonicProfile {
        &self.harmonic
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    // Advances every field by one frame. Either all three fields are written
    // or, if any result is non-finite, none are.
    pub fn step(
        &self,
        current: &mut ParameterSet,
        velocity: &mut ParameterSet,
        target: &ParameterSet,
    ) -> Settlement {
        let mut next_pos = *current;
        let mut next_vel = *velocity;
        let mut out = Settlement::default();

        for (i, f) in Field::ALL.into_iter().enumerate() {
            let (x, v, settled) =
                self.step_field(current.field(f), velocity.field(f), target.field(f));
            if !(x.is_finite() && v.is_finite()) {
                return Settlement::default();
            }
            next_pos.set_field(f, x);
            next_vel.set_field(f, v);
            out.settled[i] = settled;
        }

        *current = next_pos;
        *velocity = next_vel;
        out
    }

    fn step_field(&self, x: f64, v: f64, target: f64) -> (f64, f64, bool) {
        let d = target - x;
        let (k, c) = match &self.profile {
            Profile::Linear => (self.stiffness, self.damping),
            Profile::Harmonic(h) => {
                let k = h.stiffness_at(d.abs());
                (k, h.damping_for(k, self.mass))
            }
        };

        let accel = (d * k - v * c) / self.mass;
        let v = v + accel;
        let x = x + v;

        let snap = self.profile.snap_threshold();
        if (target - x).abs() < snap && v.abs() < snap {
            return (target, 0.0, true);
        }
        (x, v, x == target && v == 0.0)
    }
}

pub fn is_non_oscillatory(stiffness: f64, damping: f64, mass: f64) -> bool {
    damping * damping >= 4.0 * stiffness * mass
}

pub fn critical_damping(stiffness: f64, mass: f64) -> f64 {
    2.0 * (stiffness * mass).sqrt()
}
