use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub a: f64,
    pub b: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    A,
    B,
    Delta,
}

impl Field {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::Delta];

    pub fn label(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::Delta => "delta",
        }
    }
}

impl ParameterSet {
    pub const ZERO: Self = Self {
        a: 0.0,
        b: 0.0,
        delta: 0.0,
    };

    pub const fn new(a: f64, b: f64, delta: f64) -> Self {
        Self { a, b, delta }
    }

    pub fn field(&self, f: Field) -> f64 {
        match f {
            Field::A => self.a,
            Field::B => self.b,
            Field::Delta => self.delta,
        }
    }

    pub fn set_field(&mut self, f: Field, v: f64) {
        match f {
            Field::A => self.a = v,
            Field::B => self.b = v,
            Field::Delta => self.delta = v,
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}:{:.3} δ{:.3}", self.a, self.b, self.delta)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyframeError {
    TooShort(usize),
    NonPositiveRatio { index: usize, field: &'static str },
    NotFinite { index: usize },
}

impl fmt::Display for KeyframeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort(n) => write!(f, "keyframe sequence needs at least 2 entries, got {n}"),
            Self::NonPositiveRatio { index, field } => {
                write!(f, "keyframe {index}: '{field}' must be > 0")
            }
            Self::NotFinite { index } => write!(f, "keyframe {index}: values must be finite"),
        }
    }
}

impl std::error::Error for KeyframeError {}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeSequence {
    frames: Vec<ParameterSet>,
}

impl KeyframeSequence {
    pub fn new(frames: Vec<ParameterSet>) -> Result<Self, KeyframeError> {
        if frames.len() < 2 {
            return Err(KeyframeError::TooShort(frames.len()));
        }
        for (index, p) in frames.iter().enumerate() {
            if !(p.a.is_finite() && p.b.is_finite() && p.delta.is_finite()) {
                return Err(KeyframeError::NotFinite { index });
            }
            if p.a <= 0.0 {
                return Err(KeyframeError::NonPositiveRatio { index, field: "a" });
            }
            if p.b <= 0.0 {
                return Err(KeyframeError::NonPositiveRatio { index, field: "b" });
            }
        }
        Ok(Self { frames })
    }

    pub fn ratio_ladder() -> Self {
        Self {
            frames: vec![
                ParameterSet::new(1.0, 1.0, PI / 2.0),
                ParameterSet::new(1.0, 2.0, PI / 2.0),
                ParameterSet::new(1.0, 3.0, PI / 2.0),
                ParameterSet::new(2.0, 3.0, PI / 2.0),
                ParameterSet::new(3.0, 4.0, PI / 2.0),
                ParameterSet::new(3.0, 5.0, PI / 4.0),
                ParameterSet::new(4.0, 5.0, PI / 2.0),
                ParameterSet::new(5.0, 4.0, PI / 4.0),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&ParameterSet> {
        self.frames.get(index)
    }

    pub fn first(&self) -> ParameterSet {
        self.frames[0]
    }

    pub fn as_slice(&self) -> &[ParameterSet] {
        &self.frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerCursor {
    pub index: usize,
    pub direction: Direction,
}

// Picks the next keyframe with a ping-pong walk. At either end the direction
// flips and the cursor lands one step inward, so an endpoint is never
// targeted twice in a row.
#[derive(Debug, Clone)]
pub struct Sequencer {
    seq: KeyframeSequence,
    cursor: SequencerCursor,
}

impl Sequencer {
    pub fn new(seq: KeyframeSequence) -> Self {
        Self::with_cursor(seq, 0, Direction::Forward)
    }

    pub fn with_cursor(seq: KeyframeSequence, index: usize, direction: Direction) -> Self {
        let index = index.min(seq.len() - 1);
        Self {
            seq,
            cursor: SequencerCursor { index, direction },
        }
    }

    pub fn advance(&mut self) -> ParameterSet {
        let last = self.seq.len() as isize - 1;
        let mut next = self.cursor.index as isize + self.cursor.direction.step();
        if next > last {
            self.cursor.direction = Direction::Backward;
            next = last - 1;
        } else if next < 0 {
            self.cursor.direction = Direction::Forward;
            next = 1;
        }
        self.cursor.index = next as usize;
        self.current()
    }

    pub fn current(&self) -> ParameterSet {
        self.seq.as_slice()[self.cursor.index]
    }

    pub fn cursor(&self) -> SequencerCursor {
        self.cursor
    }

    pub fn sequence(&self) -> &KeyframeSequence {
        &self.seq
    }

    pub fn rewind(&mut self) {
        self.cursor = SequencerCursor {
            index: 0,
            direction: Direction::Forward,
        };
    }
}
