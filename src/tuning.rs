use crate::config::Mode;
use std::fmt;
use std::path::Path;

// Externally supplied simulation settings. Frame budgets are real-valued so a
// cycle split like 33.75 / 41.25 frames can be expressed; the state machine
// compares its integer timer against them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringTuning {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    pub hold_frames: f64,
    pub transition_frames: f64,
    pub mode: Mode,
}

impl Default for SpringTuning {
    fn default() -> Self {
        let timing = CycleTiming::split(10.0, 8, 0.45, 60.0);
        Self {
            stiffness: 0.025,
            damping: 0.283,
            mass: 1.0,
            hold_frames: timing.hold_frames,
            transition_frames: timing.transition_frames,
            mode: Mode::StrictTiming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuningError {
    Io(String),
    Parse { line: usize, message: String },
    InvalidValue { field: &'static str, message: String },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid value for {field}: {message}")
            }
        }
    }
}

impl std::error::Error for TuningError {}

impl SpringTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("stiffness", self.stiffness)?;
        positive("mass", self.mass)?;
        non_negative("damping", self.damping)?;
        non_negative("hold_frames", self.hold_frames)?;
        non_negative("transition_frames", self.transition_frames)?;
        Ok(())
    }

    pub fn is_non_oscillatory(&self) -> bool {
        crate::spring::is_non_oscillatory(self.stiffness, self.damping, self.mass)
    }

    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let text = std::fs::read_to_string(path).map_err(|e| TuningError::Io(e.to_string()))?;
        Self::default().merge_text(&text)
    }

    // Overlays `key=value` lines onto `self`. Unknown keys are rejected so a
    // typo does not silently fall back to a default.
    pub fn merge_text(mut self, text: &str) -> Result<Self, TuningError> {
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(TuningError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            match key {
                "stiffness" => self.stiffness = parse_f64(value, line_no)?,
                "damping" => self.damping = parse_f64(value, line_no)?,
                "mass" => self.mass = parse_f64(value, line_no)?,
                "hold_frames" => self.hold_frames = parse_f64(value, line_no)?,
                "transition_frames" => self.transition_frames = parse_f64(value, line_no)?,
                "mode" => {
                    self.mode = Mode::parse(value).ok_or_else(|| TuningError::Parse {
                        line: line_no,
                        message: format!("unknown mode '{value}'"),
                    })?;
                }
                other => {
                    return Err(TuningError::Parse {
                        line: line_no,
                        message: format!("unknown key '{other}'"),
                    });
                }
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn to_text(&self) -> String {
        format!(
            "# lissaviz spring tuning v1\nstiffness={}\ndamping={}\nmass={}\nhold_frames={}\ntransition_frames={}\nmode={}\n",
            self.stiffness,
            self.damping,
            self.mass,
            self.hold_frames,
            self.transition_frames,
            self.mode.label()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTiming {
    pub step_seconds: f64,
    pub transition_seconds: f64,
    pub hold_seconds: f64,
    pub transition_frames: f64,
    pub hold_frames: f64,
}

impl CycleTiming {
    pub fn split(cycle_seconds: f64, steps: u32, transition_fraction: f64, fps: f64) -> Self {
        let step_seconds = cycle_seconds / steps.max(1) as f64;
        let fraction = transition_fraction.clamp(0.0, 1.0);
        let transition_seconds = step_seconds * fraction;
        let hold_seconds = step_seconds - transition_seconds;
        Self {
            step_seconds,
            transition_seconds,
            hold_seconds,
            transition_frames: transition_seconds * fps,
            hold_frames: hold_seconds * fps,
        }
    }
}

fn parse_f64(raw: &str, line: usize) -> Result<f64, TuningError> {
    raw.parse::<f64>().map_err(|_| TuningError::Parse {
        line,
        message: format!("'{raw}' is not a number"),
    })
}

fn positive(field: &'static str, v: f64) -> Result<(), TuningError> {
    if v.is_finite() && v > 0.0 {
        return Ok(());
    }
    Err(TuningError::InvalidValue {
        field,
        message: format!("must be > 0 (got {v})"),
    })
}

fn non_negative(field: &'static str, v: f64) -> Result<(), TuningError> {
    if v.is_finite() && v >= 0.0 {
        return Ok(());
    }
    Err(TuningError::InvalidValue {
        field,
        message: format!("must be >= 0 (got {v})"),
    })
}
