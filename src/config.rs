use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lissaviz",
    version,
    about = "Spring-driven Lissajous figures in the terminal, with fixed-rate MP4 export"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    #[arg(long)]
    pub stiffness: Option<f64>,

    #[arg(long)]
    pub damping: Option<f64>,

    #[arg(long)]
    pub mass: Option<f64>,

    #[arg(long)]
    pub hold_frames: Option<f64>,

    #[arg(long)]
    pub transition_frames: Option<f64>,

    // key=value file with spring tuning (flags override it)
    #[arg(long, value_name = "FILE")]
    pub tuning: Option<PathBuf>,

    // key=value file with `foreground` / `background` colors
    #[arg(long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    #[arg(long, value_name = "#RRGGBB")]
    pub fg: Option<String>,

    #[arg(long, value_name = "#RRGGBB")]
    pub bg: Option<String>,

    #[arg(long, value_name = "DIR", default_value = ".")]
    pub export_dir: PathBuf,

    #[arg(long, default_value_t = 1080)]
    pub export_width: u32,

    #[arg(long, default_value_t = 1350)]
    pub export_height: u32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    // Linear spring, transition ends after a fixed frame budget.
    #[value(alias = "strict")]
    StrictTiming,
    // Harmonic spring, transition ends once every field has settled.
    #[value(alias = "settle")]
    SettlementDriven,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::StrictTiming => Self::SettlementDriven,
            Self::SettlementDriven => Self::StrictTiming,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StrictTiming => "strict-timing",
            Self::SettlementDriven => "settlement-driven",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict-timing" | "strict" | "strict_timing" => Some(Self::StrictTiming),
            "settlement-driven" | "settle" | "settlement_driven" => Some(Self::SettlementDriven),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityTier {
    High,
    Compact,
}

impl QualityTier {
    pub fn bitrate_bps(self) -> u64 {
        match self {
            Self::High => 40_000_000,
            Self::Compact => 600_000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Compact => "compact",
        }
    }
}
