use clap::Parser;
use crossterm::event::{KeyCode, KeyModifiers};
use lissaviz::animator::Animator;
use lissaviz::app::{
    action_for_key, build_hud, build_theme, build_tuning, capture_settings, export_status, Action,
    HudInfo,
};
use lissaviz::capture::ExportProgress;
use lissaviz::config::{Config, Mode, QualityTier, RendererMode};
use lissaviz::keyframes::KeyframeSequence;
use lissaviz::theme::{Rgb, Theme, ThemeError};
use lissaviz::tuning::{SpringTuning, TuningError};
use std::io::Write;

fn parse(args: &[&str]) -> Config {
    let mut full = vec!["lissaviz"];
    full.extend_from_slice(args);
    Config::try_parse_from(full).expect("parse should succeed")
}

#[test]
fn config_defaults_are_stable() {
    let cfg = parse(&[]);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.fps, 60);
    assert_eq!(cfg.mode, None);
    assert_eq!((cfg.export_width, cfg.export_height), (1080, 1350));
    assert!(cfg.sync_updates);

    let settings = capture_settings(&cfg);
    assert_eq!(settings.total_frames(), 600);
    assert_eq!((settings.width, settings.height), (1080, 1350));
}

#[test]
fn renderer_and_mode_aliases_parse() {
    let cfg = parse(&["--renderer", "dots", "--mode", "settle"]);
    assert_eq!(cfg.renderer, RendererMode::Braille);
    assert_eq!(cfg.mode, Some(Mode::SettlementDriven));

    let cfg = parse(&["--renderer", "hb", "--mode", "strict-timing"]);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.mode, Some(Mode::StrictTiming));
}

#[test]
fn mode_helpers() {
    assert_eq!(Mode::StrictTiming.toggled(), Mode::SettlementDriven);
    assert_eq!(Mode::SettlementDriven.toggled(), Mode::StrictTiming);
    assert_eq!(Mode::parse(" Settlement_Driven "), Some(Mode::SettlementDriven));
    assert_eq!(Mode::parse("fast"), None);
    assert_eq!(QualityTier::High.bitrate_bps(), 40_000_000);
    assert_eq!(QualityTier::Compact.bitrate_bps(), 600_000);
}

#[test]
fn tuning_text_roundtrips_and_reports_line_numbers() {
    let tuning = SpringTuning {
        stiffness: 0.04,
        hold_frames: 30.0,
        mode: Mode::SettlementDriven,
        ..SpringTuning::default()
    };
    let parsed = SpringTuning::default()
        .merge_text(&tuning.to_text())
        .expect("own output parses");
    assert_eq!(parsed, tuning);

    let err = SpringTuning::default()
        .merge_text("# comment\nstiffness=0.1\ndampnig=0.3\n")
        .expect_err("typo must be rejected");
    assert!(matches!(err, TuningError::Parse { line: 3, .. }));

    let err = SpringTuning::default()
        .merge_text("mass=0\n")
        .expect_err("mass must be positive");
    assert!(matches!(err, TuningError::InvalidValue { field: "mass", .. }));

    let err = SpringTuning::default()
        .merge_text("stiffness\n")
        .expect_err("missing '='");
    assert!(matches!(err, TuningError::Parse { line: 1, .. }));
}

#[test]
fn flags_override_the_tuning_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "stiffness=0.05\ndamping=0.5\nmode=settle").expect("write");
    let path = file.path().to_str().expect("utf-8 path").to_string();

    let cfg = parse(&["--tuning", path.as_str(), "--damping", "0.9"]);
    let tuning = build_tuning(&cfg).expect("tuning");
    assert_eq!(tuning.stiffness, 0.05);
    assert_eq!(tuning.damping, 0.9);
    assert_eq!(tuning.mode, Mode::SettlementDriven);
    assert_eq!(tuning.mass, 1.0);

    let cfg = parse(&["--tuning", path.as_str(), "--mode", "strict"]);
    assert_eq!(build_tuning(&cfg).expect("tuning").mode, Mode::StrictTiming);

    let cfg = parse(&["--stiffness=-1"]);
    assert!(build_tuning(&cfg).is_err());
}

#[test]
fn theme_parses_hex_colors() {
    assert_eq!(Rgb::parse_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
    assert_eq!(Rgb::parse_hex("#f80"), Some(Rgb::new(255, 136, 0)));
    assert_eq!(Rgb::parse_hex("ff8000"), Some(Rgb::new(255, 128, 0)));
    assert_eq!(Rgb::parse_hex("#ff80"), None);
    assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");

    let theme = Theme::parse("# dusk\nforeground=#ffffff\n\nbg = #000000\n").expect("theme");
    assert_eq!(theme.foreground, Rgb::new(255, 255, 255));
    assert_eq!(theme.background, Rgb::new(0, 0, 0));

    let partial = Theme::parse("fg=#123456\n").expect("theme");
    assert_eq!(partial.background, Theme::default().background);
}

#[test]
fn theme_errors_name_the_problem() {
    let err = Theme::parse("foreground=#12\n").expect_err("short color");
    assert!(matches!(err, ThemeError::InvalidColor { field: "foreground", .. }));

    let err = Theme::parse("accent=#ffffff\n").expect_err("unknown key");
    assert!(matches!(err, ThemeError::Parse { line: 1, .. }));
}

#[test]
fn color_flags_override_the_theme() {
    let theme = build_theme(&parse(&["--fg", "#010203"])).expect("theme");
    assert_eq!(theme.foreground, Rgb::new(1, 2, 3));
    assert_eq!(theme.background, Theme::default().background);

    assert!(build_theme(&parse(&["--bg", "blue"])).is_err());
}

#[test]
fn key_bindings() {
    let none = KeyModifiers::NONE;
    assert_eq!(action_for_key(KeyCode::Char('q'), none), Action::Quit);
    assert_eq!(action_for_key(KeyCode::Esc, none), Action::Quit);
    assert_eq!(action_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
    assert_eq!(action_for_key(KeyCode::Char('m'), none), Action::ToggleMode);
    assert_eq!(
        action_for_key(KeyCode::Char('e'), none),
        Action::Export(QualityTier::High)
    );
    assert_eq!(
        action_for_key(KeyCode::Char('c'), none),
        Action::Export(QualityTier::Compact)
    );
    assert_eq!(action_for_key(KeyCode::Char('h'), none), Action::ToggleHud);
    assert_eq!(action_for_key(KeyCode::Char('x'), none), Action::None);
}

#[test]
fn hud_wraps_to_the_terminal_width() {
    let anim = Animator::new(KeyframeSequence::ratio_ladder(), SpringTuning::default());
    let status = export_status(ExportProgress::Capturing { captured: 12, total: 600 }, None);
    assert_eq!(status, "capturing 12/600");
    let info = HudInfo {
        animator: &anim,
        fps: 59.9,
        skipped: 0,
        renderer: "halfblock",
        export: &status,
    };

    let wide = build_hud(400, &info);
    let mut settling = Animator::new(KeyframeSequence::ratio_ladder(), SpringTuning::default());
    settling.on_mode_change(Mode::SettlementDriven);
    let settle_hud = build_hud(
        400,
        &HudInfo {
            animator: &settling,
            ..info
        },
    );
    assert!(settle_hud[0].starts_with("Mode: settlement-driven | Spring: harmonic |"));
    assert_eq!(wide.len(), 3);
    assert!(wide[0].starts_with("Mode: strict-timing | Spring: linear | Phase: HOLD 0 | Key: 1/8"));
    assert!(wide[1].contains("Export: capturing 12/600"));

    let narrow = build_hud(20, &info);
    assert!(narrow.len() > 3);
    assert!(narrow.iter().all(|l| l.chars().count() <= 20));
}

#[test]
fn export_status_falls_back_to_the_last_message() {
    assert_eq!(export_status(ExportProgress::Idle, None), "idle");
    assert_eq!(
        export_status(ExportProgress::Idle, Some("saved clip.mp4")),
        "saved clip.mp4"
    );
    assert_eq!(
        export_status(ExportProgress::Encoding { frames: 600 }, Some("old")),
        "encoding 600 frames"
    );
}
