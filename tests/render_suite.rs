use lissaviz::config::RendererMode;
use lissaviz::render::{make_renderer, BrailleRenderer, Frame, HalfBlockRenderer, Renderer};

fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&[r, g, b, 255]);
    }
    buf
}

fn set_pixel(buf: &mut [u8], w: usize, x: usize, y: usize, rgb: (u8, u8, u8)) {
    let i = (y * w + x) * 4;
    buf[i..i + 4].copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
}

fn make_frame<'a>(
    renderer: &dyn Renderer,
    cols: u16,
    rows: u16,
    pixels: &'a [u8],
    hud: &'a [String],
    sync: bool,
) -> Frame<'a> {
    let (cx, cy) = renderer.cell_pixels();
    Frame {
        term_cols: cols,
        visual_rows: rows,
        pixel_width: cols as usize * cx,
        pixel_height: rows as usize * cy,
        pixels_rgba: pixels,
        hud,
        sync_updates: sync,
    }
}

fn render(renderer: &mut dyn Renderer, frame: &Frame<'_>) -> String {
    let mut out = Vec::new();
    renderer.render(frame, &mut out).expect("render");
    String::from_utf8(out).expect("utf-8 output")
}

#[test]
fn cell_geometry_and_names() {
    assert_eq!(HalfBlockRenderer::new().cell_pixels(), (1, 2));
    assert_eq!(BrailleRenderer::new().cell_pixels(), (2, 4));
    assert_eq!(make_renderer(RendererMode::HalfBlock).name(), "halfblock");
    assert_eq!(make_renderer(RendererMode::Braille).name(), "braille");
}

#[test]
fn halfblock_pairs_top_and_bottom_pixels() {
    let mut renderer = HalfBlockRenderer::new();
    let mut pixels = solid_pixels(4, 4, 10, 20, 30);
    set_pixel(&mut pixels, 4, 2, 0, (250, 100, 0));
    let hud = vec!["Mode: strict-timing".to_string()];
    let frame = make_frame(&renderer, 4, 2, &pixels, &hud, false);

    let s = render(&mut renderer, &frame);
    assert!(s.starts_with("\x1b[H"));
    assert!(s.contains("\x1b[?7l") && s.contains("\x1b[?7h"));
    assert_eq!(s.matches('\u{2580}').count(), 8);
    assert!(s.contains("38;2;250;100;0"), "bright top pixel as glyph color");
    assert!(s.contains("48;2;10;20;30"), "background pixel as cell color");
    // The HUD goes on the row after the visual.
    assert!(s.contains("\x1b[3;1H\x1b[0m\x1b[2KMode: strict-timing"));
    assert!(!s.contains("\x1b[?2026h"));
}

#[test]
fn repeated_colors_are_not_re_emitted() {
    let mut renderer = HalfBlockRenderer::new();
    let pixels = solid_pixels(6, 4, 1, 2, 3);
    let frame = make_frame(&renderer, 6, 2, &pixels, &[], false);
    let s = render(&mut renderer, &frame);
    assert_eq!(s.matches("38;2;1;2;3").count(), 1);
    assert_eq!(s.matches("48;2;1;2;3").count(), 1);

    // A second frame starts from a clean color state.
    let again = render(&mut renderer, &frame);
    assert_eq!(again.matches("38;2;1;2;3").count(), 1);
}

#[test]
fn braille_lights_only_the_bright_dots() {
    let mut renderer = BrailleRenderer::new();
    let mut pixels = solid_pixels(4, 4, 0, 0, 0);
    // Top-left dot of the first cell.
    set_pixel(&mut pixels, 4, 0, 0, (255, 255, 255));
    let frame = make_frame(&renderer, 2, 1, &pixels, &[], false);

    let s = render(&mut renderer, &frame);
    assert!(s.contains('\u{2801}'), "single dot glyph: {s:?}");
    assert!(s.contains("38;2;255;255;255"));
    // The uniform second cell is a blank.
    assert!(!s.contains('\u{2800}'));
    assert_eq!(s.matches('\u{2801}').count(), 1);
}

#[test]
fn braille_full_cell_uses_every_dot() {
    let mut renderer = BrailleRenderer::new();
    let mut pixels = solid_pixels(2, 4, 255, 0, 0);
    // One dark dot keeps the split meaningful.
    set_pixel(&mut pixels, 2, 1, 3, (0, 0, 0));
    let frame = make_frame(&renderer, 1, 1, &pixels, &[], false);

    let s = render(&mut renderer, &frame);
    assert!(s.contains('\u{287F}'), "seven dots lit: {s:?}");
    assert!(s.contains("38;2;255;0;0"));
    assert!(s.contains("48;2;0;0;0"));
}

#[test]
fn sync_updates_wrap_the_frame() {
    for mut renderer in [
        make_renderer(RendererMode::HalfBlock),
        make_renderer(RendererMode::Braille),
    ] {
        let pixels = solid_pixels(8, 8, 40, 40, 40);
        let (cx, cy) = renderer.cell_pixels();
        let frame = make_frame(
            &*renderer,
            (8 / cx) as u16,
            (8 / cy) as u16,
            &pixels,
            &[],
            true,
        );
        let s = render(&mut *renderer, &frame);
        assert!(s.starts_with("\x1b[?2026h"), "{}", renderer.name());
        assert!(s.ends_with("\x1b[?2026l"), "{}", renderer.name());
    }
}

#[test]
fn mismatched_geometry_writes_nothing() {
    let mut renderer = HalfBlockRenderer::new();
    let pixels = solid_pixels(4, 4, 0, 0, 0);
    let frame = Frame {
        term_cols: 4,
        visual_rows: 3,
        pixel_width: 4,
        pixel_height: 4,
        pixels_rgba: &pixels,
        hud: &[],
        sync_updates: true,
    };
    assert!(render(&mut renderer, &frame).is_empty());
}

#[test]
fn short_buffer_reports_instead_of_panicking() {
    let mut renderer = BrailleRenderer::new();
    let pixels = vec![0u8; 10];
    let frame = make_frame(&renderer, 2, 1, &pixels, &[], false);
    let s = render(&mut renderer, &frame);
    assert!(s.contains("pixel buffer too small (need 64, got 10)"));
}

#[test]
fn hud_lines_are_clipped_to_the_width() {
    let mut renderer = HalfBlockRenderer::new();
    let pixels = solid_pixels(5, 2, 0, 0, 0);
    let hud = vec!["abcdefghij".to_string(), "xy".to_string()];
    let frame = make_frame(&renderer, 5, 1, &pixels, &hud, false);
    let s = render(&mut renderer, &frame);
    assert!(s.contains("\x1b[2;1H\x1b[0m\x1b[2Kabcde"));
    assert!(!s.contains("abcdef"));
    assert!(s.contains("\x1b[3;1H\x1b[0m\x1b[2Kxy"));
}
