use ki_player::frame::RgbFrame;
use ki_player::render::{Frame, HalfBlockRenderer, Renderer};

/// Build a frame that varies across x.
fn gradient_image(w: usize, h: usize) -> RgbFrame {
    let mut img = RgbFrame::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let t = (x as f32 / w.max(1) as f32 * 255.0) as u8;
            img.set_pixel(x, y, [t, 128, 255 - t]);
        }
    }
    img
}

fn make_frame<'a>(cols: u16, visual_rows: u16, image: &'a RgbFrame, sync: bool) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 2,
        visual_rows,
        image,
        hud: "KiAlt on | pitch 19",
        hud_rows: 1,
        overlay: None,
        sync_updates: sync,
    }
}

#[test]
fn halfblock_renders_gradient_frame() {
    let image = gradient_image(8, 8);
    let frame = make_frame(8, 4, &image, true);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[?2026h"), "missing sync-begin");
    assert!(s.contains("\x1b[?2026l"), "missing sync-end");
    assert!(s.contains("\u{2580}"), "missing half-block char");
    assert!(s.contains("38;2;"), "missing FG escape");
    assert!(s.contains("48;2;"), "missing BG escape");
    assert!(s.contains("KiAlt on"), "missing HUD text");
}

#[test]
fn halfblock_uses_top_pixel_as_foreground() {
    let mut image = RgbFrame::solid(1, 2, [0, 0, 0]);
    image.set_pixel(0, 0, [10, 20, 30]);
    image.set_pixel(0, 1, [40, 50, 60]);
    let frame = make_frame(1, 1, &image, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[38;2;10;20;30m"));
    assert!(s.contains("\x1b[48;2;40;50;60m"));
}

#[test]
fn halfblock_name() {
    assert_eq!(HalfBlockRenderer::new().name(), "halfblock");
}

#[test]
fn halfblock_skips_dimension_mismatch() {
    let image = RgbFrame::solid(4, 4, [100, 100, 100]);
    let frame = make_frame(4, 4, &image, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for dimension mismatch");
}

#[test]
fn halfblock_reports_short_buffer() {
    let mut image = RgbFrame::solid(4, 4, [1, 2, 3]);
    image.pixels.truncate(10);
    let frame = make_frame(4, 2, &image, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(String::from_utf8_lossy(&out).contains("pixel buffer too small"));
}

#[test]
fn help_overlay_is_drawn_on_top() {
    let image = gradient_image(20, 12);
    let mut frame = make_frame(20, 6, &image, false);
    frame.term_rows = 8;
    frame.overlay = Some("Help\nq quit");
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("q quit"));
    assert!(s.contains("+--"));
}
