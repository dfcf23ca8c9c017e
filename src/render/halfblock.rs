use crate::frame::CHANNELS;
use crate::render::{Frame, Renderer, clip_line, draw_overlay_popup};
use std::io::Write;

/// Two pixels per cell: upper half as foreground, lower half as background.
pub struct HalfBlockRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let (w, h) = frame.image.size();

        if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
            return Ok(());
        }
        if w != cols || h != visual_rows.saturating_mul(2) {
            // Size changed between capture and paint; the next frame catches up.
            return Ok(());
        }
        let pixels = &frame.image.pixels;
        let need = w.saturating_mul(h).saturating_mul(CHANNELS);
        if pixels.len() < need {
            if frame.sync_updates {
                out.write_all(b"\x1b[?2026h")?;
            }
            out.write_all(b"\x1b[H\x1b[0m\x1b[2J")?;
            write!(out, "pixel buffer too small (need {}, got {})", need, pixels.len())?;
            if frame.sync_updates {
                out.write_all(b"\x1b[?2026l")?;
            }
            out.flush()?;
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }

        out.write_all(b"\x1b[H\x1b[0m")?;
        // Autowrap off while painting full-width rows.
        out.write_all(b"\x1b[?7l")?;
        self.last_fg = None;
        self.last_bg = None;

        const HALF_BLOCK: char = '\u{2580}';

        for row in 0..visual_rows {
            let top = &pixels[row * 2 * w * CHANNELS..(row * 2 + 1) * w * CHANNELS];
            let bot = &pixels[(row * 2 + 1) * w * CHANNELS..(row * 2 + 2) * w * CHANNELS];
            for (t, b) in top.chunks_exact(CHANNELS).zip(bot.chunks_exact(CHANNELS)) {
                let fg = (t[0], t[1], t[2]);
                let bg = (b[0], b[1], b[2]);
                if self.last_fg != Some(fg) {
                    write!(out, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write!(out, "\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2)?;
                    self.last_bg = Some(bg);
                }
                write!(out, "{HALF_BLOCK}")?;
            }
            out.write_all(b"\r\n")?;
        }

        let mut hud_lines = frame.hud.lines();
        for i in 0..(frame.hud_rows as usize) {
            write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", visual_rows + i + 1)?;
            if let Some(line) = hud_lines.next() {
                write!(out, "{}", clip_line(line, cols))?;
            }
        }

        if let Some(text) = frame.overlay {
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
        }

        out.write_all(b"\x1b[?7h")?;
        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}
