use anyhow::Context;
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, ClearType},
};
use std::io::{Stdout, Write, stdout};

/// Raw mode plus alternate screen for the lifetime of the player.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Guard exists before the remaining steps so Drop restores raw mode on failure.
        let guard = Self { _private: () };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;

        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
    }
}

/// Pixel grid a terminal of `cols` x `rows` cells can show with half blocks
/// after reserving `hud_rows` text rows at the bottom.
pub fn pixel_grid(cols: u16, rows: u16, hud_rows: u16) -> (usize, usize, u16) {
    let visual_rows = rows.saturating_sub(hud_rows).max(1);
    (cols as usize, visual_rows as usize * 2, visual_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_reserves_hud_rows() {
        assert_eq!(pixel_grid(80, 24, 2), (80, 44, 22));
        assert_eq!(pixel_grid(10, 1, 2), (10, 2, 1));
    }
}
