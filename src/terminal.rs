use anyhow::{bail, Context};
use crossterm::{
    cursor,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{stdout, Stdout, Write};

// Smallest grid the live view accepts: a 4x2 figure.
pub const MIN_COLS: u16 = 4;
pub const MIN_ROWS: u16 = 2;

pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Guard exists from here on so a failed step below still restores the tty.
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

    pub fn size() -> anyhow::Result<(u16, u16)> {
        let (cols, rows) = terminal::size().context("get terminal size")?;
        if cols < MIN_COLS || rows < MIN_ROWS {
            bail!("terminal too small (need at least {MIN_COLS}x{MIN_ROWS}, got {cols}x{rows})");
        }
        Ok((cols, rows))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        // Undo synchronized output, autowrap and SGR state left by a cut-off frame.
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
    }
}
