use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

/// Character-cell back buffer, presented to the real terminal in one pass.
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    alternate_screen: bool,
}

/// A single cell in the terminal buffer
#[derive(Clone)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bold: false,
        }
    }
}

impl Terminal {
    /// Take over the terminal (raw mode, alternate screen, hidden cursor).
    pub fn new() -> io::Result<Self> {
        let (width, height) = size()?;

        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)?;

        Ok(Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            alternate_screen: true,
        })
    }

    /// Buffer-only terminal for print mode; never touches the tty.
    pub fn headless(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            alternate_screen: false,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Current size of the real terminal, falling back to the buffer size.
    pub fn poll_size(&self) -> (u16, u16) {
        if self.alternate_screen {
            size().unwrap_or((self.width, self.height))
        } else {
            (self.width, self.height)
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            row.fill(Cell::default());
        }
    }

    /// Clear the actual terminal
    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(())
    }

    /// Set a character at position with optional color
    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bold };
        }
    }

    /// Set a string starting at position
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    #[cfg(test)]
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.buffer.get(y as usize)?.get(x as usize)
    }

    /// Write the whole buffer to the terminal, batching escape codes.
    pub fn present(&self) -> io::Result<()> {
        let mut out = stdout().lock();

        for (y, row) in self.buffer.iter().enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            let mut current: Option<(Option<Color>, bool)> = None;

            for cell in row {
                let style = (cell.fg, cell.bold);
                if current != Some(style) {
                    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                    if cell.bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if let Some(color) = cell.fg {
                        queue!(out, SetForegroundColor(color))?;
                    }
                    current = Some(style);
                }
                queue!(out, Print(cell.ch))?;
            }
        }

        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        out.flush()
    }

    /// Check for keypress (non-blocking), returns (code, modifiers)
    pub fn check_key(&self) -> io::Result<Option<(KeyCode, KeyModifiers)>> {
        if poll(Duration::from_millis(0))? {
            if let Event::Key(key_event) = read()? {
                if key_event.kind != KeyEventKind::Release {
                    return Ok(Some((key_event.code, key_event.modifiers)));
                }
            }
        }
        Ok(None)
    }

    pub fn sleep(&self, seconds: f32) {
        std::thread::sleep(Duration::from_secs_f32(seconds.max(0.0)));
    }

    /// Render the buffer as ANSI text (for print mode)
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for row in &self.buffer {
            let end = row.iter().rposition(|c| c.ch != ' ').map_or(0, |i| i + 1);
            for cell in &row[..end] {
                if cell.ch == ' ' {
                    out.push(' ');
                    continue;
                }
                if cell.bold {
                    out.push_str("\x1b[1m");
                }
                if let Some(code) = cell.fg.and_then(ansi_fg) {
                    out.push_str(&code);
                }
                out.push(cell.ch);
                out.push_str("\x1b[0m");
            }
            out.push('\n');
        }
        out
    }
}

fn ansi_fg(color: Color) -> Option<String> {
    let code = match color {
        Color::Rgb { r, g, b } => return Some(format!("\x1b[38;2;{};{};{}m", r, g, b)),
        Color::AnsiValue(v) => return Some(format!("\x1b[38;5;{}m", v)),
        // Standard colors (0-7)
        Color::Black => 30,
        Color::DarkRed => 31,
        Color::DarkGreen => 32,
        Color::DarkYellow => 33,
        Color::DarkBlue => 34,
        Color::DarkMagenta => 35,
        Color::DarkCyan => 36,
        Color::Grey => 37,
        // Bright colors (8-15)
        Color::DarkGrey => 90,
        Color::Red => 91,
        Color::Green => 92,
        Color::Yellow => 93,
        Color::Blue => 94,
        Color::Magenta => 95,
        Color::Cyan => 96,
        Color::White => 97,
        Color::Reset => return None,
    };
    Some(format!("\x1b[{}m", code))
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ignores_out_of_bounds() {
        let mut term = Terminal::headless(4, 2);
        term.set(-1, 0, 'x', None, false);
        term.set(4, 1, 'x', None, false);
        term.set(3, 1, 'y', Some(Color::Cyan), true);
        assert_eq!(term.cell(3, 1).map(|c| c.ch), Some('y'));
        assert!(term.cell(4, 1).is_none());
    }

    #[test]
    fn test_ansi_output_trims_trailing_blanks() {
        let mut term = Terminal::headless(6, 2);
        term.set_str(0, 0, "ab", Some(Color::Rgb { r: 1, g: 2, b: 3 }), false);
        let text = term.to_ansi();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "\x1b[38;2;1;2;3ma\x1b[0m\x1b[38;2;1;2;3mb\x1b[0m");
        assert_eq!(lines[1], "");
    }

    #[test]
    fn test_resize_resets_buffer() {
        let mut term = Terminal::headless(2, 2);
        term.set(1, 1, 'z', None, false);
        term.resize(3, 1);
        assert_eq!(term.size(), (3, 1));
        assert_eq!(term.cell(0, 0).map(|c| c.ch), Some(' '));
    }
}
