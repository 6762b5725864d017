use crate::terminal::Terminal;
use crossterm::style::Color;

/// Render a centered help overlay box with the provided text.
pub fn render_help_overlay(term: &mut Terminal, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let (width, height) = term.size();

    let lines: Vec<&str> = help_text.lines().collect();
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4; // 2 chars padding each side
    let box_height = lines.len() + 2;

    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;

    let border = Some(Color::White);
    let text = Some(Color::Grey);

    let horizontal = "─".repeat(box_width - 2);
    term.set_str(start_x as i32, start_y as i32, &format!("┌{}┐", horizontal), border, false);

    for (i, line) in lines.iter().enumerate() {
        let y = (start_y + 1 + i) as i32;
        let padding = max_width - line.chars().count();
        term.set(start_x as i32, y, '│', border, false);
        term.set_str(start_x as i32 + 1, y, &format!(" {}{} ", line, " ".repeat(padding)), text, false);
        term.set((start_x + box_width - 1) as i32, y, '│', border, false);
    }

    let bottom_y = (start_y + box_height - 1) as i32;
    term.set_str(start_x as i32, bottom_y, &format!("└{}┘", horizontal), border, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_is_centered_box() {
        let mut term = Terminal::headless(20, 6);
        render_help_overlay(&mut term, "ab\ncdef");
        // box is 8 wide, 4 tall -> starts at (6, 1)
        assert_eq!(term.cell(6, 1).map(|c| c.ch), Some('┌'));
        assert_eq!(term.cell(13, 1).map(|c| c.ch), Some('┐'));
        assert_eq!(term.cell(8, 2).map(|c| c.ch), Some('a'));
        assert_eq!(term.cell(13, 4).map(|c| c.ch), Some('┘'));
    }

    #[test]
    fn test_empty_help_draws_nothing() {
        let mut term = Terminal::headless(10, 3);
        render_help_overlay(&mut term, "");
        assert_eq!(term.cell(0, 0).map(|c| c.ch), Some(' '));
    }
}
