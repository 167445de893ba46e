//! Terminal rendering of a [`VisualFrame`].

use crate::visualizer::VisualFrame;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

const EIGHTHS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Vertical bars, one per level, stretched across the area.
pub struct SpectrumBars<'a> {
    frame: &'a VisualFrame,
    bar_color: Color,
    idle_color: Color,
}

impl<'a> SpectrumBars<'a> {
    pub fn new(frame: &'a VisualFrame) -> Self {
        Self {
            frame,
            bar_color: Color::Cyan,
            idle_color: Color::DarkGray,
        }
    }

    pub fn bar_color(mut self, color: Color) -> Self {
        self.bar_color = color;
        self
    }
}

/// Terminal colour for a voice's accent tag.
pub fn accent_color(tag: &str) -> Color {
    match tag {
        "blue" => Color::Blue,
        "purple" => Color::Magenta,
        "emerald" => Color::Green,
        "red" => Color::Red,
        _ => Color::Cyan,
    }
}

/// Height of bar `level` in eighths of a cell.
fn eighths(level: f32, rows: u16) -> usize {
    (level.clamp(0.0, 1.0) * rows as f32 * 8.0).round() as usize
}

impl Widget for SpectrumBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let bars = self.frame.bar_count().max(1);
        let bottom = area.bottom() - 1;

        for x in area.left()..area.right() {
            let bar = (x - area.left()) as usize * bars / area.width as usize;
            match self.frame {
                VisualFrame::Idle { .. } => {
                    buf[(x, bottom)]
                        .set_symbol(EIGHTHS[1])
                        .set_style(Style::default().fg(self.idle_color));
                }
                VisualFrame::Spectrum(levels) => {
                    let mut remaining = eighths(levels.get(bar).copied().unwrap_or(0.0), area.height);
                    for y in (area.top()..area.bottom()).rev() {
                        let cell = remaining.min(8);
                        remaining -= cell;
                        if cell == 0 {
                            break;
                        }
                        buf[(x, y)]
                            .set_symbol(EIGHTHS[cell])
                            .set_style(Style::default().fg(self.bar_color));
                    }
                }
            }
        }
    }
}
