//! Custom TUI widgets

use super::ThemeColors;
use crate::store::RoleMap;
use crate::trigger::{BackgroundState, Role};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Widget drawing both counters on a background that flashes on triggers
pub struct CounterPanel<'a> {
    keys: [&'a str; 2],
    counts: RoleMap<u64>,
    delays: RoleMap<f64>,
    background: BackgroundState,
    colors: ThemeColors,
}

impl<'a> CounterPanel<'a> {
    pub fn new(keys: [&'a str; 2], counts: RoleMap<u64>, colors: ThemeColors) -> Self {
        Self {
            keys,
            counts,
            delays: RoleMap::new(0.0, 0.0),
            background: BackgroundState::Idle,
            colors,
        }
    }

    pub fn delays(mut self, delays: RoleMap<f64>) -> Self {
        self.delays = delays;
        self
    }

    pub fn background(mut self, background: BackgroundState) -> Self {
        self.background = background;
        self
    }

    fn render_cell(&self, role: Role, area: Rect, buf: &mut Buffer, base: Style) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let flashed = self.background == BackgroundState::Flash(role);
        let (label_style, count_style) = if flashed {
            (
                base.add_modifier(Modifier::BOLD),
                base.add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )
        } else if matches!(self.background, BackgroundState::Flash(_)) {
            (base, base.add_modifier(Modifier::BOLD))
        } else {
            (
                base.fg(self.colors.dim),
                base.fg(self.colors.accent).add_modifier(Modifier::BOLD),
            )
        };

        let label = self.keys[role.index()].to_uppercase();
        let count = format!(" {} ", self.counts.get(role));
        let delay = format!("{:.1}s", self.delays.get(role));

        let lines = [
            Line::from(Span::styled(label, label_style)),
            Line::from(Span::styled(count, count_style)),
            Line::from(Span::styled(delay, label_style)),
        ];

        // Vertically centre the three lines
        let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
        for (i, line) in lines.iter().enumerate() {
            let y = top + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let width = line.width() as u16;
            let x = area.x + area.width.saturating_sub(width) / 2;
            buf.set_line(x, y, line, area.width);
        }
    }
}

impl<'a> Widget for CounterPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let base = match self.background {
            BackgroundState::Idle => Style::default().bg(self.colors.bg).fg(self.colors.fg),
            BackgroundState::Flash(_) => Style::default()
                .bg(self.colors.flash)
                .fg(self.colors.text_on_flash),
        };
        buf.set_style(area, base);

        let block = Block::default()
            .title(" Key Counter ")
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(base.fg(self.colors.dim))
            .style(base);
        let inner = block.inner(area);
        block.render(area, buf);

        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(inner);

        for role in Role::ALL {
            self.render_cell(role, cells[role.index()], buf, base);
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    state: &'a str,
    elapsed: &'a str,
    events: u64,
    message: Option<&'a str>,
    colors: ThemeColors,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a str, elapsed: &'a str, events: u64, colors: ThemeColors) -> Self {
        Self {
            state,
            elapsed,
            events,
            message: None,
            colors,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Background
        let bg_style = Style::default().bg(self.colors.bar_bg).fg(self.colors.fg);
        buf.set_style(area, bg_style);

        // Left side: state and quit hint
        let left = format!(" {} | Ctrl+C quit ", self.state);
        buf.set_string(area.x, area.y, &left, bg_style.add_modifier(Modifier::BOLD));

        // Center: message if any
        if let Some(msg) = self.message {
            let msg_style = bg_style.fg(self.colors.warning);
            let msg_x = area.x + (area.width / 2).saturating_sub(msg.len() as u16 / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        // Right side: elapsed time and events
        let right = format!(" {} | Events: {} ", self.elapsed, self.events);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut text = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn render_panel(background: BackgroundState) -> Buffer {
        let area = Rect::new(0, 0, 40, 7);
        let mut buf = Buffer::empty(area);
        CounterPanel::new(["q", "ctrl+e"], RoleMap::new(3, 12), ThemeColors::dark())
            .delays(RoleMap::new(2.5, 2.1))
            .background(background)
            .render(area, &mut buf);
        buf
    }

    #[test]
    fn panel_shows_keys_counts_and_delays() {
        let text = buffer_text(&render_panel(BackgroundState::Idle));
        assert!(text.contains("Key Counter"));
        assert!(text.contains("Q"));
        assert!(text.contains("CTRL+E"));
        assert!(text.contains(" 3 "));
        assert!(text.contains(" 12 "));
        assert!(text.contains("2.5s"));
        assert!(text.contains("2.1s"));
    }

    #[test]
    fn flash_changes_background() {
        let colors = ThemeColors::dark();
        let idle = render_panel(BackgroundState::Idle);
        let flash = render_panel(BackgroundState::Flash(Role::Key2));

        assert_eq!(idle[(5, 3)].bg, colors.bg);
        assert_eq!(flash[(5, 3)].bg, colors.flash);
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        CounterPanel::new(["q", "e"], RoleMap::new(0, 0), ThemeColors::light())
            .render(area, &mut buf);
    }

    #[test]
    fn status_bar_shows_message() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new("RUNNING", "01:05", 42, ThemeColors::dark())
            .message(Some("saved"))
            .render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("RUNNING"));
        assert!(text.contains("saved"));
        assert!(text.contains("Events: 42"));
    }
}
