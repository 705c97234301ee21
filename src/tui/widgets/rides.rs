//! Ride option table widget

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;
use crate::types::RideOption;

/// Table width: marker(2) + Provider(10) + Ride(24) + Fare(12) + ETA(10) = 58
pub const TABLE_WIDTH: u16 = 58;

/// Truncate `text` to `width` chars, ending with '…' when cut
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// First row index to show so that `selected` stays inside `visible` rows
pub fn scroll_offset(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        return 0;
    }
    (selected + 1).saturating_sub(visible)
}

/// Table of ride options with an optional selected row
pub struct RideTable<'a> {
    options: &'a [RideOption],
    selected: Option<usize>,
    theme: Theme,
    empty_message: &'a str,
}

impl<'a> RideTable<'a> {
    pub fn new(options: &'a [RideOption], theme: Theme) -> Self {
        Self {
            options,
            selected: None,
            theme,
            empty_message: "No rides available",
        }
    }

    pub fn with_selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }

    fn table_area(area: Rect) -> Rect {
        let offset = area.width.saturating_sub(TABLE_WIDTH) / 2;
        Rect {
            x: area.x + offset,
            y: area.y,
            width: TABLE_WIDTH.min(area.width),
            height: area.height,
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let bold = Style::default()
            .fg(self.theme.text())
            .add_modifier(Modifier::BOLD);
        let header = Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{:<10}", "Provider"), bold),
            Span::styled(format!("{:<24}", "Ride"), bold),
            Span::styled(format!("{:>12}", "Fare"), bold),
            Span::styled(format!("{:>10}", "ETA"), bold),
        ]);
        Paragraph::new(header)
            .alignment(Alignment::Left)
            .render(area, buf);
    }

    fn render_row(&self, option: &RideOption, selected: bool, area: Rect, buf: &mut Buffer) {
        let base = if selected {
            Style::default().bg(self.theme.selection())
        } else {
            Style::default()
        };
        let marker = if selected { "▶ " } else { "  " };
        let eta = if option.eta > 0 {
            format!("{} min", option.eta)
        } else {
            option.display_eta.clone()
        };

        let line = Line::from(vec![
            Span::styled(marker, base.fg(self.theme.accent())),
            Span::styled(
                format!("{:<10}", option.provider.name()),
                base.fg(self.theme.provider_color(option.provider))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:<24}", truncate(&option.ride_type, 23)),
                base.fg(self.theme.text()),
            ),
            Span::styled(
                format!("{:>12}", truncate(&option.display_price, 12)),
                base.fg(self.theme.price()),
            ),
            Span::styled(format!("{:>10}", eta), base.fg(self.theme.eta())),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Left)
            .style(base)
            .render(area, buf);
    }
}

impl Widget for RideTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let table = Self::table_area(area);

        self.render_header(Rect { height: 1, ..table }, buf);

        if self.options.is_empty() {
            if area.height > 1 {
                buf.set_string(
                    table.x + 2,
                    table.y + 1,
                    self.empty_message,
                    Style::default().fg(self.theme.muted()),
                );
            }
            return;
        }

        let visible = area.height.saturating_sub(1) as usize;
        let first = self
            .selected
            .map(|s| scroll_offset(s, visible))
            .unwrap_or(0);

        for (row, (index, option)) in self
            .options
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .enumerate()
        {
            let row_area = Rect {
                y: table.y + 1 + row as u16,
                height: 1,
                ..table
            };
            self.render_row(option, self.selected == Some(index), row_area, buf);
        }
    }
}
