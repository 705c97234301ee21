//! Help popup widget - displays keyboard shortcuts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Width and height of the help popup
const POPUP_WIDTH: u16 = 46;
const POPUP_HEIGHT: u16 = 22;

const RIDE_KEYS: &[(&str, &str)] = &[
    ("Up/Down or j/k", "Select ride"),
    ("Enter", "Book selected ride"),
    ("p / t", "Sort by price / time"),
    ("o", "Flip sort order"),
    ("1 / 2 / 3", "Only Uber / Ola / Rapido"),
    ("0", "All providers"),
    ("s", "Toggle recommended"),
];

const GENERAL_KEYS: &[(&str, &str)] = &[
    ("r", "Refresh prices"),
    ("x", "Swap pickup and drop"),
    ("q / Esc", "Quit"),
    ("?", "Toggle help"),
];

/// Help popup widget showing keyboard shortcuts
pub struct HelpPopup {
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Calculate centered popup area
    pub fn centered_area(area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(POPUP_HEIGHT)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: POPUP_HEIGHT.min(area.height),
        }
    }

    fn render_section(
        &self,
        title: &str,
        keys: &[(&str, &str)],
        rows: &[Rect],
        buf: &mut Buffer,
    ) {
        let Some((header, rest)) = rows.split_first() else {
            return;
        };
        let header_line = Line::from(vec![Span::styled(
            title.to_string(),
            Style::default()
                .fg(self.theme.eta())
                .add_modifier(Modifier::BOLD),
        )]);
        Paragraph::new(header_line)
            .alignment(Alignment::Left)
            .render(*header, buf);

        let Some((sep_area, key_rows)) = rest.split_first() else {
            return;
        };
        let sep = "─".repeat(sep_area.width as usize);
        buf.set_string(
            sep_area.x,
            sep_area.y,
            &sep,
            Style::default().fg(self.theme.muted()),
        );

        for ((key, desc), row) in keys.iter().zip(key_rows) {
            render_keybinding(*row, buf, key, desc, self.theme);
        }
    }
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear the area first (for overlay effect)
        Clear.render(area, buf);

        let title = format!(" ridecompare v{} ", VERSION);
        let block = Block::default()
            .title(title)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()));

        let inner = block.inner(area);
        block.render(area, buf);

        // padding, rides section, gap, general section, gap, hint
        let rows =
            Layout::vertical([Constraint::Length(1); POPUP_HEIGHT as usize - 2]).split(inner);

        let rides_start = 1;
        let rides_end = rides_start + 2 + RIDE_KEYS.len();
        let general_start = rides_end + 1;
        let general_end = general_start + 2 + GENERAL_KEYS.len();

        if rows.len() > rides_end {
            self.render_section("Rides", RIDE_KEYS, &rows[rides_start..rides_end], buf);
        }
        if rows.len() > general_end {
            self.render_section(
                "General",
                GENERAL_KEYS,
                &rows[general_start..general_end],
                buf,
            );
        }

        if let Some(hint_area) = rows.get(general_end + 1) {
            let hint = Line::from(vec![Span::styled(
                "Press ? to close",
                Style::default().fg(self.theme.muted()),
            )]);
            Paragraph::new(hint)
                .alignment(Alignment::Center)
                .render(*hint_area, buf);
        }
    }
}

/// Render a single keybinding line
fn render_keybinding(area: Rect, buf: &mut Buffer, key: &str, desc: &str, theme: Theme) {
    let line = Line::from(vec![
        Span::styled(
            format!("  {:<18}", key),
            Style::default().fg(theme.accent()),
        ),
        Span::styled(desc.to_string(), Style::default().fg(theme.text())),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Left)
        .render(area, buf);
}
