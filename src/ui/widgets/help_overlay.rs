//! Help overlay widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Widget},
};

use super::card;
use crate::ui::theme::Theme;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("q / Ctrl-C", "Quit"),
            ("?", "Toggle help"),
            ("Esc", "Close overlay"),
        ],
    ),
    (
        "Dashboard",
        &[
            ("c", "Collapse to the header (pauses sampling)"),
            ("a", "Enable or disable threshold alerts"),
            ("n", "Enable or disable desktop notifications"),
        ],
    ),
];

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = card(" 🚀 RocketRAM Help ", self.theme)
            .style(Style::default().bg(self.theme.colors.bg_panel));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = Vec::new();
        for (section, bindings) in SECTIONS {
            lines.push(Line::from(Span::styled(
                format!("─── {} ", section),
                self.theme.styles.panel_title,
            )));
            for (key, desc) in bindings.iter() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:>10}  ", key), self.theme.styles.keybind_key),
                    Span::styled(*desc, self.theme.styles.keybind),
                ]));
            }
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            format!("Theme: {}", self.theme.name),
            self.theme.styles.muted,
        )));

        for (line, y) in lines.iter().zip(inner.y..inner.bottom()) {
            buf.set_line(inner.x + 1, y, line, inner.width.saturating_sub(2));
        }

        if area.height > 1 && area.width > 25 {
            let footer = Span::styled(" Press Esc or ? to close ", self.theme.styles.muted);
            buf.set_span(area.x + (area.width - 25) / 2, area.bottom() - 1, &footer, 25);
        }
    }
}
