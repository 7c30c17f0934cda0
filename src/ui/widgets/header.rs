//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::AppState;
use crate::monitor::format::{format_uptime, PLACEHOLDER};
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.header);

        let colors = &self.theme.colors;
        let separator = || Span::styled(" │ ", Style::default().fg(colors.fg_muted));
        let flag = |name: &'static str, on: bool| {
            let style = if on {
                self.theme.styles.level_ok
            } else {
                self.theme.styles.muted
            };
            Span::styled(format!("{} {}", name, if on { "on" } else { "off" }), style)
        };

        let uptime = self
            .state
            .metrics
            .display
            .uptime_secs
            .map(format_uptime)
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let mut spans = vec![
            Span::styled(
                " 🚀 RocketRAM ",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            separator(),
            Span::styled("up ", Style::default().fg(colors.fg_muted)),
            Span::styled(uptime, Style::default().fg(colors.fg)),
            separator(),
            flag("alerts", self.state.alerts_enabled),
            separator(),
            flag("notify", self.state.desktop_notifications),
        ];
        if self.state.collapsed {
            spans.push(separator());
            spans.push(Span::styled("collapsed", self.theme.styles.keybind_key));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        // Clock on the right
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let time_x = area.x + area.width.saturating_sub(time.len() as u16 + 1);
        buf.set_span(
            time_x,
            area.y,
            &Span::styled(&time, Style::default().fg(colors.fg_muted)),
            time.len() as u16,
        );
    }
}
