//! Network, GPU and battery cards

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use super::card;
use crate::core::state::AppState;
use crate::monitor::format::{format_speed, PLACEHOLDER};
use crate::ui::theme::Theme;

/// Write `lines` top to bottom inside a titled card.
fn render_card(title: &str, lines: Vec<Line<'_>>, theme: &Theme, area: Rect, buf: &mut Buffer) {
    let block = card(title, theme);
    let inner = block.inner(area);
    block.render(area, buf);

    for (line, y) in lines.iter().zip(inner.y..inner.bottom()) {
        buf.set_line(inner.x, y, line, inner.width);
    }
}

pub struct NetworkCard<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> NetworkCard<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for NetworkCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let network = &self.state.metrics.display.network;
        let styles = &self.theme.styles;

        let lines = match &network.interface {
            Some(name) => vec![
                Line::from(Span::styled(name.clone(), styles.label)),
                Line::from(vec![
                    Span::styled("↓ ", styles.level_ok),
                    Span::styled(format_speed(network.rate.inbound), styles.value),
                ]),
                Line::from(vec![
                    Span::styled("↑ ", styles.notification_info),
                    Span::styled(format_speed(network.rate.outbound), styles.value),
                ]),
            ],
            None => vec![Line::from(Span::styled(PLACEHOLDER, styles.muted))],
        };
        render_card(" NETWORK ", lines, self.theme, area, buf);
    }
}

pub struct GpuCard<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> GpuCard<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for GpuCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let gpus = &self.state.metrics.display.gpus;
        let styles = &self.theme.styles;

        let lines = if gpus.is_empty() {
            vec![Line::from(Span::styled("No GPU detected", styles.muted))]
        } else {
            gpus.iter()
                .map(|gpu| {
                    let mut spans = vec![
                        Span::styled(format!("{} ", gpu.vendor), styles.label),
                        Span::styled(gpu.model.clone(), styles.value),
                    ];
                    if let Some(vram) = gpu.vram_mb {
                        spans.push(Span::styled(format!(" {} MB", vram), styles.muted));
                    }
                    Line::from(spans)
                })
                .collect()
        };
        render_card(" GPU ", lines, self.theme, area, buf);
    }
}

pub struct BatteryCard<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> BatteryCard<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for BatteryCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let styles = &self.theme.styles;

        let lines = match &self.state.metrics.display.battery {
            Some(battery) => {
                let percent = battery.percent.clamp(0.0, 100.0).round() as u8;
                // low charge is the alarming end
                let style = self.theme.usage_style(Some(100 - percent));
                let status = if battery.charging { "charging" } else { "on battery" };
                let mut lines = vec![Line::from(vec![
                    Span::styled(format!("{}% ", percent), style),
                    Span::styled(status, styles.label),
                ])];
                if let Some(minutes) = battery.minutes_remaining {
                    lines.push(Line::from(Span::styled(
                        format!("{}h {:02}m remaining", minutes / 60, minutes % 60),
                        styles.muted,
                    )));
                }
                lines
            }
            None => vec![Line::from(Span::styled("No battery", styles.muted))],
        };
        render_card(" BATTERY ", lines, self.theme, area, buf);
    }
}
