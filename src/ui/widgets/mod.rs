//! UI Widgets

pub mod details_panel;
pub mod footer;
pub mod header;
pub mod help_overlay;
pub mod metrics_panel;
pub mod status_panel;

pub use details_panel::{BatteryCard, GpuCard, NetworkCard};
pub use footer::Footer;
pub use header::Header;
pub use help_overlay::HelpOverlay;
pub use metrics_panel::{MetricsPanel, UsageMetric};
pub use status_panel::StatusPanel;

use ratatui::{
    style::Style,
    text::Span,
    widgets::{Block, Borders},
};

use crate::ui::theme::Theme;

/// Bordered card with a title, shared by every panel.
fn card<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(title, theme.styles.panel_title))
        .borders(Borders::ALL)
        .border_style(theme.styles.panel_border)
        .style(Style::default().bg(theme.colors.bg))
}

/// Horizontal usage bar, `width` cells wide.
pub fn usage_bar(percent: Option<u8>, width: usize) -> String {
    let filled = percent
        .map(|p| (usize::from(p.min(100)) * width + 50) / 100)
        .unwrap_or(0);
    "█".repeat(filled) + &"░".repeat(width - filled)
}
