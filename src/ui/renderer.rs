//! Main UI renderer

use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Paragraph},
    Frame,
};

use crate::core::state::{AppMode, AppState, NotificationLevel};
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = frame.area();
        let theme = &state.theme;

        // Clear background
        frame.render_widget(Block::default().style(Style::default().bg(theme.colors.bg)), area);

        let layout = LayoutManager::compute(area, state);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(Footer::new(state, theme), layout.footer);

        if let Some(cpu) = layout.cpu {
            frame.render_widget(MetricsPanel::new(state, theme, UsageMetric::Cpu), cpu);
        }
        if let Some(memory) = layout.memory {
            frame.render_widget(MetricsPanel::new(state, theme, UsageMetric::Memory), memory);
        }
        if let Some(disk) = layout.disk {
            frame.render_widget(MetricsPanel::new(state, theme, UsageMetric::Disk), disk);
        }
        if let Some(network) = layout.network {
            frame.render_widget(NetworkCard::new(state, theme), network);
        }
        if let Some(gpu) = layout.gpu {
            frame.render_widget(GpuCard::new(state, theme), gpu);
        }
        if let Some(battery) = layout.battery {
            frame.render_widget(BatteryCard::new(state, theme), battery);
        }
        if let Some(status) = layout.status {
            frame.render_widget(StatusPanel::new(state, theme), status);
        }

        if state.mode == AppMode::Help {
            if let Some(overlay_area) = layout.overlay_area {
                frame.render_widget(HelpOverlay::new(theme), overlay_area);
            }
        }

        Self::render_notifications(frame, state);
    }

    fn render_notifications(frame: &mut Frame, state: &AppState) {
        let theme = &state.theme;
        let area = frame.area();

        // Toasts stack in the top-right corner
        let mut y = area.y + 2;
        for notification in state.notifications.iter().rev().take(3) {
            if y >= area.bottom() {
                break;
            }
            let (icon, style) = match notification.level {
                NotificationLevel::Info => ("ℹ", theme.styles.notification_info),
                NotificationLevel::Warning => ("⚠", theme.styles.level_warn),
            };

            let msg = format!(" {} {} ", icon, notification.message);
            let width = (msg.chars().count() as u16).min(60).min(area.width);
            let x = area.x + area.width.saturating_sub(width + 2);

            frame.render_widget(
                Paragraph::new(Span::styled(msg, style))
                    .style(Style::default().bg(theme.colors.bg_panel)),
                Rect {
                    x,
                    y,
                    width,
                    height: 1,
                },
            );

            y += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::Theme;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| Renderer::render(f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn dashboard_draws_every_card() {
        let state = AppState::new(Theme::default());
        let screen = draw(&state);
        for title in ["CPU", "MEMORY", "DISK", "NETWORK", "GPU", "BATTERY", "ALERTS", "HEALTH"] {
            assert!(screen.contains(title), "missing {}", title);
        }
    }

    #[test]
    fn collapsed_draws_header_only() {
        let mut state = AppState::new(Theme::default());
        state.collapsed = true;
        let screen = draw(&state);
        assert!(screen.contains("RocketRAM"));
        assert!(!screen.contains("MEMORY"));
    }

    #[test]
    fn help_and_toasts() {
        let mut state = AppState::new(Theme::default());
        state.mode = AppMode::Help;
        state.add_notification("High CPU Usage".into(), NotificationLevel::Warning);
        let screen = draw(&state);
        assert!(screen.contains("Help"));
        assert!(screen.contains("Theme: Tokyo Night"));
        assert!(screen.contains("High CPU Usage"));
    }
}
