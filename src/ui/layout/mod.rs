//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::core::state::AppState;

/// Computed rects for every card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedLayout {
    pub header: Rect,
    pub footer: Rect,
    pub cpu: Option<Rect>,
    pub memory: Option<Rect>,
    pub disk: Option<Rect>,
    pub network: Option<Rect>,
    pub gpu: Option<Rect>,
    pub battery: Option<Rect>,
    pub status: Option<Rect>,
    pub overlay_area: Option<Rect>,
}

pub struct LayoutManager;

impl LayoutManager {
    /// Compute all card rects based on terminal size and mode
    pub fn compute(area: Rect, state: &AppState) -> ComputedLayout {
        if state.collapsed {
            Self::collapsed_layout(area)
        } else {
            Self::dashboard_layout(area)
        }
    }

    fn dashboard_layout(area: Rect) -> ComputedLayout {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(9), // CPU, RAM, Disk
                Constraint::Length(6), // Network, GPU, Battery
                Constraint::Min(5),    // Alerts and health
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let gauges = Self::thirds(main_chunks[1]);
        let details = Self::thirds(main_chunks[2]);

        ComputedLayout {
            header: main_chunks[0],
            footer: main_chunks[4],
            cpu: Some(gauges[0]),
            memory: Some(gauges[1]),
            disk: Some(gauges[2]),
            network: Some(details[0]),
            gpu: Some(details[1]),
            battery: Some(details[2]),
            status: Some(main_chunks[3]),
            overlay_area: Some(Self::centered_rect(60, 70, area)),
        }
    }

    fn collapsed_layout(area: Rect) -> ComputedLayout {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        ComputedLayout {
            header: chunks[0],
            footer: chunks[2],
            overlay_area: Some(Self::centered_rect(60, 70, area)),
            ..Default::default()
        }
    }

    fn thirds(area: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);
        [chunks[0], chunks[1], chunks[2]]
    }

    /// Create a centered rect with given percentage width/height
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::Theme;

    #[test]
    fn dashboard_places_every_card() {
        let state = AppState::new(Theme::default());
        let layout = LayoutManager::compute(Rect::new(0, 0, 120, 40), &state);

        assert_eq!(layout.header, Rect::new(0, 0, 120, 1));
        assert_eq!(layout.footer.y, 39);
        for card in [layout.cpu, layout.memory, layout.disk, layout.network, layout.gpu, layout.battery, layout.status] {
            assert!(card.is_some_and(|r| r.width > 0 && r.height > 0));
        }
    }

    #[test]
    fn collapsed_keeps_only_header_and_footer() {
        let mut state = AppState::new(Theme::default());
        state.collapsed = true;
        let layout = LayoutManager::compute(Rect::new(0, 0, 80, 24), &state);

        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.cpu, None);
        assert_eq!(layout.status, None);
    }
}
