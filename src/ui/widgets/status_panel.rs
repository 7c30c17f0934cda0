//! Alert states and the health score

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use super::card;
use crate::core::state::{AlertStatus, AppState};
use crate::monitor::alert::AlertPhase;
use crate::monitor::health::{HealthGrade, RecommendationKind};
use crate::ui::theme::Theme;

pub struct StatusPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> StatusPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn alert_line(&self, status: &AlertStatus) -> Line<'static> {
        let styles = &self.theme.styles;
        let (marker, text, style) = match status.phase {
            AlertPhase::Idle => ("●", "ok".to_string(), styles.level_ok),
            AlertPhase::Breaching => (
                "●",
                format!("over threshold {}s", status.breach_secs.unwrap_or(0)),
                styles.level_warn,
            ),
            AlertPhase::Notified => (
                "●",
                format!("alerted, {}s", status.breach_secs.unwrap_or(0)),
                styles.level_critical,
            ),
        };
        Line::from(vec![
            Span::styled(format!("{} ", marker), style),
            Span::styled(format!("{:<5}", status.kind.label()), styles.label),
            Span::styled(text, style),
        ])
    }

    fn render_alerts(&self, area: Rect, buf: &mut Buffer) {
        let block = card(" ALERTS ", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = if self.state.alerts_enabled {
            self.state
                .metrics
                .alerts
                .iter()
                .map(|s| self.alert_line(s))
                .collect()
        } else {
            vec![Line::from(Span::styled(
                "Alerts disabled (a to enable)",
                self.theme.styles.muted,
            ))]
        };

        for (line, y) in lines.iter().zip(inner.y..inner.bottom()) {
            buf.set_line(inner.x, y, line, inner.width);
        }
    }

    fn render_health(&self, area: Rect, buf: &mut Buffer) {
        let block = card(" HEALTH ", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let styles = &self.theme.styles;
        let Some(report) = &self.state.metrics.health else {
            buf.set_span(inner.x, inner.y, &Span::styled("--", styles.muted), inner.width);
            return;
        };

        let (grade, grade_style) = match report.grade {
            HealthGrade::Good => ("good", styles.level_ok),
            HealthGrade::Fair => ("fair", styles.level_warn),
            HealthGrade::Poor => ("poor", styles.level_critical),
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{}/100 ", report.score), styles.value),
            Span::styled(grade, grade_style),
        ])];
        lines.extend(report.recommendations.iter().map(|r| {
            let style: Style = match r.kind {
                RecommendationKind::Good => styles.level_ok,
                RecommendationKind::Warning => styles.level_warn,
            };
            Line::from(Span::styled(format!("• {}", r.text), style))
        }));

        for (line, y) in lines.iter().zip(inner.y..inner.bottom()) {
            buf.set_line(inner.x, y, line, inner.width);
        }
    }
}

impl<'a> Widget for StatusPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        self.render_alerts(chunks[0], buf);
        self.render_health(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::alert::AlertKind;
    use crate::monitor::health::{assess, HealthInputs};

    fn render(state: &AppState) -> String {
        let area = Rect::new(0, 0, 100, 8);
        let mut buf = Buffer::empty(area);
        StatusPanel::new(state, &state.theme).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_alert_phases_and_score() {
        let mut state = AppState::new(Theme::default());
        state.metrics.alerts = vec![
            AlertStatus {
                kind: AlertKind::Cpu,
                phase: AlertPhase::Breaching,
                breach_secs: Some(12),
            },
            AlertStatus {
                kind: AlertKind::Ram,
                phase: AlertPhase::Idle,
                breach_secs: None,
            },
        ];
        state.metrics.health = Some(assess(&HealthInputs {
            cpu_percent: Some(95.0),
            ..HealthInputs::default()
        }));

        let text = render(&state);
        assert!(text.contains("over threshold 12s"));
        assert!(text.contains("80/100"));
    }

    #[test]
    fn disabled_alerts_are_explained() {
        let mut state = AppState::new(Theme::default());
        state.alerts_enabled = false;
        assert!(render(&state).contains("Alerts disabled"));
    }
}
