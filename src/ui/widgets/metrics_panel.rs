//! Usage cards for CPU, memory and the system drive

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Sparkline, Widget},
};

use super::{card, usage_bar};
use crate::core::state::AppState;
use crate::monitor::format::{format_bytes, format_percent, format_speed, PLACEHOLDER};
use crate::monitor::window::normalize_percentages;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageMetric {
    Cpu,
    Memory,
    Disk,
}

impl UsageMetric {
    fn title(self) -> &'static str {
        match self {
            Self::Cpu => " CPU ",
            Self::Memory => " MEMORY ",
            Self::Disk => " DISK ",
        }
    }
}

pub struct MetricsPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
    metric: UsageMetric,
}

impl<'a> MetricsPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme, metric: UsageMetric) -> Self {
        Self {
            state,
            theme,
            metric,
        }
    }

    fn percent(&self) -> Option<u8> {
        let display = &self.state.metrics.display;
        match self.metric {
            UsageMetric::Cpu => display.cpu.percent,
            UsageMetric::Memory => display.memory.percent,
            UsageMetric::Disk => display.disk.percent,
        }
    }

    fn history(&self) -> &[f32] {
        let display = &self.state.metrics.display;
        match self.metric {
            UsageMetric::Cpu => &display.cpu.history,
            UsageMetric::Memory => &display.memory.history,
            UsageMetric::Disk => &display.disk.history,
        }
    }

    fn detail_lines(&self) -> Vec<String> {
        let display = &self.state.metrics.display;
        match self.metric {
            UsageMetric::Cpu => {
                let cpu = &display.cpu;
                let mut facts = Vec::new();
                if let Some(cores) = cpu.cores {
                    facts.push(format!("{} cores", cores));
                }
                if let Some(ghz) = cpu.speed_ghz {
                    facts.push(format!("{:.2} GHz", ghz));
                }
                if let Some(temp) = cpu.temperature_c {
                    facts.push(format!("{:.0}°C", temp));
                }
                vec![
                    cpu.brand.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
                    facts.join(" · "),
                ]
            }
            UsageMetric::Memory => match &display.memory.info {
                Some(info) => vec![
                    format!("{} / {}", format_bytes(info.used), format_bytes(info.total)),
                    format!(
                        "avail {} · cached {}",
                        format_bytes(info.available),
                        format_bytes(info.cached)
                    ),
                ],
                None => vec![PLACEHOLDER.to_string()],
            },
            UsageMetric::Disk => {
                let disk = &display.disk;
                let usage = match (disk.used, disk.total) {
                    (Some(used), Some(total)) => {
                        format!("{} / {}", format_bytes(used), format_bytes(total))
                    }
                    _ => PLACEHOLDER.to_string(),
                };
                vec![
                    format!("{} {}", disk.mount.as_deref().unwrap_or(""), usage)
                        .trim()
                        .to_string(),
                    format!(
                        "R {} · W {}",
                        format_speed(disk.io.inbound),
                        format_speed(disk.io.outbound)
                    ),
                ]
            }
        }
    }
}

impl<'a> Widget for MetricsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = card(self.metric.title(), self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width < 8 {
            return;
        }

        let percent = self.percent();
        let style = self.theme.usage_style(percent);
        let label = format!("{:>4} ", format_percent(percent));
        let bar_width = inner.width.saturating_sub(label.len() as u16 + 1) as usize;
        let gauge = Line::from(vec![
            Span::styled(label, style),
            Span::styled(usage_bar(percent, bar_width), style),
        ]);
        buf.set_line(inner.x, inner.y, &gauge, inner.width);

        let mut y = inner.y + 1;
        for detail in self.detail_lines() {
            if y >= inner.bottom() {
                return;
            }
            buf.set_span(
                inner.x,
                y,
                &Span::styled(detail, self.theme.styles.label),
                inner.width,
            );
            y += 1;
        }

        if y >= inner.bottom() {
            return;
        }
        // newest points on the right
        let width = usize::from(inner.width);
        let points: Vec<u64> = normalize_percentages(self.history())
            .into_iter()
            .map(|v| (v * 100.0).round() as u64)
            .collect();
        let recent = &points[points.len().saturating_sub(width)..];
        Sparkline::default()
            .data(recent)
            .max(100)
            .style(self.theme.styles.sparkline)
            .render(
                Rect {
                    y,
                    height: inner.bottom() - y,
                    ..inner
                },
                buf,
            );
    }
}
