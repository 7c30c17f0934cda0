//! Application state shared between the event loop and the renderer

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

use crate::monitor::alert::{AlertKind, AlertPhase};
use crate::monitor::health::HealthReport;
use crate::monitor::{DisplayMetrics, MetricsMonitor};
use crate::ui::theme::Theme;

/// Top-level application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Normal dashboard view
    #[default]
    Dashboard,
    /// Help overlay showing
    Help,
}

/// Alert status of one metric as shown in the alerts panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertStatus {
    pub kind: AlertKind,
    pub phase: AlertPhase,
    pub breach_secs: Option<u64>,
}

/// Everything the metric widgets draw
#[derive(Debug, Clone, Default)]
pub struct MetricsPanelState {
    pub display: DisplayMetrics,
    pub health: Option<HealthReport>,
    pub alerts: Vec<AlertStatus>,
    pub last_updated: Option<chrono::DateTime<chrono::Local>>,
}

impl MetricsPanelState {
    /// Copy the monitor's current view.
    pub fn sync(&mut self, monitor: &MetricsMonitor, now: Instant) {
        self.display = monitor.display().clone();
        self.health = Some(monitor.health());
        self.alerts = AlertKind::ALL
            .iter()
            .map(|&kind| {
                let state = monitor.alerts().state(kind);
                AlertStatus {
                    kind,
                    phase: state.phase(),
                    breach_secs: state.breach_duration(now).map(|d| d.as_secs()),
                }
            })
            .collect();
        self.last_updated = Some(chrono::Local::now());
    }
}

/// Notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: uuid::Uuid,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    /// Only the header is drawn and only uptime is sampled.
    pub collapsed: bool,
    pub alerts_enabled: bool,
    pub desktop_notifications: bool,
    pub metrics: MetricsPanelState,
    pub theme: Theme,
    pub notifications: Vec<Notification>,
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            mode: AppMode::Dashboard,
            collapsed: false,
            alerts_enabled: true,
            desktop_notifications: true,
            metrics: MetricsPanelState::default(),
            theme,
            notifications: Vec::new(),
        }
    }

    pub fn add_notification(&mut self, message: String, level: NotificationLevel) -> uuid::Uuid {
        let notification = Notification {
            id: uuid::Uuid::new_v4(),
            message,
            level,
            created_at: chrono::Utc::now(),
            duration_ms: 5000,
        };
        let id = notification.id;
        self.notifications.push(notification);
        id
    }

    pub fn remove_expired_notifications(&mut self) {
        let now = chrono::Utc::now();
        self.notifications.retain(|n| {
            let elapsed = now.signed_duration_since(n.created_at).num_milliseconds();
            elapsed < n.duration_ms as i64
        });
    }
}

/// Thread-safe state store
#[derive(Clone)]
pub struct StateStore {
    state: Arc<RwLock<AppState>>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// Atomic state mutation
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut AppState) -> R,
    {
        mutator(&mut self.state.write())
    }

    /// Read current state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.state.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn updates_are_visible_to_clones() {
        let store = StateStore::new(AppState::new(Theme::default()));
        let renderer_view = store.clone();

        let previous = store.update(|s| std::mem::replace(&mut s.collapsed, true));

        assert!(!previous);
        assert!(renderer_view.read().collapsed);
    }

    #[test]
    fn expired_notifications_are_dropped() {
        let mut state = AppState::new(Theme::default());
        state.add_notification("fresh".into(), NotificationLevel::Info);
        let stale = state.add_notification("stale".into(), NotificationLevel::Warning);
        if let Some(n) = state.notifications.iter_mut().find(|n| n.id == stale) {
            n.created_at -= chrono::Duration::seconds(10);
        }

        state.remove_expired_notifications();
        let messages: Vec<&str> = state.notifications.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["fresh"]);
    }

    #[test]
    fn sync_reports_every_alert() {
        let monitor = MetricsMonitor::new(Duration::from_secs(1), Duration::from_secs(5));
        let mut panel = MetricsPanelState::default();
        panel.sync(&monitor, Instant::now());

        assert_eq!(panel.alerts.len(), 3);
        assert!(panel.alerts.iter().all(|a| a.phase == AlertPhase::Idle));
        assert_eq!(panel.health.map(|h| h.score), Some(100));
    }
}
