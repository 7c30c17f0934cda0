//! Debounced threshold alerting for CPU, RAM and disk free space.
//!
//! Each metric moves `Idle -> Breaching -> Notified` while its value stays
//! past the threshold, and drops straight back to `Idle` as soon as one
//! reading recovers. A notification fires once per excursion, after the
//! breach has lasted the configured duration.

use std::fmt;
use std::time::{Duration, Instant};

/// Metrics with alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Cpu,
    Ram,
    Disk,
}

impl AlertKind {
    pub const ALL: [AlertKind; 3] = [AlertKind::Cpu, AlertKind::Ram, AlertKind::Disk];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Ram => "RAM",
            Self::Disk => "Disk",
        }
    }

    /// Whether `value` is past `threshold` in the unsafe direction.
    ///
    /// CPU and RAM values are usage percentages. The disk value is the used
    /// percentage too, but the disk threshold is on free space.
    pub fn breaches(self, value: f32, threshold: f32) -> bool {
        match self {
            Self::Cpu | Self::Ram => value > threshold,
            Self::Disk => (100.0 - value) < threshold,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert settings for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    pub enabled: bool,
    pub cpu_threshold: f32,
    pub ram_threshold: f32,
    /// Percent free below which the disk alert trips.
    pub disk_free_threshold: f32,
    /// Shared by all three metrics.
    pub duration: Duration,
}

impl AlertConfig {
    pub fn threshold(&self, kind: AlertKind) -> f32 {
        match kind {
            AlertKind::Cpu => self.cpu_threshold,
            AlertKind::Ram => self.ram_threshold,
            AlertKind::Disk => self.disk_free_threshold,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cpu_threshold: 90.0,
            ram_threshold: 85.0,
            disk_free_threshold: 10.0,
            duration: Duration::from_secs(30),
        }
    }
}

/// Current readings fed into one evaluation. `None` means the query failed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlertReadings {
    pub cpu_percent: Option<f32>,
    pub ram_percent: Option<f32>,
    pub disk_used_percent: Option<f32>,
}

impl AlertReadings {
    pub fn get(&self, kind: AlertKind) -> Option<f32> {
        match kind {
            AlertKind::Cpu => self.cpu_percent,
            AlertKind::Ram => self.ram_percent,
            AlertKind::Disk => self.disk_used_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Idle,
    Breaching,
    Notified,
}

/// Per-metric alert state.
///
/// `start` is set exactly while the alert is active and `notified` can only
/// be true while active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    active: bool,
    start: Option<Instant>,
    notified: bool,
}

impl AlertState {
    pub fn phase(&self) -> AlertPhase {
        match (self.active, self.notified) {
            (false, _) => AlertPhase::Idle,
            (true, false) => AlertPhase::Breaching,
            (true, true) => AlertPhase::Notified,
        }
    }

    /// How long the current breach has lasted.
    pub fn breach_duration(&self, now: Instant) -> Option<Duration> {
        self.start.map(|start| now.saturating_duration_since(start))
    }

    fn begin(&mut self, now: Instant) {
        self.active = true;
        self.start = Some(now);
        self.notified = false;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A sustained breach that should be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    /// The reading that was compared (used percent for all metrics).
    pub value: f32,
    pub threshold: f32,
    pub sustained: Duration,
}

impl AlertEvent {
    pub fn title(&self) -> String {
        match self.kind {
            AlertKind::Cpu => "High CPU Usage".to_string(),
            AlertKind::Ram => "High Memory Usage".to_string(),
            AlertKind::Disk => "Low Disk Space".to_string(),
        }
    }

    pub fn body(&self) -> String {
        let secs = self.sustained.as_secs();
        match self.kind {
            AlertKind::Cpu | AlertKind::Ram => format!(
                "{} usage at {:.0}% has stayed above {:.0}% for {}s",
                self.kind, self.value, self.threshold, secs
            ),
            AlertKind::Disk => format!(
                "Only {:.0}% disk space free (alert below {:.0}%) for {}s",
                (100.0 - self.value).max(0.0),
                self.threshold,
                secs
            ),
        }
    }
}

/// Alert state for every monitored metric.
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    cpu: AlertState,
    ram: AlertState,
    disk: AlertState,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, kind: AlertKind) -> &AlertState {
        match kind {
            AlertKind::Cpu => &self.cpu,
            AlertKind::Ram => &self.ram,
            AlertKind::Disk => &self.disk,
        }
    }

    fn state_mut(&mut self, kind: AlertKind) -> &mut AlertState {
        match kind {
            AlertKind::Cpu => &mut self.cpu,
            AlertKind::Ram => &mut self.ram,
            AlertKind::Disk => &mut self.disk,
        }
    }

    pub fn reset_all(&mut self) {
        for kind in AlertKind::ALL {
            self.state_mut(kind).reset();
        }
    }

    /// Run one tick of the state machine for every metric.
    pub fn evaluate(
        &mut self,
        readings: &AlertReadings,
        config: &AlertConfig,
        now: Instant,
    ) -> Vec<AlertEvent> {
        if !config.enabled {
            self.reset_all();
            return Vec::new();
        }

        AlertKind::ALL
            .into_iter()
            .filter_map(|kind| self.step(kind, readings.get(kind), config, now))
            .collect()
    }

    fn step(
        &mut self,
        kind: AlertKind,
        value: Option<f32>,
        config: &AlertConfig,
        now: Instant,
    ) -> Option<AlertEvent> {
        let threshold = config.threshold(kind);
        let state = self.state_mut(kind);

        let Some(value) = value.filter(|v| kind.breaches(*v, threshold)) else {
            if state.active {
                tracing::debug!(metric = %kind, "alert recovered");
            }
            state.reset();
            return None;
        };

        if !state.active {
            tracing::debug!(metric = %kind, value, threshold, "threshold breached");
            state.begin(now);
        }

        let sustained = state.breach_duration(now)?;
        if state.notified || sustained < config.duration {
            return None;
        }

        state.notified = true;
        tracing::info!(metric = %kind, value, threshold, ?sustained, "alert fired");
        Some(AlertEvent {
            kind,
            value,
            threshold,
            sustained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(duration_secs: u64) -> AlertConfig {
        AlertConfig {
            duration: Duration::from_secs(duration_secs),
            ..AlertConfig::default()
        }
    }

    fn cpu(value: f32) -> AlertReadings {
        AlertReadings {
            cpu_percent: Some(value),
            ..AlertReadings::default()
        }
    }

    fn ram(value: f32) -> AlertReadings {
        AlertReadings {
            ram_percent: Some(value),
            ..AlertReadings::default()
        }
    }

    fn disk(used: f32) -> AlertReadings {
        AlertReadings {
            disk_used_percent: Some(used),
            ..AlertReadings::default()
        }
    }

    /// Feed one reading per second and return the seconds at which events fired.
    fn run(
        engine: &mut AlertEngine,
        config: &AlertConfig,
        start: Instant,
        ticks: impl IntoIterator<Item = (u64, AlertReadings)>,
    ) -> Vec<(u64, AlertKind)> {
        ticks
            .into_iter()
            .flat_map(|(t, readings)| {
                engine
                    .evaluate(&readings, config, start + Duration::from_secs(t))
                    .into_iter()
                    .map(move |e| (t, e.kind))
            })
            .collect()
    }

    #[test]
    fn sustained_breach_fires_once() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let fired = run(
            &mut engine,
            &config(30),
            start,
            (0..=60).map(|t| (t, cpu(95.0))),
        );
        assert_eq!(fired, vec![(30, AlertKind::Cpu)]);
        assert_eq!(engine.state(AlertKind::Cpu).phase(), AlertPhase::Notified);
    }

    #[test]
    fn recovery_restarts_the_breach_clock() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let ticks = (0..=60).map(|t| {
            let value = if (15..20).contains(&t) { 80.0 } else { 95.0 };
            (t, cpu(value))
        });
        let fired = run(&mut engine, &config(30), start, ticks);
        assert_eq!(fired, vec![(50, AlertKind::Cpu)]);
    }

    #[test]
    fn flickering_never_notifies() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let ticks = (0..=120).map(|t| (t, cpu(if t % 10 == 9 { 50.0 } else { 99.0 })));
        let fired = run(&mut engine, &config(10), start, ticks);
        assert!(fired.is_empty());
    }

    #[test]
    fn ram_scenario() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let config = config(10);
        let ticks = (0..=21).map(|t| (t, ram(if t <= 20 { 90.0 } else { 70.0 })));
        let fired = run(&mut engine, &config, start, ticks);

        assert_eq!(fired, vec![(10, AlertKind::Ram)]);
        assert_eq!(engine.state(AlertKind::Ram), &AlertState::default());
    }

    #[test]
    fn disk_alerts_on_free_space() {
        assert!(AlertKind::Disk.breaches(95.0, 10.0));
        assert!(!AlertKind::Disk.breaches(85.0, 10.0));
        assert!(!AlertKind::Disk.breaches(90.0, 10.0));

        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let fired = run(&mut engine, &config(5), start, (0..=10).map(|t| (t, disk(92.0))));
        assert_eq!(fired, vec![(5, AlertKind::Disk)]);
    }

    #[test]
    fn threshold_is_exclusive_for_usage() {
        assert!(!AlertKind::Cpu.breaches(90.0, 90.0));
        assert!(AlertKind::Cpu.breaches(90.5, 90.0));
    }

    #[test]
    fn state_invariants_hold() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let config = config(3);
        for t in 0..20 {
            let value = if t % 7 < 5 { 97.0 } else { 10.0 };
            engine.evaluate(&cpu(value), &config, start + Duration::from_secs(t));
            let state = engine.state(AlertKind::Cpu);
            assert_eq!(state.start.is_some(), state.active);
            assert!(!state.notified || state.active);
        }
    }

    #[test]
    fn zero_duration_fires_on_first_breach() {
        let mut engine = AlertEngine::new();
        let events = engine.evaluate(&ram(99.0), &config(0), Instant::now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Ram);
    }

    #[test]
    fn missing_reading_resets() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        engine.evaluate(&cpu(99.0), &config(30), start);
        assert!(engine.state(AlertKind::Cpu).active);

        engine.evaluate(&AlertReadings::default(), &config(30), start);
        assert_eq!(engine.state(AlertKind::Cpu).phase(), AlertPhase::Idle);
    }

    #[test]
    fn disabled_alerts_reset_everything() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        engine.evaluate(&cpu(99.0), &config(0), start);
        assert_eq!(engine.state(AlertKind::Cpu).phase(), AlertPhase::Notified);

        let disabled = AlertConfig {
            enabled: false,
            ..config(0)
        };
        let events = engine.evaluate(&cpu(99.0), &disabled, start);
        assert!(events.is_empty());
        assert_eq!(engine.state(AlertKind::Cpu).phase(), AlertPhase::Idle);
    }

    #[test]
    fn metrics_are_independent() {
        let mut engine = AlertEngine::new();
        let start = Instant::now();
        let readings = AlertReadings {
            cpu_percent: Some(95.0),
            ram_percent: Some(50.0),
            disk_used_percent: Some(97.0),
        };
        let fired = run(&mut engine, &config(2), start, (0..=3).map(|t| (t, readings)));
        assert_eq!(fired, vec![(2, AlertKind::Cpu), (2, AlertKind::Disk)]);
        assert_eq!(engine.state(AlertKind::Ram).phase(), AlertPhase::Idle);
    }

    #[test]
    fn notification_text() {
        let event = AlertEvent {
            kind: AlertKind::Disk,
            value: 92.0,
            threshold: 10.0,
            sustained: Duration::from_secs(5),
        };
        assert_eq!(event.title(), "Low Disk Space");
        assert_eq!(
            event.body(),
            "Only 8% disk space free (alert below 10%) for 5s"
        );

        let event = AlertEvent {
            kind: AlertKind::Cpu,
            value: 95.0,
            threshold: 90.0,
            sustained: Duration::from_secs(30),
        };
        assert_eq!(
            event.body(),
            "CPU usage at 95% has stayed above 90% for 30s"
        );
    }
}
