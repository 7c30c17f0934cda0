//! Metric sampling, smoothing and threshold alerting.
//!
//! [`sampler`] produces raw samples, [`MetricsMonitor`] folds them into
//! rolling windows and derived rates, and [`alert`] turns sustained
//! breaches into one notification per excursion.

pub mod alert;
pub mod error;
pub mod format;
pub mod health;
pub mod rate;
pub mod sampler;
pub mod smoothing;
pub mod window;

use serde::Serialize;
use std::time::{Duration, Instant};

use self::alert::{AlertConfig, AlertEngine, AlertEvent, AlertReadings};
use self::format::round_percent;
use self::health::{HealthInputs, HealthReport};
use self::rate::{RateDeriver, Throughput};
use self::sampler::{
    primary_filesystem, BatteryInfo, DiskSample, GpuInfo, MemoryInfo, PrimarySample,
};
use self::smoothing::CpuSmoother;
use self::window::{RollingWindow, GRAPH_POINTS};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuDisplay {
    /// Smoothed load.
    pub percent: Option<u8>,
    pub brand: Option<String>,
    pub cores: Option<usize>,
    pub speed_ghz: Option<f32>,
    pub temperature_c: Option<f32>,
    pub history: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryDisplay {
    pub percent: Option<u8>,
    pub info: Option<MemoryInfo>,
    pub history: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiskDisplay {
    pub percent: Option<u8>,
    pub mount: Option<String>,
    pub used: Option<u64>,
    pub total: Option<u64>,
    pub io: Throughput,
    pub history: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkDisplay {
    pub interface: Option<String>,
    pub rate: Throughput,
}

/// Display-ready values for every metric.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayMetrics {
    pub cpu: CpuDisplay,
    pub memory: MemoryDisplay,
    pub disk: DiskDisplay,
    pub network: NetworkDisplay,
    /// Empty when no GPU was found or the query failed.
    pub gpus: Vec<GpuInfo>,
    pub battery: Option<BatteryInfo>,
    pub uptime_secs: Option<u64>,
    pub process_count: Option<usize>,
}

/// Owns every piece of per-metric state between ticks.
pub struct MetricsMonitor {
    cpu: CpuSmoother,
    /// Latest unsmoothed load, scored by [`MetricsMonitor::health`].
    cpu_raw: Option<f32>,
    cpu_graph: RollingWindow<f32>,
    ram_graph: RollingWindow<f32>,
    disk_graph: RollingWindow<f32>,
    network_rate: RateDeriver,
    disk_rate: RateDeriver,
    alerts: AlertEngine,
    display: DisplayMetrics,
}

impl MetricsMonitor {
    /// `primary_every` and `disk_every` are the tick periods used to turn
    /// counter deltas into per-second rates.
    pub fn new(primary_every: Duration, disk_every: Duration) -> Self {
        Self {
            cpu: CpuSmoother::default(),
            cpu_raw: None,
            cpu_graph: RollingWindow::new(GRAPH_POINTS),
            ram_graph: RollingWindow::new(GRAPH_POINTS),
            disk_graph: RollingWindow::new(GRAPH_POINTS),
            network_rate: RateDeriver::new(primary_every),
            disk_rate: RateDeriver::new(disk_every),
            alerts: AlertEngine::new(),
            display: DisplayMetrics::default(),
        }
    }

    pub fn display(&self) -> &DisplayMetrics {
        &self.display
    }

    pub fn alerts(&self) -> &AlertEngine {
        &self.alerts
    }

    pub fn apply_primary(&mut self, sample: PrimarySample) {
        self.display.uptime_secs = sample.uptime_secs.or(self.display.uptime_secs);
        if sample.collapsed {
            return;
        }

        self.cpu_raw = sample.cpu_load.filter(|v| v.is_finite());
        let cpu = &mut self.display.cpu;
        cpu.percent = match sample.cpu_load {
            Some(raw) => self.cpu.push(raw),
            None => None,
        };
        if let Some(smoothed) = cpu.percent {
            self.cpu_graph.push(f32::from(smoothed));
        }
        cpu.history = self.cpu_graph.to_vec();
        // brand and core count are static, keep the last known values
        if let Some(info) = sample.cpu_info {
            cpu.brand = Some(info.brand);
            cpu.cores = Some(info.cores);
        }
        cpu.speed_ghz = sample.cpu_speed_ghz;
        cpu.temperature_c = sample.cpu_temperature;

        let memory = &mut self.display.memory;
        memory.percent = sample
            .memory
            .and_then(|m| m.used_percent())
            .and_then(round_percent);
        memory.info = sample.memory;
        if let Some(percent) = memory.percent {
            self.ram_graph.push(f32::from(percent));
        }
        memory.history = self.ram_graph.to_vec();

        self.display.network.interface = sample.network.as_ref().map(|n| n.identity.clone());
        self.display.network.rate = self.network_rate.derive(sample.network);

        self.display.gpus = sample.gpus.unwrap_or_default();
        self.display.battery = sample.battery;
    }

    pub fn apply_disk(&mut self, sample: DiskSample) {
        let disk = &mut self.display.disk;
        let primary = sample
            .filesystems
            .as_deref()
            .and_then(primary_filesystem)
            .cloned();

        match primary {
            Some(fs) => {
                disk.percent = fs.used_percent().and_then(round_percent);
                disk.mount = Some(fs.mount);
                disk.used = Some(fs.used);
                disk.total = Some(fs.total);
                if let Some(percent) = disk.percent {
                    self.disk_graph.push(f32::from(percent));
                }
            }
            None => {
                disk.percent = None;
                disk.used = None;
                disk.total = None;
            }
        }
        disk.history = self.disk_graph.to_vec();
        disk.io = self.disk_rate.derive(sample.io);

        self.display.process_count = sample.process_count;
    }

    fn alert_readings(&self) -> AlertReadings {
        AlertReadings {
            cpu_percent: self.display.cpu.percent.map(f32::from),
            ram_percent: self.display.memory.percent.map(f32::from),
            disk_used_percent: self.display.disk.percent.map(f32::from),
        }
    }

    /// One alert pass over the current display values.
    pub fn evaluate_alerts(&mut self, config: &AlertConfig, now: Instant) -> Vec<AlertEvent> {
        let readings = self.alert_readings();
        self.alerts.evaluate(&readings, config, now)
    }

    pub fn health(&self) -> HealthReport {
        health::assess(&HealthInputs {
            cpu_percent: self.cpu_raw.map(|v| v.clamp(0.0, 100.0)),
            memory_percent: self.display.memory.percent.map(f32::from),
            disk_used_percent: self.display.disk.percent.map(f32::from),
            process_count: self.display.process_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::alert::{AlertKind, AlertPhase};
    use super::rate::CounterSnapshot;
    use super::sampler::{CpuInfo, FilesystemInfo};
    use super::*;
    use pretty_assertions::assert_eq;

    fn monitor() -> MetricsMonitor {
        MetricsMonitor::new(Duration::from_secs(1), Duration::from_secs(5))
    }

    fn primary(load: Option<f32>, rx: u64, iface: &str) -> PrimarySample {
        PrimarySample {
            collapsed: false,
            cpu_load: load,
            cpu_info: Some(CpuInfo {
                brand: "Test CPU".into(),
                cores: 8,
            }),
            cpu_speed_ghz: Some(2.4),
            cpu_temperature: None,
            memory: Some(MemoryInfo {
                total: 1000,
                used: 900,
                available: 100,
                cached: 0,
            }),
            network: Some(CounterSnapshot::new(iface, rx, 0)),
            gpus: None,
            battery: None,
            uptime_secs: Some(10),
        }
    }

    fn disk(used: u64) -> DiskSample {
        DiskSample {
            filesystems: Some(vec![FilesystemInfo {
                mount: "/".into(),
                device: "sda".into(),
                total: 100,
                used,
            }]),
            io: None,
            process_count: Some(80),
        }
    }

    #[test]
    fn cpu_display_is_smoothed_and_graphed() {
        let mut monitor = monitor();
        for load in [20.0, 30.0, 90.0, 95.0, 92.0] {
            monitor.apply_primary(primary(Some(load), 0, "eth0"));
        }
        let cpu = &monitor.display().cpu;
        assert_eq!(cpu.percent, Some(65));
        assert_eq!(cpu.history, vec![20.0, 25.0, 47.0, 59.0, 65.0]);
        assert_eq!(cpu.brand.as_deref(), Some("Test CPU"));
    }

    #[test]
    fn failed_cpu_query_shows_placeholder() {
        let mut monitor = monitor();
        monitor.apply_primary(primary(Some(50.0), 0, "eth0"));

        let mut failed = primary(None, 0, "eth0");
        failed.cpu_info = None;
        monitor.apply_primary(failed);

        let cpu = &monitor.display().cpu;
        assert_eq!(cpu.percent, None);
        assert_eq!(cpu.history, vec![50.0]);
        assert_eq!(cpu.brand.as_deref(), Some("Test CPU"));
    }

    #[test]
    fn graphs_are_bounded() {
        let mut monitor = monitor();
        for i in 0..(GRAPH_POINTS + 10) {
            monitor.apply_primary(primary(Some(10.0), i as u64, "eth0"));
            monitor.apply_disk(disk(50));
        }
        assert_eq!(monitor.display().cpu.history.len(), GRAPH_POINTS);
        assert_eq!(monitor.display().memory.history.len(), GRAPH_POINTS);
        assert_eq!(monitor.display().disk.history.len(), GRAPH_POINTS);
    }

    #[test]
    fn network_rate_follows_interface() {
        let mut monitor = monitor();
        monitor.apply_primary(primary(Some(1.0), 1_000_000, "eth0"));
        monitor.apply_primary(primary(Some(1.0), 1_200_000, "eth0"));
        assert_eq!(monitor.display().network.rate.inbound, 200_000.0);

        monitor.apply_primary(primary(Some(1.0), 50_000, "wlan0"));
        assert_eq!(monitor.display().network.rate.inbound, 0.0);
        assert_eq!(monitor.display().network.interface.as_deref(), Some("wlan0"));
    }

    #[test]
    fn health_scores_the_latest_raw_load() {
        let mut monitor = monitor();
        for load in [0.0, 0.0, 0.0, 0.0, 100.0] {
            monitor.apply_primary(primary(Some(load), 0, "eth0"));
        }
        assert_eq!(monitor.display().cpu.percent, Some(20));

        let report = monitor.health();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.text == "High CPU usage detected"));
    }

    #[test]
    fn collapsed_sample_only_touches_uptime() {
        let mut monitor = monitor();
        monitor.apply_primary(primary(Some(40.0), 0, "eth0"));

        let mut collapsed = primary(None, 0, "eth0");
        collapsed.collapsed = true;
        collapsed.uptime_secs = Some(99);
        monitor.apply_primary(collapsed);

        assert_eq!(monitor.display().cpu.percent, Some(40));
        assert_eq!(monitor.display().uptime_secs, Some(99));
    }

    #[test]
    fn alerts_use_display_values() {
        let mut monitor = monitor();
        let config = AlertConfig {
            duration: Duration::from_secs(0),
            ..AlertConfig::default()
        };
        monitor.apply_primary(primary(Some(10.0), 0, "eth0"));
        monitor.apply_disk(disk(95));

        let events = monitor.evaluate_alerts(&config, Instant::now());
        let kinds: Vec<AlertKind> = events.iter().map(|e| e.kind).collect();
        // memory is at 90% against an 85% threshold
        assert_eq!(kinds, vec![AlertKind::Ram, AlertKind::Disk]);
        assert_eq!(
            monitor.alerts().state(AlertKind::Cpu).phase(),
            AlertPhase::Idle
        );
    }

    #[test]
    fn health_reflects_current_values() {
        let mut monitor = monitor();
        monitor.apply_primary(primary(Some(10.0), 0, "eth0"));
        monitor.apply_disk(disk(50));
        // memory at 90% costs 20 points
        assert_eq!(monitor.health().score, 80);
    }
}
