//! `MetricsSource` backed by `sysinfo` and a few platform probes.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessesToUpdate,
    RefreshKind, System, MINIMUM_CPU_UPDATE_INTERVAL,
};
use tokio::sync::OnceCell;

use super::{gpu, power};
use crate::monitor::error::{SourceError, SourceResult};
use crate::monitor::rate::CounterSnapshot;
use crate::monitor::sampler::{
    primary_filesystem, BatteryInfo, CpuInfo, FilesystemInfo, GpuInfo, MemoryInfo,
    MetricsSource,
};

/// Keeps reusable `sysinfo` handles so each tick only refreshes them.
///
/// Every query runs on the blocking pool; a query abandoned by its timeout
/// finishes in the background and its result is dropped.
pub struct SysinfoSource {
    sys: Arc<Mutex<System>>,
    /// Last CPU usage refresh; usage is only meaningful between two
    /// refreshes at least `MINIMUM_CPU_UPDATE_INTERVAL` apart.
    cpu_refreshed_at: Mutex<Instant>,
    processes: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    components: Arc<Mutex<Components>>,
    interface: Option<String>,
    gpus: OnceCell<Vec<GpuInfo>>,
}

impl SysinfoSource {
    /// `interface` pins network sampling to one interface by name.
    pub fn new(interface: Option<String>) -> Self {
        // Initial refresh so the first CPU sample has a baseline.
        let mut sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self {
            sys: Arc::new(Mutex::new(sys)),
            cpu_refreshed_at: Mutex::new(Instant::now()),
            processes: Arc::new(Mutex::new(System::new())),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
            interface,
            gpus: OnceCell::new(),
        }
    }
}

async fn blocking<R, T, F>(resource: &Arc<Mutex<R>>, query: F) -> SourceResult<T>
where
    R: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut R) -> SourceResult<T> + Send + 'static,
{
    let resource = Arc::clone(resource);
    tokio::task::spawn_blocking(move || query(&mut resource.lock())).await?
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.to_lowercase().contains("loopback")
}

/// The preferred interface if named, else the busiest non-loopback one.
pub fn select_interface<'a>(
    interfaces: impl IntoIterator<Item = (&'a str, u64, u64)>,
    preferred: Option<&str>,
) -> Option<CounterSnapshot> {
    let mut candidates = interfaces.into_iter();
    let chosen = match preferred {
        Some(name) => candidates.find(|(n, _, _)| *n == name),
        None => candidates
            .filter(|(n, _, _)| !is_loopback(n))
            .max_by(|a, b| {
                (a.1.saturating_add(a.2))
                    .cmp(&b.1.saturating_add(b.2))
                    .then_with(|| b.0.cmp(a.0))
            }),
    };
    chosen.map(|(name, rx, tx)| CounterSnapshot::new(name, rx, tx))
}

/// Time left before a CPU usage refresh reflects real load.
fn cpu_settle_delay(last_refresh: Instant, now: Instant) -> Duration {
    MINIMUM_CPU_UPDATE_INTERVAL.saturating_sub(now.saturating_duration_since(last_refresh))
}

fn pick_cpu_temperature<'a>(sensors: impl IntoIterator<Item = (&'a str, f32)>) -> Option<f32> {
    let readings: Vec<(String, f32)> = sensors
        .into_iter()
        .filter(|(_, t)| t.is_finite() && *t > 0.0)
        .map(|(label, t)| (label.to_lowercase(), t))
        .collect();

    let preferred = ["package id 0", "tctl", "tdie", "cpu"];
    preferred
        .iter()
        .find_map(|key| readings.iter().find(|(l, _)| l.contains(key)).map(|(_, t)| *t))
        .or_else(|| {
            readings
                .iter()
                .filter(|(l, _)| l.contains("core"))
                .map(|(_, t)| *t)
                .reduce(f32::max)
        })
}

#[async_trait]
impl MetricsSource for SysinfoSource {
    async fn cpu_load(&self) -> SourceResult<f32> {
        let wait = cpu_settle_delay(*self.cpu_refreshed_at.lock(), Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let load = blocking(&self.sys, |sys| {
            sys.refresh_cpu_usage();
            Ok(sys.global_cpu_usage())
        })
        .await?;
        *self.cpu_refreshed_at.lock() = Instant::now();
        Ok(load)
    }

    async fn cpu_info(&self) -> SourceResult<CpuInfo> {
        blocking(&self.sys, |sys| {
            let cores = sys.cpus().len();
            let brand = sys
                .cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .filter(|b| !b.is_empty())
                .ok_or_else(|| SourceError::Unavailable("no CPU reported".into()))?;
            Ok(CpuInfo { brand, cores })
        })
        .await
    }

    async fn cpu_speed(&self) -> SourceResult<f32> {
        blocking(&self.sys, |sys| {
            sys.refresh_cpu_frequency();
            let freqs: Vec<u64> = sys
                .cpus()
                .iter()
                .map(|c| c.frequency())
                .filter(|f| *f > 0)
                .collect();
            if freqs.is_empty() {
                return Err(SourceError::Unavailable("no CPU frequency reported".into()));
            }
            let avg_mhz = freqs.iter().sum::<u64>() as f32 / freqs.len() as f32;
            Ok(avg_mhz / 1000.0)
        })
        .await
    }

    async fn cpu_temperature(&self) -> SourceResult<Option<f32>> {
        blocking(&self.components, |components| {
            components.refresh();
            Ok(pick_cpu_temperature(
                components
                    .list()
                    .iter()
                    .map(|c| (c.label(), c.temperature())),
            ))
        })
        .await
    }

    async fn memory(&self) -> SourceResult<MemoryInfo> {
        blocking(&self.sys, |sys| {
            sys.refresh_memory();
            let total = sys.total_memory();
            if total == 0 {
                return Err(SourceError::Unavailable("memory total is zero".into()));
            }
            let available = sys.available_memory();
            Ok(MemoryInfo {
                total,
                used: sys.used_memory(),
                available,
                cached: available.saturating_sub(sys.free_memory()),
            })
        })
        .await
    }

    async fn filesystems(&self) -> SourceResult<Vec<FilesystemInfo>> {
        blocking(&self.disks, |disks| {
            disks.refresh();
            if disks.list().is_empty() {
                disks.refresh_list();
            }
            Ok(disks
                .list()
                .iter()
                .map(|disk| {
                    let total = disk.total_space();
                    FilesystemInfo {
                        mount: disk.mount_point().to_string_lossy().into_owned(),
                        device: disk.name().to_string_lossy().into_owned(),
                        total,
                        used: total.saturating_sub(disk.available_space()),
                    }
                })
                .collect())
        })
        .await
    }

    #[cfg(target_os = "linux")]
    async fn disk_io(&self) -> SourceResult<CounterSnapshot> {
        use super::diskstats;

        let device = blocking(&self.disks, |disks| {
            let listed: Vec<FilesystemInfo> = disks
                .list()
                .iter()
                .map(|d| FilesystemInfo {
                    mount: d.mount_point().to_string_lossy().into_owned(),
                    device: d.name().to_string_lossy().into_owned(),
                    total: 0,
                    used: 0,
                })
                .collect();
            Ok(primary_filesystem(&listed).map(|f| f.device.clone()))
        })
        .await?;

        let content = tokio::fs::read_to_string("/proc/diskstats").await?;
        diskstats::select(&diskstats::parse(&content), device.as_deref())
            .ok_or_else(|| SourceError::Unavailable("no disks in /proc/diskstats".into()))
    }

    #[cfg(not(target_os = "linux"))]
    async fn disk_io(&self) -> SourceResult<CounterSnapshot> {
        Err(SourceError::Unsupported("disk io counters"))
    }

    async fn network_io(&self) -> SourceResult<CounterSnapshot> {
        let preferred = self.interface.clone();
        blocking(&self.networks, move |networks| {
            networks.refresh();
            let interfaces = networks
                .list()
                .iter()
                .map(|(name, data)| (name.as_str(), data.total_received(), data.total_transmitted()));
            select_interface(interfaces, preferred.as_deref()).ok_or_else(|| match preferred {
                Some(name) => SourceError::Unavailable(format!("interface {} not found", name)),
                None => SourceError::Unavailable("no active network interface".into()),
            })
        })
        .await
    }

    async fn gpus(&self) -> SourceResult<Vec<GpuInfo>> {
        self.gpus.get_or_try_init(gpu::query).await.cloned()
    }

    async fn battery(&self) -> SourceResult<Option<BatteryInfo>> {
        tokio::task::spawn_blocking(power::read).await?
    }

    async fn uptime(&self) -> SourceResult<u64> {
        Ok(System::uptime())
    }

    async fn process_count(&self) -> SourceResult<usize> {
        blocking(&self.processes, |sys| {
            sys.refresh_processes(ProcessesToUpdate::All);
            Ok(sys.processes().len())
        })
        .await
    }
}
