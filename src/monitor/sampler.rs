//! Periodic metric sampling with per-query timeouts.
//!
//! Every query of a tick runs concurrently and is bounded by its own
//! timeout. A failed or timed-out query only blanks its own field; its
//! siblings still land in the sample.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::error::{SourceError, SourceResult};
use super::rate::CounterSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuInfo {
    pub brand: String,
    pub cores: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub cached: u64,
}

impl MemoryInfo {
    pub fn used_percent(&self) -> Option<f32> {
        (self.total > 0).then(|| (self.used as f64 / self.total as f64 * 100.0) as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesystemInfo {
    pub mount: String,
    pub device: String,
    pub total: u64,
    pub used: u64,
}

impl FilesystemInfo {
    pub fn used_percent(&self) -> Option<f32> {
        (self.total > 0).then(|| (self.used as f64 / self.total as f64 * 100.0) as f32)
    }
}

/// The system drive if present (`/` or `C:`), else the first filesystem.
pub fn primary_filesystem(filesystems: &[FilesystemInfo]) -> Option<&FilesystemInfo> {
    filesystems
        .iter()
        .find(|fs| matches!(fs.mount.as_str(), "/" | "C:" | "C:\\"))
        .or_else(|| filesystems.first())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuInfo {
    pub model: String,
    pub vendor: String,
    pub vram_mb: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryInfo {
    pub percent: f32,
    pub charging: bool,
    pub minutes_remaining: Option<u64>,
}

/// Point-in-time system queries. Any call may fail or hang.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Overall CPU load in percent.
    async fn cpu_load(&self) -> SourceResult<f32>;
    async fn cpu_info(&self) -> SourceResult<CpuInfo>;
    /// Average clock speed in GHz.
    async fn cpu_speed(&self) -> SourceResult<f32>;
    /// Package temperature in °C, `None` when no sensor reports one.
    async fn cpu_temperature(&self) -> SourceResult<Option<f32>>;
    async fn memory(&self) -> SourceResult<MemoryInfo>;
    async fn filesystems(&self) -> SourceResult<Vec<FilesystemInfo>>;
    /// Cumulative read/write bytes.
    async fn disk_io(&self) -> SourceResult<CounterSnapshot>;
    /// Cumulative rx/tx bytes of the active interface.
    async fn network_io(&self) -> SourceResult<CounterSnapshot>;
    async fn gpus(&self) -> SourceResult<Vec<GpuInfo>>;
    /// `None` on machines without a battery.
    async fn battery(&self) -> SourceResult<Option<BatteryInfo>>;
    async fn uptime(&self) -> SourceResult<u64>;
    async fn process_count(&self) -> SourceResult<usize>;
}

/// Per-query timeouts in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryTimeouts {
    pub cpu_load_ms: u64,
    pub cpu_info_ms: u64,
    pub cpu_speed_ms: u64,
    pub temperature_ms: u64,
    pub memory_ms: u64,
    pub network_ms: u64,
    pub gpu_ms: u64,
    pub battery_ms: u64,
    pub uptime_ms: u64,
    pub filesystems_ms: u64,
    pub disk_io_ms: u64,
    pub processes_ms: u64,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            cpu_load_ms: 3000,
            cpu_info_ms: 2000,
            cpu_speed_ms: 2000,
            temperature_ms: 2000,
            memory_ms: 3000,
            network_ms: 3000,
            gpu_ms: 2000,
            battery_ms: 2000,
            uptime_ms: 2000,
            filesystems_ms: 8000,
            disk_io_ms: 5000,
            processes_ms: 5000,
        }
    }
}

impl QueryTimeouts {
    /// Same limit for every query.
    #[cfg(test)]
    pub fn uniform(ms: u64) -> Self {
        Self {
            cpu_load_ms: ms,
            cpu_info_ms: ms,
            cpu_speed_ms: ms,
            temperature_ms: ms,
            memory_ms: ms,
            network_ms: ms,
            gpu_ms: ms,
            battery_ms: ms,
            uptime_ms: ms,
            filesystems_ms: ms,
            disk_io_ms: ms,
            processes_ms: ms,
        }
    }
}

/// Results of one primary (fast) tick.
#[derive(Debug, Clone)]
pub struct PrimarySample {
    /// Only uptime was queried.
    pub collapsed: bool,
    pub cpu_load: Option<f32>,
    pub cpu_info: Option<CpuInfo>,
    pub cpu_speed_ghz: Option<f32>,
    pub cpu_temperature: Option<f32>,
    pub memory: Option<MemoryInfo>,
    pub network: Option<CounterSnapshot>,
    pub gpus: Option<Vec<GpuInfo>>,
    pub battery: Option<BatteryInfo>,
    pub uptime_secs: Option<u64>,
}

impl PrimarySample {
    fn collapsed(uptime_secs: Option<u64>) -> Self {
        Self {
            collapsed: true,
            cpu_load: None,
            cpu_info: None,
            cpu_speed_ghz: None,
            cpu_temperature: None,
            memory: None,
            network: None,
            gpus: None,
            battery: None,
            uptime_secs,
        }
    }
}

/// Results of one disk (slow) tick.
#[derive(Debug, Clone)]
pub struct DiskSample {
    pub filesystems: Option<Vec<FilesystemInfo>>,
    pub io: Option<CounterSnapshot>,
    pub process_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum SampleBatch {
    Primary(Box<PrimarySample>),
    Disk(Box<DiskSample>),
}

async fn guarded<T, F>(query: &'static str, limit_ms: u64, fut: F) -> Option<T>
where
    F: Future<Output = SourceResult<T>>,
{
    let limit = Duration::from_millis(limit_ms);
    let error = match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => e,
        Err(_) => SourceError::Timeout {
            query,
            after: limit,
        },
    };
    tracing::warn!(query, error = %error, "metrics query failed");
    None
}

/// Runs sampling ticks against a [`MetricsSource`].
#[derive(Clone)]
pub struct Sampler {
    source: Arc<dyn MetricsSource>,
    timeouts: QueryTimeouts,
    collapsed: Arc<AtomicBool>,
}

impl Sampler {
    pub fn new(source: Arc<dyn MetricsSource>, timeouts: QueryTimeouts) -> Self {
        Self {
            source,
            timeouts,
            collapsed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_collapsed(&self, collapsed: bool) {
        self.collapsed.store(collapsed, Ordering::Relaxed);
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed.load(Ordering::Relaxed)
    }

    pub async fn primary_tick(&self) -> PrimarySample {
        let src = self.source.as_ref();
        let t = &self.timeouts;

        if self.is_collapsed() {
            let uptime = guarded("uptime", t.uptime_ms, src.uptime()).await;
            return PrimarySample::collapsed(uptime);
        }

        let (cpu_load, cpu_info, cpu_speed_ghz, cpu_temperature, memory, network, gpus, battery, uptime_secs) = tokio::join!(
            guarded("cpu_load", t.cpu_load_ms, src.cpu_load()),
            guarded("cpu_info", t.cpu_info_ms, src.cpu_info()),
            guarded("cpu_speed", t.cpu_speed_ms, src.cpu_speed()),
            guarded("cpu_temperature", t.temperature_ms, src.cpu_temperature()),
            guarded("memory", t.memory_ms, src.memory()),
            guarded("network_io", t.network_ms, src.network_io()),
            guarded("gpus", t.gpu_ms, src.gpus()),
            guarded("battery", t.battery_ms, src.battery()),
            guarded("uptime", t.uptime_ms, src.uptime()),
        );

        PrimarySample {
            collapsed: false,
            cpu_load,
            cpu_info,
            cpu_speed_ghz,
            cpu_temperature: cpu_temperature.flatten(),
            memory,
            network,
            gpus,
            battery: battery.flatten(),
            uptime_secs,
        }
    }

    pub async fn disk_tick(&self) -> DiskSample {
        let src = self.source.as_ref();
        let t = &self.timeouts;

        let (filesystems, io, process_count) = tokio::join!(
            guarded("filesystems", t.filesystems_ms, src.filesystems()),
            guarded("disk_io", t.disk_io_ms, src.disk_io()),
            guarded("process_count", t.processes_ms, src.process_count()),
        );

        DiskSample {
            filesystems,
            io,
            process_count,
        }
    }

    /// Start the primary and disk loops, delivering samples on `tx`.
    ///
    /// Ticks of one loop never overlap: a slow tick delays the next one.
    /// The disk loop idles while collapsed.
    pub fn spawn<T>(
        &self,
        primary_every: Duration,
        disk_every: Duration,
        tx: mpsc::UnboundedSender<T>,
    ) -> SamplerHandle
    where
        T: From<SampleBatch> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let primary = {
            let sampler = self.clone();
            let tx = tx.clone();
            let shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                run_loop(primary_every, tx, shutdown, move || {
                    let sampler = sampler.clone();
                    async move { Some(SampleBatch::Primary(Box::new(sampler.primary_tick().await))) }
                })
                .await
            })
        };

        let disk = {
            let sampler = self.clone();
            tokio::spawn(async move {
                run_loop(disk_every, tx, shutdown_rx, move || {
                    let sampler = sampler.clone();
                    async move {
                        if sampler.is_collapsed() {
                            return None;
                        }
                        Some(SampleBatch::Disk(Box::new(sampler.disk_tick().await)))
                    }
                })
                .await
            })
        };

        SamplerHandle {
            shutdown_tx,
            tasks: vec![primary, disk],
        }
    }
}

async fn run_loop<T, F, Fut>(
    every: Duration,
    tx: mpsc::UnboundedSender<T>,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) where
    T: From<SampleBatch>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<SampleBatch>>,
{
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        // an in-flight tick is dropped on shutdown
        let batch = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            batch = tick() => batch,
        };

        let Some(batch) = batch else {
            continue;
        };
        if tx.send(T::from(batch)).is_err() {
            break;
        }
    }
}

/// Stops the sampling loops.
pub struct SamplerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SamplerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "sampler task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Canned answers; `cpu_info` hangs and `memory` fails.
    pub(crate) struct StubSource {
        pub load: f32,
        pub rx: std::sync::atomic::AtomicU64,
    }

    impl StubSource {
        pub(crate) fn new(load: f32) -> Self {
            Self {
                load,
                rx: std::sync::atomic::AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl MetricsSource for StubSource {
        async fn cpu_load(&self) -> SourceResult<f32> {
            Ok(self.load)
        }
        async fn cpu_info(&self) -> SourceResult<CpuInfo> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            unreachable!("times out first")
        }
        async fn cpu_speed(&self) -> SourceResult<f32> {
            Ok(3.2)
        }
        async fn cpu_temperature(&self) -> SourceResult<Option<f32>> {
            Ok(None)
        }
        async fn memory(&self) -> SourceResult<MemoryInfo> {
            Err(SourceError::Unavailable("memory counters missing".into()))
        }
        async fn filesystems(&self) -> SourceResult<Vec<FilesystemInfo>> {
            Ok(vec![FilesystemInfo {
                mount: "/".into(),
                device: "sda1".into(),
                total: 100,
                used: 92,
            }])
        }
        async fn disk_io(&self) -> SourceResult<CounterSnapshot> {
            Err(SourceError::Unsupported("disk io"))
        }
        async fn network_io(&self) -> SourceResult<CounterSnapshot> {
            let rx = self.rx.fetch_add(1000, Ordering::Relaxed) + 1000;
            Ok(CounterSnapshot::new("eth0", rx, 0))
        }
        async fn gpus(&self) -> SourceResult<Vec<GpuInfo>> {
            Ok(Vec::new())
        }
        async fn battery(&self) -> SourceResult<Option<BatteryInfo>> {
            Ok(Some(BatteryInfo {
                percent: 80.0,
                charging: true,
                minutes_remaining: None,
            }))
        }
        async fn uptime(&self) -> SourceResult<u64> {
            Ok(3600)
        }
        async fn process_count(&self) -> SourceResult<usize> {
            Ok(120)
        }
    }

    fn sampler(load: f32) -> Sampler {
        Sampler::new(Arc::new(StubSource::new(load)), QueryTimeouts::uniform(50))
    }

    #[tokio::test]
    async fn hung_query_does_not_block_siblings() {
        let sample = sampler(42.0).primary_tick().await;

        assert!(!sample.collapsed);
        assert_eq!(sample.cpu_load, Some(42.0));
        assert_eq!(sample.cpu_info, None);
        assert_eq!(sample.memory, None);
        assert_eq!(sample.cpu_speed_ghz, Some(3.2));
        assert_eq!(sample.uptime_secs, Some(3600));
        assert_eq!(sample.network.map(|n| n.inbound), Some(1000));
        assert!(sample.battery.map(|b| b.charging).unwrap_or(false));
    }

    #[tokio::test]
    async fn collapsed_tick_only_reads_uptime() {
        let sampler = sampler(42.0);
        sampler.set_collapsed(true);
        let sample = sampler.primary_tick().await;

        assert!(sample.collapsed);
        assert_eq!(sample.uptime_secs, Some(3600));
        assert_eq!(sample.cpu_load, None);
        assert_eq!(sample.network, None);
    }

    #[tokio::test]
    async fn disk_tick_keeps_partial_results() {
        let sample = sampler(0.0).disk_tick().await;

        assert_eq!(sample.io, None);
        assert_eq!(sample.process_count, Some(120));
        let filesystems = sample.filesystems.unwrap_or_default();
        assert_eq!(primary_filesystem(&filesystems).map(|f| f.used), Some(92));
    }

    #[tokio::test]
    async fn loops_deliver_until_shutdown() {
        let (tx, mut rx) = mpsc::unbounded_channel::<SampleBatch>();
        let handle = sampler(10.0).spawn(
            Duration::from_millis(100),
            Duration::from_millis(100),
            tx,
        );

        let mut primary = 0;
        let mut disk = 0;
        while primary == 0 || disk == 0 {
            match rx.recv().await {
                Some(SampleBatch::Primary(_)) => primary += 1,
                Some(SampleBatch::Disk(_)) => disk += 1,
                None => break,
            }
        }
        assert!(primary > 0 && disk > 0);

        handle.shutdown().await;
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none(), "senders dropped after shutdown");
    }

    #[tokio::test]
    async fn shutdown_abandons_a_hung_tick() {
        let (tx, _rx) = mpsc::unbounded_channel::<SampleBatch>();
        let sampler = Sampler::new(Arc::new(StubSource::new(10.0)), QueryTimeouts::uniform(3000));
        let handle = sampler.spawn(Duration::from_secs(1), Duration::from_secs(5), tx);

        // let the first primary tick block on cpu_info
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = std::time::Instant::now();
        handle.shutdown().await;
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "shutdown took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn picks_system_drive() {
        let fs = |mount: &str| FilesystemInfo {
            mount: mount.into(),
            device: String::new(),
            total: 1,
            used: 0,
        };
        let list = vec![fs("/boot"), fs("/"), fs("/home")];
        assert_eq!(primary_filesystem(&list).map(|f| f.mount.as_str()), Some("/"));

        let list = vec![fs("/data"), fs("/srv")];
        assert_eq!(primary_filesystem(&list).map(|f| f.mount.as_str()), Some("/data"));

        assert!(primary_filesystem(&[]).is_none());
    }
}
