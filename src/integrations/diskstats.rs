//! Cumulative disk I/O counters from `/proc/diskstats`.

#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use once_cell::sync::Lazy;
use regex::Regex;

use crate::monitor::rate::CounterSnapshot;

/// Identity used when counters are summed over every physical disk.
pub const ALL_DISKS: &str = "all-disks";

const SECTOR_BYTES: u64 = 512;

static WHOLE_DISK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(sd[a-z]+|vd[a-z]+|xvd[a-z]+|hd[a-z]+|nvme\d+n\d+|mmcblk\d+)$")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskStat {
    pub name: String,
    pub read_bytes: u64,
    pub written_bytes: u64,
}

/// Parse the kernel's diskstats table, skipping malformed lines.
pub fn parse(content: &str) -> Vec<DiskStat> {
    content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            let sectors_read: u64 = fields[5].parse().ok()?;
            let sectors_written: u64 = fields[9].parse().ok()?;
            Some(DiskStat {
                name: fields[2].to_string(),
                read_bytes: sectors_read.saturating_mul(SECTOR_BYTES),
                written_bytes: sectors_written.saturating_mul(SECTOR_BYTES),
            })
        })
        .collect()
}

pub fn is_whole_disk(name: &str) -> bool {
    WHOLE_DISK.is_match(name)
}

/// Counters for `device` when listed, otherwise the sum of whole disks.
pub fn select(stats: &[DiskStat], device: Option<&str>) -> Option<CounterSnapshot> {
    let device = device.map(|d| d.trim_start_matches("/dev/"));
    if let Some(stat) = device.and_then(|d| stats.iter().find(|s| s.name == d)) {
        return Some(CounterSnapshot::new(
            stat.name.clone(),
            stat.read_bytes,
            stat.written_bytes,
        ));
    }

    let mut disks = stats.iter().filter(|s| is_whole_disk(&s.name)).peekable();
    disks.peek()?;
    let (read, written) = disks.fold((0u64, 0u64), |(r, w), s| {
        (r.saturating_add(s.read_bytes), w.saturating_add(s.written_bytes))
    });
    Some(CounterSnapshot::new(ALL_DISKS, read, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
   8       0 sda 1000 0 2000 0 500 0 4000 0 0 0 0
   8       1 sda1 900 0 1800 0 450 0 3600 0 0 0 0
 259       0 nvme0n1 10 0 100 0 10 0 200 0 0 0 0
 259       1 nvme0n1p1 10 0 100 0 10 0 200 0 0 0 0
   7       0 loop0 1 0 8 0 0 0 0 0 0 0 0
garbage line
";

    #[test]
    fn parses_sector_counts_as_bytes() {
        let stats = parse(SAMPLE);
        assert_eq!(stats.len(), 5);
        assert_eq!(
            stats[0],
            DiskStat {
                name: "sda".into(),
                read_bytes: 2000 * 512,
                written_bytes: 4000 * 512,
            }
        );
    }

    #[test]
    fn recognises_whole_disks() {
        assert!(is_whole_disk("sda"));
        assert!(is_whole_disk("nvme0n1"));
        assert!(is_whole_disk("mmcblk0"));
        assert!(!is_whole_disk("sda1"));
        assert!(!is_whole_disk("nvme0n1p1"));
        assert!(!is_whole_disk("loop0"));
        assert!(!is_whole_disk("dm-0"));
    }

    #[test]
    fn selects_named_device() {
        let stats = parse(SAMPLE);
        let snapshot = select(&stats, Some("/dev/sda1")).expect("sda1 listed");
        assert_eq!(snapshot, CounterSnapshot::new("sda1", 1800 * 512, 3600 * 512));
    }

    #[test]
    fn falls_back_to_all_disks() {
        let stats = parse(SAMPLE);
        let snapshot = select(&stats, Some("/dev/mapper/root")).expect("whole disks listed");
        assert_eq!(
            snapshot,
            CounterSnapshot::new(ALL_DISKS, (2000 + 100) * 512, (4000 + 200) * 512)
        );
    }

    #[test]
    fn nothing_to_select() {
        assert_eq!(select(&[], None), None);
    }
}
