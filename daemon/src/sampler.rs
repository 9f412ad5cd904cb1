//! System-wide metrics sampler (aggregate /proc counters and statvfs)

use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Cumulative scheduler-tick counters from the aggregate `cpu ` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub total: u64,
    pub idle: u64,
}

/// Parse the aggregate `cpu ` line of `/proc/stat`. The total sums every
/// column present (user, nice, system, idle, iowait, irq, softirq, ...);
/// idle is the fourth column.
pub fn parse_cpu_times(content: &str) -> Option<CpuTimes> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu ") || l.starts_with("cpu\t"))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|t| t.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    Some(CpuTimes {
        total: fields.iter().sum(),
        idle: fields[3],
    })
}

/// Previous CPU sample; a usage percentage only exists once two samples do.
#[derive(Debug, Default)]
pub struct CpuBaseline {
    prev: Option<CpuTimes>,
}

impl CpuBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the next sample and return the usage percentage over the
    /// interval since the previous one. The first call (and a zero tick
    /// delta, which would divide by zero) reports 0.0 while still
    /// recording the snapshot so the next call produces a real delta.
    pub fn update(&mut self, current: CpuTimes) -> f64 {
        let percent = match self.prev {
            Some(prev) => {
                let d_total = current.total.saturating_sub(prev.total);
                let d_idle = current.idle.saturating_sub(prev.idle);
                if d_total == 0 {
                    0.0
                } else {
                    ((1.0 - d_idle as f64 / d_total as f64) * 100.0).clamp(0.0, 100.0)
                }
            }
            None => 0.0,
        };
        self.prev = Some(current);
        percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuStats {
    pub usage_percent: f64,
    pub total_ticks: u64,
}

/// Labeled fields of `/proc/meminfo`, all in kilobytes. A label absent
/// from the source reads as zero; only a missing file is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemStats {
    pub total_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

pub fn parse_meminfo(content: &str) -> MemStats {
    let mut stats = MemStats::default();
    for line in content.lines() {
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        let value: u64 = rest
            .split_whitespace()
            .next()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        match label {
            "MemTotal" => stats.total_kb = value,
            "MemFree" => stats.free_kb = value,
            "MemAvailable" => stats.available_kb = value,
            "Buffers" => stats.buffers_kb = value,
            "Cached" => stats.cached_kb = value,
            "SwapTotal" => stats.swap_total_kb = value,
            "SwapFree" => stats.swap_free_kb = value,
            _ => {}
        }
    }
    stats
}

/// Sum rx/tx byte counters across all interfaces in `/proc/net/dev`,
/// excluding loopback. Returns (rx_bytes, tx_bytes).
pub fn parse_net_dev(content: &str) -> (u64, u64) {
    let mut rx_total = 0u64;
    let mut tx_total = 0u64;
    for line in content.lines() {
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<&str> = counters.split_whitespace().collect();
        // rx bytes is the first column, tx bytes the ninth
        if fields.len() < 9 {
            continue;
        }
        rx_total += fields[0].parse::<u64>().unwrap_or(0);
        tx_total += fields[8].parse::<u64>().unwrap_or(0);
    }
    (rx_total, tx_total)
}

/// Previous cumulative network counters, one pair for the whole system.
#[derive(Debug, Default)]
pub struct NetBaseline {
    prev: Option<(u64, u64)>,
}

impl NetBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the next counter pair and return the byte delta since the
    /// previous call; (0, 0) on the first call, which records the baseline.
    pub fn update(&mut self, rx: u64, tx: u64) -> (u64, u64) {
        let delta = match self.prev {
            Some((prev_rx, prev_tx)) => {
                (rx.saturating_sub(prev_rx), tx.saturating_sub(prev_tx))
            }
            None => (0, 0),
        };
        self.prev = Some((rx, tx));
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetStats {
    pub down_bytes: u64,
    pub up_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskStats {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// One-shot statvfs query. Used space is measured against the blocks
/// available to unprivileged callers, not raw free blocks, so reserved
/// blocks count as used.
pub fn disk_usage(mount: &Path) -> io::Result<DiskStats> {
    let c_path = CString::new(mount.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "mount path contains NUL"))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    let block_size = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * block_size;
    let available = stat.f_bavail as u64 * block_size;
    Ok(DiskStats {
        used_bytes: total.saturating_sub(available),
        total_bytes: total,
    })
}

/// Owns the per-metric-family previous-sample state. Each read operation
/// is independent; the rate-based ones (CPU, network) perform exactly one
/// read-then-write of their baseline per call.
pub struct SystemSampler {
    proc_root: PathBuf,
    disk_mount: PathBuf,
    cpu: CpuBaseline,
    net: NetBaseline,
}

impl SystemSampler {
    pub fn new(disk_mount: PathBuf) -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            disk_mount,
            cpu: CpuBaseline::new(),
            net: NetBaseline::new(),
        }
    }

    /// Point the sampler at an alternate proc root (test fixtures).
    pub fn with_proc_root(mut self, proc_root: PathBuf) -> Self {
        self.proc_root = proc_root;
        self
    }

    pub fn cpu_stats(&mut self) -> io::Result<CpuStats> {
        let content = fs::read_to_string(self.proc_root.join("stat"))?;
        let times = parse_cpu_times(&content)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no aggregate cpu line"))?;
        let usage_percent = self.cpu.update(times);
        Ok(CpuStats {
            usage_percent,
            total_ticks: times.total,
        })
    }

    pub fn mem_stats(&self) -> io::Result<MemStats> {
        let content = fs::read_to_string(self.proc_root.join("meminfo"))?;
        Ok(parse_meminfo(&content))
    }

    pub fn net_stats(&mut self) -> io::Result<NetStats> {
        let content = fs::read_to_string(self.proc_root.join("net/dev"))?;
        let (rx, tx) = parse_net_dev(&content);
        let (down_bytes, up_bytes) = self.net.update(rx, tx);
        Ok(NetStats {
            down_bytes,
            up_bytes,
        })
    }

    pub fn disk_stats(&self) -> io::Result<DiskStats> {
        disk_usage(&self.disk_mount)
    }
}
