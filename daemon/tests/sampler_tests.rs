use std::fs;
use sysmon_daemon::sampler::{
    disk_usage, parse_cpu_times, parse_meminfo, parse_net_dev, CpuBaseline, CpuTimes, NetBaseline,
    SystemSampler,
};
use tempfile::tempdir;

#[test]
fn test_parse_cpu_times_sums_all_columns() {
    let content = "cpu  100 0 50 800 30 0 20\ncpu0 50 0 25 400 15 0 10\n";
    let times = parse_cpu_times(content).unwrap();
    assert_eq!(times.total, 1000);
    assert_eq!(times.idle, 800);
}

#[test]
fn test_parse_cpu_times_requires_aggregate_line() {
    assert!(parse_cpu_times("cpu0 50 0 25 400\n").is_none());
    assert!(parse_cpu_times("").is_none());
}

#[test]
fn test_cpu_baseline_first_sample_is_zero() {
    let mut baseline = CpuBaseline::new();
    let percent = baseline.update(CpuTimes {
        total: 1000,
        idle: 800,
    });
    assert_eq!(percent, 0.0);
}

#[test]
fn test_cpu_baseline_second_sample_yields_delta() {
    let mut baseline = CpuBaseline::new();
    baseline.update(CpuTimes {
        total: 1000,
        idle: 800,
    });
    // 1000 new ticks, 500 of them idle -> 50% busy.
    let percent = baseline.update(CpuTimes {
        total: 2000,
        idle: 1300,
    });
    assert!((percent - 50.0).abs() < 1e-9);
}

#[test]
fn test_cpu_baseline_zero_tick_delta_is_zero() {
    let mut baseline = CpuBaseline::new();
    let times = CpuTimes {
        total: 1000,
        idle: 800,
    };
    baseline.update(times);
    assert_eq!(baseline.update(times), 0.0);
}

#[test]
fn test_cpu_baseline_stays_in_range() {
    let mut baseline = CpuBaseline::new();
    baseline.update(CpuTimes {
        total: 1000,
        idle: 500,
    });
    // A glitched counter pair must still clamp into [0, 100].
    let percent = baseline.update(CpuTimes {
        total: 1100,
        idle: 900,
    });
    assert!((0.0..=100.0).contains(&percent));
}

#[test]
fn test_parse_meminfo_fields() {
    let content = "MemTotal:       16384256 kB\n\
                   MemFree:         8192128 kB\n\
                   MemAvailable:   12288192 kB\n\
                   Buffers:          524288 kB\n\
                   Cached:          2097152 kB\n\
                   SwapCached:            0 kB\n\
                   SwapTotal:       4194304 kB\n\
                   SwapFree:        4194304 kB\n";
    let stats = parse_meminfo(content);
    assert_eq!(stats.total_kb, 16_384_256);
    assert_eq!(stats.free_kb, 8_192_128);
    assert_eq!(stats.available_kb, 12_288_192);
    assert_eq!(stats.buffers_kb, 524_288);
    assert_eq!(stats.cached_kb, 2_097_152);
    assert_eq!(stats.swap_total_kb, 4_194_304);
    assert_eq!(stats.swap_free_kb, 4_194_304);
}

#[test]
fn test_parse_meminfo_missing_field_reads_zero() {
    let stats = parse_meminfo("MemTotal: 1024 kB\nMemFree: 512 kB\n");
    assert_eq!(stats.total_kb, 1024);
    assert_eq!(stats.cached_kb, 0);
    assert_eq!(stats.swap_total_kb, 0);
}

#[test]
fn test_parse_net_dev_excludes_loopback() {
    let content = "Inter-|   Receive                                                |  Transmit\n\
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n\
    lo:  999999    1000    0    0    0     0          0         0   999999    1000    0    0    0     0       0          0\n\
  eth0: 1000000    2000    0    0    0     0          0         0   500000    1500    0    0    0     0       0          0\n\
 wlan0:  250000     800    0    0    0     0          0         0   125000     400    0    0    0     0       0          0\n";
    let (rx, tx) = parse_net_dev(content);
    assert_eq!(rx, 1_250_000);
    assert_eq!(tx, 625_000);
}

#[test]
fn test_net_baseline_first_call_establishes_zero_delta() {
    let mut baseline = NetBaseline::new();
    assert_eq!(baseline.update(1000, 2000), (0, 0));
    assert_eq!(baseline.update(1500, 2100), (500, 100));
}

#[test]
fn test_net_baseline_counter_reset_does_not_underflow() {
    let mut baseline = NetBaseline::new();
    baseline.update(1_000_000, 1_000_000);
    assert_eq!(baseline.update(100, 100), (0, 0));
}

#[test]
fn test_sampler_reads_from_proc_root_fixture() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stat"), "cpu  100 0 50 800 30 0 20\n").unwrap();
    fs::write(
        dir.path().join("meminfo"),
        "MemTotal: 2048 kB\nMemFree: 1024 kB\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("net")).unwrap();
    fs::write(
        dir.path().join("net/dev"),
        "Inter-| Receive | Transmit\n face |bytes ...\n eth0: 100 1 0 0 0 0 0 0 200 1 0 0 0 0 0 0\n",
    )
    .unwrap();

    let mut sampler =
        SystemSampler::new("/".into()).with_proc_root(dir.path().to_path_buf());

    let cpu = sampler.cpu_stats().unwrap();
    assert_eq!(cpu.usage_percent, 0.0);
    assert_eq!(cpu.total_ticks, 1000);

    let mem = sampler.mem_stats().unwrap();
    assert_eq!(mem.total_kb, 2048);
    assert_eq!(mem.free_kb, 1024);

    let net = sampler.net_stats().unwrap();
    assert_eq!((net.down_bytes, net.up_bytes), (0, 0));

    // Same counters again: established baseline yields a zero delta.
    let net = sampler.net_stats().unwrap();
    assert_eq!((net.down_bytes, net.up_bytes), (0, 0));

    // Advance the counters and check the delta comes through.
    fs::write(
        dir.path().join("net/dev"),
        "Inter-| Receive | Transmit\n face |bytes ...\n eth0: 400 2 0 0 0 0 0 0 250 2 0 0 0 0 0 0\n",
    )
    .unwrap();
    let net = sampler.net_stats().unwrap();
    assert_eq!((net.down_bytes, net.up_bytes), (300, 50));

    fs::write(dir.path().join("stat"), "cpu  150 0 75 1150 30 0 95\n").unwrap();
    let cpu = sampler.cpu_stats().unwrap();
    // 500 new ticks, 350 idle -> 30% busy.
    assert!((cpu.usage_percent - 30.0).abs() < 1e-9);
    assert_eq!(cpu.total_ticks, 1500);
}

#[test]
fn test_sampler_missing_source_is_an_error() {
    let dir = tempdir().unwrap();
    let mut sampler =
        SystemSampler::new("/".into()).with_proc_root(dir.path().to_path_buf());
    assert!(sampler.cpu_stats().is_err());
    assert!(sampler.mem_stats().is_err());
    assert!(sampler.net_stats().is_err());
}

#[test]
fn test_disk_usage_of_root() {
    let stats = disk_usage(std::path::Path::new("/")).unwrap();
    assert!(stats.total_bytes > 0);
    assert!(stats.used_bytes <= stats.total_bytes);
}

#[test]
fn test_disk_usage_of_missing_mount_is_an_error() {
    assert!(disk_usage(std::path::Path::new("/definitely/not/a/mount")).is_err());
}
