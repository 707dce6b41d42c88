// Collector delta/decode tests with synthetic raw readings

use std::collections::HashMap;
use std::time::Duration;

use sysmetrics::collectors::{
    CpuCollector, DiskCollector, MemoryCollector, NetworkCollector, health_text, pressure_level,
};
use sysmetrics::models::PressureLevel;
use sysmetrics::probes::{CoreTicks, CoreTopology, DiskIoTotals, InterfaceCounters, SwapUsage, VmPages};
use sysmetrics::smc::SmcClient;

fn smc_stub() -> SmcClient {
    SmcClient::new("/nonexistent/smc.sock", Duration::from_millis(10))
}

fn cpu_collector() -> CpuCollector {
    CpuCollector::with_topology(smc_stub(), CoreTopology::default())
}

fn ticks(user: u64, nice: u64, system: u64, idle: u64) -> CoreTicks {
    CoreTicks {
        user,
        nice,
        system,
        idle,
    }
}

#[test]
fn test_cpu_first_sample_uses_snapshot_formula() {
    let mut cpu = cpu_collector();
    let sample = cpu.ingest(Some(vec![ticks(300, 100, 100, 500)]), 2400, None);
    // (300 + 100 + 100) / 1000 as an instantaneous ratio, no delta
    assert_eq!(sample.usage_percent, 50.0);
    assert_eq!(sample.core_count, 1);
    assert_eq!(sample.frequency_mhz, 2400);
    // no previous tick exists, so the per-core list stays empty
    assert!(sample.per_core_usage.is_empty());
}

#[test]
fn test_cpu_second_sample_uses_delta_formula() {
    let mut cpu = cpu_collector();
    cpu.ingest(Some(vec![ticks(100, 0, 50, 800)]), 0, None);
    let sample = cpu.ingest(Some(vec![ticks(120, 0, 60, 820)]), 0, None);
    // usedDelta = 30, totalDelta = 50
    assert_eq!(sample.usage_percent, 60.0);
    assert_eq!(sample.per_core_usage, vec![60.0]);
    assert_eq!(sample.user_percent, 40.0);
    assert_eq!(sample.system_percent, 20.0);
}

#[test]
fn test_cpu_core_count_change_forces_snapshot() {
    let mut cpu = cpu_collector();
    cpu.ingest(
        Some(vec![ticks(100, 0, 50, 850), ticks(100, 0, 50, 850)]),
        0,
        None,
    );
    // topology shrank; usage must come from the instantaneous snapshot
    let sample = cpu.ingest(Some(vec![ticks(750, 0, 0, 250)]), 0, None);
    assert_eq!(sample.core_count, 1);
    assert_eq!(sample.usage_percent, 75.0);
    assert_eq!(sample.per_core_usage, vec![75.0]);
}

#[test]
fn test_cpu_zero_total_delta_is_zero_usage() {
    let mut cpu = cpu_collector();
    cpu.ingest(Some(vec![ticks(100, 0, 50, 800)]), 0, None);
    let sample = cpu.ingest(Some(vec![ticks(100, 0, 50, 800)]), 0, None);
    assert_eq!(sample.usage_percent, 0.0);
    assert_eq!(sample.per_core_usage, vec![0.0]);
}

#[test]
fn test_cpu_counter_decrease_never_goes_negative() {
    let mut cpu = cpu_collector();
    cpu.ingest(Some(vec![ticks(1000, 0, 500, 8000)]), 0, None);
    let sample = cpu.ingest(Some(vec![ticks(900, 0, 400, 7000)]), 0, None);
    assert!(sample.usage_percent >= 0.0);
    assert!(sample.per_core_usage.iter().all(|&u| (0.0..=100.0).contains(&u)));
}

#[test]
fn test_cpu_percentages_bounded_for_arbitrary_inputs() {
    let mut cpu = cpu_collector();
    cpu.ingest(Some(vec![ticks(0, 0, 0, 0), ticks(5, 5, 5, 5)]), 0, None);
    let sample = cpu.ingest(
        Some(vec![ticks(u64::MAX / 2, 0, 0, 0), ticks(5, 5, 5, 5)]),
        0,
        None,
    );
    for value in [
        sample.usage_percent,
        sample.user_percent,
        sample.system_percent,
    ] {
        assert!((0.0..=100.0).contains(&value), "out of range: {value}");
    }
    assert!(sample.per_core_usage.iter().all(|&u| (0.0..=100.0).contains(&u)));
}

#[test]
fn test_cpu_degraded_sample_on_failed_query() {
    let mut cpu = cpu_collector();
    cpu.ingest(Some(vec![ticks(100, 0, 50, 800)]), 2400, None);
    let sample = cpu.ingest(None, 2400, Some(51.5));
    assert_eq!(sample.usage_percent, 0.0);
    assert!(sample.per_core_usage.is_empty());
    // static fields stay valid on a failed tick query
    assert_eq!(sample.frequency_mhz, 2400);
    assert_eq!(sample.temperature, Some(51.5));
    assert_eq!(sample.core_count, 1);
}

#[test]
fn test_cpu_performance_efficiency_groups() {
    let topology = CoreTopology {
        performance: 2,
        efficiency: 2,
    };
    let mut cpu = CpuCollector::with_topology(smc_stub(), topology);
    cpu.ingest(
        Some(vec![
            ticks(0, 0, 0, 0),
            ticks(0, 0, 0, 0),
            ticks(0, 0, 0, 0),
            ticks(0, 0, 0, 0),
        ]),
        0,
        None,
    );
    let sample = cpu.ingest(
        Some(vec![
            ticks(100, 0, 0, 0),
            ticks(50, 0, 0, 50),
            ticks(25, 0, 0, 75),
            ticks(75, 0, 0, 25),
        ]),
        0,
        None,
    );
    assert_eq!(sample.performance_core_count, 2);
    assert_eq!(sample.efficiency_core_count, 2);
    assert_eq!(sample.performance_usage_percent, 75.0);
    assert_eq!(sample.efficiency_usage_percent, 50.0);
}

#[test]
fn test_cpu_single_level_topology_has_zero_group_counts() {
    let mut cpu = cpu_collector();
    let sample = cpu.ingest(Some(vec![ticks(10, 0, 10, 80)]), 0, None);
    assert_eq!(sample.performance_core_count, 0);
    assert_eq!(sample.efficiency_core_count, 0);
    assert_eq!(sample.performance_usage_percent, 0.0);
    assert_eq!(sample.efficiency_usage_percent, 0.0);
}

const GIB: u64 = 1024 * 1024 * 1024;

#[test]
fn test_memory_compose_basic_math() {
    let pages = VmPages {
        free: 4 * GIB,
        active: 2 * GIB,
        inactive: GIB,
        wired: GIB / 2,
        compressed: GIB / 2,
    };
    let swap = SwapUsage {
        used: GIB,
        total: 2 * GIB,
    };
    let sample = MemoryCollector::compose(Some(pages), Some(swap));
    assert_eq!(sample.used, 4 * GIB);
    assert_eq!(sample.total, 8 * GIB);
    assert_eq!(sample.usage_percent, 50.0);
    assert_eq!(sample.pressure_percent, 62.5);
    assert_eq!(sample.pressure_level, PressureLevel::Warning);
}

#[test]
fn test_memory_pressure_includes_swap_and_caps_at_100() {
    // used = 6 GiB, swap used = 2 GiB, total = 8 GiB
    let pages = VmPages {
        free: 2 * GIB,
        active: 6 * GIB,
        inactive: 0,
        wired: 0,
        compressed: 0,
    };
    let swap = SwapUsage {
        used: 2 * GIB,
        total: 4 * GIB,
    };
    let sample = MemoryCollector::compose(Some(pages), Some(swap));
    assert_eq!(sample.pressure_percent, 100.0);
    assert_eq!(sample.pressure_level, PressureLevel::Critical);
}

#[test]
fn test_memory_failed_query_yields_zero_sample_at_normal() {
    let sample = MemoryCollector::compose(None, None);
    assert_eq!(sample.total, 0);
    assert_eq!(sample.used, 0);
    assert_eq!(sample.usage_percent, 0.0);
    assert_eq!(sample.pressure_percent, 0.0);
    assert_eq!(sample.pressure_level, PressureLevel::Normal);
}

#[test]
fn test_pressure_level_bands() {
    assert_eq!(pressure_level(0.0), PressureLevel::Normal);
    assert_eq!(pressure_level(59.9), PressureLevel::Normal);
    assert_eq!(pressure_level(60.0), PressureLevel::Warning);
    assert_eq!(pressure_level(79.9), PressureLevel::Warning);
    assert_eq!(pressure_level(80.0), PressureLevel::Critical);
    assert_eq!(pressure_level(100.0), PressureLevel::Critical);
}

#[test]
fn test_disk_rates_over_one_second_tick() {
    let prev = DiskIoTotals {
        read_bytes: 1_000_000,
        write_bytes: 500_000,
    };
    let current = DiskIoTotals {
        read_bytes: 1_500_000,
        write_bytes: 500_000,
    };
    let (read_bps, write_bps) = DiskCollector::rates(&prev, &current, 1.0);
    assert_eq!(read_bps, 500_000.0);
    assert_eq!(write_bps, 0.0);
}

#[test]
fn test_disk_rates_scale_with_interval() {
    let prev = DiskIoTotals {
        read_bytes: 0,
        write_bytes: 0,
    };
    let current = DiskIoTotals {
        read_bytes: 1_000_000,
        write_bytes: 2_000_000,
    };
    let (read_bps, write_bps) = DiskCollector::rates(&prev, &current, 2.0);
    assert_eq!(read_bps, 500_000.0);
    assert_eq!(write_bps, 1_000_000.0);
}

#[test]
fn test_disk_counter_decrease_clamps_to_zero() {
    // hot-plug can shrink the summed counters; never negative or wrapped
    let prev = DiskIoTotals {
        read_bytes: 2_000_000,
        write_bytes: 2_000_000,
    };
    let current = DiskIoTotals {
        read_bytes: 1_000_000,
        write_bytes: 2_500_000,
    };
    let (read_bps, write_bps) = DiskCollector::rates(&prev, &current, 1.0);
    assert_eq!(read_bps, 0.0);
    assert_eq!(write_bps, 500_000.0);
}

#[test]
fn test_disk_zero_elapsed_yields_zero_rates() {
    let totals = DiskIoTotals {
        read_bytes: 1_000_000,
        write_bytes: 1_000_000,
    };
    let (read_bps, write_bps) = DiskCollector::rates(&totals, &totals, 0.0);
    assert_eq!(read_bps, 0.0);
    assert_eq!(write_bps, 0.0);
}

fn iface(name: &str, received: u64, transmitted: u64) -> InterfaceCounters {
    InterfaceCounters {
        name: name.into(),
        received,
        transmitted,
    }
}

#[test]
fn test_network_first_sighting_yields_zero_rates() {
    let mut prev = HashMap::new();
    let sample = NetworkCollector::compute(&mut prev, &[iface("eth0", 10_000, 5_000)], 1.0);
    assert_eq!(sample.interfaces.len(), 1);
    assert_eq!(sample.interfaces[0].received_bytes_per_sec, 0.0);
    assert_eq!(sample.received_bytes_per_sec, 0.0);
}

#[test]
fn test_network_aggregate_equals_sum_of_interfaces() {
    let mut prev = HashMap::new();
    NetworkCollector::compute(
        &mut prev,
        &[iface("eth0", 1_000, 500), iface("wlan0", 2_000, 100)],
        1.0,
    );
    let sample = NetworkCollector::compute(
        &mut prev,
        &[iface("eth0", 2_500, 800), iface("wlan0", 3_000, 400)],
        1.0,
    );
    assert_eq!(sample.interfaces[0].received_bytes_per_sec, 1_500.0);
    assert_eq!(sample.interfaces[1].received_bytes_per_sec, 1_000.0);
    let rx_sum: f64 = sample
        .interfaces
        .iter()
        .map(|i| i.received_bytes_per_sec)
        .sum();
    let tx_sum: f64 = sample
        .interfaces
        .iter()
        .map(|i| i.transmitted_bytes_per_sec)
        .sum();
    assert_eq!(sample.received_bytes_per_sec, rx_sum);
    assert_eq!(sample.transmitted_bytes_per_sec, tx_sum);
}

#[test]
fn test_network_counter_decrease_clamps_to_zero() {
    let mut prev = HashMap::new();
    NetworkCollector::compute(&mut prev, &[iface("eth0", 10_000, 10_000)], 1.0);
    let sample = NetworkCollector::compute(&mut prev, &[iface("eth0", 5_000, 12_000)], 1.0);
    assert_eq!(sample.interfaces[0].received_bytes_per_sec, 0.0);
    assert_eq!(sample.interfaces[0].transmitted_bytes_per_sec, 2_000.0);
}

#[test]
fn test_network_removed_interface_restarts_fresh() {
    let mut prev = HashMap::new();
    NetworkCollector::compute(
        &mut prev,
        &[iface("eth0", 1_000, 1_000), iface("eth1", 1_000, 1_000)],
        1.0,
    );
    // eth1 vanished; its previous counters must be pruned
    NetworkCollector::compute(&mut prev, &[iface("eth0", 2_000, 2_000)], 1.0);
    let sample = NetworkCollector::compute(
        &mut prev,
        &[iface("eth0", 3_000, 3_000), iface("eth1", 9_000, 9_000)],
        1.0,
    );
    let eth1 = sample.interfaces.iter().find(|i| i.name == "eth1").unwrap();
    assert_eq!(eth1.received_bytes_per_sec, 0.0);
    assert_eq!(eth1.transmitted_bytes_per_sec, 0.0);
}

#[test]
fn test_battery_health_bands() {
    assert_eq!(health_text(f64::NAN), "Unknown");
    assert_eq!(health_text(95.0), "Good");
    assert_eq!(health_text(80.0), "Good");
    assert_eq!(health_text(65.0), "Fair");
    assert_eq!(health_text(20.0), "Poor");
}
