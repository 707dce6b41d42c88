// Kernel and hardware accessors. Each probe wraps exactly one OS query and
// returns raw values or "no data"; delta state lives in the collectors.

mod linux;

use sysinfo::{Disks, Networks, System};

/// Raw per-core scheduler tick counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CoreTicks {
    pub fn used(&self) -> u64 {
        self.user + self.system + self.nice
    }

    pub fn total(&self) -> u64 {
        self.used() + self.idle
    }
}

/// Performance/efficiency core counts; both zero on topologies with a
/// single performance level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreTopology {
    pub performance: u32,
    pub efficiency: u32,
}

/// Virtual-memory occupancy in bytes, converted from page counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmPages {
    pub free: u64,
    pub active: u64,
    pub inactive: u64,
    pub wired: u64,
    pub compressed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapUsage {
    pub used: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeSpace {
    pub total: u64,
    pub available: u64,
}

/// Cumulative read/write byte totals summed across block devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskIoTotals {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Cumulative per-interface byte counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub received: u64,
    pub transmitted: u64,
}

/// Parse `/proc/stat` per-core lines ("cpu0 ..."), skipping the aggregate
/// "cpu" line. irq/softirq time counts as system, iowait as idle.
pub fn parse_cpu_ticks(content: &str) -> Vec<CoreTicks> {
    let mut ticks = Vec::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else { continue };
        if !label.starts_with("cpu") || label == "cpu" {
            continue;
        }
        let v: Vec<u64> = fields.map(|f| f.parse().unwrap_or(0)).collect();
        if v.len() < 4 {
            continue;
        }
        ticks.push(CoreTicks {
            user: v[0],
            nice: v[1],
            system: v[2] + v.get(5).copied().unwrap_or(0) + v.get(6).copied().unwrap_or(0),
            idle: v[3] + v.get(4).copied().unwrap_or(0),
        });
    }
    ticks
}

/// Count CPUs in a sysfs cpulist such as "0-7" or "0-3,8,10-11".
pub fn parse_cpu_list(list: &str) -> u32 {
    let mut count = 0;
    for part in list.trim().split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            Some((lo, hi)) => {
                if let (Ok(lo), Ok(hi)) = (lo.parse::<u32>(), hi.parse::<u32>())
                    && hi >= lo
                {
                    count += hi - lo + 1;
                }
            }
            None => {
                if part.parse::<u32>().is_ok() {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Parse `/proc/vmstat` page counters into bytes. Returns `None` when the
/// free-page counter is missing (nothing meaningful to report).
pub fn parse_vm_pages(vmstat: &str, page_size: u64) -> Option<VmPages> {
    let mut free = None;
    let mut active = 0u64;
    let mut inactive = 0u64;
    let mut wired = 0u64;
    let mut compressed = 0u64;
    for line in vmstat.lines() {
        let Some((key, value)) = line.split_once(' ') else {
            continue;
        };
        let Ok(pages) = value.trim().parse::<u64>() else {
            continue;
        };
        match key {
            "nr_free_pages" => free = Some(pages),
            "nr_active_anon" | "nr_active_file" => active += pages,
            "nr_inactive_anon" | "nr_inactive_file" => inactive += pages,
            "nr_unevictable" => wired += pages,
            "nr_zspages" => compressed += pages,
            _ => {}
        }
    }
    Some(VmPages {
        free: free? * page_size,
        active: active * page_size,
        inactive: inactive * page_size,
        wired: wired * page_size,
        compressed: compressed * page_size,
    })
}

/// Parse swap occupancy from `/proc/meminfo` (values in kB).
pub fn parse_swap(meminfo: &str) -> SwapUsage {
    let mut total = 0u64;
    let mut free = 0u64;
    for line in meminfo.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let kb = rest
            .trim()
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        match key {
            "SwapTotal" => total = kb * 1024,
            "SwapFree" => free = kb * 1024,
            _ => {}
        }
    }
    SwapUsage {
        used: total.saturating_sub(free),
        total,
    }
}

/// Sum cumulative sector counters from `/proc/diskstats` across whole block
/// devices (partitions and virtual devices are skipped).
pub fn parse_disk_io(diskstats: &str) -> DiskIoTotals {
    const SECTOR_SIZE: u64 = 512;
    let mut totals = DiskIoTotals::default();
    for line in diskstats.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let name = fields[2];
        if !is_whole_disk(name) {
            continue;
        }
        let sectors_read: u64 = fields[5].parse().unwrap_or(0);
        let sectors_written: u64 = fields[9].parse().unwrap_or(0);
        totals.read_bytes += sectors_read * SECTOR_SIZE;
        totals.write_bytes += sectors_written * SECTOR_SIZE;
    }
    totals
}

fn is_whole_disk(name: &str) -> bool {
    for prefix in ["loop", "ram", "zram", "dm-", "md", "sr", "fd"] {
        if name.starts_with(prefix) {
            return false;
        }
    }
    if let Some(rest) = name.strip_prefix("nvme").or_else(|| name.strip_prefix("mmcblk")) {
        // nvme0n1 / mmcblk0 are disks; nvme0n1p2 / mmcblk0p1 are partitions
        return !rest.contains('p');
    }
    // sda / vda / xvda are disks; a trailing digit marks a partition
    !name.ends_with(|c: char| c.is_ascii_digit())
}

/// Per-core tick counters from the kernel's CPU-load interface.
pub fn cpu_ticks() -> anyhow::Result<Vec<CoreTicks>> {
    let ticks = linux::read_proc_stat()
        .map(|s| parse_cpu_ticks(&s))
        .unwrap_or_default();
    anyhow::ensure!(!ticks.is_empty(), "no per-core tick counters available");
    Ok(ticks)
}

/// Performance/efficiency core counts from the system configuration
/// interface. Both zero unless the platform reports a hybrid topology.
pub fn core_topology() -> CoreTopology {
    let (performance, efficiency) = linux::core_counts();
    if performance > 0 && efficiency > 0 {
        CoreTopology {
            performance,
            efficiency,
        }
    } else {
        CoreTopology::default()
    }
}

pub fn vm_pages() -> anyhow::Result<VmPages> {
    linux::read_vmstat()
        .and_then(|s| parse_vm_pages(&s, page_size()))
        .ok_or_else(|| anyhow::anyhow!("virtual-memory statistics unavailable"))
}

pub fn swap_usage() -> anyhow::Result<SwapUsage> {
    linux::read_meminfo()
        .map(|s| parse_swap(&s))
        .ok_or_else(|| anyhow::anyhow!("swap statistics unavailable"))
}

pub fn disk_io_totals() -> anyhow::Result<DiskIoTotals> {
    linux::read_diskstats()
        .map(|s| parse_disk_io(&s))
        .ok_or_else(|| anyhow::anyhow!("block-storage counters unavailable"))
}

pub fn page_size() -> u64 {
    #[cfg(unix)]
    {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return size as u64;
        }
    }
    4096
}

/// GPU utilization from the performance registry, first numeric hit over
/// the candidate device/property lists, clamped to [0, 100].
pub fn gpu_utilization() -> Option<f64> {
    linux::gpu_property_scan(linux::GPU_BUSY_PROPS).map(|v| v.clamp(0.0, 100.0))
}

pub fn gpu_frequency_mhz() -> Option<u64> {
    linux::gpu_property_scan(linux::GPU_FREQ_PROPS).map(|v| v.max(0.0) as u64)
}

/// Free/total space on the root volume.
pub struct VolumeProbe {
    disks: Disks,
}

impl Default for VolumeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeProbe {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }

    pub fn root_space(&mut self) -> Option<VolumeSpace> {
        self.disks.refresh(false);
        let list = self.disks.list();
        let disk = list
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new("/"))
            .or_else(|| list.first())?;
        Some(VolumeSpace {
            total: disk.total_space(),
            available: disk.available_space(),
        })
    }
}

/// Cumulative per-interface byte counters via the link-layer enumeration.
pub struct InterfaceProbe {
    networks: Networks,
}

impl Default for InterfaceProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceProbe {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }

    pub fn counters(&mut self) -> Vec<InterfaceCounters> {
        self.networks.refresh(true);
        self.networks
            .list()
            .iter()
            .map(|(name, data)| InterfaceCounters {
                name: name.clone(),
                received: data.total_received(),
                transmitted: data.total_transmitted(),
            })
            .collect()
    }
}

/// Nominal CPU frequency; zero when the platform does not expose it.
pub struct FrequencyProbe {
    sys: System,
}

impl Default for FrequencyProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyProbe {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    pub fn nominal_mhz(&mut self) -> u64 {
        self.sys.refresh_cpu_all();
        self.sys.cpus().first().map(|c| c.frequency()).unwrap_or(0)
    }
}
