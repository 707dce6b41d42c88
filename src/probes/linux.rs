// Linux-specific readers: /proc counters, sysfs topology, DRM registry.

/// Ordered property candidates for GPU busy percent (amdgpu, then i915).
pub(super) const GPU_BUSY_PROPS: &[&str] = &["gpu_busy_percent", "gt_busy_percent"];

/// Ordered property candidates for GPU clock in MHz.
pub(super) const GPU_FREQ_PROPS: &[&str] = &["gt_act_freq_mhz", "gt_cur_freq_mhz"];

pub(super) fn read_proc_stat() -> Option<String> {
    read_file("/proc/stat")
}

pub(super) fn read_vmstat() -> Option<String> {
    read_file("/proc/vmstat")
}

pub(super) fn read_meminfo() -> Option<String> {
    read_file("/proc/meminfo")
}

pub(super) fn read_diskstats() -> Option<String> {
    read_file("/proc/diskstats")
}

fn read_file(path: &str) -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string(path).ok()
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = path;
        None
    }
}

/// Hybrid-topology core counts from /sys/devices/cpu_core and cpu_atom.
/// (0, 0) when the sysfs nodes are absent.
pub(super) fn core_counts() -> (u32, u32) {
    #[cfg(target_os = "linux")]
    {
        let count = |path: &str| -> u32 {
            std::fs::read_to_string(path)
                .map(|s| super::parse_cpu_list(&s))
                .unwrap_or(0)
        };
        (
            count("/sys/devices/cpu_core/cpus"),
            count("/sys/devices/cpu_atom/cpus"),
        )
    }
    #[cfg(not(target_os = "linux"))]
    (0, 0)
}

/// First numeric hit over the DRM card nodes x candidate property names.
pub(super) fn gpu_property_scan(props: &[&str]) -> Option<f64> {
    #[cfg(target_os = "linux")]
    for card in 0..4 {
        for prop in props {
            let path = format!("/sys/class/drm/card{card}/device/{prop}");
            if let Ok(content) = std::fs::read_to_string(&path)
                && let Ok(value) = content.trim().parse::<f64>()
            {
                return Some(value);
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = props;
    None
}
