// GPU collector: performance-registry candidate scan plus sensor
// temperature. FPS comes from the external display-refresh sampler and is
// merged by the aggregator.

use crate::models::GpuSample;
use crate::probes;
use crate::smc::{SmcClient, keys, proto::Encoding};

pub struct GpuCollector {
    smc: SmcClient,
}

impl GpuCollector {
    pub fn new(smc: SmcClient) -> Self {
        Self { smc }
    }

    pub fn refresh(&mut self) -> Option<GpuSample> {
        let utilization_percent = probes::gpu_utilization();
        let frequency_mhz = probes::gpu_frequency_mhz();
        let temperature = self.smc.read_first(keys::GPU_TEMP_KEYS, Encoding::Sp78);
        if utilization_percent.is_none() && frequency_mhz.is_none() && temperature.is_none() {
            return None;
        }
        Some(GpuSample {
            utilization_percent,
            frequency_mhz,
            temperature,
            fps: None,
        })
    }
}
