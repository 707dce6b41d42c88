// Network collector: per-interface counter deltas keyed by name.

use std::collections::HashMap;
use std::time::Instant;

use crate::models::{InterfaceRate, NetworkSample};
use crate::probes::{InterfaceCounters, InterfaceProbe};

pub struct NetworkCollector {
    probe: InterfaceProbe,
    prev: HashMap<String, (u64, u64)>,
    last_sampled: Option<Instant>,
}

impl Default for NetworkCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkCollector {
    pub fn new() -> Self {
        Self {
            probe: InterfaceProbe::new(),
            prev: HashMap::new(),
            last_sampled: None,
        }
    }

    pub fn refresh(&mut self) -> NetworkSample {
        let counters = self.probe.counters();
        let now = Instant::now();
        let elapsed = self
            .last_sampled
            .map(|at| now.duration_since(at).as_secs_f64())
            .unwrap_or(0.0);
        self.last_sampled = Some(now);
        Self::compute(&mut self.prev, &counters, elapsed)
    }

    /// First sighting of an interface yields 0/0. Interfaces that vanished
    /// are pruned from the previous map so a re-appearance starts fresh.
    /// The aggregate rates are the sums of the per-interface rates.
    pub fn compute(
        prev: &mut HashMap<String, (u64, u64)>,
        counters: &[InterfaceCounters],
        elapsed_secs: f64,
    ) -> NetworkSample {
        let mut interfaces = Vec::with_capacity(counters.len());
        let mut next = HashMap::with_capacity(counters.len());
        let mut rx_total = 0.0;
        let mut tx_total = 0.0;
        for c in counters {
            let (rx_bps, tx_bps) = match prev.get(&c.name) {
                Some(&(prev_rx, prev_tx)) if elapsed_secs > 0.0 => (
                    c.received.saturating_sub(prev_rx) as f64 / elapsed_secs,
                    c.transmitted.saturating_sub(prev_tx) as f64 / elapsed_secs,
                ),
                _ => (0.0, 0.0),
            };
            rx_total += rx_bps;
            tx_total += tx_bps;
            next.insert(c.name.clone(), (c.received, c.transmitted));
            interfaces.push(InterfaceRate {
                name: c.name.clone(),
                received_bytes_per_sec: rx_bps,
                transmitted_bytes_per_sec: tx_bps,
            });
        }
        *prev = next;
        NetworkSample {
            received_bytes_per_sec: rx_total,
            transmitted_bytes_per_sec: tx_total,
            interfaces,
            ping_ms: None,
            public_address: None,
        }
    }
}
