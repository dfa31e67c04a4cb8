//! Fixed-period sample capture.
//!
//! The producer runs on the invoking thread. Every tick it opens a fresh
//! property task on the target node, reads each dump property in column
//! order and pushes one [`SampleRow`] into the hand-off queue.
//!
//! # Rate Limiting
//!
//! Tick `k` is scheduled `k * period` after the loop started. Reading time
//! and oversleeping do not accumulate; a tick that overruns its period
//! makes the next one start immediately and the schedule continues from
//! there.

use crate::backend::DeviceNetwork;
use crate::config::{DumpPropertySpec, RunSettings};
use crate::error::{Result, ResultExt};
use crate::pipeline::queue::RowSender;
use crate::types::{NodeHandle, SampleRow, TIMESTAMP_FORMAT};
use std::time::{Duration, Instant};

/// Captures `samples_count` rows from the target node at a fixed period
pub struct SampleProducer<'a, N: DeviceNetwork + ?Sized> {
    network: &'a N,
    node: NodeHandle,
    spec: &'a DumpPropertySpec,
    period: Duration,
    samples_count: u64,
}

impl<'a, N: DeviceNetwork + ?Sized> SampleProducer<'a, N> {
    /// Create a producer for the target node
    pub fn new(
        network: &'a N,
        node: NodeHandle,
        spec: &'a DumpPropertySpec,
        settings: &RunSettings,
    ) -> Self {
        Self {
            network,
            node,
            spec,
            period: settings.period(),
            samples_count: settings.samples_count,
        }
    }

    /// Run the sampling loop, returning the number of rows pushed
    ///
    /// Stops at the first tick whose task cannot be opened or whose read
    /// fails; that tick pushes nothing. The queue is closed when this
    /// returns, on every path.
    pub fn run(&self, mut queue: RowSender) -> Result<u64> {
        tracing::info!(
            "Sampling {} every {} ms, {} samples",
            self.node,
            self.period.as_millis(),
            self.samples_count
        );

        let start = Instant::now();
        let mut tick_start = start;

        for tick in 0..self.samples_count {
            let row = self
                .capture(tick_start.duration_since(start))
                .with_context(|| format!("Sampling stopped at tick {}", tick + 1))
                .inspect_err(|e| tracing::error!("{}", e))?;
            queue.push(row)?;

            if tick + 1 < self.samples_count {
                let next_tick = tick_start + self.period;
                let now = Instant::now();
                if next_tick > now {
                    std::thread::sleep(next_tick - now);
                }
                // Keep the schedule anchored to the loop start; only overruns shift it
                tick_start = next_tick.max(now);
            }
        }

        let produced = queue.pushed();
        tracing::debug!("Producer finished: {} rows", produced);
        Ok(produced)
    }

    /// Capture one row through a fresh property task
    fn capture(&self, elapsed: Duration) -> Result<SampleRow> {
        let mut task = self.network.open_property_task(self.node)?;

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut row = SampleRow::new(timestamp, elapsed, self.spec.len());
        for name in self.spec.property_names() {
            row.push_value(task.string_property(name)?);
        }

        tracing::trace!("Captured row at {} ms: {:?}", elapsed.as_millis(), row.values());
        Ok(row)
    }
}
