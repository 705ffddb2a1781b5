//! Live progress display
//!
//! Samples [`PoolCounters`] at a fixed interval while a pool runs and renders
//! one console line per sample with rates since the previous sample.
//!
//! ```no_run
//! use fsdrill::stats::live::LiveProgress;
//! use fsdrill::stats::PoolCounters;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let counters = Arc::new(PoolCounters::new());
//! let mut live = LiveProgress::new(Duration::from_secs(1));
//! if live.should_update() {
//!     println!("{}", live.update(&counters));
//! }
//! ```

use crate::stats::{CounterSnapshot, PoolCounters};
use crate::util::time::{format_rate, format_throughput, per_second};
use std::time::{Duration, Instant};

/// Interval sampler over pool counters
#[derive(Debug)]
pub struct LiveProgress {
    interval: Duration,
    start: Instant,
    last_update: Instant,
    last: CounterSnapshot,
}

impl LiveProgress {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            start: now,
            last_update: now,
            last: CounterSnapshot::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn should_update(&self) -> bool {
        self.last_update.elapsed() >= self.interval
    }

    /// Take a sample and render it
    pub fn update(&mut self, counters: &PoolCounters) -> String {
        let now = Instant::now();
        let current = counters.snapshot();
        let window = now.duration_since(self.last_update);

        let line = render_line(now.duration_since(self.start), window, &self.last, &current);

        self.last = current;
        self.last_update = now;
        line
    }
}

fn render_line(
    elapsed: Duration,
    window: Duration,
    previous: &CounterSnapshot,
    current: &CounterSnapshot,
) -> String {
    let ops = current.ops.saturating_sub(previous.ops);
    let bytes = current.bytes.saturating_sub(previous.bytes);

    format!(
        "[{:>6.1}s] ops/s: {:>8}  tput: {:>14}  total ops: {}  errors: {}",
        elapsed.as_secs_f64(),
        format_rate(per_second(ops, window)),
        format_throughput(per_second(bytes, window)),
        current.ops,
        current.errors,
    )
}
