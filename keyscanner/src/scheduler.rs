//! Scan scheduling.
//!
//! A periodic tick arms a pending flag, the scan loop consumes it. Ticks don't
//! queue: any number of ticks between two checks result in a single scan.
//!
//! The tick comes either from a hardware timer interrupt calling
//! [`ScanScheduler::on_timer_tick`], or from [`ScanScheduler::run`] on an
//! embassy executor.

use embassy_time::{Duration, Timer};
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::ScanConfig;

/// Scheduler of the keyboard's matrix scan
pub static SCAN_SCHEDULER: ScanScheduler = ScanScheduler::new(ScanConfig::DEFAULT);

pub struct ScanScheduler {
    pending: AtomicBool,
    /// Tick period in timer units
    interval: AtomicU8,
    interval_unit_us: u32,
}

impl ScanScheduler {
    /// Create a scheduler, a scan is pending right away
    pub const fn new(config: ScanConfig) -> Self {
        Self {
            pending: AtomicBool::new(true),
            interval: AtomicU8::new(config.interval),
            interval_unit_us: config.interval_unit_us,
        }
    }

    /// Arm a scan, safe to call from interrupt context
    pub fn on_timer_tick(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Whether a scan is due, clears the pending flag
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Current tick period in timer units
    pub fn interval(&self) -> u8 {
        self.interval.load(Ordering::Relaxed)
    }

    /// Change the tick period, effective from the next tick. 0 is raised to 1.
    pub fn set_interval(&self, interval: u8) {
        let interval = interval.max(1);
        info!("Set scan interval to {} ({}us)", interval, interval as u32 * self.interval_unit_us);
        self.interval.store(interval, Ordering::Relaxed);
    }

    /// Current tick period
    pub fn period(&self) -> Duration {
        Duration::from_micros(self.interval() as u64 * self.interval_unit_us as u64)
    }

    /// Tick forever, for firmwares without a dedicated timer interrupt
    pub async fn run(&self) -> ! {
        info!("Scan ticker started, interval {}", self.interval());
        loop {
            Timer::after(self.period()).await;
            self.on_timer_tick();
        }
    }
}
