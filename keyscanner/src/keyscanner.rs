use embassy_futures::yield_now;

use crate::debounce::{ChangeMask, DebouncerTrait};
use crate::matrix::ScanStrategy;
use crate::recorder::{ReportSink, StateRecorder};
use crate::scheduler::ScanScheduler;

/// The scan loop: on every pending tick, scan the matrix, debounce it and record
/// the stable state when any key changed.
///
/// Owns the debounce state of all `LINES` scan lines for its whole lifetime.
pub struct KeyScanner<'a, S: ScanStrategy<LINES>, D: DebouncerTrait, R: ReportSink, const LINES: usize> {
    scanner: S,
    debouncer: D,
    lines: [D::State; LINES],
    recorder: StateRecorder,
    sink: R,
    scheduler: &'a ScanScheduler,
}

impl<'a, S: ScanStrategy<LINES>, D: DebouncerTrait, R: ReportSink, const LINES: usize> KeyScanner<'a, S, D, R, LINES> {
    pub fn new(scanner: S, debouncer: D, recorder: StateRecorder, sink: R, scheduler: &'a ScanScheduler) -> Self {
        Self {
            scanner,
            debouncer,
            lines: core::array::from_fn(|_| D::State::default()),
            recorder,
            sink,
            scheduler,
        }
    }

    /// Run one scan if a tick is pending, returns the keys changed by it
    pub fn poll(&mut self) -> ChangeMask {
        if !self.scheduler.take_pending() {
            return 0;
        }

        let changes = self.scanner.scan(&self.debouncer, &mut self.lines);
        // Most of the time there's no change
        if changes != 0 {
            trace!("Debounced changes: {:b}", changes);
            self.recorder.record(&self.lines, &mut self.sink);
        }
        changes
    }

    /// Poll forever, yielding to the executor between polls
    pub async fn run(&mut self) -> ! {
        loop {
            self.poll();
            yield_now().await;
        }
    }

    /// Debounce state of every scan line
    pub fn lines(&self) -> &[D::State; LINES] {
        &self.lines
    }

    pub fn scanner(&mut self) -> &mut S {
        &mut self.scanner
    }

    pub fn sink(&mut self) -> &mut R {
        &mut self.sink
    }
}
