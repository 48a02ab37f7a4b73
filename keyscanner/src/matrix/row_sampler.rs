//! Interrupt driven row sampler.
//!
//! Only one row is selected at a time. A pin change interrupt on the input
//! columns records the last sample of that row and whether it changed, through
//! [`EdgeCapture::on_edge`]. On every scan tick the sampler hands the capture
//! over to the next row in a single atomic exchange, and debounces the sample
//! captured for the row it just left. Each row is thus debounced once every
//! [`ROWS`] ticks.
//!
//! The edge interrupt is masked while the rows are switched, edges during that
//! window are reconciled by reading the new row once it's selected. A bounce
//! which starts and ends while the interrupt is masked is missed.

use portable_atomic::{AtomicBool, AtomicU16, Ordering};

use super::{ScanPins, ScanStrategy};
use crate::debounce::{ChangeMask, DebouncerTrait, RawSample};

/// Rows in the round robin
pub const ROWS: usize = 4;

/// Set in the packed capture when the row's input changed since the last exchange
const CHANGED: u16 = 1 << 8;

/// What the edge interrupt saw on a row while it was selected
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeSnapshot {
    /// Last sample of the row
    pub sample: RawSample,
    /// Whether any edge was recorded
    pub changed: bool,
}

impl EdgeSnapshot {
    fn pack(self) -> u16 {
        self.sample as u16 | if self.changed { CHANGED } else { 0 }
    }

    fn unpack(packed: u16) -> Self {
        Self {
            sample: packed as u8,
            changed: packed & CHANGED != 0,
        }
    }
}

/// State shared between the edge interrupt and the scan loop.
///
/// The interrupt is the only writer of new samples, the scan loop only swaps
/// the whole state out. Sample and changed flag live in one atomic so they are
/// always exchanged together.
pub struct EdgeCapture {
    state: AtomicU16,
    masked: AtomicBool,
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeCapture {
    pub const fn new() -> Self {
        Self {
            state: AtomicU16::new(0),
            masked: AtomicBool::new(false),
        }
    }

    /// Record a sample of the selected row, call it from the pin change interrupt
    pub fn on_edge(&self, sample: RawSample) {
        if self.masked.load(Ordering::Acquire) {
            return;
        }
        let _ = self.state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
            (packed as u8 != sample).then_some(sample as u16 | CHANGED)
        });
    }

    /// Ignore edges until [`EdgeCapture::unmask`]
    pub fn mask(&self) {
        self.masked.store(true, Ordering::Release);
    }

    pub fn unmask(&self) {
        self.masked.store(false, Ordering::Release);
    }

    /// Take the capture of the current row and start the next one from `baseline`
    pub fn exchange(&self, baseline: RawSample) -> EdgeSnapshot {
        let snapshot = EdgeSnapshot {
            sample: baseline,
            changed: false,
        };
        EdgeSnapshot::unpack(self.state.swap(snapshot.pack(), Ordering::AcqRel))
    }

    /// Look at the capture without taking it
    pub fn peek(&self) -> EdgeSnapshot {
        EdgeSnapshot::unpack(self.state.load(Ordering::Acquire))
    }
}

/// Samples one of [`ROWS`] rows per tick, see the module docs
pub struct RowSampler<'a, P: ScanPins> {
    pins: P,
    capture: &'a EdgeCapture,
    /// Row currently selected
    current: usize,
    /// Last captured sample of every row
    buffered: [RawSample; ROWS],
    /// Rows whose capture changed but ended on the baseline, row `r` in bit `r`
    gap_bounces: u8,
}

impl<'a, P: ScanPins> RowSampler<'a, P> {
    /// Create a row sampler, selects row 0
    pub fn new(mut pins: P, capture: &'a EdgeCapture) -> Self {
        capture.mask();
        capture.exchange(0);
        pins.drive_line(0);
        capture.unmask();
        capture.on_edge(pins.read_columns());
        Self {
            pins,
            capture,
            current: 0,
            buffered: [0; ROWS],
            gap_bounces: 0,
        }
    }

    /// Row currently selected
    pub fn current_row(&self) -> usize {
        self.current
    }

    /// Rows which bounced between two ticks without a visible change in their
    /// sample, as of their last capture
    pub fn gap_bounces(&self) -> u8 {
        self.gap_bounces
    }

    pub fn pins(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Switch to the next row, returns the captured row and its capture
    fn advance(&mut self) -> (usize, EdgeSnapshot) {
        let row = self.current;
        let next = (row + 1) % ROWS;

        self.capture.mask();
        let snapshot = self.capture.exchange(self.buffered[next]);
        self.pins.release_line(row);
        self.pins.drive_line(next);
        self.capture.unmask();
        self.current = next;

        // Catch up with what the interrupt missed while masked
        self.capture.on_edge(self.pins.read_columns());

        if snapshot.changed && snapshot.sample == self.buffered[row] {
            debug!("Row {} bounced between ticks", row);
            self.gap_bounces |= 1 << row;
        } else {
            self.gap_bounces &= !(1 << row);
        }
        self.buffered[row] = snapshot.sample;
        (row, snapshot)
    }
}

impl<P: ScanPins> ScanStrategy<ROWS> for RowSampler<'_, P> {
    fn scan<D: DebouncerTrait>(&mut self, debouncer: &D, lines: &mut [D::State; ROWS]) -> ChangeMask {
        let (row, snapshot) = self.advance();
        debouncer.debounce(snapshot.sample, &mut lines[row])
    }
}
