//! Matrix scanning.
//!
//! A [`ScanStrategy`] drives the scan lines through [`ScanPins`], feeds the raw
//! samples into a debounce engine and returns the accumulated change mask of a
//! scan pass. Two strategies exist:
//! - [`StabilityScanner`]: scans every line on each pass, reading every line
//!   repeatedly to flag unstable lines.
//! - [`row_sampler::RowSampler`]: watches one row per tick, an edge interrupt
//!   fills the gaps between ticks.

pub mod row_sampler;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::ScanConfig;
use crate::debounce::{ChangeMask, DebouncerTrait, RawSample};

/// Raw access to the switch matrix.
///
/// Samples returned by [`ScanPins::read_columns`] are polarity normalized: a set
/// bit is a closed contact, whatever the electrical level of the pins.
pub trait ScanPins {
    /// Select a scan line
    fn drive_line(&mut self, line: usize);

    /// Deselect a scan line
    fn release_line(&mut self, line: usize);

    /// Read all input columns of the selected line, column `c` in bit `c`
    fn read_columns(&mut self) -> RawSample;
}

/// Matrix pins on plain GPIOs.
///
/// Output pins select the scan lines, input pins are the columns. With
/// `low_active`, inputs are pulled up and a line is selected by driving it low.
pub struct GpioMatrixPins<
    In: InputPin,
    Out: OutputPin,
    D: DelayNs,
    const INPUT_PIN_NUM: usize,
    const OUTPUT_PIN_NUM: usize,
> {
    input_pins: [In; INPUT_PIN_NUM],
    output_pins: [Out; OUTPUT_PIN_NUM],
    delay: D,
    low_active: bool,
}

impl<In: InputPin, Out: OutputPin, D: DelayNs, const INPUT_PIN_NUM: usize, const OUTPUT_PIN_NUM: usize>
    GpioMatrixPins<In, Out, D, INPUT_PIN_NUM, OUTPUT_PIN_NUM>
{
    /// Create matrix pins, all scan lines start deselected
    pub fn new(
        input_pins: [In; INPUT_PIN_NUM],
        output_pins: [Out; OUTPUT_PIN_NUM],
        delay: D,
        low_active: bool,
    ) -> Self {
        const { assert!(INPUT_PIN_NUM <= 8, "a scan line has at most 8 columns") };
        let mut pins = Self {
            input_pins,
            output_pins,
            delay,
            low_active,
        };
        for line in 0..OUTPUT_PIN_NUM {
            pins.release_line(line);
        }
        pins
    }

    fn set_line(&mut self, line: usize, active: bool) {
        if let Some(out_pin) = self.output_pins.get_mut(line) {
            if active != self.low_active {
                out_pin.set_high().ok();
            } else {
                out_pin.set_low().ok();
            }
        }
    }
}

impl<In: InputPin, Out: OutputPin, D: DelayNs, const INPUT_PIN_NUM: usize, const OUTPUT_PIN_NUM: usize> ScanPins
    for GpioMatrixPins<In, Out, D, INPUT_PIN_NUM, OUTPUT_PIN_NUM>
{
    fn drive_line(&mut self, line: usize) {
        self.set_line(line, true);
        // Wait 1us ensuring the change comes into effect
        self.delay.delay_us(1);
    }

    fn release_line(&mut self, line: usize) {
        self.set_line(line, false);
    }

    fn read_columns(&mut self) -> RawSample {
        let low_active = self.low_active;
        self.input_pins.iter_mut().enumerate().fold(0, |sample, (col, in_pin)| {
            let pressed = if low_active {
                in_pin.is_low().ok().unwrap_or_default()
            } else {
                in_pin.is_high().ok().unwrap_or_default()
            };
            sample | ((pressed as u8) << col)
        })
    }
}

/// A way of turning the matrix into debounced changes.
///
/// `LINES` is the number of scan lines, every line has its own debounce state in `lines`.
pub trait ScanStrategy<const LINES: usize> {
    /// Run one scan pass, returns the keys whose debounced state flipped on any line
    fn scan<D: DebouncerTrait>(&mut self, debouncer: &D, lines: &mut [D::State; LINES]) -> ChangeMask;
}

/// Scans every line on each pass.
///
/// The whole matrix is read `output_loops` times, and every line `input_loops`
/// times per pass. The first read of a line on the first pass is its sample,
/// any later read disagreeing with it flags the line as unstable. Unstable lines
/// are still debounced, the flags are diagnostic only.
pub struct StabilityScanner<P: ScanPins, const LINES: usize> {
    pins: P,
    output_loops: u8,
    input_loops: u8,
    /// Columns which disagreed during the last scan, per line
    unstable: [u8; LINES],
}

impl<P: ScanPins, const LINES: usize> StabilityScanner<P, LINES> {
    pub fn new(pins: P, config: ScanConfig) -> Self {
        Self {
            pins,
            output_loops: config.stability_output_loops.max(1),
            input_loops: config.stability_input_loops,
            unstable: [0; LINES],
        }
    }

    /// Columns flagged unstable during the last scan, per line
    pub fn unstable(&self) -> &[u8; LINES] {
        &self.unstable
    }

    /// Lines with at least one unstable column during the last scan, line `l` in bit `l`
    pub fn unstable_lines(&self) -> u32 {
        self.unstable
            .iter()
            .enumerate()
            .filter(|(_, columns)| **columns != 0)
            .fold(0, |mask, (line, _)| mask | (1 << line))
    }

    pub fn pins(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Read the raw samples of all lines
    fn sample(&mut self) -> [RawSample; LINES] {
        let mut samples = [0; LINES];
        self.unstable = [0; LINES];
        for pass in 0..self.output_loops {
            for (line, sample) in samples.iter_mut().enumerate() {
                self.pins.drive_line(line);
                if pass == 0 {
                    *sample = self.pins.read_columns();
                }
                for _ in 0..self.input_loops {
                    self.unstable[line] |= self.pins.read_columns() ^ *sample;
                }
                self.pins.release_line(line);
            }
        }
        samples
    }
}

impl<P: ScanPins, const LINES: usize> ScanStrategy<LINES> for StabilityScanner<P, LINES> {
    fn scan<D: DebouncerTrait>(&mut self, debouncer: &D, lines: &mut [D::State; LINES]) -> ChangeMask {
        const { assert!(LINES <= 32, "unstable lines are reported in a u32") };
        let samples = self.sample();
        if self.unstable.iter().any(|columns| *columns != 0) {
            trace!("Unstable lines: {:b}", self.unstable_lines());
        }

        samples
            .iter()
            .zip(lines.iter_mut())
            .fold(0, |changes, (sample, line)| changes | debouncer.debounce(*sample, line))
    }
}
