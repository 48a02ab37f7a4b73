//! Recording debounced key states into the report ring buffer.
//!
//! A report is one byte per scan line, optionally truncated to a fixed wire
//! length. It's appended inside a critical section, so a consumer of the ring
//! buffer never sees a report made of bytes from two different scans.

use heapless::Deque;

use crate::debounce::DebounceState;

/// Consumer side of the stable key state, usually the ring buffer drained by the host interface
pub trait ReportSink {
    fn append(&mut self, byte: u8);

    /// Whether `len` more bytes fit, a report which doesn't fit is dropped as a whole
    fn has_room(&self, _len: usize) -> bool {
        true
    }
}

impl<const N: usize> ReportSink for Deque<u8, N> {
    fn append(&mut self, byte: u8) {
        if self.push_back(byte).is_err() {
            warn!("Report buffer full, dropping byte");
        }
    }

    fn has_room(&self, len: usize) -> bool {
        self.capacity() - self.len() >= len
    }
}

/// Byte layout of a report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordLayout {
    /// One byte per scan line, column `c` in bit `c`
    #[default]
    Lines,
    /// The matrix transposed: bits ordered column by column, see [`to_row_major`]
    RowMajor,
}

/// Transpose line-major key states.
///
/// Key (line `j`, column `c`) goes to bit `c * LINES + j` of the result, counted
/// from bit 0 of byte 0. So the first byte starts with column 0 of every line.
pub fn to_row_major<const LINES: usize>(lines: &[u8; LINES]) -> [u8; LINES] {
    let mut rows = [0; LINES];
    for (j, state) in lines.iter().enumerate() {
        for c in 0..8 {
            if state & (1 << c) != 0 {
                let index = c * LINES + j;
                rows[index / 8] |= 1 << (index % 8);
            }
        }
    }
    rows
}

/// Inverse of [`to_row_major`]
pub fn from_row_major<const LINES: usize>(rows: &[u8; LINES]) -> [u8; LINES] {
    let mut lines = [0; LINES];
    for (j, state) in lines.iter_mut().enumerate() {
        for c in 0..8 {
            let index = c * LINES + j;
            if rows[index / 8] & (1 << (index % 8)) != 0 {
                *state |= 1 << c;
            }
        }
    }
    lines
}

/// Snapshots the stable state of all lines into a [`ReportSink`]
#[derive(Clone, Copy, Debug, Default)]
pub struct StateRecorder {
    layout: RecordLayout,
    /// Bytes per report, `None` for one byte per line
    report_len: Option<usize>,
}

impl StateRecorder {
    pub const fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            report_len: None,
        }
    }

    /// Only emit the first `len` bytes of every report.
    ///
    /// With [`RecordLayout::RowMajor`] on an 8 line matrix, a report of 4 bytes
    /// holds columns 0 to 3, one bit per line.
    pub const fn with_report_len(mut self, len: usize) -> Self {
        self.report_len = Some(len);
        self
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Bytes appended per report on a matrix of `lines` scan lines
    pub fn report_len(&self, lines: usize) -> usize {
        self.report_len.map_or(lines, |len| len.min(lines))
    }

    /// Append one report, all lines' stable state
    pub fn record<S: DebounceState, R: ReportSink, const LINES: usize>(&self, lines: &[S; LINES], sink: &mut R) {
        let snapshot = lines.each_ref().map(|line| line.stable());
        let report = match self.layout {
            RecordLayout::Lines => snapshot,
            RecordLayout::RowMajor => to_row_major(&snapshot),
        };

        let len = self.report_len(LINES);

        critical_section::with(|_| {
            if !sink.has_room(len) {
                warn!("Report buffer full, dropping report");
                return;
            }
            for byte in &report[..len] {
                sink.append(*byte);
            }
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_row_major_single_keys() {
        // Line 1, column 0 -> bit 1
        assert_eq!(to_row_major(&[0, 0b1, 0, 0]), [0b10, 0, 0, 0]);
        // Line 0, column 2 -> bit 8
        assert_eq!(to_row_major(&[0b100, 0, 0, 0]), [0, 0b1, 0, 0]);
        // Line 3, column 7 -> bit 31
        assert_eq!(to_row_major(&[0, 0, 0, 0b1000_0000]), [0, 0, 0, 0b1000_0000]);
    }

    #[test]
    fn test_row_major_every_key() {
        for line in 0..4 {
            for col in 0..8 {
                let mut lines = [0u8; 4];
                lines[line] = 1 << col;
                let rows = to_row_major(&lines);
                assert_eq!(rows.iter().map(|b| b.count_ones()).sum::<u32>(), 1);
                assert_eq!(from_row_major(&rows), lines);
            }
        }
    }

    #[test]
    fn test_deque_sink() {
        let mut sink: Deque<u8, 6> = Deque::new();
        let recorder = StateRecorder::default();
        let lines = [0b1u8, 0b10, 0b100, 0b1000].map(TestState);
        recorder.record(&lines, &mut sink);
        assert_eq!(sink.iter().copied().collect::<Vec<_>>(), vec![0b1, 0b10, 0b100, 0b1000]);

        // Only 2 bytes left, the next report is dropped as a whole
        recorder.record(&lines, &mut sink);
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn test_row_major_layout() {
        let mut sink: Deque<u8, 8> = Deque::new();
        let recorder = StateRecorder::new(RecordLayout::RowMajor);
        recorder.record(&[TestState(0b1), TestState(0), TestState(0), TestState(0)], &mut sink);
        assert_eq!(sink.iter().copied().collect::<Vec<_>>(), vec![0b1, 0, 0, 0]);
    }

    #[test]
    fn test_truncated_row_major_report() {
        let mut sink: Deque<u8, 8> = Deque::new();
        let recorder = StateRecorder::new(RecordLayout::RowMajor).with_report_len(4);
        // Column 0 on lines 0 and 7, column 3 on line 2, column 5 is cut off
        let mut lines = [0u8; 8].map(TestState);
        lines[0].0 = 0b1;
        lines[2].0 = 0b1000;
        lines[7].0 = 0b10_0001;
        recorder.record(&lines, &mut sink);
        assert_eq!(sink.iter().copied().collect::<Vec<_>>(), vec![0b1000_0001, 0, 0, 0b100]);

        // Room for one more 4 byte report, not for a third one
        recorder.record(&lines, &mut sink);
        recorder.record(&lines, &mut sink);
        assert_eq!(sink.len(), 8);
    }

    #[test]
    fn test_report_len_is_capped_by_lines() {
        let recorder = StateRecorder::default().with_report_len(6);
        assert_eq!(recorder.report_len(4), 4);
        assert_eq!(recorder.report_len(8), 6);
        assert_eq!(StateRecorder::default().report_len(4), 4);
    }

    #[derive(Default)]
    struct TestState(u8);

    impl DebounceState for TestState {
        fn stable(&self) -> u8 {
            self.0
        }

        fn last_changes(&self) -> u8 {
            0
        }
    }
}
