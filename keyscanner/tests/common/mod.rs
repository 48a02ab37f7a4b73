#![allow(dead_code)]

use keyscanner::config::{BadDetection, CounterConfig};
use keyscanner::debounce::RawSample;
use keyscanner::matrix::ScanPins;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Counter config used by the tests, independent of `keyboard.toml`
pub const TEST_COUNTER_CONFIG: CounterConfig = CounterConfig::new(17, 63, BadDetection::Single { threshold_pow2: 3 });

/// Switch matrix whose contacts are set by the test
pub struct FakeMatrix<const LINES: usize> {
    /// Closed contacts per line
    pub keys: [u8; LINES],
    pub driven: Option<usize>,
    pub reads: usize,
}

impl<const LINES: usize> Default for FakeMatrix<LINES> {
    fn default() -> Self {
        Self {
            keys: [0; LINES],
            driven: None,
            reads: 0,
        }
    }
}

impl<const LINES: usize> FakeMatrix<LINES> {
    pub fn set_key(&mut self, line: usize, col: usize, pressed: bool) {
        if pressed {
            self.keys[line] |= 1 << col;
        } else {
            self.keys[line] &= !(1 << col);
        }
    }
}

impl<const LINES: usize> ScanPins for FakeMatrix<LINES> {
    fn drive_line(&mut self, line: usize) {
        assert!(self.driven.is_none(), "line {line} driven while another is");
        self.driven = Some(line);
    }

    fn release_line(&mut self, line: usize) {
        assert_eq!(self.driven, Some(line));
        self.driven = None;
    }

    fn read_columns(&mut self) -> RawSample {
        self.reads += 1;
        self.driven.map(|line| self.keys[line]).unwrap_or_default()
    }
}

/// Deterministic pseudo random bytes
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    pub fn next_u8(&mut self) -> u8 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.0 >> 24) as u8
    }
}
