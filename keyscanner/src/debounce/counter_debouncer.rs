//! Bit-parallel counter debouncer with bad key detection.
//!
//! Every key of a scan line has its own up-counter, counting the scans its raw
//! sample has differed from its debounced state. The counters are not stored per
//! key but as bit-planes: bit `i` of `counter_bits[b]` is bit `b` of key `i`'s
//! counter. Incrementing all 8 counters is then a ripple-carry over the planes
//! using only AND/XOR, in constant time and without branching per key.
//!
//! Press and release are both accepted after `delay` scans. A key whose bounce
//! lasted longer than `2^threshold_pow2` scans, but shorter than `delay`, is
//! flagged as bad: its next release is only accepted after `bad_release_delay`
//! scans. The flag is cleared once that release is accepted.
//!
//! A transition is accepted when a lane's counter equals `delay + 1` on the low
//! `bit_width(delay)` bits. This is an exact match rather than a `>=` comparison,
//! so with a counter wider than the delay the pattern recurs every
//! `2^bit_width(delay)` scans.

use super::{ChangeMask, DebounceState, DebouncerTrait, RawSample};
use crate::config::{BadDetection, CounterConfig, bit_width};

/// Bit-planes available in a [`CounterState`]
const MAX_COUNTER_BITS: usize = 8;

/// Per-line state of the [`CounterDebouncer`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterState {
    /// Bit-plane `b` holds bit `b` of every lane's counter
    counter_bits: [u8; MAX_COUNTER_BITS],
    /// Keys detected as bad
    bad: u8,
    /// Keys which had a first long bounce, two-stage detection only
    flag: u8,
    last_changes: u8,
    state: u8,
}

impl CounterState {
    /// Reassemble the counter of one lane from the bit-planes
    pub fn counter(&self, lane: u8) -> u8 {
        self.counter_bits
            .iter()
            .enumerate()
            .fold(0, |counter, (b, plane)| counter | (((plane >> lane) & 1) << b))
    }

    /// Keys whose next release uses the bad release delay
    pub fn bad(&self) -> u8 {
        self.bad
    }

    /// Keys armed by a first long bounce, two-stage detection only
    pub fn flagged(&self) -> u8 {
        self.flag
    }
}

impl DebounceState for CounterState {
    fn stable(&self) -> u8 {
        self.state
    }

    fn last_changes(&self) -> ChangeMask {
        self.last_changes
    }
}

pub struct CounterDebouncer {
    config: CounterConfig,
    /// Number of bit-planes in use
    counter_bits: u8,
    delay_bits: u8,
    delay_pattern: u8,
    bad_delay_bits: u8,
    bad_delay_pattern: u8,
}

impl Default for CounterDebouncer {
    fn default() -> Self {
        Self::new(CounterConfig::DEFAULT)
    }
}

impl CounterDebouncer {
    pub const fn new(config: CounterConfig) -> Self {
        Self {
            config,
            counter_bits: config.counter_bits(),
            delay_bits: bit_width(config.delay),
            delay_pattern: config.delay.wrapping_add(1),
            bad_delay_bits: bit_width(config.bad_release_delay),
            bad_delay_pattern: config.bad_release_delay.wrapping_add(1),
        }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }
}

/// Lanes whose counter plane `c` agrees with bit `bit` of `pattern`
#[inline(always)]
fn match_plane(c: u8, pattern: u8, bit: u8) -> u8 {
    if pattern & (1 << bit) != 0 { c } else { !c }
}

impl DebouncerTrait for CounterDebouncer {
    type State = CounterState;

    fn debounce(&self, sample: RawSample, line: &mut CounterState) -> ChangeMask {
        let state = line.state;
        let state_changed = sample ^ state;
        let last_not_changed = !line.last_changes;

        let (threshold, threshold_2) = match self.config.bad_detection {
            BadDetection::Single { threshold_pow2 } => (threshold_pow2, None),
            BadDetection::TwoStage {
                threshold_pow2,
                threshold_2_pow2,
            } => (threshold_pow2, Some(threshold_2_pow2)),
        };

        let mut carry_inc: u8 = !0;
        let mut waited_delay: u8 = !0;
        let mut waited_bad_delay: u8 = !0;
        let mut past_threshold: u8 = 0;
        let mut past_threshold_2: u8 = 0;

        for (i, plane) in line.counter_bits[..self.counter_bits as usize].iter_mut().enumerate() {
            let i = i as u8;
            let mut c = *plane;

            // Whether the previous counter value got past the thresholds
            if i >= threshold {
                past_threshold |= c;
            }
            if threshold_2.is_some_and(|t| i >= t) {
                past_threshold_2 |= c;
            }

            // Lanes accepted last scan restart from zero
            c &= last_not_changed;
            c ^= carry_inc;
            // Lanes agreeing with their stable state are held at zero
            c &= state_changed;
            carry_inc &= !c;
            *plane = c;

            if i < self.delay_bits {
                waited_delay &= match_plane(c, self.delay_pattern, i);
            }
            if i < self.bad_delay_bits {
                waited_bad_delay &= match_plane(c, self.bad_delay_pattern, i);
            }
        }

        // A bounce ended: the sample is back to the stable state without any accepted change
        let settled = last_not_changed & !state_changed;
        let mut bad = line.bad;
        let mut flag = line.flag;
        let use_bad = match self.config.bad_detection {
            BadDetection::Single { .. } => {
                bad |= settled & past_threshold;
                state & bad
            }
            BadDetection::TwoStage { .. } => {
                bad |= flag & settled & past_threshold_2;
                flag |= settled & past_threshold;
                state & flag & bad
            }
        };
        if bad & !line.bad != 0 {
            debug!("Bad key detected: {}", bad & !line.bad);
        }

        let use_default = !use_bad;
        let changes = state_changed & ((use_default & waited_delay) | (use_bad & waited_bad_delay));

        // An accepted release clears the detection
        let released = state & changes;
        bad &= !released;
        flag &= !released;

        line.bad = bad;
        line.flag = flag;
        line.last_changes = changes;
        line.state ^= changes;

        changes
    }
}
