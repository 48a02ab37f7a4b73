//! Build-time configuration of the debounce engines and the matrix scanner.
//!
//! The constants are generated by `build.rs` from `keyboard.toml` (see the
//! `keyscanner-config` crate). The config structs below wrap them and re-check
//! their consistency in const context, so a misconfigured config used in a
//! `const` item fails compilation instead of misbehaving at runtime.

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

/// Number of bits needed to represent `value`
///
/// Mirrors `keyscanner_config::bit_width`, which sizes the generated constants.
/// The two must agree.
pub const fn bit_width(value: u8) -> u8 {
    (u8::BITS - value.leading_zeros()) as u8
}

/// How a key gets flagged as "bad", which makes its next release use the bad release delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BadDetection {
    /// A single bounce whose counter reached `2^threshold_pow2` flags the key
    Single { threshold_pow2: u8 },
    /// A first bounce past `2^threshold_pow2` arms the key, a later bounce past
    /// `2^threshold_2_pow2` flags it. Reduces false positives.
    TwoStage { threshold_pow2: u8, threshold_2_pow2: u8 },
}

/// Config of [`crate::debounce::counter_debouncer::CounterDebouncer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterConfig {
    /// Press and release delay, in scans
    pub delay: u8,
    /// Release delay of a key flagged as bad, in scans
    pub bad_release_delay: u8,
    pub bad_detection: BadDetection,
}

impl CounterConfig {
    /// Config generated from `keyboard.toml`
    pub const DEFAULT: Self = Self::new(
        DEBOUNCE_DELAY,
        DEBOUNCE_BAD_RELEASE_DELAY,
        match DEBOUNCE_BAD_THRESHOLD_2_POW2 {
            Some(threshold_2_pow2) => BadDetection::TwoStage {
                threshold_pow2: DEBOUNCE_BAD_THRESHOLD_POW2,
                threshold_2_pow2,
            },
            None => BadDetection::Single {
                threshold_pow2: DEBOUNCE_BAD_THRESHOLD_POW2,
            },
        },
    );

    /// Create a counter config, panics (at compile time in const context) if it's inconsistent
    pub const fn new(delay: u8, bad_release_delay: u8, bad_detection: BadDetection) -> Self {
        let config = Self {
            delay,
            bad_release_delay,
            bad_detection,
        };
        config.validate();
        config
    }

    const fn validate(&self) {
        assert!(self.delay > 0, "debounce delay must be at least 1 scan");
        assert!(
            self.bad_release_delay >= self.delay,
            "bad release delay must not be shorter than the delay"
        );
        let bits = self.counter_bits();
        match self.bad_detection {
            BadDetection::Single { threshold_pow2 } => {
                assert!(threshold_pow2 < bits, "bad threshold is wider than the counter");
            }
            BadDetection::TwoStage {
                threshold_pow2,
                threshold_2_pow2,
            } => {
                assert!(threshold_pow2 < bits, "bad threshold is wider than the counter");
                assert!(threshold_2_pow2 < bits, "second bad threshold is wider than the counter");
            }
        }
    }

    /// Number of counter bit-planes, sized for the largest delay
    pub const fn counter_bits(&self) -> u8 {
        let largest = if self.bad_release_delay > self.delay {
            self.bad_release_delay
        } else {
            self.delay
        };
        bit_width(largest)
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Config of [`crate::debounce::state_machine_debouncer::StateMachineDebouncer`].
///
/// All windows are counted in scans and scaled by the key's chatter multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateMachineConfig {
    pub chatter_multiplier_step: u8,
    pub turning_off_chatter_window: u8,
    pub key_on_chatter_window: u8,
    pub locked_on_period: u8,
    pub locked_off_period: u8,
}

impl StateMachineConfig {
    /// Config generated from `keyboard.toml`
    pub const DEFAULT: Self = Self {
        chatter_multiplier_step: CHATTER_MULTIPLIER_STEP,
        turning_off_chatter_window: TURNING_OFF_CHATTER_WINDOW,
        key_on_chatter_window: KEY_ON_CHATTER_WINDOW,
        locked_on_period: LOCKED_ON_PERIOD,
        locked_off_period: LOCKED_OFF_PERIOD,
    }
    .validated();

    /// Panics (at compile time in const context) if a window or the step is zero
    pub const fn validated(self) -> Self {
        assert!(self.chatter_multiplier_step > 0, "chatter multiplier step must be at least 1");
        assert!(self.turning_off_chatter_window > 0, "turning off chatter window must be at least 1");
        assert!(self.key_on_chatter_window > 0, "key on chatter window must be at least 1");
        assert!(self.locked_on_period > 0, "locked on period must be at least 1");
        assert!(self.locked_off_period > 0, "locked off period must be at least 1");
        self
    }
}

impl Default for StateMachineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Config of the scan timing and the stability sampling matrix scanner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanConfig {
    /// Scan interval at boot, in timer compare units
    pub interval: u8,
    /// Length of one timer compare unit in microseconds
    pub interval_unit_us: u32,
    /// Full matrix passes per scan
    pub stability_output_loops: u8,
    /// Input reads per line and pass
    pub stability_input_loops: u8,
}

impl ScanConfig {
    /// Config generated from `keyboard.toml`
    pub const DEFAULT: Self = Self {
        interval: KEYSCAN_INTERVAL_DEFAULT,
        interval_unit_us: KEYSCAN_INTERVAL_UNIT_US,
        stability_output_loops: STABILITY_OUTPUT_LOOPS,
        stability_input_loops: STABILITY_INPUT_LOOPS,
    };
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bit_width_matches_build_config() {
        for value in 0..=u8::MAX {
            assert_eq!(bit_width(value), keyscanner_config::bit_width(value), "value {}", value);
        }
        assert_eq!(bit_width(0), 0);
        assert_eq!(bit_width(17), 5);
        assert_eq!(bit_width(63), 6);
    }

    #[test]
    fn test_default_counter_config() {
        let config = CounterConfig::default();
        assert_eq!(config.delay, 17);
        assert_eq!(config.bad_release_delay, 63);
        assert_eq!(config.counter_bits(), 6);
        assert_eq!(config.bad_detection, BadDetection::Single { threshold_pow2: 3 });
    }

    #[test]
    #[should_panic(expected = "bad threshold is wider than the counter")]
    fn test_threshold_wider_than_counter() {
        // 7 -> 3 bit counter, so 2^3 is never reached
        let _ = CounterConfig::new(5, 7, BadDetection::Single { threshold_pow2: 3 });
    }

    #[test]
    #[should_panic(expected = "bad release delay must not be shorter than the delay")]
    fn test_bad_release_shorter_than_delay() {
        let _ = CounterConfig::new(20, 10, BadDetection::Single { threshold_pow2: 1 });
    }

    #[test]
    #[should_panic(expected = "locked on period must be at least 1")]
    fn test_zero_state_machine_window() {
        let _ = StateMachineConfig {
            locked_on_period: 0,
            ..StateMachineConfig::DEFAULT
        }
        .validated();
    }
}
