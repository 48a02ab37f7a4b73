// Debounce configuration types

use serde_derive::Deserialize;
use serde_inline_default::serde_inline_default;

use crate::defaults;

/// `[debounce]` section: constants of both debounce engines
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DebounceConfig {
    /// Press and release delay of the counter debouncer, in scans
    #[serde_inline_default(defaults::DEBOUNCE_DELAY)]
    pub delay: u8,
    /// Release delay of a key flagged as bad, in scans
    #[serde_inline_default(defaults::DEBOUNCE_BAD_RELEASE_DELAY)]
    pub bad_release_delay: u8,
    /// First bad-key threshold, as a power of two
    #[serde_inline_default(defaults::DEBOUNCE_BAD_THRESHOLD_POW2)]
    pub bad_threshold_pow2: u8,
    /// Second bad-key threshold, as a power of two. Enables two-stage bad key detection when set
    #[serde(default)]
    pub bad_threshold_2_pow2: Option<u8>,
    /// Chatter multiplier increment of the state machine debouncer
    #[serde_inline_default(defaults::CHATTER_MULTIPLIER_STEP)]
    pub chatter_multiplier_step: u8,
    #[serde_inline_default(defaults::TURNING_OFF_CHATTER_WINDOW)]
    pub turning_off_chatter_window: u8,
    #[serde_inline_default(defaults::KEY_ON_CHATTER_WINDOW)]
    pub key_on_chatter_window: u8,
    #[serde_inline_default(defaults::LOCKED_ON_PERIOD)]
    pub locked_on_period: u8,
    #[serde_inline_default(defaults::LOCKED_OFF_PERIOD)]
    pub locked_off_period: u8,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: defaults::DEBOUNCE_DELAY,
            bad_release_delay: defaults::DEBOUNCE_BAD_RELEASE_DELAY,
            bad_threshold_pow2: defaults::DEBOUNCE_BAD_THRESHOLD_POW2,
            bad_threshold_2_pow2: None,
            chatter_multiplier_step: defaults::CHATTER_MULTIPLIER_STEP,
            turning_off_chatter_window: defaults::TURNING_OFF_CHATTER_WINDOW,
            key_on_chatter_window: defaults::KEY_ON_CHATTER_WINDOW,
            locked_on_period: defaults::LOCKED_ON_PERIOD,
            locked_off_period: defaults::LOCKED_OFF_PERIOD,
        }
    }
}

impl DebounceConfig {
    /// Number of bit-planes the counter debouncer needs, the bad release delay being the largest delay
    pub fn counter_bits(&self) -> u8 {
        bit_width(self.bad_release_delay.max(self.delay))
    }
}

/// Number of bits needed to represent `value`
pub fn bit_width(value: u8) -> u8 {
    (u8::BITS - value.leading_zeros()) as u8
}
