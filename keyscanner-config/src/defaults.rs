//! Centralized default values for keyscanner configuration
//!
//! These are the values used when `keyboard.toml` is absent or leaves a field out.

// ============================================================================
// Counter debouncer defaults
// ============================================================================

/// Scans a raw sample must differ from the stable state before it is accepted
pub const DEBOUNCE_DELAY: u8 = 17;

/// Release delay used once a key has been flagged as bad
pub const DEBOUNCE_BAD_RELEASE_DELAY: u8 = 63;

/// A bounce reaching `2^BAD_THRESHOLD_POW2` scans flags the key as bad
pub const DEBOUNCE_BAD_THRESHOLD_POW2: u8 = 3;

// ============================================================================
// State machine debouncer defaults
// ============================================================================

/// Added to a key's chatter multiplier every time chatter is detected
pub const CHATTER_MULTIPLIER_STEP: u8 = 2;

/// Scans of continuous release needed in `TURNING_OFF` before the key goes off
pub const TURNING_OFF_CHATTER_WINDOW: u8 = 7;

/// Scans of continuous release needed in `ON` before the key starts turning off
pub const KEY_ON_CHATTER_WINDOW: u8 = 22;

/// Dead zone after a press
pub const LOCKED_ON_PERIOD: u8 = 8;

/// Dead zone after a release
pub const LOCKED_OFF_PERIOD: u8 = 8;

// ============================================================================
// Scan defaults
// ============================================================================

/// Default scan interval, in timer compare units
pub const SCAN_INTERVAL: u8 = 14;

/// Duration of one timer compare unit in microseconds (prescaler 256 @ 8MHz)
pub const SCAN_INTERVAL_UNIT_US: u32 = 32;

/// How many full matrix passes are made to catch instability
pub const STABILITY_OUTPUT_LOOPS: u8 = 3;

/// How many raw input reads are made per line and pass to catch instability
pub const STABILITY_INPUT_LOOPS: u8 = 5;
