//! Centralized validation for keyscanner configuration
//!
//! Every value that ends up as a firmware constant is checked here, so a bad
//! `keyboard.toml` stops the build instead of producing a silently broken debouncer.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{DebounceConfig, ScanConfig};
use crate::KeyscannerTomlConfig;

/// Validates the entire configuration
pub fn validate_config(config: &KeyscannerTomlConfig) -> ConfigResult<()> {
    validate_debounce_section(&config.debounce)?;
    validate_scan_section(&config.scan)?;
    Ok(())
}

/// Validates the [debounce] section
fn validate_debounce_section(debounce: &DebounceConfig) -> ConfigResult<()> {
    if debounce.delay == 0 {
        return Err(ConfigError::InvalidValue {
            field: "debounce.delay".to_string(),
            value: debounce.delay.to_string(),
            expected: "1 to 255".to_string(),
        });
    }

    if debounce.bad_release_delay < debounce.delay {
        return Err(ConfigError::Validation {
            field: "debounce.bad_release_delay".to_string(),
            message: format!(
                "bad_release_delay ({}) must not be shorter than delay ({})",
                debounce.bad_release_delay, debounce.delay
            ),
        });
    }

    let counter_bits = debounce.counter_bits();
    if debounce.bad_threshold_pow2 >= counter_bits {
        return Err(ConfigError::InvalidValue {
            field: "debounce.bad_threshold_pow2".to_string(),
            value: debounce.bad_threshold_pow2.to_string(),
            expected: format!("0 to {} (the counter is {} bits wide)", counter_bits - 1, counter_bits),
        });
    }

    if let Some(threshold_2) = debounce.bad_threshold_2_pow2 {
        if threshold_2 >= counter_bits {
            return Err(ConfigError::InvalidValue {
                field: "debounce.bad_threshold_2_pow2".to_string(),
                value: threshold_2.to_string(),
                expected: format!("0 to {} (the counter is {} bits wide)", counter_bits - 1, counter_bits),
            });
        }
    }

    let windows = [
        ("debounce.chatter_multiplier_step", debounce.chatter_multiplier_step),
        ("debounce.turning_off_chatter_window", debounce.turning_off_chatter_window),
        ("debounce.key_on_chatter_window", debounce.key_on_chatter_window),
        ("debounce.locked_on_period", debounce.locked_on_period),
        ("debounce.locked_off_period", debounce.locked_off_period),
    ];
    for (field, value) in windows {
        if value == 0 {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                expected: "1 to 255".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates the [scan] section
fn validate_scan_section(scan: &ScanConfig) -> ConfigResult<()> {
    if scan.interval == 0 {
        return Err(ConfigError::InvalidValue {
            field: "scan.interval".to_string(),
            value: scan.interval.to_string(),
            expected: "1 to 255".to_string(),
        });
    }

    if scan.interval_unit_us == 0 {
        return Err(ConfigError::InvalidValue {
            field: "scan.interval_unit_us".to_string(),
            value: scan.interval_unit_us.to_string(),
            expected: "a positive number of microseconds".to_string(),
        });
    }

    if scan.stability_output_loops == 0 || scan.stability_input_loops == 0 {
        return Err(ConfigError::Validation {
            field: "scan.stability_output_loops/stability_input_loops".to_string(),
            message: "at least one pass and one read per pass are required".to_string(),
        });
    }

    Ok(())
}
