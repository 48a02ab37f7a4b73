// Scan configuration types

use serde_derive::Deserialize;
use serde_inline_default::serde_inline_default;

use crate::defaults;

/// `[scan]` section: scan timing and stability sampling
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Scan interval at boot, in timer compare units. Adjustable at runtime
    #[serde_inline_default(defaults::SCAN_INTERVAL)]
    pub interval: u8,
    /// Length of one timer compare unit in microseconds
    #[serde_inline_default(defaults::SCAN_INTERVAL_UNIT_US)]
    pub interval_unit_us: u32,
    /// Full matrix passes per scan
    #[serde_inline_default(defaults::STABILITY_OUTPUT_LOOPS)]
    pub stability_output_loops: u8,
    /// Input reads per line and pass
    #[serde_inline_default(defaults::STABILITY_INPUT_LOOPS)]
    pub stability_input_loops: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: defaults::SCAN_INTERVAL,
            interval_unit_us: defaults::SCAN_INTERVAL_UNIT_US,
            stability_output_loops: defaults::STABILITY_OUTPUT_LOOPS,
            stability_input_loops: defaults::STABILITY_INPUT_LOOPS,
        }
    }
}
