use std::path::Path;
use std::{env, fs};

use const_gen::*;
use keyscanner_config::{DebounceConfig, KeyscannerTomlConfig, ScanConfig};

fn main() {
    // Ensure build.rs is re-run when files change
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=KEYBOARD_TOML_PATH");

    // Read keyboard.toml if it's present, otherwise fall back to the defaults
    let config = if let Ok(toml_path) = env::var("KEYBOARD_TOML_PATH") {
        println!("cargo:rerun-if-changed={toml_path}");
        KeyscannerTomlConfig::load(&toml_path).unwrap_or_else(|e| panic!("❌ Parse `keyboard.toml` error: {e}"))
    } else {
        KeyscannerTomlConfig::default()
    };

    let constants = get_constants_str(config.debounce, config.scan);

    // Write to constants.rs file
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("constants.rs");
    fs::write(&dest_path, constants).expect("Failed to write constants.rs file");
}

fn get_constants_str(debounce: DebounceConfig, scan: ScanConfig) -> String {
    let constant_strs = vec![
        // Counter debouncer
        const_declaration!(pub(crate) DEBOUNCE_DELAY = debounce.delay),
        const_declaration!(pub(crate) DEBOUNCE_BAD_RELEASE_DELAY = debounce.bad_release_delay),
        const_declaration!(pub(crate) DEBOUNCE_BAD_THRESHOLD_POW2 = debounce.bad_threshold_pow2),
        format!(
            "pub(crate) const DEBOUNCE_BAD_THRESHOLD_2_POW2: Option<u8> = {:?};",
            debounce.bad_threshold_2_pow2
        ),
        // State machine debouncer
        const_declaration!(pub(crate) CHATTER_MULTIPLIER_STEP = debounce.chatter_multiplier_step),
        const_declaration!(pub(crate) TURNING_OFF_CHATTER_WINDOW = debounce.turning_off_chatter_window),
        const_declaration!(pub(crate) KEY_ON_CHATTER_WINDOW = debounce.key_on_chatter_window),
        const_declaration!(pub(crate) LOCKED_ON_PERIOD = debounce.locked_on_period),
        const_declaration!(pub(crate) LOCKED_OFF_PERIOD = debounce.locked_off_period),
        // Scan
        const_declaration!(pub(crate) KEYSCAN_INTERVAL_DEFAULT = scan.interval),
        const_declaration!(pub(crate) KEYSCAN_INTERVAL_UNIT_US = scan.interval_unit_us),
        const_declaration!(pub(crate) STABILITY_OUTPUT_LOOPS = scan.stability_output_loops),
        const_declaration!(pub(crate) STABILITY_INPUT_LOOPS = scan.stability_input_loops),
    ];

    constant_strs
        .into_iter()
        .map(|s| "#[allow(clippy::redundant_static_lifetimes)]\n".to_owned() + s.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
