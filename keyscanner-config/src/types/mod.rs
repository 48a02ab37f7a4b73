// Type definitions for keyscanner-config
//
// Each `keyboard.toml` section has its own module.

pub mod debounce;
pub mod scan;

pub use debounce::*;
pub use scan::*;
