#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
pub(crate) mod fmt;

pub mod config;
pub mod debounce;
pub mod keyscanner;
pub mod matrix;
pub mod recorder;
pub mod scheduler;

pub use keyscanner::KeyScanner;
pub use scheduler::SCAN_SCHEDULER;
