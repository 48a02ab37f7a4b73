//! Per-key finite-state debouncer with adaptive chatter penalties.
//!
//! Every key walks through a cycle of six phases:
//!
//! ```text
//! OFF -> TURNING_ON -> LOCKED_ON -> ON -> TURNING_OFF -> LOCKED_OFF -> OFF
//! ```
//!
//! A press is accepted after two consecutive `1` samples, a release after the
//! key-on and turning-off windows of `0` samples ran out. The locked phases are
//! dead zones after an accepted transition. Any sample contradicting the current
//! phase is chatter: it bumps the key's multiplier, which scales every later
//! window of that key and is never reset.

use super::{ChangeMask, DebounceState, DebouncerTrait, RawSample};
use crate::config::StateMachineConfig;

/// Keys of one scan line
const LANES: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyPhase {
    #[default]
    Off,
    /// First `1` sample seen
    TurningOn,
    /// Pressed, input ignored
    LockedOn,
    /// Pressed, waiting for the key-on window of `0` samples
    On,
    /// Released contact, waiting for the turning-off window to end
    TurningOff,
    /// Released, input ignored
    LockedOff,
}

/// Per-line state of the [`StateMachineDebouncer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateMachineState {
    phases: [KeyPhase; LANES],
    /// Scans since the last phase change
    cycles: [u16; LANES],
    /// Remaining scans of the key-on or turning-off window
    countdown: [u16; LANES],
    multiplier: [u8; LANES],
    last_changes: u8,
    state: u8,
}

impl Default for StateMachineState {
    fn default() -> Self {
        Self {
            phases: [KeyPhase::Off; LANES],
            cycles: [0; LANES],
            countdown: [0; LANES],
            multiplier: [1; LANES],
            last_changes: 0,
            state: 0,
        }
    }
}

impl StateMachineState {
    pub fn phase(&self, lane: u8) -> KeyPhase {
        self.phases[lane as usize]
    }

    /// Chatter penalty of a key, starts at 1
    pub fn multiplier(&self, lane: u8) -> u8 {
        self.multiplier[lane as usize]
    }

    fn enter(&mut self, lane: usize, phase: KeyPhase) {
        trace!("Key {} phase {:?} -> {:?}", lane, self.phases[lane], phase);
        self.phases[lane] = phase;
        self.cycles[lane] = 0;
    }
}

impl DebounceState for StateMachineState {
    fn stable(&self) -> u8 {
        self.state
    }

    fn last_changes(&self) -> ChangeMask {
        self.last_changes
    }
}

#[derive(Default)]
pub struct StateMachineDebouncer {
    config: StateMachineConfig,
}

impl StateMachineDebouncer {
    pub const fn new(config: StateMachineConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &StateMachineConfig {
        &self.config
    }

    /// Bump the chatter penalty of a key
    fn chatter(&self, lane: usize, line: &mut StateMachineState) {
        let multiplier = &mut line.multiplier[lane];
        *multiplier = multiplier.saturating_add(self.config.chatter_multiplier_step);
        debug!("Chatter detected on key {}, multiplier {}", lane, *multiplier);
    }

    /// Advance one key by one sample, returns whether its debounced state flipped
    fn step(&self, lane: usize, is_on: bool, line: &mut StateMachineState) -> bool {
        line.cycles[lane] = line.cycles[lane].wrapping_add(1);

        match line.phases[lane] {
            KeyPhase::Off => {
                if is_on {
                    line.enter(lane, KeyPhase::TurningOn);
                }
                false
            }
            KeyPhase::TurningOn => {
                if is_on {
                    line.enter(lane, KeyPhase::LockedOn);
                    true
                } else {
                    self.chatter(lane, line);
                    line.enter(lane, KeyPhase::Off);
                    false
                }
            }
            KeyPhase::LockedOn => {
                if line.cycles[lane] < scaled(self.config.locked_on_period, line.multiplier[lane]) {
                    if !is_on {
                        self.chatter(lane, line);
                        line.cycles[lane] = 0;
                    }
                } else {
                    line.enter(lane, KeyPhase::On);
                    line.countdown[lane] = scaled(self.config.key_on_chatter_window, line.multiplier[lane]);
                }
                false
            }
            KeyPhase::On => {
                if is_on {
                    line.countdown[lane] = scaled(self.config.key_on_chatter_window, line.multiplier[lane]);
                } else {
                    line.countdown[lane] = line.countdown[lane].saturating_sub(1);
                    if line.countdown[lane] == 0 {
                        line.enter(lane, KeyPhase::TurningOff);
                        line.countdown[lane] = scaled(self.config.turning_off_chatter_window, line.multiplier[lane]);
                    }
                }
                false
            }
            KeyPhase::TurningOff => {
                if is_on {
                    self.chatter(lane, line);
                    line.enter(lane, KeyPhase::On);
                }
                // Runs out even when the contact came back on the last scan
                line.countdown[lane] = line.countdown[lane].saturating_sub(1);
                if line.countdown[lane] == 0 {
                    line.enter(lane, KeyPhase::LockedOff);
                    true
                } else {
                    false
                }
            }
            KeyPhase::LockedOff => {
                if line.cycles[lane] < scaled(self.config.locked_off_period, line.multiplier[lane]) {
                    if is_on {
                        self.chatter(lane, line);
                        line.cycles[lane] = 0;
                    }
                } else {
                    line.enter(lane, KeyPhase::Off);
                }
                false
            }
        }
    }
}

/// A window in scans, stretched by the key's chatter multiplier
fn scaled(window: u8, multiplier: u8) -> u16 {
    window as u16 * multiplier as u16
}

impl DebouncerTrait for StateMachineDebouncer {
    type State = StateMachineState;

    fn debounce(&self, sample: RawSample, line: &mut StateMachineState) -> ChangeMask {
        let mut changes = 0;
        for lane in 0..LANES {
            if self.step(lane, sample & (1 << lane) != 0, line) {
                changes |= 1 << lane;
            }
        }

        line.last_changes = changes;
        line.state ^= changes;
        changes
    }
}
