//! Debounce engines.
//!
//! A debounce engine turns one [`RawSample`] of a scan line into a [`ChangeMask`]
//! of keys whose debounced state flipped. The engine itself only carries its
//! (immutable) config; everything that changes between scans lives in a per-line
//! [`DebouncerTrait::State`] record owned by the caller.

pub mod counter_debouncer;
pub mod state_machine_debouncer;

/// One bit per key of a scan line, active high: 1 = contact closed
pub type RawSample = u8;

/// One bit per key of a scan line whose debounced state flipped during a scan
pub type ChangeMask = u8;

/// The state a debounce engine keeps for one scan line.
///
/// Every state starts out all released and is only mutated by
/// [`DebouncerTrait::debounce`].
pub trait DebounceState: Default {
    /// The debounced key state of the line
    fn stable(&self) -> u8;

    /// The change mask of the last accepted transition
    fn last_changes(&self) -> ChangeMask;
}

pub trait DebouncerTrait {
    type State: DebounceState;

    /// Feed the raw sample of one scan line, update the line's state and return the
    /// keys whose debounced state flipped.
    ///
    /// The returned mask is always a subset of the bits that differ between the
    /// stable state before and after the call.
    fn debounce(&self, sample: RawSample, state: &mut Self::State) -> ChangeMask;
}

/// The debouncer used when none is given explicitly
#[cfg(not(feature = "state_machine_debounce"))]
pub type DefaultDebouncer = counter_debouncer::CounterDebouncer;
/// The debouncer used when none is given explicitly
#[cfg(feature = "state_machine_debounce")]
pub type DefaultDebouncer = state_machine_debouncer::StateMachineDebouncer;
