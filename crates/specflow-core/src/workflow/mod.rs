//! Lifecycle state machine.
//!
//! - [`transition`]: the validator that moves work units between columns
//! - [`clock`]: timestamp sources
//! - [`reminders`]: per-phase guidance returned on success

pub mod clock;
pub mod reminders;
pub mod transition;

pub use clock::{Clock, FixedClock, SystemClock};
pub use reminders::system_reminder;
pub use transition::{TransitionOptions, TransitionOutcome, TransitionValidator};
