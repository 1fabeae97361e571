//! Strongly typed entities the engine operates on.

pub mod coverage;
pub mod work_unit;

pub use coverage::{CoverageRecord, ImplMapping, LineRange, ScenarioCoverage, TestMapping};
pub use work_unit::{
    InvalidTransition, ParseStatusError, Relationships, StateHistoryEntry, Status,
    TransitionKind, WorkUnit, WorkUnitDraft,
};
