//! Backward timeline scheduling.
//!
//! Recipes are placed from the target serving time towards the present. Equipment
//! contention across recipes is resolved through a single shared ledger per run.

mod generator;
mod ledger;
mod step_scheduler;

pub use generator::{generate_timeline, round_down, GeneratedTimeline};
pub use ledger::{BusyIntervals, EquipmentLedger, LedgerError};
pub use step_scheduler::schedule_recipe;
