//! roster-services — shared state behind the auditor's tasks.

pub mod roster;

pub use roster::{RosterEntry, RosterStore, Upsert};
