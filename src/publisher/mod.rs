//! # Publisher
//!
//! Drains the draft backlog into the posted partitions, one draft per due
//! slot.
//!
//! ## A Run
//!
//! 1. Finish any commits an interrupted run left in the journal
//! 2. Load the last published timestamp (seeded from the backfill start on
//!    a fresh site) and count the slots due since then
//! 3. Stop if nothing is due or the tank is empty; nothing is touched
//! 4. For each due slot, take the next draft in name order, render it, write
//!    it and its assets into `{partition}/{slug}/`, upsert the partition
//!    manifest, journal the commit and remove the draft. Unreadable drafts
//!    are skipped, stay in the tank and do not use up a slot
//! 5. Rebuild the root manifest, then save the new state and clear the journal
//!
//! The state file is written last, so an interrupted run is repeated from
//! the same slot next time. Pages and manifest upserts are idempotent; draft
//! removal is not, which is what the journal covers.

mod assets;
mod run;

#[cfg(test)]
mod tests;

pub use assets::write_post;
pub use run::{Outcome, Plan, PlannedSlot, PublishReport, Publisher, Recovery, SkippedDraft};
