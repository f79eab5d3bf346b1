//! The publish run

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::assets::write_post;
use crate::domain::{Clock, ManifestEntry, Schedule};
use crate::storage::{PendingCommit, Site, Tank};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No slot has come due since the last published post
    NoSlotsDue,
    /// Slots are due but the tank is empty
    EmptyTank,
    /// Drafts were processed (possibly all skipped)
    Published,
}

/// A draft that could not be read and stays in the tank
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDraft {
    pub path: PathBuf,
    pub reason: String,
}

/// Work finished on behalf of an interrupted earlier run
#[derive(Debug, Clone, Serialize)]
pub struct Recovery {
    pub commits: usize,
    pub drafts_removed: usize,
    pub last_published_at: DateTime<Utc>,
}

/// One draft scheduled for a slot
#[derive(Debug, Clone, Serialize)]
pub struct PlannedSlot {
    pub slot: DateTime<Utc>,
    pub draft: PathBuf,
}

/// What a run would do right now, without doing it
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub now: DateTime<Utc>,
    pub last_published_at: DateTime<Utc>,
    /// True when there is no stored state and the backfill seed is in use
    pub seeded: bool,
    pub due: u64,
    pub drafts: usize,
    pub slots: Vec<PlannedSlot>,
    pub next_due: DateTime<Utc>,
    /// Journal entries an earlier run left behind
    pub pending_commits: usize,
}

/// Result of a publish run
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub outcome: Outcome,
    pub due: u64,
    pub published: Vec<ManifestEntry>,
    pub skipped: Vec<SkippedDraft>,
    pub last_published_at: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
}

impl PublishReport {
    /// One-line human summary
    pub fn summary(&self) -> String {
        match self.outcome {
            Outcome::NoSlotsDue => "No slots due.".to_string(),
            Outcome::EmptyTank => "No items in the tank.".to_string(),
            Outcome::Published => format!(
                "Published {} post(s). Next due after {}.",
                self.published.len(),
                crate::domain::format_timestamp(self.next_due)
            ),
        }
    }
}

/// Drains due drafts from the tank into the posted partitions
pub struct Publisher<'a, C: Clock> {
    site: &'a Site,
    schedule: Schedule,
    clock: C,
}

impl<'a, C: Clock> Publisher<'a, C> {
    pub fn new(site: &'a Site, clock: C) -> Result<Self> {
        let schedule = site.config().schedule()?;
        Ok(Self {
            site,
            schedule,
            clock,
        })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Computes the schedule for a run at the current time, with no side effects
    ///
    /// Assumes every listed draft reads cleanly; a real run skips unreadable
    /// drafts and moves the next one into their slot.
    pub fn plan(&self) -> Result<Plan> {
        let stored = self.site.state().load()?;
        let last = self.schedule.effective_last(stored);
        let now = self.clock.now();
        let due = self.schedule.due_slots(last, now);
        let drafts = self.site.tank().list()?;

        let slots = drafts
            .iter()
            .take(usize::try_from(due).unwrap_or(usize::MAX))
            .enumerate()
            .map(|(i, draft)| PlannedSlot {
                slot: self.schedule.slot(last, i as u64 + 1),
                draft: draft.clone(),
            })
            .collect();

        Ok(Plan {
            now,
            last_published_at: last,
            seeded: stored.is_none(),
            due,
            drafts: drafts.len(),
            slots,
            next_due: self.schedule.next_due(last),
            pending_commits: self.site.journal().read()?.len(),
        })
    }

    /// Finishes the draft removals of an interrupted run
    ///
    /// Returns `None` when the journal is empty.
    pub fn recover(&self) -> Result<Option<Recovery>> {
        let journal = self.site.journal();
        let pending = journal.read()?;
        let Some(latest) = pending.iter().map(|c| c.slot).max() else {
            return Ok(None);
        };

        let mut drafts_removed = 0;
        for commit in &pending {
            if commit.draft.exists() {
                tracing::info!(
                    slug = %commit.slug,
                    draft = %commit.draft.display(),
                    "removing draft left behind by an interrupted run"
                );
                Tank::remove(&commit.draft)?;
                drafts_removed += 1;
            }
        }

        let state = self.site.state();
        let last = match state.load()? {
            Some(stored) if stored >= latest => stored,
            _ => {
                state.save(latest).context("Failed to advance publish state")?;
                latest
            }
        };

        self.site.manifests().rebuild_root()?;
        journal.clear()?;

        Ok(Some(Recovery {
            commits: pending.len(),
            drafts_removed,
            last_published_at: last,
        }))
    }

    /// Runs one publish cycle
    pub fn run(&self) -> Result<PublishReport> {
        let recovery = self.recover()?;

        let state = self.site.state();
        let last = self.schedule.effective_last(state.load()?);
        let now = self.clock.now();
        let due = self.schedule.due_slots(last, now);

        let report = |outcome: Outcome,
                      published: Vec<ManifestEntry>,
                      skipped: Vec<SkippedDraft>,
                      new_last: DateTime<Utc>| PublishReport {
            outcome,
            due,
            published,
            skipped,
            last_published_at: new_last,
            next_due: self.schedule.next_due(new_last),
            recovery: recovery.clone(),
        };

        if due == 0 {
            tracing::debug!(last = %last, now = %now, "no slots due");
            return Ok(report(Outcome::NoSlotsDue, Vec::new(), Vec::new(), last));
        }

        let tank = self.site.tank();
        let drafts = tank.list()?;
        if drafts.is_empty() {
            tracing::debug!(tank = %tank.dir().display(), due, "tank is empty");
            return Ok(report(Outcome::EmptyTank, Vec::new(), Vec::new(), last));
        }

        let template = self.site.template()?;
        let manifests = self.site.manifests();
        let journal = self.site.journal();
        let url_prefix = &self.site.config().site.url_prefix;

        let mut published: Vec<ManifestEntry> = Vec::new();
        let mut skipped = Vec::new();

        for path in drafts {
            if published.len() as u64 >= due {
                break;
            }

            let unit = match Tank::read_unit(&path) {
                Ok(unit) => unit,
                Err(e) => {
                    tracing::warn!(draft = %path.display(), error = %e, "skipping unreadable draft");
                    skipped.push(SkippedDraft {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let slot = self.schedule.slot(last, published.len() as u64 + 1);
            let post = unit.publish(&template, slot, url_prefix);
            let target = manifests.partition_dir(&post.partition).join(post.slug.as_str());

            let assets = write_post(&post, &target)?;
            let entry = post.entry();
            manifests.upsert(&post.partition, entry.clone())?;

            journal.record(PendingCommit {
                slug: post.slug.clone(),
                draft: post.source.clone(),
                url: post.url.clone(),
                slot,
            })?;
            Tank::remove(&post.source)?;

            tracing::info!(
                slug = %post.slug,
                partition = %post.partition,
                slot = %entry.date,
                assets,
                "published"
            );
            published.push(entry);
        }

        if published.is_empty() {
            return Ok(report(Outcome::Published, published, skipped, last));
        }

        let new_last = self.schedule.slot(last, published.len() as u64);
        manifests.rebuild_root()?;
        state
            .save(new_last)
            .context("Failed to save publish state")?;
        journal.clear()?;

        Ok(report(Outcome::Published, published, skipped, new_last))
    }
}
