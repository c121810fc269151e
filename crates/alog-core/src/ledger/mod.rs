//! Point-in-time reconstruction of a character's holdings.
//!
//! # Algorithm
//!
//! Logs arrive in chronological order. For each log, every gained item of
//! the requested kind is appended to a working collection keyed by item id;
//! every lost item of that kind is removed from it. A cutoff truncates the
//! walk:
//!
//! - [`Cutoff::Through`] processes up to and including the named log.
//! - [`Cutoff::Before`] stops just before the named log.
//!
//! A cutoff that names no log in the sequence processes everything. A loss
//! that names an item not currently held is ignored.
//!
//! The result keeps discovery (gained) order. With
//! [`LedgerOptions::exclude_dropped`], items whose `log_lost_id` is set are
//! filtered out afterwards, giving a "never lost" view.

pub mod check;
pub mod levels;
pub mod summary;

use crate::model::{ItemKind, LedgerItem, Log};
use tracing::debug;

pub use check::{LedgerViolation, check_consistency};
pub use levels::{LevelBreakdown, level_breakdown, tier_for_level};
pub use summary::{LogsSummary, summarize};

/// Where to stop walking the log sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff<'a> {
    /// Include the named log, then stop.
    Through(&'a str),
    /// Stop before the named log.
    Before(&'a str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerOptions<'a> {
    pub cutoff: Option<Cutoff<'a>>,
    pub exclude_dropped: bool,
}

impl<'a> LedgerOptions<'a> {
    #[must_use]
    pub const fn through(log_id: &'a str) -> Self {
        Self {
            cutoff: Some(Cutoff::Through(log_id)),
            exclude_dropped: false,
        }
    }

    #[must_use]
    pub const fn before(log_id: &'a str) -> Self {
        Self {
            cutoff: Some(Cutoff::Before(log_id)),
            exclude_dropped: false,
        }
    }
}

/// The prefix of `logs` covered by `cutoff`.
#[must_use]
pub fn logs_within<'l>(logs: &'l [Log], cutoff: Option<Cutoff<'_>>) -> &'l [Log] {
    let end = match cutoff {
        None => logs.len(),
        Some(Cutoff::Through(id)) => logs
            .iter()
            .position(|log| log.id == id)
            .map_or(logs.len(), |idx| idx + 1),
        Some(Cutoff::Before(id)) => logs
            .iter()
            .position(|log| log.id == id)
            .unwrap_or(logs.len()),
    };
    &logs[..end]
}

/// Items of `kind` held as of the configured cutoff, in gained order.
#[must_use]
pub fn held_items<'l>(
    logs: &'l [Log],
    kind: ItemKind,
    options: &LedgerOptions<'_>,
) -> Vec<&'l LedgerItem> {
    let mut held: Vec<&LedgerItem> = Vec::new();

    for log in logs_within(logs, options.cutoff) {
        for item in log.gained_of(kind) {
            match held.iter().position(|h| h.id == item.id) {
                Some(idx) => held[idx] = item,
                None => held.push(item),
            }
        }
        for item in log.lost_of(kind) {
            if let Some(idx) = held.iter().position(|h| h.id == item.id) {
                held.remove(idx);
            } else {
                debug!(item_id = %item.id, log_id = %log.id, "loss of unheld item ignored");
            }
        }
    }

    if options.exclude_dropped {
        held.retain(|item| item.log_lost_id.is_none());
    }
    held
}

/// Magic items held as of the cutoff.
#[must_use]
pub fn magic_items<'l>(logs: &'l [Log], options: &LedgerOptions<'_>) -> Vec<&'l LedgerItem> {
    held_items(logs, ItemKind::MagicItem, options)
}

/// Story awards held as of the cutoff.
#[must_use]
pub fn story_awards<'l>(logs: &'l [Log], options: &LedgerOptions<'_>) -> Vec<&'l LedgerItem> {
    held_items(logs, ItemKind::StoryAward, options)
}
