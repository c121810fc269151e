use super::levels::{LevelBreakdown, level_breakdown, tier_for_level};
use super::{LedgerOptions, logs_within, magic_items, story_awards};
use crate::model::{LedgerItem, Log};
use serde::Serialize;

/// Running totals of a character's log sequence, as of a cutoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogsSummary {
    pub log_count: usize,
    pub experience: i64,
    pub acp: i64,
    pub tcp: i64,
    pub gold: f64,
    pub dtd: i64,
    pub levels: LevelBreakdown,
    pub tier: u8,
    pub magic_items: Vec<LedgerItem>,
    pub story_awards: Vec<LedgerItem>,
}

impl LogsSummary {
    #[must_use]
    pub const fn level(&self) -> i64 {
        self.levels.total
    }
}

/// Fold `logs` (chronological) into totals and holdings.
#[must_use]
pub fn summarize(logs: &[Log], options: &LedgerOptions<'_>, max_level: i64) -> LogsSummary {
    let covered = logs_within(logs, options.cutoff);

    let mut experience = 0_i64;
    let mut acp = 0_i64;
    let mut tcp = 0_i64;
    let mut gold = 0.0_f64;
    let mut dtd = 0_i64;
    let mut explicit_levels = 0_i64;
    for log in covered {
        experience += log.experience;
        acp += log.acp;
        tcp += log.tcp;
        gold += log.gold;
        dtd += log.dtd;
        explicit_levels += log.level;
    }

    let levels = level_breakdown(experience, acp, explicit_levels, max_level);

    LogsSummary {
        log_count: covered.len(),
        experience,
        acp,
        tcp,
        gold,
        dtd,
        levels,
        tier: tier_for_level(levels.total),
        magic_items: magic_items(logs, options).into_iter().cloned().collect(),
        story_awards: story_awards(logs, options).into_iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{gain_then_lose, item, log};
    use super::*;
    use crate::ledger::levels::MAX_LEVEL;
    use crate::model::ItemKind;

    #[test]
    fn totals_follow_cutoff() {
        let mut logs = gain_then_lose();
        logs[0].gold = 125.5;
        logs[0].acp = 4;
        logs[0].tcp = 2;
        logs[1].gold = -25.5;
        logs[1].dtd = 10;

        let all = summarize(&logs, &LedgerOptions::default(), MAX_LEVEL);
        assert_eq!(all.log_count, 2);
        assert!((all.gold - 100.0).abs() < f64::EPSILON);
        assert_eq!(all.dtd, 10);
        assert_eq!(all.level(), 2);
        assert!(all.magic_items.is_empty());

        let first = summarize(&logs, &LedgerOptions::through("1"), MAX_LEVEL);
        assert_eq!(first.log_count, 1);
        assert!((first.gold - 125.5).abs() < f64::EPSILON);
        assert_eq!(first.dtd, 0);
        assert_eq!(first.magic_items.len(), 1);
    }

    #[test]
    fn tier_tracks_level() {
        let mut a = log("1", 1);
        a.level = 4;
        a.gained.push(item("award", ItemKind::StoryAward, "1", None));
        let summary = summarize(&[a], &LedgerOptions::default(), MAX_LEVEL);
        assert_eq!(summary.level(), 5);
        assert_eq!(summary.tier, 2);
        assert_eq!(summary.story_awards.len(), 1);
    }

    #[test]
    fn empty_sequence_is_level_one() {
        let summary = summarize(&[], &LedgerOptions::default(), MAX_LEVEL);
        assert_eq!(summary.log_count, 0);
        assert_eq!(summary.level(), 1);
        assert_eq!(summary.tier, 1);
    }
}
