use alog_core::ledger::{
    Cutoff, LedgerOptions, check_consistency, held_items, level_breakdown, tier_for_level,
};
use alog_core::model::{ItemKind, LedgerItem};
use proptest::prelude::*;

use generators::*;

fn ids(items: &[&LedgerItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn gain_only_sequence_holds_every_gained_item(shape in arb_gain_only_shape(), kind in arb_kind()) {
        let logs = build_sequence(&shape);
        let expected: Vec<String> = logs
            .iter()
            .flat_map(|log| log.gained_of(kind))
            .map(|item| item.id.clone())
            .collect();
        let held = held_items(&logs, kind, &LedgerOptions::default());
        prop_assert_eq!(ids(&held), expected);
    }

    #[test]
    fn full_walk_holds_exactly_the_never_lost_items(shape in arb_shape(), kind in arb_kind()) {
        let logs = build_sequence(&shape);
        let expected: Vec<String> = logs
            .iter()
            .flat_map(|log| log.gained_of(kind))
            .filter(|item| item.log_lost_id.is_none())
            .map(|item| item.id.clone())
            .collect();
        let held = held_items(&logs, kind, &LedgerOptions::default());
        prop_assert_eq!(ids(&held), expected);
    }

    #[test]
    fn lost_item_is_held_only_between_gain_and_loss(shape in arb_shape()) {
        let logs = build_sequence(&shape);
        let position = |id: &str| logs.iter().position(|log| log.id == id);

        for log in &logs {
            for item in &log.gained {
                let Some(lost_id) = item.log_lost_id.as_deref() else { continue };
                let gained_at = position(&item.log_gained_id).unwrap_or(0);
                let lost_at = position(lost_id).unwrap_or(0);

                let held_now = ids(&held_items(&logs, item.kind, &LedgerOptions::default()));
                prop_assert!(!held_now.contains(&item.id));

                let through_gain = ids(&held_items(&logs, item.kind, &LedgerOptions::through(&item.log_gained_id)));
                prop_assert_eq!(through_gain.contains(&item.id), lost_at > gained_at);

                let before_loss = ids(&held_items(&logs, item.kind, &LedgerOptions::before(lost_id)));
                prop_assert_eq!(before_loss.contains(&item.id), lost_at > gained_at);

                let through_loss = ids(&held_items(&logs, item.kind, &LedgerOptions::through(lost_id)));
                prop_assert!(!through_loss.contains(&item.id));
            }
        }
    }

    #[test]
    fn reduction_is_deterministic(shape in arb_shape(), kind in arb_kind(), cut in 0_usize..12) {
        let logs = build_sequence(&shape);
        let cutoff = log_id(cut);
        let options = LedgerOptions::through(&cutoff);
        prop_assert_eq!(held_items(&logs, kind, &options), held_items(&logs, kind, &options));
    }

    #[test]
    fn unknown_cutoff_equals_no_cutoff(shape in arb_shape(), kind in arb_kind()) {
        let logs = build_sequence(&shape);
        let unknown = LedgerOptions {
            cutoff: Some(Cutoff::Through("lg-missing")),
            exclude_dropped: false,
        };
        prop_assert_eq!(
            held_items(&logs, kind, &unknown),
            held_items(&logs, kind, &LedgerOptions::default())
        );
    }

    #[test]
    fn unmatched_loss_changes_nothing(shape in arb_shape(), kind in arb_kind()) {
        let logs = build_sequence(&shape);
        let before = ids(&held_items(&logs, kind, &LedgerOptions::default()));

        let mut patched = logs.clone();
        let last = patched.len() - 1;
        patched[last].lost.push(LedgerItem {
            id: "it-ghost".into(),
            kind,
            name: "Ghost".into(),
            description: None,
            log_gained_id: "lg-elsewhere".into(),
            log_lost_id: Some(log_id(last)),
        });
        let after = ids(&held_items(&patched, kind, &LedgerOptions::default()));
        prop_assert_eq!(before, after);
    }

    #[test]
    fn generated_sequences_are_consistent(shape in arb_shape()) {
        let logs = build_sequence(&shape);
        prop_assert!(check_consistency(&logs).is_ok());
    }

    #[test]
    fn exclude_dropped_never_shows_lost_items(shape in arb_shape(), cut in 0_usize..12) {
        let logs = build_sequence(&shape);
        let cutoff = log_id(cut);
        let options = LedgerOptions {
            cutoff: Some(Cutoff::Through(&cutoff)),
            exclude_dropped: true,
        };
        for kind in [ItemKind::MagicItem, ItemKind::StoryAward] {
            for item in held_items(&logs, kind, &options) {
                prop_assert!(item.log_lost_id.is_none());
            }
        }
    }

    #[test]
    fn level_is_capped_and_monotone(
        xp in 0_i64..400_000,
        acp in 0_i64..200,
        explicit in 0_i64..25,
        bump in 1_i64..5_000,
        cap in 1_i64..=20,
    ) {
        let base = level_breakdown(xp, acp, explicit, cap);
        prop_assert!(base.total >= 1);
        prop_assert!(base.total <= cap);

        prop_assert!(level_breakdown(xp + bump, acp, explicit, cap).total >= base.total);
        prop_assert!(level_breakdown(xp, acp + bump, explicit, cap).total >= base.total);
        prop_assert!(level_breakdown(xp, acp, explicit + 1, cap).total >= base.total);
    }

    #[test]
    fn tier_is_monotone(level in 1_i64..20) {
        prop_assert!(tier_for_level(level + 1) >= tier_for_level(level));
    }
}
