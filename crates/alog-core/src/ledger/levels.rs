//! Character level from accumulated experience, advancement checkpoints and
//! explicit level grants.

use serde::{Deserialize, Serialize};

/// Default level cap.
pub const MAX_LEVEL: i64 = 20;

/// Total experience needed to reach levels 2 through 20.
pub const XP_THRESHOLDS: [i64; 19] = [
    300, 900, 2_700, 6_500, 14_000, 23_000, 34_000, 48_000, 64_000, 85_000, 100_000, 120_000,
    140_000, 165_000, 195_000, 225_000, 265_000, 305_000, 355_000,
];

/// ACP cost of a level while the running level is below this value.
const LOW_TIER_CEILING: i64 = 4;
const LOW_TIER_ACP_COST: i64 = 4;
const HIGH_TIER_ACP_COST: i64 = 8;

/// How a character's total level was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBreakdown {
    pub total: i64,
    pub from_xp: i64,
    pub from_acp: i64,
    pub from_logs: i64,
}

/// Compute total level and its sources.
///
/// Experience levels are applied first, then ACP levels priced from the
/// level reached so far, then explicit grants. The total is capped at
/// `max_level`; negative inputs contribute nothing.
#[must_use]
pub fn level_breakdown(experience: i64, acp: i64, explicit_levels: i64, max_level: i64) -> LevelBreakdown {
    let max_level = max_level.max(1);

    let from_xp = XP_THRESHOLDS
        .iter()
        .take_while(|&&threshold| experience >= threshold)
        .count();
    let from_xp = i64::try_from(from_xp).unwrap_or(0);

    let mut from_acp = 0;
    let mut remaining = acp.max(0);
    loop {
        let running = 1 + from_xp + from_acp;
        if running >= max_level {
            break;
        }
        let cost = if running < LOW_TIER_CEILING {
            LOW_TIER_ACP_COST
        } else {
            HIGH_TIER_ACP_COST
        };
        if remaining < cost {
            break;
        }
        remaining -= cost;
        from_acp += 1;
    }

    let from_logs = explicit_levels.max(0);
    let total = (1 + from_xp + from_acp + from_logs).min(max_level);

    LevelBreakdown {
        total,
        from_xp,
        from_acp,
        from_logs,
    }
}

/// Play tier for a level: 1 (1–4), 2 (5–10), 3 (11–16), 4 (17+).
#[must_use]
pub const fn tier_for_level(level: i64) -> u8 {
    if level >= 17 {
        4
    } else if level >= 11 {
        3
    } else if level >= 5 {
        2
    } else {
        1
    }
}
