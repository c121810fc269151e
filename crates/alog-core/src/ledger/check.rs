//! Ordering check for loss references.
//!
//! The schema cannot express "an item is lost at or after the log that
//! gained it", so the write path runs this over the whole character after
//! every save.

use crate::model::Log;
use std::collections::HashMap;

/// A loss reference that points before the gain, or outside the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerViolation {
    pub item_id: String,
    pub log_gained_id: String,
    pub log_lost_id: String,
    pub reason: &'static str,
}

/// Verify that every loss in `logs` is at or after the matching gain.
///
/// `logs` must be in chronological order.
///
/// # Errors
///
/// Returns the first violation found, in log order.
pub fn check_consistency(logs: &[Log]) -> Result<(), LedgerViolation> {
    let position: HashMap<&str, usize> = logs
        .iter()
        .enumerate()
        .map(|(idx, log)| (log.id.as_str(), idx))
        .collect();

    for (lost_at, log) in logs.iter().enumerate() {
        for item in &log.lost {
            let Some(&gained_at) = position.get(item.log_gained_id.as_str()) else {
                return Err(LedgerViolation {
                    item_id: item.id.clone(),
                    log_gained_id: item.log_gained_id.clone(),
                    log_lost_id: log.id.clone(),
                    reason: "item was not gained by this character",
                });
            };
            if gained_at > lost_at {
                return Err(LedgerViolation {
                    item_id: item.id.clone(),
                    log_gained_id: item.log_gained_id.clone(),
                    log_lost_id: log.id.clone(),
                    reason: "loss is dated before the gain",
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{gain_then_lose, item, log};
    use super::*;
    use crate::model::ItemKind;

    #[test]
    fn ordered_gain_and_loss_pass() {
        assert!(check_consistency(&gain_then_lose()).is_ok());
    }

    #[test]
    fn loss_before_gain_fails() {
        let mut logs = gain_then_lose();
        logs.reverse();
        let violation = check_consistency(&logs).expect_err("reversed order");
        assert_eq!(violation.item_id, "x");
        assert_eq!(violation.reason, "loss is dated before the gain");
    }

    #[test]
    fn same_log_gain_and_loss_is_allowed() {
        let mut a = log("1", 1);
        let x = item("x", ItemKind::MagicItem, "1", Some("1"));
        a.gained.push(x.clone());
        a.lost.push(x);
        assert!(check_consistency(&[a]).is_ok());
    }

    #[test]
    fn foreign_item_fails() {
        let mut a = log("1", 1);
        a.lost.push(item("x", ItemKind::MagicItem, "elsewhere", Some("1")));
        let violation = check_consistency(&[a]).expect_err("foreign");
        assert_eq!(violation.reason, "item was not gained by this character");
    }
}
