//! Short, prefixed record identifiers.
//!
//! IDs look like `ch-3k9x0q2a`: a record-kind prefix plus eight base36
//! characters taken from a BLAKE3 digest of the seed, wall clock, process id
//! and a process-wide counter.

use std::sync::atomic::{AtomicU64, Ordering};

const BODY_LEN: usize = 8;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Record kinds that carry generated IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Character,
    DungeonMaster,
    Log,
    Item,
}

impl IdKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::User => "u",
            Self::Character => "ch",
            Self::DungeonMaster => "dm",
            Self::Log => "lg",
            Self::Item => "it",
        }
    }
}

/// Generate a fresh ID of the given kind.
///
/// `seed` only perturbs the digest (names make collisions across concurrent
/// processes even less likely); uniqueness comes from the clock and counter.
#[must_use]
pub fn generate(kind: IdKind, seed: &str) -> String {
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = blake3::Hasher::new();
    hasher.update(kind.prefix().as_bytes());
    hasher.update(seed.as_bytes());
    hasher.update(&crate::model::time::now_us().to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    hasher.update(&count.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    format!("{}-{}", kind.prefix(), base36(u64::from_le_bytes(bytes)))
}

fn base36(mut value: u64) -> String {
    let mut out = [b'0'; BODY_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[usize::try_from(value % 36).unwrap_or(0)];
        value /= 36;
    }
    out.iter().map(|&b| char::from(b)).collect()
}

/// Returns true if `id` has the shape of an ID of `kind`.
#[must_use]
pub fn has_kind(id: &str, kind: IdKind) -> bool {
    id.strip_prefix(kind.prefix())
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|body| !body.is_empty() && body.bytes().all(|b| ALPHABET.contains(&b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_have_prefix_and_fixed_body() {
        let id = generate(IdKind::Character, "Vex");
        assert!(id.starts_with("ch-"));
        assert_eq!(id.len(), "ch-".len() + BODY_LEN);
        assert!(has_kind(&id, IdKind::Character));
        assert!(!has_kind(&id, IdKind::Log));
    }

    #[test]
    fn generated_ids_are_unique_in_a_burst() {
        let ids: HashSet<String> = (0..2_000).map(|_| generate(IdKind::Item, "same")).collect();
        assert_eq!(ids.len(), 2_000);
    }

    #[test]
    fn base36_pads_small_values() {
        assert_eq!(base36(0), "00000000");
        assert_eq!(base36(35), "0000000z");
    }

    #[test]
    fn has_kind_rejects_malformed() {
        assert!(!has_kind("ch-", IdKind::Character));
        assert!(!has_kind("ch_abc", IdKind::Character));
        assert!(!has_kind("ch-ABC", IdKind::Character));
    }
}
