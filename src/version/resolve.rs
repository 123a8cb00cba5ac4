use super::clock::Causality;
use super::record::VersionedRecord;

/// How the engine treats mutually concurrent versions of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// Pick the sibling with the latest wall-clock timestamp. Accepts a small
    /// risk of silently dropping a concurrent write.
    LastWriteWins,
    /// Surface every sibling to the caller, who must merge and write back a
    /// version whose clock dominates them all.
    KeepSiblings,
}

/// Filter a version set down to the causal frontier: drop anything dominated
/// by (or equal to) another version, keep all mutually concurrent survivors.
pub fn resolve(versions: Vec<VersionedRecord>) -> Vec<VersionedRecord> {
    if versions.len() <= 1 {
        return versions;
    }

    let mut frontier: Vec<VersionedRecord> = Vec::new();

    for candidate in versions {
        let mut dominated = false;
        let mut displaced = Vec::new();

        for (i, resident) in frontier.iter().enumerate() {
            match candidate.clock.compare(&resident.clock) {
                Causality::Ancestor | Causality::Equal => {
                    dominated = true;
                    break;
                }
                Causality::Descendant => displaced.push(i),
                Causality::Concurrent => {}
            }
        }

        if !dominated {
            for i in displaced.into_iter().rev() {
                frontier.remove(i);
            }
            frontier.push(candidate);
        }
    }

    frontier
}

/// Collapse a sibling set under last-write-wins: latest timestamp wins, with
/// the clock digest as a deterministic tie-break so every node picks the same
/// winner.
pub fn last_write_wins(mut siblings: Vec<VersionedRecord>) -> Option<VersionedRecord> {
    siblings
        .sort_by_key(|record| (record.timestamp_ms, record.clock.digest()));
    siblings.pop()
}
