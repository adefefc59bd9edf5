use crate::fingerprint::Fingerprint;
use dashmap::DashSet;

/// Fingerprints that have already been classified Unique.
///
/// Backed by a sharded concurrent set: insert-if-absent is atomic per key, and
/// unrelated fingerprints land on different shards. Entries never expire;
/// only [`SeenRegistry::clear`] removes them.
#[derive(Debug, Default)]
pub struct SeenRegistry {
    seen: DashSet<Fingerprint>,
}

impl SeenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `fingerprint` was not present and has now been recorded.
    pub fn insert_if_absent(&self, fingerprint: Fingerprint) -> bool {
        self.seen.insert(fingerprint)
    }

    pub fn clear(&self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Sorted copy of the current members.
    pub fn snapshot(&self) -> Vec<Fingerprint> {
        let mut members: Vec<Fingerprint> = self.seen.iter().map(|fp| fp.key().clone()).collect();
        members.sort();
        members
    }
}
