//! Evaluation identities
//!
//! Every individual created during a run gets a fresh UUID that is never
//! reused, plus a monotonically increasing birth counter.

use std::collections::HashSet;

use uuid::Uuid;

/// Issues unique identities for a run.
///
/// UUIDs come from OS randomness, independent of the run seed, so two runs with
/// the same seed never name an evaluation the same way. Birth ids are the
/// reproducible per-run counter.
#[derive(Clone, Debug, Default)]
pub struct IdentityAllocator {
    issued: HashSet<Uuid>,
    next_birth_id: usize,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh `(identity, birth_id)` pair
    pub fn issue(&mut self) -> (Uuid, usize) {
        let identity = loop {
            let candidate = Uuid::new_v4();
            if self.issued.insert(candidate) {
                break candidate;
            }
        };
        let birth_id = self.next_birth_id;
        self.next_birth_id += 1;
        (identity, birth_id)
    }

    /// Number of identities issued so far
    pub fn issued(&self) -> usize {
        self.next_birth_id
    }
}
