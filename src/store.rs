//! Persistent state for vouches, proofs, and penalties.
//!
//! [`TrustStore`] is the repository seam between the action pipeline, the
//! evaluation engine, and whatever backing holds the data. The in-memory
//! implementation provided here is the one the server runs on; a durable
//! backend would implement the same trait with identical semantics.
//!
//! Ordering matters: `incoming_vouches`, `outgoing_vouches`, and
//! `penalties_of` must return a deterministic, stable order for a given
//! snapshot, because the engine's voucher ranking breaks ties by store order.

use std::collections::BTreeMap;

use crate::identity::Identity;
use crate::timestamp::UnixTimestamp;

/// The single active proof of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRecord {
    pub balance: u64,
    pub timestamp: UnixTimestamp,
    pub proof_id: String,
}

/// A moderator-issued penalty, keyed by its `proof_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyRecord {
    pub target: Identity,
    pub moderator: Identity,
    pub balance: u64,
    pub timestamp: UnixTimestamp,
}

/// Repository of trust-graph state.
pub trait TrustStore {
    /// Upserts the vouch `voucher → vouchee`. At most one vouch exists per
    /// directed pair; re-issuing updates the timestamp.
    fn insert_vouch(&mut self, voucher: &Identity, vouchee: &Identity, timestamp: UnixTimestamp);

    /// All vouches pointing at `vouchee`, as `(voucher, timestamp)`.
    fn incoming_vouches(&self, vouchee: &Identity) -> Vec<(Identity, UnixTimestamp)>;

    /// All vouches issued by `voucher`, as `(vouchee, timestamp)`.
    fn outgoing_vouches(&self, voucher: &Identity) -> Vec<(Identity, UnixTimestamp)>;

    /// The user's active proof, if any.
    fn get_proof(&self, user: &Identity) -> Option<ProofRecord>;

    /// Upserts the user's proof, replacing any previous one.
    fn set_proof(
        &mut self,
        user: &Identity,
        balance: u64,
        timestamp: UnixTimestamp,
        proof_id: &str,
    );

    /// All penalties targeting `user`.
    fn penalties_of(&self, user: &Identity) -> Vec<PenaltyRecord>;

    /// Upserts a penalty by `proof_id`. Reusing a `proof_id` overwrites the
    /// previous record, including its target.
    fn insert_penalty(
        &mut self,
        proof_id: &str,
        target: &Identity,
        moderator: &Identity,
        balance: u64,
        timestamp: UnixTimestamp,
    );
}

/// In-memory [`TrustStore`] over ordered maps.
///
/// Vouch edges are indexed in both directions so that neither
/// `incoming_vouches` nor `outgoing_vouches` scans the whole edge set.
#[derive(Debug, Default)]
pub struct InMemoryTrustStore {
    outgoing: BTreeMap<Identity, BTreeMap<Identity, UnixTimestamp>>,
    incoming: BTreeMap<Identity, BTreeMap<Identity, UnixTimestamp>>,
    proofs: BTreeMap<Identity, ProofRecord>,
    penalties: BTreeMap<String, PenaltyRecord>,
}

impl InMemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustStore for InMemoryTrustStore {
    fn insert_vouch(&mut self, voucher: &Identity, vouchee: &Identity, timestamp: UnixTimestamp) {
        self.outgoing
            .entry(voucher.clone())
            .or_default()
            .insert(vouchee.clone(), timestamp);
        self.incoming
            .entry(vouchee.clone())
            .or_default()
            .insert(voucher.clone(), timestamp);
    }

    fn incoming_vouches(&self, vouchee: &Identity) -> Vec<(Identity, UnixTimestamp)> {
        self.incoming
            .get(vouchee)
            .map(|edges| edges.iter().map(|(v, ts)| (v.clone(), *ts)).collect())
            .unwrap_or_default()
    }

    fn outgoing_vouches(&self, voucher: &Identity) -> Vec<(Identity, UnixTimestamp)> {
        self.outgoing
            .get(voucher)
            .map(|edges| edges.iter().map(|(v, ts)| (v.clone(), *ts)).collect())
            .unwrap_or_default()
    }

    fn get_proof(&self, user: &Identity) -> Option<ProofRecord> {
        self.proofs.get(user).cloned()
    }

    fn set_proof(
        &mut self,
        user: &Identity,
        balance: u64,
        timestamp: UnixTimestamp,
        proof_id: &str,
    ) {
        self.proofs.insert(
            user.clone(),
            ProofRecord {
                balance,
                timestamp,
                proof_id: proof_id.to_string(),
            },
        );
    }

    fn penalties_of(&self, user: &Identity) -> Vec<PenaltyRecord> {
        self.penalties
            .values()
            .filter(|penalty| &penalty.target == user)
            .cloned()
            .collect()
    }

    fn insert_penalty(
        &mut self,
        proof_id: &str,
        target: &Identity,
        moderator: &Identity,
        balance: u64,
        timestamp: UnixTimestamp,
    ) {
        self.penalties.insert(
            proof_id.to_string(),
            PenaltyRecord {
                target: target.clone(),
                moderator: moderator.clone(),
                balance,
                timestamp,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identity {
        Identity::new(name.as_bytes().to_vec())
    }

    #[test]
    fn vouch_upsert_updates_timestamp_without_duplicating() {
        let mut store = InMemoryTrustStore::new();
        store.insert_vouch(&id("a"), &id("b"), UnixTimestamp(1));
        store.insert_vouch(&id("a"), &id("b"), UnixTimestamp(2));
        assert_eq!(store.incoming_vouches(&id("b")), vec![(id("a"), UnixTimestamp(2))]);
        assert_eq!(store.outgoing_vouches(&id("a")), vec![(id("b"), UnixTimestamp(2))]);
    }

    #[test]
    fn edges_are_indexed_both_ways() {
        let mut store = InMemoryTrustStore::new();
        store.insert_vouch(&id("a"), &id("b"), UnixTimestamp(1));
        store.insert_vouch(&id("c"), &id("b"), UnixTimestamp(1));
        assert_eq!(store.incoming_vouches(&id("b")).len(), 2);
        assert_eq!(store.outgoing_vouches(&id("b")), vec![]);
        assert_eq!(store.incoming_vouches(&id("a")), vec![]);
    }

    #[test]
    fn proof_replaces_previous() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 5, UnixTimestamp(1), "id1");
        store.set_proof(&id("a"), 50, UnixTimestamp(2), "id2");
        let proof = store.get_proof(&id("a")).unwrap();
        assert_eq!(proof.balance, 50);
        assert_eq!(proof.proof_id, "id2");
    }

    #[test]
    fn penalties_accumulate_per_user_but_overwrite_per_proof_id() {
        let mut store = InMemoryTrustStore::new();
        store.insert_penalty("p1", &id("b"), &id("mod"), 100, UnixTimestamp(1));
        store.insert_penalty("p2", &id("b"), &id("mod"), 200, UnixTimestamp(2));
        assert_eq!(store.penalties_of(&id("b")).len(), 2);

        store.insert_penalty("p1", &id("b"), &id("mod"), 150, UnixTimestamp(3));
        let balances: Vec<u64> = store
            .penalties_of(&id("b"))
            .iter()
            .map(|p| p.balance)
            .collect();
        assert_eq!(balances, vec![150, 200]);
    }

    #[test]
    fn penalty_proof_id_reuse_can_retarget() {
        let mut store = InMemoryTrustStore::new();
        store.insert_penalty("p1", &id("b"), &id("mod"), 100, UnixTimestamp(1));
        store.insert_penalty("p1", &id("c"), &id("mod"), 100, UnixTimestamp(2));
        assert!(store.penalties_of(&id("b")).is_empty());
        assert_eq!(store.penalties_of(&id("c")).len(), 1);
    }
}
