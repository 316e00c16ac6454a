//! Trust-graph evaluation.
//!
//! The engine computes two per-user scalars on demand: `idt(u)`, the identity
//! trust balance, and `penalty(u)`, the accumulated punishment. Both walk an
//! arbitrary directed graph that may contain cycles, so each top-level call
//! carries a visited set: entering an already-visited node contributes zero.
//!
//! The result depends on the entry point. `idt(a)` started fresh is not the
//! sum of contributions observable from other starting nodes, and cached
//! intermediate balances are never reused across top-level queries — every
//! query re-walks the graph against the snapshot it was given.
//!
//! IDT and penalty are two separate recursions: the penalty of a node
//! encountered during an IDT walk is evaluated fresh, with its own visited
//! set, following outgoing edges instead of incoming ones.

use std::collections::HashSet;

use crate::identity::Identity;
use crate::store::TrustStore;

/// How many top-ranked vouchers contribute to a balance.
pub const TOP_VOUCHERS_SIZE: usize = 5;

/// Upper bound on a moderator-granted proof balance. Genesis loads bypass it.
pub const MAX_IDT_BY_PROOF: u64 = 50_000;

/// Clamp on a single vouchee's penalty before propagation. Bounds the damage
/// one punished vouchee can inflict on its vouchers while still letting
/// penalties accumulate across many vouchees.
pub const MAX_VOUCHEE_PENALTY: u64 = 4 * MAX_IDT_BY_PROOF;

/// Dampening applied to each voucher's balance per propagation level.
pub const IDT_REDUCE_BY_LEVEL_COEFFICIENT: f64 = 0.10;

/// Dampening applied to each vouchee's penalty per propagation level.
pub const PENALTY_REDUCE_BY_LEVEL_COEFFICIENT: f64 = 0.10;

/// Reserved proof id for genesis balances.
pub const GENESIS_PROOF_ID: &str = "0";

/// Cycle-safe recursive evaluator over a [`TrustStore`] snapshot.
///
/// The engine borrows the store for the duration of one or more queries;
/// callers are responsible for handing it a logically consistent snapshot
/// (the service holds its state lock across the borrow).
pub struct TrustEngine<'a> {
    store: &'a dyn TrustStore,
}

impl<'a> TrustEngine<'a> {
    pub fn new(store: &'a dyn TrustStore) -> Self {
        Self { store }
    }

    /// The user's identity-trust balance:
    /// `max(0, balance_by_vouchers + balance_by_proof - penalty)`.
    pub fn idt(&self, user: &Identity) -> u64 {
        self.idt_visited(user, &mut HashSet::new())
    }

    /// The user's accumulated penalty:
    /// `penalty_by_vouchees + penalty_by_proof`.
    pub fn penalty(&self, user: &Identity) -> u64 {
        self.penalty_visited(user, &mut HashSet::new())
    }

    fn idt_visited(&self, user: &Identity, visited: &mut HashSet<Identity>) -> u64 {
        if !visited.insert(user.clone()) {
            return 0;
        }
        let by_vouchers = self.balance_by_vouchers(user, visited);
        let by_proof = self
            .store
            .get_proof(user)
            .map(|proof| proof.balance)
            .unwrap_or(0);
        // Independent recursion with a fresh visited set, not threaded
        // through the IDT walk.
        let penalty = self.penalty(user);
        by_vouchers
            .saturating_add(by_proof)
            .saturating_sub(penalty)
    }

    /// Ranks the incoming vouchers by their own IDT, keeps the top
    /// [`TOP_VOUCHERS_SIZE`], dampens each and floors the sum once.
    fn balance_by_vouchers(&self, user: &Identity, visited: &mut HashSet<Identity>) -> u64 {
        let mut balances: Vec<u64> = self
            .store
            .incoming_vouches(user)
            .iter()
            .map(|(voucher, _)| self.idt_visited(voucher, visited))
            .collect();
        // Stable sort: ties keep the store's order.
        balances.sort_by(|a, b| b.cmp(a));
        let dampened: f64 = balances
            .iter()
            .take(TOP_VOUCHERS_SIZE)
            .map(|balance| *balance as f64 * IDT_REDUCE_BY_LEVEL_COEFFICIENT)
            .sum();
        dampened.floor() as u64
    }

    fn penalty_visited(&self, user: &Identity, visited: &mut HashSet<Identity>) -> u64 {
        if !visited.insert(user.clone()) {
            return 0;
        }
        let by_vouchees = self.penalty_by_vouchees(user, visited);
        let by_proof: u64 = self
            .store
            .penalties_of(user)
            .iter()
            .map(|penalty| penalty.balance)
            .fold(0, u64::saturating_add);
        by_vouchees.saturating_add(by_proof)
    }

    /// Each vouchee's penalty, clamped to [`MAX_VOUCHEE_PENALTY`], dampened,
    /// summed and floored once.
    fn penalty_by_vouchees(&self, user: &Identity, visited: &mut HashSet<Identity>) -> u64 {
        let dampened: f64 = self
            .store
            .outgoing_vouches(user)
            .iter()
            .map(|(vouchee, _)| {
                self.penalty_visited(vouchee, visited)
                    .min(MAX_VOUCHEE_PENALTY)
            })
            .map(|penalty| penalty as f64 * PENALTY_REDUCE_BY_LEVEL_COEFFICIENT)
            .sum();
        dampened.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTrustStore;
    use crate::timestamp::UnixTimestamp;

    fn id(name: &str) -> Identity {
        Identity::new(name.as_bytes().to_vec())
    }

    fn ts() -> UnixTimestamp {
        UnixTimestamp(1)
    }

    #[test]
    fn proof_alone_is_the_balance() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 5, ts(), "id1");
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), 5);

        store.set_proof(&id("a"), 50, ts(), "id1");
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), 50);
    }

    #[test]
    fn unknown_user_has_zero_balance_and_penalty() {
        let store = InMemoryTrustStore::new();
        let engine = TrustEngine::new(&store);
        assert_eq!(engine.idt(&id("nobody")), 0);
        assert_eq!(engine.penalty(&id("nobody")), 0);
    }

    #[test]
    fn single_layer_vouch_propagates_a_tenth() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("b"), 50, ts(), "id1");
        store.insert_vouch(&id("b"), &id("a"), ts());
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), 5);
    }

    #[test]
    fn two_layer_vouch_compounds() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 10, ts(), "id1");
        store.set_proof(&id("b"), 10, ts(), "id1");
        store.set_proof(&id("c"), 500, ts(), "id1");
        store.insert_vouch(&id("c"), &id("b"), ts());
        store.insert_vouch(&id("b"), &id("a"), ts());
        let engine = TrustEngine::new(&store);
        assert_eq!(engine.idt(&id("b")), 60);
        assert_eq!(engine.idt(&id("a")), 16);
    }

    #[test]
    fn self_vouch_contributes_nothing() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 100, ts(), "id1");
        let before = TrustEngine::new(&store).idt(&id("a"));
        store.insert_vouch(&id("a"), &id("a"), ts());
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), before);
    }

    #[test]
    fn only_the_top_five_vouchers_count() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 10, ts(), "id1");
        for (name, balance) in [("v2", 20u64), ("v3", 30), ("v4", 40), ("v5", 50), ("v6", 60)] {
            store.set_proof(&id(name), balance, ts(), "id1");
            store.insert_vouch(&id(name), &id("a"), ts());
        }
        // Five vouchers: 0.1 * (20 + 30 + 40 + 50 + 60) = 20, plus own proof.
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), 30);

        // A sixth voucher ranked below the current top five changes nothing.
        store.set_proof(&id("v1"), 10, ts(), "id1");
        store.insert_vouch(&id("v1"), &id("a"), ts());
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), 30);
    }

    #[test]
    fn cycle_terminates_and_is_entry_point_sensitive() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 100, ts(), "id1");
        store.set_proof(&id("b"), 100, ts(), "id1");
        store.set_proof(&id("c"), 200, ts(), "id1");
        store.insert_vouch(&id("b"), &id("c"), ts());
        store.insert_vouch(&id("c"), &id("a"), ts());
        store.insert_vouch(&id("a"), &id("b"), ts());

        let engine = TrustEngine::new(&store);
        assert_eq!(engine.idt(&id("c")), 211);
        assert_eq!(engine.idt(&id("a")), 121);
        assert_eq!(engine.idt(&id("b")), 112);

        // Re-issuing the same vouches leaves balances unchanged.
        store.insert_vouch(&id("b"), &id("c"), ts());
        store.insert_vouch(&id("c"), &id("a"), ts());
        store.insert_vouch(&id("a"), &id("b"), ts());
        let engine = TrustEngine::new(&store);
        assert_eq!(engine.idt(&id("c")), 211);
        assert_eq!(engine.idt(&id("a")), 121);
        assert_eq!(engine.idt(&id("b")), 112);
    }

    #[test]
    fn evaluation_is_deterministic_on_a_snapshot() {
        let mut store = InMemoryTrustStore::new();
        for name in ["a", "b", "c", "d"] {
            store.set_proof(&id(name), 1000, ts(), "id1");
        }
        store.insert_vouch(&id("a"), &id("b"), ts());
        store.insert_vouch(&id("b"), &id("c"), ts());
        store.insert_vouch(&id("c"), &id("a"), ts());
        store.insert_vouch(&id("d"), &id("a"), ts());
        let engine = TrustEngine::new(&store);
        let first = engine.idt(&id("a"));
        for _ in 0..10 {
            assert_eq!(engine.idt(&id("a")), first);
        }
    }

    #[test]
    fn penalty_zeroes_balance_but_never_below_zero() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 50_000, ts(), "id1");
        store.insert_vouch(&id("a"), &id("b"), ts());
        let engine = TrustEngine::new(&store);
        assert_eq!(engine.idt(&id("b")), 5_000);

        store.insert_penalty("p1", &id("b"), &id("mod"), 10_000, ts());
        assert_eq!(TrustEngine::new(&store).idt(&id("b")), 0);

        store.insert_penalty("p3", &id("b"), &id("mod"), 100_000, ts());
        assert_eq!(TrustEngine::new(&store).idt(&id("b")), 0);
    }

    #[test]
    fn vouchee_penalty_is_clamped_before_propagation() {
        let mut store = InMemoryTrustStore::new();
        store.set_proof(&id("a"), 50_000, ts(), "id1");
        store.insert_vouch(&id("a"), &id("b"), ts());
        store.insert_penalty("p1", &id("b"), &id("mod"), 100_000, ts());
        store.insert_penalty("p2", &id("b"), &id("mod"), 100_000, ts());
        store.insert_penalty("p3", &id("b"), &id("mod"), 100_000, ts());

        let engine = TrustEngine::new(&store);
        // b carries 300000 of direct penalty, clamped to 200000 before the
        // 0.1 dampening: a loses exactly 20000.
        assert_eq!(engine.penalty(&id("b")), 300_000);
        assert_eq!(engine.penalty(&id("a")), 20_000);
        assert_eq!(engine.idt(&id("a")), 30_000);
    }

    #[test]
    fn penalty_recursion_survives_cycles() {
        let mut store = InMemoryTrustStore::new();
        store.insert_vouch(&id("a"), &id("b"), ts());
        store.insert_vouch(&id("b"), &id("a"), ts());
        store.insert_penalty("p1", &id("b"), &id("mod"), 1_000, ts());
        let engine = TrustEngine::new(&store);
        assert_eq!(engine.penalty(&id("b")), 1_000);
        assert_eq!(engine.penalty(&id("a")), 100);
    }

    #[test]
    fn dampening_floors_the_sum_not_each_term() {
        let mut store = InMemoryTrustStore::new();
        // Two vouchers at 15 each: 1.5 + 1.5 = 3.0, not floor(1.5) * 2 = 2.
        store.set_proof(&id("v1"), 15, ts(), "id1");
        store.set_proof(&id("v2"), 15, ts(), "id1");
        store.insert_vouch(&id("v1"), &id("a"), ts());
        store.insert_vouch(&id("v2"), &id("a"), ts());
        assert_eq!(TrustEngine::new(&store).idt(&id("a")), 3);
    }
}
