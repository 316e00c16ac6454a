//! Replay prevention for signed actions.
//!
//! Every accepted action consumes a nonce in one of four namespaces. The
//! registry keeps only the latest consumed nonce per `(namespace, signer)`
//! rather than the full history: a nonce is accepted iff it is strictly above
//! the stored one (or no record exists), so clients must use strictly
//! increasing nonces per namespace. No two accepted actions may share a
//! `(namespace, signer, nonce)` triple.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::identity::Identity;

/// The nonce namespace an action consumes from.
///
/// `punish` does not appear here: punish actions consume from the [`Proof`]
/// namespace (see `ActionKind::nonce_namespace`).
///
/// [`Proof`]: NonceNamespace::Proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NonceNamespace {
    Vouch,
    Proof,
    Moderators,
    Admins,
}

impl NonceNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            NonceNamespace::Vouch => "vouch",
            NonceNamespace::Proof => "proof",
            NonceNamespace::Moderators => "moderators",
            NonceNamespace::Admins => "admins",
        }
    }
}

impl Display for NonceNamespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest-nonce store, one record per `(namespace, signer)`.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    latest: BTreeMap<(NonceNamespace, Identity), u64>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true iff a record exists for `(namespace, signer)` with a
    /// stored nonce at or above `nonce`.
    pub fn is_consumed(&self, namespace: NonceNamespace, signer: &Identity, nonce: u64) -> bool {
        self.latest
            .get(&(namespace, signer.clone()))
            .is_some_and(|stored| *stored >= nonce)
    }

    /// Records `nonce` as the latest consumed for `(namespace, signer)`.
    pub fn consume(&mut self, namespace: NonceNamespace, signer: &Identity, nonce: u64) {
        self.latest.insert((namespace, signer.clone()), nonce);
    }
}
