//! The action pipeline and read-side queries over the shared trust state.
//!
//! [`IdentityService`] owns the nonce registry, the role sets, and the trust
//! store behind one `RwLock`. Every mutating action runs the same pipeline
//! under a single write lock:
//!
//! 1. decode wire fields,
//! 2. build the canonical message,
//! 3. check the nonce is not consumed in the action's namespace,
//! 4. verify the signature,
//! 5. authorize,
//! 6. consume the nonce,
//! 7. apply the mutation,
//! 8. compute the post-mutation balance of the affected user.
//!
//! Holding the write lock across steps 3–7 makes nonce consumption and the
//! mutation one atomic commit: a consumed nonce implies the action was
//! applied, and no two accepted actions share a `(namespace, signer, nonce)`
//! triple. Queries take the read lock and evaluate against that consistent
//! snapshot; the evaluation itself is CPU-bound and never yields.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::instrument;

use crate::action::{self, ActionKind, SignatureError};
use crate::engine::{GENESIS_PROOF_ID, MAX_IDT_BY_PROOF, TrustEngine};
use crate::identity::{Identity, IdentityParseError};
use crate::nonce::NonceRegistry;
use crate::proto::{
    ActionRequest, AdminResponse, ModeratorResponse, ProofResponse, PunishResponse, VouchResponse,
};
use crate::roles::RoleStore;
use crate::store::{InMemoryTrustStore, TrustStore};
use crate::timestamp::UnixTimestamp;

/// Everything that can go wrong serving a request.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed input: missing fields, non-decodable base58/base64.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The signature does not verify against the claimed signer.
    #[error("bad signature")]
    BadSignature,
    /// The nonce is not strictly above the stored value.
    #[error("nonce already consumed")]
    NonceConsumed,
    /// The signer lacks the role the action requires.
    #[error("not allowed")]
    NotAllowed,
    /// The action violates a data-model bound.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// No such route.
    #[error("not found")]
    NotFound,
    /// Storage or clock failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SignatureError> for ApiError {
    fn from(error: SignatureError) -> Self {
        match error {
            SignatureError::Mismatch => ApiError::BadSignature,
            malformed => ApiError::BadRequest(malformed.to_string()),
        }
    }
}

impl From<IdentityParseError> for ApiError {
    fn from(error: IdentityParseError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

/// State guarded by the service lock.
struct HubState {
    nonces: NonceRegistry,
    roles: RoleStore,
    store: InMemoryTrustStore,
}

/// Shared service: signed mutations and unauthenticated queries.
pub struct IdentityService {
    state: RwLock<HubState>,
}

impl Default for IdentityService {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityService {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HubState {
                nonces: NonceRegistry::new(),
                roles: RoleStore::new(),
                store: InMemoryTrustStore::new(),
            }),
        }
    }

    // === Signed actions ===

    /// Any identity may vouch; the edge `signer → user` is upserted.
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn vouch(&self, user: &str, request: &ActionRequest) -> Result<VouchResponse, ApiError> {
        self.run_signed(
            user,
            request,
            ActionKind::Vouch,
            |_, _| Ok(()),
            |state, signer, target| {
                let timestamp = now()?;
                state.store.insert_vouch(signer, target, timestamp);
                let idt = TrustEngine::new(&state.store).idt(target);
                Ok(VouchResponse {
                    from: request.signer.clone(),
                    to: user.to_string(),
                    idt,
                })
            },
        )
    }

    /// A moderator grants `user` a direct balance, replacing any previous
    /// proof. The balance is bounded by [`MAX_IDT_BY_PROOF`].
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn set_proof(&self, user: &str, request: &ActionRequest) -> Result<ProofResponse, ApiError> {
        let balance = require_idt(request)?;
        let proof_id = require_proof_id(request)?;
        let kind = ActionKind::Proof {
            balance,
            proof_id: proof_id.clone(),
        };
        self.run_signed(
            user,
            request,
            kind,
            |state, signer| {
                if !state.roles.is_moderator(signer) {
                    return Err(ApiError::NotAllowed);
                }
                if balance > MAX_IDT_BY_PROOF {
                    return Err(ApiError::InvariantViolation(format!(
                        "proof balance {balance} exceeds {MAX_IDT_BY_PROOF}"
                    )));
                }
                Ok(())
            },
            |state, _, target| {
                let timestamp = now()?;
                state.store.set_proof(target, balance, timestamp, &proof_id);
                Ok(ProofResponse {
                    from: request.signer.clone(),
                    to: user.to_string(),
                    idt: balance,
                    proof_id: proof_id.clone(),
                })
            },
        )
    }

    /// A moderator issues a penalty against `user`, keyed by `proof_id`.
    /// The penalty balance is unbounded; propagation to vouchers is clamped
    /// per vouchee by the engine.
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn punish(&self, user: &str, request: &ActionRequest) -> Result<PunishResponse, ApiError> {
        let balance = require_idt(request)?;
        let proof_id = require_proof_id(request)?;
        let kind = ActionKind::Punish {
            balance,
            proof_id: proof_id.clone(),
        };
        self.run_signed(
            user,
            request,
            kind,
            |state, signer| {
                if state.roles.is_moderator(signer) {
                    Ok(())
                } else {
                    Err(ApiError::NotAllowed)
                }
            },
            |state, signer, target| {
                let timestamp = now()?;
                state
                    .store
                    .insert_penalty(&proof_id, target, signer, balance, timestamp);
                let engine = TrustEngine::new(&state.store);
                Ok(PunishResponse {
                    from: request.signer.clone(),
                    to: user.to_string(),
                    idt: engine.idt(target),
                    penalty: engine.penalty(target),
                })
            },
        )
    }

    /// An admin grants the moderator role.
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn add_moderator(
        &self,
        user: &str,
        request: &ActionRequest,
    ) -> Result<ModeratorResponse, ApiError> {
        self.mutate_role(user, request, ActionKind::AddModerator, |roles, signer, target| {
            roles.add_moderator(signer, target)
        })
        .map(|_| ModeratorResponse {
            from: request.signer.clone(),
            moderator: user.to_string(),
        })
    }

    /// An admin revokes the moderator role.
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn remove_moderator(
        &self,
        user: &str,
        request: &ActionRequest,
    ) -> Result<ModeratorResponse, ApiError> {
        self.mutate_role(user, request, ActionKind::RemoveModerator, |roles, signer, target| {
            roles.remove_moderator(signer, target)
        })
        .map(|_| ModeratorResponse {
            from: request.signer.clone(),
            moderator: user.to_string(),
        })
    }

    /// An admin grants the admin role.
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn add_admin(
        &self,
        user: &str,
        request: &ActionRequest,
    ) -> Result<AdminResponse, ApiError> {
        self.mutate_role(user, request, ActionKind::AddAdmin, |roles, signer, target| {
            roles.add_admin(signer, target)
        })
        .map(|_| AdminResponse {
            from: request.signer.clone(),
            admin: user.to_string(),
        })
    }

    /// An admin revokes the admin role, possibly its own.
    #[instrument(skip_all, err, fields(signer = %request.signer, nonce = request.nonce))]
    pub fn remove_admin(
        &self,
        user: &str,
        request: &ActionRequest,
    ) -> Result<AdminResponse, ApiError> {
        self.mutate_role(user, request, ActionKind::RemoveAdmin, |roles, signer, target| {
            roles.remove_admin(signer, target)
        })
        .map(|_| AdminResponse {
            from: request.signer.clone(),
            admin: user.to_string(),
        })
    }

    // === Queries ===

    pub fn idt(&self, user: &str) -> Result<u64, ApiError> {
        let target: Identity = user.parse()?;
        let state = self.lock_read()?;
        Ok(TrustEngine::new(&state.store).idt(&target))
    }

    pub fn penalty(&self, user: &str) -> Result<u64, ApiError> {
        let target: Identity = user.parse()?;
        let state = self.lock_read()?;
        Ok(TrustEngine::new(&state.store).penalty(&target))
    }

    pub fn is_admin(&self, user: &str) -> Result<bool, ApiError> {
        let target: Identity = user.parse()?;
        Ok(self.lock_read()?.roles.is_admin(&target))
    }

    pub fn is_moderator(&self, user: &str) -> Result<bool, ApiError> {
        let target: Identity = user.parse()?;
        Ok(self.lock_read()?.roles.is_moderator(&target))
    }

    pub fn list_admins(&self) -> Result<Vec<String>, ApiError> {
        let state = self.lock_read()?;
        Ok(state.roles.list_admins().iter().map(Identity::to_base58).collect())
    }

    pub fn list_moderators(&self) -> Result<Vec<String>, ApiError> {
        let state = self.lock_read()?;
        Ok(state.roles.list_moderators().iter().map(Identity::to_base58).collect())
    }

    // === Bootstrap ingestion (startup only, bypasses authorization) ===

    pub fn bootstrap_admin(&self, user: Identity) -> Result<(), ApiError> {
        self.lock_write()?.roles.bootstrap_admin(user);
        Ok(())
    }

    pub fn bootstrap_moderator(&self, user: Identity) -> Result<(), ApiError> {
        self.lock_write()?.roles.bootstrap_moderator(user);
        Ok(())
    }

    /// Writes a genesis proof with the reserved id, bypassing the
    /// [`MAX_IDT_BY_PROOF`] bound.
    pub fn bootstrap_genesis(&self, user: Identity, balance: u64) -> Result<(), ApiError> {
        let timestamp = now()?;
        self.lock_write()?
            .store
            .set_proof(&user, balance, timestamp, GENESIS_PROOF_ID);
        Ok(())
    }

    // === Pipeline ===

    fn run_signed<T>(
        &self,
        user: &str,
        request: &ActionRequest,
        kind: ActionKind,
        authorize: impl FnOnce(&HubState, &Identity) -> Result<(), ApiError>,
        mutate: impl FnOnce(&mut HubState, &Identity, &Identity) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let target: Identity = user.parse()?;
        let signer: Identity = request.signer.parse()?;
        let namespace = kind.nonce_namespace();
        let message = kind.canonical_message(user, request.nonce);

        let mut state = self.lock_write()?;
        if state.nonces.is_consumed(namespace, &signer, request.nonce) {
            return Err(ApiError::NonceConsumed);
        }
        action::verify_signature(&signer, &message, &request.signature)?;
        authorize(&state, &signer)?;
        state.nonces.consume(namespace, &signer, request.nonce);
        mutate(&mut state, &signer, &target)
    }

    fn mutate_role(
        &self,
        user: &str,
        request: &ActionRequest,
        kind: ActionKind,
        apply: impl FnOnce(&mut RoleStore, &Identity, &Identity) -> Result<(), crate::roles::RoleError>,
    ) -> Result<(), ApiError> {
        self.run_signed(
            user,
            request,
            kind,
            |state, signer| {
                if state.roles.is_admin(signer) {
                    Ok(())
                } else {
                    Err(ApiError::NotAllowed)
                }
            },
            |state, signer, target| {
                apply(&mut state.roles, signer, target).map_err(|_| ApiError::NotAllowed)
            },
        )
    }

    fn lock_read(&self) -> Result<RwLockReadGuard<'_, HubState>, ApiError> {
        self.state
            .read()
            .map_err(|_| ApiError::Internal("state lock poisoned".to_string()))
    }

    fn lock_write(&self) -> Result<RwLockWriteGuard<'_, HubState>, ApiError> {
        self.state
            .write()
            .map_err(|_| ApiError::Internal("state lock poisoned".to_string()))
    }
}

fn require_idt(request: &ActionRequest) -> Result<u64, ApiError> {
    request
        .idt
        .ok_or_else(|| ApiError::BadRequest("missing idt field".to_string()))
}

fn require_proof_id(request: &ActionRequest) -> Result<String, ApiError> {
    request
        .proof_id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("missing proof_id field".to_string()))
}

fn now() -> Result<UnixTimestamp, ApiError> {
    UnixTimestamp::try_now().map_err(|e| ApiError::Internal(e.to_string()))
}
