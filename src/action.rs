//! Signed-action protocol: canonical messages and Ed25519 verification.
//!
//! Every mutating request carries a base58 signer public key, a base64
//! Ed25519 signature, and a nonce. The signature covers a canonical message
//! built by joining the action's fields with `/`:
//!
//! | action | message |
//! |---|---|
//! | vouch | `vouch/<user>/<nonce>` |
//! | proof | `proof/<user>/<nonce>/<balance>/<proof_id>` |
//! | punish | `punish/<user>/<nonce>/<balance>/<proof_id>` |
//! | moderators add/remove | `moderators/<user>/<nonce>` |
//! | admins add/remove | `admins/<user>/<nonce>` |
//!
//! `<user>` is the base58 target identity exactly as it appears in the URL
//! path, `<nonce>` and `<balance>` are decimal ASCII, `<proof_id>` is raw
//! UTF-8. Any field change invalidates the signature.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use ed25519_dalek::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, Signature, VerifyingKey};

use crate::identity::Identity;
use crate::nonce::NonceNamespace;

/// A mutating action, carrying its action-specific fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Vouch,
    Proof { balance: u64, proof_id: String },
    Punish { balance: u64, proof_id: String },
    AddModerator,
    RemoveModerator,
    AddAdmin,
    RemoveAdmin,
}

impl ActionKind {
    /// The nonce namespace this action consumes from.
    ///
    /// Punish consumes from the `proof` namespace: a moderator's proof and
    /// punish nonces form one strictly increasing sequence.
    pub fn nonce_namespace(&self) -> NonceNamespace {
        match self {
            ActionKind::Vouch => NonceNamespace::Vouch,
            ActionKind::Proof { .. } | ActionKind::Punish { .. } => NonceNamespace::Proof,
            ActionKind::AddModerator | ActionKind::RemoveModerator => NonceNamespace::Moderators,
            ActionKind::AddAdmin | ActionKind::RemoveAdmin => NonceNamespace::Admins,
        }
    }

    /// The canonical message the signature must cover. `user` is the base58
    /// target identity as spelled in the URL path.
    pub fn canonical_message(&self, user: &str, nonce: u64) -> String {
        match self {
            ActionKind::Vouch => format!("vouch/{user}/{nonce}"),
            ActionKind::Proof { balance, proof_id } => {
                format!("proof/{user}/{nonce}/{balance}/{proof_id}")
            }
            ActionKind::Punish { balance, proof_id } => {
                format!("punish/{user}/{nonce}/{balance}/{proof_id}")
            }
            ActionKind::AddModerator | ActionKind::RemoveModerator => {
                format!("moderators/{user}/{nonce}")
            }
            ActionKind::AddAdmin | ActionKind::RemoveAdmin => {
                format!("admins/{user}/{nonce}")
            }
        }
    }
}

/// Failures while decoding or checking an action signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The signer identity does not decode to a 32-byte Ed25519 public key.
    #[error("malformed signer public key: {0}")]
    MalformedSigner(String),
    /// The signature field is not 64 bytes of valid base64.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    /// The signature does not verify against the signer and message.
    #[error("signature mismatch")]
    Mismatch,
}

/// Interprets a signer identity as an Ed25519 verifying key.
pub fn decode_signer(signer: &Identity) -> Result<VerifyingKey, SignatureError> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = signer
        .as_bytes()
        .try_into()
        .map_err(|_| SignatureError::MalformedSigner(format!("{} bytes", signer.as_bytes().len())))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| SignatureError::MalformedSigner(e.to_string()))
}

/// Decodes a base64 signature field into an Ed25519 signature.
pub fn decode_signature(signature: &str) -> Result<Signature, SignatureError> {
    let raw = b64
        .decode(signature)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
    let bytes: [u8; SIGNATURE_LENGTH] = raw
        .as_slice()
        .try_into()
        .map_err(|_| SignatureError::MalformedSignature(format!("{} bytes", raw.len())))?;
    Ok(Signature::from_bytes(&bytes))
}

/// Checks `signature` (base64) over `message` against `signer`'s public key.
pub fn verify_signature(
    signer: &Identity,
    message: &str,
    signature: &str,
) -> Result<(), SignatureError> {
    let key = decode_signer(signer)?;
    let signature = decode_signature(signature)?;
    key.verify_strict(message.as_bytes(), &signature)
        .map_err(|_| SignatureError::Mismatch)
}
