//! Wire types for the JSON surface.
//!
//! Every mutating POST carries an [`ActionRequest`]; the `idt` and `proof_id`
//! fields are only present for proof and punish actions. Responses are one
//! struct per route.

use serde::{Deserialize, Serialize};

/// Body of every mutating POST request.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    /// Base64 Ed25519 signature over the action's canonical message.
    pub signature: String,
    /// Strictly increasing per-signer, per-namespace nonce.
    pub nonce: u64,
    /// Base58 Ed25519 public key of the signer.
    pub signer: String,
    /// Proof/punish balance.
    #[serde(default)]
    pub idt: Option<u64>,
    /// Opaque, externally validated proof identifier.
    #[serde(default)]
    pub proof_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VouchResponse {
    pub from: String,
    pub to: String,
    pub idt: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofResponse {
    pub from: String,
    pub to: String,
    pub idt: u64,
    pub proof_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PunishResponse {
    pub from: String,
    pub to: String,
    pub idt: u64,
    pub penalty: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdtResponse {
    pub idt: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeratorResponse {
    pub from: String,
    pub moderator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminResponse {
    pub from: String,
    pub admin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsModeratorResponse {
    pub is_moderator: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_request_accepts_the_minimal_shape() {
        let request: ActionRequest = serde_json::from_value(json!({
            "signature": "c2ln",
            "nonce": 3,
            "signer": "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp"
        }))
        .unwrap();
        assert_eq!(request.nonce, 3);
        assert!(request.idt.is_none());
        assert!(request.proof_id.is_none());
    }

    #[test]
    fn action_request_carries_proof_fields() {
        let request: ActionRequest = serde_json::from_value(json!({
            "signature": "c2ln",
            "nonce": 3,
            "signer": "abc",
            "idt": 50,
            "proof_id": "id1"
        }))
        .unwrap();
        assert_eq!(request.idt, Some(50));
        assert_eq!(request.proof_id.as_deref(), Some("id1"));
    }

    #[test]
    fn action_request_rejects_a_non_integer_nonce() {
        let result: Result<ActionRequest, _> = serde_json::from_value(json!({
            "signature": "c2ln",
            "nonce": "three",
            "signer": "abc"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn responses_serialize_with_their_wire_names() {
        let punish = PunishResponse {
            from: "m".into(),
            to: "u".into(),
            idt: 0,
            penalty: 10,
        };
        assert_eq!(
            serde_json::to_value(&punish).unwrap(),
            json!({"from": "m", "to": "u", "idt": 0, "penalty": 10})
        );
        let membership = IsModeratorResponse { is_moderator: true };
        assert_eq!(
            serde_json::to_value(&membership).unwrap(),
            json!({"is_moderator": true})
        );
    }
}
