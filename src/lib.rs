//! Identity reputation server core.
//!
//! This crate maintains a *network of trust*: a directed graph of signed
//! vouches between Ed25519 identities, from which every identity derives a
//! scalar IDT (identity-trust) balance. Balances combine three signals:
//!
//! - proof-backed balances granted by moderators,
//! - recursive propagation of trust along incoming vouch edges (dampened per
//!   level, top five vouchers only),
//! - penalties issued by moderators, propagated dampened and clamped to the
//!   punished user's vouchers.
//!
//! Clients submit signed actions (vouch, proof, punish, role management)
//! over a JSON/HTTP surface; every action covers a canonical message with an
//! Ed25519 signature and consumes a strictly increasing per-signer nonce.
//!
//! # Modules
//!
//! - [`identity`] — opaque identities, base58 at the wire.
//! - [`action`] — canonical message framing and signature verification.
//! - [`nonce`] — per-namespace replay prevention.
//! - [`roles`] — admin and moderator sets with guarded mutations.
//! - [`store`] — the trust-graph repository seam and its in-memory backing.
//! - [`engine`] — the cycle-safe recursive IDT and penalty evaluator.
//! - [`service`] — the verify → authorize → mutate → recompute pipeline.
//! - [`handlers`] — the axum routes and error mapping.
//! - [`bootstrap`] — startup ingestion of admins/moderators/genesis files.
//! - [`config`] — file/env configuration.
//! - [`proto`] — wire request/response types.
//! - [`telemetry`], [`timestamp`] — ambient plumbing.

pub mod action;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod identity;
pub mod nonce;
pub mod proto;
pub mod roles;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod timestamp;
