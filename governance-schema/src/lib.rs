// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Governance projection schema
//!
//! Denormalized entities projected from governor and token events:
//!
//! ```text
//! Governance (singleton) ◄── aggregate counters
//!      │
//! TokenHolder ──delegate──► Delegate ◄──voter── Vote ──proposal──► Proposal
//!                              ▲                                      │
//!                              └──────────────proposer────────────────┘
//! ```
//!
//! References between entities are plain ids; nothing is ever deleted.

pub mod ids;
pub mod models;

pub use ids::{address_id, proposal_id, vote_id, CHECKPOINT_ID, GOVERNANCE_ID};
pub use models::{
    Checkpoint, Delegate, Entity, EntityKind, Governance, Proposal, ProposalStatus, ScaledAmount,
    TokenHolder, Vote,
};
