// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use ethers::types::{Address, U256};

/// Id of the singleton governance aggregate
pub const GOVERNANCE_ID: &str = "GOVERNANCE";

/// Id of the indexer progress record
pub const CHECKPOINT_ID: &str = "indexer_watermark";

/// Entity id for an address: full lowercase hex with `0x` prefix.
///
/// `Display` for `Address` abbreviates the middle, so `Debug` formatting is used.
pub fn address_id(address: &Address) -> String {
    format!("{:?}", address)
}

/// Entity id for a proposal: the decimal form of the on-chain proposal id
pub fn proposal_id(id: &U256) -> String {
    id.to_string()
}

/// Entity id for a vote: `<voter>-<proposalId>`
pub fn vote_id(voter: &Address, proposal: &U256) -> String {
    format!("{}-{}", address_id(voter), proposal_id(proposal))
}
