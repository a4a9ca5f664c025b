// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use ethers::types::{Bytes, I256, U256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};
use std::fmt;

use crate::ids::{CHECKPOINT_ID, GOVERNANCE_ID};

/// Table an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Governance,
    TokenHolder,
    Delegate,
    Proposal,
    Vote,
    Checkpoint,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Governance,
        EntityKind::TokenHolder,
        EntityKind::Delegate,
        EntityKind::Proposal,
        EntityKind::Vote,
        EntityKind::Checkpoint,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Governance => "Governance",
            EntityKind::TokenHolder => "TokenHolder",
            EntityKind::Delegate => "Delegate",
            EntityKind::Proposal => "Proposal",
            EntityKind::Vote => "Vote",
            EntityKind::Checkpoint => "Checkpoint",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted, id-addressable record
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Fresh record with default field values
    fn new(id: &str) -> Self;

    fn id(&self) -> &str;
}

/// Human readable amount, the raw integer divided by the token precision.
///
/// Kept as the exact decimal string so that replays compare byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaledAmount(String);

impl ScaledAmount {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn zero() -> Self {
        Self("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScaledAmount {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for ScaledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes a signed 256-bit integer as a plain decimal string.
///
/// `I256::from_str` also accepts hex, so parsing goes through `from_dec_str`.
pub struct DecimalI256;

impl SerializeAs<I256> for DecimalI256 {
    fn serialize_as<S: Serializer>(source: &I256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(source)
    }
}

impl<'de> DeserializeAs<'de, I256> for DecimalI256 {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
        let value = String::deserialize(deserializer)?;
        I256::from_dec_str(&value).map_err(|e| {
            serde::de::Error::custom(format!("invalid decimal integer {:?}: {:?}", value, e))
        })
    }
}

/// Serializes an unsigned 256-bit integer as a plain decimal string, matching
/// [`DecimalI256`]. ethers' own serde form is a hex quantity.
pub struct DecimalU256;

impl SerializeAs<U256> for DecimalU256 {
    fn serialize_as<S: Serializer>(source: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(source)
    }
}

impl<'de> DeserializeAs<'de, U256> for DecimalU256 {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let value = String::deserialize(deserializer)?;
        U256::from_dec_str(&value).map_err(|e| {
            serde::de::Error::custom(format!("invalid decimal integer {:?}: {:?}", value, e))
        })
    }
}

/// Governance-wide running totals
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Governance {
    pub id: String,
    pub proposals_queued: i64,
    pub current_token_holders: i64,
    pub current_delegates: i64,
    #[serde_as(as = "DecimalI256")]
    pub delegated_votes_raw: I256,
    pub delegated_votes: ScaledAmount,
}

impl Entity for Governance {
    const KIND: EntityKind = EntityKind::Governance;

    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            proposals_queued: 0,
            current_token_holders: 0,
            current_delegates: 0,
            delegated_votes_raw: I256::zero(),
            delegated_votes: ScaledAmount::zero(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Default for Governance {
    fn default() -> Self {
        <Self as Entity>::new(GOVERNANCE_ID)
    }
}

/// Token custody record of a single address
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolder {
    pub id: String,
    #[serde_as(as = "DecimalI256")]
    pub token_balance_raw: I256,
    pub token_balance: ScaledAmount,
    /// Lifetime inflow, never decreases
    #[serde_as(as = "DecimalI256")]
    pub total_tokens_held_raw: I256,
    pub total_tokens_held: ScaledAmount,
    pub delegate: Option<String>,
}

impl Entity for TokenHolder {
    const KIND: EntityKind = EntityKind::TokenHolder;

    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            token_balance_raw: I256::zero(),
            token_balance: ScaledAmount::zero(),
            total_tokens_held_raw: I256::zero(),
            total_tokens_held: ScaledAmount::zero(),
            delegate: None,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// An address that receives delegated voting power
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegate {
    pub id: String,
    /// Not floored at zero, see the delegation handler
    pub token_holders_represented_amount: i64,
    #[serde_as(as = "DecimalI256")]
    pub delegated_votes_raw: I256,
    pub delegated_votes: ScaledAmount,
}

impl Entity for Delegate {
    const KIND: EntityKind = EntityKind::Delegate;

    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            token_holders_represented_amount: 0,
            delegated_votes_raw: I256::zero(),
            delegated_votes: ScaledAmount::zero(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Active,
    Queued,
    Executed,
    Cancelled,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "PENDING",
            ProposalStatus::Active => "ACTIVE",
            ProposalStatus::Queued => "QUEUED",
            ProposalStatus::Executed => "EXECUTED",
            ProposalStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub proposer: Option<String>,
    pub targets: Vec<String>,
    #[serde_as(as = "Vec<DecimalU256>")]
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    #[serde_as(as = "DecimalU256")]
    pub start_block: U256,
    #[serde_as(as = "DecimalU256")]
    pub end_block: U256,
    pub description: String,
    pub status: ProposalStatus,
    #[serde(rename = "executionETA")]
    #[serde_as(as = "Option<DecimalU256>")]
    pub execution_eta: Option<U256>,
}

impl Entity for Proposal {
    const KIND: EntityKind = EntityKind::Proposal;

    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            proposer: None,
            targets: vec![],
            values: vec![],
            signatures: vec![],
            calldatas: vec![],
            start_block: U256::zero(),
            end_block: U256::zero(),
            description: String::new(),
            status: ProposalStatus::Pending,
            execution_eta: None,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub proposal: Option<String>,
    pub voter: Option<String>,
    #[serde_as(as = "DecimalI256")]
    pub votes_raw: I256,
    pub votes: ScaledAmount,
    pub support: bool,
}

impl Entity for Vote {
    const KIND: EntityKind = EntityKind::Vote;

    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            proposal: None,
            voter: None,
            votes_raw: I256::zero(),
            votes: ScaledAmount::zero(),
            support: false,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Chain position of the last fully applied event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    pub block_number: u64,
    pub log_index: u64,
}

impl Checkpoint {
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

impl Entity for Checkpoint {
    const KIND: EntityKind = EntityKind::Checkpoint;

    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            block_number: 0,
            log_index: 0,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        <Self as Entity>::new(CHECKPOINT_ID)
    }
}
