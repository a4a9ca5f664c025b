// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed governor and token events
//!
//! Payload structs carry the Solidity event signature so that raw logs can be
//! decoded against them, and serde derives so that already-decoded events can
//! be replayed from NDJSON.

use ethers::contract::EthEvent;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(
    name = "ProposalCreated",
    abi = "ProposalCreated(uint256,address,address[],uint256[],string[],bytes[],uint256,uint256,string)"
)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCreated {
    pub id: U256,
    pub proposer: Address,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    pub start_block: U256,
    pub end_block: U256,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(name = "ProposalCanceled", abi = "ProposalCanceled(uint256)")]
pub struct ProposalCanceled {
    pub id: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(name = "ProposalQueued", abi = "ProposalQueued(uint256,uint256)")]
pub struct ProposalQueued {
    pub id: U256,
    pub eta: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(name = "ProposalExecuted", abi = "ProposalExecuted(uint256)")]
pub struct ProposalExecuted {
    pub id: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(name = "VoteCast", abi = "VoteCast(address,uint256,bool,uint256)")]
#[serde(rename_all = "camelCase")]
pub struct VoteCast {
    pub voter: Address,
    pub proposal_id: U256,
    pub support: bool,
    pub votes: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(
    name = "DelegateChanged",
    abi = "DelegateChanged(address,address,address)"
)]
#[serde(rename_all = "camelCase")]
pub struct DelegateChanged {
    #[ethevent(indexed)]
    pub delegator: Address,
    #[ethevent(indexed)]
    pub from_delegate: Address,
    #[ethevent(indexed)]
    pub to_delegate: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(
    name = "DelegateVotesChanged",
    abi = "DelegateVotesChanged(address,uint256,uint256)"
)]
#[serde(rename_all = "camelCase")]
pub struct DelegateVotesChanged {
    #[ethevent(indexed)]
    pub delegate: Address,
    pub previous_balance: U256,
    pub new_balance: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent, Serialize, Deserialize)]
#[ethevent(name = "Transfer", abi = "Transfer(address,address,uint256)")]
pub struct Transfer {
    #[ethevent(indexed)]
    pub from: Address,
    #[ethevent(indexed)]
    pub to: Address,
    pub value: U256,
}

/// Contract that emits an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSource {
    Governor,
    Token,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum GovernanceEvent {
    ProposalCreated(ProposalCreated),
    ProposalCanceled(ProposalCanceled),
    ProposalQueued(ProposalQueued),
    ProposalExecuted(ProposalExecuted),
    VoteCast(VoteCast),
    DelegateChanged(DelegateChanged),
    DelegateVotesChanged(DelegateVotesChanged),
    Transfer(Transfer),
}

impl GovernanceEvent {
    /// Event name, used as a metric label
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::ProposalCreated(_) => "ProposalCreated",
            GovernanceEvent::ProposalCanceled(_) => "ProposalCanceled",
            GovernanceEvent::ProposalQueued(_) => "ProposalQueued",
            GovernanceEvent::ProposalExecuted(_) => "ProposalExecuted",
            GovernanceEvent::VoteCast(_) => "VoteCast",
            GovernanceEvent::DelegateChanged(_) => "DelegateChanged",
            GovernanceEvent::DelegateVotesChanged(_) => "DelegateVotesChanged",
            GovernanceEvent::Transfer(_) => "Transfer",
        }
    }

    pub fn source(&self) -> EventSource {
        match self {
            GovernanceEvent::ProposalCreated(_)
            | GovernanceEvent::ProposalCanceled(_)
            | GovernanceEvent::ProposalQueued(_)
            | GovernanceEvent::ProposalExecuted(_)
            | GovernanceEvent::VoteCast(_) => EventSource::Governor,
            GovernanceEvent::DelegateChanged(_)
            | GovernanceEvent::DelegateVotesChanged(_)
            | GovernanceEvent::Transfer(_) => EventSource::Token,
        }
    }
}

/// Chain metadata attached to every handled event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: H256,
}

/// A decoded event together with its chain position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceLog {
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: H256,
    pub event: GovernanceEvent,
}

impl GovernanceLog {
    /// Total order of events on chain
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    pub fn context(&self) -> EventContext {
        EventContext {
            block_number: self.block_number,
            log_index: self.log_index,
            tx_hash: self.tx_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_signatures() {
        assert_eq!(
            ProposalCreated::abi_signature(),
            "ProposalCreated(uint256,address,address[],uint256[],string[],bytes[],uint256,uint256,string)"
        );
        assert_eq!(
            VoteCast::abi_signature(),
            "VoteCast(address,uint256,bool,uint256)"
        );
        assert_eq!(
            Transfer::signature(),
            H256::from(ethers::utils::keccak256("Transfer(address,address,uint256)"))
        );
        assert_eq!(
            DelegateVotesChanged::signature(),
            H256::from(ethers::utils::keccak256(
                "DelegateVotesChanged(address,uint256,uint256)"
            ))
        );
    }

    #[test]
    fn test_log_json_shape() {
        let log = GovernanceLog {
            block_number: 12,
            log_index: 3,
            tx_hash: H256::repeat_byte(0xab),
            event: GovernanceEvent::ProposalQueued(ProposalQueued {
                id: U256::from(1u64),
                eta: U256::from(1_700_000_000u64),
            }),
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["blockNumber"], 12);
        assert_eq!(json["logIndex"], 3);
        assert_eq!(json["event"]["type"], "ProposalQueued");
        assert!(json["event"]["params"]["eta"].is_string());

        let parsed: GovernanceLog = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn test_event_source() {
        let transfer = GovernanceEvent::Transfer(Transfer {
            from: Address::zero(),
            to: Address::repeat_byte(1),
            value: U256::one(),
        });
        assert_eq!(transfer.source(), EventSource::Token);
        assert_eq!(transfer.name(), "Transfer");

        let executed = GovernanceEvent::ProposalExecuted(ProposalExecuted { id: U256::one() });
        assert_eq!(executed.source(), EventSource::Governor);
    }
}
