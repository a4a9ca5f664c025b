// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Raw log decoding
//!
//! Matches `topics[0]` against the known event signatures and decodes the
//! payload with the ABI derived on the event structs. Logs from unrelated
//! contracts or with unknown signatures are ignored, not rejected.

use crate::events::{
    DelegateChanged, DelegateVotesChanged, EventSource, GovernanceEvent, GovernanceLog,
    ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued, Transfer, VoteCast,
};
use ethers::abi::RawLog;
use ethers::contract::EthEvent;
use ethers::types::{Address, Log};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Log is missing {0}")]
    MissingField(&'static str),

    #[error("Failed to decode {event} log: {reason}")]
    Abi { event: String, reason: String },
}

/// Decode a log from any address
pub fn decode_log(log: &Log) -> Result<Option<GovernanceLog>, DecodeError> {
    LogDecoder::default().decode(log)
}

/// Decoder restricted to the configured governor and token contracts
///
/// An unset address accepts logs from any contract for that source.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDecoder {
    governor: Option<Address>,
    token: Option<Address>,
}

impl LogDecoder {
    pub fn new(governor: Option<Address>, token: Option<Address>) -> Self {
        Self { governor, token }
    }

    pub fn decode(&self, log: &Log) -> Result<Option<GovernanceLog>, DecodeError> {
        if log.removed == Some(true) {
            debug!("Ignoring removed log {:?}", log.transaction_hash);
            return Ok(None);
        }
        let Some(topic0) = log.topics.first() else {
            return Ok(None);
        };

        let raw = RawLog::from(log.clone());
        let event = if *topic0 == ProposalCreated::signature() {
            GovernanceEvent::ProposalCreated(decode_event(&raw)?)
        } else if *topic0 == ProposalCanceled::signature() {
            GovernanceEvent::ProposalCanceled(decode_event(&raw)?)
        } else if *topic0 == ProposalQueued::signature() {
            GovernanceEvent::ProposalQueued(decode_event(&raw)?)
        } else if *topic0 == ProposalExecuted::signature() {
            GovernanceEvent::ProposalExecuted(decode_event(&raw)?)
        } else if *topic0 == VoteCast::signature() {
            GovernanceEvent::VoteCast(decode_event(&raw)?)
        } else if *topic0 == DelegateChanged::signature() {
            GovernanceEvent::DelegateChanged(decode_event(&raw)?)
        } else if *topic0 == DelegateVotesChanged::signature() {
            GovernanceEvent::DelegateVotesChanged(decode_event(&raw)?)
        } else if *topic0 == Transfer::signature() {
            GovernanceEvent::Transfer(decode_event(&raw)?)
        } else {
            return Ok(None);
        };

        let expected = match event.source() {
            EventSource::Governor => self.governor,
            EventSource::Token => self.token,
        };
        if let Some(expected) = expected {
            if log.address != expected {
                debug!(
                    "Ignoring {} from unexpected contract {:?}",
                    event.name(),
                    log.address
                );
                return Ok(None);
            }
        }

        let block_number = log
            .block_number
            .ok_or(DecodeError::MissingField("blockNumber"))?
            .as_u64();
        let log_index = log
            .log_index
            .ok_or(DecodeError::MissingField("logIndex"))?
            .low_u64();
        let tx_hash = log
            .transaction_hash
            .ok_or(DecodeError::MissingField("transactionHash"))?;

        Ok(Some(GovernanceLog {
            block_number,
            log_index,
            tx_hash,
            event,
        }))
    }
}

fn decode_event<E: EthEvent>(raw: &RawLog) -> Result<E, DecodeError> {
    E::decode_log(raw).map_err(|e| DecodeError::Abi {
        event: E::name().into_owned(),
        reason: e.to_string(),
    })
}
