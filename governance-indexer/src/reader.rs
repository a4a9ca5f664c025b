// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Newline-delimited JSON event source
//!
//! Two line formats are accepted:
//! - `decoded`: one [`GovernanceLog`] per line
//! - `raw_logs`: one Ethereum RPC log object per line (as returned by
//!   `eth_getLogs`), decoded on the fly
//!
//! Blank lines are ignored. The file must already be in chain order.

use crate::decode::{DecodeError, LogDecoder};
use crate::events::GovernanceLog;
use anyhow::Context;
use ethers::types::Log;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    #[default]
    Decoded,
    RawLogs,
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub struct EventLogReader {
    format: InputFormat,
    decoder: LogDecoder,
}

impl EventLogReader {
    pub fn new(format: InputFormat, decoder: LogDecoder) -> Self {
        Self { format, decoder }
    }

    /// Parse one line. `Ok(None)` for blank lines and logs that are not
    /// governance events.
    pub fn parse_line(&self, line: &str) -> Result<Option<GovernanceLog>, ReaderError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        match self.format {
            InputFormat::Decoded => Ok(Some(serde_json::from_str(line)?)),
            InputFormat::RawLogs => {
                let log: Log = serde_json::from_str(line)?;
                Ok(self.decoder.decode(&log)?)
            }
        }
    }

    pub async fn read_all(&self, path: &Path) -> anyhow::Result<Vec<GovernanceLog>> {
        let mut lines = open_lines(path).await?;
        let mut line_no = 0usize;
        let mut events = Vec::new();
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if let Some(log) = self
                .parse_line(&line)
                .with_context(|| format!("{}:{}", path.display(), line_no))?
            {
                events.push(log);
            }
        }
        Ok(events)
    }

    /// Send every event in the file to `event_tx`. Returns the number sent.
    ///
    /// Stops early without error if the receiving side has gone away.
    pub async fn stream(
        &self,
        path: &Path,
        event_tx: mpsc::Sender<GovernanceLog>,
    ) -> anyhow::Result<usize> {
        let mut lines = open_lines(path).await?;
        let mut line_no = 0usize;
        let mut sent = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let Some(log) = self
                .parse_line(&line)
                .with_context(|| format!("{}:{}", path.display(), line_no))?
            else {
                continue;
            };
            if event_tx.send(log).await.is_err() {
                warn!(
                    "[Reader] Event channel closed at line {}, stopping",
                    line_no
                );
                return Ok(sent);
            }
            sent += 1;
        }
        info!("[Reader] Sent {} events from {}", sent, path.display());
        Ok(sent)
    }
}

async fn open_lines(path: &Path) -> anyhow::Result<tokio::io::Lines<BufReader<File>>> {
    let file = File::open(path)
        .await
        .with_context(|| format!("Failed to open event log {}", path.display()))?;
    Ok(BufReader::new(file).lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{GovernanceEvent, ProposalCanceled, ProposalExecuted, Transfer};
    use ethers::abi::{encode, Token};
    use ethers::contract::EthEvent;
    use ethers::types::{Address, Bytes, H256, U256, U64};
    use tempfile::TempDir;

    fn canceled(block: u64) -> GovernanceLog {
        GovernanceLog {
            block_number: block,
            log_index: 0,
            tx_hash: H256::repeat_byte(0x01),
            event: GovernanceEvent::ProposalCanceled(ProposalCanceled { id: U256::one() }),
        }
    }

    #[tokio::test]
    async fn test_read_decoded_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.ndjson");
        let contents = format!(
            "{}\n\n{}\n",
            serde_json::to_string(&canceled(1)).unwrap(),
            serde_json::to_string(&canceled(2)).unwrap()
        );
        std::fs::write(&path, contents).unwrap();

        let reader = EventLogReader::new(InputFormat::Decoded, LogDecoder::default());
        let events = reader.read_all(&path).await.unwrap();
        assert_eq!(events, vec![canceled(1), canceled(2)]);
    }

    #[tokio::test]
    async fn test_bad_line_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.ndjson");
        let contents = format!(
            "{}\n{{not json\n",
            serde_json::to_string(&canceled(1)).unwrap()
        );
        std::fs::write(&path, contents).unwrap();

        let reader = EventLogReader::new(InputFormat::Decoded, LogDecoder::default());
        let err = reader.read_all(&path).await.unwrap_err();
        assert!(format!("{:#}", err).contains("events.ndjson:2"));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let reader = EventLogReader::new(InputFormat::Decoded, LogDecoder::default());
        assert!(reader.read_all(&dir.path().join("nope")).await.is_err());
    }

    #[test]
    fn test_parse_raw_log_line() {
        let from = Address::repeat_byte(0x01);
        let to = Address::repeat_byte(0x02);
        let log = Log {
            address: Address::repeat_byte(0xee),
            topics: vec![Transfer::signature(), H256::from(from), H256::from(to)],
            data: Bytes::from(encode(&[Token::Uint(U256::from(9u64))])),
            block_number: Some(U64::from(5u64)),
            log_index: Some(U256::from(1u64)),
            transaction_hash: Some(H256::repeat_byte(0x03)),
            ..Default::default()
        };
        let line = serde_json::to_string(&log).unwrap();

        let reader = EventLogReader::new(InputFormat::RawLogs, LogDecoder::default());
        let parsed = reader.parse_line(&line).unwrap().unwrap();
        assert_eq!(parsed.position(), (5, 1));
        assert_eq!(
            parsed.event,
            GovernanceEvent::Transfer(Transfer {
                from,
                to,
                value: U256::from(9u64),
            })
        );
    }

    #[test]
    fn test_parse_raw_unrelated_log() {
        let log = Log {
            topics: vec![H256::repeat_byte(0x77)],
            block_number: Some(U64::from(5u64)),
            log_index: Some(U256::zero()),
            transaction_hash: Some(H256::zero()),
            ..Default::default()
        };
        let line = serde_json::to_string(&log).unwrap();
        let reader = EventLogReader::new(InputFormat::RawLogs, LogDecoder::default());
        assert!(reader.parse_line(&line).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_stops_when_receiver_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.ndjson");
        let executed = GovernanceLog {
            event: GovernanceEvent::ProposalExecuted(ProposalExecuted { id: U256::one() }),
            ..canceled(3)
        };
        let contents = format!(
            "{}\n{}\n",
            serde_json::to_string(&canceled(1)).unwrap(),
            serde_json::to_string(&executed).unwrap()
        );
        std::fs::write(&path, contents).unwrap();

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let reader = EventLogReader::new(InputFormat::Decoded, LogDecoder::default());
        assert_eq!(reader.stream(&path, tx).await.unwrap(), 0);
    }
}
