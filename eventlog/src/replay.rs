/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * CC Evidence SDK is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Measurement-register replay.
//!
//! Recomputes expected register values from a parsed event log with the
//! extension rule `register = H(register || event digest)`, starting from a
//! zero-filled value of the digest size. Each register bank succeeds or
//! fails on its own, so one malformed bank never discards the rest of the
//! replay.

use evidence_api::crypto::message_digest;
use evidence_api::{TcgAlgorithmId, TcgEventLogEntry, TcgEventType};
use log::info;
use openssl::hash::Hasher;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure of a single register bank during replay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Unsupported digest algorithm {0}")]
    UnsupportedAlgorithm(TcgAlgorithmId),

    #[error("Digest length {actual} does not match {expected} for {algo_id}")]
    DigestLengthMismatch {
        algo_id: TcgAlgorithmId,
        expected: usize,
        actual: usize,
    },

    #[error("Hash computation failed: {0}")]
    HashFailure(String),
}

/// Replayed value of one register bank, or why that bank failed.
pub type BankReplay = Result<Vec<u8>, ReplayError>;

/// Replay output: register index to per-algorithm bank results.
#[derive(Debug, Default)]
pub struct EventLogReplay {
    registers: BTreeMap<u32, BTreeMap<TcgAlgorithmId, BankReplay>>,
}

impl EventLogReplay {
    /// All replayed registers, ordered by index.
    pub fn registers(&self) -> &BTreeMap<u32, BTreeMap<TcgAlgorithmId, BankReplay>> {
        &self.registers
    }

    /// One register bank, when the log extended it.
    pub fn bank(&self, register_index: u32, algo_id: TcgAlgorithmId) -> Option<&BankReplay> {
        self.registers
            .get(&register_index)
            .and_then(|banks| banks.get(&algo_id))
    }

    /// Dump every bank through the log facade.
    pub fn dump(&self) {
        for (register_index, banks) in &self.registers {
            for (algo_id, bank) in banks {
                match bank {
                    Ok(value) => {
                        info!("register {} [{}] = {}", register_index, algo_id, hex::encode(value))
                    }
                    Err(e) => info!("register {} [{}] failed: {}", register_index, algo_id, e),
                }
            }
        }
    }
}

/// Replay a parsed event log into expected register values.
///
/// `EV_NO_ACTION` events (the Specification ID header, startup locality
/// markers) never extend a register and are skipped. A bank that fails —
/// an algorithm without a digest implementation, a digest of the wrong
/// length — stays failed; later events cannot resurrect it.
pub fn replay_event_log(entries: &[TcgEventLogEntry]) -> EventLogReplay {
    let mut replay = EventLogReplay::default();

    for entry in entries {
        if entry.event_type == TcgEventType::EV_NO_ACTION {
            continue;
        }

        let banks = replay.registers.entry(entry.register_index).or_default();
        for digest in &entry.digests {
            let expected = digest.algo_id.digest_size() as usize;
            let bank = banks.entry(digest.algo_id).or_insert_with(|| {
                if expected == 0 {
                    Err(ReplayError::UnsupportedAlgorithm(digest.algo_id))
                } else {
                    Ok(vec![0u8; expected])
                }
            });

            let current = match bank {
                Ok(value) => value,
                Err(_) => continue,
            };

            if digest.hash.len() != expected {
                *bank = Err(ReplayError::DigestLengthMismatch {
                    algo_id: digest.algo_id,
                    expected,
                    actual: digest.hash.len(),
                });
                continue;
            }

            match extend(digest.algo_id, current, &digest.hash) {
                Ok(next) => *current = next,
                Err(e) => *bank = Err(e),
            }
        }
    }

    replay
}

fn extend(
    algo_id: TcgAlgorithmId,
    current: &[u8],
    digest: &[u8],
) -> Result<Vec<u8>, ReplayError> {
    let message_digest = message_digest(algo_id)
        .map_err(|_| ReplayError::UnsupportedAlgorithm(algo_id))?;

    let mut hasher = Hasher::new(message_digest)
        .map_err(|e| ReplayError::HashFailure(format!("Failed to create hasher: {}", e)))?;
    hasher
        .update(current)
        .map_err(|e| ReplayError::HashFailure(format!("Failed to hash register value: {}", e)))?;
    hasher
        .update(digest)
        .map_err(|e| ReplayError::HashFailure(format!("Failed to hash event digest: {}", e)))?;

    let value = hasher
        .finish()
        .map_err(|e| ReplayError::HashFailure(format!("Failed to finish hasher: {}", e)))?;
    Ok(value.to_vec())
}
