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

use crate::config::TpmAttesterConfig;
use crate::quote::{encode_report, split_report, TpmsAttest, TpmtSignature};
use evidence_api::hexdump;
use evidence_api::{
    CcReport, CcType, EvidenceApi, EvidenceError, TcgAlgorithm, TcgAlgorithmId, TcgDigest,
    TcgEventLogEntry,
};
use log::{debug, info};
use serde_json::Value;
use std::str::FromStr;
use tcg_eventlog::{EventLog, EventLogFormat};
use tss_esapi::{
    constants::CapabilityType,
    handles::{KeyHandle, PersistentTpmHandle, TpmHandle},
    interface_types::algorithm::HashingAlgorithm,
    structures::{
        CapabilityData, Data, HashScheme, PcrSelectionList, PcrSelectionListBuilder, PcrSlot,
        SignatureScheme,
    },
    tcti_ldr::TctiNameConf,
    traits::Marshall,
    Context,
};

/// TPM2B_DATA limit for quote qualifying data.
const MAX_QUOTE_NONCE_SIZE: usize = 32;

const TPM_PCR_COUNT: u32 = 24;

const MAX_EVENT_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Evidence collector for a TPM 2.0 platform.
pub struct TpmAttester {
    config: TpmAttesterConfig,
}

impl TpmAttester {
    /// Build a collector over a validated configuration.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for an invalid configuration.
    pub fn new(config: TpmAttesterConfig) -> Result<Self, EvidenceError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn hash_alg_from_str(algo: &str) -> Result<HashingAlgorithm, EvidenceError> {
        match algo {
            "sha1" => Ok(HashingAlgorithm::Sha1),
            "sha256" => Ok(HashingAlgorithm::Sha256),
            "sha384" => Ok(HashingAlgorithm::Sha384),
            "sha512" => Ok(HashingAlgorithm::Sha512),
            "sm3" => Ok(HashingAlgorithm::Sm3_256),
            _ => Err(EvidenceError::InputError(format!(
                "Unknown hash algorithm: {}",
                algo
            ))),
        }
    }

    fn hash_alg_from_id(algo_id: TcgAlgorithmId) -> Result<HashingAlgorithm, EvidenceError> {
        match algo_id {
            TcgAlgorithmId::Sha1 => Ok(HashingAlgorithm::Sha1),
            TcgAlgorithmId::Sha256 => Ok(HashingAlgorithm::Sha256),
            TcgAlgorithmId::Sha384 => Ok(HashingAlgorithm::Sha384),
            TcgAlgorithmId::Sha512 => Ok(HashingAlgorithm::Sha512),
            TcgAlgorithmId::Sm3 => Ok(HashingAlgorithm::Sm3_256),
            TcgAlgorithmId::Unknown => Err(EvidenceError::UnsupportedAlgorithm(algo_id)),
        }
    }

    fn pcr_slots_from_indices(indices: &[u32]) -> Vec<PcrSlot> {
        indices
            .iter()
            .filter_map(|&index| match index {
                0 => Some(PcrSlot::Slot0),
                1 => Some(PcrSlot::Slot1),
                2 => Some(PcrSlot::Slot2),
                3 => Some(PcrSlot::Slot3),
                4 => Some(PcrSlot::Slot4),
                5 => Some(PcrSlot::Slot5),
                6 => Some(PcrSlot::Slot6),
                7 => Some(PcrSlot::Slot7),
                8 => Some(PcrSlot::Slot8),
                9 => Some(PcrSlot::Slot9),
                10 => Some(PcrSlot::Slot10),
                11 => Some(PcrSlot::Slot11),
                12 => Some(PcrSlot::Slot12),
                13 => Some(PcrSlot::Slot13),
                14 => Some(PcrSlot::Slot14),
                15 => Some(PcrSlot::Slot15),
                16 => Some(PcrSlot::Slot16),
                17 => Some(PcrSlot::Slot17),
                18 => Some(PcrSlot::Slot18),
                19 => Some(PcrSlot::Slot19),
                20 => Some(PcrSlot::Slot20),
                21 => Some(PcrSlot::Slot21),
                22 => Some(PcrSlot::Slot22),
                23 => Some(PcrSlot::Slot23),
                _ => None,
            })
            .collect()
    }

    fn context_new(&self) -> Result<Context, EvidenceError> {
        let tcti = TctiNameConf::from_str(&self.config.tcti)
            .map_err(|e| EvidenceError::InputError(format!("Invalid TCTI configuration: {}", e)))?;
        Context::new(tcti)
            .map_err(|e| EvidenceError::InternalError(format!("Failed to create TPM context: {}", e)))
    }

    fn ak_handle(&self, context: &mut Context) -> Result<KeyHandle, EvidenceError> {
        let persistent_handle = PersistentTpmHandle::new(self.config.ak_handle)
            .map_err(|e| EvidenceError::InputError(format!("Invalid AK handle value: {}", e)))?;
        let handle = context
            .tr_from_tpm_public(TpmHandle::Persistent(persistent_handle))
            .map_err(|e| {
                EvidenceError::InternalError(format!("AK key does not exist in TPM: {}", e))
            })?;
        Ok(handle.into())
    }

    /// Check that PCRs exist for the requested hash algorithm before
    /// asking for a quote over them.
    fn check_pcr_availability(
        context: &mut Context,
        pcr_hash_alg: HashingAlgorithm,
    ) -> Result<(), EvidenceError> {
        let (capability_data, _more_data) = context
            .get_capability(CapabilityType::AssignedPcr, 0, 20)
            .map_err(|e| {
                EvidenceError::InternalError(format!("Failed to get TPM capabilities: {}", e))
            })?;

        match capability_data {
            CapabilityData::AssignedPcr(pcrs_data) => {
                let selection = pcrs_data
                    .get_selections()
                    .iter()
                    .find(|selection| selection.hashing_algorithm() == pcr_hash_alg)
                    .ok_or_else(|| {
                        EvidenceError::InternalError(format!(
                            "Hash algorithm {:?} is not supported by this TPM",
                            pcr_hash_alg
                        ))
                    })?;
                if selection.selected().is_empty() {
                    return Err(EvidenceError::InternalError(format!(
                        "No PCRs assigned for hash algorithm {:?}",
                        pcr_hash_alg
                    )));
                }
            }
            _ => {
                return Err(EvidenceError::InternalError(
                    "Received unexpected capability data from TPM".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn signature_scheme(&self) -> Result<SignatureScheme, EvidenceError> {
        let Some(scheme) = &self.config.quote_signature_scheme else {
            // Null lets the TPM fall back to the AK's own scheme.
            return Ok(SignatureScheme::Null);
        };

        let hash_scheme = HashScheme::new(Self::hash_alg_from_str(&scheme.hash_alg)?);
        match scheme.signature_alg.as_str() {
            "rsassa" => Ok(SignatureScheme::RsaSsa { hash_scheme }),
            "rsapss" => Ok(SignatureScheme::RsaPss { hash_scheme }),
            "ecdsa" => Ok(SignatureScheme::EcDsa { hash_scheme }),
            "sm2" => Ok(SignatureScheme::Sm2 { hash_scheme }),
            other => Err(EvidenceError::InputError(format!(
                "Unsupported signature algorithm: {}",
                other
            ))),
        }
    }

    fn quote_selection_list(&self) -> Result<PcrSelectionList, EvidenceError> {
        let pcr_hash_alg = Self::hash_alg_from_str(&self.config.pcr_selection.hash_alg)?;
        let pcr_slots = Self::pcr_slots_from_indices(&self.config.pcr_selection.banks);
        PcrSelectionListBuilder::new()
            .with_selection(pcr_hash_alg, &pcr_slots)
            .build()
            .map_err(|e| {
                EvidenceError::InternalError(format!("Failed to create PCR selection list: {}", e))
            })
    }

    fn collect_quote(&self, nonce: Option<&[u8]>) -> Result<Vec<u8>, EvidenceError> {
        let mut context = self.context_new()?;
        let pcr_hash_alg = Self::hash_alg_from_str(&self.config.pcr_selection.hash_alg)?;
        Self::check_pcr_availability(&mut context, pcr_hash_alg)?;

        let nonce = nonce.unwrap_or_default();
        let nonce = &nonce[..nonce.len().min(MAX_QUOTE_NONCE_SIZE)];
        let qualifying_data = Data::try_from(nonce.to_vec()).map_err(|e| {
            EvidenceError::InternalError(format!("Failed to create qualifying data: {}", e))
        })?;

        let signature_scheme = self.signature_scheme()?;
        let pcr_selection_list = self.quote_selection_list()?;
        let ak_handle = self.ak_handle(&mut context)?;

        let (quote, signature) = context
            .execute_with_nullauth_session(|ctx| {
                ctx.quote(ak_handle, qualifying_data, signature_scheme, pcr_selection_list)
            })
            .map_err(|e| {
                EvidenceError::InternalError(format!("Failed to get quote from TPM: {}", e))
            })?;

        let quote_bytes = quote
            .marshall()
            .map_err(|e| EvidenceError::InternalError(format!("Failed to marshall quote: {}", e)))?;
        let signature_bytes = signature.marshall().map_err(|e| {
            EvidenceError::InternalError(format!("Failed to marshall signature: {}", e))
        })?;

        Ok(encode_report(&quote_bytes, &signature_bytes))
    }

    fn read_pcr(&self, index: u32, algo_id: TcgAlgorithmId) -> Result<Vec<u8>, EvidenceError> {
        let pcr_hash_alg = Self::hash_alg_from_id(algo_id)?;
        let pcr_slots = Self::pcr_slots_from_indices(&[index]);
        let selection_list = PcrSelectionListBuilder::new()
            .with_selection(pcr_hash_alg, &pcr_slots)
            .build()
            .map_err(|e| {
                EvidenceError::InternalError(format!("Failed to create PCR selection list: {}", e))
            })?;

        let mut context = self.context_new()?;
        let (_update_counter, _selection_out, digests) =
            context.pcr_read(selection_list).map_err(|e| {
                EvidenceError::InternalError(format!("Failed to read PCR {}: {}", index, e))
            })?;

        let digest = digests.value().first().ok_or_else(|| {
            EvidenceError::InternalError(format!("TPM returned no digest for PCR {}", index))
        })?;
        Ok(digest.value().to_vec())
    }

    fn read_event_log(&self) -> Result<Vec<u8>, EvidenceError> {
        let path = &self.config.event_log_path;
        let metadata = std::fs::metadata(path).map_err(|e| {
            EvidenceError::InternalError(format!(
                "Failed to open boot log {}: {}",
                path.display(),
                e
            ))
        })?;
        if metadata.len() > MAX_EVENT_LOG_SIZE {
            return Err(EvidenceError::InternalError(format!(
                "Boot log size ({} bytes) exceeds maximum allowed size (5 MiB)",
                metadata.len()
            )));
        }

        std::fs::read(path).map_err(|e| {
            EvidenceError::InternalError(format!(
                "Failed to read boot log {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl EvidenceApi for TpmAttester {
    fn cc_type(&self) -> CcType {
        CcType::Tpm
    }

    fn get_default_algorithm(&self) -> Result<TcgAlgorithm, EvidenceError> {
        let algo_id = TcgAlgorithmId::from_name(&self.config.pcr_selection.hash_alg)?;
        Ok(TcgAlgorithm::from(algo_id))
    }

    fn get_cc_report(
        &self,
        nonce: Option<&[u8]>,
        user_data: Option<&[u8]>,
        extra_args: Option<&Value>,
    ) -> Result<CcReport, EvidenceError> {
        if user_data.is_some() {
            debug!("TPM quotes bind the nonce only; user data is not carried");
        }
        if let Some(args) = extra_args {
            debug!("Ignoring extra arguments for TPM quote: {}", args);
        }

        let report = self.collect_quote(nonce)?;
        Ok(CcReport::new(CcType::Tpm, report))
    }

    fn dump_cc_report(&self, report: &[u8]) -> Result<(), EvidenceError> {
        info!("TPM quote evidence, {} bytes:", report.len());
        hexdump::dump_data(report);

        let (quote, signature) = split_report(report)?;
        TpmsAttest::parse(quote)?.dump();
        TpmtSignature::parse(signature)?.dump();
        Ok(())
    }

    fn get_measurement_count(&self) -> Result<usize, EvidenceError> {
        Ok(TPM_PCR_COUNT as usize)
    }

    fn get_cc_measurement(
        &self,
        index: u32,
        algo_id: TcgAlgorithmId,
    ) -> Result<TcgDigest, EvidenceError> {
        if index >= TPM_PCR_COUNT {
            return Err(EvidenceError::InvalidMeasurementIndex {
                index,
                max: TPM_PCR_COUNT - 1,
            });
        }

        let value = self.read_pcr(index, algo_id)?;
        Ok(TcgDigest::new(algo_id, value))
    }

    fn get_cc_eventlog(
        &self,
        start: Option<u32>,
        count: Option<u32>,
    ) -> Result<Vec<TcgEventLogEntry>, EvidenceError> {
        let data = self.read_event_log()?;
        let mut event_log = EventLog::new(EventLogFormat::PcClient, data);
        event_log.parse()?;
        event_log.select(start, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_alg_conversions() {
        assert!(TpmAttester::hash_alg_from_str("sha256").is_ok());
        assert!(TpmAttester::hash_alg_from_str("md5").is_err());
        assert!(TpmAttester::hash_alg_from_id(TcgAlgorithmId::Sm3).is_ok());
        assert!(TpmAttester::hash_alg_from_id(TcgAlgorithmId::Unknown).is_err());
    }

    #[test]
    fn test_pcr_slot_mapping() {
        let slots = TpmAttester::pcr_slots_from_indices(&[0, 7, 23]);
        assert_eq!(slots, vec![PcrSlot::Slot0, PcrSlot::Slot7, PcrSlot::Slot23]);
        // Out-of-range indices are dropped by the mapping; validate() rejects
        // them before this point.
        assert!(TpmAttester::pcr_slots_from_indices(&[24]).is_empty());
    }

    #[test]
    fn test_measurement_index_bounds() {
        let attester = TpmAttester::new(TpmAttesterConfig::default()).unwrap();
        assert!(matches!(
            attester.get_cc_measurement(24, TcgAlgorithmId::Sha256),
            Err(EvidenceError::InvalidMeasurementIndex { index: 24, max: 23 })
        ));
    }
}
