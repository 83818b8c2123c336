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

use crate::tsi::TsiContext;
use evidence_api::cc_type::TEE_CCA_PATH;
use evidence_api::crypto;
use evidence_api::hexdump;
use evidence_api::{
    CcReport, CcType, EvidenceApi, EvidenceError, TcgAlgorithm, TcgAlgorithmId, TcgDigest,
    TcgEventLogEntry,
};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tcg_eventlog::{EventLog, EventLogFormat};

/// CCEL ACPI table data exported by the kernel.
pub const DEFAULT_CCEL_PATH: &str = "/sys/firmware/acpi/tables/data/CCEL";

const MAX_EVENT_LOG_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct VirtCcaAttesterConfig {
    pub ccel_path: PathBuf,
}

impl Default for VirtCcaAttesterConfig {
    fn default() -> Self {
        Self {
            ccel_path: PathBuf::from(DEFAULT_CCEL_PATH),
        }
    }
}

/// Evidence collector for a virtCCA realm.
pub struct VirtCcaAttester {
    config: VirtCcaAttesterConfig,
}

impl VirtCcaAttester {
    /// Build a collector for the running realm.
    ///
    /// # Errors
    /// Returns `EvidenceError::NoCcPlatform` when the TSI device is absent.
    pub fn new(config: VirtCcaAttesterConfig) -> Result<Self, EvidenceError> {
        if !Path::new(TEE_CCA_PATH).exists() {
            return Err(EvidenceError::NoCcPlatform);
        }
        Ok(Self { config })
    }

    fn read_event_log(&self) -> Result<Vec<u8>, EvidenceError> {
        let path = &self.config.ccel_path;
        let metadata = std::fs::metadata(path).map_err(|e| {
            EvidenceError::InternalError(format!(
                "Failed to read CCEL table {}: {}",
                path.display(),
                e
            ))
        })?;
        if metadata.len() > MAX_EVENT_LOG_SIZE {
            return Err(EvidenceError::InternalError(format!(
                "CCEL table size ({} bytes) exceeds maximum allowed size (5 MiB)",
                metadata.len()
            )));
        }

        std::fs::read(path).map_err(|e| {
            EvidenceError::InternalError(format!(
                "Failed to read CCEL table {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl EvidenceApi for VirtCcaAttester {
    fn cc_type(&self) -> CcType {
        CcType::Cca
    }

    fn get_default_algorithm(&self) -> Result<TcgAlgorithm, EvidenceError> {
        // Realm extensible measurements are SHA-256 digests by default.
        Ok(TcgAlgorithm::from(TcgAlgorithmId::Sha256))
    }

    fn get_cc_report(
        &self,
        nonce: Option<&[u8]>,
        user_data: Option<&[u8]>,
        extra_args: Option<&Value>,
    ) -> Result<CcReport, EvidenceError> {
        if let Some(args) = extra_args {
            debug!("Ignoring extra arguments for virtCCA token: {}", args);
        }

        let challenge = crypto::report_data(nonce, user_data)?;
        let context = TsiContext::new()?;
        let token = context.get_attestation_token(&challenge)?;

        Ok(CcReport::new(CcType::Cca, token))
    }

    fn dump_cc_report(&self, report: &[u8]) -> Result<(), EvidenceError> {
        // The token is a CBOR-encoded web token; dump the raw bytes.
        info!("virtCCA attestation token, {} bytes:", report.len());
        hexdump::dump_data(report);
        Ok(())
    }

    fn get_measurement_count(&self) -> Result<usize, EvidenceError> {
        Err(EvidenceError::Unsupported(
            CcType::Cca,
            "measurement register enumeration",
        ))
    }

    fn get_cc_measurement(
        &self,
        _index: u32,
        _algo_id: TcgAlgorithmId,
    ) -> Result<TcgDigest, EvidenceError> {
        Err(EvidenceError::Unsupported(
            CcType::Cca,
            "direct measurement register reads",
        ))
    }

    fn get_cc_eventlog(
        &self,
        start: Option<u32>,
        count: Option<u32>,
    ) -> Result<Vec<TcgEventLogEntry>, EvidenceError> {
        let data = self.read_event_log()?;
        let mut event_log = EventLog::new(EventLogFormat::Ccel, data);
        event_log.parse()?;
        event_log.select(start, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_device() {
        if !Path::new(TEE_CCA_PATH).exists() {
            assert!(matches!(
                VirtCcaAttester::new(VirtCcaAttesterConfig::default()),
                Err(EvidenceError::NoCcPlatform)
            ));
        }
    }
}
