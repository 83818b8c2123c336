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

use crate::report::{
    get_snp_report, measurement_from_report, SNP_REPORT_DATA_LEN, SNP_REPORT_DATA_OFFSET,
    SNP_VMPL_MAX,
};
use evidence_api::cc_type::TEE_SEV_PATH;
use evidence_api::crypto;
use evidence_api::hexdump;
use evidence_api::{
    CcReport, CcType, EvidenceApi, EvidenceError, TcgAlgorithm, TcgAlgorithmId, TcgDigest,
    TcgEventLogEntry,
};
use log::info;
use serde_json::Value;
use std::path::Path;

/// Evidence collector for an SEV-SNP guest.
pub struct SevSnpAttester;

impl SevSnpAttester {
    /// Build a collector for the running SNP guest.
    ///
    /// # Errors
    /// Returns `EvidenceError::NoCcPlatform` when the guest device is absent.
    pub fn new() -> Result<Self, EvidenceError> {
        if !Path::new(TEE_SEV_PATH).exists() {
            return Err(EvidenceError::NoCcPlatform);
        }
        Ok(Self)
    }

    /// VM permission level requested through the open parameter map.
    fn vmpl_from_args(extra_args: Option<&Value>) -> Result<u32, EvidenceError> {
        let Some(args) = extra_args else {
            return Ok(0);
        };
        let Some(value) = args.get("vmpl") else {
            return Ok(0);
        };

        let vmpl = value
            .as_u64()
            .ok_or_else(|| {
                EvidenceError::InputError(format!("vmpl must be a non-negative integer: {}", value))
            })?;
        if vmpl > SNP_VMPL_MAX as u64 {
            return Err(EvidenceError::InputError(format!(
                "vmpl {} out of range 0-{}",
                vmpl, SNP_VMPL_MAX
            )));
        }
        Ok(vmpl as u32)
    }
}

impl EvidenceApi for SevSnpAttester {
    fn cc_type(&self) -> CcType {
        CcType::Sev
    }

    fn get_default_algorithm(&self) -> Result<TcgAlgorithm, EvidenceError> {
        // The launch measurement is a SHA-384 digest.
        Ok(TcgAlgorithm::from(TcgAlgorithmId::Sha384))
    }

    fn get_cc_report(
        &self,
        nonce: Option<&[u8]>,
        user_data: Option<&[u8]>,
        extra_args: Option<&Value>,
    ) -> Result<CcReport, EvidenceError> {
        let vmpl = Self::vmpl_from_args(extra_args)?;
        let report_data = crypto::report_data(nonce, user_data)?;
        let report = get_snp_report(report_data, vmpl)?;
        Ok(CcReport::new(CcType::Sev, report))
    }

    fn dump_cc_report(&self, report: &[u8]) -> Result<(), EvidenceError> {
        info!("SEV-SNP attestation report, {} bytes:", report.len());
        hexdump::dump_data(report);

        let measurement = measurement_from_report(report)?;
        let report_data = &report[SNP_REPORT_DATA_OFFSET..SNP_REPORT_DATA_OFFSET + SNP_REPORT_DATA_LEN];
        info!("Launch measurement = {}", hex::encode(&measurement));
        info!("Report data        = {}", hex::encode(report_data));
        Ok(())
    }

    fn get_measurement_count(&self) -> Result<usize, EvidenceError> {
        // The launch measurement is the only register SNP exposes.
        Ok(1)
    }

    fn get_cc_measurement(
        &self,
        index: u32,
        algo_id: TcgAlgorithmId,
    ) -> Result<TcgDigest, EvidenceError> {
        if index != 0 {
            return Err(EvidenceError::InvalidMeasurementIndex { index, max: 0 });
        }
        if algo_id != TcgAlgorithmId::Sha384 {
            return Err(EvidenceError::UnsupportedAlgorithm(algo_id));
        }

        let report = get_snp_report([0u8; SNP_REPORT_DATA_LEN], 0)?;
        let measurement = measurement_from_report(&report)?;
        Ok(TcgDigest::new(TcgAlgorithmId::Sha384, measurement))
    }

    fn get_cc_eventlog(
        &self,
        _start: Option<u32>,
        _count: Option<u32>,
    ) -> Result<Vec<TcgEventLogEntry>, EvidenceError> {
        Err(EvidenceError::Unsupported(CcType::Sev, "a TCG event log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vmpl_parsing() {
        assert_eq!(SevSnpAttester::vmpl_from_args(None).unwrap(), 0);
        assert_eq!(
            SevSnpAttester::vmpl_from_args(Some(&json!({}))).unwrap(),
            0
        );
        assert_eq!(
            SevSnpAttester::vmpl_from_args(Some(&json!({"vmpl": 2}))).unwrap(),
            2
        );
        assert!(SevSnpAttester::vmpl_from_args(Some(&json!({"vmpl": 7}))).is_err());
        assert!(SevSnpAttester::vmpl_from_args(Some(&json!({"vmpl": "high"}))).is_err());
    }

    #[test]
    fn test_new_without_device() {
        if !Path::new(TEE_SEV_PATH).exists() {
            assert!(matches!(
                SevSnpAttester::new(),
                Err(EvidenceError::NoCcPlatform)
            ));
        }
    }
}
