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

use crate::quote::{get_td_quote, TdQuote};
use crate::report::{get_td_report, rtmr_from_report, TdxVersion, TDX_REPORT_DATA_LEN, TDX_RTMR_COUNT};
use evidence_api::crypto;
use evidence_api::hexdump;
use evidence_api::{
    CcReport, CcType, EvidenceApi, EvidenceError, TcgAlgorithm, TcgAlgorithmId, TcgDigest,
    TcgEventLogEntry,
};
use log::{debug, info};
use serde_json::Value;
use std::path::PathBuf;
use tcg_eventlog::{EventLog, EventLogFormat};

/// CCEL ACPI table data exported by the kernel.
pub const DEFAULT_CCEL_PATH: &str = "/sys/firmware/acpi/tables/data/CCEL";

const MAX_EVENT_LOG_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TdxAttesterConfig {
    pub ccel_path: PathBuf,
}

impl Default for TdxAttesterConfig {
    fn default() -> Self {
        Self {
            ccel_path: PathBuf::from(DEFAULT_CCEL_PATH),
        }
    }
}

/// Evidence collector for a TDX guest.
pub struct TdxAttester {
    version: TdxVersion,
    config: TdxAttesterConfig,
}

impl TdxAttester {
    /// Build a collector for the running TD.
    ///
    /// # Errors
    /// Returns `EvidenceError::NoCcPlatform` when no TDX guest device exists.
    pub fn new(config: TdxAttesterConfig) -> Result<Self, EvidenceError> {
        let version = TdxVersion::detect().ok_or(EvidenceError::NoCcPlatform)?;
        debug!("TDX {} guest device found", version.as_str());
        Ok(Self { version, config })
    }

    pub fn version(&self) -> TdxVersion {
        self.version
    }

    fn read_event_log(&self) -> Result<Vec<u8>, EvidenceError> {
        let metadata = std::fs::metadata(&self.config.ccel_path).map_err(|e| {
            EvidenceError::InternalError(format!(
                "Failed to read CCEL table {}: {}",
                self.config.ccel_path.display(),
                e
            ))
        })?;
        if metadata.len() > MAX_EVENT_LOG_SIZE {
            return Err(EvidenceError::InternalError(format!(
                "CCEL table size ({} bytes) exceeds maximum allowed size (5 MiB)",
                metadata.len()
            )));
        }

        std::fs::read(&self.config.ccel_path).map_err(|e| {
            EvidenceError::InternalError(format!(
                "Failed to read CCEL table {}: {}",
                self.config.ccel_path.display(),
                e
            ))
        })
    }
}

impl EvidenceApi for TdxAttester {
    fn cc_type(&self) -> CcType {
        CcType::Tdx
    }

    fn get_default_algorithm(&self) -> Result<TcgAlgorithm, EvidenceError> {
        Ok(TcgAlgorithm::from(TcgAlgorithmId::Sha384))
    }

    fn get_cc_report(
        &self,
        nonce: Option<&[u8]>,
        user_data: Option<&[u8]>,
        extra_args: Option<&Value>,
    ) -> Result<CcReport, EvidenceError> {
        if let Some(args) = extra_args {
            debug!("Ignoring extra arguments for TDX report: {}", args);
        }

        let report_data = crypto::report_data(nonce, user_data)?;
        let tdreport = get_td_report(self.version, report_data)?;
        let quote = get_td_quote(self.version, &tdreport)?;

        Ok(CcReport::new(CcType::Tdx, quote))
    }

    fn dump_cc_report(&self, report: &[u8]) -> Result<(), EvidenceError> {
        info!("TDX quote, {} bytes:", report.len());
        hexdump::dump_data(report);
        TdQuote::parse(report)?.dump();
        Ok(())
    }

    fn get_measurement_count(&self) -> Result<usize, EvidenceError> {
        Ok(TDX_RTMR_COUNT as usize)
    }

    fn get_cc_measurement(
        &self,
        index: u32,
        algo_id: TcgAlgorithmId,
    ) -> Result<TcgDigest, EvidenceError> {
        if index >= TDX_RTMR_COUNT {
            return Err(EvidenceError::InvalidMeasurementIndex {
                index,
                max: TDX_RTMR_COUNT - 1,
            });
        }
        if algo_id != TcgAlgorithmId::Sha384 {
            return Err(EvidenceError::UnsupportedAlgorithm(algo_id));
        }

        let tdreport = get_td_report(self.version, [0u8; TDX_REPORT_DATA_LEN])?;
        let rtmr = rtmr_from_report(&tdreport, index)?;
        Ok(TcgDigest::new(TcgAlgorithmId::Sha384, rtmr))
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
        // Only meaningful outside a TD guest.
        if TdxVersion::detect().is_none() {
            assert!(matches!(
                TdxAttester::new(TdxAttesterConfig::default()),
                Err(EvidenceError::NoCcPlatform)
            ));
        }
    }

    #[test]
    fn test_default_ccel_path() {
        let config = TdxAttesterConfig::default();
        assert_eq!(config.ccel_path, PathBuf::from(DEFAULT_CCEL_PATH));
    }
}
