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

//! Platform detection and the one-call evidence surface.
//!
//! [`build_attester`] probes the running platform and constructs the
//! matching backend; the free functions below wrap it for callers that want
//! a single evidence operation without holding a collector.

pub mod config;

pub use config::Config;

use evidence_api::{
    CcReport, CcType, EvidenceApi, EvidenceError, TcgAlgorithm, TcgAlgorithmId, TcgDigest,
    TcgEventLogEntry,
};
use log::info;
use serde_json::Value;
use sev_attester::SevSnpAttester;
use tcg_eventlog::{replay_event_log, EventLogReplay};
use tdx_attester::TdxAttester;
use tpm_attester::TpmAttester;
use virtcca_attester::VirtCcaAttester;

/// Detect the platform and construct the matching evidence collector.
///
/// # Errors
/// Returns `EvidenceError::NoCcPlatform` when no confidential-computing
/// device is present, or any backend construction error.
pub fn build_attester(config: &Config) -> Result<Box<dyn EvidenceApi>, EvidenceError> {
    let cc_type = CcType::detect();
    info!("Detected platform: {}", cc_type);

    match cc_type {
        CcType::Tpm => Ok(Box::new(TpmAttester::new(config.tpm_attester_config())?)),
        CcType::Tdx => Ok(Box::new(TdxAttester::new(config.tdx_attester_config())?)),
        CcType::Sev => Ok(Box::new(SevSnpAttester::new()?)),
        CcType::Cca => Ok(Box::new(VirtCcaAttester::new(
            config.virtcca_attester_config(),
        )?)),
        CcType::None => Err(EvidenceError::NoCcPlatform),
    }
}

/// Retrieve an attestation report from the detected platform.
///
/// # Errors
/// Any detection, construction, or collection error.
pub fn get_cc_report(
    nonce: Option<&[u8]>,
    user_data: Option<&[u8]>,
    extra_args: Option<&Value>,
) -> Result<CcReport, EvidenceError> {
    build_attester(&Config::default())?.get_cc_report(nonce, user_data, extra_args)
}

/// Dump report bytes through the detected platform's dumper.
///
/// # Errors
/// Any detection or parsing error.
pub fn dump_cc_report(report: &[u8]) -> Result<(), EvidenceError> {
    build_attester(&Config::default())?.dump_cc_report(report)
}

/// Default digest algorithm of the detected platform.
///
/// # Errors
/// Any detection or construction error.
pub fn get_default_algorithm() -> Result<TcgAlgorithm, EvidenceError> {
    build_attester(&Config::default())?.get_default_algorithm()
}

/// Number of measurement registers on the detected platform.
///
/// # Errors
/// Any detection or construction error.
pub fn get_measurement_count() -> Result<usize, EvidenceError> {
    build_attester(&Config::default())?.get_measurement_count()
}

/// One measurement register of the detected platform.
///
/// # Errors
/// Any detection, construction, or read error.
pub fn get_cc_measurement(index: u32, algo_id: TcgAlgorithmId) -> Result<TcgDigest, EvidenceError> {
    build_attester(&Config::default())?.get_cc_measurement(index, algo_id)
}

/// Measured-boot events of the detected platform.
///
/// # Errors
/// Any detection, construction, or parse error.
pub fn get_cc_eventlog(
    start: Option<u32>,
    count: Option<u32>,
) -> Result<Vec<TcgEventLogEntry>, EvidenceError> {
    build_attester(&Config::default())?.get_cc_eventlog(start, count)
}

/// Replay formatted events into expected register values. Pure data
/// transformation; works for events from any platform.
pub fn replay_cc_eventlog(events: &[TcgEventLogEntry]) -> EventLogReplay {
    replay_event_log(events)
}
