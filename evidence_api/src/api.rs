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

//! The polymorphic evidence capability implemented by every platform backend.

use crate::cc_type::CcType;
use crate::error::EvidenceError;
use crate::hexdump;
use crate::tcg::{TcgAlgorithm, TcgAlgorithmId, TcgDigest, TcgEventLogEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw attestation evidence tagged with the mechanism that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CcReport {
    pub cc_type: CcType,
    pub report: Vec<u8>,
}

impl CcReport {
    pub fn new(cc_type: CcType, report: Vec<u8>) -> Self {
        Self { cc_type, report }
    }
}

/// Evidence collection capability of one confidential-computing platform.
///
/// Implementations retrieve signed reports, enumerate and read measurement
/// registers, and surface the measured-boot event log. Every operation
/// reports failure through [`EvidenceError`]; a backend that cannot provide
/// an operation fails with `EvidenceError::Unsupported` instead of guessing.
pub trait EvidenceApi: Send + Sync {
    /// Mechanism this collector speaks for.
    fn cc_type(&self) -> CcType;

    /// Default digest algorithm of the platform's measurement registers.
    fn get_default_algorithm(&self) -> Result<TcgAlgorithm, EvidenceError>;

    /// Retrieve a signed attestation report.
    ///
    /// `nonce` guards against replay and `user_data` is caller-chosen
    /// payload; both are bound into the report's report-data (or
    /// qualifying-data) field. `extra_args` is an open-ended parameter map
    /// for backend-specific knobs (e.g. `"vmpl"` for SEV-SNP).
    fn get_cc_report(
        &self,
        nonce: Option<&[u8]>,
        user_data: Option<&[u8]>,
        extra_args: Option<&Value>,
    ) -> Result<CcReport, EvidenceError>;

    /// Dump raw report bytes through the log facade.
    ///
    /// Backends that understand their own report format override this to
    /// prepend a structured field dump before the hexdump.
    fn dump_cc_report(&self, report: &[u8]) -> Result<(), EvidenceError> {
        hexdump::dump_data(report);
        Ok(())
    }

    /// Number of runtime measurement registers the platform exposes.
    fn get_measurement_count(&self) -> Result<usize, EvidenceError>;

    /// Read one measurement register in the requested algorithm.
    fn get_cc_measurement(
        &self,
        index: u32,
        algo_id: TcgAlgorithmId,
    ) -> Result<TcgDigest, EvidenceError>;

    /// Retrieve parsed measured-boot events.
    ///
    /// `start` is a 0-based index into the parsed event sequence and `count`
    /// a number of events. Omitting both returns the full log; omitting only
    /// `count` returns everything from `start`. A `start` beyond the last
    /// event is an input error; a `count` reaching past the end is clamped
    /// to the tail.
    fn get_cc_eventlog(
        &self,
        start: Option<u32>,
        count: Option<u32>,
    ) -> Result<Vec<TcgEventLogEntry>, EvidenceError>;
}
