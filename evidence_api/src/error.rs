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

use crate::cc_type::CcType;
use crate::tcg::TcgAlgorithmId;
use thiserror::Error;

/// Error type shared by every evidence operation.
///
/// Every fallible operation on the evidence capability returns this type.
/// Unknown raw mechanism values are an explicit error rather than a silent
/// empty rendering, and per-platform capability gaps are reported as
/// `Unsupported` instead of being papered over.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Input error: {0}")]
    InputError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unknown CC type value: {0}")]
    UnknownCcType(i32),

    #[error("No confidential-computing platform detected")]
    NoCcPlatform,

    #[error("Measurement register index {index} out of range, max index is {max}")]
    InvalidMeasurementIndex { index: u32, max: u32 },

    #[error("Algorithm {0} is not provided by this platform")]
    UnsupportedAlgorithm(TcgAlgorithmId),

    #[error("{0} platform does not provide {1}")]
    Unsupported(CcType, &'static str),
}
