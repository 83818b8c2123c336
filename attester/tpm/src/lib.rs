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

//! TPM 2.0 evidence backend.
//!
//! Produces TPM2_Quote evidence over a configured PCR selection, reads PCR
//! values, and serves the securityfs measured-boot log. The TPM is reached
//! through a configurable TCTI.

pub mod attester;
pub mod config;
pub mod quote;

pub use attester::TpmAttester;
pub use config::{PcrSelectionConfig, QuoteSignatureScheme, TpmAttesterConfig};
