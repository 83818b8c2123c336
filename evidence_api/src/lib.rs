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

//! Contract crate for confidential-computing evidence collection.
//!
//! Defines the hardware mechanism enumeration ([`CcType`]), the polymorphic
//! evidence capability ([`EvidenceApi`]), the TCG algorithm/digest data model,
//! and the error type shared by every backend.

pub mod api;
pub mod cc_type;
pub mod crypto;
pub mod error;
pub mod hexdump;
pub mod tcg;

pub use api::{CcReport, EvidenceApi};
pub use cc_type::CcType;
pub use error::EvidenceError;
pub use tcg::{TcgAlgorithm, TcgAlgorithmId, TcgDigest, TcgEventLogEntry, TcgEventType};
